//! Walks a nested find-or-create spec into a [`DependencyGraph`].
//!
//! The walk is a pure recursive function: every call returns the descriptors
//! of its subtree (pre-order, the node itself first) together with the
//! symbolic reference its parent should embed. The caller folds those into a
//! single graph, which is validated once before it is handed out.

use crate::error::ParseError;
use crate::graph::{
    Body, CreatePayload, DependencyGraph, Descriptor, FindQuery, Linkage, Relationship,
    SubrequestRef,
};
use crate::identifier::{Action, Identifier, PathStep};
use serde_json::{Map, Value};
use tracing::debug;

mod node;

use node::{OperationNode, is_operation_node, is_relationship_object, is_resource_identifier};

/// Parses a root operation node into its dependency graph.
///
/// # Example
///
/// ```rust
/// use serde_json::json;
///
/// let spec = json!({
///     "$create": {
///         "type": "log--input",
///         "name": "west field bed 12",
///         "location": {
///             "$find": { "type": "asset--land", "name": "west field bed 12" },
///             "$limit": 1,
///             "$createIfNotFound": true,
///         },
///     },
/// });
///
/// let graph = subrequests::parser::parse(&spec).unwrap();
/// assert_eq!(graph.len(), 3);
/// assert!(graph.contains("$ROOT::$create:log--input.location::$createIfNotFound:asset--land"));
/// ```
pub fn parse(spec: &Value) -> Result<DependencyGraph, ParseError> {
    if !is_operation_node(spec) {
        return Err(ParseError::InvalidPayload {
            path: Identifier::root().to_string(),
            message: "the root of a spec must be an operation node".to_string(),
        });
    }

    let root = visit(spec, &Identifier::root(), None)?;

    let mut graph = DependencyGraph::new();
    for descriptor in root.descriptors {
        debug!(
            id = %descriptor.id,
            depends_on = descriptor.depends_on.len(),
            "parsed subrequest"
        );
        graph.insert(descriptor)?;
    }
    graph.validate()?;
    Ok(graph)
}

/// Where a child node sits inside its parent payload.
struct Slot<'a> {
    field: &'a str,
    index: Option<usize>,
}

impl Slot<'_> {
    fn segment(&self) -> String {
        match self.index {
            Some(index) => format!("{}[{}]", self.field, index),
            None => self.field.to_string(),
        }
    }
}

/// Result of visiting one operation node.
struct Visited {
    /// The node's descriptors followed by those of its subtree.
    descriptors: Vec<Descriptor>,
    /// What the parent embeds in place of the node.
    reference: SubrequestRef,
}

fn visit(value: &Value, parent: &Identifier, slot: Option<&Slot>) -> Result<Visited, ParseError> {
    let segment = slot.map(Slot::segment);
    let location = match &segment {
        Some(segment) => format!("{}.{}", parent, segment),
        None => parent.to_string(),
    };
    let parent_field = slot.map(|s| s.field.to_string());

    match OperationNode::from_value(value, &location)? {
        OperationNode::Create {
            resource_type,
            payload,
        } => {
            let id = parent.child(&PathStep::new(segment, Action::Create, resource_type));
            let (body, depends_on, children) = visit_create_payload(payload, &id)?;

            let mut descriptors = Vec::with_capacity(children.len() + 1);
            descriptors.push(Descriptor {
                id: id.clone(),
                action: Action::Create,
                resource_type: resource_type.to_string(),
                body: Body::Create(body),
                depends_on,
                parent_field,
            });
            descriptors.extend(children);

            Ok(Visited {
                descriptors,
                reference: SubrequestRef {
                    resource_type: resource_type.to_string(),
                    candidates: vec![id],
                },
            })
        }
        OperationNode::Find {
            resource_type,
            filter,
            limit,
            sort,
            create_if_not_found,
        } => {
            let find_id = parent.child(&PathStep::new(segment.clone(), Action::Find, resource_type));
            let filter = filter_fields(filter, &find_id)?;

            let mut descriptors = vec![Descriptor {
                id: find_id.clone(),
                action: Action::Find,
                resource_type: resource_type.to_string(),
                body: Body::Find(FindQuery {
                    filter: filter.clone(),
                    limit,
                    sort,
                }),
                depends_on: Vec::new(),
                parent_field: parent_field.clone(),
            }];
            let mut candidates = vec![find_id.clone()];

            if create_if_not_found {
                let fallback_id = parent.child(&PathStep::new(
                    segment,
                    Action::CreateIfNotFound,
                    resource_type,
                ));
                descriptors.push(Descriptor {
                    id: fallback_id.clone(),
                    action: Action::CreateIfNotFound,
                    resource_type: resource_type.to_string(),
                    body: Body::Create(payload_from_filter(filter)),
                    depends_on: vec![find_id],
                    parent_field,
                });
                candidates.push(fallback_id);
            }

            Ok(Visited {
                descriptors,
                reference: SubrequestRef {
                    resource_type: resource_type.to_string(),
                    candidates,
                },
            })
        }
    }
}

/// Splits a create payload into attributes and relationships, recursing into
/// every nested operation node.
fn visit_create_payload(
    payload: &Map<String, Value>,
    id: &Identifier,
) -> Result<(CreatePayload, Vec<Identifier>, Vec<Descriptor>), ParseError> {
    let mut body = CreatePayload::default();
    let mut depends_on: Vec<Identifier> = Vec::new();
    let mut children = Vec::new();

    let mut adopt = |visited: Visited, depends_on: &mut Vec<Identifier>| {
        for candidate in &visited.reference.candidates {
            if !depends_on.contains(candidate) {
                depends_on.push(candidate.clone());
            }
        }
        children.extend(visited.descriptors);
        visited.reference
    };

    for (field, value) in payload {
        if field == "type" {
            continue;
        }

        if is_operation_node(value) {
            let slot = Slot { field, index: None };
            let visited = visit(value, id, Some(&slot))?;
            let reference = adopt(visited, &mut depends_on);
            body.relationships
                .insert(field.clone(), Relationship::One(Linkage::Subrequest(reference)));
        } else if let Some(items) = value.as_array().filter(|items| items.iter().any(is_operation_node)) {
            let mut linkage = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                if is_operation_node(item) {
                    let slot = Slot {
                        field,
                        index: Some(index),
                    };
                    let visited = visit(item, id, Some(&slot))?;
                    linkage.push(Linkage::Subrequest(adopt(visited, &mut depends_on)));
                } else if is_resource_identifier(item) {
                    linkage.push(Linkage::Resource(item.clone()));
                } else {
                    return Err(ParseError::InvalidPayload {
                        path: format!("{}.{}[{}]", id, field, index),
                        message: "to-many relationship items must be operation nodes or resource identifiers"
                            .to_string(),
                    });
                }
            }
            body.relationships
                .insert(field.clone(), Relationship::Many(linkage));
        } else if let Some(relationship) = literal_relationship(value) {
            body.relationships.insert(field.clone(), relationship);
        } else {
            body.attributes.insert(field.clone(), value.clone());
        }
    }

    Ok((body, depends_on, children))
}

/// Filter fields of a `$find`, which must all be literals.
fn filter_fields(filter: &Map<String, Value>, id: &Identifier) -> Result<Map<String, Value>, ParseError> {
    let mut fields = Map::new();
    for (field, value) in filter {
        if field == "type" {
            continue;
        }
        let nested = is_operation_node(value)
            || value
                .as_array()
                .is_some_and(|items| items.iter().any(is_operation_node));
        if nested {
            return Err(ParseError::InvalidPayload {
                path: format!("{}.{}", id, field),
                message: "operation nodes are not allowed inside a $find filter".to_string(),
            });
        }
        fields.insert(field.clone(), value.clone());
    }
    Ok(fields)
}

/// Re-expresses a find filter as the payload of its fallback create.
fn payload_from_filter(filter: Map<String, Value>) -> CreatePayload {
    let mut body = CreatePayload::default();
    for (field, value) in filter {
        match literal_relationship(&value) {
            Some(relationship) => {
                body.relationships.insert(field, relationship);
            }
            None => {
                body.attributes.insert(field, value);
            }
        }
    }
    body
}

fn literal_relationship(value: &Value) -> Option<Relationship> {
    if is_relationship_object(value) {
        return Some(Relationship::Raw(value.clone()));
    }
    if is_resource_identifier(value) {
        return Some(Relationship::One(Linkage::Resource(value.clone())));
    }
    match value.as_array() {
        Some(items) if !items.is_empty() && items.iter().all(is_resource_identifier) => Some(
            Relationship::Many(items.iter().cloned().map(Linkage::Resource).collect()),
        ),
        _ => None,
    }
}
