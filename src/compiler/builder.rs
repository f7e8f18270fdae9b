use crate::error::CompileError;
use crate::graph::{
    Body, CreatePayload, DependencyGraph, Descriptor, FindQuery, Linkage, Relationship,
    SortDirection, SubrequestRef,
};
use crate::identifier::{Action, Identifier};
use crate::wire::{
    BackReference, CREATE_ID_PATH, FIND_ID_PATH, Page, WireEnvelope, WireOp, WireOperation,
    reference_placeholder, resource_uri,
};
use ahash::AHashMap;
use itertools::Itertools;
use serde_json::{Map, Value, json};

/// Turns an already ordered list of descriptors into wire operations.
pub(super) struct EnvelopeBuilder<'a> {
    graph: &'a DependencyGraph,
    positions: AHashMap<&'a Identifier, usize>,
}

impl<'a> EnvelopeBuilder<'a> {
    pub(super) fn new(graph: &'a DependencyGraph, order: &[&'a Descriptor]) -> Self {
        let positions = order
            .iter()
            .copied()
            .enumerate()
            .map(|(index, descriptor)| (&descriptor.id, index))
            .collect();
        Self { graph, positions }
    }

    pub(super) fn build(&self, order: &[&'a Descriptor]) -> Result<WireEnvelope, CompileError> {
        let operations = order
            .iter()
            .enumerate()
            .map(|(index, descriptor)| self.build_operation(index, descriptor))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(WireEnvelope { operations })
    }

    fn build_operation(&self, index: usize, descriptor: &Descriptor) -> Result<WireOperation, CompileError> {
        let mut operation = WireOperation {
            request_id: descriptor.id.clone(),
            op: WireOp::Find,
            resource_type: descriptor.resource_type.clone(),
            uri: resource_uri(&descriptor.resource_type),
            data: None,
            filter: None,
            page: None,
            sort: None,
            wait_for: descriptor.depends_on.clone(),
            if_empty: None,
        };

        match &descriptor.body {
            Body::Find(query) => {
                apply_find_query(&mut operation, query);
            }
            Body::Create(payload) => {
                operation.op = WireOp::Create;
                operation.data = Some(self.resource_object(index, descriptor, payload)?);
            }
        }

        if descriptor.action == Action::CreateIfNotFound {
            operation.if_empty = descriptor.depends_on.iter().find_map(|dependency| {
                self.graph
                    .get(dependency.as_str())
                    .filter(|d| d.action == Action::Find)
                    .map(|d| d.id.clone())
            });
        }

        Ok(operation)
    }

    /// JSON:API resource object of a create, with subrequest-backed
    /// relationships replaced by back-references.
    fn resource_object(
        &self,
        index: usize,
        descriptor: &Descriptor,
        payload: &CreatePayload,
    ) -> Result<Value, CompileError> {
        let mut resource = Map::new();
        resource.insert("type".to_string(), Value::String(descriptor.resource_type.clone()));
        if !payload.attributes.is_empty() {
            resource.insert("attributes".to_string(), Value::Object(payload.attributes.clone()));
        }

        if !payload.relationships.is_empty() {
            let mut relationships = Map::new();
            for (field, relationship) in &payload.relationships {
                let value = match relationship {
                    Relationship::Raw(raw) => raw.clone(),
                    Relationship::One(linkage) => {
                        let data = self.linkage(index, descriptor, linkage)?;
                        json!({ "data": data })
                    }
                    Relationship::Many(items) => {
                        let data = items
                            .iter()
                            .map(|linkage| self.linkage(index, descriptor, linkage))
                            .collect::<Result<Vec<_>, _>>()?;
                        json!({ "data": data })
                    }
                };
                relationships.insert(field.clone(), value);
            }
            resource.insert("relationships".to_string(), Value::Object(relationships));
        }

        Ok(Value::Object(resource))
    }

    fn linkage(&self, index: usize, descriptor: &Descriptor, linkage: &Linkage) -> Result<Value, CompileError> {
        match linkage {
            Linkage::Resource(identifier) => Ok(identifier.clone()),
            Linkage::Subrequest(reference) => {
                let candidates = self.back_references(index, descriptor, reference)?;
                Ok(json!({
                    "type": reference.resource_type,
                    "id": reference_placeholder(&candidates),
                }))
            }
        }
    }

    fn back_references(
        &self,
        index: usize,
        descriptor: &Descriptor,
        reference: &SubrequestRef,
    ) -> Result<Vec<BackReference>, CompileError> {
        reference
            .candidates
            .iter()
            .map(|candidate| {
                let target = self.graph.get(candidate.as_str()).ok_or_else(|| {
                    CompileError::InvariantViolation(format!(
                        "'{}' references unknown subrequest '{}'",
                        descriptor.id, candidate
                    ))
                })?;
                let position = self
                    .positions
                    .get(candidate)
                    .copied()
                    .filter(|position| *position < index)
                    .ok_or_else(|| {
                        CompileError::InvariantViolation(format!(
                            "'{}' is not scheduled before '{}', which references it",
                            candidate, descriptor.id
                        ))
                    })?;
                let path = if target.action.creates() {
                    CREATE_ID_PATH
                } else {
                    FIND_ID_PATH
                };
                Ok(BackReference {
                    request_id: candidate.clone(),
                    index: position,
                    path: path.to_string(),
                })
            })
            .collect()
    }
}

fn apply_find_query(operation: &mut WireOperation, query: &FindQuery) {
    operation.filter = Some(query.filter.clone());
    operation.page = query.limit.map(|limit| Page { limit });
    if !query.sort.is_empty() {
        let sort = query
            .sort
            .iter()
            .map(|s| match s.direction {
                SortDirection::Asc => s.field.clone(),
                SortDirection::Desc => format!("-{}", s.field),
            })
            .join(",");
        operation.sort = Some(sort);
    }
}
