use crate::error::ParseError;
use crate::identifier::{Action, Identifier};
use ahash::{AHashMap, AHashSet};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};

/// One atomic create/find operation derived from a node of the input spec.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    pub id: Identifier,
    pub action: Action,
    pub resource_type: String,
    pub body: Body,
    /// Subrequests whose results must be known before this one can run.
    /// Ordered and free of duplicates.
    pub depends_on: Vec<Identifier>,
    /// Relationship field of the parent payload this subrequest feeds.
    pub parent_field: Option<String>,
}

impl Descriptor {
    pub fn depends_on(&self, other: &Identifier) -> bool {
        self.depends_on.contains(other)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Body {
    Create(CreatePayload),
    Find(FindQuery),
}

/// Payload of a create, split into plain attributes and relationship fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CreatePayload {
    pub attributes: Map<String, Value>,
    pub relationships: IndexMap<String, Relationship>,
}

/// A relationship field of a create payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Relationship {
    /// Already shaped as a JSON:API relationship object (`{"data": ...}`).
    Raw(Value),
    One(Linkage),
    Many(Vec<Linkage>),
}

impl Relationship {
    /// Subrequests this relationship waits on.
    pub fn subrequests(&self) -> Vec<&SubrequestRef> {
        match self {
            Relationship::Raw(_) => Vec::new(),
            Relationship::One(linkage) => linkage.subrequest().into_iter().collect(),
            Relationship::Many(items) => items.iter().filter_map(Linkage::subrequest).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Linkage {
    /// A literal resource identifier (`{"type": ..., "id": ...}`).
    Resource(Value),
    /// A resource produced by another subrequest of the same batch.
    Subrequest(SubrequestRef),
}

impl Linkage {
    pub fn subrequest(&self) -> Option<&SubrequestRef> {
        match self {
            Linkage::Subrequest(reference) => Some(reference),
            Linkage::Resource(_) => None,
        }
    }
}

/// Symbolic pointer to the resource another subrequest yields.
///
/// `candidates` are tried in order at execution time: a find-or-create child
/// lists its `Find` first and its `CreateIfNotFound` second.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubrequestRef {
    pub resource_type: String,
    pub candidates: Vec<Identifier>,
}

/// Filter and modifiers of a `$find`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FindQuery {
    pub filter: Map<String, Value>,
    pub limit: Option<u64>,
    pub sort: Vec<SortField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortField {
    pub field: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// The full set of subrequests of one parse, keyed by identifier.
///
/// Iteration follows insertion order, which is the parser's pre-order
/// traversal. That order only matters for tie-breaking; execution order is
/// carried by the `depends_on` edges.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DependencyGraph {
    descriptors: IndexMap<Identifier, Descriptor>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a descriptor, refusing to overwrite an existing identifier.
    pub fn insert(&mut self, descriptor: Descriptor) -> Result<(), ParseError> {
        if self.descriptors.contains_key(&descriptor.id) {
            return Err(ParseError::DuplicateIdentifier(descriptor.id));
        }
        self.descriptors.insert(descriptor.id.clone(), descriptor);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Descriptor> {
        self.descriptors.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.descriptors.contains_key(id)
    }

    /// Position of a descriptor in insertion order.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.descriptors.get_index_of(id)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &Identifier> {
        self.descriptors.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Descriptor> {
        self.descriptors.values()
    }

    /// Descriptors that list `id` in their `depends_on`.
    pub fn dependents_of<'a>(&'a self, id: &'a Identifier) -> impl Iterator<Item = &'a Descriptor> {
        self.descriptors.values().filter(move |d| d.depends_on(id))
    }

    /// Descriptors no other descriptor depends on.
    pub fn roots(&self) -> impl Iterator<Item = &Descriptor> {
        let referenced: AHashSet<&Identifier> = self
            .descriptors
            .values()
            .flat_map(|d| d.depends_on.iter())
            .collect();
        self.descriptors
            .values()
            .filter(move |d| !referenced.contains(&d.id))
    }

    /// Checks that every edge target exists and that the edges are acyclic.
    pub fn validate(&self) -> Result<(), ParseError> {
        for descriptor in self.descriptors.values() {
            for dependency in &descriptor.depends_on {
                if !self.descriptors.contains_key(dependency) {
                    return Err(ParseError::InvariantViolation(format!(
                        "'{}' depends on unknown subrequest '{}'",
                        descriptor.id, dependency
                    )));
                }
            }
        }

        if let Some(id) = self.find_cycle() {
            return Err(ParseError::InvariantViolation(format!(
                "dependency cycle through '{}'",
                id
            )));
        }
        Ok(())
    }

    /// Iterative three-colour DFS. Returns a node on a cycle, if any.
    fn find_cycle(&self) -> Option<&Identifier> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            InProgress,
            Done,
        }

        let mut marks: AHashMap<&Identifier, Mark> = AHashMap::new();
        for start in self.descriptors.keys() {
            if marks.contains_key(start) {
                continue;
            }
            let mut stack: Vec<(&Identifier, usize)> = vec![(start, 0)];
            marks.insert(start, Mark::InProgress);

            while let Some((id, next_edge)) = stack.pop() {
                let edges = self
                    .descriptors
                    .get(id)
                    .map(|d| d.depends_on.as_slice())
                    .unwrap_or_default();

                match edges.get(next_edge) {
                    Some(dependency) => {
                        stack.push((id, next_edge + 1));
                        match marks.get(dependency) {
                            Some(Mark::InProgress) => return Some(dependency),
                            Some(Mark::Done) => {}
                            None => {
                                marks.insert(dependency, Mark::InProgress);
                                stack.push((dependency, 0));
                            }
                        }
                    }
                    None => {
                        marks.insert(id, Mark::Done);
                    }
                }
            }
        }
        None
    }
}

impl<'a> IntoIterator for &'a DependencyGraph {
    type Item = &'a Descriptor;
    type IntoIter = indexmap::map::Values<'a, Identifier, Descriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.descriptors.values()
    }
}
