use crate::identifier::Identifier;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Status given to a subrequest the backend returned no result for.
pub const MISSING_RESPONSE_STATUS: u16 = 502;

/// Outcome of a single subrequest within a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEntry {
    pub status: u16,
    /// JSON:API document: `{"data": ...}` on success, `{"errors": [...]}` otherwise.
    pub body: Value,
}

impl ResponseEntry {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// Placeholder for a slot the backend left empty.
    pub fn missing(id: &Identifier) -> Self {
        Self {
            status: MISSING_RESPONSE_STATUS,
            body: json!({
                "errors": [{
                    "status": MISSING_RESPONSE_STATUS.to_string(),
                    "title": "Missing subrequest response",
                    "detail": format!("the batched response contained no entry for '{}'", id),
                }]
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The primary data of the document, if any.
    pub fn data(&self) -> Option<&Value> {
        self.body.get("data").filter(|data| !data.is_null())
    }

    /// The single resource this subrequest yielded. For a find this is the
    /// first match.
    pub fn resource(&self) -> Option<&Value> {
        match self.data()? {
            Value::Array(items) => items.first(),
            resource @ Value::Object(_) => Some(resource),
            _ => None,
        }
    }

    pub fn errors(&self) -> &[Value] {
        self.body
            .get("errors")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Per-subrequest outcomes of one `send`, keyed by identifier, in the order
/// the operations were executed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Responses {
    entries: IndexMap<Identifier, ResponseEntry>,
}

impl Responses {
    pub(crate) fn from_entries(entries: IndexMap<Identifier, ResponseEntry>) -> Self {
        Self { entries }
    }

    pub fn get(&self, id: &str) -> Option<&ResponseEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &Identifier> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Identifier, &ResponseEntry)> {
        self.entries.iter()
    }

    /// Entries whose status is not 2xx.
    pub fn failures(&self) -> impl Iterator<Item = (&Identifier, &ResponseEntry)> {
        self.entries.iter().filter(|(_, entry)| !entry.is_success())
    }

    pub fn into_inner(self) -> IndexMap<Identifier, ResponseEntry> {
        self.entries
    }
}
