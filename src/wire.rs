//! Wire-level types of the batched operations exchange.
//!
//! The envelope is what gets POSTed to the backend; the batch response is
//! what comes back. Both are plain serde structures.

use crate::identifier::Identifier;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Response-body path of the resource id produced by a find.
pub const FIND_ID_PATH: &str = "$.data[0].id";
/// Response-body path of the resource id produced by a create.
pub const CREATE_ID_PATH: &str = "$.data.id";

/// One batched request: the compiled operations in execution order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireEnvelope {
    pub operations: Vec<WireOperation>,
}

impl WireEnvelope {
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn request_ids(&self) -> impl Iterator<Item = &Identifier> {
        self.operations.iter().map(|op| &op.request_id)
    }

    /// Position of an operation in the sequence.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.operations.iter().position(|op| op.request_id == id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireOp {
    Create,
    Find,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireOperation {
    pub request_id: Identifier,
    pub op: WireOp,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub uri: String,
    /// JSON:API resource object of a create.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<Page>,
    /// JSON:API sort parameter, e.g. `-weight,name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub wait_for: Vec<Identifier>,
    /// Set on conditional creates: run only when this find came back empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub if_empty: Option<Identifier>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub limit: u64,
}

/// Pointer into the response of an earlier operation, resolved by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackReference {
    pub request_id: Identifier,
    pub index: usize,
    pub path: String,
}

/// Wraps candidate back-references into the `{"$ref": [...]}` placeholder
/// that stands in for a resource id.
pub fn reference_placeholder(candidates: &[BackReference]) -> Value {
    let mut placeholder = Map::new();
    placeholder.insert(
        "$ref".to_string(),
        serde_json::to_value(candidates).unwrap_or(Value::Null),
    );
    Value::Object(placeholder)
}

/// Collection path of a resource type: `asset--land` -> `/api/asset/land`.
pub fn resource_uri(resource_type: &str) -> String {
    match resource_type.split_once("--") {
        Some((entity, bundle)) => format!("/api/{}/{}", entity, bundle),
        None => format!("/api/{}", resource_type),
    }
}

/// The backend's answer to one envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchResponse {
    pub results: Vec<BatchResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<Identifier>,
    pub status: u16,
    #[serde(default)]
    pub body: Value,
}
