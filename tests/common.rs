//! Common test utilities: the farm log spec and an in-memory backend.
#![allow(dead_code)]
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Mutex;
use subrequests::prelude::*;
use subrequests::wire::WireOp;

pub const LOG_ID: &str = "$ROOT::$create:log--input";
pub const QUANTITY_ID: &str = "$ROOT::$create:log--input.quantity::$create:quantity--standard";
pub const LOCATION_FIND_ID: &str = "$ROOT::$create:log--input.location::$find:asset--land";
pub const LOCATION_CREATE_ID: &str =
    "$ROOT::$create:log--input.location::$createIfNotFound:asset--land";
pub const CATEGORY_FIND_ID: &str =
    "$ROOT::$create:log--input.category::$find:taxonomy_term--log_category";
pub const CATEGORY_CREATE_ID: &str =
    "$ROOT::$create:log--input.category::$createIfNotFound:taxonomy_term--log_category";
pub const OWNER_FIND_ID: &str = "$ROOT::$create:log--input.owner::$find:user--user";
pub const OWNER_CREATE_ID: &str = "$ROOT::$create:log--input.owner::$createIfNotFound:user--user";
pub const UNITS_FIND_ID: &str =
    "$ROOT::$create:log--input.quantity::$create:quantity--standard.units::$find:taxonomy_term--unit";
pub const UNITS_CREATE_ID: &str = "$ROOT::$create:log--input.quantity::$create:quantity--standard.units::$createIfNotFound:taxonomy_term--unit";

/// An input log for west field bed 12, with find-or-create lookups for its
/// location, category, owner and quantity units.
pub fn create_farm_log_spec() -> Value {
    json!({
        "$create": {
            "type": "log--input",
            "name": "west field bed 12",
            "location": {
                "$find": {
                    "type": "asset--land",
                    "status": "active",
                    "land_type": "bed",
                    "name": "west field bed 12",
                    "is_location": true,
                },
                "$limit": 1,
                "$createIfNotFound": true,
            },
            "category": {
                "$find": {
                    "type": "taxonomy_term--log_category",
                    "name": "pest_disease_control",
                },
                "$limit": 1,
                "$createIfNotFound": true,
            },
            "owner": {
                "$find": {
                    "type": "user--user",
                    "mail": "admin@our-sci.net",
                },
                "$limit": 1,
                "$createIfNotFound": true,
            },
            "quantity": {
                "$create": {
                    "type": "quantity--standard",
                    "label": "hhh",
                    "measure": "weight",
                    "units": {
                        "$find": {
                            "type": "taxonomy_term--unit",
                            "name": "US_gal_acre",
                        },
                        "$sort": { "weight": "DESC" },
                        "$limit": 1,
                        "$createIfNotFound": true,
                    },
                },
            },
        },
    })
}

/// Every identifier the farm log spec must produce.
pub fn farm_log_ids() -> Vec<&'static str> {
    vec![
        LOCATION_FIND_ID,
        LOCATION_CREATE_ID,
        CATEGORY_FIND_ID,
        CATEGORY_CREATE_ID,
        OWNER_FIND_ID,
        OWNER_CREATE_ID,
        UNITS_FIND_ID,
        UNITS_CREATE_ID,
        QUANTITY_ID,
        LOG_ID,
    ]
}

/// A backend where every find comes back empty and every create succeeds.
///
/// Creates echo their attributes back with a generated id. When
/// `self_identifying` is set, each result names its `requestId`.
pub fn empty_database_backend(envelope: &WireEnvelope, self_identifying: bool) -> BatchResponse {
    let results = envelope
        .operations
        .iter()
        .enumerate()
        .map(|(index, op)| {
            let (status, body) = match op.op {
                WireOp::Find => (200, json!({ "data": [] })),
                WireOp::Create => {
                    let attributes = op
                        .data
                        .as_ref()
                        .and_then(|data| data.get("attributes"))
                        .cloned()
                        .unwrap_or_else(|| json!({}));
                    (
                        201,
                        json!({
                            "data": {
                                "type": op.resource_type,
                                "id": format!("generated-{}", index),
                                "attributes": attributes,
                            }
                        }),
                    )
                }
            };
            BatchResult {
                request_id: self_identifying.then(|| op.request_id.clone()),
                status,
                body,
            }
        })
        .collect();
    BatchResponse { results }
}

/// A JSON:API error document.
pub fn error_body(status: u16, title: &str) -> Value {
    json!({ "errors": [{ "status": status.to_string(), "title": title }] })
}

type Responder = dyn Fn(&WireEnvelope) -> Result<BatchResponse, TransportError> + Send + Sync;

/// Transport that records every envelope and answers with a closure.
pub struct MockTransport {
    responder: Box<Responder>,
    calls: Mutex<Vec<WireEnvelope>>,
}

impl MockTransport {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&WireEnvelope) -> Result<BatchResponse, TransportError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A mock backed by [`empty_database_backend`].
    pub fn empty_database(self_identifying: bool) -> Self {
        Self::new(move |envelope| Ok(empty_database_backend(envelope, self_identifying)))
    }

    pub fn calls(&self) -> Vec<WireEnvelope> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send_batch(&self, envelope: &WireEnvelope) -> Result<BatchResponse, TransportError> {
        self.calls.lock().unwrap().push(envelope.clone());
        (self.responder)(envelope)
    }
}
