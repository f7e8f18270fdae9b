//! # Subrequests - Batched Find-or-Create Compiler
//!
//! **Subrequests** turns one declarative, nested description of entities to
//! find or create into a single JSON:API batch request. Nested operations
//! become separate subrequests; the references between them become
//! back-references the backend resolves while it executes the batch. The
//! batched answer is then mapped back onto deterministic, path-derived
//! identifiers.
//!
//! ## Core Workflow
//!
//! 1.  **Describe**: Write a spec as a `serde_json::Value` using the `$create`,
//!     `$find`, `$createIfNotFound`, `$limit` and `$sort` keywords.
//! 2.  **Parse**: [`parser::parse`] walks the spec into a [`graph::DependencyGraph`]
//!     of subrequests keyed by [`identifier::Identifier`].
//! 3.  **Compile**: [`compiler::compile`] orders the graph so every dependency
//!     runs first and produces the [`wire::WireEnvelope`].
//! 4.  **Send**: [`executor::Subrequests::send`] does all of the above, issues
//!     exactly one request through a [`transport::Transport`], and returns a
//!     [`response::Responses`] map with one entry per subrequest.
//!
//! ## Quick Start
//!
//! ```rust
//! use serde_json::json;
//! use subrequests::prelude::*;
//!
//! let spec = json!({
//!     "$create": {
//!         "type": "log--input",
//!         "name": "west field bed 12",
//!         "quantity": {
//!             "$create": {
//!                 "type": "quantity--standard",
//!                 "label": "hhh",
//!                 "units": {
//!                     "$find": { "type": "taxonomy_term--unit", "name": "US_gal_acre" },
//!                     "$sort": { "weight": "DESC" },
//!                     "$limit": 1,
//!                     "$createIfNotFound": true,
//!                 },
//!             },
//!         },
//!     },
//! });
//!
//! let graph = parse(&spec).expect("valid spec");
//! assert_eq!(graph.len(), 4);
//!
//! let envelope = compile(&graph).expect("acyclic graph");
//! let order: Vec<_> = envelope.request_ids().map(|id| id.as_str()).collect();
//! assert_eq!(order.last(), Some(&"$ROOT::$create:log--input"));
//! ```

pub mod compiler;
pub mod error;
pub mod executor;
pub mod graph;
pub mod identifier;
pub mod parser;
pub mod prelude;
pub mod response;
pub mod transport;
pub mod wire;
