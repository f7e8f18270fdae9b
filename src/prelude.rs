//! Prelude module for convenient imports
//!
//! Re-exports the types most callers need to parse, compile and send a spec.
//!
//! # Example
//!
//! ```rust,no_run
//! use serde_json::json;
//! use subrequests::prelude::*;
//!
//! # async fn run() -> Result<(), Error> {
//! let client = Subrequests::builder(HttpTransport::new(TransportConfig::from_env()?)).build();
//! let responses = client
//!     .send(&json!({ "$find": { "type": "asset--land", "name": "west field bed 12" } }))
//!     .await?;
//! println!("{} subrequest(s) answered", responses.len());
//! # Ok(())
//! # }
//! ```

// Pipeline entry points
pub use crate::compiler::compile;
pub use crate::executor::{Subrequests, SubrequestsBuilder, demultiplex};
pub use crate::parser::parse;

// Graph and identifiers
pub use crate::graph::{Body, DependencyGraph, Descriptor};
pub use crate::identifier::{Action, Identifier, PathStep};

// Wire and responses
pub use crate::response::{ResponseEntry, Responses};
pub use crate::wire::{BatchResponse, BatchResult, WireEnvelope, WireOperation};

// Transport
pub use crate::transport::{HttpTransport, Transport, TransportConfig};

// Error types
pub use crate::error::{CompileError, Error, ParseError, TransportError};
