//! The client façade: parse, compile, send once, demultiplex.

use crate::compiler;
use crate::error::{CompileError, Error, ParseError};
use crate::graph::DependencyGraph;
use crate::parser;
use crate::response::Responses;
use crate::transport::Transport;
use crate::wire::WireEnvelope;
use serde_json::Value;
use tracing::{info, warn};

mod demux;

pub use demux::demultiplex;

/// Sends nested find-or-create specs as single batched requests.
///
/// ```rust,no_run
/// use serde_json::json;
/// use subrequests::prelude::*;
///
/// # async fn run() -> Result<(), subrequests::error::Error> {
/// let transport = HttpTransport::new(TransportConfig::from_env()?);
/// let client = Subrequests::builder(transport).build();
///
/// let responses = client
///     .send(&json!({ "$create": { "type": "log--input", "name": "west field bed 12" } }))
///     .await?;
/// for (id, entry) in responses.iter() {
///     println!("{} -> {}", id, entry.status);
/// }
/// # Ok(())
/// # }
/// ```
pub struct Subrequests<T> {
    transport: T,
}

pub struct SubrequestsBuilder<T> {
    transport: T,
}

impl<T: Transport> SubrequestsBuilder<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn build(self) -> Subrequests<T> {
        Subrequests {
            transport: self.transport,
        }
    }
}

impl<T: Transport> Subrequests<T> {
    pub fn builder(transport: T) -> SubrequestsBuilder<T> {
        SubrequestsBuilder::new(transport)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Parses a spec into its dependency graph. No I/O.
    pub fn parse(&self, spec: &Value) -> Result<DependencyGraph, ParseError> {
        parser::parse(spec)
    }

    /// Parses and compiles a spec into the envelope `send` would transmit.
    pub fn compile(&self, spec: &Value) -> Result<WireEnvelope, Error> {
        let graph = parser::parse(spec)?;
        Ok(compiler::compile(&graph)?)
    }

    /// Parses, compiles and sends a spec in one round trip.
    ///
    /// Fails only when the spec is invalid or the transport fails; individual
    /// subrequest failures are reported as error entries in the result.
    pub async fn send(&self, spec: &Value) -> Result<Responses, Error> {
        let graph = parser::parse(spec)?;
        let envelope = compiler::compile(&graph)?;
        if envelope.len() != graph.len() {
            return Err(CompileError::InvariantViolation(format!(
                "compiled {} operations from {} subrequests",
                envelope.len(),
                graph.len()
            ))
            .into());
        }

        let response = self.transport.send_batch(&envelope).await?;
        let responses = demultiplex(&envelope, response);

        let failed = responses.failures().count();
        if failed > 0 {
            warn!(failed, total = responses.len(), "batch completed with failed subrequests");
        } else {
            info!(total = responses.len(), "batch completed");
        }
        Ok(responses)
    }
}
