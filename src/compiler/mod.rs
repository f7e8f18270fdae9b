//! Linearizes a [`DependencyGraph`] into a single [`WireEnvelope`].

use crate::error::CompileError;
use crate::graph::DependencyGraph;
use crate::wire::WireEnvelope;
use tracing::debug;

mod builder;
mod order;

use builder::EnvelopeBuilder;

/// Compiles a dependency graph into one ordered batch.
///
/// Every operation appears after all the operations it depends on; ties are
/// broken by the graph's insertion order. Relationship fields fed by another
/// subrequest carry back-references that the backend resolves while it
/// executes the batch.
pub fn compile(graph: &DependencyGraph) -> Result<WireEnvelope, CompileError> {
    let order = order::topological_order(graph)?;
    let envelope = EnvelopeBuilder::new(graph, &order).build(&order)?;

    for (index, operation) in envelope.operations.iter().enumerate() {
        debug!(
            index,
            request_id = %operation.request_id,
            op = ?operation.op,
            wait_for = operation.wait_for.len(),
            "compiled subrequest"
        );
    }
    Ok(envelope)
}
