use crate::error::CompileError;
use crate::graph::{DependencyGraph, Descriptor};
use std::collections::BTreeSet;

/// Orders descriptors so that every dependency comes strictly before its
/// dependents (Kahn's algorithm).
///
/// Among descriptors that are ready at the same time, the one inserted first
/// into the graph wins, so identical graphs always produce identical orders.
pub(super) fn topological_order(graph: &DependencyGraph) -> Result<Vec<&Descriptor>, CompileError> {
    let descriptors: Vec<&Descriptor> = graph.iter().collect();
    let mut pending: Vec<usize> = vec![0; descriptors.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); descriptors.len()];

    for (index, descriptor) in descriptors.iter().enumerate() {
        for dependency in &descriptor.depends_on {
            let dependency_index = graph.position(dependency.as_str()).ok_or_else(|| {
                CompileError::InvariantViolation(format!(
                    "'{}' depends on unknown subrequest '{}'",
                    descriptor.id, dependency
                ))
            })?;
            pending[index] += 1;
            dependents[dependency_index].push(index);
        }
    }

    let mut ready: BTreeSet<usize> = pending
        .iter()
        .enumerate()
        .filter(|(_, count)| **count == 0)
        .map(|(index, _)| index)
        .collect();

    let mut order = Vec::with_capacity(descriptors.len());
    while let Some(index) = ready.pop_first() {
        order.push(descriptors[index]);
        for &dependent in &dependents[index] {
            pending[dependent] -= 1;
            if pending[dependent] == 0 {
                ready.insert(dependent);
            }
        }
    }

    if order.len() != descriptors.len() {
        let remaining = pending
            .iter()
            .enumerate()
            .filter(|(_, count)| **count > 0)
            .map(|(index, _)| descriptors[index].id.to_string())
            .collect();
        return Err(CompileError::CyclicDependency { remaining });
    }

    Ok(order)
}
