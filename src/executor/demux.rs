use crate::identifier::Identifier;
use crate::response::{ResponseEntry, Responses};
use crate::wire::{BatchResponse, BatchResult, WireEnvelope};
use ahash::AHashMap;
use indexmap::IndexMap;
use tracing::warn;

/// Maps the entries of a batched response back onto the request ids of the
/// envelope that produced it.
///
/// When every result names its `requestId` the results are matched by id;
/// otherwise they are matched by position. Each operation of the envelope
/// gets exactly one entry: slots the backend left empty receive a synthetic
/// error entry.
pub fn demultiplex(envelope: &WireEnvelope, response: BatchResponse) -> Responses {
    let self_identifying =
        !response.results.is_empty() && response.results.iter().all(|r| r.request_id.is_some());

    let mut by_id: AHashMap<Identifier, BatchResult> = if self_identifying {
        let mut matched = AHashMap::with_capacity(response.results.len());
        for result in response.results {
            let Some(id) = result.request_id.clone() else {
                continue;
            };
            if envelope.position(id.as_str()).is_none() {
                warn!(request_id = %id, "ignoring result for unknown subrequest");
                continue;
            }
            if matched.insert(id.clone(), result).is_some() {
                warn!(request_id = %id, "subrequest answered more than once; keeping the last result");
            }
        }
        matched
    } else {
        if response.results.len() > envelope.len() {
            warn!(
                expected = envelope.len(),
                received = response.results.len(),
                "ignoring surplus results in batched response"
            );
        }
        envelope
            .request_ids()
            .cloned()
            .zip(response.results)
            .collect()
    };

    let entries: IndexMap<Identifier, ResponseEntry> = envelope
        .request_ids()
        .map(|id| {
            let entry = match by_id.remove(id) {
                Some(result) => ResponseEntry::new(result.status, result.body),
                None => {
                    warn!(request_id = %id, "no result returned for subrequest");
                    ResponseEntry::missing(id)
                }
            };
            (id.clone(), entry)
        })
        .collect();

    Responses::from_entries(entries)
}
