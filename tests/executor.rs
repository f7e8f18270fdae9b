//! End-to-end tests of `send`: one round trip, complete and isolated results.
mod common;
use common::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use subrequests::prelude::*;
use subrequests::response::MISSING_RESPONSE_STATUS;
use tokio_test::block_on;

fn id_set<'a>(ids: impl Iterator<Item = &'a Identifier>) -> HashSet<String> {
    ids.map(|id| id.to_string()).collect()
}

#[test]
fn test_send_answers_every_parsed_identifier() {
    let client = Subrequests::builder(MockTransport::empty_database(false)).build();
    let spec = create_farm_log_spec();

    let graph = client.parse(&spec).expect("Failed to parse");
    let responses = block_on(client.send(&spec)).expect("Failed to send");

    assert_eq!(id_set(responses.ids()), id_set(graph.ids()));
    assert_eq!(responses.failures().count(), 0);
}

#[test]
fn test_send_makes_exactly_one_round_trip() {
    let transport = Arc::new(MockTransport::empty_database(true));
    let client = Subrequests::builder(Arc::clone(&transport)).build();

    block_on(client.send(&create_farm_log_spec())).expect("Failed to send");

    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].len(), 10);
    assert_eq!(
        calls[0],
        client.compile(&create_farm_log_spec()).expect("Failed to compile")
    );
}

#[test]
fn test_created_resources_are_returned_under_their_identifiers() {
    let client = Subrequests::builder(MockTransport::empty_database(false)).build();
    let responses = block_on(client.send(&create_farm_log_spec())).expect("Failed to send");

    let input = responses.get(LOG_ID).expect("log response missing");
    assert_eq!(input.status, 201);
    let log = input.resource().expect("log resource missing");
    assert_eq!(log["type"], json!("log--input"));
    assert_eq!(log["attributes"]["name"], json!("west field bed 12"));

    let quantity = responses
        .get(QUANTITY_ID)
        .and_then(ResponseEntry::resource)
        .expect("quantity resource missing");
    assert_eq!(quantity["type"], json!("quantity--standard"));
    assert_eq!(quantity["attributes"]["label"], json!("hhh"));

    let location = responses.get(LOCATION_FIND_ID).unwrap();
    assert!(location.is_success());
    assert_eq!(location.resource(), None);
}

#[test]
fn test_self_identifying_results_are_matched_by_id() {
    // Deliver results in reverse order; ids must still line up.
    let transport = MockTransport::new(|envelope| {
        let mut response = empty_database_backend(envelope, true);
        response.results.reverse();
        Ok(response)
    });
    let client = Subrequests::builder(transport).build();
    let responses = block_on(client.send(&create_farm_log_spec())).expect("Failed to send");

    assert_eq!(responses.get(OWNER_FIND_ID).unwrap().status, 200);
    assert_eq!(
        responses.get(OWNER_CREATE_ID).unwrap().resource().unwrap()["type"],
        json!("user--user")
    );
    assert_eq!(
        responses.ids().map(|id| id.as_str()).last(),
        Some(LOG_ID),
        "entries follow execution order"
    );
}

#[test]
fn test_failed_pair_does_not_affect_independent_siblings() {
    let transport = MockTransport::new(|envelope| {
        let mut response = empty_database_backend(envelope, false);
        for (operation, result) in envelope.operations.iter().zip(response.results.iter_mut()) {
            let id = operation.request_id.as_str();
            if id == LOCATION_FIND_ID || id == LOCATION_CREATE_ID {
                result.status = 422;
                result.body = error_body(422, "Unprocessable Entity");
            }
            if id == LOG_ID {
                result.status = 424;
                result.body = error_body(424, "Failed Dependency");
            }
        }
        Ok(response)
    });
    let client = Subrequests::builder(transport).build();
    let responses = block_on(client.send(&create_farm_log_spec())).expect("Failed to send");

    assert_eq!(responses.len(), 10);

    let failed: HashSet<&str> = responses.failures().map(|(id, _)| id.as_str()).collect();
    assert_eq!(
        failed,
        [LOCATION_FIND_ID, LOCATION_CREATE_ID, LOG_ID].into_iter().collect()
    );

    for id in [CATEGORY_CREATE_ID, OWNER_CREATE_ID, QUANTITY_ID] {
        let entry = responses.get(id).expect("sibling missing");
        assert!(entry.is_success(), "{} should have succeeded", id);
        assert!(entry.resource().is_some());
    }

    let location = responses.get(LOCATION_FIND_ID).unwrap();
    assert_eq!(location.errors().len(), 1);
    assert_eq!(location.data(), None);
}

#[test]
fn test_missing_results_get_error_slots() {
    let transport = MockTransport::new(|envelope| {
        let mut response = empty_database_backend(envelope, false);
        response.results.truncate(4);
        Ok(response)
    });
    let client = Subrequests::builder(transport).build();
    let spec = create_farm_log_spec();
    let responses = block_on(client.send(&spec)).expect("Failed to send");

    assert_eq!(id_set(responses.ids()), id_set(client.parse(&spec).unwrap().ids()));
    assert!(responses.get(CATEGORY_CREATE_ID).unwrap().is_success());

    let log = responses.get(LOG_ID).unwrap();
    assert_eq!(log.status, MISSING_RESPONSE_STATUS);
    assert!(!log.is_success());
    assert_eq!(responses.failures().count(), 6);
}

#[test]
fn test_results_for_unknown_ids_are_ignored() {
    let transport = MockTransport::new(|envelope| {
        let mut response = empty_database_backend(envelope, true);
        response.results.push(BatchResult {
            request_id: Some(Identifier::from("$ROOT::$create:unrelated--thing")),
            status: 201,
            body: json!({ "data": null }),
        });
        Ok(response)
    });
    let client = Subrequests::builder(transport).build();
    let responses = block_on(client.send(&create_farm_log_spec())).expect("Failed to send");

    assert_eq!(responses.len(), 10);
    assert!(!responses.contains("$ROOT::$create:unrelated--thing"));
}

#[test]
fn test_transport_failure_rejects_the_whole_send() {
    let transport = MockTransport::new(|_| {
        Err(TransportError::Status {
            status: 401,
            message: "unauthorized".to_string(),
        })
    });
    let client = Subrequests::builder(transport).build();

    match block_on(client.send(&create_farm_log_spec())) {
        Err(Error::Transport(TransportError::Status { status, .. })) => assert_eq!(status, 401),
        other => panic!("Expected a transport error, got {:?}", other),
    }
}

#[test]
fn test_invalid_spec_never_reaches_the_transport() {
    let transport = Arc::new(MockTransport::empty_database(false));
    let client = Subrequests::builder(Arc::clone(&transport)).build();

    let result = block_on(client.send(&json!({ "$create": { "name": "untyped" } })));

    assert!(matches!(
        result,
        Err(Error::Parse(ParseError::MissingResourceType { .. }))
    ));
    assert!(transport.calls().is_empty());
}

#[test]
fn test_demultiplex_by_position() {
    let envelope = compile(&parse(&create_farm_log_spec()).unwrap()).unwrap();
    let response = empty_database_backend(&envelope, false);

    let responses = demultiplex(&envelope, response);
    let order: Vec<&Identifier> = responses.ids().collect();
    let expected: Vec<&Identifier> = envelope.request_ids().collect();
    assert_eq!(order, expected);
    assert_eq!(responses.get(UNITS_CREATE_ID).unwrap().status, 201);
}
