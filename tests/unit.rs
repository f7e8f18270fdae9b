//! Unit tests for identifiers, response entries, configuration and errors.
use serde_json::json;
use std::collections::HashMap;
use subrequests::prelude::*;
use subrequests::transport::config::{DEFAULT_BATCH_PATH, ENV_AUTH_TOKEN, ENV_BASE_URL, ENV_TIMEOUT_SECS};

#[test]
fn test_empty_path_renders_root() {
    assert_eq!(Identifier::from_path(&[]).as_str(), "$ROOT");
    assert!(Identifier::root().is_root());
}

#[test]
fn test_identifier_rendering() {
    let path = vec![
        PathStep::new(None, Action::Create, "log--input"),
        PathStep::new(Some("location".to_string()), Action::Find, "asset--land"),
    ];
    let id = Identifier::from_path(&path);
    assert_eq!(id.as_str(), "$ROOT::$create:log--input.location::$find:asset--land");
    assert_eq!(format!("{}", id), id.as_str());
    assert!(!id.is_root());

    let stepwise = Identifier::root().child(&path[0]).child(&path[1]);
    assert_eq!(stepwise, id);
}

#[test]
fn test_sibling_fields_never_collide() {
    let parent = Identifier::root().child(&PathStep::new(None, Action::Create, "log--input"));
    let location = parent.child(&PathStep::new(Some("location".to_string()), Action::Find, "asset--land"));
    let field = parent.child(&PathStep::new(Some("field".to_string()), Action::Find, "asset--land"));
    let fallback = parent.child(&PathStep::new(
        Some("location".to_string()),
        Action::CreateIfNotFound,
        "asset--land",
    ));

    assert_ne!(location, field);
    assert_ne!(location, fallback);
    assert_eq!(
        fallback.as_str(),
        "$ROOT::$create:log--input.location::$createIfNotFound:asset--land"
    );
}

#[test]
fn test_action_keywords() {
    assert_eq!(Action::Create.to_string(), "$create");
    assert_eq!(Action::Find.to_string(), "$find");
    assert_eq!(Action::CreateIfNotFound.to_string(), "$createIfNotFound");
    assert!(Action::CreateIfNotFound.creates());
    assert!(!Action::Find.creates());
}

#[test]
fn test_response_entry_helpers() {
    let single = ResponseEntry::new(201, json!({ "data": { "type": "log--input", "id": "1" } }));
    assert!(single.is_success());
    assert_eq!(single.resource().unwrap()["id"], json!("1"));
    assert!(single.errors().is_empty());

    let list = ResponseEntry::new(
        200,
        json!({ "data": [{ "type": "asset--land", "id": "a" }, { "type": "asset--land", "id": "b" }] }),
    );
    assert_eq!(list.resource().unwrap()["id"], json!("a"));

    let skipped = ResponseEntry::new(204, json!({ "data": null }));
    assert!(skipped.is_success());
    assert_eq!(skipped.data(), None);
    assert_eq!(skipped.resource(), None);

    let missing = ResponseEntry::missing(&Identifier::from("$ROOT::$find:asset--land"));
    assert!(!missing.is_success());
    assert_eq!(missing.errors().len(), 1);
    assert!(
        missing.errors()[0]["detail"]
            .as_str()
            .unwrap()
            .contains("$ROOT::$find:asset--land")
    );
}

#[test]
fn test_transport_config_from_lookup() {
    let vars: HashMap<&str, &str> = [
        (ENV_BASE_URL, "https://farm.example.com/"),
        (ENV_AUTH_TOKEN, "secret"),
        (ENV_TIMEOUT_SECS, "30"),
    ]
    .into_iter()
    .collect();

    let config = TransportConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
        .expect("Failed to build config");
    assert_eq!(config.batch_path, DEFAULT_BATCH_PATH);
    assert_eq!(config.auth_token.as_deref(), Some("secret"));
    assert_eq!(config.timeout_secs, Some(30));
    assert_eq!(config.batch_url(), "https://farm.example.com/api/subrequests");
}

#[test]
fn test_transport_config_rejects_bad_values() {
    assert!(matches!(
        TransportConfig::from_lookup(|_| None),
        Err(TransportError::Config(_))
    ));
    assert!(matches!(
        TransportConfig::from_lookup(|key| (key == ENV_BASE_URL).then(|| "farm.example.com".to_string())),
        Err(TransportError::Config(_))
    ));
    assert!(matches!(
        TransportConfig::from_lookup(|key| match key {
            ENV_BASE_URL => Some("http://localhost".to_string()),
            ENV_TIMEOUT_SECS => Some("soon".to_string()),
            _ => None,
        }),
        Err(TransportError::Config(_))
    ));
}

#[test]
fn test_transport_config_from_json() {
    let config = TransportConfig::from_json(
        r#"{ "baseUrl": "http://localhost:8080", "batchPath": "subrequests", "timeoutSecs": 5 }"#,
    )
    .expect("Failed to parse config");

    assert_eq!(config.batch_url(), "http://localhost:8080/subrequests");
    assert_eq!(config.auth_token, None);
    assert_eq!(
        config,
        TransportConfig::new("http://localhost:8080")
            .with_batch_path("subrequests")
            .with_timeout_secs(5)
    );
}

#[test]
fn test_error_display() {
    let err = ParseError::UnknownOperationKeyword {
        path: "$ROOT::$create:log--input.location".to_string(),
        keyword: "$first".to_string(),
    };
    assert!(err.to_string().contains("$first"));
    assert!(err.to_string().contains("log--input.location"));

    let cycle = CompileError::CyclicDependency {
        remaining: vec!["a".to_string(), "b".to_string()],
    };
    assert!(cycle.to_string().contains("2 subrequest(s)"));
    assert!(cycle.to_string().contains("a, b"));

    let wrapped: Error = TransportError::Status {
        status: 503,
        message: "maintenance".to_string(),
    }
    .into();
    assert!(wrapped.to_string().contains("503"));
}
