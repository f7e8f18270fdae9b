use crate::error::ParseError;
use crate::graph::{SortDirection, SortField};
use serde_json::{Map, Value};

/// Keywords an operation node may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Keyword {
    Create,
    Find,
    CreateIfNotFound,
    Limit,
    Sort,
}

impl Keyword {
    fn from_key(key: &str) -> Option<Self> {
        match key {
            "$create" => Some(Keyword::Create),
            "$find" => Some(Keyword::Find),
            "$createIfNotFound" => Some(Keyword::CreateIfNotFound),
            "$limit" => Some(Keyword::Limit),
            "$sort" => Some(Keyword::Sort),
            _ => None,
        }
    }
}

/// Whether a value is shaped like an operation node, i.e. an object with at
/// least one `$`-prefixed key. Unknown keywords are rejected later.
pub(super) fn is_operation_node(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|map| map.keys().any(|k| k.starts_with('$')))
}

/// A JSON:API resource identifier: `{"type": "...", "id": "..."}`.
pub(super) fn is_resource_identifier(value: &Value) -> bool {
    value.as_object().is_some_and(|map| {
        map.get("type").is_some_and(Value::is_string)
            && map.get("id").is_some_and(Value::is_string)
            && map.keys().all(|k| matches!(k.as_str(), "type" | "id" | "meta"))
    })
}

/// A value already shaped as a relationship object: `{"data": ...}`.
pub(super) fn is_relationship_object(value: &Value) -> bool {
    value.as_object().is_some_and(|map| {
        map.contains_key("data")
            && map.keys().all(|k| matches!(k.as_str(), "data" | "meta" | "links"))
    })
}

/// A validated operation node, borrowing its payload from the input spec.
#[derive(Debug)]
pub(super) enum OperationNode<'a> {
    Create {
        resource_type: &'a str,
        payload: &'a Map<String, Value>,
    },
    Find {
        resource_type: &'a str,
        filter: &'a Map<String, Value>,
        limit: Option<u64>,
        sort: Vec<SortField>,
        create_if_not_found: bool,
    },
}

impl<'a> OperationNode<'a> {
    /// Reads an operation node. `location` names the node's position for
    /// error messages.
    pub(super) fn from_value(value: &'a Value, location: &str) -> Result<Self, ParseError> {
        let map = value.as_object().ok_or_else(|| ParseError::InvalidPayload {
            path: location.to_string(),
            message: "expected an operation node object".to_string(),
        })?;

        let mut create = None;
        let mut find = None;
        let mut limit = None;
        let mut sort = None;
        let mut create_if_not_found = None;

        for (key, entry) in map {
            let keyword =
                Keyword::from_key(key).ok_or_else(|| ParseError::UnknownOperationKeyword {
                    path: location.to_string(),
                    keyword: key.clone(),
                })?;
            match keyword {
                Keyword::Create => create = Some(entry),
                Keyword::Find => find = Some(entry),
                Keyword::Limit => limit = Some(entry),
                Keyword::Sort => sort = Some(entry),
                Keyword::CreateIfNotFound => create_if_not_found = Some(entry),
            }
        }

        match (create, find) {
            (Some(_), Some(_)) => Err(ParseError::ConflictingOperations {
                path: location.to_string(),
            }),
            (None, None) => Err(ParseError::MissingOperation {
                path: location.to_string(),
            }),
            (Some(payload), None) => {
                let modifier = [
                    ("$limit", limit),
                    ("$sort", sort),
                    ("$createIfNotFound", create_if_not_found),
                ]
                .into_iter()
                .find_map(|(name, entry)| entry.map(|_| name));
                if let Some(modifier) = modifier {
                    return Err(invalid_modifier(location, modifier, "only valid next to $find"));
                }
                let payload = payload_object(payload, location)?;
                Ok(OperationNode::Create {
                    resource_type: resource_type(payload, location)?,
                    payload,
                })
            }
            (None, Some(filter)) => {
                let filter = payload_object(filter, location)?;
                Ok(OperationNode::Find {
                    resource_type: resource_type(filter, location)?,
                    filter,
                    limit: limit.map(|v| parse_limit(v, location)).transpose()?,
                    sort: sort
                        .map(|v| parse_sort(v, location))
                        .transpose()?
                        .unwrap_or_default(),
                    create_if_not_found: create_if_not_found
                        .map(|v| parse_create_if_not_found(v, location))
                        .transpose()?
                        .unwrap_or(false),
                })
            }
        }
    }
}

fn payload_object<'a>(
    value: &'a Value,
    location: &str,
) -> Result<&'a Map<String, Value>, ParseError> {
    value.as_object().ok_or_else(|| ParseError::InvalidPayload {
        path: location.to_string(),
        message: format!("operation payload must be an object, found {}", value),
    })
}

fn resource_type<'a>(payload: &'a Map<String, Value>, location: &str) -> Result<&'a str, ParseError> {
    payload
        .get("type")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ParseError::MissingResourceType {
            path: location.to_string(),
        })
}

fn parse_limit(value: &Value, location: &str) -> Result<u64, ParseError> {
    match value.as_u64() {
        Some(limit) if limit > 0 => Ok(limit),
        _ => Err(invalid_modifier(
            location,
            "$limit",
            &format!("expected a positive integer, found {}", value),
        )),
    }
}

fn parse_sort(value: &Value, location: &str) -> Result<Vec<SortField>, ParseError> {
    let fields = value
        .as_object()
        .ok_or_else(|| invalid_modifier(location, "$sort", "expected an object of field directions"))?;

    fields
        .iter()
        .map(|(field, direction)| {
            let direction = match direction.as_str().map(str::to_ascii_uppercase).as_deref() {
                Some("ASC") => SortDirection::Asc,
                Some("DESC") => SortDirection::Desc,
                _ => {
                    return Err(invalid_modifier(
                        location,
                        "$sort",
                        &format!("direction of '{}' must be ASC or DESC, found {}", field, direction),
                    ));
                }
            };
            Ok(SortField {
                field: field.clone(),
                direction,
            })
        })
        .collect()
}

fn parse_create_if_not_found(value: &Value, location: &str) -> Result<bool, ParseError> {
    value.as_bool().ok_or_else(|| {
        invalid_modifier(
            location,
            "$createIfNotFound",
            &format!("expected a boolean, found {}", value),
        )
    })
}

fn invalid_modifier(location: &str, modifier: &str, message: &str) -> ParseError {
    ParseError::InvalidModifier {
        path: location.to_string(),
        modifier: modifier.to_string(),
        message: message.to_string(),
    }
}
