use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Token every identifier starts with.
pub const ROOT_TOKEN: &str = "$ROOT";

/// The kind of subrequest an operation node compiles to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Create,
    Find,
    CreateIfNotFound,
}

impl Action {
    /// The keyword used for this action inside identifiers.
    pub fn keyword(&self) -> &'static str {
        match self {
            Action::Create => "$create",
            Action::Find => "$find",
            Action::CreateIfNotFound => "$createIfNotFound",
        }
    }

    /// Whether the backend answers this action with a newly created resource.
    pub fn creates(&self) -> bool {
        matches!(self, Action::Create | Action::CreateIfNotFound)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// One traversal step from a parent operation node to a child.
///
/// `container` is the relationship field of the parent that holds the child,
/// already rendered (`location`, or `category[1]` for an item of a to-many
/// field). The root step has no container.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathStep {
    pub container: Option<String>,
    pub action: Action,
    pub resource_type: String,
}

impl PathStep {
    pub fn new(container: Option<String>, action: Action, resource_type: impl Into<String>) -> Self {
        Self {
            container,
            action,
            resource_type: resource_type.into(),
        }
    }

    fn render_into(&self, out: &mut String) {
        if let Some(field) = &self.container {
            out.push('.');
            out.push_str(field);
        }
        out.push_str("::");
        out.push_str(self.action.keyword());
        out.push(':');
        out.push_str(&self.resource_type);
    }
}

/// Deterministic, path-derived name of a subrequest.
///
/// `$ROOT::$create:log--input.location::$find:asset--land` names the find
/// reached through the `location` field of the root log.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// The identifier of the empty path.
    pub fn root() -> Self {
        Identifier(ROOT_TOKEN.to_string())
    }

    /// Renders a full path, root first.
    pub fn from_path(steps: &[PathStep]) -> Self {
        steps
            .iter()
            .fold(Self::root(), |id, step| id.child(step))
    }

    /// Extends this identifier by one step.
    pub fn child(&self, step: &PathStep) -> Self {
        let mut rendered = self.0.clone();
        step.render_into(&mut rendered);
        Identifier(rendered)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == ROOT_TOKEN
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Identifier {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Identifier(value.to_string())
    }
}

impl From<String> for Identifier {
    fn from(value: String) -> Self {
        Identifier(value)
    }
}

impl PartialEq<str> for Identifier {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Identifier {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
