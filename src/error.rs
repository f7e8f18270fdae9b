use crate::identifier::Identifier;
use thiserror::Error;

/// Errors raised while walking a nested spec into a dependency graph.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unknown operation keyword '{keyword}' at '{path}'")]
    UnknownOperationKeyword { path: String, keyword: String },

    #[error("Operation node at '{path}' has no string 'type' field")]
    MissingResourceType { path: String },

    #[error("Identifier '{0}' was produced by more than one operation node")]
    DuplicateIdentifier(Identifier),

    #[error("Operation node at '{path}' carries neither $create nor $find")]
    MissingOperation { path: String },

    #[error("Operation node at '{path}' carries both $create and $find")]
    ConflictingOperations { path: String },

    #[error("Invalid modifier '{modifier}' at '{path}': {message}")]
    InvalidModifier {
        path: String,
        modifier: String,
        message: String,
    },

    #[error("Invalid payload at '{path}': {message}")]
    InvalidPayload { path: String, message: String },

    #[error("Dependency graph invariant violated: {0}")]
    InvariantViolation(String),
}

/// Errors that can occur while linearizing a dependency graph into a wire envelope.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("Dependency cycle detected; {} subrequest(s) could not be ordered: {}", remaining.len(), remaining.join(", "))]
    CyclicDependency { remaining: Vec<String> },

    #[error("Dependency graph invariant violated: {0}")]
    InvariantViolation(String),
}

/// Failures of the single network exchange. Always fatal to a `send`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("Transport is not configured: {0}")]
    Config(String),

    #[error("Batch request to '{url}' failed: {message}")]
    Request { url: String, message: String },

    #[error("Backend rejected the batch with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Failed to decode the batched response: {0}")]
    Decode(String),
}

/// Umbrella error for the full `parse -> compile -> send` pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
