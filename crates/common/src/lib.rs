//! Common types and utilities for the service proxy compiler
//!
//! This crate contains the proxy declaration model, the CloudFormation
//! template document and the error type shared by the parser, compiler and
//! CLI components.

mod declaration;
mod family;
pub mod naming;
mod template;

pub use declaration::{
    Authorization, CorsConfig, ObjectAction, ObjectStoreParams, ParamBinding, ProxyDeclaration,
    QueueParams, RawProxyEntry, ResourceReference, ServiceParams, StreamAction, StreamParams,
    TopicParams, ValidatedSet, ValueSource,
};
pub use family::{HttpMethod, ServiceFamily};
pub use template::{merge_value, resource_types, union_values, Resource, Template};

use std::fmt;
use thiserror::Error;

/// Errors that can occur while validating or compiling service proxies
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Invalid service proxy at index {index} ({declaration}): {kind}: {message}")]
    Validation {
        index: usize,
        declaration: String,
        kind: ValidationKind,
        message: String,
    },

    #[error("Unsupported service family '{family}' in service proxy at index {index}")]
    UnsupportedFamily { index: usize, family: String },

    #[error("Duplicate {method} method on resource {resource}")]
    DuplicateMethod { resource: String, method: String },

    #[error("Missing dependency: {0}")]
    MissingDependency(String),

    #[error("Expected at most one deployment resource, found {}: {}", .ids.len(), .ids.join(", "))]
    DeploymentInvariant { ids: Vec<String> },

    #[error("Resource {logical_id} conflicts with an existing resource: {reason}")]
    DocumentConflict { logical_id: String, reason: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ProxyError {
    /// Build a validation error for the declaration at `index`
    pub fn validation(
        index: usize,
        declaration: impl Into<String>,
        kind: ValidationKind,
        message: impl Into<String>,
    ) -> Self {
        ProxyError::Validation {
            index,
            declaration: declaration.into(),
            kind,
            message: message.into(),
        }
    }

    /// Validation kind, if this is a validation error
    pub fn validation_kind(&self) -> Option<ValidationKind> {
        match self {
            ProxyError::Validation { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Result type for service proxy operations
pub type Result<T> = std::result::Result<T, ProxyError>;

/// The distinct reasons a declaration can be rejected by validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationKind {
    MalformedEntry,
    MissingField,
    InvalidMethod,
    InvalidPath,
    DuplicateMethod,
    FamilyConstraint,
    ConflictingOptions,
}

impl fmt::Display for ValidationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValidationKind::MalformedEntry => "malformed entry",
            ValidationKind::MissingField => "missing field",
            ValidationKind::InvalidMethod => "invalid method",
            ValidationKind::InvalidPath => "invalid path",
            ValidationKind::DuplicateMethod => "duplicate method",
            ValidationKind::FamilyConstraint => "family constraint",
            ValidationKind::ConflictingOptions => "conflicting options",
        };
        f.write_str(name)
    }
}

/// Validates raw proxy entries into typed declarations.
///
/// Implemented by the parser crate; kept here so the compiler can hold any
/// validator without depending on a concrete one.
pub trait DeclarationValidator {
    fn validate(&self, entries: &[RawProxyEntry]) -> Result<ValidatedSet>;
}
