//! Error types.
//!
//! Collaborator failures surface as `HostError`; the planning operations wrap
//! them in `PlanError`. Degenerate input and missing outlines are not errors.

use thiserror::Error;

/// Failure reported by a planning host.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HostError {
    #[error("unknown field `{0}`")]
    UnknownField(String),
    #[error("field request rejected: {0}")]
    Rejected(String),
    #[error("unknown structure `{0}`")]
    UnknownStructure(String),
    #[error("outline extraction failed: {0}")]
    Outline(String),
    #[error("dose calculation not permitted: {0}")]
    DoseCalculation(String),
    #[error("treatment field index {index} out of range ({count} fields)")]
    FieldIndex { index: usize, count: usize },
}

/// Failure of a planning operation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PlanError {
    #[error(transparent)]
    Host(#[from] HostError),
    #[error("expected {expected} weights, got {got}")]
    WeightCountMismatch { expected: usize, got: usize },
}
