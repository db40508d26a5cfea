//! Error and warning types for the layout engine.
//!
//! Mirrors the teacher's plain `Result<_, String>` call sites but gives each
//! failure mode from spec §7 its own variant, the way `graphitude` models
//! its arena errors with `thiserror`.

use thiserror::Error;

/// One of the seven error kinds a Graph operation or layout pass can raise.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Error in attribute: '{name}' is not a known attribute for a {class}")]
    InvalidAttributeName { class: String, name: String },

    #[error("Error in attribute: '{value}' is not a valid {kind} for a {class}.{name}")]
    InvalidAttributeValue {
        class: String,
        name: String,
        value: String,
        kind: String,
    },

    #[error("'{name}' already identifies a {existing_kind}, cannot add as {wanted_kind}")]
    DuplicateIdentity {
        name: String,
        existing_kind: String,
        wanted_kind: String,
    },

    #[error("layout of graph with {node_count} nodes exceeded the {timeout_secs}s timeout")]
    LayoutTimeout { node_count: usize, timeout_secs: u64 },

    #[error("layout exhausted its try-budget after {tries} attempts; surfacing a partial layout")]
    LayoutBudgetExceeded { tries: u64 },

    #[error("no route found for edge {edge_id} from '{from}' to '{to}'")]
    Unrouteable {
        edge_id: u32,
        from: String,
        to: String,
    },

    #[error("internal invariant violated: {0}")]
    Internal(String),

    #[error("{0} is not implemented")]
    Unsupported(String),
}

/// Whether an error kind is fatal (aborts the call) or can be downgraded to
/// a warning, per §6.4's `strict`/`fatal_errors` options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Fatal,
    Warning,
}

impl GraphError {
    /// Default severity before `strict`/`fatal_errors` are taken into account.
    pub fn default_severity(&self) -> Severity {
        match self {
            GraphError::InvalidAttributeName { .. } => Severity::Warning,
            GraphError::InvalidAttributeValue { .. } => Severity::Fatal,
            GraphError::DuplicateIdentity { .. } => Severity::Fatal,
            GraphError::LayoutTimeout { .. } => Severity::Warning,
            GraphError::LayoutBudgetExceeded { .. } => Severity::Warning,
            GraphError::Unrouteable { .. } => Severity::Warning,
            GraphError::Internal(_) => Severity::Fatal,
            GraphError::Unsupported(_) => Severity::Fatal,
        }
    }
}

/// A warning accumulated on the Graph when catch mode is enabled (§4.1,
/// §7 "Propagation").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphWarning {
    pub error: GraphError,
}

pub type GraphResult<T> = Result<T, GraphError>;
