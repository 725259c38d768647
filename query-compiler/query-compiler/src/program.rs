use cypher_builder::Params;
use serde::Serialize;

/// The compiled form of one operation, executed by the database in a single round trip.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    pub cypher: String,
    pub params: Params,
    pub diagnostics: Vec<Diagnostic>,
    /// Columns of the result rows: `this` for reads, `data` (and `meta` with events) for writes.
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticKind {
    Deprecation,
}

impl Diagnostic {
    pub fn deprecation(message: impl Into<String>) -> Self {
        Diagnostic {
            kind: DiagnosticKind::Deprecation,
            message: message.into(),
        }
    }
}
