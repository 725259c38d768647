#![deny(unsafe_code, rust_2018_idioms)]

//! Compiles nested reads and writes over a graph schema into a single Cypher program with a
//! parameter map.
//!
//! ```text
//! Operation ──▶ extractors ──▶ filter IR / arguments ──▶ read | write ──▶ Statement ──▶ Program
//!                                    │                        ▲
//!                                    └──── authorization ─────┘
//! ```

mod authorization;
mod builder;
mod config;
mod context;
mod error;
mod extractors;
mod input;
mod operation;
mod program;
mod read;
mod translate;
mod write;

#[cfg(test)]
mod test_schema;

pub use authorization::{AuthorizationProvider, SchemaAuthorization};
pub use config::CompilerConfig;
pub use context::RequestContext;
pub use error::{CompileError, InputValidationError, RuntimeError, RuntimeViolation};
pub use extractors::offset_to_cursor;
pub use input::{InputMap, InputValue};
pub use operation::*;
pub use program::{Diagnostic, DiagnosticKind, Program};

pub(crate) type CompileResult<T> = Result<T, CompileError>;

use context::Session;
use cypher_builder::visitor::{Cypher, Visitor};
use query_structure::Schema;
use std::sync::Arc;

/// Compiles operations against one schema. Cheap to clone and share between threads.
#[derive(Clone)]
pub struct QueryCompiler {
    schema: Arc<Schema>,
    config: CompilerConfig,
    authorization: Arc<dyn AuthorizationProvider>,
}

impl QueryCompiler {
    pub fn new(schema: Schema) -> Self {
        QueryCompiler {
            schema: Arc::new(schema),
            config: CompilerConfig::default(),
            authorization: Arc::new(SchemaAuthorization),
        }
    }

    pub fn with_config(mut self, config: CompilerConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the rules declared in the schema.
    pub fn with_authorization(mut self, authorization: impl AuthorizationProvider + 'static) -> Self {
        self.authorization = Arc::new(authorization);
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compiles one operation for one request. Fails without a program when the operation does
    /// not fit the schema.
    #[tracing::instrument(skip_all, fields(operation = operation.name(), target = operation.target()))]
    pub fn compile(&self, operation: &Operation, request: &RequestContext) -> Result<Program, CompileError> {
        let mut session = Session::new(&self.schema, &self.config, self.authorization.as_ref(), request);
        let compiled = builder::build(&mut session, operation)?;

        let shared = request.shared_params();
        let (cypher, mut params) = Cypher::build(&compiled.statement, &shared)?;

        // Computed field statements may refer to the shared parameters by name.
        for (name, value) in shared {
            if !params.contains_key(&name) && cypher.contains(&format!("${name}")) {
                params.insert(name, value);
            }
        }

        tracing::debug!(params = params.len(), "compiled program");

        Ok(Program {
            cypher,
            params,
            diagnostics: session.into_diagnostics(),
            columns: compiled.columns,
        })
    }
}

impl std::fmt::Debug for QueryCompiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCompiler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
