use crate::{AuthorizationProvider, CompilerConfig, Diagnostic};
use cypher_builder::{Params, ast::Variable};
use graph_value::GraphValue;
use indexmap::IndexSet;
use query_structure::{Entity, Schema};
use serde::{Deserialize, Serialize};

/// Name of the shared parameter holding the token claims.
pub(crate) const JWT_PARAM: &str = "jwt";

/// Name of the shared parameter telling whether the request is authenticated.
pub(crate) const AUTHENTICATED_PARAM: &str = "isAuthenticated";

/// The identity a request runs under.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    /// Decoded and verified token claims.
    #[serde(default)]
    pub jwt: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    pub is_authenticated: bool,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(claims: serde_json::Map<String, serde_json::Value>) -> Self {
        RequestContext {
            jwt: Some(claims),
            is_authenticated: true,
        }
    }

    /// Parameters every statement of the request may reference.
    pub(crate) fn shared_params(&self) -> Params {
        let claims = self.jwt.clone().unwrap_or_default();
        let jwt = GraphValue::try_from(serde_json::Value::Object(claims)).unwrap_or_default();

        let mut params = Params::new();
        params.insert(JWT_PARAM.to_owned(), jwt);
        params.insert(AUTHENTICATED_PARAM.to_owned(), GraphValue::Boolean(self.is_authenticated));
        params
    }
}

/// Which operation brought the traversal to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Origin {
    Read,
    Create,
    Update,
    Delete,
    Connect,
    Disconnect,
    ConnectOrCreate,
}

#[derive(Debug, Clone)]
pub(crate) struct Frame {
    pub(crate) entity: Entity,
    pub(crate) variable: Variable,
    pub(crate) origin: Origin,
    /// The node is created by the program itself.
    pub(crate) created: bool,
}

impl Frame {
    pub(crate) fn new(entity: Entity, variable: Variable, origin: Origin) -> Self {
        Frame {
            created: origin == Origin::Create,
            entity,
            variable,
            origin,
        }
    }
}

/// Position of a write step in the nested input. Entering a node returns a new context, the
/// parent's one stays untouched.
#[derive(Debug, Clone)]
pub(crate) struct TraversalContext {
    current: Frame,
    ancestors: Vec<Frame>,
}

impl TraversalContext {
    pub(crate) fn root(frame: Frame) -> Self {
        TraversalContext {
            current: frame,
            ancestors: Vec::new(),
        }
    }

    pub(crate) fn enter(&self, frame: Frame) -> Self {
        let mut ancestors = self.ancestors.clone();
        ancestors.push(self.current.clone());

        TraversalContext {
            current: frame,
            ancestors,
        }
    }

    pub(crate) fn node(&self) -> &Frame {
        &self.current
    }

    pub(crate) fn parent(&self) -> Option<&Frame> {
        self.ancestors.last()
    }

    pub(crate) fn depth(&self) -> usize {
        self.ancestors.len()
    }

    /// Nodes created in the same program are not checked by `before` rules.
    pub(crate) fn node_is_new(&self) -> bool {
        self.current.created
    }
}

/// State of one compilation.
pub(crate) struct Session<'a> {
    pub(crate) schema: &'a Schema,
    pub(crate) config: &'a CompilerConfig,
    pub(crate) authorization: &'a dyn AuthorizationProvider,
    pub(crate) request: &'a RequestContext,
    diagnostics: IndexSet<Diagnostic>,
}

impl<'a> Session<'a> {
    pub(crate) fn new(
        schema: &'a Schema,
        config: &'a CompilerConfig,
        authorization: &'a dyn AuthorizationProvider,
        request: &'a RequestContext,
    ) -> Self {
        Session {
            schema,
            config,
            authorization,
            request,
            diagnostics: IndexSet::new(),
        }
    }

    /// Reports a deprecated input form, once per program.
    pub(crate) fn deprecated(&mut self, message: impl Into<String>) {
        if !self.config.deprecation_warnings {
            return;
        }

        let diagnostic = Diagnostic::deprecation(message);

        if !self.diagnostics.contains(&diagnostic) {
            tracing::warn!(message = %diagnostic.message, "deprecated input");
            self.diagnostics.insert(diagnostic);
        }
    }

    pub(crate) fn events(&self) -> bool {
        self.config.events
    }

    pub(crate) fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics.into_iter().collect()
    }
}
