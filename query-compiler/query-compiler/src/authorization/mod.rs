//! Authorization rules rendered as predicates.
//!
//! Filter rules restrict what a step sees. Validate rules abort the program: `before` rules are
//! checked on the matched nodes with `apoc.util.validatePredicate` inside the `WHERE`, `after`
//! rules with a `CALL apoc.util.validate` once the step has written.
mod provider;

pub use provider::*;

use crate::{
    CompileResult, RuntimeViolation,
    context::Session,
    extractors::{extract_claims_filter, extract_rule_filter},
    input::input_map_from_json,
    translate::filter_predicate,
};
use cypher_builder::ast::*;
use query_structure::{AuthorizationOperation, AuthorizationRule, Entity, Filter, ValidationWhen};

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct AuthorizationPredicates {
    /// Restricts the matched nodes.
    pub(crate) filter: Option<Predicate>,
    /// Must hold for the matched nodes before writing.
    pub(crate) before: Option<Predicate>,
    /// Must hold for the written nodes.
    pub(crate) after: Option<Predicate>,
}

impl AuthorizationPredicates {
    /// Both sets must hold, e.g. for the two nodes of a connect.
    pub(crate) fn and(self, other: AuthorizationPredicates) -> AuthorizationPredicates {
        AuthorizationPredicates {
            filter: conjunction(self.filter, other.filter),
            before: conjunction(self.before, other.before),
            after: conjunction(self.after, other.after),
        }
    }

    pub(crate) fn without_before(self) -> AuthorizationPredicates {
        AuthorizationPredicates { before: None, ..self }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.filter.is_none() && self.before.is_none() && self.after.is_none()
    }

    /// The filter rules and the `before` validation, to be AND-ed into a `WHERE`.
    pub(crate) fn where_predicate(&self) -> Predicate {
        let filter = self.filter.clone().unwrap_or(Predicate::Literal(true));
        let before = self.before.clone().map(validate_predicate).unwrap_or(Predicate::Literal(true));

        Predicate::and([filter, before])
    }

    /// Only the `before` validation.
    pub(crate) fn before_predicate(&self) -> Predicate {
        self.before.clone().map(validate_predicate).unwrap_or(Predicate::Literal(true))
    }

    /// `CALL apoc.util.validate(NOT (after), "FORBIDDEN", [0])`
    pub(crate) fn after_call(&self) -> Option<CallProcedure> {
        let after = self.after.clone()?;

        Some(CallProcedure::new(
            "apoc.util.validate",
            vec![Expression::from(after.not()), forbidden(), Expression::list(vec![Expression::int(0)])],
        ))
    }
}

fn conjunction(left: Option<Predicate>, right: Option<Predicate>) -> Option<Predicate> {
    match (left, right) {
        (Some(left), Some(right)) => Some(Predicate::and([left, right])),
        (left, right) => left.or(right),
    }
}

fn forbidden() -> Expression {
    Expression::string(RuntimeViolation::Forbidden.identifier())
}

/// `apoc.util.validatePredicate(NOT (predicate), "FORBIDDEN", [0])`
pub(crate) fn validate_predicate(predicate: Predicate) -> Predicate {
    Predicate::Expression(Expression::function(
        "apoc.util.validatePredicate",
        vec![Expression::from(predicate.not()), forbidden(), Expression::list(vec![Expression::int(0)])],
    ))
}

/// Renders the rules guarding `operation` on `entity` for the nodes bound to `node`.
pub(crate) fn authorization_predicates(
    session: &mut Session<'_>,
    entity: &Entity,
    operation: AuthorizationOperation,
    node: &Variable,
) -> CompileResult<AuthorizationPredicates> {
    let rules = session.authorization.rules(entity, operation);

    if rules.is_empty() {
        return Ok(AuthorizationPredicates::default());
    }

    tracing::trace!(entity = %entity, %operation, rules = rules.len(), "applying authorization rules");

    let mut filter = Vec::new();
    let mut before = Vec::new();
    let mut after = Vec::new();

    for rule in rules.iter() {
        let predicate = rule_predicate(session, rule, entity, node)?;

        if rule.is_filter() {
            filter.push(predicate.clone());
        }

        if rule.validates(ValidationWhen::Before) {
            before.push(predicate.clone());
        }

        if rule.validates(ValidationWhen::After) {
            after.push(predicate);
        }
    }

    let disjunction = |predicates: Vec<Predicate>| (!predicates.is_empty()).then(|| Predicate::or(predicates));

    Ok(AuthorizationPredicates {
        filter: disjunction(filter),
        before: disjunction(before),
        after: disjunction(after),
    })
}

/// One rule: authentication, the node filter and the claims filter must all hold.
fn rule_predicate(
    session: &mut Session<'_>,
    rule: &AuthorizationRule,
    entity: &Entity,
    node: &Variable,
) -> CompileResult<Predicate> {
    let path = format!("{entity}.authorization");
    let mut parts = Vec::with_capacity(3);

    if rule.requires_authentication {
        parts.push(Filter::Authenticated);
    }

    if let Some(node_filter) = &rule.filter.node {
        let map = input_map_from_json(node_filter, &path)?;
        parts.push(extract_rule_filter(session, map, entity)?);
    }

    if let Some(jwt_filter) = &rule.filter.jwt {
        let map = input_map_from_json(jwt_filter, &path)?;
        parts.push(extract_claims_filter(session, map)?);
    }

    Ok(filter_predicate(&Filter::and(parts), node, Some(entity)))
}
