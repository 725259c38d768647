use super::{Expression, PatternSubquery, Variable};

/// Boolean conditions, used in `WHERE` and wherever a boolean value is needed.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
    Compare(Expression, CompareOperator, Expression),
    IsNull(Expression),
    IsNotNull(Expression),
    /// `variable:Label`
    HasLabel(Variable, Vec<String>),
    /// `EXISTS { MATCH pattern WHERE filter }`
    Exists(Box<PatternSubquery>),
    /// A boolean-valued expression, e.g. a function call.
    Expression(Expression),
    Literal(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOperator {
    Equals,
    NotEquals,
    LessThan,
    LessThanOrEquals,
    GreaterThan,
    GreaterThanOrEquals,
    In,
    Contains,
    StartsWith,
    EndsWith,
    Matches,
}

impl CompareOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            CompareOperator::Equals => "=",
            CompareOperator::NotEquals => "<>",
            CompareOperator::LessThan => "<",
            CompareOperator::LessThanOrEquals => "<=",
            CompareOperator::GreaterThan => ">",
            CompareOperator::GreaterThanOrEquals => ">=",
            CompareOperator::In => "IN",
            CompareOperator::Contains => "CONTAINS",
            CompareOperator::StartsWith => "STARTS WITH",
            CompareOperator::EndsWith => "ENDS WITH",
            CompareOperator::Matches => "=~",
        }
    }
}

impl Predicate {
    /// Conjunction, flattening nested conjunctions and dropping `true`.
    pub fn and(predicates: impl IntoIterator<Item = Predicate>) -> Predicate {
        let mut flattened = Vec::new();

        for predicate in predicates {
            match predicate {
                Predicate::Literal(true) => (),
                Predicate::And(inner) => flattened.extend(inner),
                other => flattened.push(other),
            }
        }

        if flattened.contains(&Predicate::Literal(false)) {
            return Predicate::Literal(false);
        }

        match flattened.len() {
            0 => Predicate::Literal(true),
            1 => flattened.pop().unwrap_or(Predicate::Literal(true)),
            _ => Predicate::And(flattened),
        }
    }

    /// Disjunction, flattening nested disjunctions and dropping `false`.
    pub fn or(predicates: impl IntoIterator<Item = Predicate>) -> Predicate {
        let mut flattened = Vec::new();

        for predicate in predicates {
            match predicate {
                Predicate::Literal(false) => (),
                Predicate::Or(inner) => flattened.extend(inner),
                other => flattened.push(other),
            }
        }

        if flattened.contains(&Predicate::Literal(true)) {
            return Predicate::Literal(true);
        }

        match flattened.len() {
            0 => Predicate::Literal(false),
            1 => flattened.pop().unwrap_or(Predicate::Literal(false)),
            _ => Predicate::Or(flattened),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Predicate {
        match self {
            Predicate::Literal(value) => Predicate::Literal(!value),
            Predicate::Not(inner) => *inner,
            other => Predicate::Not(Box::new(other)),
        }
    }

    pub fn exists(subquery: PatternSubquery) -> Predicate {
        Predicate::Exists(Box::new(subquery))
    }

    pub fn is_true(&self) -> bool {
        matches!(self, Predicate::Literal(true))
    }

    pub fn is_false(&self) -> bool {
        matches!(self, Predicate::Literal(false))
    }
}

/// Comparison helpers, producing predicates.
pub trait Comparable: Sized {
    fn compare(self, operator: CompareOperator, right: impl Into<Expression>) -> Predicate;

    fn is_null(self) -> Predicate;

    fn is_not_null(self) -> Predicate;

    fn equals(self, right: impl Into<Expression>) -> Predicate {
        self.compare(CompareOperator::Equals, right)
    }

    fn not_equals(self, right: impl Into<Expression>) -> Predicate {
        self.compare(CompareOperator::NotEquals, right)
    }

    fn less_than(self, right: impl Into<Expression>) -> Predicate {
        self.compare(CompareOperator::LessThan, right)
    }

    fn less_than_or_equals(self, right: impl Into<Expression>) -> Predicate {
        self.compare(CompareOperator::LessThanOrEquals, right)
    }

    fn greater_than(self, right: impl Into<Expression>) -> Predicate {
        self.compare(CompareOperator::GreaterThan, right)
    }

    fn greater_than_or_equals(self, right: impl Into<Expression>) -> Predicate {
        self.compare(CompareOperator::GreaterThanOrEquals, right)
    }

    fn in_list(self, right: impl Into<Expression>) -> Predicate {
        self.compare(CompareOperator::In, right)
    }
}

impl Comparable for Expression {
    fn compare(self, operator: CompareOperator, right: impl Into<Expression>) -> Predicate {
        Predicate::Compare(self, operator, right.into())
    }

    fn is_null(self) -> Predicate {
        Predicate::IsNull(self)
    }

    fn is_not_null(self) -> Predicate {
        Predicate::IsNotNull(self)
    }
}

impl Comparable for &Variable {
    fn compare(self, operator: CompareOperator, right: impl Into<Expression>) -> Predicate {
        Expression::from(self).compare(operator, right)
    }

    fn is_null(self) -> Predicate {
        Predicate::IsNull(self.into())
    }

    fn is_not_null(self) -> Predicate {
        Predicate::IsNotNull(self.into())
    }
}

impl From<bool> for Predicate {
    fn from(value: bool) -> Self {
        Predicate::Literal(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn and_drops_true_and_flattens() {
        let a = Variable::new("a").is_null();
        let b = Variable::new("b").is_null();

        let nested = Predicate::and([a.clone(), Predicate::Literal(true), Predicate::and([b.clone(), a.clone()])]);

        assert_eq!(Predicate::And(vec![a.clone(), b, a]), nested);
        assert_eq!(Predicate::Literal(true), Predicate::and([]));
    }

    #[test]
    fn false_absorbs_conjunctions() {
        let a = Variable::new("a").is_null();

        assert_eq!(Predicate::Literal(false), Predicate::and([a.clone(), Predicate::Literal(false)]));
        assert_eq!(a.clone(), Predicate::or([a, Predicate::Literal(false)]));
    }

    #[test]
    fn double_negation_cancels() {
        let a = Variable::new("a").is_null();

        assert_eq!(a.clone(), a.clone().not().not());
        assert_eq!(Predicate::Literal(false), Predicate::Literal(true).not());
    }
}
