use super::{Expression, Predicate};
use std::fmt;

/// A named variable of a statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable(String);

impl Variable {
    pub fn new(name: impl Into<String>) -> Self {
        Variable(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// A new variable named after this one, e.g. `this` and `actors0` give `this_actors0`.
    pub fn child(&self, suffix: impl fmt::Display) -> Variable {
        Variable(format!("{}_{}", self.0, suffix))
    }

    /// `variable.key`
    pub fn property(&self, key: impl Into<String>) -> Expression {
        Expression::Property(Box::new(Expression::Variable(self.clone())), key.into())
    }

    /// `variable:Label1:Label2`
    pub fn has_labels<I, S>(&self, labels: I) -> Predicate
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Predicate::HasLabel(self.clone(), labels.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Variable {
    fn from(name: &str) -> Self {
        Variable::new(name)
    }
}

impl From<String> for Variable {
    fn from(name: String) -> Self {
        Variable(name)
    }
}

impl From<&Variable> for Variable {
    fn from(variable: &Variable) -> Self {
        variable.clone()
    }
}
