use super::{Clause, Variable, With};

/// An ordered list of clauses.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statement {
    clauses: Vec<Clause>,
}

impl Statement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a clause. A `WITH *` is inserted when a reading clause follows an updating one.
    pub fn push(&mut self, clause: impl Into<Clause>) -> &mut Self {
        let clause = clause.into();

        let needs_with = self.clauses.last().is_some_and(Clause::is_updating) && clause.is_reading();

        if needs_with {
            self.clauses.push(Clause::With(With::star()));
        }

        self.clauses.push(clause);
        self
    }

    /// Builder flavor of [`Statement::push`].
    pub fn with(mut self, clause: impl Into<Clause>) -> Self {
        self.push(clause);
        self
    }

    /// Appends all clauses of `other`.
    pub fn append(&mut self, other: Statement) -> &mut Self {
        for clause in other.clauses {
            self.push(clause);
        }

        self
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn is_updating(&self) -> bool {
        self.clauses.iter().any(Clause::is_updating)
    }

    /// Columns produced by the final `RETURN` (or raw statement). Empty for unit statements.
    pub fn returns(&self) -> Vec<&Variable> {
        match self.clauses.last() {
            Some(Clause::Return(ret)) => ret.projection.columns(),
            Some(Clause::Raw(raw)) => raw.returns.iter().collect(),
            _ => Vec::new(),
        }
    }
}

impl<C: Into<Clause>> FromIterator<C> for Statement {
    fn from_iter<T: IntoIterator<Item = C>>(iter: T) -> Self {
        let mut statement = Statement::new();

        for clause in iter {
            statement.push(clause);
        }

        statement
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;

    #[test]
    fn with_star_separates_writes_from_reads() {
        let this = Variable::new("this");
        let other = Variable::new("other");

        let statement = Statement::new()
            .with(Create::new(NodePattern::new(&this).label("Movie")))
            .with(Match::new(NodePattern::new(&other).label("Actor")))
            .with(Return::new().item(&this));

        assert!(matches!(statement.clauses()[1], Clause::With(ref w) if w.projection.star));
        assert_eq!(4, statement.clauses().len());
    }

    #[test]
    fn no_with_between_reads() {
        let this = Variable::new("this");

        let statement = Statement::new()
            .with(Match::new(NodePattern::new(&this).label("Movie")))
            .with(Unwind::new(Expression::list(vec![]), "x"))
            .with(Set::new(vec![SetItem::property(&this, "title", Expression::null())]))
            .with(Return::new().item(&this));

        assert_eq!(4, statement.clauses().len());
    }
}
