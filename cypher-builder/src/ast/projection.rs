use super::{Expression, Variable};

/// One projected column, `expression AS alias`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionItem {
    pub expression: Expression,
    /// Bare variables may omit the alias and keep their name.
    pub alias: Option<Variable>,
}

impl ProjectionItem {
    pub fn aliased(expression: impl Into<Expression>, alias: impl Into<Variable>) -> Self {
        Self {
            expression: expression.into(),
            alias: Some(alias.into()),
        }
    }

    /// The name of the column, if it has one.
    pub fn column(&self) -> Option<&Variable> {
        self.alias.as_ref().or_else(|| self.expression.as_variable())
    }
}

impl From<Variable> for ProjectionItem {
    fn from(variable: Variable) -> Self {
        Self {
            expression: Expression::Variable(variable),
            alias: None,
        }
    }
}

impl From<&Variable> for ProjectionItem {
    fn from(variable: &Variable) -> Self {
        variable.clone().into()
    }
}

impl<E: Into<Expression>> From<(E, Variable)> for ProjectionItem {
    fn from((expression, alias): (E, Variable)) -> Self {
        ProjectionItem::aliased(expression, alias)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }
}

/// The shared body of `WITH` and `RETURN`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Projection {
    /// Carry over every variable in scope, `*`.
    pub star: bool,
    pub distinct: bool,
    pub items: Vec<ProjectionItem>,
    pub order_by: Vec<(Expression, SortDirection)>,
    pub skip: Option<Expression>,
    pub limit: Option<Expression>,
}

impl Projection {
    /// Names of the columns, in order. `*` is not expanded.
    pub fn columns(&self) -> Vec<&Variable> {
        self.items.iter().filter_map(ProjectionItem::column).collect()
    }
}
