use super::{Pattern, Predicate, Variable};
use graph_value::GraphValue;

/// A value-producing part of a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Variable(Variable),
    /// `expression.key`
    Property(Box<Expression>, String),
    Parameter(Parameter),
    Literal(Literal),
    /// `[a, b, c]`
    List(Vec<Expression>),
    /// `{ key: value, .. }`
    Map(Vec<(String, Expression)>),
    /// `variable { .key, key: value, .. }`
    MapProjection(MapProjection),
    Function(Function),
    Binary(Box<Expression>, BinaryOperator, Box<Expression>),
    /// `expression[from..to]`
    Slice(Box<Expression>, Option<Box<Expression>>, Option<Box<Expression>>),
    /// A boolean-valued predicate used as a value.
    Predicate(Box<Predicate>),
    /// `COUNT { MATCH pattern WHERE filter }`
    Count(Box<PatternSubquery>),
    /// `reduce(accumulator = initial, variable IN list | expression)`
    Reduce(Box<Reduce>),
    /// `[variable IN list WHERE filter | map]`
    ListComprehension(Box<ListComprehension>),
}

/// A value bound through the parameter map.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Preferred name. The visitor makes it unique per statement.
    pub hint: String,
    /// `None` refers to a parameter shared by the whole request, such as the token claims.
    /// Shared parameters keep their name as is.
    pub value: Option<GraphValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Boolean(bool),
    Int(i64),
    String(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapProjection {
    pub variable: Variable,
    pub items: Vec<MapProjectionItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MapProjectionItem {
    /// `.key`
    Property(String),
    /// `.*`
    AllProperties,
    /// `key: expression`
    Entry(String, Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub args: Vec<Expression>,
    pub distinct: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl BinaryOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
        }
    }
}

/// A pattern with an optional filter, used by `EXISTS { .. }` and `COUNT { .. }`.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternSubquery {
    pub pattern: Pattern,
    pub filter: Option<Predicate>,
}

impl PatternSubquery {
    pub fn new(pattern: Pattern) -> Self {
        Self { pattern, filter: None }
    }

    pub fn so_that(mut self, filter: Predicate) -> Self {
        if !filter.is_true() {
            self.filter = Some(filter);
        }

        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reduce {
    pub accumulator: Variable,
    pub initial: Expression,
    pub variable: Variable,
    pub list: Expression,
    pub expression: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListComprehension {
    pub variable: Variable,
    pub list: Expression,
    pub filter: Option<Predicate>,
    pub map: Option<Expression>,
}

impl Expression {
    /// A parameter with a value, named after `hint`.
    pub fn param(hint: impl Into<String>, value: impl Into<GraphValue>) -> Self {
        Expression::Parameter(Parameter {
            hint: hint.into(),
            value: Some(value.into()),
        })
    }

    /// A reference to a request-wide parameter, e.g. `$jwt`.
    pub fn shared_param(name: impl Into<String>) -> Self {
        Expression::Parameter(Parameter {
            hint: name.into(),
            value: None,
        })
    }

    pub fn null() -> Self {
        Expression::Literal(Literal::Null)
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expression::Literal(Literal::String(value.into()))
    }

    pub fn int(value: i64) -> Self {
        Expression::Literal(Literal::Int(value))
    }

    pub fn boolean(value: bool) -> Self {
        Expression::Literal(Literal::Boolean(value))
    }

    pub fn list(items: Vec<Expression>) -> Self {
        Expression::List(items)
    }

    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Expression)>) -> Self {
        Expression::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn function(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Expression::Function(Function {
            name: name.into(),
            args,
            distinct: false,
        })
    }

    pub fn distinct_function(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Expression::Function(Function {
            name: name.into(),
            args,
            distinct: true,
        })
    }

    pub fn count(subquery: PatternSubquery) -> Self {
        Expression::Count(Box::new(subquery))
    }

    pub fn reduce(reduce: Reduce) -> Self {
        Expression::Reduce(Box::new(reduce))
    }

    pub fn comprehension(comprehension: ListComprehension) -> Self {
        Expression::ListComprehension(Box::new(comprehension))
    }

    pub fn map_projection(variable: impl Into<Variable>, items: Vec<MapProjectionItem>) -> Self {
        Expression::MapProjection(MapProjection {
            variable: variable.into(),
            items,
        })
    }

    /// `self.key`
    pub fn property(self, key: impl Into<String>) -> Self {
        Expression::Property(Box::new(self), key.into())
    }

    pub fn binary(self, operator: BinaryOperator, right: Expression) -> Self {
        Expression::Binary(Box::new(self), operator, Box::new(right))
    }

    /// `self[from..to]`
    pub fn slice(self, from: Option<Expression>, to: Option<Expression>) -> Self {
        Expression::Slice(Box::new(self), from.map(Box::new), to.map(Box::new))
    }

    /// `collect(self)`
    pub fn collect(self) -> Self {
        Expression::function("collect", vec![self])
    }

    /// `head(collect(self))`
    pub fn head_of_collect(self) -> Self {
        Expression::function("head", vec![self.collect()])
    }

    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            Expression::Variable(v) => Some(v),
            _ => None,
        }
    }
}

impl From<Variable> for Expression {
    fn from(variable: Variable) -> Self {
        Expression::Variable(variable)
    }
}

impl From<&Variable> for Expression {
    fn from(variable: &Variable) -> Self {
        Expression::Variable(variable.clone())
    }
}

impl From<Literal> for Expression {
    fn from(literal: Literal) -> Self {
        Expression::Literal(literal)
    }
}

impl From<Predicate> for Expression {
    fn from(predicate: Predicate) -> Self {
        Expression::Predicate(Box::new(predicate))
    }
}

impl From<Function> for Expression {
    fn from(function: Function) -> Self {
        Expression::Function(function)
    }
}
