use super::{Expression, Pattern, Predicate, Projection, ProjectionItem, SortDirection, Statement, Variable};

#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Match(Match),
    Create(Create),
    Merge(Merge),
    Set(Set),
    Delete(Delete),
    With(With),
    Unwind(Unwind),
    Call(Call),
    CallProcedure(CallProcedure),
    Return(Return),
    Raw(Raw),
}

impl Clause {
    /// Clauses that write to the graph. A reading clause cannot follow them without a `WITH`.
    pub fn is_updating(&self) -> bool {
        match self {
            Clause::Create(_) | Clause::Merge(_) | Clause::Set(_) | Clause::Delete(_) => true,
            Clause::Call(call) => call.branches.iter().any(Statement::is_updating),
            _ => false,
        }
    }

    pub fn is_reading(&self) -> bool {
        matches!(
            self,
            Clause::Match(_) | Clause::Unwind(_) | Clause::Call(_) | Clause::CallProcedure(_)
        )
    }
}

/// `[OPTIONAL] MATCH pattern, .. WHERE filter`
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub optional: bool,
    pub patterns: Vec<Pattern>,
    pub filter: Option<Predicate>,
}

impl Match {
    pub fn new(pattern: impl Into<Pattern>) -> Self {
        Self {
            optional: false,
            patterns: vec![pattern.into()],
            filter: None,
        }
    }

    pub fn optional(pattern: impl Into<Pattern>) -> Self {
        Self {
            optional: true,
            ..Self::new(pattern)
        }
    }

    pub fn pattern(mut self, pattern: impl Into<Pattern>) -> Self {
        self.patterns.push(pattern.into());
        self
    }

    /// Adds a condition. Trivially true conditions are dropped.
    pub fn so_that(mut self, filter: Predicate) -> Self {
        let filter = match self.filter.take() {
            Some(existing) => Predicate::and([existing, filter]),
            None => filter,
        };

        if !filter.is_true() {
            self.filter = Some(filter);
        }

        self
    }
}

/// `CREATE pattern`
#[derive(Debug, Clone, PartialEq)]
pub struct Create {
    pub pattern: Pattern,
}

impl Create {
    pub fn new(pattern: impl Into<Pattern>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }
}

/// `MERGE pattern ON CREATE SET .. ON MATCH SET ..`
#[derive(Debug, Clone, PartialEq)]
pub struct Merge {
    pub pattern: Pattern,
    pub on_create: Vec<SetItem>,
    pub on_match: Vec<SetItem>,
}

impl Merge {
    pub fn new(pattern: impl Into<Pattern>) -> Self {
        Self {
            pattern: pattern.into(),
            on_create: Vec::new(),
            on_match: Vec::new(),
        }
    }

    pub fn on_create(mut self, items: Vec<SetItem>) -> Self {
        self.on_create.extend(items);
        self
    }

    pub fn on_match(mut self, items: Vec<SetItem>) -> Self {
        self.on_match.extend(items);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SetItem {
    /// `variable.key = value`
    Property {
        variable: Variable,
        key: String,
        value: Expression,
    },
    /// `variable += map`
    Merge { variable: Variable, value: Expression },
}

impl SetItem {
    pub fn property(variable: &Variable, key: impl Into<String>, value: Expression) -> Self {
        SetItem::Property {
            variable: variable.clone(),
            key: key.into(),
            value,
        }
    }
}

/// `SET item, ..`
#[derive(Debug, Clone, PartialEq)]
pub struct Set {
    pub items: Vec<SetItem>,
}

impl Set {
    pub fn new(items: Vec<SetItem>) -> Self {
        Self { items }
    }
}

/// `[DETACH] DELETE expression, ..`
#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    pub detach: bool,
    pub expressions: Vec<Expression>,
}

impl Delete {
    pub fn detach(expression: impl Into<Expression>) -> Self {
        Self {
            detach: true,
            expressions: vec![expression.into()],
        }
    }

    pub fn new(expression: impl Into<Expression>) -> Self {
        Self {
            detach: false,
            expressions: vec![expression.into()],
        }
    }
}

/// `WITH projection WHERE filter`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct With {
    pub projection: Projection,
    pub filter: Option<Predicate>,
}

impl With {
    pub fn new() -> Self {
        Self::default()
    }

    /// `WITH *`
    pub fn star() -> Self {
        let mut with = Self::default();
        with.projection.star = true;
        with
    }

    /// `WITH a, b, ..` for plain variables.
    pub fn variables<'a>(variables: impl IntoIterator<Item = &'a Variable>) -> Self {
        let mut with = Self::default();
        with.projection.items = variables.into_iter().map(ProjectionItem::from).collect();
        with
    }

    pub fn item(mut self, item: impl Into<ProjectionItem>) -> Self {
        self.projection.items.push(item.into());
        self
    }

    pub fn distinct(mut self) -> Self {
        self.projection.distinct = true;
        self
    }

    pub fn order_by(mut self, expression: Expression, direction: SortDirection) -> Self {
        self.projection.order_by.push((expression, direction));
        self
    }

    pub fn skip(mut self, skip: Expression) -> Self {
        self.projection.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: Expression) -> Self {
        self.projection.limit = Some(limit);
        self
    }

    pub fn so_that(mut self, filter: Predicate) -> Self {
        if !filter.is_true() {
            self.filter = Some(filter);
        }

        self
    }
}

/// `UNWIND expression AS variable`
#[derive(Debug, Clone, PartialEq)]
pub struct Unwind {
    pub expression: Expression,
    pub variable: Variable,
}

impl Unwind {
    pub fn new(expression: impl Into<Expression>, variable: impl Into<Variable>) -> Self {
        Self {
            expression: expression.into(),
            variable: variable.into(),
        }
    }
}

/// `CALL { WITH imports .. }`, a subquery with its own scope. Several branches are joined with
/// `UNION`, each importing the same variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub imports: Vec<Variable>,
    /// Import every variable in scope, `WITH *`.
    pub import_star: bool,
    pub branches: Vec<Statement>,
}

impl Call {
    pub fn new(body: Statement) -> Self {
        Self {
            imports: Vec::new(),
            import_star: false,
            branches: vec![body],
        }
    }

    pub fn union(branches: Vec<Statement>) -> Self {
        Self {
            imports: Vec::new(),
            import_star: false,
            branches,
        }
    }

    pub fn import(mut self, variable: &Variable) -> Self {
        if !self.imports.contains(variable) {
            self.imports.push(variable.clone());
        }

        self
    }

    pub fn imports<'a>(mut self, variables: impl IntoIterator<Item = &'a Variable>) -> Self {
        for variable in variables {
            self = self.import(variable);
        }

        self
    }

    pub fn import_star(mut self) -> Self {
        self.import_star = true;
        self
    }

    /// Columns returned to the outer scope.
    pub fn returns(&self) -> Vec<&Variable> {
        self.branches.first().map(Statement::returns).unwrap_or_default()
    }
}

/// `CALL procedure(args)` for procedures without output, such as `apoc.util.validate`.
#[derive(Debug, Clone, PartialEq)]
pub struct CallProcedure {
    pub name: String,
    pub args: Vec<Expression>,
}

impl CallProcedure {
    pub fn new(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

/// `RETURN projection`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Return {
    pub projection: Projection,
}

impl Return {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn item(mut self, item: impl Into<ProjectionItem>) -> Self {
        self.projection.items.push(item.into());
        self
    }

    pub fn distinct(mut self) -> Self {
        self.projection.distinct = true;
        self
    }

    pub fn order_by(mut self, expression: Expression, direction: SortDirection) -> Self {
        self.projection.order_by.push((expression, direction));
        self
    }

    pub fn skip(mut self, skip: Expression) -> Self {
        self.projection.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: Expression) -> Self {
        self.projection.limit = Some(limit);
        self
    }
}

/// Statement text written by hand, e.g. the body of a computed field. It is not checked and must
/// end with a `RETURN` of `returns`.
#[derive(Debug, Clone, PartialEq)]
pub struct Raw {
    pub text: String,
    pub returns: Vec<Variable>,
}

impl Raw {
    pub fn new(text: impl Into<String>, returns: Vec<Variable>) -> Self {
        Self {
            text: text.into(),
            returns,
        }
    }
}

macro_rules! clause_from {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for Clause {
                fn from(clause: $variant) -> Self {
                    Clause::$variant(clause)
                }
            }
        )*
    };
}

clause_from!(Match, Create, Merge, Set, Delete, With, Unwind, Call, CallProcedure, Return, Raw);
