//! Visitors for reading an abstract Cypher syntax tree, generating the statement text and
//! gathering parameters in the right order.
//!
//! The visitor keeps the variables in [scope](crate::Scope) while walking the clauses and fails
//! with an [`Error`](crate::Error) instead of generating a statement that reads unbound
//! variables, redeclares bound ones, or returns columns hiding outer variables.
mod cypher;

pub use self::cypher::Cypher;

use crate::{Error, Params, Result, Scope, ast::*};
use itertools::Itertools;
use std::borrow::Cow;

/// A function travelling through the statement AST, building the text and collecting
/// parameters.
pub trait Visitor: Sized {
    /// Prefix of a parameter reference.
    const C_PARAM: &'static str;
    /// Quote for identifiers that are not valid as is.
    const C_QUOTE: &'static str;
    /// Indentation of subquery bodies.
    const C_INDENT: &'static str;

    /// Renders the statement, returning the text and the parameters it references.
    /// Shared parameters referenced by the statement are looked up in `shared`.
    fn build(statement: &Statement, shared: &Params) -> Result<(String, Params)>;

    /// Registers a parameter, returning the name it is referenced by.
    fn add_parameter(&mut self, parameter: &Parameter) -> Result<String>;

    /// The variables in scope at the current point of the walk.
    fn scope(&mut self) -> &mut Scope;

    fn quote(name: &str) -> Cow<'_, str> {
        let mut chars = name.chars();

        let valid = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

        if valid {
            Cow::Borrowed(name)
        } else {
            let escaped = name.replace(Self::C_QUOTE, &format!("{0}{0}", Self::C_QUOTE));
            Cow::Owned(format!("{}{}{}", Self::C_QUOTE, escaped, Self::C_QUOTE))
        }
    }

    fn visit_statement(&mut self, statement: &Statement) -> Result<String> {
        let clauses: Vec<String> = statement
            .clauses()
            .iter()
            .map(|clause| self.visit_clause(clause))
            .collect::<Result<_>>()?;

        Ok(clauses.join("\n"))
    }

    fn visit_clause(&mut self, clause: &Clause) -> Result<String> {
        match clause {
            Clause::Match(m) => self.visit_match(m),
            Clause::Create(c) => Ok(format!("CREATE {}", self.visit_pattern(&c.pattern)?)),
            Clause::Merge(m) => self.visit_merge(m),
            Clause::Set(s) => Ok(format!("SET {}", self.visit_set_items(&s.items)?)),
            Clause::Delete(d) => self.visit_delete(d),
            Clause::With(w) => self.visit_with(w),
            Clause::Unwind(u) => self.visit_unwind(u),
            Clause::Call(c) => self.visit_call(c),
            Clause::CallProcedure(c) => Ok(format!("CALL {}({})", c.name, self.visit_expressions(&c.args)?)),
            Clause::Return(r) => self.visit_projection("RETURN", &r.projection),
            Clause::Raw(r) => self.visit_raw(r),
        }
    }

    fn visit_match(&mut self, m: &Match) -> Result<String> {
        let patterns: Vec<String> = m
            .patterns
            .iter()
            .map(|p| self.visit_pattern(p))
            .collect::<Result<_>>()?;

        let keyword = if m.optional { "OPTIONAL MATCH" } else { "MATCH" };
        let mut result = format!("{keyword} {}", patterns.join(", "));

        if let Some(filter) = &m.filter {
            result.push_str("\nWHERE ");
            result.push_str(&self.visit_predicate(filter)?);
        }

        Ok(result)
    }

    fn visit_merge(&mut self, merge: &Merge) -> Result<String> {
        let mut result = format!("MERGE {}", self.visit_pattern(&merge.pattern)?);

        if !merge.on_create.is_empty() {
            result.push_str("\nON CREATE SET ");
            result.push_str(&self.visit_set_items(&merge.on_create)?);
        }

        if !merge.on_match.is_empty() {
            result.push_str("\nON MATCH SET ");
            result.push_str(&self.visit_set_items(&merge.on_match)?);
        }

        Ok(result)
    }

    fn visit_set_items(&mut self, items: &[SetItem]) -> Result<String> {
        let items: Vec<String> = items
            .iter()
            .map(|item| match item {
                SetItem::Property { variable, key, value } => Ok(format!(
                    "{}.{} = {}",
                    self.visit_variable(variable)?,
                    Self::quote(key),
                    self.visit_expression(value)?
                )),
                SetItem::Merge { variable, value } => Ok(format!(
                    "{} += {}",
                    self.visit_variable(variable)?,
                    self.visit_expression(value)?
                )),
            })
            .collect::<Result<_>>()?;

        Ok(items.join(", "))
    }

    fn visit_delete(&mut self, delete: &Delete) -> Result<String> {
        let keyword = if delete.detach { "DETACH DELETE" } else { "DELETE" };
        Ok(format!("{keyword} {}", self.visit_expressions(&delete.expressions)?))
    }

    fn visit_with(&mut self, with: &With) -> Result<String> {
        let mut result = self.visit_projection("WITH", &with.projection)?;

        if let Some(filter) = &with.filter {
            result.push_str("\nWHERE ");
            result.push_str(&self.visit_predicate(filter)?);
        }

        Ok(result)
    }

    /// Renders `WITH`/`RETURN` and replaces the scope with the projected columns.
    fn visit_projection(&mut self, keyword: &str, projection: &Projection) -> Result<String> {
        let outer = self.scope().clone();
        let mut projected = if projection.star { outer.clone() } else { Scope::new() };
        let mut items = Vec::with_capacity(projection.items.len() + 1);

        if projection.star {
            items.push(String::from("*"));
        }

        for item in projection.items.iter() {
            let rendered = self.visit_expression(&item.expression)?;

            let column = item.column().ok_or_else(|| Error::MissingAlias {
                expression: rendered.clone(),
            })?;

            let passthrough = item.expression.as_variable() == Some(column);

            if passthrough && projection.star {
                projected.bind(column);
            } else {
                projected.declare(column)?;
            }

            if passthrough {
                items.push(rendered);
            } else {
                items.push(format!("{rendered} AS {}", Self::quote(column.name())));
            }
        }

        let distinct = if projection.distinct { " DISTINCT" } else { "" };
        let mut result = format!("{keyword}{distinct} {}", items.join(", "));

        if !projection.order_by.is_empty() {
            let mut sort_scope = outer;

            for variable in projected.variables() {
                sort_scope.bind(&Variable::new(variable));
            }

            *self.scope() = sort_scope;

            let ordering: Vec<String> = projection
                .order_by
                .iter()
                .map(|(expression, direction)| {
                    Ok(format!("{} {}", self.visit_expression(expression)?, direction.as_str()))
                })
                .collect::<Result<_>>()?;

            result.push_str("\nORDER BY ");
            result.push_str(&ordering.join(", "));
        }

        if let Some(skip) = &projection.skip {
            result.push_str("\nSKIP ");
            result.push_str(&self.visit_expression(skip)?);
        }

        if let Some(limit) = &projection.limit {
            result.push_str("\nLIMIT ");
            result.push_str(&self.visit_expression(limit)?);
        }

        *self.scope() = projected;

        Ok(result)
    }

    fn visit_unwind(&mut self, unwind: &Unwind) -> Result<String> {
        let expression = self.visit_expression(&unwind.expression)?;
        self.scope().declare(&unwind.variable)?;

        Ok(format!("UNWIND {expression} AS {}", Self::quote(unwind.variable.name())))
    }

    fn visit_call(&mut self, call: &Call) -> Result<String> {
        let outer = self.scope().clone();

        for import in call.imports.iter() {
            outer.check(import)?;
        }

        let mut columns: Option<Vec<String>> = None;
        let mut branches = Vec::with_capacity(call.branches.len());

        for branch in call.branches.iter() {
            let mut lines = Vec::new();

            if call.import_star {
                *self.scope() = outer.clone();
                lines.push(String::from("WITH *"));
            } else {
                *self.scope() = Scope::from_variables(call.imports.iter());

                if !call.imports.is_empty() {
                    let imports = call.imports.iter().map(|v| Self::quote(v.name())).join(", ");
                    lines.push(format!("WITH {imports}"));
                }
            }

            lines.push(self.visit_statement(branch)?);

            let returns: Vec<String> = branch
                .returns()
                .into_iter()
                .map(|v| v.name().to_owned())
                .sorted()
                .collect();

            match &columns {
                Some(expected) if *expected != returns => {
                    return Err(Error::UnionColumnMismatch {
                        expected: expected.clone(),
                        found: returns,
                    });
                }
                Some(_) => (),
                None => columns = Some(returns),
            }

            branches.push(lines.join("\n"));
        }

        *self.scope() = outer;

        for column in call.returns() {
            if self.scope().contains(column) {
                return Err(Error::ReturnShadowsOuter {
                    name: column.name().to_owned(),
                });
            }

            self.scope().bind(column);
        }

        let body = branches.join("\nUNION\n");
        let indented = body.lines().map(|line| format!("{}{line}", Self::C_INDENT)).join("\n");

        Ok(format!("CALL {{\n{indented}\n}}"))
    }

    fn visit_raw(&mut self, raw: &Raw) -> Result<String> {
        *self.scope() = Scope::from_variables(raw.returns.iter());
        Ok(raw.text.trim().to_owned())
    }

    /// Renders a pattern, binding its variables. Labeled nodes and relationships introduce new
    /// variables, unlabeled nodes refer to bound variables or introduce them.
    fn visit_pattern(&mut self, pattern: &Pattern) -> Result<String> {
        let mut result = self.visit_node_pattern(&pattern.start)?;

        for (relationship, node) in pattern.chain.iter() {
            let body = self.visit_relationship_pattern(relationship)?;

            let rendered = match relationship.direction {
                PatternDirection::Outgoing => format!("-[{body}]->"),
                PatternDirection::Incoming => format!("<-[{body}]-"),
                PatternDirection::Undirected => format!("-[{body}]-"),
            };

            result.push_str(&rendered);
            result.push_str(&self.visit_node_pattern(node)?);
        }

        Ok(result)
    }

    fn visit_node_pattern(&mut self, node: &NodePattern) -> Result<String> {
        let mut result = String::from("(");

        if let Some(variable) = &node.variable {
            if node.labels.is_empty() {
                self.scope().bind(variable);
            } else {
                self.scope().declare(variable)?;
            }

            result.push_str(&Self::quote(variable.name()));
        }

        for label in node.labels.iter() {
            result.push(':');
            result.push_str(&Self::quote(label));
        }

        if !node.properties.is_empty() {
            result.push(' ');
            result.push_str(&self.visit_map(&node.properties)?);
        }

        result.push(')');

        Ok(result)
    }

    fn visit_relationship_pattern(&mut self, relationship: &RelationshipPattern) -> Result<String> {
        let mut result = String::new();

        if let Some(variable) = &relationship.variable {
            self.scope().declare(variable)?;
            result.push_str(&Self::quote(variable.name()));
        }

        if let Some(rel_type) = &relationship.rel_type {
            result.push(':');
            result.push_str(&Self::quote(rel_type));
        }

        if !relationship.properties.is_empty() {
            result.push(' ');
            result.push_str(&self.visit_map(&relationship.properties)?);
        }

        Ok(result)
    }

    fn visit_variable(&mut self, variable: &Variable) -> Result<String> {
        self.scope().check(variable)?;
        Ok(Self::quote(variable.name()).into_owned())
    }

    fn visit_expressions(&mut self, expressions: &[Expression]) -> Result<String> {
        let rendered: Vec<String> = expressions
            .iter()
            .map(|e| self.visit_expression(e))
            .collect::<Result<_>>()?;

        Ok(rendered.join(", "))
    }

    fn visit_map(&mut self, entries: &[(String, Expression)]) -> Result<String> {
        if entries.is_empty() {
            return Ok(String::from("{}"));
        }

        let entries: Vec<String> = entries
            .iter()
            .map(|(key, value)| Ok(format!("{}: {}", Self::quote(key), self.visit_expression(value)?)))
            .collect::<Result<_>>()?;

        Ok(format!("{{ {} }}", entries.join(", ")))
    }

    fn visit_expression(&mut self, expression: &Expression) -> Result<String> {
        match expression {
            Expression::Variable(variable) => self.visit_variable(variable),
            Expression::Property(inner, key) => {
                let rendered = self.visit_expression(inner)?;

                match inner.as_ref() {
                    Expression::Variable(_)
                    | Expression::Property(..)
                    | Expression::Parameter(_)
                    | Expression::Function(_) => Ok(format!("{rendered}.{}", Self::quote(key))),
                    _ => Ok(format!("({rendered}).{}", Self::quote(key))),
                }
            }
            Expression::Parameter(parameter) => {
                let name = self.add_parameter(parameter)?;
                Ok(format!("{}{name}", Self::C_PARAM))
            }
            Expression::Literal(literal) => Ok(Self::visit_literal(literal)),
            Expression::List(items) => Ok(format!("[{}]", self.visit_expressions(items)?)),
            Expression::Map(entries) => self.visit_map(entries),
            Expression::MapProjection(projection) => self.visit_map_projection(projection),
            Expression::Function(function) => {
                let distinct = if function.distinct { "DISTINCT " } else { "" };
                Ok(format!("{}({distinct}{})", function.name, self.visit_expressions(&function.args)?))
            }
            Expression::Binary(left, operator, right) => {
                let mut operand = |e: &Expression| -> Result<String> {
                    let rendered = self.visit_expression(e)?;

                    if matches!(e, Expression::Binary(..)) {
                        Ok(format!("({rendered})"))
                    } else {
                        Ok(rendered)
                    }
                };

                let left = operand(left)?;
                let right = operand(right)?;

                Ok(format!("{left} {} {right}", operator.as_str()))
            }
            Expression::Slice(inner, from, to) => {
                let inner = self.visit_expression(inner)?;

                let from = match from {
                    Some(from) => self.visit_expression(from)?,
                    None => String::new(),
                };

                let to = match to {
                    Some(to) => self.visit_expression(to)?,
                    None => String::new(),
                };

                Ok(format!("{inner}[{from}..{to}]"))
            }
            Expression::Predicate(predicate) => {
                let rendered = self.visit_predicate(predicate)?;

                match predicate.as_ref() {
                    Predicate::And(_) | Predicate::Or(_) => Ok(format!("({rendered})")),
                    _ => Ok(rendered),
                }
            }
            Expression::Count(subquery) => Ok(format!("COUNT {}", self.visit_pattern_subquery(subquery)?)),
            Expression::Reduce(reduce) => {
                let initial = self.visit_expression(&reduce.initial)?;
                let list = self.visit_expression(&reduce.list)?;

                self.scope().declare(&reduce.accumulator)?;
                self.scope().declare(&reduce.variable)?;

                let body = self.visit_expression(&reduce.expression);

                self.scope().remove(&reduce.accumulator);
                self.scope().remove(&reduce.variable);

                Ok(format!(
                    "reduce({} = {initial}, {} IN {list} | {})",
                    Self::quote(reduce.accumulator.name()),
                    Self::quote(reduce.variable.name()),
                    body?
                ))
            }
            Expression::ListComprehension(comprehension) => {
                let list = self.visit_expression(&comprehension.list)?;
                self.scope().declare(&comprehension.variable)?;

                let rendered = (|| -> Result<String> {
                    let mut result = format!("[{} IN {list}", Self::quote(comprehension.variable.name()));

                    if let Some(filter) = &comprehension.filter {
                        result.push_str(" WHERE ");
                        result.push_str(&self.visit_predicate(filter)?);
                    }

                    if let Some(map) = &comprehension.map {
                        result.push_str(" | ");
                        result.push_str(&self.visit_expression(map)?);
                    }

                    result.push(']');
                    Ok(result)
                })();

                self.scope().remove(&comprehension.variable);

                rendered
            }
        }
    }

    fn visit_literal(literal: &Literal) -> String {
        match literal {
            Literal::Null => String::from("NULL"),
            Literal::Boolean(true) => String::from("true"),
            Literal::Boolean(false) => String::from("false"),
            Literal::Int(i) => i.to_string(),
            Literal::String(s) => {
                let escaped = s
                    .replace('\\', "\\\\")
                    .replace('"', "\\\"")
                    .replace('\n', "\\n");

                format!("\"{escaped}\"")
            }
        }
    }

    fn visit_map_projection(&mut self, projection: &MapProjection) -> Result<String> {
        let variable = self.visit_variable(&projection.variable)?;

        if projection.items.is_empty() {
            return Ok(format!("{variable} {{}}"));
        }

        let items: Vec<String> = projection
            .items
            .iter()
            .map(|item| match item {
                MapProjectionItem::Property(key) => Ok(format!(".{}", Self::quote(key))),
                MapProjectionItem::AllProperties => Ok(String::from(".*")),
                MapProjectionItem::Entry(key, value) => {
                    Ok(format!("{}: {}", Self::quote(key), self.visit_expression(value)?))
                }
            })
            .collect::<Result<_>>()?;

        Ok(format!("{variable} {{ {} }}", items.join(", ")))
    }

    /// `{ MATCH pattern WHERE filter }`, with its own scope.
    fn visit_pattern_subquery(&mut self, subquery: &PatternSubquery) -> Result<String> {
        let outer = self.scope().clone();

        let rendered = (|| -> Result<String> {
            let mut result = format!("{{ MATCH {}", self.visit_pattern(&subquery.pattern)?);

            if let Some(filter) = &subquery.filter {
                result.push_str(" WHERE ");
                result.push_str(&self.visit_predicate(filter)?);
            }

            result.push_str(" }");
            Ok(result)
        })();

        *self.scope() = outer;

        rendered
    }

    fn visit_predicate(&mut self, predicate: &Predicate) -> Result<String> {
        match predicate {
            Predicate::And(children) if children.is_empty() => Ok(String::from("true")),
            Predicate::Or(children) if children.is_empty() => Ok(String::from("false")),
            Predicate::And(children) => {
                let rendered: Vec<String> = children
                    .iter()
                    .map(|child| match child {
                        Predicate::Or(_) => Ok(format!("({})", self.visit_predicate(child)?)),
                        _ => self.visit_predicate(child),
                    })
                    .collect::<Result<_>>()?;

                Ok(rendered.join(" AND "))
            }
            Predicate::Or(children) => {
                let rendered: Vec<String> = children
                    .iter()
                    .map(|child| match child {
                        Predicate::And(_) => Ok(format!("({})", self.visit_predicate(child)?)),
                        _ => self.visit_predicate(child),
                    })
                    .collect::<Result<_>>()?;

                Ok(rendered.join(" OR "))
            }
            Predicate::Not(inner) => match inner.as_ref() {
                Predicate::Exists(_) | Predicate::HasLabel(..) | Predicate::Literal(_) => {
                    Ok(format!("NOT {}", self.visit_predicate(inner)?))
                }
                _ => Ok(format!("NOT ({})", self.visit_predicate(inner)?)),
            },
            Predicate::Compare(left, operator, right) => Ok(format!(
                "{} {} {}",
                self.visit_expression(left)?,
                operator.as_str(),
                self.visit_expression(right)?
            )),
            Predicate::IsNull(expression) => Ok(format!("{} IS NULL", self.visit_expression(expression)?)),
            Predicate::IsNotNull(expression) => Ok(format!("{} IS NOT NULL", self.visit_expression(expression)?)),
            Predicate::HasLabel(variable, labels) => {
                let mut result = self.visit_variable(variable)?;

                for label in labels {
                    result.push(':');
                    result.push_str(&Self::quote(label));
                }

                Ok(result)
            }
            Predicate::Exists(subquery) => Ok(format!("EXISTS {}", self.visit_pattern_subquery(subquery)?)),
            Predicate::Expression(expression) => self.visit_expression(expression),
            Predicate::Literal(value) => Ok(value.to_string()),
        }
    }
}
