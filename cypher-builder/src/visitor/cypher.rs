use crate::{
    Error, Params, Result, Scope,
    ast::{Parameter, Statement},
    visitor::Visitor,
};

/// A visitor to generate statements for Neo4j.
pub struct Cypher<'a> {
    parameters: Params,
    shared: &'a Params,
    scope: Scope,
}

impl Cypher<'_> {
    fn parameter_name(&self, hint: &str) -> String {
        let mut base: String = hint
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
            .collect();

        if base.is_empty() {
            base.push_str("param");
        } else if base.starts_with(|c: char| c.is_ascii_digit()) {
            base.insert(0, 'p');
        }

        let taken = |name: &str| self.parameters.contains_key(name) || self.shared.contains_key(name);

        if !taken(&base) {
            return base;
        }

        (1..)
            .map(|n| format!("{base}_{n}"))
            .find(|name| !taken(name))
            .unwrap_or(base)
    }
}

impl<'a> Visitor for Cypher<'a> {
    const C_PARAM: &'static str = "$";
    const C_QUOTE: &'static str = "`";
    const C_INDENT: &'static str = "    ";

    #[tracing::instrument(name = "render_cypher", skip_all)]
    fn build(statement: &Statement, shared: &Params) -> Result<(String, Params)> {
        let mut cypher = Cypher {
            parameters: Params::new(),
            shared,
            scope: Scope::new(),
        };

        let text = cypher.visit_statement(statement)?;

        tracing::trace!(cypher = %text, parameters = cypher.parameters.len(), "rendered statement");

        Ok((text, cypher.parameters))
    }

    fn add_parameter(&mut self, parameter: &Parameter) -> Result<String> {
        match &parameter.value {
            Some(value) => {
                let name = self.parameter_name(&parameter.hint);
                self.parameters.insert(name.clone(), value.clone());

                Ok(name)
            }
            None => {
                let value = self
                    .shared
                    .get(&parameter.hint)
                    .ok_or_else(|| Error::UnboundSharedParameter {
                        name: parameter.hint.clone(),
                    })?;

                self.parameters
                    .entry(parameter.hint.clone())
                    .or_insert_with(|| value.clone());

                Ok(parameter.hint.clone())
            }
        }
    }

    fn scope(&mut self) -> &mut Scope {
        &mut self.scope
    }
}

#[cfg(test)]
mod tests {
    use crate::{Error, Params, ast::*, visitor::*};
    use graph_value::GraphValue;
    use pretty_assertions::assert_eq;

    fn build(statement: &Statement) -> crate::Result<(String, Params)> {
        Cypher::build(statement, &Params::new())
    }

    #[test]
    fn match_with_filter_and_projection() {
        let this = Variable::new("this");

        let statement = Statement::new()
            .with(
                Match::new(NodePattern::new(&this).label("Movie"))
                    .so_that(this.property("title").equals(Expression::param("param0", "Matrix"))),
            )
            .with(Return::new().item((
                Expression::map_projection(&this, vec![MapProjectionItem::Property("title".into())]),
                this.clone(),
            )));

        let (cypher, params) = build(&statement).unwrap();

        expect_test::expect![[r#"
            MATCH (this:Movie)
            WHERE this.title = $param0
            RETURN this { .title } AS this"#]]
        .assert_eq(&cypher);

        assert_eq!(Some(&GraphValue::from("Matrix")), params.get("param0"));
    }

    #[test]
    fn parameter_names_are_unique() {
        let this = Variable::new("this");

        let statement = Statement::new()
            .with(
                Match::new(NodePattern::new(&this).label("Movie")).so_that(Predicate::or([
                    this.property("title").equals(Expression::param("title", "a")),
                    this.property("title").equals(Expression::param("title", "b")),
                    this.property("title").equals(Expression::param("title", "c")),
                ])),
            )
            .with(Return::new().item(&this));

        let (cypher, params) = build(&statement).unwrap();

        assert_eq!(
            "MATCH (this:Movie)\nWHERE this.title = $title OR this.title = $title_1 OR this.title = $title_2\nRETURN this",
            cypher
        );
        assert_eq!(vec!["title", "title_1", "title_2"], params.keys().collect::<Vec<_>>());
    }

    #[test]
    fn subquery_imports_and_returns() {
        let this = Variable::new("this");
        let actor = Variable::new("this0");
        let var = Variable::new("var1");

        let body = Statement::new()
            .with(Match::new(
                Pattern::node(NodePattern::new(&this)).related(
                    RelationshipPattern::new(PatternDirection::Incoming).rel_type("ACTED_IN"),
                    NodePattern::new(&actor).label("Actor"),
                ),
            ))
            .with(Return::new().item((
                Expression::map_projection(&actor, vec![MapProjectionItem::Property("name".into())]).collect(),
                var.clone(),
            )));

        let statement = Statement::new()
            .with(Match::new(NodePattern::new(&this).label("Movie")))
            .with(Call::new(body).import(&this))
            .with(Return::new().item((
                Expression::map_projection(&this, vec![MapProjectionItem::Entry("actors".into(), var.clone().into())]),
                this.clone(),
            )));

        let (cypher, _) = build(&statement).unwrap();

        expect_test::expect![[r#"
            MATCH (this:Movie)
            CALL {
                WITH this
                MATCH (this)<-[:ACTED_IN]-(this0:Actor)
                RETURN collect(this0 { .name }) AS var1
            }
            RETURN this { actors: var1 } AS this"#]]
        .assert_eq(&cypher);
    }

    #[test]
    fn variables_of_a_subquery_do_not_leak() {
        let this = Variable::new("this");
        let inner = Variable::new("inner");

        let statement = Statement::new()
            .with(Match::new(NodePattern::new(&this).label("Movie")))
            .with(Call::new(
                Statement::new()
                    .with(Match::new(NodePattern::new(&inner).label("Actor")))
                    .with(Return::new().item((Expression::function("count", vec![inner.clone().into()]), Variable::new("c")))),
            ))
            .with(Return::new().item(&inner));

        assert_eq!(Err(Error::UndefinedVariable { name: "inner".into() }), build(&statement));
    }

    #[test]
    fn subquery_returns_cannot_shadow_outer_variables() {
        let this = Variable::new("this");

        let statement = Statement::new()
            .with(Match::new(NodePattern::new(&this).label("Movie")))
            .with(Call::new(Statement::new().with(Return::new().item((Expression::int(1), this.clone())))))
            .with(Return::new().item(&this));

        assert_eq!(Err(Error::ReturnShadowsOuter { name: "this".into() }), build(&statement));
    }

    #[test]
    fn union_branches_return_the_same_columns() {
        let statement = Statement::new().with(Call::union(vec![
            Statement::new().with(Return::new().item((Expression::int(1), Variable::new("a")))),
            Statement::new().with(Return::new().item((Expression::int(2), Variable::new("b")))),
        ]));

        assert!(matches!(build(&statement), Err(Error::UnionColumnMismatch { .. })));
    }

    #[test]
    fn labeled_variables_cannot_be_redeclared() {
        let this = Variable::new("this");

        let statement = Statement::new()
            .with(Match::new(NodePattern::new(&this).label("Movie")))
            .with(Create::new(NodePattern::new(&this).label("Movie")));

        assert_eq!(Err(Error::VariableAlreadyDeclared { name: "this".into() }), build(&statement));
    }

    #[test]
    fn projections_need_aliases() {
        let statement = Statement::new().with(Return::new().item(ProjectionItem {
            expression: Expression::int(1),
            alias: None,
        }));

        assert_eq!(
            Err(Error::MissingAlias {
                expression: "1".into()
            }),
            build(&statement)
        );
    }

    #[test]
    fn shared_parameters_are_looked_up() {
        let this = Variable::new("this");

        let statement = Statement::new()
            .with(
                Match::new(NodePattern::new(&this).label("Movie"))
                    .so_that(this.property("owner").equals(Expression::shared_param("jwt").property("sub"))),
            )
            .with(Return::new().item(&this));

        assert_eq!(
            Err(Error::UnboundSharedParameter { name: "jwt".into() }),
            build(&statement)
        );

        let mut shared = Params::new();
        shared.insert("jwt".into(), GraphValue::object([("sub", GraphValue::from("u1"))]));

        let (cypher, params) = Cypher::build(&statement, &shared).unwrap();

        assert!(cypher.contains("this.owner = $jwt.sub"));
        assert_eq!(vec!["jwt"], params.keys().collect::<Vec<_>>());
    }

    #[test]
    fn identifiers_are_quoted_when_needed() {
        let this = Variable::new("this");

        let statement = Statement::new()
            .with(Create::new(
                NodePattern::new(&this)
                    .label("My Label")
                    .property("weird`key", Expression::string("say \"hi\"")),
            ))
            .with(Return::new().item(&this));

        let (cypher, _) = build(&statement).unwrap();

        assert_eq!(
            "CREATE (this:`My Label` { `weird``key`: \"say \\\"hi\\\"\" })\nRETURN this",
            cypher
        );
    }
}
