use cypher_builder::{Params, ast::*, visitor::*};
use pretty_assertions::assert_eq;

#[test]
fn create_then_match_is_separated_by_with() {
    let this0 = Variable::new("this0");
    let actor = Variable::new("this0_actor");

    let statement = Statement::new()
        .with(Create::new(NodePattern::new(&this0).label("Movie")))
        .with(Set::new(vec![SetItem::property(&this0, "title", Expression::param("this0_title", "Dune"))]))
        .with(Match::optional(NodePattern::new(&actor).label("Actor")))
        .with(Merge::new(Pattern::node(NodePattern::new(&this0)).related(
            RelationshipPattern::new(PatternDirection::Incoming).rel_type("ACTED_IN"),
            NodePattern::new(&actor),
        )))
        .with(Return::new().item(&this0));

    let (cypher, params) = Cypher::build(&statement, &Params::new()).unwrap();

    expect_test::expect![[r#"
        CREATE (this0:Movie)
        SET this0.title = $this0_title
        WITH *
        OPTIONAL MATCH (this0_actor:Actor)
        MERGE (this0)<-[:ACTED_IN]-(this0_actor)
        RETURN this0"#]]
    .assert_eq(&cypher);

    assert_eq!(vec!["this0_title"], params.keys().collect::<Vec<_>>());
}

#[test]
fn union_subquery_with_typename() {
    let this = Variable::new("this");
    let movie = Variable::new("this0");
    let series = Variable::new("this1");
    let result = Variable::new("this");

    let branch = |variable: &Variable, label: &str| {
        Statement::new()
            .with(Match::new(NodePattern::new(variable).label(label)))
            .with(With::new().item((
                Expression::map_projection(
                    variable,
                    vec![
                        MapProjectionItem::Property("title".into()),
                        MapProjectionItem::Entry("__typename".into(), Expression::string(label)),
                    ],
                ),
                Variable::new("this"),
            )))
            .with(Return::new().item(&result))
    };

    let statement = Statement::new()
        .with(Call::union(vec![branch(&movie, "Movie"), branch(&series, "Series")]))
        .with(
            With::new()
                .item(&this)
                .order_by(this.property("title"), SortDirection::Ascending)
                .limit(Expression::param("limit", 10)),
        )
        .with(Return::new().item(&this));

    let (cypher, params) = Cypher::build(&statement, &Params::new()).unwrap();

    expect_test::expect![[r#"
        CALL {
            MATCH (this0:Movie)
            WITH this0 { .title, __typename: "Movie" } AS this
            RETURN this
            UNION
            MATCH (this1:Series)
            WITH this1 { .title, __typename: "Series" } AS this
            RETURN this
        }
        WITH this
        ORDER BY this.title ASC
        LIMIT $limit
        RETURN this"#]]
    .assert_eq(&cypher);

    assert_eq!(Some(&graph_value::GraphValue::Int(10)), params.get("limit"));
}

#[test]
fn reduce_and_comprehension_bind_locally() {
    let meta = Variable::new("meta");
    let acc = Variable::new("acc");
    let m = Variable::new("m");
    let x = Variable::new("x");

    let statement = Statement::new()
        .with(Unwind::new(Expression::list(vec![Expression::list(vec![Expression::int(1)])]), meta.clone()))
        .with(Return::new().item((
            Expression::reduce(Reduce {
                accumulator: acc.clone(),
                initial: Expression::list(vec![]),
                variable: m.clone(),
                list: Expression::comprehension(ListComprehension {
                    variable: x.clone(),
                    list: meta.clone().into(),
                    filter: Some(Expression::from(&x).is_not_null()),
                    map: None,
                }),
                expression: Expression::from(&acc).binary(BinaryOperator::Add, m.clone().into()),
            }),
            Variable::new("meta_out"),
        )));

    let (cypher, _) = Cypher::build(&statement, &Params::new()).unwrap();

    assert_eq!(
        "UNWIND [[1]] AS meta\nRETURN reduce(acc = [], m IN [x IN meta WHERE x IS NOT NULL] | acc + m) AS meta_out",
        cypher
    );
}
