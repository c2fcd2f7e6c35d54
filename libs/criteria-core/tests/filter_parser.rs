use criteria_core::{
    parse_filters, CompareOp, Criteria, Error, FieldKind, FieldSchema, FieldSpec,
    FilterCondition, FilterOp, LikePattern, Value,
};

fn schema() -> FieldSchema {
    FieldSchema::builder("form")
        .field("id", FieldSpec::number().sortable())
        .field("name", FieldSpec::string().sortable().searchable())
        .field("header", FieldSpec::string().operators(&[FilterOp::Eq]))
        .field("views", FieldSpec::number().sortable())
        .field("published", FieldSpec::boolean())
        .field("state", FieldSpec::enumeration(["DRAFT", "LIVE"]))
        .tiebreaker("id")
        .build()
        .expect("schema")
}

fn cond(field: &str, values: &[&str]) -> FilterCondition {
    FilterCondition::new(field, values.iter().copied())
}

#[test]
fn empty_input_is_empty_criteria() {
    assert_eq!(parse_filters(&schema(), &[]), Ok(Criteria::Empty));
    assert_eq!(parse_filters(&schema(), &[cond("name", &[])]), Ok(Criteria::Empty));
}

#[test]
fn range_on_one_field_is_and_by_default() {
    let c = parse_filters(&schema(), &[cond("views", &["gte:10", "lt:20"])]).unwrap();
    assert_eq!(
        c,
        Criteria::And(vec![
            Criteria::compare("views", CompareOp::Gte, 10),
            Criteria::compare("views", CompareOp::Lt, 20),
        ])
    );
}

#[test]
fn or_combinator_applies_within_a_field_only() {
    let c = parse_filters(
        &schema(),
        &[
            cond("state", &["eq:draft", "eq:LIVE"]).any(),
            cond("published", &["eq:true"]),
        ],
    )
    .unwrap();
    assert_eq!(
        c.to_string(),
        "((state = DRAFT OR state = LIVE) AND published = true)"
    );
}

#[test]
fn every_operator_maps_to_its_node() {
    let s = schema();
    let one = |raw: &str| parse_filters(&s, &[cond("name", &[raw])]).unwrap();

    assert_eq!(one("ne:x"), Criteria::not_equals("name", "x"));
    assert_eq!(one("lk:A%"), Criteria::like("name", LikePattern::new("A%")));
    assert_eq!(one("ilk:a%"), Criteria::like("name", LikePattern::ignore_case("a%")));
    assert_eq!(
        one("in:a|b"),
        Criteria::In("name".into(), vec![Value::from("a"), Value::from("b")])
    );
    assert_eq!(
        one("nin:a"),
        Criteria::NotIn("name".into(), vec![Value::from("a")])
    );
    assert_eq!(one("nul:"), Criteria::IsNull("name".into()));
    assert_eq!(one("NNUL:ignored"), Criteria::IsNotNull("name".into()));
}

#[test]
fn value_may_contain_colons() {
    let c = parse_filters(&schema(), &[cond("name", &["eq:a:b"])]).unwrap();
    assert_eq!(c, Criteria::equals("name", "a:b"));
}

#[test]
fn field_names_are_canonicalized() {
    let c = parse_filters(&schema(), &[cond("NAME", &["eq:x"])]).unwrap();
    assert_eq!(c.field(), Some("name"));
}

#[test]
fn operator_errors() {
    let s = schema();
    assert_eq!(
        parse_filters(&s, &[cond("name", &["ENABLED"])]),
        Err(Error::InvalidFilterOperator {
            field: "name".into(),
            operator: "ENABLED".into()
        })
    );
    assert_eq!(
        parse_filters(&s, &[cond("name", &["between:1"])]),
        Err(Error::InvalidFilterOperator {
            field: "name".into(),
            operator: "between".into()
        })
    );
    // restricted by the field spec
    assert_eq!(
        parse_filters(&s, &[cond("header", &["lk:x"])]),
        Err(Error::InvalidFilterOperator {
            field: "header".into(),
            operator: "lk".into()
        })
    );
    // not valid for the kind
    assert!(matches!(
        parse_filters(&s, &[cond("published", &["gt:true"])]),
        Err(Error::InvalidFilterOperator { .. })
    ));
}

#[test]
fn value_errors_carry_expected_kind() {
    let s = schema();
    assert_eq!(
        parse_filters(&s, &[cond("views", &["gt:many"])]),
        Err(Error::InvalidFilterValue {
            field: "views".into(),
            value: "many".into(),
            expected: FieldKind::Number
        })
    );
    assert!(matches!(
        parse_filters(&s, &[cond("state", &["eq:ARCHIVED"])]),
        Err(Error::InvalidFilterValue { expected: FieldKind::Enum, .. })
    ));
    assert!(matches!(
        parse_filters(&s, &[cond("views", &["in:1|x"])]),
        Err(Error::InvalidFilterValue { .. })
    ));

    // empty lists would otherwise match nothing (in) or every non-null row (nin)
    for raw in ["in:", "in:|", "nin:", "nin:||"] {
        assert_eq!(
            parse_filters(&s, &[cond("views", &[raw])]),
            Err(Error::InvalidFilterValue {
                field: "views".into(),
                value: raw.split_once(':').unwrap().1.into(),
                expected: FieldKind::Number
            }),
            "{raw}"
        );
    }
}

#[test]
fn first_failing_condition_wins() {
    let err = parse_filters(
        &schema(),
        &[cond("secretColumn", &["eq:1"]), cond("views", &["gt:x"])],
    )
    .unwrap_err();
    assert_eq!(err, Error::InvalidFilterField("secretColumn".into()));
}
