use sqlstencil::{classify, Binding, StencilError, Substitutions, Template};

#[test]
fn every_key_lands_in_exactly_one_bucket() {
    let template = Template::new("select {columns} from {table} where id = %id% and kind in (%kinds%)");
    let request = Substitutions::new()
        .with("columns", vec!["a", "b"])
        .with("table", "t")
        .with("id", "5")
        .with("kinds", vec!["x", "y"]);
    let classified = classify(&template, &request).expect("classify");
    assert_eq!(classified.len(), request.len());
    assert_eq!(classified.identifiers.len(), 2);
    assert_eq!(classified.values.len(), 2);
    assert_eq!(classified.identifier("table"), Some(&Binding::from("t")));
    assert_eq!(classified.value("kinds"), Some(&Binding::from(vec!["x", "y"])));
    assert!(classified.identifier("id").is_none());
}

#[test]
fn value_offsets_follow_the_template() {
    let template = Template::new("where b = %zeta% and a = %alpha%");
    let request = Substitutions::new().with("alpha", "1").with("zeta", "2");
    let classified = classify(&template, &request).expect("classify");
    let order: Vec<&str> = classified.values_in_order().into_iter().map(|(k, _)| k).collect();
    assert_eq!(order, vec!["zeta", "alpha"]);
    assert_eq!(classified.values["zeta"].offset, 10);
}

#[test]
fn empty_request_classifies_to_nothing() {
    let template = Template::new("select 1");
    let classified = classify(&template, &Substitutions::new()).expect("classify");
    assert!(classified.is_empty());
}

#[test]
fn both_marker_syntaxes_are_ambiguous_in_either_order() {
    let request = Substitutions::new().with("k", "v");
    for text in ["select {k} from t where x = %k%", "select %k% from {k}"] {
        let err = classify(&Template::new(text), &request).unwrap_err();
        assert!(
            matches!(err, StencilError::AmbiguousKeyUsage { ref key } if key == "k"),
            "unexpected {err} for {text}"
        );
    }
}

#[test]
fn repeated_markers_are_rejected() {
    let request = Substitutions::new().with("k", "v");
    for text in [
        "select * from t where a = %k% or b = %k%",
        "select {k}, {k} from t",
        // overlapping repeat
        "select %k%k%",
    ] {
        let err = classify(&Template::new(text), &request).unwrap_err();
        assert!(matches!(err, StencilError::RepeatedKeyUsage { .. }), "unexpected {err} for {text}");
    }
}

#[test]
fn missing_key_is_reported() {
    let template = Template::new("select * from {table}");
    let request = Substitutions::new().with("table", "t").with("columns", vec!["a"]);
    let err = classify(&template, &request).unwrap_err();
    assert!(matches!(err, StencilError::KeyNotFoundInTemplate { ref key } if key == "columns"));
}

#[test]
fn malformed_key_is_rejected_before_searching() {
    let template = Template::new("select * from {my-table}");
    let request = Substitutions::new().with("my-table", "t");
    let err = classify(&template, &request).unwrap_err();
    assert!(matches!(err, StencilError::InvalidKey { .. }));
    assert!(err.is_composition());
}

#[test]
fn unrequested_percent_signs_are_left_alone() {
    let template = Template::new("select * from t where name like '%abc%' and id = %id%");
    let request = Substitutions::new().with("id", "1");
    let classified = classify(&template, &request).expect("classify");
    assert_eq!(classified.values.len(), 1);
}
