use super::*;

#[test]
fn parses_in_source_order() {
    let json = r#"[
        {"quote": "A", "author": "B"},
        {"quote": "C", "author": "D"}
    ]"#;
    let records = parse_quotes(json).unwrap();
    assert_eq!(
        records,
        vec![QuoteRecord::new("A", "B"), QuoteRecord::new("C", "D")]
    );
}

#[test]
fn empty_list_is_an_input_error() {
    let err = parse_quotes("[]").unwrap_err();
    assert_eq!(err.stage(), "input");
}

#[test]
fn malformed_json_is_an_input_error() {
    let err = parse_quotes(r#"[{"quote": "A"}]"#).unwrap_err();
    assert_eq!(err.stage(), "input");
    assert!(err.to_string().contains("malformed"));

    assert!(parse_quotes("{not json").is_err());
}

#[test]
fn blank_fields_name_the_record() {
    let json = r#"[{"quote": "ok", "author": "ok"}, {"quote": "  ", "author": "x"}]"#;
    let err = parse_quotes(json).unwrap_err();
    assert!(err.to_string().contains("record 1"));
    assert!(err.to_string().contains("quote"));
}

#[test]
fn control_characters_are_rejected_but_newlines_allowed() {
    QuoteRecord::new("line one\nline two", "Rumi").validate(0).unwrap();
    let err = QuoteRecord::new("bell\u{7}", "Rumi").validate(4).unwrap_err();
    assert!(err.to_string().contains("U+0007"));
}

#[test]
fn overly_long_text_is_rejected() {
    let long = "x".repeat(MAX_QUOTE_CHARS + 1);
    assert!(QuoteRecord::new(long, "Rumi").validate(0).is_err());
    let ok = "x".repeat(MAX_QUOTE_CHARS);
    QuoteRecord::new(ok, "Rumi").validate(0).unwrap();
}

#[test]
fn markup_characters_pass_through_verbatim() {
    let r = QuoteRecord::new("<b>bold</b> & \"quoted\"", "A <B>");
    r.validate(0).unwrap();
    assert_eq!(r.attribution_line(), "- A <B>");
}

#[test]
fn missing_file_is_an_input_error() {
    let err = load_quotes(Path::new("definitely/not/here.json")).unwrap_err();
    assert_eq!(err.stage(), "input");
}
