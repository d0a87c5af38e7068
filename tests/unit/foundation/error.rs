use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(QuoteReelError::input("x").to_string().contains("input error:"));
    assert!(
        QuoteReelError::render(3, "x")
            .to_string()
            .contains("render error (record 3):")
    );
    assert!(
        QuoteReelError::storage("out/quote_000.png", "x")
            .to_string()
            .contains("storage error (out/quote_000.png):")
    );
    assert!(QuoteReelError::encode("x").to_string().contains("encode error:"));
    assert!(QuoteReelError::config("x").to_string().contains("config error:"));
}

#[test]
fn stage_names_match_variants() {
    assert_eq!(QuoteReelError::input("x").stage(), "input");
    assert_eq!(QuoteReelError::render(0, "x").stage(), "render");
    assert_eq!(QuoteReelError::storage("p", "x").stage(), "storage");
    assert_eq!(QuoteReelError::encode("x").stage(), "encode");
    assert_eq!(QuoteReelError::config("x").stage(), "config");
}

#[test]
fn at_record_tags_generic_failures_only() {
    let err = QuoteReelError::config("no font").at_record(7);
    assert_eq!(err.record_index(), Some(7));
    assert!(err.to_string().contains("no font"));

    let err = QuoteReelError::render(2, "boom").at_record(7);
    assert_eq!(err.record_index(), Some(2));

    let err = QuoteReelError::storage("p", "disk full").at_record(7);
    assert_eq!(err.stage(), "storage");
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = QuoteReelError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
