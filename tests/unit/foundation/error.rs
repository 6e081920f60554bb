use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        GloperateError::configuration("x")
            .to_string()
            .contains("configuration error:")
    );
    assert!(
        GloperateError::type_mismatch("x")
            .to_string()
            .contains("type mismatch:")
    );
    assert!(
        GloperateError::context("x")
            .to_string()
            .contains("context error:")
    );
    assert!(
        GloperateError::resource("x")
            .to_string()
            .contains("resource error:")
    );
    assert!(
        GloperateError::process("x")
            .to_string()
            .contains("processing error:")
    );
}

#[test]
fn fatal_classification_matches_taxonomy() {
    assert!(GloperateError::configuration("x").is_fatal());
    assert!(GloperateError::type_mismatch("x").is_fatal());
    assert!(!GloperateError::context("x").is_fatal());
    assert!(!GloperateError::resource("x").is_fatal());
    assert!(!GloperateError::process("x").is_fatal());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = GloperateError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
    assert!(!err.is_fatal());
}
