use super::*;

#[test]
fn scalar_needs_no_rc() {
    assert!(!ArcClass::Scalar.needs_rc());
}

#[test]
fn references_need_rc() {
    assert!(ArcClass::DefiniteRef.needs_rc());
    // Unresolved generics are treated as objects.
    assert!(ArcClass::PossibleRef.needs_rc());
}

#[test]
fn init_tracing_is_idempotent() {
    init_tracing();
    init_tracing();
}
