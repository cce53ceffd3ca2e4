use super::*;

#[test]
fn ownership_inequality() {
    assert_ne!(Ownership::Borrowed, Ownership::Owned);
}

#[test]
fn default_is_borrowed() {
    assert_eq!(Ownership::default(), Ownership::Borrowed);
}

#[test]
fn only_owned_consumes() {
    assert!(Ownership::Owned.consumes());
    assert!(!Ownership::Borrowed.consumes());
}
