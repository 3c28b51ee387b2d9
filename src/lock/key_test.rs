// ABOUTME: Tests for lock key derivation and identity normalization.
// ABOUTME: Covers case folding, phone digit stripping, and anonymous fallback.

use super::LeadIdentity;

#[test]
fn test_email_is_case_and_whitespace_insensitive() {
    let a = LeadIdentity::from_email("A@B.com");
    let b = LeadIdentity::from_email("  a@b.com ");
    assert_eq!(a.lock_key(), b.lock_key());
    assert_eq!(a.lock_key(), "lead:email:a@b.com");
}

#[test]
fn test_phone_keeps_digits_only() {
    let a = LeadIdentity::from_phone("+7 (700) 123-45-67");
    let b = LeadIdentity::from_phone("77001234567");
    assert_eq!(a.lock_key(), b.lock_key());
    assert_eq!(a.lock_key(), "lead:phone:77001234567");
}

#[test]
fn test_composite_key_uses_both_fragments() {
    let identity = LeadIdentity::new("Ada@Example.COM", "+1 555-0100");
    assert_eq!(identity.lock_key(), "lead:ada@example.com:15550100");
}

#[test]
fn test_empty_fragments_count_as_absent() {
    let identity = LeadIdentity::new("  ", "ext. none");
    let key = identity.lock_key();
    assert!(key.starts_with("lead:anonymous:"));
}

#[test]
fn test_anonymous_keys_never_collide() {
    let identity = LeadIdentity::default();
    assert_ne!(identity.lock_key(), identity.lock_key());
}

#[test]
fn test_distinct_identities_get_distinct_keys() {
    let a = LeadIdentity::from_email("a@b.com");
    let b = LeadIdentity::from_email("b@b.com");
    assert_ne!(a.lock_key(), b.lock_key());
}
