// ABOUTME: Canonical lock key derivation from lead identity fragments.
// ABOUTME: Equivalent identities collide; absent identity never shares a key.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix for every lock key this crate writes. `clear_all` and
/// `list_active` operate on this namespace.
pub const KEY_PREFIX: &str = "lead:";

fn non_digits() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\D").expect("static pattern"))
}

/// Identity fragments of the real-world entity a write refers to.
///
/// Normalization makes equivalent submissions collide: email is compared
/// case-insensitively and phone by digits only, so "A@B.com" and
/// "+7 (700) 123-45-67" contend with "a@b.com" and "77001234567".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadIdentity {
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl LeadIdentity {
    /// Identity with both fragments.
    pub fn new(email: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            phone: Some(phone.into()),
        }
    }

    /// Identity from an email alone.
    pub fn from_email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            phone: None,
        }
    }

    /// Identity from a phone alone.
    pub fn from_phone(phone: impl Into<String>) -> Self {
        Self {
            email: None,
            phone: Some(phone.into()),
        }
    }

    fn normalized_email(&self) -> Option<String> {
        self.email
            .as_deref()
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
    }

    fn normalized_phone(&self) -> Option<String> {
        self.phone
            .as_deref()
            .map(|p| non_digits().replace_all(p, "").into_owned())
            .filter(|p| !p.is_empty())
    }

    /// Derive the canonical lock key for this identity.
    ///
    /// Both fragments give the strongest deduplication; one fragment falls
    /// back to that fragment's namespace. With no usable fragment the key is
    /// unique per call, so anonymous writes never block each other and never
    /// accidentally share a lock.
    pub fn lock_key(&self) -> String {
        match (self.normalized_email(), self.normalized_phone()) {
            (Some(email), Some(phone)) => format!("{}{}:{}", KEY_PREFIX, email, phone),
            (Some(email), None) => format!("{}email:{}", KEY_PREFIX, email),
            (None, Some(phone)) => format!("{}phone:{}", KEY_PREFIX, phone),
            (None, None) => format!("{}anonymous:{}", KEY_PREFIX, Uuid::new_v4()),
        }
    }
}
