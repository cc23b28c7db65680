//! Purpose: Cookie-store capability backing player-identifier persistence.
//! Exports: `CookieStore`, `MemoryCookieStore`.
//! Role: Injected key-value store; substitutes for the browser cookie jar.
//! Invariants: Values are URL-decoded on read, stored raw on write.
//! Invariants: Expired entries are never returned and are evicted on read.

use percent_encoding::percent_decode_str;
use std::collections::HashMap;
use std::sync::Mutex;
use time::{Duration, OffsetDateTime};

pub trait CookieStore {
    fn get(&self, name: &str) -> Option<String>;
    fn set(&self, name: &str, value: &str, ttl: Duration);
}

impl<C: CookieStore + ?Sized> CookieStore for &C {
    fn get(&self, name: &str) -> Option<String> {
        (**self).get(name)
    }

    fn set(&self, name: &str, value: &str, ttl: Duration) {
        (**self).set(name, value, ttl)
    }
}

/// In-process store with real expiry semantics, for embedding environments
/// without a browser cookie jar and for tests.
#[derive(Debug, Default)]
pub struct MemoryCookieStore {
    entries: Mutex<HashMap<String, CookieEntry>>,
}

#[derive(Clone, Debug)]
struct CookieEntry {
    value: String,
    expires_at: OffsetDateTime,
}

impl MemoryCookieStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CookieStore for MemoryCookieStore {
    fn get(&self, name: &str) -> Option<String> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        let entry = entries.get(name)?.clone();
        if entry.expires_at <= OffsetDateTime::now_utc() {
            entries.remove(name);
            return None;
        }
        Some(percent_decode_str(&entry.value).decode_utf8_lossy().into_owned())
    }

    fn set(&self, name: &str, value: &str, ttl: Duration) {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        entries.insert(
            name.to_string(),
            CookieEntry {
                value: value.to_string(),
                expires_at: OffsetDateTime::now_utc() + ttl,
            },
        );
    }
}
