//! Cached timeline feed.
//!
//! # Responsibility
//! - Wrap a timeline source with a short-lived cache.
//! - Shield callers from feed outages.
//!
//! # Invariants
//! - Entries older than the TTL are never served, and every miss evicts
//!   all expired entries.
//! - A failed fetch is cached as an empty list for one TTL window.

use crate::integrations::CollaboratorResult;
use crate::settings::ConferenceSettings;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Default lifetime of a cached timeline.
pub const DEFAULT_FEED_TTL: Duration = Duration::from_secs(5 * 60);

/// One post of an account timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub text: String,
    /// Unix epoch seconds.
    pub timestamp: i64,
    pub follower_count: u64,
    pub id: u64,
}

/// Source of account timelines (microblogging API or similar).
pub trait FeedSource {
    fn user_timeline(&self, account: &str, count: usize) -> CollaboratorResult<Vec<FeedEntry>>;
}

#[derive(Debug, Clone)]
struct CachedTimeline {
    entries: Vec<FeedEntry>,
    expires_at: Instant,
}

/// TTL cache in front of a `FeedSource`.
#[derive(Debug)]
pub struct CachedFeed<S> {
    source: S,
    ttl: Duration,
    cache: HashMap<String, CachedTimeline>,
}

impl<S: FeedSource> CachedFeed<S> {
    pub fn new(source: S) -> Self {
        Self::with_ttl(source, DEFAULT_FEED_TTL)
    }

    /// Cache using the configured `feed_cache_ttl_secs`.
    pub fn from_settings(source: S, settings: &ConferenceSettings) -> Self {
        Self::with_ttl(source, settings.feed_cache_ttl())
    }

    pub fn with_ttl(source: S, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            cache: HashMap::new(),
        }
    }

    /// Latest `count` posts of `account`, served from cache when fresh.
    ///
    /// Never fails: fetch errors are logged and produce an empty list.
    pub fn latest(&mut self, account: &str, count: usize) -> Vec<FeedEntry> {
        let key = cache_key(account, count);
        let now = Instant::now();

        if let Some(cached) = self.cache.get(&key) {
            if now < cached.expires_at {
                debug!("event=feed_cache module=integrations status=hit key={key}");
                return cached.entries.clone();
            }
        }
        self.cache.retain(|_, cached| now < cached.expires_at);

        let entries = match self.source.user_timeline(account, count) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(
                    "event=feed_fetch module=integrations status=error key={} error={}",
                    key, err
                );
                Vec::new()
            }
        };
        self.cache.insert(
            key,
            CachedTimeline {
                entries: entries.clone(),
                expires_at: now + self.ttl,
            },
        );
        entries
    }

    /// Drops every cached timeline.
    pub fn clear(&mut self) {
        self.cache.clear();
    }

    /// Number of timelines currently held.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

/// Cache key for one `(account, count)` request.
pub fn cache_key(account: &str, count: usize) -> String {
    format!("conf:latest:tweets:{account}:{count}")
}
