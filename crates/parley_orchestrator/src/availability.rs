//! Cached provider availability.

use dashmap::DashMap;
use parley_interface::ProviderDriver;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
struct Entry {
    available: bool,
    checked_at: Instant,
}

/// Probe results per provider, trusted for a fixed TTL.
#[derive(Debug)]
pub struct AvailabilityCache {
    ttl: Duration,
    entries: DashMap<String, Entry>,
}

impl AvailabilityCache {
    /// Cache trusting probe results for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
        }
    }

    /// How long a probe result is trusted.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached result for `provider`, if still fresh.
    pub fn get(&self, provider: &str) -> Option<bool> {
        let entry = self.entries.get(provider)?;
        if entry.checked_at.elapsed() >= self.ttl {
            return None;
        }
        Some(entry.available)
    }

    /// Store a probe result.
    pub fn insert(&self, provider: &str, available: bool) {
        self.entries.insert(
            provider.to_string(),
            Entry {
                available,
                checked_at: Instant::now(),
            },
        );
    }

    /// Forget one provider's result.
    pub fn invalidate(&self, provider: &str) {
        self.entries.remove(provider);
    }

    /// Forget every result.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Cached availability, probing the provider when the entry is stale.
    pub async fn check<P>(&self, provider: &P) -> bool
    where
        P: ProviderDriver + ?Sized,
    {
        if let Some(available) = self.get(provider.name()) {
            return available;
        }
        let available = provider.probe().await;
        debug!(provider = provider.name(), available, "Probed provider");
        self.insert(provider.name(), available);
        available
    }
}

impl Default for AvailabilityCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(300))
    }
}
