//! Deck pricing and the month-granularity valuation cache.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::currency::format_currency;
use crate::error::Result;
use crate::resolver::CardResolver;

/// Priced snapshot of one deck.
#[derive(Debug, Clone)]
pub struct DeckValuation {
    pub currency: String,
    pub total: f64,
    /// Unit price per canonical card name.
    pub per_card: BTreeMap<String, f64>,
    pub missing_prices: Vec<String>,
}

impl DeckValuation {
    pub fn formatted_total(&self) -> String {
        format_currency(Some(self.total), &self.currency)
    }
}

/// Looks up card prices through the resolver and totals a deck.
pub struct DeckValuer<'a> {
    resolver: &'a dyn CardResolver,
}

impl<'a> DeckValuer<'a> {
    pub fn new(resolver: &'a dyn CardResolver) -> Self {
        Self { resolver }
    }

    /// Unit price for one card in the given currency, if the resolver
    /// knows one.
    pub fn price_card(&self, name: &str, currency: &str) -> Option<f64> {
        match self.resolver.resolve(name) {
            Ok(card) => card.price_in(currency),
            Err(e) => {
                debug!("Price lookup failed for '{name}': {e}");
                None
            }
        }
    }

    /// Totals `(display name, count)` pairs. Cards without a price land in
    /// `missing_prices` and contribute nothing to the total.
    pub fn value_counts<I>(&self, counts: I, currency: &str) -> DeckValuation
    where
        I: IntoIterator<Item = (String, u32)>,
    {
        let mut total = 0.0;
        let mut per_card = BTreeMap::new();
        let mut missing = Vec::new();

        for (name, count) in counts {
            match self.price_card(&name, currency) {
                Some(price) => {
                    total += price * count as f64;
                    per_card.insert(name, price);
                }
                None => missing.push(name),
            }
        }

        DeckValuation {
            currency: currency.to_lowercase(),
            total,
            per_card,
            missing_prices: missing,
        }
    }
}

/// One stored cache entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedValuation {
    pub total: f64,
    #[serde(default)]
    pub per_card: BTreeMap<String, f64>,
    /// RFC 3339 timestamp of when the entry was computed.
    pub timestamp: String,
    pub source: String,
}

/// Persistent valuation cache keyed by `(deck name, currency)`.
///
/// Prices drift slowly, so an entry from the current calendar month is
/// reused; anything older is a miss and gets refreshed.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ValuationCache {
    entries: BTreeMap<String, CachedValuation>,
    #[serde(skip)]
    path: PathBuf,
}

impl ValuationCache {
    /// Loads the cache from disk, starting fresh when the file is missing
    /// or unreadable.
    pub fn load(path: &Path) -> Self {
        let mut cache = if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match serde_json::from_str::<ValuationCache>(&content) {
                    Ok(cache) => {
                        info!("Loaded valuation cache with {} entries", cache.entries.len());
                        cache
                    }
                    Err(e) => {
                        warn!("Failed to parse valuation cache, starting fresh: {e}");
                        Self::default()
                    }
                },
                Err(e) => {
                    warn!("Failed to read valuation cache, starting fresh: {e}");
                    Self::default()
                }
            }
        } else {
            Self::default()
        };
        cache.path = path.to_path_buf();
        cache
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&self.path, content)?;
        debug!("Saved valuation cache with {} entries", self.entries.len());
        Ok(())
    }

    fn key(deck_name: &str, currency: &str) -> String {
        format!("{deck_name}|{}", currency.to_lowercase())
    }

    /// Returns the cached entry if it was computed in the same calendar
    /// month as `now`.
    pub fn get(&self, deck_name: &str, currency: &str, now: DateTime<Utc>) -> Option<&CachedValuation> {
        let entry = self.entries.get(&Self::key(deck_name, currency))?;
        let stored = DateTime::parse_from_rfc3339(&entry.timestamp).ok()?;
        if (stored.year(), stored.month()) == (now.year(), now.month()) {
            Some(entry)
        } else {
            debug!("Cache entry for '{deck_name}' is from a previous month");
            None
        }
    }

    pub fn store(
        &mut self,
        deck_name: &str,
        valuation: &DeckValuation,
        source: &str,
        now: DateTime<Utc>,
    ) {
        self.entries.insert(
            Self::key(deck_name, &valuation.currency),
            CachedValuation {
                total: valuation.total,
                per_card: valuation.per_card.clone(),
                timestamp: now.to_rfc3339(),
                source: source.to_string(),
            },
        );
    }
}

#[cfg(test)]
#[path = "valuation_tests.rs"]
mod tests;
