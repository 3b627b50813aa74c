//! Card resolver contract and implementations.
//!
//! The deck importer and the spares inventory only ever talk to the
//! [`CardResolver`] trait, so the live Scryfall client can be swapped for a
//! fixture table in tests or offline runs.

use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure channel for card lookups. Callers treat these as non-fatal:
/// the raw name is kept and a warning is accumulated.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Card not found: {0}")]
    NotFound(String),
    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result alias for card lookups
pub type ResolveResult = Result<ResolvedCard, ResolveError>;

/// Canonical card metadata returned from a lookup.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ResolvedCard {
    pub name: String,
    #[serde(default)]
    pub type_line: Option<String>,
    /// One-letter color codes (W, U, B, R, G, C) for the whole card.
    #[serde(default)]
    pub color_identity: Vec<String>,
    #[serde(default)]
    pub cmc: f64,
    /// Currency code to price string, as Scryfall reports it. Null prices
    /// stay as `None`.
    #[serde(default)]
    pub prices: HashMap<String, Option<String>>,
    /// For double-faced/split cards the faces carry the display names.
    #[serde(default)]
    pub card_faces: Option<Vec<CardFace>>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CardFace {
    pub name: String,
    #[serde(default)]
    pub type_line: Option<String>,
}

impl ResolvedCard {
    /// Canonical single-name form: the front face for double-faced/split
    /// cards, the full name otherwise. Color identity and CMC stay those of
    /// the whole card.
    pub fn canonical_name(&self) -> &str {
        if let Some(faces) = &self.card_faces {
            if let Some(face) = faces.first() {
                return &face.name;
            }
        }
        self.name.split(" // ").next().unwrap_or(&self.name)
    }

    /// Price in the given currency, if Scryfall reported one.
    pub fn price_in(&self, currency: &str) -> Option<f64> {
        let code = currency.to_lowercase();
        self.prices
            .get(&code)
            .or_else(|| self.prices.get(&currency.to_uppercase()))
            .and_then(|price| price.as_deref())
            .and_then(|raw| raw.parse::<f64>().ok())
    }
}

/// Abstract card lookup capability consumed by the importer, the valuer and
/// the spares inventory.
pub trait CardResolver {
    fn resolve(&self, name: &str) -> ResolveResult;
}

/// Resolves card names against Scryfall's fuzzy matching endpoint.
pub struct ScryfallResolver {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl ScryfallResolver {
    const USER_AGENT: &'static str = "mtg-decks/0.1";
    const RETRY_DELAY: Duration = Duration::from_millis(500);

    pub fn new() -> Self {
        Self::with_base_url("https://api.scryfall.com")
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::blocking::Client::new(),
        }
    }

    fn fetch(&self, name: &str) -> ResolveResult {
        let url = format!(
            "{}/cards/named?fuzzy={}",
            self.base_url,
            urlencoding::encode(name)
        );

        log::debug!("Fetching card from Scryfall: {name}");

        let response = self
            .client
            .get(&url)
            .header("User-Agent", Self::USER_AGENT)
            .send()?;

        if response.status().is_success() {
            let body = response.text()?;
            serde_json::from_str(&body).map_err(ResolveError::Parse)
        } else {
            Err(ResolveError::NotFound(name.to_string()))
        }
    }
}

impl Default for ScryfallResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl CardResolver for ScryfallResolver {
    fn resolve(&self, name: &str) -> ResolveResult {
        // One retry on transport failures; not-found answers are final.
        match self.fetch(name) {
            Err(ResolveError::Network(e)) => {
                log::warn!("Lookup for '{name}' failed ({e}), retrying once");
                thread::sleep(Self::RETRY_DELAY);
                self.fetch(name)
            }
            result => result,
        }
    }
}

/// Mapping-backed resolver for tests and offline runs. Keys are matched by
/// case-folded name.
#[derive(Default)]
pub struct FixtureResolver {
    cards: HashMap<String, ResolvedCard>,
}

impl FixtureResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, query: &str, card: ResolvedCard) {
        self.cards.insert(query.to_lowercase(), card);
    }

    /// Convenience constructor: every name resolves verbatim with no
    /// metadata attached.
    pub fn verbatim(names: &[&str]) -> Self {
        let mut resolver = Self::new();
        for name in names {
            resolver.insert(
                name,
                ResolvedCard {
                    name: name.to_string(),
                    type_line: None,
                    color_identity: Vec::new(),
                    cmc: 0.0,
                    prices: HashMap::new(),
                    card_faces: None,
                },
            );
        }
        resolver
    }
}

impl CardResolver for FixtureResolver {
    fn resolve(&self, name: &str) -> ResolveResult {
        self.cards
            .get(&name.to_lowercase())
            .cloned()
            .ok_or_else(|| ResolveError::NotFound(name.to_string()))
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
