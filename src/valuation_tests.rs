//! Tests for deck pricing and the valuation cache

use std::collections::HashMap;

use chrono::{TimeZone, Utc};
use tempfile::TempDir;

use crate::resolver::{FixtureResolver, ResolvedCard};
use crate::valuation::{DeckValuation, DeckValuer, ValuationCache};

fn priced(name: &str, usd: &str) -> ResolvedCard {
    ResolvedCard {
        name: name.to_string(),
        type_line: None,
        color_identity: Vec::new(),
        cmc: 0.0,
        prices: HashMap::from([("usd".to_string(), Some(usd.to_string()))]),
        card_faces: None,
    }
}

#[test]
fn test_price_card_currency_miss() {
    let mut resolver = FixtureResolver::new();
    resolver.insert("Sol Ring", priced("Sol Ring", "1.50"));
    let valuer = DeckValuer::new(&resolver);

    assert_eq!(valuer.price_card("Sol Ring", "usd"), Some(1.5));
    assert_eq!(valuer.price_card("Sol Ring", "gbp"), None);
    assert_eq!(valuer.price_card("Nonexistent", "usd"), None);
}

#[test]
fn test_value_counts_totals_and_missing() {
    let mut resolver = FixtureResolver::new();
    resolver.insert("Sol Ring", priced("Sol Ring", "1.50"));
    resolver.insert("Mountain", priced("Mountain", "0.10"));
    let valuer = DeckValuer::new(&resolver);

    let valuation = valuer.value_counts(
        vec![
            ("Sol Ring".to_string(), 2),
            ("Mountain".to_string(), 10),
            ("Mystery Card".to_string(), 1),
        ],
        "usd",
    );

    assert!((valuation.total - 4.0).abs() < 1e-9);
    assert_eq!(valuation.per_card.get("Sol Ring"), Some(&1.5));
    assert_eq!(valuation.missing_prices, vec!["Mystery Card".to_string()]);
    assert_eq!(valuation.formatted_total(), "$4.00");
}

#[test]
fn test_cache_hit_within_same_month() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("valuation-cache.json");
    let stored_at = Utc.with_ymd_and_hms(2024, 5, 2, 10, 0, 0).unwrap();
    let later_same_month = Utc.with_ymd_and_hms(2024, 5, 30, 23, 0, 0).unwrap();

    let mut cache = ValuationCache::load(&path);
    let valuation = DeckValuation {
        currency: "usd".to_string(),
        total: 10.0,
        per_card: Default::default(),
        missing_prices: Vec::new(),
    };
    cache.store("Cached Deck", &valuation, "scryfall", stored_at);
    cache.save().unwrap();

    let reloaded = ValuationCache::load(&path);
    let hit = reloaded
        .get("Cached Deck", "usd", later_same_month)
        .expect("entry from the same month must be a hit");
    assert!((hit.total - 10.0).abs() < 1e-9);
    assert_eq!(hit.source, "scryfall");
}

#[test]
fn test_cache_miss_for_previous_month() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("valuation-cache.json");
    let stored_at = Utc.with_ymd_and_hms(2024, 4, 30, 10, 0, 0).unwrap();
    let next_month = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();

    let mut cache = ValuationCache::load(&path);
    let valuation = DeckValuation {
        currency: "usd".to_string(),
        total: 10.0,
        per_card: Default::default(),
        missing_prices: Vec::new(),
    };
    cache.store("Stale Deck", &valuation, "scryfall", stored_at);

    assert!(cache.get("Stale Deck", "usd", next_month).is_none());
    // Same deck under another currency is a distinct key.
    assert!(cache.get("Stale Deck", "gbp", stored_at).is_none());
    assert!(cache.get("Stale Deck", "usd", stored_at).is_some());
}

#[test]
fn test_cache_load_survives_corrupt_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("valuation-cache.json");
    std::fs::write(&path, "not json at all").unwrap();

    let cache = ValuationCache::load(&path);
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
    assert!(cache.get("Anything", "usd", now).is_none());
}
