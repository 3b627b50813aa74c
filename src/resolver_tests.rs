//! Tests for the resolver contract types

use crate::resolver::{CardResolver, FixtureResolver, ResolveError, ResolvedCard};

#[test]
fn test_resolved_card_deserialize_minimal() {
    let card: ResolvedCard = serde_json::from_str(r#"{"name": "Sol Ring"}"#).unwrap();
    assert_eq!(card.name, "Sol Ring");
    assert_eq!(card.cmc, 0.0);
    assert!(card.color_identity.is_empty());
    assert!(card.prices.is_empty());
}

#[test]
fn test_canonical_name_plain_card() {
    let card: ResolvedCard = serde_json::from_str(r#"{"name": "Sol Ring"}"#).unwrap();
    assert_eq!(card.canonical_name(), "Sol Ring");
}

#[test]
fn test_canonical_name_double_faced() {
    let card_json = r#"{
        "name": "Delver of Secrets // Insectile Aberration",
        "cmc": 1.0,
        "color_identity": ["U"],
        "card_faces": [
            {"name": "Delver of Secrets", "type_line": "Creature — Human Wizard"},
            {"name": "Insectile Aberration", "type_line": "Creature — Human Insect"}
        ]
    }"#;

    let card: ResolvedCard = serde_json::from_str(card_json).unwrap();
    // Front face name, whole-card identity and CMC.
    assert_eq!(card.canonical_name(), "Delver of Secrets");
    assert_eq!(card.color_identity, vec!["U".to_string()]);
    assert_eq!(card.cmc, 1.0);
}

#[test]
fn test_canonical_name_split_without_faces() {
    let card: ResolvedCard = serde_json::from_str(r#"{"name": "Fire // Ice"}"#).unwrap();
    assert_eq!(card.canonical_name(), "Fire");
}

#[test]
fn test_price_in_parses_and_skips_null() {
    let card_json = r#"{
        "name": "Sol Ring",
        "prices": {"usd": "1.50", "eur": null}
    }"#;

    let card: ResolvedCard = serde_json::from_str(card_json).unwrap();
    assert_eq!(card.price_in("usd"), Some(1.5));
    assert_eq!(card.price_in("USD"), Some(1.5));
    assert_eq!(card.price_in("eur"), None);
    assert_eq!(card.price_in("gbp"), None);
}

#[test]
fn test_fixture_resolver_case_insensitive() {
    let resolver = FixtureResolver::verbatim(&["Sol Ring"]);
    assert_eq!(resolver.resolve("sol ring").unwrap().name, "Sol Ring");
    assert_eq!(resolver.resolve("SOL RING").unwrap().name, "Sol Ring");
}

#[test]
fn test_fixture_resolver_miss_is_not_found() {
    let resolver = FixtureResolver::new();
    match resolver.resolve("Black Lotus") {
        Err(ResolveError::NotFound(name)) => assert_eq!(name, "Black Lotus"),
        other => panic!("Expected NotFound, got {other:?}"),
    }
}
