//! Tests for deck document parsing and serialization

use chrono::NaiveDate;
use std::path::Path;

use crate::deck::{
    normalize_colors, render_template, slugify, CardEntry, DeckDocument, DeckSection,
};

const SAMPLE: &str = "\
---
name: Krenko Goblins
commander: Krenko, Mob Boss
colors: R
theme: Goblin tribal
format: Commander
created: 2024-03-01
---

# Krenko Goblins
**Commander:** Krenko, Mob Boss

## Decklist

- [Commander] Krenko, Mob Boss
- 2 Mountain
- Goblin Warchief
- SB: Reanimate
- // staging notes live here
";

#[test]
fn test_parse_front_matter_fields() {
    let deck = DeckDocument::parse(SAMPLE, None);
    assert_eq!(deck.name, "Krenko Goblins");
    assert_eq!(deck.commander.display_name(), "Krenko, Mob Boss");
    assert_eq!(deck.colors, vec!['R']);
    assert_eq!(deck.theme.as_deref(), Some("Goblin tribal"));
    assert_eq!(deck.format, "Commander");
    assert_eq!(deck.created, NaiveDate::from_ymd_opt(2024, 3, 1));
    assert_eq!(deck.updated, None);
}

#[test]
fn test_parse_decklist_entries() {
    let deck = DeckDocument::parse(SAMPLE, None);
    assert_eq!(deck.sections.len(), 1);
    let section = &deck.sections[0];
    assert_eq!(section.title, "Decklist");

    // Commander, Mountain x2, Goblin Warchief; sideboard and comment
    // bullets are absent.
    assert_eq!(section.entries.len(), 3);
    assert!(section.entries[0].is_commander);
    assert_eq!(section.entries[1].count, 2);
    assert_eq!(section.entries[1].raw_name, "Mountain");
    assert_eq!(deck.total_cards(), 4);
}

#[test]
fn test_parse_records_line_numbers() {
    let deck = DeckDocument::parse(SAMPLE, None);
    let warchief = deck
        .all_entries()
        .find(|entry| entry.raw_name == "Goblin Warchief")
        .unwrap();
    assert_eq!(warchief.line, Some(17));
}

#[test]
fn test_parse_name_falls_back_to_file_stem() {
    let deck = DeckDocument::parse("## Decklist\n\n- Sol Ring\n", Some(Path::new("my-deck.md")));
    assert_eq!(deck.name, "my deck");
}

#[test]
fn test_parse_commander_tag_any_case() {
    let text = "## Decklist\n\n- [commander] Atraxa, Praetors' Voice\n";
    let deck = DeckDocument::parse(text, None);
    assert_eq!(deck.commander.display_name(), "Atraxa, Praetors' Voice");
    assert_eq!(deck.commander_entries().len(), 1);
}

#[test]
fn test_parse_multiple_sections() {
    let text = "\
---
name: Split
commander: Krenko, Mob Boss
---

## Ramp

- Sol Ring

## Lands

- 2 Mountain
";
    let deck = DeckDocument::parse(text, None);
    let titles: Vec<&str> = deck.sections.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["Ramp", "Lands"]);
    assert_eq!(deck.total_cards(), 3);
}

#[test]
fn test_serialize_sorts_with_commander_first() {
    let mut deck = DeckDocument::new("Test", "Krenko, Mob Boss");
    let mut commander = CardEntry::new(1, "Krenko, Mob Boss");
    commander.is_commander = true;
    deck.sections.push(DeckSection {
        title: "Decklist".to_string(),
        entries: vec![
            CardEntry::new(1, "Zendikar Resurgent"),
            commander,
            CardEntry::new(2, "Mountain"),
            CardEntry::new(1, "Arcane Signet"),
        ],
    });

    let markdown = deck.to_markdown();
    let bullets: Vec<&str> = markdown
        .lines()
        .filter(|line| line.starts_with("- "))
        .collect();
    assert_eq!(
        bullets,
        vec![
            "- [Commander] Krenko, Mob Boss",
            "- Arcane Signet",
            "- 2 Mountain",
            "- Zendikar Resurgent",
        ]
    );
}

#[test]
fn test_round_trip_is_idempotent() {
    let deck = DeckDocument::parse(SAMPLE, None);
    let first = deck.to_markdown();
    let second = DeckDocument::parse(&first, None).to_markdown();
    assert_eq!(first, second);
}

#[test]
fn test_card_counts_merge_by_normalized_name() {
    let text = "\
## Decklist

- [Commander] Krenko, Mob Boss
- Sol Ring
- sol  ring
";
    let deck = DeckDocument::parse(text, None);
    let counts = deck.card_counts();
    assert_eq!(counts.get("sol ring").map(|(_, c)| *c), Some(2));
}

#[test]
fn test_normalize_colors_sorts_and_dedups() {
    assert_eq!(normalize_colors(["g", "w", "W", "u"]), vec!['W', 'U', 'G']);
    assert_eq!(normalize_colors(["Q", "Z"]), Vec::<char>::new());
}

#[test]
fn test_render_template_substitutes_placeholders() {
    let mut deck = DeckDocument::new("Goblins", "Krenko, Mob Boss");
    deck.colors = vec!['R'];
    deck.notes = Some("budget build".to_string());

    let body = "# {name}\nLead: {commander} ({colors})\nNotes: {notes}\n\n## Decklist\n\n{decklist}\n";
    let rendered = render_template(body, &deck);

    assert!(rendered.contains("# Goblins"));
    assert!(rendered.contains("Lead: Krenko, Mob Boss (R)"));
    assert!(rendered.contains("Notes: budget build"));
    assert!(rendered.contains("- [Commander] Krenko, Mob Boss"));
    // Front matter precedes the rendered body.
    assert!(rendered.starts_with("---\nname: Goblins\n"));
}

#[test]
fn test_render_template_appends_missing_decklist_anchor() {
    let deck = DeckDocument::new("Goblins", "Krenko, Mob Boss");
    let rendered = render_template("# {name}\nJust prose.", &deck);

    assert!(rendered.contains("## Decklist"));
    assert!(rendered.contains("- [Commander] Krenko, Mob Boss"));
    // The rendered document must parse back with a commander entry.
    let reparsed = DeckDocument::parse(&rendered, None);
    assert_eq!(reparsed.commander_entries().len(), 1);
}

#[test]
fn test_slugify() {
    assert_eq!(slugify("Krenko, Mob Boss"), "krenko-mob-boss");
    assert_eq!(slugify("  Weird__Name  "), "weird-name");
    assert_eq!(slugify("!!!"), "deck");
}
