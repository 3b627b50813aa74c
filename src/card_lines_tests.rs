//! Tests for count/name tokenizing

use crate::card_lines::{name_key, normalize_name, parse_card_line, parse_card_rows};

#[test]
fn test_parse_card_line_bare_count() {
    assert_eq!(
        parse_card_line("2 Sol Ring"),
        Some((2, "Sol Ring".to_string()))
    );
}

#[test]
fn test_parse_card_line_x_suffix_any_case() {
    assert_eq!(
        parse_card_line("2x Sol Ring"),
        Some((2, "Sol Ring".to_string()))
    );
    assert_eq!(
        parse_card_line("3X Llanowar Elves"),
        Some((3, "Llanowar Elves".to_string()))
    );
}

#[test]
fn test_parse_card_line_defaults_to_one() {
    assert_eq!(
        parse_card_line("Arcane Signet"),
        Some((1, "Arcane Signet".to_string()))
    );
}

#[test]
fn test_parse_card_line_skips_sideboard_markers() {
    assert_eq!(parse_card_line("SB: Reanimate"), None);
    assert_eq!(parse_card_line("sb: Reanimate"), None);
    assert_eq!(parse_card_line("Maybe: Counterspell"), None);
    assert_eq!(parse_card_line("MAYBE: Counterspell"), None);
}

#[test]
fn test_parse_card_line_blank_lines() {
    assert_eq!(parse_card_line(""), None);
    assert_eq!(parse_card_line("   "), None);
}

#[test]
fn test_parse_card_line_collapses_whitespace() {
    assert_eq!(
        parse_card_line("2   Sol   Ring"),
        Some((2, "Sol Ring".to_string()))
    );
}

#[test]
fn test_parse_card_line_numeric_name_without_separator() {
    // A leading integer with no name after it is a card name, not a count.
    assert_eq!(parse_card_line("1996"), Some((1, "1996".to_string())));
}

#[test]
fn test_parse_card_rows_newline_text() {
    let rows = parse_card_rows("2x Sol Ring\n1 Arcane Signet\nSB: Reanimate");
    assert_eq!(
        rows,
        vec![
            (2, "Sol Ring".to_string()),
            (1, "Arcane Signet".to_string()),
        ]
    );
}

#[test]
fn test_parse_card_rows_count_name_csv() {
    let rows = parse_card_rows("Count,Name\n2,Sol Ring\n1,Arcane Signet");
    assert_eq!(
        rows,
        vec![
            (2, "Sol Ring".to_string()),
            (1, "Arcane Signet".to_string()),
        ]
    );
}

#[test]
fn test_parse_card_rows_name_count_csv() {
    let rows = parse_card_rows("Name,Count\nSol Ring,2\nArcane Signet,1");
    assert_eq!(
        rows,
        vec![
            (2, "Sol Ring".to_string()),
            (1, "Arcane Signet".to_string()),
        ]
    );
}

#[test]
fn test_parse_card_rows_headerless_csv() {
    let rows = parse_card_rows("2, sol rng\n1 Arcane Signet");
    assert_eq!(
        rows,
        vec![(2, "sol rng".to_string()), (1, "Arcane Signet".to_string())]
    );
}

#[test]
fn test_parse_card_rows_x_suffix_in_count_cell() {
    let rows = parse_card_rows("2x,Sol Ring");
    assert_eq!(rows, vec![(2, "Sol Ring".to_string())]);
}

#[test]
fn test_parse_card_rows_comma_in_card_name() {
    // Legendary names carry commas; they are names, not CSV columns.
    let rows = parse_card_rows("1 Krenko, Mob Boss\nAtraxa, Praetors' Voice");
    assert_eq!(
        rows,
        vec![
            (1, "Krenko, Mob Boss".to_string()),
            (1, "Atraxa, Praetors' Voice".to_string()),
        ]
    );
}

#[test]
fn test_parse_card_rows_quoted_comma_name_with_count() {
    let rows = parse_card_rows("\"Krenko, Mob Boss\",1\n2,\"Breya, Etherium Shaper\"");
    assert_eq!(
        rows,
        vec![
            (1, "Krenko, Mob Boss".to_string()),
            (2, "Breya, Etherium Shaper".to_string()),
        ]
    );
}

#[test]
fn test_parse_card_line_rejects_overflowing_count() {
    // A count past u32::MAX is garbage input, not one copy.
    assert_eq!(parse_card_line("99999999999999999999 Sol Ring"), None);
    assert_eq!(
        parse_card_line("4294967295 Sol Ring"),
        Some((u32::MAX, "Sol Ring".to_string()))
    );
}

#[test]
fn test_parse_card_rows_empty_input() {
    assert!(parse_card_rows("").is_empty());
    assert!(parse_card_rows("\n\n").is_empty());
}

#[test]
fn test_normalize_name_preserves_case() {
    assert_eq!(normalize_name("  Sol   Ring "), "Sol Ring");
}

#[test]
fn test_name_key_is_case_folded() {
    assert_eq!(name_key("Sol  RING"), "sol ring");
    assert_eq!(name_key("sol ring"), name_key("SOL RING"));
}
