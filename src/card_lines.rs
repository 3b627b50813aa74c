//! Count/name tokenizing for card entries from free text and CSV dumps.
//!
//! Every input format (inline text, decklist bullets, CSV exports) funnels
//! through [`parse_card_line`] so counts and skip markers behave the same
//! everywhere.

use lazy_static::lazy_static;
use log::{debug, warn};
use regex::Regex;

lazy_static! {
    /// Leading count token: a bare integer or an integer with an `x` suffix
    /// (`2`, `2x`, `3X`), followed by the card name.
    static ref COUNT_PREFIX: Regex = Regex::new(r"(?i)^(\d+)x?\s+(\S.*)$").unwrap();
    /// Sideboard/maybeboard markers are not part of the deck proper.
    static ref SKIP_MARKER: Regex = Regex::new(r"(?i)^(sb:|maybe:)").unwrap();
}

/// Parses a single raw card line into `(count, name)`.
///
/// Returns `None` for blank lines and for `SB:`/`Maybe:` prefixed entries
/// (the skip-signal). A missing count token defaults to 1.
pub fn parse_card_line(raw: &str) -> Option<(u32, String)> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if SKIP_MARKER.is_match(trimmed) {
        debug!("Skipping sideboard/maybeboard entry: {trimmed}");
        return None;
    }

    if let Some(caps) = COUNT_PREFIX.captures(trimmed) {
        let Ok(count) = caps[1].parse::<u32>() else {
            warn!("Implausible count '{}' on line '{trimmed}', skipping", &caps[1]);
            return None;
        };
        return Some((count.max(1), normalize_name(&caps[2])));
    }

    Some((1, normalize_name(trimmed)))
}

/// Parses newline-delimited free text or two-column CSV into `(count, name)`
/// pairs.
///
/// CSV rows are accepted in either `Count,Name` or `Name,Count` cell order;
/// header rows like `Count,Name` are detected and discarded. Lines with a
/// single cell, and count-less rows whose name simply contains commas, fall
/// back to free-text parsing.
pub fn parse_card_rows(text: &str) -> Vec<(u32, String)> {
    let mut rows: Vec<(u32, String)> = Vec::new();

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                debug!("Skipping unreadable row: {e}");
                continue;
            }
        };

        let cells: Vec<&str> = record.iter().map(str::trim).collect();
        if cells.iter().all(|cell| cell.is_empty()) {
            continue;
        }

        if cells.len() == 1 {
            if let Some(entry) = parse_card_line(cells[0]) {
                rows.push(entry);
            }
            continue;
        }

        if let Some(entry) = parse_csv_cells(&cells) {
            rows.push(entry);
        }
    }

    rows
}

/// Interprets a multi-cell CSV row, accepting either column order.
///
/// A row with no count cell is either a header (discarded) or a card name
/// that itself contains commas, like "Krenko, Mob Boss".
fn parse_csv_cells(cells: &[&str]) -> Option<(u32, String)> {
    let first_count = count_token(cells[0]);
    let second_count = count_token(cells[1]);

    let (count, name) = match (first_count, second_count) {
        // Count,Name: anything after the count cell belongs to the name.
        (Some(count), _) => (count, cells[1..].join(", ").trim().to_string()),
        // Name,Count
        (None, Some(count)) => (count, cells[0].to_string()),
        (None, None) => {
            if is_header_row(cells) {
                debug!("Discarding header row: {cells:?}");
                return None;
            }
            return parse_card_line(&cells.join(", "));
        }
    };

    if name.is_empty() {
        return None;
    }
    if SKIP_MARKER.is_match(&name) {
        return None;
    }
    Some((count, normalize_name(&name)))
}

fn is_header_row(cells: &[&str]) -> bool {
    const HEADER_WORDS: [&str; 5] = ["name", "count", "card", "qty", "quantity"];
    cells
        .first()
        .is_some_and(|cell| HEADER_WORDS.iter().any(|word| cell.eq_ignore_ascii_case(word)))
}

/// Parses a standalone count cell (`2` or `2x`), if it is one.
fn count_token(cell: &str) -> Option<u32> {
    let digits = cell
        .strip_suffix('x')
        .or_else(|| cell.strip_suffix('X'))
        .unwrap_or(cell);
    digits.parse::<u32>().ok().filter(|count| *count >= 1)
}

/// Trims and collapses internal whitespace while preserving case for display.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Case-folded comparison key used for all identity and merge operations.
pub fn name_key(name: &str) -> String {
    normalize_name(name).to_lowercase()
}

#[cfg(test)]
#[path = "card_lines_tests.rs"]
mod tests;
