//! Spare-card inventory stored as a Markdown table.
//!
//! Rows are keyed by `(normalized name, box)`: the same card in two storage
//! boxes is two rows, never merged across boxes. Every operation rebuilds
//! the row set from the file, mutates in memory and rewrites the whole
//! table.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::card_lines::{name_key, parse_card_rows};
use crate::currency::{format_currency, parse_amount};
use crate::deck::DeckDocument;
use crate::error::{DeckError, Result};
use crate::resolver::CardResolver;

/// One inventory row. `Total Value` is never stored authoritatively; it is
/// recomputed from `count * unit_value` on every serialize.
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryRow {
    pub name: String,
    pub count: u32,
    pub box_label: String,
    pub cmc: Option<f64>,
    pub type_line: Option<String>,
    pub unit_value: Option<f64>,
}

impl InventoryRow {
    pub fn new(name: &str, count: u32, box_label: &str) -> Self {
        Self {
            name: name.to_string(),
            count,
            box_label: box_label.to_string(),
            cmc: None,
            type_line: None,
            unit_value: None,
        }
    }

    /// Identity key: normalized name plus the case-sensitive box label.
    pub fn key(&self) -> (String, String) {
        (name_key(&self.name), self.box_label.clone())
    }

    pub fn total_value(&self) -> Option<f64> {
        self.unit_value.map(|unit| unit * self.count as f64)
    }
}

/// Sort orders for inventory output. All ascending, with a stable secondary
/// sort on normalized name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Name,
    Value,
    Cmc,
}

/// Row filter for `search`: substring match on name/type line
/// (case-insensitive) and exact box-label match (case-sensitive).
#[derive(Debug, Default)]
pub struct SearchFilter {
    pub query: Option<String>,
    pub boxes: Vec<String>,
}

impl SearchFilter {
    fn matches(&self, row: &InventoryRow) -> bool {
        if let Some(query) = &self.query {
            let query = query.to_lowercase();
            let in_name = row.name.to_lowercase().contains(&query);
            let in_type = row
                .type_line
                .as_deref()
                .is_some_and(|t| t.to_lowercase().contains(&query));
            if !in_name && !in_type {
                return false;
            }
        }
        if !self.boxes.is_empty() && !self.boxes.iter().any(|b| *b == row.box_label) {
            return false;
        }
        true
    }
}

/// The spare-card inventory table behind a single Markdown file.
pub struct SparesInventory {
    path: PathBuf,
}

impl SparesInventory {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads all rows from the table file. A missing file is an empty
    /// inventory; zero-count rows are dropped on the way in.
    pub fn load(&self) -> Result<Vec<InventoryRow>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let text = std::fs::read_to_string(&self.path)?;
        let mut rows = Vec::new();
        for line in text.lines() {
            let Some(row) = parse_table_row(line) else {
                continue;
            };
            if row.count == 0 {
                debug!("Dropping zero-count row for '{}'", row.name);
                continue;
            }
            rows.push(row);
        }
        Ok(rows)
    }

    /// Currency code from the table's `Currency:` header, lowercased.
    /// `None` for a missing file or a file without the header.
    pub fn stored_currency(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&self.path)?;
        Ok(text
            .lines()
            .find_map(|line| line.trim().strip_prefix("Currency:"))
            .map(|code| code.trim().to_lowercase())
            .filter(|code| !code.is_empty()))
    }

    /// Merges new rows into the table, sorts and rewrites it. Returns the
    /// final row set plus the names that had no price in the requested
    /// currency.
    pub fn import(
        &self,
        incoming: Vec<InventoryRow>,
        currency: &str,
        sort: SortKey,
    ) -> Result<(Vec<InventoryRow>, Vec<String>)> {
        let existing = self.load()?;
        let mut rows = merge_rows(existing, incoming);
        sort_rows(&mut rows, sort);

        let missing: Vec<String> = rows
            .iter()
            .filter(|row| row.unit_value.is_none())
            .map(|row| row.name.clone())
            .collect();

        self.write(&rows, currency)?;
        info!(
            "Updated inventory at {} ({} rows)",
            self.path.display(),
            rows.len()
        );
        Ok((rows, missing))
    }

    /// Moves cards between boxes. All-or-nothing across the whole request:
    /// if any card lacks sufficient count in the source box, nothing is
    /// written and the file is untouched.
    pub fn move_cards(
        &self,
        from_box: &str,
        to_box: &str,
        cards: &[(u32, String)],
        currency: &str,
        sort: SortKey,
    ) -> Result<Vec<InventoryRow>> {
        let rows = self.load()?;
        let mut by_key: BTreeMap<(String, String), InventoryRow> =
            rows.into_iter().map(|row| (row.key(), row)).collect();

        // Aggregate demand per card so a name repeated in the request is
        // checked against the source row once, then validate the entire
        // transfer before mutating anything.
        let mut demand: BTreeMap<String, (String, u32)> = BTreeMap::new();
        for (requested, name) in cards {
            let slot = demand
                .entry(name_key(name))
                .or_insert_with(|| (name.clone(), 0));
            slot.1 += requested;
        }

        for (key, (name, requested)) in &demand {
            let source_key = (key.clone(), from_box.to_string());
            let available = by_key.get(&source_key).map(|row| row.count).unwrap_or(0);
            if available < *requested {
                return Err(DeckError::InsufficientCount {
                    name: name.clone(),
                    from_box: from_box.to_string(),
                    requested: *requested,
                    available,
                });
            }
        }

        for (key, (_, requested)) in &demand {
            let source_key = (key.clone(), from_box.to_string());
            let Some(source) = by_key.get_mut(&source_key) else {
                continue;
            };
            source.count -= requested;

            let template = source.clone();
            if source.count == 0 {
                by_key.remove(&source_key);
            }

            let dest_key = (key.clone(), to_box.to_string());
            by_key
                .entry(dest_key)
                .and_modify(|row| row.count += requested)
                .or_insert_with(|| InventoryRow {
                    count: *requested,
                    box_label: to_box.to_string(),
                    ..template
                });
        }

        let mut rows: Vec<InventoryRow> = by_key.into_values().collect();
        sort_rows(&mut rows, sort);
        self.write(&rows, currency)?;
        info!(
            "Moved {} card set(s) from '{from_box}' to '{to_box}'",
            cards.len()
        );
        Ok(rows)
    }

    /// Subtracts every deck's cumulative card counts from the table and
    /// returns the remaining rows. With `dry_run` the file is left
    /// untouched and the result is a preview only.
    pub fn sync_decks(
        &self,
        decks: &[DeckDocument],
        currency: &str,
        sort: SortKey,
        dry_run: bool,
    ) -> Result<Vec<InventoryRow>> {
        let rows = self.load()?;
        let mut rows = subtract_deck_counts(rows, decks);
        sort_rows(&mut rows, sort);
        if dry_run {
            return Ok(rows);
        }
        self.write(&rows, currency)?;
        info!(
            "Subtracted {} deck(s) from {} ({} rows remain)",
            decks.len(),
            self.path.display(),
            rows.len()
        );
        Ok(rows)
    }

    /// Filters and sorts rows without mutating the file.
    pub fn search(&self, filter: &SearchFilter, sort: SortKey) -> Result<Vec<InventoryRow>> {
        let mut rows = self.load()?;
        rows.retain(|row| filter.matches(row));
        sort_rows(&mut rows, sort);
        Ok(rows)
    }

    /// Rewrites the whole table. Serialization is canonical: re-serializing
    /// an already-canonical table is byte-identical.
    pub fn write(&self, rows: &[InventoryRow], currency: &str) -> Result<()> {
        let mut lines = vec![
            "# Spare Card Inventory".to_string(),
            String::new(),
            format!("Currency: {}", currency.to_uppercase()),
            String::new(),
            "| Name | Count | Box | CMC | Type | Unit Value | Total Value |".to_string(),
            "| --- | --- | --- | --- | --- | --- | --- |".to_string(),
        ];

        for row in rows {
            lines.push(format!(
                "| {} | {} | {} | {} | {} | {} | {} |",
                row.name,
                row.count,
                row.box_label,
                row.cmc.map(format_cmc).unwrap_or_default(),
                row.type_line.as_deref().unwrap_or(""),
                format_currency(row.unit_value, currency),
                format_currency(row.total_value(), currency),
            ));
        }

        std::fs::write(&self.path, lines.join("\n") + "\n")?;
        Ok(())
    }
}

/// Builds priced inventory rows from raw card text via the resolver.
/// Resolution and pricing failures become warnings, never errors.
pub fn build_rows(
    card_text: &str,
    box_label: &str,
    currency: &str,
    resolver: &dyn CardResolver,
) -> Result<(Vec<InventoryRow>, Vec<String>)> {
    let entries = parse_card_rows(card_text);
    if entries.is_empty() {
        return Err(DeckError::EmptyImport);
    }

    let mut rows = Vec::new();
    let mut warnings = Vec::new();
    for (count, name) in entries {
        let mut row = InventoryRow::new(&name, count, box_label);
        match resolver.resolve(&name) {
            Ok(card) => {
                row.name = card.canonical_name().to_string();
                row.cmc = Some(card.cmc);
                row.type_line = card.type_line.clone();
                row.unit_value = card.price_in(currency);
                if row.unit_value.is_none() {
                    warnings.push(format!(
                        "No {} price for '{}'",
                        currency.to_lowercase(),
                        row.name
                    ));
                }
            }
            Err(e) => {
                warn!("Lookup failed for '{name}': {e}");
                warnings.push(format!("Using '{name}' as-is (lookup failed)"));
            }
        }
        rows.push(row);
    }
    Ok((rows, warnings))
}

/// Merges rows by `(normalized name, box)`. Counts add; metadata fills in
/// missing fields and fresher unit prices win.
pub fn merge_rows(existing: Vec<InventoryRow>, incoming: Vec<InventoryRow>) -> Vec<InventoryRow> {
    let mut by_key: BTreeMap<(String, String), InventoryRow> = BTreeMap::new();
    for row in existing.into_iter().chain(incoming) {
        match by_key.entry(row.key()) {
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(row);
            }
            std::collections::btree_map::Entry::Occupied(mut slot) => {
                let merged = slot.get_mut();
                merged.count += row.count;
                if merged.cmc.is_none() {
                    merged.cmc = row.cmc;
                }
                if merged.type_line.is_none() {
                    merged.type_line = row.type_line;
                }
                if row.unit_value.is_some() {
                    merged.unit_value = row.unit_value;
                }
            }
        }
    }
    by_key.into_values().collect()
}

/// Subtracts every deck's per-card counts from the rows (matched by
/// normalized name across all boxes, floor zero) to surface true spares.
/// Zero-count rows disappear. This is a read-view transform; callers decide
/// whether to persist the result.
pub fn subtract_deck_counts(
    rows: Vec<InventoryRow>,
    decks: &[DeckDocument],
) -> Vec<InventoryRow> {
    let mut in_decks: BTreeMap<String, u32> = BTreeMap::new();
    for deck in decks {
        for (key, (_, count)) in deck.card_counts() {
            *in_decks.entry(key).or_insert(0) += count;
        }
    }

    // Deterministic subtraction order across same-name rows.
    let mut rows = rows;
    rows.sort_by(|a, b| a.key().cmp(&b.key()));

    let mut remaining = Vec::new();
    for mut row in rows {
        if let Some(deck_count) = in_decks.get_mut(&name_key(&row.name)) {
            let taken = (*deck_count).min(row.count);
            row.count -= taken;
            *deck_count -= taken;
        }
        if row.count > 0 {
            remaining.push(row);
        }
    }
    remaining
}

/// Sorts rows by the requested key, ascending, with a stable tie-break on
/// normalized name and then box label.
pub fn sort_rows(rows: &mut [InventoryRow], key: SortKey) {
    rows.sort_by(|a, b| {
        let primary = match key {
            SortKey::Name => std::cmp::Ordering::Equal,
            SortKey::Value => {
                let va = a.total_value().unwrap_or(0.0);
                let vb = b.total_value().unwrap_or(0.0);
                va.partial_cmp(&vb).unwrap_or(std::cmp::Ordering::Equal)
            }
            SortKey::Cmc => {
                // Rows without a CMC sort last.
                let ca = (a.cmc.is_none(), a.cmc.unwrap_or(0.0));
                let cb = (b.cmc.is_none(), b.cmc.unwrap_or(0.0));
                ca.partial_cmp(&cb).unwrap_or(std::cmp::Ordering::Equal)
            }
        };
        primary
            .then_with(|| name_key(&a.name).cmp(&name_key(&b.name)))
            .then_with(|| a.box_label.cmp(&b.box_label))
    });
}

fn parse_table_row(line: &str) -> Option<InventoryRow> {
    let stripped = line.trim();
    if !stripped.starts_with('|') {
        return None;
    }
    // Separator rows are nothing but dashes, colons and pipes.
    if stripped
        .chars()
        .all(|ch| matches!(ch, '|' | '-' | ':' | ' '))
    {
        return None;
    }

    let cells: Vec<&str> = stripped
        .trim_matches('|')
        .split('|')
        .map(str::trim)
        .collect();
    let name = *cells.first()?;
    if name.is_empty() || name.eq_ignore_ascii_case("name") {
        return None;
    }

    Some(InventoryRow {
        name: name.to_string(),
        count: cells
            .get(1)
            .and_then(|cell| cell.parse::<u32>().ok())
            .unwrap_or(1),
        box_label: cells
            .get(2)
            .filter(|cell| !cell.is_empty())
            .unwrap_or(&"Unsorted")
            .to_string(),
        cmc: cells.get(3).and_then(|cell| cell.parse::<f64>().ok()),
        type_line: cells
            .get(4)
            .filter(|cell| !cell.is_empty())
            .map(|cell| cell.to_string()),
        unit_value: cells.get(5).and_then(|cell| parse_amount(cell)),
    })
}

fn format_cmc(cmc: f64) -> String {
    if cmc.fract() == 0.0 {
        format!("{cmc:.0}")
    } else {
        format!("{cmc}")
    }
}

#[cfg(test)]
#[path = "inventory_tests.rs"]
mod tests;
