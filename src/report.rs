//! Renderers for structured results: Markdown reports and CSV exports.
//!
//! The core operations hand over ordered data; everything here is plain
//! formatting with no filesystem or network access.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::currency::format_currency;
use crate::inventory::InventoryRow;
use crate::valuation::DeckValuation;

/// Renders the `value-all` results as a Markdown report.
pub fn render_valuation_report(
    valuations: &BTreeMap<String, DeckValuation>,
    currency: &str,
    as_of: DateTime<Utc>,
) -> String {
    let mut lines = vec![
        "# Deck Valuation Report".to_string(),
        String::new(),
        format!("As of: {}", as_of.format("%Y-%m-%d %H:%M UTC")),
        format!("Currency: {}", currency.to_uppercase()),
        String::new(),
        "| Deck | Total | Missing Prices |".to_string(),
        "| --- | --- | --- |".to_string(),
    ];

    let mut grand_total = 0.0;
    for (name, valuation) in valuations {
        grand_total += valuation.total;
        lines.push(format!(
            "| {name} | {} | {} |",
            valuation.formatted_total(),
            valuation.missing_prices.len()
        ));
    }

    lines.push(String::new());
    lines.push(format!(
        "**Grand total:** {}",
        format_currency(Some(grand_total), currency)
    ));

    let missing: BTreeMap<&str, &[String]> = valuations
        .iter()
        .filter(|(_, v)| !v.missing_prices.is_empty())
        .map(|(name, v)| (name.as_str(), v.missing_prices.as_slice()))
        .collect();
    if !missing.is_empty() {
        lines.push(String::new());
        lines.push("## Missing prices".to_string());
        for (deck, names) in missing {
            lines.push(String::new());
            lines.push(format!("### {deck}"));
            for name in names {
                lines.push(format!("- {name}"));
            }
        }
    }

    lines.join("\n") + "\n"
}

/// Renders inventory rows as CSV with a fixed column order.
pub fn render_spares_csv(rows: &[InventoryRow]) -> String {
    let mut writer = csv::Writer::from_writer(Vec::new());
    // Header plus one record per row; writing to a Vec cannot fail.
    let _ = writer.write_record(["Name", "Count", "Box", "CMC", "Type", "Unit Value", "Total Value"]);
    for row in rows {
        let _ = writer.write_record([
            row.name.as_str(),
            &row.count.to_string(),
            row.box_label.as_str(),
            &row.cmc.map(|c| c.to_string()).unwrap_or_default(),
            row.type_line.as_deref().unwrap_or(""),
            &row.unit_value.map(|v| format!("{v:.2}")).unwrap_or_default(),
            &row.total_value().map(|v| format!("{v:.2}")).unwrap_or_default(),
        ]);
    }
    writer
        .into_inner()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

/// Per-box `(card count, total value)` subtotals, ordered by box label.
pub fn box_subtotals(rows: &[InventoryRow]) -> BTreeMap<String, (u32, f64)> {
    let mut subtotals: BTreeMap<String, (u32, f64)> = BTreeMap::new();
    for row in rows {
        let slot = subtotals.entry(row.box_label.clone()).or_insert((0, 0.0));
        slot.0 += row.count;
        slot.1 += row.total_value().unwrap_or(0.0);
    }
    subtotals
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn valuation(total: f64, missing: &[&str]) -> DeckValuation {
        DeckValuation {
            currency: "usd".to_string(),
            total,
            per_card: Default::default(),
            missing_prices: missing.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_valuation_report_lists_decks_and_totals() {
        let mut valuations = BTreeMap::new();
        valuations.insert("Goblins".to_string(), valuation(12.5, &[]));
        valuations.insert("Control".to_string(), valuation(7.5, &["Mystic Remora"]));
        let as_of = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        let report = render_valuation_report(&valuations, "usd", as_of);

        assert!(report.contains("| Goblins | $12.50 | 0 |"));
        assert!(report.contains("| Control | $7.50 | 1 |"));
        assert!(report.contains("**Grand total:** $20.00"));
        assert!(report.contains("### Control"));
        assert!(report.contains("- Mystic Remora"));
        assert!(report.contains("As of: 2024-05-01 12:00 UTC"));
    }

    #[test]
    fn test_spares_csv_has_header_and_rows() {
        let mut row = InventoryRow::new("Sol Ring", 2, "Staples");
        row.cmc = Some(1.0);
        row.unit_value = Some(1.5);

        let rendered = render_spares_csv(&[row]);
        let mut lines = rendered.lines();
        assert_eq!(
            lines.next(),
            Some("Name,Count,Box,CMC,Type,Unit Value,Total Value")
        );
        assert_eq!(lines.next(), Some("Sol Ring,2,Staples,1,,1.50,3.00"));
    }

    #[test]
    fn test_box_subtotals() {
        let mut a = InventoryRow::new("Sol Ring", 2, "Staples");
        a.unit_value = Some(1.0);
        let b = InventoryRow::new("Counterspell", 3, "Staples");
        let c = InventoryRow::new("Llanowar Elves", 1, "Cube");

        let subtotals = box_subtotals(&[a, b, c]);
        assert_eq!(subtotals.get("Staples"), Some(&(5, 2.0)));
        assert_eq!(subtotals.get("Cube"), Some(&(1, 0.0)));
    }
}
