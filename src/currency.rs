//! Money formatting and parsing for table cells and totals.

/// Symbol for the common price currencies; other codes render as
/// `CODE 12.34`.
fn symbol(currency: &str) -> Option<&'static str> {
    match currency.to_lowercase().as_str() {
        "usd" => Some("$"),
        "eur" => Some("€"),
        "gbp" => Some("£"),
        _ => None,
    }
}

/// Formats an amount for display: `£1,234.56`, `EUR 2.00`, or `Unknown`
/// when no price is available.
pub fn format_currency(value: Option<f64>, currency: &str) -> String {
    let Some(value) = value else {
        return "Unknown".to_string();
    };
    let amount = group_thousands(value);
    match symbol(currency) {
        Some(sym) => format!("{sym}{amount}"),
        None => format!("{} {amount}", currency.to_uppercase()),
    }
}

/// Two-decimal rendering with comma thousands grouping.
fn group_thousands(value: f64) -> String {
    let raw = format!("{value:.2}");
    let (int_part, frac_part) = raw.split_once('.').unwrap_or((raw.as_str(), "00"));
    let (sign, digits) = match int_part.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", int_part),
    };

    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}{grouped}.{frac_part}")
}

/// Parses a money cell back out of a table: strips currency symbols, codes
/// and grouping commas. `Unknown`, blanks and garbage come back as `None`.
pub fn parse_amount(cell: &str) -> Option<f64> {
    let cleaned: String = cell
        .chars()
        .filter(|ch| ch.is_ascii_digit() || *ch == '.' || *ch == '-')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency_symbols() {
        assert_eq!(format_currency(Some(2.0), "gbp"), "£2.00");
        assert_eq!(format_currency(Some(1.5), "usd"), "$1.50");
        assert_eq!(format_currency(Some(3.0), "eur"), "€3.00");
        assert_eq!(format_currency(Some(3.0), "chf"), "CHF 3.00");
    }

    #[test]
    fn test_format_currency_unknown() {
        assert_eq!(format_currency(None, "gbp"), "Unknown");
    }

    #[test]
    fn test_format_currency_groups_thousands() {
        assert_eq!(format_currency(Some(1234567.891), "usd"), "$1,234,567.89");
        assert_eq!(format_currency(Some(999.99), "usd"), "$999.99");
    }

    #[test]
    fn test_parse_amount_round_trips() {
        assert_eq!(parse_amount("£2.00"), Some(2.0));
        assert_eq!(parse_amount("$1,234.56"), Some(1234.56));
        assert_eq!(parse_amount("EUR 3.00"), Some(3.0));
        assert_eq!(parse_amount("Unknown"), None);
        assert_eq!(parse_amount(""), None);
    }
}
