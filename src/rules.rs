//! Commander construction-legality validation.
//!
//! A state-free pass over a parsed deck: every check runs, nothing
//! short-circuits, so one run surfaces every problem in a file.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::PathBuf;

use crate::card_lines::name_key;
use crate::deck::DeckDocument;

/// Identifies which rule produced an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleId {
    DeckSize,
    Singleton,
    CommanderCount,
    BannedCard,
    Format,
    Structure,
}

impl RuleId {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleId::DeckSize => "deck-size",
            RuleId::Singleton => "singleton",
            RuleId::CommanderCount => "commander-count",
            RuleId::BannedCard => "banned-card",
            RuleId::Format => "format",
            RuleId::Structure => "structure",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

/// One validation finding, with enough location detail to act on it.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub file_path: Option<PathBuf>,
    pub line_number: Option<usize>,
    pub rule_id: RuleId,
    pub message: String,
    pub severity: Severity,
}

impl ValidationIssue {
    fn new(rule_id: RuleId, message: String) -> Self {
        Self {
            file_path: None,
            line_number: None,
            rule_id,
            message,
            severity: Severity::Error,
        }
    }

    fn at_line(mut self, line: Option<usize>) -> Self {
        self.line_number = line;
        self
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(path) = &self.file_path {
            write!(f, "{}", path.display())?;
            if let Some(line) = self.line_number {
                write!(f, ":{line}")?;
            }
            write!(f, ": ")?;
        }
        write!(
            f,
            "[{}] {}: {}",
            self.severity.as_str(),
            self.rule_id.as_str(),
            self.message
        )
    }
}

/// Configurable validation for Commander deck construction.
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub deck_size: u32,
    pub max_commander_entries: u32,
    pub require_commander_tag: bool,
    /// Partner/background pairs lift the commander ceiling to two.
    pub allow_partner_background: bool,
    /// Expected format name from the front matter, if pinned.
    pub expected_format: Option<String>,
    /// Normalized names that may not appear at all.
    pub banned_cards: HashSet<String>,
    /// Names exempt from the singleton rule, compared by normalized name.
    pub basic_lands: HashSet<String>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            deck_size: 100,
            max_commander_entries: 1,
            require_commander_tag: true,
            allow_partner_background: false,
            expected_format: Some("Commander".to_string()),
            banned_cards: HashSet::new(),
            basic_lands: default_basic_lands(),
        }
    }
}

fn default_basic_lands() -> HashSet<String> {
    [
        "Plains",
        "Island",
        "Swamp",
        "Mountain",
        "Forest",
        "Wastes",
        "Snow-Covered Plains",
        "Snow-Covered Island",
        "Snow-Covered Swamp",
        "Snow-Covered Mountain",
        "Snow-Covered Forest",
    ]
    .iter()
    .map(|name| name_key(name))
    .collect()
}

impl RuleSet {
    /// Bans the given names, normalizing them for comparison.
    pub fn with_banned<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.banned_cards
            .extend(names.into_iter().map(|name| name_key(name.as_ref())));
        self
    }

    fn effective_max_commanders(&self) -> u32 {
        if self.allow_partner_background {
            self.max_commander_entries.max(2)
        } else {
            self.max_commander_entries
        }
    }

    /// Validates a parsed deck, returning every issue found. Never mutates
    /// the document and never touches the filesystem.
    pub fn validate(&self, deck: &DeckDocument) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        let path = deck.path.clone();

        if deck.name.trim().is_empty() {
            issues.push(ValidationIssue::new(
                RuleId::Structure,
                "Deck name is missing".to_string(),
            ));
        }
        if deck.commander.display_name().trim().is_empty() {
            issues.push(ValidationIssue::new(
                RuleId::Structure,
                "Commander metadata is missing".to_string(),
            ));
        }
        if deck.sections.is_empty() {
            issues.push(ValidationIssue::new(
                RuleId::Structure,
                "No decklist section found".to_string(),
            ));
        }

        if let Some(expected) = &self.expected_format {
            if !deck.format.eq_ignore_ascii_case(expected) {
                issues.push(ValidationIssue::new(
                    RuleId::Format,
                    format!("Deck format must be {expected} (found {})", deck.format),
                ));
            }
        }

        let total = deck.total_cards();
        if !deck.sections.is_empty() && total != self.deck_size {
            issues.push(ValidationIssue::new(
                RuleId::DeckSize,
                format!(
                    "Deck must contain exactly {} cards (found {total})",
                    self.deck_size
                ),
            ));
        }

        issues.extend(self.singleton_issues(deck));
        issues.extend(self.commander_issues(deck));
        issues.extend(self.banned_issues(deck));

        for issue in &mut issues {
            issue.file_path = path.clone();
        }
        issues
    }

    fn singleton_issues(&self, deck: &DeckDocument) -> Vec<ValidationIssue> {
        // Track totals, how many sections a name appears in, and the first
        // line it was seen on.
        let mut totals: HashMap<String, (String, u32, u32, Option<usize>)> = HashMap::new();
        for section in &deck.sections {
            let mut seen_here: HashSet<String> = HashSet::new();
            for entry in &section.entries {
                let slot = totals
                    .entry(entry.key())
                    .or_insert_with(|| (entry.display_name().to_string(), 0, 0, entry.line));
                slot.1 += entry.count;
                if seen_here.insert(entry.key()) {
                    slot.2 += 1;
                }
            }
        }

        let mut keys: Vec<&String> = totals.keys().collect();
        keys.sort();

        let mut issues = Vec::new();
        for key in keys {
            let (display, count, section_count, line) = &totals[key];
            if self.basic_lands.contains(key) {
                continue;
            }
            if *section_count > 1 {
                issues.push(
                    ValidationIssue::new(
                        RuleId::Singleton,
                        format!("Card '{display}' appears in {section_count} sections"),
                    )
                    .at_line(*line),
                );
            } else if *count > 1 {
                issues.push(
                    ValidationIssue::new(
                        RuleId::Singleton,
                        format!("Card '{display}' appears {count} times; only basics may repeat"),
                    )
                    .at_line(*line),
                );
            }
        }
        issues
    }

    fn commander_issues(&self, deck: &DeckDocument) -> Vec<ValidationIssue> {
        let tagged = deck.commander_entries();
        let mut issues = Vec::new();

        if tagged.is_empty() {
            // A deck without a commander is never legal, whatever the
            // configuration says about tagging.
            if self.require_commander_tag || deck.commander.display_name().trim().is_empty() {
                issues.push(ValidationIssue::new(
                    RuleId::CommanderCount,
                    "Commander entry missing from decklist".to_string(),
                ));
            } else {
                let key = deck.commander.key();
                let in_list = deck.all_entries().any(|entry| entry.key() == key);
                if !in_list {
                    issues.push(ValidationIssue::new(
                        RuleId::CommanderCount,
                        format!(
                            "Commander '{}' not present in the decklist",
                            deck.commander.display_name()
                        ),
                    ));
                }
            }
        } else {
            let max = self.effective_max_commanders();
            if tagged.len() as u32 > max {
                issues.push(
                    ValidationIssue::new(
                        RuleId::CommanderCount,
                        format!("Deck lists {} commanders; maximum is {max}", tagged.len()),
                    )
                    .at_line(tagged.get(max as usize).and_then(|entry| entry.line)),
                );
            }
            for entry in &tagged {
                if entry.count != 1 {
                    issues.push(
                        ValidationIssue::new(
                            RuleId::CommanderCount,
                            format!(
                                "Commander '{}' must appear exactly once (found {})",
                                entry.display_name(),
                                entry.count
                            ),
                        )
                        .at_line(entry.line),
                    );
                }
            }
        }
        issues
    }

    fn banned_issues(&self, deck: &DeckDocument) -> Vec<ValidationIssue> {
        if self.banned_cards.is_empty() {
            return Vec::new();
        }
        let mut issues = Vec::new();
        for section in &deck.sections {
            for entry in &section.entries {
                if self.banned_cards.contains(&entry.key()) {
                    issues.push(
                        ValidationIssue::new(
                            RuleId::BannedCard,
                            format!("Card '{}' is banned", entry.display_name()),
                        )
                        .at_line(entry.line),
                    );
                }
            }
        }
        issues
    }
}

#[cfg(test)]
#[path = "rules_tests.rs"]
mod tests;
