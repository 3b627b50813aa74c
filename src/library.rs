//! Deck library: a directory of Commander decks stored as Markdown files.
//!
//! Every operation reads the full prior state, computes the full new state
//! and rewrites whole files; there is no incremental patching.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use log::{info, warn};

use crate::card_lines::{name_key, parse_card_rows};
use crate::deck::{
    colors_string, render_template, slugify, CardEntry, DeckDocument, DeckSection,
};
use crate::error::{DeckError, Result};
use crate::resolver::CardResolver;
use crate::rules::{RuleSet, Severity, ValidationIssue};
use crate::valuation::{DeckValuation, DeckValuer, ValuationCache};

/// Inputs for `create_deck`.
#[derive(Debug, Default)]
pub struct CreateOptions {
    pub name: String,
    pub commander: String,
    pub colors: Vec<char>,
    pub theme: Option<String>,
    pub notes: Option<String>,
    pub format: Option<String>,
    pub created: Option<NaiveDate>,
    /// Markdown template body rendered with the deck's fields.
    pub template: Option<PathBuf>,
}

/// Inputs for `import_deck`.
#[derive(Debug, Default)]
pub struct ImportOptions {
    pub name: String,
    pub commander: String,
    /// Raw card entries: newline text or CSV.
    pub card_text: String,
    /// Explicit color identity; inferred from the commander when empty.
    pub colors: Vec<char>,
    pub theme: Option<String>,
    pub notes: Option<String>,
    pub format: Option<String>,
    pub overwrite: bool,
}

/// What an import produced: where the deck landed, and every warning
/// accumulated along the way.
#[derive(Debug)]
pub struct ImportOutcome {
    pub path: PathBuf,
    pub commander: String,
    pub card_count: u32,
    pub warnings: Vec<String>,
}

/// Manages a directory of deck Markdown files.
pub struct DeckLibrary {
    root: PathBuf,
}

impl DeckLibrary {
    pub fn new<P: Into<PathBuf>>(root: P) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All deck files in the library, sorted by path.
    pub fn deck_files(&self) -> Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(&self.root)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "md"))
            .collect();
        files.sort();
        Ok(files)
    }

    /// Loads every deck. Files that cannot be read are skipped with a
    /// warning so one bad file never aborts a batch run.
    pub fn load_decks(&self) -> Result<Vec<DeckDocument>> {
        let mut decks = Vec::new();
        for path in self.deck_files()? {
            match DeckDocument::from_file(&path) {
                Ok(deck) => decks.push(deck),
                Err(e) => warn!("Skipping {}: {e}", path.display()),
            }
        }
        Ok(decks)
    }

    /// One-line summaries for `list`.
    pub fn list_summary(&self) -> Result<Vec<String>> {
        Ok(self
            .load_decks()?
            .iter()
            .map(|deck| {
                let colors = if deck.colors.is_empty() {
                    String::new()
                } else {
                    format!(" ({})", colors_string(&deck.colors))
                };
                let theme = deck
                    .theme
                    .as_deref()
                    .map(|theme| format!(" - {theme}"))
                    .unwrap_or_default();
                format!(
                    "{}{colors}{theme} :: Commander: {}",
                    deck.name,
                    deck.commander.display_name()
                )
            })
            .collect())
    }

    pub fn deck_path(&self, name_or_slug: &str) -> PathBuf {
        self.root.join(format!("{}.md", slugify(name_or_slug)))
    }

    pub fn read_deck(&self, name_or_slug: &str) -> Result<DeckDocument> {
        DeckDocument::from_file(&self.deck_path(name_or_slug))
    }

    /// Multi-line detail view for `show`.
    pub fn show(&self, name_or_slug: &str) -> Result<String> {
        let deck = self.read_deck(name_or_slug)?;
        let mut lines = vec![deck.name.clone()];
        lines.push(format!("Commander: {}", deck.commander.display_name()));
        if !deck.colors.is_empty() {
            lines.push(format!("Colors: {}", colors_string(&deck.colors)));
        }
        if let Some(theme) = &deck.theme {
            lines.push(format!("Theme: {theme}"));
        }
        if let Some(notes) = &deck.notes {
            lines.push(format!("Notes: {notes}"));
        }
        if let Some(created) = &deck.created {
            lines.push(format!("Created: {created}"));
        }
        if let Some(updated) = &deck.updated {
            lines.push(format!("Updated: {updated}"));
        }
        lines.push(format!("Cards: {}", deck.total_cards()));
        Ok(lines.join("\n"))
    }

    /// Creates a new deck file with a commander-only decklist. Fails when
    /// the target already exists.
    pub fn create_deck(&self, options: CreateOptions) -> Result<PathBuf> {
        let target = self.deck_path(&options.name);
        if target.exists() {
            return Err(DeckError::DeckExists(target));
        }

        let mut deck = DeckDocument::new(&options.name, &options.commander);
        deck.colors = options.colors;
        deck.theme = options.theme;
        deck.notes = options.notes;
        if let Some(format) = options.format {
            deck.format = format;
        }
        deck.created = Some(options.created.unwrap_or_else(|| Utc::now().date_naive()));
        deck.sections.push(DeckSection {
            title: "Decklist".to_string(),
            entries: vec![deck.commander.clone()],
        });

        let markdown = match &options.template {
            Some(template_path) => {
                if !template_path.exists() {
                    return Err(DeckError::TemplateNotFound(template_path.clone()));
                }
                let body = std::fs::read_to_string(template_path)?;
                render_template(&body, &deck)
            }
            None => deck.to_markdown(),
        };

        std::fs::write(&target, markdown)?;
        info!("Created deck at {}", target.display());
        Ok(target)
    }

    /// Imports a deck from raw card text, resolving names through the
    /// given resolver. When a rule set is supplied the written file is
    /// validated and deleted again on any violation, so no rule-breaking
    /// deck is ever left on disk.
    pub fn import_deck(
        &self,
        options: ImportOptions,
        resolver: &dyn CardResolver,
        rules: Option<&RuleSet>,
    ) -> Result<ImportOutcome> {
        let entries = parse_card_rows(&options.card_text);
        if entries.is_empty() {
            return Err(DeckError::EmptyImport);
        }

        let target = self.deck_path(&options.name);
        let existed = target.exists();
        if existed && !options.overwrite {
            return Err(DeckError::DeckExists(target));
        }

        let mut warnings = Vec::new();

        let (commander_name, commander_card) = match resolver.resolve(&options.commander) {
            Ok(card) => {
                let canonical = card.canonical_name().to_string();
                if name_key(&canonical) != name_key(&options.commander) {
                    warnings.push(format!(
                        "Commander resolved as '{canonical}' (input: '{}')",
                        options.commander
                    ));
                }
                (canonical, Some(card))
            }
            Err(e) => {
                warn!("Commander lookup failed for '{}': {e}", options.commander);
                warnings.push(format!(
                    "Commander lookup failed for '{}'; using provided text",
                    options.commander
                ));
                (options.commander.clone(), None)
            }
        };

        let colors = if !options.colors.is_empty() {
            options.colors.clone()
        } else {
            commander_card
                .as_ref()
                .map(|card| crate::deck::normalize_colors(card.color_identity.iter()))
                .unwrap_or_default()
        };

        let commander_key = name_key(&commander_name);
        let mut deck_entries = Vec::new();
        for (count, raw_name) in entries {
            let mut entry = CardEntry::new(count, &raw_name);
            match resolver.resolve(&raw_name) {
                Ok(card) => {
                    let canonical = card.canonical_name().to_string();
                    if name_key(&canonical) != name_key(&raw_name) {
                        warnings.push(format!("Resolved '{raw_name}' to '{canonical}'"));
                    }
                    entry.resolved_name = Some(canonical);
                }
                Err(e) => {
                    warn!("Lookup failed for '{raw_name}': {e}");
                    warnings.push(format!("Using '{raw_name}' as-is (lookup failed)"));
                }
            }

            // The commander is added separately; drop duplicates from the
            // imported list so it is never double counted.
            if entry.key() == commander_key {
                if entry.count > 1 {
                    warnings
                        .push("Commander provided multiple times; keeping a single copy".to_string());
                }
                continue;
            }
            deck_entries.push(entry);
        }

        let mut commander_entry = CardEntry::new(1, &commander_name);
        commander_entry.is_commander = true;

        let mut deck = DeckDocument::new(&options.name, &commander_name);
        deck.commander = commander_entry.clone();
        deck.colors = colors;
        deck.theme = options.theme;
        deck.notes = options.notes;
        if let Some(format) = options.format {
            deck.format = format;
        }
        let today = Utc::now().date_naive();
        deck.created = Some(today);
        if existed {
            deck.updated = Some(today);
        }

        let mut all_entries = vec![commander_entry];
        all_entries.extend(deck_entries);
        let card_count = all_entries.iter().map(|entry| entry.count).sum();
        deck.sections.push(DeckSection {
            title: "Decklist".to_string(),
            entries: all_entries,
        });

        std::fs::write(&target, deck.to_markdown())?;
        info!("Imported deck to {}", target.display());

        if let Some(rules) = rules {
            let written = DeckDocument::from_file(&target)?;
            let issues = rules.validate(&written);
            let violations: Vec<ValidationIssue> = issues
                .into_iter()
                .filter(|issue| issue.severity == Severity::Error)
                .collect();
            if !violations.is_empty() {
                // No partial deck may survive a rule-violating import.
                std::fs::remove_file(&target)?;
                info!("Rolled back rule-violating import at {}", target.display());
                return Err(DeckError::RuleViolations(violations));
            }
        }

        Ok(ImportOutcome {
            path: target,
            commander: commander_name,
            card_count,
            warnings,
        })
    }

    /// Validates every deck in the library. When a log path is given the
    /// full issue list replaces any prior log content.
    pub fn validate_decks(
        &self,
        rules: &RuleSet,
        log_path: Option<&Path>,
    ) -> Result<Vec<ValidationIssue>> {
        let mut issues = Vec::new();
        for path in self.deck_files()? {
            match DeckDocument::from_file(&path) {
                Ok(deck) => issues.extend(rules.validate(&deck)),
                Err(e) => {
                    warn!("Skipping {}: {e}", path.display());
                    continue;
                }
            }
        }

        if let Some(log_path) = log_path {
            let mut lines: Vec<String> = issues.iter().map(|issue| issue.to_string()).collect();
            if lines.is_empty() {
                lines.push("All decks valid.".to_string());
            }
            std::fs::write(log_path, lines.join("\n") + "\n")?;
            info!("Wrote validation log to {}", log_path.display());
        }

        Ok(issues)
    }

    /// Prices one deck, reusing a cache entry from the current calendar
    /// month when available.
    pub fn value_deck(
        &self,
        name_or_slug: &str,
        currency: &str,
        resolver: &dyn CardResolver,
        cache: &mut ValuationCache,
        source: &str,
        now: DateTime<Utc>,
    ) -> Result<DeckValuation> {
        let deck = self.read_deck(name_or_slug)?;
        Ok(self.value_parsed_deck(&deck, currency, resolver, cache, source, now))
    }

    /// Prices every deck in the library and persists refreshed cache
    /// entries once at the end.
    pub fn value_all(
        &self,
        currency: &str,
        resolver: &dyn CardResolver,
        cache: &mut ValuationCache,
        source: &str,
        now: DateTime<Utc>,
    ) -> Result<BTreeMap<String, DeckValuation>> {
        let mut valuations = BTreeMap::new();
        for deck in self.load_decks()? {
            let valuation = self.value_parsed_deck(&deck, currency, resolver, cache, source, now);
            valuations.insert(deck.name.clone(), valuation);
        }
        cache.save()?;
        Ok(valuations)
    }

    fn value_parsed_deck(
        &self,
        deck: &DeckDocument,
        currency: &str,
        resolver: &dyn CardResolver,
        cache: &mut ValuationCache,
        source: &str,
        now: DateTime<Utc>,
    ) -> DeckValuation {
        if let Some(cached) = cache.get(&deck.name, currency, now) {
            info!("Using cached valuation for '{}'", deck.name);
            return DeckValuation {
                currency: currency.to_lowercase(),
                total: cached.total,
                per_card: cached.per_card.clone(),
                missing_prices: Vec::new(),
            };
        }

        let valuer = DeckValuer::new(resolver);
        let valuation = valuer.value_counts(deck.card_counts().into_values(), currency);
        cache.store(&deck.name, &valuation, source, now);
        valuation
    }
}

#[cfg(test)]
#[path = "library_tests.rs"]
mod tests;
