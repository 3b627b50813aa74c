//! Deck document model: front matter plus decklist sections, stored as
//! Markdown so decks stay readable and diff-friendly.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use log::warn;

use crate::card_lines::{name_key, normalize_name, parse_card_line};
use crate::error::{DeckError, Result};

const FRONT_MATTER_MARK: &str = "---";
const COMMANDER_TAG: &str = "[commander]";

/// Canonical order for color identity codes.
const COLOR_ORDER: [char; 6] = ['W', 'U', 'B', 'R', 'G', 'C'];

/// One decklist line: a count, a name as the user wrote it, and the
/// resolver's canonical spelling once known.
#[derive(Debug, Clone, PartialEq)]
pub struct CardEntry {
    pub count: u32,
    pub raw_name: String,
    pub resolved_name: Option<String>,
    pub is_commander: bool,
    /// 1-based source line, for best-effort validation messages.
    pub line: Option<usize>,
}

impl CardEntry {
    pub fn new(count: u32, raw_name: &str) -> Self {
        Self {
            count,
            raw_name: normalize_name(raw_name),
            resolved_name: None,
            is_commander: false,
            line: None,
        }
    }

    /// Canonical spelling when resolved, the raw name otherwise.
    pub fn display_name(&self) -> &str {
        self.resolved_name.as_deref().unwrap_or(&self.raw_name)
    }

    /// Case-folded identity key used for merge and duplicate checks.
    pub fn key(&self) -> String {
        name_key(self.display_name())
    }
}

/// A `##` heading and the card bullets underneath it.
#[derive(Debug, Clone, PartialEq)]
pub struct DeckSection {
    pub title: String,
    pub entries: Vec<CardEntry>,
}

/// A Commander deck parsed from (or serialized to) a Markdown file.
#[derive(Debug, Clone)]
pub struct DeckDocument {
    pub name: String,
    /// The first commander-tagged decklist entry, or the front matter value
    /// when no entry carries the tag.
    pub commander: CardEntry,
    pub colors: Vec<char>,
    pub theme: Option<String>,
    pub format: String,
    pub created: Option<NaiveDate>,
    pub updated: Option<NaiveDate>,
    pub notes: Option<String>,
    pub sections: Vec<DeckSection>,
    pub path: Option<PathBuf>,
}

impl DeckDocument {
    pub fn new(name: &str, commander: &str) -> Self {
        let mut commander_entry = CardEntry::new(1, commander);
        commander_entry.is_commander = true;
        Self {
            name: name.trim().to_string(),
            commander: commander_entry,
            colors: Vec::new(),
            theme: None,
            format: "Commander".to_string(),
            created: None,
            updated: None,
            notes: None,
            sections: Vec::new(),
            path: None,
        }
    }

    /// Parses a Markdown deck document. Parsing is lenient: missing front
    /// matter or decklist sections produce an incomplete document that the
    /// rule engine reports on, not a failure.
    pub fn parse(text: &str, path: Option<&Path>) -> Self {
        let lines: Vec<&str> = text.lines().collect();
        let mut metadata: Vec<(String, String)> = Vec::new();
        let mut body_start = 0;

        if lines.first().map(|line| line.trim()) == Some(FRONT_MATTER_MARK) {
            for (idx, line) in lines.iter().enumerate().skip(1) {
                let trimmed = line.trim();
                if trimmed == FRONT_MATTER_MARK {
                    body_start = idx + 1;
                    break;
                }
                if let Some((key, value)) = trimmed.split_once(':') {
                    metadata.push((key.trim().to_lowercase(), value.trim().to_string()));
                }
            }
        }

        let get = |key: &str| -> Option<String> {
            metadata
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
                .filter(|v| !v.is_empty())
        };

        let name = get("name")
            .or_else(|| {
                path.and_then(Path::file_stem)
                    .map(|stem| stem.to_string_lossy().replace('-', " "))
            })
            .unwrap_or_default();

        let sections = parse_sections(&lines[body_start..], body_start);

        let commander = sections
            .iter()
            .flat_map(|section| section.entries.iter())
            .find(|entry| entry.is_commander)
            .cloned()
            .unwrap_or_else(|| {
                let mut entry = CardEntry::new(1, &get("commander").unwrap_or_default());
                entry.is_commander = true;
                entry
            });

        Self {
            name,
            commander,
            colors: normalize_colors(get("colors").unwrap_or_default().split(',')),
            theme: get("theme"),
            format: get("format").unwrap_or_else(|| "Commander".to_string()),
            created: get("created").and_then(|value| parse_date(&value)),
            updated: get("updated").and_then(|value| parse_date(&value)),
            notes: get("notes"),
            sections,
            path: path.map(Path::to_path_buf),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(DeckError::DeckNotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(&text, Some(path)))
    }

    /// Serializes to canonical Markdown: deterministic front matter order,
    /// sections with commander entries first and the rest sorted by
    /// normalized name, counts as bare integers. Idempotent under repeated
    /// parse/serialize cycles.
    pub fn to_markdown(&self) -> String {
        let mut lines = vec![FRONT_MATTER_MARK.to_string()];
        lines.push(format!("name: {}", self.name));
        lines.push(format!("commander: {}", self.commander.display_name()));
        if !self.colors.is_empty() {
            lines.push(format!("colors: {}", colors_string(&self.colors)));
        }
        if let Some(theme) = &self.theme {
            lines.push(format!("theme: {theme}"));
        }
        if !self.format.is_empty() {
            lines.push(format!("format: {}", self.format));
        }
        if let Some(created) = &self.created {
            lines.push(format!("created: {created}"));
        }
        if let Some(updated) = &self.updated {
            lines.push(format!("updated: {updated}"));
        }
        if let Some(notes) = &self.notes {
            lines.push(format!("notes: {notes}"));
        }
        lines.push(FRONT_MATTER_MARK.to_string());
        lines.push(String::new());

        lines.push(format!("# {}", self.name));
        lines.push(format!("**Commander:** {}", self.commander.display_name()));
        if let Some(theme) = &self.theme {
            lines.push(format!("**Theme:** {theme}"));
        }
        if !self.colors.is_empty() {
            lines.push(format!("**Colors:** {}", colors_string(&self.colors)));
        }

        for section in &self.sections {
            lines.push(String::new());
            lines.push(format!("## {}", section.title));
            lines.push(String::new());
            for entry in sorted_entries(&section.entries) {
                lines.push(render_entry(entry));
            }
        }

        lines.join("\n") + "\n"
    }

    pub fn all_entries(&self) -> impl Iterator<Item = &CardEntry> {
        self.sections.iter().flat_map(|section| section.entries.iter())
    }

    pub fn commander_entries(&self) -> Vec<&CardEntry> {
        self.all_entries().filter(|entry| entry.is_commander).collect()
    }

    /// Total card count across all sections, commander included.
    pub fn total_cards(&self) -> u32 {
        self.all_entries().map(|entry| entry.count).sum()
    }

    /// Per-card counts keyed by normalized name: `(display name, count)`.
    pub fn card_counts(&self) -> std::collections::BTreeMap<String, (String, u32)> {
        let mut counts = std::collections::BTreeMap::new();
        for entry in self.all_entries() {
            let slot = counts
                .entry(entry.key())
                .or_insert_with(|| (entry.display_name().to_string(), 0));
            slot.1 += entry.count;
        }
        counts
    }
}

fn parse_sections(body: &[&str], offset: usize) -> Vec<DeckSection> {
    let mut sections: Vec<DeckSection> = Vec::new();
    let mut current: Option<DeckSection> = None;

    for (idx, line) in body.iter().enumerate() {
        let trimmed = line.trim();

        if let Some(title) = trimmed.strip_prefix("## ") {
            if let Some(section) = current.take() {
                sections.push(section);
            }
            current = Some(DeckSection {
                title: title.trim().to_string(),
                entries: Vec::new(),
            });
            continue;
        }
        // Any other heading ends the current card-list region.
        if trimmed.starts_with('#') {
            if let Some(section) = current.take() {
                sections.push(section);
            }
            continue;
        }

        let Some(section) = current.as_mut() else {
            continue;
        };
        let Some(bullet) = trimmed.strip_prefix('-') else {
            continue;
        };

        let mut entry_text = bullet.trim();
        // Comment bullets are kept out of the decklist.
        if entry_text.starts_with("//") || entry_text.starts_with("...") {
            continue;
        }

        let is_commander = entry_text
            .get(..COMMANDER_TAG.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(COMMANDER_TAG));
        if is_commander {
            entry_text = entry_text[COMMANDER_TAG.len()..].trim_start();
        }

        if let Some((count, name)) = parse_card_line(entry_text) {
            section.entries.push(CardEntry {
                count,
                raw_name: name,
                resolved_name: None,
                is_commander,
                line: Some(offset + idx + 1),
            });
        }
    }

    if let Some(section) = current.take() {
        sections.push(section);
    }

    // Headings with no card bullets underneath are prose, not decklists.
    sections.retain(|section| !section.entries.is_empty());
    sections
}

fn sorted_entries(entries: &[CardEntry]) -> Vec<&CardEntry> {
    let mut sorted: Vec<&CardEntry> = entries.iter().collect();
    sorted.sort_by_key(|entry| (!entry.is_commander, entry.key()));
    sorted
}

fn render_entry(entry: &CardEntry) -> String {
    let tag = if entry.is_commander { "[Commander] " } else { "" };
    if entry.count > 1 {
        format!("- {tag}{} {}", entry.count, entry.display_name())
    } else {
        format!("- {tag}{}", entry.display_name())
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            warn!("Ignoring unparsable date in front matter: {value}");
            None
        }
    }
}

/// Restricts color codes to W/U/B/R/G/C and normalizes them to an uppercase,
/// deduplicated sequence in canonical color order.
pub fn normalize_colors<I, S>(values: I) -> Vec<char>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut colors: Vec<char> = Vec::new();
    for value in values {
        for token in value.as_ref().split_whitespace() {
            for ch in token.chars() {
                let upper = ch.to_ascii_uppercase();
                if COLOR_ORDER.contains(&upper) {
                    if !colors.contains(&upper) {
                        colors.push(upper);
                    }
                } else if ch != ',' {
                    warn!("Ignoring unknown color code: {ch}");
                }
            }
        }
    }
    colors.sort_by_key(|c| COLOR_ORDER.iter().position(|o| o == c));
    colors
}

pub fn colors_string(colors: &[char]) -> String {
    colors
        .iter()
        .map(char::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Renders a user-supplied template body into a full deck document.
///
/// Placeholder tokens `{name}`, `{commander}`, `{colors}`, `{format}`,
/// `{created}`, `{notes}` and `{decklist}` are substituted with literal
/// field values. A template without `{decklist}` gets a decklist heading and
/// the commander line appended so the document always has a valid anchor.
pub fn render_template(body: &str, deck: &DeckDocument) -> String {
    let decklist_lines: Vec<String> = deck
        .sections
        .iter()
        .flat_map(|section| sorted_entries(&section.entries))
        .map(render_entry)
        .collect();
    let decklist = if decklist_lines.is_empty() {
        render_entry(&deck.commander)
    } else {
        decklist_lines.join("\n")
    };

    let mut rendered = body
        .replace("{name}", &deck.name)
        .replace("{commander}", deck.commander.display_name())
        .replace("{colors}", &colors_string(&deck.colors))
        .replace("{format}", &deck.format)
        .replace(
            "{created}",
            &deck.created.map(|d| d.to_string()).unwrap_or_default(),
        )
        .replace("{notes}", deck.notes.as_deref().unwrap_or_default());

    if body.contains("{decklist}") {
        rendered = rendered.replace("{decklist}", &decklist);
    } else {
        rendered = format!("{}\n## Decklist\n\n{decklist}\n", rendered.trim_end());
    }

    let mut front = deck.clone();
    front.sections = Vec::new();
    let front_matter = front
        .to_markdown()
        .split_once("\n\n")
        .map(|(fm, _)| fm.to_string())
        .unwrap_or_default();

    format!("{front_matter}\n\n{}\n", rendered.trim_end())
}

/// Creates a file-system friendly slug.
pub fn slugify(text: &str) -> String {
    let mut slug = String::new();
    let mut last_dash = false;
    for ch in text.to_lowercase().chars() {
        if ch.is_alphanumeric() {
            slug.push(ch);
            last_dash = false;
        } else if matches!(ch, ' ' | '-' | '_') && !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    let slug = slug.trim_matches('-').to_string();
    if slug.is_empty() {
        "deck".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
#[path = "deck_tests.rs"]
mod tests;
