pub mod card_lines;
pub mod config;
pub mod currency;
pub mod deck;
pub mod error;
pub mod inventory;
pub mod library;
pub mod report;
pub mod resolver;
pub mod rules;
pub mod valuation;

// Re-export commonly used items
pub use card_lines::{name_key, normalize_name, parse_card_line, parse_card_rows};
pub use config::{load_config, AppConfig};
pub use currency::format_currency;
pub use deck::{slugify, CardEntry, DeckDocument, DeckSection};
pub use error::{DeckError, Result};
pub use inventory::{InventoryRow, SearchFilter, SortKey, SparesInventory};
pub use library::{CreateOptions, DeckLibrary, ImportOptions, ImportOutcome};
pub use resolver::{CardResolver, FixtureResolver, ResolvedCard, ScryfallResolver};
pub use rules::{RuleId, RuleSet, Severity, ValidationIssue};
pub use valuation::{DeckValuation, DeckValuer, ValuationCache};
