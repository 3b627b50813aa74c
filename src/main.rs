use std::path::PathBuf;

use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};

use mtg_decks::deck::normalize_colors;
use mtg_decks::inventory::{build_rows, SearchFilter, SortKey, SparesInventory};
use mtg_decks::report::{box_subtotals, render_spares_csv, render_valuation_report};
use mtg_decks::resolver::{CardResolver, ScryfallResolver};
use mtg_decks::rules::RuleSet;
use mtg_decks::valuation::ValuationCache;
use mtg_decks::{
    load_config, AppConfig, CreateOptions, DeckError, DeckLibrary, ImportOptions, Result,
};

/// Commander deck manager and spare-card inventory, backed by Markdown files.
#[derive(Parser)]
#[command(name = "mtg_decks", version, about)]
struct Cli {
    /// Directory holding the deck Markdown files
    #[arg(long, default_value = "decks", global = true)]
    dir: PathBuf,

    /// Optional KEY=VALUE .env file seeding the configuration
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List all decks with a one-line summary each
    List,
    /// Show one deck's metadata and card count
    Show {
        /// Deck name or slug
        name: String,
    },
    /// Create a new deck file with a commander-only decklist
    Create {
        name: String,
        /// Commander card name
        #[arg(long)]
        commander: String,
        /// Color identity as a WUBRGC string, e.g. "WUG"
        #[arg(long, default_value = "")]
        colors: String,
        #[arg(long)]
        theme: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        format: Option<String>,
        /// Markdown template to render instead of the default layout
        #[arg(long)]
        template: Option<PathBuf>,
    },
    /// Import a deck from a card list file (newline text or CSV)
    Import {
        name: String,
        #[arg(long)]
        commander: String,
        /// File with card entries
        file: PathBuf,
        /// Color identity override; inferred from the commander when empty
        #[arg(long, default_value = "")]
        colors: String,
        #[arg(long)]
        theme: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        format: Option<String>,
        /// Replace an existing deck file with the same slug
        #[arg(long)]
        overwrite: bool,
        /// Skip Commander rule validation of the imported deck
        #[arg(long)]
        no_validate: bool,
    },
    /// Price one deck, reusing this month's cached valuation if present
    Value {
        name: String,
        /// Currency code, e.g. usd/eur/gbp
        #[arg(long)]
        currency: Option<String>,
    },
    /// Price every deck and optionally write a Markdown report
    ValueAll {
        #[arg(long)]
        currency: Option<String>,
        /// Write the report to this file instead of stdout
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Validate every deck against the Commander rules
    Validate(ValidateArgs),
    /// Manage the spare-card inventory table
    Spares {
        /// Inventory Markdown file
        #[arg(long, default_value = "spares.md")]
        file: PathBuf,
        #[command(subcommand)]
        command: SparesCommand,
    },
}

#[derive(Args)]
struct ValidateArgs {
    /// Write all findings to this log file, replacing prior content
    #[arg(long)]
    log: Option<PathBuf>,
    /// Required total card count
    #[arg(long, default_value_t = 100)]
    deck_size: u32,
    /// Allow partner/background commander pairs
    #[arg(long)]
    allow_partner: bool,
    /// Accept decks whose commander is only named in the front matter
    #[arg(long)]
    allow_missing_commander_tag: bool,
    /// Expected format name in the front matter
    #[arg(long, default_value = "Commander")]
    expected_format: String,
    /// Additional banned card names
    #[arg(long = "ban")]
    banned: Vec<String>,
}

#[derive(Subcommand)]
enum SparesCommand {
    /// Import spare cards from a card list file into one box
    Import {
        /// File with card entries
        file: PathBuf,
        /// Box label the cards go into
        #[arg(long = "box")]
        box_label: String,
        #[arg(long)]
        currency: Option<String>,
        #[arg(long, value_enum, default_value = "name")]
        sort: SortArg,
    },
    /// Search the inventory without changing it
    Search {
        /// Substring matched against name and type line
        #[arg(long)]
        query: Option<String>,
        /// Restrict to these boxes (exact label match)
        #[arg(long = "box")]
        boxes: Vec<String>,
        #[arg(long, value_enum, default_value = "name")]
        sort: SortArg,
        /// Print CSV instead of plain rows
        #[arg(long)]
        csv: bool,
    },
    /// Move cards between boxes; fails whole if any count is short
    Move {
        /// Card entries, e.g. "2 Sol Ring"
        cards: Vec<String>,
        #[arg(long = "from")]
        from_box: String,
        #[arg(long = "to")]
        to_box: String,
        #[arg(long)]
        currency: Option<String>,
        #[arg(long, value_enum, default_value = "name")]
        sort: SortArg,
    },
    /// Subtract every deck's cards from the spares table
    SyncDecks {
        #[arg(long)]
        currency: Option<String>,
        #[arg(long, value_enum, default_value = "name")]
        sort: SortArg,
        /// Preview the remaining rows without rewriting the table
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Name,
    Value,
    Cmc,
}

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Name => SortKey::Name,
            SortArg::Value => SortKey::Value,
            SortArg::Cmc => SortKey::Cmc,
        }
    }
}

fn main() {
    // Initialize logger. Set RUST_LOG environment variable to control log level.
    // Examples: RUST_LOG=info, RUST_LOG=warn, RUST_LOG=mtg_decks=debug
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        log::error!("Command failed: {e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.env_file.as_deref());
    let library = DeckLibrary::new(&cli.dir)?;

    match cli.command {
        Command::List => {
            for line in library.list_summary()? {
                println!("{line}");
            }
        }
        Command::Show { name } => {
            println!("{}", library.show(&name)?);
        }
        Command::Create {
            name,
            commander,
            colors,
            theme,
            notes,
            format,
            template,
        } => {
            let path = library.create_deck(CreateOptions {
                name,
                commander,
                colors: parse_colors(&colors),
                theme,
                notes,
                format,
                created: None,
                template,
            })?;
            println!("Created {}", path.display());
        }
        Command::Import {
            name,
            commander,
            file,
            colors,
            theme,
            notes,
            format,
            overwrite,
            no_validate,
        } => {
            let card_text = std::fs::read_to_string(&file)?;
            let resolver = resolver_from_source(&config)?;
            let rules = RuleSet::default();
            let outcome = library.import_deck(
                ImportOptions {
                    name,
                    commander,
                    card_text,
                    colors: parse_colors(&colors),
                    theme,
                    notes,
                    format,
                    overwrite,
                },
                resolver.as_ref(),
                (!no_validate).then_some(&rules),
            )?;
            for warning in &outcome.warnings {
                println!("Warning: {warning}");
            }
            println!(
                "Imported {} ({} cards, commander: {})",
                outcome.path.display(),
                outcome.card_count,
                outcome.commander
            );
        }
        Command::Value { name, currency } => {
            let currency = currency.unwrap_or_else(|| config.default_currency.clone());
            let resolver = resolver_from_source(&config)?;
            let mut cache = ValuationCache::load(&config.valuation_cache_path);
            let valuation = library.value_deck(
                &name,
                &currency,
                resolver.as_ref(),
                &mut cache,
                &config.valuation_source,
                Utc::now(),
            )?;
            cache.save()?;
            println!("{name}: {}", valuation.formatted_total());
            for card in &valuation.missing_prices {
                println!("  no price: {card}");
            }
        }
        Command::ValueAll { currency, report } => {
            let currency = currency.unwrap_or_else(|| config.default_currency.clone());
            let resolver = resolver_from_source(&config)?;
            let mut cache = ValuationCache::load(&config.valuation_cache_path);
            let valuations = library.value_all(
                &currency,
                resolver.as_ref(),
                &mut cache,
                &config.valuation_source,
                Utc::now(),
            )?;
            let rendered = render_valuation_report(&valuations, &currency, Utc::now());
            match report {
                Some(path) => {
                    std::fs::write(&path, rendered)?;
                    println!("Wrote report to {}", path.display());
                }
                None => print!("{rendered}"),
            }
        }
        Command::Validate(args) => {
            let rules = RuleSet {
                deck_size: args.deck_size,
                allow_partner_background: args.allow_partner,
                require_commander_tag: !args.allow_missing_commander_tag,
                expected_format: Some(args.expected_format),
                ..Default::default()
            }
            .with_banned(&args.banned);
            let issues = library.validate_decks(&rules, args.log.as_deref())?;
            if issues.is_empty() {
                println!("All decks valid.");
            } else {
                for issue in &issues {
                    println!("{issue}");
                }
                std::process::exit(1);
            }
        }
        Command::Spares { file, command } => {
            run_spares(&library, &config, SparesInventory::new(file), command)?;
        }
    }
    Ok(())
}

fn run_spares(
    library: &DeckLibrary,
    config: &AppConfig,
    inventory: SparesInventory,
    command: SparesCommand,
) -> Result<()> {
    match command {
        SparesCommand::Import {
            file,
            box_label,
            currency,
            sort,
        } => {
            let currency = spares_currency(currency, &inventory, config)?;
            let card_text = std::fs::read_to_string(&file)?;
            let resolver = resolver_from_source(config)?;
            let (rows, warnings) =
                build_rows(&card_text, &box_label, &currency, resolver.as_ref())?;
            for warning in &warnings {
                println!("Warning: {warning}");
            }
            let (rows, missing) = inventory.import(rows, &currency, sort.into())?;
            println!("Inventory now holds {} row(s)", rows.len());
            for name in &missing {
                println!("  no price: {name}");
            }
        }
        SparesCommand::Search {
            query,
            boxes,
            sort,
            csv,
        } => {
            let currency = spares_currency(None, &inventory, config)?;
            let filter = SearchFilter { query, boxes };
            let rows = inventory.search(&filter, sort.into())?;
            if csv {
                print!("{}", render_spares_csv(&rows));
            } else {
                for row in &rows {
                    println!(
                        "{} x{} [{}] {}",
                        row.name,
                        row.count,
                        row.box_label,
                        mtg_decks::format_currency(row.unit_value, &currency)
                    );
                }
                for (box_label, (count, value)) in box_subtotals(&rows) {
                    println!(
                        "Box '{box_label}': {count} card(s), {}",
                        mtg_decks::format_currency(Some(value), &currency)
                    );
                }
            }
        }
        SparesCommand::Move {
            cards,
            from_box,
            to_box,
            currency,
            sort,
        } => {
            let currency = spares_currency(currency, &inventory, config)?;
            let entries = mtg_decks::parse_card_rows(&cards.join("\n"));
            if entries.is_empty() {
                return Err(DeckError::EmptyImport);
            }
            let rows = inventory.move_cards(&from_box, &to_box, &entries, &currency, sort.into())?;
            println!(
                "Moved cards from '{from_box}' to '{to_box}'; {} row(s) remain",
                rows.len()
            );
        }
        SparesCommand::SyncDecks {
            currency,
            sort,
            dry_run,
        } => {
            let currency = spares_currency(currency, &inventory, config)?;
            let decks = library.load_decks()?;
            let rows = inventory.sync_decks(&decks, &currency, sort.into(), dry_run)?;
            if dry_run {
                println!(
                    "Dry run: {} spare row(s) would remain after subtracting {} deck(s)",
                    rows.len(),
                    decks.len()
                );
                for row in &rows {
                    println!("{} x{} [{}]", row.name, row.count, row.box_label);
                }
            } else {
                println!(
                    "Subtracted {} deck(s); {} spare row(s) remain",
                    decks.len(),
                    rows.len()
                );
            }
        }
    }
    Ok(())
}

/// Currency for spares output: explicit flag, then the table's own
/// `Currency:` header, then the configured default.
fn spares_currency(
    explicit: Option<String>,
    inventory: &SparesInventory,
    config: &AppConfig,
) -> Result<String> {
    if let Some(currency) = explicit {
        return Ok(currency);
    }
    Ok(inventory
        .stored_currency()?
        .unwrap_or_else(|| config.default_currency.clone()))
}

fn parse_colors(colors: &str) -> Vec<char> {
    normalize_colors(colors.chars().map(|c| c.to_string()))
}

fn resolver_from_source(config: &AppConfig) -> Result<Box<dyn CardResolver>> {
    match config.valuation_source.as_str() {
        "scryfall" => Ok(Box::new(ScryfallResolver::new())),
        other => Err(DeckError::UnsupportedSource(other.to_string())),
    }
}
