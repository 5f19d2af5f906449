// Card Registry - Admin CLI
// Offline inspection and repair of the snapshot files

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use card_registry::config::{init_logging, StorageConfig};
use card_registry::{Card, CardStore, SnapshotFiles};

#[derive(Parser)]
#[command(name = "card-registry", version, about = "Card registry snapshot tools")]
struct Cli {
    #[command(flatten)]
    storage: StorageConfig,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Recompute ban flags and rewrite cards.txt if any were stale
    Reconcile,
    /// Print every stored card
    Cards,
    /// Print the ban list
    Banned,
    /// Write all cards to a CSV file
    Export { path: PathBuf },
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let files = cli.storage.snapshot_files();

    match cli.command {
        Command::Reconcile => run_reconcile(&files)?,
        Command::Cards => run_cards(&files)?,
        Command::Banned => run_banned(&files)?,
        Command::Export { path } => run_export(&files, &path)?,
    }

    Ok(())
}

fn load_store(files: &SnapshotFiles) -> Result<(CardStore, bool)> {
    let bans = files.load_banned()?;
    let cards = files.load_cards()?;
    Ok(CardStore::from_snapshot(cards, bans)?)
}

fn run_reconcile(files: &SnapshotFiles) -> Result<()> {
    println!("⚖️  Reconciling {:?}", files.cards_path());

    let (store, was_modified) = load_store(files)?;
    let banned = store.all_cards().iter().filter(|c| c.is_banned()).count();

    if was_modified {
        files
            .save_cards(&store.all_cards())
            .context("Failed to rewrite cards snapshot")?;
        println!("✓ Ban flags corrected and cards.txt rewritten");
    } else {
        println!("✓ All ban flags already consistent");
    }
    println!(
        "  {} cards, {} flagged as banned, {} banned countries",
        store.card_count(),
        banned,
        store.ban_list().len()
    );

    Ok(())
}

fn run_cards(files: &SnapshotFiles) -> Result<()> {
    let (store, was_modified) = load_store(files)?;

    for card in store.all_cards() {
        println!(
            "{}  {}  {:<24}  {:<20}  {}",
            card.id(),
            card.masked_number(),
            card.card_holder(),
            card.country_name(),
            if card.is_banned() { "BANNED" } else { "ok" }
        );
    }
    if was_modified {
        eprintln!("⚠️  Some persisted flags are stale; run `card-registry reconcile`");
    }

    Ok(())
}

fn run_banned(files: &SnapshotFiles) -> Result<()> {
    let bans = files.load_banned()?;
    for name in bans.names() {
        println!("{}", name);
    }
    Ok(())
}

/// One CSV row per card
#[derive(Serialize)]
struct CardRow<'a> {
    id: String,
    card_number: String,
    card_holder: &'a str,
    country: &'a str,
    currency: &'a str,
    scheme: &'a str,
    is_banned: bool,
    registered_at: String,
}

impl<'a> From<&'a Card> for CardRow<'a> {
    fn from(card: &'a Card) -> Self {
        let details = card.details();
        Self {
            id: card.id().to_string(),
            card_number: card.masked_number(),
            card_holder: card.card_holder(),
            country: card.country_name(),
            currency: details.currency().unwrap_or(""),
            scheme: details.scheme.as_deref().unwrap_or(""),
            is_banned: card.is_banned(),
            registered_at: card
                .registered_at()
                .map(|t| t.to_rfc3339())
                .unwrap_or_default(),
        }
    }
}

fn run_export(files: &SnapshotFiles, path: &Path) -> Result<()> {
    let (store, _) = load_store(files)?;
    let cards = store.all_cards();

    let mut writer = csv::Writer::from_path(path).context("Failed to create CSV file")?;
    for card in &cards {
        writer
            .serialize(CardRow::from(card))
            .context("Failed to write card row")?;
    }
    writer.flush()?;

    println!("✓ Exported {} cards to {:?}", cards.len(), path);
    Ok(())
}
