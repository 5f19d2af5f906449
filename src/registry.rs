// 🏛️ Registry - One logical transaction per request
//
// Owns the single store lock, the snapshot files and the validation
// pipeline. Every mutation and the snapshot rewrite it triggers run under
// the same guard, so a snapshot is never written from a half-applied change.
// The issuer lookup always runs with the lock released.

use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};
use tracing::{error, info};
use uuid::Uuid;

use crate::card::{Card, CardCreate};
use crate::error::RegistryError;
use crate::lookup::IssuerLookup;
use crate::snapshot::SnapshotFiles;
use crate::store::CardStore;
use crate::validation::ValidationPipeline;

pub struct Registry {
    store: Mutex<CardStore>,
    snapshots: SnapshotFiles,
    pipeline: ValidationPipeline,
}

impl Registry {
    /// Load both snapshots, reconcile ban flags, and rewrite the cards file
    /// if reconciliation changed anything. Any failure here is fatal.
    pub fn open(snapshots: SnapshotFiles, lookup: Arc<dyn IssuerLookup>) -> Result<Self> {
        let bans = snapshots.load_banned()?;
        let cards = snapshots.load_cards()?;

        let (store, was_modified) = CardStore::from_snapshot(cards, bans)?;
        info!(
            cards = store.card_count(),
            banned = store.ban_list().len(),
            "registry loaded"
        );

        if was_modified {
            info!("ban flags corrected on load, rewriting cards snapshot");
            snapshots
                .save_cards(&store.all_cards())
                .context("Failed to rewrite reconciled cards snapshot")?;
        }

        Ok(Registry {
            store: Mutex::new(store),
            snapshots,
            pipeline: ValidationPipeline::new(lookup),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, CardStore>, RegistryError> {
        self.store
            .lock()
            .map_err(|_| RegistryError::Unexpected("card store lock poisoned".to_string()))
    }

    // ========================================================================
    // CARDS
    // ========================================================================

    /// Validate, commit and persist a new card
    pub async fn create_card(&self, raw: CardCreate) -> Result<Card, RegistryError> {
        let candidate = {
            let store = self.lock()?;
            self.pipeline.precheck(&store, raw)?
        };

        let details = self.pipeline.fetch_issuer(&candidate).await?;

        let mut store = self.lock()?;
        let validated = self.pipeline.classify(&store, candidate, details)?;
        let card = store.insert_card(&validated.candidate, validated.details);
        info!(card = %card.id(), number = %card.masked_number(), country = card.country_name(), "card registered");

        self.persist_cards(&store);
        Ok(card)
    }

    pub fn list_cards(&self) -> Result<Vec<Card>, RegistryError> {
        Ok(self.lock()?.all_cards())
    }

    pub fn get_card(&self, id: Uuid) -> Result<Card, RegistryError> {
        self.lock()?.card_by_id(id)
    }

    // ========================================================================
    // BANNED COUNTRIES
    // ========================================================================

    pub fn banned_countries(&self) -> Result<Vec<String>, RegistryError> {
        Ok(self.lock()?.banned_countries())
    }

    /// Ban countries; returns only the newly banned names
    pub fn ban_countries(&self, names: &[String]) -> Result<Vec<String>, RegistryError> {
        let mut store = self.lock()?;
        let newly_banned = store.ban_countries(names);

        if !newly_banned.is_empty() {
            info!(countries = ?newly_banned, "countries banned");
            self.persist_bans(&store);
            self.persist_cards(&store);
        }
        Ok(newly_banned)
    }

    /// Unban countries; returns the names that were actually removed
    pub fn unban_countries(&self, names: &[String]) -> Result<Vec<String>, RegistryError> {
        let mut store = self.lock()?;
        let removed = store.unban_countries(names);

        if !removed.is_empty() {
            info!(countries = ?removed, "countries unbanned");
            self.persist_bans(&store);
            self.persist_cards(&store);
        }
        Ok(removed)
    }

    // ========================================================================
    // PERSISTENCE
    // ========================================================================
    // Save failures are logged, not returned: the in-memory store stays
    // authoritative for the running process.

    fn persist_cards(&self, store: &CardStore) {
        if let Err(e) = self.snapshots.save_cards(&store.all_cards()) {
            error!(error = %e, "failed to save cards snapshot");
        }
    }

    fn persist_bans(&self, store: &CardStore) {
        if let Err(e) = self.snapshots.save_banned(store.ban_list()) {
            error!(error = %e, "failed to save banned countries snapshot");
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
