// 🗃️ Card Store - Single source of truth for cards and banned countries
//
// Invariant: for every card, card.is_banned() == bans.contains(card country).
// Only this module writes the ban flag. Ban/unban scan every card, which is
// O(cards) per call; the flat-file backing store keeps the card count small.

use std::collections::BTreeMap;

use tracing::debug;
use uuid::Uuid;

use crate::card::{Card, CardCreate, IssuerDetails};
use crate::countries::{same_country, BanList};
use crate::error::{RegistryError, Result};

// ============================================================================
// LOAD RECONCILIATION
// ============================================================================

/// Recompute every loaded card's ban flag against the loaded ban list.
///
/// Returns the corrected cards and whether any flag had to change, i.e.
/// whether the cards snapshot needs rewriting.
pub fn reconcile_on_load(mut cards: Vec<Card>, bans: &BanList) -> (Vec<Card>, bool) {
    let mut was_modified = false;

    for card in &mut cards {
        let banned = bans.contains(card.country_name());
        if card.is_banned() != banned {
            debug!(card = %card.id(), banned, "correcting persisted ban flag");
            card.set_banned(banned);
            was_modified = true;
        }
    }

    (cards, was_modified)
}

// ============================================================================
// CARD STORE
// ============================================================================

#[derive(Debug, Default)]
pub struct CardStore {
    cards: BTreeMap<Uuid, Card>,
    bans: BanList,
}

impl CardStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from persisted state, reconciling flags on the way in.
    /// The bool is true when the loaded cards disagreed with the ban list.
    ///
    /// Two records sharing an id fail the load instead of one replacing the
    /// other.
    pub fn from_snapshot(cards: Vec<Card>, bans: BanList) -> Result<(Self, bool)> {
        let (cards, was_modified) = reconcile_on_load(cards, &bans);

        let mut by_id = BTreeMap::new();
        for card in cards {
            let id = card.id();
            if by_id.insert(id, card).is_some() {
                return Err(RegistryError::CorruptSnapshot(format!(
                    "card id {} appears more than once",
                    id
                )));
            }
        }

        Ok((CardStore { cards: by_id, bans }, was_modified))
    }

    // ========================================================================
    // CARDS
    // ========================================================================

    /// Commit an accepted card. The ban flag comes from the current ban list.
    pub fn insert_card(&mut self, candidate: &CardCreate, details: IssuerDetails) -> Card {
        let banned = self.is_banned(details.country_name());
        let card = Card::new(
            candidate.card_number.clone(),
            candidate.card_holder.clone(),
            details,
            banned,
        );

        self.cards.insert(card.id(), card.clone());
        card
    }

    /// All cards, ordered by id ascending
    pub fn all_cards(&self) -> Vec<Card> {
        self.cards.values().cloned().collect()
    }

    pub fn card_by_id(&self, id: Uuid) -> Result<Card> {
        self.cards
            .get(&id)
            .cloned()
            .ok_or(RegistryError::NotFound(id))
    }

    pub fn is_card_duplicate(&self, card_number: &str) -> bool {
        let number = card_number.to_lowercase();
        self.cards
            .values()
            .any(|c| c.card_number().to_lowercase() == number)
    }

    pub fn card_count(&self) -> usize {
        self.cards.len()
    }

    // ========================================================================
    // BANNED COUNTRIES
    // ========================================================================

    pub fn is_banned(&self, country: &str) -> bool {
        self.bans.contains(country)
    }

    /// Current ban list in insertion order
    pub fn banned_countries(&self) -> Vec<String> {
        self.bans.names().to_vec()
    }

    pub fn ban_list(&self) -> &BanList {
        &self.bans
    }

    /// Ban every name not already banned and flag the matching cards.
    ///
    /// Returns only the newly banned names, so repeating a call is a no-op
    /// that returns nothing.
    pub fn ban_countries<S: AsRef<str>>(&mut self, names: &[S]) -> Vec<String> {
        let mut newly_banned = Vec::new();

        for name in names {
            let name = name.as_ref().trim();
            if !self.bans.insert(name) {
                continue;
            }

            let flagged = self.set_flag_for_country(name, true);
            debug!(country = name, flagged, "country banned");
            newly_banned.push(name.to_string());
        }

        newly_banned
    }

    /// Unban the given names and clear the flag on cards from the countries
    /// that were actually removed. Names that were not banned are ignored.
    ///
    /// Returns the removed names as they were spelled in the ban list.
    pub fn unban_countries<S: AsRef<str>>(&mut self, names: &[S]) -> Vec<String> {
        let mut removed = Vec::new();

        for name in names {
            let Some(stored) = self.bans.remove(name.as_ref()) else {
                continue;
            };

            let cleared = self.set_flag_for_country(&stored, false);
            debug!(country = %stored, cleared, "country unbanned");
            removed.push(stored);
        }

        removed
    }

    /// Set the ban flag on every card from `country`, returning how many changed
    fn set_flag_for_country(&mut self, country: &str, banned: bool) -> usize {
        let mut changed = 0;

        for card in self.cards.values_mut() {
            if card.is_banned() != banned && same_country(card.country_name(), country) {
                card.set_banned(banned);
                changed += 1;
            }
        }

        changed
    }
}

// ============================================================================
// TESTS
// ============================================================================
