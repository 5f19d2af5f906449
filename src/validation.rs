// ✅ Validation Pipeline - Decide whether a submitted card is acceptable
//
// Received -> LookupPending -> {Accepted | Rejected(reason)}
//
// Rejections are reported in a fixed order: card number shape first, then
// duplicate, then banned issuer country. The shape check runs before any
// lookup, so a malformed number never costs a network call.
//
// The pipeline never mutates the store; the caller commits a ValidatedCard
// with CardStore::insert_card.

use std::sync::Arc;

use tracing::{debug, info};

use crate::card::{CardCreate, IssuerDetails};
use crate::error::{RegistryError, Result};
use crate::lookup::IssuerLookup;
use crate::store::CardStore;

pub const CARD_NUMBER_LENGTH: usize = 16;
pub const BIN_PREFIX_LENGTH: usize = 9;

/// Strip every whitespace character from a submitted card number
pub fn normalize_card_number(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Exactly 16 ASCII digits
pub fn check_card_number(number: &str) -> Result<()> {
    let length = number.chars().count();
    if length != CARD_NUMBER_LENGTH || !number.chars().all(|c| c.is_ascii_digit()) {
        return Err(RegistryError::InvalidCardNumber { length });
    }
    Ok(())
}

/// Bank identification prefix used for the issuer lookup
pub fn bin_prefix(number: &str) -> &str {
    let end = number
        .char_indices()
        .nth(BIN_PREFIX_LENGTH)
        .map(|(i, _)| i)
        .unwrap_or(number.len());
    &number[..end]
}

/// A card that passed every check, ready to be committed
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedCard {
    pub candidate: CardCreate,
    pub details: IssuerDetails,
}

pub struct ValidationPipeline {
    lookup: Arc<dyn IssuerLookup>,
}

impl ValidationPipeline {
    pub fn new(lookup: Arc<dyn IssuerLookup>) -> Self {
        ValidationPipeline { lookup }
    }

    /// Received: normalize the number, then the shape and duplicate checks.
    /// Needs only a short look at the store.
    pub fn precheck(&self, store: &CardStore, raw: CardCreate) -> Result<CardCreate> {
        let candidate = CardCreate {
            card_number: normalize_card_number(&raw.card_number),
            card_holder: raw.card_holder,
        };

        check_card_number(&candidate.card_number)?;

        if store.is_card_duplicate(&candidate.card_number) {
            return Err(RegistryError::DuplicateCard);
        }

        Ok(candidate)
    }

    /// LookupPending: fetch issuer metadata. Must not be called with the
    /// store locked.
    pub async fn fetch_issuer(&self, candidate: &CardCreate) -> Result<IssuerDetails> {
        let prefix = bin_prefix(&candidate.card_number);
        let details = self.lookup.lookup(prefix).await?;

        debug!(prefix, country = details.country_name(), "issuer resolved");
        Ok(details)
    }

    /// Final decision against current store state. The duplicate check is
    /// repeated because the store may have changed during the lookup.
    pub fn classify(
        &self,
        store: &CardStore,
        candidate: CardCreate,
        details: IssuerDetails,
    ) -> Result<ValidatedCard> {
        check_card_number(&candidate.card_number)?;

        if store.is_card_duplicate(&candidate.card_number) {
            return Err(RegistryError::DuplicateCard);
        }

        if store.is_banned(details.country_name()) {
            info!(country = details.country_name(), "rejecting card from banned country");
            return Err(RegistryError::BannedCountry(details.country_name().to_string()));
        }

        Ok(ValidatedCard { candidate, details })
    }
}

// ============================================================================
// TESTS
// ============================================================================
