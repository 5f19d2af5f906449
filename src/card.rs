// 💳 Card Model - Registered cards and their issuer metadata
//
// "Card id is IDENTITY (never changes), the ban flag is DERIVED state"
//
// A Card's `is_banned` flag is owned by the CardStore: it is recomputed on
// load and updated on ban/unban, never set by request handlers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// CARD CREATE (request body)
// ============================================================================

/// Body of a card registration request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CardCreate {
    pub card_number: String,
    pub card_holder: String,
}

impl CardCreate {
    pub fn new(card_number: &str, card_holder: &str) -> Self {
        CardCreate {
            card_number: card_number.to_string(),
            card_holder: card_holder.to_string(),
        }
    }
}

// ============================================================================
// ISSUER DETAILS (from the issuer lookup)
// ============================================================================

/// Issuing country as reported by the lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Country {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha2: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl Country {
    pub fn named(name: &str) -> Self {
        Country {
            name: name.to_string(),
            numeric: None,
            alpha2: None,
            emoji: None,
            currency: None,
            latitude: None,
            longitude: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssuerBank {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

/// Issuer metadata attached to an accepted card.
///
/// Only `country.name` carries meaning for the registry; the rest is kept
/// so it can be returned to clients as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuerDetails {
    pub country: Country,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,

    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub card_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prepaid: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank: Option<IssuerBank>,
}

impl IssuerDetails {
    /// Details with nothing but a country, mostly useful for tests and fixtures
    pub fn for_country(country: &str) -> Self {
        IssuerDetails {
            country: Country::named(country),
            scheme: None,
            card_type: None,
            brand: None,
            prepaid: None,
            bank: None,
        }
    }

    pub fn country_name(&self) -> &str {
        &self.country.name
    }

    pub fn currency(&self) -> Option<&str> {
        self.country.currency.as_deref()
    }
}

// ============================================================================
// CARD ENTITY
// ============================================================================

/// A registered card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    /// Stable identity (UUID) - NEVER changes
    id: Uuid,

    card_number: String,

    card_holder: String,

    details: IssuerDetails,

    /// Maintained by the store's reconciliation; absent in very old snapshots
    #[serde(default)]
    is_banned: bool,

    /// When the card was accepted (not present on legacy records)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    registered_at: Option<DateTime<Utc>>,
}

impl Card {
    /// Only the store creates cards, so the ban flag is always computed there
    pub(crate) fn new(
        card_number: String,
        card_holder: String,
        details: IssuerDetails,
        is_banned: bool,
    ) -> Self {
        Card {
            id: Uuid::new_v4(),
            card_number,
            card_holder,
            details,
            is_banned,
            registered_at: Some(Utc::now()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn card_number(&self) -> &str {
        &self.card_number
    }

    pub fn card_holder(&self) -> &str {
        &self.card_holder
    }

    pub fn details(&self) -> &IssuerDetails {
        &self.details
    }

    pub fn country_name(&self) -> &str {
        self.details.country_name()
    }

    pub fn is_banned(&self) -> bool {
        self.is_banned
    }

    pub fn registered_at(&self) -> Option<DateTime<Utc>> {
        self.registered_at
    }

    /// Card number with all but the last four digits hidden
    pub fn masked_number(&self) -> String {
        let visible = self.card_number.len().saturating_sub(4);
        self.card_number
            .chars()
            .enumerate()
            .map(|(i, c)| if i < visible { '*' } else { c })
            .collect()
    }

    pub(crate) fn set_banned(&mut self, banned: bool) {
        self.is_banned = banned;
    }
}

// ============================================================================
// COUNTRY LIST (ban/unban request body)
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CountryList {
    pub countries: Vec<String>,
}

// ============================================================================
// TESTS
// ============================================================================
