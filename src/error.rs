// ⚠️ Error taxonomy - every failure a request can end in
//
// Validation and store errors are recovered at the request boundary and
// turned into a ResponseError; nothing is silently swallowed.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::lookup::LookupError;

#[derive(Debug, Error)]
pub enum RegistryError {
    /// Body missing, unparseable, or carrying unknown fields
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    #[error("issuer lookup failed: {0}")]
    Lookup(#[from] LookupError),

    #[error("invalid card number: expected 16 digits, got {length} characters")]
    InvalidCardNumber { length: usize },

    #[error("the card is already saved")]
    DuplicateCard,

    #[error("the country is banned: {0}")]
    BannedCountry(String),

    #[error("no card found with id {0}")]
    NotFound(Uuid),

    #[error("could not persist {what}: {source}")]
    Persistence {
        what: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Persisted state that cannot be loaded as-is
    #[error("corrupt snapshot: {0}")]
    CorruptSnapshot(String),

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

pub type Result<T> = std::result::Result<T, RegistryError>;

impl RegistryError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RegistryError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            RegistryError::Lookup(_) => StatusCode::BAD_GATEWAY,
            RegistryError::InvalidCardNumber { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            RegistryError::DuplicateCard => StatusCode::CONFLICT,
            RegistryError::BannedCountry(_) => StatusCode::FORBIDDEN,
            RegistryError::NotFound(_) => StatusCode::NOT_FOUND,
            RegistryError::Persistence { .. }
            | RegistryError::CorruptSnapshot(_)
            | RegistryError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn summary(&self) -> &'static str {
        match self {
            RegistryError::MalformedRequest(_) => {
                "There was an error during the attempt to parse the json."
            }
            RegistryError::Lookup(_) => "The card issuer could not be looked up.",
            RegistryError::InvalidCardNumber { .. }
            | RegistryError::DuplicateCard
            | RegistryError::BannedCountry(_) => "The card is an invalid card.",
            RegistryError::NotFound(_) => {
                "Unable to find a resource for the specific requirements."
            }
            RegistryError::Persistence { .. }
            | RegistryError::CorruptSnapshot(_)
            | RegistryError::Unexpected(_) => "",
        }
    }

    pub fn to_response(&self) -> ResponseError {
        ResponseError::new(self.status_code(), self.summary(), &self.to_string())
    }
}

// ============================================================================
// RESPONSE ERROR (wire form)
// ============================================================================

const DEFAULT_DESCRIPTION: &str = "An error occurred while trying to do something awesome for you!";

/// Structured error body: status classification, human text, diagnostic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseError {
    pub status_code: u16,
    pub description: String,
    pub error: String,
}

impl ResponseError {
    pub fn new(status: StatusCode, description: &str, error: &str) -> Self {
        let description = if description.trim().is_empty() {
            DEFAULT_DESCRIPTION
        } else {
            description
        };

        ResponseError {
            status_code: status.as_u16(),
            description: description.to_string(),
            error: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejections_have_distinct_statuses() {
        let invalid = RegistryError::InvalidCardNumber { length: 15 };
        let duplicate = RegistryError::DuplicateCard;
        let banned = RegistryError::BannedCountry("Narnia".to_string());

        assert_eq!(invalid.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(duplicate.status_code(), StatusCode::CONFLICT);
        assert_eq!(banned.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            RegistryError::NotFound(Uuid::nil()).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_response_error_default_description() {
        let response = RegistryError::Unexpected("boom".to_string()).to_response();

        assert_eq!(response.status_code, 500);
        assert_eq!(response.description, DEFAULT_DESCRIPTION);
        assert_eq!(response.error, "unexpected error: boom");
    }

    #[test]
    fn test_response_error_carries_detail() {
        let response = RegistryError::BannedCountry("Mordor".to_string()).to_response();

        assert_eq!(response.status_code, 403);
        assert_eq!(response.description, "The card is an invalid card.");
        assert!(response.error.contains("Mordor"));
    }
}
