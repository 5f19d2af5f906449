// Card Registry - Core Library
// Exposes all modules for use in the API server, the admin CLI, and tests

pub mod api;
pub mod card;
pub mod config;
pub mod countries;
pub mod error;
pub mod lookup;
pub mod registry;
pub mod snapshot;
pub mod store;
pub mod validation;

// Re-export commonly used types
pub use card::{Card, CardCreate, Country, CountryList, IssuerBank, IssuerDetails};
pub use countries::BanList;
pub use error::{RegistryError, ResponseError};
pub use lookup::{BinlistClient, IssuerLookup, LookupError, StaticLookup};
pub use registry::Registry;
pub use snapshot::SnapshotFiles;
pub use store::{reconcile_on_load, CardStore};
pub use validation::{ValidatedCard, ValidationPipeline};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
