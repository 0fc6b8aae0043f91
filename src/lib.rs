//! # Restricted-Party Screening Engine
//!
//! ## Overview
//! This library implements a screening engine for U.S. export-control and
//! sanctions watchlists. It stores normalized restricted-party records,
//! keeps a full-text index transactionally consistent with them, and
//! answers screening queries with a two-stage search: indexed phrase
//! matching first, fuzzy name matching as a fallback for misspellings.
//!
//! ## Architecture
//! The system is composed of several key modules:
//! - `records`: Typed records for the four supported watchlists
//! - `store`: Persistent record store with the atomic store+index write path
//! - `index`: Positional full-text index over names and aliases
//! - `matching`: Token-set similarity scoring for fuzzy comparison
//! - `search`: Two-stage screening engine combining index and fuzzy scan
//! - `country`: Country sanctions profile lookup with explicit reload
//! - `config`: Configuration management and settings
//! - `errors`: Centralized error handling and types
//!
//! ## Input/Output Specification
//! - **Input**: Normalized watchlist records, screening queries (text)
//! - **Output**: Ranked matches with score, match type, and matched value
//! - **Guarantee**: A stored record and its index entries never diverge
//!
//! ## Usage
//! ```rust,no_run
//! use restricted_party_screen::{EngineConfig, ListKind, ScreeningEngine};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EngineConfig::from_file("screening.toml")?;
//!     let engine = ScreeningEngine::new(config)?;
//!     let matches = engine.search(ListKind::Sdn, "huawei technologies")?;
//!     println!("Found {} matches", matches.len());
//!     Ok(())
//! }
//! ```

// Core modules
pub mod config;
pub mod country;
pub mod errors;
pub mod index;
pub mod matching;
pub mod records;
pub mod search;
pub mod store;

// Re-exports for convenience
pub use config::{CountryConfig, EngineConfig, SearchConfig, StorageConfig};
pub use country::{CountryProfileStore, CountrySanctionsProfile, EmbargoType};
pub use errors::{Result, ScreenError};
pub use records::{
    ConsolidatedScreeningEntry, DeniedPersonEntry, EntityListEntry, EntityType, IdDocument,
    ListKind, RestrictedPartyRecord, SdnEntry,
};
pub use search::{
    MatchType, MatchedField, SanctionsMatch, ScreeningEngine, ScreeningQuery, SearchFilters,
};
pub use store::{IngestReport, RecordStore, RejectedRecord};
