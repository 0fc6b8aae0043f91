//! # Watchlist Record Model
//!
//! ## Purpose
//! Typed records for the four restricted-party lists handled by the engine:
//! the BIS Entity List, the OFAC SDN List, the BIS Denied Persons List, and
//! the Consolidated Screening List.
//!
//! ## Input/Output Specification
//! - **Input**: Already-parsed, normalized entries from ingestion collaborators
//! - **Output**: One sum type with a common accessor surface for indexing,
//!   matching, and filtering
//! - **Invariants**: `id` is unique within its list and never empty; `name`
//!   is never empty; re-ingesting an `id` replaces the prior record in full
//!
//! ## Key Features
//! - Tagged union over the four list schemas instead of duck typing
//! - Common accessors (`id`, `name`, `aliases`, `countries`, `programs`)
//!   hiding per-list field differences
//! - Validation shared by single and batch ingestion

use crate::errors::{Result, ScreenError};
use crate::validation_error;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The restricted-party lists the engine screens against
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    /// BIS Entity List (Supplement No. 4 to Part 744 of the EAR)
    EntityList,
    /// OFAC Specially Designated Nationals List
    Sdn,
    /// BIS Denied Persons List
    DeniedPersons,
    /// Consolidated Screening List (union of U.S. screening lists)
    Consolidated,
}

impl ListKind {
    /// All lists, in stable order
    pub const ALL: [ListKind; 4] = [
        ListKind::EntityList,
        ListKind::Sdn,
        ListKind::DeniedPersons,
        ListKind::Consolidated,
    ];

    /// Storage tree holding the records of this list
    pub(crate) fn record_tree(self) -> &'static str {
        match self {
            ListKind::EntityList => "entity_list",
            ListKind::Sdn => "sdn_list",
            ListKind::DeniedPersons => "denied_persons",
            ListKind::Consolidated => "csl",
        }
    }

    /// Storage tree holding the full-text postings of this list
    pub(crate) fn postings_tree(self) -> &'static str {
        match self {
            ListKind::EntityList => "entity_list_fts",
            ListKind::Sdn => "sdn_list_fts",
            ListKind::DeniedPersons => "denied_persons_fts",
            ListKind::Consolidated => "csl_fts",
        }
    }

    /// Short label used in logs and stats
    pub fn label(self) -> &'static str {
        match self {
            ListKind::EntityList => "entity_list",
            ListKind::Sdn => "sdn",
            ListKind::DeniedPersons => "denied_persons",
            ListKind::Consolidated => "csl",
        }
    }
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classification of a listed party
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Individual,
    Entity,
    Vessel,
    Aircraft,
}

impl EntityType {
    pub fn label(self) -> &'static str {
        match self {
            EntityType::Individual => "individual",
            EntityType::Entity => "entity",
            EntityType::Vessel => "vessel",
            EntityType::Aircraft => "aircraft",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EntityType {
    type Err = ScreenError;

    /// Parse the lowercase labels used by the source feeds. There is no safe
    /// default for an unknown label, so it is reported instead of clamped.
    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "individual" => Ok(EntityType::Individual),
            "entity" => Ok(EntityType::Entity),
            "vessel" => Ok(EntityType::Vessel),
            "aircraft" => Ok(EntityType::Aircraft),
            other => Err(ScreenError::Query {
                parameter: "entity_type".to_string(),
                reason: format!(
                    "unknown entity type '{}' (expected individual, entity, vessel, or aircraft)",
                    other
                ),
            }),
        }
    }
}

/// Identity document attached to an SDN entry (passports, national IDs)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdDocument {
    pub id_type: String,
    pub id_number: String,
    #[serde(default)]
    pub country: Option<String>,
}

/// BIS Entity List entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityListEntry {
    /// Stable identifier, the upsert key
    pub id: String,
    /// Primary display name
    pub name: String,
    /// Known aliases, in the order the source lists them
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub addresses: Vec<String>,
    /// Country of the listed party
    pub country: String,
    /// License requirement text from the Federal Register entry
    #[serde(default)]
    pub license_requirement: String,
    /// License review policy (typically a presumption of denial)
    #[serde(default)]
    pub license_policy: String,
    #[serde(default)]
    pub federal_register_citation: String,
    #[serde(default)]
    pub effective_date: Option<NaiveDate>,
    /// Whether the standard order terms apply
    #[serde(default)]
    pub standard_order: bool,
    #[serde(default)]
    pub remarks: String,
}

/// OFAC SDN List entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SdnEntry {
    pub id: String,
    pub name: String,
    pub entity_type: EntityType,
    /// OFAC sanctions program tags (SDGT, IRAN, ...)
    #[serde(default)]
    pub programs: Vec<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub addresses: Vec<String>,
    #[serde(default)]
    pub ids: Vec<IdDocument>,
    #[serde(default)]
    pub nationalities: Vec<String>,
    #[serde(default)]
    pub dates_of_birth: Vec<String>,
    #[serde(default)]
    pub places_of_birth: Vec<String>,
    #[serde(default)]
    pub remarks: String,
}

/// BIS Denied Persons List entry. The source feed carries no aliases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeniedPersonEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub addresses: Vec<String>,
    #[serde(default)]
    pub effective_date: Option<NaiveDate>,
    #[serde(default)]
    pub expiration_date: Option<NaiveDate>,
    #[serde(default)]
    pub standard_order: bool,
    #[serde(default)]
    pub federal_register_citation: String,
    #[serde(default)]
    pub remarks: String,
}

/// Consolidated Screening List entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedScreeningEntry {
    pub id: String,
    pub name: String,
    pub entity_type: EntityType,
    /// Human-readable source list name as published
    #[serde(default)]
    pub source_list: String,
    /// Canonical source list code (`sdn`, `entity_list`, `meu_list`, ...)
    pub source_list_code: String,
    #[serde(default)]
    pub programs: Vec<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub addresses: Vec<String>,
    #[serde(default)]
    pub countries: Vec<String>,
    #[serde(default)]
    pub remarks: String,
}

/// One record from any of the four restricted-party lists.
///
/// The variants keep their list-specific payloads; everything the index,
/// matcher, and filters need goes through the common accessors below.
/// Entity List and Denied Persons entries carry no type column in the source
/// feeds and are treated as organizational records (`EntityType::Entity`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RestrictedPartyRecord {
    EntityList(EntityListEntry),
    Sdn(SdnEntry),
    DeniedPersons(DeniedPersonEntry),
    Consolidated(ConsolidatedScreeningEntry),
}

impl RestrictedPartyRecord {
    /// Stable identifier, unique within the record's list
    pub fn id(&self) -> &str {
        match self {
            RestrictedPartyRecord::EntityList(e) => &e.id,
            RestrictedPartyRecord::Sdn(e) => &e.id,
            RestrictedPartyRecord::DeniedPersons(e) => &e.id,
            RestrictedPartyRecord::Consolidated(e) => &e.id,
        }
    }

    /// Primary display name
    pub fn name(&self) -> &str {
        match self {
            RestrictedPartyRecord::EntityList(e) => &e.name,
            RestrictedPartyRecord::Sdn(e) => &e.name,
            RestrictedPartyRecord::DeniedPersons(e) => &e.name,
            RestrictedPartyRecord::Consolidated(e) => &e.name,
        }
    }

    /// Aliases in declared order; empty for Denied Persons entries
    pub fn aliases(&self) -> &[String] {
        match self {
            RestrictedPartyRecord::EntityList(e) => &e.aliases,
            RestrictedPartyRecord::Sdn(e) => &e.aliases,
            RestrictedPartyRecord::DeniedPersons(_) => &[],
            RestrictedPartyRecord::Consolidated(e) => &e.aliases,
        }
    }

    pub fn addresses(&self) -> &[String] {
        match self {
            RestrictedPartyRecord::EntityList(e) => &e.addresses,
            RestrictedPartyRecord::Sdn(e) => &e.addresses,
            RestrictedPartyRecord::DeniedPersons(e) => &e.addresses,
            RestrictedPartyRecord::Consolidated(e) => &e.addresses,
        }
    }

    /// Countries associated with the record: the single listed country for
    /// Entity List entries, nationalities for SDN entries, none for Denied
    /// Persons entries
    pub fn countries(&self) -> &[String] {
        match self {
            RestrictedPartyRecord::EntityList(e) => std::slice::from_ref(&e.country),
            RestrictedPartyRecord::Sdn(e) => &e.nationalities,
            RestrictedPartyRecord::DeniedPersons(_) => &[],
            RestrictedPartyRecord::Consolidated(e) => &e.countries,
        }
    }

    /// Sanctions program tags; empty for lists that carry none
    pub fn programs(&self) -> &[String] {
        match self {
            RestrictedPartyRecord::EntityList(_) => &[],
            RestrictedPartyRecord::Sdn(e) => &e.programs,
            RestrictedPartyRecord::DeniedPersons(_) => &[],
            RestrictedPartyRecord::Consolidated(e) => &e.programs,
        }
    }

    pub fn entity_type(&self) -> EntityType {
        match self {
            RestrictedPartyRecord::EntityList(_) => EntityType::Entity,
            RestrictedPartyRecord::Sdn(e) => e.entity_type,
            RestrictedPartyRecord::DeniedPersons(_) => EntityType::Entity,
            RestrictedPartyRecord::Consolidated(e) => e.entity_type,
        }
    }

    /// The list this record belongs to
    pub fn list_kind(&self) -> ListKind {
        match self {
            RestrictedPartyRecord::EntityList(_) => ListKind::EntityList,
            RestrictedPartyRecord::Sdn(_) => ListKind::Sdn,
            RestrictedPartyRecord::DeniedPersons(_) => ListKind::DeniedPersons,
            RestrictedPartyRecord::Consolidated(_) => ListKind::Consolidated,
        }
    }

    pub fn remarks(&self) -> &str {
        match self {
            RestrictedPartyRecord::EntityList(e) => &e.remarks,
            RestrictedPartyRecord::Sdn(e) => &e.remarks,
            RestrictedPartyRecord::DeniedPersons(e) => &e.remarks,
            RestrictedPartyRecord::Consolidated(e) => &e.remarks,
        }
    }

    /// Check the ingestion invariants before the record is stored
    pub fn validate(&self) -> Result<()> {
        if self.id().trim().is_empty() {
            return Err(validation_error!("id", "record id must not be empty"));
        }
        if self.name().trim().is_empty() {
            return Err(validation_error!("name", "record name must not be empty"));
        }
        Ok(())
    }
}
