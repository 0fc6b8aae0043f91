//! # Country Sanctions Profile Module
//!
//! ## Purpose
//! Keyed lookup of country-level sanctions posture (OFAC programs, embargo
//! type, EAR country groups, ITAR status) for the screening engine's
//! country checks. This is a plain cached table, not a full-text index.
//!
//! ## Input/Output Specification
//! - **Input**: ISO 3166-1 alpha-2 codes or free-text country names
//! - **Output**: Cloned `CountrySanctionsProfile` values; misses are `None`
//! - **Source**: Built-in profiles, or a JSON file when one is configured
//!
//! ## Key Features
//! - Lazy population on first read, then served from the cache
//! - Explicit `reload()` swaps the whole table atomically; the previous
//!   table keeps serving if a reload fails
//! - `by_name` is a case-insensitive substring match returning the first
//!   hit in country-code order

use crate::config::CountryConfig;
use crate::errors::{Result, ScreenError};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// How broadly a country is embargoed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbargoType {
    #[default]
    None,
    Targeted,
    Comprehensive,
}

/// Sanctions and export-control posture of one country
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountrySanctionsProfile {
    /// ISO 3166-1 alpha-2 code, the primary key
    pub country_code: String,
    pub country_name: String,
    /// Active OFAC sanctions program tags
    #[serde(default)]
    pub ofac_programs: Vec<String>,
    #[serde(default)]
    pub embargo_type: EmbargoType,
    /// EAR country group memberships (A:1, D:1, E:1, ...)
    #[serde(default)]
    pub ear_country_groups: Vec<String>,
    /// Whether the country is an ITAR proscribed destination (22 CFR 126.1)
    #[serde(default)]
    pub itar_restricted: bool,
    #[serde(default)]
    pub arms_embargo: bool,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub key_restrictions: Vec<String>,
    #[serde(default)]
    pub notes: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ProfileFile {
    #[serde(default)]
    countries: BTreeMap<String, serde_json::Value>,
}

/// Cached country profile table with an explicit reload path
pub struct CountryProfileStore {
    source_path: Option<PathBuf>,
    table: RwLock<Option<Arc<BTreeMap<String, CountrySanctionsProfile>>>>,
}

impl CountryProfileStore {
    /// Create the store; no data is read until the first lookup
    pub fn new(config: &CountryConfig) -> Self {
        Self {
            source_path: config.profile_path.clone(),
            table: RwLock::new(None),
        }
    }

    /// Exact lookup by upper-cased ISO code
    pub fn by_code(&self, code: &str) -> Result<Option<CountrySanctionsProfile>> {
        let code = code.trim().to_uppercase();
        if code.is_empty() {
            return Ok(None);
        }
        Ok(self.table()?.get(&code).cloned())
    }

    /// Case-insensitive substring match against country names, returning
    /// the first hit in country-code order. With several partial matches
    /// this is deterministic but not necessarily the most specific entry.
    pub fn by_name(&self, name: &str) -> Result<Option<CountrySanctionsProfile>> {
        let needle = name.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(None);
        }
        let table = self.table()?;
        for profile in table.values() {
            if profile.country_name.to_lowercase().contains(&needle) {
                return Ok(Some(profile.clone()));
            }
        }
        Ok(None)
    }

    /// Resolve a code or a name: two-letter inputs try the code table
    /// first, then everything falls back to the name match
    pub fn lookup(&self, code_or_name: &str) -> Result<Option<CountrySanctionsProfile>> {
        let trimmed = code_or_name.trim();
        if trimmed.len() == 2 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            if let Some(profile) = self.by_code(trimmed)? {
                return Ok(Some(profile));
            }
        }
        self.by_name(trimmed)
    }

    /// Rebuild the table from the configured source and swap it in,
    /// returning the new profile count. A failed rebuild leaves the
    /// current table in place.
    pub fn reload(&self) -> Result<usize> {
        let rebuilt = Arc::new(self.build_table()?);
        let count = rebuilt.len();
        *self.table.write() = Some(rebuilt);
        tracing::info!("Reloaded {} country sanctions profiles", count);
        Ok(count)
    }

    /// Number of cached profiles, populating the cache if needed
    pub fn len(&self) -> Result<usize> {
        Ok(self.table()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.table()?.is_empty())
    }

    fn table(&self) -> Result<Arc<BTreeMap<String, CountrySanctionsProfile>>> {
        if let Some(table) = self.table.read().as_ref() {
            return Ok(Arc::clone(table));
        }

        let mut guard = self.table.write();
        if let Some(table) = guard.as_ref() {
            return Ok(Arc::clone(table));
        }
        let built = Arc::new(self.build_table()?);
        tracing::info!("Loaded {} country sanctions profiles", built.len());
        *guard = Some(Arc::clone(&built));
        Ok(built)
    }

    fn build_table(&self) -> Result<BTreeMap<String, CountrySanctionsProfile>> {
        match &self.source_path {
            Some(path) => load_profile_file(path),
            None => Ok(builtin_profiles()),
        }
    }
}

/// Parse a `{"countries": {code: profile}}` JSON file. Entries that fail to
/// parse are logged and skipped; an unreadable or malformed file is an
/// error for the whole lookup.
fn load_profile_file(path: &Path) -> Result<BTreeMap<String, CountrySanctionsProfile>> {
    let content = std::fs::read_to_string(path).map_err(|e| ScreenError::Config {
        message: format!("Failed to read country profile file {:?}: {}", path, e),
    })?;
    let file: ProfileFile = serde_json::from_str(&content)?;

    let mut table = BTreeMap::new();
    for (code, value) in file.countries {
        match serde_json::from_value::<CountrySanctionsProfile>(value) {
            Ok(profile) => {
                table.insert(code.to_uppercase(), profile);
            }
            Err(e) => {
                tracing::warn!("Skipping country profile '{}': {}", code, e);
            }
        }
    }
    Ok(table)
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Profiles for the countries most often screened against, matching the
/// published OFAC/BIS posture at the time of writing
fn builtin_profiles() -> BTreeMap<String, CountrySanctionsProfile> {
    let profiles = [
        CountrySanctionsProfile {
            country_code: "IR".to_string(),
            country_name: "Iran".to_string(),
            ofac_programs: strings(&["IRAN", "IRAN-TRA", "IRAN-HR", "IFSR", "IRGC"]),
            embargo_type: EmbargoType::Comprehensive,
            ear_country_groups: strings(&["D:1", "D:3", "D:4", "E:1"]),
            itar_restricted: true,
            arms_embargo: true,
            summary: "Iran is subject to comprehensive U.S. sanctions administered by OFAC \
                      and extensive export controls under EAR and ITAR."
                .to_string(),
            key_restrictions: strings(&[
                "Virtually all exports and reexports require a license",
                "License applications generally denied under policy of denial",
                "ITAR proscribed destination - no defense articles or services",
                "Financial transactions heavily restricted",
            ]),
            notes: strings(&[
                "Some humanitarian exceptions may apply",
                "Iran Human Rights sanctions target specific officials",
            ]),
        },
        CountrySanctionsProfile {
            country_code: "KP".to_string(),
            country_name: "North Korea".to_string(),
            ofac_programs: strings(&["DPRK", "DPRK2", "DPRK3", "DPRK4"]),
            embargo_type: EmbargoType::Comprehensive,
            ear_country_groups: strings(&["D:1", "D:3", "D:4", "E:1"]),
            itar_restricted: true,
            arms_embargo: true,
            summary: "North Korea (DPRK) is subject to the most restrictive U.S. sanctions \
                      regime."
                .to_string(),
            key_restrictions: strings(&[
                "Complete trade embargo",
                "All EAR-controlled items require license (presumption of denial)",
                "ITAR proscribed destination",
                "UN sanctions also apply",
            ]),
            notes: strings(&["Limited humanitarian exceptions"]),
        },
        CountrySanctionsProfile {
            country_code: "CU".to_string(),
            country_name: "Cuba".to_string(),
            ofac_programs: strings(&["CUBA"]),
            embargo_type: EmbargoType::Comprehensive,
            ear_country_groups: strings(&["D:1", "E:1", "E:2"]),
            itar_restricted: true,
            arms_embargo: true,
            summary: "Cuba is subject to comprehensive U.S. economic sanctions under the \
                      Cuban embargo."
                .to_string(),
            key_restrictions: strings(&[
                "General prohibition on trade and financial transactions",
                "Export controls under both EAR and OFAC regulations",
                "ITAR proscribed destination",
            ]),
            notes: strings(&[
                "Some people-to-people travel exceptions",
                "Certain telecom equipment exceptions available",
            ]),
        },
        CountrySanctionsProfile {
            country_code: "SY".to_string(),
            country_name: "Syria".to_string(),
            ofac_programs: strings(&["SYRIA"]),
            embargo_type: EmbargoType::Comprehensive,
            ear_country_groups: strings(&["D:1", "D:3", "E:1"]),
            itar_restricted: true,
            arms_embargo: true,
            summary: "Syria is subject to comprehensive U.S. sanctions including the Syria \
                      Accountability Act."
                .to_string(),
            key_restrictions: strings(&[
                "Broad prohibition on exports",
                "License requirements for most items",
                "ITAR proscribed destination",
                "Designated pursuant to multiple sanctions programs",
            ]),
            notes: strings(&["Limited humanitarian exceptions may apply"]),
        },
        CountrySanctionsProfile {
            country_code: "RU".to_string(),
            country_name: "Russia".to_string(),
            ofac_programs: strings(&["RUSSIA-EO14024", "UKRAINE-EO13660", "RUSSIA"]),
            embargo_type: EmbargoType::Targeted,
            ear_country_groups: strings(&["D:1", "D:4", "D:5"]),
            itar_restricted: true,
            arms_embargo: true,
            summary: "Russia is subject to extensive targeted sanctions and export controls \
                      following its invasion of Ukraine."
                .to_string(),
            key_restrictions: strings(&[
                "Comprehensive export controls on technology, especially semiconductors",
                "Entity List designations for hundreds of Russian entities",
                "SDN designations for Russian government officials and oligarchs",
                "Restrictions on luxury goods",
                "ITAR proscribed destination",
            ]),
            notes: strings(&[
                "Sanctions regime has expanded significantly since February 2022",
                "Industry-specific guidance available from BIS and OFAC",
            ]),
        },
        CountrySanctionsProfile {
            country_code: "BY".to_string(),
            country_name: "Belarus".to_string(),
            ofac_programs: strings(&["BELARUS"]),
            embargo_type: EmbargoType::Targeted,
            ear_country_groups: strings(&["D:1", "D:4"]),
            itar_restricted: true,
            arms_embargo: true,
            summary: "Belarus is subject to extensive targeted sanctions due to support for \
                      Russia's actions in Ukraine."
                .to_string(),
            key_restrictions: strings(&[
                "Export controls aligned with Russia restrictions",
                "SDN designations for Lukashenko regime officials",
                "Technology restrictions similar to Russia",
            ]),
            notes: strings(&["Sanctions expanded in coordination with Russia measures"]),
        },
        CountrySanctionsProfile {
            country_code: "CN".to_string(),
            country_name: "China".to_string(),
            ofac_programs: strings(&["CMIC", "NS-CMIC"]),
            embargo_type: EmbargoType::Targeted,
            ear_country_groups: strings(&["D:1", "D:3", "D:4", "D:5"]),
            itar_restricted: false,
            arms_embargo: true,
            summary: "China is subject to targeted export controls, especially on advanced \
                      technology, and growing sanctions."
                .to_string(),
            key_restrictions: strings(&[
                "Strict controls on advanced semiconductors and chip manufacturing equipment",
                "Entity List includes many Chinese companies (Huawei, SMIC, etc.)",
                "Military End-User controls (MEU List)",
                "U.S. arms embargo since 1989",
            ]),
            notes: strings(&[
                "Not an ITAR proscribed country, but significant restrictions",
                "Controls tightening on AI and quantum technology",
            ]),
        },
        CountrySanctionsProfile {
            country_code: "VE".to_string(),
            country_name: "Venezuela".to_string(),
            ofac_programs: strings(&["VENEZUELA", "VENEZUELA-EO13692"]),
            embargo_type: EmbargoType::Targeted,
            ear_country_groups: strings(&["D:1", "D:4"]),
            itar_restricted: false,
            arms_embargo: true,
            summary: "Venezuela is subject to targeted sanctions on the oil sector and \
                      government officials."
                .to_string(),
            key_restrictions: strings(&[
                "Oil sector restrictions (PDVSA)",
                "SDN designations for Maduro regime officials",
                "Financial restrictions",
            ]),
            notes: strings(&["Some general licenses available for certain activities"]),
        },
        CountrySanctionsProfile {
            country_code: "DE".to_string(),
            country_name: "Germany".to_string(),
            ofac_programs: Vec::new(),
            embargo_type: EmbargoType::None,
            ear_country_groups: strings(&["A:1", "A:5", "B"]),
            itar_restricted: false,
            arms_embargo: false,
            summary: "Germany is a close U.S. ally with favorable export control treatment."
                .to_string(),
            key_restrictions: strings(&[
                "Most commercial exports permitted under license exceptions",
                "Some items may require license based on ECCN",
            ]),
            notes: strings(&["NATO ally with defense trade cooperation agreements"]),
        },
        CountrySanctionsProfile {
            country_code: "JP".to_string(),
            country_name: "Japan".to_string(),
            ofac_programs: Vec::new(),
            embargo_type: EmbargoType::None,
            ear_country_groups: strings(&["A:1", "A:5", "B"]),
            itar_restricted: false,
            arms_embargo: false,
            summary: "Japan is a close U.S. ally with favorable export control treatment."
                .to_string(),
            key_restrictions: strings(&[
                "Most commercial exports permitted under license exceptions",
            ]),
            notes: strings(&["Treaty ally with extensive defense trade cooperation"]),
        },
    ];

    let mut table = BTreeMap::new();
    for profile in profiles {
        table.insert(profile.country_code.clone(), profile);
    }
    table
}
