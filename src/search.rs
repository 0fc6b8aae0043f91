//! # Screening Engine Module
//!
//! ## Purpose
//! Main screening engine that combines indexed phrase matching with a fuzzy
//! fallback scan to find restricted parties by name, alias, or misspelling.
//!
//! ## Input/Output Specification
//! - **Input**: Screening queries (text), target list, filters, threshold
//!   and limit overrides
//! - **Output**: Matches ranked by similarity score, highest first
//! - **Hybrid Strategy**: Indexed phrase hits first, fuzzy scan as fallback
//!
//! ## Key Features
//! - Two-stage search: the full-text index answers literal phrase hits, the
//!   fuzzy scan catches misspellings the index cannot see
//! - Indexed hits are kept regardless of the fuzzy threshold; the threshold
//!   gates only the fallback stage
//! - Country, program, and entity type filters applied identically in both
//!   stages
//! - Threshold and limit overrides clamped to their valid ranges rather
//!   than rejected

use crate::config::EngineConfig;
use crate::country::{CountryProfileStore, CountrySanctionsProfile};
use crate::errors::Result;
use crate::matching;
use crate::records::{EntityType, ListKind, RestrictedPartyRecord};
use crate::store::{IngestReport, RecordStore};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Main screening engine
pub struct ScreeningEngine {
    config: EngineConfig,
    store: RecordStore,
    countries: CountryProfileStore,
}

/// Screening query with parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningQuery {
    /// List to screen against
    pub list: ListKind,
    /// Query text, matched against names and aliases
    pub query: String,
    /// Hard inclusion predicates; they never affect scoring
    #[serde(default)]
    pub filters: SearchFilters,
    /// Similarity floor for the fuzzy stage; the configured default applies
    /// when unset, and out-of-range values are clamped to [0, 1]
    pub fuzzy_threshold: Option<f64>,
    /// Maximum number of matches; the configured default applies when
    /// unset, and the configured maximum caps any override
    pub limit: Option<usize>,
}

/// Equality predicates narrowing which records may match
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchFilters {
    /// Country code match, case-insensitive
    pub country: Option<String>,
    /// Sanctions program tag match, exact
    pub program: Option<String>,
    /// Listed party classification match
    pub entity_type: Option<EntityType>,
}

/// One screening hit against a stored record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SanctionsMatch {
    /// Id of the matched record; resolve via the record store for details
    pub record_id: String,
    /// Similarity between the query and the matched value, in [0, 1]
    pub match_score: f64,
    /// How the match was found
    pub match_type: MatchType,
    /// Which field of the record matched
    pub matched_field: MatchedField,
    /// The stored text the score was computed against
    pub matched_value: String,
}

/// How a match was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// Literal phrase hit from the full-text index
    ExactText,
    /// Fuzzy similarity against the record name
    FuzzyName,
    /// Fuzzy similarity against one of the record's aliases
    Alias,
    /// Partial overlap on secondary fields (addresses, identifiers)
    Partial,
}

/// Record field a match was scored against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchedField {
    Name,
    Alias,
}

impl ScreeningQuery {
    /// Query with default filters, threshold, and limit
    pub fn new(list: ListKind, query: impl Into<String>) -> Self {
        Self {
            list,
            query: query.into(),
            filters: SearchFilters::default(),
            fuzzy_threshold: None,
            limit: None,
        }
    }
}

impl SearchFilters {
    fn matches(&self, record: &RestrictedPartyRecord) -> bool {
        if let Some(country) = &self.country {
            let held = record
                .countries()
                .iter()
                .any(|c| c.eq_ignore_ascii_case(country));
            if !held {
                return false;
            }
        }

        if let Some(program) = &self.program {
            // Program tags are canonical upper-case codes; matching is exact.
            if !record.programs().iter().any(|p| p == program) {
                return false;
            }
        }

        if let Some(entity_type) = self.entity_type {
            if record.entity_type() != entity_type {
                return false;
            }
        }

        true
    }
}

impl ScreeningEngine {
    /// Create a new screening engine from validated configuration
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let store = RecordStore::open(&config.storage)?;
        let countries = CountryProfileStore::new(&config.country);

        tracing::info!(
            "Screening engine ready (default threshold {}, default limit {})",
            config.search.default_fuzzy_threshold,
            config.search.default_limit
        );

        Ok(Self {
            config,
            store,
            countries,
        })
    }

    /// Screen a list with default parameters
    pub fn search(&self, list: ListKind, query: &str) -> Result<Vec<SanctionsMatch>> {
        self.search_with_params(ScreeningQuery::new(list, query))
    }

    /// Screen with detailed parameters
    pub fn search_with_params(&self, query: ScreeningQuery) -> Result<Vec<SanctionsMatch>> {
        let threshold = query
            .fuzzy_threshold
            .unwrap_or(self.config.search.default_fuzzy_threshold)
            .clamp(0.0, 1.0);
        let limit = query
            .limit
            .unwrap_or(self.config.search.default_limit)
            .clamp(1, self.config.search.max_limit);
        let needle = query.query.trim().to_lowercase();

        tracing::debug!(
            "Screening {} for '{}' (threshold {}, limit {})",
            query.list,
            needle,
            threshold,
            limit
        );

        let mut matches = Vec::new();
        let mut seen = HashSet::new();

        // Stage 1: literal phrase hits from the full-text index. The index
        // rank only orders candidate selection; the reported score is always
        // the name similarity. Indexed hits are kept even below the fuzzy
        // threshold, so a token hit with low name similarity can outrank a
        // closer fuzzy match.
        let indexed_cap = limit.saturating_mul(2);
        for hit in self.store.phrase_candidates(query.list, &needle)? {
            if matches.len() >= indexed_cap {
                break;
            }
            let record = match self.store.get(query.list, &hit.id)? {
                Some(record) => record,
                None => {
                    tracing::warn!("Index references missing {} record {}", query.list, hit.id);
                    continue;
                }
            };
            if !query.filters.matches(&record) {
                continue;
            }
            seen.insert(hit.id);
            matches.push(SanctionsMatch {
                record_id: record.id().to_string(),
                match_score: matching::similarity(&needle, record.name()),
                match_type: MatchType::ExactText,
                matched_field: MatchedField::Name,
                matched_value: record.name().to_string(),
            });
        }
        let indexed = matches.len();

        // Stage 2: fuzzy fallback over records the index did not select,
        // only when stage 1 left the limit unfilled. Aliases are checked in
        // declared order and the first one over the threshold wins, not the
        // best one.
        if matches.len() < limit {
            for record in self.store.records(query.list) {
                let record = record?;
                if seen.contains(record.id()) {
                    continue;
                }
                if !query.filters.matches(&record) {
                    continue;
                }

                let name_score = matching::similarity(&needle, record.name());
                if matching::accepts(name_score, threshold) {
                    matches.push(SanctionsMatch {
                        record_id: record.id().to_string(),
                        match_score: name_score,
                        match_type: MatchType::FuzzyName,
                        matched_field: MatchedField::Name,
                        matched_value: record.name().to_string(),
                    });
                    continue;
                }

                for alias in record.aliases() {
                    let alias_score = matching::similarity(&needle, alias);
                    if matching::accepts(alias_score, threshold) {
                        matches.push(SanctionsMatch {
                            record_id: record.id().to_string(),
                            match_score: alias_score,
                            match_type: MatchType::Alias,
                            matched_field: MatchedField::Alias,
                            matched_value: alias.clone(),
                        });
                        break;
                    }
                }
            }
        }

        tracing::debug!(
            "Matched {} records ({} indexed, {} fuzzy) before ranking",
            matches.len(),
            indexed,
            matches.len() - indexed
        );

        // Stable sort keeps index-rank order within equal scores.
        matches.sort_by(|a, b| {
            b.match_score
                .partial_cmp(&a.match_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(limit);

        Ok(matches)
    }

    /// Insert or replace a record
    pub fn upsert(&self, record: &RestrictedPartyRecord) -> Result<()> {
        self.store.upsert(record)
    }

    /// Ingest a batch, collecting per-record validation failures
    pub fn upsert_batch(&self, records: &[RestrictedPartyRecord]) -> Result<IngestReport> {
        self.store.upsert_batch(records)
    }

    /// Fetch a record by id; a miss is `Ok(None)`
    pub fn get(&self, list: ListKind, id: &str) -> Result<Option<RestrictedPartyRecord>> {
        self.store.get(list, id)
    }

    /// Purge one list, or all lists when `list` is `None`
    pub fn clear(&self, list: Option<ListKind>) -> Result<()> {
        self.store.clear(list)
    }

    /// Record count per list
    pub fn stats(&self) -> BTreeMap<ListKind, usize> {
        self.store.stats()
    }

    /// Record counts per source list within the Consolidated Screening List
    pub fn consolidated_source_counts(&self) -> Result<BTreeMap<String, usize>> {
        self.store.consolidated_source_counts()
    }

    /// Resolve a country code or name to its sanctions profile
    pub fn country_lookup(&self, code_or_name: &str) -> Result<Option<CountrySanctionsProfile>> {
        self.countries.lookup(code_or_name)
    }

    /// Rebuild the country profile table from its configured source
    pub fn reload_country_profiles(&self) -> Result<usize> {
        self.countries.reload()
    }

    /// Direct access to the record store
    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Direct access to the country profile store
    pub fn country_profiles(&self) -> &CountryProfileStore {
        &self.countries
    }

    /// Flush storage to disk
    pub fn flush(&self) -> Result<()> {
        self.store.flush()
    }
}
