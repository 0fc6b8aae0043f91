//! # Record Store Module
//!
//! ## Purpose
//! Persists normalized restricted-party records in an embedded database,
//! one record tree and one postings tree per list, and keeps both halves in
//! step through a single transactional write path.
//!
//! ## Input/Output Specification
//! - **Input**: Validated records from ingestion collaborators
//! - **Output**: Idempotent upserts, id lookups, full-list scans, purges,
//!   per-list counts
//! - **Storage**: Sled embedded database, bincode-encoded values
//!
//! ## Key Features
//! - Record write and derived index rows applied as one atomic unit; a
//!   failure rolls back both halves rather than leaving a half-applied state
//! - Batch ingestion collects per-record validation failures and continues,
//!   reporting them instead of aborting the batch
//! - Purging a list removes its records and postings in one transaction

use crate::config::StorageConfig;
use crate::errors::{Result, ScreenError};
use crate::index::{self, PhraseHit};
use crate::records::{ListKind, RestrictedPartyRecord};
use serde::{Deserialize, Serialize};
use sled::transaction::{ConflictableTransactionError, TransactionError, TransactionResult};
use sled::Transactional;
use std::collections::BTreeMap;

/// Persistent store for all four restricted-party lists
pub struct RecordStore {
    db: sled::Db,
    lists: BTreeMap<ListKind, ListTrees>,
}

struct ListTrees {
    records: sled::Tree,
    postings: sled::Tree,
}

/// Outcome of a batch ingestion
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestReport {
    /// Records stored (and indexed) successfully
    pub accepted: usize,
    /// Records rejected by validation, with the reason for each
    pub rejected: Vec<RejectedRecord>,
}

/// A record the batch skipped
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectedRecord {
    /// Position of the record in the submitted batch
    pub index: usize,
    /// The record's id as submitted; may be empty when the id itself was
    /// the invalid field
    pub id: String,
    pub reason: String,
}

impl RecordStore {
    /// Open (or create) the store under the configured data directory
    pub fn open(config: &StorageConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;
        let db = sled::open(&config.data_dir)?;

        let mut lists = BTreeMap::new();
        for kind in ListKind::ALL {
            let records = db.open_tree(kind.record_tree())?;
            let postings = db.open_tree(kind.postings_tree())?;
            lists.insert(kind, ListTrees { records, postings });
        }

        let store = Self { db, lists };
        let total: usize = ListKind::ALL
            .iter()
            .map(|kind| store.trees(*kind).records.len())
            .sum();
        tracing::info!(
            "Record store opened at {:?} with {} records",
            config.data_dir,
            total
        );
        Ok(store)
    }

    fn trees(&self, kind: ListKind) -> &ListTrees {
        // Every ListKind is inserted in open()
        &self.lists[&kind]
    }

    /// Insert or fully replace a record by id
    pub fn upsert(&self, record: &RestrictedPartyRecord) -> Result<()> {
        record.validate()?;
        self.write_record(record)
    }

    /// Upsert a batch, tolerating per-record validation failures. Storage
    /// failures still abort: continuing past them would hide lost records.
    pub fn upsert_batch(&self, records: &[RestrictedPartyRecord]) -> Result<IngestReport> {
        let mut report = IngestReport::default();

        for (position, record) in records.iter().enumerate() {
            if let Err(reason) = record.validate() {
                tracing::warn!("Rejected record at batch index {}: {}", position, reason);
                report.rejected.push(RejectedRecord {
                    index: position,
                    id: record.id().to_string(),
                    reason: reason.to_string(),
                });
                continue;
            }
            self.write_record(record)?;
            report.accepted += 1;
        }

        self.db.flush()?;
        tracing::info!(
            "Batch ingest stored {} records, rejected {}",
            report.accepted,
            report.rejected.len()
        );
        Ok(report)
    }

    /// Apply the record write and its index rows as one atomic unit
    fn write_record(&self, record: &RestrictedPartyRecord) -> Result<()> {
        let kind = record.list_kind();
        let trees = self.trees(kind);
        let id = record.id().to_string();

        let value = bincode::serialize(record)?;
        let rows = index::build_rows(record).map_err(|e| ScreenError::IndexConsistency {
            id: id.clone(),
            reason: format!("could not derive index rows: {}", e),
        })?;

        let outcome: TransactionResult<(), ScreenError> = (&trees.records, &trees.postings)
            .transaction(|(records, postings)| {
                // Unindex the prior version first so a replaced alias does
                // not keep matching.
                if let Some(raw) = records.get(id.as_bytes())? {
                    let prior: RestrictedPartyRecord =
                        bincode::deserialize(&raw).map_err(|e| {
                            ConflictableTransactionError::Abort(ScreenError::IndexConsistency {
                                id: id.clone(),
                                reason: format!("stored record is unreadable: {}", e),
                            })
                        })?;
                    for key in index::row_keys(&prior) {
                        postings.remove(key)?;
                    }
                }

                records.insert(id.as_bytes(), value.as_slice())?;
                for (key, positions) in &rows.postings {
                    postings.insert(key.as_slice(), positions.as_slice())?;
                }
                postings.insert(rows.token_count.0.as_slice(), rows.token_count.1.as_slice())?;
                Ok(())
            });

        match outcome {
            Ok(()) => {
                tracing::debug!("Stored {} record {}", kind, id);
                Ok(())
            }
            Err(TransactionError::Abort(e)) => {
                tracing::error!("Upsert of {} record {} rolled back: {}", kind, id, e);
                Err(e)
            }
            Err(TransactionError::Storage(e)) => Err(ScreenError::Storage(e)),
        }
    }

    /// Fetch a record by id; a miss is `Ok(None)`
    pub fn get(&self, kind: ListKind, id: &str) -> Result<Option<RestrictedPartyRecord>> {
        match self.trees(kind).records.get(id.as_bytes())? {
            Some(raw) => Ok(Some(bincode::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// Iterate every record of a list in id order
    pub fn records(
        &self,
        kind: ListKind,
    ) -> impl Iterator<Item = Result<RestrictedPartyRecord>> + '_ {
        self.trees(kind).records.iter().map(|row| {
            let (_, value) = row?;
            Ok(bincode::deserialize(&value)?)
        })
    }

    /// Purge one list, or all lists when `kind` is `None`, together with
    /// their index entries
    pub fn clear(&self, kind: Option<ListKind>) -> Result<()> {
        match kind {
            Some(kind) => self.clear_list(kind),
            None => {
                for kind in ListKind::ALL {
                    self.clear_list(kind)?;
                }
                Ok(())
            }
        }
    }

    fn clear_list(&self, kind: ListKind) -> Result<()> {
        let trees = self.trees(kind);
        let record_keys: Vec<sled::IVec> = trees
            .records
            .iter()
            .keys()
            .collect::<std::result::Result<_, sled::Error>>()?;
        let posting_keys: Vec<sled::IVec> = trees
            .postings
            .iter()
            .keys()
            .collect::<std::result::Result<_, sled::Error>>()?;

        let outcome: TransactionResult<(), ScreenError> = (&trees.records, &trees.postings)
            .transaction(|(records, postings)| {
                for key in &record_keys {
                    records.remove(key.as_ref())?;
                }
                for key in &posting_keys {
                    postings.remove(key.as_ref())?;
                }
                Ok(())
            });

        match outcome {
            Ok(()) => {
                tracing::info!("Cleared {} list ({} records)", kind, record_keys.len());
                Ok(())
            }
            Err(TransactionError::Abort(e)) => Err(e),
            Err(TransactionError::Storage(e)) => Err(ScreenError::Storage(e)),
        }
    }

    /// Record count per list
    pub fn stats(&self) -> BTreeMap<ListKind, usize> {
        ListKind::ALL
            .iter()
            .map(|kind| (*kind, self.trees(*kind).records.len()))
            .collect()
    }

    /// Record counts per source list code within the Consolidated Screening
    /// List
    pub fn consolidated_source_counts(&self) -> Result<BTreeMap<String, usize>> {
        let mut counts = BTreeMap::new();
        for record in self.records(ListKind::Consolidated) {
            if let RestrictedPartyRecord::Consolidated(entry) = record? {
                *counts.entry(entry.source_list_code).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    /// Ranked Stage-A candidates for a literal phrase
    pub(crate) fn phrase_candidates(&self, kind: ListKind, text: &str) -> Result<Vec<PhraseHit>> {
        index::phrase_query(&self.trees(kind).postings, text)
    }

    /// Flush dirty pages to disk
    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{EntityListEntry, EntityType, SdnEntry};
    use std::path::PathBuf;

    fn open_store() -> (tempfile::TempDir, RecordStore) {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            data_dir: PathBuf::from(dir.path()),
        };
        let store = RecordStore::open(&config).unwrap();
        (dir, store)
    }

    fn entity_record(id: &str, name: &str, aliases: &[&str]) -> RestrictedPartyRecord {
        RestrictedPartyRecord::EntityList(EntityListEntry {
            id: id.to_string(),
            name: name.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            addresses: Vec::new(),
            country: "CN".to_string(),
            license_requirement: String::new(),
            license_policy: String::new(),
            federal_register_citation: String::new(),
            effective_date: None,
            standard_order: false,
            remarks: String::new(),
        })
    }

    fn sdn_record(id: &str, name: &str) -> RestrictedPartyRecord {
        RestrictedPartyRecord::Sdn(SdnEntry {
            id: id.to_string(),
            name: name.to_string(),
            entity_type: EntityType::Individual,
            programs: vec!["SDGT".to_string()],
            aliases: Vec::new(),
            addresses: Vec::new(),
            ids: Vec::new(),
            nationalities: vec!["IR".to_string()],
            dates_of_birth: Vec::new(),
            places_of_birth: Vec::new(),
            remarks: String::new(),
        })
    }

    #[test]
    fn test_upsert_get_round_trip() {
        let (_dir, store) = open_store();
        let record = entity_record("EL-1", "Huawei Technologies", &["Huawei"]);
        store.upsert(&record).unwrap();

        let loaded = store.get(ListKind::EntityList, "EL-1").unwrap().unwrap();
        assert_eq!(loaded, record);
        assert!(store.get(ListKind::EntityList, "EL-404").unwrap().is_none());
        assert!(store.get(ListKind::Sdn, "EL-1").unwrap().is_none());
    }

    #[test]
    fn test_upsert_replaces_and_reindexes() {
        let (_dir, store) = open_store();
        store
            .upsert(&entity_record("EL-1", "Huawei Technologies", &["HiSilicon"]))
            .unwrap();
        assert_eq!(
            store
                .phrase_candidates(ListKind::EntityList, "hisilicon")
                .unwrap()
                .len(),
            1
        );

        // Replacing the record must drop the old alias from the index.
        store
            .upsert(&entity_record("EL-1", "Huawei Technologies", &["Futurewei"]))
            .unwrap();
        assert!(store
            .phrase_candidates(ListKind::EntityList, "hisilicon")
            .unwrap()
            .is_empty());
        assert_eq!(
            store
                .phrase_candidates(ListKind::EntityList, "futurewei")
                .unwrap()
                .len(),
            1
        );
        assert_eq!(store.stats()[&ListKind::EntityList], 1);
    }

    #[test]
    fn test_upsert_rejects_invalid_record() {
        let (_dir, store) = open_store();
        let err = store.upsert(&entity_record("EL-1", " ", &[])).unwrap_err();
        assert!(matches!(err, ScreenError::Validation { .. }));
        assert_eq!(store.stats()[&ListKind::EntityList], 0);
    }

    #[test]
    fn test_batch_reports_rejections_and_continues() {
        let (_dir, store) = open_store();
        let batch = vec![
            entity_record("EL-1", "Huawei Technologies", &[]),
            entity_record("", "No Id Corp", &[]),
            entity_record("EL-2", "SMIC", &[]),
        ];
        let report = store.upsert_batch(&batch).unwrap();
        assert_eq!(report.accepted, 2);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].index, 1);
        assert_eq!(store.stats()[&ListKind::EntityList], 2);
    }

    #[test]
    fn test_clear_one_list_leaves_others() {
        let (_dir, store) = open_store();
        store.upsert(&entity_record("EL-1", "Huawei", &[])).unwrap();
        store.upsert(&sdn_record("SDN-1", "Example Person")).unwrap();

        store.clear(Some(ListKind::EntityList)).unwrap();
        assert_eq!(store.stats()[&ListKind::EntityList], 0);
        assert_eq!(store.stats()[&ListKind::Sdn], 1);
        assert!(store
            .phrase_candidates(ListKind::EntityList, "huawei")
            .unwrap()
            .is_empty());

        store.clear(None).unwrap();
        assert!(store.stats().values().all(|&count| count == 0));
    }

    #[test]
    fn test_records_iterates_in_id_order() {
        let (_dir, store) = open_store();
        store.upsert(&entity_record("EL-2", "Beta Corp", &[])).unwrap();
        store.upsert(&entity_record("EL-1", "Alpha Corp", &[])).unwrap();

        let ids: Vec<String> = store
            .records(ListKind::EntityList)
            .map(|record| record.unwrap().id().to_string())
            .collect();
        assert_eq!(ids, ["EL-1", "EL-2"]);
    }

    #[test]
    fn test_consolidated_source_counts() {
        use crate::records::ConsolidatedScreeningEntry;
        let (_dir, store) = open_store();
        for (id, code) in [("C-1", "sdn"), ("C-2", "entity_list"), ("C-3", "sdn")] {
            store
                .upsert(&RestrictedPartyRecord::Consolidated(
                    ConsolidatedScreeningEntry {
                        id: id.to_string(),
                        name: "Listed Party".to_string(),
                        entity_type: EntityType::Entity,
                        source_list: String::new(),
                        source_list_code: code.to_string(),
                        programs: Vec::new(),
                        aliases: Vec::new(),
                        addresses: Vec::new(),
                        countries: Vec::new(),
                        remarks: String::new(),
                    },
                ))
                .unwrap();
        }
        let counts = store.consolidated_source_counts().unwrap();
        assert_eq!(counts["sdn"], 2);
        assert_eq!(counts["entity_list"], 1);
    }
}
