//! # Full-Text Index Module
//!
//! ## Purpose
//! Positional inverted index over each record's name and aliases, stored in
//! the postings tree that lives next to each list's record tree.
//!
//! ## Input/Output Specification
//! - **Input**: Records to index, literal query phrases
//! - **Output**: Posting rows for the transactional write path, ranked
//!   candidate record ids for Stage-A search
//! - **Layout**: `token \x00 record_id -> positions`, plus one token-count
//!   row per record under a reserved `\x00` prefix
//!
//! ## Key Features
//! - Unicode-folding tokenizer (NFKD, combining marks stripped, lower-cased)
//! - Query text is tokenized as literal words; there is no query syntax, so
//!   index metacharacters cannot be injected
//! - Positional postings give exact phrase adjacency; a position gap between
//!   name and each alias keeps phrases from spanning fields
//! - Internal rank is phrase frequency over record token count, and is only
//!   used to order candidates before scoring

use crate::errors::Result;
use crate::records::RestrictedPartyRecord;
use std::collections::BTreeMap;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Reserved key prefix for per-record token counts. Tokens are non-empty
/// alphanumeric strings, so no posting key can start with a NUL byte.
const TOKEN_COUNT_PREFIX: &[u8] = b"\x00len\x00";

/// Index rows derived from one record, applied and removed atomically with
/// the record itself
pub(crate) struct IndexRows {
    /// `token \x00 id` keys mapped to encoded position lists
    pub postings: Vec<(Vec<u8>, Vec<u8>)>,
    /// Token-count row for rank normalization
    pub token_count: (Vec<u8>, Vec<u8>),
}

/// A Stage-A candidate produced by the phrase query
#[derive(Debug, Clone)]
pub(crate) struct PhraseHit {
    pub id: String,
    /// Internal relevance rank; not a normalized score
    pub rank: f64,
}

/// Split text into lower-cased alphanumeric tokens, folding diacritics so
/// "Müller" and "Muller" index identically
pub(crate) fn tokenize(text: &str) -> Vec<String> {
    let folded: String = text
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();
    folded
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Token positions across the record's indexed fields: the name first, then
/// each alias in declared order, with a one-position gap between fields so a
/// phrase cannot match across a field boundary.
fn field_positions(record: &RestrictedPartyRecord) -> (BTreeMap<String, Vec<u32>>, u32) {
    let mut positions: BTreeMap<String, Vec<u32>> = BTreeMap::new();
    let mut base = 0u32;
    let mut total = 0u32;

    let fields = std::iter::once(record.name()).chain(record.aliases().iter().map(String::as_str));
    for field in fields {
        let tokens = tokenize(field);
        for (offset, token) in tokens.iter().enumerate() {
            positions
                .entry(token.clone())
                .or_default()
                .push(base + offset as u32);
        }
        total += tokens.len() as u32;
        base += tokens.len() as u32 + 1;
    }

    (positions, total)
}

pub(crate) fn posting_key(token: &str, id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(token.len() + id.len() + 1);
    key.extend_from_slice(token.as_bytes());
    key.push(0);
    key.extend_from_slice(id.as_bytes());
    key
}

pub(crate) fn token_count_key(id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(TOKEN_COUNT_PREFIX.len() + id.len());
    key.extend_from_slice(TOKEN_COUNT_PREFIX);
    key.extend_from_slice(id.as_bytes());
    key
}

/// Build the posting rows for a record
pub(crate) fn build_rows(record: &RestrictedPartyRecord) -> Result<IndexRows> {
    let id = record.id();
    let (positions, total) = field_positions(record);

    let mut postings = Vec::with_capacity(positions.len());
    for (token, token_positions) in &positions {
        postings.push((posting_key(token, id), bincode::serialize(token_positions)?));
    }

    Ok(IndexRows {
        postings,
        token_count: (token_count_key(id), bincode::serialize(&total)?),
    })
}

/// Every postings-tree key a record owns, used to unindex the prior version
/// of a record inside the upsert transaction
pub(crate) fn row_keys(record: &RestrictedPartyRecord) -> Vec<Vec<u8>> {
    let id = record.id();
    let (positions, _) = field_positions(record);
    let mut keys: Vec<Vec<u8>> = positions
        .keys()
        .map(|token| posting_key(token, id))
        .collect();
    keys.push(token_count_key(id));
    keys
}

/// Find records whose indexed text contains the query as a literal phrase.
///
/// The query is tokenized with the same folding as indexed text. Candidates
/// are ranked by phrase frequency divided by the record's token count,
/// descending; ties keep id order. An empty or all-punctuation query matches
/// nothing.
pub(crate) fn phrase_query(postings: &sled::Tree, text: &str) -> Result<Vec<PhraseHit>> {
    let tokens = tokenize(text);
    if tokens.is_empty() {
        return Ok(Vec::new());
    }

    let mut prefix = tokens[0].as_bytes().to_vec();
    prefix.push(0);

    let mut hits = Vec::new();
    for row in postings.scan_prefix(&prefix) {
        let (key, value) = row?;
        let id = String::from_utf8_lossy(&key[prefix.len()..]).into_owned();

        let mut chains: Vec<Vec<u32>> = Vec::with_capacity(tokens.len());
        chains.push(bincode::deserialize(&value)?);
        let mut complete = true;
        for token in &tokens[1..] {
            match postings.get(posting_key(token, &id))? {
                Some(raw) => chains.push(bincode::deserialize(&raw)?),
                None => {
                    complete = false;
                    break;
                }
            }
        }
        if !complete {
            continue;
        }

        // Position lists are ascending, so adjacency checks can bisect.
        let occurrences = chains[0]
            .iter()
            .filter(|&&start| {
                chains[1..]
                    .iter()
                    .enumerate()
                    .all(|(i, chain)| chain.binary_search(&(start + i as u32 + 1)).is_ok())
            })
            .count();
        if occurrences == 0 {
            continue;
        }

        let total: u32 = match postings.get(token_count_key(&id))? {
            Some(raw) => bincode::deserialize(&raw)?,
            None => {
                tracing::warn!("Record {} has postings but no token-count row", id);
                continue;
            }
        };

        hits.push(PhraseHit {
            id,
            rank: occurrences as f64 / total.max(1) as f64,
        });
    }

    hits.sort_by(|a, b| b.rank.partial_cmp(&a.rank).unwrap_or(std::cmp::Ordering::Equal));
    Ok(hits)
}
