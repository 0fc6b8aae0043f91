//! End-to-end tests driving the screening engine through its public API,
//! with a fresh temporary store per test.

use restricted_party_screen::{
    EngineConfig, EntityListEntry, EntityType, ListKind, MatchType, MatchedField,
    RestrictedPartyRecord, ScreeningEngine, ScreeningQuery, SdnEntry,
};

fn engine() -> (tempfile::TempDir, ScreeningEngine) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = EngineConfig::default();
    config.storage.data_dir = dir.path().join("db");
    let engine = ScreeningEngine::new(config).unwrap();
    (dir, engine)
}

fn entity_record(id: &str, name: &str, aliases: &[&str], country: &str) -> RestrictedPartyRecord {
    RestrictedPartyRecord::EntityList(EntityListEntry {
        id: id.to_string(),
        name: name.to_string(),
        aliases: aliases.iter().map(|a| a.to_string()).collect(),
        addresses: Vec::new(),
        country: country.to_string(),
        license_requirement: String::new(),
        license_policy: String::new(),
        federal_register_citation: String::new(),
        effective_date: None,
        standard_order: false,
        remarks: String::new(),
    })
}

fn sdn_record(
    id: &str,
    name: &str,
    entity_type: EntityType,
    programs: &[&str],
) -> RestrictedPartyRecord {
    RestrictedPartyRecord::Sdn(SdnEntry {
        id: id.to_string(),
        name: name.to_string(),
        entity_type,
        programs: programs.iter().map(|p| p.to_string()).collect(),
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
fn test_exact_name_query_scores_high() {
    let (_dir, engine) = engine();
    engine
        .upsert(&entity_record(
            "EL-1",
            "Huawei Technologies",
            &["Huawei"],
            "CN",
        ))
        .unwrap();

    let mut query = ScreeningQuery::new(ListKind::EntityList, "Huawei");
    query.limit = Some(5);
    let matches = engine.search_with_params(query).unwrap();

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].record_id, "EL-1");
    assert_eq!(matches[0].match_type, MatchType::ExactText);
    assert!(matches[0].match_score > 0.9);
}

#[test]
fn test_misspelled_query_falls_back_to_fuzzy_alias() {
    let (_dir, engine) = engine();
    engine
        .upsert(&entity_record(
            "EL-1",
            "Huawei Technologies",
            &["Huawei"],
            "CN",
        ))
        .unwrap();

    let mut query = ScreeningQuery::new(ListKind::EntityList, "Huaewi");
    query.fuzzy_threshold = Some(0.6);
    let matches = engine.search_with_params(query).unwrap();

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].record_id, "EL-1");
    assert_eq!(matches[0].match_type, MatchType::Alias);
    assert_eq!(matches[0].matched_value, "Huawei");
    assert!(matches[0].match_score >= 0.6);
}

#[test]
fn test_country_filter_is_hard_and_case_insensitive() {
    let (_dir, engine) = engine();
    engine
        .upsert(&entity_record(
            "EL-1",
            "Huawei Technologies",
            &["Huawei"],
            "CN",
        ))
        .unwrap();

    let mut query = ScreeningQuery::new(ListKind::EntityList, "Huawei");
    query.filters.country = Some("RU".to_string());
    assert!(engine.search_with_params(query).unwrap().is_empty());

    let mut query = ScreeningQuery::new(ListKind::EntityList, "Huawei");
    query.filters.country = Some("cn".to_string());
    let matches = engine.search_with_params(query).unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].record_id, "EL-1");
}

#[test]
fn test_clear_resets_stats() {
    let (_dir, engine) = engine();
    engine
        .upsert(&entity_record("EL-1", "Huawei Technologies", &[], "CN"))
        .unwrap();
    engine
        .upsert(&sdn_record(
            "SDN-1",
            "Example Person",
            EntityType::Individual,
            &["SDGT"],
        ))
        .unwrap();

    engine.clear(None).unwrap();
    assert!(engine.stats().values().all(|&count| count == 0));
    assert!(engine
        .search(ListKind::EntityList, "Huawei")
        .unwrap()
        .is_empty());
}

#[test]
fn test_country_lookup_by_code_and_name() {
    let (_dir, engine) = engine();

    let by_code = engine.country_lookup("IR").unwrap().unwrap();
    assert_eq!(by_code.country_code, "IR");
    assert_eq!(
        serde_json::to_value(by_code.embargo_type).unwrap(),
        serde_json::json!("comprehensive")
    );

    let by_name = engine.country_lookup("iran").unwrap().unwrap();
    assert_eq!(by_name, by_code);
}

#[test]
fn test_country_lookup_miss_is_none() {
    let (_dir, engine) = engine();
    assert!(engine.country_lookup("Narnia").unwrap().is_none());
    assert!(engine.country_lookup("").unwrap().is_none());
}

#[test]
fn test_threshold_above_one_behaves_as_one() {
    let (_dir, engine) = engine();
    engine
        .upsert(&entity_record("EL-1", "Jon Smith", &[], "US"))
        .unwrap();

    // Equal token sets score exactly 1.0 and survive the clamped threshold.
    let mut query = ScreeningQuery::new(ListKind::EntityList, "smith jon");
    query.fuzzy_threshold = Some(2.0);
    let clamped = engine.search_with_params(query).unwrap();

    let mut query = ScreeningQuery::new(ListKind::EntityList, "smith jon");
    query.fuzzy_threshold = Some(1.0);
    let exact = engine.search_with_params(query).unwrap();

    assert_eq!(clamped, exact);
    assert_eq!(clamped.len(), 1);
    assert_eq!(clamped[0].match_score, 1.0);

    // A 0.9 similarity fails a threshold clamped down to 1.0.
    let mut query = ScreeningQuery::new(ListKind::EntityList, "john smith");
    query.fuzzy_threshold = Some(2.0);
    assert!(engine.search_with_params(query).unwrap().is_empty());
}

#[test]
fn test_limit_clamped_to_configured_maximum() {
    let (_dir, engine) = engine();
    let batch: Vec<RestrictedPartyRecord> = (0..120)
        .map(|i| {
            entity_record(
                &format!("EL-{:03}", i),
                &format!("Trade Partner {}", i),
                &[],
                "CN",
            )
        })
        .collect();
    assert_eq!(engine.upsert_batch(&batch).unwrap().accepted, 120);

    let mut query = ScreeningQuery::new(ListKind::EntityList, "trade partner");
    query.limit = Some(1000);
    let matches = engine.search_with_params(query).unwrap();
    assert_eq!(matches.len(), 100);
}

#[test]
fn test_default_limit_applies() {
    let (_dir, engine) = engine();
    let batch: Vec<RestrictedPartyRecord> = (0..25)
        .map(|i| {
            entity_record(
                &format!("EL-{:03}", i),
                &format!("Trade Partner {}", i),
                &[],
                "CN",
            )
        })
        .collect();
    engine.upsert_batch(&batch).unwrap();

    let matches = engine
        .search(ListKind::EntityList, "trade partner")
        .unwrap();
    assert_eq!(matches.len(), 20);
}

#[test]
fn test_indexed_hits_bypass_fuzzy_threshold() {
    let (_dir, engine) = engine();
    engine
        .upsert(&entity_record(
            "EL-9",
            "Shenzhen Device Co",
            &["Huawei Subsidiary"],
            "CN",
        ))
        .unwrap();

    // The alias token hits the index, but the reported score is the low
    // name similarity. The match is kept anyway.
    let matches = engine.search(ListKind::EntityList, "huawei").unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].match_type, MatchType::ExactText);
    assert_eq!(matches[0].matched_field, MatchedField::Name);
    assert_eq!(matches[0].matched_value, "Shenzhen Device Co");
    assert!(matches[0].match_score < 0.7);
}

#[test]
fn test_indexed_records_not_rescored_by_fuzzy_stage() {
    let (_dir, engine) = engine();
    engine
        .upsert(&entity_record(
            "EL-1",
            "Huawei Technologies",
            &["Huawei"],
            "CN",
        ))
        .unwrap();
    engine
        .upsert(&entity_record("EL-2", "Huawei Device", &[], "CN"))
        .unwrap();

    let matches = engine.search(ListKind::EntityList, "huawei").unwrap();
    let ids: Vec<&str> = matches.iter().map(|m| m.record_id.as_str()).collect();

    // Each record appears once, ordered by index rank within equal scores.
    assert_eq!(ids, ["EL-1", "EL-2"]);
    assert!(matches.iter().all(|m| m.match_type == MatchType::ExactText));
}

#[test]
fn test_first_acceptable_alias_wins_over_better_one() {
    let (_dir, engine) = engine();
    engine
        .upsert(&entity_record(
            "EL-5",
            "Device Maker",
            &["Huawei Shenzen Branch", "Shenzhen Huawei"],
            "CN",
        ))
        .unwrap();

    // Token order blocks a phrase hit, so this is resolved in the fuzzy
    // stage. The second alias would score a perfect 1.0, but alias scanning
    // stops at the first one over the threshold.
    let mut query = ScreeningQuery::new(ListKind::EntityList, "huawei shenzhen");
    query.fuzzy_threshold = Some(0.55);
    let matches = engine.search_with_params(query).unwrap();

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].match_type, MatchType::Alias);
    assert_eq!(matches[0].matched_value, "Huawei Shenzen Branch");
    assert!(matches[0].match_score >= 0.55);
    assert!(matches[0].match_score < 1.0);
}

#[test]
fn test_program_filter_is_case_sensitive() {
    let (_dir, engine) = engine();
    engine
        .upsert(&sdn_record(
            "SDN-1",
            "Example Person",
            EntityType::Individual,
            &["SDGT"],
        ))
        .unwrap();

    let mut query = ScreeningQuery::new(ListKind::Sdn, "example person");
    query.filters.program = Some("SDGT".to_string());
    assert_eq!(engine.search_with_params(query).unwrap().len(), 1);

    let mut query = ScreeningQuery::new(ListKind::Sdn, "example person");
    query.filters.program = Some("sdgt".to_string());
    assert!(engine.search_with_params(query).unwrap().is_empty());
}

#[test]
fn test_entity_type_filter() {
    let (_dir, engine) = engine();
    engine
        .upsert(&sdn_record(
            "SDN-1",
            "Akram Example",
            EntityType::Individual,
            &["SDGT"],
        ))
        .unwrap();
    engine
        .upsert(&sdn_record(
            "SDN-2",
            "Example Trading Co",
            EntityType::Entity,
            &["IRAN"],
        ))
        .unwrap();

    assert_eq!(engine.search(ListKind::Sdn, "example").unwrap().len(), 2);

    let mut query = ScreeningQuery::new(ListKind::Sdn, "example");
    query.filters.entity_type = Some(EntityType::Individual);
    let matches = engine.search_with_params(query).unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].record_id, "SDN-1");
}

#[test]
fn test_no_match_is_an_empty_result() {
    let (_dir, engine) = engine();
    engine
        .upsert(&entity_record("EL-1", "Huawei Technologies", &[], "CN"))
        .unwrap();

    let matches = engine
        .search(ListKind::EntityList, "completely unrelated query")
        .unwrap();
    assert!(matches.is_empty());
}

#[test]
fn test_batch_ingest_reports_rejections() {
    let (_dir, engine) = engine();
    let batch = vec![
        entity_record("EL-1", "Huawei Technologies", &[], "CN"),
        entity_record("EL-2", "   ", &[], "CN"),
        entity_record("EL-3", "SMIC", &[], "CN"),
    ];

    let report = engine.upsert_batch(&batch).unwrap();
    assert_eq!(report.accepted, 2);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].index, 1);
    assert_eq!(report.rejected[0].id, "EL-2");
    assert_eq!(engine.stats()[&ListKind::EntityList], 2);
}
