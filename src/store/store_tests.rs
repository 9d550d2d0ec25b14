use super::*;

#[test]
fn references_use_the_alphabet() {
    for _ in 0..500 {
        let r = generate_reference();
        assert_eq!(r.len(), REF_LEN);
        assert!(r.bytes().all(|b| REF_ALPHABET.contains(&b)), "unexpected symbol in {}", r);
    }
    assert_eq!(REF_ALPHABET.len(), 62);
}

#[tokio::test]
async fn insert_then_fetch_returns_text() {
    let store = PlanStore::in_memory();
    let saved = store.insert("Seq Scan on foo").await.unwrap();
    assert!(saved.plan_ref.chars().all(|c| c.is_ascii_alphanumeric()));
    assert_eq!(saved.plan_ref.len(), 8);
    assert_eq!(saved.id, 1);

    let loaded = store.fetch_by_ref(&saved.plan_ref).await.unwrap();
    assert_eq!(loaded.text, "Seq Scan on foo");
    assert_eq!(loaded, saved);
}

#[tokio::test]
async fn unknown_reference_is_not_found() {
    let store = PlanStore::in_memory();
    store.insert("Seq Scan on foo").await.unwrap();
    let err = store.fetch_by_ref("zzzzzzzz").await.unwrap_err();
    assert_eq!(err, PlanError::NotFound("zzzzzzzz".into()));
}

#[tokio::test]
async fn unconfigured_store_refuses_everything() {
    let store = PlanStore::from_config(None);
    assert!(!store.is_configured());
    assert_eq!(store.insert("x").await.unwrap_err(), PlanError::Configuration);
    assert_eq!(store.fetch_by_ref("abcdefgh").await.unwrap_err(), PlanError::Configuration);
    assert_eq!(store.ensure_schema().await.unwrap_err(), PlanError::Configuration);
    assert_eq!(PlanStore::from_config(Some("  ")).kind(), "none");
}

#[tokio::test]
async fn duplicate_reference_is_a_cardinality_error() {
    let mem = MemoryBackend::default();
    mem.insert("dupedref", "first");
    mem.insert("dupedref", "second");
    let store = PlanStore { backend: Some(Backend::Memory(mem)) };
    assert_eq!(store.fetch_by_ref("dupedref").await.unwrap_err(), PlanError::Cardinality(2));
}

#[test]
fn backend_selection() {
    assert_eq!(PlanStore::from_config(Some("memory://")).kind(), "memory");
    assert_eq!(PlanStore::from_config(Some("postgres://user@localhost/plans")).kind(), "postgres");
    assert!(PlanStore::unconfigured().kind() == "none");
}
