//! Integration tests for the `properties` repository.
//!
//! Need a PostgreSQL server reachable through `DATABASE_URL`; run with
//! `cargo test -p campos-db -- --ignored`.

use campos_core::property::{Dwelling, NewProperty, OperationType};
use campos_core::store::{PageRequest, PropertyFilter, PropertyStore, StoreError, UniqueField};
use campos_core::testing::image;
use campos_db::PgPropertyStore;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_property(ref_code: &str, slug: &str, title: &str) -> NewProperty {
    NewProperty {
        ref_code: ref_code.to_string(),
        slug: slug.to_string(),
        title: title.to_string(),
        description: None,
        operation_type: OperationType::Sale,
        price: Some(250_000.0),
        measure: 120.0,
        location: "San José, Entre Ríos".to_string(),
        lat: None,
        lng: None,
        property_type: None,
        services: vec!["Agua".to_string()],
        extras: vec!["Vivienda".to_string()],
        dwelling: Dwelling {
            bedrooms: Some(3),
            ..Default::default()
        },
        images: vec![image("A"), image("B")],
        video_urls: vec!["https://youtu.be/abc".to_string()],
        keywords: vec!["campo en san jose".to_string()],
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn create_and_read_back(pool: PgPool) {
    campos_db::health_check(&pool).await.unwrap();
    let store = PgPropertyStore::new(pool);

    let created = store
        .create(&new_property("BARR-2024-AAAAAA", "campo-los-alamos", "Campo Los Alamos"))
        .await
        .unwrap();

    let by_id = store.find_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(by_id, created);
    assert_eq!(by_id.images, vec![image("A"), image("B")]);
    assert_eq!(by_id.dwelling.bedrooms, Some(3));

    let by_slug = store.find_by_slug("campo-los-alamos").await.unwrap().unwrap();
    assert_eq!(by_slug.id, created.id);

    assert!(store.ref_exists("BARR-2024-AAAAAA").await.unwrap());
    assert!(store.slug_exists("campo-los-alamos", None).await.unwrap());
    assert!(!store
        .slug_exists("campo-los-alamos", Some(created.id))
        .await
        .unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn duplicate_identifiers_are_unique_violations(pool: PgPool) {
    let store = PgPropertyStore::new(pool);
    store
        .create(&new_property("REF-1", "campo", "Campo"))
        .await
        .unwrap();

    let dup_ref = store.create(&new_property("REF-1", "otro", "Otro")).await;
    assert!(matches!(
        dup_ref,
        Err(StoreError::UniqueViolation(UniqueField::Ref))
    ));

    let dup_slug = store.create(&new_property("REF-2", "campo", "Campo")).await;
    assert!(matches!(
        dup_slug,
        Err(StoreError::UniqueViolation(UniqueField::Slug))
    ));
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn save_overwrites_and_delete_removes(pool: PgPool) {
    let store = PgPropertyStore::new(pool);
    let mut property = store
        .create(&new_property("REF-1", "campo", "Campo"))
        .await
        .unwrap();

    property.price = None;
    property.images = vec![image("C")];
    property.keywords = vec!["nueva".to_string()];
    let saved = store.save(&property).await.unwrap();
    assert_eq!(saved.price, None);
    assert_eq!(saved.images, vec![image("C")]);
    assert!(saved.updated_at >= property.updated_at);

    assert!(store.delete(property.id).await.unwrap());
    assert!(!store.delete(property.id).await.unwrap());
    assert!(matches!(
        store.save(&property).await,
        Err(StoreError::Missing(_))
    ));
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn listing_filters_escapes_and_pages(pool: PgPool) {
    let store = PgPropertyStore::new(pool);
    for i in 0..3 {
        store
            .create(&new_property(&format!("REF-{i}"), &format!("campo-{i}"), "Campo"))
            .await
            .unwrap();
    }
    let mut lease = new_property("REF-L", "chacra", "Chacra 100% lista");
    lease.operation_type = OperationType::Lease;
    store.create(&lease).await.unwrap();

    let all = PropertyFilter::default();
    assert_eq!(store.count(&all).await.unwrap(), 4);
    let first = store
        .find(&all, PageRequest::new(Some(1), Some(3)))
        .await
        .unwrap();
    assert_eq!(first.len(), 3);
    assert_eq!(first[0].ref_code, "REF-L", "newest first");

    let leases = PropertyFilter {
        operation_type: Some(OperationType::Lease),
        ..Default::default()
    };
    assert_eq!(store.count(&leases).await.unwrap(), 1);

    let percent = PropertyFilter {
        search: Some("100%".into()),
        ..Default::default()
    };
    assert_eq!(store.count(&percent).await.unwrap(), 1);

    let case = PropertyFilter {
        search: Some("CHACRA".into()),
        ..Default::default()
    };
    assert_eq!(store.count(&case).await.unwrap(), 1);

    let entries = store.sitemap_entries().await.unwrap();
    assert_eq!(entries.len(), 4);
    assert_eq!(store.list_all().await.unwrap()[0].ref_code, "REF-0");
}
