//! HTTP-level integration tests for the `/api/properties` endpoints.
//!
//! Uses Axum's tower::ServiceExt to send requests directly to the router
//! over in-memory collaborators.

mod common;

use axum::http::{Method, StatusCode};
use campos_core::testing::{image, sample_property};
use common::{body_json, campo_form, delete, get, send_multipart, MultipartBody, SITE};

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_returns_201_with_derived_fields() {
    let t = common::build_test_app();
    let form = campo_form("Campo Los Alamos")
        .text("extras", r#"["Vivienda", "Monte"]"#)
        .text("bedrooms", "3")
        .image("frente.jpg")
        .image("casco.png");

    let response = send_multipart(t.app(), Method::POST, "/api/properties", form).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["title"], "Campo Los Alamos");
    assert_eq!(json["slug"], "campo-los-alamos");
    assert_eq!(json["operationType"], "Venta");
    assert_eq!(json["bedrooms"], 3);
    assert_eq!(json["extras"], serde_json::json!(["Vivienda", "Monte"]));

    let ref_code = json["ref"].as_str().unwrap();
    let parts: Vec<&str> = ref_code.split('-').collect();
    assert_eq!(parts.len(), 3, "ref should be PREFIX-YEAR-CODE, got {ref_code}");
    assert_eq!(parts[0], "BARR");
    assert_eq!(parts[1].len(), 4);
    assert_eq!(parts[2].len(), 6);

    let mut urls: Vec<&str> = json["imageUrls"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u.as_str().unwrap())
        .collect();
    urls.sort_unstable();
    assert_eq!(urls, vec!["mem://casco.png", "mem://frente.jpg"]);

    let keywords: Vec<&str> = json["keywords"]
        .as_array()
        .unwrap()
        .iter()
        .map(|k| k.as_str().unwrap())
        .collect();
    assert!(keywords.contains(&"campo en san jose"));
    assert!(keywords.contains(&"venta de campos"));

    t.drain_notifications().await;
    assert_eq!(
        t.notifier.calls(),
        vec![vec![format!("{SITE}/properties/1/campo-los-alamos")]]
    );
}

#[tokio::test]
async fn second_create_with_same_title_gets_suffixed_slug() {
    let t = common::build_test_app();

    let first = send_multipart(
        t.app(),
        Method::POST,
        "/api/properties",
        campo_form("Campo Los Alamos"),
    )
    .await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = send_multipart(
        t.app(),
        Method::POST,
        "/api/properties",
        campo_form("Campo Los Alamos"),
    )
    .await;
    assert_eq!(second.status(), StatusCode::CREATED);
    assert_eq!(body_json(second).await["slug"], "campo-los-alamos-2");
}

#[tokio::test]
async fn create_without_required_fields_returns_400() {
    let t = common::build_test_app();
    let form = MultipartBody::new().text("title", "Campo").image("a.jpg");

    let response = send_multipart(t.app(), Method::POST, "/api/properties", form).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
    assert!(t.images.uploaded().is_empty(), "nothing uploaded on invalid input");
    assert!(t.store.is_empty());
}

#[tokio::test]
async fn create_with_too_many_images_returns_400() {
    let t = common::build_test_app();
    let mut form = campo_form("Campo");
    for i in 0..16 {
        form = form.image(&format!("foto-{i}.jpg"));
    }

    let response = send_multipart(t.app(), Method::POST, "/api/properties", form).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(t.images.uploaded().is_empty());
}

#[tokio::test]
async fn create_with_unsupported_file_returns_400() {
    let t = common::build_test_app();
    let form = campo_form("Campo").file("images", "planilla.pdf", b"%PDF");

    let response = send_multipart(t.app(), Method::POST, "/api/properties", form).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_with_unexpected_file_field_returns_400() {
    let t = common::build_test_app();
    let form = campo_form("Campo").file("documento", "casa.jpg", b"\xFF\xD8");

    let response = send_multipart(t.app(), Method::POST, "/api/properties", form).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn create_with_taken_ref_returns_409() {
    let t = common::build_test_app();
    t.store.insert_fixture("BARR-2024-AAAAAA", Some("fixture"));
    let form = campo_form("Campo").text("ref", "BARR-2024-AAAAAA");

    let response = send_multipart(t.app(), Method::POST, "/api/properties", form).await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "CONFLICT");
}

#[tokio::test]
async fn failed_upload_returns_502() {
    let t = common::build_test_app();
    t.images.fail_uploads_named("roto.jpg");
    let form = campo_form("Campo").image("roto.jpg");

    let response = send_multipart(t.app(), Method::POST, "/api/properties", form).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await["code"], "UPLOAD_FAILED");
    assert!(t.store.is_empty());
}

// ---------------------------------------------------------------------------
// Read
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_returns_page_envelope() {
    let t = common::build_test_app();
    for i in 1..=3 {
        t.store.insert(sample_property(i, &format!("Campo {i}")));
    }

    let response = get(t.app(), "/api/properties?page=2&limit=2").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["total"], 3);
    assert_eq!(json["page"], 2);
    assert_eq!(json["pageSize"], 2);
    let properties = json["properties"].as_array().unwrap();
    assert_eq!(properties.len(), 1);
    assert_eq!(properties[0]["imageUrls"], serde_json::json!(["url/A"]));
}

#[tokio::test]
async fn list_filters_by_search_and_operation_type() {
    let t = common::build_test_app();
    t.store.insert(sample_property(1, "Campo agrícola"));
    let mut lease = sample_property(2, "Chacra en arriendo");
    lease.operation_type = campos_core::property::OperationType::Lease;
    t.store.insert(lease);

    let json = body_json(get(t.app(), "/api/properties?search=CHACRA").await).await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["properties"][0]["id"], 2);

    let json = body_json(get(t.app(), "/api/properties?operationType=Venta").await).await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["properties"][0]["id"], 1);

    let response = get(t.app(), "/api/properties?operationType=Permuta").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_with_bad_paging_uses_defaults() {
    let t = common::build_test_app();
    let json = body_json(get(t.app(), "/api/properties?page=x&pageSize=999").await).await;
    assert_eq!(json["page"], 1);
    assert_eq!(json["pageSize"], 50);
    assert_eq!(json["total"], 0);
}

#[tokio::test]
async fn get_by_id_or_slug() {
    let t = common::build_test_app();
    let id = t.store.insert(sample_property(7, "Campo Los Alamos"));

    let by_id = get(t.app(), &format!("/api/properties/{id}")).await;
    assert_eq!(by_id.status(), StatusCode::OK);
    assert_eq!(body_json(by_id).await["slug"], "campo-los-alamos");

    let by_slug = get(t.app(), "/api/properties/campo-los-alamos").await;
    assert_eq!(by_slug.status(), StatusCode::OK);
    assert_eq!(body_json(by_slug).await["id"], 7);
}

#[tokio::test]
async fn get_unknown_returns_404() {
    let t = common::build_test_app();
    let response = get(t.app(), "/api/properties/no-existe").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

#[tokio::test]
async fn update_reconciles_images() {
    let t = common::build_test_app();
    let mut property = sample_property(1, "Campo Los Alamos");
    property.images = vec![image("A"), image("B"), image("C")];
    t.store.insert(property);

    let form = MultipartBody::new()
        .text("keepImages", r#"["url/A", "url/C"]"#)
        .image("F.jpg");
    let response = send_multipart(t.app(), Method::PUT, "/api/properties/1", form).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(
        json["imageUrls"],
        serde_json::json!(["url/A", "url/C", "mem://F.jpg"])
    );
    assert_eq!(t.images.deleted(), vec!["obj/B".to_string()]);
}

#[tokio::test]
async fn update_price_only_keeps_other_fields() {
    let t = common::build_test_app();
    t.store.insert(sample_property(1, "Campo Los Alamos"));

    let form = MultipartBody::new().text("price", "2500");
    let response = send_multipart(t.app(), Method::PUT, "/api/properties/1", form).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["price"], 2500.0);
    assert_eq!(json["title"], "Campo Los Alamos");
    assert_eq!(json["slug"], "campo-los-alamos");
    assert_eq!(json["imageUrls"], serde_json::json!(["url/A"]));
    assert_ne!(json["keywords"], serde_json::json!(["stale"]));
    assert!(t.images.delete_attempts().is_empty());
}

#[tokio::test]
async fn update_title_notifies_new_and_old_urls() {
    let t = common::build_test_app();
    t.store.insert(sample_property(1, "Campo Viejo"));

    let form = MultipartBody::new().text("title", "Campo Nuevo");
    let response = send_multipart(t.app(), Method::PUT, "/api/properties/1", form).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["slug"], "campo-nuevo");

    t.drain_notifications().await;
    assert_eq!(
        t.notifier.calls(),
        vec![vec![
            format!("{SITE}/properties/1/campo-nuevo"),
            format!("{SITE}/properties/1/campo-viejo"),
        ]]
    );
}

#[tokio::test]
async fn update_unknown_returns_404() {
    let t = common::build_test_app();
    let form = MultipartBody::new().text("price", "1");

    let response = send_multipart(t.app(), Method::PUT, "/api/properties/99", form).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_with_invalid_number_returns_400() {
    let t = common::build_test_app();
    t.store.insert(sample_property(1, "Campo"));
    let form = MultipartBody::new().text("measure", "mucho");

    let response = send_multipart(t.app(), Method::PUT, "/api/properties/1", form).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(t.store.save_count(), 0);
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

#[tokio::test]
async fn delete_releases_images_and_notifies() {
    let t = common::build_test_app();
    let mut property = sample_property(1, "Campo Los Alamos");
    property.images = vec![image("A"), image("B")];
    t.store.insert(property);

    let response = delete(t.app(), "/api/properties/1").await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(t.store.get(1).is_none());
    assert_eq!(
        t.images.deleted(),
        vec!["obj/A".to_string(), "obj/B".to_string()]
    );

    t.drain_notifications().await;
    assert_eq!(
        t.notifier.calls(),
        vec![vec![format!("{SITE}/properties/1/campo-los-alamos")]]
    );

    let again = delete(t.app(), "/api/properties/1").await;
    assert_eq!(again.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn store_outage_returns_generic_500() {
    let t = common::build_test_app();
    t.store.set_unavailable(true);

    let response = get(t.app(), "/api/properties").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}
