mod support;

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use serde_json::json;

use support::{
    FailingCache, InMemoryContactStore, StalledStore, UnavailableStore, error_fields,
    inserted_id, memory_cache, router, send, send_raw,
};

#[tokio::test]
async fn contact_lifecycle_round_trip() {
    let store = Arc::new(InMemoryContactStore::default());
    let app = router(store.clone(), memory_cache());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/",
        Some(json!({"name": "Jay Randall", "phone": "9087453245"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = inserted_id(&body);

    let (status, body) = send(&app, Method::GET, &format!("/api/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id);
    assert_eq!(body["name"], "Jay Randall");
    assert_eq!(body["phone"], "9087453245");

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/{id}"),
        Some(json!({"phone": "9145636789"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"matchedCount": 1, "modifiedCount": 1}));

    let (status, body) = send(&app, Method::GET, &format!("/api/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phone"], "9145636789");

    let (status, body) = send(&app, Method::DELETE, &format!("/api/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"deletedCount": 1}));

    let (status, body) = send(&app, Method::GET, &format!("/api/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn invalid_contacts_are_rejected_without_insert() {
    let store = Arc::new(InMemoryContactStore::default());
    let app = router(store.clone(), memory_cache());

    let cases = [
        (
            json!({"name": "", "phone": "9087453245"}),
            ("name", "is required"),
        ),
        (
            json!({"name": "R2D2", "phone": "9087453245"}),
            ("name", "must contain only letters separated by single spaces"),
        ),
        (
            json!({"name": "Zoë", "phone": "9087453245"}),
            ("name", "must contain only letters separated by single spaces"),
        ),
        (
            json!({"name": "Jay Randall", "phone": "908745324"}),
            ("phone", "must be exactly 10 digits long"),
        ),
        (
            json!({"name": "Jay Randall", "phone": "90874532ab"}),
            ("phone", "must contain only digits"),
        ),
    ];

    for (payload, (field, reason)) in cases {
        let (status, body) = send(&app, Method::POST, "/api/", Some(payload.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{payload}");
        assert_eq!(body["error"]["code"], "validation_failed");
        assert_eq!(
            error_fields(&body),
            vec![(field.to_string(), reason.to_string())],
            "{payload}"
        );
    }

    assert_eq!(store.inserts(), 0);
}

#[tokio::test]
async fn missing_fields_are_reported_together() {
    let store = Arc::new(InMemoryContactStore::default());
    let app = router(store.clone(), memory_cache());

    let (status, body) = send(&app, Method::POST, "/api/", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        error_fields(&body),
        vec![
            ("name".to_string(), "is required".to_string()),
            ("phone".to_string(), "is required".to_string()),
        ]
    );
    assert_eq!(store.inserts(), 0);
}

#[tokio::test]
async fn malformed_bodies_are_validation_errors() {
    let store = Arc::new(InMemoryContactStore::default());
    let app = router(store.clone(), memory_cache());

    let (status, body) = send_raw(
        &app,
        Method::POST,
        "/api/",
        Some("application/json"),
        "{\"name\": ".to_string(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_failed");

    let (status, body) = send_raw(
        &app,
        Method::POST,
        "/api/",
        None,
        json!({"name": "Jay Randall", "phone": "9087453245"}).to_string(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_failed");

    assert_eq!(store.inserts(), 0);
}

#[tokio::test]
async fn update_rejects_invalid_phone() {
    let app = router(Arc::new(InMemoryContactStore::default()), memory_cache());
    let (_, body) = send(
        &app,
        Method::POST,
        "/api/",
        Some(json!({"name": "Ann", "phone": "0123456789"})),
    )
    .await;
    let id = inserted_id(&body);

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/{id}"),
        Some(json!({"phone": "12345"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        error_fields(&body),
        vec![(
            "phone".to_string(),
            "must be exactly 10 digits long".to_string()
        )]
    );
}

#[tokio::test]
async fn update_reports_matched_and_modified_counts() {
    let app = router(Arc::new(InMemoryContactStore::default()), memory_cache());
    let (_, body) = send(
        &app,
        Method::POST,
        "/api/",
        Some(json!({"name": "Ann", "phone": "0123456789"})),
    )
    .await;
    let id = inserted_id(&body);

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/{id}"),
        Some(json!({"phone": "0123456789"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"matchedCount": 1, "modifiedCount": 0}));

    let unknown = uuid::Uuid::new_v4();
    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/{unknown}"),
        Some(json!({"phone": "0123456789"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"matchedCount": 0, "modifiedCount": 0}));
}

#[tokio::test]
async fn repeated_delete_reports_zero() {
    let app = router(Arc::new(InMemoryContactStore::default()), memory_cache());
    let (_, body) = send(
        &app,
        Method::POST,
        "/api/",
        Some(json!({"name": "Ann", "phone": "0123456789"})),
    )
    .await;
    let id = inserted_id(&body);

    let (_, first) = send(&app, Method::DELETE, &format!("/api/{id}"), None).await;
    let (status, second) = send(&app, Method::DELETE, &format!("/api/{id}"), None).await;
    assert_eq!(first, json!({"deletedCount": 1}));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second, json!({"deletedCount": 0}));
}

#[tokio::test]
async fn empty_collection_lists_as_empty_array() {
    let app = router(Arc::new(InMemoryContactStore::default()), memory_cache());

    for uri in ["/api/", "/api"] {
        let (status, body) = send(&app, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body, json!([]), "{uri}");
    }
}

#[tokio::test]
async fn collection_route_accepts_missing_trailing_slash() {
    let app = router(Arc::new(InMemoryContactStore::default()), memory_cache());

    let (status, _) = send(
        &app,
        Method::POST,
        "/api",
        Some(json!({"name": "Ann", "phone": "0123456789"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = send(&app, Method::GET, "/api/", None).await;
    assert_eq!(body.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn malformed_ids_are_rejected() {
    let app = router(Arc::new(InMemoryContactStore::default()), memory_cache());

    for method in [Method::GET, Method::DELETE] {
        let (status, body) = send(&app, method.clone(), "/api/not-a-contact-id", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{method}");
        assert_eq!(
            error_fields(&body),
            vec![("id".to_string(), "is not a valid contact id".to_string())]
        );
    }
}

#[tokio::test]
async fn undecodable_id_segments_get_json_errors() {
    let app = router(Arc::new(InMemoryContactStore::default()), memory_cache());

    for method in [Method::GET, Method::PUT, Method::DELETE] {
        let (status, body) = send(&app, method.clone(), "/api/%FF", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{method}");
        assert_eq!(body["error"]["code"], "validation_failed", "{method}");
        assert_eq!(
            error_fields(&body),
            vec![("id".to_string(), "is not a valid contact id".to_string())]
        );
    }
}

#[tokio::test]
async fn unsupported_methods_get_405() {
    let app = router(Arc::new(InMemoryContactStore::default()), memory_cache());
    let id = uuid::Uuid::new_v4();

    let cases = [
        (Method::PUT, "/api/".to_string()),
        (Method::DELETE, "/api/".to_string()),
        (Method::PATCH, "/api".to_string()),
        (Method::POST, format!("/api/{id}")),
        (Method::PATCH, format!("/api/{id}")),
    ];

    for (method, uri) in cases {
        let (status, body) = send(&app, method.clone(), &uri, None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{method} {uri}");
        assert_eq!(body["error"]["code"], "method_not_allowed");
    }

    for uri in ["/api/".to_string(), format!("/api/{id}")] {
        let (status, _) = send(&app, Method::HEAD, &uri, None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "HEAD {uri}");
    }
}

#[tokio::test]
async fn unknown_routes_get_json_404() {
    let app = router(Arc::new(InMemoryContactStore::default()), memory_cache());
    let (status, body) = send(&app, Method::GET, "/contacts", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn storage_failures_map_to_500() {
    let app = router(Arc::new(UnavailableStore), memory_cache());

    let (status, body) = send(&app, Method::GET, "/api/", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "storage_error");
    // Backend details stay in the logs.
    assert!(body["error"].get("hint").is_none());

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/",
        Some(json!({"name": "Ann", "phone": "0123456789"})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn storage_timeouts_map_to_503() {
    let app = router(Arc::new(StalledStore), memory_cache());

    let (status, body) = send(&app, Method::GET, "/api/", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "storage_timeout");
}

#[tokio::test]
async fn health_probe_reflects_store() {
    let healthy = router(Arc::new(InMemoryContactStore::default()), memory_cache());
    let (status, _) = send(&healthy, Method::GET, "/_health/db", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let unhealthy = router(Arc::new(UnavailableStore), Arc::new(FailingCache::default()));
    let (status, _) = send(&unhealthy, Method::GET, "/_health/db", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
