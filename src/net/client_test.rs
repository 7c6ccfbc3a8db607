use super::*;
use crate::net::test_helpers::{admin_login_body, fixture};
use serde_json::json;

// =============================================================================
// bearer injection
// =============================================================================

#[tokio::test]
async fn request_without_token_has_no_bearer() {
    let fx = fixture();
    fx.transport.respond(Method::GET, "/api/subjects", Ok(json!([])));
    fx.api.get("/api/subjects", &[]).await.unwrap();
    let sent = fx.transport.requests();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].bearer, None);
}

#[tokio::test]
async fn request_reads_token_from_store_each_time() {
    let fx = fixture();
    fx.transport.respond(Method::GET, "/api/subjects", Ok(json!([])));
    let user = serde_json::from_value(json!({ "id": "1", "role": "admin" })).unwrap();

    fx.credentials.save("T1", None, &user).unwrap();
    fx.api.get("/api/subjects", &[]).await.unwrap();
    fx.credentials.save("T2", None, &user).unwrap();
    fx.api.get("/api/subjects", &[]).await.unwrap();

    let sent = fx.transport.requests();
    assert_eq!(sent[0].bearer.as_deref(), Some("T1"));
    assert_eq!(sent[1].bearer.as_deref(), Some("T2"));
}

#[tokio::test]
async fn request_passes_query_and_body() {
    let fx = fixture();
    fx.transport.respond(Method::POST, "/api/notes", Ok(json!({ "id": "n1" })));
    fx.transport.respond(Method::GET, "/api/notes", Ok(json!([])));

    fx.api.post("/api/notes", json!({ "title": "x" })).await.unwrap();
    fx.api
        .get("/api/notes", &[("page".to_owned(), "2".to_owned())])
        .await
        .unwrap();

    let sent = fx.transport.requests();
    assert_eq!(sent[0].body, Some(json!({ "title": "x" })));
    assert_eq!(sent[1].query, vec![("page".to_owned(), "2".to_owned())]);
    assert_eq!(sent[1].body, None);
}

#[tokio::test]
async fn verbs_map_to_methods() {
    let fx = fixture();
    fx.transport.respond(Method::PUT, "/api/x", Ok(json!({})));
    fx.transport.respond(Method::PATCH, "/api/x", Ok(json!({})));
    fx.transport.respond(Method::DELETE, "/api/x", Ok(json!(null)));
    fx.api.put("/api/x", json!({})).await.unwrap();
    fx.api.patch("/api/x", json!({})).await.unwrap();
    fx.api.delete("/api/x").await.unwrap();
    let methods: Vec<Method> = fx.transport.requests().into_iter().map(|r| r.method).collect();
    assert_eq!(methods, vec![Method::PUT, Method::PATCH, Method::DELETE]);
}

#[tokio::test]
async fn request_surfaces_status_errors_without_retry() {
    let fx = fixture();
    fx.transport.respond(
        Method::GET,
        "/api/payments",
        Err(ApiError::Status { status: 500, message: "boom".into() }),
    );
    let err = fx.api.get("/api/payments", &[]).await.unwrap_err();
    assert_eq!(err, ApiError::Status { status: 500, message: "boom".into() });
    assert_eq!(fx.transport.count(&Method::GET, "/api/payments"), 1);
}

// =============================================================================
// login / logout
// =============================================================================

#[tokio::test]
async fn login_posts_credentials_and_decodes() {
    let fx = fixture();
    fx.transport.respond(Method::POST, LOGIN_ENDPOINT, Ok(admin_login_body("T1")));
    let grant = fx.api.login(&LoginRequest::new("a@b.com", "x")).await.unwrap();
    assert_eq!(grant.access_token, "T1");
    let sent = fx.transport.requests();
    assert_eq!(sent[0].body, Some(json!({ "email": "a@b.com", "password": "x" })));
}

#[tokio::test]
async fn login_does_not_write_credentials() {
    let fx = fixture();
    fx.transport.respond(Method::POST, LOGIN_ENDPOINT, Ok(admin_login_body("T1")));
    fx.api.login(&LoginRequest::new("a@b.com", "x")).await.unwrap();
    assert!(fx.backend.is_empty());
}

#[tokio::test]
async fn login_malformed_response() {
    let fx = fixture();
    fx.transport.respond(Method::POST, LOGIN_ENDPOINT, Ok(json!({ "accessToken": "T1" })));
    let err = fx.api.login(&LoginRequest::new("a@b.com", "x")).await.unwrap_err();
    assert!(matches!(err, ApiError::MalformedResponse(_)));
}

#[tokio::test]
async fn logout_ignores_response_body() {
    let fx = fixture();
    fx.transport.respond(Method::POST, LOGOUT_ENDPOINT, Ok(json!({ "message": "bye" })));
    assert!(fx.api.logout().await.is_ok());
    assert_eq!(fx.transport.requests()[0].body, None);
}
