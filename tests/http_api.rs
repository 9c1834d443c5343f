//! HTTP routes through `actix_web::test`.

#![cfg(feature = "server")]

mod common;

use actix_web::http::header::{AUTHORIZATION, CONTENT_TYPE};
use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use common::{png, simple_deck};
use serde_json::{json, Value};
use slidecast::auth::{AuthService, PasswordHasher, TokenIssuer, UserStore};
use slidecast::render::{OoxmlRasterizer, RasterOptions};
use slidecast::server::{configure, AppState};
use slidecast::SlideStore;
use tempfile::TempDir;

const BOUNDARY: &str = "----slidecast-test-boundary";

fn app_state(tmp: &TempDir) -> AppState {
    let store = SlideStore::open(tmp.path().join("slides")).unwrap();
    let auth = AuthService::new(
        UserStore::open_in_memory().unwrap(),
        TokenIssuer::new(b"test-secret", 3600).unwrap(),
    )
    .with_hasher(PasswordHasher::with_cost(256, 1).unwrap());
    AppState::new(store, OoxmlRasterizer::new(RasterOptions::default()), auth)
}

/// Multipart body with one part per `(field, filename, bytes)`.
fn multipart(parts: &[(&str, &str, Vec<u8>)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (field, filename, data) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(parts: &[(&str, &str, Vec<u8>)]) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/api/upload")
        .insert_header((
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        ))
        .set_payload(multipart(parts))
}

#[actix_web::test]
async fn test_upload_then_state_and_static() {
    let tmp = TempDir::new().unwrap();
    let app = test::init_service(App::new().configure(configure(web::Data::new(app_state(&tmp))))).await;

    let req = upload_request(&[
        ("files", "cover.png", png(3, 3, [9, 9, 9, 255])),
        ("files", "talk.pptx", simple_deck(2)),
    ])
    .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(
        body,
        json!({
            "message": "Uploaded/Converted 3 slides",
            "slides": ["cover.png", "slide_001.png", "slide_002.png"]
        })
    );

    let req = test::TestRequest::get().uri("/api/current-state").to_request();
    let state: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(
        state,
        json!({
            "slide_index": 0,
            "total_slides": 3,
            "slides": ["cover.png", "slide_001.png", "slide_002.png"],
            "current_slide": "cover.png"
        })
    );

    let req = test::TestRequest::get().uri("/slides/cover.png").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(test::read_body(resp).await.to_vec(), png(3, 3, [9, 9, 9, 255]));
}

#[actix_web::test]
async fn test_upload_without_files_is_bad_request() {
    let tmp = TempDir::new().unwrap();
    let app = test::init_service(App::new().configure(configure(web::Data::new(app_state(&tmp))))).await;

    let req = upload_request(&[("other", "x.png", b"x".to_vec())]).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_broken_deck_is_backend_error() {
    let tmp = TempDir::new().unwrap();
    let app = test::init_service(App::new().configure(configure(web::Data::new(app_state(&tmp))))).await;

    let req = upload_request(&[("files", "broken.pptx", b"garbage".to_vec())]).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(body.starts_with("Backend Error: "), "{}", body);
}

#[actix_web::test]
async fn test_signup_and_login() {
    let tmp = TempDir::new().unwrap();
    let app = test::init_service(App::new().configure(configure(web::Data::new(app_state(&tmp))))).await;
    let creds = json!({"username": "alice", "password": "pw"});

    let req = test::TestRequest::post()
        .uri("/api/auth/signup")
        .set_json(&creds)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(test::read_body(resp).await, "User registered successfully");

    let req = test::TestRequest::post()
        .uri("/api/auth/signup")
        .set_json(&creds)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(test::read_body(resp).await, "Username taken");

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(&creds)
        .to_request();
    let login: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(login["username"], "alice");
    assert!(login["token"].as_str().is_some_and(|t| t.split('.').count() == 3));

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({"username": "alice", "password": "wrong"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(test::read_body(resp).await, "Bad credentials");
}

#[actix_web::test]
async fn test_require_auth_gates_slide_routes() {
    let tmp = TempDir::new().unwrap();
    let state = app_state(&tmp).with_require_auth(true);
    let app = test::init_service(App::new().configure(configure(web::Data::new(state)))).await;

    let req = test::TestRequest::get().uri("/api/current-state").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let creds = json!({"username": "bob", "password": "pw"});
    let req = test::TestRequest::post()
        .uri("/api/auth/signup")
        .set_json(&creds)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(&creds)
        .to_request();
    let login: Value = test::call_and_read_body_json(&app, req).await;
    let bearer = format!("Bearer {}", login["token"].as_str().unwrap());

    let req = test::TestRequest::get()
        .uri("/api/current-state")
        .insert_header((AUTHORIZATION, bearer.clone()))
        .to_request();
    let state: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(state["total_slides"], 0);

    let req = upload_request(&[("files", "a.png", png(1, 1, [0, 0, 0, 255]))])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = upload_request(&[("files", "a.png", png(1, 1, [0, 0, 0, 255]))])
        .insert_header((AUTHORIZATION, bearer))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}
