// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth login flow tests.
//!
//! These tests cover the redirect surface: provider lookup, the signed
//! state parameter, and the callback's short-circuit paths. Token exchange
//! itself talks to the real provider and is not exercised here.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use tower::ServiceExt;

mod common;

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn location(response: &axum::response::Response) -> String {
    response.headers()[header::LOCATION]
        .to_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_login_redirects_to_google() {
    let (app, _) = common::create_test_app();

    let response = app.oneshot(get("/auth/google")).await.unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    let location = location(&response);
    assert!(location.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
    assert!(location.contains("client_id=test_google_id"));
    assert!(location.contains("response_type=code"));
    assert!(location.contains("scope=openid%20email%20profile"));
    assert!(location.contains("state="));
}

#[tokio::test]
async fn test_login_unknown_provider() {
    let (app, _) = common::create_test_app();

    let response = app.oneshot(get("/auth/gitlab")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_login_unconfigured_provider() {
    // The test config carries Google credentials only; GitHub is offered
    // but not configured, which must read as absent rather than a 500.
    let (app, _) = common::create_test_app();

    let response = app.oneshot(get("/auth/github")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_login_state_is_url_safe_and_signed() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(get("/auth/google?redirect_uri=https://app.example.com"))
        .await
        .unwrap();

    let location = location(&response);
    let state = location
        .split("state=")
        .nth(1)
        .expect("Redirect should carry a state parameter");

    assert!(!state.contains('+'), "State should not contain '+'");
    assert!(!state.contains('/'), "State should not contain '/'");
    assert!(!state.contains('='), "State should not contain '=' padding");

    // "frontend_url|timestamp_hex|signature_hex", carrying the requested
    // redirect target.
    let decoded = String::from_utf8(URL_SAFE_NO_PAD.decode(state).unwrap()).unwrap();
    let parts: Vec<&str> = decoded.splitn(3, '|').collect();
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0], "https://app.example.com");
}

#[tokio::test]
async fn test_login_callback_uri_follows_host_header() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/auth/google")
                .header(header::HOST, "chat.example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let location = location(&response);
    assert!(location.contains(
        "redirect_uri=https%3A%2F%2Fchat.example.com%2Fauth%2Fgoogle%2Fcallback"
    ));
}

#[tokio::test]
async fn test_callback_provider_error_redirects_to_frontend() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(get("/auth/google/callback?error=access_denied&state=bogus"))
        .await
        .unwrap();

    // A denied consent screen lands the user back on the frontend with the
    // error attached, never on an API error page.
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        location(&response),
        "http://localhost:5173?error=access_denied"
    );
}

#[tokio::test]
async fn test_callback_without_code_is_rejected() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(get("/auth/google/callback?state=bogus"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "bad_request");
}
