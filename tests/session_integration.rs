//! End-to-end session flows over the wire: signup, login, refresh rotation,
//! logout, and the authentication middleware.
//!
//! These tests spin up the real server against a throwaway Postgres database
//! and are ignored by default; run them with
//! `cargo test -- --ignored` once a local Postgres instance is available.

use active_teams::configuration::{get_configuration, DatabaseSettings};
use active_teams::startup::run;
use serde_json::{json, Value};
use sqlx::{Connection, Executor, PgConnection, PgPool};
use std::net::TcpListener;

pub struct TestApp {
    pub address: String,
    pub db_pool: PgPool,
}

async fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let mut configuration = get_configuration().expect("Failed to read configuration.");
    configuration.database.database_name = uuid::Uuid::new_v4().to_string();
    let connection_pool = configure_database(&configuration.database).await;

    let server = run(listener, connection_pool.clone(), configuration.jwt.clone())
        .expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        db_pool: connection_pool,
    }
}

pub async fn configure_database(config: &DatabaseSettings) -> PgPool {
    let mut connection = PgConnection::connect(&config.connection_string_without_db())
        .await
        .expect("Failed to connect to Postgres");
    connection
        .execute(&*format!(r#"CREATE DATABASE "{}";"#, config.database_name))
        .await
        .expect("Failed to create database.");

    let connection_pool = PgPool::connect(&config.connection_string())
        .await
        .expect("Failed to connect to Postgres.");
    sqlx::migrate!("./migrations")
        .run(&connection_pool)
        .await
        .expect("Failed to migrate the database.");
    connection_pool
}

async fn signup(client: &reqwest::Client, address: &str, body: &Value) -> reqwest::Response {
    client
        .post(&format!("{}/auth/signup", address))
        .json(body)
        .send()
        .await
        .expect("Failed to execute request.")
}

fn default_signup_body(email: &str) -> Value {
    json!({
        "name": "Ada",
        "surname": "Lovelace",
        "email": email,
        "password": "Passw0rd"
    })
}

async fn login(client: &reqwest::Client, address: &str, email: &str, password: &str) -> Value {
    let response = client
        .post(&format!("{}/auth/login", address))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());
    response.json().await.expect("Failed to parse response")
}

// --- Signup ---

#[tokio::test]
#[ignore = "requires a running Postgres instance"]
async fn signup_creates_account_without_logging_in() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = signup(&client, &app.address, &default_signup_body("ada@example.com")).await;
    assert_eq!(201, response.status().as_u16());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body.get("user_id").is_some());
    assert!(body.get("access_token").is_none());

    let row: (String, String) =
        sqlx::query_as("SELECT email, role FROM users WHERE email = 'ada@example.com'")
            .fetch_one(&app.db_pool)
            .await
            .expect("Failed to fetch created user");
    assert_eq!(row.0, "ada@example.com");
    assert_eq!(row.1, "user");
}

#[tokio::test]
#[ignore = "requires a running Postgres instance"]
async fn signup_rejects_duplicate_email_with_409() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let body = default_signup_body("ada@example.com");
    assert_eq!(201, signup(&client, &app.address, &body).await.status().as_u16());

    let response = signup(&client, &app.address, &body).await;
    assert_eq!(409, response.status().as_u16());

    let error: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(error["code"], "EMAIL_TAKEN");
}

#[tokio::test]
#[ignore = "requires a running Postgres instance"]
async fn signup_rejects_weak_passwords() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let weak_passwords = vec![
        ("Ab1", "too short"),
        ("lettersonly", "no digits"),
        ("1234567890", "no letters"),
    ];

    for (password, reason) in weak_passwords {
        let mut body = default_signup_body("weak@example.com");
        body["password"] = json!(password);

        let response = signup(&client, &app.address, &body).await;
        assert_eq!(
            400,
            response.status().as_u16(),
            "Should reject weak password: {}",
            reason
        );
    }
}

#[tokio::test]
#[ignore = "requires a running Postgres instance"]
async fn signup_rejects_invalid_emails() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    for invalid_email in ["notanemail", "user@", "@example.com", "user@@example.com"] {
        let response = signup(&client, &app.address, &default_signup_body(invalid_email)).await;
        assert_eq!(
            400,
            response.status().as_u16(),
            "Should reject invalid email: {}",
            invalid_email
        );
    }
}

#[tokio::test]
#[ignore = "requires a running Postgres instance"]
async fn signup_honors_explicit_role() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let mut body = default_signup_body("reg@example.com");
    body["role"] = json!("registrant");
    assert_eq!(201, signup(&client, &app.address, &body).await.status().as_u16());

    let role: (String,) = sqlx::query_as("SELECT role FROM users WHERE email = 'reg@example.com'")
        .fetch_one(&app.db_pool)
        .await
        .expect("Failed to fetch created user");
    assert_eq!(role.0, "registrant");
}

// --- Login ---

#[tokio::test]
#[ignore = "requires a running Postgres instance"]
async fn login_returns_access_token_and_refresh_pair() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    signup(&client, &app.address, &default_signup_body("ada@example.com")).await;

    let body = login(&client, &app.address, "ada@example.com", "Passw0rd").await;
    assert!(body.get("access_token").is_some());
    assert!(body.get("refresh_token_id").is_some());
    assert!(body.get("refresh_token").is_some());
    assert_eq!(body["token_type"], "Bearer");
}

#[tokio::test]
#[ignore = "requires a running Postgres instance"]
async fn login_fails_identically_for_unknown_email_and_wrong_password() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    signup(&client, &app.address, &default_signup_body("ada@example.com")).await;

    for (email, password) in [
        ("ada@example.com", "WrongPass1"),
        ("nobody@example.com", "Passw0rd"),
    ] {
        let response = client
            .post(&format!("{}/auth/login", &app.address))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request.");

        assert_eq!(401, response.status().as_u16());
        let error: Value = response.json().await.expect("Failed to parse response");
        assert_eq!(error["code"], "INVALID_CREDENTIALS");
    }
}

// --- Middleware ---

#[tokio::test]
#[ignore = "requires a running Postgres instance"]
async fn protected_route_returns_401_without_token() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(&format!("{}/auth/me", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["code"], "MISSING_TOKEN");
}

#[tokio::test]
#[ignore = "requires a running Postgres instance"]
async fn protected_route_returns_401_with_invalid_token() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(&format!("{}/auth/me", &app.address))
        .header("Authorization", "Bearer invalid.token.here")
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["code"], "TOKEN_INVALID");
}

#[tokio::test]
#[ignore = "requires a running Postgres instance"]
async fn malformed_authorization_headers_are_401() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    for header in ["Bearer", "Basic dXNlcjpwYXNz", "BearerToken", ""] {
        let response = client
            .get(&format!("{}/auth/me", &app.address))
            .header("Authorization", header)
            .send()
            .await
            .expect("Failed to execute request.");

        assert_eq!(
            401,
            response.status().as_u16(),
            "Should reject malformed header: {}",
            header
        );
    }
}

#[tokio::test]
#[ignore = "requires a running Postgres instance"]
async fn me_returns_profile_with_valid_token() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    signup(&client, &app.address, &default_signup_body("ada@example.com")).await;
    let tokens = login(&client, &app.address, "ada@example.com", "Passw0rd").await;
    let access_token = tokens["access_token"].as_str().unwrap();

    let response = client
        .get(&format!("{}/auth/me", &app.address))
        .header("Authorization", format!("Bearer {}", access_token))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["email"], "ada@example.com");
    assert_eq!(body["name"], "Ada");
    assert_eq!(body["role"], "user");
}

// --- Refresh rotation ---

#[tokio::test]
#[ignore = "requires a running Postgres instance"]
async fn refresh_rotates_the_pair() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    signup(&client, &app.address, &default_signup_body("ada@example.com")).await;
    let tokens = login(&client, &app.address, "ada@example.com", "Passw0rd").await;

    let response = client
        .post(&format!("{}/auth/refresh", &app.address))
        .json(&json!({
            "refresh_token_id": tokens["refresh_token_id"],
            "refresh_token": tokens["refresh_token"],
        }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
    let rotated: Value = response.json().await.expect("Failed to parse response");
    assert_ne!(rotated["refresh_token"], tokens["refresh_token"]);
    assert_ne!(rotated["refresh_token_id"], tokens["refresh_token_id"]);
}

#[tokio::test]
#[ignore = "requires a running Postgres instance"]
async fn rotated_pair_cannot_be_replayed() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    signup(&client, &app.address, &default_signup_body("ada@example.com")).await;
    let tokens = login(&client, &app.address, "ada@example.com", "Passw0rd").await;

    let refresh_body = json!({
        "refresh_token_id": tokens["refresh_token_id"],
        "refresh_token": tokens["refresh_token"],
    });

    let first = client
        .post(&format!("{}/auth/refresh", &app.address))
        .json(&refresh_body)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, first.status().as_u16());

    let replay = client
        .post(&format!("{}/auth/refresh", &app.address))
        .json(&refresh_body)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(401, replay.status().as_u16());

    let error: Value = replay.json().await.expect("Failed to parse response");
    assert_eq!(error["code"], "REFRESH_INVALID");
}

#[tokio::test]
#[ignore = "requires a running Postgres instance"]
async fn refresh_with_unknown_pair_is_401() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(&format!("{}/auth/refresh", &app.address))
        .json(&json!({
            "refresh_token_id": "not-a-known-id",
            "refresh_token": "not-a-known-secret",
        }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
#[ignore = "requires a running Postgres instance"]
async fn refresh_with_missing_fields_is_400() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(&format!("{}/auth/refresh", &app.address))
        .json(&json!({}))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(400, response.status().as_u16());
}

// --- Logout ---

#[tokio::test]
#[ignore = "requires a running Postgres instance"]
async fn logout_revokes_the_refresh_pair() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    signup(&client, &app.address, &default_signup_body("ada@example.com")).await;
    let tokens = login(&client, &app.address, "ada@example.com", "Passw0rd").await;
    let access_token = tokens["access_token"].as_str().unwrap();

    let logout_response = client
        .post(&format!("{}/auth/logout", &app.address))
        .header("Authorization", format!("Bearer {}", access_token))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, logout_response.status().as_u16());

    let replay = client
        .post(&format!("{}/auth/refresh", &app.address))
        .json(&json!({
            "refresh_token_id": tokens["refresh_token_id"],
            "refresh_token": tokens["refresh_token"],
        }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(401, replay.status().as_u16());
}

#[tokio::test]
#[ignore = "requires a running Postgres instance"]
async fn logout_requires_a_valid_token() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(&format!("{}/auth/logout", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
}
