//! API integration tests
//!
//! These run against a live server with a fresh database:
//! `cargo test -- --ignored`

use reqwest::Client;
use serde_json::{json, Value};
use uuid::Uuid;

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Register a user with the given permissions and log them in.
/// Returns (user id, bearer token).
async fn register_and_login(client: &Client, permissions: &[&str]) -> (String, String) {
    let email = format!("user-{}@test.com", Uuid::new_v4());

    let response = client
        .post(format!("{}/users", BASE_URL))
        .json(&json!({
            "name": "Test User",
            "email": email,
            "password": "pass123",
            "permissions": permissions
        }))
        .send()
        .await
        .expect("Failed to send register request");
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse register response");
    let user_id = body["id"].as_str().expect("No user id").to_string();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "email": email, "password": "pass123" }))
        .send()
        .await
        .expect("Failed to send login request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse login response");
    let token = body["token"].as_str().expect("No token in response").to_string();

    (user_id, token)
}

/// Create a book through a user holding crear_libro. Returns the book id.
async fn create_book(client: &Client) -> String {
    let (_, token) = register_and_login(client, &["crear_libro"]).await;

    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "title": "Don Quijote", "author": "Cervantes" }))
        .send()
        .await
        .expect("Failed to send create book request");
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse book response");
    body["id"].as_str().expect("No book id").to_string()
}

async fn get_book(client: &Client, book_id: &str) -> Value {
    let response = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send get book request");
    assert!(response.status().is_success());
    response.json().await.expect("Failed to parse book response")
}

#[tokio::test]
#[ignore]
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "email": "nobody@test.com", "password": "wrong" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_duplicate_email_is_rejected() {
    let client = Client::new();
    let email = format!("dup-{}@test.com", Uuid::new_v4());

    let payload = json!({ "name": "A", "email": email, "password": "pass123" });

    let first = client
        .post(format!("{}/users", BASE_URL))
        .json(&payload)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(first.status(), 201);

    let second = client
        .post(format!("{}/users", BASE_URL))
        .json(&payload)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(second.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_unauthenticated_reservation_is_rejected() {
    let client = Client::new();

    let response = client
        .post(format!("{}/reservations", BASE_URL))
        .json(&json!({
            "book_id": Uuid::new_v4(),
            "due_date": "2030-01-01T00:00:00Z"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_create_book_without_permission_is_forbidden() {
    let client = Client::new();
    let (_, token) = register_and_login(&client, &[]).await;

    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "title": "X", "author": "Y" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);
}

#[tokio::test]
#[ignore]
async fn test_reservation_round_trip_restores_availability() {
    let client = Client::new();
    let book_id = create_book(&client).await;
    let (user_id, token) = register_and_login(&client, &[]).await;

    assert_eq!(get_book(&client, &book_id).await["available"], true);

    // Reserve the book
    let response = client
        .post(format!("{}/reservations", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "book_id": book_id, "due_date": "2030-01-01T00:00:00Z" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    let reservation: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(reservation["user_id"], user_id.as_str());
    assert_eq!(reservation["returned"], false);
    let reservation_id = reservation["id"].as_str().expect("No reservation id");

    assert_eq!(get_book(&client, &book_id).await["available"], false);

    // Return the book
    let response = client
        .post(format!("{}/reservations/{}/return", BASE_URL, reservation_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let returned: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(returned["returned"], true);

    assert_eq!(get_book(&client, &book_id).await["available"], true);
}

#[tokio::test]
#[ignore]
async fn test_reserving_an_unavailable_book_is_rejected() {
    let client = Client::new();
    let book_id = create_book(&client).await;
    let (_, token) = register_and_login(&client, &[]).await;

    let reserve = |c: Client, t: String, b: String| async move {
        c.post(format!("{}/reservations", BASE_URL))
            .header("Authorization", format!("Bearer {}", t))
            .json(&json!({ "book_id": b, "due_date": "2030-01-01T00:00:00Z" }))
            .send()
            .await
            .expect("Failed to send request")
    };

    let first = reserve(client.clone(), token.clone(), book_id.clone()).await;
    assert_eq!(first.status(), 201);

    let second = reserve(client.clone(), token, book_id).await;
    assert_eq!(second.status(), 422);
}

#[tokio::test]
#[ignore]
async fn test_reserving_a_disabled_book_is_rejected() {
    let client = Client::new();
    let book_id = create_book(&client).await;

    let (_, disabler_token) = register_and_login(&client, &["inhabilitar_libro"]).await;
    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", disabler_token))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let (_, token) = register_and_login(&client, &[]).await;
    let response = client
        .post(format!("{}/reservations", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "book_id": book_id, "due_date": "2030-01-01T00:00:00Z" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 422);
}

#[tokio::test]
#[ignore]
async fn test_concurrent_reservations_one_wins() {
    let client = Client::new();
    let book_id = create_book(&client).await;
    let (_, token_a) = register_and_login(&client, &[]).await;
    let (_, token_b) = register_and_login(&client, &[]).await;

    let reserve = |t: String| {
        let client = client.clone();
        let book_id = book_id.clone();
        async move {
            client
                .post(format!("{}/reservations", BASE_URL))
                .header("Authorization", format!("Bearer {}", t))
                .json(&json!({ "book_id": book_id, "due_date": "2030-01-01T00:00:00Z" }))
                .send()
                .await
                .expect("Failed to send request")
                .status()
                .as_u16()
        }
    };

    let (a, b) = tokio::join!(reserve(token_a), reserve(token_b));

    let mut outcomes = [a, b];
    outcomes.sort();
    assert_eq!(outcomes, [201, 422]);
}

#[tokio::test]
#[ignore]
async fn test_missing_due_date_is_a_validation_error() {
    let client = Client::new();
    let book_id = create_book(&client).await;
    let (_, token) = register_and_login(&client, &[]).await;

    let response = client
        .post(format!("{}/reservations", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
    assert_eq!(get_book(&client, &book_id).await["available"], true);
}

#[tokio::test]
#[ignore]
async fn test_returning_twice_is_rejected() {
    let client = Client::new();
    let book_id = create_book(&client).await;
    let (_, token) = register_and_login(&client, &[]).await;

    let response = client
        .post(format!("{}/reservations", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "book_id": book_id, "due_date": "2030-01-01T00:00:00Z" }))
        .send()
        .await
        .expect("Failed to send request");
    let reservation: Value = response.json().await.expect("Failed to parse response");
    let reservation_id = reservation["id"].as_str().expect("No reservation id");

    let first = client
        .post(format!("{}/reservations/{}/return", BASE_URL, reservation_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert!(first.status().is_success());

    let second = client
        .post(format!("{}/reservations/{}/return", BASE_URL, reservation_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(second.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_self_update_allowed_foreign_update_forbidden() {
    let client = Client::new();
    let (own_id, token) = register_and_login(&client, &[]).await;
    let (other_id, _) = register_and_login(&client, &[]).await;

    let response = client
        .put(format!("{}/users/{}", BASE_URL, own_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "name": "Renamed" }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["name"], "Renamed");

    let response = client
        .put(format!("{}/users/{}", BASE_URL, other_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "name": "Hijacked" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 403);
}

#[tokio::test]
#[ignore]
async fn test_foreign_update_with_permission_allowed() {
    let client = Client::new();
    let (_, admin_token) = register_and_login(&client, &["modificar_usuario"]).await;
    let (target_id, _) = register_and_login(&client, &[]).await;

    let response = client
        .put(format!("{}/users/{}", BASE_URL, target_id))
        .header("Authorization", format!("Bearer {}", admin_token))
        .json(&json!({ "name": "Managed" }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_soft_delete_is_idempotent() {
    let client = Client::new();
    let (_, admin_token) = register_and_login(&client, &["inhabilitar_usuario"]).await;
    let (target_id, _) = register_and_login(&client, &[]).await;

    for _ in 0..2 {
        let response = client
            .delete(format!("{}/users/{}", BASE_URL, target_id))
            .header("Authorization", format!("Bearer {}", admin_token))
            .send()
            .await
            .expect("Failed to send request");
        assert!(response.status().is_success());

        let body: Value = response.json().await.expect("Failed to parse response");
        assert_eq!(body["enabled"], false);
    }

    // Disabled users are invisible to reads
    let response = client
        .get(format!("{}/users/{}", BASE_URL, target_id))
        .header("Authorization", format!("Bearer {}", admin_token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_reservation_listings_expand_references() {
    let client = Client::new();
    let book_id = create_book(&client).await;
    let (user_id, token) = register_and_login(&client, &[]).await;

    let response = client
        .post(format!("{}/reservations", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "book_id": book_id, "due_date": "2030-01-01T00:00:00Z" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    let response = client
        .get(format!("{}/books/{}/reservations", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    let by_book: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(by_book[0]["user_id"], user_id.as_str());
    assert_eq!(by_book[0]["user_name"], "Test User");
    assert!(by_book[0]["user_email"].is_string());

    let response = client
        .get(format!("{}/users/{}/reservations", BASE_URL, user_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    let by_user: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(by_user[0]["book_title"], "Don Quijote");
    assert_eq!(by_user[0]["book_author"], "Cervantes");
}

#[tokio::test]
#[ignore]
async fn test_generic_book_update_cannot_override_availability() {
    let client = Client::new();
    let book_id = create_book(&client).await;
    let (_, reserver_token) = register_and_login(&client, &[]).await;
    let (_, editor_token) = register_and_login(&client, &["modificar_libro"]).await;

    let response = client
        .post(format!("{}/reservations", BASE_URL))
        .header("Authorization", format!("Bearer {}", reserver_token))
        .json(&json!({ "book_id": book_id, "due_date": "2030-01-01T00:00:00Z" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    // The update path ignores engine-owned fields
    let response = client
        .put(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", editor_token))
        .json(&json!({ "title": "Renamed", "available": true }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let book = get_book(&client, &book_id).await;
    assert_eq!(book["title"], "Renamed");
    assert_eq!(book["available"], false);
}
