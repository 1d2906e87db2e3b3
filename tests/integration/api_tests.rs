//! API integration tests
//!
//! Need a running server started with `interface.mode = "api"`.

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api";

/// Suffix keeping isbns and names unique across runs
fn unique() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock before epoch")
        .as_nanos();
    format!("{}", nanos)
}

async fn create(client: &Client, path: &str, body: Value) -> Value {
    let response = client
        .post(format!("{}/{}", BASE_URL, path))
        .json(&body)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201, "creating {}", path);
    response.json().await.expect("Failed to parse response")
}

async fn create_author(client: &Client) -> i64 {
    let author = create(
        client,
        "authors",
        json!({ "name": format!("Author {}", unique()), "nationality": "Argentine" }),
    )
    .await;
    author["id"].as_i64().expect("No id in response")
}

async fn create_category(client: &Client) -> i64 {
    let category = create(client, "categories", json!({ "name": format!("Category {}", unique()) })).await;
    category["id"].as_i64().expect("No id in response")
}

fn book_body(author_id: i64, categories: &[i64]) -> Value {
    json!({
        "title": "Ficciones",
        "isbn": format!("isbn-{}", unique()),
        "published_year": 1944,
        "price": 12.5,
        "stock": 3,
        "author_id": author_id,
        "categories": categories,
    })
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
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
async fn test_create_book_embeds_author_and_categories() {
    let client = Client::new();
    let author_id = create_author(&client).await;
    let category_id = create_category(&client).await;

    let book = create(&client, "books", book_body(author_id, &[category_id, category_id])).await;

    assert_eq!(book["author"]["id"], author_id);
    assert_eq!(book["categories"].as_array().map(|c| c.len()), Some(1));
    assert_eq!(book["categories"][0]["id"], category_id);

    let list: Value = client
        .get(format!("{}/books", BASE_URL))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    let listed = list
        .as_array()
        .expect("Book list is not an array")
        .iter()
        .find(|b| b["id"] == book["id"])
        .expect("Created book missing from list");
    assert_eq!(listed["author"]["id"], author_id);
}

#[tokio::test]
#[ignore]
async fn test_duplicate_isbn_conflicts() {
    let client = Client::new();
    let author_id = create_author(&client).await;
    let body = book_body(author_id, &[]);
    create(&client, "books", body.clone()).await;

    let response = client
        .post(format!("{}/books", BASE_URL))
        .json(&body)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 409);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["errors"]["isbn"].is_array());
}

#[tokio::test]
#[ignore]
async fn test_unknown_author_is_rejected() {
    let client = Client::new();

    let response = client
        .post(format!("{}/books", BASE_URL))
        .json(&book_body(i32::MAX as i64, &[]))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 422);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["errors"]["author_id"].is_array());
}

#[tokio::test]
#[ignore]
async fn test_update_syncs_categories() {
    let client = Client::new();
    let author_id = create_author(&client).await;
    let first = create_category(&client).await;
    let second = create_category(&client).await;
    let book = create(&client, "books", book_body(author_id, &[first])).await;

    let mut body = book_body(author_id, &[second]);
    body["isbn"] = book["isbn"].clone();
    let response = client
        .put(format!("{}/books/{}", BASE_URL, book["id"]))
        .json(&body)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 200);
    let updated: Value = response.json().await.expect("Failed to parse response");
    let ids: Vec<i64> = updated["categories"]
        .as_array()
        .expect("No categories")
        .iter()
        .filter_map(|c| c["id"].as_i64())
        .collect();
    assert_eq!(ids, vec![second]);
}

#[tokio::test]
#[ignore]
async fn test_update_without_categories_key_detaches_all() {
    let client = Client::new();
    let author_id = create_author(&client).await;
    let first = create_category(&client).await;
    let second = create_category(&client).await;
    let book = create(&client, "books", book_body(author_id, &[first, second])).await;
    assert_eq!(book["categories"].as_array().map(|c| c.len()), Some(2));

    let mut body = book_body(author_id, &[]);
    body["isbn"] = book["isbn"].clone();
    body.as_object_mut()
        .expect("Book body is not an object")
        .remove("categories");
    let response = client
        .put(format!("{}/books/{}", BASE_URL, book["id"]))
        .json(&body)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);

    let fetched: Value = client
        .get(format!("{}/books/{}", BASE_URL, book["id"]))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(fetched["categories"], json!([]));
}

#[tokio::test]
#[ignore]
async fn test_deleting_book_removes_its_category_links() {
    let client = Client::new();
    let author_id = create_author(&client).await;
    let category_id = create_category(&client).await;
    let book = create(&client, "books", book_body(author_id, &[category_id])).await;

    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book["id"]))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);

    let category: Value = client
        .get(format!("{}/categories/{}", BASE_URL, category_id))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(category["books"], json!([]));

    let response = client
        .get(format!("{}/books/{}", BASE_URL, book["id"]))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_health_at_root() {
    let client = Client::new();
    let root = BASE_URL.trim_end_matches("/api");

    let response = client
        .get(format!("{}/health", root))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_author_with_books_cannot_be_deleted() {
    let client = Client::new();
    let author_id = create_author(&client).await;
    let book = create(&client, "books", book_body(author_id, &[])).await;

    let response = client
        .delete(format!("{}/authors/{}", BASE_URL, author_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book["id"]))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);

    let response = client
        .delete(format!("{}/authors/{}", BASE_URL, author_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);
}

#[tokio::test]
#[ignore]
async fn test_deleting_category_detaches_books() {
    let client = Client::new();
    let author_id = create_author(&client).await;
    let category_id = create_category(&client).await;
    let book = create(&client, "books", book_body(author_id, &[category_id])).await;

    let response = client
        .delete(format!("{}/categories/{}", BASE_URL, category_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);

    let fetched: Value = client
        .get(format!("{}/books/{}", BASE_URL, book["id"]))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(fetched["categories"], json!([]));
}

#[tokio::test]
#[ignore]
async fn test_missing_book_is_not_found() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books/{}", BASE_URL, i32::MAX))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 404);
}
