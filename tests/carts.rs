mod common;

use serde_json::{Value, json};

use common::TestServer;

async fn setup_cart(server: &TestServer) -> (i64, i64) {
    let user_id = server.create_user("alice", "pw").await;
    let resp = server
        .client
        .post(server.url(&format!("/api/cart/{user_id}/")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    let item = server
        .create_item(json!({"name": "Shirt", "price": 10, "stock": 5}))
        .await;
    (user_id, item["id"].as_i64().unwrap())
}

async fn add(server: &TestServer, cart_id: i64, body: Value) -> reqwest::Response {
    server
        .client
        .put(server.url(&format!("/api/cart/item/{cart_id}/")))
        .json(&body)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_create_cart() {
    let server = TestServer::start().await;
    let user_id = server.create_user("alice", "pw").await;

    let resp = server
        .client
        .post(server.url(&format!("/api/cart/{user_id}/")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({"id": user_id, "items": []}));

    let resp = server
        .client
        .post(server.url(&format!("/api/cart/{user_id}/")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["error"],
        format!("Cart with id {user_id} already exists")
    );
}

#[tokio::test]
async fn test_create_cart_for_missing_user() {
    let server = TestServer::start().await;

    let resp = server
        .client
        .post(server.url("/api/cart/99/"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "User with id 99 not found");
}

#[tokio::test]
async fn test_adding_same_item_twice_sums_quantity() {
    let server = TestServer::start().await;
    let (cart_id, item_id) = setup_cart(&server).await;

    let resp = add(&server, cart_id, json!({"item_id": item_id, "quantity": 2})).await;
    assert_eq!(resp.status(), 200);

    let resp = add(&server, cart_id, json!({"item_id": item_id, "quantity": 3})).await;
    assert_eq!(resp.status(), 200);
    let cart: Value = resp.json().await.unwrap();

    let lines = cart["items"].as_array().unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["quantity"], 5);
    assert_eq!(lines[0]["item_id"], item_id);
    assert_eq!(lines[0]["cart_id"], cart_id);
}

#[tokio::test]
async fn test_add_item_errors() {
    let server = TestServer::start().await;
    let (cart_id, item_id) = setup_cart(&server).await;

    let resp = add(&server, cart_id, json!({"item_id": item_id, "quantity": 0})).await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Quantity must be greater than 0");

    let resp = add(&server, cart_id, json!({"item_id": 999, "quantity": 1})).await;
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Item with id 999 not found");

    let resp = add(&server, 999, json!({"item_id": item_id, "quantity": 1})).await;
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Cart with id 999 not found");

    let resp = add(&server, cart_id, json!({"item_id": item_id})).await;
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_add_item_quantity_overflow() {
    let server = TestServer::start().await;
    let (cart_id, item_id) = setup_cart(&server).await;

    let resp = add(&server, cart_id, json!({"item_id": item_id, "quantity": i64::MAX})).await;
    assert_eq!(resp.status(), 200);

    let resp = add(&server, cart_id, json!({"item_id": item_id, "quantity": 1})).await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Quantity is too large");
}

#[tokio::test]
async fn test_remove_item() {
    let server = TestServer::start().await;
    let (cart_id, item_id) = setup_cart(&server).await;
    add(&server, cart_id, json!({"item_id": item_id, "quantity": 1})).await;

    let remove = || {
        server
            .client
            .delete(server.url(&format!("/api/cart/item/{cart_id}/")))
            .json(&json!({"item_id": item_id}))
            .send()
    };

    let resp = remove().await.unwrap();
    assert_eq!(resp.status(), 200);
    let cart: Value = resp.json().await.unwrap();
    assert_eq!(cart, json!({"id": cart_id, "items": []}));

    // Removing an absent line is a no-op.
    let resp = remove().await.unwrap();
    assert_eq!(resp.status(), 200);

    let resp = server
        .client
        .delete(server.url(&format!("/api/cart/item/{cart_id}/")))
        .json(&json!({"item_id": 999}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_delete_cart() {
    let server = TestServer::start().await;
    let (cart_id, item_id) = setup_cart(&server).await;
    add(&server, cart_id, json!({"item_id": item_id, "quantity": 4})).await;

    let resp = server
        .client
        .delete(server.url(&format!("/api/cart/{cart_id}/")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({"message": "cart deleted"}));

    let resp = server
        .client
        .get(server.url(&format!("/api/cart/{cart_id}/")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], format!("Cart with id {cart_id} not found"));

    let resp = server
        .client
        .delete(server.url(&format!("/api/cart/{cart_id}/")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_list_carts() {
    let server = TestServer::start().await;
    let (cart_id, item_id) = setup_cart(&server).await;
    add(&server, cart_id, json!({"item_id": item_id, "quantity": 1})).await;

    let carts: Value = server
        .client
        .get(server.url("/api/cart/"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let carts = carts.as_array().unwrap();
    assert_eq!(carts.len(), 1);
    assert_eq!(carts[0]["id"], cart_id);
    assert_eq!(carts[0]["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_deleting_item_drops_cart_lines() {
    let server = TestServer::start().await;
    let (cart_id, item_id) = setup_cart(&server).await;
    add(&server, cart_id, json!({"item_id": item_id, "quantity": 1})).await;

    server
        .client
        .delete(server.url(&format!("/api/item/{item_id}/")))
        .send()
        .await
        .unwrap();

    let cart: Value = server
        .client
        .get(server.url(&format!("/api/cart/{cart_id}/")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cart["items"], json!([]));
}
