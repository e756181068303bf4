use rust_decimal::Decimal;

use storefront_api::models::CartItem;
use storefront_api::persistence::{CartStore, FileCartStore, PersistedCart};

fn sample_cart() -> PersistedCart {
    PersistedCart {
        server_cart_id: Some("cart-1".to_string()),
        items: vec![CartItem {
            variant_id: "V1".to_string(),
            server_line_id: Some("line-1".to_string()),
            title: "Product V1".to_string(),
            variant_label: "Default".to_string(),
            unit_price: Decimal::new(2500, 2),
            quantity: 2,
            image_url: String::new(),
        }],
    }
}

#[tokio::test]
async fn save_then_load_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileCartStore::new(dir.path());

    store.save("session-1", &sample_cart()).await.unwrap();
    let loaded = store.load("session-1").await.unwrap().unwrap();

    assert_eq!(loaded.server_cart_id.as_deref(), Some("cart-1"));
    assert_eq!(loaded.items, sample_cart().items);
}

#[tokio::test]
async fn missing_session_loads_as_none() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileCartStore::new(dir.path());

    assert!(store.load("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn clear_removes_the_document() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileCartStore::new(dir.path());

    store.save("session-1", &sample_cart()).await.unwrap();
    store.clear("session-1").await.unwrap();

    assert!(store.load("session-1").await.unwrap().is_none());
    // clearing twice is fine
    store.clear("session-1").await.unwrap();
}

#[tokio::test]
async fn corrupt_document_counts_as_no_cart() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileCartStore::new(dir.path());

    tokio::fs::write(dir.path().join("session-1.json"), b"{not json")
        .await
        .unwrap();

    assert!(store.load("session-1").await.unwrap().is_none());
}

#[tokio::test]
async fn hostile_session_keys_stay_inside_the_root() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileCartStore::new(dir.path());

    store.save("../../escape", &sample_cart()).await.unwrap();
    let loaded = store.load("../../escape").await.unwrap();

    assert!(loaded.is_some());
    // nothing was written outside the data dir
    assert!(!dir.path().parent().unwrap().join("escape.json").exists());
}
