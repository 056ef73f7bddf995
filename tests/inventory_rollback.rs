use std::sync::Arc;
use std::time::Duration;

use quickcart::application::admin::snapshots::SnapshotServiceError;
use quickcart::application::catalog::{
    CreateCategoryCommand, CreateProductCommand, UpdateProductCommand,
};
use quickcart::application::repos::{ProductListFilter, ProductsRepo, ProductsWriteRepo};
use quickcart::cache::{CacheConfig, CacheStatus};
use quickcart::domain::catalog::{CategoryRecord, ProductRecord};
use quickcart::domain::error::DomainError;
use quickcart::domain::ids::RecordId;
use quickcart::infra::http::{ADMIN_ACTOR, AppState};
use quickcart::infra::memory::InMemoryRepositories;

fn app() -> (Arc<InMemoryRepositories>, AppState) {
    let repos = Arc::new(InMemoryRepositories::new());
    let state =
        AppState::from_repositories(repos.clone(), CacheConfig::default(), Duration::from_secs(5));
    (repos, state)
}

async fn create_category(state: &AppState, name: &str) -> CategoryRecord {
    state
        .admin
        .create_category(
            ADMIN_ACTOR,
            CreateCategoryCommand {
                name: name.to_string(),
                description: None,
                image: None,
                display_order: 0,
                priority: 0,
                is_active: true,
            },
        )
        .await
        .expect("create category")
}

async fn create_product(
    state: &AppState,
    name: &str,
    category: &CategoryRecord,
    price: f64,
    original_price: Option<f64>,
) -> ProductRecord {
    state
        .admin
        .create_product(
            ADMIN_ACTOR,
            CreateProductCommand {
                name: name.to_string(),
                description: None,
                category_id: category.id.to_hex(),
                price,
                original_price,
                unit: None,
                stock: 5,
                is_active: true,
                is_featured: false,
                images: Vec::new(),
                tags: Vec::new(),
                delivery_time: None,
            },
        )
        .await
        .expect("create product")
}

/// Product state without bookkeeping timestamps.
fn catalog_state(products: &[ProductRecord]) -> Vec<(RecordId, String, String, f64, i32)> {
    let mut state: Vec<_> = products
        .iter()
        .map(|product| {
            (
                product.id,
                product.name.clone(),
                product.slug.clone(),
                product.price,
                product.stock,
            )
        })
        .collect();
    state.sort_by_key(|entry| entry.0);
    state
}

#[tokio::test]
async fn snacks_example_reports_unresolvable_category() {
    let (repos, state) = app();
    let snacks = create_category(&state, "Snacks").await;
    assert_eq!(snacks.slug, "snacks");

    let chips = create_product(&state, "Potato Chips", &snacks, 50.0, Some(60.0)).await;
    assert_eq!(chips.discount, Some(17));

    state
        .admin
        .delete_category(ADMIN_ACTOR, &snacks.id.to_hex())
        .await
        .expect("delete snacks");
    let snapshot = state
        .snapshots
        .create_snapshot(ADMIN_ACTOR, None)
        .await
        .expect("create snapshot");
    assert_eq!(snapshot.product_count, 1);
    assert!(snapshot.name.starts_with("Snapshot "));

    repos.delete_product(chips.id).await.expect("delete chips");

    let report = state
        .snapshots
        .rollback(ADMIN_ACTOR, &snapshot.id)
        .await
        .expect("rollback");

    assert!(report.success);
    assert_eq!(report.stats.created, 0);
    assert_eq!(report.stats.restored, 0);
    assert_eq!(report.stats.errors, 1);
    let errors = report.errors.expect("errors present");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0], "Potato Chips: category not found");
}

#[tokio::test]
async fn repeated_rollback_restores_same_state() {
    let (repos, state) = app();
    let dairy = create_category(&state, "Dairy").await;
    let milk = create_product(&state, "Milk", &dairy, 30.0, None).await;
    create_product(&state, "Paneer", &dairy, 90.0, Some(100.0)).await;

    let snapshot = state
        .snapshots
        .create_snapshot(ADMIN_ACTOR, Some("Before sale"))
        .await
        .expect("create snapshot");
    let captured = catalog_state(&repos.list_products().await.expect("list"));

    state
        .admin
        .update_product(
            ADMIN_ACTOR,
            &milk.id.to_hex(),
            UpdateProductCommand {
                price: Some(10.0),
                stock: Some(0),
                ..Default::default()
            },
        )
        .await
        .expect("discount milk");

    let first = state
        .snapshots
        .rollback(ADMIN_ACTOR, &snapshot.id)
        .await
        .expect("first rollback");
    let after_first = catalog_state(&repos.list_products().await.expect("list"));

    let second = state
        .snapshots
        .rollback(ADMIN_ACTOR, &snapshot.id)
        .await
        .expect("second rollback");
    let after_second = catalog_state(&repos.list_products().await.expect("list"));

    assert_eq!(after_first, captured);
    assert_eq!(after_second, after_first);
    assert_eq!(first.stats.restored, 2);
    assert_eq!(second.stats.restored, 2);
    assert_eq!(second.stats.created, 0);
    assert!(second.errors.is_none());
}

#[tokio::test]
async fn partial_failure_keeps_restoring_other_products() {
    let (repos, state) = app();
    let dairy = create_category(&state, "Dairy").await;
    let frozen = create_category(&state, "Frozen").await;
    let milk = create_product(&state, "Milk", &dairy, 30.0, None).await;
    let peas = create_product(&state, "Green Peas", &frozen, 45.0, None).await;

    let snapshot = state
        .snapshots
        .create_snapshot(ADMIN_ACTOR, None)
        .await
        .expect("create snapshot");

    state
        .admin
        .update_product(
            ADMIN_ACTOR,
            &milk.id.to_hex(),
            UpdateProductCommand {
                stock: Some(0),
                ..Default::default()
            },
        )
        .await
        .expect("sell out milk");
    state
        .admin
        .delete_category(ADMIN_ACTOR, &frozen.id.to_hex())
        .await
        .expect("delete frozen");
    repos.delete_product(peas.id).await.expect("delete peas");

    let report = state
        .snapshots
        .rollback(ADMIN_ACTOR, &snapshot.id)
        .await
        .expect("rollback");

    assert_eq!(report.stats.restored, 1);
    assert_eq!(report.stats.created, 0);
    assert_eq!(
        report.errors.as_deref(),
        Some(&["Green Peas: category not found".to_string()][..])
    );

    let restored = repos
        .find_product(milk.id)
        .await
        .expect("find")
        .expect("milk exists");
    assert_eq!(restored.stock, 5);
}

#[tokio::test]
async fn missing_product_is_recreated_under_category_with_same_name() {
    let (repos, state) = app();
    let bakery = create_category(&state, "Bakery").await;
    let bread = create_product(&state, "Brown Bread", &bakery, 40.0, None).await;

    let snapshot = state
        .snapshots
        .create_snapshot(ADMIN_ACTOR, None)
        .await
        .expect("create snapshot");

    state
        .admin
        .delete_category(ADMIN_ACTOR, &bakery.id.to_hex())
        .await
        .expect("delete bakery");
    let replacement = create_category(&state, "Bakery").await;
    repos.delete_product(bread.id).await.expect("delete bread");

    let report = state
        .snapshots
        .rollback(ADMIN_ACTOR, &snapshot.id)
        .await
        .expect("rollback");
    assert_eq!(report.stats.created, 1);
    assert!(report.errors.is_none());

    let recreated = repos
        .find_product_by_slug("brown-bread")
        .await
        .expect("find")
        .expect("bread recreated");
    assert_ne!(recreated.id, bread.id);
    assert_eq!(recreated.category_id, replacement.id);
}

#[tokio::test]
async fn recreated_product_avoids_taken_slug() {
    let (repos, state) = app();
    let dairy = create_category(&state, "Dairy").await;
    let milk = create_product(&state, "Milk", &dairy, 30.0, None).await;

    let snapshot = state
        .snapshots
        .create_snapshot(ADMIN_ACTOR, None)
        .await
        .expect("create snapshot");

    repos.delete_product(milk.id).await.expect("delete milk");
    let newcomer = create_product(&state, "Milk", &dairy, 32.0, None).await;
    assert_eq!(newcomer.slug, "milk");

    let report = state
        .snapshots
        .rollback(ADMIN_ACTOR, &snapshot.id)
        .await
        .expect("rollback");
    assert_eq!(report.stats.created, 1);

    let products = repos.list_products().await.expect("list");
    assert_eq!(products.len(), 2);
    let suffixed = products
        .iter()
        .find(|product| product.id != newcomer.id)
        .expect("recreated milk");
    let suffix = suffixed
        .slug
        .strip_prefix("milk-")
        .expect("timestamp suffix");
    assert!(suffix.chars().all(|c| c.is_ascii_digit()));
}

#[tokio::test]
async fn rollback_takes_backup_and_refreshes_listing() {
    let (repos, state) = app();
    let dairy = create_category(&state, "Dairy").await;
    let milk = create_product(&state, "Milk", &dairy, 30.0, None).await;

    let snapshot = state
        .snapshots
        .create_snapshot(ADMIN_ACTOR, Some("Morning"))
        .await
        .expect("create snapshot");
    state
        .admin
        .update_product(
            ADMIN_ACTOR,
            &milk.id.to_hex(),
            UpdateProductCommand {
                price: Some(35.0),
                ..Default::default()
            },
        )
        .await
        .expect("raise price");

    let cached = state.catalog.list_products(ProductListFilter::default()).await;
    assert_eq!(cached.items[0].price, 35.0);

    let report = state
        .snapshots
        .rollback(ADMIN_ACTOR, &snapshot.id)
        .await
        .expect("rollback");

    let listing = state.catalog.list_products(ProductListFilter::default()).await;
    assert_eq!(listing.cache, CacheStatus::Miss);
    assert_eq!(listing.items[0].price, 30.0);

    let backup = state
        .snapshots
        .find(&report.backup_snapshot_id)
        .await
        .expect("backup stored");
    assert_eq!(backup.summary.name, "Auto-backup before rollback to Morning");
    assert_eq!(backup.products.len(), 1);
    assert_eq!(backup.products[0].price, 35.0);
    assert_eq!(backup.products[0].category_name.as_deref(), Some("Dairy"));

    let listed = state.snapshots.list(None).await.expect("list snapshots");
    assert_eq!(listed.len(), 2);

    let audit = repos.audit_entries().await;
    let entry = audit
        .iter()
        .find(|entry| entry.action == "inventory.rollback")
        .expect("rollback audited");
    assert_eq!(entry.entity_id.as_deref(), Some(snapshot.id.as_str()));
    let payload: serde_json::Value =
        serde_json::from_str(entry.payload_text.as_deref().expect("payload")).expect("json");
    assert_eq!(payload["restored"], 1);
    assert_eq!(payload["backup_snapshot_id"], report.backup_snapshot_id);
    assert!(payload["errors"].is_null());
}

#[tokio::test]
async fn rollback_rejects_unknown_and_malformed_ids() {
    let (_, state) = app();

    let missing = state
        .snapshots
        .rollback(ADMIN_ACTOR, &RecordId::generate().to_hex())
        .await
        .expect_err("unknown snapshot");
    assert!(matches!(missing, SnapshotServiceError::NotFound(_)));

    let malformed = state
        .snapshots
        .rollback(ADMIN_ACTOR, "not-an-id")
        .await
        .expect_err("malformed id");
    assert!(matches!(
        malformed,
        SnapshotServiceError::Domain(DomainError::Validation { .. })
    ));

    assert!(state.snapshots.list(None).await.expect("list").is_empty());
}
