//! End-to-end checkout, refund, and top-up properties against a real
//! database. These tests run only when TEST_DATABASE_URL points at a
//! disposable Postgres instance and skip silently otherwise.

use bigdecimal::BigDecimal;
use chrono::Utc;
use sqlx::migrate::Migrator;
use sqlx::PgPool;
use std::path::Path;
use uuid::Uuid;

use chika_pos::db::models::{Customer, Product, Store, TableSession};
use chika_pos::db::queries;
use chika_pos::domain::checkout::{CartLine, PaymentIntent};
use chika_pos::error::AppError;
use chika_pos::services::{
    CheckoutRequest, CheckoutService, Notifier, RefundService, SettingsCache, TopUpService,
};

async fn test_pool() -> Option<PgPool> {
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set, skipping database test");
        return None;
    };

    let pool = PgPool::connect(&url).await.expect("connect to test db");
    let migrator = Migrator::new(Path::join(
        Path::new(env!("CARGO_MANIFEST_DIR")),
        "migrations",
    ))
    .await
    .expect("load migrations");
    migrator.run(&pool).await.expect("run migrations");

    Some(pool)
}

fn checkout_service(pool: &PgPool) -> CheckoutService {
    CheckoutService::new(pool.clone(), SettingsCache::with_defaults(), Notifier::disabled())
}

fn refund_service(pool: &PgPool) -> RefundService {
    RefundService::new(pool.clone(), SettingsCache::with_defaults(), Notifier::disabled())
}

fn topup_service(pool: &PgPool) -> TopUpService {
    TopUpService::new(pool.clone(), SettingsCache::with_defaults(), Notifier::disabled())
}

async fn seed_store(pool: &PgPool, balance: i64) -> Store {
    let suffix = Uuid::new_v4().simple().to_string();
    let now = Utc::now();
    queries::insert_store(
        pool,
        &Store {
            id: Uuid::new_v4(),
            name: "Warung Uji".to_string(),
            owner_name: "Penguji".to_string(),
            phone: "081234567890".to_string(),
            catalog_slug: format!("warung-uji-{}", suffix),
            api_key: format!("cpos_test_{}", suffix),
            pradana_token_balance: BigDecimal::from(balance),
            transaction_counter: 0,
            first_transaction_date: None,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .expect("seed store")
}

async fn seed_product(pool: &PgPool, store_id: Uuid, name: &str, price: i64, stock: i64) -> Product {
    let now = Utc::now();
    queries::insert_product(
        pool,
        &Product {
            id: Uuid::new_v4(),
            store_id,
            name: name.to_string(),
            price: BigDecimal::from(price),
            stock,
            category: None,
            image_url: None,
            is_listed: true,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .expect("seed product")
}

async fn seed_customer(pool: &PgPool, store_id: Uuid, points: i64) -> Customer {
    let now = Utc::now();
    let customer = Customer {
        id: Uuid::new_v4(),
        store_id,
        name: "Pelanggan Uji".to_string(),
        phone: None,
        loyalty_points: 0,
        created_at: now,
        updated_at: now,
    };
    let inserted = queries::insert_customer(pool, &customer).await.expect("seed customer");
    if points != 0 {
        let mut tx = pool.begin().await.unwrap();
        queries::adjust_customer_points(&mut tx, inserted.id, points)
            .await
            .unwrap();
        tx.commit().await.unwrap();
    }
    queries::get_customer(pool, store_id, inserted.id).await.unwrap()
}

fn cart(product: &Product, quantity: i64) -> CheckoutRequest {
    CheckoutRequest {
        items: vec![CartLine {
            product_id: product.id,
            quantity,
            price: product.price.clone(),
        }],
        customer_id: None,
        discount: None,
        points_to_redeem: None,
        payment: PaymentIntent::Paid,
        payment_method: Some("CASH".to_string()),
        table_session_id: None,
    }
}

#[tokio::test]
async fn checkout_moves_stock_balance_and_counter_together() {
    let Some(pool) = test_pool().await else { return };
    let store = seed_store(&pool, 10).await;
    let product = seed_product(&pool, store.id, "Kopi Susu", 10_000, 5).await;

    let record = checkout_service(&pool)
        .checkout(store.id, cart(&product, 2))
        .await
        .expect("checkout succeeds");

    // The worked example: total 20_000 -> fee 0.5 token.
    assert_eq!(record.receipt_number, 1);
    assert_eq!(record.total_amount, BigDecimal::from(20_000));
    assert_eq!(record.fee_tokens, "0.5".parse().unwrap());
    assert_eq!(record.status, "Selesai Dibayar");

    let product_after = queries::get_product(&pool, store.id, product.id).await.unwrap();
    assert_eq!(product.stock - product_after.stock, 2);

    let store_after = queries::get_store(&pool, store.id).await.unwrap();
    assert_eq!(store_after.pradana_token_balance, "9.5".parse().unwrap());
    assert_eq!(store_after.transaction_counter, 1);
    assert!(store_after.first_transaction_date.is_some());
}

#[tokio::test]
async fn receipt_numbers_count_up_from_one() {
    let Some(pool) = test_pool().await else { return };
    let store = seed_store(&pool, 100).await;
    let product = seed_product(&pool, store.id, "Teh Manis", 5_000, 50).await;

    let service = checkout_service(&pool);
    for expected in 1..=3 {
        let record = service
            .checkout(store.id, cart(&product, 1))
            .await
            .expect("checkout succeeds");
        assert_eq!(record.receipt_number, expected);
    }
}

#[tokio::test]
async fn insufficient_stock_aborts_without_any_state_change() {
    let Some(pool) = test_pool().await else { return };
    let store = seed_store(&pool, 10).await;
    let product = seed_product(&pool, store.id, "Es Jeruk", 6_000, 1).await;

    let err = checkout_service(&pool)
        .checkout(store.id, cart(&product, 3))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InsufficientStock(_)));
    assert!(err.to_string().contains("Es Jeruk"));

    let product_after = queries::get_product(&pool, store.id, product.id).await.unwrap();
    let store_after = queries::get_store(&pool, store.id).await.unwrap();
    assert_eq!(product_after.stock, 1);
    assert_eq!(store_after.pradana_token_balance, BigDecimal::from(10));
    assert_eq!(store_after.transaction_counter, 0);
    assert!(store_after.first_transaction_date.is_none());
}

#[tokio::test]
async fn insufficient_balance_aborts_without_any_state_change() {
    let Some(pool) = test_pool().await else { return };
    let store = seed_store(&pool, 0).await;
    let product = seed_product(&pool, store.id, "Kopi", 10_000, 5).await;

    let err = checkout_service(&pool)
        .checkout(store.id, cart(&product, 1))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InsufficientBalance(_)));

    let product_after = queries::get_product(&pool, store.id, product.id).await.unwrap();
    assert_eq!(product_after.stock, 5);
    let store_after = queries::get_store(&pool, store.id).await.unwrap();
    assert_eq!(store_after.transaction_counter, 0);
}

#[tokio::test]
async fn refund_restores_stock_balance_and_points() {
    let Some(pool) = test_pool().await else { return };
    let store = seed_store(&pool, 10).await;
    let product = seed_product(&pool, store.id, "Nasi Goreng", 25_000, 10).await;
    let customer = seed_customer(&pool, store.id, 30).await;

    let mut request = cart(&product, 2);
    request.customer_id = Some(customer.id);
    request.points_to_redeem = Some(20);

    let record = checkout_service(&pool)
        .checkout(store.id, request)
        .await
        .expect("checkout succeeds");
    // 50_000 total: 50 earned, 20 redeemed.
    assert_eq!(record.points_earned, 50);
    assert_eq!(record.points_redeemed, 20);

    let cancelled = refund_service(&pool)
        .refund(store.id, record.id)
        .await
        .expect("refund succeeds");
    assert_eq!(cancelled.status, "Dibatalkan");
    assert!(cancelled.cancelled_at.is_some());

    let product_after = queries::get_product(&pool, store.id, product.id).await.unwrap();
    assert_eq!(product_after.stock, 10);

    let store_after = queries::get_store(&pool, store.id).await.unwrap();
    assert_eq!(store_after.pradana_token_balance, BigDecimal::from(10));

    let customer_after = queries::get_customer(&pool, store.id, customer.id).await.unwrap();
    assert_eq!(customer_after.loyalty_points, 30);
}

#[tokio::test]
async fn refunding_twice_fails_and_credits_once() {
    let Some(pool) = test_pool().await else { return };
    let store = seed_store(&pool, 10).await;
    let product = seed_product(&pool, store.id, "Roti Bakar", 12_000, 4).await;

    let record = checkout_service(&pool)
        .checkout(store.id, cart(&product, 1))
        .await
        .unwrap();

    let service = refund_service(&pool);
    service.refund(store.id, record.id).await.expect("first refund");
    let err = service.refund(store.id, record.id).await.unwrap_err();
    assert!(matches!(err, AppError::AlreadyCancelled(_)));

    let store_after = queries::get_store(&pool, store.id).await.unwrap();
    assert_eq!(store_after.pradana_token_balance, BigDecimal::from(10));
    let product_after = queries::get_product(&pool, store.id, product.id).await.unwrap();
    assert_eq!(product_after.stock, 4);
}

#[tokio::test]
async fn topup_approval_credits_exactly_once() {
    let Some(pool) = test_pool().await else { return };
    let store = seed_store(&pool, 0).await;

    let service = topup_service(&pool);
    let request = service
        .create_request(store.id, BigDecimal::from(50_000), None)
        .await
        .expect("create request");
    // 50_000 Rp at 1_000 Rp per token.
    assert_eq!(request.tokens, BigDecimal::from(50));
    assert_eq!(request.status, "Menunggu");

    let approved = service.approve(request.id).await.expect("approve");
    assert_eq!(approved.status, "Disetujui");
    assert!(approved.processed_at.is_some());

    let err = service.approve(request.id).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let store_after = queries::get_store(&pool, store.id).await.unwrap();
    assert_eq!(store_after.pradana_token_balance, BigDecimal::from(50));
}

#[tokio::test]
async fn checkout_clears_the_table_sessions_pending_cart() {
    let Some(pool) = test_pool().await else { return };
    let store = seed_store(&pool, 10).await;
    let product = seed_product(&pool, store.id, "Mie Ayam", 15_000, 8).await;

    let now = Utc::now();
    let session = queries::insert_table_session(
        &pool,
        &TableSession {
            id: Uuid::new_v4(),
            store_id: store.id,
            table_name: "Meja 4".to_string(),
            customer_name: None,
            customer_phone: None,
            pending_cart: Some(serde_json::json!([
                {"product_id": product.id, "quantity": 1, "price": "15000"}
            ])),
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .unwrap();

    let pending = queries::list_pending_table_sessions(&pool, store.id).await.unwrap();
    assert_eq!(pending.len(), 1);

    let mut request = cart(&product, 1);
    request.table_session_id = Some(session.id);
    checkout_service(&pool)
        .checkout(store.id, request)
        .await
        .expect("checkout succeeds");

    let pending = queries::list_pending_table_sessions(&pool, store.id).await.unwrap();
    assert!(pending.is_empty());

    let session_after = queries::get_table_session(&pool, store.id, session.id).await.unwrap();
    assert!(session_after.pending_cart.is_none());
}
