use chrono::{DateTime, Utc};
use sqlx::types::BigDecimal;
use sqlx::{FromRow, PgPool, Postgres, Result, Transaction as SqlxTransaction};
use uuid::Uuid;

use crate::db::models::{
    Customer, Product, RedemptionOption, Store, TableSession, TopUpRequest, TransactionRecord,
};

// --- Store queries ---

pub async fn insert_store(pool: &PgPool, store: &Store) -> Result<Store> {
    sqlx::query_as::<_, Store>(
        r#"
        INSERT INTO stores (
            id, name, owner_name, phone, catalog_slug, api_key,
            pradana_token_balance, transaction_counter, first_transaction_date,
            created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING *
        "#,
    )
    .bind(store.id)
    .bind(&store.name)
    .bind(&store.owner_name)
    .bind(&store.phone)
    .bind(&store.catalog_slug)
    .bind(&store.api_key)
    .bind(&store.pradana_token_balance)
    .bind(store.transaction_counter)
    .bind(store.first_transaction_date)
    .bind(store.created_at)
    .bind(store.updated_at)
    .fetch_one(pool)
    .await
}

pub async fn get_store(pool: &PgPool, id: Uuid) -> Result<Store> {
    sqlx::query_as::<_, Store>("SELECT * FROM stores WHERE id = $1")
        .bind(id)
        .fetch_one(pool)
        .await
}

pub async fn get_store_by_api_key(pool: &PgPool, api_key: &str) -> Result<Store> {
    sqlx::query_as::<_, Store>("SELECT * FROM stores WHERE api_key = $1")
        .bind(api_key)
        .fetch_one(pool)
        .await
}

pub async fn get_store_by_slug(pool: &PgPool, slug: &str) -> Result<Store> {
    sqlx::query_as::<_, Store>("SELECT * FROM stores WHERE catalog_slug = $1")
        .bind(slug)
        .fetch_one(pool)
        .await
}

pub async fn get_store_for_update(
    executor: &mut SqlxTransaction<'_, Postgres>,
    id: Uuid,
) -> Result<Store> {
    sqlx::query_as::<_, Store>("SELECT * FROM stores WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_one(&mut **executor)
        .await
}

/// Checkout writes to the store row: fee deduction, counter bump, and the
/// first-transaction stamp when this is receipt #1.
pub async fn apply_checkout_store_update(
    executor: &mut SqlxTransaction<'_, Postgres>,
    store_id: Uuid,
    fee_tokens: &BigDecimal,
    new_counter: i64,
    stamp_first_transaction: bool,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE stores
        SET pradana_token_balance = pradana_token_balance - $2,
            transaction_counter = $3,
            first_transaction_date = CASE
                WHEN $4 THEN COALESCE(first_transaction_date, NOW())
                ELSE first_transaction_date
            END,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(store_id)
    .bind(fee_tokens)
    .bind(new_counter)
    .bind(stamp_first_transaction)
    .execute(&mut **executor)
    .await?;

    Ok(())
}

pub async fn credit_store_tokens(
    executor: &mut SqlxTransaction<'_, Postgres>,
    store_id: Uuid,
    tokens: &BigDecimal,
) -> Result<()> {
    sqlx::query(
        "UPDATE stores SET pradana_token_balance = pradana_token_balance + $2, updated_at = NOW() WHERE id = $1",
    )
    .bind(store_id)
    .bind(tokens)
    .execute(&mut **executor)
    .await?;

    Ok(())
}

// --- Product queries ---

pub async fn insert_product(pool: &PgPool, product: &Product) -> Result<Product> {
    sqlx::query_as::<_, Product>(
        r#"
        INSERT INTO products (
            id, store_id, name, price, stock, category, image_url, is_listed,
            created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING *
        "#,
    )
    .bind(product.id)
    .bind(product.store_id)
    .bind(&product.name)
    .bind(&product.price)
    .bind(product.stock)
    .bind(&product.category)
    .bind(&product.image_url)
    .bind(product.is_listed)
    .bind(product.created_at)
    .bind(product.updated_at)
    .fetch_one(pool)
    .await
}

pub async fn get_product(pool: &PgPool, store_id: Uuid, id: Uuid) -> Result<Product> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE store_id = $1 AND id = $2")
        .bind(store_id)
        .bind(id)
        .fetch_one(pool)
        .await
}

pub async fn list_products(pool: &PgPool, store_id: Uuid) -> Result<Vec<Product>> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE store_id = $1 ORDER BY name ASC")
        .bind(store_id)
        .fetch_all(pool)
        .await
}

pub async fn list_catalog_products(pool: &PgPool, store_id: Uuid) -> Result<Vec<Product>> {
    sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE store_id = $1 AND is_listed = TRUE ORDER BY name ASC",
    )
    .bind(store_id)
    .fetch_all(pool)
    .await
}

pub async fn update_product(pool: &PgPool, product: &Product) -> Result<Product> {
    sqlx::query_as::<_, Product>(
        r#"
        UPDATE products
        SET name = $3, price = $4, stock = $5, category = $6, image_url = $7,
            is_listed = $8, updated_at = NOW()
        WHERE store_id = $1 AND id = $2
        RETURNING *
        "#,
    )
    .bind(product.store_id)
    .bind(product.id)
    .bind(&product.name)
    .bind(&product.price)
    .bind(product.stock)
    .bind(&product.category)
    .bind(&product.image_url)
    .bind(product.is_listed)
    .fetch_one(pool)
    .await
}

pub async fn delete_product(pool: &PgPool, store_id: Uuid, id: Uuid) -> Result<u64> {
    let result = sqlx::query("DELETE FROM products WHERE store_id = $1 AND id = $2")
        .bind(store_id)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Lock the cart's product rows in a stable order so two concurrent
/// checkouts over the same products cannot deadlock.
pub async fn get_products_for_update(
    executor: &mut SqlxTransaction<'_, Postgres>,
    store_id: Uuid,
    ids: &[Uuid],
) -> Result<Vec<Product>> {
    sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE store_id = $1 AND id = ANY($2) ORDER BY id ASC FOR UPDATE",
    )
    .bind(store_id)
    .bind(ids.to_vec())
    .fetch_all(&mut **executor)
    .await
}

pub async fn set_product_stock(
    executor: &mut SqlxTransaction<'_, Postgres>,
    id: Uuid,
    stock: i64,
) -> Result<()> {
    sqlx::query("UPDATE products SET stock = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(stock)
        .execute(&mut **executor)
        .await?;

    Ok(())
}

/// Refund restock. Returns the number of rows touched; 0 means the product
/// was deleted after the sale and the quantity cannot be restored.
pub async fn restock_product(
    executor: &mut SqlxTransaction<'_, Postgres>,
    store_id: Uuid,
    id: Uuid,
    quantity: i64,
) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE products SET stock = stock + $3, updated_at = NOW() WHERE store_id = $1 AND id = $2",
    )
    .bind(store_id)
    .bind(id)
    .bind(quantity)
    .execute(&mut **executor)
    .await?;

    Ok(result.rows_affected())
}

// --- Customer queries ---

pub async fn insert_customer(pool: &PgPool, customer: &Customer) -> Result<Customer> {
    sqlx::query_as::<_, Customer>(
        r#"
        INSERT INTO customers (id, store_id, name, phone, loyalty_points, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(customer.id)
    .bind(customer.store_id)
    .bind(&customer.name)
    .bind(&customer.phone)
    .bind(customer.loyalty_points)
    .bind(customer.created_at)
    .bind(customer.updated_at)
    .fetch_one(pool)
    .await
}

pub async fn get_customer(pool: &PgPool, store_id: Uuid, id: Uuid) -> Result<Customer> {
    sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE store_id = $1 AND id = $2")
        .bind(store_id)
        .bind(id)
        .fetch_one(pool)
        .await
}

pub async fn list_customers(
    pool: &PgPool,
    store_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<Customer>> {
    sqlx::query_as::<_, Customer>(
        "SELECT * FROM customers WHERE store_id = $1 ORDER BY name ASC LIMIT $2 OFFSET $3",
    )
    .bind(store_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn update_customer(pool: &PgPool, customer: &Customer) -> Result<Customer> {
    sqlx::query_as::<_, Customer>(
        r#"
        UPDATE customers
        SET name = $3, phone = $4, updated_at = NOW()
        WHERE store_id = $1 AND id = $2
        RETURNING *
        "#,
    )
    .bind(customer.store_id)
    .bind(customer.id)
    .bind(&customer.name)
    .bind(&customer.phone)
    .fetch_one(pool)
    .await
}

pub async fn delete_customer(pool: &PgPool, store_id: Uuid, id: Uuid) -> Result<u64> {
    let result = sqlx::query("DELETE FROM customers WHERE store_id = $1 AND id = $2")
        .bind(store_id)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

pub async fn get_customer_for_update(
    executor: &mut SqlxTransaction<'_, Postgres>,
    store_id: Uuid,
    id: Uuid,
) -> Result<Customer> {
    sqlx::query_as::<_, Customer>(
        "SELECT * FROM customers WHERE store_id = $1 AND id = $2 FOR UPDATE",
    )
    .bind(store_id)
    .bind(id)
    .fetch_one(&mut **executor)
    .await
}

pub async fn adjust_customer_points(
    executor: &mut SqlxTransaction<'_, Postgres>,
    id: Uuid,
    delta: i64,
) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE customers SET loyalty_points = loyalty_points + $2, updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .bind(delta)
    .execute(&mut **executor)
    .await?;

    Ok(result.rows_affected())
}

// --- Transaction queries ---

pub async fn insert_transaction(
    executor: &mut SqlxTransaction<'_, Postgres>,
    record: &TransactionRecord,
) -> Result<TransactionRecord> {
    sqlx::query_as::<_, TransactionRecord>(
        r#"
        INSERT INTO transactions (
            id, store_id, receipt_number, customer_id, items, total_amount,
            discount, points_earned, points_redeemed, fee_tokens, status,
            payment_method, table_session_id, created_at, cancelled_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
        RETURNING *
        "#,
    )
    .bind(record.id)
    .bind(record.store_id)
    .bind(record.receipt_number)
    .bind(record.customer_id)
    .bind(&record.items)
    .bind(&record.total_amount)
    .bind(&record.discount)
    .bind(record.points_earned)
    .bind(record.points_redeemed)
    .bind(&record.fee_tokens)
    .bind(&record.status)
    .bind(&record.payment_method)
    .bind(record.table_session_id)
    .bind(record.created_at)
    .bind(record.cancelled_at)
    .fetch_one(&mut **executor)
    .await
}

pub async fn get_transaction(pool: &PgPool, store_id: Uuid, id: Uuid) -> Result<TransactionRecord> {
    sqlx::query_as::<_, TransactionRecord>(
        "SELECT * FROM transactions WHERE store_id = $1 AND id = $2",
    )
    .bind(store_id)
    .bind(id)
    .fetch_one(pool)
    .await
}

pub async fn get_transaction_for_update(
    executor: &mut SqlxTransaction<'_, Postgres>,
    store_id: Uuid,
    id: Uuid,
) -> Result<TransactionRecord> {
    sqlx::query_as::<_, TransactionRecord>(
        "SELECT * FROM transactions WHERE store_id = $1 AND id = $2 FOR UPDATE",
    )
    .bind(store_id)
    .bind(id)
    .fetch_one(&mut **executor)
    .await
}

pub async fn list_transactions(
    pool: &PgPool,
    store_id: Uuid,
    status: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<TransactionRecord>> {
    match status {
        Some(status) => {
            sqlx::query_as::<_, TransactionRecord>(
                r#"
                SELECT * FROM transactions
                WHERE store_id = $1 AND status = $2
                ORDER BY receipt_number DESC LIMIT $3 OFFSET $4
                "#,
            )
            .bind(store_id)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, TransactionRecord>(
                r#"
                SELECT * FROM transactions
                WHERE store_id = $1
                ORDER BY receipt_number DESC LIMIT $2 OFFSET $3
                "#,
            )
            .bind(store_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
        }
    }
}

pub async fn mark_transaction_cancelled(
    executor: &mut SqlxTransaction<'_, Postgres>,
    id: Uuid,
) -> Result<TransactionRecord> {
    sqlx::query_as::<_, TransactionRecord>(
        r#"
        UPDATE transactions
        SET status = 'Dibatalkan', cancelled_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .fetch_one(&mut **executor)
    .await
}

pub async fn export_transactions(
    pool: &PgPool,
    store_id: Uuid,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
    status: Option<&str>,
) -> Result<Vec<TransactionRecord>> {
    let mut conditions = vec!["store_id = $1".to_string()];
    let mut param = 2;
    if from.is_some() {
        conditions.push(format!("created_at >= ${}", param));
        param += 1;
    }
    if to.is_some() {
        conditions.push(format!("created_at < ${}", param));
        param += 1;
    }
    if status.is_some() {
        conditions.push(format!("status = ${}", param));
    }

    let sql = format!(
        "SELECT * FROM transactions WHERE {} ORDER BY receipt_number ASC",
        conditions.join(" AND ")
    );

    let mut query = sqlx::query_as::<_, TransactionRecord>(&sql).bind(store_id);
    if let Some(from) = from {
        query = query.bind(from);
    }
    if let Some(to) = to {
        query = query.bind(to);
    }
    if let Some(status) = status {
        query = query.bind(status.to_string());
    }

    query.fetch_all(pool).await
}

#[derive(Debug, FromRow, serde::Serialize)]
pub struct SalesSummary {
    pub gross_revenue: BigDecimal,
    pub transaction_count: i64,
    pub fee_tokens_spent: BigDecimal,
    pub cancelled_count: i64,
}

pub async fn sales_summary(
    pool: &PgPool,
    store_id: Uuid,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> Result<SalesSummary> {
    sqlx::query_as::<_, SalesSummary>(
        r#"
        SELECT
            COALESCE(SUM(total_amount) FILTER (WHERE status <> 'Dibatalkan'), 0) AS gross_revenue,
            COUNT(*) FILTER (WHERE status <> 'Dibatalkan') AS transaction_count,
            COALESCE(SUM(fee_tokens) FILTER (WHERE status <> 'Dibatalkan'), 0) AS fee_tokens_spent,
            COUNT(*) FILTER (WHERE status = 'Dibatalkan') AS cancelled_count
        FROM transactions
        WHERE store_id = $1
          AND ($2::timestamptz IS NULL OR created_at >= $2)
          AND ($3::timestamptz IS NULL OR created_at < $3)
        "#,
    )
    .bind(store_id)
    .bind(from)
    .bind(to)
    .fetch_one(pool)
    .await
}

// --- Top-up queries ---

pub async fn insert_top_up(pool: &PgPool, request: &TopUpRequest) -> Result<TopUpRequest> {
    sqlx::query_as::<_, TopUpRequest>(
        r#"
        INSERT INTO top_up_requests (
            id, store_id, amount_rp, tokens, status, note, created_at, processed_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(request.id)
    .bind(request.store_id)
    .bind(&request.amount_rp)
    .bind(&request.tokens)
    .bind(&request.status)
    .bind(&request.note)
    .bind(request.created_at)
    .bind(request.processed_at)
    .fetch_one(pool)
    .await
}

pub async fn list_top_ups_for_store(pool: &PgPool, store_id: Uuid) -> Result<Vec<TopUpRequest>> {
    sqlx::query_as::<_, TopUpRequest>(
        "SELECT * FROM top_up_requests WHERE store_id = $1 ORDER BY created_at DESC",
    )
    .bind(store_id)
    .fetch_all(pool)
    .await
}

pub async fn list_top_ups(pool: &PgPool, status: Option<&str>) -> Result<Vec<TopUpRequest>> {
    match status {
        Some(status) => {
            sqlx::query_as::<_, TopUpRequest>(
                "SELECT * FROM top_up_requests WHERE status = $1 ORDER BY created_at DESC",
            )
            .bind(status)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, TopUpRequest>(
                "SELECT * FROM top_up_requests ORDER BY created_at DESC",
            )
            .fetch_all(pool)
            .await
        }
    }
}

pub async fn get_top_up_for_update(
    executor: &mut SqlxTransaction<'_, Postgres>,
    id: Uuid,
) -> Result<TopUpRequest> {
    sqlx::query_as::<_, TopUpRequest>("SELECT * FROM top_up_requests WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_one(&mut **executor)
        .await
}

pub async fn mark_top_up_processed(
    executor: &mut SqlxTransaction<'_, Postgres>,
    id: Uuid,
    status: &str,
) -> Result<TopUpRequest> {
    sqlx::query_as::<_, TopUpRequest>(
        "UPDATE top_up_requests SET status = $2, processed_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(status)
    .fetch_one(&mut **executor)
    .await
}

// --- App settings queries ---

pub async fn get_app_setting(pool: &PgPool, name: &str) -> Result<Option<serde_json::Value>> {
    sqlx::query_scalar::<_, serde_json::Value>("SELECT value FROM app_settings WHERE name = $1")
        .bind(name)
        .fetch_optional(pool)
        .await
}

pub async fn upsert_app_setting(
    pool: &PgPool,
    name: &str,
    value: &serde_json::Value,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO app_settings (name, value, updated_at)
        VALUES ($1, $2, NOW())
        ON CONFLICT (name) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
        "#,
    )
    .bind(name)
    .bind(value)
    .execute(pool)
    .await?;

    Ok(())
}

// --- Table session queries ---

pub async fn insert_table_session(pool: &PgPool, session: &TableSession) -> Result<TableSession> {
    sqlx::query_as::<_, TableSession>(
        r#"
        INSERT INTO table_sessions (
            id, store_id, table_name, customer_name, customer_phone, pending_cart,
            created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(session.id)
    .bind(session.store_id)
    .bind(&session.table_name)
    .bind(&session.customer_name)
    .bind(&session.customer_phone)
    .bind(&session.pending_cart)
    .bind(session.created_at)
    .bind(session.updated_at)
    .fetch_one(pool)
    .await
}

pub async fn get_table_session(
    pool: &PgPool,
    store_id: Uuid,
    id: Uuid,
) -> Result<TableSession> {
    sqlx::query_as::<_, TableSession>(
        "SELECT * FROM table_sessions WHERE store_id = $1 AND id = $2",
    )
    .bind(store_id)
    .bind(id)
    .fetch_one(pool)
    .await
}

pub async fn list_pending_table_sessions(
    pool: &PgPool,
    store_id: Uuid,
) -> Result<Vec<TableSession>> {
    sqlx::query_as::<_, TableSession>(
        r#"
        SELECT * FROM table_sessions
        WHERE store_id = $1 AND pending_cart IS NOT NULL
        ORDER BY created_at ASC
        "#,
    )
    .bind(store_id)
    .fetch_all(pool)
    .await
}

pub async fn clear_pending_cart(
    executor: &mut SqlxTransaction<'_, Postgres>,
    store_id: Uuid,
    id: Uuid,
) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE table_sessions SET pending_cart = NULL, updated_at = NOW() WHERE store_id = $1 AND id = $2",
    )
    .bind(store_id)
    .bind(id)
    .execute(&mut **executor)
    .await?;

    Ok(result.rows_affected())
}

// --- Redemption option queries ---

pub async fn insert_redemption_option(
    pool: &PgPool,
    option: &RedemptionOption,
) -> Result<RedemptionOption> {
    sqlx::query_as::<_, RedemptionOption>(
        r#"
        INSERT INTO redemption_options (id, store_id, name, points_cost, created_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(option.id)
    .bind(option.store_id)
    .bind(&option.name)
    .bind(option.points_cost)
    .bind(option.created_at)
    .fetch_one(pool)
    .await
}

pub async fn list_redemption_options(
    pool: &PgPool,
    store_id: Uuid,
) -> Result<Vec<RedemptionOption>> {
    sqlx::query_as::<_, RedemptionOption>(
        "SELECT * FROM redemption_options WHERE store_id = $1 ORDER BY points_cost ASC",
    )
    .bind(store_id)
    .fetch_all(pool)
    .await
}

pub async fn get_redemption_option(
    pool: &PgPool,
    store_id: Uuid,
    id: Uuid,
) -> Result<RedemptionOption> {
    sqlx::query_as::<_, RedemptionOption>(
        "SELECT * FROM redemption_options WHERE store_id = $1 AND id = $2",
    )
    .bind(store_id)
    .bind(id)
    .fetch_one(pool)
    .await
}

pub async fn delete_redemption_option(pool: &PgPool, store_id: Uuid, id: Uuid) -> Result<u64> {
    let result = sqlx::query("DELETE FROM redemption_options WHERE store_id = $1 AND id = $2")
        .bind(store_id)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
