use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use csv::Writer;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::models::{Store, TransactionRecord};
use crate::db::queries;
use crate::domain::status::TransactionStatus;
use crate::error::AppError;
use crate::services::RefundService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    #[serde(default = "default_format")]
    pub format: String,
    /// Inclusive start date, `YYYY-MM-DD` or RFC 3339.
    pub from: Option<String>,
    /// Inclusive end date.
    pub to: Option<String>,
    pub status: Option<String>,
}

fn default_format() -> String {
    "csv".to_string()
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

fn parse_date(date_str: &str) -> Result<DateTime<Utc>, AppError> {
    let date_str = if date_str.len() == 10 {
        format!("{}T00:00:00Z", date_str)
    } else {
        date_str.to_string()
    };

    DateTime::parse_from_rfc3339(&date_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::Validation(format!("tanggal tidak valid: {}", e)))
}

/// `to` is inclusive for whole dates, so push it one day forward and compare
/// with `<` in SQL.
fn parse_range(
    from: &Option<String>,
    to: &Option<String>,
) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>), AppError> {
    let from = from.as_deref().map(parse_date).transpose()?;
    let to = to
        .as_deref()
        .map(|raw| parse_date(raw).map(|dt| dt + chrono::Duration::days(1)))
        .transpose()?;

    Ok((from, to))
}

fn parse_status_filter(status: &Option<String>) -> Result<Option<String>, AppError> {
    match status {
        Some(raw) => {
            let parsed: TransactionStatus = raw
                .parse()
                .map_err(|_| AppError::Validation(format!("status tidak dikenal: {}", raw)))?;
            Ok(Some(parsed.to_string()))
        }
        None => Ok(None),
    }
}

pub async fn list_transactions(
    State(state): State<AppState>,
    Extension(store): Extension<Store>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let status = parse_status_filter(&query.status)?;
    let limit = query.limit.unwrap_or(20).clamp(1, 200);
    let offset = query.offset.unwrap_or(0).max(0);

    let transactions =
        queries::list_transactions(&state.db, store.id, status.as_deref(), limit, offset).await?;

    Ok(Json(transactions))
}

pub async fn get_transaction(
    State(state): State<AppState>,
    Extension(store): Extension<Store>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let transaction = queries::get_transaction(&state.db, store.id, id)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                AppError::NotFound("Transaksi tidak ditemukan".to_string())
            }
            other => AppError::Database(other),
        })?;

    Ok(Json(transaction))
}

pub async fn refund_transaction(
    State(state): State<AppState>,
    Extension(store): Extension<Store>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let service = RefundService::new(
        state.db.clone(),
        state.settings.clone(),
        state.notifier.clone(),
    );
    let cancelled = service.refund(store.id, id).await?;

    Ok(Json(cancelled))
}

pub async fn sales_summary(
    State(state): State<AppState>,
    Extension(store): Extension<Store>,
    Query(query): Query<SummaryQuery>,
) -> Result<impl IntoResponse, AppError> {
    let (from, to) = parse_range(&query.from, &query.to)?;
    let summary = queries::sales_summary(&state.db, store.id, from, to).await?;

    Ok(Json(summary))
}

/// Flat row for exports; money rendered as strings.
#[derive(Serialize)]
struct TransactionExportRow {
    receipt_number: i64,
    status: String,
    total_amount: String,
    discount: String,
    fee_tokens: String,
    points_earned: i64,
    points_redeemed: i64,
    customer_id: String,
    created_at: String,
    cancelled_at: String,
}

impl From<&TransactionRecord> for TransactionExportRow {
    fn from(tx: &TransactionRecord) -> Self {
        TransactionExportRow {
            receipt_number: tx.receipt_number,
            status: tx.status.clone(),
            total_amount: tx.total_amount.to_string(),
            discount: tx.discount.to_string(),
            fee_tokens: tx.fee_tokens.to_string(),
            points_earned: tx.points_earned,
            points_redeemed: tx.points_redeemed,
            customer_id: tx.customer_id.map(|id| id.to_string()).unwrap_or_default(),
            created_at: tx.created_at.to_rfc3339(),
            cancelled_at: tx
                .cancelled_at
                .map(|at| at.to_rfc3339())
                .unwrap_or_default(),
        }
    }
}

pub async fn export_transactions(
    State(state): State<AppState>,
    Extension(store): Extension<Store>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse, AppError> {
    let (from, to) = parse_range(&query.from, &query.to)?;
    let status = parse_status_filter(&query.status)?;

    let transactions =
        queries::export_transactions(&state.db, store.id, from, to, status.as_deref()).await?;

    let (content_type, extension, body) = match query.format.to_lowercase().as_str() {
        "json" => {
            let rows: Vec<TransactionExportRow> =
                transactions.iter().map(TransactionExportRow::from).collect();
            let body = serde_json::to_string(&rows)
                .map_err(|e| AppError::Internal(format!("export serialize failed: {}", e)))?;
            ("application/json", "json", body)
        }
        _ => {
            let mut writer = Writer::from_writer(vec![]);
            for tx in &transactions {
                writer
                    .serialize(TransactionExportRow::from(tx))
                    .map_err(|e| AppError::Internal(format!("csv write failed: {}", e)))?;
            }
            let bytes = writer
                .into_inner()
                .map_err(|e| AppError::Internal(format!("csv flush failed: {}", e)))?;
            let body = String::from_utf8(bytes)
                .map_err(|e| AppError::Internal(format!("csv encoding failed: {}", e)))?;
            ("text/csv", "csv", body)
        }
    };

    let filename = format!("transaksi_{}.{}", Utc::now().format("%Y-%m"), extension);
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename))
            .map_err(|e| AppError::Internal(e.to_string()))?,
    );

    Ok((StatusCode::OK, headers, body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;

    #[test]
    fn parses_plain_dates_and_rfc3339() {
        assert!(parse_date("2026-01-01").is_ok());
        assert!(parse_date("2026-01-01T10:30:00Z").is_ok());
        assert!(parse_date("01/01/2026").is_err());
    }

    #[test]
    fn range_end_is_pushed_to_the_next_day() {
        let (_, to) = parse_range(&None, &Some("2026-01-31".to_string())).unwrap();
        assert_eq!(to.unwrap().to_rfc3339(), "2026-02-01T00:00:00+00:00");
    }

    #[test]
    fn status_filter_accepts_known_labels_only() {
        assert_eq!(
            parse_status_filter(&Some("Dibatalkan".to_string())).unwrap(),
            Some("Dibatalkan".to_string())
        );
        assert!(parse_status_filter(&Some("Completed".to_string())).is_err());
        assert_eq!(parse_status_filter(&None).unwrap(), None);
    }

    #[test]
    fn export_row_renders_optional_fields_empty() {
        let tx = TransactionRecord {
            id: Uuid::new_v4(),
            store_id: Uuid::new_v4(),
            receipt_number: 12,
            customer_id: None,
            items: serde_json::json!([]),
            total_amount: BigDecimal::from(20_000),
            discount: BigDecimal::from(0),
            points_earned: 0,
            points_redeemed: 0,
            fee_tokens: "0.5".parse().unwrap(),
            status: "Selesai Dibayar".to_string(),
            payment_method: None,
            table_session_id: None,
            created_at: Utc::now(),
            cancelled_at: None,
        };

        let row = TransactionExportRow::from(&tx);
        assert_eq!(row.receipt_number, 12);
        assert_eq!(row.customer_id, "");
        assert_eq!(row.cancelled_at, "");
        assert_eq!(row.fee_tokens, "0.5");
    }
}
