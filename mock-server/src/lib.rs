use std::{cmp::Ordering, sync::Arc};

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;
use uuid::Uuid;

pub const RESOURCE_PATH: &str = "/api.xro/2.0/BankTransfers";
pub const PAGE_SIZE: usize = 100;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BankAccount {
    #[serde(rename = "AccountID")]
    pub account_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BankTransfer {
    #[serde(rename = "BankTransferID")]
    pub bank_transfer_id: Uuid,
    pub from_bank_account: BankAccount,
    pub to_bank_account: BankAccount,
    pub amount: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_rate: Option<f64>,
    pub has_attachments: bool,
    #[serde(rename = "UpdatedDateUTC")]
    pub updated_date_utc: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateBankTransfer {
    pub from_bank_account: BankAccount,
    pub to_bank_account: BankAccount,
    pub amount: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub currency_rate: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateEnvelope {
    pub bank_transfers: Vec<CreateBankTransfer>,
}

/// Response envelope. `Where` echoes the filter the client sent.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Envelope {
    pub id: Uuid,
    pub status: String,
    #[serde(rename = "DateTimeUTC")]
    pub date_time_utc: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#where: Option<String>,
    pub bank_transfers: Vec<BankTransfer>,
}

impl Envelope {
    fn ok(bank_transfers: Vec<BankTransfer>, filter: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: "OK".to_string(),
            date_time_utc: Utc::now(),
            r#where: filter,
            bank_transfers,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(rename = "where")]
    pub filter: Option<String>,
    pub order: Option<String>,
    pub page: Option<usize>,
    pub offset: Option<usize>,
}

pub type Db = Arc<RwLock<Vec<BankTransfer>>>;

pub fn app() -> Router {
    app_with(Vec::new())
}

pub fn app_with(transfers: Vec<BankTransfer>) -> Router {
    let db: Db = Arc::new(RwLock::new(transfers));
    Router::new()
        .route(RESOURCE_PATH, get(list_transfers).put(create_transfers))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with(listener: TcpListener, transfers: Vec<BankTransfer>) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(transfers)).await
}

async fn list_transfers(
    State(db): State<Db>,
    Query(params): Query<ListParams>,
    headers: HeaderMap,
) -> Result<Json<Envelope>, StatusCode> {
    let since = match headers.get("If-Modified-Since") {
        Some(value) => Some(parse_since(value.to_str().map_err(|_| StatusCode::BAD_REQUEST)?)?),
        None => None,
    };
    debug!(?params, ?since, "list bank transfers");

    let mut transfers: Vec<BankTransfer> = db
        .read()
        .await
        .iter()
        .filter(|t| since.map_or(true, |since| t.updated_date_utc > since))
        .cloned()
        .collect();

    if let Some(order) = &params.order {
        sort_transfers(&mut transfers, order)?;
    }

    let skip = params.offset.unwrap_or(0);
    let transfers: Vec<BankTransfer> = match params.page {
        Some(page) => transfers
            .into_iter()
            .skip(skip + page.saturating_sub(1) * PAGE_SIZE)
            .take(PAGE_SIZE)
            .collect(),
        None => transfers.into_iter().skip(skip).collect(),
    };

    Ok(Json(Envelope::ok(transfers, params.filter)))
}

async fn create_transfers(
    State(db): State<Db>,
    Json(input): Json<CreateEnvelope>,
) -> (StatusCode, Json<Envelope>) {
    let now = Utc::now();
    let created: Vec<BankTransfer> = input
        .bank_transfers
        .into_iter()
        .map(|t| BankTransfer {
            bank_transfer_id: Uuid::new_v4(),
            from_bank_account: t.from_bank_account,
            to_bank_account: t.to_bank_account,
            amount: t.amount,
            date: t.date.unwrap_or_else(|| now.format("%Y-%m-%dT00:00:00").to_string()),
            currency_rate: t.currency_rate,
            has_attachments: false,
            updated_date_utc: now,
        })
        .collect();
    db.write().await.extend(created.iter().cloned());
    (StatusCode::OK, Json(Envelope::ok(created, None)))
}

fn parse_since(value: &str) -> Result<DateTime<Utc>, StatusCode> {
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_rfc2822(value))
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| StatusCode::BAD_REQUEST)
}

fn sort_transfers(transfers: &mut [BankTransfer], order: &str) -> Result<(), StatusCode> {
    let (field, direction) = order.split_once(' ').unwrap_or((order, "ASC"));
    let compare: fn(&BankTransfer, &BankTransfer) -> Ordering = match field {
        "Amount" => by_amount,
        "Date" => by_date,
        "UpdatedDateUTC" => by_updated,
        _ => return Err(StatusCode::BAD_REQUEST),
    };
    match direction.to_ascii_uppercase().as_str() {
        "ASC" => transfers.sort_by(compare),
        "DESC" => transfers.sort_by(|a, b| compare(b, a)),
        _ => return Err(StatusCode::BAD_REQUEST),
    }
    Ok(())
}

fn by_amount(a: &BankTransfer, b: &BankTransfer) -> Ordering {
    let a: f64 = a.amount.parse().unwrap_or(0.0);
    let b: f64 = b.amount.parse().unwrap_or(0.0);
    a.total_cmp(&b)
}

fn by_date(a: &BankTransfer, b: &BankTransfer) -> Ordering {
    a.date.cmp(&b.date)
}

fn by_updated(a: &BankTransfer, b: &BankTransfer) -> Ordering {
    a.updated_date_utc.cmp(&b.updated_date_utc)
}
