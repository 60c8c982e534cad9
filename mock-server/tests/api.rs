use axum::http::{self, Request, StatusCode};
use chrono::{TimeZone, Utc};
use http_body_util::BodyExt;
use mock_server::{app, app_with, BankAccount, BankTransfer, Envelope, RESOURCE_PATH};
use tower::ServiceExt;
use uuid::Uuid;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn account(code: &str) -> BankAccount {
    BankAccount {
        account_id: Uuid::new_v4(),
        code: Some(code.to_string()),
        name: None,
    }
}

fn transfer(amount: &str, date: &str, updated_day: u32) -> BankTransfer {
    BankTransfer {
        bank_transfer_id: Uuid::new_v4(),
        from_bank_account: account("090"),
        to_bank_account: account("091"),
        amount: amount.to_string(),
        date: date.to_string(),
        currency_rate: None,
        has_attachments: false,
        updated_date_utc: Utc.with_ymd_and_hms(2024, 3, updated_day, 12, 0, 0).unwrap(),
    }
}

fn seeded() -> Vec<BankTransfer> {
    vec![
        transfer("20.00", "2024-03-01T00:00:00", 1),
        transfer("150.00", "2024-03-05T00:00:00", 5),
        transfer("75.50", "2024-03-03T00:00:00", 3),
    ]
}

fn amounts(envelope: &Envelope) -> Vec<&str> {
    envelope.bank_transfers.iter().map(|t| t.amount.as_str()).collect()
}

// --- list ---

#[tokio::test]
async fn list_transfers_empty() {
    let resp = app().oneshot(get(RESOURCE_PATH)).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let envelope: Envelope = body_json(resp).await;
    assert_eq!(envelope.status, "OK");
    assert!(envelope.bank_transfers.is_empty());
    assert!(envelope.r#where.is_none());
}

#[tokio::test]
async fn list_echoes_where() {
    let uri = format!("{RESOURCE_PATH}?where=HasAttachments%3Dtrue");
    let resp = app().oneshot(get(&uri)).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let envelope: Envelope = body_json(resp).await;
    assert_eq!(envelope.r#where.as_deref(), Some("HasAttachments=true"));
}

#[tokio::test]
async fn list_orders_by_amount_desc() {
    let uri = format!("{RESOURCE_PATH}?order=Amount%20DESC");
    let resp = app_with(seeded()).oneshot(get(&uri)).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let envelope: Envelope = body_json(resp).await;
    assert_eq!(amounts(&envelope), vec!["150.00", "75.50", "20.00"]);
}

#[tokio::test]
async fn list_unknown_order_field_returns_400() {
    let uri = format!("{RESOURCE_PATH}?order=Colour%20ASC");
    let resp = app_with(seeded()).oneshot(get(&uri)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_honors_if_modified_since() {
    let req = Request::builder()
        .uri(RESOURCE_PATH)
        .header("If-Modified-Since", "2024-03-02T00:00:00+00:00")
        .body(String::new())
        .unwrap();
    let resp = app_with(seeded()).oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let envelope: Envelope = body_json(resp).await;
    assert_eq!(amounts(&envelope), vec!["150.00", "75.50"]);
}

#[tokio::test]
async fn list_bad_if_modified_since_returns_400() {
    let req = Request::builder()
        .uri(RESOURCE_PATH)
        .header("If-Modified-Since", "last tuesday")
        .body(String::new())
        .unwrap();
    let resp = app_with(seeded()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_applies_offset() {
    let uri = format!("{RESOURCE_PATH}?order=Date%20ASC&offset=1");
    let resp = app_with(seeded()).oneshot(get(&uri)).await.unwrap();

    let envelope: Envelope = body_json(resp).await;
    assert_eq!(amounts(&envelope), vec!["75.50", "150.00"]);
}

#[tokio::test]
async fn list_page_beyond_end_is_empty() {
    let uri = format!("{RESOURCE_PATH}?page=2");
    let resp = app_with(seeded()).oneshot(get(&uri)).await.unwrap();

    let envelope: Envelope = body_json(resp).await;
    assert!(envelope.bank_transfers.is_empty());
}

// --- create ---

#[tokio::test]
async fn create_transfer_assigns_id() {
    let from = Uuid::new_v4();
    let body = format!(
        r#"{{"BankTransfers":[{{"FromBankAccount":{{"AccountID":"{from}"}},"ToBankAccount":{{"AccountID":"{}"}},"Amount":"42.00"}}]}}"#,
        Uuid::new_v4()
    );
    let resp = app().oneshot(json_request("PUT", RESOURCE_PATH, &body)).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let envelope: Envelope = body_json(resp).await;
    assert_eq!(envelope.bank_transfers.len(), 1);
    let created = &envelope.bank_transfers[0];
    assert_eq!(created.amount, "42.00");
    assert_eq!(created.from_bank_account.account_id, from);
    assert!(!created.bank_transfer_id.is_nil());
}

#[tokio::test]
async fn create_transfer_missing_amount_returns_422() {
    let body = format!(
        r#"{{"BankTransfers":[{{"FromBankAccount":{{"AccountID":"{0}"}},"ToBankAccount":{{"AccountID":"{0}"}}}}]}}"#,
        Uuid::new_v4()
    );
    let resp = app().oneshot(json_request("PUT", RESOURCE_PATH, &body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
