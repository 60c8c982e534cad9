//! End-to-end queries against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives the core through a
//! `ureq`-backed `Transport`. The transport unwraps the response envelope
//! into raw elements and remembers the `Where` echo so the filter text that
//! reached the server can be asserted.

use std::cell::RefCell;

use remote_core::{
    models, ClientConfig, Direction, FieldValue, HttpMethod, HttpRequest, RawElement, Record,
    RecordType, Registry, RemoteClient, RemoteError, Transport, TransportError,
};

struct UreqTransport {
    agent: ureq::Agent,
    envelope_key: &'static str,
    last_where: RefCell<Option<String>>,
}

impl UreqTransport {
    fn new(envelope_key: &'static str) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self {
            agent,
            envelope_key,
            last_where: RefCell::new(None),
        }
    }
}

impl Transport for UreqTransport {
    fn send(&self, req: &HttpRequest) -> Result<Vec<RawElement>, TransportError> {
        assert_eq!(req.method, HttpMethod::Get);

        let mut builder = self.agent.get(&req.path);
        for (key, value) in &req.params {
            builder = builder.query(key, value);
        }
        for (key, value) in &req.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }

        let mut response = builder.call().map_err(|e| TransportError::new(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| TransportError::new(e.to_string()))?;
        if status != 200 {
            return Err(TransportError::with_status(status, body));
        }

        let envelope: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| TransportError::new(e.to_string()))?;
        *self.last_where.borrow_mut() = envelope["Where"].as_str().map(str::to_string);
        Ok(envelope[self.envelope_key]
            .as_array()
            .map(|items| items.iter().filter_map(|v| v.as_object().cloned()).collect())
            .unwrap_or_default())
    }
}

fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn registry() -> Registry {
    Registry::builder()
        .register(models::bank_transfer())
        .register(models::bank_account())
        .register(RecordType::new("Contact", "Contacts"))
        .build()
        .unwrap()
}

fn account(client: &RemoteClient, id: &str) -> Record {
    let mut account = client.new_record(models::BANK_ACCOUNT).unwrap();
    account.set("AccountID", id).unwrap();
    account
}

/// PUTs the dirty fields of `record` and hydrates the saved copy.
fn save(client: &RemoteClient, record: &Record) -> Record {
    record.validate().unwrap();
    let url = format!("{}/api.xro/2.0/BankTransfers", client.config().base_url);
    let body = serde_json::json!({
        "BankTransfers": [serde_json::Value::Object(record.to_raw(true))]
    });

    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();
    let mut response = agent
        .put(&url)
        .content_type("application/json")
        .send(body.to_string().as_bytes())
        .expect("HTTP transport error");
    assert_eq!(response.status().as_u16(), 200);

    let envelope: serde_json::Value =
        serde_json::from_str(&response.body_mut().read_to_string().unwrap()).unwrap();
    let saved = envelope["BankTransfers"][0].as_object().unwrap();
    client.hydrate(models::BANK_TRANSFER, saved).unwrap()
}

#[test]
fn fetch_lifecycle() {
    let base_url = start_server();
    let client = RemoteClient::new(
        ClientConfig::new(&base_url).with_user_agent("remote-core-tests"),
        registry(),
    );
    let transport = UreqTransport::new("BankTransfers");

    // Step 1: nothing stored yet.
    let transfers = client.load(models::BANK_TRANSFER).unwrap().execute(&transport).unwrap();
    assert!(transfers.is_empty(), "expected empty list");

    // Step 2: create two transfers.
    let mut ids = Vec::new();
    for (amount, date) in [("20.00", "2024-03-01"), ("150.00", "2024-03-05")] {
        let mut transfer = client.new_record(models::BANK_TRANSFER).unwrap();
        transfer
            .set("FromBankAccount", account(&client, "6f1d2c3b-0000-4000-8000-000000000001"))
            .unwrap()
            .set("ToBankAccount", account(&client, "6f1d2c3b-0000-4000-8000-000000000002"))
            .unwrap()
            .set("Amount", amount)
            .unwrap()
            .set("Date", date)
            .unwrap();
        assert!(transfer.identity().is_none());

        let saved = save(&client, &transfer);
        assert!(!saved.is_dirty());
        ids.push(saved.identity().and_then(FieldValue::as_str).unwrap().to_string());
    }

    // Step 3: ordered fetch hydrates every element in response order.
    let mut query = client.load(models::BANK_TRANSFER).unwrap();
    query.order_by("Amount", Direction::Desc);
    let transfers = query.execute(&transport).unwrap();
    assert_eq!(transfers.len(), 2);
    let amounts: Vec<_> = transfers
        .iter()
        .map(|t| t.get("Amount").unwrap().and_then(FieldValue::as_str).unwrap())
        .collect();
    assert_eq!(amounts, vec!["150.00", "20.00"]);
    assert_eq!(
        transfers[0].identity().and_then(FieldValue::as_str),
        Some(ids[1].as_str())
    );
    assert_eq!(
        transfers[1].get("Date").unwrap().map(FieldValue::to_raw),
        Some(serde_json::json!("2024-03-01T00:00:00"))
    );
    assert!(transfers.iter().all(|t| !t.is_dirty()));
    let from = transfers[0]
        .get("FromBankAccount")
        .unwrap()
        .and_then(FieldValue::as_record)
        .unwrap();
    assert_eq!(
        from.identity().and_then(FieldValue::as_str),
        Some("6f1d2c3b-0000-4000-8000-000000000001")
    );

    // Step 4: the rendered filter reaches the server verbatim.
    let mut query = client.load(models::BANK_TRANSFER).unwrap();
    query
        .where_("HasAttachments", false)
        .or_where("BankTransfer.BankTransferID", ids[0].as_str())
        .and_where("CurrencyRate", 1);
    query.execute(&transport).unwrap();
    assert_eq!(
        transport.last_where.borrow().as_deref(),
        Some(query.where_clause().as_str())
    );
    assert_eq!(
        query.where_clause(),
        format!(
            "HasAttachments=false OR BankTransfer.BankTransferID=Guid(\"{}\") AND CurrencyRate==1",
            ids[0]
        )
    );

    // Step 5: modification cutoff.
    let mut query = client.load(models::BANK_TRANSFER).unwrap();
    query.modified_after(None);
    assert_eq!(query.execute(&transport).unwrap().len(), 2);
    query.modified_after(Some(chrono::Utc::now() + chrono::Duration::hours(1)));
    assert!(query.execute(&transport).unwrap().is_empty());

    // Step 6: offset is honored, paging is refused for this type.
    let mut query = client.load(models::BANK_TRANSFER).unwrap();
    query.order_by("Amount", Direction::Asc).offset(1);
    let transfers = query.execute(&transport).unwrap();
    assert_eq!(transfers.len(), 1);
    assert!(matches!(
        query.page(1),
        Err(RemoteError::UnsupportedOperation { .. })
    ));

    // Step 7: local edits after a fetch are tracked per field.
    let mut edited = transfers.into_iter().next().unwrap();
    edited.set("Amount", "151.00").unwrap();
    edited.set("Amount", "152.00").unwrap();
    assert_eq!(
        edited.dirty_fields().iter().collect::<Vec<_>>(),
        vec!["Amount"]
    );
    assert_eq!(
        serde_json::Value::Object(edited.to_raw(true)),
        serde_json::json!({"Amount": "152.00"})
    );
}

#[test]
fn transport_errors_are_propagated() {
    let base_url = start_server();
    let client = RemoteClient::new(ClientConfig::new(&base_url), registry());
    let transport = UreqTransport::new("Contacts");

    let err = client.load("Contact").unwrap().execute(&transport).unwrap_err();
    assert!(matches!(
        err,
        RemoteError::Transport(TransportError { status: Some(404), .. })
    ));
}
