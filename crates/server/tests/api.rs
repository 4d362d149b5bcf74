//! End-to-end tests driving the router in memory.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use finapp_core::{hash_password, AccountId, NewUser, Role};
use finapp_server::{build_router, AppState, Config};
use finapp_storage::DbPool;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    pool: DbPool,
    _attachments: TempDir,
}

async fn test_app() -> TestApp {
    test_app_with_scope(false).await
}

async fn test_app_with_scope(enforce_scope: bool) -> TestApp {
    let attachments = TempDir::new().unwrap();
    let config = Config {
        jwt_secret: "test-secret".to_string(),
        feeds_enabled: false,
        enforce_scope,
        attachments_dir: attachments.path().to_path_buf(),
        ..Config::default()
    };
    let pool = finapp_storage::create_memory_db().await.unwrap();
    let state = AppState::new(pool.clone(), config).unwrap();
    TestApp {
        router: build_router(state),
        pool,
        _attachments: attachments,
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn raw(app: &TestApp, req: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = app.router.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, headers, bytes.to_vec())
}

async fn send(app: &TestApp, req: Request<Body>) -> (StatusCode, Value) {
    let (status, _, bytes) = raw(app, req).await;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
    };
    (status, body)
}

async fn signup(app: &TestApp, email: &str) -> String {
    let (status, body) = send(
        app,
        request(
            Method::POST,
            "/api/auth/signup",
            None,
            Some(json!({
                "name": "Ana",
                "email": email,
                "password": "segredo",
                "password_confirmation": "segredo"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["access_token"].as_str().unwrap().to_string()
}

async fn login(app: &TestApp, email: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["access_token"].as_str().unwrap().to_string()
}

async fn create_transaction(app: &TestApp, token: &str, body: Value) -> Value {
    let (status, body) = send(app, request(Method::POST, "/api/transactions", Some(token), Some(body))).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

#[tokio::test]
async fn health_is_public() {
    let app = test_app().await;
    let (status, body) = send(&app, request(Method::GET, "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn api_requires_a_valid_token() {
    let app = test_app().await;
    let (status, _) = send(&app, request(Method::GET, "/api/accounts", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, request(Method::GET, "/api/accounts", Some("garbage"), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");
}

#[tokio::test]
async fn signup_login_and_me() {
    let app = test_app().await;
    let token = signup(&app, "Ana@Example.com ").await;

    let (status, me) = send(&app, request(Method::GET, "/api/auth/me", Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "ana@example.com");
    assert!(me.get("password_hash").is_none());

    let duplicate = json!({
        "name": "Outra",
        "email": "ana@example.com",
        "password": "x",
        "password_confirmation": "x"
    });
    let (status, _) = send(&app, request(Method::POST, "/api/auth/signup", None, Some(duplicate))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "ana@example.com", "password": "errada" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "ANA@example.com", "password": "segredo" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["user"]["name"], "Ana");
}

#[tokio::test]
async fn signup_rejects_mismatched_passwords() {
    let app = test_app().await;
    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/api/auth/signup",
            None,
            Some(json!({
                "name": "Ana",
                "email": "ana@example.com",
                "password": "a",
                "password_confirmation": "b"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Passwords do not match");
}

#[tokio::test]
async fn transaction_lifecycle() {
    let app = test_app().await;
    let token = signup(&app, "ana@example.com").await;

    let created = create_transaction(
        &app,
        &token,
        json!({
            "trx_date": today(),
            "type": "expense",
            "amount": "R$ 1.234,56",
            "account_id": 1,
            "category_id": 1,
            "method": "boleto",
            "description": "Conta de luz"
        }),
    )
    .await;
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["amount"], "1234.56");
    assert_eq!(created["type"], "expense");
    assert_eq!(created["status"], "paid");
    assert_eq!(created["category_name"], "Energia Elétrica");
    assert_eq!(created["account_name"], "Conta Corrente Principal");

    let (status, fetched) = send(&app, request(Method::GET, &format!("/api/transactions/{id}"), Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (_, list) = send(&app, request(Method::GET, "/api/transactions?type=expense", Some(&token), None)).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    let (_, list) = send(&app, request(Method::GET, "/api/transactions?type=income", Some(&token), None)).await;
    assert!(list.as_array().unwrap().is_empty());

    let (_, recent) = send(&app, request(Method::GET, "/api/transactions/recent", Some(&token), None)).await;
    assert_eq!(recent[0]["id"], id);

    let (status, updated) = send(
        &app,
        request(
            Method::PUT,
            &format!("/api/transactions/{id}/status"),
            Some(&token),
            Some(json!({ "status": "canceled" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "canceled");

    let (status, _) = send(&app, request(Method::DELETE, &format!("/api/transactions/{id}"), Some(&token), None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, request(Method::GET, &format!("/api/transactions/{id}"), Some(&token), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_positive_amounts_are_rejected() {
    let app = test_app().await;
    let token = signup(&app, "ana@example.com").await;
    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/api/transactions",
            Some(&token),
            Some(json!({ "trx_date": today(), "type": "income", "amount": 0 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Amount must be greater than zero");
}

#[tokio::test]
async fn reconcile_only_once() {
    let app = test_app().await;
    let token = signup(&app, "ana@example.com").await;
    let income = create_transaction(
        &app,
        &token,
        json!({ "trx_date": today(), "type": "income", "amount": 500 }),
    )
    .await;
    let id = income["id"].as_i64().unwrap();
    assert_eq!(income["status"], "planned");

    let (_, pending) = send(&app, request(Method::GET, "/api/reconciliation/pending", Some(&token), None)).await;
    assert_eq!(pending.as_array().unwrap().len(), 1);

    let uri = format!("/api/reconciliation/{id}");
    let (status, body) = send(&app, request(Method::POST, &uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "reconciled");
    assert_eq!(body["paid_date"], json!(today()));

    let (status, _) = send(&app, request(Method::POST, &uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn kpis_subtract_every_outflow() {
    let app = test_app().await;
    let token = signup(&app, "ana@example.com").await;
    for (ty, amount) in [("income", 1000), ("expense", 300), ("tax", 150), ("payroll", 50)] {
        create_transaction(&app, &token, json!({ "trx_date": today(), "type": ty, "amount": amount })).await;
    }

    let (status, kpis) = send(&app, request(Method::GET, "/api/reports/kpis", Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(kpis["income_formatted"], "R$ 1.000,00");
    assert_eq!(kpis["expenses_formatted"], "R$ 500,00");
    assert_eq!(kpis["balance_formatted"], "R$ 500,00");

    let (status, _) = send(&app, request(Method::GET, "/api/reports/kpis?start=2024-01-01", Some(&token), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, headers, bytes) = raw(&app, request(Method::GET, "/api/reports/categories.csv", Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "text/csv; charset=utf-8");
    let csv = String::from_utf8(bytes).unwrap();
    assert!(csv.starts_with("Categoria,Tipo,Total_Receitas,Total_Despesas"));
    assert!(csv.contains("(sem),income,1000.00,0"));
}

#[tokio::test]
async fn transactions_export_as_csv() {
    let app = test_app().await;
    let token = signup(&app, "ana@example.com").await;
    create_transaction(
        &app,
        &token,
        json!({ "trx_date": today(), "type": "expense", "amount": 12.5, "description": "Frete" }),
    )
    .await;

    let (status, headers, bytes) = raw(&app, request(Method::GET, "/api/transactions/export.csv", Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"lancamentos.csv\""
    );
    let csv = String::from_utf8(bytes).unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("id,Data,Tipo,Descrição,Valor,Categoria,Conta,Setor,Status,Anexo")
    );
    assert!(lines.next().unwrap().contains(",expense,Frete,12.50,"));
}

#[tokio::test]
async fn statement_import_is_idempotent() {
    let app = test_app().await;
    let token = signup(&app, "ana@example.com").await;
    create_transaction(
        &app,
        &token,
        json!({
            "trx_date": today(),
            "type": "income",
            "amount": 500,
            "account_id": 1,
            "description": "Venda cliente X"
        }),
    )
    .await;

    let day = today().format("%d/%m/%Y");
    let upload = json!({
        "account_id": 1,
        "content": format!(
            "Data;Descrição;Valor\n{day};PIX RECEBIDO CLIENTE X;500,00\n{day};TARIFA BANCARIA;-12,90\n"
        )
    });

    let (status, preview) = send(
        &app,
        request(Method::POST, "/api/reconciliation/statement", Some(&token), Some(upload.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{preview}");
    assert_eq!(preview["to_reconcile"], 1);
    assert_eq!(preview["to_insert"], 1);
    assert_eq!(preview["lines"].as_array().unwrap().len(), 2);

    let (status, first) = send(
        &app,
        request(Method::POST, "/api/reconciliation/import", Some(&token), Some(upload.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{first}");
    assert_eq!(first["reconciled"], 1);
    assert_eq!(first["inserted"], 1);
    assert_eq!(first["duplicates"], 0);

    let (_, second) = send(
        &app,
        request(Method::POST, "/api/reconciliation/import", Some(&token), Some(upload)),
    )
    .await;
    assert_eq!(second["reconciled"], 0);
    assert_eq!(second["inserted"], 0);
    assert_eq!(second["duplicates"], 2);

    let (_, statement) = send(&app, request(Method::GET, "/api/accounts/1/statement", Some(&token), None)).await;
    assert_eq!(statement["rows"].as_array().unwrap().len(), 2);
    assert_eq!(statement["balance_formatted"], "R$ 487,10");
}

#[tokio::test]
async fn empty_statement_is_a_bad_request() {
    let app = test_app().await;
    let token = signup(&app, "ana@example.com").await;
    let (status, _) = send(
        &app,
        request(
            Method::POST,
            "/api/reconciliation/statement",
            Some(&token),
            Some(json!({ "account_id": 1, "content": "Data;Descrição;Valor\n" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

fn multipart(file_name: &str, data: &[u8]) -> (String, Vec<u8>) {
    let boundary = "finapp-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={boundary}"), body)
}

#[tokio::test]
async fn attachments_upload_and_download() {
    let app = test_app().await;
    let token = signup(&app, "ana@example.com").await;
    let tx = create_transaction(&app, &token, json!({ "trx_date": today(), "type": "expense", "amount": 10 })).await;
    let uri = format!("/api/transactions/{}/attachment", tx["id"]);

    let (status, _) = send(&app, request(Method::GET, &uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (content_type, body) = multipart("recibo.png", b"\x89PNG fake image");
    let upload = Request::builder()
        .method(Method::POST)
        .uri(&uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .unwrap();
    let (status, saved) = send(&app, upload).await;
    assert_eq!(status, StatusCode::OK, "{saved}");
    assert!(saved["attachment_path"].as_str().unwrap().ends_with("_recibo.png"));

    let (status, headers, bytes) = raw(&app, request(Method::GET, &uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "image/png");
    assert!(headers[header::CONTENT_DISPOSITION].to_str().unwrap().starts_with("inline"));
    assert_eq!(bytes, b"\x89PNG fake image");

    let (content_type, body) = multipart("virus.exe", b"MZ");
    let rejected = Request::builder()
        .method(Method::POST)
        .uri(&uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .unwrap();
    let (status, _) = send(&app, rejected).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn calendar_month_mixes_events_and_tax_dates() {
    let app = test_app().await;
    let token = signup(&app, "ana@example.com").await;

    let (status, _) = send(
        &app,
        request(
            Method::POST,
            "/api/taxes",
            Some(&token),
            Some(json!({ "name": "DAS", "periodicity": "monthly", "due_day": 31 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &app,
        request(
            Method::POST,
            "/api/calendar/events",
            Some(&token),
            Some(json!({ "title": "Aluguel", "start_date": "2024-01-05", "recurrence": "monthly" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, view) = send(&app, request(Method::GET, "/api/calendar/2024/2", Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["month"], "2024-02");
    let entries = view["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["date"], "2024-02-05");
    assert_eq!(entries[0]["kind"], "event");
    assert_eq!(entries[1]["date"], "2024-02-29");
    assert_eq!(entries[1]["kind"], "tax_due");

    let (status, _) = send(&app, request(Method::GET, "/api/calendar/2024/13", Some(&token), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn registries_and_unique_sectors() {
    let app = test_app().await;
    let token = signup(&app, "ana@example.com").await;

    let (status, client) = send(
        &app,
        request(
            Method::POST,
            "/api/clients",
            Some(&token),
            Some(json!({ "name": " Padaria Central ", "email": "Contato@Padaria.com" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(client["name"], "Padaria Central");
    assert_eq!(client["email"], "contato@padaria.com");

    let (_, suppliers) = send(&app, request(Method::GET, "/api/suppliers", Some(&token), None)).await;
    assert!(suppliers.as_array().unwrap().is_empty());

    let (status, _) = send(
        &app,
        request(Method::POST, "/api/sectors", Some(&token), Some(json!({ "name": "Comercial" }))),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        request(Method::DELETE, &format!("/api/clients/{}", client["id"]), Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn categories_filter_by_transaction_type() {
    let app = test_app().await;
    let token = signup(&app, "ana@example.com").await;
    let (_, income) = send(&app, request(Method::GET, "/api/categories?for_type=income", Some(&token), None)).await;
    let names: Vec<&str> = income
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Vendas"]);
}

#[tokio::test]
async fn market_degrades_when_feeds_are_off() {
    let app = test_app().await;
    let token = signup(&app, "ana@example.com").await;

    let (status, ticker) = send(&app, request(Method::GET, "/api/market/ticker", Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(ticker["line"].as_str().unwrap().contains("Dólar: n/d"));
    assert!(ticker["usd_brl"].is_null());
    assert!(ticker["indices"].as_array().unwrap().iter().all(|i| i["price"].is_null()));

    let (_, selic) = send(&app, request(Method::GET, "/api/market/selic", Some(&token), None)).await;
    assert_eq!(selic["available"], false);
}

#[tokio::test]
async fn reimport_ignores_new_open_entries_for_imported_lines() {
    let app = test_app().await;
    let token = signup(&app, "ana@example.com").await;
    let day = today().format("%d/%m/%Y");
    let upload = json!({
        "account_id": 1,
        "content": format!("Data;Descrição;Valor\n{day};TARIFA BANCARIA;-12,90\n")
    });

    let (_, first) = send(
        &app,
        request(Method::POST, "/api/reconciliation/import", Some(&token), Some(upload.clone())),
    )
    .await;
    assert_eq!(first["inserted"], 1);

    // Same day and amount as the line imported above.
    let manual = create_transaction(
        &app,
        &token,
        json!({ "trx_date": today(), "type": "expense", "amount": "12,90", "account_id": 1 }),
    )
    .await;

    let (status, preview) = send(
        &app,
        request(Method::POST, "/api/reconciliation/statement", Some(&token), Some(upload.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(preview["duplicates"], 1);
    assert_eq!(preview["to_reconcile"], 0);
    assert_eq!(preview["to_insert"], 0);

    let (status, second) = send(
        &app,
        request(Method::POST, "/api/reconciliation/import", Some(&token), Some(upload)),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{second}");
    assert_eq!(second["reconciled"], 0);
    assert_eq!(second["inserted"], 0);
    assert_eq!(second["duplicates"], 1);

    let (_, still_open) = send(
        &app,
        request(Method::GET, &format!("/api/transactions/{}", manual["id"]), Some(&token), None),
    )
    .await;
    assert_eq!(still_open["status"], "paid");
}

#[tokio::test]
async fn statement_matching_sees_entries_beyond_the_pending_screen() {
    let app = test_app().await;
    let token = signup(&app, "ana@example.com").await;
    let mine = create_transaction(
        &app,
        &token,
        json!({ "trx_date": today(), "type": "income", "amount": 500, "account_id": 1 }),
    )
    .await;
    for i in 0..200 {
        create_transaction(
            &app,
            &token,
            json!({ "trx_date": today(), "type": "income", "amount": 1000 + i, "account_id": 2 }),
        )
        .await;
    }

    let day = today().format("%d/%m/%Y");
    let upload = json!({
        "account_id": 1,
        "content": format!("Data;Descrição;Valor\n{day};PIX RECEBIDO;500,00\n")
    });
    let (_, summary) = send(
        &app,
        request(Method::POST, "/api/reconciliation/import", Some(&token), Some(upload)),
    )
    .await;
    assert_eq!(summary["reconciled"], 1);
    assert_eq!(summary["inserted"], 0);

    let (_, settled) = send(
        &app,
        request(Method::GET, &format!("/api/transactions/{}", mine["id"]), Some(&token), None),
    )
    .await;
    assert_eq!(settled["status"], "reconciled");
}

#[tokio::test]
async fn payroll_lifecycle() {
    let app = test_app().await;
    let token = signup(&app, "ana@example.com").await;

    let (status, created) = send(
        &app,
        request(
            Method::POST,
            "/api/payroll",
            Some(&token),
            Some(json!({
                "period": "2024-03",
                "employee": "João",
                "gross": "R$ 3.000,00",
                "charges": 600,
                "benefits": "50,00"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["period"], "2024-03");
    assert_eq!(created["paid"], false);
    let id = created["id"].as_i64().unwrap();

    let (status, _) = send(&app, request(Method::PUT, &format!("/api/payroll/{id}/paid"), Some(&token), None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, list) = send(&app, request(Method::GET, "/api/payroll", Some(&token), None)).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["total"], "3650.00");
    assert_eq!(list[0]["paid"], true);

    let (status, _) = send(
        &app,
        request(
            Method::POST,
            "/api/payroll",
            Some(&token),
            Some(json!({ "period": "2024-13", "employee": "João", "gross": 1 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, request(Method::DELETE, &format!("/api/payroll/{id}"), Some(&token), None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, request(Method::PUT, &format!("/api/payroll/{id}/paid"), Some(&token), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn oversized_recurrence_interval_is_rejected() {
    let app = test_app().await;
    let token = signup(&app, "ana@example.com").await;
    let (status, _) = send(
        &app,
        request(
            Method::POST,
            "/api/calendar/events",
            Some(&token),
            Some(json!({
                "title": "Renovação",
                "start_date": "2024-01-01",
                "recurrence": "yearly",
                "interval": 400_000_000
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, request(Method::GET, "/api/calendar/2024/1", Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn enforced_scope_hides_foreign_rows_everywhere() {
    let app = test_app_with_scope(true).await;
    let admin = signup(&app, "ana@example.com").await;
    let foreign = create_transaction(
        &app,
        &admin,
        json!({
            "trx_date": today(),
            "type": "expense",
            "amount": 100,
            "account_id": 1,
            "sector": "Produção"
        }),
    )
    .await;
    let foreign_uri = format!("/api/transactions/{}", foreign["id"]);

    finapp_storage::create_user(
        &app.pool,
        &NewUser {
            name: "Bruno".into(),
            email: "bruno@example.com".into(),
            password_hash: hash_password("segredo"),
            role: Role::User,
            account_id: Some(AccountId(2)),
            sectors: vec!["Comercial".into()],
        },
    )
    .await
    .unwrap()
    .unwrap();
    let token = login(&app, "bruno@example.com", "segredo").await;

    let (_, list) = send(&app, request(Method::GET, "/api/transactions", Some(&token), None)).await;
    assert!(list.as_array().unwrap().is_empty());

    let (status, _) = send(&app, request(Method::GET, &foreign_uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(
        &app,
        request(
            Method::PUT,
            &format!("{foreign_uri}/status"),
            Some(&token),
            Some(json!({ "status": "canceled" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, request(Method::GET, &format!("{foreign_uri}/attachment"), Some(&token), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(
        &app,
        request(Method::POST, &format!("/api/reconciliation/{}", foreign["id"]), Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, request(Method::GET, "/api/accounts/1/statement", Some(&token), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, request(Method::DELETE, &foreign_uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Still there for an unrestricted user.
    let (status, row) = send(&app, request(Method::GET, &foreign_uri, Some(&admin), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(row["status"], "paid");

    // Own entries land on the user's account and stay visible.
    let own = create_transaction(
        &app,
        &token,
        json!({ "trx_date": today(), "type": "expense", "amount": 50, "account_id": 1, "sector": "Comercial" }),
    )
    .await;
    assert_eq!(own["account_id"], 2);
    let (status, _) = send(&app, request(Method::GET, &format!("/api/transactions/{}", own["id"]), Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    let (_, statement) = send(&app, request(Method::GET, "/api/accounts/2/statement", Some(&token), None)).await;
    assert_eq!(statement["rows"].as_array().unwrap().len(), 1);

    let (status, _) = send(
        &app,
        request(
            Method::POST,
            "/api/transactions",
            Some(&token),
            Some(json!({ "trx_date": today(), "type": "expense", "amount": 50, "sector": "Produção" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
