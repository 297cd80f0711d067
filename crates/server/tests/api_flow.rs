use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use finance_server::core::{AppState, ServerConfig};
use finance_server::finance::advisor::{AdviceProvider, AdviceProxy};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;

struct Harness {
    _dir: TempDir,
    state: AppState,
    app: Router,
}

async fn harness(extra: &[(&str, &str)]) -> Harness {
    let dir = tempdir().unwrap();

    let mut vars: HashMap<String, String> = HashMap::new();
    vars.insert("JWT_SECRET".into(), "integration-secret".into());
    vars.insert(
        "DATABASE_URL".into(),
        format!("sqlite://{}", dir.path().join("users.sqlite").display()),
    );
    vars.insert(
        "DATA_DIR".into(),
        dir.path().join("data").display().to_string(),
    );
    vars.insert("BCRYPT_COST".into(), "4".into());
    for (k, v) in extra {
        vars.insert(k.to_string(), v.to_string());
    }

    let config = ServerConfig::from_lookup(move |name| vars.get(name).cloned()).unwrap();
    let state = finance_server::build_state(config).await.unwrap();
    let app = finance_server::app(state.clone());

    Harness {
        _dir: dir,
        state,
        app,
    }
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

    (status, value)
}

async fn signup(app: &Router, username: &str, email: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/signup",
        None,
        Some(json!({ "username": username, "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["token"].as_str().unwrap().to_string()
}

fn expense_body(title: &str, amount: f64) -> Value {
    json!({
        "title": title,
        "amount": amount,
        "category": "food",
        "description": "weekly shop",
        "date": "2024-03-01"
    })
}

#[tokio::test]
async fn test_account_lifecycle() {
    let h = harness(&[]).await;

    let token = signup(&h.app, "alice", "a@x.com", "pw1").await;
    let user_id = h.state.tokens.verify(&token).unwrap();

    let (status, body) = send(
        &h.app,
        Method::POST,
        "/api/v1/login",
        None,
        Some(json!({ "email": "a@x.com", "password": "pw1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let login_token = body["token"].as_str().unwrap();
    assert_eq!(h.state.tokens.verify(login_token).unwrap(), user_id);
    assert_eq!(body["user"]["username"], "alice");

    let (status, body) = send(&h.app, Method::GET, "/api/v1/verify", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], user_id.as_str());
    assert_eq!(body["user"]["email"], "a@x.com");

    let (status, body) = send(&h.app, Method::GET, "/api/v1/profile", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["avatar"], "/default-avatar.png");
    assert!(body.get("password_hash").is_none());

    let (status, body) = send(
        &h.app,
        Method::POST,
        "/api/v1/change-password",
        Some(&token),
        Some(json!({ "oldPassword": "pw1", "newPassword": "pw2" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Password changed successfully");

    let (status, body) = send(
        &h.app,
        Method::POST,
        "/api/v1/login",
        None,
        Some(json!({ "email": "a@x.com", "password": "pw1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid credentials");

    let (status, _) = send(
        &h.app,
        Method::POST,
        "/api/v1/login",
        None,
        Some(json!({ "email": "a@x.com", "password": "pw2" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_duplicate_signup_and_bad_body() {
    let h = harness(&[]).await;
    signup(&h.app, "alice", "a@x.com", "pw1").await;

    let (status, body) = send(
        &h.app,
        Method::POST,
        "/api/v1/signup",
        None,
        Some(json!({ "username": "someone", "email": "a@x.com", "password": "pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    let (status, body) = send(
        &h.app,
        Method::POST,
        "/api/v1/add-income",
        None,
        Some(json!({ "title": "Gift", "amount": "lots" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_protected_routes_reject_bad_tokens() {
    let h = harness(&[]).await;

    let (status, body) = send(&h.app, Method::GET, "/api/v1/verify", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["message"].is_string());

    let (status, _) = send(&h.app, Method::GET, "/api/v1/verify", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &h.app,
        Method::POST,
        "/api/v1/add-expense",
        None,
        Some(expense_body("Lunch", 12.0)),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &h.app,
        Method::POST,
        "/api/v1/financial-chatbot/chat",
        None,
        Some(json!({ "message": "hi" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_record_routes() {
    let h = harness(&[]).await;
    let token = signup(&h.app, "alice", "a@x.com", "pw1").await;
    let user_id = h.state.tokens.verify(&token).unwrap();

    let (status, expense) = send(
        &h.app,
        Method::POST,
        "/api/v1/add-expense",
        Some(&token),
        Some(expense_body("Groceries", 42.5)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(expense["type"], "expense");
    assert_eq!(expense["owner"], user_id.as_str());
    assert_eq!(expense["date"], "2024-03-01T00:00:00Z");

    // legacy matrix: open, but a token still marks the owner
    let (status, income) = send(
        &h.app,
        Method::POST,
        "/api/v1/add-income",
        None,
        Some(json!({
            "title": "Salary",
            "amount": 2500,
            "category": "salary",
            "description": "March"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(income.get("owner").is_none());

    let (status, transaction) = send(
        &h.app,
        Method::POST,
        "/api/v1/add-transaction",
        Some(&token),
        Some(json!({ "type": "expense", "amount": 40 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(transaction["owner"], user_id.as_str());

    let (status, list) = send(&h.app, Method::GET, "/api/v1/get-expenses", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let id = transaction["id"].as_str().unwrap();
    let (status, updated) = send(
        &h.app,
        Method::PUT,
        &format!("/api/v1/update-transaction/{}", id),
        None,
        Some(json!({ "type": "income", "description": "refund" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["type"], "income");
    assert_eq!(updated["amount"], 40.0);
    assert_eq!(updated["description"], "refund");

    let (status, body) = send(
        &h.app,
        Method::DELETE,
        &format!("/api/v1/delete-transaction/{}", id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Transaction deleted");

    let (status, body) = send(
        &h.app,
        Method::DELETE,
        "/api/v1/delete-income/does-not-exist",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Income not found");

    let (status, list) = send(&h.app, Method::GET, "/api/v1/get-transactions", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_form_string_amounts() {
    let h = harness(&[]).await;

    let (status, body) = send(
        &h.app,
        Method::POST,
        "/api/v1/add-transaction",
        None,
        Some(json!({ "type": "expense", "amount": "100", "title": "x", "date": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["amount"], 100.0);

    let (status, _) = send(
        &h.app,
        Method::POST,
        "/api/v1/add-transaction",
        None,
        Some(json!({ "type": "expense", "amount": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_require_auth_on_writes() {
    let h = harness(&[("REQUIRE_AUTH_ON_WRITES", "true")]).await;

    let (status, _) = send(
        &h.app,
        Method::POST,
        "/api/v1/add-income",
        None,
        Some(json!({
            "title": "Salary",
            "amount": 2500,
            "category": "salary",
            "description": "March"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&h.app, Method::DELETE, "/api/v1/delete-expense/x", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // reads stay open
    let (status, _) = send(&h.app, Method::GET, "/api/v1/get-incomes", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

struct Scripted {
    reply: Option<String>,
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl AdviceProvider for Scripted {
    async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply
            .clone()
            .ok_or_else(|| anyhow::anyhow!("quota exceeded for key sk-test"))
    }
}

fn with_advisor(h: &Harness, reply: Option<&str>) -> (Router, Arc<Scripted>) {
    let provider = Arc::new(Scripted {
        reply: reply.map(str::to_string),
        prompts: Mutex::new(Vec::new()),
    });
    let mut state = h.state.clone();
    state.advisor = Some(Arc::new(AdviceProxy::new(
        provider.clone(),
        Duration::from_secs(5),
    )));
    (finance_server::app(state), provider)
}

#[tokio::test]
async fn test_chatbot_uses_own_expenses() {
    let h = harness(&[]).await;
    let alice = signup(&h.app, "alice", "a@x.com", "pw1").await;
    let bob = signup(&h.app, "bob", "b@x.com", "pw1").await;

    let expenses = [
        (&alice, "Rent", 900.0),
        (&alice, "Food", 100.0),
        (&bob, "Car", 5000.0),
    ];
    for (token, title, amount) in expenses {
        let (status, _) = send(
            &h.app,
            Method::POST,
            "/api/v1/add-expense",
            Some(token.as_str()),
            Some(expense_body(title, amount)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (app, provider) = with_advisor(&h, Some("Cut the rent."));
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/financial-chatbot/chat",
        Some(&alice),
        Some(json!({ "message": "How do I save?" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "Cut the rent.");

    let prompts = provider.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("\"totalExpenses\": 1000.0"));
    assert!(prompts[0].contains("\"expenseCount\": 2"));
    assert!(prompts[0].contains("\"largestExpense\": 900.0"));
    assert!(prompts[0].contains("How do I save?"));
}

#[tokio::test]
async fn test_chatbot_failures() {
    let h = harness(&[]).await;
    let token = signup(&h.app, "alice", "a@x.com", "pw1").await;

    // no LLM_API_KEY configured
    let (status, _) = send(
        &h.app,
        Method::POST,
        "/api/v1/financial-chatbot/chat",
        Some(&token),
        Some(json!({ "message": "hi" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let (app, provider) = with_advisor(&h, None);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/financial-chatbot/chat",
        Some(&token),
        Some(json!({ "message": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/financial-chatbot/chat",
        Some(&token),
        Some(json!({ "message": "hi" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["message"], "Failed to get financial advice");
    assert_eq!(provider.prompts.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_health() {
    let h = harness(&[]).await;
    let (status, body) = send(&h.app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_str().unwrap().starts_with("OK"));
}
