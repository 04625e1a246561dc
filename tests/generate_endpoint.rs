use anyhow::Result;
use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use testgen_relay::config::Config;
use testgen_relay::http::{build_state, router};
use tokio::sync::Mutex;

/// How the fake generation service answers
#[derive(Clone)]
enum Reply {
    Text(String),
    Body(Value),
    Status(StatusCode),
    Slow(Duration),
}

#[derive(Clone)]
struct FakeService {
    reply: Reply,
    seen: Arc<Mutex<Vec<Value>>>,
}

async fn fake_generate(
    State(svc): State<FakeService>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    svc.seen.lock().await.push(body);
    match svc.reply {
        Reply::Text(text) => (
            StatusCode::OK,
            Json(json!({ "model": "fake", "response": text, "done": true })),
        ),
        Reply::Body(body) => (StatusCode::OK, Json(body)),
        Reply::Status(status) => (status, Json(json!({ "error": "model not loaded" }))),
        Reply::Slow(delay) => {
            tokio::time::sleep(delay).await;
            (StatusCode::OK, Json(json!({ "response": "{}" })))
        }
    }
}

async fn serve(app: Router) -> Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(addr)
}

struct Harness {
    relay: SocketAddr,
    seen: Arc<Mutex<Vec<Value>>>,
    http: reqwest::Client,
}

impl Harness {
    async fn start(reply: Reply, timeout_secs: u64) -> Result<Self> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let fake = Router::new()
            .route("/api/generate", post(fake_generate))
            .with_state(FakeService {
                reply,
                seen: seen.clone(),
            });
        let fake_addr = serve(fake).await?;

        let mut config = Config::default();
        config.generation.url = format!("http://{}/api/generate", fake_addr);
        config.generation.timeout_secs = timeout_secs;
        let relay = serve(router(build_state(config)?)).await?;

        Ok(Self {
            relay,
            seen,
            http: reqwest::Client::new(),
        })
    }

    async fn generate(&self, body: Value) -> Result<(StatusCode, Value)> {
        let resp = self
            .http
            .post(format!("http://{}/api/generate", self.relay))
            .json(&body)
            .send()
            .await?;
        let status = StatusCode::from_u16(resp.status().as_u16())?;
        Ok((status, resp.json().await?))
    }

    async fn get(&self, path: &str) -> Result<Value> {
        Ok(self
            .http
            .get(format!("http://{}{}", self.relay, path))
            .send()
            .await?
            .json()
            .await?)
    }
}

#[tokio::test]
async fn test_selenium_login_scenario() -> Result<()> {
    let reply = r#"İşte test: {"test_case": {"title": "Giriş Testi", "steps": ["Aç"], "expected": "Başarılı"}, "script_code": "driver.get('x')", "script": "selenium"} umarım yardımcı olur"#;
    let h = Harness::start(Reply::Text(reply.to_string()), 5).await?;

    let (status, body) = h
        .generate(json!({ "requirement": "Login test", "framework": "Selenium" }))
        .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model_used"], "qwen2.5-coder:7b");
    assert_eq!(body["target_framework"], "selenium");
    assert_eq!(
        body["result"],
        json!({
            "test_case": {"title": "Giriş Testi", "steps": ["Aç"], "expected": "Başarılı"},
            "script_code": "driver.get('x')",
            "script": "selenium"
        })
    );

    let seen = h.seen.lock().await;
    assert_eq!(seen.len(), 1);
    let sent = &seen[0];
    assert_eq!(sent["model"], "qwen2.5-coder:7b");
    assert_eq!(sent["format"], "json");
    assert_eq!(sent["stream"], false);
    assert_eq!(sent["options"]["num_predict"], 1200);
    let prompt = sent["prompt"].as_str().unwrap_or_default();
    assert!(prompt.contains("**Selenium**"));
    assert!(prompt.contains("Gereksinim: Login test"));
    Ok(())
}

#[tokio::test]
async fn test_model_alias_and_unknown_framework() -> Result<()> {
    let h = Harness::start(Reply::Text("{\"ok\": 1}".to_string()), 5).await?;

    let (status, body) = h
        .generate(json!({ "requirement": "Arama yap", "framework": "Robot", "model": "Llama-3.1" }))
        .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model_used"], "llama3.1:8b");
    assert_eq!(body["target_framework"], "robot");

    let seen = h.seen.lock().await;
    let prompt = seen[0]["prompt"].as_str().unwrap_or_default();
    assert!(prompt.contains("await page.goto('https://google.com')"));
    assert!(prompt.contains("\"script\": \"robot\""));
    Ok(())
}

#[tokio::test]
async fn test_no_json_block_descriptor() -> Result<()> {
    let h = Harness::start(Reply::Text("Bu isteği anlayamadım.".to_string()), 5).await?;

    let (status, body) = h.generate(json!({ "requirement": "Login" })).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["target_framework"], "playwright");
    assert_eq!(
        body["result"],
        json!({ "error": "JSON bloğu bulunamadı", "raw": "Bu isteği anlayamadım." })
    );

    let metrics = h.get("/metrics").await?;
    assert_eq!(metrics["malformed_outputs"]["no_json_block"], 1);
    Ok(())
}

#[tokio::test]
async fn test_invalid_json_descriptor() -> Result<()> {
    let h = Harness::start(Reply::Text("{ \"title\": 'tek tırnak' }".to_string()), 5).await?;

    let (status, body) = h.generate(json!({ "requirement": "Login" })).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["result"],
        json!({ "error": "JSON valid değil", "raw_snippet": "{ \"title\": 'tek tırnak' }..." })
    );
    Ok(())
}

#[tokio::test]
async fn test_missing_response_field_is_empty_text() -> Result<()> {
    let h = Harness::start(Reply::Body(json!({ "model": "fake", "done": true })), 5).await?;

    let (_, body) = h.generate(json!({ "requirement": "Login" })).await?;

    assert_eq!(body["result"], json!({ "error": "JSON bloğu bulunamadı", "raw": "" }));
    Ok(())
}

#[tokio::test]
async fn test_upstream_error_status_is_500() -> Result<()> {
    let h = Harness::start(Reply::Status(StatusCode::SERVICE_UNAVAILABLE), 5).await?;

    let (status, body) = h.generate(json!({ "requirement": "Login" })).await?;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let detail = body["detail"].as_str().unwrap_or_default();
    assert!(detail.contains("503"), "detail was: {detail}");

    let metrics = h.get("/metrics").await?;
    assert_eq!(metrics["errors_total"], 1);
    Ok(())
}

#[tokio::test]
async fn test_timeout_is_500_with_timeout_detail() -> Result<()> {
    let h = Harness::start(Reply::Slow(Duration::from_secs(3)), 1).await?;

    let (status, body) = h.generate(json!({ "requirement": "Login" })).await?;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let detail = body["detail"].as_str().unwrap_or_default();
    assert!(detail.contains("timed out"), "detail was: {detail}");
    Ok(())
}

#[tokio::test]
async fn test_unreachable_backend_is_500() -> Result<()> {
    // Grab a free port, then close it so nothing is listening
    let addr = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        listener.local_addr()?
    };
    let mut config = Config::default();
    config.generation.url = format!("http://{}/api/generate", addr);
    let relay = serve(router(build_state(config)?)).await?;

    let resp = reqwest::Client::new()
        .post(format!("http://{}/api/generate", relay))
        .json(&json!({ "requirement": "Login" }))
        .send()
        .await?;

    assert_eq!(resp.status().as_u16(), 500);
    let body: Value = resp.json().await?;
    assert!(body["detail"].as_str().is_some_and(|d| !d.is_empty()));
    Ok(())
}

#[tokio::test]
async fn test_missing_requirement_is_422_without_upstream_call() -> Result<()> {
    let h = Harness::start(Reply::Text("{}".to_string()), 5).await?;

    let (status, body) = h.generate(json!({ "framework": "cypress" })).await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].as_str().is_some());

    let (status, _) = h.generate(json!({ "requirement": "" })).await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    assert!(h.seen.lock().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_health_and_info() -> Result<()> {
    let h = Harness::start(Reply::Text("{}".to_string()), 7).await?;

    let health = h
        .http
        .get(format!("http://{}/health", h.relay))
        .send()
        .await?
        .text()
        .await?;
    assert_eq!(health, "ok");

    let info = h.get("/info").await?;
    assert_eq!(info["generation"]["timeout_secs"], 7);
    assert_eq!(info["generation"]["default_model"], "qwen2.5-coder:7b");
    assert_eq!(info["generation"]["models"][0]["alias"], "qwen");
    assert_eq!(info["frameworks"].as_array().map(Vec::len), Some(3));
    Ok(())
}
