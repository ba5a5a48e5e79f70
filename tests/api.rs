//! HTTP API tests against an in-process server on an ephemeral port.

use std::sync::Arc;

use serde_json::{json, Value};

use apex_crm::config::Config;
use apex_crm::server::{router, AppState};
use apex_crm_core::store::memory::InMemoryStore;

struct TestServer {
    base: String,
    http: reqwest::Client,
}

impl TestServer {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn get(&self, path: &str) -> (u16, Value) {
        let resp = self.http.get(self.url(path)).send().await.unwrap();
        (resp.status().as_u16(), resp.json().await.unwrap())
    }

    async fn post(&self, path: &str, body: Value) -> (u16, Value) {
        let resp = self.http.post(self.url(path)).json(&body).send().await.unwrap();
        (resp.status().as_u16(), resp.json().await.unwrap())
    }

    async fn put(&self, path: &str, body: Value) -> (u16, Value) {
        let resp = self.http.put(self.url(path)).json(&body).send().await.unwrap();
        (resp.status().as_u16(), resp.json().await.unwrap())
    }

    async fn delete(&self, path: &str) -> (u16, Value) {
        let resp = self.http.delete(self.url(path)).send().await.unwrap();
        (resp.status().as_u16(), resp.json().await.unwrap())
    }
}

async fn start(config: Config) -> TestServer {
    let state = AppState::new(config, Arc::new(InMemoryStore::new()));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });
    TestServer {
        base: format!("http://{}", addr),
        http: reqwest::Client::new(),
    }
}

async fn seeded() -> TestServer {
    start(Config::minimal()).await
}

async fn empty() -> TestServer {
    let mut config = Config::minimal();
    config.seed.enabled = false;
    start(config).await
}

fn ids(page: &Value) -> Vec<String> {
    page["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_health() {
    let srv = empty().await;
    let (status, body) = srv.get("/api/health").await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn test_unknown_route_is_enveloped_404() {
    let srv = empty().await;
    let (status, body) = srv.get("/api/nope").await;
    assert_eq!(status, 404);
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_clients_pages_follow_cursor() {
    let srv = seeded().await;

    let (status, first) = srv.get("/api/clients?limit=2").await;
    assert_eq!(status, 200);
    let first = &first["data"];
    assert_eq!(ids(first), vec!["client-1", "client-2"]);
    let c1 = first["next_cursor"].as_str().unwrap().to_string();

    let (_, second) = srv.get(&format!("/api/clients?limit=2&cursor={}", c1)).await;
    let second = &second["data"];
    assert_eq!(ids(second), vec!["client-3", "client-4"]);
    let c2 = second["next_cursor"].as_str().unwrap().to_string();

    let (_, third) = srv.get(&format!("/api/clients?limit=2&cursor={}", c2)).await;
    let third = &third["data"];
    assert_eq!(ids(third), vec!["client-5"]);
    assert!(third["next_cursor"].is_null());
}

#[tokio::test]
async fn test_clients_limit_clamped_and_defaulted() {
    let srv = seeded().await;

    let (_, body) = srv.get("/api/clients?limit=0").await;
    assert_eq!(ids(&body["data"]).len(), 1);

    let (_, body) = srv.get("/api/clients?limit=").await;
    assert_eq!(ids(&body["data"]).len(), 5);

    let (_, body) = srv.get("/api/clients").await;
    assert_eq!(ids(&body["data"]).len(), 5);

    let (_, body) = srv.get("/api/clients?limit=100000").await;
    assert_eq!(ids(&body["data"]).len(), 5);
}

#[tokio::test]
async fn test_clients_non_integer_limit_is_coerced() {
    let srv = seeded().await;

    let (status, body) = srv.get("/api/clients?limit=2.5").await;
    assert_eq!(status, 200);
    assert_eq!(ids(&body["data"]), vec!["client-1", "client-2"]);
    assert!(body["data"]["next_cursor"].is_string());

    let (status, body) = srv.get("/api/clients?limit=abc").await;
    assert_eq!(status, 200);
    assert_eq!(ids(&body["data"]), vec!["client-1"]);
    assert!(body["data"]["next_cursor"].is_string());
}

#[tokio::test]
async fn test_clients_bad_cursor_is_400() {
    let srv = seeded().await;
    let (status, body) = srv.get("/api/clients?cursor=banana").await;
    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_empty_store_lists_nothing_when_seed_disabled() {
    let srv = empty().await;
    let (status, body) = srv.get("/api/clients").await;
    assert_eq!(status, 200);
    assert!(ids(&body["data"]).is_empty());
    assert!(body["data"]["next_cursor"].is_null());
}

#[tokio::test]
async fn test_client_crud() {
    let srv = empty().await;

    let (status, body) = srv
        .post(
            "/api/clients",
            json!({"company": "Acme", "email": "ops@acme.test", "industry": "Retail"}),
        )
        .await;
    assert_eq!(status, 200, "{}", body);
    let id = body["data"]["id"].as_str().unwrap().to_string();
    assert!(!id.is_empty());
    assert_eq!(body["data"]["seoStats"]["indexedKeywords"], 0);

    let (status, body) = srv
        .put(
            &format!("/api/clients/{}", id),
            json!({"phone": "555-0100", "seoStats": {"indexedKeywords": 40, "seoClicks": 12}}),
        )
        .await;
    assert_eq!(status, 200, "{}", body);
    assert_eq!(body["data"]["phone"], "555-0100");
    assert_eq!(body["data"]["company"], "Acme");
    assert_eq!(body["data"]["seoStats"]["indexedKeywords"], 40);

    let (status, body) = srv.get(&format!("/api/clients/{}", id)).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["industry"], "Retail");

    let (status, body) = srv.delete(&format!("/api/clients/{}", id)).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"], json!({"id": id, "deleted": true}));

    let (status, body) = srv.delete(&format!("/api/clients/{}", id)).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "Client not found or already deleted");

    let (status, body) = srv.get(&format!("/api/clients/{}", id)).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "Client not found");
}

#[tokio::test]
async fn test_create_client_requires_company_and_email() {
    let srv = empty().await;

    let (status, body) = srv.post("/api/clients", json!({"company": "Acme"})).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Company and email are required");

    let (status, _) = srv
        .post("/api/clients", json!({"company": "Acme", "email": "not-an-email"}))
        .await;
    assert_eq!(status, 400);

    let resp = srv
        .http
        .post(srv.url("/api/clients"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_update_missing_client_is_404() {
    let srv = empty().await;
    let (status, body) = srv.put("/api/clients/ghost", json!({"phone": "1"})).await;
    assert_eq!(status, 404);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_files_attach_and_detach() {
    let srv = seeded().await;
    srv.get("/api/clients").await;

    let (status, body) = srv
        .post(
            "/api/clients/client-3/files",
            json!({
                "clientId": "someone-else",
                "fileName": "audit.pdf",
                "fileType": "pdf",
                "fileSize": 2048,
                "url": "/files/audit.pdf"
            }),
        )
        .await;
    assert_eq!(status, 200, "{}", body);
    let files = body["data"]["uploadedFiles"].as_array().unwrap();
    let added = files.iter().find(|f| f["fileName"] == "audit.pdf").unwrap();
    assert_eq!(added["clientId"], "client-3");
    let file_id = added["id"].as_str().unwrap().to_string();

    let (status, body) = srv
        .delete(&format!("/api/clients/client-3/files/{}", file_id))
        .await;
    assert_eq!(status, 200);
    let files = body["data"]["uploadedFiles"].as_array().unwrap();
    assert!(files.iter().all(|f| f["id"] != file_id.as_str()));

    let (status, _) = srv
        .post(
            "/api/clients/ghost/files",
            json!({"fileName": "a.csv", "fileType": "csv", "fileSize": 1, "url": "/a"}),
        )
        .await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_leads_list_and_stage_update() {
    let srv = seeded().await;

    let (status, body) = srv.get("/api/leads").await;
    assert_eq!(status, 200);
    let leads = body["data"].as_array().unwrap();
    assert_eq!(leads.len(), 8);
    assert_eq!(leads[0]["id"], "lead-1");
    assert_eq!(leads[0]["stage"], "Lead In");

    let (status, body) = srv
        .put("/api/leads/lead-1/stage", json!({"stage": "Proposal Sent"}))
        .await;
    assert_eq!(status, 200, "{}", body);
    assert_eq!(body["data"]["stage"], "Proposal Sent");
    assert_eq!(body["data"]["company"], "Bluewave Analytics");

    let (status, body) = srv.put("/api/leads/lead-1/stage", json!({})).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Stage is required");

    let (status, _) = srv
        .put("/api/leads/lead-1/stage", json!({"stage": "Limbo"}))
        .await;
    assert_eq!(status, 400);

    let (status, _) = srv
        .put("/api/leads/lead-1/stage", json!({"stage": "won"}))
        .await;
    assert_eq!(status, 400);

    let (status, _) = srv
        .put("/api/leads/ghost/stage", json!({"stage": "Won"}))
        .await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_leads_list_ignores_pagination_config() {
    let mut config = Config::minimal();
    config.pagination.default_limit = 2;
    config.pagination.max_limit = 2;
    let srv = start(config).await;

    let (status, body) = srv.get("/api/leads").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"].as_array().unwrap().len(), 8);

    let (_, body) = srv.get("/api/clients?limit=50").await;
    assert_eq!(ids(&body["data"]).len(), 2);
}

#[tokio::test]
async fn test_create_lead() {
    let srv = empty().await;

    let (status, _) = srv.post("/api/leads", json!({"contactPerson": "X"})).await;
    assert_eq!(status, 400);

    let (status, body) = srv
        .post(
            "/api/leads",
            json!({"company": "Orbit Labs", "estimatedValue": 5000.0, "source": "Website"}),
        )
        .await;
    assert_eq!(status, 200, "{}", body);
    assert_eq!(body["data"]["stage"], "Lead In");

    let (status, _) = srv
        .post("/api/leads", json!({"company": "Neg", "estimatedValue": -1.0}))
        .await;
    assert_eq!(status, 400);

    let (_, body) = srv.get("/api/leads").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_reports_config_and_data() {
    let srv = seeded().await;

    let (status, body) = srv.get("/api/reports/config").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["clients"].as_array().unwrap().len(), 5);
    assert_eq!(body["data"]["leads"].as_array().unwrap().len(), 8);
    assert_eq!(body["data"]["clients"][0]["name"], "Innovate Inc.");

    let (status, body) = srv
        .post(
            "/api/reports/data",
            json!({
                "type": "proposal",
                "clientIds": ["client-1", "client-2"],
                "leadIds": ["lead-4"],
                "sections": ["clientInfo", "pipelineValue"]
            }),
        )
        .await;
    assert_eq!(status, 200, "{}", body);
    let data = &body["data"];
    assert_eq!(data["type"], "proposal");
    assert_eq!(data["clients"].as_array().unwrap().len(), 2);
    assert_eq!(data["aggregateMetrics"]["totalKeywords"], 1250 + 430);
    assert_eq!(data["aggregateMetrics"]["totalPipelineValue"], 42000.0);

    let (status, _) = srv
        .post(
            "/api/reports/data",
            json!({"type": "seo-audit", "clientIds": [], "sections": ["keywords"]}),
        )
        .await;
    assert_eq!(status, 400);

    let (status, _) = srv
        .post(
            "/api/reports/data",
            json!({"type": "seo-audit", "clientIds": ["ghost"], "sections": ["keywords"]}),
        )
        .await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_stats() {
    let srv = seeded().await;
    let (status, body) = srv.get("/api/stats").await;
    assert_eq!(status, 200);
    let data = &body["data"];
    assert_eq!(data["totalClients"], 5);
    assert_eq!(data["totalLeads"], 8);
    assert_eq!(data["conversionRate"], 25.0);
}
