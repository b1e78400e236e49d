//! In-process stand-in for the document backend
//!
//! Answers gateway calls from scripted routes and records every request, so
//! workflows can be exercised without a running server. `demo()` scripts a
//! plausible backend for the CLI's `--mock` mode.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::gateway::{Gateway, GatewayError, GatewayRequest, Method, RequestBody};

type Responder = Arc<dyn Fn(&GatewayRequest) -> Result<Value, GatewayError> + Send + Sync>;

#[derive(Clone)]
enum Reply {
    Fixed(Result<Value, GatewayError>),
    Computed(Responder),
}

struct Route {
    method: Method,
    /// Exact endpoint, or a prefix ending in `*`
    pattern: String,
    /// Replies served in order; the last one repeats
    replies: VecDeque<Reply>,
}

impl Route {
    fn matches(&self, method: Method, endpoint: &str) -> bool {
        self.method == method && pattern_matches(&self.pattern, endpoint)
    }

    fn is_exact(&self) -> bool {
        !self.pattern.ends_with('*')
    }

    fn next_reply(&mut self) -> Option<Reply> {
        if self.replies.len() > 1 {
            self.replies.pop_front()
        } else {
            self.replies.front().cloned()
        }
    }
}

fn pattern_matches(pattern: &str, endpoint: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => endpoint.starts_with(prefix),
        None => pattern == endpoint,
    }
}

/// Scripted gateway
pub struct MockBackend {
    base_url: String,
    routes: Mutex<Vec<Route>>,
    files: Mutex<HashMap<String, Vec<u8>>>,
    calls: Mutex<Vec<GatewayRequest>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            base_url: "http://mock.local/api".to_string(),
            routes: Mutex::new(Vec::new()),
            files: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    async fn add_reply(&self, method: Method, pattern: &str, reply: Reply) {
        let mut routes = self.routes.lock().await;
        match routes.iter_mut().find(|r| r.method == method && r.pattern == pattern) {
            Some(route) => route.replies.push_back(reply),
            None => routes.push(Route {
                method,
                pattern: pattern.to_string(),
                replies: VecDeque::from([reply]),
            }),
        }
    }

    /// Queue a JSON reply for `method pattern`. Replies are served in the
    /// order queued and the last one keeps answering.
    pub async fn respond(&self, method: Method, pattern: &str, body: Value) {
        self.add_reply(method, pattern, Reply::Fixed(Ok(body))).await;
    }

    /// Queue a gateway failure.
    pub async fn fail(&self, method: Method, pattern: &str, error: GatewayError) {
        self.add_reply(method, pattern, Reply::Fixed(Err(error))).await;
    }

    /// Queue a reply computed from the request.
    pub async fn respond_with<F>(&self, method: Method, pattern: &str, responder: F)
    where
        F: Fn(&GatewayRequest) -> Result<Value, GatewayError> + Send + Sync + 'static,
    {
        self.add_reply(method, pattern, Reply::Computed(Arc::new(responder))).await;
    }

    /// Serve `bytes` for downloads matching `pattern`.
    pub async fn add_file(&self, pattern: &str, bytes: impl Into<Vec<u8>>) {
        self.files.lock().await.insert(pattern.to_string(), bytes.into());
    }

    /// Every request received so far, in order.
    pub async fn calls(&self) -> Vec<GatewayRequest> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self, method: Method, endpoint: &str) -> usize {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|call| call.method == method && pattern_matches(endpoint, &call.endpoint))
            .count()
    }

    /// A backend with a small, consistent data set behind every endpoint.
    pub async fn demo() -> Self {
        let backend = Self::new();

        backend
            .respond(Method::Get, "/config", json!({"api_type": "gemini", "openai_model": "gpt-4o-mini"}))
            .await;
        backend.respond(Method::Post, "/config", json!({"success": true})).await;

        backend
            .respond(
                Method::Get,
                "/generated_documents",
                json!([
                    {"filename": "quarterly_review.pptx", "format": "pptx", "size": 482_113, "created": "2024-03-01 10:12:00"},
                    {"filename": "quarterly_review_v1.pptx", "format": "pptx", "size": 651_904, "created": "2024-03-01 10:40:00"},
                    {"filename": "onboarding_sop.docx", "format": "docx", "size": 38_912, "created": "2024-02-27 16:05:00"}
                ]),
            )
            .await;
        backend.respond(Method::Delete, "/delete_generated/*", json!({"success": true})).await;
        backend
            .respond(Method::Post, "/batch_delete_generated", json!({"success": true, "message": "Deleted"}))
            .await;

        backend
            .respond_with(Method::Post, "/generate", |request| {
                let format = match &request.body {
                    RequestBody::Json(body) => body
                        .get("output_format")
                        .and_then(Value::as_str)
                        .unwrap_or("docx")
                        .to_string(),
                    _ => "docx".to_string(),
                };
                Ok(json!({
                    "success": true,
                    "filename": format!("generated_document.{}", format),
                    "format": format,
                    "usage": {"model": "gemini-1.5-flash", "input_tokens": 1200, "output_tokens": 850, "cost": 0.00123},
                    "preview": "1. Purpose\n2. Scope\n3. Procedure"
                }))
            })
            .await;

        backend
            .respond(
                Method::Post,
                "/extract_text",
                json!({
                    "success": true,
                    "content": "Legacy procedure text extracted from the uploaded document.",
                    "images": {"folder": "extracted_images_demo", "count": 2}
                }),
            )
            .await;

        backend
            .respond_with(Method::Post, "/optimize-requirements", |request| {
                let requirements = match &request.body {
                    RequestBody::Json(body) => body.get("requirements").and_then(Value::as_str).unwrap_or_default().to_string(),
                    _ => String::new(),
                };
                Ok(json!({
                    "success": true,
                    "optimized_requirements": format!("Objective:\n{}\n\nDeliverables:\n- Structured document", requirements)
                }))
            })
            .await;

        backend
            .respond(
                Method::Get,
                "/history",
                json!([
                    {"filename": "quarterly_review.pptx", "date": "2024-03-01"},
                    {"filename": "onboarding_sop.docx", "date": "2024-02-27"}
                ]),
            )
            .await;

        backend
            .respond(
                Method::Get,
                "/templates",
                json!([
                    {"filename": "weekly_report.docx", "type": "DOCX", "size": 24_576, "modified": "2024-02-20 09:00:00"},
                    {"filename": "pitch_deck.pptx", "type": "PPTX", "size": 1_048_576, "modified": "2024-02-21 14:30:00"}
                ]),
            )
            .await;
        backend
            .respond(Method::Post, "/upload_template", json!({"success": true, "message": "Template uploaded"}))
            .await;
        backend.respond(Method::Delete, "/delete_template/*", json!({"success": true})).await;
        backend
            .respond(Method::Get, "/view_template/*", json!({"success": true, "content": "{{title}}\n\n{{body}}"}))
            .await;

        backend
            .respond_with(Method::Post, "/stage_image", |request| {
                let name = match &request.body {
                    RequestBody::File { file, .. } => file.filename.clone(),
                    _ => "image.png".to_string(),
                };
                Ok(json!({
                    "success": true,
                    "filename": format!("1700000000000_{}", name),
                    "path": format!("output/temp_images/1700000000000_{}", name)
                }))
            })
            .await;
        backend
            .respond(
                Method::Post,
                "/inject_images",
                json!({
                    "success": true,
                    "filename": "quarterly_review_v2.pptx",
                    "download_url": "/api/download/quarterly_review_v2.pptx"
                }),
            )
            .await;

        backend
            .respond(
                Method::Post,
                "/generate-mermaid",
                json!({"success": true, "mermaid_code": "flowchart TD\n  A[Start] --> B[Review]\n  B --> C[Done]"}),
            )
            .await;
        backend
            .respond(
                Method::Post,
                "/generate-flowchart",
                json!({"success": true, "download_url": "/api/download/flowchart_demo.png", "filename": "flowchart_demo.png"}),
            )
            .await;

        backend
            .respond(
                Method::Get,
                "/help",
                json!({"success": true, "content": "Pick a document type and template, describe what you need, then generate."}),
            )
            .await;

        backend.add_file("/download/*", b"demo document bytes".to_vec()).await;
        backend.add_file("/download_template/*", b"demo template bytes".to_vec()).await;

        backend
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Gateway for MockBackend {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn call(&self, request: GatewayRequest) -> Result<Value, GatewayError> {
        debug!("Mock backend: {} {}", request.method, request.endpoint);
        self.calls.lock().await.push(request.clone());

        let reply = {
            let mut routes = self.routes.lock().await;
            let exact = routes
                .iter()
                .position(|r| r.is_exact() && r.matches(request.method, &request.endpoint));
            let index = exact.or_else(|| routes.iter().position(|r| r.matches(request.method, &request.endpoint)));
            index.and_then(|i| routes[i].next_reply())
        };

        match reply {
            Some(Reply::Fixed(result)) => result,
            Some(Reply::Computed(responder)) => responder(&request),
            None => Err(GatewayError::transport(format!(
                "Backend returned 404 Not Found for {} {}",
                request.method, request.endpoint
            ))),
        }
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, GatewayError> {
        let endpoint = url
            .strip_prefix(self.base_url.as_str())
            .ok_or_else(|| GatewayError::transport(format!("Backend returned 404 Not Found for GET {}", url)))?;
        debug!("Mock backend: GET {} (download)", endpoint);
        self.calls.lock().await.push(GatewayRequest::get(endpoint));

        let files = self.files.lock().await;
        files
            .get(endpoint)
            .or_else(|| {
                files
                    .iter()
                    .find(|(pattern, _)| pattern_matches(pattern, endpoint))
                    .map(|(_, bytes)| bytes)
            })
            .cloned()
            .ok_or_else(|| GatewayError::backend("文件不存在"))
    }
}
