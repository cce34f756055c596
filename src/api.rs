//! Restaurant backend API client.
//!
//! One typed client for every REST endpoint the dashboard consumes. Bearer
//! tokens are injected from the [`Session`] except for the two public calls
//! (login and reservation listing); bodies are JSON unless the payload is a
//! multipart form. A 401 from an authenticated call invalidates the session.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::auth::{AuthApi, Session};
use crate::config::AppConfig;
use crate::employees::{EmployeeApi, EmployeePayload};
use crate::error::{DashboardError, DashboardResult, GENERIC_API_ERROR};
use crate::invoice::BillingApi;
use crate::kitchen::KitchenApi;
use crate::menu::MenuApi;
use crate::models::{
    Employee, Id, KitchenItem, KitchenItemStatus, LoginResponse, MenuItem, MonthlyReport, Order,
    ReportSummary, Reservation, Role, Table, WaiterTable,
};
use crate::orders::{OrderApi, OrderDraft};
use crate::reports::ReportApi;
use crate::reservations::{ReservationApi, ReservationPayload};
use crate::tables::{TableApi, TableDraft};
use crate::waiter::WaiterApi;

const LOGIN_PATH: &str = "/api/auth/login";
const RESERVATIONS_PATH: &str = "/api/reservations";

// ---------------------------------------------------------------------------
// URL normalisation
// ---------------------------------------------------------------------------

/// Normalise the backend base URL:
/// - ensure a scheme is present (https, or http for localhost)
/// - strip trailing slashes
/// - strip a trailing `/api` segment
pub fn normalize_base_url(url: &str) -> String {
    let mut url = url.trim().to_string();
    if url.is_empty() {
        return url;
    }

    if !url.starts_with("http://") && !url.starts_with("https://") {
        if url.starts_with("localhost") || url.starts_with("127.0.0.1") {
            url = format!("http://{url}");
        } else {
            url = format!("https://{url}");
        }
    }

    while url.ends_with('/') {
        url.pop();
    }
    if url.ends_with("/api") {
        url.truncate(url.len() - 4);
    }
    while url.ends_with('/') {
        url.pop();
    }

    url
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// Convert a `reqwest::Error` into a user-friendly message.
fn friendly_error(url: &str, err: &reqwest::Error) -> String {
    if err.is_connect() {
        return format!("Cannot reach the restaurant backend at {url}");
    }
    if err.is_timeout() {
        return format!("Connection to {url} timed out");
    }
    if err.is_builder() {
        return format!("Invalid backend URL: {url}");
    }
    format!("Network error communicating with {url}: {err}")
}

/// Fallback message derived from the HTTP status alone.
fn status_error(status: StatusCode) -> String {
    match status.as_u16() {
        401 => "Not signed in or the session has expired".to_string(),
        403 => "You are not allowed to perform this action".to_string(),
        404 => "Backend endpoint not found".to_string(),
        s if s >= 500 => format!("Restaurant backend server error (HTTP {s})"),
        _ => GENERIC_API_ERROR.to_string(),
    }
}

/// Pick the message to display for a failed call: body `message`, body
/// `error`, a bare JSON string, plain text, then a status-derived fallback.
pub fn extract_error_message(status: StatusCode, body_text: &str) -> String {
    let trimmed = body_text.trim();
    if trimmed.is_empty() {
        return status_error(status);
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(json) => {
            let from_fields = json
                .get("message")
                .or_else(|| json.get("error"))
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string);
            if let Some(message) = from_fields {
                return message;
            }
            match json {
                Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
                _ => status_error(status),
            }
        }
        Err(_) => trimmed.to_string(),
    }
}

/// Calls sent without a bearer token.
pub fn is_public_endpoint(method: &Method, path: &str) -> bool {
    let path = path.split('?').next().unwrap_or(path).trim_end_matches('/');
    (method == Method::POST && path == LOGIN_PATH)
        || (method == Method::GET && path == RESERVATIONS_PATH)
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Multipart body kept as plain data until send time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartForm {
    pub fields: Vec<(String, String)>,
    pub file: Option<FilePart>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.fields.push((name.to_string(), value.into()));
        self
    }

    pub fn file(mut self, part: FilePart) -> Self {
        self.file = Some(part);
        self
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn into_form(self) -> DashboardResult<Form> {
        let mut form = Form::new();
        for (name, value) in self.fields {
            form = form.text(name, value);
        }
        if let Some(file) = self.file {
            let part = Part::bytes(file.bytes)
                .file_name(file.file_name)
                .mime_str(&file.mime)
                .map_err(|e| DashboardError::validation(format!("Invalid file type: {e}")))?;
            form = form.part(file.field, part);
        }
        Ok(form)
    }
}

pub enum Payload {
    Empty,
    Json(Value),
    Multipart(MultipartForm),
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct ApiClient {
    base: String,
    http: Client,
    session: Arc<Session>,
}

impl ApiClient {
    pub fn new(cfg: &AppConfig, session: Arc<Session>) -> DashboardResult<Self> {
        let base = normalize_base_url(&cfg.api_base);
        if base.is_empty() {
            return Err(DashboardError::Config("API base URL is empty".into()));
        }
        let mut builder = Client::builder();
        if let Some(timeout) = cfg.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| DashboardError::Config(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            base,
            http,
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Perform one request. `path` includes the leading slash.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        payload: Payload,
    ) -> DashboardResult<Value> {
        let full_url = format!("{}{}", self.base, path);
        let public = is_public_endpoint(&method, path);

        let mut req = self.http.request(method.clone(), &full_url);
        if !query.is_empty() {
            req = req.query(query);
        }

        let mut authenticated = false;
        if !public {
            if let Some(token) = self.session.token() {
                req = req.bearer_auth(token);
                authenticated = true;
            }
        }

        req = match payload {
            Payload::Empty => req.header(CONTENT_TYPE, "application/json"),
            Payload::Json(body) => req.json(&body),
            Payload::Multipart(form) => req.multipart(form.into_form()?),
        };

        debug!(method = %method, path = %path, authenticated, "backend request");
        let resp = req
            .send()
            .await
            .map_err(|e| DashboardError::Network(friendly_error(&self.base, &e)))?;
        let status = resp.status();

        if status == StatusCode::UNAUTHORIZED && authenticated {
            self.session.invalidate();
            return Err(DashboardError::Unauthorized);
        }

        if !status.is_success() {
            // An unreadable error body still reports the status.
            let body_text = resp.text().await.unwrap_or_default();
            let message = extract_error_message(status, &body_text);
            warn!(method = %method, path = %path, status = status.as_u16(), error = %message, "backend call failed");
            return Err(DashboardError::Backend {
                status: status.as_u16(),
                message,
            });
        }

        let body_text = resp
            .text()
            .await
            .map_err(|e| DashboardError::Network(friendly_error(&self.base, &e)))?;
        // Null for empty 204-style responses, text for non-JSON bodies.
        if body_text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body_text).unwrap_or(Value::String(body_text)))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> DashboardResult<T> {
        let value = self.send(Method::GET, path, &[], Payload::Empty).await?;
        decode(value)
    }

    async fn get_list<T: DeserializeOwned>(&self, path: &str) -> DashboardResult<Vec<T>> {
        let value = self.send(Method::GET, path, &[], Payload::Empty).await?;
        decode_list(value)
    }

    async fn post_json(&self, path: &str, body: Value) -> DashboardResult<Value> {
        self.send(Method::POST, path, &[], Payload::Json(body)).await
    }

    async fn put_json(&self, path: &str, body: Value) -> DashboardResult<Value> {
        self.send(Method::PUT, path, &[], Payload::Json(body)).await
    }

    async fn delete(&self, path: &str) -> DashboardResult<Value> {
        self.send(Method::DELETE, path, &[], Payload::Empty).await
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> DashboardResult<Value> {
    serde_json::to_value(value).map_err(|e| DashboardError::validation(e.to_string()))
}

/// Decode a JSON response into a typed value.
pub fn decode<T: DeserializeOwned>(value: Value) -> DashboardResult<T> {
    serde_json::from_value(value)
        .map_err(|e| DashboardError::Network(format!("Invalid JSON from restaurant backend: {e}")))
}

/// Decode a list response; a null body is an empty list.
pub fn decode_list<T: DeserializeOwned>(value: Value) -> DashboardResult<Vec<T>> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    decode(value)
}

// ---------------------------------------------------------------------------
// Endpoint implementations
// ---------------------------------------------------------------------------

#[async_trait]
impl AuthApi for ApiClient {
    async fn login(&self, username: &str, password: &str) -> DashboardResult<LoginResponse> {
        let body = serde_json::json!({ "username": username, "password": password });
        let value = self.post_json(LOGIN_PATH, body).await?;
        info!(base = %self.base, "login response received");
        decode(value)
    }
}

#[async_trait]
impl TableApi for ApiClient {
    async fn list_tables(&self) -> DashboardResult<Vec<Table>> {
        self.get_list("/api/tables").await
    }

    async fn create_table(&self, draft: &TableDraft) -> DashboardResult<Value> {
        self.post_json("/api/tables", to_json(draft)?).await
    }

    async fn update_table(&self, id: Id, draft: &TableDraft) -> DashboardResult<Value> {
        self.put_json(&format!("/api/tables/{id}"), to_json(draft)?)
            .await
    }

    async fn delete_table(&self, id: Id) -> DashboardResult<Value> {
        self.delete(&format!("/api/tables/{id}")).await
    }
}

#[async_trait]
impl ReservationApi for ApiClient {
    async fn list_reservations(&self) -> DashboardResult<Vec<Reservation>> {
        self.get_list(RESERVATIONS_PATH).await
    }

    async fn create_reservation(&self, payload: &ReservationPayload) -> DashboardResult<Value> {
        self.post_json(RESERVATIONS_PATH, to_json(payload)?).await
    }

    async fn update_reservation(
        &self,
        id: Id,
        payload: &ReservationPayload,
    ) -> DashboardResult<Value> {
        self.put_json(&format!("{RESERVATIONS_PATH}/{id}"), to_json(payload)?)
            .await
    }

    async fn delete_reservation(&self, id: Id) -> DashboardResult<Value> {
        self.delete(&format!("{RESERVATIONS_PATH}/{id}")).await
    }
}

#[async_trait]
impl OrderApi for ApiClient {
    async fn list_orders(&self) -> DashboardResult<Vec<Order>> {
        self.get_list("/api/orders").await
    }

    async fn create_order(&self, draft: &OrderDraft) -> DashboardResult<Value> {
        self.post_json("/api/orders", to_json(draft)?).await
    }
}

#[async_trait]
impl KitchenApi for ApiClient {
    async fn pending_items(&self) -> DashboardResult<Vec<KitchenItem>> {
        self.get_list("/api/kitchen/items/pending").await
    }

    async fn update_item_status(
        &self,
        order_id: Id,
        item_id: Id,
        status: KitchenItemStatus,
    ) -> DashboardResult<Value> {
        self.send(
            Method::PUT,
            &format!("/api/kitchen/items/{order_id}/{item_id}/status"),
            &[("status", status.as_str())],
            Payload::Empty,
        )
        .await
    }
}

#[async_trait]
impl EmployeeApi for ApiClient {
    async fn list_employees(&self) -> DashboardResult<Vec<Employee>> {
        self.get_list("/api/employees").await
    }

    async fn list_roles(&self) -> DashboardResult<Vec<Role>> {
        self.get_list("/api/employees/roles").await
    }

    async fn create_employee(&self, payload: &EmployeePayload<'_>) -> DashboardResult<Value> {
        self.post_json("/api/employees", to_json(payload)?).await
    }

    async fn update_employee(
        &self,
        id: Id,
        payload: &EmployeePayload<'_>,
    ) -> DashboardResult<Value> {
        self.put_json(&format!("/api/employees/{id}"), to_json(payload)?)
            .await
    }

    async fn delete_employee(&self, id: Id) -> DashboardResult<Value> {
        self.delete(&format!("/api/employees/{id}")).await
    }
}

#[async_trait]
impl MenuApi for ApiClient {
    async fn list_menu(&self) -> DashboardResult<Vec<MenuItem>> {
        self.get_list("/api/menu").await
    }

    async fn create_menu_item(&self, form: MultipartForm) -> DashboardResult<Value> {
        self.send(Method::POST, "/api/menu", &[], Payload::Multipart(form))
            .await
    }

    async fn update_menu_item(&self, id: Id, form: MultipartForm) -> DashboardResult<Value> {
        self.send(
            Method::PUT,
            &format!("/api/menu/{id}"),
            &[],
            Payload::Multipart(form),
        )
        .await
    }

    async fn delete_menu_item(&self, id: Id) -> DashboardResult<Value> {
        self.delete(&format!("/api/menu/{id}")).await
    }
}

#[async_trait]
impl BillingApi for ApiClient {
    async fn invoice_for_order(&self, order_id: Id) -> DashboardResult<Value> {
        self.get(&format!("/api/billing/invoice/{order_id}")).await
    }

    async fn create_invoice(&self, order_id: Id) -> DashboardResult<Value> {
        self.send(
            Method::POST,
            &format!("/api/billing/invoice/{order_id}"),
            &[],
            Payload::Empty,
        )
        .await
    }

    async fn pay_invoice(&self, invoice_id: Id, amount: f64, method: &str) -> DashboardResult<Value> {
        let amount = amount.to_string();
        self.send(
            Method::POST,
            &format!("/api/billing/pay/{invoice_id}"),
            &[("amount", amount.as_str()), ("method", method)],
            Payload::Empty,
        )
        .await
    }
}

#[async_trait]
impl WaiterApi for ApiClient {
    async fn waiter_tables(&self) -> DashboardResult<Vec<WaiterTable>> {
        self.get_list("/api/waiter/tables").await
    }

    async fn serve_table(&self, table_id: Id) -> DashboardResult<Value> {
        self.post_json(
            &format!("/api/waiter/tables/{table_id}/serve"),
            serde_json::json!({}),
        )
        .await
    }
}

#[async_trait]
impl ReportApi for ApiClient {
    async fn summary_today(&self) -> DashboardResult<ReportSummary> {
        self.get("/api/reports/summary/today").await
    }

    async fn monthly(&self) -> DashboardResult<MonthlyReport> {
        self.get("/api/reports/monthly").await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::auth::tests::token_with;
    use crate::routes::{guard, Route, RouteDecision};
    use crate::storage::MemoryTokenStore;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    /// Serve exactly one HTTP response and hand back the raw request text.
    pub(crate) fn one_shot_server(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, std::thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port for test");
        let port = listener.local_addr().expect("local addr").port();
        let handle = std::thread::spawn(move || {
            let (mut stream, _addr) = listener.accept().expect("accept connection");
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = stream.read(&mut chunk).expect("read request");
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&buf).to_string();
                if let Some(head_end) = text.find("\r\n\r\n") {
                    let content_length = text[..head_end]
                        .lines()
                        .find_map(|l| {
                            let lower = l.to_ascii_lowercase();
                            lower
                                .strip_prefix("content-length:")
                                .and_then(|v| v.trim().parse::<usize>().ok())
                        })
                        .unwrap_or(0);
                    if buf.len() >= head_end + 4 + content_length {
                        break;
                    }
                }
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).expect("write response");
            String::from_utf8_lossy(&buf).to_string()
        });
        (format!("http://127.0.0.1:{port}"), handle)
    }

    pub(crate) fn client_for(base: &str, token: Option<&str>) -> ApiClient {
        let store = match token {
            Some(t) => MemoryTokenStore::with_token(t),
            None => MemoryTokenStore::new(),
        };
        let cfg = AppConfig::default().with_api_base(base);
        ApiClient::new(&cfg, Session::new(Box::new(store))).expect("client")
    }

    #[test]
    fn normalizes_base_urls() {
        assert_eq!(normalize_base_url("localhost:8080/"), "http://localhost:8080");
        assert_eq!(
            normalize_base_url("https://backend.example.com/api/"),
            "https://backend.example.com"
        );
        assert_eq!(normalize_base_url("backend.example.com"), "https://backend.example.com");
        assert_eq!(normalize_base_url("  "), "");
    }

    #[test]
    fn error_message_extraction_order() {
        let s = StatusCode::BAD_REQUEST;
        assert_eq!(
            extract_error_message(s, r#"{"message":"Table is full","error":"x"}"#),
            "Table is full"
        );
        assert_eq!(extract_error_message(s, r#"{"error":"Order has no items"}"#), "Order has no items");
        assert_eq!(extract_error_message(s, r#""plain json string""#), "plain json string");
        assert_eq!(extract_error_message(s, "Bad things"), "Bad things");
        assert_eq!(extract_error_message(s, r#"{"status":400}"#), GENERIC_API_ERROR);
        assert_eq!(
            extract_error_message(StatusCode::BAD_GATEWAY, ""),
            "Restaurant backend server error (HTTP 502)"
        );
    }

    #[test]
    fn only_login_and_reservation_listing_are_public() {
        assert!(is_public_endpoint(&Method::POST, "/api/auth/login"));
        assert!(is_public_endpoint(&Method::GET, "/api/reservations"));
        assert!(is_public_endpoint(&Method::GET, "/api/reservations/"));
        assert!(!is_public_endpoint(&Method::POST, "/api/reservations"));
        assert!(!is_public_endpoint(&Method::DELETE, "/api/reservations/4"));
        assert!(!is_public_endpoint(&Method::GET, "/api/tables"));
    }

    #[test]
    fn multipart_form_keeps_field_order() {
        let form = MultipartForm::new()
            .text("name", "Pho")
            .text("available", "true")
            .file(FilePart {
                field: "image".into(),
                file_name: "pho.png".into(),
                mime: "image/png".into(),
                bytes: vec![1, 2, 3],
            });
        assert_eq!(form.field("available"), Some("true"));
        assert_eq!(form.fields[0].0, "name");
        assert!(form.into_form().is_ok());
    }

    #[tokio::test]
    async fn authenticated_call_carries_bearer_token() {
        let (base, handle) = one_shot_server("200 OK", r#"[{"id":1,"name":"T1","capacity":4,"status":"OCCUPIED"}]"#);
        let token = token_with(serde_json::json!({ "roles": ["ROLE_ADMIN"] }));
        let client = client_for(&base, Some(&token));

        let tables = client.list_tables().await.expect("tables load");
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].capacity, Some(4));

        let request = handle.join().expect("server thread");
        assert!(request.starts_with("GET /api/tables "));
        assert!(request.contains(&format!("authorization: Bearer {token}"))
            || request.contains(&format!("Authorization: Bearer {token}")));
    }

    #[tokio::test]
    async fn reservation_listing_is_sent_without_token() {
        let (base, handle) = one_shot_server("200 OK", "null");
        let client = client_for(&base, Some("abc.def.ghi"));
        let list = client.list_reservations().await.expect("listing");
        assert!(list.is_empty());
        let request = handle.join().expect("server thread").to_ascii_lowercase();
        assert!(!request.contains("authorization:"));
    }

    #[tokio::test]
    async fn unauthorized_response_clears_the_session() {
        let (base, handle) = one_shot_server("401 Unauthorized", r#"{"message":"expired"}"#);
        let client = client_for(&base, Some("abc.def.ghi"));
        let err = client.list_orders().await.expect_err("401 should fail");
        assert!(err.is_unauthorized());
        assert!(!client.session().is_authenticated());
        handle.join().expect("server thread");
    }

    #[tokio::test]
    async fn expired_session_sends_the_next_navigation_to_login() {
        let (base, handle) = one_shot_server("401 Unauthorized", "");
        let token = token_with(serde_json::json!({ "roles": ["ROLE_ADMIN"] }));
        let client = client_for(&base, Some(&token));
        assert_eq!(guard(Route::Tables, client.session()), RouteDecision::Allow);

        let err = client.list_tables().await.expect_err("401 should fail");
        assert!(err.is_unauthorized());
        assert_eq!(guard(Route::Tables, client.session()), RouteDecision::RedirectLogin);
        handle.join().expect("server thread");
    }

    #[tokio::test]
    async fn truncated_success_body_is_a_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().expect("addr").port();
        let handle = std::thread::spawn(move || {
            let (mut stream, _addr) = listener.accept().expect("accept connection");
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            while !String::from_utf8_lossy(&buf).contains("\r\n\r\n") {
                let n = stream.read(&mut chunk).expect("read request");
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            let partial = "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 100\r\n\r\n[{\"id\":1";
            stream.write_all(partial.as_bytes()).expect("write partial response");
        });

        let client = client_for(&format!("http://127.0.0.1:{port}"), Some("abc.def.ghi"));
        let err = client.list_tables().await.expect_err("short body should fail");
        assert!(matches!(err, DashboardError::Network(_)), "got {err:?}");
        assert!(client.session().is_authenticated());
        handle.join().expect("server thread");
    }

    #[tokio::test]
    async fn backend_error_message_is_surfaced() {
        let (base, handle) = one_shot_server("409 Conflict", r#"{"message":"Table already reserved"}"#);
        let client = client_for(&base, Some("abc.def.ghi"));
        let err = client
            .delete_table(3)
            .await
            .expect_err("conflict should fail");
        match err {
            DashboardError::Backend { status, message } => {
                assert_eq!(status, 409);
                assert_eq!(message, "Table already reserved");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(client.session().is_authenticated());
        let request = handle.join().expect("server thread");
        assert!(request.starts_with("DELETE /api/tables/3 "));
    }

    #[tokio::test]
    async fn kitchen_status_goes_in_the_query_string() {
        let (base, handle) = one_shot_server("200 OK", "");
        let client = client_for(&base, Some("abc.def.ghi"));
        let value = client
            .update_item_status(12, 5, KitchenItemStatus::Cooking)
            .await
            .expect("status update");
        assert!(value.is_null());
        let request = handle.join().expect("server thread");
        assert!(request.starts_with("PUT /api/kitchen/items/12/5/status?status=COOKING "));
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().expect("addr").port();
        drop(listener);
        let client = client_for(&format!("http://127.0.0.1:{port}"), None);
        let err = client.list_menu().await.expect_err("connection refused");
        assert!(matches!(err, DashboardError::Network(_)));
    }
}
