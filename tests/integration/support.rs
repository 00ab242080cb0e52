//! In-process stub of the loan desk backend

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use axum_extra::extract::Multipart;
use chrono::{NaiveDate, TimeZone, Utc};
use serde::Deserialize;
use serde_json::json;

use loan_desk::{
    api::{ApiClient, BearerToken},
    config::ApiConfig,
    models::{
        dates::parse_date, CurrentUser, LoanMetrics, LoanSlip, LoanSlipPage, LoanSlipQuery, LoanStatus,
        Notification, NotificationPage, NotificationType, Role,
    },
    services::Services,
};

pub const PASSWORD: &str = "secret1";

#[derive(Default)]
pub struct Backend {
    pub slips: Vec<LoanSlip>,
    pub notifications: Vec<Notification>,
    next_id: i64,
    /// Query strings seen by the metrics endpoint
    pub metric_requests: Vec<HashMap<String, String>>,
    /// Field names of the last multipart body received
    pub last_form_fields: Vec<String>,
}

pub type Shared = Arc<Mutex<Backend>>;

pub struct TestBackend {
    pub base_url: String,
    pub state: Shared,
}

impl TestBackend {
    pub fn client(&self) -> (Services, BearerToken) {
        let config = ApiConfig {
            base_url: self.base_url.clone(),
            timeout_secs: 5,
        };
        let bearer = BearerToken::default();
        let client = ApiClient::new(&config, bearer.clone()).expect("client");
        (Services::new(client), bearer)
    }

    /// Services already carrying the bearer token of `username`
    pub async fn signed_in(&self, username: &str) -> Services {
        let (services, bearer) = self.client();
        bearer.set(Some(token_for(username))).await;
        services
    }

    pub fn slip(&self, id: i64) -> Option<LoanSlip> {
        self.state.lock().unwrap().slips.iter().find(|s| s.id == id).cloned()
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn seed_slip(id: i64) -> LoanSlip {
    LoanSlip {
        id,
        name: format!("Laptop Dell {:02}", id),
        borrower_name: format!("Borrower {:02}", id),
        department: Some(if id % 2 == 0 { "IT" } else { "Sales" }.to_string()),
        position: Some("Staff".to_string()),
        description: Some("Laptop with charger and bag".to_string()),
        serial_number: Some(format!("SN-{:04}", id)),
        status: if id % 5 == 0 { LoanStatus::Returned } else { LoanStatus::Borrowing },
        images: vec![],
        borrowed_date: Some(date(2024, 1, 1)),
        returned_date: Some(date(2024, 1, 5)),
        created_at: None,
        updated_at: None,
    }
}

pub fn seed_notification(id: i64) -> Notification {
    Notification {
        id,
        recipient_id: 1,
        sender_id: None,
        title: "Loan slip overdue".to_string(),
        kind: NotificationType::LoanSlipOverdue,
        content: format!("Loan slip #{} is past its return date", id),
        is_read: false,
        read_at: None,
        created_at: Utc.with_ymd_and_hms(2024, 1, 6, 8, 0, 0).unwrap() + chrono::Duration::minutes(id),
        payload: None,
    }
}

impl Backend {
    pub fn seeded(slips: i64, notifications: i64) -> Self {
        Self {
            slips: (1..=slips).map(seed_slip).collect(),
            notifications: (1..=notifications).map(seed_notification).collect(),
            next_id: slips + 1,
            ..Self::default()
        }
    }
}

fn token_for(username: &str) -> String {
    format!("token-{}", username)
}

fn user_for_token(token: &str) -> Option<CurrentUser> {
    match token {
        "token-admin" => Some(CurrentUser {
            id: 1,
            username: "admin".to_string(),
            role: Role::Admin,
        }),
        "token-itstaff" => Some(CurrentUser {
            id: 2,
            username: "itstaff".to_string(),
            role: Role::It,
        }),
        _ => None,
    }
}

struct Failure(StatusCode, &'static str, String);

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let Failure(status, code, message) = self;
        (
            status,
            Json(json!({ "code": code, "message": message, "http_status": status.as_u16() })),
        )
            .into_response()
    }
}

type Handled<T> = Result<Json<T>, Failure>;

fn authorize(headers: &HeaderMap) -> Result<CurrentUser, Failure> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .and_then(user_for_token)
        .ok_or_else(|| Failure(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "Invalid or missing token".into()))
}

fn not_found(what: &str) -> Failure {
    Failure(StatusCode::NOT_FOUND, "NOT_FOUND", format!("{} not found", what))
}

#[derive(Deserialize)]
struct LoginBody {
    username: String,
    password: String,
}

async fn login(Json(body): Json<LoginBody>) -> Result<Json<serde_json::Value>, Failure> {
    let token = token_for(&body.username);
    if body.password != PASSWORD || user_for_token(&token).is_none() {
        return Err(Failure(
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            "Invalid username or password".into(),
        ));
    }
    Ok(Json(json!({ "token": token })))
}

async fn me(headers: HeaderMap) -> Handled<CurrentUser> {
    authorize(&headers).map(Json)
}

async fn loan_metrics(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Handled<LoanMetrics> {
    authorize(&headers)?;
    let mut backend = state.lock().unwrap();
    backend.metric_requests.push(params);

    let count = |status: LoanStatus| backend.slips.iter().filter(|s| s.status == status).count() as u64;
    Ok(Json(LoanMetrics {
        total: backend.slips.len() as u64,
        borrowing: count(LoanStatus::Borrowing),
        returned: count(LoanStatus::Returned),
        overdue: count(LoanStatus::Overdue),
    }))
}

async fn list_slips(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<LoanSlipQuery>,
) -> Handled<LoanSlipPage> {
    authorize(&headers)?;
    let backend = state.lock().unwrap();

    let matching: Vec<LoanSlip> = backend
        .slips
        .iter()
        .filter(|s| query.status.map_or(true, |status| s.status == status))
        .filter(|s| {
            query
                .search
                .as_deref()
                .map_or(true, |term| s.name.to_lowercase().contains(&term.to_lowercase()))
        })
        .cloned()
        .collect();

    let items = matching
        .iter()
        .skip(query.offset() as usize)
        .take(query.limit as usize)
        .cloned()
        .collect();
    Ok(Json(LoanSlipPage {
        items,
        total: matching.len() as u64,
    }))
}

async fn get_slip(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<i64>) -> Handled<LoanSlip> {
    authorize(&headers)?;
    let backend = state.lock().unwrap();
    backend
        .slips
        .iter()
        .find(|s| s.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| not_found("Loan slip"))
}

/// Text fields (repeated keys kept in order) and uploaded file names
struct ParsedForm {
    order: Vec<String>,
    text: HashMap<String, Vec<String>>,
    files: HashMap<String, Vec<String>>,
}

impl ParsedForm {
    fn first(&self, key: &str) -> Option<String> {
        self.text.get(key).and_then(|values| values.first().cloned())
    }
}

async fn parse_form(mut multipart: Multipart) -> Result<ParsedForm, Failure> {
    let bad = |e: axum_extra::extract::multipart::MultipartError| {
        Failure(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string())
    };
    let mut parsed = ParsedForm {
        order: vec![],
        text: HashMap::new(),
        files: HashMap::new(),
    };

    while let Some(field) = multipart.next_field().await.map_err(bad)? {
        let name = field.name().unwrap_or_default().to_string();
        if !parsed.order.contains(&name) {
            parsed.order.push(name.clone());
        }
        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                field.bytes().await.map_err(bad)?;
                parsed.files.entry(name).or_default().push(file_name);
            }
            None => {
                let value = field.text().await.map_err(bad)?;
                parsed.text.entry(name).or_default().push(value);
            }
        }
    }
    Ok(parsed)
}

fn uploaded_urls(form: &ParsedForm, field: &str) -> Vec<String> {
    form.files
        .get(field)
        .map(|names| names.iter().map(|n| format!("/uploads/{}", n)).collect())
        .unwrap_or_default()
}

async fn create_slip(State(state): State<Shared>, headers: HeaderMap, multipart: Multipart) -> Handled<LoanSlip> {
    authorize(&headers)?;
    let form = parse_form(multipart).await?;

    let required = |key: &str| {
        form.first(key)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Failure(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", format!("{} is required", key)))
    };
    let borrowed_date = parse_date(&required("borrowed_date")?);
    let returned_date = parse_date(&required("returned_date")?);
    let optional = |key: &str| form.first(key).filter(|v| !v.is_empty());

    let mut backend = state.lock().unwrap();
    let slip = LoanSlip {
        id: backend.next_id,
        name: required("name")?,
        borrower_name: required("borrower_name")?,
        department: optional("department"),
        position: optional("position"),
        description: optional("description"),
        serial_number: optional("serial_number"),
        status: LoanStatus::Borrowing,
        images: uploaded_urls(&form, "images"),
        borrowed_date,
        returned_date,
        created_at: Some(Utc::now()),
        updated_at: None,
    };
    backend.next_id += 1;
    backend.last_form_fields = form.order.clone();
    backend.slips.push(slip.clone());
    Ok(Json(slip))
}

async fn update_slip(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Handled<LoanSlip> {
    authorize(&headers)?;
    let form = parse_form(multipart).await?;

    let mut backend = state.lock().unwrap();
    backend.last_form_fields = form.order.clone();
    let slip = backend
        .slips
        .iter_mut()
        .find(|s| s.id == id)
        .ok_or_else(|| not_found("Loan slip"))?;

    let text_fields: [(&str, &mut String); 2] = [("name", &mut slip.name), ("borrower_name", &mut slip.borrower_name)];
    for (key, slot) in text_fields {
        if let Some(value) = form.first(key) {
            *slot = value;
        }
    }
    let optional_fields: [(&str, &mut Option<String>); 4] = [
        ("department", &mut slip.department),
        ("position", &mut slip.position),
        ("description", &mut slip.description),
        ("serial_number", &mut slip.serial_number),
    ];
    for (key, slot) in optional_fields {
        if let Some(value) = form.first(key) {
            *slot = Some(value);
        }
    }
    if let Some(code) = form.first("status") {
        slip.status = code
            .parse::<i16>()
            .ok()
            .and_then(LoanStatus::from_code)
            .ok_or_else(|| Failure(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", "Unknown status".into()))?;
    }
    if let Some(raw) = form.first("borrowed_date") {
        slip.borrowed_date = parse_date(&raw);
    }
    if let Some(raw) = form.first("returned_date") {
        slip.returned_date = parse_date(&raw);
    }

    let mut images = form.text.get("existing_images[]").cloned().unwrap_or_default();
    images.extend(uploaded_urls(&form, "new_images"));
    slip.images = images;
    slip.updated_at = Some(Utc::now());

    Ok(Json(slip.clone()))
}

async fn delete_slip(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, Failure> {
    authorize(&headers)?;
    let mut backend = state.lock().unwrap();
    let before = backend.slips.len();
    backend.slips.retain(|s| s.id != id);
    if backend.slips.len() == before {
        return Err(not_found("Loan slip"));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
struct PageParams {
    page: usize,
    limit: usize,
}

async fn list_notifications(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<PageParams>,
) -> Handled<NotificationPage> {
    authorize(&headers)?;
    let backend = state.lock().unwrap();
    let items = backend
        .notifications
        .iter()
        .skip(params.page.saturating_sub(1) * params.limit)
        .take(params.limit)
        .cloned()
        .collect();
    Ok(Json(NotificationPage {
        items,
        total: backend.notifications.len() as u64,
    }))
}

async fn mark_notification_read(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, Failure> {
    authorize(&headers)?;
    let mut backend = state.lock().unwrap();
    let notification = backend
        .notifications
        .iter_mut()
        .find(|n| n.id == id)
        .ok_or_else(|| not_found("Notification"))?;
    notification.mark_read(Utc::now());
    Ok(Json(json!({ "message": "Notification marked as read" })))
}

async fn unread_count(State(state): State<Shared>, headers: HeaderMap) -> Result<Json<serde_json::Value>, Failure> {
    authorize(&headers)?;
    let backend = state.lock().unwrap();
    let count = backend.notifications.iter().filter(|n| !n.is_read).count();
    Ok(Json(json!({ "unread_count": count })))
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/api/auth/login", axum::routing::post(login))
        .route("/api/me", get(me))
        .route("/api/dashboard/loan-metrics", get(loan_metrics))
        .route("/api/loan-slips", get(list_slips).post(create_slip))
        .route("/api/loan-slips/:id", get(get_slip).put(update_slip).delete(delete_slip))
        .route("/api/notifications", get(list_notifications))
        .route("/api/notifications/:id/read", put(mark_notification_read))
        .route("/api/notifications/unread/count", get(unread_count))
        .with_state(state)
}

/// Serve `backend` on an ephemeral local port for the rest of the test
pub async fn spawn(backend: Backend) -> TestBackend {
    let state: Shared = Arc::new(Mutex::new(backend));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub backend");
    let addr = listener.local_addr().expect("local addr");

    let app = router(Arc::clone(&state));
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub backend");
    });

    TestBackend {
        base_url: format!("http://{}", addr),
        state,
    }
}
