use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{FromRequest, Path, Request, State, rejection::JsonRejection},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use command_center_common::{
    Credentials, LoginResponse, NewActivity, Priority, TaskPayload, TaskStatus,
};

use super::auth::{self, TokenKeys};
use super::db::DbHandle;
#[cfg(test)]
use super::db::CommandDb;

/// Number of activity entries returned by `GET /api/activity`.
pub const ACTIVITY_LIMIT: i64 = 50;

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub db: DbHandle,
    pub keys: TokenKeys,
}

pub type SharedState = Arc<AppState>;

// ── Error handling ────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden")]
    Forbidden,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Unauthorized | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Request failed");
        }
        (status, Json(serde_json::json!({"error": self.to_string()}))).into_response()
    }
}

fn internal(e: anyhow::Error) -> ApiError {
    ApiError::Internal(format!("{:#}", e))
}

/// Bodies that fail to parse are server errors with the usual JSON body.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Internal(rejection.body_text())
    }
}

/// `Json` whose rejection is an [`ApiError`].
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router(state: SharedState) -> Router<SharedState> {
    let protected = Router::new()
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/tasks/{id}", put(update_task).delete(delete_task))
        .route("/api/activity", get(list_activity).post(create_activity))
        .route_layer(middleware::from_fn_with_state(state, auth::require_auth));

    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/health", get(health_check))
        .merge(protected)
}

fn validate_task(payload: &TaskPayload) -> Result<(), ApiError> {
    Priority::from_str(&payload.priority).map_err(ApiError::BadRequest)?;
    if let Some(status) = &payload.status {
        TaskStatus::from_str(status).map_err(ApiError::BadRequest)?;
    }
    Ok(())
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn health_check() -> &'static str {
    "ok"
}

async fn register(
    State(state): State<SharedState>,
    ApiJson(req): ApiJson<Credentials>,
) -> Result<impl IntoResponse, ApiError> {
    if req.username.trim().is_empty() || req.password.is_empty() {
        tracing::warn!("Registration with empty username or password");
        return Err(ApiError::Internal("User creation failed".into()));
    }
    let hash = auth::hash_password(req.password).await.map_err(|e| {
        tracing::error!(error = %e, "Password hashing failed");
        ApiError::Internal("User creation failed".into())
    })?;
    let username = req.username;
    let user = state
        .db
        .call(move |db| db.create_user(&username, &hash))
        .await
        .map_err(|e| {
            tracing::error!(error = %format!("{:#}", e), "Registration failed");
            ApiError::Internal("User creation failed".into())
        })?;
    tracing::info!(user_id = user.id, username = %user.username, "Registered user");
    Ok(Json(user))
}

async fn login(
    State(state): State<SharedState>,
    ApiJson(req): ApiJson<Credentials>,
) -> Result<impl IntoResponse, ApiError> {
    let login_failed = |e: anyhow::Error| {
        tracing::error!(error = %format!("{:#}", e), "Login failed");
        ApiError::Internal("Login failed".into())
    };

    let username = req.username.clone();
    let user = state
        .db
        .call(move |db| db.find_user(&username))
        .await
        .map_err(login_failed)?
        .ok_or(ApiError::InvalidCredentials)?;

    let valid = auth::verify_password(req.password, user.password_hash.clone())
        .await
        .map_err(login_failed)?;
    if !valid {
        return Err(ApiError::InvalidCredentials);
    }

    let token = state
        .keys
        .issue(user.id, &user.username)
        .map_err(login_failed)?;
    Ok(Json(LoginResponse {
        token,
        username: user.username,
    }))
}

async fn list_tasks(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    let tasks = state
        .db
        .call(|db| db.list_tasks())
        .await
        .map_err(internal)?;
    Ok(Json(tasks))
}

async fn create_task(
    State(state): State<SharedState>,
    ApiJson(payload): ApiJson<TaskPayload>,
) -> Result<impl IntoResponse, ApiError> {
    validate_task(&payload)?;
    let task = state
        .db
        .call(move |db| db.create_task(&payload))
        .await
        .map_err(internal)?;
    tracing::debug!(task_id = task.id, status = %task.status, "Created task");
    Ok(Json(task))
}

async fn update_task(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<TaskPayload>,
) -> Result<impl IntoResponse, ApiError> {
    validate_task(&payload)?;
    let task = state
        .db
        .call(move |db| db.update_task(id, &payload))
        .await
        .map_err(internal)?;
    match task {
        Some(task) => Ok(Json(task)),
        None => Err(ApiError::NotFound(format!("Task {} not found", id))),
    }
}

async fn delete_task(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state
        .db
        .call(move |db| db.delete_task(id))
        .await
        .map_err(internal)?;
    if !deleted {
        tracing::debug!(task_id = id, "Delete of missing task");
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn list_activity(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    let entries = state
        .db
        .call(|db| db.list_activity(ACTIVITY_LIMIT))
        .await
        .map_err(internal)?;
    Ok(Json(entries))
}

async fn create_activity(
    State(state): State<SharedState>,
    ApiJson(entry): ApiJson<NewActivity>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state
        .db
        .call(move |db| db.create_activity(&entry))
        .await
        .map_err(internal)?;
    Ok(Json(created))
}
