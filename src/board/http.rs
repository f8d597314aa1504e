use async_trait::async_trait;
use command_center_common::{ActivityEntry, Credentials, LoginResponse, RegisteredUser, Task};
use reqwest::{RequestBuilder, Response, StatusCode};

use super::adapter::{Committed, Mutation, PersistenceAdapter};
use super::session::SessionStore;
use crate::errors::BoardError;

/// Talks to a board server over its JSON API with a bearer token.
pub struct HttpAdapter {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    sessions: Option<SessionStore>,
}

impl HttpAdapter {
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            sessions: None,
        }
    }

    /// Use the token saved in `sessions`, and discard it when the server
    /// rejects it.
    pub fn from_session(base_url: &str, sessions: SessionStore) -> Self {
        let token = sessions.load().map(|s| s.token);
        let mut adapter = Self::new(base_url, token);
        adapter.sessions = Some(sessions);
        adapter
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, BoardError> {
        let token = self.token.as_deref().ok_or(BoardError::AuthRequired)?;
        let resp = req.bearer_auth(token).send().await?;
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            self.discard_session();
            return Err(BoardError::AuthRequired);
        }
        if !status.is_success() {
            return Err(error_from_response(resp).await);
        }
        Ok(resp)
    }

    fn discard_session(&self) {
        if let Some(sessions) = &self.sessions {
            match sessions.clear() {
                Ok(true) => tracing::info!("Server rejected the stored token; session discarded"),
                Ok(false) => {}
                Err(e) => tracing::warn!(error = %e, "Failed to discard session"),
            }
        }
    }
}

/// Turn a non-success response into a `BoardError::Server`, preferring the
/// `{"error": ...}` body the server sends.
async fn error_from_response(resp: Response) -> BoardError {
    let status = resp.status();
    let fallback = status.canonical_reason().unwrap_or("request failed").to_string();
    let message = resp
        .json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or(fallback);
    BoardError::Server {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl PersistenceAdapter for HttpAdapter {
    async fn fetch_tasks(&self) -> Result<Vec<Task>, BoardError> {
        let resp = self.send(self.client.get(self.url("/api/tasks"))).await?;
        Ok(resp.json().await?)
    }

    async fn fetch_activity(&self, limit: usize) -> Result<Vec<ActivityEntry>, BoardError> {
        let resp = self.send(self.client.get(self.url("/api/activity"))).await?;
        // Newest first on the wire.
        let mut entries: Vec<ActivityEntry> = resp.json().await?;
        entries.truncate(limit);
        entries.reverse();
        Ok(entries)
    }

    async fn commit(&self, mutation: Mutation) -> Result<Committed, BoardError> {
        match mutation {
            Mutation::CreateTask(payload) => {
                let req = self.client.post(self.url("/api/tasks")).json(&payload);
                let resp = self.send(req).await?;
                Ok(Committed::Task(resp.json().await?))
            }
            Mutation::UpdateTask { id, payload } => {
                let req = self
                    .client
                    .put(self.url(&format!("/api/tasks/{}", id)))
                    .json(&payload);
                let resp = self.send(req).await?;
                Ok(Committed::Task(resp.json().await?))
            }
            Mutation::DeleteTask { id } => {
                let req = self.client.delete(self.url(&format!("/api/tasks/{}", id)));
                self.send(req).await?;
                Ok(Committed::Deleted)
            }
            Mutation::AppendActivity(entry) => {
                let req = self.client.post(self.url("/api/activity")).json(&entry);
                let resp = self.send(req).await?;
                Ok(Committed::Activity(resp.json().await?))
            }
        }
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}

pub async fn register(base_url: &str, creds: &Credentials) -> Result<RegisteredUser, BoardError> {
    let url = format!("{}/api/auth/register", base_url.trim_end_matches('/'));
    let resp = reqwest::Client::new().post(url).json(creds).send().await?;
    if !resp.status().is_success() {
        return Err(error_from_response(resp).await);
    }
    Ok(resp.json().await?)
}

pub async fn login(base_url: &str, creds: &Credentials) -> Result<LoginResponse, BoardError> {
    let url = format!("{}/api/auth/login", base_url.trim_end_matches('/'));
    let resp = reqwest::Client::new().post(url).json(creds).send().await?;
    if !resp.status().is_success() {
        return Err(error_from_response(resp).await);
    }
    Ok(resp.json().await?)
}
