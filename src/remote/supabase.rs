//! Supabase (PostgREST) client for the two hosted tables

use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use super::{
    ANONYMOUS_USER, EXERCISES_TABLE, ExerciseRow, PROGRESS_LOGS_TABLE, ProgressLogRow, RemoteStore,
};
use crate::config::{REMOTE_TIMEOUT, SupabaseConfig};

#[derive(Deserialize, Debug)]
struct SupabaseUser {
    id: String,
}

pub struct SupabaseClient {
    http: Client,
    url: String,
    anon_key: String,
    access_token: Option<String>,
    user: OnceCell<String>,
}

impl SupabaseClient {
    pub fn new(config: &SupabaseConfig) -> Result<Self> {
        Self::with_timeout(config, REMOTE_TIMEOUT)
    }

    /// Every request, including the session lookup, fails after `timeout`
    pub fn with_timeout(config: &SupabaseConfig, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            access_token: config.access_token.clone(),
            user: OnceCell::new(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.url, table)
    }

    /// apikey plus bearer: the user's token when present, otherwise the anon key
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.anon_key);
        request
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", bearer))
    }

    async fn upsert<T: serde::Serialize>(&self, table: &str, row: &T) -> Result<()> {
        let response = self
            .authorize(self.http.post(self.table_url(table)))
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(row)
            .send()
            .await
            .with_context(|| format!("upsert into {} failed to send", table))?;

        ensure_success(response, table).await?;
        Ok(())
    }

    async fn select<T: DeserializeOwned>(&self, table: &str, query: &[(&str, String)]) -> Result<Vec<T>> {
        let response = self
            .authorize(self.http.get(self.table_url(table)))
            .query(query)
            .send()
            .await
            .with_context(|| format!("select from {} failed to send", table))?;

        let rows = ensure_success(response, table)
            .await?
            .json::<Vec<T>>()
            .await
            .with_context(|| format!("unexpected rows from {}", table))?;
        Ok(rows)
    }

    async fn resolve_user(&self) -> Result<String> {
        let Some(token) = self.access_token.as_deref() else {
            return Ok(ANONYMOUS_USER.to_string());
        };

        let response = self
            .http
            .get(format!("{}/auth/v1/user", self.url))
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .context("session lookup failed to send")?;

        if matches!(response.status(), StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            warn!("Access token rejected, continuing as {}", ANONYMOUS_USER);
            return Ok(ANONYMOUS_USER.to_string());
        }

        let user: SupabaseUser = ensure_success(response, "auth")
            .await?
            .json()
            .await
            .context("invalid session response")?;
        debug!("Resolved session user {}", user.id);
        Ok(user.id)
    }
}

async fn ensure_success(response: Response, what: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    bail!("{} request failed ({}): {}", what, status, body)
}

impl RemoteStore for SupabaseClient {
    async fn current_user(&self) -> Result<String> {
        let user = self.user.get_or_try_init(|| self.resolve_user()).await?;
        Ok(user.clone())
    }

    async fn upsert_exercise(&self, row: &ExerciseRow) -> Result<()> {
        self.upsert(EXERCISES_TABLE, row).await
    }

    async fn upsert_progress_log(&self, row: &ProgressLogRow) -> Result<()> {
        self.upsert(PROGRESS_LOGS_TABLE, row).await
    }

    async fn select_exercises(&self, user_id: &str) -> Result<Vec<ExerciseRow>> {
        let query = [
            ("select", "*".to_string()),
            ("user_id", format!("eq.{}", user_id)),
        ];
        self.select(EXERCISES_TABLE, &query).await
    }

    async fn select_progress_logs(&self, user_id: &str) -> Result<Vec<ProgressLogRow>> {
        let query = [
            ("select", "*".to_string()),
            ("user_id", format!("eq.{}", user_id)),
            ("order", "date.desc".to_string()),
        ];
        self.select(PROGRESS_LOGS_TABLE, &query).await
    }
}
