//! Client for the deployed execution endpoints.
//!
//! Auth context travels with the service instance; nothing here reads
//! ambient session state. Handler-reported failures come back as 400s
//! whose body still carries the full envelope, so the body is parsed on
//! every status and only transport-level problems surface as errors.

use anyhow::{Context, Result};
use serde::Serialize;

use notebook_core::analysis::ExecutionResult;
use notebook_core::dispatch::{ExecutionRequest, ExecutionService};
use notebook_core::language::Language;
use notebook_core::sql::SqlOutcome;

use crate::types::{ExecuteCodeRequest, ExecuteQueryRequest, ExecutionResponse, SqlResponse};

pub struct HttpService {
    base_url: String,
    bearer_token: Option<String>,
    client: reqwest::Client,
}

impl HttpService {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            bearer_token: None,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    fn endpoint(language: Language) -> &'static str {
        match language {
            Language::Python => "/execute-python",
            Language::Sql => "/execute-sql",
            Language::R => "/execute-r",
            Language::Scala => "/execute-scala",
        }
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<reqwest::Response> {
        let mut request = self
            .client
            .post(format!("{}{path}", self.base_url))
            .json(body);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }
        request
            .send()
            .await
            .with_context(|| format!("execution endpoint {path} unreachable"))
    }
}

impl ExecutionService for HttpService {
    #[tracing::instrument(skip_all, fields(language = %language, cell = %request.cell_id))]
    async fn execute_code(
        &self,
        language: Language,
        request: &ExecutionRequest,
    ) -> Result<ExecutionResult> {
        let body = ExecuteCodeRequest {
            code: Some(request.source.clone()),
            notebook_id: Some(request.notebook_id.clone()),
            cell_id: Some(request.cell_id.clone()),
        };
        let response = self.post(Self::endpoint(language), &body).await?;
        let envelope: ExecutionResponse = response
            .json()
            .await
            .context("malformed execution response")?;
        Ok(envelope.into_result(language))
    }

    #[tracing::instrument(skip_all, fields(cell = %request.cell_id))]
    async fn execute_sql(&self, request: &ExecutionRequest) -> Result<SqlOutcome> {
        let body = ExecuteQueryRequest {
            query: Some(request.source.clone()),
            notebook_id: Some(request.notebook_id.clone()),
            cell_id: Some(request.cell_id.clone()),
        };
        let response = self.post(Self::endpoint(Language::Sql), &body).await?;
        let envelope: SqlResponse = response
            .json()
            .await
            .context("malformed sql execution response")?;
        Ok(envelope.into_outcome())
    }
}
