//! Wire shapes for the execution endpoints. Field names follow the
//! deployed JSON contract (camelCase), so the server and every client
//! serialize through these instead of hand-building envelopes.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use notebook_core::analysis::ExecutionResult;
use notebook_core::language::Language;
use notebook_core::sql::{QueryPayload, SqlOutcome};

/// Body of `POST /execute-{python|r|scala}`. Every field is optional so
/// that a missing `code` reaches the validation path (400 `Code is
/// required`) instead of a deserializer rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteCodeRequest {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub notebook_id: Option<String>,
    #[serde(default)]
    pub cell_id: Option<String>,
}

/// Body of `POST /execute-sql`; same as [`ExecuteCodeRequest`] but the
/// source field is named `query`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteQueryRequest {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub notebook_id: Option<String>,
    #[serde(default)]
    pub cell_id: Option<String>,
}

/// Uniform response envelope for the three code languages. `error` is
/// always present (null on success); the 400 validation body only carries
/// `error`, so everything else defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub execution_time: u64,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub language: Option<Language>,
}

impl ExecutionResponse {
    pub fn from_result(result: &ExecutionResult) -> Self {
        Self {
            success: result.success,
            output: result.output.clone(),
            error: result.error.clone(),
            execution_time: result.execution_time_ms,
            timestamp: Some(wire_timestamp(result.timestamp)),
            language: Some(result.language),
        }
    }

    /// Rebuild the core result on the client side. `language` fills in for
    /// degenerate bodies (the validation 400) that omit it.
    pub fn into_result(self, language: Language) -> ExecutionResult {
        ExecutionResult {
            success: self.success,
            output: self.output,
            error: self.error,
            execution_time_ms: self.execution_time,
            timestamp: parse_wire_timestamp(self.timestamp.as_deref()),
            language: self.language.unwrap_or(language),
        }
    }
}

/// SQL response envelope: payload nested under `data`, no `language` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SqlResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<QueryPayload>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub execution_time: u64,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl SqlResponse {
    pub fn from_outcome(outcome: &SqlOutcome) -> Self {
        Self {
            success: outcome.success,
            data: outcome.data.clone(),
            error: outcome.error.clone(),
            execution_time: outcome.execution_time_ms,
            timestamp: Some(wire_timestamp(outcome.timestamp)),
        }
    }

    pub fn into_outcome(self) -> SqlOutcome {
        SqlOutcome {
            success: self.success,
            data: self.data,
            error: self.error,
            execution_time_ms: self.execution_time,
            timestamp: parse_wire_timestamp(self.timestamp.as_deref()),
        }
    }
}

fn wire_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_wire_timestamp(raw: Option<&str>) -> DateTime<Utc> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn execution_response_serializes_the_wire_contract() {
        let result = ExecutionResult {
            success: true,
            output: "=== Output ===".to_string(),
            error: None,
            execution_time_ms: 12,
            timestamp: "2026-08-07T10:15:30.123Z".parse().unwrap(),
            language: Language::Python,
        };
        let body = serde_json::to_value(ExecutionResponse::from_result(&result)).unwrap();
        assert_eq!(
            body,
            json!({
                "success": true,
                "output": "=== Output ===",
                "error": null,
                "executionTime": 12,
                "timestamp": "2026-08-07T10:15:30.123Z",
                "language": "python",
            })
        );
    }

    #[test]
    fn validation_body_parses_into_a_failed_result() {
        let envelope: ExecutionResponse =
            serde_json::from_str(r#"{"error":"Code is required"}"#).unwrap();
        let result = envelope.into_result(Language::R);
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Code is required"));
        assert_eq!(result.language, Language::R);
        assert!(result.output.is_empty());
    }

    #[test]
    fn sql_response_omits_data_when_absent() {
        let outcome = SqlOutcome {
            success: false,
            data: None,
            error: Some("boom".to_string()),
            execution_time_ms: 1,
            timestamp: Utc::now(),
        };
        let body = serde_json::to_value(SqlResponse::from_outcome(&outcome)).unwrap();
        assert!(body.get("data").is_none());
        assert_eq!(body["error"], "boom");
    }

    #[test]
    fn camel_case_request_fields_deserialize() {
        let req: ExecuteCodeRequest =
            serde_json::from_str(r#"{"code":"x = 1","notebookId":"nb","cellId":"c"}"#).unwrap();
        assert_eq!(req.code.as_deref(), Some("x = 1"));
        assert_eq!(req.notebook_id.as_deref(), Some("nb"));
        assert_eq!(req.cell_id.as_deref(), Some("c"));
    }
}
