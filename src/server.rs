//! Line-delimited JSON request loop over stdin/stdout.
//!
//! One request per line, one response per line. Malformed requests get
//! an error response on their own line; the loop itself only stops on
//! EOF or a transport-level I/O failure.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::engine::{UsageEngine, DEFAULT_MAX_RESULTS, DEFAULT_TIMEOUT_MS};
use crate::error::{EngineError, Result};

#[derive(Debug, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Request {
    /// Usage query at a 1-based (line, column) in a file.
    FindUsages {
        path: String,
        line: u32,
        column: u32,
        #[serde(default = "default_max_results")]
        max_results: usize,
        #[serde(default = "default_timeout_ms")]
        timeout_ms: u64,
    },
    /// Re-ingest a file from disk.
    Update { path: String },
    Stats,
}

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

#[derive(Debug, Serialize)]
pub struct Response {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    fn success(result: Value) -> Self {
        Self {
            ok: true,
            result: Some(result),
            error: None,
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            result: None,
            error: Some(message.into()),
        }
    }
}

/// Handles one request line. Never fails: every error becomes an error
/// response so the peer can keep the session alive.
pub fn handle_line(engine: &UsageEngine, line: &str) -> Response {
    let request: Request = match serde_json::from_str(line) {
        Ok(req) => req,
        Err(e) => {
            return Response::failure(EngineError::Protocol(e.to_string()).to_string());
        }
    };

    match dispatch(engine, request) {
        Ok(value) => Response::success(value),
        Err(e) => Response::failure(e.to_string()),
    }
}

fn dispatch(engine: &UsageEngine, request: Request) -> Result<Value> {
    match request {
        Request::FindUsages {
            path,
            line,
            column,
            max_results,
            timeout_ms,
        } => {
            let result = engine.find_usages(&path, line, column, max_results, timeout_ms)?;
            Ok(serde_json::to_value(result).map_err(|e| EngineError::Protocol(e.to_string()))?)
        }
        Request::Update { path } => {
            engine.update_file(&path)?;
            Ok(serde_json::json!({ "updated": path }))
        }
        Request::Stats => {
            let stats = engine.stats();
            Ok(serde_json::to_value(stats).map_err(|e| EngineError::Protocol(e.to_string()))?)
        }
    }
}

/// Serves requests until stdin closes.
pub async fn serve_stdio(engine: &UsageEngine) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    tracing::info!(root = %engine.root().display(), "serving usage queries on stdio");

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let response = handle_line(engine, line);
        let mut payload =
            serde_json::to_vec(&response).map_err(|e| EngineError::Protocol(e.to_string()))?;
        payload.push(b'\n');
        stdout.write_all(&payload).await?;
        stdout.flush().await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn engine_with(files: &[(&str, &str)]) -> (TempDir, UsageEngine) {
        let temp = TempDir::new().unwrap();
        for (name, content) in files {
            fs::write(temp.path().join(name), content).unwrap();
        }
        let engine = UsageEngine::new(temp.path());
        engine.index_root().unwrap();
        (temp, engine)
    }

    // === request parsing ===

    #[test]
    fn test_parse_find_usages_with_defaults() {
        let req: Request =
            serde_json::from_str(r#"{"method":"find_usages","path":"a.rs","line":1,"column":4}"#)
                .unwrap();
        match req {
            Request::FindUsages {
                max_results,
                timeout_ms,
                ..
            } => {
                assert_eq!(max_results, DEFAULT_MAX_RESULTS);
                assert_eq!(timeout_ms, DEFAULT_TIMEOUT_MS);
            }
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[test]
    fn test_parse_unknown_method_fails() {
        assert!(serde_json::from_str::<Request>(r#"{"method":"nope"}"#).is_err());
    }

    // === dispatch ===

    #[test]
    fn test_find_usages_round_trip() {
        let (_temp, engine) =
            engine_with(&[("a.rs", "fn alpha() {}\nfn beta() {\n    alpha();\n}\n")]);

        let response = handle_line(
            &engine,
            r#"{"method":"find_usages","path":"a.rs","line":1,"column":4}"#,
        );

        assert!(response.ok);
        let result = response.result.unwrap();
        assert_eq!(result["count"], 1);
        assert_eq!(result["symbolText"], "alpha");
    }

    #[test]
    fn test_malformed_line_is_error_response() {
        let (_temp, engine) = engine_with(&[]);
        let response = handle_line(&engine, "{not json");
        assert!(!response.ok);
        assert!(response.error.is_some());
    }

    #[test]
    fn test_missing_file_is_error_response() {
        let (_temp, engine) = engine_with(&[]);
        let response = handle_line(
            &engine,
            r#"{"method":"find_usages","path":"ghost.rs","line":1,"column":1}"#,
        );
        assert!(!response.ok);
    }

    #[test]
    fn test_stats_request() {
        let (_temp, engine) = engine_with(&[("a.rs", "fn alpha() {}\n")]);
        let response = handle_line(&engine, r#"{"method":"stats"}"#);
        assert!(response.ok);
        assert_eq!(response.result.unwrap()["files"], 1);
    }
}
