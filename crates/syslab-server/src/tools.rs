//! Tool dispatch and the line-delimited JSON loop
//!
//! One request per line: `{"tool": "<name>", "arguments": {...}}`.
//! One response per line: `{"ok": <result>}` or
//! `{"error": {"message": "...", "clientError": bool}}`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::io::{self, BufRead, Write};
use syslab_artifact::Store;
use syslab_core::{
    catalog, export_notebook, optimize_policy, read_resource, run_simulation, ExportRequest,
    LabError, OptimizeRequest, SimulationRequest, Solver,
};

/// Tool names understood by [`dispatch`]
pub const TOOLS: [&str; 5] = [
    "sd.run_simulation",
    "or.optimize_policy_seq",
    "pack.export_notebook",
    "syslab.catalog",
    "syslab.read",
];

/// Incoming tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Tool name
    pub tool: String,
    /// Tool arguments (defaults to `{}`)
    #[serde(default = "empty_object")]
    pub arguments: Value,
}

fn empty_object() -> Value {
    json!({})
}

#[derive(Debug, Deserialize)]
struct ReadArgs {
    uri: String,
}

/// Outgoing response line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolResponse {
    /// Tool result
    Ok(Value),
    /// Failure description
    Error(ToolFailure),
}

/// Failure payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolFailure {
    /// Human-readable message
    pub message: String,
    /// True if the request itself was at fault
    pub client_error: bool,
}

impl From<&ToolError> for ToolFailure {
    fn from(err: &ToolError) -> Self {
        Self {
            message: err.to_string(),
            client_error: err.is_client_error(),
        }
    }
}

/// Dispatch errors
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Request line is not a tool call
    #[error("malformed request: {0}")]
    MalformedRequest(#[source] serde_json::Error),

    /// No tool with that name
    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    /// Arguments do not fit the tool
    #[error("invalid arguments for {tool}: {source}")]
    InvalidArguments {
        tool: String,
        #[source]
        source: serde_json::Error,
    },

    /// Pipeline failure
    #[error(transparent)]
    Lab(#[from] LabError),
}

impl ToolError {
    /// True if the caller can fix the request
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::Lab(err) => err.is_client_error(),
            _ => true,
        }
    }
}

fn args<T: serde::de::DeserializeOwned>(call: &ToolCall) -> Result<T, ToolError> {
    serde_json::from_value(call.arguments.clone()).map_err(|source| ToolError::InvalidArguments {
        tool: call.tool.clone(),
        source,
    })
}

/// Run one tool call against `store`
///
/// # Errors
/// Unknown tool, bad arguments or pipeline failure
pub fn dispatch(call: &ToolCall, store: &Store, solver: &dyn Solver) -> Result<Value, ToolError> {
    let result = match call.tool.as_str() {
        "sd.run_simulation" => {
            let request: SimulationRequest = args(call)?;
            serde_json::to_value(run_simulation(&request, store)?)
        }
        "or.optimize_policy_seq" => {
            let request: OptimizeRequest = args(call)?;
            serde_json::to_value(optimize_policy(&request, store, solver)?)
        }
        "pack.export_notebook" => {
            let request: ExportRequest = args(call)?;
            serde_json::to_value(export_notebook(&request, store)?)
        }
        "syslab.catalog" => serde_json::to_value(catalog(store)?),
        "syslab.read" => {
            let read: ReadArgs = args(call)?;
            let bytes = read_resource(store, &read.uri)?;
            Ok(json!({
                "uri": read.uri,
                "text": String::from_utf8_lossy(&bytes),
            }))
        }
        other => return Err(ToolError::UnknownTool(other.to_string())),
    };
    result.map_err(|e| ToolError::Lab(LabError::Serialization(e)))
}

/// Parse and run one request line
#[must_use]
pub fn handle_line(line: &str, store: &Store, solver: &dyn Solver) -> ToolResponse {
    let outcome = serde_json::from_str::<ToolCall>(line)
        .map_err(ToolError::MalformedRequest)
        .and_then(|call| {
            tracing::debug!(tool = %call.tool, "dispatching tool call");
            dispatch(&call, store, solver)
        });
    match outcome {
        Ok(value) => ToolResponse::Ok(value),
        Err(err) => {
            tracing::warn!(error = %err, "tool call failed");
            ToolResponse::Error(ToolFailure::from(&err))
        }
    }
}

/// Counters for one [`serve`] session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServeStats {
    /// Requests answered
    pub handled: usize,
    /// Requests that produced an error response
    pub failed: usize,
}

/// Answer tool calls line by line until `reader` is exhausted
///
/// Blank lines are skipped. A failing call yields an error response and
/// the loop continues.
///
/// # Errors
/// Only I/O failures on `reader` / `writer` end the loop early
pub fn serve<R, W>(reader: R, mut writer: W, store: &Store, solver: &dyn Solver) -> io::Result<ServeStats>
where
    R: BufRead,
    W: Write,
{
    let mut stats = ServeStats::default();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let response = handle_line(&line, store, solver);
        if matches!(response, ToolResponse::Error(_)) {
            stats.failed += 1;
        }
        stats.handled += 1;
        serde_json::to_writer(&mut writer, &response)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
    }
    tracing::info!(handled = stats.handled, failed = stats.failed, "tool loop finished");
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use syslab_core::BudgetSolver;
    use syslab_test_utils::temp_store;

    #[test]
    fn unknown_tool_is_a_client_error() {
        let store = temp_store();
        let response = handle_line(r#"{"tool": "nope"}"#, &store, &BudgetSolver);
        match response {
            ToolResponse::Error(failure) => {
                assert_eq!(failure.message, "unknown tool 'nope'");
                assert!(failure.client_error);
            }
            ToolResponse::Ok(_) => panic!("expected error"),
        }
    }

    #[test]
    fn malformed_line_is_reported() {
        let store = temp_store();
        let response = handle_line("{not json", &store, &BudgetSolver);
        assert!(matches!(response, ToolResponse::Error(f) if f.message.starts_with("malformed request")));
    }

    #[test]
    fn response_wire_shape() {
        let ok = serde_json::to_value(ToolResponse::Ok(json!(1))).unwrap();
        assert_eq!(ok, json!({"ok": 1}));
        let err = serde_json::to_value(ToolResponse::Error(ToolFailure {
            message: "m".into(),
            client_error: true,
        }))
        .unwrap();
        assert_eq!(err, json!({"error": {"message": "m", "clientError": true}}));
    }
}
