//! JSON-lines framing used by the command-line host.
//!
//! One request object per input line, one reply object per output line. The
//! optional `id` is echoed back untouched so callers can pair out-of-order
//! replies with their requests.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{MethodCall, MethodResult};

#[derive(Debug, Clone, Deserialize)]
pub struct RequestEnvelope {
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl RequestEnvelope {
    pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }

    pub fn into_call(self) -> (Option<Value>, MethodCall) {
        (
            self.id,
            MethodCall {
                method: self.method,
                arguments: self.arguments,
            },
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplyEnvelope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(flatten)]
    pub result: MethodResult,
}

impl ReplyEnvelope {
    /// Reply to a line that did not parse as a request. The `id` is echoed
    /// when the line is at least a JSON object carrying one.
    pub fn malformed(line: &str, err: &serde_json::Error) -> Self {
        let id = serde_json::from_str::<Map<String, Value>>(line)
            .ok()
            .and_then(|mut object| object.remove("id"))
            .filter(|id| !id.is_null());

        Self {
            id,
            result: MethodResult::Error {
                code: "BAD_REQUEST".to_string(),
                message: format!("malformed request: {err}"),
                details: None,
            },
        }
    }

    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
