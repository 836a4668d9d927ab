use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::error::{Error, Result};

/// Client-side reactive state sent with every Datastar action.
///
/// Only `count` is interpreted; any other signal is kept as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Signals {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Signals {
    /// Parse a request body. An empty body means no signals.
    pub fn from_body(body: &[u8]) -> Result<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body).map_err(Error::InvalidSignals)
    }
}

/// Patch merged into the client's signals after an increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CountPatch {
    pub count: i64,
}
