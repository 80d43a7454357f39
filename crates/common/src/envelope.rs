//! Fixed response envelope shared by every endpoint.
//!
//! Success or failure, a response body is always
//! `{status, error_code, message, data}`; permission denials additionally
//! carry the denied `method`. Clients key off `error_code`, so the numeric
//! assignment is a compatibility contract:
//!
//! | code | meaning                                   |
//! |------|-------------------------------------------|
//! | 0    | success                                   |
//! | 100  | validation failure / entity not found     |
//! | 101  | unexpected internal error                 |
//! | 102  | missing or unparsable required parameter  |
//! | 103  | invalid enum value or missing bool flag   |
//! | 403  | permission denied                         |
//! | 429  | request throttled                         |

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const CODE_SUCCESS: u16 = 0;
pub const CODE_VALIDATION: u16 = 100;
pub const CODE_INTERNAL: u16 = 101;
pub const CODE_MISSING_PARAM: u16 = 102;
pub const CODE_INVALID_VALUE: u16 = 103;
pub const CODE_FORBIDDEN: u16 = 403;
pub const CODE_THROTTLED: u16 = 429;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub status: String,
    pub error_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    pub message: String,
    pub data: Value,
}

impl Envelope {
    pub fn success(message: impl Into<String>, data: Value) -> Self {
        Self {
            status: "success".into(),
            error_code: CODE_SUCCESS,
            method: None,
            message: message.into(),
            data,
        }
    }

    /// Error envelope; `data` is the empty string, matching the wire contract.
    pub fn error(error_code: u16, message: impl Into<String>) -> Self {
        Self {
            status: "error".into(),
            error_code,
            method: None,
            message: message.into(),
            data: Value::String(String::new()),
        }
    }

    /// The fixed permission-denial body. Same shape for every denied
    /// operation; only the method varies.
    pub fn forbidden(method: impl Into<String>) -> Self {
        let mut e = Self::error(
            CODE_FORBIDDEN,
            "You do not have permission to perform this action.",
        );
        e.method = Some(method.into());
        e
    }
}
