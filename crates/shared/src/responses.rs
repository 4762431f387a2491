//! Results returned by the privileged executor.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use itempiles_domain::{AttributeAmounts, DocumentUuid, TransferRecord};

// =============================================================================
// Handler Results
// =============================================================================

/// Successful result of a privileged call, shaped per handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PileResponse {
    /// A pile token was spawned
    Created { uuid: DocumentUuid },
    /// Documents turned into or reverted from piles
    Converted { uuids: Vec<DocumentUuid> },
    /// Keys of the pile flag that actually changed
    Updated { diff: Map<String, Value> },
    Deleted,
    Refreshed { changed: bool },
    Items { records: Vec<TransferRecord> },
    Attributes { records: AttributeAmounts },
    Everything {
        items: Vec<TransferRecord>,
        attributes: AttributeAmounts,
    },
    Dropped {
        target: DocumentUuid,
        records: Vec<TransferRecord>,
    },
}

// =============================================================================
// Response Result
// =============================================================================

/// Result of a privileged call as it travels back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResponseResult {
    Success { data: PileResponse },
    Error {
        /// Error classification code
        code: ErrorCode,
        /// Human-readable error message
        message: String,
    },
}

impl ResponseResult {
    pub fn success(data: PileResponse) -> Self {
        ResponseResult::Success { data }
    }

    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        ResponseResult::Error {
            code,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ResponseResult::Success { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ResponseResult::Error { .. })
    }
}

// =============================================================================
// Error Codes
// =============================================================================

/// Error classification codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Request was malformed
    BadRequest,
    /// A referenced document or actor does not exist
    NotFound,
    /// The target is not a valid pile
    NotAPile,
    /// A configured macro could not be run (mutation already persisted)
    MacroFailed,
    /// The document store rejected a read or write
    InternalError,
    /// No privileged executor is reachable
    ServiceUnavailable,

    /// Unknown variant for forward compatibility
    #[serde(other)]
    Unknown,
}
