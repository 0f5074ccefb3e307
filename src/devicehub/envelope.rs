//! Response envelopes.
//!
//! Success: `{"success": true, "data": {...}}`.
//! Failure: `{"success": false, "error": {"code", "message"}, "data": {...defaults}}`.
//! Both carry `data` so callers can read e.g. `data.count` without branching.

use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{Error, Result};

/// Machine-readable reason code of a failure envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    RetrievalFailed,
    CreationFailed,
    UpdateFailed,
    DeletionFailed,
    ReadFailed,
}

impl FailureReason {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureReason::RetrievalFailed => "retrieval_failed",
            FailureReason::CreationFailed => "creation_failed",
            FailureReason::UpdateFailed => "update_failed",
            FailureReason::DeletionFailed => "deletion_failed",
            FailureReason::ReadFailed => "read_failed",
        }
    }
}

/// Outcome of one operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Success(Value),
    Failure {
        reason: FailureReason,
        message: String,
        defaults: Value,
    },
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: FailureReason,
    message: &'a str,
}

#[derive(Serialize)]
struct Wire<'a> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorBody<'a>>,
    data: &'a Value,
}

impl Envelope {
    pub fn success(data: Value) -> Self {
        Envelope::Success(data)
    }

    pub fn failure(reason: FailureReason, message: impl Into<String>, defaults: Value) -> Self {
        Envelope::Failure {
            reason,
            message: message.into(),
            defaults,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Envelope::Success(_))
    }

    /// Result payload, or the defaults of a failure.
    pub fn data(&self) -> &Value {
        match self {
            Envelope::Success(data) => data,
            Envelope::Failure { defaults, .. } => defaults,
        }
    }

    pub fn reason(&self) -> Option<FailureReason> {
        match self {
            Envelope::Success(_) => None,
            Envelope::Failure { reason, .. } => Some(*reason),
        }
    }

    pub fn to_value(&self) -> Value {
        // Serializing a tree of `Value`s cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl Serialize for Envelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let wire = match self {
            Envelope::Success(data) => Wire {
                success: true,
                error: None,
                data,
            },
            Envelope::Failure {
                reason,
                message,
                defaults,
            } => Wire {
                success: false,
                error: Some(ErrorBody {
                    code: *reason,
                    message,
                }),
                data: defaults,
            },
        };
        wire.serialize(serializer)
    }
}

/// Operation boundary: wrap a result, re-raise deliberate errors, fold the rest.
pub(crate) fn conclude<T: Serialize>(
    operation: &str,
    outcome: Result<T>,
    reason: FailureReason,
    defaults: Value,
) -> Result<Envelope> {
    match outcome.and_then(|result| serde_json::to_value(result).map_err(Error::from)) {
        Ok(data) => Ok(Envelope::success(data)),
        Err(err @ Error::Internal(_)) => {
            tracing::error!(error = %err, "Error {}", operation);
            Err(err)
        }
        Err(err) if err.is_deliberate() => Err(err),
        Err(err) => {
            tracing::error!(error = %err, "Error {}", operation);
            Ok(Envelope::failure(reason, err.to_string(), defaults))
        }
    }
}
