//! Error types shared by the document stores and the admin API.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Errors surfaced by document mutations and backup lookups.
///
/// Every variant is checked before the live slot is touched, so a failed
/// call never leaves a document or its backup history half-written.
#[derive(Debug, thiserror::Error)]
pub enum LanderError {
    /// Submitted content is not valid JSON.
    #[error("invalid JSON payload: {0}")]
    InvalidPayload(#[source] serde_json::Error),

    /// A stored backup no longer parses as JSON.
    #[error("backup {name} is not valid JSON")]
    CorruptBackup {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// Backup name is unknown, outside the backup directory or carries the
    /// wrong prefix. These cases are deliberately indistinguishable.
    #[error("backup not found")]
    NotFound,

    /// A required request field was absent or empty.
    #[error("missing {0}")]
    MissingParameter(&'static str),

    /// The bundled content template could not be installed on first start.
    #[error("failed to bootstrap content from {path}: {source}")]
    Bootstrap {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A detached mutation task panicked or was aborted.
    #[error("mutation task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for LanderError {
    fn into_response(self) -> Response {
        match self {
            LanderError::InvalidPayload(_) => {
                (StatusCode::BAD_REQUEST, "Invalid JSON payload").into_response()
            }
            LanderError::MissingParameter(what) => {
                (StatusCode::BAD_REQUEST, format!("Missing {}", what)).into_response()
            }
            LanderError::NotFound => (StatusCode::NOT_FOUND, "Backup not found").into_response(),
            LanderError::CorruptBackup { name, .. } => {
                tracing::error!(backup = %name, "Selected backup is invalid JSON");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Selected backup is invalid JSON",
                )
                    .into_response()
            }
            other => {
                tracing::error!(error = %other, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let bad_json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(
            LanderError::InvalidPayload(bad_json).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            LanderError::MissingParameter("backup name").into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(LanderError::NotFound.into_response().status(), StatusCode::NOT_FOUND);

        let corrupt = serde_json::from_str::<serde_json::Value>("nope").unwrap_err();
        let err = LanderError::CorruptBackup {
            name: "content.json.old.20240101-000000".into(),
            source: corrupt,
        };
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
