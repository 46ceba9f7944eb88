//! Navigation and application error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use uuid::Uuid;

use crate::models::LeafKind;

/// Errors raised while growing, caching, or rendering navigation trees.
///
/// Nothing here is retried: absence is reported as not-found and every
/// other variant signals a data-consistency fault upstream.
#[derive(Debug, Error)]
pub enum NavError {
    #[error("menu not found: {0}")]
    MenuNotFound(String),

    #[error("unknown menu leaf type: {0}")]
    UnknownLeafType(String),

    #[error("{kind} {id} is referenced by the menu tree but does not exist")]
    DanglingReference { kind: LeafKind, id: Uuid },

    #[error("page {0} is referenced by the menu tree but does not exist")]
    MissingPage(Uuid),

    #[error("type integrity violation: {0}")]
    TypeIntegrity(String),

    #[error("navigation cache has been shut down")]
    ShutDown,

    #[error("template error")]
    Template(#[from] tera::Error),

    #[error("storage error")]
    Storage(#[from] anyhow::Error),
}

impl NavError {
    /// Whether this error means "the thing asked for is absent".
    ///
    /// An unrecognised leaf discriminant counts as absent: nothing of that
    /// type can be looked up.
    pub fn is_not_found(&self) -> bool {
        matches!(self, NavError::MenuNotFound(_) | NavError::UnknownLeafType(_))
    }
}

/// Result type alias using NavError.
pub type NavResult<T> = Result<T, NavError>;

/// HTTP-facing errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("not found")]
    NotFound,

    #[error("navigation error")]
    Navigation(#[source] NavError),
}

impl From<NavError> for AppError {
    fn from(err: NavError) -> Self {
        if err.is_not_found() {
            AppError::NotFound
        } else {
            AppError::Navigation(err)
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Internal(_) | AppError::Navigation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = match &self {
            AppError::Internal(e) => {
                tracing::error!(error = %e, "internal server error");
                "internal server error".to_string()
            }
            AppError::Navigation(e) => {
                tracing::error!(error = %e, "navigation error");
                "internal server error".to_string()
            }
            AppError::NotFound => self.to_string(),
        };

        (status, body).into_response()
    }
}

/// Result type alias using AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn menu_not_found_maps_to_404() {
        let err: AppError = NavError::MenuNotFound("Main".to_string()).into();
        assert!(matches!(err, AppError::NotFound));
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn integrity_faults_map_to_500() {
        let err: AppError = NavError::TypeIntegrity("link with children".to_string()).into();
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn unknown_leaf_type_is_not_found() {
        assert!(NavError::UnknownLeafType("widget".to_string()).is_not_found());
        assert!(!NavError::ShutDown.is_not_found());
    }
}
