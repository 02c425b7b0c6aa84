// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlannerError {
    /// The backend could not be reached (or is not configured at all).
    #[error("Remote store unavailable: {0}")]
    RemoteUnavailable(String),

    /// The backend refused the change (validation, constraint, permission).
    #[error("Mutation rejected: {0}")]
    MutationRejected(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, PlannerError>;

impl From<sqlx::Error> for PlannerError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => PlannerError::NotFound("row not found".to_string()),
            sqlx::Error::Database(db) => PlannerError::MutationRejected(db.message().to_string()),
            decode @ (sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::Decode(_)
            | sqlx::Error::TypeNotFound { .. }) => {
                PlannerError::MutationRejected(decode.to_string())
            }
            other => PlannerError::RemoteUnavailable(other.to_string()),
        }
    }
}
