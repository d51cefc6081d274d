use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};

use crate::error::AppError;

/// The `:id` segment of a question route. An id that does not parse as an
/// `i64` cannot name a stored question, so it is rejected as not found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionId(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for QuestionId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i64>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                tracing::debug!("unroutable question id: {rejection}");
                AppError::NotFound
            })?;
        Ok(Self(id))
    }
}
