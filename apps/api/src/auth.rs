//! Caller identity.
//!
//! Sign-in happens upstream; the authenticating proxy forwards the verified user id in
//! the `x-user-id` header. Handlers that take `AuthenticatedUser` reject requests
//! without it before doing any other work.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::errors::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(AppError::Unauthorized)?;

        Ok(Self {
            user_id: user_id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(header: Option<&str>) -> Result<AuthenticatedUser, AppError> {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(USER_ID_HEADER, value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        AuthenticatedUser::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_header_becomes_user_id() {
        let user = extract(Some(" user-42 ")).await.unwrap();
        assert_eq!(user.user_id, "user-42");
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthorized() {
        assert!(matches!(extract(None).await, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_blank_header_is_unauthorized() {
        assert!(matches!(extract(Some("   ")).await, Err(AppError::Unauthorized)));
    }
}
