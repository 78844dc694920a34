//! Who is calling. Authentication itself happens upstream; this layer only
//! reads the identity it hands over.

use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::errors::AppError;
use crate::state::AppState;

pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    /// Holder of the admin bearer token. May also name a user of its own.
    Admin { user_id: Option<String> },
    User(String),
}

impl Actor {
    pub fn from_headers(headers: &HeaderMap, admin_token: &str) -> Result<Self, AppError> {
        let user_id = headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        let bearer = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));

        match bearer {
            Some(token) if !admin_token.is_empty() && token == admin_token => {
                Ok(Actor::Admin { user_id })
            }
            Some(_) => Err(AppError::Unauthorized),
            None => user_id.map(Actor::User).ok_or(AppError::Unauthorized),
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Actor::Admin { .. })
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            Actor::Admin { user_id } => user_id.as_deref(),
            Actor::User(id) => Some(id),
        }
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    /// Admins reach everything; anyone else only their own records.
    pub fn require_access(&self, owner_id: &str) -> Result<(), AppError> {
        match self {
            Actor::Admin { .. } => Ok(()),
            Actor::User(id) if id == owner_id => Ok(()),
            Actor::User(_) => Err(AppError::Forbidden),
        }
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Actor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Actor::from_headers(&parts.headers, &state.config.admin_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_admin_token() {
        let actor = Actor::from_headers(&headers(&[("authorization", "Bearer secret")]), "secret")
            .unwrap();
        assert_eq!(actor, Actor::Admin { user_id: None });
        assert!(actor.require_access("anyone").is_ok());
    }

    #[test]
    fn test_wrong_token_is_rejected_even_with_user_header() {
        let result = Actor::from_headers(
            &headers(&[("authorization", "Bearer nope"), ("x-user-id", "u-1")]),
            "secret",
        );
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_user_header() {
        let actor = Actor::from_headers(&headers(&[("x-user-id", "u-1")]), "secret").unwrap();
        assert_eq!(actor.user_id(), Some("u-1"));
        assert!(actor.require_access("u-1").is_ok());
        assert!(matches!(actor.require_access("u-2"), Err(AppError::Forbidden)));
        assert!(matches!(actor.require_admin(), Err(AppError::Forbidden)));
    }

    #[test]
    fn test_anonymous_is_unauthorized() {
        assert!(matches!(
            Actor::from_headers(&HeaderMap::new(), "secret"),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn test_empty_admin_token_never_matches() {
        let result = Actor::from_headers(&headers(&[("authorization", "Bearer ")]), "");
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }
}
