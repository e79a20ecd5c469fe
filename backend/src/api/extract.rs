use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::db::users;
use crate::error::AppError;
use crate::models::User;
use crate::state::AppState;

/// Header carrying the id of the authenticated user, set by the auth layer in front of this service.
pub const USER_HEADER: &str = "x-user-id";

/// The acting user, resolved from [`USER_HEADER`].
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::Unauthorized(format!("missing {} header", USER_HEADER)))?;

        let user = users::find_user_by_id(&state.db, user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("unknown user".to_string()))?;

        Ok(Self(user))
    }
}
