use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::convert::Infallible;

use crate::state::AppState;

/// Whether the request carries the passcode cookie.
/// Never rejects; handlers decide what an unverified caller gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasscodeSession {
    pub authenticated: bool,
}

impl FromRequestParts<AppState> for PasscodeSession {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(PasscodeSession {
            authenticated: state.cookie.is_present(&parts.headers),
        })
    }
}
