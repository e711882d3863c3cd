use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::passcode::Verification;
use crate::error::{AppError, AppResult};
use crate::extractors::PasscodeSession;
use crate::state::AppState;

// -- Request / response types --

#[derive(Deserialize)]
pub struct VerifyRequest {
    pub passcode: String,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct VerifyResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct CheckResponse {
    pub authenticated: bool,
    pub app_name: String,
}

// -- Handlers --

/// POST /auth/verify: compare the passcode and set the session cookie on match
pub async fn verify(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> AppResult<Response> {
    match state.verifier.verify(&req.passcode) {
        Ok(Verification::Accepted) => {
            tracing::info!("Passcode accepted");
            Ok((
                StatusCode::OK,
                [(header::SET_COOKIE, state.cookie.issue())],
                Json(VerifyResponse {
                    success: true,
                    error: None,
                }),
            )
                .into_response())
        }
        Ok(Verification::Rejected { error }) => {
            tracing::debug!("Passcode rejected");
            Ok(Json(VerifyResponse {
                success: false,
                error: Some(error),
            })
            .into_response())
        }
        Err(AppError::Configuration(msg)) => {
            tracing::error!("{}", msg);
            Ok(Json(VerifyResponse {
                success: false,
                error: Some("Server configuration error".to_string()),
            })
            .into_response())
        }
        Err(e) => Err(e),
    }
}

/// POST /auth/logout: unconditionally clear the session cookie
pub async fn logout(State(state): State<AppState>) -> Response {
    (
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, state.cookie.clear())],
    )
        .into_response()
}

/// GET /auth/check: cookie presence plus the display name for the gate screen
pub async fn check(State(state): State<AppState>, session: PasscodeSession) -> Json<CheckResponse> {
    Json(CheckResponse {
        authenticated: session.authenticated,
        app_name: state.config.display.app_name.clone(),
    })
}
