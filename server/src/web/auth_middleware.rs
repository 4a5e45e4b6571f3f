use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;

use super::app_state::AppState;

/// Extractor that checks the shared-secret bearer token the platform
/// attaches to its pushes. Use this in every handler the platform calls.
pub struct GatewayAuth;

impl FromRequestParts<Arc<AppState>> for GatewayAuth {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    (StatusCode::UNAUTHORIZED, "Missing gateway token").into_response()
                })?;

        if bearer.token() != state.gateway_secret {
            return Err((StatusCode::UNAUTHORIZED, "Invalid gateway token").into_response());
        }

        Ok(GatewayAuth)
    }
}
