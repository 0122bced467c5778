//! Authentication middleware for the admin API

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use storehub_core::extract_bearer;

use crate::{AppState, ServerError};

/// Require a bearer credential carrying the admin role
///
/// The validated [`Claims`](storehub_core::Claims) are attached to the request
/// extensions so handlers can record which operator acted.
pub async fn admin_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let token = extract_bearer(header)
        .inspect_err(|e| tracing::debug!("Admin request without usable credential: {}", e))?
        .to_string();

    let claims = state
        .verifier
        .validate(&token)
        .await
        .inspect_err(|e| tracing::debug!("Admin token validation failed: {}", e))?;

    if !claims.is_admin() {
        tracing::debug!(user_id = %claims.user_id, "Admin role required");
        return Err(ServerError::Forbidden("admin role required".to_string()));
    }

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}
