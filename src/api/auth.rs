use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use super::handlers::{ApiError, AppState};

/// Reject requests without `Authorization: Bearer <token>` matching the
/// configured token
pub async fn require_bearer(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?
        .to_str()
        .map_err(|_| ApiError::Unauthorized("Invalid Authorization header format".to_string()))?;

    let token = match header_value.split_once(' ') {
        Some(("Bearer", token)) if !token.is_empty() && !token.contains(' ') => token,
        _ => {
            return Err(ApiError::Unauthorized(
                "Invalid Authorization header format".to_string(),
            ))
        }
    };

    if !tokens_match(token.as_bytes(), state.auth_token.as_bytes()) {
        return Err(ApiError::Unauthorized("Invalid token".to_string()));
    }

    Ok(next.run(request).await)
}

fn tokens_match(given: &[u8], expected: &[u8]) -> bool {
    bool::from(given.ct_eq(expected))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_match() {
        assert!(tokens_match(b"s3cret", b"s3cret"));
        assert!(!tokens_match(b"s3cret", b"s3creT"));
        assert!(!tokens_match(b"s3cret", b"s3cret-longer"));
        assert!(!tokens_match(b"", b"s3cret"));
    }
}
