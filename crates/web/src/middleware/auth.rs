use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::error::WebError;
use crate::session::Session;
use crate::state::AppState;

/// The signed-in coach, attached to the request by [`require_session`].
#[derive(Debug, Clone)]
pub struct CurrentSession {
    pub token: String,
    pub session: Session,
}

impl CurrentSession {
    pub fn coach_id(&self) -> i32 {
        self.session.coach_id
    }

    pub fn is_admin(&self) -> bool {
        self.session.is_admin
    }

    /// Coaches act on their own athletes; admins may act on anyone's.
    pub fn can_manage(&self, owner_id: i32) -> bool {
        self.is_admin() || self.coach_id() == owner_id
    }
}

pub fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, WebError> {
    let token = bearer_token(&req).ok_or(WebError::Unauthorized)?.to_string();

    let session = match state.sessions.get(&token).await {
        Some(session) => session,
        None => {
            tracing::warn!("Request with unknown session token");
            return Err(WebError::Unauthorized);
        }
    };

    req.extensions_mut().insert(CurrentSession { token, session });
    Ok(next.run(req).await)
}

/// Must run after [`require_session`].
pub async fn require_admin(req: Request, next: Next) -> Result<Response, WebError> {
    let is_admin = req
        .extensions()
        .get::<CurrentSession>()
        .map(CurrentSession::is_admin)
        .ok_or(WebError::Unauthorized)?;

    if !is_admin {
        return Err(WebError::Forbidden("Admin access required".to_string()));
    }

    Ok(next.run(req).await)
}

pub async fn require_writes_enabled(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, WebError> {
    if !state.writes_enabled {
        return Err(WebError::WritesDisabled);
    }

    Ok(next.run(req).await)
}
