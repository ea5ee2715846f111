// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::auth::{ActorContext, Claims},
};

/// Valida o Bearer token e publica `Claims` e `ActorContext` nos extensions.
pub async fn auth_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_owned());

    let claims = match token {
        Some(token) => app_state.auth_service.validate_token(&token),
        None => Err(AppError::InvalidToken),
    };

    match claims {
        Ok(claims) => {
            let actor = ActorContext::from(&claims);
            request.extensions_mut().insert(claims);
            request.extensions_mut().insert(actor);
            next.run(request).await
        }
        Err(e) => e
            .to_api_error(&locale, &app_state.i18n_store)
            .into_response(),
    }
}

// Extrator para obter o usuário autenticado diretamente nos handlers
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Claims);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(AuthenticatedUser)
            .ok_or_else(unauthenticated)
    }
}

// Rota montada sem o auth_guard: não deveria acontecer, responde 401 sem tradução
pub(crate) fn unauthenticated() -> ApiError {
    ApiError {
        status: axum::http::StatusCode::UNAUTHORIZED,
        error: "unauthenticated".into(),
        details: None,
    }
}
