// src/middleware/tenancy.rs

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    common::error::ApiError,
    middleware::auth::unauthenticated,
    models::auth::ActorContext,
};

// A loja vem do próprio token (claim tenant_id), nunca de cabeçalho ou corpo.
// Todo handler de cartera recebe o ator por aqui e repassa aos serviços.
#[derive(Debug, Clone, Copy)]
pub struct TenantContext(pub ActorContext);

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ActorContext>()
            .copied()
            .map(TenantContext)
            .ok_or_else(unauthenticated)
    }
}
