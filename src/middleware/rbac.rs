// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::unauthenticated, i18n::Locale},
    models::auth::ActorContext,
};

/// 1. O Trait que define o que é uma Permissão
pub trait PermissionDef: Send + Sync + 'static {
    fn slug() -> &'static str;
}

/// 2. O Extractor (Guardião)
pub struct RequirePermission<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let actor = parts
            .extensions
            .get::<ActorContext>()
            .copied()
            .ok_or_else(unauthenticated)?;

        // O papel vem no token; a tabela de permissões é estática
        let required_perm = T::slug();
        if actor.role.has_permission(required_perm) {
            return Ok(RequirePermission(PhantomData));
        }

        tracing::warn!(
            tenant_id = %actor.tenant_id,
            actor_id = %actor.actor_id,
            role = ?actor.role,
            permission = required_perm,
            "Acesso negado"
        );

        let app_state = AppState::from_ref(state);
        let Ok(locale) = Locale::from_request_parts(parts, state).await;
        Err(AppError::Forbidden(required_perm).to_api_error(&locale, &app_state.i18n_store))
    }
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---

pub struct PermReceivablesRead;
impl PermissionDef for PermReceivablesRead {
    fn slug() -> &'static str { "receivables:read" }
}

pub struct PermReceivablesWrite;
impl PermissionDef for PermReceivablesWrite {
    fn slug() -> &'static str { "receivables:write" }
}

pub struct PermAdjustmentsWrite;
impl PermissionDef for PermAdjustmentsWrite {
    fn slug() -> &'static str { "adjustments:write" }
}

pub struct PermCrmRead;
impl PermissionDef for PermCrmRead {
    fn slug() -> &'static str { "crm:read" }
}

pub struct PermCrmWrite;
impl PermissionDef for PermCrmWrite {
    fn slug() -> &'static str { "crm:write" }
}

pub struct PermOrdersWrite;
impl PermissionDef for PermOrdersWrite {
    fn slug() -> &'static str { "orders:write" }
}

pub struct PermDashboardRead;
impl PermissionDef for PermDashboardRead {
    fn slug() -> &'static str { "dashboard:read" }
}
