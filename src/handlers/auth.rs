// src/handlers/auth.rs

use axum::Json;

use crate::{
    middleware::auth::AuthenticatedUser,
    models::auth::{ActorContext, MeResponse},
};

// GET /api/users/me
#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "Usuários",
    responses(
        (status = 200, description = "Ator resolvido a partir do token", body = MeResponse),
        (status = 401, description = "Token ausente ou inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_me(AuthenticatedUser(claims): AuthenticatedUser) -> Json<MeResponse> {
    Json(MeResponse {
        actor: ActorContext::from(&claims),
        permissions: claims
            .role
            .permissions()
            .iter()
            .map(|p| p.to_string())
            .collect(),
        email: claims.email,
    })
}
