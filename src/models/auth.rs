// src/models/auth.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

// Papel do usuário na loja, resolvido pelo provedor de identidade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberRole {
    Owner,
    Admin,
    Accountant,
    Seller,
    Viewer,
}

impl MemberRole {
    /// Slugs de permissão concedidos a cada papel.
    pub fn permissions(self) -> &'static [&'static str] {
        match self {
            MemberRole::Owner | MemberRole::Admin => &[
                "receivables:read",
                "receivables:write",
                "adjustments:write",
                "crm:read",
                "crm:write",
                "orders:write",
                "dashboard:read",
            ],
            MemberRole::Accountant => &[
                "receivables:read",
                "receivables:write",
                "adjustments:write",
                "crm:read",
                "dashboard:read",
            ],
            MemberRole::Seller => &[
                "receivables:read",
                "receivables:write",
                "crm:read",
                "crm:write",
                "orders:write",
            ],
            MemberRole::Viewer => &["receivables:read", "crm:read", "dashboard:read"],
        }
    }

    pub fn has_permission(self, slug: &str) -> bool {
        self.permissions().contains(&slug)
    }
}

// Estrutura de dados ("claims") dentro do JWT emitido pelo provedor externo
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,       // Subject (ID do usuário)
    pub tenant_id: Uuid, // Loja ativa na sessão
    pub role: MemberRole,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: usize,
    pub iat: usize,
}

/// Quem está agindo, em qual loja e com qual papel.
/// Passado explicitamente para toda operação de cartera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActorContext {
    pub tenant_id: Uuid,
    pub actor_id: Uuid,
    pub role: MemberRole,
}

impl From<&Claims> for ActorContext {
    fn from(claims: &Claims) -> Self {
        Self {
            tenant_id: claims.tenant_id,
            actor_id: claims.sub,
            role: claims.role,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    #[serde(flatten)]
    pub actor: ActorContext,
    pub email: Option<String>,
    pub permissions: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_finance_roles_can_write_adjustments() {
        assert!(MemberRole::Owner.has_permission("adjustments:write"));
        assert!(MemberRole::Admin.has_permission("adjustments:write"));
        assert!(MemberRole::Accountant.has_permission("adjustments:write"));
        assert!(!MemberRole::Seller.has_permission("adjustments:write"));
        assert!(!MemberRole::Viewer.has_permission("adjustments:write"));
    }

    #[test]
    fn role_claim_uses_screaming_snake_case() {
        let role: MemberRole = serde_json::from_str("\"ACCOUNTANT\"").unwrap();
        assert_eq!(role, MemberRole::Accountant);
    }
}
