// src/models/crm.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- CLIENTE ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,

    #[schema(example = "Ferretería El Martillo")]
    pub full_name: String,
    #[schema(example = "Ferretería El Martillo S.A.S.")]
    pub legal_name: Option<String>,
    // NIT / CNPJ / documento fiscal
    #[schema(example = "900123456-7")]
    pub document_number: Option<String>,
    #[schema(example = "Medellín")]
    pub city: Option<String>,

    pub email: Option<String>,
    pub phone: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Dados do cliente para inserção (já validados no handler)
#[derive(Debug, Clone, Default)]
pub struct NewCustomer {
    pub full_name: String,
    pub legal_name: Option<String>,
    pub document_number: Option<String>,
    pub city: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}
