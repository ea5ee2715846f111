// src/services/crm_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{db_utils::begin_tenant_tx, error::AppError},
    db::CrmRepository,
    models::{
        auth::ActorContext,
        crm::{Customer, NewCustomer},
    },
};

#[derive(Clone)]
pub struct CrmService {
    repo: CrmRepository,
    pool: PgPool,
    tx_timeout_ms: u64,
}

impl CrmService {
    pub fn new(repo: CrmRepository, pool: PgPool, tx_timeout_ms: u64) -> Self {
        Self {
            repo,
            pool,
            tx_timeout_ms,
        }
    }

    // =========================================================================
    //  CLIENTES
    // =========================================================================

    pub async fn create_customer(
        &self,
        ctx: &ActorContext,
        input: NewCustomer,
    ) -> Result<Customer, AppError> {
        let input = normalize(input);
        if input.full_name.chars().count() < 2 {
            return Err(AppError::invalid("fullName", "too_short").with_param("min", 2));
        }

        let mut tx =
            begin_tenant_tx(&self.pool, ctx.tenant_id, Some(ctx.actor_id), self.tx_timeout_ms)
                .await?;
        let customer = self.repo.create_customer(&mut *tx, ctx.tenant_id, &input).await?;
        tx.commit().await?;

        tracing::info!(tenant_id = %ctx.tenant_id, customer_id = %customer.id, "Cliente criado");
        Ok(customer)
    }

    pub async fn list_customers(&self, ctx: &ActorContext) -> Result<Vec<Customer>, AppError> {
        let mut tx = begin_tenant_tx(&self.pool, ctx.tenant_id, None, self.tx_timeout_ms).await?;
        let customers = self.repo.list_customers(&mut *tx, ctx.tenant_id).await?;
        tx.commit().await?;
        Ok(customers)
    }

    pub async fn get_customer(
        &self,
        ctx: &ActorContext,
        customer_id: Uuid,
    ) -> Result<Customer, AppError> {
        let mut tx = begin_tenant_tx(&self.pool, ctx.tenant_id, None, self.tx_timeout_ms).await?;
        let customer = self
            .repo
            .find_customer(&mut *tx, ctx.tenant_id, customer_id)
            .await?;
        tx.commit().await?;

        customer.ok_or(AppError::not_found("customer", customer_id))
    }
}

// Espaços nas pontas somem; campo opcional vazio vira NULL (não conflita no índice único)
fn normalize(input: NewCustomer) -> NewCustomer {
    fn optional(value: Option<String>) -> Option<String> {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    NewCustomer {
        full_name: input.full_name.trim().to_string(),
        legal_name: optional(input.legal_name),
        document_number: optional(input.document_number),
        city: optional(input.city),
        email: optional(input.email).map(|e| e.to_lowercase()),
        phone: optional(input.phone),
    }
}
