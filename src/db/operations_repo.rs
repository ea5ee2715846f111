// src/db/operations_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::operations::Order};

const ORDER_COLUMNS: &str =
    "id, tenant_id, customer_id, display_id, total_amount, notes, created_by, created_at";

pub const FIRST_DISPLAY_ID: i32 = 1001;

#[derive(Clone, Default)]
pub struct OperationsRepository;

impl OperationsRepository {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    //  ORDERS
    // =========================================================================

    /// Numeração sequencial por loja (a partir de 1001), serializada por advisory lock.
    pub async fn create_order(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        customer_id: Uuid,
        total_amount: Decimal,
        notes: Option<&str>,
        created_by: Uuid,
    ) -> Result<Order, AppError> {
        // Semente 1: não disputa a trava da numeração de recibos
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text, 1))")
            .bind(tenant_id.to_string())
            .execute(&mut *conn)
            .await?;

        // O cliente precisa ser da mesma loja; o SELECT devolve zero linhas caso contrário
        let sql = format!(
            r#"
            INSERT INTO orders (tenant_id, customer_id, display_id, total_amount, notes, created_by)
            SELECT
                $1, c.id,
                (SELECT COALESCE(MAX(display_id), {}) + 1 FROM orders WHERE tenant_id = $1),
                $3, $4, $5
            FROM customers c
            WHERE c.id = $2 AND c.tenant_id = $1
            RETURNING {}
            "#,
            FIRST_DISPLAY_ID - 1,
            ORDER_COLUMNS
        );

        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(tenant_id)
            .bind(customer_id)
            .bind(total_amount)
            .bind(notes)
            .bind(created_by)
            .fetch_optional(&mut *conn)
            .await?;

        order.ok_or(AppError::not_found("customer", customer_id))
    }

    pub async fn find_order<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        order_id: Uuid,
    ) -> Result<Option<Order>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {} FROM orders WHERE tenant_id = $1 AND id = $2",
            ORDER_COLUMNS
        );

        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(tenant_id)
            .bind(order_id)
            .fetch_optional(executor)
            .await?;

        Ok(order)
    }

    /// Trava os pedidos (FOR UPDATE) em ordem de id para evitar deadlock entre ajustes concorrentes.
    pub async fn lock_orders<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        order_ids: &[Uuid],
    ) -> Result<Vec<Order>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {} FROM orders WHERE tenant_id = $1 AND id = ANY($2) ORDER BY id FOR UPDATE",
            ORDER_COLUMNS
        );

        let orders = sqlx::query_as::<_, Order>(&sql)
            .bind(tenant_id)
            .bind(order_ids)
            .fetch_all(executor)
            .await?;

        Ok(orders)
    }
}
