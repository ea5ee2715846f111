// src/db/ledger_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::receivables::{
        CustomerDebt, KindTotal, LedgerMovement, MovementDetail, MovementFilter, NewMovement,
        NewReceipt, OrderBalance, PaymentReceipt,
    },
};

#[derive(Clone, Default)]
pub struct LedgerRepository;

impl LedgerRepository {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    //  MOVIMENTOS (append-only)
    // =========================================================================

    pub async fn append_movement<'e, E>(
        &self,
        executor: E,
        movement: &NewMovement,
    ) -> Result<LedgerMovement, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let created = sqlx::query_as::<_, LedgerMovement>(
            r#"
            INSERT INTO ledger_movements (
                tenant_id, customer_id, order_id, adjustment_id, receipt_id,
                amount, kind, note, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING
                id, tenant_id, customer_id, order_id, adjustment_id, receipt_id,
                amount, kind, note, created_by, created_at
            "#,
        )
        .bind(movement.tenant_id)
        .bind(movement.customer_id)
        .bind(movement.order_id)
        .bind(movement.adjustment_id)
        .bind(movement.receipt_id)
        .bind(movement.amount)
        .bind(movement.kind)
        .bind(movement.note.as_deref())
        .bind(movement.created_by)
        .fetch_one(executor)
        .await?;

        Ok(created)
    }

    pub async fn sum_by_customer<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Decimal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let total = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT COALESCE(SUM(amount), 0)
            FROM ledger_movements
            WHERE tenant_id = $1 AND customer_id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(customer_id)
        .fetch_one(executor)
        .await?;

        Ok(total)
    }

    /// Soma por pedido. Pedidos sem movimento não aparecem no resultado (saldo 0).
    pub async fn order_sums<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        order_ids: &[Uuid],
    ) -> Result<Vec<(Uuid, Decimal)>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sums = sqlx::query_as::<_, (Uuid, Decimal)>(
            r#"
            SELECT order_id, SUM(amount)
            FROM ledger_movements
            WHERE tenant_id = $1 AND order_id = ANY($2)
            GROUP BY order_id
            "#,
        )
        .bind(tenant_id)
        .bind(order_ids)
        .fetch_all(executor)
        .await?;

        Ok(sums)
    }

    // Agrupa por cliente e já descarta quem não deve (saldo <= 0)
    pub async fn customer_totals<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
    ) -> Result<Vec<CustomerDebt>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let debts = sqlx::query_as::<_, CustomerDebt>(
            r#"
            SELECT
                c.id AS customer_id,
                c.full_name AS display_name,
                c.legal_name,
                c.document_number AS tax_id,
                c.city,
                SUM(m.amount) AS outstanding
            FROM ledger_movements m
            JOIN customers c ON c.id = m.customer_id AND c.tenant_id = m.tenant_id
            WHERE m.tenant_id = $1
            GROUP BY c.id, c.full_name, c.legal_name, c.document_number, c.city
            HAVING SUM(m.amount) > 0
            "#,
        )
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;

        Ok(debts)
    }

    pub async fn open_orders<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Vec<OrderBalance>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let orders = sqlx::query_as::<_, OrderBalance>(
            r#"
            SELECT
                o.id AS order_id,
                o.customer_id,
                o.display_id,
                SUM(m.amount) AS outstanding
            FROM orders o
            JOIN ledger_movements m ON m.order_id = o.id AND m.tenant_id = o.tenant_id
            WHERE o.tenant_id = $1 AND o.customer_id = $2
            GROUP BY o.id, o.customer_id, o.display_id
            HAVING SUM(m.amount) > 0
            ORDER BY o.display_id ASC
            "#,
        )
        .bind(tenant_id)
        .bind(customer_id)
        .fetch_all(executor)
        .await?;

        Ok(orders)
    }

    pub async fn list_movements<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        customer_id: Uuid,
        filter: &MovementFilter,
    ) -> Result<Vec<MovementDetail>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let movements = sqlx::query_as::<_, MovementDetail>(
            r#"
            SELECT
                m.id, m.tenant_id, m.customer_id, m.order_id, m.adjustment_id, m.receipt_id,
                m.amount, m.kind, m.note, m.created_by, m.created_at,
                o.display_id AS order_display_id,
                r.receipt_number,
                r.payment_method,
                a.observation AS adjustment_observation
            FROM ledger_movements m
            LEFT JOIN orders o ON o.id = m.order_id
            LEFT JOIN payment_receipts r ON r.id = m.receipt_id
            LEFT JOIN adjustments a ON a.id = m.adjustment_id
            WHERE m.tenant_id = $1
              AND m.customer_id = $2
              AND ($3::ledger_movement_kind IS NULL OR m.kind = $3)
              AND ($4::date IS NULL OR m.created_at::date >= $4)
              AND ($5::date IS NULL OR m.created_at::date <= $5)
            ORDER BY m.created_at ASC, m.id ASC
            "#,
        )
        .bind(tenant_id)
        .bind(customer_id)
        .bind(filter.kind)
        .bind(filter.from)
        .bind(filter.to)
        .fetch_all(executor)
        .await?;

        Ok(movements)
    }

    pub async fn kind_totals_since<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<KindTotal>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let totals = sqlx::query_as::<_, KindTotal>(
            r#"
            SELECT kind, SUM(amount) AS total
            FROM ledger_movements
            WHERE tenant_id = $1 AND created_at >= $2
            GROUP BY kind
            "#,
        )
        .bind(tenant_id)
        .bind(since)
        .fetch_all(executor)
        .await?;

        Ok(totals)
    }

    // =========================================================================
    //  RECIBOS DE CAIXA
    // =========================================================================

    /// Numeração sequencial por loja. O advisory lock serializa a numeração dentro da transação.
    pub async fn insert_receipt(
        &self,
        conn: &mut PgConnection,
        receipt: &NewReceipt,
    ) -> Result<PaymentReceipt, AppError> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text, 0))")
            .bind(receipt.tenant_id.to_string())
            .execute(&mut *conn)
            .await?;

        let created = sqlx::query_as::<_, PaymentReceipt>(
            r#"
            INSERT INTO payment_receipts (
                tenant_id, customer_id, order_id, receipt_number,
                amount, payment_method, reference, note, created_by
            )
            VALUES (
                $1, $2, $3,
                (SELECT COALESCE(MAX(receipt_number), 0) + 1 FROM payment_receipts WHERE tenant_id = $1),
                $4, $5, $6, $7, $8
            )
            RETURNING
                id, tenant_id, customer_id, order_id, receipt_number,
                amount, payment_method, reference, note, created_by, created_at
            "#,
        )
        .bind(receipt.tenant_id)
        .bind(receipt.customer_id)
        .bind(receipt.order_id)
        .bind(receipt.amount)
        .bind(receipt.payment_method)
        .bind(receipt.reference.as_deref())
        .bind(receipt.note.as_deref())
        .bind(receipt.created_by)
        .fetch_one(&mut *conn)
        .await?;

        Ok(created)
    }
}
