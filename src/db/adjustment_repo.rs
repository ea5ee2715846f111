// src/db/adjustment_repo.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, FromRow, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::receivables::{AdjustmentLine, AdjustmentRecord, NewAdjustment},
};

// Cabeçalho da tabela `adjustments`; as linhas vêm de `adjustment_lines`
#[derive(Debug, FromRow)]
struct AdjustmentHeader {
    id: Uuid,
    tenant_id: Uuid,
    customer_id: Uuid,
    observation: String,
    is_reversal: bool,
    reversal_of_id: Option<Uuid>,
    total_applied: Decimal,
    created_by: Uuid,
    created_at: DateTime<Utc>,
}

impl AdjustmentHeader {
    fn with_lines(self, lines: Vec<AdjustmentLine>) -> AdjustmentRecord {
        AdjustmentRecord {
            id: self.id,
            tenant_id: self.tenant_id,
            customer_id: self.customer_id,
            observation: self.observation,
            is_reversal: self.is_reversal,
            reversal_of_id: self.reversal_of_id,
            created_by: self.created_by,
            created_at: self.created_at,
            lines,
            total_applied: self.total_applied,
        }
    }
}

#[derive(Debug, FromRow)]
struct StoredLine {
    adjustment_id: Uuid,
    order_id: Uuid,
    amount_applied: Decimal,
}

const HEADER_COLUMNS: &str = "id, tenant_id, customer_id, observation, is_reversal, reversal_of_id, \
                              total_applied, created_by, created_at";

#[derive(Clone, Default)]
pub struct AdjustmentRepository;

impl AdjustmentRepository {
    pub fn new() -> Self {
        Self
    }

    /// Grava cabeçalho + linhas. Deve rodar dentro da mesma transação dos movimentos.
    pub async fn insert_adjustment(
        &self,
        conn: &mut PgConnection,
        adjustment: &NewAdjustment,
    ) -> Result<AdjustmentRecord, AppError> {
        let sql = format!(
            r#"
            INSERT INTO adjustments (
                id, tenant_id, customer_id, observation,
                is_reversal, reversal_of_id, total_applied, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            HEADER_COLUMNS
        );

        let header = sqlx::query_as::<_, AdjustmentHeader>(&sql)
            .bind(adjustment.id)
            .bind(adjustment.tenant_id)
            .bind(adjustment.customer_id)
            .bind(&adjustment.observation)
            .bind(adjustment.is_reversal)
            .bind(adjustment.reversal_of_id)
            .bind(adjustment.total_applied())
            .bind(adjustment.created_by)
            .fetch_one(&mut *conn)
            .await?;

        // Inserção em massa usando UNNEST
        let positions: Vec<i32> = (0..adjustment.lines.len() as i32).collect();
        let order_ids: Vec<Uuid> = adjustment.lines.iter().map(|l| l.order_id).collect();
        let amounts: Vec<Decimal> = adjustment.lines.iter().map(|l| l.amount_applied).collect();

        sqlx::query(
            r#"
            INSERT INTO adjustment_lines (adjustment_id, position, tenant_id, order_id, amount_applied)
            SELECT $1, t.position, $2, t.order_id, t.amount_applied
            FROM UNNEST($3::int4[], $4::uuid[], $5::numeric[]) AS t(position, order_id, amount_applied)
            "#,
        )
        .bind(adjustment.id)
        .bind(adjustment.tenant_id)
        .bind(&positions)
        .bind(&order_ids)
        .bind(&amounts)
        .execute(&mut *conn)
        .await?;

        Ok(header.with_lines(adjustment.lines.clone()))
    }

    /// Busca um ajuste; com `for_update` a linha fica travada até o fim da transação.
    pub async fn find_adjustment(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        adjustment_id: Uuid,
        for_update: bool,
    ) -> Result<Option<AdjustmentRecord>, AppError> {
        let sql = format!(
            "SELECT {} FROM adjustments WHERE tenant_id = $1 AND id = $2 {}",
            HEADER_COLUMNS,
            if for_update { "FOR UPDATE" } else { "" }
        );

        let header = sqlx::query_as::<_, AdjustmentHeader>(&sql)
            .bind(tenant_id)
            .bind(adjustment_id)
            .fetch_optional(&mut *conn)
            .await?;

        let Some(header) = header else {
            return Ok(None);
        };

        let lines = sqlx::query_as::<_, AdjustmentLine>(
            r#"
            SELECT order_id, amount_applied
            FROM adjustment_lines
            WHERE tenant_id = $1 AND adjustment_id = $2
            ORDER BY position ASC
            "#,
        )
        .bind(tenant_id)
        .bind(adjustment_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(Some(header.with_lines(lines)))
    }

    pub async fn find_reversal_of<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        original_id: Uuid,
    ) -> Result<Option<Uuid>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let reversal = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM adjustments WHERE tenant_id = $1 AND reversal_of_id = $2",
        )
        .bind(tenant_id)
        .bind(original_id)
        .fetch_optional(executor)
        .await?;

        Ok(reversal)
    }

    // Mais recentes primeiro
    pub async fn list_by_customer(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Vec<AdjustmentRecord>, AppError> {
        let sql = format!(
            "SELECT {} FROM adjustments WHERE tenant_id = $1 AND customer_id = $2 \
             ORDER BY created_at DESC, id ASC",
            HEADER_COLUMNS
        );

        let headers = sqlx::query_as::<_, AdjustmentHeader>(&sql)
            .bind(tenant_id)
            .bind(customer_id)
            .fetch_all(&mut *conn)
            .await?;

        let ids: Vec<Uuid> = headers.iter().map(|h| h.id).collect();
        let stored = sqlx::query_as::<_, StoredLine>(
            r#"
            SELECT adjustment_id, order_id, amount_applied
            FROM adjustment_lines
            WHERE tenant_id = $1 AND adjustment_id = ANY($2)
            ORDER BY adjustment_id, position ASC
            "#,
        )
        .bind(tenant_id)
        .bind(&ids)
        .fetch_all(&mut *conn)
        .await?;

        let mut lines_by_adjustment: HashMap<Uuid, Vec<AdjustmentLine>> = HashMap::new();
        for line in stored {
            lines_by_adjustment
                .entry(line.adjustment_id)
                .or_default()
                .push(AdjustmentLine {
                    order_id: line.order_id,
                    amount_applied: line.amount_applied,
                });
        }

        Ok(headers
            .into_iter()
            .map(|h| {
                let lines = lines_by_adjustment.remove(&h.id).unwrap_or_default();
                h.with_lines(lines)
            })
            .collect())
    }
}
