use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::common::error::AppError;

// ---
// Helper RLS: A "Chave" para o Banco de Dados
// ---
/// Abre uma transação e define as variáveis RLS e os timeouts locais.
/// Tudo com `is_local = true`, então vale só até o commit/rollback.
pub(crate) async fn begin_tenant_tx(
    pool: &PgPool,
    tenant_id: Uuid,
    actor_id: Option<Uuid>,
    timeout_ms: u64,
) -> Result<Transaction<'static, Postgres>, AppError> {
    // O '?' converte sqlx::Error -> AppError (timeout do pool vira Transient)
    let mut tx = pool.begin().await?;

    sqlx::query("SELECT set_config('app.tenant_id', $1, true)")
        .bind(tenant_id.to_string())
        .execute(&mut *tx)
        .await?;

    if let Some(actor_id) = actor_id {
        sqlx::query("SELECT set_config('app.user_id', $1, true)")
            .bind(actor_id.to_string())
            .execute(&mut *tx)
            .await?;
    }

    // Estouro de tempo aborta a transação inteira (57014 / 55P03 -> Transient)
    let timeout = format!("{}ms", timeout_ms);
    sqlx::query("SELECT set_config('statement_timeout', $1, true), set_config('lock_timeout', $1, true)")
        .bind(timeout)
        .execute(&mut *tx)
        .await?;

    Ok(tx)
}
