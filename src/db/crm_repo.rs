// src/db/crm_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::crm::{Customer, NewCustomer},
};

const CUSTOMER_COLUMNS: &str = "id, tenant_id, full_name, legal_name, document_number, city, \
                                email, phone, created_at, updated_at";

#[derive(Clone, Default)]
pub struct CrmRepository;

impl CrmRepository {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    //  CLIENTES
    // =========================================================================

    pub async fn create_customer<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        input: &NewCustomer,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO customers (
                tenant_id, full_name, legal_name, document_number, city, email, phone
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            CUSTOMER_COLUMNS
        );

        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(tenant_id)
            .bind(&input.full_name)
            .bind(input.legal_name.as_deref())
            .bind(input.document_number.as_deref())
            .bind(input.city.as_deref())
            .bind(input.email.as_deref())
            .bind(input.phone.as_deref())
            .fetch_one(executor)
            .await
            .map_err(|e| {
                // Documento repetido na mesma loja
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() {
                        return AppError::invalid("documentNumber", "duplicate_document")
                            .with_param("document", input.document_number.as_deref().unwrap_or("?"));
                    }
                }
                e.into()
            })?;

        Ok(customer)
    }

    pub async fn list_customers<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
    ) -> Result<Vec<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {} FROM customers WHERE tenant_id = $1 ORDER BY full_name ASC, id ASC",
            CUSTOMER_COLUMNS
        );

        let customers = sqlx::query_as::<_, Customer>(&sql)
            .bind(tenant_id)
            .fetch_all(executor)
            .await?;

        Ok(customers)
    }

    pub async fn find_customer<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {} FROM customers WHERE tenant_id = $1 AND id = $2",
            CUSTOMER_COLUMNS
        );

        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(tenant_id)
            .bind(customer_id)
            .fetch_optional(executor)
            .await?;

        Ok(customer)
    }
}
