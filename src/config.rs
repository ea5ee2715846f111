// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{CrmRepository, OperationsRepository, PgReceivablesStore, ReceivablesStore},
    services::{
        adjustment_service::AdjustmentService, auth::AuthService, crm_service::CrmService,
        dashboard_service::DashboardService, operation_service::OperationsService,
        receivables_service::ReceivablesService,
    },
};

/// Como validar os tokens do provedor de identidade.
#[derive(Debug, Clone)]
pub enum JwtKey {
    Secret(String),       // HS256
    PublicKeyPem(String), // RS256
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub key: JwtKey,
    pub issuer: Option<String>,
    pub audience: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub tx_timeout_ms: u64,
    pub jwt: JwtConfig,
    pub default_locale: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;

        let key = match (env::var("JWT_PUBLIC_KEY_PEM").ok(), env::var("JWT_SECRET").ok()) {
            (Some(pem), _) => JwtKey::PublicKeyPem(pem),
            (None, Some(secret)) => JwtKey::Secret(secret),
            (None, None) => anyhow::bail!("JWT_SECRET ou JWT_PUBLIC_KEY_PEM deve ser definido"),
        };

        Ok(Self {
            database_url,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", 5)?,
            db_acquire_timeout_secs: parse_or("DB_ACQUIRE_TIMEOUT_SECS", 3)?,
            tx_timeout_ms: parse_or("TX_TIMEOUT_MS", 5000)?,
            jwt: JwtConfig {
                key,
                issuer: env::var("JWT_ISSUER").ok(),
                audience: env::var("JWT_AUDIENCE").ok(),
            },
            default_locale: env::var("DEFAULT_LOCALE").unwrap_or_else(|_| "es".to_string()),
        })
    }
}

fn parse_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{} inválido: '{}'", key, raw)),
        Err(_) => Ok(default),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub i18n_store: Arc<I18nStore>,

    pub auth_service: AuthService,
    pub crm_service: CrmService,
    pub operations_service: OperationsService,
    pub receivables_service: ReceivablesService,
    pub adjustment_service: AdjustmentService,
    pub dashboard_service: DashboardService,
}

impl AppState {
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(config.db_acquire_timeout_secs))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar no banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        let store = Arc::new(PgReceivablesStore::new(db_pool.clone(), config.tx_timeout_ms));
        Self::from_parts(db_pool, &config, store)
    }

    /// Monta o gráfico de dependências sobre um store qualquer (Postgres ou memória).
    pub fn from_parts(
        db_pool: PgPool,
        config: &AppConfig,
        store: Arc<dyn ReceivablesStore>,
    ) -> anyhow::Result<Self> {
        let i18n_store = I18nStore::load(&config.default_locale)?;
        let auth_service = AuthService::new(&config.jwt)?;

        let crm_service = CrmService::new(CrmRepository::new(), db_pool.clone(), config.tx_timeout_ms);
        let operations_service =
            OperationsService::new(OperationsRepository::new(), db_pool.clone(), config.tx_timeout_ms);

        Ok(Self {
            db_pool,
            i18n_store: Arc::new(i18n_store),
            auth_service,
            crm_service,
            operations_service,
            receivables_service: ReceivablesService::new(store.clone()),
            adjustment_service: AdjustmentService::new(store.clone()),
            dashboard_service: DashboardService::new(store),
        })
    }
}
