use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};
use thiserror::Error;
use uuid::Uuid;
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::{common::i18n::I18nStore, middleware::i18n::Locale};

// Erro interno da aplicação. Cada variante vira um status HTTP em `to_api_error`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] ValidationErrors),

    // Regra de negócio violada num campo específico (ex: linha de ajuste acima do saldo)
    #[error("Campo inválido '{field}': {code}")]
    InvalidInput {
        field: String,
        code: &'static str,
        params: Vec<(&'static str, String)>,
    },

    #[error("{resource} {id} não encontrado")]
    ResourceNotFound { resource: &'static str, id: Uuid },

    #[error("Conflito: {0}")]
    Conflict(&'static str),

    // Timeout ou falha de conexão: a transação foi desfeita e pode ser repetida
    #[error("Falha transitória: {0}")]
    Transient(String),

    #[error("Token inválido")]
    InvalidToken,

    #[error("Permissão '{0}' necessária")]
    Forbidden(&'static str),

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(sqlx::Error),

    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn invalid(field: impl Into<String>, code: &'static str) -> Self {
        AppError::InvalidInput {
            field: field.into(),
            code,
            params: Vec::new(),
        }
    }

    pub fn with_param(self, name: &'static str, value: impl ToString) -> Self {
        match self {
            AppError::InvalidInput { field, code, mut params } => {
                params.push((name, value.to_string()));
                AppError::InvalidInput { field, code, params }
            }
            other => other,
        }
    }

    pub fn not_found(resource: &'static str, id: Uuid) -> Self {
        AppError::ResourceNotFound { resource, id }
    }

    pub fn is_retryable(&self) -> bool {
        // Conflitos de concorrência podem ser repetidos; regras de estorno não
        matches!(
            self,
            AppError::Transient(_) | AppError::Conflict("concurrent_update" | "duplicate_record")
        )
    }

    /// Converte o erro numa resposta HTTP, traduzindo as mensagens para o idioma do cliente.
    pub fn to_api_error(self, locale: &Locale, store: &I18nStore) -> ApiError {
        let lang = locale.0.as_str();

        match self {
            AppError::ValidationError(errors) => {
                let mut flat = Vec::new();
                flatten_validation_errors(&errors, "", &mut flat);

                let mut details = Map::new();
                for (path, code, params) in flat {
                    let key = format!("validation.{}", code);
                    let params: Vec<(&str, String)> =
                        params.iter().map(|(k, v)| (k.as_str(), v.clone())).collect();
                    let message = store.translate(lang, &key, &params);
                    push_detail(&mut details, path, message);
                }

                ApiError {
                    status: StatusCode::BAD_REQUEST,
                    error: store.translate(lang, "errors.validation", &[]),
                    details: Some(Value::Object(details)),
                }
            }
            AppError::InvalidInput { field, code, params } => {
                let key = format!("validation.{}", code);
                let params: Vec<(&str, String)> = params.into_iter().collect();
                let message = store.translate(lang, &key, &params);

                let mut details = Map::new();
                push_detail(&mut details, field, message);

                ApiError {
                    status: StatusCode::BAD_REQUEST,
                    error: store.translate(lang, "errors.validation", &[]),
                    details: Some(Value::Object(details)),
                }
            }
            AppError::ResourceNotFound { resource, id } => {
                let resource_name = store.translate(lang, &format!("resources.{}", resource), &[]);
                ApiError {
                    status: StatusCode::NOT_FOUND,
                    error: store.translate(
                        lang,
                        "errors.not_found",
                        &[("resource", resource_name), ("id", id.to_string())],
                    ),
                    details: None,
                }
            }
            AppError::Conflict(code) => ApiError {
                status: StatusCode::CONFLICT,
                error: store.translate(lang, &format!("conflict.{}", code), &[]),
                details: Some(json!({ "code": code })),
            },
            AppError::Transient(reason) => {
                tracing::warn!("Falha transitória devolvida ao cliente: {}", reason);
                ApiError {
                    status: StatusCode::SERVICE_UNAVAILABLE,
                    error: store.translate(lang, "errors.transient", &[]),
                    details: Some(json!({ "retryable": true })),
                }
            }
            AppError::InvalidToken | AppError::JwtError(_) => ApiError {
                status: StatusCode::UNAUTHORIZED,
                error: store.translate(lang, "errors.invalid_token", &[]),
                details: None,
            },
            AppError::Forbidden(permission) => ApiError {
                status: StatusCode::FORBIDDEN,
                error: store.translate(
                    lang,
                    "errors.forbidden",
                    &[("permission", permission.to_string())],
                ),
                details: None,
            },
            ref e @ (AppError::DatabaseError(_) | AppError::InternalServerError(_)) => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                ApiError {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    error: store.translate(lang, "errors.internal", &[]),
                    details: None,
                }
            }
        }
    }
}

enum SqlxErrorClass {
    Transient,
    Conflict(&'static str),
    Other,
}

fn classify(e: &sqlx::Error) -> SqlxErrorClass {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            SqlxErrorClass::Transient
        }
        sqlx::Error::Database(db_err) => {
            let code = db_err.code();
            match code.as_deref() {
                // statement_timeout / lock_timeout
                Some("57014") | Some("55P03") => SqlxErrorClass::Transient,
                // serialization_failure / deadlock_detected
                Some("40001") | Some("40P01") => SqlxErrorClass::Conflict("concurrent_update"),
                _ if db_err.is_unique_violation() => SqlxErrorClass::Conflict("duplicate_record"),
                _ => SqlxErrorClass::Other,
            }
        }
        _ => SqlxErrorClass::Other,
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match classify(&e) {
            SqlxErrorClass::Transient => AppError::Transient(e.to_string()),
            SqlxErrorClass::Conflict(code) => AppError::Conflict(code),
            SqlxErrorClass::Other => AppError::DatabaseError(e),
        }
    }
}

// Resposta de erro já traduzida, pronta para o cliente.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

fn push_detail(details: &mut Map<String, Value>, path: String, message: String) {
    let entry = details.entry(path).or_insert_with(|| Value::Array(Vec::new()));
    if let Value::Array(messages) = entry {
        messages.push(Value::String(message));
    }
}

// Percorre structs e listas aninhadas: "lines[0].amountApplied"
fn flatten_validation_errors(
    errors: &ValidationErrors,
    prefix: &str,
    out: &mut Vec<(String, String, Vec<(String, String)>)>,
) {
    for (field, kind) in errors.errors() {
        let name = camel_case(&field.to_string());
        let path = if prefix.is_empty() {
            name
        } else {
            format!("{}.{}", prefix, name)
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for err in field_errors {
                    let params = err
                        .params
                        .iter()
                        .filter(|(k, _)| &**k != "value")
                        .map(|(k, v)| {
                            let v = match v {
                                Value::String(s) => s.clone(),
                                other => other.to_string(),
                            };
                            (k.to_string(), v)
                        })
                        .collect();
                    out.push((path.clone(), err.code.to_string(), params));
                }
            }
            ValidationErrorsKind::Struct(inner) => flatten_validation_errors(inner, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    flatten_validation_errors(inner, &format!("{}[{}]", path, index), out);
                }
            }
        }
    }
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}
