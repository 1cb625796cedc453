// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // O registro alvo não existe mais (ex: exclusão concorrente)
    #[error("{0} não encontrado(a)")]
    NotFound(&'static str),

    // Violação de UNIQUE (ex: CNPJ duplicado)
    #[error("{0}")]
    UniqueConstraintViolation(String),

    // Reorder em lote: ao menos uma linha falhou. As que passaram NÃO são desfeitas.
    #[error("Falha parcial no lote: {failed} de {total} atualizações falharam")]
    PartialBatchFailure { failed: usize, total: usize },

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Falha de transporte/armazenamento vinda de qualquer outra fonte
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

impl AppError {
    /// Código HTTP correspondente. Também usado pelo coordenador para
    /// decidir entre rollback simples e resync.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::UniqueConstraintViolation(_) => StatusCode::CONFLICT,
            AppError::PartialBatchFailure { .. }
            | AppError::DatabaseError(_)
            | AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }

    /// Mensagem curta para o usuário (o detalhe técnico vai só para o log).
    pub fn user_message(&self) -> String {
        match self {
            AppError::ValidationError(_) => "Um ou mais campos são inválidos.".to_string(),
            AppError::NotFound(_) | AppError::UniqueConstraintViolation(_) => self.to_string(),
            AppError::PartialBatchFailure { .. } => "Partial update failure".to_string(),
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                "Ocorreu um erro inesperado.".to_string()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match &self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                json!({
                    "error": self.user_message(),
                    "details": details,
                })
            }
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                tracing::error!("Erro Interno do Servidor: {:?}", self);
                json!({ "error": self.user_message() })
            }
            _ => json!({ "error": self.user_message() }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::{ValidationError, ValidationErrors};

    #[test]
    fn maps_taxonomy_to_status_codes() {
        assert_eq!(AppError::NotFound("Empresa").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::UniqueConstraintViolation("CNPJ já cadastrado".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::PartialBatchFailure { failed: 1, total: 3 }.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::ValidationError(ValidationErrors::new()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn validation_response_is_bad_request() {
        let mut errors = ValidationErrors::new();
        errors.add("name", ValidationError::new("length"));
        let response = AppError::ValidationError(errors).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn not_found_message_names_the_entity() {
        assert_eq!(AppError::NotFound("Empresa").user_message(), "Empresa não encontrado(a)");
    }
}
