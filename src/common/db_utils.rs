// src/common/db_utils.rs

use serde::{Deserialize, Deserializer};

use crate::common::error::AppError;

/// Converte erros de escrita do sqlx, tratando violação de UNIQUE como conflito.
pub(crate) fn map_write_error(e: sqlx::Error, conflict_message: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::UniqueConstraintViolation(conflict_message.to_string());
        }
    }
    e.into()
}

/// Acrescenta `coluna = $n` ao SET de um `QueryBuilder` quando o campo do
/// patch veio preenchido.
macro_rules! set_if {
    ($set:expr, $column:literal, $value:expr) => {
        if let Some(value) = $value {
            $set.push(concat!($column, " = ")).push_bind_unseparated(value.clone());
        }
    };
}
pub(crate) use set_if;

/// Chave estrangeira apontando para registro inexistente vira 404.
pub(crate) fn map_reference_error(e: sqlx::Error, missing: &'static str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_foreign_key_violation() {
            return AppError::NotFound(missing);
        }
    }
    e.into()
}

/// `Option<Option<T>>` em payloads de PATCH:
/// campo ausente -> None, `null` -> Some(None), valor -> Some(Some(v)).
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
