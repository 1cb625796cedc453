// src/config.rs

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;

use crate::{
    db::{CompanyRepository, PgSource, ProcessRepository},
    realtime::ChangeHub,
    services::{CompanyService, ProcessService, TaskService},
};

/// Configuração lida do ambiente (`.env` incluso).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub addr: SocketAddr,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let addr = env::var("APP_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse::<SocketAddr>()
            .context("APP_ADDR inválido")?;
        let db_max_connections = parse_or("DB_MAX_CONNECTIONS", 5)?;
        let acquire_secs = parse_or("DB_ACQUIRE_TIMEOUT_SECS", 3)?;

        Ok(Self {
            database_url,
            addr,
            db_max_connections,
            db_acquire_timeout: Duration::from_secs(acquire_secs),
        })
    }
}

fn parse_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw.parse().with_context(|| format!("{key} inválido: {raw}")),
        Err(_) => Ok(default),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub company_service: CompanyService,
    pub process_service: ProcessService,
    pub task_service: TaskService,
    pub hub: ChangeHub,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(config.db_acquire_timeout)
            .connect(&config.database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::from_pool(db_pool))
    }

    // --- Monta o gráfico de dependências ---
    pub fn from_pool(db_pool: PgPool) -> Self {
        Self {
            company_service: CompanyService::new(CompanyRepository::new(db_pool.clone())),
            process_service: ProcessService::new(ProcessRepository::new(db_pool.clone())),
            task_service: TaskService::new(Arc::new(PgSource::new(db_pool.clone()))),
            hub: ChangeHub::default(),
            db_pool,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_numeric_setting_uses_default() {
        let value: u32 = parse_or("CRM_BOARD_TEST_UNSET_SETTING", 7).unwrap();
        assert_eq!(value, 7);
    }
}
