//! Backend de CRM + gestão de processos com quadros Kanban.
//!
//! O núcleo (`board`) mantém o estado local das views com mutações
//! otimistas e rollback, ordem densa por coluna e reconciliação por
//! notificações de mudança. O resto é a superfície HTTP sobre Postgres.

pub mod board;
pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod models;
pub mod realtime;
pub mod routes;
pub mod services;
