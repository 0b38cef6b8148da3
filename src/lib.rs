// Biblioteca raíz del crate `asignagrupos`.
// Motor de asignación automática de secciones y subgrupos y su API HTTP.
pub mod algorithm;
pub mod api_json;
pub mod config;
pub mod error;
pub mod models;
pub mod persistencia;
pub mod server;
pub mod server_handlers;

/// Ejecuta el servidor HTTP (reexport para facilitar uso desde `main`)
pub use server::run_server;
