// --- Asignación automática de secciones y subgrupos - Archivo principal ---

use asignagrupos::config::Config;
use asignagrupos::persistencia::{abrir_conexion, init_db};
use asignagrupos::run_server;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("asignagrupos=info,actix_web=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match Config::desde_entorno() {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "configuración inválida");
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
        }
    };

    let preparada = abrir_conexion(&config.db).and_then(|conn| init_db(&conn));
    if let Err(e) = preparada {
        error!(error = %e, "no se pudo preparar la base escolar");
        return Err(std::io::Error::other(e.to_string()));
    }

    info!("=== Asignación automática de grupos (API) ===");
    run_server(config).await
}
