use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use tokio::sync::Semaphore;
use tracing::info;

use crate::algorithm::EjecucionesEnCurso;
use crate::config::Config;
use crate::server_handlers::{ejecutar_handler, help_handler, historial_handler};

/// Estado compartido entre workers de actix.
pub struct AppState {
    pub config: Config,
    /// Limita cuántas ejecuciones bloqueantes corren a la vez.
    pub semaforo: Arc<Semaphore>,
    pub ejecuciones: EjecucionesEnCurso,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let permisos = std::cmp::max(1, config.max_concurrencia);
        AppState {
            config,
            semaforo: Arc::new(Semaphore::new(permisos)),
            ejecuciones: EjecucionesEnCurso::new(),
        }
    }
}

/// Registra las rutas del servicio; se usa también desde los tests.
pub fn configurar_rutas(cfg: &mut web::ServiceConfig) {
    cfg.route("/asignacion/ejecutar", web::post().to(ejecutar_handler))
        .route("/asignacion/historial", web::get().to(historial_handler))
        .route("/help", web::get().to(help_handler));
}

/// Ejecuta el servidor HTTP con la configuración dada.
pub async fn run_server(config: Config) -> std::io::Result<()> {
    let bind = config.bind.clone();
    let state = web::Data::new(AppState::new(config));
    info!(%bind, concurrencia = state.config.max_concurrencia, "iniciando servidor");

    HttpServer::new(move || App::new().app_data(state.clone()).configure(configurar_rutas))
        .bind(bind)?
        .run()
        .await
}
