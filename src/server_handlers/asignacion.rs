use std::collections::HashMap;

use actix_web::{web, HttpResponse, Responder};
use serde_json::json;
use tracing::error;

use crate::persistencia::{abrir_conexion, registros_asignacion};
use crate::server::AppState;

const LIMITE_HISTORIAL_POR_DEFECTO: i64 = 20;
const LIMITE_HISTORIAL_MAXIMO: i64 = 200;

/// POST /asignacion/ejecutar
///
/// El cuerpo debe ser una `SolicitudAsignacion`. Un cuerpo inválido responde
/// 400; cualquier otro fallo llega dentro del `ResultadoAsignacion` (200).
pub async fn ejecutar_handler(state: web::Data<AppState>, body: web::Json<serde_json::Value>) -> impl Responder {
    let body_value = body.into_inner();
    let json_str = match serde_json::to_string(&body_value) {
        Ok(s) => s,
        Err(e) => return HttpResponse::BadRequest().json(json!({"error": format!("invalid JSON body: {}", e)})),
    };

    let solicitud = match crate::api_json::parse_json_input(&json_str) {
        Ok(s) => s,
        Err(e) => return HttpResponse::BadRequest().json(json!({"error": format!("failed to parse input: {}", e)})),
    };
    if let Err(e) = solicitud.validar() {
        return HttpResponse::BadRequest().json(json!({"error": e.to_string()}));
    }

    let permit = match state.semaforo.clone().acquire_owned().await {
        Ok(p) => p,
        Err(_) => return HttpResponse::InternalServerError().json(json!({"error": "failed to acquire semaphore"})),
    };

    let origen = state.config.db.clone();
    let parametros = state.config.parametros();
    let ejecuciones = state.ejecuciones.clone();
    let blocking = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        match abrir_conexion(&origen) {
            Ok(mut conn) => ejecuciones.ejecutar(&mut conn, &solicitud, &parametros),
            Err(e) => {
                error!(error = %e, "no se pudo abrir la base escolar");
                crate::api_json::ResultadoAsignacion::con_error(&e)
            }
        }
    });

    match blocking.await {
        Ok(resultado) => HttpResponse::Ok().json(resultado),
        Err(e) => HttpResponse::InternalServerError().json(json!({"error": format!("task join error: {}", e)})),
    }
}

/// GET /asignacion/historial?institucion_id=1&limit=20
pub async fn historial_handler(state: web::Data<AppState>, query: web::Query<HashMap<String, String>>) -> impl Responder {
    let qm = query.into_inner();
    let institucion_id = match qm.get("institucion_id").and_then(|s| s.trim().parse::<i64>().ok()) {
        Some(id) if id > 0 => id,
        _ => return HttpResponse::BadRequest().json(json!({"error": "institucion_id is required in query"})),
    };
    let limite = match qm.get("limit") {
        Some(s) => match s.trim().parse::<i64>() {
            Ok(l) if l > 0 => l.min(LIMITE_HISTORIAL_MAXIMO),
            _ => return HttpResponse::BadRequest().json(json!({"error": "limit must be a positive integer"})),
        },
        None => LIMITE_HISTORIAL_POR_DEFECTO,
    };

    let origen = state.config.db.clone();
    let blocking = tokio::task::spawn_blocking(move || {
        abrir_conexion(&origen).and_then(|conn| registros_asignacion(&conn, institucion_id, limite))
    });

    match blocking.await {
        Ok(Ok(registros)) => HttpResponse::Ok().json(json!({"institucion_id": institucion_id, "registros": registros})),
        Ok(Err(e)) => {
            error!(error = %e, institucion_id, "no se pudo leer el historial");
            HttpResponse::InternalServerError().json(json!({"error": e.to_string()}))
        }
        Err(e) => HttpResponse::InternalServerError().json(json!({"error": format!("task join error: {}", e)})),
    }
}
