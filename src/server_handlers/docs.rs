use actix_web::{HttpResponse, Responder};
use serde_json::json;

use crate::algorithm::{CAPACIDAD_MAXIMA, VERSION_ALGORITMO};
use crate::api_json::SolicitudAsignacion;

pub async fn help_handler() -> impl Responder {
    let example = SolicitudAsignacion {
        institucion_id: 1,
        curso_lectivo_id: 2025,
        nivel_id: Some(7),
        simular: true,
        usuario: Some("orientacion@colegio.ed.cr".to_string()),
    };

    let help = json!({
        "description": "API de asignación automática de secciones y subgrupos. POST /asignacion/ejecutar distribuye las matrículas activas sin grupo de forma equitativa por género, manteniendo juntos a los hermanos. Con 'simular' en true solo se calculan los conteos.",
        "post_example": example,
        "historial_example_query": "/asignacion/historial?institucion_id=1&limit=20",
        "note": "Si 'nivel_id' se omite se asignan todos los niveles del curso lectivo. Los estudiantes con especialidad se asignan a los subgrupos enlazados a su especialidad.",
        "capacidad_maxima_por_defecto": CAPACIDAD_MAXIMA,
        "version_algoritmo": VERSION_ALGORITMO
    });

    HttpResponse::Ok().json(help)
}
