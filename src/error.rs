use thiserror::Error;

use crate::models::Ambito;

#[derive(Debug, Error)]
pub enum AsignacionError {
    #[error("error de SQLite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("error de PostgreSQL: {0}")]
    Postgres(#[from] postgres::Error),

    #[error("la matrícula {matricula_id} ya no está disponible para asignar")]
    Conflicto { matricula_id: i64 },

    #[error("ya existe una asignación en curso para la institución {} y curso lectivo {}", .0.institucion_id, .0.curso_lectivo_id)]
    EjecucionEnCurso(Ambito),

    #[error("configuración inválida: {0}")]
    Configuracion(String),

    #[error("error de hilo: {0}")]
    Hilo(String),

    #[error("solicitud inválida: {0}")]
    Solicitud(String),
}

pub type Resultado<T> = Result<T, AsignacionError>;
