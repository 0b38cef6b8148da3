// Configuración del servicio leída de variables de entorno (y `.env` si existe).
use std::env;
use std::path::PathBuf;

use crate::algorithm::distribucion::{ParametrosDistribucion, CAPACIDAD_MAXIMA};
use crate::error::{AsignacionError, Resultado};

pub const BIND_POR_DEFECTO: &str = "127.0.0.1:8080";
pub const DB_PATH_POR_DEFECTO: &str = "data/asignacion.db";

/// Origen de la base de datos escolar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrigenDb {
    Sqlite(PathBuf),
    /// URL completa (postgres://...)
    Postgres(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind: String,
    pub db: OrigenDb,
    pub capacidad_maxima: usize,
    pub max_concurrencia: usize,
}

impl Config {
    /// Lee ASIGNACION_BIND, ASIGNACION_DB_URL / ASIGNACION_DB_PATH,
    /// ASIGNACION_CAPACIDAD_MAXIMA y ASIGNACION_MAX_CONCURRENCIA.
    pub fn desde_entorno() -> Resultado<Config> {
        let _ = dotenv::dotenv();
        Self::desde_fuente(|k| env::var(k).ok())
    }

    /// Igual que `desde_entorno` pero con una fuente inyectable (tests).
    pub fn desde_fuente<F>(leer: F) -> Resultado<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind = leer("ASIGNACION_BIND")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| BIND_POR_DEFECTO.to_string());

        let db = match leer("ASIGNACION_DB_URL").filter(|s| !s.trim().is_empty()) {
            Some(url) => origen_desde_url(&url)?,
            None => {
                let path = leer("ASIGNACION_DB_PATH")
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or_else(|| DB_PATH_POR_DEFECTO.to_string());
                OrigenDb::Sqlite(PathBuf::from(path))
            }
        };

        let capacidad_maxima = match leer("ASIGNACION_CAPACIDAD_MAXIMA") {
            Some(v) => parse_positivo("ASIGNACION_CAPACIDAD_MAXIMA", &v)?,
            None => CAPACIDAD_MAXIMA,
        };

        let max_concurrencia = match leer("ASIGNACION_MAX_CONCURRENCIA") {
            Some(v) => parse_positivo("ASIGNACION_MAX_CONCURRENCIA", &v)?,
            None => std::cmp::max(1, num_cpus::get()),
        };

        Ok(Config { bind, db, capacidad_maxima, max_concurrencia })
    }

    pub fn parametros(&self) -> ParametrosDistribucion {
        ParametrosDistribucion { capacidad_maxima: self.capacidad_maxima }
    }
}

fn origen_desde_url(url: &str) -> Resultado<OrigenDb> {
    if let Some(path) = url.strip_prefix("sqlite://") {
        Ok(OrigenDb::Sqlite(PathBuf::from(path)))
    } else if let Some(path) = url.strip_prefix("file://") {
        Ok(OrigenDb::Sqlite(PathBuf::from(path)))
    } else if url.starts_with("postgres://") || url.starts_with("postgresql://") {
        Ok(OrigenDb::Postgres(url.to_string()))
    } else {
        Err(AsignacionError::Configuracion(format!("ASIGNACION_DB_URL usa un esquema no soportado: {}", url)))
    }
}

fn parse_positivo(clave: &str, valor: &str) -> Resultado<usize> {
    match valor.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(AsignacionError::Configuracion(format!("{} debe ser un entero positivo, se recibió '{}'", clave, valor))),
    }
}
