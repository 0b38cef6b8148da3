use rusqlite::Connection;
use std::fmt;
use std::fs;

// Postgres client for remote DB support
use postgres::{Client, NoTls};
use tracing::info;

use crate::config::OrigenDb;
use crate::error::{AsignacionError, Resultado};

/// Conexión a la base escolar, SQLite o Postgres.
/// Para Postgres guardamos la URL y realizamos operaciones en un hilo separado
/// para evitar bloquear dentro del runtime de tokio.
pub enum ConexionEscolar {
    Sqlite(Connection),
    /// Contiene la URL completa (postgres://...)
    PostgresConfig(String),
}

impl fmt::Debug for ConexionEscolar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConexionEscolar::Sqlite(_) => write!(f, "ConexionEscolar::Sqlite(..)"),
            ConexionEscolar::PostgresConfig(_) => write!(f, "ConexionEscolar::PostgresConfig(..)"),
        }
    }
}

/// Abre la conexión indicada por la configuración. Para SQLite crea el
/// directorio padre si no existe.
pub fn abrir_conexion(origen: &OrigenDb) -> Resultado<ConexionEscolar> {
    match origen {
        OrigenDb::Sqlite(path) => {
            if let Some(dir) = path.parent() {
                if !dir.as_os_str().is_empty() && !dir.exists() {
                    fs::create_dir_all(dir).map_err(|e| AsignacionError::Configuracion(format!("no se pudo crear {}: {}", dir.display(), e)))?;
                }
            }
            Ok(ConexionEscolar::Sqlite(Connection::open(path)?))
        }
        // La conexión real se difiere al sitio de cada operación.
        OrigenDb::Postgres(url) => Ok(ConexionEscolar::PostgresConfig(url.clone())),
    }
}

/// Ejecuta `op` con un cliente Postgres en un hilo dedicado y espera el resultado.
pub(crate) fn en_hilo_postgres<T, F>(url: &str, op: F) -> Resultado<T>
where
    T: Send + 'static,
    F: FnOnce(&mut Client) -> Resultado<T> + Send + 'static,
{
    let url = url.to_string();
    let handle = std::thread::spawn(move || -> Resultado<T> {
        let mut client = Client::connect(&url, NoTls)?;
        op(&mut client)
    });
    match handle.join() {
        Ok(res) => res,
        Err(e) => Err(AsignacionError::Hilo(format!("thread join error: {:?}", e))),
    }
}

const ESQUEMA_SQLITE: &str = "
    CREATE TABLE IF NOT EXISTS niveles (
        id INTEGER PRIMARY KEY,
        numero INTEGER NOT NULL,
        nombre TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS estudiantes (
        id INTEGER PRIMARY KEY,
        institucion_id INTEGER NOT NULL,
        primer_apellido TEXT NOT NULL,
        segundo_apellido TEXT NOT NULL DEFAULT '',
        nombres TEXT NOT NULL,
        sexo TEXT
    );

    CREATE TABLE IF NOT EXISTS secciones (
        id INTEGER PRIMARY KEY,
        institucion_id INTEGER NOT NULL,
        nivel_id INTEGER NOT NULL REFERENCES niveles(id),
        numero INTEGER NOT NULL,
        UNIQUE (institucion_id, nivel_id, numero)
    );

    CREATE TABLE IF NOT EXISTS subgrupos (
        id INTEGER PRIMARY KEY,
        institucion_id INTEGER NOT NULL,
        seccion_id INTEGER NOT NULL REFERENCES secciones(id),
        letra TEXT NOT NULL,
        UNIQUE (seccion_id, letra)
    );

    CREATE TABLE IF NOT EXISTS secciones_curso_lectivo (
        id INTEGER PRIMARY KEY,
        institucion_id INTEGER NOT NULL,
        curso_lectivo_id INTEGER NOT NULL,
        seccion_id INTEGER NOT NULL REFERENCES secciones(id),
        activa INTEGER NOT NULL DEFAULT 1
    );

    CREATE TABLE IF NOT EXISTS subgrupos_curso_lectivo (
        id INTEGER PRIMARY KEY,
        institucion_id INTEGER NOT NULL,
        curso_lectivo_id INTEGER NOT NULL,
        subgrupo_id INTEGER NOT NULL REFERENCES subgrupos(id),
        especialidad_id INTEGER,
        activa INTEGER NOT NULL DEFAULT 1
    );

    CREATE TABLE IF NOT EXISTS matriculas (
        id INTEGER PRIMARY KEY,
        estudiante_id INTEGER NOT NULL REFERENCES estudiantes(id),
        nivel_id INTEGER NOT NULL REFERENCES niveles(id),
        curso_lectivo_id INTEGER NOT NULL,
        especialidad_id INTEGER,
        seccion_id INTEGER REFERENCES secciones(id),
        subgrupo_id INTEGER REFERENCES subgrupos(id),
        estado TEXT NOT NULL DEFAULT 'activo'
    );

    CREATE TABLE IF NOT EXISTS asignaciones_grupos (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        ts TEXT NOT NULL,
        institucion_id INTEGER NOT NULL,
        curso_lectivo_id INTEGER NOT NULL,
        nivel_id INTEGER,
        usuario TEXT,
        total_estudiantes INTEGER NOT NULL,
        total_mujeres INTEGER NOT NULL,
        total_hombres INTEGER NOT NULL,
        total_otros INTEGER NOT NULL,
        secciones_utilizadas INTEGER NOT NULL,
        subgrupos_utilizados INTEGER NOT NULL,
        hermanos_agrupados INTEGER NOT NULL,
        version_algoritmo TEXT NOT NULL,
        observaciones TEXT NOT NULL DEFAULT ''
    );
";

const ESQUEMA_POSTGRES: &str = "
    CREATE TABLE IF NOT EXISTS niveles (
        id BIGINT PRIMARY KEY,
        numero INTEGER NOT NULL,
        nombre TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS estudiantes (
        id BIGINT PRIMARY KEY,
        institucion_id BIGINT NOT NULL,
        primer_apellido TEXT NOT NULL,
        segundo_apellido TEXT NOT NULL DEFAULT '',
        nombres TEXT NOT NULL,
        sexo TEXT
    );

    CREATE TABLE IF NOT EXISTS secciones (
        id BIGINT PRIMARY KEY,
        institucion_id BIGINT NOT NULL,
        nivel_id BIGINT NOT NULL REFERENCES niveles(id),
        numero INTEGER NOT NULL,
        UNIQUE (institucion_id, nivel_id, numero)
    );

    CREATE TABLE IF NOT EXISTS subgrupos (
        id BIGINT PRIMARY KEY,
        institucion_id BIGINT NOT NULL,
        seccion_id BIGINT NOT NULL REFERENCES secciones(id),
        letra TEXT NOT NULL,
        UNIQUE (seccion_id, letra)
    );

    CREATE TABLE IF NOT EXISTS secciones_curso_lectivo (
        id BIGINT PRIMARY KEY,
        institucion_id BIGINT NOT NULL,
        curso_lectivo_id BIGINT NOT NULL,
        seccion_id BIGINT NOT NULL REFERENCES secciones(id),
        activa BOOLEAN NOT NULL DEFAULT TRUE
    );

    CREATE TABLE IF NOT EXISTS subgrupos_curso_lectivo (
        id BIGINT PRIMARY KEY,
        institucion_id BIGINT NOT NULL,
        curso_lectivo_id BIGINT NOT NULL,
        subgrupo_id BIGINT NOT NULL REFERENCES subgrupos(id),
        especialidad_id BIGINT,
        activa BOOLEAN NOT NULL DEFAULT TRUE
    );

    CREATE TABLE IF NOT EXISTS matriculas (
        id BIGINT PRIMARY KEY,
        estudiante_id BIGINT NOT NULL REFERENCES estudiantes(id),
        nivel_id BIGINT NOT NULL REFERENCES niveles(id),
        curso_lectivo_id BIGINT NOT NULL,
        especialidad_id BIGINT,
        seccion_id BIGINT REFERENCES secciones(id),
        subgrupo_id BIGINT REFERENCES subgrupos(id),
        estado TEXT NOT NULL DEFAULT 'activo'
    );

    CREATE TABLE IF NOT EXISTS asignaciones_grupos (
        id BIGSERIAL PRIMARY KEY,
        ts TEXT NOT NULL,
        institucion_id BIGINT NOT NULL,
        curso_lectivo_id BIGINT NOT NULL,
        nivel_id BIGINT,
        usuario TEXT,
        total_estudiantes BIGINT NOT NULL,
        total_mujeres BIGINT NOT NULL,
        total_hombres BIGINT NOT NULL,
        total_otros BIGINT NOT NULL,
        secciones_utilizadas BIGINT NOT NULL,
        subgrupos_utilizados BIGINT NOT NULL,
        hermanos_agrupados BIGINT NOT NULL,
        version_algoritmo TEXT NOT NULL,
        observaciones TEXT NOT NULL DEFAULT ''
    );
";

/// Crea las tablas si no existen.
pub fn init_db(conn: &ConexionEscolar) -> Resultado<()> {
    match conn {
        ConexionEscolar::Sqlite(c) => {
            c.execute_batch(ESQUEMA_SQLITE)?;
        }
        ConexionEscolar::PostgresConfig(url) => {
            en_hilo_postgres(url, |client| {
                client.batch_execute(ESQUEMA_POSTGRES)?;
                Ok(())
            })?;
        }
    }
    info!(conexion = ?conn, "esquema escolar verificado");
    Ok(())
}
