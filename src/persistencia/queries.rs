// Lecturas: matrículas elegibles, catálogo de grupos e historial de asignaciones.
use rusqlite::params;

use crate::error::Resultado;
use crate::models::{
    orden_alfabetico, Ambito, CatalogoGrupos, Estudiante, MatriculaAcademica, Nivel, RegistroAsignacion, SeccionConfig,
    SubgrupoConfig,
};
use crate::persistencia::db::{en_hilo_postgres, ConexionEscolar};

const MATRICULAS_SQLITE: &str = "
    SELECT m.id, m.curso_lectivo_id, m.especialidad_id, m.seccion_id, m.subgrupo_id, m.estado,
           e.id, e.institucion_id, e.primer_apellido, e.segundo_apellido, e.nombres, e.sexo,
           n.id, n.numero, n.nombre
    FROM matriculas m
    JOIN estudiantes e ON e.id = m.estudiante_id
    JOIN niveles n ON n.id = m.nivel_id
    WHERE e.institucion_id = ?1
      AND m.curso_lectivo_id = ?2
      AND LOWER(TRIM(m.estado)) = 'activo'
      AND m.seccion_id IS NULL
      AND m.subgrupo_id IS NULL
      AND (?3 IS NULL OR m.nivel_id = ?3)
    ORDER BY e.primer_apellido, e.segundo_apellido, e.nombres, m.id";

const MATRICULAS_POSTGRES: &str = "
    SELECT m.id, m.curso_lectivo_id, m.especialidad_id, m.seccion_id, m.subgrupo_id, m.estado,
           e.id, e.institucion_id, e.primer_apellido, e.segundo_apellido, e.nombres, e.sexo,
           n.id, n.numero, n.nombre
    FROM matriculas m
    JOIN estudiantes e ON e.id = m.estudiante_id
    JOIN niveles n ON n.id = m.nivel_id
    WHERE e.institucion_id = $1
      AND m.curso_lectivo_id = $2
      AND LOWER(TRIM(m.estado)) = 'activo'
      AND m.seccion_id IS NULL
      AND m.subgrupo_id IS NULL
      AND ($3::BIGINT IS NULL OR m.nivel_id = $3)
    ORDER BY e.primer_apellido, e.segundo_apellido, e.nombres, m.id";

const SECCIONES_SQLITE: &str = "
    SELECT scl.id, s.id, s.numero, scl.activa, n.id, n.numero, n.nombre
    FROM secciones_curso_lectivo scl
    JOIN secciones s ON s.id = scl.seccion_id
    JOIN niveles n ON n.id = s.nivel_id
    WHERE scl.institucion_id = ?1
      AND scl.curso_lectivo_id = ?2
      AND scl.activa = 1
      AND (?3 IS NULL OR s.nivel_id = ?3)";

const SECCIONES_POSTGRES: &str = "
    SELECT scl.id, s.id, s.numero, scl.activa, n.id, n.numero, n.nombre
    FROM secciones_curso_lectivo scl
    JOIN secciones s ON s.id = scl.seccion_id
    JOIN niveles n ON n.id = s.nivel_id
    WHERE scl.institucion_id = $1
      AND scl.curso_lectivo_id = $2
      AND scl.activa = TRUE
      AND ($3::BIGINT IS NULL OR s.nivel_id = $3)";

const SUBGRUPOS_SQLITE: &str = "
    SELECT sgcl.id, sg.id, s.id, s.numero, sg.letra, sgcl.especialidad_id, sgcl.activa, n.id, n.numero, n.nombre
    FROM subgrupos_curso_lectivo sgcl
    JOIN subgrupos sg ON sg.id = sgcl.subgrupo_id
    JOIN secciones s ON s.id = sg.seccion_id
    JOIN niveles n ON n.id = s.nivel_id
    WHERE sgcl.institucion_id = ?1
      AND sgcl.curso_lectivo_id = ?2
      AND sgcl.activa = 1
      AND (?3 IS NULL OR s.nivel_id = ?3)";

const SUBGRUPOS_POSTGRES: &str = "
    SELECT sgcl.id, sg.id, s.id, s.numero, sg.letra, sgcl.especialidad_id, sgcl.activa, n.id, n.numero, n.nombre
    FROM subgrupos_curso_lectivo sgcl
    JOIN subgrupos sg ON sg.id = sgcl.subgrupo_id
    JOIN secciones s ON s.id = sg.seccion_id
    JOIN niveles n ON n.id = s.nivel_id
    WHERE sgcl.institucion_id = $1
      AND sgcl.curso_lectivo_id = $2
      AND sgcl.activa = TRUE
      AND ($3::BIGINT IS NULL OR s.nivel_id = $3)";

const REGISTROS_COLUMNAS: &str = "id, ts, institucion_id, curso_lectivo_id, nivel_id, usuario, total_estudiantes, total_mujeres, \
    total_hombres, total_otros, secciones_utilizadas, subgrupos_utilizados, hermanos_agrupados, version_algoritmo, observaciones";

fn matricula_sqlite(row: &rusqlite::Row<'_>) -> rusqlite::Result<MatriculaAcademica> {
    Ok(MatriculaAcademica {
        id: row.get(0)?,
        curso_lectivo_id: row.get(1)?,
        especialidad_id: row.get(2)?,
        seccion_id: row.get(3)?,
        subgrupo_id: row.get(4)?,
        estado: row.get(5)?,
        estudiante: Estudiante {
            id: row.get(6)?,
            institucion_id: row.get(7)?,
            primer_apellido: row.get(8)?,
            segundo_apellido: row.get(9)?,
            nombres: row.get(10)?,
            sexo: row.get(11)?,
        },
        nivel: Nivel { id: row.get(12)?, numero: row.get(13)?, nombre: row.get(14)? },
    })
}

fn matricula_postgres(row: &postgres::Row) -> MatriculaAcademica {
    MatriculaAcademica {
        id: row.get(0),
        curso_lectivo_id: row.get(1),
        especialidad_id: row.get(2),
        seccion_id: row.get(3),
        subgrupo_id: row.get(4),
        estado: row.get(5),
        estudiante: Estudiante {
            id: row.get(6),
            institucion_id: row.get(7),
            primer_apellido: row.get(8),
            segundo_apellido: row.get(9),
            nombres: row.get(10),
            sexo: row.get(11),
        },
        nivel: Nivel { id: row.get(12), numero: row.get(13), nombre: row.get(14) },
    }
}

/// Matrículas activas, sin sección ni subgrupo, del ámbito; en orden
/// alfabético (primer apellido, segundo apellido, nombres).
pub fn matriculas_elegibles(conn: &ConexionEscolar, ambito: &Ambito) -> Resultado<Vec<MatriculaAcademica>> {
    let mut matriculas = match conn {
        ConexionEscolar::Sqlite(c) => {
            let mut stmt = c.prepare(MATRICULAS_SQLITE)?;
            let filas = stmt.query_map(params![ambito.institucion_id, ambito.curso_lectivo_id, ambito.nivel_id], matricula_sqlite)?;
            let mut out = Vec::new();
            for f in filas {
                out.push(f?);
            }
            out
        }
        ConexionEscolar::PostgresConfig(url) => {
            let ambito = *ambito;
            en_hilo_postgres(url, move |client| {
                let filas = client.query(MATRICULAS_POSTGRES, &[&ambito.institucion_id, &ambito.curso_lectivo_id, &ambito.nivel_id])?;
                Ok(filas.iter().map(matricula_postgres).collect::<Vec<_>>())
            })?
        }
    };
    // El orden de la base depende del collation; el algoritmo usa el orden explícito.
    matriculas.sort_by(orden_alfabetico);
    Ok(matriculas)
}

/// Secciones y subgrupos activos del ámbito, ordenados.
pub fn catalogo_grupos(conn: &ConexionEscolar, ambito: &Ambito) -> Resultado<CatalogoGrupos> {
    let catalogo = match conn {
        ConexionEscolar::Sqlite(c) => {
            let args: [&dyn rusqlite::ToSql; 3] = [&ambito.institucion_id, &ambito.curso_lectivo_id, &ambito.nivel_id];

            let mut stmt = c.prepare(SECCIONES_SQLITE)?;
            let filas = stmt.query_map(&args, |row| {
                Ok(SeccionConfig {
                    id: row.get(0)?,
                    seccion_id: row.get(1)?,
                    numero: row.get(2)?,
                    activa: row.get(3)?,
                    nivel: Nivel { id: row.get(4)?, numero: row.get(5)?, nombre: row.get(6)? },
                })
            })?;
            let mut secciones = Vec::new();
            for f in filas {
                secciones.push(f?);
            }

            let mut stmt = c.prepare(SUBGRUPOS_SQLITE)?;
            let filas = stmt.query_map(&args, |row| {
                Ok(SubgrupoConfig {
                    id: row.get(0)?,
                    subgrupo_id: row.get(1)?,
                    seccion_id: row.get(2)?,
                    seccion_numero: row.get(3)?,
                    letra: row.get(4)?,
                    especialidad_id: row.get(5)?,
                    activa: row.get(6)?,
                    nivel: Nivel { id: row.get(7)?, numero: row.get(8)?, nombre: row.get(9)? },
                })
            })?;
            let mut subgrupos = Vec::new();
            for f in filas {
                subgrupos.push(f?);
            }
            CatalogoGrupos { secciones, subgrupos }
        }
        ConexionEscolar::PostgresConfig(url) => {
            let ambito = *ambito;
            en_hilo_postgres(url, move |client| {
                let args: [&(dyn postgres::types::ToSql + Sync); 3] = [&ambito.institucion_id, &ambito.curso_lectivo_id, &ambito.nivel_id];
                let secciones = client
                    .query(SECCIONES_POSTGRES, &args)?
                    .iter()
                    .map(|row| SeccionConfig {
                        id: row.get(0),
                        seccion_id: row.get(1),
                        numero: row.get(2),
                        activa: row.get(3),
                        nivel: Nivel { id: row.get(4), numero: row.get(5), nombre: row.get(6) },
                    })
                    .collect();
                let subgrupos = client
                    .query(SUBGRUPOS_POSTGRES, &args)?
                    .iter()
                    .map(|row| SubgrupoConfig {
                        id: row.get(0),
                        subgrupo_id: row.get(1),
                        seccion_id: row.get(2),
                        seccion_numero: row.get(3),
                        letra: row.get(4),
                        especialidad_id: row.get(5),
                        activa: row.get(6),
                        nivel: Nivel { id: row.get(7), numero: row.get(8), nombre: row.get(9) },
                    })
                    .collect();
                Ok(CatalogoGrupos { secciones, subgrupos })
            })?
        }
    };
    Ok(catalogo.normalizado())
}

fn registro_sqlite(row: &rusqlite::Row<'_>) -> rusqlite::Result<RegistroAsignacion> {
    Ok(RegistroAsignacion {
        id: row.get(0)?,
        ts: row.get(1)?,
        institucion_id: row.get(2)?,
        curso_lectivo_id: row.get(3)?,
        nivel_id: row.get(4)?,
        usuario: row.get(5)?,
        total_estudiantes: row.get(6)?,
        total_mujeres: row.get(7)?,
        total_hombres: row.get(8)?,
        total_otros: row.get(9)?,
        secciones_utilizadas: row.get(10)?,
        subgrupos_utilizados: row.get(11)?,
        hermanos_agrupados: row.get(12)?,
        version_algoritmo: row.get(13)?,
        observaciones: row.get(14)?,
    })
}

/// Últimos registros de auditoría de la institución (más reciente primero).
pub fn registros_asignacion(conn: &ConexionEscolar, institucion_id: i64, limite: i64) -> Resultado<Vec<RegistroAsignacion>> {
    match conn {
        ConexionEscolar::Sqlite(c) => {
            let sql = format!(
                "SELECT {} FROM asignaciones_grupos WHERE institucion_id = ?1 ORDER BY id DESC LIMIT ?2",
                REGISTROS_COLUMNAS
            );
            let mut stmt = c.prepare(&sql)?;
            let filas = stmt.query_map(params![institucion_id, limite], registro_sqlite)?;
            let mut out = Vec::new();
            for f in filas {
                out.push(f?);
            }
            Ok(out)
        }
        ConexionEscolar::PostgresConfig(url) => en_hilo_postgres(url, move |client| {
            let sql = format!(
                "SELECT {} FROM asignaciones_grupos WHERE institucion_id = $1 ORDER BY id DESC LIMIT $2",
                REGISTROS_COLUMNAS
            );
            let filas = client.query(sql.as_str(), &[&institucion_id, &limite])?;
            Ok(filas
                .iter()
                .map(|r| RegistroAsignacion {
                    id: r.get(0),
                    ts: r.get(1),
                    institucion_id: r.get(2),
                    curso_lectivo_id: r.get(3),
                    nivel_id: r.get(4),
                    usuario: r.get(5),
                    total_estudiantes: r.get(6),
                    total_mujeres: r.get(7),
                    total_hombres: r.get(8),
                    total_otros: r.get(9),
                    secciones_utilizadas: r.get(10),
                    subgrupos_utilizados: r.get(11),
                    hermanos_agrupados: r.get(12),
                    version_algoritmo: r.get(13),
                    observaciones: r.get(14),
                })
                .collect())
        }),
    }
}
