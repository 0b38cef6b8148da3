use chrono::Utc;
use rusqlite::params;
use tracing::{info, warn};

use crate::algorithm::PlanAsignacion;
use crate::error::{AsignacionError, Resultado};
use crate::models::{Ambito, RegistroAsignacion};
use crate::persistencia::db::{en_hilo_postgres, ConexionEscolar};

/// Construye la fila de auditoría de un plan (id 0 hasta insertarla). Los
/// totales de género cubren toda la cohorte elegible.
pub fn registro_desde_plan(plan: &PlanAsignacion, ambito: &Ambito, usuario: Option<&str>, version_algoritmo: &str) -> RegistroAsignacion {
    RegistroAsignacion {
        id: 0,
        ts: Utc::now().to_rfc3339(),
        institucion_id: ambito.institucion_id,
        curso_lectivo_id: ambito.curso_lectivo_id,
        nivel_id: ambito.nivel_id,
        usuario: usuario.map(|u| u.to_string()),
        total_estudiantes: plan.total_asignados() as i64,
        total_mujeres: plan.conteo_genero.mujeres as i64,
        total_hombres: plan.conteo_genero.hombres as i64,
        total_otros: plan.conteo_genero.otros as i64,
        secciones_utilizadas: plan.secciones.len() as i64,
        subgrupos_utilizados: plan.subgrupos.len() as i64,
        hermanos_agrupados: plan.hermanos_agrupados as i64,
        version_algoritmo: version_algoritmo.to_string(),
        observaciones: format!(
            "Asignación automática: {} secciones, {} subgrupos",
            plan.secciones.len(),
            plan.subgrupos.len()
        ),
    }
}

// (matricula_id, seccion_id) y (matricula_id, subgrupo_id, seccion_id padre)
type Cambios = (Vec<(i64, i64)>, Vec<(i64, i64, i64)>);

fn cambios_del_plan(plan: &PlanAsignacion) -> Cambios {
    let secciones = plan
        .secciones
        .iter()
        .flat_map(|a| a.matriculas.iter().map(move |m| (m.id, a.seccion_id)))
        .collect();
    let subgrupos = plan
        .subgrupos
        .iter()
        .flat_map(|a| a.matriculas.iter().map(move |m| (m.id, a.grupo_id, a.seccion_id)))
        .collect();
    (secciones, subgrupos)
}

const UPDATE_SECCION_SQLITE: &str =
    "UPDATE matriculas SET seccion_id = ?1 WHERE id = ?2 AND seccion_id IS NULL AND subgrupo_id IS NULL";
const UPDATE_SUBGRUPO_SQLITE: &str =
    "UPDATE matriculas SET subgrupo_id = ?1, seccion_id = ?2 WHERE id = ?3 AND subgrupo_id IS NULL AND (seccion_id IS NULL OR seccion_id = ?2)";
const INSERT_REGISTRO_SQLITE: &str = "INSERT INTO asignaciones_grupos (
        ts, institucion_id, curso_lectivo_id, nivel_id, usuario, total_estudiantes, total_mujeres, total_hombres,
        total_otros, secciones_utilizadas, subgrupos_utilizados, hermanos_agrupados, version_algoritmo, observaciones
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)";

const UPDATE_SECCION_POSTGRES: &str =
    "UPDATE matriculas SET seccion_id = $1 WHERE id = $2 AND seccion_id IS NULL AND subgrupo_id IS NULL";
const UPDATE_SUBGRUPO_POSTGRES: &str =
    "UPDATE matriculas SET subgrupo_id = $1, seccion_id = $2 WHERE id = $3 AND subgrupo_id IS NULL AND (seccion_id IS NULL OR seccion_id = $2)";
const INSERT_REGISTRO_POSTGRES: &str = "INSERT INTO asignaciones_grupos (
        ts, institucion_id, curso_lectivo_id, nivel_id, usuario, total_estudiantes, total_mujeres, total_hombres,
        total_otros, secciones_utilizadas, subgrupos_utilizados, hermanos_agrupados, version_algoritmo, observaciones
    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)";

/// Aplica el plan en una sola transacción y, si se asignó al menos un
/// estudiante, inserta el registro de auditoría. Devuelve el número de
/// matrículas distintas asignadas.
///
/// Cada UPDATE exige que la matrícula siga sin asignar; si otra ejecución la
/// tomó primero se devuelve `AsignacionError::Conflicto` y no se guarda nada.
pub fn aplicar_plan(conn: &mut ConexionEscolar, plan: &PlanAsignacion, registro: &RegistroAsignacion) -> Resultado<usize> {
    let total = plan.total_asignados();
    let (secciones, subgrupos) = cambios_del_plan(plan);

    match conn {
        ConexionEscolar::Sqlite(c) => {
            let tx = c.transaction()?;
            for (matricula_id, seccion_id) in secciones.iter() {
                if tx.execute(UPDATE_SECCION_SQLITE, params![seccion_id, matricula_id])? == 0 {
                    warn!(matricula_id = *matricula_id, "matrícula tomada por otra ejecución");
                    return Err(AsignacionError::Conflicto { matricula_id: *matricula_id });
                }
            }
            for (matricula_id, subgrupo_id, seccion_id) in subgrupos.iter() {
                if tx.execute(UPDATE_SUBGRUPO_SQLITE, params![subgrupo_id, seccion_id, matricula_id])? == 0 {
                    warn!(matricula_id = *matricula_id, "matrícula tomada por otra ejecución");
                    return Err(AsignacionError::Conflicto { matricula_id: *matricula_id });
                }
            }
            if total > 0 {
                let r = registro;
                tx.execute(
                    INSERT_REGISTRO_SQLITE,
                    params![
                        r.ts,
                        r.institucion_id,
                        r.curso_lectivo_id,
                        r.nivel_id,
                        r.usuario,
                        r.total_estudiantes,
                        r.total_mujeres,
                        r.total_hombres,
                        r.total_otros,
                        r.secciones_utilizadas,
                        r.subgrupos_utilizados,
                        r.hermanos_agrupados,
                        r.version_algoritmo,
                        r.observaciones,
                    ],
                )?;
            }
            tx.commit()?;
        }
        ConexionEscolar::PostgresConfig(url) => {
            let r = registro.clone();
            en_hilo_postgres(url, move |client| {
                let mut tx = client.transaction()?;
                for (matricula_id, seccion_id) in secciones.iter() {
                    if tx.execute(UPDATE_SECCION_POSTGRES, &[seccion_id, matricula_id])? == 0 {
                        return Err(AsignacionError::Conflicto { matricula_id: *matricula_id });
                    }
                }
                for (matricula_id, subgrupo_id, seccion_id) in subgrupos.iter() {
                    if tx.execute(UPDATE_SUBGRUPO_POSTGRES, &[subgrupo_id, seccion_id, matricula_id])? == 0 {
                        return Err(AsignacionError::Conflicto { matricula_id: *matricula_id });
                    }
                }
                if total > 0 {
                    tx.execute(
                        INSERT_REGISTRO_POSTGRES,
                        &[
                            &r.ts,
                            &r.institucion_id,
                            &r.curso_lectivo_id,
                            &r.nivel_id,
                            &r.usuario,
                            &r.total_estudiantes,
                            &r.total_mujeres,
                            &r.total_hombres,
                            &r.total_otros,
                            &r.secciones_utilizadas,
                            &r.subgrupos_utilizados,
                            &r.hermanos_agrupados,
                            &r.version_algoritmo,
                            &r.observaciones,
                        ],
                    )?;
                }
                tx.commit()?;
                Ok(())
            })?;
        }
    }

    info!(
        institucion_id = registro.institucion_id,
        curso_lectivo_id = registro.curso_lectivo_id,
        asignados = total,
        "asignación guardada"
    );
    Ok(total)
}
