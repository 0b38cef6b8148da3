// Núcleo del motor de asignación: cálculo puro del plan (sin base de datos)
// y orquestación que lo combina con la persistencia.
pub mod distribucion;
pub mod ejecucion;
pub mod estadisticas;
pub mod particion;
pub mod subgrupos;

#[cfg(test)]
pub(crate) mod test_utils;

pub use distribucion::{
    distribuir_equitativamente, distribuir_objetivo, AsignacionGrupo, Distribucion, GrupoDestino, ParametrosDistribucion,
    TipoGrupo, CAPACIDAD_MAXIMA,
};
pub use ejecucion::{ejecutar_asignacion_completa, EjecucionesEnCurso, VERSION_ALGORITMO};
pub use estadisticas::{ConteoGenero, DetalleAsignacion, Estadisticas};

use tracing::{debug, info};

use crate::models::{orden_alfabetico, CatalogoGrupos, MatriculaAcademica};
use particion::{agrupar_por_nivel, particionar};
use subgrupos::{dividir_en_subgrupos, subgrupos_sin_especialidad};

/// Resultado del cálculo: qué matrícula va a qué sección o subgrupo.
/// Solo contiene grupos que recibieron al menos un estudiante.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanAsignacion {
    pub secciones: Vec<AsignacionGrupo>,
    pub subgrupos: Vec<AsignacionGrupo>,
    pub total_estudiantes: usize,
    pub estudiantes_sin_especialidad: usize,
    pub estudiantes_con_especialidad: usize,
    pub hermanos_agrupados: usize,
    /// Conteo de género sobre toda la cohorte elegible.
    pub conteo_genero: ConteoGenero,
}

impl PlanAsignacion {
    pub fn total_asignados(&self) -> usize {
        estadisticas::total_asignados(self.secciones.iter().chain(self.subgrupos.iter()))
    }

    pub fn estadisticas(&self) -> Estadisticas {
        Estadisticas {
            total_estudiantes: self.total_estudiantes,
            total_asignados: self.total_asignados(),
            secciones_utilizadas: self.secciones.len(),
            subgrupos_utilizados: self.subgrupos.len(),
            estudiantes_sin_especialidad: self.estudiantes_sin_especialidad,
            estudiantes_con_especialidad: self.estudiantes_con_especialidad,
            hermanos_agrupados: self.hermanos_agrupados,
        }
    }
}

/// Calcula el plan completo para las matrículas elegibles.
///
/// - Sin especialidad: por nivel, se distribuyen entre las secciones del
///   nivel y cada sección se divide en sus subgrupos sin especialidad.
/// - Con especialidad: por especialidad y nivel, se distribuyen entre los
///   subgrupos enlazados a esa especialidad.
///
/// Cohortes sin grupos configurados se omiten sin error.
pub fn calcular_plan(matriculas: &[MatriculaAcademica], catalogo: &CatalogoGrupos, parametros: &ParametrosDistribucion) -> PlanAsignacion {
    let mut elegibles: Vec<MatriculaAcademica> = matriculas.iter().filter(|m| m.es_activa() && m.sin_grupo()).cloned().collect();
    elegibles.sort_by(orden_alfabetico);

    let catalogo = catalogo.clone().normalizado();
    let particion = particionar(&elegibles);

    let mut plan = PlanAsignacion {
        total_estudiantes: elegibles.len(),
        estudiantes_sin_especialidad: particion.sin_especialidad.len(),
        estudiantes_con_especialidad: particion.total_con_especialidad(),
        conteo_genero: ConteoGenero::de(elegibles.iter()),
        ..PlanAsignacion::default()
    };

    for (nivel, cohorte) in agrupar_por_nivel(&particion.sin_especialidad) {
        let grupos: Vec<GrupoDestino> = catalogo
            .secciones
            .iter()
            .filter(|s| s.nivel.id == nivel.id)
            .map(|s| GrupoDestino { grupo_id: s.seccion_id, seccion_id: s.seccion_id })
            .collect();
        if grupos.is_empty() {
            info!(nivel = nivel.numero, estudiantes = cohorte.len(), "nivel sin secciones configuradas, se omite");
            continue;
        }

        let distribucion = distribuir_equitativamente(&cohorte, &grupos, TipoGrupo::Seccion, parametros);
        plan.hermanos_agrupados += distribucion.hermanos_agrupados;
        for asignacion in distribucion.asignaciones.into_iter().filter(|a| !a.matriculas.is_empty()) {
            let subgrupos = subgrupos_sin_especialidad(&catalogo, asignacion.seccion_id);
            let division = dividir_en_subgrupos(&asignacion, &subgrupos);
            if let Some(seccion) = catalogo.seccion(asignacion.seccion_id) {
                debug!(
                    seccion = %seccion.codigo(),
                    estudiantes = asignacion.matriculas.len(),
                    subgrupos = ?subgrupos.iter().map(|s| s.codigo()).collect::<Vec<_>>(),
                    "sección distribuida"
                );
            }
            plan.subgrupos.extend(division.into_iter().filter(|a| !a.matriculas.is_empty()));
            plan.secciones.push(asignacion);
        }
    }

    for (especialidad_id, solicitantes) in particion.por_especialidad.iter() {
        for (nivel, cohorte) in agrupar_por_nivel(solicitantes) {
            let grupos: Vec<GrupoDestino> = catalogo
                .subgrupos
                .iter()
                .filter(|s| s.especialidad_id == Some(*especialidad_id) && s.nivel.id == nivel.id)
                .map(|s| GrupoDestino { grupo_id: s.subgrupo_id, seccion_id: s.seccion_id })
                .collect();
            if grupos.is_empty() {
                info!(
                    especialidad_id = *especialidad_id,
                    nivel = nivel.numero,
                    estudiantes = cohorte.len(),
                    "especialidad sin subgrupos configurados, se omite"
                );
                continue;
            }

            let distribucion = distribuir_equitativamente(&cohorte, &grupos, TipoGrupo::Subgrupo, parametros);
            plan.hermanos_agrupados += distribucion.hermanos_agrupados;
            for asignacion in distribucion.asignaciones.into_iter().filter(|a| !a.matriculas.is_empty()) {
                if let Some(subgrupo) = catalogo.subgrupo(asignacion.grupo_id) {
                    debug!(
                        subgrupo = %subgrupo.codigo(),
                        especialidad_id = *especialidad_id,
                        estudiantes = asignacion.matriculas.len(),
                        "subgrupo de especialidad distribuido"
                    );
                }
                plan.subgrupos.push(asignacion);
            }
        }
    }

    debug!(
        elegibles = plan.conteo_genero.total(),
        secciones = plan.secciones.len(),
        subgrupos = plan.subgrupos.len(),
        asignados = plan.total_asignados(),
        "plan calculado"
    );
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::test_utils::{con_especialidad, matricula, seccion_config, subgrupo_config};
    use std::collections::HashSet;

    fn catalogo_base() -> CatalogoGrupos {
        let s71 = seccion_config(1, 7, 1);
        let s72 = seccion_config(2, 7, 2);
        let s101 = seccion_config(3, 10, 1);
        CatalogoGrupos {
            subgrupos: vec![
                subgrupo_config(11, &s71, "A", None),
                subgrupo_config(12, &s71, "B", None),
                subgrupo_config(31, &s101, "A", Some(40)),
                subgrupo_config(32, &s101, "B", Some(40)),
            ],
            secciones: vec![s72, s71, s101],
        }
    }

    #[test]
    fn plan_completo_con_division_y_especialidad() {
        let mut ms = Vec::new();
        for i in 0..8 {
            ms.push(matricula(i, &format!("AP{}", i), "X", "N", if i % 2 == 0 { "F" } else { "M" }, 7));
        }
        for i in 100..106 {
            ms.push(con_especialidad(matricula(i, &format!("TEC{}", i), "Y", "N", "F", 10), 40));
        }
        // especialidad sin subgrupos: quedan sin asignar
        for i in 200..203 {
            ms.push(con_especialidad(matricula(i, &format!("OTR{}", i), "Z", "N", "M", 10), 99));
        }

        let plan = calcular_plan(&ms, &catalogo_base(), &ParametrosDistribucion::default());
        assert_eq!(plan.total_estudiantes, 17);
        assert_eq!(plan.conteo_genero.total(), 17);
        assert_eq!(plan.estudiantes_sin_especialidad, 8);
        assert_eq!(plan.estudiantes_con_especialidad, 9);
        assert_eq!(plan.secciones.len(), 2);
        // 7-1 se divide en A y B, 10-1A y 10-1B por especialidad
        assert_eq!(plan.subgrupos.len(), 4);
        assert_eq!(plan.total_asignados(), 14);

        let stats = plan.estadisticas();
        assert_eq!(stats.secciones_utilizadas, 2);
        assert_eq!(stats.subgrupos_utilizados, 4);

        // coherencia: subgrupos de la sección 1 contienen exactamente sus estudiantes
        let seccion1: HashSet<i64> = plan.secciones.iter().find(|a| a.grupo_id == 1).unwrap().matriculas.iter().map(|m| m.id).collect();
        let en_subgrupos: HashSet<i64> = plan
            .subgrupos
            .iter()
            .filter(|a| a.seccion_id == 1)
            .flat_map(|a| a.matriculas.iter().map(|m| m.id))
            .collect();
        assert_eq!(seccion1, en_subgrupos);
    }

    #[test]
    fn ignora_matriculas_no_elegibles() {
        let mut retirada = matricula(1, "A", "B", "C", "F", 7);
        retirada.estado = "retirado".to_string();
        let mut ya_asignada = matricula(2, "D", "E", "F", "M", 7);
        ya_asignada.seccion_id = Some(1);
        let mut activa = matricula(3, "G", "H", "I", "M", 7);
        activa.estado = "ACTIVO".to_string();

        let plan = calcular_plan(&[retirada, ya_asignada, activa], &catalogo_base(), &ParametrosDistribucion::default());
        assert_eq!(plan.total_estudiantes, 1);
        assert_eq!(plan.total_asignados(), 1);
    }

    #[test]
    fn secciones_inactivas_no_reciben_estudiantes() {
        let mut catalogo = catalogo_base();
        for s in catalogo.secciones.iter_mut() {
            s.activa = false;
        }
        let ms = vec![matricula(1, "A", "B", "C", "F", 7)];
        let plan = calcular_plan(&ms, &catalogo, &ParametrosDistribucion::default());
        assert_eq!(plan.total_asignados(), 0);
        assert_eq!(plan.total_estudiantes, 1);
    }
}
