use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{error, info, warn};

use crate::algorithm::estadisticas::generar_detalle_asignaciones;
use crate::algorithm::{calcular_plan, ParametrosDistribucion};
use crate::api_json::{ResultadoAsignacion, SolicitudAsignacion};
use crate::error::{AsignacionError, Resultado};
use crate::models::Ambito;
use crate::persistencia::{aplicar_plan, catalogo_grupos, matriculas_elegibles, registro_desde_plan, ConexionEscolar};

pub const VERSION_ALGORITMO: &str = "2.0-equitativo";

/// Ejecuta la asignación automática completa para el ámbito de la solicitud.
///
/// Con `simular = true` solo calcula el plan y reporta los conteos; en caso
/// contrario guarda todas las asignaciones y el registro de auditoría en una
/// única transacción. Nunca devuelve error: cualquier fallo queda en
/// `errores` con `success = false`.
pub fn ejecutar_asignacion_completa(
    conn: &mut ConexionEscolar,
    solicitud: &SolicitudAsignacion,
    parametros: &ParametrosDistribucion,
) -> ResultadoAsignacion {
    match ejecutar(conn, solicitud, parametros) {
        Ok(resultado) => resultado,
        Err(e) => {
            error!(error = %e, ambito = ?solicitud.ambito(), "asignación fallida");
            ResultadoAsignacion::con_error(&e)
        }
    }
}

fn ejecutar(conn: &mut ConexionEscolar, solicitud: &SolicitudAsignacion, parametros: &ParametrosDistribucion) -> Resultado<ResultadoAsignacion> {
    solicitud.validar()?;
    let ambito = solicitud.ambito();

    let matriculas = matriculas_elegibles(conn, &ambito)?;
    if matriculas.is_empty() {
        info!(ambito = ?ambito, "sin estudiantes elegibles");
        return Ok(ResultadoAsignacion {
            success: false,
            mensaje: "No hay estudiantes elegibles para asignar".to_string(),
            ..ResultadoAsignacion::default()
        });
    }

    let catalogo = catalogo_grupos(conn, &ambito)?;
    let plan = calcular_plan(&matriculas, &catalogo, parametros);
    let total = plan.total_asignados();

    let mensaje = if solicitud.simular {
        format!("Simulación completada: {} estudiantes asignados", total)
    } else {
        let registro = registro_desde_plan(&plan, &ambito, solicitud.usuario.as_deref(), VERSION_ALGORITMO);
        aplicar_plan(conn, &plan, &registro)?;
        format!("Asignación completada: {} estudiantes asignados", total)
    };

    info!(
        ambito = ?ambito,
        simular = solicitud.simular,
        elegibles = plan.total_estudiantes,
        asignados = total,
        secciones = plan.secciones.len(),
        subgrupos = plan.subgrupos.len(),
        "{}",
        mensaje
    );

    Ok(ResultadoAsignacion {
        success: true,
        mensaje,
        estadisticas: plan.estadisticas(),
        detalle_asignaciones: generar_detalle_asignaciones(&plan.secciones, &plan.subgrupos, &catalogo),
        errores: Vec::new(),
    })
}

/// Registro en memoria de los ámbitos con una asignación confirmada en curso.
/// Dos ejecuciones reales sobre ámbitos que se solapan no pueden correr a la
/// vez; las simulaciones no reservan nada.
#[derive(Debug, Clone, Default)]
pub struct EjecucionesEnCurso {
    activas: Arc<Mutex<Vec<Ambito>>>,
}

/// Reserva de un ámbito; se libera al soltarla.
#[derive(Debug)]
pub struct Reserva {
    activas: Arc<Mutex<Vec<Ambito>>>,
    ambito: Ambito,
}

fn bloquear(activas: &Mutex<Vec<Ambito>>) -> MutexGuard<'_, Vec<Ambito>> {
    // el Vec sigue siendo válido aunque otro hilo haya entrado en pánico
    activas.lock().unwrap_or_else(|e| e.into_inner())
}

impl EjecucionesEnCurso {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reservar(&self, ambito: Ambito) -> Resultado<Reserva> {
        let mut activas = bloquear(&self.activas);
        if let Some(otro) = activas.iter().find(|a| a.se_solapa(&ambito)) {
            warn!(solicitado = ?ambito, en_curso = ?otro, "ejecución rechazada por solapamiento");
            return Err(AsignacionError::EjecucionEnCurso(ambito));
        }
        activas.push(ambito);
        Ok(Reserva { activas: Arc::clone(&self.activas), ambito })
    }

    pub fn en_curso(&self) -> usize {
        bloquear(&self.activas).len()
    }

    /// Igual que `ejecutar_asignacion_completa`, pero una ejecución real
    /// primero reserva su ámbito y falla si otra ya lo tiene.
    pub fn ejecutar(&self, conn: &mut ConexionEscolar, solicitud: &SolicitudAsignacion, parametros: &ParametrosDistribucion) -> ResultadoAsignacion {
        if solicitud.simular {
            return ejecutar_asignacion_completa(conn, solicitud, parametros);
        }
        match self.reservar(solicitud.ambito()) {
            Ok(_reserva) => ejecutar_asignacion_completa(conn, solicitud, parametros),
            Err(e) => ResultadoAsignacion::con_error(&e),
        }
    }
}

impl Drop for Reserva {
    fn drop(&mut self) {
        let mut activas = bloquear(&self.activas);
        if let Some(pos) = activas.iter().position(|a| *a == self.ambito) {
            activas.remove(pos);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ambito(nivel_id: Option<i64>) -> Ambito {
        Ambito { institucion_id: 1, curso_lectivo_id: 2025, nivel_id }
    }

    #[test]
    fn reserva_rechaza_ambitos_solapados() {
        let en_curso = EjecucionesEnCurso::new();
        let r = en_curso.reservar(ambito(Some(7))).unwrap();
        assert!(matches!(en_curso.reservar(ambito(None)), Err(AsignacionError::EjecucionEnCurso(_))));
        assert!(en_curso.reservar(ambito(Some(7))).is_err());

        // otro nivel no se solapa
        let otra = en_curso.reservar(ambito(Some(8))).unwrap();
        assert_eq!(en_curso.en_curso(), 2);

        drop(r);
        drop(otra);
        assert_eq!(en_curso.en_curso(), 0);
        assert!(en_curso.reservar(ambito(None)).is_ok());
    }

    #[test]
    fn reserva_compartida_entre_clones() {
        let en_curso = EjecucionesEnCurso::new();
        let copia = en_curso.clone();
        let _r = en_curso.reservar(ambito(None)).unwrap();
        assert!(copia.reservar(ambito(Some(3))).is_err());
    }
}
