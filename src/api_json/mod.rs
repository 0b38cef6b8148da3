use serde::{Deserialize, Serialize};

use crate::algorithm::{DetalleAsignacion, Estadisticas};
use crate::error::{AsignacionError, Resultado};
use crate::models::Ambito;

/// Parámetros de entrada para ejecutar la asignación automática de grupos
///
/// # Estructura del JSON esperado:
/// ```json
/// {
///   "institucion_id": 1,
///   "curso_lectivo_id": 2025,
///   "nivel_id": 7,
///   "simular": true,
///   "usuario": "orientacion@colegio.ed.cr"
/// }
/// ```
///
/// # Campos:
/// - `institucion_id`: institución activa (la resuelve la capa web externa)
/// - `curso_lectivo_id`: curso lectivo a asignar (requerido)
/// - `nivel_id`: restringe la ejecución a un nivel; `null` = todos los niveles
/// - `simular`: si es `true` no se guarda nada, solo se calculan los conteos
/// - `usuario`: quién ejecuta (se guarda en el registro de auditoría)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolicitudAsignacion {
    pub institucion_id: i64,
    pub curso_lectivo_id: i64,
    #[serde(default)]
    pub nivel_id: Option<i64>,
    #[serde(default)]
    pub simular: bool,
    #[serde(default)]
    pub usuario: Option<String>,
}

impl SolicitudAsignacion {
    pub fn ambito(&self) -> Ambito {
        Ambito {
            institucion_id: self.institucion_id,
            curso_lectivo_id: self.curso_lectivo_id,
            nivel_id: self.nivel_id,
        }
    }

    pub fn validar(&self) -> Resultado<()> {
        if self.institucion_id <= 0 {
            return Err(AsignacionError::Solicitud("institucion_id es requerido".to_string()));
        }
        if self.curso_lectivo_id <= 0 {
            return Err(AsignacionError::Solicitud("curso_lectivo_id es requerido".to_string()));
        }
        if matches!(self.nivel_id, Some(n) if n <= 0) {
            return Err(AsignacionError::Solicitud("nivel_id debe ser positivo".to_string()));
        }
        Ok(())
    }
}

pub fn parse_json_input(json_str: &str) -> Result<SolicitudAsignacion, serde_json::Error> {
    serde_json::from_str::<SolicitudAsignacion>(json_str)
}

/// Respuesta de una ejecución. Los errores nunca se propagan al llamador:
/// se reportan en `errores` con `success = false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultadoAsignacion {
    pub success: bool,
    pub mensaje: String,
    pub estadisticas: Estadisticas,
    pub detalle_asignaciones: Vec<DetalleAsignacion>,
    pub errores: Vec<String>,
}

impl ResultadoAsignacion {
    pub fn con_error(error: &AsignacionError) -> Self {
        ResultadoAsignacion {
            errores: vec![format!("Error general: {}", error)],
            ..ResultadoAsignacion::default()
        }
    }
}
