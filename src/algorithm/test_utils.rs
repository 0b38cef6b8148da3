// Constructores compactos para los tests de los algoritmos.
use crate::algorithm::distribucion::GrupoDestino;
use crate::models::{Estudiante, MatriculaAcademica, Nivel, SeccionConfig, SubgrupoConfig};

pub fn nivel(numero: i32) -> Nivel {
    Nivel { id: numero as i64, numero, nombre: format!("Nivel {}", numero) }
}

pub fn matricula(id: i64, primer_apellido: &str, segundo_apellido: &str, nombres: &str, sexo: &str, nivel_numero: i32) -> MatriculaAcademica {
    MatriculaAcademica {
        id,
        estudiante: Estudiante {
            id: 1000 + id,
            institucion_id: 1,
            primer_apellido: primer_apellido.to_string(),
            segundo_apellido: segundo_apellido.to_string(),
            nombres: nombres.to_string(),
            sexo: if sexo.is_empty() { None } else { Some(sexo.to_string()) },
        },
        nivel: nivel(nivel_numero),
        curso_lectivo_id: 2025,
        especialidad_id: None,
        seccion_id: None,
        subgrupo_id: None,
        estado: "activo".to_string(),
    }
}

pub fn con_especialidad(mut m: MatriculaAcademica, especialidad_id: i64) -> MatriculaAcademica {
    m.especialidad_id = Some(especialidad_id);
    m
}

pub fn secciones(ids: &[i64]) -> Vec<GrupoDestino> {
    ids.iter().map(|&id| GrupoDestino { grupo_id: id, seccion_id: id }).collect()
}

pub fn seccion_config(seccion_id: i64, nivel_numero: i32, numero: i32) -> SeccionConfig {
    SeccionConfig { id: seccion_id, seccion_id, nivel: nivel(nivel_numero), numero, activa: true }
}

pub fn subgrupo_config(subgrupo_id: i64, seccion: &SeccionConfig, letra: &str, especialidad_id: Option<i64>) -> SubgrupoConfig {
    SubgrupoConfig {
        id: subgrupo_id,
        subgrupo_id,
        seccion_id: seccion.seccion_id,
        seccion_numero: seccion.numero,
        nivel: seccion.nivel.clone(),
        letra: letra.to_string(),
        especialidad_id,
        activa: true,
    }
}
