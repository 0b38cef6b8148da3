// Estructuras de datos principales del motor de asignación
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nivel {
    pub id: i64,
    pub numero: i32,
    pub nombre: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Estudiante {
    pub id: i64,
    pub institucion_id: i64,
    pub primer_apellido: String,
    pub segundo_apellido: String,
    pub nombres: String,
    /// Texto libre tal como viene del catálogo de sexos ("FEMENINO", "M", ...).
    pub sexo: Option<String>,
}

/// Clave de género estandarizada usada en los conteos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Genero {
    #[serde(rename = "F")]
    Femenino,
    #[serde(rename = "M")]
    Masculino,
    #[serde(rename = "O")]
    Otro,
}

impl Genero {
    /// Orden fijo en que el distribuidor procesa los géneros.
    pub const ORDEN: [Genero; 3] = [Genero::Femenino, Genero::Masculino, Genero::Otro];

    pub fn desde_sexo(sexo: Option<&str>) -> Genero {
        let s = match sexo {
            Some(s) => s.trim().to_uppercase(),
            None => return Genero::Otro,
        };
        match s.as_str() {
            "FEMENINO" | "F" | "MUJER" => Genero::Femenino,
            "MASCULINO" | "M" | "HOMBRE" => Genero::Masculino,
            _ => Genero::Otro,
        }
    }
}

impl Estudiante {
    pub fn genero(&self) -> Genero {
        Genero::desde_sexo(self.sexo.as_deref())
    }
}

pub const ESTADO_ACTIVO: &str = "activo";

/// Una matrícula académica: un estudiante en un curso lectivo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatriculaAcademica {
    pub id: i64,
    pub estudiante: Estudiante,
    pub nivel: Nivel,
    pub curso_lectivo_id: i64,
    /// Oferta de especialidad del curso lectivo (solo niveles técnicos).
    pub especialidad_id: Option<i64>,
    pub seccion_id: Option<i64>,
    pub subgrupo_id: Option<i64>,
    pub estado: String,
}

impl MatriculaAcademica {
    pub fn es_activa(&self) -> bool {
        self.estado.trim().eq_ignore_ascii_case(ESTADO_ACTIVO)
    }

    pub fn sin_grupo(&self) -> bool {
        self.seccion_id.is_none() && self.subgrupo_id.is_none()
    }

    pub fn genero(&self) -> Genero {
        self.estudiante.genero()
    }
}

/// Orden alfabético (primer apellido, segundo apellido, nombres); el id
/// desempata para que el orden sea total.
pub fn orden_alfabetico(a: &MatriculaAcademica, b: &MatriculaAcademica) -> Ordering {
    let ea = &a.estudiante;
    let eb = &b.estudiante;
    ea.primer_apellido
        .cmp(&eb.primer_apellido)
        .then_with(|| ea.segundo_apellido.cmp(&eb.segundo_apellido))
        .then_with(|| ea.nombres.cmp(&eb.nombres))
        .then_with(|| a.id.cmp(&b.id))
}

/// Sección ofrecida en un curso lectivo (configuración institucional).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeccionConfig {
    pub id: i64,
    pub seccion_id: i64,
    pub nivel: Nivel,
    pub numero: i32,
    pub activa: bool,
}

impl SeccionConfig {
    pub fn codigo(&self) -> String {
        format!("{}-{}", self.nivel.numero, self.numero)
    }

    pub fn nombre_detalle(&self) -> String {
        format!("Sección {} - {}", self.numero, self.nivel.nombre)
    }
}

/// Subgrupo ofrecido en un curso lectivo. `especialidad_id` enlaza el
/// subgrupo con la oferta de especialidad que atiende.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubgrupoConfig {
    pub id: i64,
    pub subgrupo_id: i64,
    pub seccion_id: i64,
    pub seccion_numero: i32,
    pub nivel: Nivel,
    pub letra: String,
    pub especialidad_id: Option<i64>,
    pub activa: bool,
}

impl SubgrupoConfig {
    pub fn codigo(&self) -> String {
        format!("{}-{}{}", self.nivel.numero, self.seccion_numero, self.letra)
    }

    pub fn nombre_detalle(&self) -> String {
        format!("Subgrupo {} - Sección {} - {}", self.letra, self.seccion_numero, self.nivel.nombre)
    }
}

pub fn orden_secciones(a: &SeccionConfig, b: &SeccionConfig) -> Ordering {
    a.nivel.numero
        .cmp(&b.nivel.numero)
        .then_with(|| a.numero.cmp(&b.numero))
        .then_with(|| a.seccion_id.cmp(&b.seccion_id))
}

pub fn orden_subgrupos(a: &SubgrupoConfig, b: &SubgrupoConfig) -> Ordering {
    a.nivel.numero
        .cmp(&b.nivel.numero)
        .then_with(|| a.seccion_numero.cmp(&b.seccion_numero))
        .then_with(|| a.letra.cmp(&b.letra))
        .then_with(|| a.subgrupo_id.cmp(&b.subgrupo_id))
}

/// Secciones y subgrupos disponibles para un ámbito.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogoGrupos {
    pub secciones: Vec<SeccionConfig>,
    pub subgrupos: Vec<SubgrupoConfig>,
}

impl CatalogoGrupos {
    /// Deja solo los grupos activos y los ordena con las claves explícitas.
    pub fn normalizado(mut self) -> Self {
        self.secciones.retain(|s| s.activa);
        self.subgrupos.retain(|s| s.activa);
        self.secciones.sort_by(orden_secciones);
        self.subgrupos.sort_by(orden_subgrupos);
        self
    }

    pub fn seccion(&self, seccion_id: i64) -> Option<&SeccionConfig> {
        self.secciones.iter().find(|s| s.seccion_id == seccion_id)
    }

    pub fn subgrupo(&self, subgrupo_id: i64) -> Option<&SubgrupoConfig> {
        self.subgrupos.iter().find(|s| s.subgrupo_id == subgrupo_id)
    }
}

/// Ámbito de una ejecución: institución, curso lectivo y nivel opcional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ambito {
    pub institucion_id: i64,
    pub curso_lectivo_id: i64,
    pub nivel_id: Option<i64>,
}

impl Ambito {
    /// Dos ámbitos se solapan si comparten institución y curso lectivo y
    /// alguno abarca todos los niveles o ambos apuntan al mismo nivel.
    pub fn se_solapa(&self, otro: &Ambito) -> bool {
        if self.institucion_id != otro.institucion_id || self.curso_lectivo_id != otro.curso_lectivo_id {
            return false;
        }
        match (self.nivel_id, otro.nivel_id) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        }
    }
}

/// Fila de auditoría de una asignación confirmada.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistroAsignacion {
    pub id: i64,
    pub ts: String,
    pub institucion_id: i64,
    pub curso_lectivo_id: i64,
    pub nivel_id: Option<i64>,
    pub usuario: Option<String>,
    pub total_estudiantes: i64,
    pub total_mujeres: i64,
    pub total_hombres: i64,
    pub total_otros: i64,
    pub secciones_utilizadas: i64,
    pub subgrupos_utilizados: i64,
    pub hermanos_agrupados: i64,
    pub version_algoritmo: String,
    pub observaciones: String,
}
