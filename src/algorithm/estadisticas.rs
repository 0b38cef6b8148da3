// Conteos por género, estadísticas y detalle legible de una asignación.
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::algorithm::distribucion::{AsignacionGrupo, TipoGrupo};
use crate::models::{CatalogoGrupos, Genero, MatriculaAcademica};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConteoGenero {
    pub mujeres: usize,
    pub hombres: usize,
    pub otros: usize,
}

impl ConteoGenero {
    pub fn de<'a, I>(matriculas: I) -> ConteoGenero
    where
        I: IntoIterator<Item = &'a MatriculaAcademica>,
    {
        let mut conteo = ConteoGenero::default();
        for m in matriculas {
            conteo.sumar(m.genero());
        }
        conteo
    }

    pub fn sumar(&mut self, genero: Genero) {
        match genero {
            Genero::Femenino => self.mujeres += 1,
            Genero::Masculino => self.hombres += 1,
            Genero::Otro => self.otros += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.mujeres + self.hombres + self.otros
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Estadisticas {
    pub total_estudiantes: usize,
    pub total_asignados: usize,
    pub secciones_utilizadas: usize,
    pub subgrupos_utilizados: usize,
    pub estudiantes_sin_especialidad: usize,
    pub estudiantes_con_especialidad: usize,
    pub hermanos_agrupados: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetalleAsignacion {
    pub tipo: String,
    pub nombre: String,
    pub total: usize,
    pub mujeres: usize,
    pub hombres: usize,
    pub otros: usize,
}

/// Número de matrículas distintas presentes en todas las listas. Una
/// matrícula que aparece en su sección y en un subgrupo cuenta una vez.
pub fn total_asignados<'a, I>(asignaciones: I) -> usize
where
    I: IntoIterator<Item = &'a AsignacionGrupo>,
{
    let mut ids = BTreeSet::new();
    for a in asignaciones {
        ids.extend(a.matriculas.iter().map(|m| m.id));
    }
    ids.len()
}

/// Una entrada por grupo con estudiantes, ordenadas por nombre. Los grupos
/// que no aparecen en el catálogo se omiten.
pub fn generar_detalle_asignaciones(
    secciones: &[AsignacionGrupo],
    subgrupos: &[AsignacionGrupo],
    catalogo: &CatalogoGrupos,
) -> Vec<DetalleAsignacion> {
    let mut detalles = Vec::new();
    for a in secciones.iter().chain(subgrupos.iter()) {
        if a.matriculas.is_empty() {
            continue;
        }
        let nombre = match a.tipo {
            TipoGrupo::Seccion => catalogo.seccion(a.grupo_id).map(|s| s.nombre_detalle()),
            TipoGrupo::Subgrupo => catalogo.subgrupo(a.grupo_id).map(|s| s.nombre_detalle()),
        };
        let Some(nombre) = nombre else { continue };
        let conteo = ConteoGenero::de(a.matriculas.iter());
        detalles.push(DetalleAsignacion {
            tipo: a.tipo.etiqueta().to_string(),
            nombre,
            total: a.matriculas.len(),
            mujeres: conteo.mujeres,
            hombres: conteo.hombres,
            otros: conteo.otros,
        });
    }
    detalles.sort_by(|a, b| a.nombre.cmp(&b.nombre));
    detalles
}
