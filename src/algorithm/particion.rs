// Separación de la cohorte elegible por especialidad y por nivel.
use std::collections::BTreeMap;

use crate::models::{MatriculaAcademica, Nivel};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Particion {
    pub sin_especialidad: Vec<MatriculaAcademica>,
    /// especialidad_id -> matrículas que la solicitan
    pub por_especialidad: BTreeMap<i64, Vec<MatriculaAcademica>>,
}

impl Particion {
    pub fn total_con_especialidad(&self) -> usize {
        self.por_especialidad.values().map(|v| v.len()).sum()
    }
}

pub fn particionar(matriculas: &[MatriculaAcademica]) -> Particion {
    let mut particion = Particion::default();
    for m in matriculas {
        match m.especialidad_id {
            Some(esp) => particion.por_especialidad.entry(esp).or_default().push(m.clone()),
            None => particion.sin_especialidad.push(m.clone()),
        }
    }
    particion
}

/// Agrupa por nivel conservando el orden relativo de las matrículas.
/// Los niveles salen ordenados por número.
pub fn agrupar_por_nivel(matriculas: &[MatriculaAcademica]) -> Vec<(Nivel, Vec<MatriculaAcademica>)> {
    let mut por_nivel: BTreeMap<(i32, i64), (Nivel, Vec<MatriculaAcademica>)> = BTreeMap::new();
    for m in matriculas {
        por_nivel
            .entry((m.nivel.numero, m.nivel.id))
            .or_insert_with(|| (m.nivel.clone(), Vec::new()))
            .1
            .push(m.clone());
    }
    por_nivel.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::test_utils::{con_especialidad, matricula};

    #[test]
    fn separa_por_especialidad() {
        let ms = vec![
            matricula(1, "A", "A", "A", "F", 10),
            con_especialidad(matricula(2, "B", "B", "B", "M", 10), 5),
            con_especialidad(matricula(3, "C", "C", "C", "F", 10), 6),
            con_especialidad(matricula(4, "D", "D", "D", "F", 10), 5),
        ];
        let p = particionar(&ms);
        assert_eq!(p.sin_especialidad.len(), 1);
        assert_eq!(p.por_especialidad[&5].iter().map(|m| m.id).collect::<Vec<_>>(), vec![2, 4]);
        assert_eq!(p.por_especialidad[&6].len(), 1);
        assert_eq!(p.total_con_especialidad(), 3);
    }

    #[test]
    fn agrupa_niveles_en_orden() {
        let ms = vec![
            matricula(1, "A", "A", "A", "F", 8),
            matricula(2, "B", "B", "B", "M", 7),
            matricula(3, "C", "C", "C", "F", 8),
        ];
        let grupos = agrupar_por_nivel(&ms);
        assert_eq!(grupos.len(), 2);
        assert_eq!(grupos[0].0.numero, 7);
        assert_eq!(grupos[1].1.iter().map(|m| m.id).collect::<Vec<_>>(), vec![1, 3]);
    }
}
