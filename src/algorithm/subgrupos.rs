// División de una sección ya asignada en sus subgrupos de letra ("7-1" -> "7-1A", "7-1B").
//
// Es una partición determinista por orden alfabético, sin equilibrio de
// género ni de hermanos: dos hermanos de la misma sección pueden quedar en
// subgrupos distintos.
use crate::algorithm::distribucion::{distribuir_objetivo, AsignacionGrupo, TipoGrupo};
use crate::models::{orden_alfabetico, orden_subgrupos, CatalogoGrupos, SubgrupoConfig};

/// Subgrupos activos de la sección que no atienden ninguna especialidad,
/// ordenados por nivel, número de sección y letra.
pub fn subgrupos_sin_especialidad(catalogo: &CatalogoGrupos, seccion_id: i64) -> Vec<&SubgrupoConfig> {
    let mut subgrupos: Vec<&SubgrupoConfig> = catalogo
        .subgrupos
        .iter()
        .filter(|s| s.activa && s.seccion_id == seccion_id && s.especialidad_id.is_none())
        .collect();
    subgrupos.sort_by(|a, b| orden_subgrupos(a, b));
    subgrupos
}

/// Reparte las matrículas de `seccion` en bloques contiguos (orden
/// alfabético) cuyo tamaño sigue la regla del resto. Sin subgrupos devuelve
/// una lista vacía.
pub fn dividir_en_subgrupos(seccion: &AsignacionGrupo, subgrupos: &[&SubgrupoConfig]) -> Vec<AsignacionGrupo> {
    if subgrupos.is_empty() || seccion.matriculas.is_empty() {
        return Vec::new();
    }

    let mut ordenadas = seccion.matriculas.clone();
    ordenadas.sort_by(orden_alfabetico);

    let objetivos = distribuir_objetivo(ordenadas.len(), subgrupos.len());
    let mut restantes = ordenadas.into_iter();
    subgrupos
        .iter()
        .zip(objetivos)
        .map(|(sg, n)| AsignacionGrupo {
            tipo: TipoGrupo::Subgrupo,
            grupo_id: sg.subgrupo_id,
            seccion_id: sg.seccion_id,
            matriculas: restantes.by_ref().take(n).collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::test_utils::{matricula, seccion_config, subgrupo_config};

    #[test]
    fn bloques_contiguos_alfabeticos() {
        let s = seccion_config(1, 7, 1);
        let otra = seccion_config(2, 7, 2);
        let catalogo = CatalogoGrupos {
            secciones: vec![s.clone(), otra.clone()],
            subgrupos: vec![
                subgrupo_config(12, &s, "B", None),
                subgrupo_config(11, &s, "A", None),
                subgrupo_config(13, &s, "C", Some(4)),
                subgrupo_config(21, &otra, "A", None),
            ],
        };
        let subgrupos = subgrupos_sin_especialidad(&catalogo, 1);
        assert_eq!(subgrupos.iter().map(|s| s.codigo()).collect::<Vec<_>>(), vec!["7-1A", "7-1B"]);

        let seccion = AsignacionGrupo {
            tipo: TipoGrupo::Seccion,
            grupo_id: 1,
            seccion_id: 1,
            matriculas: vec![
                matricula(5, "VEGA", "A", "E", "F", 7),
                matricula(1, "ALFARO", "A", "A", "M", 7),
                matricula(4, "SOTO", "A", "D", "F", 7),
                matricula(2, "BRENES", "A", "B", "M", 7),
                matricula(3, "MORA", "A", "C", "F", 7),
            ],
        };
        let division = dividir_en_subgrupos(&seccion, &subgrupos);
        assert_eq!(division.len(), 2);
        assert_eq!(division[0].grupo_id, 11);
        assert_eq!(division[0].matriculas.iter().map(|m| m.id).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(division[1].matriculas.iter().map(|m| m.id).collect::<Vec<_>>(), vec![4, 5]);
        assert!(division.iter().all(|d| d.seccion_id == 1 && d.tipo == TipoGrupo::Subgrupo));
    }

    #[test]
    fn sin_subgrupos_no_divide() {
        let seccion = AsignacionGrupo {
            tipo: TipoGrupo::Seccion,
            grupo_id: 1,
            seccion_id: 1,
            matriculas: vec![matricula(1, "A", "B", "C", "F", 7)],
        };
        assert!(dividir_en_subgrupos(&seccion, &[]).is_empty());
    }
}
