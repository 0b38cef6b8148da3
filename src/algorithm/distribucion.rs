// Distribución equitativa de una cohorte entre grupos (secciones o subgrupos).
//
// Equilibra tamaño de grupo y género con un round-robin sobre F -> M -> O y
// mantiene juntos a los hermanos (mismo par de apellidos normalizado).
use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::debug;

use crate::algorithm::estadisticas::ConteoGenero;
use crate::models::{Genero, MatriculaAcademica};

/// Tope duro por grupo usado en la segunda pasada.
pub const CAPACIDAD_MAXIMA: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParametrosDistribucion {
    pub capacidad_maxima: usize,
}

impl Default for ParametrosDistribucion {
    fn default() -> Self {
        ParametrosDistribucion { capacidad_maxima: CAPACIDAD_MAXIMA }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TipoGrupo {
    Seccion,
    Subgrupo,
}

impl TipoGrupo {
    pub fn etiqueta(&self) -> &'static str {
        match self {
            TipoGrupo::Seccion => "seccion",
            TipoGrupo::Subgrupo => "subgrupo",
        }
    }
}

/// Grupo destino de una distribución. Para secciones `seccion_id == grupo_id`;
/// para subgrupos `seccion_id` es la sección padre.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrupoDestino {
    pub grupo_id: i64,
    pub seccion_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsignacionGrupo {
    pub tipo: TipoGrupo,
    pub grupo_id: i64,
    pub seccion_id: i64,
    pub matriculas: Vec<MatriculaAcademica>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Distribucion {
    /// Una entrada por grupo, en el orden recibido (incluye grupos vacíos).
    pub asignaciones: Vec<AsignacionGrupo>,
    /// Estudiantes que pertenecen a un grupo de hermanos de tamaño > 1.
    pub hermanos_agrupados: usize,
}

/// Reparte `total` entre `num_grupos`: los primeros `total % num_grupos`
/// grupos reciben uno extra.
pub fn distribuir_objetivo(total: usize, num_grupos: usize) -> Vec<usize> {
    if num_grupos == 0 {
        return Vec::new();
    }
    let base = total / num_grupos;
    let extras = total % num_grupos;
    (0..num_grupos).map(|i| if i < extras { base + 1 } else { base }).collect()
}

/// Clave de agrupación de hermanos. Estudiantes sin ningún apellido no se
/// agrupan entre sí: cada uno forma su propio grupo.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClaveHermanos {
    Apellidos(String, String),
    Individual(i64),
}

pub fn clave_hermanos(matricula: &MatriculaAcademica) -> ClaveHermanos {
    let primero = matricula.estudiante.primer_apellido.trim().to_uppercase();
    let segundo = matricula.estudiante.segundo_apellido.trim().to_uppercase();
    if primero.is_empty() && segundo.is_empty() {
        ClaveHermanos::Individual(matricula.id)
    } else {
        ClaveHermanos::Apellidos(primero, segundo)
    }
}

/// Agrupa la cohorte por clave de hermanos; dentro de cada grupo ordena por
/// nombres (y por id para desempatar).
pub fn agrupar_hermanos(matriculas: &[MatriculaAcademica]) -> BTreeMap<ClaveHermanos, Vec<&MatriculaAcademica>> {
    let mut clusters: BTreeMap<ClaveHermanos, Vec<&MatriculaAcademica>> = BTreeMap::new();
    for m in matriculas {
        clusters.entry(clave_hermanos(m)).or_default().push(m);
    }
    for miembros in clusters.values_mut() {
        miembros.sort_by(|a, b| a.estudiante.nombres.cmp(&b.estudiante.nombres).then_with(|| a.id.cmp(&b.id)));
    }
    clusters
}

/// Elige el grupo para el primer miembro de un grupo de hermanos.
///
/// Recorre los grupos desde `cursor`: primero con el tamaño objetivo de cada
/// grupo como límite, luego con `capacidad_maxima`. Si ninguno admite el
/// grupo completo, devuelve el grupo más pequeño (el primero en caso de empate).
pub fn elegir_grupo(tamanos: &[usize], objetivos: &[usize], tamano_cluster: usize, cursor: usize, capacidad_maxima: usize) -> usize {
    let n = tamanos.len();
    for usar_objetivo in [true, false] {
        for k in 0..n {
            let i = (cursor + k) % n;
            let limite = if usar_objetivo { objetivos[i] } else { capacidad_maxima };
            if tamanos[i] + tamano_cluster <= limite {
                return i;
            }
        }
    }
    let mut menor = 0;
    for i in 1..n {
        if tamanos[i] < tamanos[menor] {
            menor = i;
        }
    }
    menor
}

/// Distribuye `matriculas` entre `grupos` (en el orden dado).
///
/// Procesa todas las mujeres, luego los hombres y luego el resto. El primer
/// miembro de cada grupo de hermanos elige grupo con `elegir_grupo` y el
/// resto lo sigue; el cursor avanza tras cada elección.
pub fn distribuir_equitativamente(
    matriculas: &[MatriculaAcademica],
    grupos: &[GrupoDestino],
    tipo: TipoGrupo,
    parametros: &ParametrosDistribucion,
) -> Distribucion {
    if grupos.is_empty() || matriculas.is_empty() {
        return Distribucion::default();
    }

    let num_grupos = grupos.len();
    let objetivos = distribuir_objetivo(matriculas.len(), num_grupos);

    let conteo = ConteoGenero::de(matriculas.iter());
    let objetivos_mujeres = distribuir_objetivo(conteo.mujeres, num_grupos);
    let objetivos_hombres = distribuir_objetivo(conteo.hombres, num_grupos);
    let objetivos_otros = distribuir_objetivo(conteo.otros, num_grupos);

    let clusters = agrupar_hermanos(matriculas);
    let hermanos_agrupados: usize = clusters.values().filter(|c| c.len() > 1).map(|c| c.len()).sum();

    let mut tamanos = vec![0usize; num_grupos];
    let mut por_genero = vec![ConteoGenero::default(); num_grupos];
    let mut asignadas: Vec<Vec<MatriculaAcademica>> = vec![Vec::new(); num_grupos];
    let mut destino: HashMap<&ClaveHermanos, usize> = HashMap::new();
    let mut cursor = 0usize;

    for genero in Genero::ORDEN {
        for (clave, miembros) in clusters.iter() {
            for m in miembros.iter().filter(|m| m.genero() == genero) {
                let idx = match destino.get(clave) {
                    Some(&i) => i,
                    None => {
                        let i = elegir_grupo(&tamanos, &objetivos, miembros.len(), cursor, parametros.capacidad_maxima);
                        cursor = (i + 1) % num_grupos;
                        destino.insert(clave, i);
                        i
                    }
                };
                tamanos[idx] += 1;
                por_genero[idx].sumar(genero);
                asignadas[idx].push((*m).clone());
            }
        }
    }

    for (i, grupo) in grupos.iter().enumerate() {
        debug!(
            tipo = tipo.etiqueta(),
            grupo_id = grupo.grupo_id,
            total = tamanos[i],
            objetivo = objetivos[i],
            mujeres = por_genero[i].mujeres,
            objetivo_mujeres = objetivos_mujeres[i],
            hombres = por_genero[i].hombres,
            objetivo_hombres = objetivos_hombres[i],
            otros = por_genero[i].otros,
            objetivo_otros = objetivos_otros[i],
            "grupo distribuido"
        );
    }

    let asignaciones = grupos
        .iter()
        .zip(asignadas)
        .map(|(g, matriculas)| AsignacionGrupo { tipo, grupo_id: g.grupo_id, seccion_id: g.seccion_id, matriculas })
        .collect();

    Distribucion { asignaciones, hermanos_agrupados }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::test_utils::{matricula, secciones};
    use std::collections::HashSet;

    fn tamanos(d: &Distribucion) -> Vec<usize> {
        d.asignaciones.iter().map(|a| a.matriculas.len()).collect()
    }

    fn grupo_de(d: &Distribucion, matricula_id: i64) -> Option<i64> {
        d.asignaciones
            .iter()
            .find(|a| a.matriculas.iter().any(|m| m.id == matricula_id))
            .map(|a| a.grupo_id)
    }

    #[test]
    fn objetivo_reparte_resto_en_primeros_grupos() {
        assert_eq!(distribuir_objetivo(10, 3), vec![4, 3, 3]);
        assert_eq!(distribuir_objetivo(9, 2), vec![5, 4]);
        assert_eq!(distribuir_objetivo(2, 4), vec![1, 1, 0, 0]);
        assert!(distribuir_objetivo(5, 0).is_empty());
    }

    #[test]
    fn objetivo_suma_total_y_diferencia_maxima_uno() {
        for total in 0..120 {
            for n in 1..12 {
                let obj = distribuir_objetivo(total, n);
                assert_eq!(obj.len(), n);
                assert_eq!(obj.iter().sum::<usize>(), total);
                let max = *obj.iter().max().unwrap();
                let min = *obj.iter().min().unwrap();
                assert!(max - min <= 1, "total={} n={} obj={:?}", total, n, obj);
            }
        }
    }

    #[test]
    fn sin_grupos_o_sin_estudiantes_no_asigna() {
        let ms = vec![matricula(1, "ROJAS", "SOTO", "ANA", "F", 7)];
        let vacia = distribuir_equitativamente(&ms, &[], TipoGrupo::Seccion, &ParametrosDistribucion::default());
        assert!(vacia.asignaciones.is_empty());
        assert_eq!(vacia.hermanos_agrupados, 0);

        let vacia = distribuir_equitativamente(&[], &secciones(&[1, 2]), TipoGrupo::Seccion, &ParametrosDistribucion::default());
        assert!(vacia.asignaciones.is_empty());
    }

    #[test]
    fn escenario_genero_exacto_dos_secciones() {
        let ms = vec![
            matricula(1, "ARAYA", "MORA", "ANA", "F", 7),
            matricula(2, "BRENES", "SOLIS", "BEA", "F", 7),
            matricula(3, "CASTRO", "LEON", "CARLA", "F", 7),
            matricula(4, "DIAZ", "VEGA", "DIANA", "F", 7),
            matricula(5, "ESQUIVEL", "RUIZ", "ELENA", "F", 7),
            matricula(6, "FONSECA", "PAZ", "FLOR", "F", 7),
            matricula(7, "GUZMAN", "LARA", "GABRIEL", "M", 7),
            matricula(8, "HERRERA", "CRUZ", "HUGO", "M", 7),
            matricula(9, "IBARRA", "MENA", "IVAN", "M", 7),
            matricula(10, "JIMENEZ", "ROJAS", "JUAN", "M", 7),
        ];
        let d = distribuir_equitativamente(&ms, &secciones(&[11, 12]), TipoGrupo::Seccion, &ParametrosDistribucion::default());
        assert_eq!(tamanos(&d), vec![5, 5]);
        for a in d.asignaciones.iter() {
            let c = ConteoGenero::de(a.matriculas.iter());
            assert_eq!((c.mujeres, c.hombres, c.otros), (3, 2, 0));
        }
        assert_eq!(d.hermanos_agrupados, 0);
    }

    #[test]
    fn hermanos_quedan_juntos_aunque_excedan_objetivo() {
        // objetivos [3, 2]: tras ALFARO y BONILLA ningún grupo admite a los
        // tres hermanos dentro del objetivo, entran por la capacidad máxima
        let ms = vec![
            matricula(1, "PEREZ", "GOMEZ", "ANA", "F", 7),
            matricula(2, "PEREZ", "GOMEZ", "LUIS", "M", 7),
            matricula(3, "perez", "gomez ", "MARTA", "F", 7),
            matricula(4, "ALFARO", "BRENES", "ROSA", "F", 7),
            matricula(5, "BONILLA", "CASTRO", "SARA", "F", 7),
        ];
        let d = distribuir_equitativamente(&ms, &secciones(&[1, 2]), TipoGrupo::Seccion, &ParametrosDistribucion::default());
        let objetivos = distribuir_objetivo(ms.len(), 2);
        assert_eq!(objetivos, vec![3, 2]);
        assert_eq!(tamanos(&d), vec![4, 1]);
        assert!(tamanos(&d)[0] > objetivos[0]);

        assert_eq!(grupo_de(&d, 1), Some(1));
        assert_eq!(grupo_de(&d, 2), Some(1));
        assert_eq!(grupo_de(&d, 3), Some(1));
        assert_eq!(grupo_de(&d, 5), Some(2));
        assert_eq!(d.hermanos_agrupados, 3);
    }

    #[test]
    fn cada_estudiante_asignado_una_sola_vez() {
        let mut ms = Vec::new();
        for i in 0..23 {
            let sexo = if i % 3 == 0 { "F" } else if i % 3 == 1 { "M" } else { "" };
            let apellido = format!("APELLIDO{}", i % 7);
            ms.push(matricula(i, &apellido, "X", &format!("N{}", i), sexo, 8));
        }
        let d = distribuir_equitativamente(&ms, &secciones(&[1, 2, 3]), TipoGrupo::Seccion, &ParametrosDistribucion::default());
        let mut vistos = HashSet::new();
        for a in d.asignaciones.iter() {
            for m in a.matriculas.iter() {
                assert!(vistos.insert(m.id), "matricula {} repetida", m.id);
            }
        }
        assert_eq!(vistos.len(), 23);
        // mismos apellidos => mismo grupo
        for i in 0..23 {
            for j in 0..23 {
                if i % 7 == j % 7 {
                    assert_eq!(grupo_de(&d, i), grupo_de(&d, j));
                }
            }
        }
        assert_eq!(d.hermanos_agrupados, 23);
    }

    #[test]
    fn sobrecarga_reparte_en_el_grupo_mas_pequeno() {
        let ms: Vec<MatriculaAcademica> = (0..70)
            .map(|i| matricula(i, &format!("A{:03}", i), "B", "C", if i % 2 == 0 { "F" } else { "M" }, 9))
            .collect();
        let d = distribuir_equitativamente(&ms, &secciones(&[1, 2]), TipoGrupo::Seccion, &ParametrosDistribucion::default());
        assert_eq!(tamanos(&d), vec![35, 35]);
        assert!(tamanos(&d).iter().all(|&t| t > CAPACIDAD_MAXIMA));
    }

    #[test]
    fn elegir_grupo_relaja_a_capacidad_y_luego_al_menor() {
        // objetivo no admite el cluster, la capacidad sí
        assert_eq!(elegir_grupo(&[3, 3], &[3, 3], 2, 1, 32), 1);
        // ni objetivo ni capacidad: el menor, empate al primero
        assert_eq!(elegir_grupo(&[4, 3, 3], &[3, 3, 3], 2, 0, 4), 1);
        assert_eq!(elegir_grupo(&[5, 5], &[3, 3], 1, 1, 4), 0);
        // respeta el cursor cuando hay espacio
        assert_eq!(elegir_grupo(&[0, 0, 0], &[2, 2, 2], 1, 2, 32), 2);
    }

    #[test]
    fn cluster_mayor_que_capacidad_se_asigna_completo() {
        let mut ms = Vec::new();
        for i in 0..5 {
            ms.push(matricula(i, "VARGAS", "LOPEZ", &format!("H{}", i), "M", 7));
        }
        ms.push(matricula(10, "ACUNA", "BOLANOS", "ZOE", "F", 7));
        let parametros = ParametrosDistribucion { capacidad_maxima: 4 };
        let d = distribuir_equitativamente(&ms, &secciones(&[1, 2]), TipoGrupo::Seccion, &parametros);
        let g = grupo_de(&d, 0);
        for i in 1..5 {
            assert_eq!(grupo_de(&d, i), g);
        }
        assert_eq!(tamanos(&d).iter().sum::<usize>(), 6);
    }

    #[test]
    fn sin_apellidos_no_forman_hermanos() {
        let ms = vec![
            matricula(1, "", "", "ANA", "F", 7),
            matricula(2, " ", "", "BETO", "M", 7),
        ];
        let d = distribuir_equitativamente(&ms, &secciones(&[1, 2]), TipoGrupo::Seccion, &ParametrosDistribucion::default());
        assert_eq!(d.hermanos_agrupados, 0);
        assert_eq!(tamanos(&d), vec![1, 1]);
    }
}
