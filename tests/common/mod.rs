#![allow(dead_code)]
// Helpers para sembrar una base escolar SQLite en los tests de integración.
use asignagrupos::persistencia::{init_db, ConexionEscolar};
use rusqlite::{params, Connection};

pub const INSTITUCION: i64 = 1;
pub const CURSO: i64 = 2025;

pub fn conexion_en_memoria() -> ConexionEscolar {
    let conn = ConexionEscolar::Sqlite(Connection::open_in_memory().expect("open in-memory sqlite"));
    init_db(&conn).expect("init_db");
    conn
}

pub fn sqlite(conn: &ConexionEscolar) -> &Connection {
    match conn {
        ConexionEscolar::Sqlite(c) => c,
        other => panic!("se esperaba SQLite, se obtuvo {:?}", other),
    }
}

pub fn sembrar_nivel(c: &Connection, id: i64, numero: i32, nombre: &str) {
    c.execute("INSERT INTO niveles (id, numero, nombre) VALUES (?1, ?2, ?3)", params![id, numero, nombre]).unwrap();
}

/// Sección `numero` del nivel, activa en el curso lectivo de prueba.
pub fn sembrar_seccion(c: &Connection, id: i64, nivel_id: i64, numero: i32) {
    c.execute(
        "INSERT INTO secciones (id, institucion_id, nivel_id, numero) VALUES (?1, ?2, ?3, ?4)",
        params![id, INSTITUCION, nivel_id, numero],
    )
    .unwrap();
    c.execute(
        "INSERT INTO secciones_curso_lectivo (id, institucion_id, curso_lectivo_id, seccion_id, activa) VALUES (?1, ?2, ?3, ?4, 1)",
        params![id, INSTITUCION, CURSO, id],
    )
    .unwrap();
}

pub fn sembrar_subgrupo(c: &Connection, id: i64, seccion_id: i64, letra: &str, especialidad_id: Option<i64>) {
    c.execute(
        "INSERT INTO subgrupos (id, institucion_id, seccion_id, letra) VALUES (?1, ?2, ?3, ?4)",
        params![id, INSTITUCION, seccion_id, letra],
    )
    .unwrap();
    c.execute(
        "INSERT INTO subgrupos_curso_lectivo (id, institucion_id, curso_lectivo_id, subgrupo_id, especialidad_id, activa)
         VALUES (?1, ?2, ?3, ?4, ?5, 1)",
        params![id, INSTITUCION, CURSO, id, especialidad_id],
    )
    .unwrap();
}

/// Estudiante con una matrícula activa y sin grupo (id de estudiante = 1000 + id).
pub fn sembrar_matricula(
    c: &Connection,
    id: i64,
    primer_apellido: &str,
    segundo_apellido: &str,
    nombres: &str,
    sexo: &str,
    nivel_id: i64,
    especialidad_id: Option<i64>,
) {
    let estudiante_id = 1000 + id;
    c.execute(
        "INSERT INTO estudiantes (id, institucion_id, primer_apellido, segundo_apellido, nombres, sexo) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![estudiante_id, INSTITUCION, primer_apellido, segundo_apellido, nombres, sexo],
    )
    .unwrap();
    c.execute(
        "INSERT INTO matriculas (id, estudiante_id, nivel_id, curso_lectivo_id, especialidad_id, estado) VALUES (?1, ?2, ?3, ?4, ?5, 'activo')",
        params![id, estudiante_id, nivel_id, CURSO, especialidad_id],
    )
    .unwrap();
}

/// Deja sin registrar el sexo del estudiante de la matrícula `id`.
pub fn quitar_sexo(c: &Connection, id: i64) {
    c.execute("UPDATE estudiantes SET sexo = NULL WHERE id = ?1", params![1000 + id]).unwrap();
}

/// Nivel 7 con secciones 7-1 y 7-2 (subgrupos A y B cada una) y `n`
/// estudiantes alternando F/M con apellidos distintos.
pub fn escenario_setimo(n: i64) -> ConexionEscolar {
    let conn = conexion_en_memoria();
    let c = sqlite(&conn);
    sembrar_nivel(c, 7, 7, "Sétimo");
    sembrar_seccion(c, 71, 7, 1);
    sembrar_seccion(c, 72, 7, 2);
    sembrar_subgrupo(c, 711, 71, "A", None);
    sembrar_subgrupo(c, 712, 71, "B", None);
    sembrar_subgrupo(c, 721, 72, "A", None);
    sembrar_subgrupo(c, 722, 72, "B", None);
    for i in 1..=n {
        let sexo = if i % 2 == 1 { "F" } else { "M" };
        sembrar_matricula(c, i, &format!("APELLIDO{:02}", i), "ROJAS", "ANA", sexo, 7, None);
    }
    conn
}

pub fn contar(c: &Connection, sql: &str) -> i64 {
    c.query_row(sql, [], |r| r.get(0)).unwrap()
}
