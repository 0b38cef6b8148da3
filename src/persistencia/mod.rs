pub mod db;
pub mod insertions;
pub mod queries;

pub use db::{abrir_conexion, init_db, ConexionEscolar};
pub use insertions::{aplicar_plan, registro_desde_plan};
pub use queries::{catalogo_grupos, matriculas_elegibles, registros_asignacion};
