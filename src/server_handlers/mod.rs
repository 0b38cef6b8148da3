pub mod asignacion;
pub mod docs;

pub use asignacion::*;
pub use docs::*;
