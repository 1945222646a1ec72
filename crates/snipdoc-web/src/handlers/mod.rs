pub mod extract;
pub mod files;
pub mod save;
pub mod undo;
