pub mod path_guard;
pub mod walker;
