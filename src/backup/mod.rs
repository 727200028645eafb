pub mod archive;
pub mod restore;
