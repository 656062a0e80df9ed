pub mod drill;
pub mod sessions;
