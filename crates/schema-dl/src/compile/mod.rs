//! Compilation backends for validated schemas.

pub mod cpp;
