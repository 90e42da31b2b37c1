pub mod artifact;
pub mod assembler;
pub mod loader;
pub mod registry;
