// Modular tools
pub mod archive;
pub mod assemble;
pub mod batch;
pub mod cards;
pub mod clean;
pub mod document;
pub mod extract;
