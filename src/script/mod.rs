// ABOUTME: Script layer: tokenizer, loader/validator, executor (components F, G, H, I)

pub mod executor;
pub mod iter;
pub mod loader;
pub mod tokenizer;

pub use executor::Script;
pub use loader::{FunctionEntry, Line, LoadedScript};
