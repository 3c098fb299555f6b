//! Configuration sources, in precedence order (later wins).

pub mod environment;
pub mod global_file;
