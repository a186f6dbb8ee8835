pub mod check;
pub mod config;
pub mod mix;
pub mod probe;
