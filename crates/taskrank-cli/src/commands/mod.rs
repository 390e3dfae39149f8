pub mod analyze;
pub mod config;
pub mod graph;
pub mod serve;
