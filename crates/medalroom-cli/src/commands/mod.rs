pub mod config;
pub mod engine;
pub mod medals;
pub mod tap;
