pub mod app;
pub mod classifier;
pub mod cli;
pub mod errors;
pub mod logging;
pub mod model;
pub mod operations;
pub mod platform;
pub mod scanner;
