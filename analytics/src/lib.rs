pub mod config;
pub mod db;
pub mod directory;
pub mod errors;
pub mod failures;
pub mod fleet;
pub mod metrics;
pub mod model;
pub mod rest;
