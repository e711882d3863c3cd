// Library exports for mozi
// This allows integration tests and the shell client to use the gate's modules

pub mod auth;
pub mod config;
pub mod error;
pub mod extractors;
pub mod gate;
pub mod models;
pub mod routes;
pub mod shell;
pub mod state;
pub mod upstream;
pub mod view;
