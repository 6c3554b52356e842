// Library exports for yatube
// This allows integration tests and external code to use yatube modules

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod permissions;
pub mod routes;
pub mod serializers;
pub mod state;
