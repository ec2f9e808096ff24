pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod estados;
pub mod models;
pub mod permissions;
pub mod routes;
pub mod schema;
pub mod sessao;
pub mod state;
pub mod storage;
pub mod utils;
