// src/lib.rs

pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod notify;
pub mod reconcile;
pub mod routes;
pub mod state;
pub mod storage;
pub mod store;
pub mod utils;

pub use routes::create_router;
