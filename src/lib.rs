// src/lib.rs
pub mod config;
pub mod handlers;
pub mod models;
pub mod poller;
pub mod proxy;
pub mod storage;
pub mod upstream;
pub mod utils;
