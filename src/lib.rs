pub mod asset;
pub mod catalog;
pub mod catalog_stores;
pub mod config;
pub mod error;
pub mod render;
pub mod scanner;
pub mod thumbnail;
pub mod walker;
pub mod web_server;
