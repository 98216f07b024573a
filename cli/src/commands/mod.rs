pub mod app_server;
pub mod config;
pub mod paths;
pub mod serve;
