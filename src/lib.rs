pub mod core;
pub mod db;
pub mod gym_web_server;
pub mod models;
pub mod routes;
pub mod services;
