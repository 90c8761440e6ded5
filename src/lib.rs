pub mod config;
pub mod domain;
pub mod forms;
pub mod models;
pub mod payment_widget;
pub mod repository;
pub mod routes;
pub mod schema;
pub mod services;
