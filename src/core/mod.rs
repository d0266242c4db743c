// Core domain module
pub mod interfaces;
pub mod models;
pub mod services;
