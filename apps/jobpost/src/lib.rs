pub mod api_client;
pub mod collaborators;
pub mod config;
pub mod errors;
pub mod models;
pub mod posting;
