//! Clients - devices registered under a user, addressed as `/users/{0}/clients/{1}`

pub mod data;
pub mod entity;
pub mod models;

pub use data::ClientData;
pub use entity::Clients;
pub use models::Client;
