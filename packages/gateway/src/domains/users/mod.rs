//! Users - top-level accounts and their one-time token flows

pub mod activities;
pub mod data;
pub mod entity;
pub mod models;

pub use data::UserData;
pub use entity::Users;
pub use models::User;
