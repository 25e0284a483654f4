// Resource domains
pub mod clients;
pub mod entity;
pub mod sessions;
pub mod users;

pub use entity::{Entity, Record, Written};
