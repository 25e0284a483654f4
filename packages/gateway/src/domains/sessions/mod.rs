//! Sessions - server-side records referenced by the signed session cookie

pub mod models;

pub use models::session::Session;
