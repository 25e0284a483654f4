pub mod client;

pub use client::{Client, ClientChanges, NewClient};
