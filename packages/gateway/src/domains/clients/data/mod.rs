pub mod client;

pub use client::ClientData;
