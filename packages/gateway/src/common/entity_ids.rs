//! Typed ID definitions for the resources behind the gateway.

pub use super::id::Id;

/// Marker type for user accounts.
pub struct User;

/// Marker type for a user's registered clients (devices/applications).
pub struct Client;

/// Marker type for persisted sessions.
pub struct Session;

pub type UserId = Id<User>;

pub type ClientId = Id<Client>;

pub type SessionId = Id<Session>;
