// Caller identification: basic credentials and cookie sessions
pub mod credentials;
pub mod session;
pub mod strategy;

pub use credentials::{basic_credentials, verify_credentials};
pub use session::{SessionManager, SessionTokens, Strictness};
pub use strategy::{AuthStrategy, Bypass, Credentials, Identified, SessionCookie};
