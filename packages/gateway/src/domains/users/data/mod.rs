pub mod user;

pub use user::UserData;
