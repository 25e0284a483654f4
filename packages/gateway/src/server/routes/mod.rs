// HTTP routes
pub mod draft;
pub mod health;
pub mod resources;
pub mod sessions;
pub mod tokens;

pub use draft::draft_routes;
pub use health::*;
pub use resources::ResourceRoutes;
pub use sessions::session_routes;
pub use tokens::token_routes;
