pub mod extract;
pub mod handlers;
pub mod health;
pub mod routes;
pub mod state;

pub use routes::{create_router, RouterOptions};
pub use state::AppState;
