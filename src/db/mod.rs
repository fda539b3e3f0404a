pub mod memory;
pub mod postgres;
pub mod store;

pub use memory::InMemoryScoreStore;
pub use postgres::{create_pool, PgScoreStore};
pub use store::{ScoreFilter, ScoreStore};

#[cfg(test)]
pub use store::MockScoreStore;
