mod benefit;
mod card;
mod recommendation;
mod responses;

pub use benefit::*;
pub use card::*;
pub use recommendation::*;
pub use responses::*;
