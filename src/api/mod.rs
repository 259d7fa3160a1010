pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use error::{JsonError, PlainError};
pub use router::create_router;
pub use state::AppState;
