pub mod errors;
pub mod session;

pub use errors::error_observer_middleware;
pub use session::{session_middleware, Session};
