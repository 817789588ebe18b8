mod error;
mod handlers;
mod router;
mod surface;
mod types;

pub use router::handle_request;
pub use surface::{StdoutSurface, Surface};
pub use types::{AppState, Request};
