/// Web API Handlers
///
/// This module contains the handlers for the RESTful API endpoints.
/// Each handler extracts what it needs from the request, calls the matching
/// repository function and turns the result or error into a response.

mod wisdom_handlers;
mod cycle_handlers;
mod category_handlers;

// Re-export all handlers
pub use wisdom_handlers::*;
pub use cycle_handlers::*;
pub use category_handlers::*;
