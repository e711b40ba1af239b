//! Request routing, body binding and handlers

mod binding;
mod handlers;
mod router;

pub use self::binding::bind_and_handle;
pub use self::handlers::{execute_handler, HandlerError, HandlerResponse, HandlerResult, JsonEchoHandler};
pub use self::router::{CompiledRoute, RouteMatch, Router};
