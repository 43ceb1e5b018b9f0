/// Middleware module
///
/// Access-token gate for authenticated routes.

mod jwt_middleware;

pub use jwt_middleware::{AuthenticatedUser, JwtMiddleware};
