/// Custom middleware: JWT authentication and request logging.

mod jwt_middleware;
mod request_logger;

pub use jwt_middleware::JwtAuth;
pub use request_logger::RequestLogger;
