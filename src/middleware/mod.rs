pub mod auth;
pub mod extract;
pub mod tracing;

pub use auth::USER_ID_HEADER;
pub use extract::{JsonBody, PathParams};
pub use self::tracing::observability_middleware;
