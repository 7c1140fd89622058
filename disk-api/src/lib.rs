pub mod error;
pub use error::{ApiError, ApiErrorKind, Detail};
