//! HTTP exchange: header codec, request building, the transaction state
//! machine and the projections of its outcome.

pub mod headers;
pub mod request;
pub mod requestbody;
pub mod response;
pub mod responsebody;
pub mod result;
pub mod streamfactory;
pub mod transaction;

// Re-exports for convenience
pub use headers::HeaderSet;
pub use request::{RequestParams, RequestSpec};
pub use requestbody::RequestBody;
pub use response::HttpResponse;
pub use responsebody::ResponseBody;
pub use result::TransactionResult;
