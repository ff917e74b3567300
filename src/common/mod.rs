pub mod context;
pub mod response;

pub use context::{RequestContext, new_correlation_id};
pub use response::{ErrorContractPayload, ErrorEntry};
