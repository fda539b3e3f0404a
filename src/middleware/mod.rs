pub mod request_id;
pub mod trusted_host;

pub use request_id::{make_span_with_request_id, request_id_middleware, RequestId};
pub use trusted_host::{trusted_host_middleware, TrustedHosts};
