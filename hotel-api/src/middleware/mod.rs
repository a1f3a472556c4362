//! HTTP middleware: per-client rate limiting, panic recovery, request ids,
//! header masking

pub mod panic;
pub mod rate_limit;
pub mod request_tracking;

pub use panic::{catch_panic_layer, PanicHandler};
pub use rate_limit::{client_ip, rate_limit, run_sweeper, ClientRateLimiter, IpRateLimiter};
pub use request_tracking::{
    request_id_layer, request_id_propagation_layer, sensitive_headers_layer, REQUEST_ID_HEADER,
    SENSITIVE_HEADERS,
};
