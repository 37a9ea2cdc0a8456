pub mod access_log;
pub mod trace_id;

pub use access_log::access_log;
pub use trace_id::{trace_id_middleware, TraceId, TRACE_ID_HEADER};
