pub use log_utils::log_init;
// re-export the tracing macros so that dependent crates do not need to pull `tracing` themselves
pub use tracing::{debug, error, info, trace, warn};

mod log_utils;
