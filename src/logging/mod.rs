//! Console and per-command log file output.

mod logger;
mod subscriber;
mod utils;

pub use logger::Logger;
pub use subscriber::{LOG_ENV, init_subscriber};
pub use utils::LOG_DIR_ENV;
