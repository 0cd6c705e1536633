pub mod check;
pub mod heartbeat;

pub use check::{run_check_cycle, CheckWorker};
pub use heartbeat::HeartbeatWorker;
