pub mod attendance;
pub mod progress;
