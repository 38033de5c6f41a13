//! CLI command implementations.

mod doctor;
mod init;
mod serve;

pub use doctor::run_doctor;
pub use init::run_init;
pub use serve::run_serve;
