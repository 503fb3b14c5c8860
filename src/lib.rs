pub mod cli;
pub mod error;
pub mod hosts;
pub mod monitor;
pub mod platform;
pub mod policy;
pub mod privilege;
pub mod recovery;
pub mod session;
