pub mod editor;
pub mod install;
pub mod region;

pub use editor::{DEFAULT_HOSTS_PATH, HostsEditor};
pub use install::{DirectInstaller, HostsInstaller, PrivilegedInstaller};
