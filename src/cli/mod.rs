pub mod args;
pub mod config;
pub mod loader;

use std::sync::Arc;

pub use args::{Args, BlockArgs, Command};
pub use config::{ConfigFile, PrivilegeMode};
pub use loader::{Settings, SettingsLoader};

use crate::{
    hosts::{DirectInstaller, HostsEditor, HostsInstaller, PrivilegedInstaller},
    monitor::{DesktopNotifier, ProcessMonitor},
    platform::{CommandRunner, SystemCommandRunner, native_platform},
    privilege::{Bootstrapper, Elevator, PrivilegeFlag, SystemElevator, elevate::ElevationMethod},
    session::BlockingController,
};

/// Wire the controller to the real OS
pub fn build_controller(settings: &Settings) -> BlockingController {
    let runner: Arc<dyn CommandRunner> = Arc::new(SystemCommandRunner);
    let platform = native_platform(Arc::clone(&runner));
    let flag = PrivilegeFlag::new();
    let elevator: Arc<dyn Elevator> = Arc::new(SystemElevator::new(
        Arc::clone(&runner),
        ElevationMethod::native(),
        settings.elevation_timeout,
    ));

    let installer: Arc<dyn HostsInstaller> = match settings.mode {
        PrivilegeMode::Helper => Arc::new(PrivilegedInstaller::new(
            &settings.hosts_path,
            &settings.privilege_paths.helper,
            flag.clone(),
            Arc::clone(&runner),
            Arc::clone(&elevator),
            Arc::clone(&platform),
        )),
        PrivilegeMode::Direct => Arc::new(DirectInstaller::new(
            &settings.hosts_path,
            Arc::clone(&platform),
        )),
    };

    let bootstrapper = Bootstrapper::new(
        settings.privilege_paths.clone(),
        &settings.hosts_path,
        Arc::clone(&platform),
        elevator,
        flag.clone(),
    );
    let monitor = ProcessMonitor::new(platform, Arc::new(DesktopNotifier::new(runner)));

    BlockingController::new(
        HostsEditor::new(&settings.hosts_path, installer),
        bootstrapper,
        monitor,
        flag,
    )
    .with_poll_interval(settings.poll_interval)
}
