use std::future;

use clap::Parser;
use focusguard::{
    cli::{Args, Command, PrivilegeMode, Settings, SettingsLoader, build_controller},
    error::GuardError,
    recovery::{self, SweepOutcome},
    session::{BlockingController, UNLOCK_PHRASE, confirm_unlock},
};

#[tokio::main]
async fn main() -> Result<(), GuardError> {
    env_logger::init();

    let args = Args::parse();
    let settings = SettingsLoader::load(&args)?;
    let controller = build_controller(&settings);

    match &args.command {
        Command::Setup => {
            let outcome = controller.bootstrap().await?;
            println!("{:?}: {}", outcome, controller.bootstrapper().paths().helper.display());
        }
        Command::Sweep => report_sweep(recovery::sweep(controller.editor()).await?),
        Command::Block(_) => run_block(&controller, &settings).await?,
        Command::Unlock { confirm } => {
            if !confirm_unlock(confirm) {
                return Err(GuardError::ConfirmationMismatch {
                    expected: UNLOCK_PHRASE,
                });
            }
            log::warn!("emergency unlock requested");
            report_sweep(recovery::sweep(controller.editor()).await?);
        }
        Command::Status => {
            let installed = controller.bootstrapper().is_installed();
            let domains = controller.editor().managed_domains().await?;
            println!("helper installed: {installed}");
            if domains.is_empty() {
                println!("no domains blocked in {}", settings.hosts_path.display());
            } else {
                println!("blocked domains: {}", domains.join(", "));
            }
        }
    }

    Ok(())
}

async fn run_block(controller: &BlockingController, settings: &Settings) -> Result<(), GuardError> {
    if settings.block.is_empty() {
        log::warn!("nothing to block; pass --domain, --app or --defaults");
        return Ok(());
    }

    match settings.mode {
        PrivilegeMode::Helper => {
            let report = controller.startup().await;
            if let Some(outcome) = report.sweep {
                report_sweep(outcome);
            }
        }
        PrivilegeMode::Direct => report_sweep(recovery::sweep(controller.editor()).await?),
    }

    controller.start_list(settings.block.clone()).await?;
    let status = controller.status();
    println!(
        "blocking {} domain(s) and {} app(s); press Ctrl-C to stop",
        status.blocked_domains.len(),
        status.blocked_apps.len()
    );

    let session = async {
        match settings.duration {
            Some(duration) => tokio::time::sleep(duration).await,
            None => future::pending::<()>().await,
        }
    };
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(err) = result {
                log::error!("failed to wait for Ctrl-C: {err}");
            }
        }
        _ = session => log::info!("focus session finished"),
    }

    controller.cleanup().await?;
    println!("blocking stopped");
    Ok(())
}

fn report_sweep(outcome: SweepOutcome) {
    match outcome {
        SweepOutcome::Clean => println!("hosts file is clean"),
        SweepOutcome::Repaired { domains } => {
            println!("removed leftover blocks: {}", domains.join(", "))
        }
    }
}
