//! Batch entry point: run project files from the command line

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::thread;

use anyhow::Context;
use clap::Parser;
use log::{error, info};

use shearwave_runner::{write_output, Driver, ProgressSender, ProjectConfig};

#[derive(Parser, Debug)]
#[command(name = "shearwave", version, about = "One-dimensional site-response analysis")]
struct Args {
    /// Project files to run in sequence
    #[arg(long = "batch", required = true, num_args = 1.., value_name = "FILE")]
    batch: Vec<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut failed = false;

    for path in &args.batch {
        if let Err(err) = run_project(path) {
            error!("{}: {:#}", path.display(), err);
            failed = true;
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn run_project(path: &Path) -> anyhow::Result<()> {
    info!("starting batch run of {}", path.display());

    let config = ProjectConfig::from_file(path)
        .with_context(|| format!("failed to open project {}", path.display()))?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let motions = config.load_motions(base).context("failed to load motions")?;

    let mut driver = Driver::new(&config, motions)?;

    // Drain progress on a helper thread; the channel is lossy so the
    // computation never waits on it
    let (sender, receiver) = ProgressSender::channel(64);
    driver.set_progress(sender);
    let reporter = thread::spawn(move || {
        for progress in receiver {
            info!("progress: {} of {}", progress.current, progress.total);
        }
    });

    let outcome = match driver.run() {
        Ok(outcome) => outcome,
        Err(err) => {
            // Release the progress sender so the reporter can finish
            drop(driver);
            let _ = reporter.join();
            return Err(err.into());
        }
    };

    info!(
        "finished: {} computations, {} failed sites{}",
        outcome.completed,
        outcome.failed_sites,
        if outcome.cancelled { ", cancelled" } else { "" }
    );

    // Write the results next to the project file
    let prefix = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "results".to_string());

    for table in driver.catalog().tables() {
        let written = write_output(base, &prefix, table, config.units)?;
        info!("wrote {}", written.display());
    }

    drop(driver);
    let _ = reporter.join();

    Ok(())
}
