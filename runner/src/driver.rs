//! The (site × motion) batch loop

use log::{info, warn};

use shearwave_motion::TimeSeriesMotion;
use shearwave_outputs::{ExtractContext, OutputCatalog, OutputSettings};
use shearwave_profile::Profile;
use shearwave_solver::{CancelToken, SiteResponseCalculator, SolverError};

use crate::config::ProjectConfig;
use crate::progress::ProgressSender;
use crate::{Result, RunnerError};

/// Result of a batch run.
#[derive(Debug, Clone, Copy)]
pub struct DriverOutcome {
    /// Completed (site, motion) computations
    pub completed: usize,
    /// Sites discarded because of propagation failures
    pub failed_sites: usize,
    /// Whether the run was cancelled before finishing
    pub cancelled: bool,
}

/// Runs every (site realization, motion) pair of a project and collects the
/// outputs.
///
/// Within one pair the computation is sequential; failures of a single pair
/// discard the site and the batch continues. The cancel token is honored
/// between pairs and inside the calculator's iteration loop.
pub struct Driver {
    profile: Profile,
    motions: Vec<TimeSeriesMotion>,
    calculator: SiteResponseCalculator,
    catalog: OutputCatalog,
    settings: OutputSettings,
    site_count: usize,
    only_converged: bool,
    cancel: CancelToken,
    progress: Option<ProgressSender>,
}

impl Driver {
    /// Build a driver from a project, with motions already loaded.
    pub fn new(config: &ProjectConfig, motions: Vec<TimeSeriesMotion>) -> Result<Self> {
        if motions.is_empty() {
            return Err(RunnerError::NoMotions);
        }

        Ok(Self {
            profile: config.profile.build(config.units)?,
            motions,
            calculator: config.calculator.build(),
            catalog: config.build_catalog(),
            settings: config.output_settings.clone(),
            site_count: config.site_count.max(1),
            only_converged: config.only_converged,
            cancel: CancelToken::new(),
            progress: None,
        })
    }

    /// Token that cancels the run at the next pair boundary.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn set_progress(&mut self, progress: ProgressSender) {
        self.progress = Some(progress);
    }

    pub fn catalog(&self) -> &OutputCatalog {
        &self.catalog
    }

    pub fn motions(&self) -> &[TimeSeriesMotion] {
        &self.motions
    }

    /// Run the whole batch and finalize the statistics over whatever
    /// completed.
    pub fn run(&mut self) -> Result<DriverOutcome> {
        let total = self.site_count * self.motions.len();
        let mut outcome = DriverOutcome {
            completed: 0,
            failed_sites: 0,
            cancelled: false,
        };

        info!(
            "{} trials ({} sites and {} motions)",
            total,
            self.site_count,
            self.motions.len()
        );
        self.emit_progress(0, total);

        'sites: for site in 0..self.site_count {
            if self.cancel.is_cancelled() {
                outcome.cancelled = true;
                break;
            }

            info!("[{} of {}] generating site profile", site + 1, self.site_count);
            self.profile.discretize()?;

            for motion_index in 0..self.motions.len() {
                if self.cancel.is_cancelled() {
                    outcome.cancelled = true;
                    break 'sites;
                }

                info!(
                    "\t[{} of {}] computing site response for motion: {}",
                    motion_index + 1,
                    self.motions.len(),
                    self.motions[motion_index].name()
                );

                let summary = match self.calculator.run(
                    &self.motions[motion_index],
                    &mut self.profile,
                    &self.cancel,
                ) {
                    Ok(summary) => summary,
                    Err(error) if error.is_propagation_failure() => {
                        warn!("wave propagation error, removing site: {}", error);
                        self.catalog.remove_site(site);
                        outcome.failed_sites += 1;
                        self.profile.reset_sub_layers();
                        continue 'sites;
                    }
                    Err(SolverError::Cancelled) => {
                        outcome.cancelled = true;
                        break 'sites;
                    }
                    Err(error) => return Err(error.into()),
                };

                self.catalog.save_results(
                    site,
                    motion_index,
                    summary.converged,
                    &ExtractContext {
                        calc: &self.calculator,
                        motion: &self.motions[motion_index],
                        profile: &self.profile,
                        settings: &self.settings,
                    },
                )?;

                outcome.completed += 1;
                self.emit_progress(outcome.completed, total);

                // The next motion starts from the initial properties
                self.profile.reset_sub_layers();
            }
        }

        info!("computing statistics over {} results", outcome.completed);
        self.catalog.finalize(self.only_converged);

        // Close the progress stream so observers see the end of the run
        self.progress = None;

        Ok(outcome)
    }

    fn emit_progress(&self, current: usize, total: usize) {
        if let Some(progress) = &self.progress {
            progress.send(current, total);
        }
    }
}
