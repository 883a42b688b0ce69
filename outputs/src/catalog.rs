//! Collection of extracted series across the computation grid

use log::debug;
use serde::{Deserialize, Serialize};

use shearwave_numerics::log_space;

use crate::extract::{extract, ExtractContext};
use crate::kind::OutputKind;
use crate::statistics::OutputStatistics;
use crate::{OutputError, Result};

/// Shared axis configuration for the spectral outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Periods of the response spectra, in seconds
    pub periods: Vec<f64>,
    /// Oscillator damping in percent
    pub damping: f64,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            periods: log_space(0.01, 10.0, 91),
            damping: 5.0,
        }
    }
}

/// One extracted series of a single (site, motion) pair.
#[derive(Debug, Clone)]
pub struct OutputSeries {
    pub site: usize,
    pub motion: usize,
    pub data: Vec<f64>,
    pub converged: bool,
    /// Disabled series are kept but excluded from statistics
    pub enabled: bool,
}

/// All series collected for one output kind.
#[derive(Debug, Clone)]
pub struct OutputTable {
    kind: OutputKind,
    reference: Vec<f64>,
    series: Vec<OutputSeries>,
    statistics: Option<OutputStatistics>,
}

impl OutputTable {
    fn new(kind: OutputKind) -> Self {
        Self {
            kind,
            reference: Vec::new(),
            series: Vec::new(),
            statistics: None,
        }
    }

    pub fn kind(&self) -> &OutputKind {
        &self.kind
    }

    pub fn reference(&self) -> &[f64] {
        &self.reference
    }

    pub fn series(&self) -> &[OutputSeries] {
        &self.series
    }

    pub fn statistics(&self) -> Option<&OutputStatistics> {
        self.statistics.as_ref()
    }
}

/// Collects extractor results over the (site, motion) grid and finalizes
/// them into ensemble statistics.
///
/// The reference axis of every table is fixed by the first extraction;
/// subsequent extractions must agree on its length. A failed site can be
/// rewound, dropping every series it contributed.
#[derive(Debug, Clone, Default)]
pub struct OutputCatalog {
    settings: OutputSettings,
    tables: Vec<OutputTable>,
}

impl OutputCatalog {
    pub fn new(kinds: Vec<OutputKind>, settings: OutputSettings) -> Self {
        Self {
            settings,
            tables: kinds.into_iter().map(OutputTable::new).collect(),
        }
    }

    pub fn settings(&self) -> &OutputSettings {
        &self.settings
    }

    pub fn tables(&self) -> &[OutputTable] {
        &self.tables
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Extract and store every output for one completed (site, motion)
    /// computation.
    pub fn save_results(
        &mut self,
        site: usize,
        motion_index: usize,
        converged: bool,
        ctx: &ExtractContext,
    ) -> Result<()> {
        for table in &mut self.tables {
            if table.kind.motion_independent() && motion_index > 0 {
                continue;
            }

            let (reference, data) = extract(&table.kind, ctx)?;

            if table.reference.is_empty() {
                table.reference = reference;
            } else if table.reference.len() != data.len() {
                return Err(OutputError::ReferenceMismatch {
                    name: table.kind.name().to_string(),
                    reference: table.reference.len(),
                    data: data.len(),
                });
            }

            table.series.push(OutputSeries {
                site,
                motion: motion_index,
                data,
                converged,
                enabled: true,
            });
        }

        Ok(())
    }

    /// Drop every series contributed by a site, rewinding a failed
    /// realization.
    pub fn remove_site(&mut self, site: usize) {
        debug!("removing results of site {}", site);
        for table in &mut self.tables {
            table.series.retain(|series| series.site != site);
        }
    }

    /// Compute the ensemble statistics.
    ///
    /// With `only_converged` set, non-converged series are disabled first
    /// and excluded from the statistics.
    pub fn finalize(&mut self, only_converged: bool) {
        for table in &mut self.tables {
            if only_converged {
                for series in &mut table.series {
                    if !series.converged {
                        series.enabled = false;
                    }
                }
            }

            table.statistics = table.kind.distribution().and_then(|distribution| {
                OutputStatistics::calculate(table.reference.len(), &table.series, distribution)
            });

            if table.statistics.is_none() && table.kind.distribution().is_some() {
                debug!(
                    "not enough series for statistics of \"{}\"",
                    table.kind.name()
                );
            }
        }
    }
}
