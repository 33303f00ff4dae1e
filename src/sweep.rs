//! The two test matrices of a campaign.
//!
//! Both walk the categorical dimensions in the same order: transaction type,
//! data format, operation, datastore. A section header is written to the
//! report for every level entered. The innermost level differs:
//!
//! * `DATA-FORMAT` varies the inner list size at one operation per
//!   transaction, with `outer = total / inner` (integer division).
//! * `OPS-PER-TX` varies operations per transaction over a flat list of
//!   `total` single-element entries.

use std::io::Write;

use tracing::{debug, info};

use crate::aggregate::{run_combination, AggregateResult};
use crate::client::BenchmarkService;
use crate::config::SweepConfig;
use crate::error::Result;
use crate::params::{TestKind, TestParameters};
use crate::report::ReportWriter;
use crate::ui::{Level, Ui};

const USEC_PER_SEC: f64 = 1_000_000.0;

/// Derived throughput of one combination, in units per second.
///
/// `None` means the measured execution time was not a usable divisor
/// (zero, negative or not finite).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThroughputRates {
    /// Transactions per second.
    pub transaction_rate: Option<f64>,
    /// Element updates per second.
    pub update_rate: Option<f64>,
}

impl ThroughputRates {
    /// Rates for `transactions` transactions carrying `updates` element
    /// updates that took `avg_exec_micros` on average.
    pub fn compute(transactions: u64, updates: u64, avg_exec_micros: f64) -> Self {
        let per_second = |count: u64| {
            if avg_exec_micros.is_finite() && avg_exec_micros > 0.0 {
                let rate = count as f64 * USEC_PER_SEC / avg_exec_micros;
                rate.is_finite().then_some(rate)
            } else {
                None
            }
        };
        Self {
            transaction_rate: per_second(transactions),
            update_rate: per_second(updates),
        }
    }
}

/// Innermost point of a test matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf {
    /// Label written in the report's first data column.
    pub label: String,
    /// Elements in the outer list.
    pub outer_elements: u64,
    /// Elements in each inner list.
    pub inner_elements: u64,
    /// Operations per transaction.
    pub ops_per_tx: u64,
    /// Transactions the service submits for this shape.
    pub transactions: u64,
}

/// Innermost points of `kind` under `config`, in report order.
pub fn leaves(kind: TestKind, config: &SweepConfig) -> Vec<Leaf> {
    let total = config.total_elements;
    match kind {
        TestKind::DataFormat => config
            .inner_elements
            .iter()
            .map(|&inner| {
                let outer = total / inner;
                Leaf {
                    label: format!("{outer}/{inner}"),
                    outer_elements: outer,
                    inner_elements: inner,
                    ops_per_tx: 1,
                    transactions: outer,
                }
            })
            .collect(),
        TestKind::OpsPerTx => config
            .ops_per_tx
            .iter()
            .map(|&ops| Leaf {
                label: ops.to_string(),
                outer_elements: total,
                inner_elements: 1,
                ops_per_tx: ops,
                transactions: total / ops,
            })
            .collect(),
    }
}

/// Totals of a finished campaign.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    /// Combinations measured.
    pub combinations: usize,
    /// Measured runs that reported no timings.
    pub failed_runs: u64,
}

/// Drives a campaign against one service into one report.
pub struct Sweep<'a, S: ?Sized, W: Write> {
    service: &'a mut S,
    report: &'a mut ReportWriter<W>,
    ui: &'a Ui,
    config: &'a SweepConfig,
}

impl<'a, S, W> Sweep<'a, S, W>
where
    S: BenchmarkService + ?Sized,
    W: Write,
{
    /// Binds the collaborators of a campaign.
    pub fn new(
        service: &'a mut S,
        report: &'a mut ReportWriter<W>,
        ui: &'a Ui,
        config: &'a SweepConfig,
    ) -> Self {
        Self {
            service,
            report,
            ui,
            config,
        }
    }

    /// Resets the service once, then runs every selected test matrix.
    ///
    /// `DATA-FORMAT` always runs before `OPS-PER-TX`, whatever order the
    /// tests were selected in.
    pub fn run(&mut self) -> Result<SweepSummary> {
        let task = self.ui.task("cleaning up the benchmark datastore");
        let status = self.service.cleanup_store()?;
        let elapsed = task.finish();
        debug!(status, ?elapsed, "cleanup-store finished");
        self.ui.info(&format!("cleanup-store: HTTP {status}"));

        let mut summary = SweepSummary::default();
        for kind in TestKind::ALL {
            if self.config.tests.contains(kind) {
                self.run_test(*kind, &mut summary)?;
            }
        }
        Ok(summary)
    }

    fn run_test(&mut self, kind: TestKind, summary: &mut SweepSummary) -> Result<()> {
        let title = match kind {
            TestKind::DataFormat => "Tx type, data format & data structure",
            TestKind::OpsPerTx => "Puts per tx",
        };
        info!(test = %kind, "starting test matrix");
        self.ui.banner(title);
        let leaves = leaves(kind, self.config);
        let config = self.config;

        for &tx_type in &config.tx_types {
            self.ui.level(Level::TxType, tx_type);
            self.report.section(0, tx_type)?;
            for &data_format in &config.data_formats {
                self.ui.level(Level::DataFormat, data_format);
                self.report.section(1, data_format)?;
                for &operation in &config.operations {
                    self.ui.level(Level::Operation, operation);
                    self.report.section(2, operation)?;
                    for &datastore in &config.datastores {
                        self.ui.level(Level::Datastore, datastore);
                        self.report.section(3, datastore)?;
                        for leaf in &leaves {
                            let params = TestParameters {
                                tx_type,
                                operation,
                                data_format,
                                datastore,
                                outer_elements: leaf.outer_elements,
                                inner_elements: leaf.inner_elements,
                                ops_per_tx: leaf.ops_per_tx,
                            };
                            let aggregate = self.measure(&params)?;
                            let rates = ThroughputRates::compute(
                                leaf.transactions,
                                config.total_elements,
                                aggregate.avg_exec_micros,
                            );
                            self.report.data_row(&leaf.label, &aggregate, &rates)?;
                            self.ui.rates(rates.transaction_rate, rates.update_rate);
                            summary.combinations += 1;
                            summary.failed_runs += u64::from(aggregate.failed);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn measure(&mut self, params: &TestParameters) -> Result<AggregateResult> {
        let aggregate = run_combination(
            &mut *self.service,
            self.ui,
            self.config.warmup_runs,
            self.config.measured_runs,
            params,
        )?;
        if aggregate.failed > 0 {
            self.ui.warn(&format!(
                "{} of {} measured runs reported no timings",
                aggregate.failed, self.config.measured_runs
            ));
        }
        Ok(aggregate)
    }
}
