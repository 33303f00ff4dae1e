//! Repeated runs of one parameter combination.

use tracing::debug;

use crate::client::BenchmarkService;
use crate::error::{BenchError, Result};
use crate::params::TestParameters;
use crate::ui::{RunPhase, Ui};

/// Averaged timings of the measured runs of one combination.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateResult {
    /// Mean list build time in microseconds.
    pub avg_build_micros: f64,
    /// Mean execution time in microseconds.
    pub avg_exec_micros: f64,
    /// Measured runs whose timings went into the means.
    pub samples: u32,
    /// Measured runs that reported no timings, e.g. a non-2xx answer.
    pub failed: u32,
}

impl AggregateResult {
    /// Sum of the two means.
    pub fn avg_total_micros(&self) -> f64 {
        self.avg_build_micros + self.avg_exec_micros
    }
}

/// Runs `warmup` discarded iterations, then `measured` iterations whose
/// timings are averaged.
///
/// Iterations that report no timings are counted in
/// [`AggregateResult::failed`] and left out of the means. When none of them
/// reported timings, both means are zero. Transport errors abort the run.
pub fn run_combination<S>(
    service: &mut S,
    ui: &Ui,
    warmup: u32,
    measured: u32,
    params: &TestParameters,
) -> Result<AggregateResult>
where
    S: BenchmarkService + ?Sized,
{
    if measured == 0 {
        return Err(BenchError::NoMeasuredRuns);
    }
    ui.combination(params);

    for index in 0..warmup {
        let result = service.start_test(params)?;
        ui.iteration(RunPhase::Warmup, index, &result);
    }

    let mut build_sum = 0u128;
    let mut exec_sum = 0u128;
    let mut samples = 0u32;
    for index in 0..measured {
        let result = service.start_test(params)?;
        ui.iteration(RunPhase::Measured, index, &result);
        match result.timings() {
            Some((build, exec)) => {
                build_sum += u128::from(build);
                exec_sum += u128::from(exec);
                samples += 1;
            }
            None => debug!(status = result.http_status, "measured run without timings"),
        }
    }

    let (avg_build_micros, avg_exec_micros) = if samples == 0 {
        (0.0, 0.0)
    } else {
        (
            build_sum as f64 / f64::from(samples),
            exec_sum as f64 / f64::from(samples),
        )
    };
    Ok(AggregateResult {
        avg_build_micros,
        avg_exec_micros,
        samples,
        failed: measured - samples,
    })
}
