//! Binary entry point for the datastore benchmark campaign driver.
#![forbid(unsafe_code)]

use std::error::Error;
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use dsbench::{
    client::RestconfClient,
    config::{
        FileConfig, SweepConfig, SweepOverrides, TargetConfig, TargetOverrides, DEFAULT_OUTPUT,
    },
    logging::init_logging,
    params::{DataFormat, Datastore, Operation, TestKind, TxType},
    report::ReportWriter,
    sweep::Sweep,
    ui::{format_duration, Theme, Ui},
};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "dsbench",
    version,
    about = "Datastore benchmarking campaign driver",
    long_about = "Runs a matrix of dsbenchmark tests against a RESTCONF endpoint, \
                  averages the reported timings and writes them to a CSV report."
)]
struct Cli {
    #[arg(long, help = "Host running the benchmark service")]
    host: Option<String>,

    #[arg(long, help = "RESTCONF port of the target host")]
    port: Option<u16>,

    #[arg(long, env = "DSBENCH_USER", help = "Basic-auth user")]
    user: Option<String>,

    #[arg(
        long,
        env = "DSBENCH_PASSWORD",
        hide_env_values = true,
        help = "Basic-auth password"
    )]
    password: Option<String>,

    #[arg(long, value_name = "SECS", help = "Per-request timeout (default: none)")]
    timeout_secs: Option<u64>,

    #[arg(long, value_enum, num_args = 1.., help = "Transaction types to execute")]
    txtype: Vec<TxType>,

    #[arg(long, help = "Total number of elements to process")]
    total: Option<u64>,

    #[arg(long, num_args = 1.., help = "Inner list sizes for the DATA-FORMAT test")]
    inner: Vec<u64>,

    #[arg(long, num_args = 1.., help = "Operations per transaction for the OPS-PER-TX test")]
    ops: Vec<u64>,

    #[arg(long, value_enum, num_args = 1.., help = "Operation types to execute")]
    optype: Vec<Operation>,

    #[arg(long, value_enum, num_args = 1.., help = "Data formats to execute")]
    format: Vec<DataFormat>,

    #[arg(long, value_enum, num_args = 1.., help = "Tests to execute")]
    test: Vec<TestKind>,

    #[arg(long, value_enum, num_args = 1.., help = "Datastores to exercise")]
    datastore: Vec<Datastore>,

    #[arg(long, help = "Warmup runs before the measured runs")]
    warmup: Option<u32>,

    #[arg(long, help = "Measured runs; reported results average these")]
    runs: Option<u32>,

    #[arg(long, value_name = "FILE", help = "CSV report path [default: test.csv]")]
    output: Option<PathBuf>,

    #[arg(long, env = "DSBENCH_CONFIG", value_name = "FILE", help = "TOML config file")]
    config: Option<PathBuf>,

    #[arg(
        long,
        env = "DSBENCH_LOG",
        default_value = "warn",
        help = "Log filter directive for stderr diagnostics"
    )]
    log_level: String,

    #[arg(long, value_enum, default_value_t = Theme::Auto, help = "Console color theme")]
    theme: Theme,

    #[arg(long, help = "Only print headings, rates and errors")]
    quiet: bool,
}

impl Cli {
    fn target_overrides(&self) -> TargetOverrides {
        TargetOverrides {
            host: self.host.clone(),
            port: self.port,
            username: self.user.clone(),
            password: self.password.clone(),
            timeout_secs: self.timeout_secs,
        }
    }

    fn sweep_overrides(&self) -> SweepOverrides {
        SweepOverrides {
            tx_types: Some(self.txtype.clone()),
            total_elements: self.total,
            inner_elements: Some(self.inner.clone()),
            ops_per_tx: Some(self.ops.clone()),
            operations: Some(self.optype.clone()),
            data_formats: Some(self.format.clone()),
            tests: Some(self.test.clone()),
            datastores: Some(self.datastore.clone()),
            warmup_runs: self.warmup,
            measured_runs: self.runs,
        }
    }
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let file = FileConfig::load(cli.config.as_deref())?;
    let mut target = TargetConfig::default();
    target.apply(&file.target);
    target.apply(&cli.target_overrides());
    target.validate()?;

    let mut sweep = SweepConfig::default();
    sweep.apply(&file.sweep);
    sweep.apply(&cli.sweep_overrides());
    sweep.validate()?;

    let output = cli
        .output
        .clone()
        .or(file.output)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));
    info!(
        url = %target.base_url(),
        requests = sweep.planned_requests(),
        output = %output.display(),
        "starting benchmark campaign"
    );

    let ui = Ui::new(cli.theme, cli.quiet);
    let mut client = RestconfClient::new(&target)?;
    let mut report = ReportWriter::create(&output)?;

    let started = Instant::now();
    ui.info(&format!("Start time: {}", OffsetDateTime::now_utc().format(&Rfc3339)?));

    let summary = Sweep::new(&mut client, &mut report, &ui, &sweep).run()?;
    let (headers, rows) = (report.header_rows(), report.data_rows());
    report.finish()?;

    ui.info(&format!("End time: {}", OffsetDateTime::now_utc().format(&Rfc3339)?));
    ui.info(&format!(
        "Total execution time: {}",
        format_duration(started.elapsed())
    ));
    ui.info(&format!(
        "{} combinations, {rows} data rows and {headers} section rows written to {}",
        summary.combinations,
        output.display()
    ));
    if summary.failed_runs > 0 {
        ui.warn(&format!(
            "{} measured runs reported no timings",
            summary.failed_runs
        ));
    }
    Ok(())
}
