use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{error, info, warn};
use std::path::PathBuf;

use timeblocker::{Config, GroupOrder, TableFormat};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Auto,
    Csv,
    Fsdb,
}

impl From<FormatArg> for TableFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Auto => TableFormat::Auto,
            FormatArg::Csv => TableFormat::Csv,
            FormatArg::Fsdb => TableFormat::Fsdb,
        }
    }
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Stack time blocks into non-overlapping lanes",
    after_help = "Example: timeblocker -t 3600 blocks.fsdb chart.png"
)]
struct Args {
    /// Table of time blocks sorted by begin time (stdin when absent or '-')
    input: Option<PathBuf>,

    /// Where to write the chart or table (stdout when absent or '-')
    output: Option<PathBuf>,

    /// Configuration file path
    #[arg(long = "config")]
    config: Option<PathBuf>,

    /// Begin and end column names
    #[arg(short = 'c', long = "time-columns", num_args = 2, value_names = ["BEGIN", "END"])]
    time_columns: Option<Vec<String>>,

    /// Time step in seconds between blocks
    #[arg(short = 't', long = "time-step")]
    time_step: Option<i64>,

    /// Idle time steps a lane must stay empty before it is reused
    #[arg(short = 'm', long = "min-time-block-offset")]
    min_time_block_offset: Option<u32>,

    /// Column whose sign selects the block color
    #[arg(short = 'p', long = "positive-column")]
    positive_column: Option<String>,

    /// Output the layout as a table instead of a chart
    #[arg(short = 'F', long = "output-table")]
    output_table: bool,

    /// Table format for input and output
    #[arg(long = "format", value_enum)]
    format: Option<FormatArg>,

    /// Sort input rows by begin time before laying them out
    #[arg(long = "sort")]
    sort: bool,

    /// Keep input order within blocks that start together instead of
    /// putting the longest first
    #[arg(long = "arrival-order")]
    arrival_order: bool,

    /// Log debug output
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some([begin, end]) = self.time_columns.as_deref() {
            config.input.time_columns = [begin.clone(), end.clone()];
        }
        if let Some(step) = self.time_step {
            config.layout.time_step = step;
        }
        if let Some(offset) = self.min_time_block_offset {
            config.layout.min_time_block_offset = offset;
        }
        if let Some(column) = &self.positive_column {
            config.input.positive_column = Some(column.clone());
        }
        if let Some(format) = self.format {
            config.input.format = format.into();
            config.output.format = format.into();
        }
        if self.output_table {
            config.output.as_table = true;
        }
        if self.sort {
            config.input.sort = true;
        }
        if self.arrival_order {
            config.layout.group_order = GroupOrder::Arrival;
        }
    }
}

fn main() {
    let args = Args::parse();

    // RUST_LOG wins; otherwise info, or debug with -v
    let default_level = if args.verbose { "debug" } else { "info" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .try_init();

    if let Err(e) = run(&args) {
        error!("Error: {e}");
        for cause in e.chain().skip(1) {
            error!("  caused by: {cause}");
        }
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };
    args.apply(&mut config);
    config.validate().context("invalid configuration")?;

    if !config.output.as_table && args.output.is_none() {
        warn!("No output file given, writing PNG to stdout");
    }

    let layout = timeblocker::run(&config, args.input.as_deref(), args.output.as_deref())
        .context("laying out time blocks")?;

    if let Some(path) = &args.output {
        info!("Layout written to: {}", path.display());
    }
    info!(
        "{} blocks, {} lanes, {} lane releases",
        layout.len(),
        layout.peak_lane(),
        layout.stats.releases
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_override_config() {
        let args = Args::parse_from([
            "timeblocker",
            "-c",
            "start",
            "stop",
            "-t",
            "2",
            "-m",
            "1",
            "-p",
            "sign",
            "-F",
            "--format",
            "fsdb",
            "--sort",
            "--arrival-order",
            "in.fsdb",
            "out.fsdb",
        ]);
        let mut config = Config::default();
        args.apply(&mut config);

        assert_eq!(config.input.time_columns, ["start", "stop"]);
        assert_eq!(config.layout.time_step, 2);
        assert_eq!(config.layout.min_time_block_offset, 1);
        assert_eq!(config.input.positive_column.as_deref(), Some("sign"));
        assert!(config.output.as_table);
        assert!(config.input.sort);
        assert_eq!(config.input.format, TableFormat::Fsdb);
        assert_eq!(config.output.format, TableFormat::Fsdb);
        assert_eq!(config.layout.group_order, GroupOrder::Arrival);
        assert_eq!(args.input, Some(PathBuf::from("in.fsdb")));
        assert_eq!(args.output, Some(PathBuf::from("out.fsdb")));
    }

    #[test]
    fn test_no_args_keep_defaults() {
        let args = Args::parse_from(["timeblocker"]);
        let mut config = Config::default();
        args.apply(&mut config);
        assert_eq!(config, Config::default());
        assert!(args.input.is_none());
    }

    #[test]
    fn test_time_columns_need_two_values() {
        assert!(Args::try_parse_from(["timeblocker", "-c", "start"]).is_err());
    }
}
