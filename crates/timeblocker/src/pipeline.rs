use crate::{
    allocate::{AllocatorOptions, Layout, allocate},
    config::Config,
    emit::{LayoutSink, emit_layout},
    error::Result,
    export::{TableWriter, open_output},
    interval::RawInterval,
    quantize::quantize_all,
    render::ChartSink,
    table_reader::read_intervals,
};
use log::{debug, info};
use std::path::Path;

/// Quantizes `records` and assigns lanes. With `sort` set, records are
/// stable-sorted by quantized begin first; otherwise they must already be
/// in begin order.
pub fn build_layout(records: &[RawInterval], options: &AllocatorOptions, sort: bool) -> Layout {
    let mut intervals = quantize_all(records, options.time_step);
    if sort {
        intervals.sort_by_key(|i| i.begin);
    }
    allocate(intervals, options)
}

/// Reads `input`, lays it out and writes a table or chart to `output`.
/// `None` (or `-`) means stdin/stdout.
pub fn run(config: &Config, input: Option<&Path>, output: Option<&Path>) -> Result<Layout> {
    let options = config.allocator_options()?;
    let columns = config.columns();

    let table = read_intervals(input, &columns, config.input.format)?;
    info!("Loaded {} intervals", table.records.len());

    let layout = build_layout(&table.records, &options, config.input.sort);
    info!(
        "Placed {} intervals on {} lanes ({} groups, step {})",
        layout.len(),
        layout.peak_lane(),
        layout.stats.groups,
        options.time_step
    );

    let out = open_output(output)?;
    let mut sink: Box<dyn LayoutSink> = if config.output.as_table {
        let format = config.output.format.or(table.format);
        debug!("Writing layout as {:?} table", format);
        Box::new(TableWriter::new(out, format, &columns)?)
    } else {
        debug!("Rendering layout chart");
        Box::new(ChartSink::new(out, options.time_step, config.render))
    };
    emit_layout(&layout, &mut sink)?;

    Ok(layout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocate::GroupOrder;
    use crate::error::TimeblockError;
    use crate::quantize::TimeStep;
    use std::fs;
    use tempfile::TempDir;

    fn table_config() -> Config {
        let mut config = Config::default();
        config.layout.time_step = 2;
        config.output.as_table = true;
        config
    }

    #[test]
    fn test_build_layout_quantizes_first() {
        let records = [
            RawInterval::new(4.1, 5.5),
            RawInterval::new(5.8, 7.9),
            RawInterval::new(6.0, 8.1),
            RawInterval::new(6.0, 6.9),
        ];
        let options = AllocatorOptions {
            time_step: TimeStep::new(2).unwrap(),
            min_time_block_offset: 0,
            group_order: GroupOrder::Arrival,
        };
        let layout = build_layout(&records, &options, false);
        assert_eq!(
            layout.rows(),
            vec![[4, 6, 1], [4, 8, 2], [6, 10, 1], [6, 8, 3]]
        );
    }

    #[test]
    fn test_build_layout_sorts_when_asked() {
        let records = [RawInterval::new(6.0, 8.0), RawInterval::new(0.0, 2.0)];
        let options = AllocatorOptions {
            time_step: TimeStep::new(2).unwrap(),
            ..AllocatorOptions::default()
        };
        let sorted = build_layout(&records, &options, true);
        assert_eq!(sorted.rows(), vec![[0, 2, 1], [6, 8, 1]]);
        assert_eq!(sorted.stats.groups, 2);
    }

    #[test]
    #[cfg(not(windows))]
    fn test_run_csv_to_table() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("blocks.csv");
        let output = dir.path().join("layout.csv");
        fs::write(
            &input,
            "begin_time,end_time\n4,6\n4,8\n6,10\n6,8\n",
        )
        .unwrap();

        let layout = run(&table_config(), Some(&input), Some(&output)).unwrap();
        assert_eq!(layout.peak_lane(), 3);
        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "begin_time,end_time,height\n4,8,1\n4,6,2\n6,10,2\n6,8,3\n"
        );
    }

    #[test]
    fn test_run_fsdb_mirrors_input_format() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("blocks.fsdb");
        let output = dir.path().join("layout.fsdb");
        fs::write(&input, "#fsdb -F t start stop\n0\t3\n1\t2\n").unwrap();

        let mut config = table_config();
        config.input.time_columns = ["start".to_string(), "stop".to_string()];
        config.layout.group_order = GroupOrder::Arrival;
        run(&config, Some(&input), Some(&output)).unwrap();

        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "#fsdb -F t start stop height\n0\t4\t1\n0\t2\t2\n"
        );
    }

    #[test]
    fn test_run_reports_missing_column_before_writing() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("blocks.csv");
        let output = dir.path().join("layout.csv");
        fs::write(&input, "begin,end_time\n1,2\n").unwrap();

        let err = run(&table_config(), Some(&input), Some(&output)).unwrap_err();
        assert!(matches!(err, TimeblockError::MissingColumn { .. }));
        assert!(!output.exists());
    }

    #[test]
    fn test_run_renders_png() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("blocks.csv");
        let output = dir.path().join("chart.png");
        fs::write(
            &input,
            "begin_time,end_time,positive\n0,86400,1\n0,172800,-1\n",
        )
        .unwrap();

        let mut config = Config::default();
        config.input.positive_column = Some("positive".to_string());
        config.render.labels = false;
        let layout = run(&config, Some(&input), Some(&output)).unwrap();
        assert_eq!(layout.len(), 2);

        let image = image::open(&output).unwrap();
        assert_eq!(image.width(), config.render.width_px);
    }
}
