pub mod allocate;
pub mod config;
pub mod constants;
pub mod emit;
pub mod error;
pub mod export;
pub mod interval;
pub mod pipeline;
pub mod quantize;
pub mod render;
pub mod table_reader;

pub use allocate::{
    AllocationStats, AllocatorOptions, GroupOrder, LaneAllocator, Layout, OccupancyMap, allocate,
};
pub use config::Config;
pub use emit::{LayoutSink, emit_layout};
pub use error::{Result, TimeblockError};
pub use export::TableWriter;
pub use interval::{Interval, LanedInterval, RawInterval};
pub use pipeline::{build_layout, run};
pub use quantize::TimeStep;
pub use render::{ChartSink, RenderOptions};
pub use table_reader::{ColumnSpec, IntervalTable, TableFormat, read_intervals};
