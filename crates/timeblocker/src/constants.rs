/// Default column names for interval bounds
pub const DEFAULT_BEGIN_COLUMN: &str = "begin_time";
pub const DEFAULT_END_COLUMN: &str = "end_time";

/// Column appended to tabular output
pub const HEIGHT_COLUMN: &str = "height";

/// Default grid step in seconds (one day)
pub const DEFAULT_TIME_STEP: i64 = 86_400;

/// Largest magnitude accepted for an input value (2^53, exact in f64)
pub const MAX_ABS_VALUE: f64 = 9_007_199_254_740_992.0;

/// Polarity assumed when no polarity column is configured
pub const DEFAULT_POLARITY: f64 = 1.0;

/// FSDB header prefix and tab-separator flag
pub const FSDB_MAGIC: &str = "#fsdb";
pub const FSDB_TAB_SEPARATOR: &str = "-F t";

/// Chart settings (pixels)
pub const DEFAULT_WIDTH_PX: u32 = 1200;
pub const DEFAULT_LANE_HEIGHT_PX: u32 = 24;
pub const DEFAULT_MARGIN_PX: u32 = 48;
pub const FONT_SIZE: f32 = 14.0;
pub const AXIS_TICKS: usize = 6;

/// Share of a time step left blank at the right edge of each block
pub const DEFAULT_GAP_STEPS: f64 = 0.5;
