use crate::{
    allocate::{AllocatorOptions, GroupOrder},
    constants::{DEFAULT_BEGIN_COLUMN, DEFAULT_END_COLUMN, DEFAULT_TIME_STEP},
    error::{Result, TimeblockError},
    quantize::TimeStep,
    render::RenderOptions,
    table_reader::{ColumnSpec, TableFormat},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration, one section per pipeline stage
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub input: InputConfig,
    pub layout: LayoutConfig,
    pub output: OutputConfig,
    pub render: RenderOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputConfig {
    /// `[begin, end]` column names
    pub time_columns: [String; 2],
    /// Column holding the polarity used for coloring
    pub positive_column: Option<String>,
    pub format: TableFormat,
    /// Stable-sort records by quantized begin before allocation
    pub sort: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            time_columns: [
                DEFAULT_BEGIN_COLUMN.to_string(),
                DEFAULT_END_COLUMN.to_string(),
            ],
            positive_column: None,
            format: TableFormat::Auto,
            sort: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    /// Grid step in seconds
    pub time_step: i64,
    /// Idle steps before a lane can be reused
    pub min_time_block_offset: u32,
    pub group_order: GroupOrder,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            time_step: DEFAULT_TIME_STEP,
            min_time_block_offset: 0,
            group_order: GroupOrder::LongestFirst,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Write a table instead of a chart
    pub as_table: bool,
    /// Table encoding; `auto` mirrors the input
    pub format: TableFormat,
}

impl Config {
    /// Reads and validates a TOML config file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|source| TimeblockError::ReadConfig {
                path: path.to_path_buf(),
                source,
            })?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            TimeblockError::Config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        TimeStep::new(self.layout.time_step)?;

        let [begin, end] = &self.input.time_columns;
        if begin.trim().is_empty() || end.trim().is_empty() {
            return Err(TimeblockError::Config(
                "time_columns must name two non-empty columns".to_string(),
            ));
        }
        if begin == end {
            return Err(TimeblockError::Config(format!(
                "time_columns must be distinct, got '{}' twice",
                begin
            )));
        }
        if let Some(positive) = &self.input.positive_column
            && positive.trim().is_empty()
        {
            return Err(TimeblockError::Config(
                "positive_column cannot be empty".to_string(),
            ));
        }

        self.render.validate()?;
        Ok(())
    }

    pub fn time_step(&self) -> Result<TimeStep> {
        TimeStep::new(self.layout.time_step)
    }

    pub fn allocator_options(&self) -> Result<AllocatorOptions> {
        Ok(AllocatorOptions {
            time_step: self.time_step()?,
            min_time_block_offset: self.layout.min_time_block_offset,
            group_order: self.layout.group_order,
        })
    }

    pub fn columns(&self) -> ColumnSpec {
        let [begin, end] = self.input.time_columns.clone();
        ColumnSpec {
            begin,
            end,
            polarity: self.input.positive_column.clone(),
        }
    }
}
