//! PNG timeline chart: one rectangle per laned interval.

pub mod axis;
pub mod colors;

use crate::{
    constants::{
        AXIS_TICKS, DEFAULT_GAP_STEPS, DEFAULT_LANE_HEIGHT_PX, DEFAULT_MARGIN_PX,
        DEFAULT_WIDTH_PX, FONT_SIZE,
    },
    emit::LayoutSink,
    error::{Result, TimeblockError},
    interval::LanedInterval,
    quantize::TimeStep,
};
use colors::{Colors, block_colors};

use ab_glyph::{FontVec, PxScale};
use font_kit::{family_name::FamilyName, properties::Properties, source::SystemSource};
use image::{ImageBuffer, ImageFormat, Rgb, RgbImage};
use imageproc::{
    drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut, draw_text_mut},
    rect::Rect,
};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Write};

/// Chart dimensions
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderOptions {
    pub width_px: u32,
    pub lane_height_px: u32,
    pub margin_px: u32,
    /// Blank space at the end of each block, in time steps
    pub gap_steps: f64,
    /// Axis labels need a system font; without one they are skipped
    pub labels: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width_px: DEFAULT_WIDTH_PX,
            lane_height_px: DEFAULT_LANE_HEIGHT_PX,
            margin_px: DEFAULT_MARGIN_PX,
            gap_steps: DEFAULT_GAP_STEPS,
            labels: true,
        }
    }
}

impl RenderOptions {
    pub fn validate(&self) -> Result<()> {
        if self.lane_height_px == 0 {
            return Err(TimeblockError::Config(
                "render.lane_height_px must be positive".to_string(),
            ));
        }
        if self.width_px <= self.margin_px.saturating_mul(2) {
            return Err(TimeblockError::Config(format!(
                "render.width_px ({}) must exceed twice the margin ({})",
                self.width_px, self.margin_px
            )));
        }
        if !self.gap_steps.is_finite() || self.gap_steps < 0.0 {
            return Err(TimeblockError::Config(format!(
                "render.gap_steps must be a non-negative number, got {}",
                self.gap_steps
            )));
        }
        Ok(())
    }
}

/// Drawing context
pub struct Renderer {
    pub image: RgbImage,
    pub font: Option<FontVec>,
}

impl Renderer {
    pub fn new(width: u32, height: u32, font: Option<FontVec>) -> Self {
        let image = ImageBuffer::from_pixel(width, height, Colors::WHITE);
        Self { image, font }
    }

    /// Filled rectangle; sizes below one pixel are widened to one
    pub fn draw_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Rgb<u8>) {
        draw_filled_rect_mut(&mut self.image, pixel_rect(x, y, width, height), color);
    }

    pub fn draw_rect_outline(&mut self, x: f64, y: f64, width: f64, height: f64, color: Rgb<u8>) {
        draw_hollow_rect_mut(&mut self.image, pixel_rect(x, y, width, height), color);
    }

    pub fn draw_line(&mut self, from: (f64, f64), to: (f64, f64), color: Rgb<u8>) {
        draw_line_segment_mut(
            &mut self.image,
            (from.0 as f32, from.1 as f32),
            (to.0 as f32, to.1 as f32),
            color,
        );
    }

    /// No-op without a font
    pub fn draw_text(&mut self, x: f64, y: f64, text: &str, color: Rgb<u8>) {
        if let Some(font) = &self.font {
            draw_text_mut(
                &mut self.image,
                color,
                x as i32,
                y as i32,
                PxScale::from(FONT_SIZE),
                font,
                text,
            );
        }
    }

    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }
}

fn pixel_rect(x: f64, y: f64, width: f64, height: f64) -> Rect {
    Rect::at(x.round() as i32, y.round() as i32)
        .of_size(width.round().max(1.0) as u32, height.round().max(1.0) as u32)
}

/// Looks for a usable sans-serif system font
pub fn load_system_font() -> Option<FontVec> {
    let source = SystemSource::new();
    let font_families = [
        FamilyName::Title("DejaVu Sans".to_string()),
        FamilyName::Title("Arial".to_string()),
        FamilyName::Title("Helvetica".to_string()),
        FamilyName::SansSerif,
    ];

    for family in font_families {
        if let Ok(handle) = source.select_best_match(&[family], &Properties::new())
            && let Ok(font_kit_font) = handle.load()
            && let Some(font_bytes) = font_kit_font.copy_font_data()
            && let Ok(font) = FontVec::try_from_vec(font_bytes.to_vec())
        {
            return Some(font);
        }
    }
    None
}

/// Maps time and lanes onto pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartFrame {
    pub t_min: i64,
    pub t_max: i64,
    pub peak_lane: u32,
    pub options: RenderOptions,
}

impl ChartFrame {
    pub fn fit(blocks: &[LanedInterval], step: TimeStep, options: RenderOptions) -> Self {
        let t_min = blocks.iter().map(LanedInterval::begin).min().unwrap_or(0);
        let t_max = blocks.iter().map(LanedInterval::end).max().unwrap_or(t_min);
        let t_max = if t_max > t_min {
            t_max
        } else {
            t_min.saturating_add(step.get())
        };
        let peak_lane = blocks.iter().map(|b| b.lane).max().unwrap_or(0);
        Self {
            t_min,
            t_max,
            peak_lane,
            options,
        }
    }

    pub fn width(&self) -> u32 {
        self.options.width_px
    }

    /// Room for `peak_lane + 1` lanes between the margins
    pub fn height(&self) -> u32 {
        let lanes = self.peak_lane.saturating_add(1);
        self.options
            .margin_px
            .saturating_mul(2)
            .saturating_add(lanes.saturating_mul(self.options.lane_height_px))
    }

    fn plot_width(&self) -> f64 {
        f64::from(
            self.options
                .width_px
                .saturating_sub(self.options.margin_px.saturating_mul(2)),
        )
    }

    pub fn x_px(&self, t: f64) -> f64 {
        let frac = (t - self.t_min as f64) / (self.t_max as f64 - self.t_min as f64);
        f64::from(self.options.margin_px) + frac * self.plot_width()
    }

    /// Top edge of a lane; lane 1 rests on the time axis and one empty lane
    /// of headroom stays above the highest one
    pub fn lane_top_px(&self, lane: u32) -> f64 {
        let lanes_from_top = f64::from(self.peak_lane) + 1.0 - f64::from(lane);
        f64::from(self.options.margin_px)
            + lanes_from_top * f64::from(self.options.lane_height_px)
    }

    pub fn axis_y_px(&self) -> f64 {
        f64::from(self.height().saturating_sub(self.options.margin_px))
    }
}

/// Layout sink that buffers blocks and writes a PNG chart on finish
pub struct ChartSink<W: Write> {
    out: W,
    step: TimeStep,
    options: RenderOptions,
    blocks: Vec<LanedInterval>,
}

impl<W: Write> ChartSink<W> {
    pub fn new(out: W, step: TimeStep, options: RenderOptions) -> Self {
        Self {
            out,
            step,
            options,
            blocks: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn draw(&self) -> Renderer {
        let frame = ChartFrame::fit(&self.blocks, self.step, self.options);
        let font = if self.options.labels {
            let font = load_system_font();
            if font.is_none() {
                warn!("No system font found, drawing chart without labels");
            }
            font
        } else {
            None
        };

        let mut renderer = Renderer::new(frame.width(), frame.height(), font);
        draw_axes(&mut renderer, &frame, self.step);

        let gap = self.options.gap_steps * self.step.get() as f64;
        let lane_h = f64::from(self.options.lane_height_px);
        for block in &self.blocks {
            let begin = block.begin() as f64;
            let x = frame.x_px(begin);
            let x_end = frame.x_px((block.end() as f64 - gap).max(begin));
            let y = frame.lane_top_px(block.lane);
            let (fill, outline) = block_colors(&block.interval);
            renderer.draw_rect(x, y + 1.0, x_end - x, lane_h - 2.0, fill);
            renderer.draw_rect_outline(x, y + 1.0, x_end - x, lane_h - 2.0, outline);
        }
        renderer
    }
}

fn draw_axes(renderer: &mut Renderer, frame: &ChartFrame, step: TimeStep) {
    let margin = f64::from(frame.options.margin_px);
    let axis_y = frame.axis_y_px();
    let right = f64::from(frame.width()) - margin;

    for lane in axis::lane_ticks(frame.peak_lane, 20) {
        let y = frame.lane_top_px(lane);
        renderer.draw_line((margin, y), (right, y), Colors::LIGHT_GRAY);
        let label_y = y + (f64::from(frame.options.lane_height_px) - f64::from(FONT_SIZE)) / 2.0;
        renderer.draw_text(margin / 3.0, label_y, &lane.to_string(), Colors::DARK_GRAY);
    }

    renderer.draw_line((margin, axis_y), (right, axis_y), Colors::BLACK);
    renderer.draw_line((margin, margin / 2.0), (margin, axis_y), Colors::BLACK);

    for t in axis::time_ticks(frame.t_min, frame.t_max, step, AXIS_TICKS) {
        let x = frame.x_px(t as f64);
        renderer.draw_line((x, axis_y), (x, axis_y + 5.0), Colors::BLACK);
        let label = axis::format_time(t, step);
        // rough centering; glyph widths are not measured
        let label_x = x - label.chars().count() as f64 * f64::from(FONT_SIZE) / 4.0;
        renderer.draw_text(label_x, axis_y + 8.0, &label, Colors::BLACK);
    }
}

impl<W: Write> LayoutSink for ChartSink<W> {
    fn emit(&mut self, laned: &LanedInterval) -> Result<()> {
        self.blocks.push(*laned);
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let renderer = self.draw();
        let bytes = renderer.encode_png()?;
        self.out.write_all(&bytes)?;
        self.out.flush()?;
        debug!(
            "Rendered {} blocks into a {}x{} chart",
            self.blocks.len(),
            renderer.image.width(),
            renderer.image.height()
        );
        Ok(())
    }
}
