//! Chart rendering to embeddable PNG images.
//!
//! Each render draws into its own [`ChartCanvas`]: a pixel buffer owned for
//! the duration of one call and dropped on every exit path, so consecutive
//! renders never share drawing state.

use crate::analysis::TrendEngine;
use crate::config::{AnalyticsConfig, ChartConfig};
use crate::constants::{PNG_DATA_URL_PREFIX, chart_labels};
use crate::error::{RainflowError, Result};
use crate::models::{ChartKind, Table};
use crate::stats::{self, Summary};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::FontTransform;
use plotters_backend::text_anchor::{HPos, VPos};
use plotters_backend::{BackendColor, BackendCoord, BackendTextStyle, DrawingErrorKind};
use std::error::Error as StdError;
use tracing::debug;

const BAR_COLOR: RGBColor = RGBColor(31, 119, 180);
const LINE_COLOR: RGBColor = RGBColor(31, 119, 180);
const GRID_COLOR: RGBColor = RGBColor(220, 220, 220);

impl<E: StdError + Send + Sync> From<DrawingAreaErrorKind<E>> for RainflowError {
    fn from(error: DrawingAreaErrorKind<E>) -> Self {
        RainflowError::render(error)
    }
}

/// A rendered chart ready for transport
#[derive(Debug, Clone)]
pub struct RenderedChart {
    pub kind: ChartKind,
    pub width: u32,
    pub height: u32,
    /// Bars or line points drawn; zero for a blank chart
    pub series_points: usize,
    png: Vec<u8>,
}

impl RenderedChart {
    pub fn png_bytes(&self) -> &[u8] {
        &self.png
    }

    /// PNG bytes as standard base64 text
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.png)
    }

    /// `data:` URL suitable for an HTML `img` element
    pub fn to_data_url(&self) -> String {
        format!("{}{}", PNG_DATA_URL_PREFIX, self.to_base64())
    }

    pub fn has_series(&self) -> bool {
        self.series_points > 0
    }
}

/// Draws the three supported chart kinds from a table
#[derive(Debug, Clone)]
pub struct ChartRenderer {
    chart: ChartConfig,
    engine: TrendEngine,
    rainfall_column: String,
    max_extreme_bars: usize,
    recent_window: usize,
}

impl Default for ChartRenderer {
    fn default() -> Self {
        Self::new(&AnalyticsConfig::default())
    }
}

impl ChartRenderer {
    pub fn new(config: &AnalyticsConfig) -> Self {
        Self {
            chart: config.chart.clone(),
            engine: TrendEngine::new(config),
            rainfall_column: config.rainfall_column.clone(),
            max_extreme_bars: config.max_extreme_bars,
            recent_window: config.recent_window,
        }
    }

    pub fn render(&self, kind: ChartKind, table: &Table) -> Result<RenderedChart> {
        let mut canvas = ChartCanvas::new(self.chart.width, self.chart.height);

        let series_points = {
            let root = canvas.root();
            root.fill(&WHITE)?;

            let points = match kind {
                ChartKind::BasicStats => self.draw_basic_stats(&root, table)?,
                ChartKind::ExtremeEvents => self.draw_extreme_events(&root, table)?,
                ChartKind::TimeSeries => self.draw_time_series(&root, table)?,
            };

            root.present()?;
            points
        };

        debug!(
            "Rendered {} chart with {} points ({}x{})",
            kind, series_points, self.chart.width, self.chart.height
        );

        Ok(RenderedChart {
            kind,
            width: self.chart.width,
            height: self.chart.height,
            series_points,
            png: canvas.into_png()?,
        })
    }

    fn draw_basic_stats<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        table: &Table,
    ) -> Result<usize> {
        let summary = Summary::compute(&table.rainfall_values()).ok_or_else(|| {
            RainflowError::NoValues {
                column: self.rainfall_column.clone(),
            }
        })?;

        let labels: Vec<String> = chart_labels::BASIC_STATS_BARS
            .iter()
            .map(|l| l.to_string())
            .collect();
        let values = [summary.min, summary.mean, summary.max];

        draw_bar_chart(
            root,
            chart_labels::BASIC_STATS_TITLE,
            &labels,
            &values,
            None,
        )?;
        Ok(values.len())
    }

    fn draw_extreme_events<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        table: &Table,
    ) -> Result<usize> {
        let values = table.rainfall_values();
        let threshold = match self.engine.extreme_threshold(&values) {
            Ok(threshold) => threshold,
            Err(RainflowError::NoValues { .. }) => {
                debug!("No rainfall values, leaving extreme events chart blank");
                return Ok(0);
            }
            Err(e) => return Err(e),
        };
        let events: Vec<f64> = stats::exceedances(&values, threshold)
            .into_iter()
            .take(self.max_extreme_bars)
            .collect();

        if events.is_empty() {
            debug!("No values above {:.2}, leaving chart blank", threshold);
            return Ok(0);
        }

        // Positions within the extreme subset, not row numbers
        let labels: Vec<String> = (0..events.len()).map(|i| i.to_string()).collect();
        let title = format!("Top {} Extreme Rainfall Events", self.max_extreme_bars);

        draw_bar_chart(
            root,
            &title,
            &labels,
            &events,
            Some(chart_labels::EVENT_INDEX_AXIS),
        )?;
        Ok(events.len())
    }

    fn draw_time_series<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        table: &Table,
    ) -> Result<usize> {
        if !table.has_time_index() {
            debug!("Table has no time index, time series left blank");
            return Ok(0);
        }

        let recent = table.tail(self.recent_window);
        let dates: Vec<String> = recent
            .iter()
            .map(|row| {
                row.timestamp
                    .map(|ts| ts.format("%Y-%m-%d").to_string())
                    .unwrap_or_default()
            })
            .collect();
        let points: Vec<(f64, f64)> = recent
            .iter()
            .enumerate()
            .filter_map(|(i, row)| row.rainfall.map(|v| (i as f64, v)))
            .collect();

        let values: Vec<f64> = points.iter().map(|(_, v)| *v).collect();
        let (y_min, y_max) = value_range(&values);
        let x_max = (dates.len().saturating_sub(1)).max(1) as f64;

        let title = format!("Recent Rainfall Trend (Last {} days)", self.recent_window);
        let mut chart = ChartBuilder::on(root)
            .caption(&title, ("sans-serif", 24))
            .margin(20)
            .x_label_area_size(90)
            .y_label_area_size(70)
            .build_cartesian_2d(0f64..x_max, y_min..y_max)?;

        let label_style = if self.chart.label_rotation == 0 {
            ("sans-serif", 12).into_font()
        } else {
            // Plotters only rotates text by quarter turns
            ("sans-serif", 12).into_font().transform(FontTransform::Rotate90)
        };

        chart
            .configure_mesh()
            .x_desc(chart_labels::DATE_AXIS)
            .y_desc(chart_labels::RAINFALL_AXIS)
            .x_labels(dates.len().min(15))
            .x_label_style(label_style)
            .x_label_formatter(&|x| label_at(&dates, *x))
            .light_line_style(Color::stroke_width(&GRID_COLOR, 1))
            .draw()?;

        chart.draw_series(LineSeries::new(
            points.iter().copied(),
            Color::stroke_width(&LINE_COLOR, 2),
        ))?;

        Ok(points.len())
    }
}

fn draw_bar_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    title: &str,
    labels: &[String],
    values: &[f64],
    x_desc: Option<&str>,
) -> Result<()> {
    let (y_min, y_max) = value_range(values);
    let x_max = values.len() as f64 - 0.5;

    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(-0.5f64..x_max, y_min..y_max)?;

    let formatter = |x: &f64| label_at(labels, *x);
    let mut mesh = chart.configure_mesh();
    mesh.disable_x_mesh()
        .x_labels(labels.len())
        .x_label_formatter(&formatter)
        .y_desc(chart_labels::RAINFALL_AXIS)
        .light_line_style(Color::stroke_width(&GRID_COLOR, 1));
    if let Some(desc) = x_desc {
        mesh.x_desc(desc);
    }
    mesh.draw()?;

    chart.draw_series(values.iter().enumerate().map(|(i, v)| {
        let x = i as f64;
        Rectangle::new([(x - 0.4, 0.0), (x + 0.4, *v)], BAR_COLOR.filled())
    }))?;

    Ok(())
}

/// Label for an integral x position, blank elsewhere
fn label_at(labels: &[String], x: f64) -> String {
    let rounded = x.round();
    if (x - rounded).abs() > 1e-6 || rounded < 0.0 {
        return String::new();
    }
    labels.get(rounded as usize).cloned().unwrap_or_default()
}

/// Y-axis range including zero, padded above the data
fn value_range(values: &[f64]) -> (f64, f64) {
    let min = values.iter().copied().fold(0.0, f64::min);
    let max = values.iter().copied().fold(0.0, f64::max);
    let padding = ((max - min) * 0.1).max(1.0);
    let low = if min < 0.0 { min - padding } else { 0.0 };
    (low, max + padding)
}

/// RGB pixel buffer owned by a single render call
struct ChartCanvas {
    width: u32,
    height: u32,
    buffer: Vec<u8>,
}

impl ChartCanvas {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            buffer: vec![0; width as usize * height as usize * 3],
        }
    }

    fn root(&mut self) -> DrawingArea<FontSafeBackend<BitMapBackend<'_>>, Shift> {
        let backend = BitMapBackend::with_buffer(&mut self.buffer, (self.width, self.height));
        FontSafeBackend::new(backend).into_drawing_area()
    }

    fn into_png(self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, self.width, self.height);
            encoder.set_color(png::ColorType::Rgb);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header()?;
            writer.write_image_data(&self.buffer)?;
            writer.finish()?;
        }
        Ok(out)
    }
}

/// Backend wrapper that draws text with built-in bitmap glyphs when no font
/// is usable
///
/// Without the `ttf` feature plotters has no glyph rasteriser and panics on
/// text, so every label goes through [`BitmapText`]. With it, a missing
/// system font falls back to the same glyphs instead of failing the chart.
struct FontSafeBackend<DB> {
    inner: DB,
}

impl<DB> FontSafeBackend<DB> {
    fn new(inner: DB) -> Self {
        Self { inner }
    }
}

impl<DB: DrawingBackend> DrawingBackend for FontSafeBackend<DB> {
    type ErrorType = DB::ErrorType;

    fn get_size(&self) -> (u32, u32) {
        self.inner.get_size()
    }

    fn ensure_prepared(&mut self) -> std::result::Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.ensure_prepared()
    }

    fn present(&mut self) -> std::result::Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.present()
    }

    fn draw_pixel(
        &mut self,
        point: BackendCoord,
        color: BackendColor,
    ) -> std::result::Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_pixel(point, color)
    }

    fn draw_line<S: plotters_backend::BackendStyle>(
        &mut self,
        from: BackendCoord,
        to: BackendCoord,
        style: &S,
    ) -> std::result::Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_line(from, to, style)
    }

    fn draw_rect<S: plotters_backend::BackendStyle>(
        &mut self,
        upper_left: BackendCoord,
        bottom_right: BackendCoord,
        style: &S,
        fill: bool,
    ) -> std::result::Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_rect(upper_left, bottom_right, style, fill)
    }

    fn draw_path<S: plotters_backend::BackendStyle, I: IntoIterator<Item = BackendCoord>>(
        &mut self,
        path: I,
        style: &S,
    ) -> std::result::Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_path(path, style)
    }

    fn fill_polygon<S: plotters_backend::BackendStyle, I: IntoIterator<Item = BackendCoord>>(
        &mut self,
        vert: I,
        style: &S,
    ) -> std::result::Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.fill_polygon(vert, style)
    }

    fn blit_bitmap(
        &mut self,
        pos: BackendCoord,
        (iw, ih): (u32, u32),
        src: &[u8],
    ) -> std::result::Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.blit_bitmap(pos, (iw, ih), src)
    }

    fn draw_text<TStyle: BackendTextStyle>(
        &mut self,
        text: &str,
        style: &TStyle,
        pos: BackendCoord,
    ) -> std::result::Result<(), DrawingErrorKind<Self::ErrorType>> {
        if cfg!(feature = "ttf") {
            match self.inner.draw_text(text, style, pos) {
                Err(DrawingErrorKind::FontError(e)) => {
                    debug!("Font unavailable for '{}', using bitmap glyphs: {}", text, e);
                }
                other => return other,
            }
        }
        self.draw_bitmap_text(text, style, pos)
    }

    fn estimate_text_size<TStyle: BackendTextStyle>(
        &self,
        text: &str,
        style: &TStyle,
    ) -> std::result::Result<(u32, u32), DrawingErrorKind<Self::ErrorType>> {
        if cfg!(feature = "ttf") {
            if let Ok(size) = self.inner.estimate_text_size(text, style) {
                return Ok(size);
            }
        }
        Ok(BitmapText::new(text, style.size()).size())
    }
}

impl<DB: DrawingBackend> FontSafeBackend<DB> {
    fn draw_bitmap_text<TStyle: BackendTextStyle>(
        &mut self,
        text: &str,
        style: &TStyle,
        pos: BackendCoord,
    ) -> std::result::Result<(), DrawingErrorKind<DB::ErrorType>> {
        let color = style.color();
        if color.alpha == 0.0 {
            return Ok(());
        }

        let bitmap = BitmapText::new(text, style.size());
        let (width, height) = bitmap.size();
        let (width, height) = (width as i32, height as i32);
        let anchor = style.anchor();
        let dx = match anchor.h_pos {
            HPos::Left => 0,
            HPos::Center => -width / 2,
            HPos::Right => -width,
        };
        let dy = match anchor.v_pos {
            VPos::Top => 0,
            VPos::Center => -height / 2,
            VPos::Bottom => -height,
        };

        let transform = style.transform();
        let (canvas_w, canvas_h) = self.inner.get_size();
        for (x, y) in bitmap.pixels() {
            let (tx, ty) = transform.transform(x + dx, y + dy);
            let (px, py) = (pos.0 + tx, pos.1 + ty);
            if px >= 0 && py >= 0 && (px as u32) < canvas_w && (py as u32) < canvas_h {
                self.inner.draw_pixel((px, py), color)?;
            }
        }
        Ok(())
    }
}

const GLYPH_HEIGHT: i32 = 7;
const SPACE_ADVANCE: i32 = 3;

/// Column bitmap for one character, most significant bit leftmost
#[derive(Debug, Clone, Copy)]
struct Glyph {
    width: i32,
    rows: [u8; GLYPH_HEIGHT as usize],
}

impl Glyph {
    const fn new(width: i32, rows: [u8; GLYPH_HEIGHT as usize]) -> Self {
        Self { width, rows }
    }
}

/// Text laid out in 5x7 glyphs, scaled to roughly the requested font size
#[derive(Debug)]
struct BitmapText {
    scale: i32,
    /// Glyph and its left edge in unscaled columns
    glyphs: Vec<(Glyph, i32)>,
    columns: i32,
}

impl BitmapText {
    fn new(text: &str, font_size: f64) -> Self {
        let scale = ((font_size / 12.0).round() as i32).max(1);
        let mut glyphs = Vec::new();
        let mut cursor = 0;
        for ch in text.chars() {
            match glyph(ch) {
                Some(g) => {
                    glyphs.push((g, cursor));
                    cursor += g.width + 1;
                }
                None => cursor += SPACE_ADVANCE,
            }
        }
        Self {
            scale,
            glyphs,
            columns: (cursor - 1).max(0),
        }
    }

    fn size(&self) -> (u32, u32) {
        (
            (self.columns * self.scale) as u32,
            (GLYPH_HEIGHT * self.scale) as u32,
        )
    }

    /// Inked pixels relative to the top-left corner
    fn pixels(&self) -> Vec<(i32, i32)> {
        let mut out = Vec::new();
        for (g, left) in &self.glyphs {
            for (row, bits) in g.rows.iter().enumerate() {
                for col in 0..g.width {
                    if bits & (1 << (g.width - 1 - col)) == 0 {
                        continue;
                    }
                    let x0 = (left + col) * self.scale;
                    let y0 = row as i32 * self.scale;
                    for sy in 0..self.scale {
                        for sx in 0..self.scale {
                            out.push((x0 + sx, y0 + sy));
                        }
                    }
                }
            }
        }
        out
    }
}

/// Glyphs for chart titles, axis names, numbers and dates; letters are
/// drawn upper case
fn glyph(ch: char) -> Option<Glyph> {
    let g = match ch.to_ascii_uppercase() {
        'A' => Glyph::new(5, [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001]),
        'B' => Glyph::new(5, [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110]),
        'C' => Glyph::new(5, [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110]),
        'D' => Glyph::new(5, [0b11110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11110]),
        'E' => Glyph::new(5, [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111]),
        'F' => Glyph::new(5, [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000]),
        'G' => Glyph::new(5, [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01111]),
        'H' => Glyph::new(5, [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001]),
        'I' => Glyph::new(3, [0b111, 0b010, 0b010, 0b010, 0b010, 0b010, 0b111]),
        'J' => Glyph::new(5, [0b00111, 0b00010, 0b00010, 0b00010, 0b00010, 0b10010, 0b01100]),
        'K' => Glyph::new(5, [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001]),
        'L' => Glyph::new(5, [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111]),
        'M' => Glyph::new(5, [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001]),
        'N' => Glyph::new(5, [0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001, 0b10001]),
        'O' => Glyph::new(5, [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110]),
        'P' => Glyph::new(5, [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000]),
        'Q' => Glyph::new(5, [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101]),
        'R' => Glyph::new(5, [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001]),
        'S' => Glyph::new(5, [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110]),
        'T' => Glyph::new(5, [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100]),
        'U' => Glyph::new(5, [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110]),
        'V' => Glyph::new(5, [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100]),
        'W' => Glyph::new(5, [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b10101, 0b01010]),
        'X' => Glyph::new(5, [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001]),
        'Y' => Glyph::new(5, [0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100]),
        'Z' => Glyph::new(5, [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111]),
        '0' => Glyph::new(5, [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110]),
        '1' => Glyph::new(5, [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110]),
        '2' => Glyph::new(5, [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111]),
        '3' => Glyph::new(5, [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110]),
        '4' => Glyph::new(5, [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010]),
        '5' => Glyph::new(5, [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110]),
        '6' => Glyph::new(5, [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110]),
        '7' => Glyph::new(5, [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000]),
        '8' => Glyph::new(5, [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110]),
        '9' => Glyph::new(5, [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100]),
        '-' => Glyph::new(3, [0b000, 0b000, 0b000, 0b111, 0b000, 0b000, 0b000]),
        '+' => Glyph::new(5, [0b00000, 0b00100, 0b00100, 0b11111, 0b00100, 0b00100, 0b00000]),
        '_' => Glyph::new(5, [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b11111]),
        '.' => Glyph::new(1, [0, 0, 0, 0, 0, 0, 1]),
        ',' => Glyph::new(2, [0b00, 0b00, 0b00, 0b00, 0b00, 0b01, 0b10]),
        ':' => Glyph::new(1, [0, 1, 0, 0, 0, 1, 0]),
        '/' => Glyph::new(5, [0b00001, 0b00010, 0b00010, 0b00100, 0b01000, 0b01000, 0b10000]),
        '(' => Glyph::new(3, [0b001, 0b010, 0b100, 0b100, 0b100, 0b010, 0b001]),
        ')' => Glyph::new(3, [0b100, 0b010, 0b001, 0b001, 0b001, 0b010, 0b100]),
        '%' => Glyph::new(5, [0b11001, 0b11010, 0b00010, 0b00100, 0b01000, 0b01011, 0b10011]),
        '#' => Glyph::new(5, [0b01010, 0b01010, 0b11111, 0b01010, 0b11111, 0b01010, 0b01010]),
        _ => return None,
    };
    Some(g)
}
