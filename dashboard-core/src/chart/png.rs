//! PNG rendering with `plotters`.

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{FontStyle, register_font};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::OnceLock,
};
use tracing::{info, warn};

use super::spec::{ChartSpec, Rgb, Series, SeriesStyle};
use super::ChartBackend;
use crate::error::RenderError;

const FONT_FAMILY: &str = "sans-serif";

/// Searched in order when no font is configured.
const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Font registration is process-wide in `plotters`; it happens once and every
/// later `init` sees the first outcome.
static FONT: OnceLock<Result<PathBuf, String>> = OnceLock::new();

/// Draws [`ChartSpec`]s into PNG files.
///
/// Only obtainable through [`PngBackend::init`], so a font is always registered.
#[derive(Debug, Clone)]
pub struct PngBackend(());

impl PngBackend {
    /// Register the chart font (once per process) and return a backend.
    pub fn init(font_path: Option<&Path>) -> Result<Self, RenderError> {
        match FONT.get_or_init(|| register(font_path)) {
            Ok(_) => Ok(Self(())),
            Err(msg) => Err(RenderError::FontUnavailable(msg.clone())),
        }
    }
}

fn register(preferred: Option<&Path>) -> Result<PathBuf, String> {
    let candidates = preferred
        .map(Path::to_path_buf)
        .into_iter()
        .chain(FONT_CANDIDATES.iter().map(PathBuf::from));

    for path in candidates {
        let Ok(bytes) = fs::read(&path) else {
            continue;
        };
        // plotters keeps registered font data for the life of the process.
        let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());

        let normal = register_font(FONT_FAMILY, FontStyle::Normal, bytes);
        let bold = register_font(FONT_FAMILY, FontStyle::Bold, bytes);
        if normal.is_ok() && bold.is_ok() {
            info!(font = %path.display(), "registered chart font");
            return Ok(path);
        }
        warn!(font = %path.display(), "font file could not be parsed, trying next");
    }

    Err(match preferred {
        Some(p) => format!("{} is not a readable TrueType font", p.display()),
        None => "no system font found; set `font_path` in the config".to_string(),
    })
}

impl ChartBackend for PngBackend {
    fn draw(&self, spec: &ChartSpec, target: &Path) -> Result<(), RenderError> {
        let root = BitMapBackend::new(target, spec.size).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;
        plot(&root, spec)?;
        root.present().map_err(draw_err)?;
        Ok(())
    }
}

fn plot(root: &DrawingArea<BitMapBackend<'_>, Shift>, spec: &ChartSpec) -> Result<(), RenderError> {
    let slots = spec.categories.len().max(1) as u32;
    let (y_lo, y_hi) = spec.value_range();
    let has_bars = spec.series.iter().any(|s| s.style == SeriesStyle::Bars);

    let mut chart = ChartBuilder::on(root)
        .caption(&spec.title, (FONT_FAMILY, 24).into_font().style(FontStyle::Bold))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .build_cartesian_2d((0u32..slots).into_segmented(), y_lo..y_hi)
        .map_err(draw_err)?;

    let categories = &spec.categories;
    let x_label = |v: &SegmentValue<u32>| category_label(categories, v);

    let mut mesh = chart.configure_mesh();
    mesh.x_labels(categories.len())
        .x_label_formatter(&x_label)
        .x_desc(spec.x_desc.as_str())
        .y_desc(spec.y_desc.as_str())
        .axis_desc_style((FONT_FAMILY, 16))
        .label_style((FONT_FAMILY, 13))
        .bold_line_style(BLACK.mix(0.15))
        .light_line_style(WHITE);
    if has_bars {
        mesh.disable_x_mesh();
    }
    mesh.draw().map_err(draw_err)?;

    for series in &spec.series {
        let color = to_color(series.color);
        let points = centers(series);

        match series.style {
            SeriesStyle::LineMarkers => {
                let drawn = chart
                    .draw_series(LineSeries::new(points.clone(), color.stroke_width(2)))
                    .map_err(draw_err)?;
                if let Some(label) = &series.label {
                    drawn.label(label.as_str()).legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                    });
                }
                chart
                    .draw_series(points.iter().map(|p| Circle::new(p.clone(), 5, color.filled())))
                    .map_err(draw_err)?;
            }
            SeriesStyle::FilledArea => {
                chart
                    .draw_series(AreaSeries::new(points.clone(), 0.0, color.mix(0.3)))
                    .map_err(draw_err)?;
                chart
                    .draw_series(LineSeries::new(points.clone(), color.stroke_width(3)))
                    .map_err(draw_err)?;
                chart
                    .draw_series(points.iter().map(|p| Circle::new(p.clone(), 6, WHITE.filled())))
                    .map_err(draw_err)?;
                chart
                    .draw_series(points.iter().map(|p| Circle::new(p.clone(), 6, color.stroke_width(2))))
                    .map_err(draw_err)?;
            }
            SeriesStyle::Bars => {
                chart
                    .draw_series(
                        Histogram::vertical(&chart)
                            .style(color.mix(0.8).filled())
                            .margin(12)
                            .data(series.values.iter().enumerate().map(|(i, v)| (i as u32, *v))),
                    )
                    .map_err(draw_err)?;

                let text = TextStyle::from((FONT_FAMILY, 13).into_font())
                    .pos(Pos::new(HPos::Center, VPos::Bottom));
                chart
                    .draw_series(
                        points
                            .iter()
                            .zip(&series.value_labels)
                            .map(|(p, label)| Text::new(label.clone(), p.clone(), text.clone())),
                    )
                    .map_err(draw_err)?;
            }
        }
    }

    if spec.series.iter().any(|s| s.label.is_some()) {
        chart
            .configure_series_labels()
            .label_font((FONT_FAMILY, 13))
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK.mix(0.3))
            .draw()
            .map_err(draw_err)?;
    }

    Ok(())
}

fn centers(series: &Series) -> Vec<(SegmentValue<u32>, f64)> {
    series
        .values
        .iter()
        .enumerate()
        .map(|(i, v)| (SegmentValue::CenterOf(i as u32), *v))
        .collect()
}

fn category_label(categories: &[String], value: &SegmentValue<u32>) -> String {
    match value {
        SegmentValue::Exact(i) | SegmentValue::CenterOf(i) => {
            categories.get(*i as usize).cloned().unwrap_or_default()
        }
        SegmentValue::Last => String::new(),
    }
}

fn to_color(rgb: Rgb) -> RGBColor {
    RGBColor(rgb.0, rgb.1, rgb.2)
}

fn draw_err(err: impl std::fmt::Display) -> RenderError {
    RenderError::Draw(err.to_string())
}
