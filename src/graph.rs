use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use std::error::Error;

use crate::rates::TARGET_RATE;

/// Configuration options for chart generation
///
/// All dashboard charts plot percentages per week, so the Y range is fixed
/// to 0..100 and only the labels and canvas size vary.
#[derive(Clone, Debug)]
pub struct ChartOptions {
    /// Title displayed at the top of the chart
    pub title: String,

    /// Label for the Y-axis
    pub y_label: String,

    /// Width of the chart in pixels
    pub width: u32,

    /// Height of the chart in pixels
    pub height: u32,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            title: "Évolution".to_string(),
            y_label: "%".to_string(),
            width: 860,
            height: 440,
        }
    }
}

/// Series colors for multi-line charts (screening, recalls).
const SERIES_COLORS: [RGBColor; 2] = [RGBColor(25, 118, 210), RGBColor(156, 39, 176)];

/// Creates a line chart of one or more weekly rate series.
///
/// Each series is drawn as a connected line with circle markers, one point
/// per week. When `target` is given, a dashed green horizontal reference
/// line is drawn at that rate (the dashboard uses the 70% target).
///
/// # Arguments
/// * `weeks` - X-axis categories, one label per data point
/// * `series` - Labeled rate series; every series must have `weeks.len()` points
/// * `target` - Optional horizontal reference rate
/// * `options` - Chart styling options
///
/// # Returns
/// * A Result containing the PNG image data as bytes or an error
pub fn rate_line_chart(
    weeks: &[String],
    series: &[(&str, Vec<f64>)],
    target: Option<f64>,
    options: &ChartOptions,
) -> Result<Vec<u8>, Box<dyn Error>> {
    if weeks.is_empty() {
        return Err("no data points to draw".into());
    }

    // The bitmap backend wants a file path; a per-call temp file keeps two
    // concurrent chart requests from clobbering each other.
    let file = tempfile::Builder::new().suffix(".png").tempfile()?;
    let path = file.path().to_path_buf();

    {
        let root = BitMapBackend::new(&path, (options.width, options.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let x_max = (weeks.len() - 1) as f64;
        let mut chart = ChartBuilder::on(&root)
            .caption(&options.title, ("sans-serif", 28).into_font())
            .margin(12)
            .x_label_area_size(34)
            .y_label_area_size(44)
            .build_cartesian_2d(-0.4..x_max + 0.4, 0.0..100.0_f64)?;

        chart
            .configure_mesh()
            .x_labels(weeks.len())
            .x_label_formatter(&|x| week_label(weeks, *x))
            .y_desc(&options.y_label)
            .draw()?;

        if let Some(rate) = target {
            chart
                .draw_series(DashedLineSeries::new(
                    [(-0.4, rate), (x_max + 0.4, rate)],
                    6,
                    4,
                    GREEN.stroke_width(2),
                ))?
                .label(format!("Objectif {rate:.0}%"))
                .legend(|(x, y)| PathElement::new([(x, y), (x + 18, y)], GREEN.stroke_width(2)));
        }

        for (idx, (label, values)) in series.iter().enumerate() {
            let color = SERIES_COLORS[idx % SERIES_COLORS.len()];
            chart
                .draw_series(LineSeries::new(
                    values.iter().enumerate().map(|(i, v)| (i as f64, *v)),
                    color.stroke_width(2),
                ))?
                .label(label.to_string())
                .legend(move |(x, y)| {
                    PathElement::new([(x, y), (x + 18, y)], color.stroke_width(2))
                });
            chart.draw_series(
                values
                    .iter()
                    .enumerate()
                    .map(|(i, v)| Circle::new((i as f64, *v), 4, color.filled())),
            )?;
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.85))
            .border_style(BLACK.mix(0.4))
            .draw()?;

        root.present()?;
    }

    let buffer = std::fs::read(&path)?;
    Ok(buffer)
}

/// Creates a bar chart of one weekly rate series.
///
/// One bar per week, filled with a color scaled from red through orange to
/// green by the rate value, mirroring the original dashboard's continuous
/// color scale.
///
/// # Arguments
/// * `weeks` - X-axis categories
/// * `values` - One rate per week
/// * `options` - Chart styling options
///
/// # Returns
/// * A Result containing the PNG image data as bytes or an error
pub fn rate_bar_chart(
    weeks: &[String],
    values: &[f64],
    options: &ChartOptions,
) -> Result<Vec<u8>, Box<dyn Error>> {
    if weeks.is_empty() {
        return Err("no data points to draw".into());
    }

    let file = tempfile::Builder::new().suffix(".png").tempfile()?;
    let path = file.path().to_path_buf();

    {
        let root = BitMapBackend::new(&path, (options.width, options.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let x_max = (weeks.len() - 1) as f64;
        let mut chart = ChartBuilder::on(&root)
            .caption(&options.title, ("sans-serif", 28).into_font())
            .margin(12)
            .x_label_area_size(34)
            .y_label_area_size(44)
            .build_cartesian_2d(-0.6..x_max + 0.6, 0.0..100.0_f64)?;

        chart
            .configure_mesh()
            .x_labels(weeks.len())
            .x_label_formatter(&|x| week_label(weeks, *x))
            .y_desc(&options.y_label)
            .draw()?;

        chart.draw_series(values.iter().enumerate().map(|(i, v)| {
            let x = i as f64;
            Rectangle::new([(x - 0.35, 0.0), (x + 0.35, *v)], scale_color(*v).filled())
        }))?;

        root.present()?;
    }

    let buffer = std::fs::read(&path)?;
    Ok(buffer)
}

/// Axis label for a fractional tick position: the week name on whole
/// positions, nothing in between.
fn week_label(weeks: &[String], x: f64) -> String {
    let i = x.round();
    if i < 0.0 || (i - x).abs() > 1e-6 {
        return String::new();
    }
    weeks.get(i as usize).cloned().unwrap_or_default()
}

/// Map a rate in 0..100 to the red→orange→green scale.
pub fn scale_color(rate: f64) -> RGBColor {
    let red = RGBColor(211, 47, 47);
    let orange = RGBColor(245, 124, 0);
    let green = RGBColor(56, 142, 60);

    let t = (rate / 100.0).clamp(0.0, 1.0);
    if t < 0.5 {
        lerp(red, orange, t * 2.0)
    } else {
        lerp(orange, green, (t - 0.5) * 2.0)
    }
}

fn lerp(a: RGBColor, b: RGBColor, t: f64) -> RGBColor {
    let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * t).round() as u8;
    RGBColor(mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

/// Line-chart options for the dashboard's return-rate trend.
pub fn return_rate_options() -> ChartOptions {
    ChartOptions {
        title: format!("Évolution du Taux de Retour (cible : {TARGET_RATE:.0}%)"),
        y_label: "Taux de retour (%)".to_string(),
        ..Default::default()
    }
}
