use crate::data::Dataset;
use crate::ChartKind;
use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::ops::Range;

pub const CHART_WIDTH: u32 = 800;
pub const CHART_HEIGHT: u32 = 600;

/// Series colors, cycled when a chart has more data columns than entries.
const PALETTE: [RGBColor; 8] = [
    RGBColor(54, 162, 235),
    RGBColor(255, 99, 132),
    RGBColor(75, 192, 112),
    RGBColor(255, 159, 64),
    RGBColor(153, 102, 255),
    RGBColor(255, 205, 86),
    RGBColor(70, 70, 70),
    RGBColor(0, 168, 168),
];

/// Validated parameters for a chart render.
#[derive(Debug, Clone)]
pub struct ChartRequest {
    pub label_column: String,
    pub data_columns: Vec<String>,
    pub title: Option<String>,
}

/// One plotted data column: display name (the source header) plus values
/// in row order.
struct Series {
    name: String,
    values: Vec<f64>,
}

/// Render a chart to a PNG image encoded as a base64 data URI.
///
/// The caller validates the request against the dataset beforehand; the
/// checks here are defensive re-checks only. Drawing-engine failures are
/// wrapped with context but keep the engine's original message.
pub fn render_chart(
    dataset: &Dataset,
    kind: ChartKind,
    request: &ChartRequest,
) -> Result<String> {
    if dataset.records.is_empty() {
        anyhow::bail!("No data provided for chart generation.");
    }
    if request.data_columns.is_empty() {
        anyhow::bail!("Label and data columns must be specified.");
    }
    if !dataset.has_column(&request.label_column) {
        anyhow::bail!(
            "Label column '{}' not found in data headers.",
            request.label_column
        );
    }
    for col in &request.data_columns {
        if !dataset.has_column(col) {
            anyhow::bail!("Data column '{}' not found in data headers.", col);
        }
    }

    // Row order is preserved: labels define the category/axis order and
    // every series takes its values positionally from the same rows.
    let labels: Vec<String> = dataset
        .records
        .iter()
        .map(|r| {
            r.get(&request.label_column)
                .map(|v| v.as_label())
                .unwrap_or_default()
        })
        .collect();
    let series: Vec<Series> = request
        .data_columns
        .iter()
        .map(|col| Series {
            name: col.clone(),
            values: dataset
                .records
                .iter()
                .map(|r| r.get(col).map(|v| v.as_f64()).unwrap_or(0.0))
                .collect(),
        })
        .collect();

    let title = request
        .title
        .as_deref()
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    let mut buffer = vec![0u8; (CHART_WIDTH * CHART_HEIGHT * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (CHART_WIDTH, CHART_HEIGHT))
            .into_drawing_area();
        root.fill(&WHITE).context("Failed to fill background")?;

        match kind {
            ChartKind::Bar => draw_bar(&root, &labels, &series, title.as_deref())?,
            ChartKind::Line => draw_line(&root, &labels, &series, title.as_deref())?,
            ChartKind::Pie => draw_pie(&root, &labels, &series, title.as_deref())?,
        }

        root.present().context("Failed to present drawing")?;
    }

    let png_bytes = encode_png(&buffer)?;
    Ok(format!(
        "data:image/png;base64,{}",
        BASE64.encode(&png_bytes)
    ))
}

/// Side-by-side bars per category, one group entry per series.
fn draw_bar(
    root: &DrawingArea<BitMapBackend, Shift>,
    labels: &[String],
    series: &[Series],
    title: Option<&str>,
) -> Result<()> {
    let num_categories = labels.len();
    let x_range = 0.0..(num_categories as f64);
    let all_values: Vec<f64> = series.iter().flat_map(|s| s.values.iter().copied()).collect();
    // Bars are drawn from a zero baseline
    let y_range = padded_range(&all_values, true)?;

    let mut builder = ChartBuilder::on(root);
    builder
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50);
    if let Some(t) = title {
        builder.caption(t, ("sans-serif", 20));
    }
    let mut chart = builder
        .build_cartesian_2d(x_range, y_range)
        .context("Failed to build chart")?;

    let label_owned: Vec<String> = labels.to_vec();
    chart
        .configure_mesh()
        .x_labels(num_categories)
        .x_label_formatter(&|x| {
            let idx = *x as usize;
            label_owned.get(idx).cloned().unwrap_or_default()
        })
        .draw()
        .context("Failed to draw mesh")?;

    let num_series = series.len();
    let bar_width = 0.8 / num_series as f64;

    for (series_idx, s) in series.iter().enumerate() {
        let color = PALETTE[series_idx % PALETTE.len()];
        let x_offset = (series_idx as f64 - (num_series as f64 - 1.0) / 2.0) * bar_width;
        let rects = s.values.iter().enumerate().map(move |(cat_idx, &y_val)| {
            let x_center = cat_idx as f64 + 0.5 + x_offset;
            Rectangle::new(
                [
                    (x_center - bar_width / 2.0, 0.0),
                    (x_center + bar_width / 2.0, y_val),
                ],
                color.filled(),
            )
        });
        chart
            .draw_series(rects)
            .context("Failed to draw bar series")?
            .label(s.name.clone())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .border_style(&BLACK)
        .background_style(&WHITE.mix(0.8))
        .draw()
        .context("Failed to draw legend")?;

    Ok(())
}

/// One line per series over a categorical x axis in row order.
fn draw_line(
    root: &DrawingArea<BitMapBackend, Shift>,
    labels: &[String],
    series: &[Series],
    title: Option<&str>,
) -> Result<()> {
    let num_points = labels.len();
    let x_max = if num_points > 1 {
        (num_points - 1) as f64
    } else {
        1.0
    };
    let all_values: Vec<f64> = series.iter().flat_map(|s| s.values.iter().copied()).collect();
    let y_range = padded_range(&all_values, false)?;

    let mut builder = ChartBuilder::on(root);
    builder
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50);
    if let Some(t) = title {
        builder.caption(t, ("sans-serif", 20));
    }
    let mut chart = builder
        .build_cartesian_2d(0.0..x_max, y_range)
        .context("Failed to build chart")?;

    let label_owned: Vec<String> = labels.to_vec();
    chart
        .configure_mesh()
        .x_labels(num_points)
        .x_label_formatter(&|x| {
            let idx = x.round() as usize;
            label_owned.get(idx).cloned().unwrap_or_default()
        })
        .draw()
        .context("Failed to draw mesh")?;

    for (series_idx, s) in series.iter().enumerate() {
        let color = PALETTE[series_idx % PALETTE.len()];
        let points: Vec<(f64, f64)> = s
            .values
            .iter()
            .enumerate()
            .map(|(i, &v)| (i as f64, v))
            .collect();
        chart
            .draw_series(LineSeries::new(points, color.stroke_width(2)))
            .context("Failed to draw line series")?
            .label(s.name.clone())
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 12, y)], color.stroke_width(2))
            });
    }

    chart
        .configure_series_labels()
        .border_style(&BLACK)
        .background_style(&WHITE.mix(0.8))
        .draw()
        .context("Failed to draw legend")?;

    Ok(())
}

/// Pie of the first data column; slice labels come from the label column.
fn draw_pie(
    root: &DrawingArea<BitMapBackend, Shift>,
    labels: &[String],
    series: &[Series],
    title: Option<&str>,
) -> Result<()> {
    if let Some(t) = title {
        root.titled(t, ("sans-serif", 20))
            .context("Failed to draw title")?;
    }

    // Pie slices only make sense for positive values
    let mut sizes: Vec<f64> = Vec::new();
    let mut slice_labels: Vec<String> = Vec::new();
    let mut colors: Vec<RGBColor> = Vec::new();
    for (i, &v) in series[0].values.iter().enumerate() {
        if v > 0.0 {
            sizes.push(v);
            slice_labels.push(labels.get(i).cloned().unwrap_or_default());
            colors.push(PALETTE[colors.len() % PALETTE.len()]);
        }
    }
    if sizes.is_empty() {
        anyhow::bail!(
            "Pie chart requires at least one positive value in column '{}'.",
            series[0].name
        );
    }

    let center = (CHART_WIDTH as i32 / 2, CHART_HEIGHT as i32 / 2);
    let radius = (CHART_WIDTH.min(CHART_HEIGHT) as f64) * 0.35;
    let mut pie = Pie::new(&center, &radius, &sizes, &colors, &slice_labels);
    pie.label_style(("sans-serif", 16).into_font().color(&BLACK));
    pie.percentages(("sans-serif", 14).into_font().color(&BLACK));
    root.draw(&pie).context("Failed to draw pie chart")?;

    Ok(())
}

/// Global value range with 5% padding, widened by one unit when degenerate.
fn padded_range(values: &[f64], include_zero: bool) -> Result<Range<f64>> {
    if values.is_empty() {
        anyhow::bail!("Cannot create chart with no data points");
    }
    let mut min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let mut max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if include_zero {
        min = min.min(0.0);
        max = max.max(0.0);
    }
    if min == max {
        Ok((min - 1.0)..(max + 1.0))
    } else {
        let padding = (max - min) * 0.05;
        Ok((min - padding)..(max + padding))
    }
}

/// Encode the RGB buffer as PNG bytes.
fn encode_png(buffer: &[u8]) -> Result<Vec<u8>> {
    let mut png_bytes = Vec::new();
    {
        let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
        encoder
            .write_image(buffer, CHART_WIDTH, CHART_HEIGHT, image::ColorType::Rgb8)
            .context("Failed to encode PNG")?;
    }
    Ok(png_bytes)
}
