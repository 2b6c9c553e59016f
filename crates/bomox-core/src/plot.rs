use std::path::Path;

use log::debug;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::FontTransform;
use serde_json::Value;

use crate::dataset::Dataset;
use crate::BomError;

const X_FIELD: &str = "local_date_time";
const TEMPERATURE_FIELD: &str = "air_temp";
const HUMIDITY_FIELD: &str = "rel_hum";
const MAX_X_LABELS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Two vertically stacked panels over the same x range.
    Stacked,
    /// One panel, temperature on the left y axis, humidity on the right.
    TwinAxis,
}

pub fn layout_for_mode(mode: Option<u8>) -> Result<Layout, BomError> {
    match mode {
        Some(1) => Ok(Layout::Stacked),
        Some(2) | None => Ok(Layout::TwinAxis),
        Some(other) => Err(BomError::InvalidArgument(format!(
            "unsupported plot mode {} (expected 1 or 2)",
            other
        ))),
    }
}

pub(crate) fn render(
    data: &Dataset,
    station: Option<&str>,
    layout: Layout,
    out: &Path,
) -> Result<(), BomError> {
    // Feeds arrive newest-first; plots run oldest-first.
    let data = data.reversed();
    let labels = text_column(&data, X_FIELD)?;
    let temperature = numeric_series(&data, TEMPERATURE_FIELD)?;
    let humidity = numeric_series(&data, HUMIDITY_FIELD)?;
    debug!(
        "Rendering plot — layout={:?} rows={} out={}",
        layout,
        labels.len(),
        out.display()
    );

    match layout {
        Layout::Stacked => render_stacked(out, &labels, &temperature, &humidity),
        Layout::TwinAxis => render_twin(out, &labels, &temperature, &humidity, station),
    }
}

fn render_stacked(
    out: &Path,
    labels: &[String],
    temperature: &[(i32, f64)],
    humidity: &[(i32, f64)],
) -> Result<(), BomError> {
    let root = BitMapBackend::new(out, (1000, 700)).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let panels = root.split_evenly((2, 1));
    draw_panel(&panels[0], labels, temperature, "Temperature [°C]", &RED, false)?;
    draw_panel(
        &panels[1],
        labels,
        humidity,
        "Relative humidity [%]",
        &BLUE,
        true,
    )?;

    root.present().map_err(render_err)?;
    Ok(())
}

fn draw_panel(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    labels: &[String],
    points: &[(i32, f64)],
    y_desc: &str,
    color: &RGBColor,
    with_date_labels: bool,
) -> Result<(), BomError> {
    let (y_lo, y_hi) = value_range(points);
    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .x_label_area_size(if with_date_labels { 70 } else { 20 })
        .y_label_area_size(60)
        .build_cartesian_2d(0..labels.len() as i32, y_lo..y_hi)
        .map_err(render_err)?;

    let date_label = |index: &i32| label_at(labels, *index);
    let blank_label = |_: &i32| String::new();

    let mut mesh = chart.configure_mesh();
    mesh.x_labels(MAX_X_LABELS)
        .y_desc(y_desc)
        .light_line_style(BLACK.mix(0.15));
    if with_date_labels {
        mesh.x_desc("Date time")
            .x_label_formatter(&date_label)
            .x_label_style(("sans-serif", 12).into_font().transform(FontTransform::Rotate90));
    } else {
        mesh.x_label_formatter(&blank_label);
    }
    mesh.draw().map_err(render_err)?;

    chart
        .draw_series(LineSeries::new(points.iter().copied(), color))
        .map_err(render_err)?;
    Ok(())
}

fn render_twin(
    out: &Path,
    labels: &[String],
    temperature: &[(i32, f64)],
    humidity: &[(i32, f64)],
    station: Option<&str>,
) -> Result<(), BomError> {
    let root = BitMapBackend::new(out, (1000, 500)).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let (t_lo, t_hi) = value_range(temperature);
    let (h_lo, h_hi) = value_range(humidity);
    let title = match station {
        Some(name) => format!("Latest observations from {}", name),
        None => "Latest observations".to_string(),
    };

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 22))
        .margin(10)
        .x_label_area_size(70)
        .y_label_area_size(60)
        .right_y_label_area_size(60)
        .build_cartesian_2d(0..labels.len() as i32, t_lo..t_hi)
        .map_err(render_err)?
        .set_secondary_coord(0..labels.len() as i32, h_lo..h_hi);

    let date_label = |index: &i32| label_at(labels, *index);
    chart
        .configure_mesh()
        .x_labels(MAX_X_LABELS)
        .x_label_formatter(&date_label)
        .x_label_style(("sans-serif", 12).into_font().transform(FontTransform::Rotate90))
        .x_desc("Date time")
        .y_desc("Temperature [°C]")
        .light_line_style(BLACK.mix(0.15))
        .draw()
        .map_err(render_err)?;

    chart
        .configure_secondary_axes()
        .y_desc("Relative humidity [%]")
        .draw()
        .map_err(render_err)?;

    chart
        .draw_series(LineSeries::new(temperature.iter().copied(), &RED))
        .map_err(render_err)?
        .label("temperature")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));

    chart
        .draw_secondary_series(LineSeries::new(humidity.iter().copied(), &BLUE))
        .map_err(render_err)?
        .label("humidity")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(render_err)?;

    root.present().map_err(render_err)?;
    Ok(())
}

fn label_at(labels: &[String], index: i32) -> String {
    labels
        .get(index as usize)
        .cloned()
        .unwrap_or_default()
}

fn text_column(data: &Dataset, name: &str) -> Result<Vec<String>, BomError> {
    let column = data
        .column(name)
        .ok_or_else(|| BomError::MalformedInput(format!("feed has no '{}' column", name)))?;
    Ok(column
        .iter()
        .map(|value| match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        })
        .collect())
}

fn numeric_series(data: &Dataset, name: &str) -> Result<Vec<(i32, f64)>, BomError> {
    let column = data
        .column(name)
        .ok_or_else(|| BomError::MalformedInput(format!("feed has no '{}' column", name)))?;
    let points: Vec<(i32, f64)> = column
        .iter()
        .enumerate()
        .filter_map(|(index, value)| numeric(value).map(|v| (index as i32, v)))
        .collect();
    if points.is_empty() {
        return Err(BomError::MalformedInput(format!(
            "no numeric values in '{}' column",
            name
        )));
    }
    Ok(points)
}

/// The AXF path delivers numbers as strings; missing cells are "-".
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn render_err<E: std::fmt::Display>(error: E) -> BomError {
    BomError::Render(error.to_string())
}

fn value_range(points: &[(i32, f64)]) -> (f64, f64) {
    let (min, max) = points.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY),
        |(min, max), (_, value)| (min.min(*value), max.max(*value)),
    );
    let padding = if (max - min).abs() > 1e-6 {
        (max - min) * 0.1
    } else {
        1.0
    };
    (min - padding, max + padding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DatasetBuilder;
    use serde_json::json;

    #[test]
    fn test_layout_for_mode() {
        assert_eq!(layout_for_mode(Some(1)).unwrap(), Layout::Stacked);
        assert_eq!(layout_for_mode(Some(2)).unwrap(), Layout::TwinAxis);
        // no mode means the overlay layout
        assert_eq!(layout_for_mode(None).unwrap(), Layout::TwinAxis);

        let err = layout_for_mode(Some(3)).unwrap_err();
        assert!(matches!(err, BomError::InvalidArgument(_)));
        let err = layout_for_mode(Some(0)).unwrap_err();
        assert!(matches!(err, BomError::InvalidArgument(_)));
    }

    #[test]
    fn test_numeric_accepts_numbers_and_strings() {
        assert_eq!(numeric(&json!(21.5)), Some(21.5));
        assert_eq!(numeric(&json!("48")), Some(48.0));
        assert_eq!(numeric(&json!(" 20.0 ")), Some(20.0));
        assert_eq!(numeric(&json!("-")), None);
        assert_eq!(numeric(&Value::Null), None);
    }

    fn sample_dataset() -> Dataset {
        let mut builder = DatasetBuilder::from_schema(
            ["local_date_time", "air_temp", "wind"]
                .iter()
                .map(|s| s.to_string()),
        )
        .unwrap();
        builder
            .push_row(vec![json!("04:30pm"), json!("21.0"), json!("-")])
            .unwrap();
        builder
            .push_row(vec![json!("04:00pm"), json!("-"), json!("-")])
            .unwrap();
        builder.build()
    }

    #[test]
    fn test_numeric_series_skips_missing_cells() {
        let data = sample_dataset();
        let series = numeric_series(&data, "air_temp").unwrap();
        assert_eq!(series, vec![(0, 21.0)]);
    }

    #[test]
    fn test_numeric_series_failures() {
        let data = sample_dataset();

        let err = numeric_series(&data, "rel_hum").unwrap_err();
        assert!(matches!(err, BomError::MalformedInput(_)));

        // column exists but holds no numbers at all
        let err = numeric_series(&data, "wind").unwrap_err();
        assert!(matches!(err, BomError::MalformedInput(_)));
    }

    #[test]
    fn test_value_range_pads_flat_series() {
        let (lo, hi) = value_range(&[(0, 10.0), (1, 10.0)]);
        assert_eq!((lo, hi), (9.0, 11.0));

        let (lo, hi) = value_range(&[(0, 10.0), (1, 20.0)]);
        assert!(lo < 10.0 && hi > 20.0);
    }
}
