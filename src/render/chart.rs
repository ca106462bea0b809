use std::path::Path;

use crate::data::{ChartCommon, ChartData, Crossover, DashKind, Dataset, YFormat};
use crate::manifest::FigureSpec;
use crate::surface::{
    Anchor, ArrowStyle, FillStyle, LinePattern, RenderError, Surface, TextStyle, VAlign,
};
use crate::theme::Theme;

/// Maps data coordinates onto the unit-square plot area.
#[derive(Debug, Clone, Copy)]
struct Scale {
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
}

impl Scale {
    fn ux(&self, x: f64) -> f32 {
        (((x - self.x_min) / (self.x_max - self.x_min)) as f32).clamp(-0.2, 1.2)
    }

    fn uy(&self, y: f64) -> f32 {
        (((y - self.y_min) / (self.y_max - self.y_min)) as f32).clamp(-0.2, 1.2)
    }
}

pub(crate) fn render(
    spec: &FigureSpec,
    data: &ChartData,
    theme: &Theme,
    out: &Path,
) -> Result<(), RenderError> {
    let mut surface = Surface::new(theme, &spec.figure_number, &spec.title, spec.tall);
    let common = data.common();

    let n_points = common.x_values.len();
    if n_points == 0 || common.datasets.is_empty() {
        return surface.persist(out);
    }

    let categorical = matches!(data, ChartData::Bar { .. } | ChartData::StackedBar { .. })
        || common.x_values.iter().any(|v| v.as_number().is_none());
    let numeric_xs: Vec<f64> = if categorical {
        (0..n_points).map(|i| i as f64).collect()
    } else {
        common
            .x_values
            .iter()
            .map(|v| v.as_number().unwrap_or(0.0))
            .collect()
    };

    let (x_min, x_max) = if categorical {
        (-0.5, n_points as f64 - 0.5)
    } else {
        let lo = numeric_xs.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = numeric_xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if (hi - lo).abs() < f64::EPSILON {
            (lo - 1.0, hi + 1.0)
        } else {
            let pad = (hi - lo) * 0.04;
            (lo - pad, hi + pad)
        }
    };

    let stacked = matches!(data, ChartData::StackedBar { .. });
    let (data_min, data_max) = value_range(&common.datasets, n_points, stacked);
    let mut y_min = data_min.min(0.0);
    let mut y_max = data_max;
    if (y_max - y_min).abs() < f64::EPSILON {
        y_max = y_min + 1.0;
    }
    let y_pad = (y_max - y_min) * 0.08;
    y_max += y_pad;
    if y_min < 0.0 {
        y_min -= y_pad;
    }

    let scale = Scale {
        x_min,
        x_max,
        y_min,
        y_max,
    };

    draw_axes(&mut surface, common, &numeric_xs, categorical, &scale, theme);

    match data {
        ChartData::Line { .. } | ChartData::EpsEbit { .. } => {
            for dataset in &common.datasets {
                draw_line_series(&mut surface, dataset, &numeric_xs, &scale);
            }
        }
        ChartData::Bar { .. } => {
            let n_ds = common.datasets.len();
            let bar_width = 0.7 / n_ds as f64;
            for (i, dataset) in common.datasets.iter().enumerate() {
                let offset = (i as f64 - n_ds as f64 / 2.0 + 0.5) * bar_width;
                for (j, &value) in dataset.values.iter().take(n_points).enumerate() {
                    draw_bar(&mut surface, &scale, j as f64 + offset, bar_width, 0.0, value, &dataset.color);
                }
            }
        }
        ChartData::StackedBar { .. } => {
            let bar_width = 0.5;
            let mut bottoms = vec![0.0_f64; n_points];
            for dataset in &common.datasets {
                for (j, &value) in dataset.values.iter().take(n_points).enumerate() {
                    draw_bar(
                        &mut surface,
                        &scale,
                        j as f64,
                        bar_width,
                        bottoms[j],
                        bottoms[j] + value,
                        &dataset.color,
                    );
                    bottoms[j] += value;
                }
            }
        }
    }

    if let ChartData::EpsEbit { crossover, .. } = data {
        if let Some(crossover) = crossover {
            draw_crossover(&mut surface, common, crossover, &numeric_xs, &scale, theme);
        }
    }

    for ann in &common.annotations {
        surface.draw_plated_text(
            scale.ux(ann.x),
            scale.uy(ann.y),
            &ann.text,
            &TextStyle {
                bold: true,
                ..TextStyle::new(theme.font.note, "text")
            },
            Some("border"),
        );
    }

    if common.show_legend {
        draw_legend(&mut surface, &common.datasets, theme);
    }

    surface.persist(out)
}

fn value_range(datasets: &[Dataset], n_points: usize, stacked: bool) -> (f64, f64) {
    if stacked {
        let mut sums = vec![0.0_f64; n_points];
        for dataset in datasets {
            for (j, &v) in dataset.values.iter().take(n_points).enumerate() {
                sums[j] += v;
            }
        }
        let max = sums.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        (0.0, if max.is_finite() { max } else { 0.0 })
    } else {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for dataset in datasets {
            for &v in dataset.values.iter().take(n_points) {
                min = min.min(v);
                max = max.max(v);
            }
        }
        if !min.is_finite() {
            (0.0, 0.0)
        } else {
            (min, max)
        }
    }
}

fn draw_axes(
    surface: &mut Surface,
    common: &ChartCommon,
    numeric_xs: &[f64],
    categorical: bool,
    scale: &Scale,
    theme: &Theme,
) {
    // Horizontal grid at five intervals, labels on the left.
    let ticks = 5;
    for i in 0..=ticks {
        let value = scale.y_min + (scale.y_max - scale.y_min) * i as f64 / ticks as f64;
        let y = scale.uy(value);
        if common.show_grid && i > 0 {
            surface.draw_line(0.0, y, 1.0, y, "grid", 0.5, LinePattern::Solid);
        }
        surface.draw_text(
            -0.012,
            y,
            &format_tick(value, common.y_format),
            &TextStyle {
                anchor: Anchor::End,
                ..TextStyle::new(theme.font.note, "text_secondary")
            },
        );
    }

    for (i, x_value) in common.x_values.iter().enumerate() {
        let x = if categorical {
            scale.ux(i as f64)
        } else {
            scale.ux(numeric_xs[i])
        };
        surface.draw_text(
            x,
            -0.02,
            &x_value.label(),
            &TextStyle {
                valign: VAlign::Top,
                ..TextStyle::new(theme.font.note, "text_secondary")
            },
        );
    }

    if !common.x_label.is_empty() {
        surface.draw_text(
            0.5,
            -0.09,
            &common.x_label,
            &TextStyle {
                bold: true,
                valign: VAlign::Top,
                ..TextStyle::new(theme.font.axis_label, "text")
            },
        );
    }
    if !common.y_label.is_empty() {
        surface.draw_text(
            -0.085,
            0.5,
            &common.y_label,
            &TextStyle {
                bold: true,
                rotated: true,
                ..TextStyle::new(theme.font.axis_label, "text")
            },
        );
    }
}

fn draw_line_series(surface: &mut Surface, dataset: &Dataset, numeric_xs: &[f64], scale: &Scale) {
    let points: Vec<(f32, f32)> = dataset
        .values
        .iter()
        .take(numeric_xs.len())
        .enumerate()
        .map(|(i, &v)| (scale.ux(numeric_xs[i]), scale.uy(v)))
        .collect();
    let pattern = match dataset.line_style {
        DashKind::Solid => LinePattern::Solid,
        DashKind::Dashed => LinePattern::Dashed,
        DashKind::Dotted => LinePattern::Dotted,
    };
    surface.draw_polyline(&points, &dataset.color, 2.5, pattern);
    for &(x, y) in &points {
        surface.draw_marker(
            x,
            y,
            2.5,
            &FillStyle {
                color: &dataset.color,
                stroke: Some("white"),
                stroke_width: 0.5,
                ..FillStyle::default()
            },
        );
    }
}

fn draw_bar(
    surface: &mut Surface,
    scale: &Scale,
    x_center: f64,
    width: f64,
    from: f64,
    to: f64,
    color: &str,
) {
    let x0 = scale.ux(x_center - width / 2.0);
    let x1 = scale.ux(x_center + width / 2.0);
    let y0 = scale.uy(from.min(to));
    let y1 = scale.uy(from.max(to));
    surface.fill_rect(
        x0,
        y0,
        x1 - x0,
        (y1 - y0).max(0.0),
        &FillStyle {
            color,
            stroke: Some("white"),
            stroke_width: 0.5,
            ..FillStyle::default()
        },
    );
}

fn draw_crossover(
    surface: &mut Surface,
    common: &ChartCommon,
    crossover: &Crossover,
    numeric_xs: &[f64],
    scale: &Scale,
    theme: &Theme,
) {
    let cx = crossover.x;
    let cy = match crossover.y {
        Some(y) => Some(y),
        None => common
            .datasets
            .iter()
            .find_map(|ds| interpolate_at(numeric_xs, &ds.values, cx)),
    };
    let Some(cy) = cy else {
        return;
    };

    surface.draw_line(
        scale.ux(cx),
        0.0,
        scale.ux(cx),
        1.0,
        "border",
        1.0,
        LinePattern::Dashed,
    );
    surface.draw_marker(
        scale.ux(cx),
        scale.uy(cy),
        6.2,
        &FillStyle {
            color: "orange",
            stroke: Some("text"),
            stroke_width: 2.0,
            ..FillStyle::default()
        },
    );

    let x_range = scale.x_max - scale.x_min;
    let y_range = scale.y_max - scale.y_min;
    let label_x = scale.ux(cx + x_range * 0.08);
    let label_y = scale.uy(cy + y_range * 0.12);
    surface.draw_arrow(
        label_x,
        label_y,
        scale.ux(cx),
        scale.uy(cy),
        None,
        "orange",
        ArrowStyle::Forward,
        1.5,
    );
    surface.draw_plated_text(
        label_x,
        label_y,
        &crossover.label,
        &TextStyle {
            bold: true,
            ..TextStyle::new(theme.font.body, "orange")
        },
        Some("orange"),
    );

    // Which financing option dominates on each side of the crossover.
    if common.datasets.len() >= 2 {
        let sides = [
            (cx - x_range * 0.15, &common.datasets[0]),
            (cx + x_range * 0.15, &common.datasets[1]),
        ];
        for (x, dataset) in sides {
            surface.draw_text(
                scale.ux(x),
                0.88,
                &format!("Favor\n{}", dataset.label),
                &TextStyle {
                    bold: true,
                    alpha: 0.7,
                    valign: VAlign::Top,
                    ..TextStyle::new(theme.font.note, &dataset.color)
                },
            );
        }
    }
}

fn draw_legend(surface: &mut Surface, datasets: &[Dataset], theme: &Theme) {
    let entries: Vec<&Dataset> = datasets.iter().filter(|d| !d.label.is_empty()).collect();
    if entries.is_empty() {
        return;
    }

    let row_h = 0.045;
    let longest = entries
        .iter()
        .map(|d| d.label.chars().count())
        .max()
        .unwrap_or(0);
    let width = 0.07 + longest as f32 * 0.011;
    let height = entries.len() as f32 * row_h + 0.02;
    let x0 = 0.98 - width;
    let y0 = 0.97 - height;

    surface.fill_rect(
        x0,
        y0,
        width,
        height,
        &FillStyle {
            color: "bg",
            alpha: 0.9,
            stroke: Some("border"),
            rounded: true,
            ..FillStyle::default()
        },
    );
    for (i, dataset) in entries.iter().enumerate() {
        let y = y0 + height - 0.01 - (i as f32 + 0.5) * row_h;
        surface.fill_rect(
            x0 + 0.012,
            y - 0.008,
            0.03,
            0.016,
            &FillStyle {
                color: &dataset.color,
                ..FillStyle::default()
            },
        );
        surface.draw_text(
            x0 + 0.05,
            y,
            &dataset.label,
            &TextStyle {
                anchor: Anchor::Start,
                ..TextStyle::new(theme.font.note, "text")
            },
        );
    }
}

/// Linear interpolation of a sampled series at `x`. Returns `None` when `x`
/// falls outside the sampled range.
pub(crate) fn interpolate_at(xs: &[f64], values: &[f64], x: f64) -> Option<f64> {
    let count = xs.len().min(values.len());
    for j in 0..count.saturating_sub(1) {
        let (x0, x1) = (xs[j], xs[j + 1]);
        if x0 <= x && x <= x1 {
            if (x1 - x0).abs() < f64::EPSILON {
                return Some(values[j]);
            }
            let t = (x - x0) / (x1 - x0);
            return Some(values[j] + t * (values[j + 1] - values[j]));
        }
    }
    None
}

fn format_tick(value: f64, format: YFormat) -> String {
    match format {
        YFormat::Currency => format!("${}", group_thousands(value)),
        YFormat::Percent => format!("{value:.0}%"),
        YFormat::Number => {
            if (value - value.round()).abs() < 1e-6 {
                format!("{value:.0}")
            } else {
                format!("{value:.2}")
            }
        }
    }
}

fn group_thousands(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.abs().to_string();
    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crossover_interpolates_between_bracketing_samples() {
        // Two monotonic series sampled at the same x values: at x=5 both
        // sit exactly at 2.
        let xs = [0.0, 10.0];
        let series_a = [1.0, 3.0];
        let series_b = [2.0, 2.0];
        assert_eq!(interpolate_at(&xs, &series_a, 5.0), Some(2.0));
        assert_eq!(interpolate_at(&xs, &series_b, 5.0), Some(2.0));
    }

    #[test]
    fn interpolation_is_exact_at_sample_points() {
        let xs = [0.0, 4.0, 8.0];
        let ys = [10.0, 20.0, 40.0];
        assert_eq!(interpolate_at(&xs, &ys, 4.0), Some(20.0));
        assert_eq!(interpolate_at(&xs, &ys, 6.0), Some(30.0));
    }

    #[test]
    fn out_of_range_crossover_is_none() {
        assert_eq!(interpolate_at(&[0.0, 1.0], &[1.0, 2.0], 5.0), None);
        assert_eq!(interpolate_at(&[], &[], 0.0), None);
    }

    #[test]
    fn currency_ticks_group_thousands() {
        assert_eq!(format_tick(1234567.0, YFormat::Currency), "$1,234,567");
        assert_eq!(format_tick(950.0, YFormat::Currency), "$950");
        assert_eq!(format_tick(-1200.0, YFormat::Currency), "$-1,200");
    }

    #[test]
    fn percent_and_number_ticks() {
        assert_eq!(format_tick(12.0, YFormat::Percent), "12%");
        assert_eq!(format_tick(3.0, YFormat::Number), "3");
        assert_eq!(format_tick(2.5, YFormat::Number), "2.50");
    }
}
