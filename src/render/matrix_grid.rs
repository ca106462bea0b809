use std::collections::BTreeMap;
use std::path::Path;

use crate::data::MatrixGridData;
use crate::manifest::FigureSpec;
use crate::surface::{Anchor, FillStyle, RenderError, Surface, TextStyle, VAlign};
use crate::theme::Theme;

/// Arbitrary N×M grid (IE matrix, SWOT and friends). Cell backgrounds may
/// come from a named region fill, which wins over a direct color.
pub(crate) fn render(
    spec: &FigureSpec,
    data: &MatrixGridData,
    theme: &Theme,
    out: &Path,
) -> Result<(), RenderError> {
    let mut surface = Surface::new(theme, &spec.figure_number, &spec.title, spec.tall);
    surface.hide_axes();

    let rows = data.rows.max(1);
    let cols = data.cols.max(1);

    let (left, right, bottom, top) = (0.15, 0.95, 0.10, 0.88);
    let grid_w = right - left;
    let grid_h = top - bottom;
    let cell_w = grid_w / cols as f32;
    let cell_h = grid_h / rows as f32;

    // Column headers across the top.
    for (j, label) in data.col_labels.iter().take(cols).enumerate() {
        let hx = left + j as f32 * cell_w;
        let hh = 0.05;
        surface.fill_rect(
            hx,
            top,
            cell_w,
            hh,
            &FillStyle {
                color: &data.header_colors.col,
                stroke: Some("white"),
                rounded: true,
                ..FillStyle::default()
            },
        );
        surface.draw_text(
            hx + cell_w / 2.0,
            top + hh / 2.0,
            label,
            &TextStyle {
                bold: true,
                ..TextStyle::new(theme.font.note, "text_on_dark")
            },
        );
    }

    // Row headers down the left side.
    let row_header_w = 0.08;
    for (i, label) in data.row_labels.iter().take(rows).enumerate() {
        let ry = top - (i as f32 + 1.0) * cell_h;
        surface.fill_rect(
            left - row_header_w,
            ry,
            row_header_w,
            cell_h,
            &FillStyle {
                color: &data.header_colors.row,
                stroke: Some("white"),
                rounded: true,
                ..FillStyle::default()
            },
        );
        surface.draw_text(
            left - row_header_w / 2.0,
            ry + cell_h / 2.0,
            label,
            &TextStyle {
                bold: true,
                wrap: 10,
                ..TextStyle::new(theme.font.note, "text_on_dark")
            },
        );
    }

    let mut cell_lookup = BTreeMap::new();
    for cell in &data.cells {
        cell_lookup.insert((cell.row, cell.col), cell);
    }

    for i in 0..rows {
        for j in 0..cols {
            let cx = left + j as f32 * cell_w;
            let cy = top - (i as f32 + 1.0) * cell_h;
            let cell = cell_lookup.get(&(i, j)).copied();

            let region_fill = cell
                .and_then(|c| c.region.as_deref())
                .and_then(|r| theme.region_fill(r));
            let (bg, alpha) = match (region_fill, cell.and_then(|c| c.color.as_deref())) {
                (Some((color, alpha)), _) => (color.to_string(), alpha),
                (None, Some(color)) => (color.to_string(), 1.0),
                (None, None) => ("white".to_string(), 1.0),
            };

            surface.fill_rect(
                cx,
                cy,
                cell_w,
                cell_h,
                &FillStyle {
                    color: &bg,
                    alpha,
                    stroke: data.show_grid_lines.then_some("border"),
                    ..FillStyle::default()
                },
            );

            let Some(cell) = cell else {
                continue;
            };

            if !cell.label.is_empty() {
                let label_y = if cell.items.is_empty() {
                    cy + cell_h / 2.0
                } else {
                    cy + cell_h * 0.7
                };
                surface.draw_text(
                    cx + cell_w / 2.0,
                    label_y,
                    &cell.label,
                    &TextStyle {
                        bold: true,
                        wrap: 18,
                        ..TextStyle::new(theme.font.body, "text")
                    },
                );
            }

            let item_start = cy + cell_h * 0.5;
            for (k, item) in cell.items.iter().take(4).enumerate() {
                surface.draw_text(
                    cx + cell_w * 0.15,
                    item_start - k as f32 * cell_h * 0.14,
                    &format!("• {item}"),
                    &TextStyle {
                        anchor: Anchor::Start,
                        ..TextStyle::new(theme.font.note, "text_secondary")
                    },
                );
            }
        }
    }

    // Optional numeric scale strings along each axis.
    for (j, s) in data.x_scale.iter().take(cols).enumerate() {
        surface.draw_text(
            left + j as f32 * cell_w + cell_w / 2.0,
            bottom - 0.03,
            s,
            &TextStyle {
                valign: VAlign::Top,
                ..TextStyle::new(theme.font.note, "text_secondary")
            },
        );
    }
    for (i, s) in data.y_scale.iter().take(rows).enumerate() {
        surface.draw_text(
            left - 0.12,
            top - i as f32 * cell_h - cell_h / 2.0,
            s,
            &TextStyle::new(theme.font.note, "text_secondary"),
        );
    }

    if !data.x_label.is_empty() {
        surface.draw_text(
            (left + right) / 2.0,
            bottom - 0.06,
            &data.x_label,
            &TextStyle {
                bold: true,
                valign: VAlign::Top,
                ..TextStyle::new(theme.font.axis_label, "text")
            },
        );
    }
    if !data.y_label.is_empty() {
        let offset = if data.row_labels.is_empty() { 0.0 } else { 0.04 };
        surface.draw_text(
            left - 0.12 - offset,
            (bottom + top) / 2.0,
            &data.y_label,
            &TextStyle {
                bold: true,
                rotated: true,
                ..TextStyle::new(theme.font.axis_label, "text")
            },
        );
    }

    surface.stroke_rect(left, bottom, grid_w, grid_h, "border", theme.page.border_width);

    surface.persist(out)
}
