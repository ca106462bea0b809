use std::path::Path;

use crate::data::AxisQuadrantData;
use crate::manifest::FigureSpec;
use crate::surface::{
    Anchor, ArrowStyle, FillStyle, LinePattern, RenderError, Surface, TextStyle, VAlign,
};
use crate::theme::Theme;

/// True coordinate-plane layout over a symmetric range: quadrant fills
/// behind a unit grid, a bold crosshair with arrowheads at all four ends,
/// an optional vector from the origin and optional labeled scatter points.
pub(crate) fn render(
    spec: &FigureSpec,
    data: &AxisQuadrantData,
    theme: &Theme,
    out: &Path,
) -> Result<(), RenderError> {
    let mut surface = Surface::new(theme, &spec.figure_number, &spec.title, spec.tall);
    surface.hide_axes();

    let r = if data.axis_range > 0.0 {
        data.axis_range
    } else {
        6.0
    };
    // Data coordinates span [-r-0.5, r+0.5] on both axes.
    let span = 2.0 * r + 1.0;
    let ux = |x: f32| (x + r + 0.5) / span;
    let uy = |y: f32| (y + r + 0.5) / span;

    // Quadrant fills first, behind everything. Q1 TR, Q2 TL, Q3 BL, Q4 BR.
    let quad_origins = [(0.0, 0.0), (-r, 0.0), (-r, -r), (0.0, -r)];
    for (quadrant, &(qx, qy)) in data.quadrants.iter().zip(quad_origins.iter()) {
        surface.fill_rect(
            ux(qx),
            uy(qy),
            r / span,
            r / span,
            &FillStyle {
                color: &quadrant.color,
                alpha: 0.15,
                stroke: None,
                ..FillStyle::default()
            },
        );
    }

    if data.show_grid {
        for v in -(r as i32)..=(r as i32) {
            if v == 0 {
                continue;
            }
            let v = v as f32;
            surface.draw_line(ux(-r - 0.5), uy(v), ux(r + 0.5), uy(v), "grid", 0.5, LinePattern::Solid);
            surface.draw_line(ux(v), uy(-r - 0.5), ux(v), uy(r + 0.5), "grid", 0.5, LinePattern::Solid);
        }
    }

    // Quadrant names and items sit above the fills and grid.
    for (quadrant, &(qx, qy)) in data.quadrants.iter().zip(quad_origins.iter()) {
        let label_x = ux(qx + r / 2.0);
        let label_y = uy(qy + r * 0.80);
        surface.draw_text(
            label_x,
            label_y,
            &quadrant.name,
            &TextStyle {
                bold: true,
                ..TextStyle::new(theme.font.cell_label, "text")
            },
        );
        for (j, item) in quadrant.items.iter().take(5).enumerate() {
            surface.draw_text(
                label_x,
                uy(qy + r * 0.80 - (j as f32 + 1.0) * r * 0.13),
                &format!("• {item}"),
                &TextStyle::new(theme.font.note, "text_secondary"),
            );
        }
    }

    // Bold crosshair with arrowheads at all four ends.
    surface.draw_line(ux(-r - 0.5), uy(0.0), ux(r + 0.5), uy(0.0), "text", 2.0, LinePattern::Solid);
    surface.draw_line(ux(0.0), uy(-r - 0.5), ux(0.0), uy(r + 0.5), "text", 2.0, LinePattern::Solid);
    let arrow_inset = r * 0.16;
    for (dx, dy) in [(1.0, 0.0), (-1.0, 0.0), (0.0, 1.0), (0.0, -1.0)] {
        surface.draw_arrow(
            ux(dx * (r - arrow_inset)),
            uy(dy * (r - arrow_inset)),
            ux(dx * r),
            uy(dy * r),
            None,
            "text",
            ArrowStyle::Forward,
            2.0,
        );
    }

    // Axis endpoint labels.
    let endpoint = |surface: &mut Surface,
                    label: &str,
                    x: f32,
                    y: f32,
                    anchor: Anchor,
                    valign: VAlign| {
        if !label.is_empty() {
            surface.draw_text(
                x,
                y,
                label,
                &TextStyle {
                    bold: true,
                    anchor,
                    valign,
                    ..TextStyle::new(theme.font.note, "text_secondary")
                },
            );
        }
    };
    endpoint(&mut surface, &data.x_pos_label, ux(r), uy(-0.4), Anchor::Middle, VAlign::Top);
    endpoint(&mut surface, &data.x_neg_label, ux(-r), uy(-0.4), Anchor::Middle, VAlign::Top);
    endpoint(&mut surface, &data.y_pos_label, ux(0.4), uy(r), Anchor::Start, VAlign::Bottom);
    endpoint(&mut surface, &data.y_neg_label, ux(0.4), uy(-r), Anchor::Start, VAlign::Top);

    if data.scale_labels {
        for v in -(r as i32)..=(r as i32) {
            if v == 0 {
                continue;
            }
            let vf = v as f32;
            surface.draw_text(
                ux(vf),
                uy(-0.3),
                &v.to_string(),
                &TextStyle {
                    valign: VAlign::Top,
                    ..TextStyle::new(theme.font.fine, "text_secondary")
                },
            );
            surface.draw_text(
                ux(-0.3),
                uy(vf),
                &v.to_string(),
                &TextStyle {
                    anchor: Anchor::End,
                    ..TextStyle::new(theme.font.fine, "text_secondary")
                },
            );
        }
    }

    if !data.x_label.is_empty() {
        surface.draw_text(
            ux(0.0),
            uy(-r - 0.3),
            &data.x_label,
            &TextStyle {
                bold: true,
                valign: VAlign::Top,
                ..TextStyle::new(theme.font.axis_label, "text")
            },
        );
    }
    if !data.y_label.is_empty() {
        surface.draw_text(
            ux(-r - 0.3),
            uy(0.0),
            &data.y_label,
            &TextStyle {
                bold: true,
                rotated: true,
                ..TextStyle::new(theme.font.axis_label, "text")
            },
        );
    }

    // Directional vector from the origin (SPACE-style resultant).
    if let Some(vector) = &data.vector {
        surface.draw_arrow(
            ux(0.0),
            uy(0.0),
            ux(vector.x),
            uy(vector.y),
            None,
            "red",
            ArrowStyle::Forward,
            3.0,
        );
        if !vector.label.is_empty() {
            surface.draw_plated_text(
                ux(vector.x * 1.1),
                uy(vector.y * 1.1),
                &vector.label,
                &TextStyle {
                    bold: true,
                    ..TextStyle::new(theme.font.body, "red")
                },
                Some("red"),
            );
        }
    }

    // Labeled scatter points (perceptual-map style).
    for point in &data.points {
        let marker_r = (point.size.max(1.0) / std::f32::consts::PI).sqrt();
        surface.draw_marker(
            ux(point.x),
            uy(point.y),
            marker_r,
            &FillStyle {
                color: &point.color,
                stroke: Some("text"),
                stroke_width: 0.8,
                ..FillStyle::default()
            },
        );
        if !point.label.is_empty() {
            surface.draw_text(
                ux(point.x + 0.2),
                uy(point.y + 0.2),
                &point.label,
                &TextStyle {
                    anchor: Anchor::Start,
                    valign: VAlign::Bottom,
                    ..TextStyle::new(theme.font.note, "text")
                },
            );
        }
    }

    surface.persist(out)
}
