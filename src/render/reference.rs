use std::f32::consts::PI;
use std::path::Path;

use crate::data::{CategoryCard, CenterBox, CycleStage, Perspective, ReferenceData, SatelliteBox};
use crate::manifest::FigureSpec;
use crate::surface::{
    contrast_text_color, Anchor, ArrowStyle, BoxStyle, FillStyle, RenderError, Surface, TextStyle,
    VAlign,
};
use crate::theme::Theme;

// Circular placements are compressed vertically to compensate for the
// landscape content region.
const ASPECT: f32 = 0.85;

pub(crate) fn render(
    spec: &FigureSpec,
    data: &ReferenceData,
    theme: &Theme,
    out: &Path,
) -> Result<(), RenderError> {
    match data {
        ReferenceData::FiveForces { center, forces } => {
            render_five_forces(spec, center, forces, theme, out)
        }
        ReferenceData::BalancedScorecard {
            perspectives,
            center,
        } => render_balanced_scorecard(spec, perspectives, center, theme, out),
        ReferenceData::Hexagon { hexagons, center } => {
            render_hexagon(spec, hexagons, center.as_ref(), theme, out)
        }
        ReferenceData::CategoryGrid {
            categories,
            columns,
        } => render_category_grid(spec, categories, *columns, theme, out),
        ReferenceData::Radial { center, spokes } => {
            render_radial(spec, center, spokes, theme, out)
        }
        ReferenceData::Cycle { stages } => render_cycle(spec, stages, theme, out),
    }
}

/// Angle of satellite `i` of `n`, starting at the top and walking
/// clockwise.
fn satellite_angle(i: usize, n: usize) -> f32 {
    PI / 2.0 - 2.0 * PI * i as f32 / n.max(1) as f32
}

fn on_circle(radius: f32, angle: f32) -> (f32, f32) {
    (
        0.5 + radius * angle.cos(),
        0.5 + radius * angle.sin() * ASPECT,
    )
}

fn item_anchor(angle: f32) -> Anchor {
    if angle.cos() > 0.1 {
        Anchor::Start
    } else if angle.cos() < -0.1 {
        Anchor::End
    } else {
        Anchor::Middle
    }
}

fn render_five_forces(
    spec: &FigureSpec,
    center: &CenterBox,
    forces: &[SatelliteBox],
    theme: &Theme,
    out: &Path,
) -> Result<(), RenderError> {
    let mut surface = Surface::new(theme, &spec.figure_number, &spec.title, spec.tall);
    surface.hide_axes();

    let (cw, ch) = (0.28, 0.18);
    surface.draw_box(
        0.5 - cw / 2.0,
        0.5 - ch / 2.0,
        cw,
        ch,
        &center.label,
        &BoxStyle {
            color: &center.color,
            font_size: Some(theme.font.cell_label),
            ..BoxStyle::default()
        },
    );
    for (j, item) in center.items.iter().take(3).enumerate() {
        surface.draw_text(
            0.5,
            0.5 - ch / 2.0 - 0.04 - j as f32 * 0.035,
            &format!("• {item}"),
            &TextStyle {
                valign: VAlign::Top,
                ..TextStyle::new(theme.font.fine, "text_secondary")
            },
        );
    }

    // Compass positions: top, right, bottom, left; each arrow points at
    // the nearest edge of the center box.
    let placements = [
        (0.5, 0.88, (0.5, 0.5 + ch / 2.0)),
        (0.85, 0.5, (0.5 + cw / 2.0, 0.5)),
        (0.5, 0.12, (0.5, 0.5 - ch / 2.0)),
        (0.15, 0.5, (0.5 - cw / 2.0, 0.5)),
    ];
    let (fw, fh) = (0.22, 0.12);

    for (i, force) in forces.iter().take(4).enumerate() {
        let (fx, fy, target) = placements[i];
        surface.draw_box(
            fx - fw / 2.0,
            fy - fh / 2.0,
            fw,
            fh,
            &force.label,
            &BoxStyle {
                color: &force.color,
                font_size: Some(theme.font.body),
                ..BoxStyle::default()
            },
        );

        let (ax, ay) = match i {
            0 => (fx, fy - fh / 2.0),
            1 => (fx - fw / 2.0, fy),
            2 => (fx, fy + fh / 2.0),
            _ => (fx + fw / 2.0, fy),
        };
        surface.draw_arrow(ax, ay, target.0, target.1, None, "orange", ArrowStyle::Forward, 2.0);

        for (j, item) in force.items.iter().take(3).enumerate() {
            // Top/bottom forces list items to the right of the box; side
            // forces list them beneath.
            let (ix, iy, anchor) = match i {
                0 => (fx + fw / 2.0 + 0.02, fy - 0.01 - j as f32 * 0.03, Anchor::Start),
                2 => (fx + fw / 2.0 + 0.02, fy + 0.01 - j as f32 * 0.03, Anchor::Start),
                _ => (fx, fy - fh / 2.0 - 0.03 - j as f32 * 0.03, Anchor::Middle),
            };
            surface.draw_text(
                ix,
                iy,
                &format!("• {item}"),
                &TextStyle {
                    anchor,
                    ..TextStyle::new(theme.font.fine, "text_secondary")
                },
            );
        }
    }

    surface.persist(out)
}

fn render_balanced_scorecard(
    spec: &FigureSpec,
    perspectives: &[Perspective],
    center: &CenterBox,
    theme: &Theme,
    out: &Path,
) -> Result<(), RenderError> {
    let mut surface = Surface::new(theme, &spec.figure_number, &spec.title, spec.tall);
    surface.hide_axes();

    surface.draw_circle(
        0.5,
        0.5,
        0.10,
        &FillStyle {
            color: &center.color,
            stroke: Some("white"),
            stroke_width: 2.0,
            ..FillStyle::default()
        },
    );
    surface.draw_text(
        0.5,
        0.5,
        &center.label,
        &TextStyle {
            bold: true,
            wrap: 12,
            ..TextStyle::new(theme.font.body, contrast_text_color(theme, &center.color))
        },
    );

    // Top, right, bottom, left cards.
    let placements = [
        (0.5, 0.85, 0.35, 0.14),
        (0.82, 0.5, 0.28, 0.20),
        (0.5, 0.15, 0.35, 0.14),
        (0.18, 0.5, 0.28, 0.20),
    ];

    for (i, perspective) in perspectives.iter().take(4).enumerate() {
        let (px, py, pw, ph) = placements[i];
        let header_h = 0.05;
        let card_x = px - pw / 2.0;

        surface.fill_rect(
            card_x,
            py + ph / 2.0 - header_h,
            pw,
            header_h,
            &FillStyle {
                color: &perspective.color,
                rounded: true,
                stroke: None,
                ..FillStyle::default()
            },
        );
        surface.draw_text(
            px,
            py + ph / 2.0 - header_h / 2.0,
            &perspective.name,
            &TextStyle {
                bold: true,
                ..TextStyle::new(
                    theme.font.body,
                    contrast_text_color(theme, &perspective.color),
                )
            },
        );

        let content_h = ph - header_h - 0.01;
        surface.fill_rect(
            card_x,
            py - ph / 2.0,
            pw,
            content_h,
            &FillStyle {
                color: "white",
                stroke: Some("border"),
                rounded: true,
                ..FillStyle::default()
            },
        );

        let spacing = (content_h / (perspective.measures.len() as f32 + 0.5)).min(0.035);
        for (j, measure) in perspective.measures.iter().take(5).enumerate() {
            surface.draw_text(
                card_x + 0.02,
                py - ph / 2.0 + content_h - 0.02 - j as f32 * spacing,
                &format!("• {measure}"),
                &TextStyle {
                    anchor: Anchor::Start,
                    valign: VAlign::Top,
                    ..TextStyle::new(theme.font.fine, "text")
                },
            );
        }

        // Double-headed connector between the card and the center circle.
        let dx = 0.5 - px;
        let dy = 0.5 - py;
        let dist = (dx * dx + dy * dy).sqrt();
        if dist > 0.0 {
            let start_x = px + dx * (0.12 / dist) * (pw / 0.3);
            let start_y = py + dy * (0.12 / dist) * (ph / 0.18);
            let end_x = 0.5 - dx * (0.10 / dist);
            let end_y = 0.5 - dy * (0.10 / dist);
            surface.draw_arrow(
                start_x,
                start_y,
                end_x,
                end_y,
                None,
                "steel_blue",
                ArrowStyle::Both,
                1.5,
            );
        }
    }

    surface.persist(out)
}

fn render_hexagon(
    spec: &FigureSpec,
    hexagons: &[SatelliteBox],
    center: Option<&CenterBox>,
    theme: &Theme,
    out: &Path,
) -> Result<(), RenderError> {
    let mut surface = Surface::new(theme, &spec.figure_number, &spec.title, spec.tall);
    surface.hide_axes();

    if let Some(center) = center {
        draw_hex(
            &mut surface,
            theme,
            0.5,
            0.5,
            0.10,
            &center.label,
            &center.color,
            theme.font.body,
        );
    }

    let n = hexagons.len();
    let radius = 0.28;
    for (i, hexagon) in hexagons.iter().enumerate() {
        let angle = satellite_angle(i, n);
        let (hx, hy) = on_circle(radius, angle);
        draw_hex(
            &mut surface,
            theme,
            hx,
            hy,
            0.09,
            &hexagon.label,
            &hexagon.color,
            theme.font.note,
        );

        if center.is_some() {
            let (sx, sy) = on_circle(0.12, angle);
            surface.draw_arrow(
                sx,
                sy,
                hx - 0.08 * angle.cos(),
                hy - 0.08 * angle.sin() * ASPECT,
                None,
                "border",
                ArrowStyle::Plain,
                1.0,
            );
        }

        for (j, item) in hexagon.items.iter().take(3).enumerate() {
            let item_r = radius + 0.14 + j as f32 * 0.03;
            let (ix, iy) = on_circle(item_r, angle);
            surface.draw_text(
                ix,
                iy,
                &format!("• {item}"),
                &TextStyle {
                    anchor: item_anchor(angle),
                    ..TextStyle::new(theme.font.fine, "text_secondary")
                },
            );
        }
    }

    surface.persist(out)
}

#[allow(clippy::too_many_arguments)]
fn draw_hex(
    surface: &mut Surface,
    theme: &Theme,
    cx: f32,
    cy: f32,
    size: f32,
    label: &str,
    color: &str,
    font_size: f32,
) {
    // Flat-top hexagon, compressed vertically like the circular layouts.
    let points: Vec<(f32, f32)> = (0..6)
        .map(|k| {
            let angle = PI / 3.0 * k as f32 + PI / 6.0;
            (
                cx + size * angle.cos(),
                cy + size * angle.sin() * ASPECT,
            )
        })
        .collect();
    surface.draw_polygon(
        &points,
        &FillStyle {
            color,
            stroke: Some("white"),
            stroke_width: 2.0,
            ..FillStyle::default()
        },
    );
    surface.draw_text(
        cx,
        cy,
        label,
        &TextStyle {
            bold: true,
            wrap: 10,
            ..TextStyle::new(font_size, contrast_text_color(theme, color))
        },
    );
}

fn render_category_grid(
    spec: &FigureSpec,
    categories: &[CategoryCard],
    columns: usize,
    theme: &Theme,
    out: &Path,
) -> Result<(), RenderError> {
    let mut surface = Surface::new(theme, &spec.figure_number, &spec.title, spec.tall);
    surface.hide_axes();

    let n = categories.len();
    if n == 0 {
        return surface.persist(out);
    }
    let n_cols = columns.max(1);
    let n_rows = n.div_ceil(n_cols);

    let margin = 0.05;
    let gap = 0.03;
    let card_w = (1.0 - 2.0 * margin - gap * (n_cols as f32 - 1.0)) / n_cols as f32;
    let card_h = (1.0 - 2.0 * margin - gap * (n_rows as f32 - 1.0)) / n_rows as f32;
    let header_h = (card_h * 0.25).min(0.06);

    for (i, category) in categories.iter().enumerate() {
        let row = i / n_cols;
        let col = i % n_cols;
        let x = margin + col as f32 * (card_w + gap);
        let y = 1.0 - margin - (row as f32 + 1.0) * (card_h + gap) + gap;

        surface.fill_rect(
            x,
            y + card_h - header_h,
            card_w,
            header_h,
            &FillStyle {
                color: &category.color,
                rounded: true,
                stroke: None,
                ..FillStyle::default()
            },
        );
        surface.draw_text(
            x + card_w / 2.0,
            y + card_h - header_h / 2.0,
            &category.header,
            &TextStyle {
                bold: true,
                ..TextStyle::new(theme.font.body, contrast_text_color(theme, &category.color))
            },
        );

        surface.fill_rect(
            x,
            y,
            card_w,
            card_h - header_h - 0.005,
            &FillStyle {
                color: "white",
                stroke: Some("border"),
                stroke_width: 0.8,
                rounded: true,
                ..FillStyle::default()
            },
        );

        let available = card_h - header_h - 0.02;
        let spacing = (available / category.items.len().max(1) as f32).min(0.035);
        for (j, item) in category.items.iter().enumerate() {
            surface.draw_text(
                x + 0.015,
                y + card_h - header_h - 0.02 - j as f32 * spacing,
                &format!("• {item}"),
                &TextStyle {
                    anchor: Anchor::Start,
                    valign: VAlign::Top,
                    wrap: 24,
                    ..TextStyle::new(theme.font.fine, "text")
                },
            );
        }
    }

    surface.persist(out)
}

fn render_radial(
    spec: &FigureSpec,
    center: &CenterBox,
    spokes: &[SatelliteBox],
    theme: &Theme,
    out: &Path,
) -> Result<(), RenderError> {
    let mut surface = Surface::new(theme, &spec.figure_number, &spec.title, spec.tall);
    surface.hide_axes();

    let (cw, ch) = (0.20, 0.12);
    surface.draw_box(
        0.5 - cw / 2.0,
        0.5 - ch / 2.0,
        cw,
        ch,
        &center.label,
        &BoxStyle {
            color: &center.color,
            font_size: Some(theme.font.cell_label),
            ..BoxStyle::default()
        },
    );

    let n = spokes.len();
    let radius = 0.32;
    let (spoke_w, spoke_h) = (0.18, 0.08);

    for (i, spoke) in spokes.iter().enumerate() {
        let angle = satellite_angle(i, n);
        let (sx, sy) = on_circle(radius, angle);

        surface.draw_box(
            sx - spoke_w / 2.0,
            sy - spoke_h / 2.0,
            spoke_w,
            spoke_h,
            &spoke.label,
            &BoxStyle {
                color: &spoke.color,
                font_size: Some(theme.font.note),
                wrap: 14,
                ..BoxStyle::default()
            },
        );

        let (ix, iy) = on_circle(0.11, angle);
        surface.draw_arrow(
            ix,
            iy,
            sx - 0.09 * angle.cos(),
            sy - 0.09 * angle.sin() * ASPECT,
            None,
            "steel_blue",
            ArrowStyle::Forward,
            1.5,
        );

        for (j, item) in spoke.items.iter().take(3).enumerate() {
            let (px, py) = on_circle(radius + 0.10 + j as f32 * 0.035, angle);
            surface.draw_text(
                px,
                py,
                &format!("• {item}"),
                &TextStyle {
                    anchor: item_anchor(angle),
                    ..TextStyle::new(theme.font.fine, "text_secondary")
                },
            );
        }
    }

    surface.persist(out)
}

fn render_cycle(
    spec: &FigureSpec,
    stages: &[CycleStage],
    theme: &Theme,
    out: &Path,
) -> Result<(), RenderError> {
    let mut surface = Surface::new(theme, &spec.figure_number, &spec.title, spec.tall);
    surface.hide_axes();

    let n = stages.len();
    if n == 0 {
        return surface.persist(out);
    }

    let radius = 0.30;
    let (box_w, box_h) = (0.16, 0.08);

    for (i, stage) in stages.iter().enumerate() {
        let angle = satellite_angle(i, n);
        let (sx, sy) = on_circle(radius, angle);

        surface.draw_box(
            sx - box_w / 2.0,
            sy - box_h / 2.0,
            box_w,
            box_h,
            &stage.label,
            &BoxStyle {
                color: &stage.color,
                font_size: Some(theme.font.note),
                wrap: 14,
                ..BoxStyle::default()
            },
        );

        if !stage.sublabel.is_empty() {
            surface.draw_text(
                sx,
                sy - box_h / 2.0 - 0.03,
                &stage.sublabel,
                &TextStyle {
                    valign: VAlign::Top,
                    wrap: 18,
                    ..TextStyle::new(theme.font.fine, "text_secondary")
                },
            );
        }

        // Connector to the successor, closing the loop on the last stage.
        let next_angle = satellite_angle((i + 1) % n, n);
        let (nx, ny) = on_circle(radius, next_angle);
        let dx = nx - sx;
        let dy = ny - sy;
        let dist = (dx * dx + dy * dy).sqrt().max(1e-6);
        let inset = 0.09;
        surface.draw_arrow(
            sx + dx / dist * inset,
            sy + dy / dist * inset,
            nx - dx / dist * inset,
            ny - dy / dist * inset,
            None,
            "steel_blue",
            ArrowStyle::Forward,
            1.5,
        );
    }

    surface.persist(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn satellites_start_at_the_top_and_walk_clockwise() {
        let top = satellite_angle(0, 4);
        assert!((top - PI / 2.0).abs() < 1e-6);
        // The second of four sits at the right-hand compass point.
        let right = satellite_angle(1, 4);
        assert!(right.cos() > 0.99);
        // The third sits at the bottom.
        let bottom = satellite_angle(2, 4);
        assert!((bottom.sin() + 1.0).abs() < 1e-5);
    }

    #[test]
    fn circle_placement_compresses_the_vertical_axis() {
        let (x_top, y_top) = on_circle(0.3, PI / 2.0);
        assert!((x_top - 0.5).abs() < 1e-6);
        assert!((y_top - (0.5 + 0.3 * ASPECT)).abs() < 1e-6);
        let (x_right, _) = on_circle(0.3, 0.0);
        assert!((x_right - 0.8).abs() < 1e-6);
    }
}
