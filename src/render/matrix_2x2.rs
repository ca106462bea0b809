use std::path::Path;

use crate::data::Matrix2x2Data;
use crate::manifest::FigureSpec;
use crate::surface::{
    contrast_text_color, Anchor, FillStyle, LinePattern, RenderError, Surface, TextStyle, VAlign,
};
use crate::theme::Theme;

/// Four equal quadrants around a crosshair, with endpoint labels outside
/// the bounding box. `axis_reversed` swaps the high/low ends of the x axis
/// for share-based frameworks where lower values sit to the right.
pub(crate) fn render(
    spec: &FigureSpec,
    data: &Matrix2x2Data,
    theme: &Theme,
    out: &Path,
) -> Result<(), RenderError> {
    let mut surface = Surface::new(theme, &spec.figure_number, &spec.title, spec.tall);
    surface.hide_axes();

    let (left, right, bottom, top) = (0.12, 0.95, 0.08, 0.92);
    let mid_x = (left + right) / 2.0;
    let mid_y = (bottom + top) / 2.0;
    let qw = (right - left) / 2.0;
    let qh = (top - bottom) / 2.0;

    // Crosshair sits beneath the translucent quadrant fills.
    surface.draw_line(mid_x, bottom, mid_x, top, "white", 2.0, LinePattern::Solid);
    surface.draw_line(left, mid_y, right, mid_y, "white", 2.0, LinePattern::Solid);

    // TL, TR, BL, BR
    let positions = [
        (left, mid_y),
        (mid_x, mid_y),
        (left, bottom),
        (mid_x, bottom),
    ];

    for (quadrant, &(x, y)) in data.quadrants.iter().zip(positions.iter()) {
        surface.fill_rect(
            x,
            y,
            qw,
            qh,
            &FillStyle {
                color: &quadrant.color,
                alpha: 0.85,
                stroke: Some("white"),
                stroke_width: 2.0,
                rounded: true,
            },
        );

        let cx = x + qw / 2.0;
        let cy = y + qh / 2.0;
        let text_color = contrast_text_color(theme, &quadrant.color).to_string();

        let name_y = if !quadrant.items.is_empty() {
            cy + qh * 0.25
        } else if !quadrant.subtitle.is_empty() {
            cy + qh * 0.10
        } else {
            cy
        };
        surface.draw_text(
            cx,
            name_y,
            &quadrant.name,
            &TextStyle {
                bold: true,
                ..TextStyle::new(theme.font.cell_label, &text_color)
            },
        );

        if !quadrant.subtitle.is_empty() {
            surface.draw_text(
                cx,
                name_y - qh * 0.12,
                &quadrant.subtitle,
                &TextStyle {
                    alpha: 0.9,
                    ..TextStyle::new(theme.font.note, &text_color)
                },
            );
        }

        let item_start_y = cy - qh * 0.05;
        for (j, item) in quadrant.items.iter().take(5).enumerate() {
            surface.draw_text(
                cx,
                item_start_y - j as f32 * qh * 0.12,
                &format!("• {item}"),
                &TextStyle {
                    alpha: 0.9,
                    wrap: 22,
                    ..TextStyle::new(theme.font.note, &text_color)
                },
            );
        }
    }

    if !data.x_label.is_empty() {
        surface.draw_text(
            mid_x,
            bottom - 0.05,
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
            left - 0.06,
            mid_y,
            &data.y_label,
            &TextStyle {
                bold: true,
                rotated: true,
                ..TextStyle::new(theme.font.axis_label, "text")
            },
        );
    }

    // Endpoint labels; axis_reversed puts the high x end on the left.
    if !data.x_high_label.is_empty() {
        let x = if data.axis_reversed { left } else { right };
        surface.draw_text(
            x,
            bottom - 0.02,
            &data.x_high_label,
            &TextStyle {
                valign: VAlign::Top,
                ..TextStyle::new(theme.font.note, "text_secondary")
            },
        );
    }
    if !data.x_low_label.is_empty() {
        let x = if data.axis_reversed { right } else { left };
        surface.draw_text(
            x,
            bottom - 0.02,
            &data.x_low_label,
            &TextStyle {
                valign: VAlign::Top,
                ..TextStyle::new(theme.font.note, "text_secondary")
            },
        );
    }
    if !data.y_high_label.is_empty() {
        surface.draw_text(
            left - 0.03,
            top,
            &data.y_high_label,
            &TextStyle {
                anchor: Anchor::End,
                ..TextStyle::new(theme.font.note, "text_secondary")
            },
        );
    }
    if !data.y_low_label.is_empty() {
        surface.draw_text(
            left - 0.03,
            bottom,
            &data.y_low_label,
            &TextStyle {
                anchor: Anchor::End,
                ..TextStyle::new(theme.font.note, "text_secondary")
            },
        );
    }

    surface.stroke_rect(
        left,
        bottom,
        right - left,
        top - bottom,
        "border",
        theme.page.border_width,
    );

    surface.persist(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::Topic;
    use crate::render::RendererKind;

    #[test]
    fn empty_quadrants_still_persist_an_image() {
        let theme = Theme::default_tokens();
        let spec = FigureSpec {
            id: "empty_matrix".to_string(),
            figure_number: "9.9".to_string(),
            topic: Topic::Numbered(9),
            title: "Empty".to_string(),
            filename: "empty_matrix.png".to_string(),
            renderer: RendererKind::Matrix2x2,
            data_file: String::new(),
            alt_text: String::new(),
            tall: false,
        };
        let data = Matrix2x2Data {
            x_label: String::new(),
            y_label: String::new(),
            x_low_label: String::new(),
            x_high_label: String::new(),
            y_low_label: String::new(),
            y_high_label: String::new(),
            quadrants: Vec::new(),
            axis_reversed: false,
        };
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("empty_matrix.png");
        render(&spec, &data, &theme, &out).unwrap();
        assert!(out.metadata().unwrap().len() > 0);
    }
}
