use std::path::Path;

use crate::data::{Connectors, FlowStep, LinearFlowData, Orientation, SpectrumLabels, SupportBar};
use crate::manifest::FigureSpec;
use crate::surface::{
    contrast_text_color, Anchor, ArrowStyle, BoxStyle, FillStyle, RenderError, Surface, TextStyle,
    VAlign,
};
use crate::theme::Theme;

pub(crate) fn render(
    spec: &FigureSpec,
    data: &LinearFlowData,
    theme: &Theme,
    out: &Path,
) -> Result<(), RenderError> {
    match data {
        LinearFlowData::Arrows {
            orientation,
            steps,
            connectors,
            header,
            footer,
        } => render_arrows(spec, *orientation, steps, *connectors, header, footer, theme, out),
        LinearFlowData::Chevrons { steps } => render_chevrons(spec, steps, theme, out),
        LinearFlowData::Spectrum {
            steps,
            spectrum_labels,
        } => render_spectrum(spec, steps, spectrum_labels, theme, out),
        LinearFlowData::ValueChain { steps, support_bar } => {
            render_value_chain(spec, steps, support_bar.as_ref(), theme, out)
        }
    }
}

/// Chevron outline for step `i` of a chain: the first step has a flat left
/// edge, the last a flat right edge, interior steps are indented on both
/// sides.
fn chevron_points(
    x: f32,
    w: f32,
    y_center: f32,
    h: f32,
    indent: f32,
    first: bool,
    last: bool,
) -> Vec<(f32, f32)> {
    let bottom = y_center - h / 2.0;
    let top = y_center + h / 2.0;
    match (first, last) {
        (true, true) => vec![(x, bottom), (x + w, bottom), (x + w, top), (x, top)],
        (true, false) => vec![
            (x, bottom),
            (x + w - indent, bottom),
            (x + w + indent, y_center),
            (x + w - indent, top),
            (x, top),
        ],
        (false, true) => vec![
            (x - indent, bottom),
            (x + w, bottom),
            (x + w, top),
            (x - indent, top),
            (x + indent, y_center),
        ],
        (false, false) => vec![
            (x - indent, bottom),
            (x + w - indent, bottom),
            (x + w + indent, y_center),
            (x + w - indent, top),
            (x - indent, top),
            (x + indent, y_center),
        ],
    }
}

#[allow(clippy::too_many_arguments)]
fn render_arrows(
    spec: &FigureSpec,
    orientation: Orientation,
    steps: &[FlowStep],
    connectors: Connectors,
    header: &str,
    footer: &str,
    theme: &Theme,
    out: &Path,
) -> Result<(), RenderError> {
    let mut surface = Surface::new(theme, &spec.figure_number, &spec.title, spec.tall);
    surface.hide_axes();

    let n = steps.len();
    if n == 0 {
        return surface.persist(out);
    }

    let margin = 0.08;
    let gap = 0.04;

    match orientation {
        Orientation::Horizontal => {
            let step_w = (1.0 - 2.0 * margin - gap * (n as f32 - 1.0)) / n as f32;
            let step_h = 0.25;
            let y_center = 0.55;

            for (i, step) in steps.iter().enumerate() {
                let x = margin + i as f32 * (step_w + gap);
                surface.draw_box(
                    x,
                    y_center - step_h / 2.0,
                    step_w,
                    step_h,
                    &step.label,
                    &BoxStyle {
                        color: &step.color,
                        font_size: Some(theme.font.body),
                        wrap: 14,
                        ..BoxStyle::default()
                    },
                );

                if !step.sublabel.is_empty() {
                    surface.draw_text(
                        x + step_w / 2.0,
                        y_center - step_h / 2.0 - 0.04,
                        &step.sublabel,
                        &TextStyle {
                            valign: VAlign::Top,
                            wrap: 18,
                            ..TextStyle::new(theme.font.note, "text_secondary")
                        },
                    );
                }
                for (j, item) in step.items.iter().take(4).enumerate() {
                    surface.draw_text(
                        x + step_w / 2.0,
                        y_center - step_h / 2.0 - 0.08 - j as f32 * 0.04,
                        &format!("• {item}"),
                        &TextStyle {
                            valign: VAlign::Top,
                            ..TextStyle::new(theme.font.fine, "text_secondary")
                        },
                    );
                }

                if i < n - 1 && connectors != Connectors::None {
                    let x_end = x + step_w;
                    let style = match connectors {
                        Connectors::Lines => ArrowStyle::Plain,
                        _ => ArrowStyle::Forward,
                    };
                    surface.draw_arrow(
                        x_end + gap * 0.15,
                        y_center,
                        x_end + gap * 0.85,
                        y_center,
                        None,
                        "steel_blue",
                        style,
                        2.0,
                    );
                }
            }
        }
        Orientation::Vertical => {
            let step_w = 0.35;
            let step_h = (1.0 - 2.0 * margin - gap * (n as f32 - 1.0)) / n as f32;
            let x_center = 0.35;

            for (i, step) in steps.iter().enumerate() {
                let y = 1.0 - margin - (i as f32 + 1.0) * (step_h + gap) + gap;
                surface.draw_box(
                    x_center - step_w / 2.0,
                    y,
                    step_w,
                    step_h,
                    &step.label,
                    &BoxStyle {
                        color: &step.color,
                        font_size: Some(theme.font.body),
                        wrap: 20,
                        ..BoxStyle::default()
                    },
                );

                for (j, item) in step.items.iter().take(4).enumerate() {
                    surface.draw_text(
                        x_center + step_w / 2.0 + 0.05,
                        y + step_h / 2.0 + 0.02 - j as f32 * 0.035,
                        &format!("• {item}"),
                        &TextStyle {
                            anchor: Anchor::Start,
                            ..TextStyle::new(theme.font.note, "text_secondary")
                        },
                    );
                }

                if i < n - 1 && connectors != Connectors::None {
                    let style = match connectors {
                        Connectors::Lines => ArrowStyle::Plain,
                        _ => ArrowStyle::Forward,
                    };
                    surface.draw_arrow(
                        x_center,
                        y - 0.01,
                        x_center,
                        y - gap * 0.8,
                        None,
                        "steel_blue",
                        style,
                        2.0,
                    );
                }
            }
        }
    }

    if !header.is_empty() {
        surface.draw_text(
            0.5,
            0.97,
            header,
            &TextStyle {
                bold: true,
                valign: VAlign::Top,
                ..TextStyle::new(theme.font.cell_label, "text")
            },
        );
    }
    if !footer.is_empty() {
        surface.draw_text(
            0.5,
            0.02,
            footer,
            &TextStyle {
                italic: true,
                valign: VAlign::Bottom,
                ..TextStyle::new(theme.font.note, "text_secondary")
            },
        );
    }

    surface.persist(out)
}

fn render_chevrons(
    spec: &FigureSpec,
    steps: &[FlowStep],
    theme: &Theme,
    out: &Path,
) -> Result<(), RenderError> {
    let mut surface = Surface::new(theme, &spec.figure_number, &spec.title, spec.tall);
    surface.hide_axes();

    let n = steps.len();
    if n == 0 {
        return surface.persist(out);
    }

    let margin = 0.05;
    let chevron_h = 0.22;
    let y_center = 0.55;
    let indent = 0.025;
    let chev_w = (1.0 - 2.0 * margin) / n as f32;

    for (i, step) in steps.iter().enumerate() {
        let x = margin + i as f32 * chev_w;
        surface.draw_polygon(
            &chevron_points(x, chev_w, y_center, chevron_h, indent, i == 0, i == n - 1),
            &FillStyle {
                color: &step.color,
                stroke: Some("white"),
                stroke_width: 2.0,
                ..FillStyle::default()
            },
        );
        surface.draw_text(
            x + chev_w / 2.0,
            y_center,
            &step.label,
            &TextStyle {
                bold: true,
                wrap: 12,
                ..TextStyle::new(theme.font.body, contrast_text_color(theme, &step.color))
            },
        );

        for (j, item) in step.items.iter().take(4).enumerate() {
            surface.draw_text(
                x + chev_w / 2.0,
                y_center - chevron_h / 2.0 - 0.05 - j as f32 * 0.04,
                &format!("• {item}"),
                &TextStyle {
                    valign: VAlign::Top,
                    ..TextStyle::new(theme.font.fine, "text_secondary")
                },
            );
        }
    }

    surface.persist(out)
}

fn render_spectrum(
    spec: &FigureSpec,
    steps: &[FlowStep],
    labels: &SpectrumLabels,
    theme: &Theme,
    out: &Path,
) -> Result<(), RenderError> {
    let mut surface = Surface::new(theme, &spec.figure_number, &spec.title, spec.tall);
    surface.hide_axes();

    let n = steps.len();
    let margin = 0.08;
    let bar_h = 0.15;
    let y_center = 0.55;
    let seg_w = (1.0 - 2.0 * margin) / n.max(1) as f32;

    for (i, step) in steps.iter().enumerate() {
        let x = margin + i as f32 * seg_w;
        surface.fill_rect(
            x,
            y_center - bar_h / 2.0,
            seg_w,
            bar_h,
            &FillStyle {
                color: &step.color,
                stroke: Some("white"),
                ..FillStyle::default()
            },
        );
        surface.draw_text(
            x + seg_w / 2.0,
            y_center,
            &step.label,
            &TextStyle {
                bold: true,
                wrap: 14,
                ..TextStyle::new(theme.font.note, contrast_text_color(theme, &step.color))
            },
        );

        for (j, item) in step.items.iter().take(3).enumerate() {
            surface.draw_text(
                x + seg_w / 2.0,
                y_center - bar_h / 2.0 - 0.04 - j as f32 * 0.04,
                &format!("• {item}"),
                &TextStyle {
                    valign: VAlign::Top,
                    ..TextStyle::new(theme.font.fine, "text_secondary")
                },
            );
        }
    }

    if !labels.left.is_empty() {
        surface.draw_text(
            margin,
            y_center + bar_h / 2.0 + 0.04,
            &format!("← {}", labels.left),
            &TextStyle {
                bold: true,
                anchor: Anchor::Start,
                valign: VAlign::Bottom,
                ..TextStyle::new(theme.font.body, "text")
            },
        );
    }
    if !labels.right.is_empty() {
        surface.draw_text(
            1.0 - margin,
            y_center + bar_h / 2.0 + 0.04,
            &format!("{} →", labels.right),
            &TextStyle {
                bold: true,
                anchor: Anchor::End,
                valign: VAlign::Bottom,
                ..TextStyle::new(theme.font.body, "text")
            },
        );
    }

    surface.persist(out)
}

fn render_value_chain(
    spec: &FigureSpec,
    steps: &[FlowStep],
    support_bar: Option<&SupportBar>,
    theme: &Theme,
    out: &Path,
) -> Result<(), RenderError> {
    let mut surface = Surface::new(theme, &spec.figure_number, &spec.title, spec.tall);
    surface.hide_axes();

    let n = steps.len();
    if n == 0 {
        return surface.persist(out);
    }

    let margin = 0.06;
    let support_h = if support_bar.is_some() { 0.18 } else { 0.0 };
    let primary_top = 0.92 - support_h;
    let primary_h = 0.30;
    let primary_y = primary_top - primary_h;

    if let Some(bar) = support_bar {
        surface.fill_rect(
            margin,
            primary_top + 0.02,
            1.0 - 2.0 * margin,
            support_h - 0.04,
            &FillStyle {
                color: &bar.color,
                alpha: 0.3,
                stroke: Some("border"),
                rounded: true,
                ..FillStyle::default()
            },
        );
        surface.draw_text(
            margin + 0.03,
            primary_top + support_h / 2.0,
            &bar.label,
            &TextStyle {
                bold: true,
                anchor: Anchor::Start,
                ..TextStyle::new(theme.font.body, "text")
            },
        );
        let item_w = (1.0 - 2.0 * margin - 0.25) / bar.items.len().max(1) as f32;
        for (j, item) in bar.items.iter().enumerate() {
            surface.draw_text(
                margin + 0.25 + j as f32 * item_w,
                primary_top + support_h / 2.0,
                &format!("• {item}"),
                &TextStyle {
                    anchor: Anchor::Start,
                    ..TextStyle::new(theme.font.note, "text_secondary")
                },
            );
        }
    }

    let indent = 0.02;
    let total_w = 1.0 - 2.0 * margin;
    let chev_w = total_w / n as f32;
    let y_center = primary_y + primary_h / 2.0;

    for (i, step) in steps.iter().enumerate() {
        let x = margin + i as f32 * chev_w;
        surface.draw_polygon(
            &chevron_points(x, chev_w, y_center, primary_h, indent, i == 0, i == n - 1),
            &FillStyle {
                color: &step.color,
                stroke: Some("white"),
                stroke_width: 2.0,
                ..FillStyle::default()
            },
        );

        let text_color = contrast_text_color(theme, &step.color).to_string();
        surface.draw_text(
            x + chev_w / 2.0,
            y_center + 0.03,
            &step.label,
            &TextStyle {
                bold: true,
                wrap: 12,
                ..TextStyle::new(theme.font.body, &text_color)
            },
        );
        for (j, item) in step.items.iter().take(3).enumerate() {
            surface.draw_text(
                x + chev_w / 2.0,
                y_center - 0.04 - j as f32 * 0.04,
                item,
                &TextStyle {
                    alpha: 0.85,
                    ..TextStyle::new(theme.font.fine, &text_color)
                },
            );
        }
    }

    // Trailing profit wedge.
    let wedge_x = margin + total_w;
    let wedge_w = 0.06;
    surface.draw_polygon(
        &[
            (wedge_x - 0.01, primary_y),
            (wedge_x + wedge_w, y_center),
            (wedge_x - 0.01, primary_y + primary_h),
        ],
        &FillStyle {
            color: "gold",
            stroke: Some("border"),
            ..FillStyle::default()
        },
    );
    surface.draw_text(
        wedge_x + wedge_w * 0.35,
        y_center,
        "M\nA\nR\nG\nI\nN",
        &TextStyle {
            bold: true,
            ..TextStyle::new(theme.font.fine, "text")
        },
    );

    surface.persist(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interior_chevrons_are_indented_on_both_sides() {
        let pts = chevron_points(0.3, 0.2, 0.5, 0.2, 0.025, false, false);
        assert_eq!(pts.len(), 6);
        // Leading edge is a notch: outline x runs behind the nominal left.
        assert!(pts.iter().any(|&(x, _)| x < 0.3));
        // Trailing point extends past the nominal right edge.
        assert!(pts.iter().any(|&(x, _)| x > 0.5));
    }

    #[test]
    fn chain_ends_have_flat_edges() {
        let first = chevron_points(0.0, 0.2, 0.5, 0.2, 0.025, true, false);
        assert!(first.iter().all(|&(x, _)| x >= 0.0));
        let last = chevron_points(0.8, 0.2, 0.5, 0.2, 0.025, false, true);
        assert!(last.iter().all(|&(x, _)| x <= 1.0));
    }
}
