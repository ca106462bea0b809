use std::collections::BTreeMap;
use std::path::Path;

use crate::data::{AnnotationSide, HierarchyData, PyramidLevel, TierBand, TreeNode};
use crate::manifest::FigureSpec;
use crate::surface::{
    contrast_text_color, Anchor, BoxStyle, FillStyle, LinePattern, RenderError, Surface, TextStyle,
};
use crate::theme::Theme;

pub(crate) fn render(
    spec: &FigureSpec,
    data: &HierarchyData,
    theme: &Theme,
    out: &Path,
) -> Result<(), RenderError> {
    match data {
        HierarchyData::Pyramid {
            levels,
            annotation_side,
        } => render_pyramid(spec, levels, *annotation_side, theme, out),
        HierarchyData::Tree { nodes, spacing } => render_tree(spec, nodes, *spacing, theme, out),
        HierarchyData::Tiers { tiers } => render_tiers(spec, tiers, theme, out),
    }
}

/// Trapezoid widths for pyramid level `i` of `n`: linear interpolation
/// between the minimum (apex) and maximum (base) widths.
pub(crate) fn level_widths(n: usize, i: usize, min_w: f32, max_w: f32) -> (f32, f32) {
    let n = n.max(1) as f32;
    let top = min_w + (max_w - min_w) * i as f32 / n;
    let bottom = min_w + (max_w - min_w) * (i as f32 + 1.0) / n;
    (top, bottom)
}

fn render_pyramid(
    spec: &FigureSpec,
    levels: &[PyramidLevel],
    annotation_side: AnnotationSide,
    theme: &Theme,
    out: &Path,
) -> Result<(), RenderError> {
    let mut surface = Surface::new(theme, &spec.figure_number, &spec.title, spec.tall);
    surface.hide_axes();

    let n = levels.len();
    if n == 0 {
        return surface.persist(out);
    }

    // Shift the apex left of center to leave room for side annotations.
    let center = 0.45;
    let (py_bottom, py_top) = (0.05, 0.95);
    let (min_w, max_w) = (0.12, 0.55);
    let tier_height = (py_top - py_bottom) / n as f32;

    for (i, level) in levels.iter().enumerate() {
        let y_top = py_top - i as f32 * tier_height;
        let y_bot = y_top - tier_height;
        let (w_top, w_bot) = level_widths(n, i, min_w, max_w);

        surface.draw_polygon(
            &[
                (center - w_top / 2.0, y_top),
                (center + w_top / 2.0, y_top),
                (center + w_bot / 2.0, y_bot),
                (center - w_bot / 2.0, y_bot),
            ],
            &FillStyle {
                color: &level.color,
                stroke: Some("white"),
                stroke_width: 2.0,
                ..FillStyle::default()
            },
        );

        let cy = (y_top + y_bot) / 2.0;
        surface.draw_text(
            center,
            cy,
            &level.label,
            &TextStyle {
                bold: true,
                wrap: 20,
                ..TextStyle::new(theme.font.body, contrast_text_color(theme, &level.color))
            },
        );

        if level.items.is_empty() {
            continue;
        }
        if matches!(annotation_side, AnnotationSide::Right | AnnotationSide::Both) {
            let ann_x = center + w_bot / 2.0 + 0.08;
            for (j, item) in level.items.iter().take(4).enumerate() {
                surface.draw_text(
                    ann_x,
                    cy + 0.02 - j as f32 * 0.04,
                    &format!("• {item}"),
                    &TextStyle {
                        anchor: Anchor::Start,
                        ..TextStyle::new(theme.font.note, "text_secondary")
                    },
                );
            }
            surface.draw_line(
                center + (w_top + w_bot) / 4.0,
                cy,
                ann_x - 0.02,
                cy,
                "border",
                0.8,
                LinePattern::Dashed,
            );
        }
        if matches!(annotation_side, AnnotationSide::Left | AnnotationSide::Both) {
            let ann_x = center - w_bot / 2.0 - 0.08;
            for (j, item) in level.items.iter().take(4).enumerate() {
                surface.draw_text(
                    ann_x,
                    cy + 0.02 - j as f32 * 0.04,
                    &format!("• {item}"),
                    &TextStyle {
                        anchor: Anchor::End,
                        ..TextStyle::new(theme.font.note, "text_secondary")
                    },
                );
            }
            surface.draw_line(
                center - (w_top + w_bot) / 4.0,
                cy,
                ann_x + 0.02,
                cy,
                "border",
                0.8,
                LinePattern::Dashed,
            );
        }
    }

    surface.persist(out)
}

fn render_tree(
    spec: &FigureSpec,
    nodes: &[TreeNode],
    spacing: f32,
    theme: &Theme,
    out: &Path,
) -> Result<(), RenderError> {
    let mut surface = Surface::new(theme, &spec.figure_number, &spec.title, spec.tall);
    surface.hide_axes();

    if nodes.is_empty() {
        return surface.persist(out);
    }

    let max_level = nodes.iter().map(|n| n.level).max().unwrap_or(0);
    let mut level_counts: BTreeMap<usize, usize> = BTreeMap::new();
    for node in nodes {
        *level_counts.entry(node.level).or_insert(0) += 1;
    }

    // Horizontal slot per node within its level, assigned in declaration
    // order; vertical position by depth.
    let mut level_indices: BTreeMap<usize, usize> = BTreeMap::new();
    let mut positions: BTreeMap<&str, (f32, f32)> = BTreeMap::new();
    for node in nodes {
        let idx = level_indices.entry(node.level).or_insert(0);
        let count = level_counts[&node.level] as f32;
        let x = (*idx as f32 + 0.5) / count;
        let y = 1.0 - (node.level as f32 + 0.5) / (max_level as f32 + 1.0) * 0.85 - 0.05;
        positions.insert(node.id.as_str(), (x, y));
        *idx += 1;
    }

    let widest = *level_counts.values().max().unwrap_or(&1) as f32;
    let node_w = (0.7 / widest).min(0.18) * spacing;
    let node_h = 0.06;

    // Elbow connectors run under the node boxes.
    for node in nodes {
        let (Some(parent), Some(&(cx, cy))) = (
            node.parent.as_deref().and_then(|p| positions.get(p)),
            positions.get(node.id.as_str()),
        ) else {
            continue;
        };
        let (px, py) = *parent;
        let mid_y = (py - node_h / 2.0 + cy + node_h / 2.0) / 2.0;
        surface.draw_line(px, py - node_h / 2.0, px, mid_y, "steel_blue", 1.5, LinePattern::Solid);
        surface.draw_line(px, mid_y, cx, mid_y, "steel_blue", 1.5, LinePattern::Solid);
        surface.draw_line(cx, mid_y, cx, cy + node_h / 2.0, "steel_blue", 1.5, LinePattern::Solid);
    }

    for node in nodes {
        let (x, y) = positions[node.id.as_str()];
        surface.draw_box(
            x - node_w / 2.0,
            y - node_h / 2.0,
            node_w,
            node_h,
            &node.label,
            &BoxStyle {
                color: &node.color,
                font_size: Some(theme.font.note),
                wrap: 16,
                ..BoxStyle::default()
            },
        );
    }

    surface.persist(out)
}

fn render_tiers(
    spec: &FigureSpec,
    tiers: &[TierBand],
    theme: &Theme,
    out: &Path,
) -> Result<(), RenderError> {
    let mut surface = Surface::new(theme, &spec.figure_number, &spec.title, spec.tall);
    surface.hide_axes();

    let n = tiers.len();
    if n == 0 {
        return surface.persist(out);
    }

    let margin = 0.05;
    let tier_h = (1.0 - 2.0 * margin) / n as f32;
    let gap = 0.01;

    for (i, tier) in tiers.iter().enumerate() {
        let y = 1.0 - margin - (i as f32 + 1.0) * tier_h + gap / 2.0;
        let band_h = tier_h - gap;

        // Header chip on the left.
        let header_w = 0.22;
        surface.fill_rect(
            margin,
            y,
            header_w,
            band_h,
            &FillStyle {
                color: &tier.color,
                stroke: Some("white"),
                stroke_width: 1.5,
                rounded: true,
                ..FillStyle::default()
            },
        );
        surface.draw_text(
            margin + header_w / 2.0,
            y + band_h / 2.0,
            &tier.label,
            &TextStyle {
                bold: true,
                wrap: 14,
                ..TextStyle::new(theme.font.body, contrast_text_color(theme, &tier.color))
            },
        );

        // Content panel with items laid out in columns.
        let content_x = margin + header_w + 0.03;
        let content_w = 1.0 - margin - content_x;
        surface.fill_rect(
            content_x,
            y,
            content_w,
            band_h,
            &FillStyle {
                color: "white",
                stroke: Some("border"),
                stroke_width: 0.8,
                rounded: true,
                ..FillStyle::default()
            },
        );

        let columns = tier.columns.max(1);
        let col_w = content_w / columns as f32;
        let max_rows = tier.items.len().div_ceil(columns).max(1);
        let item_h = band_h / (max_rows as f32 + 0.5);
        for (k, item) in tier.items.iter().enumerate() {
            let col = k % columns;
            let row = k / columns;
            surface.draw_text(
                content_x + col as f32 * col_w + 0.02,
                y + band_h - (row as f32 + 1.0) * item_h + item_h * 0.3,
                &format!("• {item}"),
                &TextStyle {
                    anchor: Anchor::Start,
                    ..TextStyle::new(theme.font.note, "text")
                },
            );
        }
    }

    surface.persist(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pyramid_widths_interpolate_linearly() {
        let (min_w, max_w) = (0.12, 0.55);
        let n = 4;
        for i in 0..n {
            let (top, bottom) = level_widths(n, i, min_w, max_w);
            let expected_top = min_w + (max_w - min_w) * i as f32 / n as f32;
            let expected_bottom = min_w + (max_w - min_w) * (i as f32 + 1.0) / n as f32;
            assert!((top - expected_top).abs() < 1e-6);
            assert!((bottom - expected_bottom).abs() < 1e-6);
        }
        // The apex starts at the minimum width and the base ends at the max.
        assert!((level_widths(n, 0, min_w, max_w).0 - min_w).abs() < 1e-6);
        assert!((level_widths(n, n - 1, min_w, max_w).1 - max_w).abs() < 1e-6);
    }

    #[test]
    fn adjacent_levels_share_an_edge() {
        let (_, bottom_of_1) = level_widths(5, 1, 0.1, 0.6);
        let (top_of_2, _) = level_widths(5, 2, 0.1, 0.6);
        assert!((bottom_of_1 - top_of_2).abs() < 1e-6);
    }
}
