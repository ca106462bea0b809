use std::collections::BTreeMap;
use std::path::Path;

use crate::data::{FlowchartData, NodeShape, Orientation};
use crate::manifest::FigureSpec;
use crate::surface::{
    contrast_text_color, ArrowStyle, BoxStyle, FillStyle, RenderError, Surface, TextStyle,
};
use crate::theme::Theme;

#[derive(Debug, Clone, Copy)]
struct NodePos {
    cx: f32,
    cy: f32,
    w: f32,
    h: f32,
}

/// Grid-placed process flow: nodes carry an explicit level (tier) and col
/// (slot), connections are drawn between node edges chosen by relative
/// position.
pub(crate) fn render(
    spec: &FigureSpec,
    data: &FlowchartData,
    theme: &Theme,
    out: &Path,
) -> Result<(), RenderError> {
    let mut surface = Surface::new(theme, &spec.figure_number, &spec.title, spec.tall);
    surface.hide_axes();

    let max_level = data.nodes.iter().map(|n| n.level).max().unwrap_or(0);
    let max_col = data.nodes.iter().map(|n| n.col).max().unwrap_or(0);
    let level_count = data.level_count.unwrap_or(max_level + 1).max(1);
    let col_count = data.col_count.unwrap_or(max_col + 1).max(1);

    let (margin_x, margin_y) = (0.06, 0.04);
    let usable_w = 1.0 - 2.0 * margin_x;
    let mut usable_h = 1.0 - 2.0 * margin_y;

    let mut top_start = 1.0 - margin_y;
    if let Some(title_box) = &data.title_box {
        let tb_h = 0.08;
        surface.draw_box(
            margin_x,
            1.0 - margin_y - tb_h,
            usable_w,
            tb_h,
            &title_box.label,
            &BoxStyle {
                color: &title_box.color,
                font_size: Some(theme.font.cell_label),
                ..BoxStyle::default()
            },
        );
        usable_h -= tb_h + 0.02;
        top_start = 1.0 - margin_y - tb_h - 0.02;
    }

    let (node_w, node_h) = match data.orientation {
        Orientation::Horizontal => (
            (usable_w / (col_count as f32 + 0.5)).min(0.18),
            (usable_h / (level_count as f32 + 0.5)).min(0.12),
        ),
        Orientation::Vertical => (
            (usable_w / (col_count as f32 + 0.5)).min(0.22),
            (usable_h / (level_count as f32 + 0.5)).min(0.08),
        ),
    };

    let mut positions: BTreeMap<&str, NodePos> = BTreeMap::new();
    for node in &data.nodes {
        let (cx, cy) = match data.orientation {
            Orientation::Horizontal => {
                // Levels run left to right, cols top to bottom.
                let cell_w = usable_w / level_count as f32;
                let cell_h = usable_h / col_count as f32;
                (
                    margin_x + node.level as f32 * cell_w + cell_w / 2.0,
                    top_start - node.col as f32 * cell_h - cell_h / 2.0,
                )
            }
            Orientation::Vertical => {
                let cell_w = usable_w / col_count as f32;
                let cell_h = usable_h / level_count as f32;
                (
                    margin_x + node.col as f32 * cell_w + cell_w / 2.0,
                    top_start - node.level as f32 * cell_h - cell_h / 2.0,
                )
            }
        };
        let nw = node.width.unwrap_or(node_w);
        positions.insert(
            node.id.as_str(),
            NodePos {
                cx,
                cy,
                w: nw,
                h: node_h,
            },
        );

        match node.shape {
            NodeShape::Diamond => {
                let s = nw.max(node_h) * 0.7;
                surface.draw_polygon(
                    &[
                        (cx, cy + s / 2.0),
                        (cx + s / 2.0, cy),
                        (cx, cy - s / 2.0),
                        (cx - s / 2.0, cy),
                    ],
                    &FillStyle {
                        color: &node.color,
                        stroke: Some("border"),
                        stroke_width: 1.5,
                        ..FillStyle::default()
                    },
                );
                surface.draw_text(
                    cx,
                    cy,
                    &node.label,
                    &TextStyle {
                        bold: true,
                        wrap: 14,
                        ..TextStyle::new(theme.font.note, contrast_text_color(theme, &node.color))
                    },
                );
            }
            NodeShape::Oval => {
                surface.draw_ellipse(
                    cx,
                    cy,
                    nw,
                    node_h,
                    &FillStyle {
                        color: &node.color,
                        stroke: Some("border"),
                        stroke_width: 1.5,
                        ..FillStyle::default()
                    },
                );
                surface.draw_text(
                    cx,
                    cy,
                    &node.label,
                    &TextStyle {
                        bold: true,
                        wrap: 16,
                        ..TextStyle::new(theme.font.body, contrast_text_color(theme, &node.color))
                    },
                );
            }
            NodeShape::Box => {
                surface.draw_box(
                    cx - nw / 2.0,
                    cy - node_h / 2.0,
                    nw,
                    node_h,
                    &node.label,
                    &BoxStyle {
                        color: &node.color,
                        font_size: Some(theme.font.body),
                        wrap: 18,
                        ..BoxStyle::default()
                    },
                );
            }
        }
    }

    for conn in &data.connections {
        let (Some(from), Some(to)) = (
            positions.get(conn.from.as_str()),
            positions.get(conn.to.as_str()),
        ) else {
            continue;
        };
        let (fx, fy) = connection_point(from, to, true, data.orientation);
        let (tx, ty) = connection_point(to, from, false, data.orientation);
        let label = (!conn.label.is_empty()).then_some(conn.label.as_str());
        surface.draw_arrow(fx, fy, tx, ty, label, "steel_blue", ArrowStyle::Forward, 1.5);
    }

    surface.persist(out)
}

/// Pick the edge of `src` a connector should attach to, given where `dst`
/// sits. Vertical layouts prefer top/bottom edges unless the target is
/// clearly off to one side.
fn connection_point(
    src: &NodePos,
    dst: &NodePos,
    outgoing: bool,
    orientation: Orientation,
) -> (f32, f32) {
    let dx = dst.cx - src.cx;
    let dy = dst.cy - src.cy;

    match orientation {
        Orientation::Horizontal => {
            if outgoing {
                (src.cx + src.w / 2.0, src.cy)
            } else {
                (src.cx - src.w / 2.0, src.cy)
            }
        }
        Orientation::Vertical => {
            if dx.abs() > dy.abs() * 1.5 {
                if dx > 0.0 {
                    (src.cx + src.w / 2.0, src.cy)
                } else {
                    (src.cx - src.w / 2.0, src.cy)
                }
            } else if outgoing {
                (src.cx, src.cy - src.h / 2.0)
            } else {
                (src.cx, src.cy + src.h / 2.0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_at(cx: f32, cy: f32) -> NodePos {
        NodePos {
            cx,
            cy,
            w: 0.2,
            h: 0.1,
        }
    }

    #[test]
    fn vertical_flow_connects_bottom_to_top() {
        let upper = node_at(0.5, 0.8);
        let lower = node_at(0.5, 0.4);
        let (_, fy) = connection_point(&upper, &lower, true, Orientation::Vertical);
        let (_, ty) = connection_point(&lower, &upper, false, Orientation::Vertical);
        assert!(fy < upper.cy, "outgoing leaves the bottom edge");
        assert!(ty > lower.cy, "incoming enters the top edge");
    }

    #[test]
    fn sideways_targets_use_side_edges() {
        let left = node_at(0.2, 0.5);
        let right = node_at(0.8, 0.5);
        let (fx, fy) = connection_point(&left, &right, true, Orientation::Vertical);
        assert!(fx > left.cx);
        assert_eq!(fy, left.cy);
    }
}
