use std::path::Path;

use crate::data::{CompareColumn, ComparisonData, TableRow};
use crate::manifest::FigureSpec;
use crate::surface::{
    contrast_text_color, Anchor, FillStyle, LinePattern, RenderError, Surface, TextStyle, VAlign,
};
use crate::theme::Theme;

pub(crate) fn render(
    spec: &FigureSpec,
    data: &ComparisonData,
    theme: &Theme,
    out: &Path,
) -> Result<(), RenderError> {
    match data {
        ComparisonData::SideBySide {
            columns,
            center_label,
            footer,
        } => render_side_by_side(spec, columns, center_label, footer, theme, out),
        ComparisonData::Versus {
            columns,
            center_label,
        } => render_versus(spec, columns, center_label, theme, out),
        ComparisonData::Table { columns, rows } => render_table(spec, columns, rows, theme, out),
    }
}

fn render_side_by_side(
    spec: &FigureSpec,
    columns: &[CompareColumn],
    center_label: &str,
    footer: &str,
    theme: &Theme,
    out: &Path,
) -> Result<(), RenderError> {
    let mut surface = Surface::new(theme, &spec.figure_number, &spec.title, spec.tall);
    surface.hide_axes();

    let n = columns.len();
    if n == 0 {
        return surface.persist(out);
    }

    let margin = 0.05;
    let gap = 0.03;
    let col_w = (1.0 - 2.0 * margin - gap * (n as f32 - 1.0)) / n as f32;
    let header_h = 0.08;
    let content_top = 0.92 - header_h;

    for (i, col) in columns.iter().enumerate() {
        let x = margin + i as f32 * (col_w + gap);

        surface.fill_rect(
            x,
            content_top + 0.01,
            col_w,
            header_h,
            &FillStyle {
                color: &col.color,
                stroke: Some("white"),
                stroke_width: 1.5,
                rounded: true,
                ..FillStyle::default()
            },
        );
        surface.draw_text(
            x + col_w / 2.0,
            content_top + 0.01 + header_h / 2.0,
            &col.header,
            &TextStyle {
                bold: true,
                ..TextStyle::new(theme.font.cell_label, contrast_text_color(theme, &col.color))
            },
        );

        surface.fill_rect(
            x,
            margin,
            col_w,
            content_top - margin,
            &FillStyle {
                color: "white",
                stroke: Some("border"),
                rounded: true,
                ..FillStyle::default()
            },
        );

        let item_spacing =
            ((content_top - margin - 0.04) / columns[i].items.len().max(1) as f32).min(0.055);
        for (j, item) in col.items.iter().enumerate() {
            surface.draw_text(
                x + 0.02,
                content_top - 0.03 - j as f32 * item_spacing,
                &format!("• {item}"),
                &TextStyle {
                    anchor: Anchor::Start,
                    valign: VAlign::Top,
                    wrap: 28,
                    ..TextStyle::new(theme.font.note, "text")
                },
            );
        }
    }

    // A divider label only makes sense between exactly two columns.
    if !center_label.is_empty() && n == 2 {
        surface.draw_text(
            margin + col_w + gap / 2.0,
            (content_top + margin) / 2.0,
            center_label,
            &TextStyle {
                bold: true,
                ..TextStyle::new(theme.font.figure_num, "orange")
            },
        );
    }

    if !footer.is_empty() {
        surface.draw_text(
            0.5,
            0.01,
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

fn render_versus(
    spec: &FigureSpec,
    columns: &[CompareColumn],
    center_label: &str,
    theme: &Theme,
    out: &Path,
) -> Result<(), RenderError> {
    let mut surface = Surface::new(theme, &spec.figure_number, &spec.title, spec.tall);
    surface.hide_axes();

    if columns.len() < 2 {
        return surface.persist(out);
    }

    let margin = 0.05;
    let mid = 0.5;
    let col_w = mid - margin - 0.04;

    for (col, x) in [(&columns[0], margin), (&columns[1], mid + 0.04)] {
        // Tinted full-height backdrop.
        surface.fill_rect(
            x,
            margin,
            col_w,
            0.88,
            &FillStyle {
                color: &col.color,
                alpha: 0.08,
                stroke: Some("border"),
                rounded: true,
                ..FillStyle::default()
            },
        );

        surface.fill_rect(
            x,
            0.85,
            col_w,
            0.08,
            &FillStyle {
                color: &col.color,
                rounded: true,
                stroke: None,
                ..FillStyle::default()
            },
        );
        surface.draw_text(
            x + col_w / 2.0,
            0.89,
            &col.header,
            &TextStyle {
                bold: true,
                ..TextStyle::new(theme.font.cell_label, contrast_text_color(theme, &col.color))
            },
        );

        let item_spacing = (0.75 / col.items.len().max(1) as f32).min(0.055);
        for (j, item) in col.items.iter().enumerate() {
            surface.draw_text(
                x + 0.02,
                0.82 - j as f32 * item_spacing,
                &format!("• {item}"),
                &TextStyle {
                    anchor: Anchor::Start,
                    valign: VAlign::Top,
                    wrap: 26,
                    ..TextStyle::new(theme.font.note, "text")
                },
            );
        }
    }

    // Dashed divider broken around the center marker.
    surface.draw_line(mid, margin, mid, 0.46, "border", 1.5, LinePattern::Dashed);
    surface.draw_line(mid, 0.54, mid, 0.93, "border", 1.5, LinePattern::Dashed);

    surface.draw_circle(
        mid,
        0.5,
        0.035,
        &FillStyle {
            color: "orange",
            stroke: Some("white"),
            stroke_width: 2.0,
            ..FillStyle::default()
        },
    );
    surface.draw_text(
        mid,
        0.5,
        center_label,
        &TextStyle {
            bold: true,
            ..TextStyle::new(theme.font.body, "text_on_dark")
        },
    );

    surface.persist(out)
}

fn render_table(
    spec: &FigureSpec,
    columns: &[CompareColumn],
    rows: &[TableRow],
    theme: &Theme,
    out: &Path,
) -> Result<(), RenderError> {
    let mut surface = Surface::new(theme, &spec.figure_number, &spec.title, spec.tall);
    surface.hide_axes();

    let n_cols = columns.len();
    let n_rows = rows.len();
    if n_cols == 0 || n_rows == 0 {
        return surface.persist(out);
    }

    let margin = 0.05;
    let cat_col_w = 0.20;
    let data_w = 1.0 - 2.0 * margin - cat_col_w;
    let col_w = data_w / n_cols as f32;
    let header_h = 0.07;
    let row_h = ((0.88 - header_h) / n_rows as f32).min(0.08);
    let table_top = 0.93;

    for (j, col) in columns.iter().enumerate() {
        let x = margin + cat_col_w + j as f32 * col_w;
        surface.fill_rect(
            x,
            table_top - header_h,
            col_w,
            header_h,
            &FillStyle {
                color: &col.color,
                stroke: Some("white"),
                ..FillStyle::default()
            },
        );
        surface.draw_text(
            x + col_w / 2.0,
            table_top - header_h / 2.0,
            &col.header,
            &TextStyle {
                bold: true,
                ..TextStyle::new(theme.font.body, contrast_text_color(theme, &col.color))
            },
        );
    }

    surface.fill_rect(
        margin,
        table_top - header_h,
        cat_col_w,
        header_h,
        &FillStyle {
            color: "steel_blue",
            stroke: Some("white"),
            ..FillStyle::default()
        },
    );
    surface.draw_text(
        margin + cat_col_w / 2.0,
        table_top - header_h / 2.0,
        "Category",
        &TextStyle {
            bold: true,
            ..TextStyle::new(theme.font.body, "text_on_dark")
        },
    );

    for (i, row) in rows.iter().enumerate() {
        let y = table_top - header_h - (i as f32 + 1.0) * row_h;
        let stripe = if i % 2 == 0 { "white" } else { "grid" };

        surface.fill_rect(
            margin,
            y,
            cat_col_w,
            row_h,
            &FillStyle {
                color: stripe,
                stroke: Some("border"),
                stroke_width: 0.5,
                ..FillStyle::default()
            },
        );
        surface.draw_text(
            margin + 0.02,
            y + row_h / 2.0,
            &row.category,
            &TextStyle {
                bold: true,
                anchor: Anchor::Start,
                ..TextStyle::new(theme.font.note, "text")
            },
        );

        for (j, value) in row.values.iter().take(n_cols).enumerate() {
            let x = margin + cat_col_w + j as f32 * col_w;
            surface.fill_rect(
                x,
                y,
                col_w,
                row_h,
                &FillStyle {
                    color: stripe,
                    stroke: Some("border"),
                    stroke_width: 0.5,
                    ..FillStyle::default()
                },
            );
            surface.draw_text(
                x + col_w / 2.0,
                y + row_h / 2.0,
                value,
                &TextStyle {
                    wrap: 18,
                    ..TextStyle::new(theme.font.note, "text")
                },
            );
        }
    }

    surface.persist(out)
}
