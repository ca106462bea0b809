use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use once_cell::sync::Lazy;
use thiserror::Error;

use crate::theme::Theme;

// System fonts are loaded once and shared by every rasterization.
static FONTDB: Lazy<Arc<usvg::fontdb::Database>> = Lazy::new(|| {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    Arc::new(db)
});

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to write {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("rasterization failed: {0}")]
    Raster(String),
    #[error("figure data does not match renderer '{renderer}'")]
    DataMismatch { renderer: &'static str },
}

#[derive(Debug, Clone, Copy)]
struct Rect {
    x: f32,
    y: f32,
    w: f32,
    h: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowStyle {
    Forward,
    Both,
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinePattern {
    Solid,
    Dashed,
    Dotted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Middle,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VAlign {
    Top,
    Middle,
    Bottom,
}

/// Styling for `draw_box`. Color fields take token keys or literal hex.
#[derive(Debug, Clone)]
pub struct BoxStyle<'a> {
    pub color: &'a str,
    pub text_color: Option<&'a str>,
    pub font_size: Option<f32>,
    pub alpha: f32,
    pub line_width: f32,
    pub wrap: usize,
    pub stroke: Option<&'a str>,
}

impl Default for BoxStyle<'_> {
    fn default() -> Self {
        Self {
            color: "navy",
            text_color: None,
            font_size: None,
            alpha: 1.0,
            line_width: 1.5,
            wrap: 18,
            stroke: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FillStyle<'a> {
    pub color: &'a str,
    pub alpha: f32,
    pub stroke: Option<&'a str>,
    pub stroke_width: f32,
    pub rounded: bool,
}

impl Default for FillStyle<'_> {
    fn default() -> Self {
        Self {
            color: "white",
            alpha: 1.0,
            stroke: None,
            stroke_width: 1.0,
            rounded: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TextStyle<'a> {
    pub size: f32,
    pub color: &'a str,
    pub bold: bool,
    pub italic: bool,
    pub alpha: f32,
    pub anchor: Anchor,
    pub valign: VAlign,
    pub rotated: bool,
    pub wrap: usize,
}

impl<'a> TextStyle<'a> {
    pub fn new(size: f32, color: &'a str) -> Self {
        Self {
            size,
            color,
            bold: false,
            italic: false,
            alpha: 1.0,
            anchor: Anchor::Middle,
            valign: VAlign::Middle,
            rotated: false,
            wrap: 0,
        }
    }
}

/// A per-figure drawing surface: a fixed-size canvas with a title band at
/// the top and a content region addressed in [0,1]x[0,1] with y pointing
/// up. All renderer geometry is expressed in unit coordinates; the surface
/// owns the mapping to pixels, so figures are resolution-independent.
pub struct Surface<'t> {
    theme: &'t Theme,
    width: f32,
    height: f32,
    content: Rect,
    frame: bool,
    body: String,
}

impl<'t> Surface<'t> {
    pub fn new(theme: &'t Theme, figure_number: &str, title: &str, tall: bool) -> Self {
        let page = theme.page;
        let (w_in, h_in) = if tall {
            (page.tall_width_in, page.tall_height_in)
        } else {
            (page.width_in, page.height_in)
        };
        let width = w_in * page.dpi;
        let height = h_in * page.dpi;
        let content = Rect {
            x: 0.08 * width,
            y: 0.12 * height,
            w: 0.84 * width,
            h: (1.0 - page.title_band - 0.08) * height,
        };

        let mut surface = Self {
            theme,
            width,
            height,
            content,
            frame: true,
            body: String::new(),
        };

        let cx = width / 2.0;
        let band = page.title_band * height;
        let num_size = surface.fs(theme.font.figure_num);
        let title_size = surface.fs(theme.font.title);
        surface.emit_text_px(
            cx,
            band * 0.35,
            &[format!("Figure {figure_number}")],
            num_size,
            &theme.palette.text,
            true,
            false,
            1.0,
            Anchor::Middle,
            VAlign::Middle,
            false,
        );
        surface.emit_text_px(
            cx,
            band * 0.70,
            &[title.to_string()],
            title_size,
            &theme.palette.text_secondary,
            false,
            true,
            1.0,
            Anchor::Middle,
            VAlign::Middle,
            false,
        );
        surface
    }

    /// Strip the default content frame for diagram-style figures.
    pub fn hide_axes(&mut self) {
        self.frame = false;
    }

    // Unit -> pixel mapping. Unit y grows upward; pixel y grows downward.
    fn px(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.content.x + x * self.content.w,
            self.content.y + (1.0 - y) * self.content.h,
        )
    }

    fn sx(&self, w: f32) -> f32 {
        w * self.content.w
    }

    fn sy(&self, h: f32) -> f32 {
        h * self.content.h
    }

    // Points -> pixels at the page resolution.
    fn lw(&self, pt: f32) -> f32 {
        pt * self.theme.page.dpi / 72.0
    }

    fn fs(&self, pt: f32) -> f32 {
        pt * self.theme.page.dpi / 72.0
    }

    pub fn draw_box(&mut self, x: f32, y: f32, w: f32, h: f32, text: &str, style: &BoxStyle) {
        let fill = self.theme.resolve_color(style.color).to_string();
        self.fill_rect(
            x,
            y,
            w,
            h,
            &FillStyle {
                color: &fill,
                alpha: style.alpha,
                stroke: Some(style.stroke.unwrap_or("border")),
                stroke_width: style.line_width,
                rounded: true,
            },
        );

        let text_color = style
            .text_color
            .map(|c| self.theme.resolve_color(c).to_string())
            .unwrap_or_else(|| contrast_text_color(self.theme, &fill).to_string());
        let size = style.font_size.unwrap_or(self.theme.font.body);
        self.draw_text(
            x + w / 2.0,
            y + h / 2.0,
            text,
            &TextStyle {
                bold: true,
                wrap: style.wrap,
                ..TextStyle::new(size, &text_color)
            },
        );
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, style: &FillStyle) {
        let (px, py) = self.px(x, y + h);
        let (pw, ph) = (self.sx(w), self.sy(h));
        let fill = self.theme.resolve_color(style.color);
        let radius = if style.rounded {
            (pw.min(ph) * 0.15).min(14.0)
        } else {
            0.0
        };
        let stroke = match style.stroke {
            Some(color) => format!(
                " stroke=\"{}\" stroke-width=\"{:.2}\"",
                self.theme.resolve_color(color),
                self.lw(style.stroke_width)
            ),
            None => String::new(),
        };
        let _ = write!(
            self.body,
            "<rect x=\"{px:.2}\" y=\"{py:.2}\" width=\"{pw:.2}\" height=\"{ph:.2}\" rx=\"{radius:.2}\" ry=\"{radius:.2}\" fill=\"{fill}\" fill-opacity=\"{:.3}\"{stroke}/>",
            style.alpha
        );
    }

    pub fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: &str, width_pt: f32) {
        let (px, py) = self.px(x, y + h);
        let (pw, ph) = (self.sx(w), self.sy(h));
        let _ = write!(
            self.body,
            "<rect x=\"{px:.2}\" y=\"{py:.2}\" width=\"{pw:.2}\" height=\"{ph:.2}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{:.2}\"/>",
            self.theme.resolve_color(color),
            self.lw(width_pt)
        );
    }

    pub fn draw_line(
        &mut self,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        color: &str,
        width_pt: f32,
        pattern: LinePattern,
    ) {
        let (px1, py1) = self.px(x1, y1);
        let (px2, py2) = self.px(x2, y2);
        let stroke = self.theme.resolve_color(color);
        let w = self.lw(width_pt);
        let dash = dash_attr(pattern, w);
        let _ = write!(
            self.body,
            "<line x1=\"{px1:.2}\" y1=\"{py1:.2}\" x2=\"{px2:.2}\" y2=\"{py2:.2}\" stroke=\"{stroke}\" stroke-width=\"{w:.2}\"{dash}/>"
        );
    }

    pub fn draw_polyline(
        &mut self,
        points: &[(f32, f32)],
        color: &str,
        width_pt: f32,
        pattern: LinePattern,
    ) {
        if points.len() < 2 {
            return;
        }
        let stroke = self.theme.resolve_color(color);
        let w = self.lw(width_pt);
        let dash = dash_attr(pattern, w);
        let path = points
            .iter()
            .map(|&(x, y)| {
                let (px, py) = self.px(x, y);
                format!("{px:.2},{py:.2}")
            })
            .collect::<Vec<_>>()
            .join(" ");
        let _ = write!(
            self.body,
            "<polyline points=\"{path}\" fill=\"none\" stroke=\"{stroke}\" stroke-width=\"{w:.2}\"{dash} stroke-linejoin=\"round\"/>"
        );
    }

    pub fn draw_polygon(&mut self, points: &[(f32, f32)], style: &FillStyle) {
        if points.len() < 3 {
            return;
        }
        let fill = self.theme.resolve_color(style.color);
        let stroke = match style.stroke {
            Some(color) => format!(
                " stroke=\"{}\" stroke-width=\"{:.2}\" stroke-linejoin=\"round\"",
                self.theme.resolve_color(color),
                self.lw(style.stroke_width)
            ),
            None => String::new(),
        };
        let path = points
            .iter()
            .map(|&(x, y)| {
                let (px, py) = self.px(x, y);
                format!("{px:.2},{py:.2}")
            })
            .collect::<Vec<_>>()
            .join(" ");
        let _ = write!(
            self.body,
            "<polygon points=\"{path}\" fill=\"{fill}\" fill-opacity=\"{:.3}\"{stroke}/>",
            style.alpha
        );
    }

    pub fn draw_circle(&mut self, cx: f32, cy: f32, r: f32, style: &FillStyle) {
        let (px, py) = self.px(cx, cy);
        let radius = r * (self.content.w + self.content.h) / 2.0;
        self.emit_circle_px(px, py, radius, style);
    }

    pub fn draw_ellipse(&mut self, cx: f32, cy: f32, w: f32, h: f32, style: &FillStyle) {
        let (px, py) = self.px(cx, cy);
        let fill = self.theme.resolve_color(style.color);
        let stroke = match style.stroke {
            Some(color) => format!(
                " stroke=\"{}\" stroke-width=\"{:.2}\"",
                self.theme.resolve_color(color),
                self.lw(style.stroke_width)
            ),
            None => String::new(),
        };
        let _ = write!(
            self.body,
            "<ellipse cx=\"{px:.2}\" cy=\"{py:.2}\" rx=\"{:.2}\" ry=\"{:.2}\" fill=\"{fill}\" fill-opacity=\"{:.3}\"{stroke}/>",
            self.sx(w) / 2.0,
            self.sy(h) / 2.0,
            style.alpha
        );
    }

    /// A small dot marker, radius given in points (scatter points, chart
    /// sample markers).
    pub fn draw_marker(&mut self, x: f32, y: f32, r_pt: f32, style: &FillStyle) {
        let (px, py) = self.px(x, y);
        let radius = self.lw(r_pt);
        self.emit_circle_px(px, py, radius, style);
    }

    fn emit_circle_px(&mut self, px: f32, py: f32, radius: f32, style: &FillStyle) {
        let fill = self.theme.resolve_color(style.color);
        let stroke = match style.stroke {
            Some(color) => format!(
                " stroke=\"{}\" stroke-width=\"{:.2}\"",
                self.theme.resolve_color(color),
                self.lw(style.stroke_width)
            ),
            None => String::new(),
        };
        let _ = write!(
            self.body,
            "<circle cx=\"{px:.2}\" cy=\"{py:.2}\" r=\"{radius:.2}\" fill=\"{fill}\" fill-opacity=\"{:.3}\"{stroke}/>",
            style.alpha
        );
    }

    /// Directional connector. The optional label sits at the midpoint on an
    /// opaque backing plate so it stays readable over busy backgrounds.
    pub fn draw_arrow(
        &mut self,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        label: Option<&str>,
        color: &str,
        style: ArrowStyle,
        width_pt: f32,
    ) {
        let (px1, py1) = self.px(x1, y1);
        let (px2, py2) = self.px(x2, y2);
        let stroke = self.theme.resolve_color(color).to_string();
        let w = self.lw(width_pt);
        let head = (w * 3.0).max(9.0);

        let dx = px2 - px1;
        let dy = py2 - py1;
        let len = (dx * dx + dy * dy).sqrt().max(1e-6);
        let (ux, uy) = (dx / len, dy / len);

        let (sx, sy) = match style {
            ArrowStyle::Both => (px1 + head * ux, py1 + head * uy),
            _ => (px1, py1),
        };
        let (ex, ey) = match style {
            ArrowStyle::Plain => (px2, py2),
            _ => (px2 - head * ux, py2 - head * uy),
        };
        let _ = write!(
            self.body,
            "<line x1=\"{sx:.2}\" y1=\"{sy:.2}\" x2=\"{ex:.2}\" y2=\"{ey:.2}\" stroke=\"{stroke}\" stroke-width=\"{w:.2}\"/>"
        );

        if style != ArrowStyle::Plain {
            self.emit_arrow_head(px2, py2, ux, uy, head, &stroke);
        }
        if style == ArrowStyle::Both {
            self.emit_arrow_head(px1, py1, -ux, -uy, head, &stroke);
        }

        if let Some(label) = label {
            if !label.is_empty() {
                let mx = (x1 + x2) / 2.0;
                let my = (y1 + y2) / 2.0;
                let text_color = self.theme.palette.text.as_str();
                self.draw_plated_text(
                    mx,
                    my,
                    label,
                    &TextStyle::new(self.theme.font.note, text_color),
                    None,
                );
            }
        }
    }

    fn emit_arrow_head(&mut self, tip_x: f32, tip_y: f32, ux: f32, uy: f32, head: f32, color: &str) {
        let bx = tip_x - head * ux;
        let by = tip_y - head * uy;
        let (nx, ny) = (-uy, ux);
        let half = head * 0.45;
        let _ = write!(
            self.body,
            "<polygon points=\"{tip_x:.2},{tip_y:.2} {:.2},{:.2} {:.2},{:.2}\" fill=\"{color}\"/>",
            bx + nx * half,
            by + ny * half,
            bx - nx * half,
            by - ny * half
        );
    }

    pub fn draw_text(&mut self, x: f32, y: f32, text: &str, style: &TextStyle) {
        let wrapped;
        let text = if style.wrap > 0 {
            wrapped = wrap_text(text, style.wrap);
            wrapped.as_str()
        } else {
            text
        };
        let lines: Vec<String> = text.split('\n').map(|l| l.to_string()).collect();
        let (px, py) = self.px(x, y);
        let color = self.theme.resolve_color(style.color).to_string();
        let size = self.fs(style.size);
        self.emit_text_px(
            px,
            py,
            &lines,
            size,
            &color,
            style.bold,
            style.italic,
            style.alpha,
            style.anchor,
            style.valign,
            style.rotated,
        );
    }

    /// Text over an opaque rounded plate (vector labels, chart annotations).
    pub fn draw_plated_text(
        &mut self,
        x: f32,
        y: f32,
        text: &str,
        style: &TextStyle,
        border: Option<&str>,
    ) {
        let lines: Vec<&str> = text.split('\n').collect();
        let size = self.fs(style.size);
        let longest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        let pad = size * 0.4;
        let pw = longest as f32 * size * 0.55 + pad * 2.0;
        let ph = lines.len() as f32 * size * 1.2 + pad;
        let (px, py) = self.px(x, y);
        let bg = self.theme.palette.bg.clone();
        let stroke = match border {
            Some(color) => format!(
                " stroke=\"{}\" stroke-width=\"{:.2}\"",
                self.theme.resolve_color(color),
                self.lw(1.0)
            ),
            None => String::new(),
        };
        let _ = write!(
            self.body,
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{pw:.2}\" height=\"{ph:.2}\" rx=\"6\" ry=\"6\" fill=\"{bg}\" fill-opacity=\"0.9\"{stroke}/>",
            px - pw / 2.0,
            py - ph / 2.0
        );
        self.draw_text(x, y, text, style);
    }

    fn emit_text_px(
        &mut self,
        px: f32,
        py: f32,
        lines: &[String],
        size: f32,
        color: &str,
        bold: bool,
        italic: bool,
        alpha: f32,
        anchor: Anchor,
        valign: VAlign,
        rotated: bool,
    ) {
        let anchor = match anchor {
            Anchor::Start => "start",
            Anchor::Middle => "middle",
            Anchor::End => "end",
        };
        let line_height = size * 1.2;
        let total = lines.len() as f32 * line_height;
        let block_top = match valign {
            VAlign::Top => py,
            VAlign::Middle => py - total / 2.0,
            VAlign::Bottom => py - total,
        };
        let weight = if bold { " font-weight=\"bold\"" } else { "" };
        let font_style = if italic { " font-style=\"italic\"" } else { "" };
        let opacity = if alpha < 1.0 {
            format!(" fill-opacity=\"{alpha:.3}\"")
        } else {
            String::new()
        };

        if rotated {
            let _ = write!(self.body, "<g transform=\"rotate(-90 {px:.2} {py:.2})\">");
        }
        let _ = write!(
            self.body,
            "<text x=\"{px:.2}\" y=\"{:.2}\" text-anchor=\"{anchor}\" font-family=\"{}\" font-size=\"{size:.2}\"{weight}{font_style} fill=\"{color}\"{opacity}>",
            block_top + size * 0.85,
            self.theme.font_family
        );
        for (idx, line) in lines.iter().enumerate() {
            let dy = if idx == 0 { 0.0 } else { line_height };
            let _ = write!(
                self.body,
                "<tspan x=\"{px:.2}\" dy=\"{dy:.2}\">{}</tspan>",
                escape_xml(line)
            );
        }
        self.body.push_str("</text>");
        if rotated {
            self.body.push_str("</g>");
        }
    }

    pub fn to_svg(&self) -> String {
        let mut svg = String::new();
        let _ = write!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{0}\" height=\"{1}\" viewBox=\"0 0 {0} {1}\">",
            self.width, self.height
        );
        let _ = write!(
            svg,
            "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
            self.theme.palette.bg
        );
        svg.push_str(&self.body);
        if self.frame {
            // Chart-style chrome: bottom and left spines along the content
            // region edges. hide_axes() removes it for diagram figures.
            let spine = self.lw(self.theme.page.border_width * 1.25);
            let c = self.content;
            let _ = write!(
                svg,
                "<line x1=\"{0:.2}\" y1=\"{1:.2}\" x2=\"{2:.2}\" y2=\"{1:.2}\" stroke=\"{3}\" stroke-width=\"{spine:.2}\"/>",
                c.x,
                c.y + c.h,
                c.x + c.w,
                self.theme.palette.border
            );
            let _ = write!(
                svg,
                "<line x1=\"{0:.2}\" y1=\"{1:.2}\" x2=\"{0:.2}\" y2=\"{2:.2}\" stroke=\"{3}\" stroke-width=\"{spine:.2}\"/>",
                c.x,
                c.y,
                c.y + c.h,
                self.theme.palette.border
            );
        }
        svg.push_str("</svg>");
        svg
    }

    /// Rasterize and write the final PNG, creating parent directories as
    /// needed. Consumes the surface.
    pub fn persist(self, path: &Path) -> Result<(), RenderError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| RenderError::Io {
                    path: parent.display().to_string(),
                    source,
                })?;
            }
        }

        let svg = self.to_svg();
        let mut opt = usvg::Options::default();
        opt.font_family = self
            .theme
            .font_family
            .split(',')
            .next()
            .unwrap_or("sans-serif")
            .trim()
            .to_string();
        opt.fontdb = FONTDB.clone();

        let tree = usvg::Tree::from_str(&svg, &opt)
            .map_err(|err| RenderError::Raster(err.to_string()))?;
        let size = tree.size().to_int_size();
        let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
            .ok_or_else(|| RenderError::Raster("failed to allocate pixmap".to_string()))?;
        let mut pixmap_mut = pixmap.as_mut();
        resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
        pixmap.save_png(path).map_err(|err| RenderError::Io {
            path: path.display().to_string(),
            source: std::io::Error::other(err),
        })?;
        Ok(())
    }
}

fn dash_attr(pattern: LinePattern, width: f32) -> String {
    match pattern {
        LinePattern::Solid => String::new(),
        LinePattern::Dashed => format!(
            " stroke-dasharray=\"{:.1},{:.1}\"",
            width * 4.0,
            width * 2.5
        ),
        LinePattern::Dotted => {
            format!(" stroke-dasharray=\"{:.1},{:.1}\"", width, width * 2.0)
        }
    }
}

/// Pick a legible text color for the given fill by relative luminance
/// (0.299/0.587/0.114 weights). Below 128 the fill counts as dark and gets
/// the light text token; 128 and above gets the dark token. Fills that are
/// not hex colors count as light.
pub fn contrast_text_color<'a>(theme: &'a Theme, fill: &str) -> &'a str {
    let resolved = theme.resolve_color(fill);
    match parse_hex(resolved) {
        Some((r, g, b)) => {
            let luminance =
                (r as f32 * 299.0 + g as f32 * 587.0 + b as f32 * 114.0) / 1000.0;
            if luminance < 128.0 {
                theme.palette.text_on_dark.as_str()
            } else {
                theme.palette.text.as_str()
            }
        }
        None => theme.palette.text.as_str(),
    }
}

fn parse_hex(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}

/// Greedy word wrap at a character budget. Existing line breaks are kept,
/// words are never split, and wrapping already-wrapped text at the same
/// width is a no-op.
pub fn wrap_text(text: &str, max_chars: usize) -> String {
    if max_chars == 0 {
        return text.to_string();
    }
    let mut out: Vec<String> = Vec::new();
    for line in text.split('\n') {
        let mut current = String::new();
        let mut current_len = 0usize;
        for word in line.split_whitespace() {
            let word_len = word.chars().count();
            if current.is_empty() {
                current.push_str(word);
                current_len = word_len;
            } else if current_len + 1 + word_len <= max_chars {
                current.push(' ');
                current.push_str(word);
                current_len += 1 + word_len;
            } else {
                out.push(std::mem::take(&mut current));
                current.push_str(word);
                current_len = word_len;
            }
        }
        out.push(current);
    }
    out.join("\n")
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contrast_picks_light_text_on_dark_fills() {
        let theme = Theme::default_tokens();
        assert_eq!(contrast_text_color(&theme, "navy"), theme.palette.text_on_dark);
        assert_eq!(contrast_text_color(&theme, "#FFFFFF"), theme.palette.text);
    }

    #[test]
    fn contrast_boundary_is_dark_text() {
        let theme = Theme::default_tokens();
        // #808080 has luminance exactly 128: the dark-on-light side.
        assert_eq!(contrast_text_color(&theme, "#808080"), theme.palette.text);
        // One step below the boundary flips to light text.
        assert_eq!(
            contrast_text_color(&theme, "#7F7F7F"),
            theme.palette.text_on_dark
        );
    }

    #[test]
    fn contrast_treats_unparsable_fills_as_light() {
        let theme = Theme::default_tokens();
        assert_eq!(contrast_text_color(&theme, "not-a-color"), theme.palette.text);
    }

    #[test]
    fn wrap_never_splits_words() {
        let wrapped = wrap_text("strategic implementation", 8);
        for line in wrapped.split('\n') {
            assert!(["strategic", "implementation"].contains(&line));
        }
    }

    #[test]
    fn wrap_is_idempotent() {
        let once = wrap_text("the quick brown fox jumps over the lazy dog", 12);
        let twice = wrap_text(&once, 12);
        assert_eq!(once, twice);
    }

    #[test]
    fn wrap_keeps_short_text_intact() {
        assert_eq!(wrap_text("short", 20), "short");
    }

    #[test]
    fn wrap_zero_budget_is_a_passthrough() {
        assert_eq!(wrap_text("anything at all", 0), "anything at all");
    }

    #[test]
    fn surface_renders_title_band() {
        let theme = Theme::default_tokens();
        let surface = Surface::new(&theme, "3.1", "A Sample Title", false);
        let svg = surface.to_svg();
        assert!(svg.contains("Figure 3.1"));
        assert!(svg.contains("A Sample Title"));
        assert!(svg.contains("font-style=\"italic\""));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn hide_axes_removes_the_content_frame() {
        let theme = Theme::default_tokens();
        let mut with_frame = Surface::new(&theme, "1.1", "t", false);
        let mut without = Surface::new(&theme, "1.1", "t", false);
        without.hide_axes();
        with_frame.body.clear();
        without.body.clear();
        assert!(with_frame.to_svg().contains("<line"));
        assert!(!without.to_svg().contains("<line"));
    }

    #[test]
    fn tall_surface_uses_portrait_geometry() {
        let theme = Theme::default_tokens();
        let portrait = Surface::new(&theme, "1.1", "t", true);
        assert!(portrait.height > portrait.width);
    }

    #[test]
    fn arrow_label_gets_a_backing_plate() {
        let theme = Theme::default_tokens();
        let mut surface = Surface::new(&theme, "1.1", "t", false);
        let before = surface.body.matches("<rect").count();
        surface.draw_arrow(
            0.1,
            0.5,
            0.9,
            0.5,
            Some("yes"),
            "steel_blue",
            ArrowStyle::Forward,
            1.5,
        );
        assert!(surface.body.matches("<rect").count() > before);
        assert!(surface.body.contains("yes"));
    }

    #[test]
    fn box_text_contrasts_with_fill() {
        let theme = Theme::default_tokens();
        let mut surface = Surface::new(&theme, "1.1", "t", false);
        surface.draw_box(0.1, 0.1, 0.3, 0.2, "Dark box", &BoxStyle::default());
        // navy fill -> light text token
        assert!(surface.body.contains(&theme.palette.text_on_dark));
    }
}
