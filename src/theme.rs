use serde::{Deserialize, Serialize};

/// Design tokens shared by every renderer: palette, typography, page
/// geometry. A `Theme` is constructed once per run and injected into the
/// surface; renderers address colors and sizes through token keys only, so
/// changing a token here changes every figure consistently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font: FontSizes,
    pub page: PageGeometry,
    pub palette: Palette,
}

/// Type sizes in points, per text role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FontSizes {
    pub figure_num: f32,
    pub title: f32,
    pub axis_label: f32,
    pub cell_label: f32,
    pub body: f32,
    pub note: f32,
    pub fine: f32,
}

/// Canvas dimensions in inches plus output resolution. The title band is a
/// fraction of the canvas height reserved above the content region.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width_in: f32,
    pub height_in: f32,
    pub tall_width_in: f32,
    pub tall_height_in: f32,
    pub dpi: f32,
    pub title_band: f32,
    pub border_width: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Palette {
    pub navy: String,
    pub steel_blue: String,
    pub teal: String,
    pub gold: String,
    pub orange: String,
    pub red: String,
    pub bg: String,
    pub grid: String,
    pub border: String,
    pub text: String,
    pub text_secondary: String,
    pub text_on_dark: String,
    pub white: String,
}

impl Palette {
    pub fn get(&self, key: &str) -> Option<&str> {
        let value = match key {
            "navy" => &self.navy,
            "steel_blue" => &self.steel_blue,
            "teal" => &self.teal,
            "gold" => &self.gold,
            "orange" => &self.orange,
            "red" => &self.red,
            "bg" => &self.bg,
            "grid" => &self.grid,
            "border" => &self.border,
            "text" => &self.text,
            "text_secondary" => &self.text_secondary,
            "text_on_dark" => &self.text_on_dark,
            "white" => &self.white,
            _ => return None,
        };
        Some(value.as_str())
    }
}

impl Theme {
    pub fn default_tokens() -> Self {
        Self {
            font_family: "Segoe UI, Arial, sans-serif".to_string(),
            font: FontSizes {
                figure_num: 13.0,
                title: 12.0,
                axis_label: 11.0,
                cell_label: 11.0,
                body: 9.0,
                note: 8.0,
                fine: 6.0,
            },
            page: PageGeometry {
                width_in: 10.0,
                height_in: 7.0,
                tall_width_in: 8.0,
                tall_height_in: 10.0,
                dpi: 200.0,
                title_band: 0.10,
                border_width: 1.0,
            },
            palette: Palette {
                navy: "#1B2A4A".to_string(),
                steel_blue: "#3D5A80".to_string(),
                teal: "#2A9D8F".to_string(),
                gold: "#E9C46A".to_string(),
                orange: "#E76F51".to_string(),
                red: "#C1292E".to_string(),
                bg: "#F8F9FA".to_string(),
                grid: "#E9ECEF".to_string(),
                border: "#DEE2E6".to_string(),
                text: "#212529".to_string(),
                text_secondary: "#495057".to_string(),
                text_on_dark: "#F8F9FA".to_string(),
                white: "#FFFFFF".to_string(),
            },
        }
    }

    /// Resolve a color token to its palette value. Unrecognized keys pass
    /// through verbatim so data records can carry ad-hoc hex values.
    pub fn resolve_color<'a>(&'a self, key: &'a str) -> &'a str {
        self.palette.get(key).unwrap_or(key)
    }

    /// Named translucent region fills for grid cells (grow/hold/harvest).
    pub fn region_fill(&self, name: &str) -> Option<(&str, f32)> {
        match name {
            "grow" => Some((self.palette.teal.as_str(), 0.20)),
            "hold" => Some((self.palette.gold.as_str(), 0.20)),
            "harvest" => Some((self.palette.red.as_str(), 0.20)),
            "neutral" => Some((self.palette.grid.as_str(), 1.0)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_color_falls_back_to_literal() {
        let theme = Theme::default_tokens();
        assert_eq!(theme.resolve_color("navy"), "#1B2A4A");
        assert_eq!(theme.resolve_color("#ABCDEF"), "#ABCDEF");
    }

    #[test]
    fn region_fills_are_translucent_except_neutral() {
        let theme = Theme::default_tokens();
        let (color, alpha) = theme.region_fill("grow").unwrap();
        assert_eq!(color, theme.palette.teal);
        assert!(alpha < 1.0);
        let (_, neutral_alpha) = theme.region_fill("neutral").unwrap();
        assert_eq!(neutral_alpha, 1.0);
        assert!(theme.region_fill("unknown").is_none());
    }
}
