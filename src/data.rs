use serde::Deserialize;
use thiserror::Error;

use crate::render::RendererKind;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("figure data for renderer '{renderer}' is malformed")]
    Decode {
        renderer: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// One typed payload per renderer family. Records travel as raw JSON until
/// they are decoded here against the spec's renderer tag, so malformed
/// content fails at load time instead of inside geometry code.
#[derive(Debug, Clone)]
pub enum FigureData {
    Matrix2x2(Matrix2x2Data),
    Flowchart(FlowchartData),
    MatrixGrid(MatrixGridData),
    AxisQuadrant(AxisQuadrantData),
    Hierarchy(HierarchyData),
    Comparison(ComparisonData),
    LinearFlow(LinearFlowData),
    Chart(ChartData),
    Reference(ReferenceData),
}

impl FigureData {
    pub fn from_value(kind: RendererKind, value: serde_json::Value) -> Result<Self, DataError> {
        fn decode<T: serde::de::DeserializeOwned>(
            renderer: &'static str,
            value: serde_json::Value,
        ) -> Result<T, DataError> {
            serde_json::from_value(value).map_err(|source| DataError::Decode { renderer, source })
        }

        Ok(match kind {
            RendererKind::Matrix2x2 => Self::Matrix2x2(decode("matrix_2x2", value)?),
            RendererKind::Flowchart => Self::Flowchart(decode("flowchart", value)?),
            RendererKind::MatrixGrid => Self::MatrixGrid(decode("matrix_grid", value)?),
            RendererKind::AxisQuadrant => Self::AxisQuadrant(decode("axis_quadrant", value)?),
            RendererKind::Hierarchy => Self::Hierarchy(decode("hierarchy", value)?),
            RendererKind::Comparison => Self::Comparison(decode("comparison", value)?),
            RendererKind::LinearFlow => Self::LinearFlow(decode("linear_flow", value)?),
            RendererKind::Chart => Self::Chart(decode("chart", value)?),
            RendererKind::Reference => Self::Reference(decode("reference", value)?),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    fn horizontal() -> Self {
        Self::Horizontal
    }

    fn vertical() -> Self {
        Self::Vertical
    }
}

fn default_true() -> bool {
    true
}

fn navy() -> String {
    "navy".to_string()
}

fn steel_blue() -> String {
    "steel_blue".to_string()
}

fn teal() -> String {
    "teal".to_string()
}

// ── matrix_2x2 ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct Matrix2x2Data {
    #[serde(default)]
    pub x_label: String,
    #[serde(default)]
    pub y_label: String,
    #[serde(default)]
    pub x_low_label: String,
    #[serde(default)]
    pub x_high_label: String,
    #[serde(default)]
    pub y_low_label: String,
    #[serde(default)]
    pub y_high_label: String,
    /// Four records in TL, TR, BL, BR order.
    #[serde(default)]
    pub quadrants: Vec<MatrixQuadrant>,
    /// Put the "high" end of the x axis on the left (share-based axes).
    #[serde(default)]
    pub axis_reversed: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatrixQuadrant {
    #[serde(default)]
    pub name: String,
    #[serde(default = "steel_blue")]
    pub color: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub items: Vec<String>,
}

// ── flowchart ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct FlowchartData {
    #[serde(default = "Orientation::vertical")]
    pub orientation: Orientation,
    #[serde(default)]
    pub nodes: Vec<FlowNode>,
    #[serde(default)]
    pub connections: Vec<FlowConnection>,
    #[serde(default)]
    pub title_box: Option<TitleBox>,
    #[serde(default)]
    pub col_count: Option<usize>,
    #[serde(default)]
    pub level_count: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlowNode {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default = "navy")]
    pub color: String,
    #[serde(default)]
    pub level: usize,
    #[serde(default)]
    pub col: usize,
    #[serde(default)]
    pub width: Option<f32>,
    #[serde(default)]
    pub shape: NodeShape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeShape {
    #[default]
    Box,
    Diamond,
    Oval,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlowConnection {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub label: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TitleBox {
    #[serde(default)]
    pub label: String,
    #[serde(default = "navy")]
    pub color: String,
}

// ── matrix_grid ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct MatrixGridData {
    #[serde(default = "default_grid_dim")]
    pub rows: usize,
    #[serde(default = "default_grid_dim")]
    pub cols: usize,
    #[serde(default)]
    pub x_label: String,
    #[serde(default)]
    pub y_label: String,
    #[serde(default)]
    pub col_labels: Vec<String>,
    #[serde(default)]
    pub row_labels: Vec<String>,
    /// Row-major cell records; row 0 is the top row.
    #[serde(default)]
    pub cells: Vec<GridCell>,
    #[serde(default)]
    pub x_scale: Vec<String>,
    #[serde(default)]
    pub y_scale: Vec<String>,
    #[serde(default = "default_true")]
    pub show_grid_lines: bool,
    #[serde(default)]
    pub header_colors: HeaderColors,
}

fn default_grid_dim() -> usize {
    3
}

#[derive(Debug, Clone, Deserialize)]
pub struct GridCell {
    pub row: usize,
    pub col: usize,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub items: Vec<String>,
    /// Named region fill (grow/hold/harvest); wins over `color`.
    #[serde(default)]
    pub region: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HeaderColors {
    #[serde(default = "navy")]
    pub col: String,
    #[serde(default = "steel_blue")]
    pub row: String,
}

impl Default for HeaderColors {
    fn default() -> Self {
        Self {
            col: navy(),
            row: steel_blue(),
        }
    }
}

// ── axis_quadrant ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct AxisQuadrantData {
    #[serde(default)]
    pub x_label: String,
    #[serde(default)]
    pub y_label: String,
    #[serde(default)]
    pub x_pos_label: String,
    #[serde(default)]
    pub x_neg_label: String,
    #[serde(default)]
    pub y_pos_label: String,
    #[serde(default)]
    pub y_neg_label: String,
    /// Four fills in Q1 (top-right), Q2, Q3, Q4 order.
    #[serde(default)]
    pub quadrants: Vec<AxisQuadrantFill>,
    #[serde(default)]
    pub vector: Option<VectorArrow>,
    #[serde(default)]
    pub points: Vec<MapPoint>,
    #[serde(default = "default_axis_range")]
    pub axis_range: f32,
    #[serde(default = "default_true")]
    pub show_grid: bool,
    #[serde(default = "default_true")]
    pub scale_labels: bool,
}

fn default_axis_range() -> f32 {
    6.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct AxisQuadrantFill {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_grid_color")]
    pub color: String,
    #[serde(default)]
    pub items: Vec<String>,
}

fn default_grid_color() -> String {
    "grid".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct VectorArrow {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub label: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MapPoint {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub label: String,
    #[serde(default = "teal")]
    pub color: String,
    #[serde(default = "default_point_size")]
    pub size: f32,
}

fn default_point_size() -> f32 {
    80.0
}

// ── hierarchy ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "style", rename_all = "snake_case")]
pub enum HierarchyData {
    Pyramid {
        /// Levels from the top (narrowest) down.
        #[serde(default)]
        levels: Vec<PyramidLevel>,
        #[serde(default)]
        annotation_side: AnnotationSide,
    },
    Tree {
        #[serde(default)]
        nodes: Vec<TreeNode>,
        #[serde(default = "default_spacing")]
        spacing: f32,
    },
    Tiers {
        /// Bands from the top down.
        #[serde(default)]
        tiers: Vec<TierBand>,
    },
}

fn default_spacing() -> f32 {
    1.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct PyramidLevel {
    #[serde(default)]
    pub label: String,
    #[serde(default = "navy")]
    pub color: String,
    #[serde(default)]
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationSide {
    #[default]
    Right,
    Left,
    Both,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TreeNode {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default = "navy")]
    pub color: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub level: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TierBand {
    #[serde(default)]
    pub label: String,
    #[serde(default = "navy")]
    pub color: String,
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default = "default_columns_one")]
    pub columns: usize,
}

fn default_columns_one() -> usize {
    1
}

// ── comparison ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "style", rename_all = "snake_case")]
pub enum ComparisonData {
    SideBySide {
        #[serde(default)]
        columns: Vec<CompareColumn>,
        #[serde(default)]
        center_label: String,
        #[serde(default)]
        footer: String,
    },
    Versus {
        #[serde(default)]
        columns: Vec<CompareColumn>,
        #[serde(default = "default_versus_label")]
        center_label: String,
    },
    Table {
        #[serde(default)]
        columns: Vec<CompareColumn>,
        #[serde(default)]
        rows: Vec<TableRow>,
    },
}

fn default_versus_label() -> String {
    "VS".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompareColumn {
    #[serde(default)]
    pub header: String,
    #[serde(default = "navy")]
    pub color: String,
    #[serde(default)]
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableRow {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub values: Vec<String>,
}

// ── linear_flow ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "style", rename_all = "snake_case")]
pub enum LinearFlowData {
    Arrows {
        #[serde(default = "Orientation::horizontal")]
        orientation: Orientation,
        #[serde(default)]
        steps: Vec<FlowStep>,
        #[serde(default)]
        connectors: Connectors,
        #[serde(default)]
        header: String,
        #[serde(default)]
        footer: String,
    },
    Chevrons {
        #[serde(default)]
        steps: Vec<FlowStep>,
    },
    Spectrum {
        #[serde(default)]
        steps: Vec<FlowStep>,
        #[serde(default)]
        spectrum_labels: SpectrumLabels,
    },
    ValueChain {
        #[serde(default)]
        steps: Vec<FlowStep>,
        #[serde(default)]
        support_bar: Option<SupportBar>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlowStep {
    #[serde(default)]
    pub label: String,
    #[serde(default = "navy")]
    pub color: String,
    #[serde(default)]
    pub sublabel: String,
    #[serde(default)]
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectors {
    #[default]
    Arrows,
    Lines,
    None,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpectrumLabels {
    #[serde(default)]
    pub left: String,
    #[serde(default)]
    pub right: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SupportBar {
    #[serde(default = "default_support_label")]
    pub label: String,
    #[serde(default = "steel_blue")]
    pub color: String,
    #[serde(default)]
    pub items: Vec<String>,
}

fn default_support_label() -> String {
    "Support Activities".to_string()
}

// ── chart ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "style", rename_all = "snake_case")]
pub enum ChartData {
    Line {
        #[serde(flatten)]
        common: ChartCommon,
    },
    Bar {
        #[serde(flatten)]
        common: ChartCommon,
    },
    StackedBar {
        #[serde(flatten)]
        common: ChartCommon,
    },
    EpsEbit {
        #[serde(flatten)]
        common: ChartCommon,
        #[serde(default)]
        crossover: Option<Crossover>,
    },
}

impl ChartData {
    pub fn common(&self) -> &ChartCommon {
        match self {
            Self::Line { common }
            | Self::Bar { common }
            | Self::StackedBar { common }
            | Self::EpsEbit { common, .. } => common,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartCommon {
    #[serde(default)]
    pub x_label: String,
    #[serde(default)]
    pub y_label: String,
    #[serde(default)]
    pub x_values: Vec<XValue>,
    #[serde(default)]
    pub datasets: Vec<Dataset>,
    #[serde(default = "default_true")]
    pub show_legend: bool,
    #[serde(default = "default_true")]
    pub show_grid: bool,
    #[serde(default)]
    pub y_format: YFormat,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum XValue {
    Number(f64),
    Label(String),
}

impl XValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Label(_) => None,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Number(v) => {
                if v.fract() == 0.0 {
                    format!("{v:.0}")
                } else {
                    format!("{v}")
                }
            }
            Self::Label(s) => s.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub values: Vec<f64>,
    #[serde(default = "navy")]
    pub color: String,
    #[serde(default)]
    pub line_style: DashKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DashKind {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YFormat {
    #[default]
    Number,
    Currency,
    Percent,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Annotation {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Crossover {
    pub x: f64,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default = "default_crossover_label")]
    pub label: String,
}

fn default_crossover_label() -> String {
    "Crossover Point".to_string()
}

// ── reference ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "style", rename_all = "snake_case")]
pub enum ReferenceData {
    FiveForces {
        #[serde(default)]
        center: CenterBox,
        /// Up to four forces in top, right, bottom, left order.
        #[serde(default)]
        forces: Vec<SatelliteBox>,
    },
    BalancedScorecard {
        #[serde(default)]
        perspectives: Vec<Perspective>,
        #[serde(default)]
        center: CenterBox,
    },
    Hexagon {
        #[serde(default)]
        hexagons: Vec<SatelliteBox>,
        #[serde(default)]
        center: Option<CenterBox>,
    },
    CategoryGrid {
        #[serde(default)]
        categories: Vec<CategoryCard>,
        #[serde(default = "default_columns_two")]
        columns: usize,
    },
    Radial {
        #[serde(default)]
        center: CenterBox,
        #[serde(default)]
        spokes: Vec<SatelliteBox>,
    },
    Cycle {
        #[serde(default)]
        stages: Vec<CycleStage>,
    },
}

fn default_columns_two() -> usize {
    2
}

#[derive(Debug, Clone, Deserialize)]
pub struct CenterBox {
    #[serde(default)]
    pub label: String,
    #[serde(default = "navy")]
    pub color: String,
    #[serde(default)]
    pub items: Vec<String>,
}

impl Default for CenterBox {
    fn default() -> Self {
        Self {
            label: String::new(),
            color: navy(),
            items: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SatelliteBox {
    #[serde(default)]
    pub label: String,
    #[serde(default = "steel_blue")]
    pub color: String,
    #[serde(default)]
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Perspective {
    #[serde(default)]
    pub name: String,
    #[serde(default = "steel_blue")]
    pub color: String,
    #[serde(default)]
    pub measures: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryCard {
    #[serde(default)]
    pub header: String,
    #[serde(default = "navy")]
    pub color: String,
    #[serde(default)]
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CycleStage {
    #[serde(default)]
    pub label: String,
    #[serde(default = "navy")]
    pub color: String,
    #[serde(default)]
    pub sublabel: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_against_the_renderer_tag() {
        let value = json!({
            "x_label": "Relative Market Share",
            "quadrants": [
                {"name": "Stars", "color": "teal"},
            ],
            "axis_reversed": true,
        });
        let data = FigureData::from_value(RendererKind::Matrix2x2, value).unwrap();
        match data {
            FigureData::Matrix2x2(d) => {
                assert!(d.axis_reversed);
                assert_eq!(d.quadrants.len(), 1);
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn malformed_record_fails_at_decode_time() {
        let value = json!({"quadrants": "not a list"});
        let err = FigureData::from_value(RendererKind::Matrix2x2, value).unwrap_err();
        assert!(err.to_string().contains("matrix_2x2"));
    }

    #[test]
    fn styled_families_require_a_style_tag() {
        let value = json!({"levels": []});
        assert!(FigureData::from_value(RendererKind::Hierarchy, value).is_err());

        let value = json!({"style": "pyramid", "levels": [{"label": "Top"}]});
        let data = FigureData::from_value(RendererKind::Hierarchy, value).unwrap();
        assert!(matches!(data, FigureData::Hierarchy(HierarchyData::Pyramid { .. })));
    }

    #[test]
    fn chart_x_values_accept_numbers_and_labels() {
        let value = json!({
            "style": "bar",
            "x_values": ["Q1", "Q2"],
            "datasets": [{"label": "Revenue", "values": [1.0, 2.0], "color": "teal"}],
        });
        let data = FigureData::from_value(RendererKind::Chart, value).unwrap();
        let FigureData::Chart(chart) = &data else {
            panic!("wrong variant");
        };
        assert_eq!(chart.common().x_values.len(), 2);
        assert!(chart.common().x_values[0].as_number().is_none());

        let value = json!({
            "style": "line",
            "x_values": [0, 10],
            "datasets": [{"label": "EPS", "values": [1.0, 3.0]}],
        });
        let data = FigureData::from_value(RendererKind::Chart, value).unwrap();
        let FigureData::Chart(chart) = &data else {
            panic!("wrong variant");
        };
        assert_eq!(chart.common().x_values[1].as_number(), Some(10.0));
    }
}
