use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::FigureData;
use crate::manifest::FigureSpec;
use crate::surface::RenderError;
use crate::theme::Theme;

pub mod axis_quadrant;
pub mod chart;
pub mod comparison;
pub mod flowchart;
pub mod hierarchy;
pub mod linear_flow;
pub mod matrix_2x2;
pub mod matrix_grid;
pub mod reference;

/// The closed set of diagram families. The serde names are the manifest
/// vocabulary; an unrecognized name fails the registry load outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RendererKind {
    #[serde(rename = "matrix_2x2")]
    Matrix2x2,
    #[serde(rename = "flowchart")]
    Flowchart,
    #[serde(rename = "matrix_grid")]
    MatrixGrid,
    #[serde(rename = "axis_quadrant")]
    AxisQuadrant,
    #[serde(rename = "hierarchy")]
    Hierarchy,
    #[serde(rename = "comparison")]
    Comparison,
    #[serde(rename = "linear_flow")]
    LinearFlow,
    #[serde(rename = "chart")]
    Chart,
    #[serde(rename = "reference")]
    Reference,
}

impl RendererKind {
    pub const ALL: [RendererKind; 9] = [
        Self::Matrix2x2,
        Self::Flowchart,
        Self::MatrixGrid,
        Self::AxisQuadrant,
        Self::Hierarchy,
        Self::Comparison,
        Self::LinearFlow,
        Self::Chart,
        Self::Reference,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Matrix2x2 => "matrix_2x2",
            Self::Flowchart => "flowchart",
            Self::MatrixGrid => "matrix_grid",
            Self::AxisQuadrant => "axis_quadrant",
            Self::Hierarchy => "hierarchy",
            Self::Comparison => "comparison",
            Self::LinearFlow => "linear_flow",
            Self::Chart => "chart",
            Self::Reference => "reference",
        }
    }

    /// Render one figure to a PNG at `out`. Stateless; the payload must
    /// have been decoded for this same kind.
    pub fn render(
        self,
        spec: &FigureSpec,
        data: &FigureData,
        theme: &Theme,
        out: &Path,
    ) -> Result<(), RenderError> {
        match (self, data) {
            (Self::Matrix2x2, FigureData::Matrix2x2(d)) => matrix_2x2::render(spec, d, theme, out),
            (Self::Flowchart, FigureData::Flowchart(d)) => flowchart::render(spec, d, theme, out),
            (Self::MatrixGrid, FigureData::MatrixGrid(d)) => {
                matrix_grid::render(spec, d, theme, out)
            }
            (Self::AxisQuadrant, FigureData::AxisQuadrant(d)) => {
                axis_quadrant::render(spec, d, theme, out)
            }
            (Self::Hierarchy, FigureData::Hierarchy(d)) => hierarchy::render(spec, d, theme, out),
            (Self::Comparison, FigureData::Comparison(d)) => {
                comparison::render(spec, d, theme, out)
            }
            (Self::LinearFlow, FigureData::LinearFlow(d)) => {
                linear_flow::render(spec, d, theme, out)
            }
            (Self::Chart, FigureData::Chart(d)) => chart::render(spec, d, theme, out),
            (Self::Reference, FigureData::Reference(d)) => reference::render(spec, d, theme, out),
            (kind, _) => Err(RenderError::DataMismatch {
                renderer: kind.name(),
            }),
        }
    }
}

impl fmt::Display for RendererKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_names_match_the_manifest_vocabulary() {
        for kind in RendererKind::ALL {
            let as_json = serde_json::to_string(&kind).unwrap();
            assert_eq!(as_json, format!("\"{}\"", kind.name()));
            let back: RendererKind = serde_json::from_str(&as_json).unwrap();
            assert_eq!(back, kind);
        }
    }

    #[test]
    fn unknown_renderer_names_are_rejected() {
        assert!(serde_json::from_str::<RendererKind>("\"sparkline\"").is_err());
    }

    #[test]
    fn mismatched_payload_is_a_typed_error() {
        let spec = crate::manifest::FigureSpec {
            id: "x".to_string(),
            figure_number: "1.1".to_string(),
            topic: crate::manifest::Topic::Numbered(1),
            title: "t".to_string(),
            filename: "x.png".to_string(),
            renderer: RendererKind::Chart,
            data_file: String::new(),
            alt_text: String::new(),
            tall: false,
        };
        let data = FigureData::from_value(
            RendererKind::Matrix2x2,
            serde_json::json!({"quadrants": []}),
        )
        .unwrap();
        let theme = Theme::default_tokens();
        let err = RendererKind::Chart
            .render(&spec, &data, &theme, Path::new("/tmp/never.png"))
            .unwrap_err();
        assert!(matches!(err, RenderError::DataMismatch { renderer: "chart" }));
    }
}
