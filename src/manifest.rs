use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::render::RendererKind;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },
    #[error("no data record for figure '{id}' in {data_file}")]
    MissingRecord { id: String, data_file: String },
}

/// A figure's topic: a numbered course topic or the tool-guide sentinel.
/// Sorts numbered topics ascending with tool guides last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Topic {
    Numbered(u32),
    ToolGuides,
}

impl Topic {
    /// Output subdirectory for this topic.
    pub fn subdir(self) -> String {
        match self {
            Self::Numbered(n) => format!("topic-{n}"),
            Self::ToolGuides => "tool-guides".to_string(),
        }
    }

    pub fn group_label(self) -> String {
        match self {
            Self::Numbered(n) => format!("Topic {n}"),
            Self::ToolGuides => "Tool Guides".to_string(),
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numbered(n) => write!(f, "{n}"),
            Self::ToolGuides => write!(f, "TG"),
        }
    }
}

impl FromStr for Topic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("TG") {
            return Ok(Self::ToolGuides);
        }
        s.parse::<u32>()
            .map(Self::Numbered)
            .map_err(|_| format!("expected a topic number or 'TG', got '{s}'"))
    }
}

impl Serialize for Topic {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Numbered(n) => serializer.serialize_u32(*n),
            Self::ToolGuides => serializer.serialize_str("TG"),
        }
    }
}

impl<'de> Deserialize<'de> for Topic {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TopicVisitor;

        impl Visitor<'_> for TopicVisitor {
            type Value = Topic;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a topic number or the string \"TG\"")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Topic, E> {
                u32::try_from(v)
                    .map(Topic::Numbered)
                    .map_err(|_| E::custom("topic number out of range"))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Topic, E> {
                u32::try_from(v)
                    .map(Topic::Numbered)
                    .map_err(|_| E::custom("topic number out of range"))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Topic, E> {
                if v.fract() == 0.0 && v >= 0.0 && v <= u32::MAX as f64 {
                    Ok(Topic::Numbered(v as u32))
                } else {
                    Err(E::custom("topic number out of range"))
                }
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Topic, E> {
                Topic::from_str(v).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(TopicVisitor)
    }
}

/// One registry entry: a figure's identity, numbering, renderer and data
/// source. String fields default to empty so a mid-edit registry still
/// loads; `validate` reports the gaps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FigureSpec {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub figure_number: String,
    pub topic: Topic,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub filename: String,
    pub renderer: RendererKind,
    #[serde(default)]
    pub data_file: String,
    #[serde(default)]
    pub alt_text: String,
    /// Portrait orientation.
    #[serde(default)]
    pub tall: bool,
}

#[derive(Debug, Deserialize)]
struct ManifestFile {
    #[serde(default)]
    figures: Vec<FigureSpec>,
}

/// Load the figure registry, preserving declaration order. Unknown renderer
/// names fail here, before any figure is attempted.
pub fn load_manifest(path: &Path) -> Result<Vec<FigureSpec>, ManifestError> {
    let contents = fs::read_to_string(path).map_err(|source| ManifestError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let parsed: ManifestFile =
        json5::from_str(&contents).map_err(|err| ManifestError::Parse {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
    Ok(parsed.figures)
}

/// Load a per-topic data file: a mapping from figure id to that figure's
/// raw data record. One file commonly serves many figures.
pub fn load_data_file(path: &Path) -> Result<BTreeMap<String, serde_json::Value>, ManifestError> {
    let contents = fs::read_to_string(path).map_err(|source| ManifestError::Io {
        path: path.display().to_string(),
        source,
    })?;
    json5::from_str(&contents).map_err(|err| ManifestError::Parse {
        path: path.display().to_string(),
        message: err.to_string(),
    })
}

/// Filter registry entries by figure id or topic; an id match wins.
pub fn filter_figures(
    figures: &[FigureSpec],
    topic: Option<Topic>,
    figure_id: Option<&str>,
) -> Vec<FigureSpec> {
    if let Some(id) = figure_id {
        return figures.iter().filter(|f| f.id == id).cloned().collect();
    }
    if let Some(topic) = topic {
        return figures.iter().filter(|f| f.topic == topic).cloned().collect();
    }
    figures.to_vec()
}

/// Build the output path for a figure: `{base}/{topic-subdir}/{filename}`.
/// Pure in `(topic, filename)`; this layout is the externally visible
/// contract downstream document tooling depends on.
pub fn resolve_output_path(spec: &FigureSpec, base_dir: &Path) -> PathBuf {
    base_dir.join(spec.topic.subdir()).join(&spec.filename)
}

/// Check the registry for common issues. Warnings are advisory: a registry
/// with warnings still renders, because partial registries are a normal
/// mid-edit state.
pub fn validate(figures: &[FigureSpec]) -> Vec<String> {
    let mut warnings = Vec::new();
    let mut seen_ids: BTreeSet<&str> = BTreeSet::new();
    let mut seen_numbers: BTreeMap<&str, &str> = BTreeMap::new();

    for f in figures {
        let display_id = if f.id.is_empty() { "UNKNOWN" } else { &f.id };
        for (field, value) in [
            ("id", &f.id),
            ("figure_number", &f.figure_number),
            ("title", &f.title),
            ("filename", &f.filename),
            ("data_file", &f.data_file),
            ("alt_text", &f.alt_text),
        ] {
            if value.is_empty() {
                warnings.push(format!("Figure '{display_id}' missing '{field}'"));
            }
        }

        if !f.id.is_empty() && !seen_ids.insert(f.id.as_str()) {
            warnings.push(format!("Duplicate figure ID: '{}'", f.id));
        }

        if !f.figure_number.is_empty() {
            if let Some(first) = seen_numbers.insert(f.figure_number.as_str(), f.id.as_str()) {
                warnings.push(format!(
                    "Duplicate figure number {}: '{}' and '{}'",
                    f.figure_number, f.id, first
                ));
            }
        }
    }

    warnings
}

/// Write the human-readable manifest summary, grouped by topic. Purely
/// presentational; safe to regenerate or delete. Returns the figure count.
pub fn export_manifest_md(figures: &[FigureSpec], path: &Path) -> Result<usize, ManifestError> {
    let mut groups: BTreeMap<Topic, Vec<&FigureSpec>> = BTreeMap::new();
    for f in figures {
        groups.entry(f.topic).or_default().push(f);
    }

    let mut lines = vec![
        "# Figure Manifest".to_string(),
        String::new(),
        format!(
            "Generated: {}",
            chrono::Local::now().format("%B %d, %Y at %I:%M %p")
        ),
        String::new(),
        "---".to_string(),
    ];

    let mut total = 0;
    for (topic, group) in &groups {
        lines.push(String::new());
        lines.push(format!("## {}", topic.group_label()));
        lines.push(String::new());
        lines.push("| Figure | Title | Filename | Alt Text |".to_string());
        lines.push("|--------|-------|----------|----------|".to_string());
        for f in group {
            let alt_short = if f.alt_text.chars().count() > 60 {
                let truncated: String = f.alt_text.chars().take(60).collect();
                format!("{truncated}...")
            } else {
                f.alt_text.clone()
            };
            lines.push(format!(
                "| {} | {} | {} | {} |",
                f.figure_number, f.title, f.filename, alt_short
            ));
            total += 1;
        }
    }

    lines.push(String::new());
    lines.push("---".to_string());
    lines.push(String::new());
    lines.push(format!("**Total figures: {total}**"));
    lines.push(String::new());

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| ManifestError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }
    }
    fs::write(path, lines.join("\n")).map_err(|source| ManifestError::Io {
        path: path.display().to_string(),
        source,
    })?;

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(id: &str, number: &str, topic: Topic) -> FigureSpec {
        FigureSpec {
            id: id.to_string(),
            figure_number: number.to_string(),
            topic,
            title: format!("Title for {id}"),
            filename: format!("{id}.png"),
            renderer: RendererKind::Matrix2x2,
            data_file: "topic-3.json5".to_string(),
            alt_text: format!("Alt text for {id}"),
            tall: false,
        }
    }

    #[test]
    fn validate_is_clean_for_a_well_formed_registry() {
        let figures = vec![
            spec("bcg_matrix", "3.1", Topic::Numbered(3)),
            spec("vrio_tree", "3.2", Topic::Numbered(3)),
        ];
        assert!(validate(&figures).is_empty());
    }

    #[test]
    fn validate_warns_on_duplicate_ids() {
        let figures = vec![
            spec("bcg_matrix", "3.1", Topic::Numbered(3)),
            spec("bcg_matrix", "3.2", Topic::Numbered(3)),
        ];
        let warnings = validate(&figures);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("Duplicate figure ID"));
    }

    #[test]
    fn validate_warns_once_per_duplicate_number() {
        let figures = vec![
            spec("bcg_matrix", "3.1", Topic::Numbered(3)),
            spec("space_matrix", "3.1", Topic::Numbered(3)),
        ];
        let warnings = validate(&figures);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("Duplicate figure number 3.1"));
        assert!(warnings[0].contains("space_matrix"));
        assert!(warnings[0].contains("bcg_matrix"));
    }

    #[test]
    fn validate_warns_on_missing_fields() {
        let mut f = spec("bcg_matrix", "3.1", Topic::Numbered(3));
        f.alt_text.clear();
        f.title.clear();
        let warnings = validate(&[f]);
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().any(|w| w.contains("missing 'alt_text'")));
        assert!(warnings.iter().any(|w| w.contains("missing 'title'")));
    }

    #[test]
    fn output_path_is_pure_in_topic_and_filename() {
        let base = Path::new("/out");
        let tg = spec("swot_example", "TG.2", Topic::ToolGuides);
        assert_eq!(
            resolve_output_path(&tg, base),
            Path::new("/out/tool-guides/swot_example.png")
        );
        let t3 = spec("bcg_matrix", "3.5", Topic::Numbered(3));
        assert_eq!(
            resolve_output_path(&t3, base),
            Path::new("/out/topic-3/bcg_matrix.png")
        );
        // Same inputs, same path.
        assert_eq!(resolve_output_path(&t3, base), resolve_output_path(&t3, base));
    }

    #[test]
    fn filter_by_id_wins_over_topic() {
        let figures = vec![
            spec("a", "1.1", Topic::Numbered(1)),
            spec("b", "2.1", Topic::Numbered(2)),
        ];
        let by_id = filter_figures(&figures, Some(Topic::Numbered(1)), Some("b"));
        assert_eq!(by_id.len(), 1);
        assert_eq!(by_id[0].id, "b");
        let by_topic = filter_figures(&figures, Some(Topic::Numbered(2)), None);
        assert_eq!(by_topic.len(), 1);
        assert_eq!(by_topic[0].id, "b");
        assert_eq!(filter_figures(&figures, None, None).len(), 2);
    }

    #[test]
    fn topic_parses_numbers_and_tool_guide_sentinel() {
        assert_eq!("3".parse::<Topic>().unwrap(), Topic::Numbered(3));
        assert_eq!("TG".parse::<Topic>().unwrap(), Topic::ToolGuides);
        assert!("nope".parse::<Topic>().is_err());
    }

    #[test]
    fn topics_sort_numbered_first_then_tool_guides() {
        let mut topics = vec![Topic::ToolGuides, Topic::Numbered(4), Topic::Numbered(1)];
        topics.sort();
        assert_eq!(
            topics,
            vec![Topic::Numbered(1), Topic::Numbered(4), Topic::ToolGuides]
        );
    }

    #[test]
    fn manifest_round_trips_through_json5() {
        let source = r#"{
            // registry fixture
            figures: [
                {
                    id: "bcg_matrix",
                    figure_number: "3.1",
                    topic: 3,
                    title: "BCG Growth-Share Matrix",
                    filename: "bcg_matrix.png",
                    renderer: "matrix_2x2",
                    data_file: "topic-3.json5",
                    alt_text: "Four-quadrant matrix",
                },
                {
                    id: "swot_example",
                    figure_number: "TG.2",
                    topic: "TG",
                    title: "SWOT Example",
                    filename: "swot.png",
                    renderer: "matrix_grid",
                    data_file: "tool-guides.json5",
                    alt_text: "SWOT grid",
                },
            ],
        }"#;
        let parsed: ManifestFile = json5::from_str(source).unwrap();
        assert_eq!(parsed.figures.len(), 2);
        assert_eq!(parsed.figures[0].renderer, RendererKind::Matrix2x2);
        assert_eq!(parsed.figures[1].topic, Topic::ToolGuides);
    }

    #[test]
    fn unknown_renderer_fails_the_load() {
        let source = r#"{
            figures: [
                {id: "x", figure_number: "1.1", topic: 1, title: "t",
                 filename: "x.png", renderer: "sparkline", data_file: "d.json5",
                 alt_text: "a"},
            ],
        }"#;
        assert!(json5::from_str::<ManifestFile>(source).is_err());
    }

    #[test]
    fn export_groups_by_topic_and_counts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("MANIFEST.md");
        let figures = vec![
            spec("tg_fig", "TG.1", Topic::ToolGuides),
            spec("t1_fig", "1.1", Topic::Numbered(1)),
        ];
        let count = export_manifest_md(&figures, &path).unwrap();
        assert_eq!(count, 2);
        let contents = fs::read_to_string(&path).unwrap();
        let topic_pos = contents.find("## Topic 1").unwrap();
        let tg_pos = contents.find("## Tool Guides").unwrap();
        assert!(topic_pos < tg_pos, "numbered topics come first");
        assert!(contents.contains("**Total figures: 2**"));
    }
}
