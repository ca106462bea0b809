use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use figgen::cli::{execute, Args};
use figgen::manifest::{load_manifest, validate};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("data")
        .join(name)
}

fn args_for(manifest: &str, output_dir: &Path) -> Args {
    Args {
        topic: None,
        id: None,
        verify: false,
        list: false,
        validate: false,
        manifest_md: false,
        manifest: fixture(manifest),
        data_dir: fixture(""),
        output_dir: output_dir.to_path_buf(),
    }
}

fn png_files(root: &Path) -> BTreeSet<String> {
    let mut found = BTreeSet::new();
    if !root.exists() {
        return found;
    }
    for entry in walk(root) {
        if entry.extension().and_then(|e| e.to_str()) == Some("png") {
            let rel = entry.strip_prefix(root).unwrap();
            found.insert(rel.display().to_string());
        }
    }
    found
}

fn walk(dir: &Path) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    let Ok(entries) = std::fs::read_dir(dir) else {
        return paths;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            paths.extend(walk(&path));
        } else {
            paths.push(path);
        }
    }
    paths
}

#[test]
fn generates_every_family_and_verifies_clean() {
    let out = tempfile::tempdir().unwrap();

    execute(args_for("manifest.json5", out.path())).expect("full generation should succeed");

    let first_run = png_files(out.path());
    let expected: BTreeSet<String> = [
        "topic-3/bcg_matrix.png",
        "topic-3/strategy_process.png",
        "topic-3/strategy_pyramid.png",
        "topic-3/value_chain.png",
        "topic-4/ie_matrix.png",
        "topic-4/space_matrix.png",
        "topic-4/structure_comparison.png",
        "topic-7/eps_ebit_analysis.png",
        "tool-guides/five_forces.png",
    ]
    .into_iter()
    .map(String::from)
    .collect();
    assert_eq!(first_run, expected);

    for rel in &first_run {
        let size = out.path().join(rel).metadata().unwrap().len();
        assert!(size > 0, "{rel} should be non-empty");
    }

    // A clean unfiltered run refreshes the summary document.
    assert!(out.path().join("MANIFEST.md").exists());

    // Running again over unchanged inputs reproduces the same file set...
    execute(args_for("manifest.json5", out.path())).expect("second run should succeed");
    assert_eq!(png_files(out.path()), expected);

    // ...and verification passes with zero missing or empty entries.
    let verify = Args {
        verify: true,
        ..args_for("manifest.json5", out.path())
    };
    execute(verify).expect("verify should pass after generation");
}

#[test]
fn verify_fails_before_any_generation() {
    let out = tempfile::tempdir().unwrap();
    let verify = Args {
        verify: true,
        ..args_for("manifest.json5", out.path())
    };
    assert!(execute(verify).is_err(), "nothing rendered yet");
}

#[test]
fn duplicate_figure_numbers_warn_once_but_still_render() {
    let figures = load_manifest(&fixture("manifest_dup_number.json5")).unwrap();
    let warnings = validate(&figures);
    assert_eq!(warnings.len(), 1, "exactly one duplicate-number warning");
    assert!(warnings[0].contains("Duplicate figure number 5.1"));

    // Validation is advisory: both figures still generate.
    let out = tempfile::tempdir().unwrap();
    execute(args_for("manifest_dup_number.json5", out.path())).unwrap();
    assert!(out.path().join("topic-5/dup_a.png").exists());
    assert!(out.path().join("topic-5/dup_b.png").exists());
}

#[test]
fn unknown_id_exits_nonzero_with_zero_writes() {
    let out = tempfile::tempdir().unwrap();
    let args = Args {
        id: Some("doesNotExist".to_string()),
        ..args_for("manifest.json5", out.path())
    };
    assert!(execute(args).is_err());
    assert!(png_files(out.path()).is_empty(), "no files should be written");
    assert!(!out.path().join("MANIFEST.md").exists());
}

#[test]
fn unknown_topic_is_a_hard_error() {
    let out = tempfile::tempdir().unwrap();
    let args = Args {
        topic: Some("9".parse().unwrap()),
        ..args_for("manifest.json5", out.path())
    };
    assert!(execute(args).is_err());
    assert!(png_files(out.path()).is_empty());
}

#[test]
fn topic_filter_renders_only_that_topic() {
    let out = tempfile::tempdir().unwrap();
    let args = Args {
        topic: Some("7".parse().unwrap()),
        ..args_for("manifest.json5", out.path())
    };
    execute(args).unwrap();
    let files = png_files(out.path());
    assert_eq!(files.len(), 1);
    assert!(files.contains("topic-7/eps_ebit_analysis.png"));
    // Filtered runs never touch the summary document.
    assert!(!out.path().join("MANIFEST.md").exists());
}

#[test]
fn id_filter_renders_a_single_figure() {
    let out = tempfile::tempdir().unwrap();
    let args = Args {
        id: Some("five_forces".to_string()),
        ..args_for("manifest.json5", out.path())
    };
    execute(args).unwrap();
    let files = png_files(out.path());
    assert_eq!(files.len(), 1);
    assert!(files.contains("tool-guides/five_forces.png"));
}

#[test]
fn list_and_validate_modes_render_nothing() {
    let out = tempfile::tempdir().unwrap();
    let list = Args {
        list: true,
        ..args_for("manifest.json5", out.path())
    };
    execute(list).unwrap();
    let check = Args {
        validate: true,
        ..args_for("manifest.json5", out.path())
    };
    execute(check).unwrap();
    assert!(png_files(out.path()).is_empty());
}

#[test]
fn manifest_md_mode_exports_without_rendering() {
    let out = tempfile::tempdir().unwrap();
    let args = Args {
        manifest_md: true,
        ..args_for("manifest.json5", out.path())
    };
    execute(args).unwrap();
    assert!(out.path().join("MANIFEST.md").exists());
    assert!(png_files(out.path()).is_empty());
}

#[test]
fn missing_data_record_fails_that_figure_only() {
    // dup manifest pointed at a data dir where one record is absent: patch
    // by targeting an id that has no record through a doctored manifest.
    let dir = tempfile::tempdir().unwrap();
    let manifest_path = dir.path().join("manifest.json5");
    std::fs::write(
        &manifest_path,
        r#"{
          figures: [
            {id: "dup_a", figure_number: "5.1", topic: 5, title: "ok",
             filename: "dup_a.png", renderer: "matrix_2x2",
             data_file: "topic-5.json5", alt_text: "a"},
            {id: "no_such_record", figure_number: "5.2", topic: 5, title: "broken",
             filename: "no_such_record.png", renderer: "matrix_2x2",
             data_file: "topic-5.json5", alt_text: "b"},
          ],
        }"#,
    )
    .unwrap();

    let out = tempfile::tempdir().unwrap();
    let args = Args {
        manifest: manifest_path,
        ..args_for("manifest.json5", out.path())
    };
    let result = execute(args);
    assert!(result.is_err(), "batch reports the failed figure");
    // The healthy figure was still rendered.
    assert!(out.path().join("topic-5/dup_a.png").exists());
    assert!(!out.path().join("topic-5/no_such_record.png").exists());
}
