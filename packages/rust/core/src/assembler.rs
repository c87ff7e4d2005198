//! Output directory assembler.
//!
//! Takes the built page trees and flattened records of a run, then writes
//! the final output directory to disk.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};

use docdistill_crawler::page_file_path;
use docdistill_dataset::{
    to_pretty_json, tree_to_value, trees_from_value, trees_to_value, write_atomic,
    write_json_file, write_lines_file, write_table_file,
};
use docdistill_shared::{
    CURRENT_SCHEMA_VERSION, DistillError, FieldNaming, PageTree, Record, Result,
};

pub const DATA_JSON: &str = "data.json";
pub const DATA_JSONL: &str = "data.jsonl";
pub const DATA_CSV: &str = "data.csv";
pub const MANIFEST_JSON: &str = "manifest.json";

/// A built page ready for assembly.
#[derive(Debug, Clone)]
pub struct AssembledPage {
    /// Root-relative URL path the page was discovered under.
    pub path: String,
    pub tree: PageTree,
}

/// Configuration for output assembly.
#[derive(Debug, Clone)]
pub struct AssembleConfig {
    /// Directory all outputs are written to.
    pub output_dir: PathBuf,
    /// Root URL of the crawl.
    pub source_url: String,
    /// Topic label used in the trees.
    pub topic: String,
    /// Name of the site layout used for extraction.
    pub layout: String,
    /// Key naming of the page-tree JSON.
    pub field_naming: FieldNaming,
    /// Tool version string.
    pub tool_version: String,
}

/// Counts recorded in the run manifest.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunCounts {
    pub discovered: usize,
    pub skipped: usize,
}

/// `manifest.json`: provenance and counts of one crawl run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunManifest {
    pub schema_version: u32,
    pub source_url: String,
    pub topic: String,
    pub layout: String,
    pub field_naming: FieldNaming,
    pub tool_version: String,
    pub created_at: DateTime<Utc>,
    pub discovered: usize,
    pub generated: usize,
    pub skipped: usize,
    pub records: usize,
    /// SHA-256 of `data.json`, lowercase hex.
    pub data_sha256: String,
}

/// Output from a successful assembly.
#[derive(Debug, Clone)]
pub struct AssembleResult {
    pub output_dir: PathBuf,
    /// Per-page files written.
    pub generated_files: Vec<PathBuf>,
    pub manifest: RunManifest,
}

/// Assemble a complete output directory.
///
/// Creates the following layout:
/// ```text
/// <output_dir>/
/// ├── introduction.txt      (root page tree)
/// ├── basics/
/// │   └── lore.txt          (one tree per discovered page)
/// ├── data.json             (every tree, discovery order)
/// ├── data.jsonl            (one record per line)
/// ├── data.csv              (prompt,completion)
/// └── manifest.json
/// ```
#[instrument(skip_all, fields(dir = %config.output_dir.display(), pages = pages.len()))]
pub fn assemble(
    config: &AssembleConfig,
    pages: &[AssembledPage],
    records: &[Record],
    counts: RunCounts,
) -> Result<AssembleResult> {
    let dir = &config.output_dir;
    std::fs::create_dir_all(dir).map_err(|e| DistillError::io(dir, e))?;
    info!(path = %dir.display(), "assembling output directory");

    let mut generated_files = Vec::with_capacity(pages.len());
    let mut used = HashSet::with_capacity(pages.len());
    for page in pages {
        let path = dir.join(unique_output_file(&page.path, &mut used));
        write_json_file(&path, &tree_to_value(&page.tree, config.field_naming))?;
        debug!(page = %page.path, file = %path.display(), "wrote page tree");
        generated_files.push(path);
    }

    let trees: Vec<PageTree> = pages.iter().map(|p| p.tree.clone()).collect();
    let data = to_pretty_json(&trees_to_value(&trees, config.field_naming))?;
    write_atomic(&dir.join(DATA_JSON), &data)?;

    write_records(dir, records)?;

    let manifest = RunManifest {
        schema_version: CURRENT_SCHEMA_VERSION,
        source_url: config.source_url.clone(),
        topic: config.topic.clone(),
        layout: config.layout.clone(),
        field_naming: config.field_naming,
        tool_version: config.tool_version.clone(),
        created_at: Utc::now(),
        discovered: counts.discovered,
        generated: generated_files.len(),
        skipped: counts.skipped,
        records: records.len(),
        data_sha256: sha256_hex(&data),
    };
    write_json_file(&dir.join(MANIFEST_JSON), &manifest)?;

    info!(
        generated = generated_files.len(),
        records = records.len(),
        path = %dir.display(),
        "output assembly complete"
    );

    Ok(AssembleResult {
        output_dir: dir.clone(),
        generated_files,
        manifest,
    })
}

/// Write `data.jsonl` and `data.csv` for `records` into `dir`.
///
/// The CSV is written last; an empty record set fails there with
/// [`DistillError::EmptyDataset`] after the (empty) JSONL file exists.
pub fn write_records(dir: &Path, records: &[Record]) -> Result<()> {
    write_lines_file(&dir.join(DATA_JSONL), records)?;
    write_table_file(&dir.join(DATA_CSV), records)
}

/// Read the page trees back from `<dir>/data.json`.
pub fn load_trees(dir: &Path) -> Result<Vec<PageTree>> {
    let path = dir.join(DATA_JSON);
    let content = std::fs::read_to_string(&path).map_err(|e| DistillError::io(&path, e))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| DistillError::parse(format!("invalid {}: {e}", path.display())))?;
    trees_from_value(&value)
}

/// Read `<dir>/manifest.json`.
pub fn load_manifest(dir: &Path) -> Result<RunManifest> {
    let path = dir.join(MANIFEST_JSON);
    let content = std::fs::read_to_string(&path).map_err(|e| DistillError::io(&path, e))?;
    serde_json::from_str(&content)
        .map_err(|e| DistillError::parse(format!("invalid {}: {e}", path.display())))
}

/// Relative output file for a page path: `/basics/lore` → `basics/lore.txt`.
pub fn page_output_file(path: &str) -> PathBuf {
    let mut file = page_file_path(path).into_os_string();
    file.push(".txt");
    PathBuf::from(file)
}

/// [`page_output_file`], with a `-2`, `-3`, ... suffix when an earlier page
/// of the run already took that file.
fn unique_output_file(path: &str, used: &mut HashSet<PathBuf>) -> PathBuf {
    let file = page_output_file(path);
    if used.insert(file.clone()) {
        return file;
    }

    let stem = page_file_path(path);
    let renamed = (2u32..)
        .map(|n| {
            let mut candidate = stem.clone().into_os_string();
            candidate.push(format!("-{n}.txt"));
            PathBuf::from(candidate)
        })
        .find(|candidate| used.insert(candidate.clone()))
        .unwrap_or(file);
    warn!(page = path, file = %renamed.display(), "output file name taken, renamed");
    renamed
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use docdistill_shared::{Section, TableBlock};

    fn sample_pages() -> Vec<AssembledPage> {
        vec![
            AssembledPage {
                path: "/".into(),
                tree: PageTree {
                    topic: "Axie Infinity".into(),
                    title: Some("Introduction".into()),
                    info: Some("Welcome to Lunacia.".into()),
                    ..PageTree::default()
                },
            },
            AssembledPage {
                path: "/basics/lore".into(),
                tree: PageTree {
                    topic: "Axie Infinity".into(),
                    title: Some("Lore".into()),
                    tables: vec![TableBlock {
                        topic: None,
                        header: vec!["Name".into(), "Value".into()],
                        rows: vec![vec!["X".into(), "1".into()]],
                    }],
                    sections: vec![Section {
                        subtitle: "Origins".into(),
                        links: vec!["https://axieinfinity.com".into()],
                        ..Section::default()
                    }],
                    ..PageTree::default()
                },
            },
        ]
    }

    fn config(dir: &Path) -> AssembleConfig {
        AssembleConfig {
            output_dir: dir.to_path_buf(),
            source_url: "https://whitepaper.axieinfinity.com/".into(),
            topic: "Axie Infinity".into(),
            layout: "gitbook".into(),
            field_naming: FieldNaming::Prefixed,
            tool_version: "0.1.0".into(),
        }
    }

    fn records(pages: &[AssembledPage]) -> Vec<Record> {
        let trees: Vec<PageTree> = pages.iter().map(|p| p.tree.clone()).collect();
        docdistill_dataset::flatten_all(&trees)
    }

    #[test]
    fn page_output_files() {
        assert_eq!(page_output_file("/"), PathBuf::from("introduction.txt"));
        assert_eq!(
            page_output_file("/basics/lore"),
            PathBuf::from("basics").join("lore.txt")
        );
        assert_eq!(page_output_file("/v1.2"), PathBuf::from("v1.2.txt"));
        assert_eq!(page_output_file("/a/"), PathBuf::from("a").join("index.txt"));
    }

    #[test]
    fn every_page_gets_its_own_file() {
        let tmp = tempfile::tempdir().unwrap();
        let pages: Vec<AssembledPage> = ["/a", "/a/", "/a/index", "/b?tab=1", "/b?tab=2"]
            .into_iter()
            .map(|path| AssembledPage {
                path: path.into(),
                tree: PageTree {
                    topic: "Axie Infinity".into(),
                    title: Some(format!("Page {path}")),
                    info: Some("Body text.".into()),
                    ..PageTree::default()
                },
            })
            .collect();
        let records = records(&pages);

        let result = assemble(&config(tmp.path()), &pages, &records, RunCounts::default()).unwrap();

        let unique: HashSet<&PathBuf> = result.generated_files.iter().collect();
        assert_eq!(unique.len(), pages.len());
        assert_eq!(result.manifest.generated, pages.len());

        let dir = tmp.path();
        let expected = [
            (PathBuf::from("a.txt"), "Page /a\""),
            (PathBuf::from("a").join("index.txt"), "Page /a/\""),
            (PathBuf::from("a").join("index-2.txt"), "Page /a/index\""),
            (PathBuf::from("b_tab_1.txt"), "Page /b?tab=1\""),
            (PathBuf::from("b_tab_2.txt"), "Page /b?tab=2\""),
        ];
        for (file, title) in expected {
            let text = std::fs::read_to_string(dir.join(&file)).unwrap();
            assert!(text.contains(title), "{} should hold {title}", file.display());
        }
    }

    #[test]
    fn assemble_writes_full_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let pages = sample_pages();
        let records = records(&pages);

        let result = assemble(
            &config(tmp.path()),
            &pages,
            &records,
            RunCounts {
                discovered: 3,
                skipped: 1,
            },
        )
        .unwrap();

        let dir = tmp.path();
        assert!(dir.join("introduction.txt").exists());
        assert!(dir.join("basics").join("lore.txt").exists());
        assert_eq!(result.generated_files.len(), 2);

        let page = std::fs::read_to_string(dir.join("introduction.txt")).unwrap();
        assert!(page.starts_with("{\n    \"topic\": \"Axie Infinity\""));

        let jsonl = std::fs::read_to_string(dir.join(DATA_JSONL)).unwrap();
        assert_eq!(jsonl.lines().count(), records.len());

        let csv = std::fs::read_to_string(dir.join(DATA_CSV)).unwrap();
        assert_eq!(csv.lines().next(), Some("prompt,completion"));

        let manifest = load_manifest(dir).unwrap();
        assert_eq!(manifest, result.manifest);
        assert_eq!(manifest.discovered, 3);
        assert_eq!(manifest.generated, 2);
        assert_eq!(manifest.skipped, 1);
        assert_eq!(manifest.records, 3);
        let data = std::fs::read(dir.join(DATA_JSON)).unwrap();
        assert_eq!(manifest.data_sha256, sha256_hex(&data));
    }

    #[test]
    fn data_json_reads_back_to_the_same_trees() {
        let tmp = tempfile::tempdir().unwrap();
        let pages = sample_pages();
        let records = records(&pages);
        assemble(&config(tmp.path()), &pages, &records, RunCounts::default()).unwrap();

        let trees = load_trees(tmp.path()).unwrap();
        let expected: Vec<PageTree> = pages.into_iter().map(|p| p.tree).collect();
        assert_eq!(trees, expected);
    }

    #[test]
    fn empty_record_set_fails_on_csv() {
        let tmp = tempfile::tempdir().unwrap();
        let err = write_records(tmp.path(), &[]).unwrap_err();
        assert!(matches!(err, DistillError::EmptyDataset { .. }));
        assert!(tmp.path().join(DATA_JSONL).exists());
        assert!(!tmp.path().join(DATA_CSV).exists());
    }
}
