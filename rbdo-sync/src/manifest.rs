//! Run manifests
//!
//! Every run writes an audit trail under `<run_root>/<run_id>/`: the likes
//! list it used, the match results, the planned updates and the values
//! actually found in the catalog afterwards. Files are tab-separated with a
//! header row; tabs and line breaks inside fields become spaces.

use crate::error::Result;
use chrono::NaiveDateTime;
use rbdo_common::time::format_manifest;
use rbdo_common::{Assignment, MatchedRecord, ReferenceEntry, UnmatchedRecord};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const LIKES_TSV: &str = "sc_likes.tsv";
pub const MATCHED_TSV: &str = "matched.tsv";
pub const UNMATCHED_TSV: &str = "unmatched.tsv";
pub const PLANNED_TSV: &str = "planned_updates.tsv";
pub const APPLIED_TSV: &str = "applied_updates.tsv";
pub const RUN_META: &str = "run_meta.txt";

/// Column header of `sc_likes.tsv`
pub const LIKES_HEADER: [&str; 4] = ["sc_index", "sc_id", "sc_title", "sc_url"];

fn clean_field(value: &str) -> String {
    value.replace(['\t', '\r', '\n'], " ")
}

fn write_tsv<I>(path: &Path, header: &[&str], rows: I) -> Result<()>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "{}", header.join("\t"))?;
    for row in rows {
        let cleaned: Vec<String> = row.iter().map(|f| clean_field(f)).collect();
        writeln!(out, "{}", cleaned.join("\t"))?;
    }
    out.flush()?;
    Ok(())
}

/// Ordered `key=value` run metadata
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunMeta {
    entries: Vec<(String, String)>,
}

impl RunMeta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: &str, value: impl ToString) -> &mut Self {
        self.entries.push((key.to_string(), value.to_string()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }
}

/// Directory holding one run's manifests
#[derive(Debug, Clone)]
pub struct RunManifest {
    dir: PathBuf,
}

impl RunManifest {
    /// Create `<run_root>/<run_id>/` (parents included)
    pub fn create(run_root: &Path, run_id: &str) -> Result<Self> {
        let dir = run_root.join(run_id);
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    pub fn write_likes(&self, likes: &[ReferenceEntry]) -> Result<()> {
        write_tsv(
            &self.path(LIKES_TSV),
            &LIKES_HEADER,
            likes.iter().map(|e| {
                vec![
                    e.rank.to_string(),
                    e.external_id.clone(),
                    e.title.clone(),
                    e.url.clone(),
                ]
            }),
        )
    }

    /// `matched` is expected in ascending rank order
    pub fn write_matched(&self, matched: &[MatchedRecord]) -> Result<()> {
        write_tsv(
            &self.path(MATCHED_TSV),
            &[
                "file_path",
                "local_title",
                "sc_index",
                "sc_id",
                "sc_title",
                "match_mode",
                "old_created_at",
            ],
            matched.iter().map(|m| {
                vec![
                    m.record.path.clone(),
                    m.record.display_title().to_string(),
                    m.entry.rank.to_string(),
                    m.entry.external_id.clone(),
                    m.entry.title.clone(),
                    m.mode.to_string(),
                    format_manifest(m.record.existing_timestamp),
                ]
            }),
        )
    }

    pub fn write_unmatched(&self, unmatched: &[&UnmatchedRecord]) -> Result<()> {
        write_tsv(
            &self.path(UNMATCHED_TSV),
            &["file_path", "local_title", "reason"],
            unmatched.iter().map(|u| {
                vec![
                    u.record.path.clone(),
                    u.record.display_title().to_string(),
                    u.reason.to_string(),
                ]
            }),
        )
    }

    pub fn write_planned(&self, assignments: &[Assignment]) -> Result<()> {
        write_tsv(
            &self.path(PLANNED_TSV),
            &[
                "file_path",
                "local_title",
                "sc_index",
                "old_created_at",
                "new_created_at",
                "match_mode",
            ],
            assignments.iter().map(|a| {
                vec![
                    a.record.path.clone(),
                    a.record.display_title().to_string(),
                    a.rank.to_string(),
                    format_manifest(a.record.existing_timestamp),
                    format_manifest(Some(a.new_timestamp)),
                    a.mode.to_string(),
                ]
            }),
        )
    }

    /// Planned vs stored values, keyed by catalog row
    ///
    /// Assignments whose row vanished are skipped.
    pub fn write_applied(
        &self,
        assignments: &[Assignment],
        stored: &HashMap<String, Option<NaiveDateTime>>,
    ) -> Result<()> {
        write_tsv(
            &self.path(APPLIED_TSV),
            &[
                "file_path",
                "local_title",
                "sc_index",
                "new_created_at_planned",
                "created_at_in_db",
            ],
            assignments.iter().filter_map(|a| {
                stored.get(a.record.row_key()).map(|in_db| {
                    vec![
                        a.record.path.clone(),
                        a.record.display_title().to_string(),
                        a.rank.to_string(),
                        format_manifest(Some(a.new_timestamp)),
                        format_manifest(*in_db),
                    ]
                })
            }),
        )
    }

    pub fn write_meta(&self, meta: &RunMeta) -> Result<()> {
        let mut out = BufWriter::new(File::create(self.path(RUN_META))?);
        for (key, value) in meta.entries() {
            writeln!(out, "{}={}", key, clean_field(value))?;
        }
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::likes_client::parse_likes_tsv;
    use chrono::NaiveDate;
    use rbdo_common::{LocalRecord, MatchMode, UnmatchedReason};
    use tempfile::TempDir;

    fn ts(s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_milli_opt(0, 0, s, 900)
            .unwrap()
    }

    #[test]
    fn test_create_makes_nested_dir() {
        let temp_dir = TempDir::new().unwrap();
        let manifest = RunManifest::create(&temp_dir.path().join("runs"), "20240101-000000").unwrap();
        assert!(manifest.dir().is_dir());
        assert!(manifest.dir().ends_with("runs/20240101-000000"));
    }

    #[test]
    fn test_likes_manifest_round_trips_through_parser() {
        let temp_dir = TempDir::new().unwrap();
        let manifest = RunManifest::create(temp_dir.path(), "r").unwrap();
        let likes = vec![
            ReferenceEntry::new(1, "11", "Tab\tIn Title", "https://u/1"),
            ReferenceEntry::new(4, "44", "Plain", ""),
        ];
        manifest.write_likes(&likes).unwrap();

        let content = fs::read_to_string(manifest.path(LIKES_TSV)).unwrap();
        assert!(content.starts_with("sc_index\tsc_id\tsc_title\tsc_url\n"));

        let parsed = parse_likes_tsv(&content, "m").unwrap();
        assert_eq!(parsed[0].title, "Tab In Title");
        assert_eq!(parsed[1], likes[1]);
    }

    #[test]
    fn test_matched_and_unmatched_rows() {
        let temp_dir = TempDir::new().unwrap();
        let manifest = RunManifest::create(temp_dir.path(), "r").unwrap();

        let matched = vec![MatchedRecord {
            record: LocalRecord::new("/m/b.mp3", None, Some(ts(1))),
            entry: ReferenceEntry::new(2, "22", "B", ""),
            mode: MatchMode::Normalized,
        }];
        manifest.write_matched(&matched).unwrap();

        let unmatched = UnmatchedRecord {
            record: LocalRecord::new("/m/z.mp3", Some("Z".into()), None),
            reason: UnmatchedReason::NotFound,
        };
        manifest.write_unmatched(&[&unmatched]).unwrap();

        let matched_tsv = fs::read_to_string(manifest.path(MATCHED_TSV)).unwrap();
        let row = matched_tsv.lines().nth(1).unwrap();
        assert_eq!(
            row,
            "/m/b.mp3\tb\t2\t22\tB\tnormalized\t2024-01-01 00:00:01.900000"
        );

        let unmatched_tsv = fs::read_to_string(manifest.path(UNMATCHED_TSV)).unwrap();
        assert_eq!(
            unmatched_tsv,
            "file_path\tlocal_title\treason\n/m/z.mp3\tZ\tnot-found-in-likes\n"
        );
    }

    #[test]
    fn test_applied_skips_missing_rows() {
        let temp_dir = TempDir::new().unwrap();
        let manifest = RunManifest::create(temp_dir.path(), "r").unwrap();
        let assignments = vec![
            Assignment {
                record: LocalRecord::new("/m/a.mp3", Some("A".into()), None).with_row_id("7"),
                rank: 1,
                mode: MatchMode::Exact,
                new_timestamp: ts(9),
            },
            Assignment {
                record: LocalRecord::new("/m/a.mp3", Some("A copy".into()), None).with_row_id("8"),
                rank: 2,
                mode: MatchMode::Exact,
                new_timestamp: ts(8),
            },
        ];
        let mut stored = HashMap::new();
        stored.insert("7".to_string(), Some(ts(9)));
        // Same path, different row: must not stand in for row 8
        stored.insert("/m/a.mp3".to_string(), Some(ts(1)));

        manifest.write_planned(&assignments).unwrap();
        manifest.write_applied(&assignments, &stored).unwrap();

        let planned = fs::read_to_string(manifest.path(PLANNED_TSV)).unwrap();
        assert_eq!(planned.lines().count(), 3);

        let applied = fs::read_to_string(manifest.path(APPLIED_TSV)).unwrap();
        let lines: Vec<&str> = applied.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[1],
            "/m/a.mp3\tA\t1\t2024-01-01 00:00:09.900000\t2024-01-01 00:00:09.900000"
        );
    }

    #[test]
    fn test_meta_written_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let manifest = RunManifest::create(temp_dir.path(), "r").unwrap();
        let mut meta = RunMeta::new();
        meta.push("run_id", "r").push("matched", 3).push("apply", 0);
        manifest.write_meta(&meta).unwrap();

        assert_eq!(meta.get("matched"), Some("3"));
        let content = fs::read_to_string(manifest.path(RUN_META)).unwrap();
        assert_eq!(content, "run_id=r\nmatched=3\napply=0\n");
    }
}
