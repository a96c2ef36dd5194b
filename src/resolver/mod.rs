//! Site-specific metadata resolution.
//!
//! Every site goes through [`common::resolve_common`] first; site resolvers are
//! pure transforms that take the common record by value and return a new one
//! with the fields that site can fill.

pub mod common;
pub mod dm5;
pub mod manhuadb;

use std::fmt;
use std::path::PathBuf;

use chrono::{NaiveDateTime, Utc};
use serde::Serialize;

use crate::formats::{ChapterInfo, ComicInfo, RawWorkData, UpdatedAt};
use crate::numbers::date_offset;

/// Spacing used to synthesize per-chapter dates for sites that only expose a
/// single "last updated" date for the whole work.
pub const CHAPTER_SPACING_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolved {
    pub comic_info: ComicInfo,
    pub chapter_info: ChapterInfo,
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("chapter number {chapter_no} is out of range (1..={chapter_count})")]
    OutOfRange {
        chapter_no: usize,
        chapter_count: usize,
    },
    #[error("chapter directory not found for chapter {title:?} under {}", .root.display())]
    ChapterDirectoryNotFound { title: String, root: PathBuf },
    #[error("list chapter directories under {}", .root.display())]
    ListDirectory {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("series title is empty")]
    MissingTitle,
    #[error("author list is empty")]
    MissingAuthors,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Site {
    Dm5,
    Manhuadb,
    Common,
}

impl Site {
    pub const ALL: [Site; 3] = [Site::Dm5, Site::Manhuadb, Site::Common];

    /// Exact match against the known site identifiers; anything else falls
    /// back to [`Site::Common`].
    pub fn parse(raw: &str) -> Self {
        match raw {
            "dm5" => Self::Dm5,
            "manhuadb" => Self::Manhuadb,
            _ => Self::Common,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dm5 => "dm5",
            Self::Manhuadb => "manhuadb",
            Self::Common => "common",
        }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Site {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

pub fn resolve(
    work: &RawWorkData,
    chapter_no: usize,
    site_id: &str,
) -> Result<Resolved, ResolveError> {
    resolve_at(work, chapter_no, site_id, Utc::now().naive_utc())
}

/// Same as [`resolve`], with "now" supplied by the caller. Failures are
/// returned, not logged; callers decide how loudly to report them.
pub fn resolve_at(
    work: &RawWorkData,
    chapter_no: usize,
    site_id: &str,
    now: NaiveDateTime,
) -> Result<Resolved, ResolveError> {
    let chapter_count = work.chapter_list.len();
    if chapter_no < 1 || chapter_no > chapter_count {
        return Err(ResolveError::OutOfRange {
            chapter_no,
            chapter_count,
        });
    }

    let site = Site::parse(site_id);
    let common = common::resolve_common(work, chapter_no)?;
    let resolved = match site {
        Site::Dm5 => dm5::apply(common, work, chapter_no, now),
        Site::Manhuadb => manhuadb::apply(common, work, chapter_no, now),
        Site::Common => {
            tracing::warn!(
                site = site_id,
                "no resolver for site; metadata will be limited"
            );
            common
        }
    };

    if resolved.comic_info.title.trim().is_empty() {
        return Err(ResolveError::MissingTitle);
    }
    if resolved.comic_info.authors.is_empty() {
        return Err(ResolveError::MissingAuthors);
    }
    Ok(resolved)
}

/// Date for `chapter_no`, placed [`CHAPTER_SPACING_DAYS`] earlier for every
/// chapter between it and the last one.
pub(crate) fn spaced_update_date(
    last_update: NaiveDateTime,
    chapter_count: usize,
    chapter_no: usize,
) -> UpdatedAt {
    let distance = chapter_count.saturating_sub(chapter_no) as f64;
    let date = date_offset(last_update, -distance * CHAPTER_SPACING_DAYS as f64);
    UpdatedAt::from_date(&date)
}

pub(crate) fn split_words(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_owned).collect()
}

pub(crate) fn non_empty(values: Vec<String>) -> Option<Vec<String>> {
    if values.is_empty() {
        return None;
    }
    Some(values)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::Path;

    use chrono::{NaiveDate, NaiveDateTime};

    use crate::formats::{RawChapterRecord, RawImage, RawWorkData};

    pub fn chapter(title: &str, no_in_part: f64, part_title: &str) -> RawChapterRecord {
        RawChapterRecord {
            title: title.to_owned(),
            no_in_part,
            part_title: part_title.to_owned(),
            image_list: vec![RawImage {
                file: format!("{title}/001.jpg"),
            }],
        }
    }

    /// Work with one directory per chapter under `root`.
    pub fn work_in(root: &Path, chapters: Vec<RawChapterRecord>) -> RawWorkData {
        for c in &chapters {
            std::fs::create_dir_all(root.join(format!("0000 {}", c.title))).unwrap();
        }
        RawWorkData {
            title: "Series".to_owned(),
            author: "Alice  Bob".to_owned(),
            description: "A story.".to_owned(),
            read_url: "https://example.com/series".to_owned(),
            directory: root.to_path_buf(),
            chapter_list: chapters,
            ..Default::default()
        }
    }

    pub fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }
}
