use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Work metadata as written by the scraper, one JSON document per series.
///
/// Every field defaults when absent; each site fills a different subset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawWorkData {
    pub title: String,
    /// Older scrapes name the series here instead of (or next to) `title`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub book_name: Option<String>,
    pub author: String,
    pub description: String,
    pub category: String,
    pub status: String,
    pub image: String,
    pub score: String,
    pub last_update: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_time: Option<Timestamp>,
    pub read_url: String,
    pub directory: PathBuf,
    pub site_name: String,
    pub chapter_list: Vec<RawChapterRecord>,
}

impl RawWorkData {
    /// `title`, falling back to `book_name` when it is blank.
    pub fn series_title(&self) -> &str {
        if !self.title.trim().is_empty() {
            return &self.title;
        }
        self.book_name.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawChapterRecord {
    pub title: String,
    #[serde(rename = "NO_in_part")]
    pub no_in_part: f64,
    pub part_title: String,
    pub image_list: Vec<RawImage>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawImage {
    pub file: String,
}

/// Scraped timestamps show up either as epoch milliseconds (integral or not)
/// or as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Millis(f64),
    Text(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComicInfo {
    pub title: String,
    pub authors: Vec<String>,
    pub description: String,
    pub web: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub community_rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_volume_split: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterInfo {
    pub chapter_name: String,
    pub volume_name: String,
    pub chapter_ordinal: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_ordinal: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<UpdatedAt>,
    pub directory: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatedAt {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl UpdatedAt {
    pub fn from_date<D: chrono::Datelike>(date: &D) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
            day: date.day(),
        }
    }
}

/// `info.json` kept next to a series' archives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesSidecar {
    pub last_fetched: String,
    pub comic_info: ComicInfo,
    pub data_root: PathBuf,
    pub site_name: String,
}
