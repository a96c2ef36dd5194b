use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::NaiveDate;

use crate::formats::{ChapterInfo, ComicInfo, UpdatedAt};

pub const DESCRIPTOR_FILE_NAME: &str = "ComicInfo.xml";
pub const DESCRIPTOR_EXTENSION: &str = ".xml";
pub const DEFAULT_VOLUME_SPLIT: u32 = 1000;

/// Field set of a `ComicInfo.xml` descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct ComicInfoDescriptor {
    pub title: String,
    pub series: String,
    pub number: f64,
    pub summary: String,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub writer: String,
    pub genre: Option<String>,
    pub tags: Option<String>,
    pub community_rating: Option<f64>,
    pub manga: &'static str,
    pub page_count: usize,
}

/// Maps (chapter within volume, volume) onto one monotonic number.
///
/// Volume 1 keeps its natural numbering; volume `n` starts at
/// `multiplier * (n - 1) + 1`. A multiplier of 0 leaves the ordinal as is.
pub fn flatten_chapter_number(chapter_ordinal: f64, volume_ordinal: u32, multiplier: u32) -> f64 {
    chapter_ordinal + f64::from(multiplier) * f64::from(volume_ordinal.saturating_sub(1))
}

/// Multiplier for a series: the comic's own suggestion wins over the caller's.
pub fn effective_volume_split(comic: &ComicInfo, requested: u32) -> u32 {
    comic.suggested_volume_split.unwrap_or(requested)
}

/// Counts the page files under `dir`, recursively, leaving descriptors out.
pub fn count_pages(dir: &Path) -> anyhow::Result<usize> {
    let mut count = 0_usize;
    let mut stack = vec![dir.to_path_buf()];

    while let Some(current) = stack.pop() {
        for entry in
            fs::read_dir(&current).with_context(|| format!("read dir: {}", current.display()))?
        {
            let entry = entry.with_context(|| format!("list dir: {}", current.display()))?;
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
                continue;
            }
            if !path.is_file() {
                continue;
            }
            if entry
                .file_name()
                .to_string_lossy()
                .ends_with(DESCRIPTOR_EXTENSION)
            {
                continue;
            }
            count += 1;
        }
    }

    Ok(count)
}

pub fn compose(
    comic: &ComicInfo,
    chapter: &ChapterInfo,
    volume_split: u32,
    page_count: usize,
    today: NaiveDate,
) -> ComicInfoDescriptor {
    let volume_ordinal = chapter.volume_ordinal.unwrap_or_else(|| {
        tracing::warn!(
            volume = %chapter.volume_name,
            "volume has no ordinal; numbering it as the first volume"
        );
        1
    });
    let updated_at = chapter
        .updated_at
        .unwrap_or_else(|| UpdatedAt::from_date(&today));

    ComicInfoDescriptor {
        title: format!("{} {}", chapter.volume_name, chapter.chapter_name),
        series: comic.title.clone(),
        number: flatten_chapter_number(chapter.chapter_ordinal, volume_ordinal, volume_split),
        summary: comic.description.clone(),
        year: updated_at.year,
        month: updated_at.month,
        day: updated_at.day,
        writer: comic.authors.join(", "),
        genre: join_list(comic.genre.as_deref()),
        tags: join_list(comic.tags.as_deref()),
        community_rating: comic.community_rating,
        manga: "Yes",
        page_count,
    }
}

fn join_list(values: Option<&[String]>) -> Option<String> {
    values
        .filter(|values| !values.is_empty())
        .map(|values| values.join(", "))
}

pub fn render_xml(descriptor: &ComicInfoDescriptor) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    out.push_str("<ComicInfo>\n");
    push_element(&mut out, "Title", &descriptor.title);
    push_element(&mut out, "Series", &descriptor.series);
    push_element(&mut out, "Number", &descriptor.number.to_string());
    push_element(&mut out, "Summary", &descriptor.summary);
    push_element(&mut out, "Year", &descriptor.year.to_string());
    push_element(&mut out, "Month", &descriptor.month.to_string());
    push_element(&mut out, "Day", &descriptor.day.to_string());
    push_element(&mut out, "Writer", &descriptor.writer);
    if let Some(genre) = &descriptor.genre {
        push_element(&mut out, "Genre", genre);
    }
    if let Some(tags) = &descriptor.tags {
        push_element(&mut out, "Tags", tags);
    }
    if let Some(rating) = descriptor.community_rating {
        push_element(&mut out, "CommunityRating", &rating.to_string());
    }
    push_element(&mut out, "Manga", descriptor.manga);
    push_element(&mut out, "PageCount", &descriptor.page_count.to_string());
    out.push_str("</ComicInfo>\n");
    out
}

fn push_element(out: &mut String, name: &str, text: &str) {
    out.push_str(&format!("    <{name}>{}</{name}>\n", xml_escape(text)));
}

/// Writes the descriptor into `dir`, replacing any previous one.
pub fn write_descriptor(dir: &Path, descriptor: &ComicInfoDescriptor) -> anyhow::Result<PathBuf> {
    let path = dir.join(DESCRIPTOR_FILE_NAME);
    fs::write(&path, render_xml(descriptor))
        .with_context(|| format!("write descriptor: {}", path.display()))?;
    Ok(path)
}

fn xml_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
