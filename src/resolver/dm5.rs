use std::sync::LazyLock;

use chrono::{Datelike as _, NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::formats::{ChapterInfo, ComicInfo, RawWorkData};
use crate::numbers::extract_numbers;
use crate::resolver::{Resolved, non_empty, spaced_update_date, split_words};

// Page-count annotation appended to chapter titles, e.g. "第01话 (12P)".
static PAGE_COUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*.[0-9]+P.\s*").expect("page count pattern is valid"));

/// dm5 exposes a status line, a cover, a free-form score and one "last update"
/// text for the whole work. Chapters are already numbered globally, so
/// volume flattening is turned off.
pub fn apply(
    resolved: Resolved,
    work: &RawWorkData,
    chapter_no: usize,
    now: NaiveDateTime,
) -> Resolved {
    let Resolved {
        comic_info,
        chapter_info,
    } = resolved;

    let community_rating = extract_numbers(&work.score).and_then(|n| n.first().copied());
    let last_update = parse_last_update(&work.last_update, now);

    Resolved {
        comic_info: ComicInfo {
            tags: non_empty(split_words(&work.status)),
            cover_url: Some(work.image.clone()).filter(|url| !url.is_empty()),
            community_rating,
            suggested_volume_split: Some(0),
            ..comic_info
        },
        chapter_info: ChapterInfo {
            chapter_name: strip_page_count(&chapter_info.chapter_name),
            updated_at: Some(spaced_update_date(
                last_update,
                work.chapter_list.len(),
                chapter_no,
            )),
            ..chapter_info
        },
    }
}

pub fn strip_page_count(title: &str) -> String {
    PAGE_COUNT_RE.replace(title, "").into_owned()
}

/// Reads "(year, month, day)" or "(month, day)" out of free-form text.
///
/// Any other amount of numbers, or a date that does not exist, yields `now`.
/// Components are taken by magnitude so "2023-05-01" reads as a date rather
/// than as 2023, -5, -1.
pub fn parse_last_update(text: &str, now: NaiveDateTime) -> NaiveDateTime {
    let Some(numbers) = extract_numbers(text) else {
        return now;
    };
    let parts = numbers
        .iter()
        .map(|n| n.abs().trunc() as u32)
        .collect::<Vec<_>>();

    let date = match parts.as_slice() {
        [year, month, day] => i32::try_from(*year)
            .ok()
            .and_then(|year| NaiveDate::from_ymd_opt(year, *month, *day)),
        [month, day] => NaiveDate::from_ymd_opt(now.year(), *month, *day),
        _ => None,
    };

    date.and_then(|d| d.and_hms_opt(0, 0, 0)).unwrap_or(now)
}
