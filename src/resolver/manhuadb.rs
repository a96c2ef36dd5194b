use chrono::NaiveDateTime;

use crate::formats::{ChapterInfo, ComicInfo, RawWorkData};
use crate::numbers::parse_timestamp;
use crate::resolver::{Resolved, non_empty, spaced_update_date, split_words};

/// manhuadb carries a whitespace separated category line, a single status tag
/// and a real update timestamp for the work.
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

    let status = work.status.trim();
    let last_update = work
        .update_time
        .as_ref()
        .and_then(parse_timestamp)
        .unwrap_or_else(|| {
            tracing::warn!(
                update_time = ?work.update_time,
                "cannot parse update time; using current date"
            );
            now
        });

    Resolved {
        comic_info: ComicInfo {
            genre: non_empty(split_words(&work.category)),
            tags: (!status.is_empty()).then(|| vec![status.to_owned()]),
            ..comic_info
        },
        chapter_info: ChapterInfo {
            updated_at: Some(spaced_update_date(
                last_update,
                work.chapter_list.len(),
                chapter_no,
            )),
            ..chapter_info
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::{Timestamp, UpdatedAt};
    use crate::resolver::common::resolve_common;
    use crate::resolver::test_support::{at, chapter, work_in};

    #[test]
    fn applies_manhuadb_fields() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut work = work_in(
            temp.path(),
            vec![
                chapter("第1回", 1.0, "第1卷"),
                chapter("第2回", 2.0, "第1卷"),
                chapter("第3回", 1.0, "第2卷"),
            ],
        );
        work.category = "少年 热血  格斗".to_owned();
        work.status = "已完结".to_owned();
        work.update_time = Some(Timestamp::Text("2023-12-20".to_owned()));

        let common = resolve_common(&work, 1).unwrap();
        let resolved = apply(common.clone(), &work, 1, at(2024, 6, 1));

        assert_eq!(
            resolved.comic_info.genre,
            Some(vec![
                "少年".to_owned(),
                "热血".to_owned(),
                "格斗".to_owned()
            ])
        );
        assert_eq!(resolved.comic_info.tags, Some(vec!["已完结".to_owned()]));
        assert_eq!(resolved.comic_info.community_rating, None);
        assert_eq!(resolved.comic_info.suggested_volume_split, None);
        assert_eq!(resolved.chapter_info.chapter_name, "第1回");
        assert_eq!(
            resolved.chapter_info.updated_at,
            Some(UpdatedAt {
                year: 2023,
                month: 10,
                day: 21
            })
        );
        assert_eq!(common.chapter_info.updated_at, None);
    }

    #[test]
    fn epoch_millis_update_time() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut work = work_in(temp.path(), vec![chapter("c1", 1.0, "A")]);
        work.update_time = Some(Timestamp::Millis(1_682_899_200_000.0));

        let resolved = apply(resolve_common(&work, 1).unwrap(), &work, 1, at(2024, 6, 1));
        assert_eq!(
            resolved.chapter_info.updated_at,
            Some(UpdatedAt {
                year: 2023,
                month: 5,
                day: 1
            })
        );
    }

    #[test]
    fn missing_update_time_uses_now_and_omits_empty_fields() {
        let temp = tempfile::TempDir::new().unwrap();
        let work = work_in(temp.path(), vec![chapter("c1", 1.0, "A")]);

        let resolved = apply(resolve_common(&work, 1).unwrap(), &work, 1, at(2024, 6, 1));
        assert_eq!(resolved.comic_info.genre, None);
        assert_eq!(resolved.comic_info.tags, None);
        assert_eq!(
            resolved.chapter_info.updated_at,
            Some(UpdatedAt {
                year: 2024,
                month: 6,
                day: 1
            })
        );
    }
}
