use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::formats::{ChapterInfo, ComicInfo, RawChapterRecord, RawWorkData};
use crate::resolver::{Resolved, ResolveError, split_words};

/// Best-effort metadata from the fields every site provides.
pub fn resolve_common(work: &RawWorkData, chapter_no: usize) -> Result<Resolved, ResolveError> {
    let chapter = chapter_no
        .checked_sub(1)
        .and_then(|idx| work.chapter_list.get(idx))
        .ok_or(ResolveError::OutOfRange {
            chapter_no,
            chapter_count: work.chapter_list.len(),
        })?;

    let volumes = volume_map(&work.chapter_list);
    tracing::debug!(?volumes, "volume map");

    let directory = find_chapter_directory(&work.directory, &chapter.title)?;

    Ok(Resolved {
        comic_info: ComicInfo {
            title: work.series_title().to_owned(),
            authors: split_words(&work.author),
            description: work.description.clone(),
            web: work.read_url.clone(),
            ..Default::default()
        },
        chapter_info: ChapterInfo {
            chapter_name: chapter.title.clone(),
            volume_name: chapter.part_title.clone(),
            chapter_ordinal: chapter.no_in_part,
            volume_ordinal: volumes.get(&chapter.part_title).copied(),
            updated_at: None,
            directory,
        },
    })
}

/// Volume ordinals in first-occurrence order.
///
/// A volume title counts as new when one of its chapters sits at position 1
/// within the volume; titles never seen at position 1 get no ordinal.
pub fn volume_map(chapters: &[RawChapterRecord]) -> HashMap<String, u32> {
    let mut volumes = HashMap::new();
    let mut next_ordinal = 1_u32;
    for chapter in chapters {
        if chapter.no_in_part != 1.0 || volumes.contains_key(&chapter.part_title) {
            continue;
        }
        volumes.insert(chapter.part_title.clone(), next_ordinal);
        next_ordinal += 1;
    }
    volumes
}

/// First immediate sub-directory of `root` (by name) whose name contains
/// `title`.
pub fn find_chapter_directory(root: &Path, title: &str) -> Result<PathBuf, ResolveError> {
    let list_err = |source| ResolveError::ListDirectory {
        root: root.to_path_buf(),
        source,
    };

    let mut names = Vec::new();
    for entry in std::fs::read_dir(root).map_err(list_err)? {
        let entry = entry.map_err(list_err)?;
        if !entry.path().is_dir() {
            continue;
        }
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();

    names
        .into_iter()
        .find(|name| name.contains(title))
        .map(|name| root.join(name))
        .ok_or_else(|| ResolveError::ChapterDirectoryNotFound {
            title: title.to_owned(),
            root: root.to_path_buf(),
        })
}
