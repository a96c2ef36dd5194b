use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::Utc;

use crate::archive::{ArchiveConfig, Archiver};
use crate::cli::MakeArgs;
use crate::comic_info::{compose, count_pages, effective_volume_split, write_descriptor};
use crate::formats::{ComicInfo, RawWorkData, SeriesSidecar};
use crate::resolver::{ResolveError, resolve};

pub const SIDECAR_FILE_NAME: &str = "info.json";

/// Result of converting one chapter.
///
/// Resolution failures happen before anything is written. Archive failures
/// happen after the sidecar and descriptor exist; those are left in place.
#[derive(Debug)]
pub enum MakeOutcome {
    Archived {
        archive: PathBuf,
        descriptor: PathBuf,
        page_count: usize,
    },
    ArchiveFailed {
        archive: PathBuf,
        descriptor: PathBuf,
        reason: String,
    },
    Unresolved(ResolveError),
}

impl MakeOutcome {
    pub fn is_archived(&self) -> bool {
        matches!(self, Self::Archived { .. })
    }
}

pub struct Converter {
    pub library_root: PathBuf,
    pub volume_split: u32,
    pub compression_level: u8,
    pub archiver: Box<dyn Archiver>,
}

impl Converter {
    pub async fn make_cbz(
        &self,
        work: &RawWorkData,
        chapter_no: usize,
        site_id: &str,
    ) -> anyhow::Result<MakeOutcome> {
        let resolved = match resolve(work, chapter_no, site_id) {
            Ok(resolved) => resolved,
            Err(err) => {
                tracing::error!(
                    chapter_no,
                    site = site_id,
                    %err,
                    "cannot resolve metadata for chapter #{chapter_no}"
                );
                return Ok(MakeOutcome::Unresolved(err));
            }
        };
        let comic = &resolved.comic_info;
        let chapter = &resolved.chapter_info;
        tracing::info!(
            chapter_no,
            site = site_id,
            series = %comic.title,
            volume = %chapter.volume_name,
            chapter = %chapter.chapter_name,
            "resolved metadata"
        );
        tracing::debug!(?resolved, "resolved metadata detail");

        let series_dir = self.library_root.join(&comic.title);
        std::fs::create_dir_all(&series_dir)
            .with_context(|| format!("create series dir: {}", series_dir.display()))?;
        write_sidecar(&series_dir, work, comic.clone(), site_id)?;

        let archive = series_dir.join(format!(
            "{} - {}.cbz",
            chapter.volume_name, chapter.chapter_name
        ));
        if let Some(parent) = archive.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create archive dir: {}", parent.display()))?;
        }
        std::fs::create_dir_all(&chapter.directory).with_context(|| {
            format!("create chapter dir: {}", chapter.directory.display())
        })?;

        let page_count = count_pages(&chapter.directory)?;
        let volume_split = effective_volume_split(comic, self.volume_split);
        let descriptor = compose(
            comic,
            chapter,
            volume_split,
            page_count,
            Utc::now().date_naive(),
        );
        let descriptor_path = write_descriptor(&chapter.directory, &descriptor)?;

        tracing::info!(
            number = descriptor.number,
            page_count,
            archive = %archive.display(),
            "zipping chapter"
        );
        match self
            .archiver
            .compress(&chapter.directory, &archive, self.compression_level)
            .await
        {
            Ok(()) => {
                tracing::info!(archive = %archive.display(), "successfully zipped");
                Ok(MakeOutcome::Archived {
                    archive,
                    descriptor: descriptor_path,
                    page_count,
                })
            }
            Err(err) => {
                tracing::error!(archive = %archive.display(), "error zipping: {err:#}");
                Ok(MakeOutcome::ArchiveFailed {
                    archive,
                    descriptor: descriptor_path,
                    reason: format!("{err:#}"),
                })
            }
        }
    }

    /// Converts every chapter in order; a chapter that fails softly does not
    /// stop the rest.
    pub async fn make_all(
        &self,
        work: &RawWorkData,
        site_id: &str,
    ) -> anyhow::Result<Vec<MakeOutcome>> {
        let mut outcomes = Vec::with_capacity(work.chapter_list.len());
        for chapter_no in 1..=work.chapter_list.len() {
            outcomes.push(self.make_cbz(work, chapter_no, site_id).await?);
        }
        Ok(outcomes)
    }
}

fn write_sidecar(
    series_dir: &Path,
    work: &RawWorkData,
    comic_info: ComicInfo,
    site_id: &str,
) -> anyhow::Result<()> {
    let sidecar = SeriesSidecar {
        last_fetched: Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        comic_info,
        data_root: work.directory.clone(),
        site_name: site_id.to_owned(),
    };
    let path = series_dir.join(SIDECAR_FILE_NAME);
    let json = serde_json::to_string_pretty(&sidecar).context("serialize series sidecar")?;
    std::fs::write(&path, json).with_context(|| format!("write sidecar: {}", path.display()))?;
    Ok(())
}

pub fn read_work_data(path: &Path) -> anyhow::Result<RawWorkData> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("read work data: {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("parse work data: {}", path.display()))
}

/// Site given on the command line, else the one the scraper recorded.
pub fn site_for(work: &RawWorkData, explicit: Option<&str>) -> String {
    explicit
        .map(str::to_owned)
        .unwrap_or_else(|| work.site_name.clone())
}

pub async fn run(args: MakeArgs) -> anyhow::Result<()> {
    let work_path = PathBuf::from(&args.work);
    let work = read_work_data(&work_path)?;
    let site = site_for(&work, args.site.as_deref());

    let mut config = ArchiveConfig::from_env()?;
    if let Some(level) = args.compression_level {
        config.compression_level = level;
    }
    let converter = Converter {
        library_root: PathBuf::from(&args.library),
        volume_split: args.volume_split,
        compression_level: config.compression_level,
        archiver: config.archiver(),
    };

    let outcomes = match args.chapter {
        Some(chapter_no) if !args.all => vec![converter.make_cbz(&work, chapter_no, &site).await?],
        _ => converter.make_all(&work, &site).await?,
    };

    let archived = outcomes.iter().filter(|o| o.is_archived()).count();
    tracing::info!(
        archived,
        failed = outcomes.len() - archived,
        work = %work_path.display(),
        "make finished"
    );
    Ok(())
}
