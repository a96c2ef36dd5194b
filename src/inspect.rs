use std::io::Write as _;
use std::path::PathBuf;

use anyhow::Context as _;
use serde::Serialize;

use crate::cli::InspectArgs;
use crate::comic_info::{effective_volume_split, flatten_chapter_number};
use crate::make::{read_work_data, site_for};
use crate::resolver::{Resolved, Site, resolve};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InspectReport<'a> {
    site: &'a str,
    resolver: Site,
    volume_split: u32,
    number: f64,
    #[serde(flatten)]
    resolved: &'a Resolved,
}

/// Prints the resolved metadata for one chapter without touching the library.
pub fn run(args: InspectArgs) -> anyhow::Result<()> {
    let work_path = PathBuf::from(&args.work);
    let work = read_work_data(&work_path)?;
    let site = site_for(&work, args.site.as_deref());

    let resolved = match resolve(&work, args.chapter, &site) {
        Ok(resolved) => resolved,
        Err(err) => {
            tracing::error!(
                chapter_no = args.chapter,
                site = %site,
                %err,
                "cannot resolve metadata for chapter #{}",
                args.chapter
            );
            return Ok(());
        }
    };

    let volume_split = effective_volume_split(&resolved.comic_info, args.volume_split);
    let chapter = &resolved.chapter_info;
    let report = InspectReport {
        site: &site,
        resolver: Site::parse(&site),
        volume_split,
        number: flatten_chapter_number(
            chapter.chapter_ordinal,
            chapter.volume_ordinal.unwrap_or(1),
            volume_split,
        ),
        resolved: &resolved,
    };

    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &report).context("serialize inspect report")?;
    stdout.write_all(b"\n").context("write inspect newline")?;
    stdout.flush().context("flush stdout")?;
    Ok(())
}
