use std::fs::{self, File};
use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use async_trait::async_trait;
use zip::write::SimpleFileOptions;

pub const DEFAULT_COMPRESSION_LEVEL: u8 = 1;
pub const MAX_COMPRESSION_LEVEL: u8 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiverKind {
    Builtin,
    Command,
}

impl ArchiverKind {
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "builtin" => Ok(Self::Builtin),
            "command" => Ok(Self::Command),
            other => anyhow::bail!("unsupported archiver: {other}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    pub kind: ArchiverKind,
    pub zip_bin: String,
    pub compression_level: u8,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            kind: ArchiverKind::Builtin,
            zip_bin: "zip".to_owned(),
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

impl ArchiveConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let raw_kind = std::env::var("CBZIFY_ARCHIVER").unwrap_or_default();
        let kind = ArchiverKind::parse(&raw_kind).with_context(|| {
            format!("invalid CBZIFY_ARCHIVER={raw_kind:?}. expected one of: builtin, command")
        })?;
        let zip_bin = std::env::var("CBZIFY_ZIP_BIN").unwrap_or_else(|_| "zip".to_owned());
        let compression_level = match std::env::var("CBZIFY_COMPRESSION_LEVEL") {
            Ok(raw) => parse_compression_level(&raw)
                .with_context(|| format!("invalid CBZIFY_COMPRESSION_LEVEL={raw:?}"))?,
            Err(_) => DEFAULT_COMPRESSION_LEVEL,
        };
        Ok(Self {
            kind,
            zip_bin,
            compression_level,
        })
    }

    pub fn archiver(&self) -> Box<dyn Archiver> {
        match self.kind {
            ArchiverKind::Builtin => Box::new(ZipArchiver),
            ArchiverKind::Command => Box::new(ZipCommandArchiver {
                bin: self.zip_bin.clone(),
            }),
        }
    }
}

pub fn parse_compression_level(raw: &str) -> anyhow::Result<u8> {
    let level: u8 = raw
        .trim()
        .parse()
        .with_context(|| format!("compression level must be a number: {raw}"))?;
    if level > MAX_COMPRESSION_LEVEL {
        anyhow::bail!("compression level must be between 0 and {MAX_COMPRESSION_LEVEL}: {level}");
    }
    Ok(level)
}

/// Packs a chapter directory into a `.cbz`.
#[async_trait]
pub trait Archiver: Send + Sync {
    /// Replaces `output` with an archive of everything under `input_dir`.
    async fn compress(&self, input_dir: &Path, output: &Path, level: u8) -> anyhow::Result<()>;
}

/// In-process archiver backed by the `zip` crate. Level 0 stores entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipArchiver;

#[async_trait]
impl Archiver for ZipArchiver {
    async fn compress(&self, input_dir: &Path, output: &Path, level: u8) -> anyhow::Result<()> {
        let input_dir = input_dir.to_path_buf();
        let output = output.to_path_buf();
        tokio::task::spawn_blocking(move || write_zip(&input_dir, &output, level))
            .await
            .context("join zip task")?
    }
}

fn write_zip(input_dir: &Path, output: &Path, level: u8) -> anyhow::Result<()> {
    if !input_dir.is_dir() {
        anyhow::bail!("archive input directory not found: {}", input_dir.display());
    }

    let base_options = SimpleFileOptions::default().unix_permissions(0o644);
    let options = if level == 0 {
        base_options.compression_method(zip::CompressionMethod::Stored)
    } else {
        base_options
            .compression_method(zip::CompressionMethod::Deflated)
            .compression_level(Some(i64::from(level)))
    };

    let out_file =
        File::create(output).with_context(|| format!("create archive: {}", output.display()))?;
    let mut zip = zip::ZipWriter::new(out_file);

    for entry in list_entries_sorted(input_dir)? {
        let rel_path = entry
            .path
            .strip_prefix(input_dir)
            .with_context(|| format!("strip archive prefix: {}", entry.path.display()))?;
        let name = rel_path.to_string_lossy().replace('\\', "/");

        if entry.is_dir {
            zip.add_directory(format!("{name}/"), options)
                .with_context(|| format!("archive add_directory: {name}"))?;
            continue;
        }

        let mut f = File::open(&entry.path)
            .with_context(|| format!("open archive entry: {}", entry.path.display()))?;
        zip.start_file(name.as_str(), options)
            .with_context(|| format!("archive start_file: {name}"))?;
        std::io::copy(&mut f, &mut zip).with_context(|| format!("archive write: {name}"))?;
    }

    let mut out_file = zip.finish().context("archive finish zip")?;
    out_file
        .flush()
        .with_context(|| format!("flush archive: {}", output.display()))?;
    Ok(())
}

#[derive(Debug)]
struct ArchiveEntry {
    path: PathBuf,
    is_dir: bool,
}

fn list_entries_sorted(dir: &Path) -> anyhow::Result<Vec<ArchiveEntry>> {
    let mut entries = Vec::new();
    let mut stack = vec![dir.to_path_buf()];

    while let Some(current) = stack.pop() {
        for entry in fs::read_dir(&current)
            .with_context(|| format!("read dir: {}", current.display()))?
        {
            let entry = entry.with_context(|| format!("list dir: {}", current.display()))?;
            let path = entry.path();
            let file_type = entry.file_type().context("read entry type")?;
            if file_type.is_dir() {
                stack.push(path.clone());
                entries.push(ArchiveEntry { path, is_dir: true });
                continue;
            }
            if file_type.is_file() {
                entries.push(ArchiveEntry {
                    path,
                    is_dir: false,
                });
            }
        }
    }

    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(entries)
}

/// Shells out to an Info-ZIP compatible `zip` executable.
#[derive(Debug, Clone)]
pub struct ZipCommandArchiver {
    pub bin: String,
}

#[async_trait]
impl Archiver for ZipCommandArchiver {
    async fn compress(&self, input_dir: &Path, output: &Path, level: u8) -> anyhow::Result<()> {
        let output = std::path::absolute(output)
            .with_context(|| format!("resolve archive path: {}", output.display()))?;
        // `zip` updates an existing archive in place instead of replacing it.
        match tokio::fs::remove_file(&output).await {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("remove old archive: {}", output.display()));
            }
        }

        tracing::debug!(bin = %self.bin, level, input = %input_dir.display(), "zip exec");
        let result = tokio::process::Command::new(&self.bin)
            .arg(format!("-{level}r"))
            .arg(&output)
            .arg("./")
            .current_dir(input_dir)
            .output()
            .await
            .with_context(|| format!("run zip: {}", self.bin))?;

        if !result.status.success() {
            anyhow::bail!(
                "zip failed ({}): {}",
                result.status,
                String::from_utf8_lossy(&result.stderr)
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read as _;

    use super::*;

    #[test]
    fn parse_archiver_kind() {
        assert_eq!(ArchiverKind::parse("").unwrap(), ArchiverKind::Builtin);
        assert_eq!(ArchiverKind::parse(" Builtin ").unwrap(), ArchiverKind::Builtin);
        assert_eq!(ArchiverKind::parse("COMMAND").unwrap(), ArchiverKind::Command);
        let err = ArchiverKind::parse("7z").unwrap_err().to_string();
        assert!(err.contains("unsupported archiver"));
    }

    #[test]
    fn parse_compression_level_bounds() {
        assert_eq!(parse_compression_level("0").unwrap(), 0);
        assert_eq!(parse_compression_level(" 9 ").unwrap(), 9);
        assert!(parse_compression_level("10").is_err());
        assert!(parse_compression_level("fast").is_err());
    }

    fn chapter_dir(root: &Path) -> PathBuf {
        let dir = root.join("chapter");
        fs::create_dir_all(dir.join("nested")).unwrap();
        fs::write(dir.join("001.jpg"), b"page one").unwrap();
        fs::write(dir.join("002.jpg"), b"page two").unwrap();
        fs::write(dir.join("nested").join("003.jpg"), b"page three").unwrap();
        fs::write(dir.join("ComicInfo.xml"), b"<ComicInfo/>").unwrap();
        dir
    }

    fn entry_names(archive: &Path) -> Vec<String> {
        let file = File::open(archive).unwrap();
        let zip = zip::ZipArchive::new(file).unwrap();
        let mut names = zip.file_names().map(str::to_owned).collect::<Vec<_>>();
        names.sort();
        names
    }

    #[tokio::test]
    async fn zip_archiver_packs_whole_directory() {
        let temp = tempfile::TempDir::new().unwrap();
        let dir = chapter_dir(temp.path());
        let out = temp.path().join("out.cbz");

        ZipArchiver.compress(&dir, &out, 1).await.unwrap();

        assert_eq!(
            entry_names(&out),
            vec![
                "001.jpg",
                "002.jpg",
                "ComicInfo.xml",
                "nested/",
                "nested/003.jpg"
            ]
        );

        let mut zip = zip::ZipArchive::new(File::open(&out).unwrap()).unwrap();
        let mut contents = String::new();
        zip.by_name("nested/003.jpg")
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "page three");
    }

    #[tokio::test]
    async fn zip_archiver_level_zero_stores_entries() {
        let temp = tempfile::TempDir::new().unwrap();
        let dir = chapter_dir(temp.path());
        let out = temp.path().join("out.cbz");

        ZipArchiver.compress(&dir, &out, 0).await.unwrap();

        let mut zip = zip::ZipArchive::new(File::open(&out).unwrap()).unwrap();
        let entry = zip.by_name("001.jpg").unwrap();
        assert_eq!(entry.compression(), zip::CompressionMethod::Stored);
    }

    #[tokio::test]
    async fn zip_archiver_replaces_existing_archive() {
        let temp = tempfile::TempDir::new().unwrap();
        let dir = chapter_dir(temp.path());
        let out = temp.path().join("out.cbz");
        fs::write(&out, b"stale").unwrap();

        ZipArchiver.compress(&dir, &out, 1).await.unwrap();
        assert_eq!(entry_names(&out).len(), 5);
    }

    #[tokio::test]
    async fn zip_archiver_fails_for_missing_input() {
        let temp = tempfile::TempDir::new().unwrap();
        let err = ZipArchiver
            .compress(&temp.path().join("missing"), &temp.path().join("out.cbz"), 1)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn command_archiver_reports_missing_binary() {
        let temp = tempfile::TempDir::new().unwrap();
        let dir = chapter_dir(temp.path());
        let archiver = ZipCommandArchiver {
            bin: "cbzify-no-such-zip-binary".to_owned(),
        };
        let err = archiver
            .compress(&dir, &temp.path().join("out.cbz"), 1)
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("run zip"));
    }
}
