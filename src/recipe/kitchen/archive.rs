// src/recipe/kitchen/archive.rs

//! Archive and source file utilities for the Kitchen
//!
//! Downloads go through a blocking `reqwest` client and land in a temporary
//! file that is renamed into place once complete. Extraction is done in
//! process with `tar` plus the matching decompressor.

use crate::error::{Error, Result};
use flate2::read::GzDecoder;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client;
use std::fs::{self, File};
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tar::Archive;
use tracing::{debug, info};
use xz2::read::XzDecoder;

const STREAM_BUFFER_SIZE: usize = 64 * 1024;

/// Compression applied around a tar stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionFormat {
    Gzip,
    Xz,
    Zstd,
    None,
}

impl CompressionFormat {
    /// Detect compression from a file name
    pub fn from_filename(name: &str) -> Option<Self> {
        let name = name.to_ascii_lowercase();
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(Self::Gzip)
        } else if name.ends_with(".tar.xz") || name.ends_with(".txz") {
            Some(Self::Xz)
        } else if name.ends_with(".tar.zst") || name.ends_with(".tzst") {
            Some(Self::Zstd)
        } else if name.ends_with(".tar") {
            Some(Self::None)
        } else {
            None
        }
    }

    /// Detect compression from the first bytes of a file
    pub fn from_magic(header: &[u8]) -> Option<Self> {
        if header.starts_with(&[0x1f, 0x8b]) {
            Some(Self::Gzip)
        } else if header.starts_with(&[0xfd, b'7', b'z', b'X', b'Z', 0x00]) {
            Some(Self::Xz)
        } else if header.starts_with(&[0x28, 0xb5, 0x2f, 0xfd]) {
            Some(Self::Zstd)
        } else if header.len() >= 262 && &header[257..262] == b"ustar" {
            Some(Self::None)
        } else {
            None
        }
    }
}

/// Whether a source URL refers to the local filesystem
pub fn is_local_url(url: &str) -> bool {
    url.starts_with("file://") || !url.contains("://")
}

/// Download a file from a URL
///
/// `file://` URLs and plain paths are copied instead of downloaded.
pub fn download_file(url: &str, dest: &Path, timeout: Duration, progress: bool) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            Error::IoError(format!("Failed to create directory {}: {e}", parent.display()))
        })?;
    }

    let temp_path = dest.with_extension("tmp");

    if is_local_url(url) {
        let source = PathBuf::from(url.strip_prefix("file://").unwrap_or(url));
        debug!("Copying local source {}", source.display());
        fs::copy(&source, &temp_path).map_err(|e| {
            Error::DownloadError(format!("Failed to copy {}: {e}", source.display()))
        })?;
    } else {
        fetch_http(url, &temp_path, timeout, progress)?;
    }

    fs::rename(&temp_path, dest).map_err(|e| {
        Error::IoError(format!(
            "Failed to move {} to {}: {e}",
            temp_path.display(),
            dest.display()
        ))
    })?;
    Ok(())
}

fn fetch_http(url: &str, dest: &Path, timeout: Duration, progress: bool) -> Result<()> {
    info!("Downloading {}", url);

    let client = Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::DownloadError(format!("Failed to create HTTP client: {e}")))?;

    let mut response = client
        .get(url)
        .send()
        .map_err(|e| Error::DownloadError(format!("Failed to download {url}: {e}")))?;

    if !response.status().is_success() {
        return Err(Error::DownloadError(format!(
            "HTTP {} from {}",
            response.status(),
            url
        )));
    }

    let total_size = response.content_length().unwrap_or(0);
    let pb = if progress {
        let pb = ProgressBar::new(total_size);
        if let Ok(style) = ProgressStyle::default_bar().template(
            "{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}) {msg}",
        ) {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb.set_message(url.rsplit('/').next().unwrap_or(url).to_string());
        Some(pb)
    } else {
        None
    };

    let mut file = File::create(dest)
        .map_err(|e| Error::IoError(format!("Failed to create file {}: {e}", dest.display())))?;

    let mut downloaded: u64 = 0;
    let mut buffer = vec![0u8; STREAM_BUFFER_SIZE];
    loop {
        let n = response
            .read(&mut buffer)
            .map_err(|e| Error::DownloadError(format!("Failed to read response: {e}")))?;
        if n == 0 {
            break;
        }
        file.write_all(&buffer[..n])
            .map_err(|e| Error::IoError(format!("Failed to write data: {e}")))?;
        downloaded += n as u64;
        if let Some(pb) = &pb {
            pb.set_position(downloaded);
        }
    }

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    info!("Downloaded {} bytes", downloaded);
    Ok(())
}

/// Extract a tar archive (optionally compressed) into `dest`
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<()> {
    let filename = archive
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    let format = match CompressionFormat::from_filename(filename) {
        Some(format) => format,
        None => {
            let mut header = [0u8; 512];
            let mut file = File::open(archive)?;
            let n = file.read(&mut header)?;
            CompressionFormat::from_magic(&header[..n]).ok_or_else(|| {
                Error::ParseError(format!("Unknown archive format: {}", filename))
            })?
        }
    };

    let file = BufReader::new(File::open(archive).map_err(|e| {
        Error::IoError(format!("Failed to open archive {}: {e}", archive.display()))
    })?);

    let reader: Box<dyn Read> = match format {
        CompressionFormat::Gzip => Box::new(GzDecoder::new(file)),
        CompressionFormat::Xz => Box::new(XzDecoder::new(file)),
        CompressionFormat::Zstd => Box::new(
            zstd::Decoder::new(file)
                .map_err(|e| Error::IoError(format!("Failed to create zstd decoder: {e}")))?,
        ),
        CompressionFormat::None => Box::new(file),
    };

    fs::create_dir_all(dest)?;
    Archive::new(reader).unpack(dest).map_err(|e| {
        Error::IoError(format!(
            "Failed to extract {}: {e}",
            archive.display()
        ))
    })?;

    debug!("Extracted {} to {}", archive.display(), dest.display());
    Ok(())
}

/// The effective source root after stripping a single top-level directory
///
/// Returns `dir` unchanged unless it holds exactly one entry that is a
/// directory.
pub fn strip_root(dir: &Path) -> Result<PathBuf> {
    let entries: Vec<_> = fs::read_dir(dir)?.collect::<std::io::Result<Vec<_>>>()?;

    if entries.len() == 1 && entries[0].file_type()?.is_dir() {
        Ok(entries[0].path())
    } else {
        Ok(dir.to_path_buf())
    }
}

/// Remove directories from an extracted tree; missing ones are ignored
pub fn remove_dirs(root: &Path, dirs: &[String]) -> Result<Vec<String>> {
    let mut removed = Vec::new();
    for dir in dirs {
        let path = root.join(dir);
        if path.is_dir() {
            fs::remove_dir_all(&path).map_err(|e| {
                Error::IoError(format!("Failed to remove {}: {e}", path.display()))
            })?;
            removed.push(dir.clone());
        } else {
            debug!("Nothing to remove at {}", path.display());
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;

    fn make_tarball(path: &Path, entries: &[(&str, &str)]) {
        let file = File::create(path).unwrap();
        let encoder = GzEncoder::new(file, Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, content) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, content.as_bytes()).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn test_detect_compression() {
        assert_eq!(
            CompressionFormat::from_filename("SDL_mixer-1.2.12.tar.gz"),
            Some(CompressionFormat::Gzip)
        );
        assert_eq!(
            CompressionFormat::from_filename("x.tar.xz"),
            Some(CompressionFormat::Xz)
        );
        assert_eq!(
            CompressionFormat::from_filename("x.tar.zst"),
            Some(CompressionFormat::Zstd)
        );
        assert_eq!(CompressionFormat::from_filename("download"), None);
        assert_eq!(
            CompressionFormat::from_magic(&[0x1f, 0x8b, 0x08]),
            Some(CompressionFormat::Gzip)
        );
    }

    #[test]
    fn test_extract_and_strip_root() {
        let dir = tempfile::tempdir().unwrap();
        let tarball = dir.path().join("demo-1.0.tar.gz");
        make_tarball(
            &tarball,
            &[("demo-1.0/demo.c", "int x;\n"), ("demo-1.0/external/z.c", "")],
        );

        let dest = dir.path().join("src");
        extract_archive(&tarball, &dest).unwrap();
        let root = strip_root(&dest).unwrap();
        assert_eq!(root, dest.join("demo-1.0"));
        assert_eq!(fs::read_to_string(root.join("demo.c")).unwrap(), "int x;\n");

        let removed = remove_dirs(&root, &["external".to_string(), "missing".to_string()]).unwrap();
        assert_eq!(removed, vec!["external"]);
        assert!(!root.join("external").exists());
    }

    #[test]
    fn test_extract_sniffs_unnamed_archive() {
        let dir = tempfile::tempdir().unwrap();
        let tarball = dir.path().join("download");
        make_tarball(&tarball, &[("a.c", "a")]);

        let dest = dir.path().join("out");
        extract_archive(&tarball, &dest).unwrap();
        assert_eq!(strip_root(&dest).unwrap(), dest);
    }

    #[test]
    fn test_extract_archive_unknown_format() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("file.unknown");
        fs::write(&bogus, b"not an archive").unwrap();
        assert!(extract_archive(&bogus, dir.path()).is_err());
    }

    #[test]
    fn test_local_download() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.tar.gz");
        fs::write(&source, b"payload").unwrap();

        let dest = dir.path().join("cache/copy.tar.gz");
        let url = format!("file://{}", source.display());
        download_file(&url, &dest, Duration::from_secs(5), false).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"payload");

        assert!(is_local_url("/srv/mirror/a.tar.gz"));
        assert!(!is_local_url("https://example.com/a.tar.gz"));
        assert!(download_file("/nonexistent/a.tar.gz", &dest, Duration::from_secs(5), false).is_err());
    }
}
