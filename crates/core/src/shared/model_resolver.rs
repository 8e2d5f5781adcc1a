use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::constants::APP_CACHE_DIR;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("could not determine a cache directory for this platform")]
    NoCacheDir,
    #[error("cannot create model cache {path}: {source}")]
    CacheDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("fetching {url} failed: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("cannot store model at {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A model file name and the URL it can be fetched from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModelSpec {
    pub name: &'static str,
    pub url: &'static str,
}

/// Progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 if the server didn't provide Content-Length.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

/// Locates a model file, downloading it into the user cache on first use.
///
/// Lookup order: user cache, then `bundled_dir`, then download.
pub fn resolve(
    model: &ModelSpec,
    bundled_dir: Option<&Path>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    resolve_in(&model_cache_dir()?, model, bundled_dir, progress)
}

/// [`resolve`] against an explicit cache directory.
pub fn resolve_in(
    cache_dir: &Path,
    model: &ModelSpec,
    bundled_dir: Option<&Path>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    let cached_path = cache_dir.join(model.name);
    if cached_path.exists() {
        log::debug!("Model {} found in cache", model.name);
        return Ok(cached_path);
    }

    if let Some(bundled_path) = bundled_dir.map(|dir| dir.join(model.name)) {
        if bundled_path.exists() {
            log::debug!("Model {} found at {}", model.name, bundled_path.display());
            return Ok(bundled_path);
        }
    }

    fs::create_dir_all(cache_dir).map_err(|source| ModelResolveError::CacheDir {
        path: cache_dir.to_path_buf(),
        source,
    })?;
    log::info!("Downloading {} from {}", model.name, model.url);
    download(model.url, &cached_path, progress)?;
    Ok(cached_path)
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/Face Triage/models/`
/// - Linux: `$XDG_CACHE_HOME/Face Triage/models/` or `~/.cache/Face Triage/models/`
/// - Windows: `%LOCALAPPDATA%/Face Triage/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    let base = dirs::data_dir();
    #[cfg(not(target_os = "macos"))]
    let base = dirs::cache_dir();

    base.map(|d| d.join(APP_CACHE_DIR).join("models"))
        .ok_or(ModelResolveError::NoCacheDir)
}

/// Fetches `url` into a sibling `.part` file and renames it over `dest`
/// once the body is complete.
fn download(url: &str, dest: &Path, progress: Option<ProgressFn>) -> Result<(), ModelResolveError> {
    let mut response = reqwest::blocking::get(url)
        .and_then(reqwest::blocking::Response::error_for_status)
        .map_err(|source| ModelResolveError::Download {
            url: url.to_owned(),
            source,
        })?;
    let total = response.content_length().unwrap_or(0);

    let partial = dest.with_extension("part");
    let written = stream_to_file(&mut response, &partial, total, progress.as_ref())
        .and_then(|()| fs::rename(&partial, dest));
    written.map_err(|source| {
        let _ = fs::remove_file(&partial);
        ModelResolveError::Write {
            path: dest.to_path_buf(),
            source,
        }
    })
}

/// Writer that reports the running byte count after every write.
struct Counting<'a, W> {
    inner: W,
    written: u64,
    total: u64,
    progress: Option<&'a ProgressFn>,
}

impl<W: Write> Write for Counting<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        if let Some(report) = self.progress {
            report(self.written, self.total);
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

fn stream_to_file(
    body: &mut impl Read,
    path: &Path,
    total: u64,
    progress: Option<&ProgressFn>,
) -> io::Result<()> {
    let mut out = Counting {
        inner: io::BufWriter::new(fs::File::create(path)?),
        written: 0,
        total,
        progress,
    };
    io::copy(body, &mut out)?;
    out.flush()
}
