//! # pdfium-provision
//!
//! Makes the native [PDFium](https://pdfium.googlesource.com/pdfium/) library
//! available to `pdfium-render` through one explicit initialization step.
//!
//! The library is resolved in this order:
//!
//! 1. An explicit path (`PDFIUM_LIB_PATH` or [`Provisioner::with_library_path`]).
//! 2. The per-release cache directory, e.g. `~/.cache/firstlast/pdfium-7690/`.
//! 3. A download of the platform archive from
//!    [bblanchon/pdfium-binaries](https://github.com/bblanchon/pdfium-binaries),
//!    unpacked into the cache directory.
//!
//! ```rust,no_run
//! use pdfium_provision::Provisioner;
//!
//! let provisioner = Provisioner::from_env();
//! let source = provisioner.ensure(None).expect("pdfium unavailable");
//! println!("using {}", source.path().display());
//! let pdfium = provisioner.bind(None).expect("bind failed");
//! # drop(pdfium);
//! ```
//!
//! ## Environment variables
//!
//! - `PDFIUM_LIB_PATH`: existing library to bind; skips cache and download.
//! - `FIRSTLAST_PDFIUM_CACHE`: root directory for the download cache.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use pdfium_render::prelude::Pdfium;
use thiserror::Error;
use tracing::{debug, info, warn};

/// pdfium-binaries release downloaded when nothing is cached.
pub const PDFIUM_RELEASE: &str = "7690";

/// Points at an existing PDFium library.
pub const LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Overrides the cache root.
pub const CACHE_DIR_ENV: &str = "FIRSTLAST_PDFIUM_CACHE";

const RELEASES_URL: &str = "https://github.com/bblanchon/pdfium-binaries/releases/download";

// Serialises downloads so concurrent callers don't fetch the archive twice.
static DOWNLOAD_LOCK: Mutex<()> = Mutex::new(());

/// Receives `(bytes_downloaded, total_bytes)` while the archive downloads.
pub type DownloadProgress<'a> = &'a dyn Fn(u64, Option<u64>);

/// Errors raised while locating or binding PDFium.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("No PDFium build is published for {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    #[error("Cannot prepare cache directory '{path}': {source}")]
    CacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Downloading '{url}' failed: {reason}")]
    Download { url: String, reason: String },

    #[error("Unpacking the PDFium archive failed: {0}")]
    Extract(String),

    #[error("'{entry}' is missing from the PDFium archive")]
    MissingFromArchive { entry: String },

    #[error("Failed to bind PDFium from '{path}': {reason}")]
    Bind { path: PathBuf, reason: String },
}

// ── Platform table ───────────────────────────────────────────────────────────

/// Where a platform's library lives in the release archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Target {
    archive: &'static str,
    entry: &'static str,
    file_name: &'static str,
}

const UNIX_SO: (&str, &str) = ("lib/libpdfium.so", "libpdfium.so");
const MAC_DYLIB: (&str, &str) = ("lib/libpdfium.dylib", "libpdfium.dylib");
const WIN_DLL: (&str, &str) = ("bin/pdfium.dll", "pdfium.dll");

const TARGETS: &[(&str, &str, &str, (&str, &str))] = &[
    ("macos", "aarch64", "pdfium-mac-arm64.tgz", MAC_DYLIB),
    ("macos", "x86_64", "pdfium-mac-x64.tgz", MAC_DYLIB),
    ("linux", "x86_64", "pdfium-linux-x64.tgz", UNIX_SO),
    ("linux", "aarch64", "pdfium-linux-arm64.tgz", UNIX_SO),
    ("windows", "x86_64", "pdfium-win-x64.tgz", WIN_DLL),
    ("windows", "aarch64", "pdfium-win-arm64.tgz", WIN_DLL),
    ("windows", "x86", "pdfium-win-x86.tgz", WIN_DLL),
];

fn target_for(os: &str, arch: &str) -> Result<Target, ProvisionError> {
    TARGETS
        .iter()
        .find(|(o, a, _, _)| *o == os && *a == arch)
        .map(|&(_, _, archive, (entry, file_name))| Target {
            archive,
            entry,
            file_name,
        })
        .ok_or_else(|| ProvisionError::UnsupportedPlatform {
            os: os.to_string(),
            arch: arch.to_string(),
        })
}

fn host_target() -> Result<Target, ProvisionError> {
    target_for(std::env::consts::OS, std::env::consts::ARCH)
}

// ── Resolution ───────────────────────────────────────────────────────────────

/// Where the bound library came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibrarySource {
    /// An explicitly configured path.
    Override(PathBuf),
    /// Found in the cache directory.
    Cached(PathBuf),
    /// Downloaded into the cache directory by this call.
    Downloaded(PathBuf),
}

impl LibrarySource {
    pub fn path(&self) -> &Path {
        match self {
            LibrarySource::Override(p) | LibrarySource::Cached(p) | LibrarySource::Downloaded(p) => p,
        }
    }
}

/// Resolves the PDFium library for this process.
#[derive(Debug, Clone)]
pub struct Provisioner {
    release: String,
    cache_root: PathBuf,
    library_override: Option<PathBuf>,
}

impl Provisioner {
    /// A provisioner caching under `cache_root`, with no explicit library.
    pub fn new(cache_root: impl Into<PathBuf>) -> Self {
        Self {
            release: PDFIUM_RELEASE.to_string(),
            cache_root: cache_root.into(),
            library_override: None,
        }
    }

    /// Reads `PDFIUM_LIB_PATH` and `FIRSTLAST_PDFIUM_CACHE`, falling back to
    /// the platform cache directory.
    pub fn from_env() -> Self {
        let cache_root = std::env::var_os(CACHE_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(default_cache_root);
        let mut provisioner = Self::new(cache_root);
        if let Some(path) = std::env::var_os(LIB_PATH_ENV).filter(|p| !p.is_empty()) {
            provisioner.library_override = Some(PathBuf::from(path));
        }
        provisioner
    }

    pub fn with_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.library_override = Some(path.into());
        self
    }

    pub fn with_release(mut self, release: impl Into<String>) -> Self {
        self.release = release.into();
        self
    }

    /// Directory holding the library for the configured release.
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_root.join(format!("pdfium-{}", self.release))
    }

    /// The library that would be bound without touching the network, if any.
    pub fn cached_library(&self) -> Option<LibrarySource> {
        if let Some(path) = self.library_override.as_ref().filter(|p| p.exists()) {
            return Some(LibrarySource::Override(path.clone()));
        }
        let target = host_target().ok()?;
        let path = self.cache_dir().join(target.file_name);
        path.exists().then_some(LibrarySource::Cached(path))
    }

    /// Returns a usable library path, downloading the archive if nothing is
    /// cached yet.
    pub fn ensure(
        &self,
        on_progress: Option<DownloadProgress<'_>>,
    ) -> Result<LibrarySource, ProvisionError> {
        if let Some(source) = self.cached_library() {
            debug!("PDFium library resolved: {:?}", source);
            return Ok(source);
        }
        if let Some(path) = &self.library_override {
            warn!(
                "{} points at '{}' which does not exist; falling back to download",
                LIB_PATH_ENV,
                path.display()
            );
        }

        let _guard = DOWNLOAD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        // Another caller may have finished the download while we waited.
        if let Some(source) = self.cached_library() {
            return Ok(source);
        }

        let target = host_target()?;
        let dir = self.cache_dir();
        std::fs::create_dir_all(&dir).map_err(|source| ProvisionError::CacheDir {
            path: dir.clone(),
            source,
        })?;

        let url = format!(
            "{}/chromium%2F{}/{}",
            RELEASES_URL, self.release, target.archive
        );
        info!("Downloading PDFium {} from {}", self.release, url);
        let archive = download(&url, on_progress)?;

        let dest = dir.join(target.file_name);
        unpack_entry(&archive, target.entry, &dest)?;
        info!("PDFium installed at {}", dest.display());

        Ok(LibrarySource::Downloaded(dest))
    }

    /// [`ensure`](Self::ensure) followed by [`bind_library`].
    pub fn bind(&self, on_progress: Option<DownloadProgress<'_>>) -> Result<Pdfium, ProvisionError> {
        let source = self.ensure(on_progress)?;
        bind_library(source.path())
    }
}

/// Binds `pdfium-render` to the library at `path`.
pub fn bind_library(path: &Path) -> Result<Pdfium, ProvisionError> {
    Pdfium::bind_to_library(path)
        .map(Pdfium::new)
        .map_err(|e| ProvisionError::Bind {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

fn default_cache_root() -> PathBuf {
    dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
        .unwrap_or_else(std::env::temp_dir)
        .join("firstlast")
}

// ── Download & unpack ────────────────────────────────────────────────────────

fn download(url: &str, on_progress: Option<DownloadProgress<'_>>) -> Result<Vec<u8>, ProvisionError> {
    let fail = |reason: String| ProvisionError::Download {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("pdfium-provision/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| fail(e.to_string()))?;

    let mut response = client.get(url).send().map_err(|e| fail(e.to_string()))?;
    if !response.status().is_success() {
        return Err(fail(format!("HTTP {}", response.status())));
    }

    let total = response.content_length();
    let mut body = Vec::with_capacity(total.unwrap_or(0) as usize);
    let mut chunk = vec![0u8; 64 * 1024];
    let mut received: u64 = 0;

    loop {
        match response.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                body.extend_from_slice(&chunk[..n]);
                received += n as u64;
                if let Some(report) = on_progress {
                    report(received, total);
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(fail(format!("read error: {e}"))),
        }
    }

    debug!("Downloaded {} bytes", received);
    Ok(body)
}

/// Writes the archive member named `entry` to `dest`.
fn unpack_entry(archive: &[u8], entry: &str, dest: &Path) -> Result<(), ProvisionError> {
    let mut tar = tar::Archive::new(flate2::read::GzDecoder::new(archive));
    let entries = tar
        .entries()
        .map_err(|e| ProvisionError::Extract(e.to_string()))?;

    for item in entries {
        let mut item = item.map_err(|e| ProvisionError::Extract(e.to_string()))?;
        let matches = item
            .path()
            .map(|p| p.to_string_lossy() == entry)
            .map_err(|e| ProvisionError::Extract(e.to_string()))?;
        if matches {
            item.unpack(dest)
                .map_err(|e| ProvisionError::Extract(format!("unpack to {}: {e}", dest.display())))?;
            return Ok(());
        }
    }

    Err(ProvisionError::MissingFromArchive {
        entry: entry.to_string(),
    })
}
