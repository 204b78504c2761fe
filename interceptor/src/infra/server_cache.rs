//! Frida server binary cache, download, and verification.
//!
//! Binaries live in the cache directory as
//! `frida-server-{version}-{platform}-{arch}`, each with a JSON sidecar
//! recording where it came from and its SHA-256. A binary with a sidecar is
//! verified before every use; one without (placed there by hand) is trusted.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::application::ports::{ByteStream, ServerBinaryProvider};
use crate::domain::InterceptorError;
use crate::domain::config::{ServerCacheConfig, expand_download_url};

/// Metadata for a cached server binary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerMetadata {
    pub version: String,
    pub platform: String,
    pub arch: String,
    pub sha256: String,
    pub downloaded_at: DateTime<Utc>,
    pub source: String,
}

/// Returns the default server cache directory.
///
/// # Errors
///
/// Returns an error if no cache or home directory can be determined.
pub fn default_cache_dir() -> Result<PathBuf> {
    let base = dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".cache")))
        .ok_or_else(|| anyhow::anyhow!("cannot determine cache directory"))?;
    Ok(base.join("frida-interceptor").join("servers"))
}

/// [`ServerBinaryProvider`] backed by a local cache directory, optionally
/// filled from a download URL template.
#[derive(Debug, Clone)]
pub struct CachedServerProvider {
    dir: PathBuf,
    download_url: Option<String>,
}

impl CachedServerProvider {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, download_url: Option<String>) -> Self {
        Self {
            dir: dir.into(),
            download_url,
        }
    }

    /// Build from configuration, using [`default_cache_dir`] when no
    /// directory is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the default cache directory cannot be determined.
    pub fn from_config(config: &ServerCacheConfig) -> Result<Self> {
        let dir = match &config.dir {
            Some(dir) => dir.clone(),
            None => default_cache_dir()?,
        };
        Ok(Self::new(dir, config.download_url.clone()))
    }

    /// Where the binary for this combination is cached.
    #[must_use]
    pub fn binary_path(&self, version: &str, platform: &str, arch: &str) -> PathBuf {
        self.dir
            .join(format!("frida-server-{version}-{platform}-{arch}"))
    }

    /// Make sure a verified binary is cached and return its path.
    ///
    /// Blocking: performs filesystem and network I/O.
    ///
    /// # Errors
    ///
    /// Returns [`InterceptorError::MissingServerBinary`] when the binary is
    /// absent and nothing can be downloaded, or an error if the download or
    /// verification fails. A binary failing verification is removed.
    pub fn ensure_cached(&self, version: &str, platform: &str, arch: &str) -> Result<PathBuf> {
        let path = self.binary_path(version, platform, arch);
        let sidecar = sidecar_path(&path);

        if path.exists() {
            if let Some(meta) = load_metadata(&sidecar)? {
                verify_cached(&path, &sidecar, &meta)?;
            } else {
                debug!(path = %path.display(), "using unverified cached server binary");
            }
            return Ok(path);
        }

        let Some(template) = &self.download_url else {
            return Err(InterceptorError::MissingServerBinary {
                path: path.display().to_string(),
            }
            .into());
        };

        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating {}", self.dir.display()))?;
        let url = expand_download_url(template, version, platform, arch);
        info!(%url, "downloading Frida server");
        let downloaded = download(&url, &self.dir)?;

        let meta = ServerMetadata {
            version: version.to_string(),
            platform: platform.to_string(),
            arch: arch.to_string(),
            sha256: sha256_file(downloaded.path())?,
            downloaded_at: Utc::now(),
            source: url,
        };
        write_metadata(&sidecar, &meta)?;
        downloaded
            .persist(&path)
            .context("failed to finalize downloaded server binary")?;
        Ok(path)
    }
}

impl ServerBinaryProvider for CachedServerProvider {
    async fn fetch(&self, version: &str, platform: &str, arch: &str) -> Result<ByteStream> {
        let cache = self.clone();
        let (version, platform, arch) = (version.to_string(), platform.to_string(), arch.to_string());
        let path = tokio::task::spawn_blocking(move || cache.ensure_cached(&version, &platform, &arch))
            .await
            .context("server cache task failed")??;
        let file = tokio::fs::File::open(&path)
            .await
            .with_context(|| format!("opening {}", path.display()))?;
        Ok(Box::new(file))
    }
}

fn sidecar_path(binary: &Path) -> PathBuf {
    let mut name = binary.as_os_str().to_owned();
    name.push(".json");
    PathBuf::from(name)
}

/// Load a binary's sidecar, if it has one.
///
/// # Errors
///
/// Returns an error if the sidecar exists but cannot be read or parsed.
pub fn load_metadata(sidecar: &Path) -> Result<Option<ServerMetadata>> {
    if !sidecar.exists() {
        return Ok(None);
    }
    let content =
        std::fs::read_to_string(sidecar).with_context(|| format!("reading {}", sidecar.display()))?;
    let meta =
        serde_json::from_str(&content).with_context(|| format!("parsing {}", sidecar.display()))?;
    Ok(Some(meta))
}

fn write_metadata(sidecar: &Path, meta: &ServerMetadata) -> Result<()> {
    let content = serde_json::to_string_pretty(meta).context("serializing server metadata")?;
    let dir = sidecar.parent().unwrap_or_else(|| Path::new("."));
    let mut file =
        NamedTempFile::new_in(dir).with_context(|| format!("creating file in {}", dir.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("writing {}", sidecar.display()))?;
    file.persist(sidecar)
        .with_context(|| format!("writing {}", sidecar.display()))?;
    Ok(())
}

fn verify_cached(path: &Path, sidecar: &Path, meta: &ServerMetadata) -> Result<()> {
    let actual = sha256_file(path)?;
    if actual == meta.sha256 {
        return Ok(());
    }
    warn!(path = %path.display(), "cached Frida server failed integrity check, removing");
    std::fs::remove_file(path).ok();
    std::fs::remove_file(sidecar).ok();
    anyhow::bail!(
        "Cached Frida server {} failed integrity check (expected {}, got {actual}). It has been removed; retry to download it again.",
        path.display(),
        meta.sha256
    )
}

// ── Download ─────────────────────────────────────────────────────────────────

/// Download `url` into a fresh temporary file in `dir`. Concurrent
/// downloads never share a file; the caller persists the result.
fn download(url: &str, dir: &Path) -> Result<NamedTempFile> {
    let response = match ureq::get(url).set("User-Agent", "frida-interceptor").call() {
        Ok(r) => r,
        Err(ureq::Error::Status(code, _)) => anyhow::bail!("Download of {url} failed: HTTP {code}"),
        Err(e) => return Err(anyhow::Error::new(e).context(format!("Download of {url} failed"))),
    };

    let mut file =
        NamedTempFile::new_in(dir).with_context(|| format!("creating file in {}", dir.display()))?;
    let mut reader = response.into_reader();
    std::io::copy(&mut reader, &mut file).context("Download interrupted")?;
    file.flush().context("Download interrupted")?;
    Ok(file)
}

// ── Hashing ──────────────────────────────────────────────────────────────────

fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 65536];
    loop {
        let n = file.read(&mut buf).context("reading server binary")?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex_encode(&hasher.finalize()))
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut s, b| {
        let _ = write!(s, "{b:02x}");
        s
    })
}
