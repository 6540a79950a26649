use std::path::{Path, PathBuf};
use std::time::Duration;

use percent_encoding::percent_decode_str;
use reqwest::Url;
use reqwest::blocking::Client;
use thiserror::Error;

use crate::layout::{Layout, sanitize_asset_name, write_atomic};

pub const IMAGES_DIR: &str = "images";
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Download failed: {0}")]
    Download(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for AssetError {
    fn from(err: reqwest::Error) -> Self {
        AssetError::Download(err.to_string())
    }
}

/// Fetches the bytes behind a URL.
pub trait Download {
    fn download(&self, url: &str) -> Result<Vec<u8>, AssetError>;
}

pub struct HttpDownloader {
    http: Client,
}

impl HttpDownloader {
    pub fn new() -> Result<Self, AssetError> {
        let http = Client::builder().timeout(DOWNLOAD_TIMEOUT).build()?;
        Ok(Self { http })
    }
}

impl Download for HttpDownloader {
    fn download(&self, url: &str) -> Result<Vec<u8>, AssetError> {
        let response = self.http.get(url).send()?.error_for_status()?;
        Ok(response.bytes()?.to_vec())
    }
}

/// Local file name for an asset URL.
///
/// Notion file URLs end in `/<file id>/<file name>`, which together identify
/// the upload. Empty path segments are skipped, so a URL with a single
/// segment such as `https://host/file.png` has no file id and is named after
/// a hash of the whole URL instead.
pub fn asset_name(url: &str) -> String {
    let segments: Vec<String> = Url::parse(url)
        .map(|parsed| {
            parsed
                .path()
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let (identifier, original) = match segments.as_slice() {
        [.., id, name] => {
            let decoded = percent_decode_str(name).decode_utf8_lossy().into_owned();
            (id.clone(), decoded)
        }
        _ => {
            let digest = format!("{:x}", md5::compute(url.as_bytes()));
            (digest[..12].to_string(), "image.png".to_string())
        }
    };

    format!("{}_{}", identifier, sanitize_asset_name(&original))
}

/// Stores downloaded assets under `<export root>/images/`, once per name.
pub struct AssetFetcher {
    root: PathBuf,
    downloader: Box<dyn Download>,
}

impl AssetFetcher {
    pub fn new<P: AsRef<Path>>(root: P, downloader: Box<dyn Download>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            downloader,
        }
    }

    pub fn images_dir(&self) -> PathBuf {
        self.root.join(IMAGES_DIR)
    }

    /// Path of the local copy relative to `layout`, or the original URL if
    /// the asset could not be stored.
    pub fn fetch(&self, url: &str, layout: &Layout) -> String {
        self.try_fetch(url, layout).unwrap_or_else(|e| {
            log::warn!("{}  ⚠️ Image download error: {}", layout.indent(), e);
            url.to_string()
        })
    }

    pub fn try_fetch(&self, url: &str, layout: &Layout) -> Result<String, AssetError> {
        let name = asset_name(url);
        let path = self.images_dir().join(&name);
        let link = format!("{}{}/{}", layout.to_root(), IMAGES_DIR, name);

        if path.exists() {
            log::info!("{}  ⏭️ Skipping existing image: {}", layout.indent(), name);
            return Ok(link);
        }

        log::info!("{}  📥 Downloading image: {}", layout.indent(), name);
        let bytes = self.downloader.download(url)?;
        write_atomic(&path, &bytes)?;

        Ok(link)
    }
}
