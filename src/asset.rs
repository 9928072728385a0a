//! Destination paths, the atomic write and import settings for baked strips.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::BakeError;

/// Every baked asset lives under this folder of the project root.
pub const ASSET_PREFIX: &str = "Assets/";

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("save path is empty")]
    Empty,
    #[error("path must start with 'Assets/': {0}")]
    OutsideAssetRoot(String),
    #[error("path may not contain '.', '..' or empty segments: {0}")]
    Traversal(String),
    #[error("path names a folder, not a file: {0}")]
    MissingFileName(String),
    #[error("only .png files can be baked: {0}")]
    NotPng(String),
    #[error("{file} is not inside the project at {root}")]
    OutsideProject { file: PathBuf, root: PathBuf },
}

/// Validated project-relative path such as `Assets/Textures/Ramp.png`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetPath(String);

impl AssetPath {
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        if raw.trim().is_empty() {
            return Err(PathError::Empty);
        }
        let path = raw.replace('\\', "/");
        if !path.starts_with(ASSET_PREFIX) {
            return Err(PathError::OutsideAssetRoot(path));
        }
        if path.ends_with('/') {
            return Err(PathError::MissingFileName(path));
        }
        if path
            .split('/')
            .any(|seg| seg.is_empty() || seg == "." || seg == "..")
        {
            return Err(PathError::Traversal(path));
        }
        let is_png = Path::new(&path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| ext.eq_ignore_ascii_case("png"));
        if !is_png {
            return Err(PathError::NotPng(path));
        }
        Ok(Self(path))
    }

    /// Turn a file picked somewhere inside `project_root` into an asset path.
    pub fn from_project_file(project_root: &Path, file: &Path) -> Result<Self, PathError> {
        let rel = file
            .strip_prefix(project_root)
            .map_err(|_| PathError::OutsideProject {
                file: file.to_path_buf(),
                root: project_root.to_path_buf(),
            })?;
        let mut parts = Vec::new();
        for comp in rel.components() {
            match comp {
                Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
                _ => return Err(PathError::Traversal(rel.display().to_string())),
            }
        }
        Self::parse(&parts.join("/"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Location on disk for a project rooted at `project_root`.
    pub fn resolve(&self, project_root: &Path) -> PathBuf {
        self.0
            .split('/')
            .fold(project_root.to_path_buf(), |acc, seg| acc.join(seg))
    }
}

impl fmt::Display for AssetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ------------------------- Atomic write -------------------------

/// Write `bytes` to `dest` through a temp file in the same folder.
///
/// Missing parent folders are created. On any failure the temp file is
/// removed and `dest` keeps its previous contents.
pub fn write_atomic(dest: &Path, bytes: &[u8]) -> Result<(), BakeError> {
    let dir = match dest.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;
    let mut tmp = tempfile::Builder::new()
        .prefix(".bake-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(dest)?;
    debug!(path = %dest.display(), bytes = bytes.len(), "wrote file");
    Ok(())
}

// ------------------------- Import settings -------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WrapMode {
    Clamp,
    Repeat,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    Point,
    Bilinear,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Compression {
    Uncompressed,
    Compressed,
}

/// How the host pipeline should import a baked strip.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportSettings {
    pub mipmaps: bool,
    pub wrap: WrapMode,
    pub filter: FilterMode,
    pub srgb: bool,
    pub compression: Compression,
}

impl ImportSettings {
    /// Lookup-texture settings: exact texels, no gamma, no mips.
    pub const LOOKUP: ImportSettings = ImportSettings {
        mipmaps: false,
        wrap: WrapMode::Clamp,
        filter: FilterMode::Point,
        srgb: false,
        compression: Compression::Uncompressed,
    };

    pub fn summary(&self) -> String {
        format!(
            "{} • {:?}/{:?} • {}",
            if self.srgb { "sRGB" } else { "Linear (sRGB off)" },
            self.filter,
            self.wrap,
            if self.mipmaps { "Mipmaps" } else { "No mipmaps" },
        )
    }
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self::LOOKUP
    }
}

/// Applies import settings to a freshly written asset.
pub trait AssetImporter {
    fn apply(&mut self, file: &Path, settings: &ImportSettings) -> Result<(), BakeError>;
}

/// Stores import settings as `<file>.import.toml` beside the asset.
#[derive(Debug, Default, Clone, Copy)]
pub struct SidecarImporter;

impl SidecarImporter {
    pub fn sidecar_path(file: &Path) -> PathBuf {
        let mut name = file.as_os_str().to_os_string();
        name.push(".import.toml");
        PathBuf::from(name)
    }

    pub fn read(file: &Path) -> Result<ImportSettings, BakeError> {
        let data = fs::read_to_string(Self::sidecar_path(file))?;
        Ok(toml::from_str(&data)?)
    }

    /// Like [`SidecarImporter::read`], but a missing sidecar is `Ok(None)`.
    /// A sidecar that exists and cannot be read or parsed is still an error.
    pub fn read_if_present(file: &Path) -> Result<Option<ImportSettings>, BakeError> {
        match Self::read(file) {
            Ok(settings) => Ok(Some(settings)),
            Err(BakeError::Io(err)) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }
}

impl AssetImporter for SidecarImporter {
    fn apply(&mut self, file: &Path, settings: &ImportSettings) -> Result<(), BakeError> {
        let data = toml::to_string_pretty(settings)?;
        write_atomic(&Self::sidecar_path(file), data.as_bytes())
    }
}
