use image::ImageError;

use crate::asset::PathError;

#[derive(thiserror::Error, Debug)]
pub enum BakeError {
    #[error("Invalid path: {0}")]
    Path(#[from] PathError),
    #[error("PNG: {0}")]
    Encode(ImageError),
    #[error("expected a {expected_width}x{expected_height} strip, got {width}x{height}")]
    Dimensions {
        width: u32,
        height: u32,
        expected_width: u32,
        expected_height: u32,
    },
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not move baked file into place: {0}")]
    Persist(#[from] tempfile::PersistError),
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("TOML: {0}")]
    TomlDe(#[from] toml::de::Error),
    #[error("TOML: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Import: {0}")]
    Import(String),
}

impl From<ImageError> for BakeError {
    fn from(err: ImageError) -> Self {
        BakeError::Encode(err)
    }
}
