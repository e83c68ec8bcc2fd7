//! Modifier icon loading.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IconError {
    #[error("failed to read icon {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode icon {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Decoded RGBA8 image, rows top to bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    /// Normalized sprite pivot.
    pub pivot: (f32, f32),
}

impl Texture {
    pub fn from_rgba8(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
            pivot: (0.5, 0.5),
        }
    }
}

/// Load `file` from `dir` and decode it into an RGBA8 texture.
pub fn load_icon(dir: &Path, file: &str) -> Result<Texture, IconError> {
    let path = dir.join(file);
    let bytes = std::fs::read(&path).map_err(|source| IconError::Io {
        path: path.clone(),
        source,
    })?;
    let rgba = image::load_from_memory(&bytes)
        .map_err(|source| IconError::Decode { path, source })?
        .to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(Texture::from_rgba8(width, height, rgba.into_raw()))
}

/// Like [`load_icon`], but a failure is logged and yields `None`.
pub fn load_icon_or_warn(dir: &Path, file: &str) -> Option<Texture> {
    match load_icon(dir, file) {
        Ok(texture) => Some(texture),
        Err(e) => {
            tracing::warn!("Icon unavailable, registering without it: {}", e);
            None
        }
    }
}

/// Directory holding the running binary; icons ship next to it.
pub fn plugin_asset_dir() -> std::io::Result<PathBuf> {
    let exe = std::env::current_exe()?;
    Ok(exe
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(".")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) {
        let img = image::RgbaImage::from_fn(width, height, |x, y| {
            image::Rgba([x as u8, y as u8, 200, 255])
        });
        img.save(dir.join(name)).unwrap();
    }

    #[test]
    fn decodes_png_into_rgba() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "icon.png", 4, 3);

        let tex = load_icon(dir.path(), "icon.png").unwrap();
        assert_eq!((tex.width, tex.height), (4, 3));
        assert_eq!(tex.pixels.len(), 4 * 3 * 4);
        assert_eq!(&tex.pixels[..4], &[0, 0, 200, 255]);
        assert_eq!(tex.pivot, (0.5, 0.5));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_icon(dir.path(), "nope.png").unwrap_err();
        assert!(matches!(err, IconError::Io { .. }));
    }

    #[test]
    fn garbage_bytes_are_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.png"), b"definitely not a png").unwrap();
        let err = load_icon(dir.path(), "bad.png").unwrap_err();
        assert!(matches!(err, IconError::Decode { .. }));
        assert!(load_icon_or_warn(dir.path(), "bad.png").is_none());
    }

    #[test]
    fn asset_dir_resolves() {
        assert!(plugin_asset_dir().unwrap().is_dir());
    }
}
