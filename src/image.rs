//! Image references and the resolver seam used to load their bytes.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

static IMAGE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^!\[([^\]]*)\]\(\s*([^)\s]+)\s*\)$").unwrap());

/// Default box, in pixels, for images without usable size information.
pub const DEFAULT_SIZE: u32 = 200;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Unsupported image source: {0}")]
    Unsupported(String),

    #[error("Failed to read image at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Unrecognised image format: {0}")]
    UnknownFormat(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
}

impl ImageFormat {
    /// Detect the format from the file signature.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(Self::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(Self::Gif)
        } else {
            None
        }
    }

    /// Pixel dimensions read from the header, where the format allows it cheaply.
    pub fn intrinsic_size(self, bytes: &[u8]) -> Option<(u32, u32)> {
        match self {
            Self::Png => {
                let width = bytes.get(16..20)?;
                let height = bytes.get(20..24)?;
                Some((
                    u32::from_be_bytes(width.try_into().ok()?),
                    u32::from_be_bytes(height.try_into().ok()?),
                ))
            }
            Self::Gif => {
                let width = bytes.get(6..8)?;
                let height = bytes.get(8..10)?;
                Some((
                    u32::from(u16::from_le_bytes(width.try_into().ok()?)),
                    u32::from(u16::from_le_bytes(height.try_into().ok()?)),
                ))
            }
            Self::Jpeg => None,
        }
    }
}

/// An `![alt](src)` line, with size hints taken from the URL fragment.
///
/// Both `#180x16` and `#w=150&h=100` fragment forms are understood.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub alt: String,
    pub src: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

pub fn parse_image_line(line: &str) -> Option<ImageRef> {
    let captures = IMAGE_LINE.captures(line.trim())?;
    let alt = captures.get(1)?.as_str().to_string();
    let target = captures.get(2)?.as_str();

    let (src, fragment) = match target.split_once('#') {
        Some((src, fragment)) => (src, Some(fragment)),
        None => (target, None),
    };
    let (width, height) = fragment.map(parse_size_hint).unwrap_or((None, None));

    Some(ImageRef {
        alt,
        src: src.to_string(),
        width,
        height,
    })
}

fn parse_size_hint(fragment: &str) -> (Option<u32>, Option<u32>) {
    if let Some((w, h)) = fragment.split_once('x') {
        if let (Ok(w), Ok(h)) = (w.parse(), h.parse()) {
            return (Some(w), Some(h));
        }
    }

    let mut width = None;
    let mut height = None;
    for pair in fragment.split('&') {
        match pair.split_once('=') {
            Some(("w", value)) => width = value.parse().ok(),
            Some(("h", value)) => height = value.parse().ok(),
            _ => {}
        }
    }
    (width, height)
}

/// Final pixel size from the hints and the image's own dimensions.
///
/// A single hint keeps the intrinsic aspect ratio. With no hints the image
/// is fitted into the default box.
pub fn resolve_size(
    width: Option<u32>,
    height: Option<u32>,
    intrinsic: Option<(u32, u32)>,
) -> (u32, u32) {
    let intrinsic = intrinsic.filter(|&(w, h)| w > 0 && h > 0);
    let scale = |value: u32, num: u32, den: u32| {
        let scaled = (u64::from(value) * u64::from(num) / u64::from(den)).max(1);
        u32::try_from(scaled).unwrap_or(u32::MAX)
    };

    match (width, height, intrinsic) {
        (Some(w), Some(h), _) => (w, h),
        (Some(w), None, Some((iw, ih))) => (w, scale(w, ih, iw)),
        (Some(w), None, None) => (w, w),
        (None, Some(h), Some((iw, ih))) => (scale(h, iw, ih), h),
        (None, Some(h), None) => (h, h),
        (None, None, Some((iw, ih))) if iw <= DEFAULT_SIZE && ih <= DEFAULT_SIZE => (iw, ih),
        (None, None, Some((iw, ih))) if iw >= ih => {
            (DEFAULT_SIZE, scale(DEFAULT_SIZE, ih, iw))
        }
        (None, None, Some((iw, ih))) => (scale(DEFAULT_SIZE, iw, ih), DEFAULT_SIZE),
        (None, None, None) => (DEFAULT_SIZE, DEFAULT_SIZE),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
}

/// Loads image bytes for a source reference.
pub trait ImageResolver {
    fn resolve(&self, src: &str) -> Result<ImageData, ImageError>;
}

/// Resolves relative paths and `file:` URLs against a base directory.
/// Remote and `data:` sources are reported as unsupported.
#[derive(Debug, Clone)]
pub struct FsImageResolver {
    base_dir: PathBuf,
}

impl FsImageResolver {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn path_for(&self, src: &str) -> Result<PathBuf, ImageError> {
        match Url::parse(src) {
            Ok(url) if url.scheme() == "file" => url
                .to_file_path()
                .map_err(|_| ImageError::Unsupported(src.to_string())),
            Ok(_) => Err(ImageError::Unsupported(src.to_string())),
            Err(_) => Ok(self.base_dir.join(src)),
        }
    }
}

impl Default for FsImageResolver {
    fn default() -> Self {
        Self::new(".")
    }
}

impl ImageResolver for FsImageResolver {
    fn resolve(&self, src: &str) -> Result<ImageData, ImageError> {
        let path = self.path_for(src)?;
        let bytes = fs::read(&path).map_err(|source| ImageError::Read {
            path: path.clone(),
            source,
        })?;
        let format =
            ImageFormat::sniff(&bytes).ok_or_else(|| ImageError::UnknownFormat(src.to_string()))?;
        Ok(ImageData { bytes, format })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    /// PNG signature plus an IHDR chunk header for the given size.
    fn png_header(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
        bytes.extend_from_slice(&13u32.to_be_bytes());
        bytes.extend_from_slice(b"IHDR");
        bytes.extend_from_slice(&width.to_be_bytes());
        bytes.extend_from_slice(&height.to_be_bytes());
        bytes
    }

    #[rstest]
    #[case("![Square](https://picsum.photos/200/200)", None, None)]
    #[case("![Logo](https://example.com/logo.png#180x16)", Some(180), Some(16))]
    #[case("![Params](https://picsum.photos/600/400#w=150&h=100)", Some(150), Some(100))]
    #[case("![Wide](banner.png#w=400)", Some(400), None)]
    fn parses_size_hints(
        #[case] line: &str,
        #[case] width: Option<u32>,
        #[case] height: Option<u32>,
    ) {
        let image = parse_image_line(line).unwrap();
        assert_eq!((image.width, image.height), (width, height));
        assert!(!image.src.contains('#'));
    }

    #[test]
    fn parses_alt_and_src() {
        let image = parse_image_line("  ![Test Image](images/a.png)  ").unwrap();
        assert_eq!(image.alt, "Test Image");
        assert_eq!(image.src, "images/a.png");
    }

    #[rstest]
    #[case("Text with ![inline](a.png) image")]
    #[case("![broken](a.png")]
    #[case("[link](a.png)")]
    fn only_whole_image_lines(#[case] line: &str) {
        assert_eq!(parse_image_line(line), None);
    }

    #[rstest]
    #[case(Some(120), Some(60), None, (120, 60))]
    #[case(Some(400), None, Some((800, 160)), (400, 80))]
    #[case(None, Some(50), Some((100, 200)), (25, 50))]
    #[case(Some(90), None, None, (90, 90))]
    #[case(None, None, Some((70, 70)), (70, 70))]
    #[case(None, None, Some((800, 400)), (200, 100))]
    #[case(None, None, Some((100, 400)), (50, 200))]
    #[case(None, None, None, (200, 200))]
    #[case(None, None, Some((0, 10)), (200, 200))]
    #[case(Some(4_000_000_000), None, Some((1, 10)), (4_000_000_000, u32::MAX))]
    #[case(None, Some(u32::MAX), Some((u32::MAX, 1)), (u32::MAX, u32::MAX))]
    fn sizes(
        #[case] width: Option<u32>,
        #[case] height: Option<u32>,
        #[case] intrinsic: Option<(u32, u32)>,
        #[case] expected: (u32, u32),
    ) {
        assert_eq!(resolve_size(width, height, intrinsic), expected);
    }

    #[test]
    fn sniffs_formats_and_png_size() {
        let png = png_header(640, 480);
        assert_eq!(ImageFormat::sniff(&png), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::Png.intrinsic_size(&png), Some((640, 480)));

        let gif = b"GIF89a\x20\x00\x10\x00".to_vec();
        assert_eq!(ImageFormat::sniff(&gif), Some(ImageFormat::Gif));
        assert_eq!(ImageFormat::Gif.intrinsic_size(&gif), Some((32, 16)));

        assert_eq!(ImageFormat::sniff(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::sniff(b"plain text"), None);
    }

    #[test]
    fn resolves_relative_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pic.png"), png_header(2, 3)).unwrap();

        let resolver = FsImageResolver::new(dir.path());
        let data = resolver.resolve("pic.png").unwrap();
        assert_eq!(data.format, ImageFormat::Png);
    }

    #[test]
    fn resolves_file_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pic.png");
        std::fs::write(&path, png_header(2, 3)).unwrap();
        let url = Url::from_file_path(&path).unwrap();

        let data = FsImageResolver::default().resolve(url.as_str()).unwrap();
        assert_eq!(data.format, ImageFormat::Png);
    }

    #[rstest]
    #[case("https://picsum.photos/200/200")]
    #[case("data:image/png;base64,iVBORw0KGgo=")]
    fn remote_sources_are_unsupported(#[case] src: &str) {
        let err = FsImageResolver::default().resolve(src).unwrap_err();
        assert!(matches!(err, ImageError::Unsupported(_)));
    }

    #[test]
    fn missing_and_unknown_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        let resolver = FsImageResolver::new(dir.path());

        assert!(matches!(
            resolver.resolve("absent.png").unwrap_err(),
            ImageError::Read { .. }
        ));
        assert!(matches!(
            resolver.resolve("notes.txt").unwrap_err(),
            ImageError::UnknownFormat(_)
        ));
    }
}
