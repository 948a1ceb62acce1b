//! Image format matching.
//!
//! Decide se un file è un'immagine candidata in base al nome e al filtro
//! configurato. Le immagini nine-patch (`*.9.png`) non sono mai trattate come
//! PNG ordinari.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Nine-patch marker embedded in stretchable PNG names
const NINE_PATCH_MARKER: &str = ".9.";

/// Which image formats are eligible for optimization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatFilter {
    #[default]
    All,
    Jpeg,
    Png,
    Webp,
}

/// Format requested from the remote conversion operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetFormat {
    Webp,
}

impl TargetFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            TargetFormat::Webp => "image/webp",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            TargetFormat::Webp => "webp",
        }
    }
}

impl FormatFilter {
    /// Check if a file name is accepted by this filter (case-insensitive)
    pub fn matches(&self, file_name: &str) -> bool {
        let name = file_name.to_lowercase();
        let is_webp = name.ends_with(".webp");
        let is_png = name.ends_with(".png") && !name.contains(NINE_PATCH_MARKER);
        let is_jpeg = name.ends_with(".jpg") || name.ends_with(".jpeg");

        match self {
            FormatFilter::All => is_webp || is_png || is_jpeg,
            FormatFilter::Jpeg => is_jpeg,
            FormatFilter::Png => is_png,
            FormatFilter::Webp => is_webp,
        }
    }

    /// Same as [`FormatFilter::matches`] for a path; paths without a UTF-8 name never match
    pub fn matches_path(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .map(|name| self.matches(name))
            .unwrap_or(false)
    }
}

/// Check if a file name already carries the given target format
pub fn has_target_format(file_name: &str, target: TargetFormat) -> bool {
    file_name
        .to_lowercase()
        .ends_with(&format!(".{}", target.extension()))
}

impl fmt::Display for FormatFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FormatFilter::All => "all",
            FormatFilter::Jpeg => "jpeg",
            FormatFilter::Png => "png",
            FormatFilter::Webp => "webp",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for FormatFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(FormatFilter::All),
            "jpeg" | "jpg" => Ok(FormatFilter::Jpeg),
            "png" => Ok(FormatFilter::Png),
            "webp" => Ok(FormatFilter::Webp),
            other => Err(format!(
                "unsupported format filter '{}', expected one of: all, jpeg, png, webp",
                other
            )),
        }
    }
}
