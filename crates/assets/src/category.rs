//! Fixed asset-category set and per-category constraints.

use serde::{Deserialize, Serialize};

use planvault_core::ValidationError;

/// Total ceiling across one upload batch, all categories combined (256 MiB).
pub const TOTAL_PAYLOAD_CEILING_BYTES: u64 = 256 * 1024 * 1024;

/// The enumerated category set for purchase assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetCategory {
    Cad,
    Pdf,
    Render,
    Blueprint,
    Document,
}

impl AssetCategory {
    pub const ALL: [AssetCategory; 5] = [
        AssetCategory::Cad,
        AssetCategory::Pdf,
        AssetCategory::Render,
        AssetCategory::Blueprint,
        AssetCategory::Document,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AssetCategory::Cad => "cad",
            AssetCategory::Pdf => "pdf",
            AssetCategory::Render => "render",
            AssetCategory::Blueprint => "blueprint",
            AssetCategory::Document => "document",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s.to_ascii_lowercase().as_str() {
            "cad" => Ok(AssetCategory::Cad),
            "pdf" => Ok(AssetCategory::Pdf),
            "render" => Ok(AssetCategory::Render),
            "blueprint" => Ok(AssetCategory::Blueprint),
            "document" => Ok(AssetCategory::Document),
            other => Err(ValidationError::UnknownCategory(other.to_string())),
        }
    }

    /// Constraints enforced before any upload begins.
    pub fn rules(self) -> CategoryRules {
        match self {
            AssetCategory::Cad => CategoryRules {
                max_files: 10,
                allowed_mimes: &[
                    "application/acad",
                    "application/dxf",
                    "application/octet-stream",
                    "image/vnd.dwg",
                ],
            },
            AssetCategory::Pdf => CategoryRules {
                max_files: 10,
                allowed_mimes: &["application/pdf"],
            },
            AssetCategory::Render => CategoryRules {
                max_files: 20,
                allowed_mimes: &["image/png", "image/jpeg", "image/webp"],
            },
            AssetCategory::Blueprint => CategoryRules {
                max_files: 10,
                allowed_mimes: &["application/pdf", "image/png", "image/tiff"],
            },
            AssetCategory::Document => CategoryRules {
                max_files: 20,
                allowed_mimes: &[
                    "application/pdf",
                    "application/msword",
                    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                    "text/plain",
                ],
            },
        }
    }
}

impl core::fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-category upload constraints.
#[derive(Debug, Clone, Copy)]
pub struct CategoryRules {
    pub max_files: usize,
    pub allowed_mimes: &'static [&'static str],
}

impl CategoryRules {
    pub fn allows_mime(&self, mime: &str) -> bool {
        self.allowed_mimes.iter().any(|m| m.eq_ignore_ascii_case(mime))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(AssetCategory::parse("CAD").unwrap(), AssetCategory::Cad);
        assert_eq!(
            AssetCategory::parse("blueprint").unwrap(),
            AssetCategory::Blueprint
        );
    }

    #[test]
    fn unknown_category_is_rejected() {
        let err = AssetCategory::parse("video").unwrap_err();
        assert!(matches!(err, ValidationError::UnknownCategory(c) if c == "video"));
    }

    #[test]
    fn cad_rejects_plain_text() {
        let rules = AssetCategory::Cad.rules();
        assert!(!rules.allows_mime("text/plain"));
        assert!(rules.allows_mime("application/dxf"));
    }

    #[test]
    fn every_category_has_rules() {
        for c in AssetCategory::ALL {
            let rules = c.rules();
            assert!(rules.max_files > 0);
            assert!(!rules.allowed_mimes.is_empty());
        }
    }
}
