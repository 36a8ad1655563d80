//! Configuration for first/last page extraction.
//!
//! Every knob lives in [`ExtractionConfig`], built through
//! [`ExtractionConfigBuilder`] so callers set only what they need and get
//! validated defaults for the rest.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Largest accepted input file: 20 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 20 * 1024 * 1024;

/// Configuration for [`crate::Extractor`] and [`crate::Session`].
///
/// # Example
/// ```rust
/// use firstlast_pdf::{ExtractionConfig, PageGeometry};
///
/// let config = ExtractionConfig::builder()
///     .render_scale(2.0)
///     .jpeg_quality(0.9)
///     .page_geometry(PageGeometry::Native)
///     .build()
///     .unwrap();
/// assert_eq!(config.render_scale, 2.0);
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Linear scale applied to a page's native size when rasterising. Default: 1.5.
    ///
    /// Width and height are scaled uniformly; 1.0 renders one pixel per PDF
    /// point. Each raster is held in memory until encoded, so large values on
    /// large pages cost tens of megabytes per page.
    pub render_scale: f32,

    /// JPEG quality in `0.05..=1.0`. Default: 0.8.
    pub jpeg_quality: f32,

    /// How each raster is laid out on its output page. Default: [`PageGeometry::Native`].
    pub page_geometry: PageGeometry,

    /// Maximum accepted input size in bytes. Default: 20 MiB.
    pub max_file_size: u64,

    /// User password for encrypted inputs.
    #[serde(skip_serializing)]
    pub password: Option<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            render_scale: 1.5,
            jpeg_quality: 0.8,
            page_geometry: PageGeometry::default(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            password: None,
        }
    }
}

impl std::fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("render_scale", &self.render_scale)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("page_geometry", &self.page_geometry)
            .field("max_file_size", &self.max_file_size)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ExtractionConfig {
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// JPEG quality on the encoder's 1–100 scale.
    pub fn jpeg_quality_percent(&self) -> u8 {
        (self.jpeg_quality * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn render_scale(mut self, scale: f32) -> Self {
        self.config.render_scale = scale;
        self
    }

    pub fn jpeg_quality(mut self, quality: f32) -> Self {
        self.config.jpeg_quality = quality;
        self
    }

    pub fn page_geometry(mut self, geometry: PageGeometry) -> Self {
        self.config.page_geometry = geometry;
        self
    }

    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.config.max_file_size = bytes;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ConfigError> {
        let c = &self.config;
        if !(0.25..=8.0).contains(&c.render_scale) {
            return Err(ConfigError(format!(
                "render scale must be 0.25–8.0, got {}",
                c.render_scale
            )));
        }
        if !(0.05..=1.0).contains(&c.jpeg_quality) {
            return Err(ConfigError(format!(
                "JPEG quality must be 0.05–1.0, got {}",
                c.jpeg_quality
            )));
        }
        if let PageGeometry::LegacyA4 { divisor } = c.page_geometry {
            if !(divisor.is_finite() && divisor > 0.0) {
                return Err(ConfigError(format!(
                    "display divisor must be positive, got {divisor}"
                )));
            }
        }
        if c.max_file_size == 0 {
            return Err(ConfigError("maximum file size must be ≥ 1 byte".into()));
        }
        Ok(self.config)
    }
}

/// Layout of a rendered page inside the output document.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PageGeometry {
    /// Output page takes the source page's native size and the image fills
    /// it, whatever the render scale. (default)
    #[default]
    Native,
    /// A4 portrait page with the image anchored top-left and sized
    /// `pixels / divisor` millimetres. With the default 1.5 render scale and
    /// a divisor of 4, a US Letter page overflows the A4 width and is clipped.
    LegacyA4 { divisor: f32 },
}

impl PageGeometry {
    pub const LEGACY_DIVISOR: f32 = 4.0;

    pub fn legacy() -> Self {
        PageGeometry::LegacyA4 {
            divisor: Self::LEGACY_DIVISOR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = ExtractionConfig::default();
        assert_eq!(c.render_scale, 1.5);
        assert_eq!(c.jpeg_quality, 0.8);
        assert_eq!(c.page_geometry, PageGeometry::Native);
        assert_eq!(c.max_file_size, 20_971_520);
        assert_eq!(c.jpeg_quality_percent(), 80);
    }

    #[test]
    fn builder_rejects_out_of_range_scale() {
        assert!(ExtractionConfig::builder().render_scale(0.0).build().is_err());
        assert!(ExtractionConfig::builder().render_scale(9.0).build().is_err());
        assert!(ExtractionConfig::builder().render_scale(3.0).build().is_ok());
    }

    #[test]
    fn builder_rejects_bad_quality() {
        let err = ExtractionConfig::builder()
            .jpeg_quality(1.5)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("JPEG quality"), "got: {err}");
    }

    #[test]
    fn builder_rejects_non_positive_divisor() {
        let result = ExtractionConfig::builder()
            .page_geometry(PageGeometry::LegacyA4 { divisor: 0.0 })
            .build();
        assert!(result.is_err());
        assert!(ExtractionConfig::builder()
            .page_geometry(PageGeometry::legacy())
            .build()
            .is_ok());
    }

    #[test]
    fn builder_rejects_zero_size_limit() {
        assert!(ExtractionConfig::builder().max_file_size(0).build().is_err());
    }

    #[test]
    fn debug_redacts_password() {
        let c = ExtractionConfig::builder().password("hunter2").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn geometry_serialises_with_mode_tag() {
        let json = serde_json::to_string(&PageGeometry::legacy()).unwrap();
        assert_eq!(json, r#"{"mode":"legacy_a4","divisor":4.0}"#);
    }
}
