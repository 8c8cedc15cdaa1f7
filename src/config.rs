//! Configuration types for vector-file conversion.
//!
//! All pipeline behaviour is controlled through [`ConverterConfig`], built
//! via its [`ConverterConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs across blocking tasks and diff two runs to
//! understand why their outputs differ.

use crate::error::ConvertError;
use crate::progress::ProgressCallback;
use std::fmt;

/// Configuration for a conversion [`crate::session::Session`].
///
/// Built via [`ConverterConfig::builder()`] or using
/// [`ConverterConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_vecconv::ConverterConfig;
///
/// let config = ConverterConfig::builder()
///     .page_limit(3)
///     .jpeg_quality(85)
///     .build()
///     .unwrap();
/// assert_eq!(config.page_limit, 3);
/// ```
#[derive(Clone)]
pub struct ConverterConfig {
    /// Maximum number of PDF pages rendered on ingestion. Range: 1–50. Default: 5.
    pub page_limit: usize,

    /// Magnification applied when rendering PDF pages. Range: 0.25–8.0. Default: 1.5.
    pub render_scale: f32,

    /// Linear upscaling applied when rasterising markup to PNG/JPG. Range: 0.25–8.0. Default: 2.0.
    pub raster_scale: f32,

    /// JPEG quality. Range: 1–100. Default: 90.
    pub jpeg_quality: u8,

    /// Surface size used when markup has no intrinsic size. Default: 800×600.
    pub fallback_size: (u32, u32),

    /// Largest PDF input accepted, in bytes. Default: 64 MiB.
    pub max_input_bytes: u64,

    /// Largest rendered page accepted, in pixels (width × height). Default: 40 MP.
    ///
    /// A poster-sized page at 1.5× can otherwise allocate gigabytes.
    pub max_page_pixels: u64,

    /// Largest surface markup is drawn onto for export, in pixels. Default: 40 MP.
    pub max_raster_pixels: u64,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Optional progress callback for ingestion and export events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            page_limit: 5,
            render_scale: 1.5,
            raster_scale: 2.0,
            jpeg_quality: 90,
            fallback_size: (800, 600),
            max_input_bytes: 64 * 1024 * 1024,
            max_page_pixels: 40_000_000,
            max_raster_pixels: 40_000_000,
            password: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConverterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterConfig")
            .field("page_limit", &self.page_limit)
            .field("render_scale", &self.render_scale)
            .field("raster_scale", &self.raster_scale)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("fallback_size", &self.fallback_size)
            .field("max_input_bytes", &self.max_input_bytes)
            .field("max_page_pixels", &self.max_page_pixels)
            .field("max_raster_pixels", &self.max_raster_pixels)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConverterConfig {
    /// Create a new builder for `ConverterConfig`.
    pub fn builder() -> ConverterConfigBuilder {
        ConverterConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConverterConfig`].
#[derive(Debug)]
pub struct ConverterConfigBuilder {
    config: ConverterConfig,
}

impl ConverterConfigBuilder {
    pub fn page_limit(mut self, n: usize) -> Self {
        self.config.page_limit = n.clamp(1, 50);
        self
    }

    pub fn render_scale(mut self, scale: f32) -> Self {
        self.config.render_scale = scale;
        self
    }

    pub fn raster_scale(mut self, scale: f32) -> Self {
        self.config.raster_scale = scale;
        self
    }

    pub fn jpeg_quality(mut self, q: u8) -> Self {
        self.config.jpeg_quality = q.clamp(1, 100);
        self
    }

    pub fn fallback_size(mut self, width: u32, height: u32) -> Self {
        self.config.fallback_size = (width, height);
        self
    }

    pub fn max_input_bytes(mut self, bytes: u64) -> Self {
        self.config.max_input_bytes = bytes;
        self
    }

    pub fn max_page_pixels(mut self, px: u64) -> Self {
        self.config.max_page_pixels = px;
        self
    }

    pub fn max_raster_pixels(mut self, px: u64) -> Self {
        self.config.max_raster_pixels = px;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    /// Attach a progress callback that receives ingestion and export events.
    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConverterConfig, ConvertError> {
        let c = &self.config;
        for (name, scale) in [("Render", c.render_scale), ("Raster", c.raster_scale)] {
            if !(0.25..=8.0).contains(&scale) {
                return Err(ConvertError::InvalidConfig(format!(
                    "{name} scale must be 0.25–8.0, got {scale}"
                )));
            }
        }
        if c.fallback_size.0 == 0 || c.fallback_size.1 == 0 {
            return Err(ConvertError::InvalidConfig(format!(
                "Fallback size must be non-zero, got {}x{}",
                c.fallback_size.0, c.fallback_size.1
            )));
        }
        if c.max_input_bytes == 0 || c.max_page_pixels == 0 || c.max_raster_pixels == 0 {
            return Err(ConvertError::InvalidConfig(
                "Size limits must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}
