use crate::foundation::error::{PixelartError, PixelartResult};

/// Default block size, matching the conversion service defaults.
pub const DEFAULT_PIXEL_SIZE: u32 = 16;
/// Default palette size.
pub const DEFAULT_N_COLORS: u32 = 16;

/// Parameters of one pixelation run. Immutable for the whole file.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PixelationParams {
    /// Edge length of a block in source pixels (>= 1).
    pub pixel_size: u32,
    /// Maximum palette size per frame. `0` disables clustering.
    pub n_colors: u32,
    /// Integer output scale (>= 1).
    pub upscale_factor: u32,
    /// k-means tuning.
    pub cluster: ClusterOpts,
}

impl Default for PixelationParams {
    fn default() -> Self {
        Self {
            pixel_size: DEFAULT_PIXEL_SIZE,
            n_colors: DEFAULT_N_COLORS,
            upscale_factor: 1,
            cluster: ClusterOpts::default(),
        }
    }
}

impl PixelationParams {
    /// Build validated params with default clustering options.
    pub fn new(pixel_size: u32, n_colors: u32, upscale_factor: u32) -> PixelartResult<Self> {
        let params = Self {
            pixel_size,
            n_colors,
            upscale_factor,
            cluster: ClusterOpts::default(),
        };
        params.validate()?;
        Ok(params)
    }

    /// Check ranges. `n_colors == 0` is accepted and means "no clustering".
    pub fn validate(&self) -> PixelartResult<()> {
        if self.pixel_size == 0 {
            return Err(PixelartError::validation("pixel_size must be >= 1"));
        }
        if self.upscale_factor == 0 {
            return Err(PixelartError::validation("upscale_factor must be >= 1"));
        }
        self.cluster.validate()
    }

    /// Block-grid dimensions for a `width x height` source.
    pub fn downsampled_dims(&self, width: u32, height: u32) -> (u32, u32) {
        let p = self.pixel_size.max(1);
        ((width / p).max(1), (height / p).max(1))
    }

    /// Output dimensions for a `width x height` source.
    pub fn scaled_dims(&self, width: u32, height: u32) -> PixelartResult<(u32, u32)> {
        let f = self.upscale_factor;
        match (width.checked_mul(f), height.checked_mul(f)) {
            (Some(w), Some(h)) => Ok((w, h)),
            _ => Err(PixelartError::validation(format!(
                "{width}x{height} scaled by {f} overflows"
            ))),
        }
    }
}

/// k-means termination and restart settings.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ClusterOpts {
    /// Independent k-means++ initialisations; the lowest-cost run wins.
    pub attempts: u32,
    /// Hard iteration cap per attempt.
    pub max_iterations: u32,
    /// Stop once no centre moves further than this (Euclidean, channel units).
    pub epsilon: f32,
    /// RNG seed for initialisation.
    pub seed: u64,
}

impl Default for ClusterOpts {
    fn default() -> Self {
        Self {
            attempts: 10,
            max_iterations: 100,
            epsilon: 0.2,
            seed: 0,
        }
    }
}

impl ClusterOpts {
    fn validate(&self) -> PixelartResult<()> {
        if self.attempts == 0 {
            return Err(PixelartError::validation("cluster attempts must be >= 1"));
        }
        if self.max_iterations == 0 {
            return Err(PixelartError::validation(
                "cluster max_iterations must be >= 1",
            ));
        }
        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err(PixelartError::validation(
                "cluster epsilon must be finite and >= 0",
            ));
        }
        Ok(())
    }
}
