use crate::foundation::error::{PixelartError, PixelartResult};

/// Zero-based position of a frame in decode order.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Exact rational frame rate (`num / den` frames per second).
///
/// Kept as a ratio end-to-end so long videos never accumulate float drift; it is only turned
/// into a float for display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator.
    pub num: u32,
    /// Denominator, always > 0.
    pub den: u32,
}

impl Fps {
    /// Build a validated frame rate.
    pub fn new(num: u32, den: u32) -> PixelartResult<Self> {
        if den == 0 {
            return Err(PixelartError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(PixelartError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Parse an ffmpeg-style ratio such as `30000/1001` or a bare integer such as `24`.
    pub fn parse_ratio(s: &str) -> PixelartResult<Self> {
        let s = s.trim();
        let (num, den) = match s.split_once('/') {
            Some((a, b)) => (a.trim(), b.trim()),
            None => (s, "1"),
        };
        let num = num
            .parse::<u32>()
            .map_err(|_| PixelartError::validation(format!("invalid frame rate '{s}'")))?;
        let den = den
            .parse::<u32>()
            .map_err(|_| PixelartError::validation(format!("invalid frame rate '{s}'")))?;
        Self::new(num, den)
    }

    /// Floating-point frames per second, for logs and reports.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }
}

impl std::fmt::Display for Fps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}
