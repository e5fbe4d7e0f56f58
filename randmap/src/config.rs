//! Tunable parameters of [`RandMap`](crate::RandMap).
use randmap_core::RandMapError;

/// Parameters of the resize controller and of the sampler.
///
/// # Examples
///
/// ```rust
/// use randmap::{Config, RandMap};
///
/// let config = Config {
///     fast_retry_cap: 4,
///     ..Config::default()
/// };
/// let map: RandMap<u32, u32> = RandMap::with_config(config, 0).unwrap();
/// assert!(map.is_empty());
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    /// The average number of entries per primary bucket above which the table doubles.
    pub max_load_factor: f32,
    /// The minimum number of old buckets every mutating call evacuates while a resize is in
    /// progress.
    pub evacuations_per_write: usize,
    /// The number of rejection-sampling attempts of the uniform sampler before it falls back to
    /// the linear scan.
    pub retry_cap: usize,
    /// The number of rejection-sampling attempts of the fast sampler before it falls back to
    /// the nearest non-empty bucket.
    pub fast_retry_cap: usize,
}

impl Config {
    pub const DEFAULT_MAX_LOAD_FACTOR: f32 = 6.5;
    pub const DEFAULT_EVACUATIONS_PER_WRITE: usize = 2;
    pub const DEFAULT_RETRY_CAP: usize = 64;
    pub const DEFAULT_FAST_RETRY_CAP: usize = 8;

    /// Checks that every parameter is within its valid range.
    pub fn validate(&self) -> Result<(), RandMapError> {
        if !(self.max_load_factor.is_finite() && self.max_load_factor >= 1.0) {
            return Err(RandMapError::InvalidConfig(
                r#""max_load_factor" must be a finite number >= 1"#,
            ));
        }
        if self.evacuations_per_write == 0 {
            return Err(RandMapError::InvalidConfig(
                r#""evacuations_per_write" must be > 0"#,
            ));
        }
        if self.retry_cap == 0 || self.fast_retry_cap == 0 {
            return Err(RandMapError::InvalidConfig("retry caps must be > 0"));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_load_factor: Self::DEFAULT_MAX_LOAD_FACTOR,
            evacuations_per_write: Self::DEFAULT_EVACUATIONS_PER_WRITE,
            retry_cap: Self::DEFAULT_RETRY_CAP,
            fast_retry_cap: Self::DEFAULT_FAST_RETRY_CAP,
        }
    }
}
