//! Session configuration.

use serde::{Deserialize, Serialize};

use crate::arena::DEFAULT_SAFETY_FACTOR;
use crate::error::Result;
use crate::kernel::{Kernel, QUALITY_DEFAULT, RubatoKernel};
use crate::session::Session;

/// Settings for building a [`Session`].
///
/// Every field has a default, so a partial JSON or YAML document is enough:
///
/// ```
/// let cfg: giztoy_resampler::Config =
///     serde_json::from_str(r#"{"channels": 2, "output_rate": 16000}"#).unwrap();
/// assert_eq!(cfg.input_rate, 48000);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub channels: u32,
    pub input_rate: u32,
    pub output_rate: u32,
    /// Explicit `(num, den)` ratio, input over output. Overrides the ratio
    /// implied by the rate pair.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratio: Option<(u32, u32)>,
    pub quality: i32,
    pub input_stride: u32,
    pub output_stride: u32,
    /// Output headroom, at least 1.0.
    pub safety_factor: f64,
    /// Skip the filter's leading zeros right after creation.
    pub skip_zeros: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            channels: 1,
            input_rate: 48000,
            output_rate: 48000,
            ratio: None,
            quality: QUALITY_DEFAULT,
            input_stride: 1,
            output_stride: 1,
            safety_factor: DEFAULT_SAFETY_FACTOR,
            skip_zeros: false,
        }
    }
}

impl Session<RubatoKernel> {
    /// Builds a session over the built-in rubato kernel from `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::create_from_config(config)
    }
}

impl<K: Kernel> Session<K> {
    /// Builds a session over kernel `K` from `config`.
    pub fn create_from_config(config: &Config) -> Result<Self> {
        let session = match config.ratio {
            Some((num, den)) => Self::create_frac(
                config.channels,
                num,
                den,
                config.input_rate,
                config.output_rate,
                config.quality,
            )?,
            None => Self::create(
                config.channels,
                config.input_rate,
                config.output_rate,
                config.quality,
            )?,
        };
        let mut session = session.with_safety_factor(config.safety_factor);
        session.set_input_stride(config.input_stride)?;
        session.set_output_stride(config.output_stride)?;
        if config.skip_zeros {
            session.skip_leading_zeros()?;
        }
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.channels, 1);
        assert_eq!(cfg.quality, 4);
        assert_eq!(cfg.safety_factor, 1.1);
        let s = Session::from_config(&cfg).unwrap();
        assert_eq!(s.rate().unwrap(), (48000, 48000));
    }

    #[test]
    fn test_partial_json() {
        let cfg: Config = serde_json::from_str(
            r#"{"channels": 2, "input_rate": 44100, "output_rate": 16000, "quality": 3}"#,
        )
        .unwrap();
        assert_eq!(cfg.output_stride, 1);
        assert!(!cfg.skip_zeros);
        let s = Session::from_config(&cfg).unwrap();
        assert_eq!(s.channels().unwrap(), 2);
        assert_eq!(s.quality().unwrap(), 3);
    }

    #[test]
    fn test_ratio_and_strides() {
        let cfg = Config {
            channels: 2,
            ratio: Some((7, 11)),
            input_stride: 2,
            output_stride: 2,
            safety_factor: 0.5,
            skip_zeros: true,
            ..Config::default()
        };
        let s = Session::from_config(&cfg).unwrap();
        assert_eq!(s.ratio().unwrap(), (7, 11));
        assert_eq!(s.input_stride().unwrap(), 2);
        // Clamped to 1.0.
        assert!((s.multiplier().unwrap() - 11.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_config() {
        let cfg = Config {
            quality: 12,
            ..Config::default()
        };
        assert_eq!(
            Session::from_config(&cfg).unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
        let cfg = Config {
            output_stride: 0,
            ..Config::default()
        };
        assert_eq!(
            Session::from_config(&cfg).unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
    }

    #[test]
    fn test_serialize_skips_missing_ratio() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(!json.contains("ratio"));
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Config::default());
    }
}
