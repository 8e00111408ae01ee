//! Color ramps for density (eye and waterfall) plots.

use palette::{LinSrgb, Mix, Srgb};
use serde::{Deserialize, Serialize};

/// Entries in a baked ramp.
pub const RAMP_SIZE: usize = 256;

/// Named density color ramp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EyeColorRamp {
    /// Green phosphor.
    #[default]
    Crt,
    Ironbow,
    Rainbow,
    Grayscale,
    Viridis,
}

impl EyeColorRamp {
    pub const ALL: [Self; 5] = [
        Self::Crt,
        Self::Ironbow,
        Self::Rainbow,
        Self::Grayscale,
        Self::Viridis,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Crt => "crt",
            Self::Ironbow => "ironbow",
            Self::Rainbow => "rainbow",
            Self::Grayscale => "grayscale",
            Self::Viridis => "viridis",
        }
    }

    /// Look a ramp up by its lowercase name.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|r| r.name().eq_ignore_ascii_case(name))
    }

    /// `(position, sRGB, alpha)` control points, positions ascending in 0..=1.
    fn stops(self) -> &'static [(f32, [u8; 3], u8)] {
        match self {
            Self::Crt => &[
                (0.0, [0x00, 0x00, 0x00], 0x00),
                (0.05, [0x00, 0x40, 0x00], 0x80),
                (0.5, [0x20, 0xc0, 0x20], 0xff),
                (1.0, [0xe0, 0xff, 0xe0], 0xff),
            ],
            Self::Ironbow => &[
                (0.0, [0x00, 0x00, 0x00], 0x00),
                (0.05, [0x1a, 0x00, 0x5c], 0x80),
                (0.35, [0x9c, 0x0f, 0x92], 0xff),
                (0.65, [0xf0, 0x5c, 0x1c], 0xff),
                (0.85, [0xff, 0xc4, 0x1a], 0xff),
                (1.0, [0xff, 0xff, 0xf0], 0xff),
            ],
            Self::Rainbow => &[
                (0.0, [0x00, 0x00, 0x00], 0x00),
                (0.05, [0x40, 0x00, 0xff], 0x80),
                (0.3, [0x00, 0x80, 0xff], 0xff),
                (0.5, [0x00, 0xff, 0x00], 0xff),
                (0.75, [0xff, 0xff, 0x00], 0xff),
                (1.0, [0xff, 0x00, 0x00], 0xff),
            ],
            Self::Grayscale => &[
                (0.0, [0x00, 0x00, 0x00], 0x00),
                (0.05, [0x20, 0x20, 0x20], 0x80),
                (1.0, [0xff, 0xff, 0xff], 0xff),
            ],
            Self::Viridis => &[
                (0.0, [0x44, 0x01, 0x54], 0x00),
                (0.05, [0x44, 0x01, 0x54], 0x80),
                (0.25, [0x3b, 0x52, 0x8b], 0xff),
                (0.5, [0x21, 0x91, 0x8c], 0xff),
                (0.75, [0x5e, 0xc9, 0x62], 0xff),
                (1.0, [0xfd, 0xe7, 0x25], 0xff),
            ],
        }
    }

    /// Bake the ramp into [`RAMP_SIZE`] straight-alpha RGBA8 entries.
    ///
    /// Colors are interpolated in linear light.
    pub fn build(self) -> Vec<[u8; 4]> {
        let stops = self.stops();
        (0..RAMP_SIZE)
            .map(|i| {
                let t = i as f32 / (RAMP_SIZE - 1) as f32;
                let hi = stops
                    .iter()
                    .position(|&(p, _, _)| p >= t)
                    .unwrap_or(stops.len() - 1);
                let lo = hi.saturating_sub(1);
                let (p0, c0, a0) = stops[lo];
                let (p1, c1, a1) = stops[hi];
                let f = if p1 > p0 { (t - p0) / (p1 - p0) } else { 0.0 };

                let c0: LinSrgb<f32> = Srgb::new(c0[0], c0[1], c0[2]).into_linear();
                let c1: LinSrgb<f32> = Srgb::new(c1[0], c1[1], c1[2]).into_linear();
                let rgb: Srgb<u8> = Srgb::from_linear(c0.mix(c1, f));
                let alpha = a0 as f32 + (a1 as f32 - a0 as f32) * f;
                [rgb.red, rgb.green, rgb.blue, alpha.round() as u8]
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_ramp_has_full_size_and_transparent_floor() {
        for ramp in EyeColorRamp::ALL {
            let lut = ramp.build();
            assert_eq!(lut.len(), RAMP_SIZE, "{}", ramp.name());
            assert_eq!(lut[0][3], 0, "{} floor must be transparent", ramp.name());
            assert_eq!(lut[RAMP_SIZE - 1][3], 0xff);
        }
    }

    #[test]
    fn test_endpoints_hit_stop_colors() {
        let lut = EyeColorRamp::Grayscale.build();
        assert_eq!(lut[0], [0, 0, 0, 0]);
        assert_eq!(lut[255], [255, 255, 255, 255]);
    }

    #[test]
    fn test_grayscale_is_monotonic() {
        let lut = EyeColorRamp::Grayscale.build();
        for pair in lut.windows(2) {
            assert!(pair[1][0] >= pair[0][0]);
            assert!(pair[1][3] >= pair[0][3]);
        }
    }

    #[test]
    fn test_name_roundtrip() {
        for ramp in EyeColorRamp::ALL {
            assert_eq!(EyeColorRamp::from_name(ramp.name()), Some(ramp));
        }
        assert_eq!(EyeColorRamp::from_name(" Viridis "), Some(EyeColorRamp::Viridis));
        assert_eq!(EyeColorRamp::from_name("plasma"), None);
    }
}
