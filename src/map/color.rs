use ratatui::style::Color;

use crate::view::{ScaleMode, ViewMode};

/// 8-bit RGB color
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Channel-wise linear interpolation, `t` in [0, 1]
    fn mix(self, other: Rgb, t: f64) -> Rgb {
        let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round().clamp(0.0, 255.0) as u8;
        Rgb::new(lerp(self.r, other.r), lerp(self.g, other.g), lerp(self.b, other.b))
    }
}

impl From<Rgb> for Color {
    fn from(c: Rgb) -> Self {
        Color::Rgb(c.r, c.g, c.b)
    }
}

/// Diverging palette: decrease (red) → neutral grey → increase (blue)
pub const PALETTE: [Rgb; 5] = [
    Rgb::new(0xb7, 0x15, 0x40),
    Rgb::new(0xe5, 0x50, 0x39),
    Rgb::new(0xc4, 0xc4, 0xc4),
    Rgb::new(0x4a, 0x69, 0xbd),
    Rgb::new(0x0c, 0x24, 0x61),
];

/// Fill for regions without a flow to the current selection
pub const NEUTRAL: Rgb = Rgb::new(0xec, 0xf0, 0xf1);

/// Symmetric color domain `[-extent, extent]`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorDomain {
    extent: f64,
}

impl ColorDomain {
    pub fn symmetric(extent: f64) -> Self {
        Self { extent: extent.abs() }
    }

    pub fn min(&self) -> f64 {
        -self.extent
    }

    pub fn max(&self) -> f64 {
        self.extent
    }
}

/// Continuous scale over evenly spaced palette stops
#[derive(Clone, Debug)]
pub struct ColorScale {
    stops: [Rgb; 5],
    domain: ColorDomain,
}

impl ColorScale {
    pub fn new(stops: [Rgb; 5], domain: ColorDomain) -> Self {
        Self { stops, domain }
    }

    pub fn set_domain(&mut self, domain: ColorDomain) {
        self.domain = domain;
    }

    pub fn domain(&self) -> ColorDomain {
        self.domain
    }

    /// Relative position of `value` in the domain, clamped to [0, 1].
    /// Non-finite values and a collapsed domain sit at the midpoint.
    pub fn position(&self, value: f64) -> f64 {
        let span = self.domain.max() - self.domain.min();
        if !value.is_finite() || span <= 0.0 {
            return 0.5;
        }
        ((value - self.domain.min()) / span).clamp(0.0, 1.0)
    }

    pub fn at(&self, value: f64) -> Rgb {
        let segments = (self.stops.len() - 1) as f64;
        let scaled = self.position(value) * segments;
        let idx = (scaled.floor() as usize).min(self.stops.len() - 2);
        self.stops[idx].mix(self.stops[idx + 1], scaled - idx as f64)
    }
}

/// Sign-split log1p used by the log scale.
/// The branch point is 1, not 0: values in [0, 1) map to -ln(1 - v), which is
/// positive and diverges as v approaches 1.
#[inline]
pub fn log_transform(value: f64) -> f64 {
    if value < 1.0 {
        -(-value + 1.0).ln()
    } else {
        (value + 1.0).ln()
    }
}

/// Turns data values into colors for the active mode and scale
#[derive(Clone, Debug)]
pub struct ColorMapper {
    scale: ColorScale,
    mode: ViewMode,
    scale_mode: ScaleMode,
}

impl ColorMapper {
    pub fn new(mode: ViewMode, in_max: f64, scale_mode: ScaleMode) -> Self {
        let mut mapper = Self {
            scale: ColorScale::new(PALETTE, ColorDomain::symmetric(1.0)),
            mode,
            scale_mode,
        };
        mapper.set_domain(mode, in_max, scale_mode);
        mapper
    }

    /// Recompute the domain; required after every mode or scale change
    pub fn set_domain(&mut self, mode: ViewMode, in_max: f64, scale_mode: ScaleMode) {
        self.mode = mode;
        self.scale_mode = scale_mode;
        self.scale
            .set_domain(ColorDomain::symmetric(mode.domain_extent(in_max, scale_mode)));
    }

    pub fn domain(&self) -> ColorDomain {
        self.scale.domain()
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn scale_mode(&self) -> ScaleMode {
        self.scale_mode
    }

    /// Value as placed on the color scale (percent factor, then log if active)
    pub fn transformed(&self, value: f64) -> f64 {
        let value = value * self.mode.value_factor();
        match self.scale_mode {
            ScaleMode::Linear => value,
            ScaleMode::Log => log_transform(value),
        }
    }

    pub fn position(&self, value: f64) -> f64 {
        self.scale.position(self.transformed(value))
    }

    pub fn color_for(&self, value: f64) -> Rgb {
        self.scale.at(self.transformed(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_stops_and_clamping() {
        let scale = ColorScale::new(PALETTE, ColorDomain::symmetric(100.0));
        assert_eq!(scale.at(-100.0), PALETTE[0]);
        assert_eq!(scale.at(-50.0), PALETTE[1]);
        assert_eq!(scale.at(0.0), PALETTE[2]);
        assert_eq!(scale.at(50.0), PALETTE[3]);
        assert_eq!(scale.at(100.0), PALETTE[4]);
        assert_eq!(scale.at(1e9), PALETTE[4]);
        assert_eq!(scale.at(-1e9), PALETTE[0]);
        assert_eq!(scale.at(f64::NAN), PALETTE[2]);
    }

    #[test]
    fn test_interpolates_between_stops() {
        let scale = ColorScale::new(PALETTE, ColorDomain::symmetric(100.0));
        let c = scale.at(25.0);
        // Halfway between #C4C4C4 and #4a69bd
        assert_eq!(c, Rgb::new(0x87, 0x97, 0xc1));
    }

    #[test]
    fn test_linear_color_is_antisymmetric() {
        let mapper = ColorMapper::new(ViewMode::OnDate, 4000.0, ScaleMode::Linear);
        for v in [1.0, 250.0, 1234.5, 3999.0] {
            let sum = mapper.position(v) + mapper.position(-v);
            assert!((sum - 1.0).abs() < 1e-12, "asymmetric at {v}");
        }
    }

    #[test]
    fn test_percent_change_is_scaled_by_hundred() {
        let mapper = ColorMapper::new(ViewMode::PercentChange, 4000.0, ScaleMode::Linear);
        assert_eq!(mapper.transformed(-0.5), -50.0);
        assert_eq!(mapper.color_for(-0.5), PALETTE[1]);
        assert_eq!(mapper.color_for(1.0), PALETTE[4]);
    }

    #[test]
    fn test_log_transform_branches_at_one() {
        assert_eq!(log_transform(0.0), 0.0);
        assert!((log_transform(1.0) - 2f64.ln()).abs() < 1e-12);
        // Just below 1 takes the -ln(1 - v) branch and blows up
        assert!((log_transform(0.999) - 6.9078).abs() < 1e-4);
        assert!(log_transform(0.999) > log_transform(1.0));
        assert!((log_transform(0.5) - 2f64.ln()).abs() < 1e-12);
        assert!((log_transform(-9.0) + 10f64.ln()).abs() < 1e-12);
        assert!((log_transform(9.0) - 10f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_log_mapper_domain_end() {
        let mapper = ColorMapper::new(ViewMode::Baseline, 999.0, ScaleMode::Log);
        assert!((mapper.domain().max() - 1000f64.ln()).abs() < 1e-12);
        assert_eq!(mapper.color_for(999.0), PALETTE[4]);
        assert_eq!(mapper.color_for(-999.0), PALETTE[0]);
    }

    #[test]
    fn test_set_domain_switches_mode() {
        let mut mapper = ColorMapper::new(ViewMode::OnDate, 10.0, ScaleMode::Linear);
        mapper.set_domain(ViewMode::PercentChange, 10.0, ScaleMode::Log);
        assert_eq!(mapper.mode(), ViewMode::PercentChange);
        assert_eq!(mapper.scale_mode(), ScaleMode::Log);
        assert_eq!(mapper.domain().min(), -mapper.domain().max());
    }
}
