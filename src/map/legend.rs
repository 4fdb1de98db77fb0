use crate::map::color::{ColorMapper, Rgb};
use crate::view::{ScaleMode, ViewMode};

/// Number of color steps shown for count legends
pub const LEGEND_STEPS: usize = 5;

/// `n` evenly spaced values from `a` to `b` inclusive
pub fn linspace(a: f64, b: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![a],
        _ => {
            let step = (b - a) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { b } else { a + step * i as f64 })
                .collect()
        }
    }
}

/// `base` raised to `n` evenly spaced exponents from `a` to `b`
pub fn logspace(a: f64, b: f64, n: usize, base: f64) -> Vec<f64> {
    linspace(a, b, n).into_iter().map(|x| base.powf(x)).collect()
}

/// Representative data values for the legend of the current mode and scale
pub fn legend_values(mapper: &ColorMapper) -> Vec<f64> {
    let top = mapper.domain().max();
    let e = std::f64::consts::E;
    match (mapper.mode(), mapper.scale_mode()) {
        (ViewMode::PercentChange, ScaleMode::Linear) => {
            linspace(-top / 100.0, top / 100.0, LEGEND_STEPS * 2 - 1)
        }
        (ViewMode::PercentChange, ScaleMode::Log) => {
            let side = logspace(0.0, top, 4, e);
            side.iter()
                .rev()
                .map(|v| -v / 100.0)
                .chain(std::iter::once(0.0))
                .chain(side.iter().map(|v| v / 100.0))
                .collect()
        }
        (_, ScaleMode::Linear) => linspace(0.0, top, LEGEND_STEPS),
        (_, ScaleMode::Log) => logspace(0.0, top, LEGEND_STEPS, e),
    }
}

/// Round half up at `decimals` places (negative = tens, hundreds, ...)
pub fn round_half_up(value: f64, decimals: i32) -> f64 {
    if decimals >= 0 {
        let p = 10f64.powi(decimals);
        (value * p + 0.5).floor() / p
    } else {
        let step = 10f64.powi(-decimals);
        (value / step + 0.5).floor() * step
    }
}

/// Shortest decimal rendering without a trailing `.0` or a negative zero
pub fn display_number(value: f64) -> String {
    format!("{}", value + 0.0)
}

/// Legend label for a value
pub fn format_label(value: f64, mode: ViewMode, scale: ScaleMode, in_max: f64) -> String {
    if mode.is_relative() {
        return format!("{}%", display_number(round_half_up(value * 100.0, 0)));
    }
    if in_max <= 1.0 {
        // Log legends for shares are already in percent
        return match scale {
            ScaleMode::Linear => format!("{}%", display_number(round_half_up(value * 100.0, 0))),
            ScaleMode::Log => format!("{}%", display_number(round_half_up(value, 0))),
        };
    }
    if value <= 100.0 {
        display_number(round_half_up(value, 0))
    } else if value <= 10_000.0 {
        display_number(round_half_up(value, -2))
    } else if value <= 1_000_000.0 {
        format!("{}K", display_number(round_half_up(value / 1e3, 0)))
    } else {
        format!("{}M", display_number(round_half_up(value / 1e6, 1)))
    }
}

/// Swatch drawn next to a legend label
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Swatch {
    /// Same hatch pattern used for regions without data
    NoData,
    Color(Rgb),
}

#[derive(Clone, Debug, PartialEq)]
pub struct LegendEntry {
    pub swatch: Swatch,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Legend {
    pub title: String,
    pub entries: Vec<LegendEntry>,
}

impl Legend {
    /// Build the legend: a leading "No data" swatch, then one entry per value
    pub fn build(mapper: &ColorMapper, in_max: f64, title: impl Into<String>) -> Self {
        let mut entries = vec![LegendEntry {
            swatch: Swatch::NoData,
            label: "No data".to_string(),
        }];
        entries.extend(legend_values(mapper).into_iter().map(|v| LegendEntry {
            swatch: Swatch::Color(mapper.color_for(v)),
            label: format_label(v, mapper.mode(), mapper.scale_mode(), in_max),
        }));

        Self {
            title: title.into(),
            entries,
        }
    }
}
