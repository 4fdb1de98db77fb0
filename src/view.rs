//! View-mode table: every per-mode constant (domain extent, value factor,
//! legend title, label style) is looked up here instead of comparing mode
//! strings at each use site.

use std::fmt;

/// Which of the three stored series is being displayed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ViewMode {
    /// Value observed on the selected date (`crisis` in data files)
    OnDate,
    Baseline,
    /// (on date − baseline) / baseline, precomputed per flow
    PercentChange,
}

impl ViewMode {
    pub const ALL: [ViewMode; 3] = [ViewMode::OnDate, ViewMode::Baseline, ViewMode::PercentChange];

    /// Key used for this mode in movement data files
    pub fn key(self) -> &'static str {
        match self {
            ViewMode::OnDate => "crisis",
            ViewMode::Baseline => "baseline",
            ViewMode::PercentChange => "percent_change",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.key() == key)
    }

    /// Radio button caption
    pub fn label(self) -> &'static str {
        match self {
            ViewMode::OnDate => "On date",
            ViewMode::Baseline => "Baseline",
            ViewMode::PercentChange => "Change",
        }
    }

    /// Stored percent changes are fractions; colors and labels work in percent.
    pub fn value_factor(self) -> f64 {
        match self {
            ViewMode::PercentChange => 100.0,
            _ => 1.0,
        }
    }

    /// Upper end `m` of the symmetric color domain `[-m, m]`
    pub fn domain_extent(self, in_max: f64, scale: ScaleMode) -> f64 {
        match (self, scale) {
            (ViewMode::PercentChange, ScaleMode::Linear) => 100.0,
            (ViewMode::PercentChange, ScaleMode::Log) => 101f64.ln(),
            (_, ScaleMode::Linear) => in_max,
            (_, ScaleMode::Log) => {
                // in_max <= 1 means the data are shares, which the log scale reads as percent
                let unit = if in_max > 1.0 { 1.0 } else { 100.0 };
                (in_max * unit + 1.0).ln()
            }
        }
    }

    pub fn is_relative(self) -> bool {
        self == ViewMode::PercentChange
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Transform applied before a value is looked up on the color scale
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ScaleMode {
    #[default]
    Linear,
    Log,
}

impl ScaleMode {
    pub fn toggled(self) -> Self {
        match self {
            ScaleMode::Linear => ScaleMode::Log,
            ScaleMode::Log => ScaleMode::Linear,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScaleMode::Linear => "linear",
            ScaleMode::Log => "log",
        }
    }
}

/// Which side of a stored `[forward, reverse]` pair to read
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// Origin → destination (index 0)
    #[default]
    Forward,
    /// Destination → origin (index 1)
    Reverse,
}

impl Direction {
    pub fn from_index(idx: usize) -> Option<Self> {
        match idx {
            0 => Some(Direction::Forward),
            1 => Some(Direction::Reverse),
            _ => None,
        }
    }

    #[inline(always)]
    pub fn index(self) -> usize {
        match self {
            Direction::Forward => 0,
            Direction::Reverse => 1,
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            Direction::Forward => Direction::Reverse,
            Direction::Reverse => Direction::Forward,
        }
    }
}
