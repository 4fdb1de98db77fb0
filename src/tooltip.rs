//! Tooltip text for hovered regions.

use crate::data::Atlas;
use crate::interaction::{TooltipKind, ViewState};
use crate::map::{display_number, round_half_up, RegionId};
use crate::view::{Direction, ViewMode};

/// A run of tooltip text; `strong` runs are region names and values
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub strong: bool,
}

impl Segment {
    fn plain(text: impl Into<String>) -> Self {
        Self { text: text.into(), strong: false }
    }

    fn strong(text: impl Into<String>) -> Self {
        Self { text: text.into(), strong: true }
    }
}

pub type Line = Vec<Segment>;

/// Integer with `,` between groups of three digits
pub fn with_thousands(value: f64) -> String {
    if !value.is_finite() {
        return format!("{value}");
    }
    let rounded = round_half_up(value, 0);
    let digits = format!("{}", rounded.abs() as u64);
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0.0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Share as a percentage with up to two decimals
fn percent(value: f64) -> String {
    format!("{}%", display_number(round_half_up(value * 100.0, 2)))
}

fn value_line(label: &str, value: String) -> Line {
    vec![Segment::plain(format!("{label}: ")), Segment::strong(value)]
}

/// On-date, baseline and deviation rows shared by both tooltip kinds
fn value_lines(share: bool, on_date: f64, baseline: f64, change: f64, with_deviation: bool) -> Vec<Line> {
    let fmt = |v: f64| if share { percent(v) } else { with_thousands(v) };
    let mut lines = vec![
        value_line("On date", fmt(on_date)),
        value_line("Baseline", fmt(baseline)),
    ];
    if with_deviation && baseline > 0.0 {
        lines.push(value_line("Deviation", percent(change)));
    }
    lines
}

/// Totals for a region with nothing selected
pub fn default_lines(atlas: &Atlas, state: &ViewState, region: RegionId) -> Vec<Line> {
    let name = atlas.name(region);
    let share = atlas.meta().is_share();
    let value = |mode| {
        atlas
            .dataset
            .own_value(name, mode, state.t, state.direction)
            .unwrap_or(f64::NAN)
    };

    let mut lines = if share {
        vec![
            vec![Segment::plain("Share of "), Segment::strong(name), Segment::plain(" population")],
            vec![Segment::plain("going to work anywhere")],
        ]
    } else {
        vec![vec![Segment::plain("Trips starting in "), Segment::strong(name), Segment::plain(":")]]
    };
    lines.push(Vec::new());
    lines.extend(value_lines(
        share,
        value(ViewMode::OnDate),
        value(ViewMode::Baseline),
        value(ViewMode::PercentChange),
        true,
    ));
    lines
}

/// Flow between the selection and the hovered region, read in the current direction
pub fn selected_lines(atlas: &Atlas, state: &ViewState, hovered: RegionId) -> Vec<Line> {
    let Some(selected) = state.selected else {
        return default_lines(atlas, state, hovered);
    };
    let (selected, hovered) = (atlas.name(selected), atlas.name(hovered));
    let share = atlas.meta().is_share();
    let series = atlas.dataset.flow_series(selected, hovered);
    let value = |mode, missing| {
        series
            .and_then(|s| s.get(mode, state.t, state.direction))
            .unwrap_or(missing)
    };

    let (from, to) = match state.direction {
        Direction::Forward => (selected, hovered),
        Direction::Reverse => (hovered, selected),
    };
    let mut lines = if share {
        vec![
            vec![Segment::plain("Share of "), Segment::strong(from), Segment::plain(" population")],
            vec![Segment::plain("going to work in "), Segment::strong(to)],
        ]
    } else {
        vec![vec![
            Segment::plain("Trips starting in "),
            Segment::strong(from),
            Segment::plain(" that end in "),
            Segment::strong(to),
        ]]
    };
    lines.push(Vec::new());
    lines.extend(value_lines(
        share,
        value(ViewMode::OnDate, 0.0),
        value(ViewMode::Baseline, 0.0),
        value(ViewMode::PercentChange, f64::NAN),
        !share,
    ));
    lines
}

pub fn tooltip_lines(atlas: &Atlas, state: &ViewState, kind: TooltipKind) -> Vec<Line> {
    match kind {
        TooltipKind::Default(region) => default_lines(atlas, state, region),
        TooltipKind::Selected(region) => selected_lines(atlas, state, region),
    }
}

/// Plain text of a line, for width measurement and tests
pub fn line_text(line: &Line) -> String {
    line.iter().map(|s| s.text.as_str()).collect()
}
