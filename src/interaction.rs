//! Hover/selection state machine.
//!
//! Every input becomes a [`MapEvent`]. [`update`] computes the next
//! [`ViewState`] from the current one and says how much of the screen has to
//! be redrawn. Fills and outlines are derived from the state on every frame,
//! so there is no drawn element whose lifetime has to be tracked here.

use crate::data::{Atlas, Meta};
use crate::map::{ColorMapper, Fill, Highlight, OutlineColor, RegionId};
use crate::view::{Direction, ScaleMode, ViewMode};

/// Terminal cell the pointer was at when an event fired
pub type Anchor = (u16, u16);

/// What the tooltip box shows
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TooltipKind {
    /// Totals of the hovered region
    Default(RegionId),
    /// Flow between the selection and the hovered region
    Selected(RegionId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tooltip {
    pub kind: TooltipKind,
    pub anchor: Anchor,
}

/// All mutable view state
#[derive(Clone, Debug, PartialEq)]
pub struct ViewState {
    pub t: usize,
    pub mode: ViewMode,
    pub direction: Direction,
    pub scale: ScaleMode,
    pub selected: Option<RegionId>,
    pub hovering: Option<RegionId>,
    /// Outlines in draw order; the last entry is the most recent
    pub highlights: Vec<Highlight>,
    pub tooltip: Option<Tooltip>,
}

impl ViewState {
    pub fn from_meta(meta: &Meta) -> Self {
        Self {
            t: meta.defaults.t,
            mode: meta.defaults.mode,
            direction: meta.defaults.direction,
            scale: ScaleMode::Linear,
            selected: None,
            hovering: None,
            highlights: Vec::new(),
            tooltip: None,
        }
    }

    fn push_outline(&mut self, region: RegionId, color: OutlineColor) {
        self.highlights.push(Highlight { region, color });
    }

    /// Drop the most recent outline of `region`, if any
    fn pop_outline(&mut self, region: RegionId) {
        if let Some(idx) = self.highlights.iter().rposition(|h| h.region == region) {
            self.highlights.remove(idx);
        }
    }

    /// Outlines never survive a full redraw; a live selection gets its outline back
    fn prepare_full_redraw(&mut self) {
        self.highlights.clear();
        if let Some(selected) = self.selected {
            self.push_outline(selected, OutlineColor::Black);
        }
    }

    /// Tooltip kind matching the current selection for a hovered region
    fn tooltip_for(&self, hovered: RegionId) -> TooltipKind {
        match self.selected {
            Some(_) => TooltipKind::Selected(hovered),
            None => TooltipKind::Default(hovered),
        }
    }

    fn show_tooltip(&mut self, kind: TooltipKind, anchor: Anchor) {
        self.tooltip = Some(Tooltip { kind, anchor });
    }

    /// Region the visible tooltip describes
    fn tooltip_region(&self) -> Option<RegionId> {
        self.tooltip.map(|t| match t.kind {
            TooltipKind::Default(region) | TooltipKind::Selected(region) => region,
        })
    }

    /// Rebuild the visible tooltip after a direction or selection change
    fn refresh_tooltip(&mut self) {
        if let (Some(tooltip), Some(hovered)) = (self.tooltip, self.hovering) {
            let kind = self.tooltip_for(hovered);
            self.show_tooltip(kind, tooltip.anchor);
        }
    }
}

/// Inputs to the state machine
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MapEvent {
    PointerEnter { region: RegionId, at: Anchor },
    PointerMove { region: RegionId, at: Anchor },
    PointerLeave { region: RegionId },
    Click { region: RegionId, at: Anchor },
    /// Drop selection, hover and outlines
    Escape,
    /// Read the reverse direction while held
    ShiftDown,
    ShiftUp,
    /// Flip direction (for terminals without key release events)
    ToggleDirection,
    SetTime(usize),
    SetMode(ViewMode),
    SetScale(ScaleMode),
}

/// How much of the screen an update invalidates
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Redraw {
    None,
    /// Fills, outlines and tooltip from the same color domain
    Refresh,
    /// Everything, including the color domain and legend
    Full,
}

/// Compute the state following `event`
pub fn update(state: &ViewState, event: MapEvent, atlas: &Atlas) -> (ViewState, Redraw) {
    let mut next = state.clone();
    let interactive = |region: RegionId| atlas.dataset.exists(atlas.name(region), state.mode, state.t);

    let redraw = match event {
        MapEvent::PointerEnter { region, at } => {
            if !interactive(region) {
                return (next, Redraw::None);
            }
            match next.selected {
                None => next.push_outline(region, OutlineColor::Black),
                Some(selected) if selected != region => next.push_outline(region, OutlineColor::Grey),
                Some(_) => {}
            }
            next.hovering = Some(region);
            next.show_tooltip(next.tooltip_for(region), at);
            Redraw::Refresh
        }
        MapEvent::PointerMove { region, at } => {
            if !interactive(region) {
                return (next, Redraw::None);
            }
            next.show_tooltip(next.tooltip_for(region), at);
            Redraw::Refresh
        }
        MapEvent::PointerLeave { region } => {
            // Not gated on data: a region can lose its data while hovered
            if next.hovering != Some(region)
                && next.tooltip_region() != Some(region)
                && !next.highlights.iter().any(|h| h.region == region)
            {
                return (next, Redraw::None);
            }
            next.tooltip = None;
            next.hovering = None;
            if next.selected != Some(region) {
                next.pop_outline(region);
            }
            Redraw::Refresh
        }
        MapEvent::Click { region, at } => {
            if !interactive(region) {
                return (next, Redraw::None);
            }
            next.highlights.clear();
            next.push_outline(region, OutlineColor::Black);
            if next.selected == Some(region) {
                next.selected = None;
                next.show_tooltip(TooltipKind::Default(region), at);
            } else {
                next.selected = Some(region);
                next.show_tooltip(TooltipKind::Selected(region), at);
            }
            Redraw::Refresh
        }
        MapEvent::Escape => {
            next.selected = None;
            next.hovering = None;
            next.tooltip = None;
            next.prepare_full_redraw();
            Redraw::Full
        }
        MapEvent::ShiftDown => set_direction(&mut next, Direction::Reverse),
        MapEvent::ShiftUp => set_direction(&mut next, Direction::Forward),
        MapEvent::ToggleDirection => {
            let flipped = next.direction.flipped();
            set_direction(&mut next, flipped)
        }
        MapEvent::SetTime(t) => {
            let last = atlas.meta().time_steps().saturating_sub(1);
            let t = t.min(last);
            if t == next.t {
                return (next, Redraw::None);
            }
            next.t = t;
            next.prepare_full_redraw();
            Redraw::Full
        }
        MapEvent::SetMode(mode) => {
            if mode == next.mode {
                return (next, Redraw::None);
            }
            next.mode = mode;
            next.prepare_full_redraw();
            Redraw::Full
        }
        MapEvent::SetScale(scale) => {
            if scale == next.scale {
                return (next, Redraw::None);
            }
            next.scale = scale;
            next.prepare_full_redraw();
            Redraw::Full
        }
    };

    (next, redraw)
}

fn set_direction(state: &mut ViewState, direction: Direction) -> Redraw {
    if state.direction == direction {
        return Redraw::None;
    }
    state.direction = direction;
    state.refresh_tooltip();
    Redraw::Refresh
}

/// Fill of a region when nothing is selected
pub fn default_fill(atlas: &Atlas, state: &ViewState, mapper: &ColorMapper, region: RegionId) -> Fill {
    // Own totals are read forward regardless of direction
    match atlas
        .dataset
        .own_value(atlas.name(region), state.mode, state.t, Direction::Forward)
    {
        Some(value) => Fill::Color(mapper.color_for(value)),
        None => Fill::NoData,
    }
}

/// Fills showing every region's flow to or from `selected`
pub fn recolor_regions(atlas: &Atlas, state: &ViewState, mapper: &ColorMapper, selected: RegionId) -> Vec<Fill> {
    let mut fills = vec![Fill::Neutral; atlas.regions.len()];
    for (other, series) in atlas.dataset.flows_from(atlas.name(selected)) {
        let Some(id) = atlas.region_id(other) else {
            continue;
        };
        match series.get(state.mode, state.t, state.direction) {
            Some(value) if value != 0.0 => fills[id] = Fill::Color(mapper.color_for(value)),
            _ => {}
        }
    }
    fills
}

/// Fills for the whole map under the current state
pub fn region_fills(atlas: &Atlas, state: &ViewState, mapper: &ColorMapper) -> Vec<Fill> {
    match state.selected {
        Some(selected) => recolor_regions(atlas, state, mapper, selected),
        None => (0..atlas.regions.len())
            .map(|id| default_fill(atlas, state, mapper, id))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Dataset, Defaults, FlowSeries};
    use crate::map::{Region, PALETTE};
    use chrono::NaiveDateTime;

    const A: RegionId = 0;
    const B: RegionId = 1;
    const C: RegionId = 2;
    /// Drawn, but absent from the data
    const D: RegionId = 3;

    fn square(lon: f64) -> Vec<(f64, f64)> {
        vec![(lon, 55.0), (lon + 1.0, 55.0), (lon + 1.0, 56.0), (lon, 56.0)]
    }

    fn pair_series(values: &[[f64; 2]]) -> FlowSeries {
        let mut flows = FlowSeries::default();
        for mode in ViewMode::ALL {
            for (t, &pair) in values.iter().enumerate() {
                flows.series_mut(mode).insert(t, pair);
            }
        }
        flows
    }

    /// Three regions, two time steps, counts up to 100
    fn atlas() -> Atlas {
        let start = NaiveDateTime::parse_from_str("2020-03-01 00:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let meta = Meta {
            in_max: 100.0,
            out_max: 100.0,
            datetimes: vec![start, start + chrono::Duration::days(1)],
            defaults: Defaults {
                t: 0,
                mode: ViewMode::OnDate,
                direction: Direction::Forward,
            },
            modes: ViewMode::ALL.to_vec(),
            legend_label_count: "Trips".into(),
            legend_label_relative: "Change".into(),
        };
        let mut data = Dataset::new(meta);
        data.records_mut("A").own = Some(pair_series(&[[100.0, 90.0], [80.0, 70.0]]));
        data.records_mut("B").own = Some(pair_series(&[[50.0, 50.0], [40.0, 40.0]]));
        // C has no own value at t = 1
        data.records_mut("C").own = Some(pair_series(&[[-20.0, -20.0]]));
        data.records_mut("A")
            .flows
            .insert("B".into(), pair_series(&[[50.0, -25.0], [10.0, 0.0]]));
        data.records_mut("A")
            .flows
            .insert("C".into(), pair_series(&[[-100.0, 100.0], [0.0, 0.0]]));
        data.records_mut("B")
            .flows
            .insert("A".into(), pair_series(&[[25.0, 50.0], [5.0, 5.0]]));

        let regions = vec![
            Region::new("A", vec![square(10.0)]),
            Region::new("B", vec![square(11.0)]),
            Region::new("C", vec![square(12.0)]),
            Region::new("D", vec![square(13.0)]),
        ];
        Atlas::new(data, regions).unwrap()
    }

    fn mapper(state: &ViewState, atlas: &Atlas) -> ColorMapper {
        ColorMapper::new(state.mode, atlas.meta().in_max, state.scale)
    }

    fn apply(state: &ViewState, events: &[MapEvent], atlas: &Atlas) -> ViewState {
        events.iter().fold(state.clone(), |s, &e| update(&s, e, atlas).0)
    }

    fn black(region: RegionId) -> Highlight {
        Highlight { region, color: OutlineColor::Black }
    }

    fn grey(region: RegionId) -> Highlight {
        Highlight { region, color: OutlineColor::Grey }
    }

    #[test]
    fn test_hover_outlines_black_without_selection() {
        let atlas = atlas();
        let idle = ViewState::from_meta(atlas.meta());
        let (state, redraw) = update(&idle, MapEvent::PointerEnter { region: B, at: (3, 4) }, &atlas);
        assert_eq!(redraw, Redraw::Refresh);
        assert_eq!(state.hovering, Some(B));
        assert_eq!(state.highlights, vec![black(B)]);
        assert_eq!(state.tooltip, Some(Tooltip { kind: TooltipKind::Default(B), anchor: (3, 4) }));

        let (state, _) = update(&state, MapEvent::PointerMove { region: B, at: (5, 4) }, &atlas);
        assert_eq!(state.highlights, vec![black(B)]);
        assert_eq!(state.tooltip.map(|t| t.anchor), Some((5, 4)));

        let (state, _) = update(&state, MapEvent::PointerLeave { region: B }, &atlas);
        assert_eq!(state.hovering, None);
        assert!(state.highlights.is_empty());
        assert_eq!(state.tooltip, None);
    }

    #[test]
    fn test_hover_without_data_is_ignored() {
        let atlas = atlas();
        let idle = ViewState::from_meta(atlas.meta());
        let (state, redraw) = update(&idle, MapEvent::PointerEnter { region: D, at: (0, 0) }, &atlas);
        assert_eq!(redraw, Redraw::None);
        assert_eq!(state, idle);
        let (state, redraw) = update(&idle, MapEvent::Click { region: D, at: (0, 0) }, &atlas);
        assert_eq!(redraw, Redraw::None);
        assert_eq!(state.selected, None);
    }

    #[test]
    fn test_click_selects_and_recolors() {
        let atlas = atlas();
        let idle = ViewState::from_meta(atlas.meta());
        let state = apply(
            &idle,
            &[MapEvent::PointerEnter { region: A, at: (1, 1) }, MapEvent::Click { region: A, at: (1, 1) }],
            &atlas,
        );
        assert_eq!(state.selected, Some(A));
        assert_eq!(state.highlights, vec![black(A)]);
        assert_eq!(state.tooltip.map(|t| t.kind), Some(TooltipKind::Selected(A)));

        let m = mapper(&state, &atlas);
        let fills = region_fills(&atlas, &state, &m);
        // A has no flow to itself; B and C follow their crisis[t][0] flows from A
        assert_eq!(fills[A], Fill::Neutral);
        assert_eq!(fills[B], Fill::Color(m.color_for(50.0)));
        assert_eq!(fills[B], Fill::Color(PALETTE[3]));
        assert_eq!(fills[C], Fill::Color(PALETTE[0]));
        assert_eq!(fills[D], Fill::Neutral);
    }

    #[test]
    fn test_hover_other_region_while_selected_is_grey() {
        let atlas = atlas();
        let idle = ViewState::from_meta(atlas.meta());
        let state = apply(
            &idle,
            &[
                MapEvent::PointerEnter { region: A, at: (1, 1) },
                MapEvent::Click { region: A, at: (1, 1) },
                MapEvent::PointerLeave { region: A },
                MapEvent::PointerEnter { region: B, at: (9, 1) },
            ],
            &atlas,
        );
        assert_eq!(state.highlights, vec![black(A), grey(B)]);
        assert_eq!(state.tooltip.map(|t| t.kind), Some(TooltipKind::Selected(B)));

        let state = apply(&state, &[MapEvent::PointerLeave { region: B }], &atlas);
        assert_eq!(state.highlights, vec![black(A)]);

        // Hovering the selection itself adds no outline and leaving keeps it
        let state = apply(
            &state,
            &[MapEvent::PointerEnter { region: A, at: (1, 1) }, MapEvent::PointerLeave { region: A }],
            &atlas,
        );
        assert_eq!(state.highlights, vec![black(A)]);
        assert_eq!(state.selected, Some(A));
    }

    #[test]
    fn test_reclick_restores_default_fills() {
        let atlas = atlas();
        let idle = ViewState::from_meta(atlas.meta());
        let m = mapper(&idle, &atlas);
        let defaults = region_fills(&atlas, &idle, &m);
        assert_eq!(defaults[D], Fill::NoData);
        assert_eq!(defaults[A], Fill::Color(m.color_for(100.0)));

        let selected = apply(&idle, &[MapEvent::Click { region: A, at: (1, 1) }], &atlas);
        assert_ne!(region_fills(&atlas, &selected, &m), defaults);

        let restored = apply(&selected, &[MapEvent::Click { region: A, at: (1, 1) }], &atlas);
        assert_eq!(restored.selected, None);
        assert_eq!(restored.highlights, vec![black(A)]);
        assert_eq!(restored.tooltip.map(|t| t.kind), Some(TooltipKind::Default(A)));
        assert_eq!(region_fills(&atlas, &restored, &m), defaults);
    }

    #[test]
    fn test_click_other_region_switches_selection() {
        let atlas = atlas();
        let idle = ViewState::from_meta(atlas.meta());
        let state = apply(
            &idle,
            &[
                MapEvent::Click { region: A, at: (1, 1) },
                MapEvent::PointerEnter { region: B, at: (9, 1) },
                MapEvent::Click { region: B, at: (9, 1) },
            ],
            &atlas,
        );
        assert_eq!(state.selected, Some(B));
        assert_eq!(state.highlights, vec![black(B)]);
        let m = mapper(&state, &atlas);
        let fills = region_fills(&atlas, &state, &m);
        assert_eq!(fills[A], Fill::Color(m.color_for(25.0)));
        assert_eq!(fills[C], Fill::Neutral);
    }

    #[test]
    fn test_escape_clears_everything() {
        let atlas = atlas();
        let idle = ViewState::from_meta(atlas.meta());
        let state = apply(
            &idle,
            &[
                MapEvent::Click { region: A, at: (1, 1) },
                MapEvent::PointerEnter { region: B, at: (9, 1) },
            ],
            &atlas,
        );
        assert_eq!(state.highlights.len(), 2);
        let (cleared, redraw) = update(&state, MapEvent::Escape, &atlas);
        assert_eq!(redraw, Redraw::Full);
        assert_eq!(cleared.selected, None);
        assert_eq!(cleared.hovering, None);
        assert!(cleared.highlights.is_empty());
        assert_eq!(cleared.tooltip, None);
        let m = mapper(&cleared, &atlas);
        assert_eq!(region_fills(&atlas, &cleared, &m), region_fills(&atlas, &idle, &m));
    }

    #[test]
    fn test_shift_reads_reverse_direction() {
        let atlas = atlas();
        let idle = ViewState::from_meta(atlas.meta());
        let selected = apply(
            &idle,
            &[MapEvent::Click { region: A, at: (1, 1) }, MapEvent::PointerEnter { region: B, at: (9, 1) }],
            &atlas,
        );
        let (reversed, redraw) = update(&selected, MapEvent::ShiftDown, &atlas);
        assert_eq!(redraw, Redraw::Refresh);
        assert_eq!(reversed.direction, Direction::Reverse);
        assert_eq!(reversed.tooltip.map(|t| t.kind), Some(TooltipKind::Selected(B)));
        let m = mapper(&reversed, &atlas);
        let fills = region_fills(&atlas, &reversed, &m);
        assert_eq!(fills[B], Fill::Color(m.color_for(-25.0)));
        assert_eq!(fills[C], Fill::Color(PALETTE[4]));

        // Key repeat does nothing
        assert_eq!(update(&reversed, MapEvent::ShiftDown, &atlas).1, Redraw::None);

        let (forward, _) = update(&reversed, MapEvent::ShiftUp, &atlas);
        assert_eq!(forward.direction, Direction::Forward);
        let (toggled, _) = update(&forward, MapEvent::ToggleDirection, &atlas);
        assert_eq!(toggled.direction, Direction::Reverse);
    }

    #[test]
    fn test_zero_and_missing_flows_stay_neutral() {
        let atlas = atlas();
        let idle = ViewState::from_meta(atlas.meta());
        let state = apply(
            &idle,
            &[MapEvent::Click { region: A, at: (1, 1) }, MapEvent::SetTime(1)],
            &atlas,
        );
        assert_eq!(state.t, 1);
        let m = mapper(&state, &atlas);
        let fills = region_fills(&atlas, &state, &m);
        assert_eq!(fills[B], Fill::Color(m.color_for(10.0)));
        assert_eq!(fills[C], Fill::Neutral);
    }

    #[test]
    fn test_full_redraw_reseeds_selection_outline() {
        let atlas = atlas();
        let idle = ViewState::from_meta(atlas.meta());
        let state = apply(
            &idle,
            &[
                MapEvent::Click { region: A, at: (1, 1) },
                MapEvent::PointerEnter { region: B, at: (9, 1) },
            ],
            &atlas,
        );
        let (state, redraw) = update(&state, MapEvent::SetMode(ViewMode::Baseline), &atlas);
        assert_eq!(redraw, Redraw::Full);
        assert_eq!(state.highlights, vec![black(A)]);
        assert_eq!(state.hovering, Some(B));

        // Leaving B after the redraw must not remove the selection outline
        let (state, _) = update(&state, MapEvent::PointerLeave { region: B }, &atlas);
        assert_eq!(state.highlights, vec![black(A)]);
    }

    #[test]
    fn test_leave_hides_tooltip_without_hover() {
        let atlas = atlas();
        let idle = ViewState::from_meta(atlas.meta());
        // A move with no preceding enter still shows a tooltip
        let state = apply(
            &idle,
            &[MapEvent::PointerEnter { region: B, at: (9, 1) }, MapEvent::Escape],
            &atlas,
        );
        let (state, _) = update(&state, MapEvent::PointerMove { region: B, at: (9, 2) }, &atlas);
        assert_eq!(state.hovering, None);
        assert_eq!(state.tooltip.map(|t| t.kind), Some(TooltipKind::Default(B)));

        let (state, redraw) = update(&state, MapEvent::PointerLeave { region: B }, &atlas);
        assert_eq!(redraw, Redraw::Refresh);
        assert_eq!(state.tooltip, None);

        // Leaving some other region leaves the tooltip alone
        let (shown, _) = update(&idle, MapEvent::PointerMove { region: B, at: (9, 2) }, &atlas);
        assert_eq!(update(&shown, MapEvent::PointerLeave { region: A }, &atlas).1, Redraw::None);
    }

    #[test]
    fn test_controls_ignore_no_ops() {
        let atlas = atlas();
        let idle = ViewState::from_meta(atlas.meta());
        assert_eq!(update(&idle, MapEvent::SetTime(0), &atlas).1, Redraw::None);
        assert_eq!(update(&idle, MapEvent::SetMode(ViewMode::OnDate), &atlas).1, Redraw::None);
        assert_eq!(update(&idle, MapEvent::SetScale(ScaleMode::Linear), &atlas).1, Redraw::None);

        let (state, redraw) = update(&idle, MapEvent::SetTime(99), &atlas);
        assert_eq!(redraw, Redraw::Full);
        assert_eq!(state.t, 1);
        let (state, redraw) = update(&idle, MapEvent::SetScale(ScaleMode::Log), &atlas);
        assert_eq!(redraw, Redraw::Full);
        assert_eq!(state.scale, ScaleMode::Log);
    }

    #[test]
    fn test_region_without_step_value_is_no_data() {
        let atlas = atlas();
        let idle = ViewState::from_meta(atlas.meta());
        let state = apply(&idle, &[MapEvent::SetTime(1)], &atlas);
        let m = mapper(&state, &atlas);
        let fills = region_fills(&atlas, &state, &m);
        assert_eq!(fills[C], Fill::NoData);
        assert_eq!(fills[A], Fill::Color(m.color_for(80.0)));
        // and C can no longer be hovered
        let (_, redraw) = update(&state, MapEvent::PointerEnter { region: C, at: (0, 0) }, &atlas);
        assert_eq!(redraw, Redraw::None);
    }
}
