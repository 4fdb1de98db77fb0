//! Time slider, mode radio and scale toggle: geometry, hit testing and key bindings.
//!
//! Every control turns input into a [`MapEvent`]; the state machine decides
//! whether anything changed.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, ModifierKeyCode};
use ratatui::layout::{Position, Rect};

use crate::data::Meta;
use crate::interaction::{MapEvent, ViewState};
use crate::view::{ScaleMode, ViewMode};

/// First labelled step and spacing between labels
const FIRST_TICK: usize = 2;
const TICK_SPACING: usize = 14;

/// Steps that get a date label under the slider
pub fn tick_steps(steps: usize) -> Vec<usize> {
    (FIRST_TICK..steps).step_by(TICK_SPACING).collect()
}

/// Horizontal slider over `[0, steps - 1]`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeSlider {
    pub steps: usize,
    /// One row tall; the thumb moves along it
    pub track: Rect,
}

impl TimeSlider {
    pub fn new(steps: usize, track: Rect) -> Self {
        Self { steps, track }
    }

    pub fn last(&self) -> usize {
        self.steps.saturating_sub(1)
    }

    /// Column of the thumb for step `t`
    pub fn column_of(&self, t: usize) -> u16 {
        let span = self.track.width.saturating_sub(1) as f64;
        if self.last() == 0 {
            return self.track.x;
        }
        let ratio = t.min(self.last()) as f64 / self.last() as f64;
        self.track.x + (ratio * span).round() as u16
    }

    /// Step under a column, clamped to the track
    pub fn value_at(&self, column: u16) -> usize {
        let span = self.track.width.saturating_sub(1);
        if span == 0 || self.last() == 0 {
            return 0;
        }
        let offset = column.saturating_sub(self.track.x).min(span) as f64;
        (offset / span as f64 * self.last() as f64).round() as usize
    }

    /// `t` moved by `delta` steps, clamped
    pub fn step(&self, t: usize, delta: isize) -> usize {
        t.saturating_add_signed(delta).min(self.last())
    }

    pub fn hit(&self, column: u16, row: u16) -> Option<MapEvent> {
        self.track
            .contains(Position::new(column, row))
            .then(|| MapEvent::SetTime(self.value_at(column)))
    }
}

/// One row per offered mode
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModeRadio {
    pub modes: Vec<ViewMode>,
    pub area: Rect,
}

impl ModeRadio {
    pub fn new(modes: Vec<ViewMode>, area: Rect) -> Self {
        Self { modes, area }
    }

    /// Mode after `current` in display order, wrapping
    pub fn next(&self, current: ViewMode) -> ViewMode {
        let idx = self.modes.iter().position(|&m| m == current);
        match idx {
            Some(i) => self.modes[(i + 1) % self.modes.len()],
            None => self.modes.first().copied().unwrap_or(current),
        }
    }

    /// Mode for number key `n` (1-based)
    pub fn nth(&self, n: usize) -> Option<ViewMode> {
        n.checked_sub(1).and_then(|i| self.modes.get(i)).copied()
    }

    pub fn hit(&self, column: u16, row: u16) -> Option<MapEvent> {
        if !self.area.contains(Position::new(column, row)) {
            return None;
        }
        self.modes
            .get((row - self.area.y) as usize)
            .map(|&mode| MapEvent::SetMode(mode))
    }
}

/// Two options side by side: linear on the left, log on the right
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScaleToggle {
    pub area: Rect,
}

impl ScaleToggle {
    pub fn new(area: Rect) -> Self {
        Self { area }
    }

    pub fn hit(&self, column: u16, row: u16) -> Option<MapEvent> {
        if !self.area.contains(Position::new(column, row)) {
            return None;
        }
        let scale = if column < self.area.x + self.area.width / 2 {
            ScaleMode::Linear
        } else {
            ScaleMode::Log
        };
        Some(MapEvent::SetScale(scale))
    }
}

/// All filter controls, positioned for the current terminal size
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Controls {
    pub slider: TimeSlider,
    pub radio: ModeRadio,
    pub toggle: ScaleToggle,
}

impl Controls {
    pub fn new(meta: &Meta, slider: Rect, radio: Rect, toggle: Rect) -> Self {
        Self {
            slider: TimeSlider::new(meta.time_steps(), slider),
            radio: ModeRadio::new(meta.modes.clone(), radio),
            toggle: ScaleToggle::new(toggle),
        }
    }

    /// Event for a click at a terminal cell, if it lands on a control
    pub fn hit(&self, column: u16, row: u16) -> Option<MapEvent> {
        self.slider
            .hit(column, row)
            .or_else(|| self.radio.hit(column, row))
            .or_else(|| self.toggle.hit(column, row))
    }

    /// Event bound to a key, if any. Quit and zoom keys are handled by the app.
    pub fn key_event(&self, key: KeyEvent, state: &ViewState) -> Option<MapEvent> {
        if let KeyCode::Modifier(ModifierKeyCode::LeftShift | ModifierKeyCode::RightShift) = key.code {
            return match key.kind {
                KeyEventKind::Press => Some(MapEvent::ShiftDown),
                KeyEventKind::Release => Some(MapEvent::ShiftUp),
                KeyEventKind::Repeat => None,
            };
        }
        if key.kind == KeyEventKind::Release {
            return None;
        }

        let event = match key.code {
            KeyCode::Esc => MapEvent::Escape,
            KeyCode::Left | KeyCode::Char('h') => MapEvent::SetTime(self.slider.step(state.t, -1)),
            KeyCode::Right | KeyCode::Char('l') => MapEvent::SetTime(self.slider.step(state.t, 1)),
            KeyCode::Home => MapEvent::SetTime(0),
            KeyCode::End => MapEvent::SetTime(self.slider.last()),
            KeyCode::Char('m') => MapEvent::SetMode(self.radio.next(state.mode)),
            KeyCode::Char(c @ '1'..='9') => MapEvent::SetMode(self.radio.nth(c as usize - '0' as usize)?),
            KeyCode::Char('s') => MapEvent::SetScale(state.scale.toggled()),
            KeyCode::Char('d') => MapEvent::ToggleDirection,
            _ => return None,
        };
        Some(event)
    }
}
