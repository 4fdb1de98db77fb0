use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use tracing::debug;

use crate::controls::Controls;
use crate::data::Atlas;
use crate::interaction::{region_fills, update, MapEvent, Redraw, ViewState};
use crate::map::{ColorMapper, Fill, Legend, MapRenderer, PixelCanvas, RegionId, ZoomTransform};
use crate::ui::ScreenLayout;

/// Left button held since the last press
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Drag {
    /// Started on the map; a release without movement is a click
    Map { last: (u16, u16), moved: bool },
    Slider,
}

/// Application state
pub struct App {
    pub atlas: Atlas,
    pub state: ViewState,
    pub mapper: ColorMapper,
    pub legend: Legend,
    pub renderer: MapRenderer,
    pub layout: ScreenLayout,
    pub controls: Controls,
    /// Last composed frame
    pub canvas: PixelCanvas,
    fills: Vec<Fill>,
    /// Last pointer position, for re-hit-testing after the map moves
    pointer: Option<(u16, u16)>,
    /// Region under the pointer, whether or not it has data
    pointer_region: Option<RegionId>,
    drag: Option<Drag>,
    pub should_quit: bool,
}

impl App {
    pub fn new(atlas: Atlas, width: u16, height: u16) -> Result<Self> {
        let meta = atlas.meta();
        let state = ViewState::from_meta(meta);
        let mapper = ColorMapper::new(state.mode, meta.in_max, state.scale);
        let legend = Legend::build(&mapper, meta.in_max, meta.legend_title(state.mode));
        let layout = ScreenLayout::new(Rect::new(0, 0, width, height), meta.modes.len());
        let controls = Controls::new(meta, layout.slider_track, layout.radio, layout.toggle);
        let (px, py) = layout.map_pixels();
        let renderer = MapRenderer::new(&atlas.regions, px, py)?;

        let mut app = Self {
            atlas,
            state,
            mapper,
            legend,
            renderer,
            layout,
            controls,
            canvas: PixelCanvas::new(px, py),
            fills: Vec::new(),
            pointer: None,
            pointer_region: None,
            drag: None,
            should_quit: false,
        };
        app.refresh_fills();
        Ok(app)
    }

    /// Run an event through the state machine and redraw what it invalidated
    pub fn dispatch(&mut self, event: MapEvent) -> Redraw {
        let (next, redraw) = update(&self.state, event, &self.atlas);
        self.state = next;
        match redraw {
            Redraw::None => {}
            Redraw::Refresh => self.refresh_fills(),
            Redraw::Full => {
                let meta = self.atlas.meta();
                self.mapper.set_domain(self.state.mode, meta.in_max, self.state.scale);
                self.legend = Legend::build(&self.mapper, meta.in_max, meta.legend_title(self.state.mode));
                self.refresh_fills();
                self.reenter_pointer();
            }
        }
        if redraw != Redraw::None {
            debug!(?event, ?redraw, t = self.state.t, mode = %self.state.mode, "state updated");
        }
        redraw
    }

    fn refresh_fills(&mut self) {
        self.fills = region_fills(&self.atlas, &self.state, &self.mapper);
        self.recompose();
    }

    fn recompose(&mut self) {
        self.canvas = self.renderer.render(&self.fills, &self.state.highlights);
    }

    /// Region geometry moved under the pointer
    fn geometry_changed(&mut self) {
        self.recompose();
        if let Some((column, row)) = self.pointer {
            self.pointer_moved(column, row);
        }
    }

    /// Update viewport size when terminal resizes
    pub fn resize(&mut self, width: u16, height: u16) {
        let meta = self.atlas.meta();
        self.layout = ScreenLayout::new(Rect::new(0, 0, width, height), meta.modes.len());
        self.controls = Controls::new(meta, self.layout.slider_track, self.layout.radio, self.layout.toggle);
        let (px, py) = self.layout.map_pixels();
        self.renderer.resize(&self.atlas.regions, px, py);
        self.geometry_changed();
    }

    /// Region drawn in a terminal cell (either half)
    pub fn region_under(&self, column: u16, row: u16) -> Option<RegionId> {
        let (x, y) = self.layout.map_pixel(column, row)?;
        self.renderer
            .region_at(x, y)
            .or_else(|| self.renderer.region_at(x, y + 1))
    }

    /// Turn pointer motion into enter/move/leave events
    fn pointer_moved(&mut self, column: u16, row: u16) {
        self.pointer = Some((column, row));
        let region = self.region_under(column, row);
        let at = (column, row);
        if region == self.pointer_region {
            if let Some(region) = region {
                self.dispatch(MapEvent::PointerMove { region, at });
            }
            return;
        }
        if let Some(old) = self.pointer_region.take() {
            self.dispatch(MapEvent::PointerLeave { region: old });
        }
        if let Some(region) = region {
            self.dispatch(MapEvent::PointerEnter { region, at });
        }
        self.pointer_region = region;
    }

    /// A full redraw drops hover outlines and can change which regions have
    /// data, so the region under the pointer is entered afresh
    fn reenter_pointer(&mut self) {
        let Some((column, row)) = self.pointer else {
            return;
        };
        let region = self.region_under(column, row);
        if region != self.pointer_region {
            return self.pointer_moved(column, row);
        }
        if let Some(region) = region {
            self.dispatch(MapEvent::PointerEnter { region, at: (column, row) });
        }
    }

    fn zoom_at(&mut self, x: f64, y: f64, factor: f64) {
        self.renderer.zoom_at(&self.atlas.regions, x, y, factor);
        self.geometry_changed();
    }

    /// Zoom towards a terminal cell
    pub fn zoom_at_cell(&mut self, column: u16, row: u16, factor: f64) {
        if let Some((x, y)) = self.layout.map_pixel(column, row) {
            self.zoom_at(x as f64, y as f64, factor);
        }
    }

    /// Zoom towards the middle of the map
    pub fn zoom_center(&mut self, factor: f64) {
        let (w, h) = self.layout.map_pixels();
        self.zoom_at(w as f64 / 2.0, h as f64 / 2.0, factor);
    }

    /// Pan by a number of map pixels
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.renderer.pan(&self.atlas.regions, dx, dy);
        self.geometry_changed();
    }

    pub fn reset_zoom(&mut self) {
        self.renderer.reset_zoom(&self.atlas.regions);
        self.geometry_changed();
    }

    /// Request quit
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Get current zoom level as a string
    pub fn zoom_level(&self) -> String {
        format!("{:.1}x", self.renderer.zoom.k)
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Press {
            match key.code {
                KeyCode::Char('q') => return self.quit(),
                KeyCode::Char('+') | KeyCode::Char('=') => return self.zoom_center(ZoomTransform::STEP),
                KeyCode::Char('-') | KeyCode::Char('_') => return self.zoom_center(1.0 / ZoomTransform::STEP),
                KeyCode::Char('r') => return self.reset_zoom(),
                _ => {}
            }
        }
        if let Some(event) = self.controls.key_event(key, &self.state) {
            self.dispatch(event);
        }
    }

    /// Handle mouse events for hover, selection, controls, panning and zooming
    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        let (column, row) = (mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Moved => self.pointer_moved(column, row),
            MouseEventKind::ScrollUp => self.zoom_at_cell(column, row, ZoomTransform::STEP),
            MouseEventKind::ScrollDown => self.zoom_at_cell(column, row, 1.0 / ZoomTransform::STEP),
            MouseEventKind::Down(MouseButton::Left) => {
                self.pointer = Some((column, row));
                if let Some(event) = self.controls.hit(column, row) {
                    if matches!(event, MapEvent::SetTime(_)) {
                        self.drag = Some(Drag::Slider);
                    }
                    self.dispatch(event);
                } else if self.layout.map_pixel(column, row).is_some() {
                    self.drag = Some(Drag::Map {
                        last: (column, row),
                        moved: false,
                    });
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => match self.drag {
                Some(Drag::Slider) => {
                    self.pointer = Some((column, row));
                    let t = self.controls.slider.value_at(column);
                    self.dispatch(MapEvent::SetTime(t));
                }
                Some(Drag::Map { last, .. }) => {
                    let dx = column as f64 - last.0 as f64;
                    // Rows are two pixels tall
                    let dy = (row as f64 - last.1 as f64) * 2.0;
                    self.drag = Some(Drag::Map {
                        last: (column, row),
                        moved: true,
                    });
                    self.pointer = Some((column, row));
                    self.pan(dx, dy);
                }
                None => {}
            },
            MouseEventKind::Up(MouseButton::Left) => {
                if let Some(Drag::Map { moved: false, .. }) = self.drag {
                    if let Some(region) = self.region_under(column, row) {
                        self.dispatch(MapEvent::Click {
                            region,
                            at: (column, row),
                        });
                    }
                }
                self.drag = None;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::generate_demo;
    use crate::map::OutlineColor;
    use crossterm::event::KeyModifiers;

    fn app() -> App {
        App::new(generate_demo(), 120, 40).unwrap()
    }

    /// A terminal cell showing `name`
    fn cell_of(app: &App, name: &str) -> (u16, u16) {
        let id = app.atlas.region_id(name).unwrap();
        let (w, h) = app.layout.map_pixels();
        for y in (0..h).step_by(2) {
            for x in 0..w {
                let hit = app.renderer.region_at(x, y).or_else(|| app.renderer.region_at(x, y + 1));
                if hit == Some(id) {
                    return (app.layout.map_inner.x + x as u16, app.layout.map_inner.y + (y / 2) as u16);
                }
            }
        }
        panic!("{name} not on screen");
    }

    fn mouse(kind: MouseEventKind, (column, row): (u16, u16)) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn click(app: &mut App, at: (u16, u16)) {
        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), at));
        app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), at));
    }

    #[test]
    fn test_hover_enter_and_leave() {
        let mut app = app();
        let aarhus = cell_of(&app, "Aarhus");
        app.handle_mouse(mouse(MouseEventKind::Moved, aarhus));
        let id = app.atlas.region_id("Aarhus");
        assert_eq!(app.state.hovering, id);
        assert!(app.canvas.count(crate::map::Pixel::Outline(OutlineColor::Black)) > 0);

        app.handle_mouse(mouse(MouseEventKind::Moved, (0, 0)));
        assert_eq!(app.state.hovering, None);
        assert!(app.state.highlights.is_empty());
    }

    #[test]
    fn test_tooltip_hidden_after_escape_and_leave() {
        let mut app = app();
        let odense = cell_of(&app, "Odense");
        let id = app.atlas.region_id("Odense");
        app.handle_mouse(mouse(MouseEventKind::Moved, odense));
        app.handle_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE));
        // Still under the pointer, so it is hovered again
        assert_eq!(app.state.hovering, id);
        assert_eq!(app.state.highlights.len(), 1);

        app.handle_mouse(mouse(MouseEventKind::Moved, odense));
        assert!(app.state.tooltip.is_some());
        app.handle_mouse(mouse(MouseEventKind::Moved, (0, 0)));
        assert_eq!(app.state.hovering, None);
        assert_eq!(app.state.tooltip, None);
        assert!(app.state.highlights.is_empty());
    }

    #[test]
    fn test_click_selects_region() {
        let mut app = app();
        let odense = cell_of(&app, "Odense");
        app.handle_mouse(mouse(MouseEventKind::Moved, odense));
        click(&mut app, odense);
        assert_eq!(app.state.selected, app.atlas.region_id("Odense"));
        click(&mut app, odense);
        assert_eq!(app.state.selected, None);
    }

    #[test]
    fn test_region_without_data_is_inert() {
        let mut app = app();
        let laeso = cell_of(&app, "Læsø");
        app.handle_mouse(mouse(MouseEventKind::Moved, laeso));
        click(&mut app, laeso);
        assert_eq!(app.state.selected, None);
        assert_eq!(app.state.hovering, None);
    }

    #[test]
    fn test_drag_pans_instead_of_clicking() {
        let mut app = app();
        let odense = cell_of(&app, "Odense");
        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), odense));
        app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), (odense.0 + 3, odense.1)));
        app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), (odense.0 + 3, odense.1)));
        assert_eq!(app.state.selected, None);
        assert_eq!(app.renderer.zoom.translate.x, 3.0);
    }

    #[test]
    fn test_full_redraw_rebuilds_legend() {
        let mut app = app();
        let before = app.legend.clone();
        let redraw = app.handle_key_for_test(KeyCode::Char('3'));
        assert_eq!(redraw, Some(Redraw::Full));
        assert_ne!(app.legend, before);
        assert_eq!(app.legend.title, "Change");
        assert_eq!(app.legend.entries[1].label, "-100%");
    }

    #[test]
    fn test_slider_click_sets_time() {
        let mut app = app();
        let track = app.layout.slider_track;
        click(&mut app, (track.x, track.y));
        assert_eq!(app.state.t, 0);
        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), (track.x, track.y)));
        app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), (track.x + track.width - 1, track.y)));
        assert_eq!(app.state.t, app.atlas.meta().time_steps() - 1);
    }

    #[test]
    fn test_scroll_zooms_and_clamps() {
        let mut app = app();
        let inner = app.layout.map_inner;
        let at = mouse(MouseEventKind::ScrollUp, (inner.x + 5, inner.y + 5));
        for _ in 0..10 {
            app.handle_mouse(at);
        }
        assert_eq!(app.renderer.zoom.k, ZoomTransform::MAX_SCALE);
        app.handle_key(KeyEvent::new(KeyCode::Char('r'), KeyModifiers::NONE));
        assert!(app.renderer.zoom.is_identity());
    }

    impl App {
        fn handle_key_for_test(&mut self, code: KeyCode) -> Option<Redraw> {
            let event = self.controls.key_event(KeyEvent::new(code, KeyModifiers::NONE), &self.state)?;
            Some(self.dispatch(event))
        }
    }
}
