use crate::app::App;
use crate::controls::tick_steps;
use crate::map::{Fill, Legend, OutlineColor, Pixel, PixelCanvas, Rgb, Swatch, NEUTRAL};
use crate::tooltip::{line_text, tooltip_lines};
use crate::view::{Direction, ScaleMode};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
    Frame,
};

/// Width of the right-hand panel (radio, toggle, legend)
const SIDE_WIDTH: u16 = 24;
/// Slider block: border, track, labels, border
const SLIDER_HEIGHT: u16 = 4;

/// Hatch colors for regions without data
const HATCH_DARK: Rgb = Rgb::new(0x9a, 0x9a, 0x9a);
const HATCH_LIGHT: Rgb = Rgb::new(0xdc, 0xdc, 0xdc);
const OUTLINE_BLACK: Rgb = Rgb::new(0x10, 0x10, 0x10);
const OUTLINE_GREY: Rgb = Rgb::new(0x80, 0x80, 0x80);

/// Where everything sits on screen. Shared by drawing and hit testing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScreenLayout {
    pub map: Rect,
    /// Map pixels: one column wide, two per row
    pub map_inner: Rect,
    pub radio_block: Rect,
    pub radio: Rect,
    pub toggle_block: Rect,
    pub toggle: Rect,
    pub legend: Rect,
    pub slider_block: Rect,
    pub slider_track: Rect,
    pub slider_labels: Rect,
    pub status: Rect,
}

impl ScreenLayout {
    pub fn new(area: Rect, mode_count: usize) -> Self {
        let [body, slider_block, status] = Layout::vertical([
            Constraint::Min(5),
            Constraint::Length(SLIDER_HEIGHT),
            Constraint::Length(1),
        ])
        .areas(area);
        let [map, side] = Layout::horizontal([Constraint::Min(10), Constraint::Length(SIDE_WIDTH)]).areas(body);
        let [radio_block, toggle_block, legend] = Layout::vertical([
            Constraint::Length(mode_count as u16 + 2),
            Constraint::Length(3),
            Constraint::Min(3),
        ])
        .areas(side);

        let inner = |r: Rect| r.inner(Margin::new(1, 1));
        let slider_inner = inner(slider_block);
        // Leave room for half a date label at either end of the track
        let track = slider_inner.inner(Margin::new(4.min(slider_inner.width / 4), 0));

        Self {
            map,
            map_inner: inner(map),
            radio_block,
            radio: inner(radio_block),
            toggle_block,
            toggle: inner(toggle_block),
            legend,
            slider_block,
            slider_track: Rect { height: 1.min(track.height), ..track },
            slider_labels: Rect {
                y: track.y.saturating_add(1),
                height: track.height.saturating_sub(1).min(1),
                ..track
            },
            status,
        }
    }

    /// Map size in pixels
    pub fn map_pixels(&self) -> (usize, usize) {
        (self.map_inner.width as usize, self.map_inner.height as usize * 2)
    }

    /// Top pixel of the map cell at a terminal position
    pub fn map_pixel(&self, column: u16, row: u16) -> Option<(usize, usize)> {
        let r = self.map_inner;
        if column < r.x || row < r.y || column >= r.x + r.width || row >= r.y + r.height {
            return None;
        }
        Some(((column - r.x) as usize, (row - r.y) as usize * 2))
    }
}

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let layout = app.layout;
    render_map(frame, app, &layout);
    render_radio(frame, app, &layout);
    render_toggle(frame, app, &layout);
    render_legend(frame, &app.legend, layout.legend);
    render_slider(frame, app, &layout);
    render_status_bar(frame, app, layout.status);
    render_tooltip(frame, app);
}

fn panel(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
}

fn render_map(frame: &mut Frame, app: &App, layout: &ScreenLayout) {
    let title = match app.state.selected {
        Some(id) => format!("Flows: {}", app.atlas.name(id)),
        None => "Denmark".to_string(),
    };
    frame.render_widget(panel(&title), layout.map);
    frame.render_widget(MapWidget { canvas: &app.canvas }, layout.map_inner);
}

/// Color of one map pixel; `None` leaves the terminal background
fn pixel_color(pixel: Pixel, x: usize, y: usize) -> Option<Rgb> {
    match pixel {
        Pixel::Empty => None,
        Pixel::Fill(Fill::Color(c)) => Some(c),
        Pixel::Fill(Fill::Neutral) => Some(NEUTRAL),
        Pixel::Fill(Fill::NoData) => Some(hatch(x, y)),
        Pixel::Outline(OutlineColor::Black) => Some(OUTLINE_BLACK),
        Pixel::Outline(OutlineColor::Grey) => Some(OUTLINE_GREY),
    }
}

/// Diagonal stripes
fn hatch(x: usize, y: usize) -> Rgb {
    if (x + y) % 4 == 0 {
        HATCH_DARK
    } else {
        HATCH_LIGHT
    }
}

/// Half-block renderer: the upper pixel is the glyph, the lower one the background
struct MapWidget<'a> {
    canvas: &'a PixelCanvas,
}

impl Widget for MapWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let rows = (self.canvas.height() / 2).min(area.height as usize);
        let cols = self.canvas.width().min(area.width as usize);
        for row in 0..rows {
            for col in 0..cols {
                let top = pixel_color(self.canvas.get(col, row * 2), col, row * 2);
                let bottom = pixel_color(self.canvas.get(col, row * 2 + 1), col, row * 2 + 1);
                let cell = &mut buf[(area.x + col as u16, area.y + row as u16)];
                match (top, bottom) {
                    (None, None) => {}
                    (Some(t), Some(b)) => {
                        cell.set_char('▀').set_fg(t.into()).set_bg(b.into());
                    }
                    (Some(t), None) => {
                        cell.set_char('▀').set_fg(t.into());
                    }
                    (None, Some(b)) => {
                        cell.set_char('▄').set_fg(b.into());
                    }
                }
            }
        }
    }
}

fn option_style(active: bool) -> Style {
    if active {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    }
}

fn render_radio(frame: &mut Frame, app: &App, layout: &ScreenLayout) {
    frame.render_widget(panel("View"), layout.radio_block);
    let lines: Vec<Line> = app
        .controls
        .radio
        .modes
        .iter()
        .enumerate()
        .map(|(i, &mode)| {
            let active = mode == app.state.mode;
            Line::from(vec![
                Span::styled(if active { "(•) " } else { "( ) " }, option_style(active)),
                Span::styled(mode.label(), option_style(active)),
                Span::styled(format!("  {}", i + 1), Style::default().fg(Color::DarkGray)),
            ])
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), layout.radio);
}

fn render_toggle(frame: &mut Frame, app: &App, layout: &ScreenLayout) {
    frame.render_widget(panel("Scale"), layout.toggle_block);
    let half = (layout.toggle.width / 2) as usize;
    let option = |scale: ScaleMode| {
        let active = app.state.scale == scale;
        let mark = if active { "(•) " } else { "( ) " };
        Span::styled(format!("{mark}{:<w$}", scale.label(), w = half.saturating_sub(4)), option_style(active))
    };
    let line = Line::from(vec![option(ScaleMode::Linear), option(ScaleMode::Log)]);
    frame.render_widget(Paragraph::new(line), layout.toggle);
}

fn render_legend(frame: &mut Frame, legend: &Legend, area: Rect) {
    let block = panel(&legend.title);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines: Vec<Line> = legend
        .entries
        .iter()
        .map(|entry| {
            let swatch = match entry.swatch {
                Swatch::Color(c) => Span::styled("██", Style::default().fg(c.into())),
                Swatch::NoData => Span::styled(
                    "▚▚",
                    Style::default().fg(HATCH_DARK.into()).bg(HATCH_LIGHT.into()),
                ),
            };
            Line::from(vec![swatch, Span::raw(" "), Span::raw(entry.label.as_str())])
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_slider(frame: &mut Frame, app: &App, layout: &ScreenLayout) {
    let meta = app.atlas.meta();
    let title = format!("Date: {}", meta.date_label(app.state.t));
    frame.render_widget(panel(&title), layout.slider_block);

    let slider = &app.controls.slider;
    let track = layout.slider_track;
    if track.width == 0 || track.height == 0 {
        return;
    }
    let buf = frame.buffer_mut();
    let rail = Style::default().fg(Color::DarkGray);
    for x in track.x..track.x + track.width {
        buf[(x, track.y)].set_char('─').set_style(rail);
    }
    let thumb = slider.column_of(app.state.t);
    buf[(thumb, track.y)]
        .set_char('●')
        .set_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let labels = layout.slider_labels;
    if labels.height == 0 {
        return;
    }
    let area = frame.area();
    let buf = frame.buffer_mut();
    let mut next_free = 0u16;
    for t in tick_steps(slider.steps) {
        let column = slider.column_of(t);
        buf[(column, track.y)].set_char('┼').set_style(rail);
        let label = meta.date_label(t);
        let width = label.chars().count() as u16;
        let start = column.saturating_sub(width / 2).max(next_free);
        if start + width > area.x + area.width {
            break;
        }
        buf.set_string(start, labels.y, &label, Style::default().fg(Color::Gray));
        next_free = start + width + 1;
    }
    // Thumb stays on top of tick marks
    buf[(thumb, track.y)]
        .set_char('●')
        .set_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let meta = app.atlas.meta();
    let direction = match app.state.direction {
        Direction::Forward => "from selection",
        Direction::Reverse => "to selection",
    };
    let value = Style::default().fg(Color::Yellow);
    let sep = Style::default().fg(Color::DarkGray);

    let status = Line::from(vec![
        Span::styled(" ", sep),
        Span::styled(meta.date_long(app.state.t), value),
        Span::styled(" | ", sep),
        Span::styled(app.state.mode.label(), Style::default().fg(Color::Cyan)),
        Span::styled(" | ", sep),
        Span::styled(app.state.scale.label(), Style::default().fg(Color::Magenta)),
        Span::styled(" | ", sep),
        Span::styled(direction, Style::default().fg(Color::Green)),
        Span::styled(" | ", sep),
        Span::styled(app.zoom_level(), value),
        Span::styled(
            " | ←/→:date m:mode s:scale d/shift:direction click:select esc:clear scroll:zoom r:reset q:quit",
            sep,
        ),
    ]);

    frame.render_widget(Paragraph::new(status), area);
}

fn render_tooltip(frame: &mut Frame, app: &App) {
    let Some(tooltip) = app.state.tooltip else {
        return;
    };
    let lines = tooltip_lines(&app.atlas, &app.state, tooltip.kind);
    let width = lines.iter().map(|l| line_text(l).chars().count()).max().unwrap_or(0) as u16 + 2;
    let height = lines.len() as u16 + 2;
    let area = tooltip_area(frame.area(), tooltip.anchor, width, height);

    let text: Vec<Line> = lines
        .iter()
        .map(|line| {
            Line::from(
                line.iter()
                    .map(|seg| {
                        let style = if seg.strong {
                            Style::default().add_modifier(Modifier::BOLD)
                        } else {
                            Style::default()
                        };
                        Span::styled(seg.text.as_str(), style)
                    })
                    .collect::<Vec<_>>(),
            )
        })
        .collect();

    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(text).block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Gray))),
        area,
    );
}

/// Box below and right of the pointer, flipped to stay on screen
fn tooltip_area(screen: Rect, anchor: (u16, u16), width: u16, height: u16) -> Rect {
    let width = width.min(screen.width);
    let height = height.min(screen.height);
    let (col, row) = anchor;
    let right = screen.x + screen.width;
    let bottom = screen.y + screen.height;

    let x = if col + 2 + width <= right {
        col + 2
    } else {
        col.saturating_sub(width + 1).max(screen.x)
    };
    let y = if row + 1 + height <= bottom {
        row + 1
    } else {
        row.saturating_sub(height).max(screen.y)
    };
    // Anchors can be stale after a resize
    let x = x.min(right - width);
    let y = y.min(bottom - height);
    Rect::new(x, y, width, height)
}
