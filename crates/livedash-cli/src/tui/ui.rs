//! TUI rendering: four server-driven slots in a 2x2 grid.
//!
//! ┌──────────────────────────────────────────────┐
//! │  livedash   mode: passive auto  ● polling    │
//! ├──────────────────────┬───────────────────────┤
//! │  slot 1 · roomTemp   │  slot 2 · powerSplit  │
//! │   ⡠⠔⠒⠤⣀⡀            │        ⣠⣶⣶⣄           │
//! ├──────────────────────┼───────────────────────┤
//! │  slot 3 · fanSpeed   │  slot 4 · camera      │
//! │   ▇ ▅ ▇ ▃            │   ▀▀▀▀▀▀▀▀            │
//! ├──────────────────────┴───────────────────────┤
//! │  set ▸ Fan Speed (2/3)   value: 12_          │
//! ├──────────────────────────────────────────────┤
//! │  m: mode  r: refresh  ↑↓: metric  tab: edit  │
//! └──────────────────────────────────────────────┘

use ratatui::{
    prelude::*,
    widgets::{
        canvas::{Canvas, Context, Line as CanvasLine, Points},
        *,
    },
};

use livedash_core::{
    ChartMeta, ChartShape, DashState, DecodedImage, Element, InputHint, Slot, SlotContent,
    Transport, Wedge,
};

use super::app::{App, Focus};

pub fn draw<T: Transport + 'static>(f: &mut Frame, app: &App<T>) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // title
            Constraint::Min(10),   // slots
            Constraint::Length(3), // mutation form
            Constraint::Length(1), // keys
        ])
        .split(f.area());

    let dash = app.dashboard();
    let st = dash.state();
    draw_title(f, rows[0], &st, &dash.config().base_url);
    draw_grid(f, rows[1], &st);
    draw_form(f, rows[2], &st, app.focus());
    draw_keys(f, rows[3], &st, app.focus());
}

fn draw_title(f: &mut Frame, area: Rect, st: &DashState, base_url: &str) {
    let controller = st.controller();
    let (dot, loop_label, loop_style) = if controller.is_looping() {
        ("●", "polling", Style::default().fg(Color::Green))
    } else {
        ("○", "idle", Style::default().fg(Color::DarkGray))
    };
    let degraded = st.degraded().len();
    let degraded_note = if degraded > 0 {
        format!("  {degraded} hidden")
    } else {
        String::new()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Line::from(vec![
            Span::styled(" livedash ", Style::default().bold().fg(Color::Cyan)),
            Span::raw("  mode: "),
            Span::styled(controller.mode().label(), Style::default().bold().fg(Color::Yellow)),
            Span::styled(format!("  {dot} {loop_label}"), loop_style),
            Span::styled(
                format!("  {base_url}  #{}{degraded_note} ", st.fetches_completed()),
                Style::default().fg(Color::DarkGray),
            ),
        ]));

    f.render_widget(block, area);
}

fn draw_grid(f: &mut Frame, area: Rect, st: &DashState) {
    let halves = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let slots = st.renderer().slots();
    for (row, half) in halves.iter().enumerate() {
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(*half);
        for (col, cell) in cells.iter().enumerate() {
            if let Some(slot) = slots.get(row * 2 + col) {
                draw_slot(f, *cell, slot);
            }
        }
    }
}

fn draw_slot(f: &mut Frame, area: Rect, slot: &Slot) {
    if !slot.is_region_visible() {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(format!(" {} ", slot.id()));
        f.render_widget(block, area);
        return;
    }

    let name = slot.metric().unwrap_or("-");
    let mut title = format!(" {} · {name} ", slot.id());
    if let SlotContent::Chart(ChartMeta {
        labels: Some(labels),
        ..
    }) = slot.content()
    {
        title = format!(" {} · {name}  ({} / {}) ", slot.id(), labels.vertical, labels.horizontal);
    }
    let block = Block::default().borders(Borders::ALL).title(title);

    match slot.content() {
        SlotContent::Empty => f.render_widget(block, area),
        SlotContent::Text(text) => {
            let p = Paragraph::new(text.as_str())
                .style(Style::default().bold())
                .wrap(Wrap { trim: true })
                .block(block);
            f.render_widget(p, area);
        }
        SlotContent::Image(image) => {
            let inner = block.inner(area);
            f.render_widget(block, area);
            f.render_widget(HalfBlocks(image), inner);
        }
        SlotContent::Chart(meta) => {
            let inner = block.inner(area);
            let (x_bounds, y_bounds) = canvas_bounds(meta, inner);
            let elements = slot.elements();
            let shape = meta.shape;
            let canvas = Canvas::default()
                .block(block)
                .marker(symbols::Marker::Braille)
                .x_bounds(x_bounds)
                .y_bounds(y_bounds)
                .paint(move |ctx| paint_elements(ctx, elements, shape, x_bounds, y_bounds));
            f.render_widget(canvas, area);
        }
    }
}

fn paint_elements(
    ctx: &mut Context,
    elements: &[Element],
    shape: ChartShape,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
) {
    for element in elements {
        match element {
            Element::Wedge { wedge, color } => {
                let coords = pie_points(wedge);
                ctx.draw(&Points {
                    coords: &coords,
                    color: Color::Rgb(color[0], color[1], color[2]),
                });
            }
            Element::Segment(s) => ctx.draw(&CanvasLine {
                x1: s.from.0,
                y1: s.from.1,
                x2: s.to.0,
                y2: s.to.1,
                color: Color::Cyan,
            }),
            Element::Marker(p) => ctx.draw(&Points {
                coords: &[(p.x, p.y)],
                color: Color::White,
            }),
            Element::Bar(b) => {
                let left = b.x - b.width / 2.0;
                for i in 0..=BAR_FILL_STEPS {
                    let x = left + b.width * i as f64 / BAR_FILL_STEPS as f64;
                    ctx.draw(&CanvasLine {
                        x1: x,
                        y1: b.bottom,
                        x2: x,
                        y2: b.bottom + b.height,
                        color: Color::Yellow,
                    });
                }
            }
            Element::XTick(t) => {
                ctx.print(t.position, y_bounds[0], Span::styled(t.text.clone(), Color::DarkGray));
            }
            Element::YTick(t) => {
                ctx.print(x_bounds[0], t.position, Span::styled(t.text.clone(), Color::DarkGray));
            }
        }
    }
    if shape != ChartShape::Pie {
        // Axes are drawn last so tick labels sit beside them.
        ctx.layer();
        ctx.draw(&CanvasLine {
            x1: 0.0,
            y1: 0.0,
            x2: x_bounds[1],
            y2: 0.0,
            color: Color::DarkGray,
        });
        ctx.draw(&CanvasLine {
            x1: 0.0,
            y1: 0.0,
            x2: 0.0,
            y2: y_bounds[1],
            color: Color::DarkGray,
        });
    }
}

const BAR_FILL_STEPS: usize = 6;

/// Canvas bounds for a chart. Pies keep braille dots square so circles stay
/// round; cartesian charts reserve a margin for tick labels.
fn canvas_bounds(meta: &ChartMeta, inner: Rect) -> ([f64; 2], [f64; 2]) {
    match meta.shape {
        ChartShape::Pie => {
            // Braille packs 2x4 dots into each cell.
            let dots_x = f64::from(inner.width.max(1)) * 2.0;
            let dots_y = f64::from(inner.height.max(1)) * 4.0;
            if dots_x >= dots_y {
                let half_x = PIE_RADIUS * dots_x / dots_y;
                ([-half_x, half_x], [-PIE_RADIUS, PIE_RADIUS])
            } else {
                let half_y = PIE_RADIUS * dots_y / dots_x;
                ([-PIE_RADIUS, PIE_RADIUS], [-half_y, half_y])
            }
        }
        ChartShape::Line | ChartShape::Bar => (
            [-meta.graph_width * 0.18, meta.graph_width],
            [-meta.graph_height * 0.12, meta.graph_height * 1.02],
        ),
    }
}

/// Half-extent of the short canvas axis around a unit pie.
const PIE_RADIUS: f64 = 1.15;

/// Dots filling one wedge. Angle 0 is 12 o'clock; negative sweeps run clockwise.
pub fn pie_points(wedge: &Wedge) -> Vec<(f64, f64)> {
    let sweep = wedge.sweep_deg();
    if sweep == 0.0 {
        return Vec::new();
    }
    let steps = (sweep.abs() / 1.5).ceil().max(1.0) as usize;
    let mut coords = Vec::with_capacity(steps * PIE_RINGS);
    for s in 0..=steps {
        let deg = 90.0 + wedge.start_angle_deg + sweep * s as f64 / steps as f64;
        let (sin, cos) = deg.to_radians().sin_cos();
        for r in 1..=PIE_RINGS {
            let radius = r as f64 / PIE_RINGS as f64;
            coords.push((radius * cos, radius * sin));
        }
    }
    coords
}

const PIE_RINGS: usize = 24;

/// Image drawn with upper-half blocks: two pixel rows per terminal cell.
struct HalfBlocks<'a>(&'a DecodedImage);

impl Widget for HalfBlocks<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.is_empty() || self.0.width == 0 || self.0.height == 0 {
            return;
        }
        for row in 0..area.height {
            for col in 0..area.width {
                let (top, bottom) = sample_cell(self.0, col, row, area.width, area.height);
                if let Some(cell) = buf.cell_mut((area.x + col, area.y + row)) {
                    cell.set_char('▀').set_fg(top).set_bg(bottom);
                }
            }
        }
    }
}

/// Nearest-neighbour colours for the top and bottom half of one cell.
fn sample_cell(image: &DecodedImage, col: u16, row: u16, cols: u16, rows: u16) -> (Color, Color) {
    let px = |x: u32, y: u32| {
        let p = image.pixels.get_pixel(x.min(image.width - 1), y.min(image.height - 1));
        Color::Rgb(p[0], p[1], p[2])
    };
    let x = u32::from(col) * image.width / u32::from(cols);
    let pixel_rows = u32::from(rows) * 2;
    let y_top = u32::from(row) * 2 * image.height / pixel_rows;
    let y_bottom = (u32::from(row) * 2 + 1) * image.height / pixel_rows;
    (px(x, y_top), px(x, y_bottom))
}

fn draw_form(f: &mut Frame, area: Rect, st: &DashState, focus: Focus) {
    let options = st.options();
    let border = if focus == Focus::Input {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(" Change value ");

    let mut spans = Vec::new();
    match st.selected().and_then(|k| options.get(k).map(|o| (k, o))) {
        Some((k, option)) => {
            spans.push(Span::raw(" set ▸ "));
            spans.push(Span::styled(
                option.label.as_str(),
                Style::default().bold().fg(Color::Cyan),
            ));
            spans.push(Span::styled(
                format!(" ({}/{})", k + 1, options.len()),
                Style::default().fg(Color::DarkGray),
            ));
            let cursor = if focus == Focus::Input { "_" } else { "" };
            spans.push(Span::raw(format!("   value: {}{cursor}", st.input())));
            spans.push(Span::styled(
                format!("  [{}]", hint_label(st.input_hint())),
                Style::default().fg(Color::DarkGray),
            ));
        }
        None => spans.push(Span::styled(
            " no modifiable metrics",
            Style::default().fg(Color::DarkGray),
        )),
    }
    if let Some(status) = st.status() {
        let style = if status.starts_with("mutation failed") {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::Green)
        };
        spans.push(Span::styled(format!("   {status}"), style));
    }

    f.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn hint_label(hint: InputHint) -> &'static str {
    match hint {
        InputHint::Decimal => "decimal",
        InputHint::Integer => "integer",
        InputHint::Standard => "text",
    }
}

fn draw_keys(f: &mut Frame, area: Rect, st: &DashState, focus: Focus) {
    let text = match focus {
        Focus::Input => " type value   enter: submit   ↑↓: metric   ⌫: delete   esc: back",
        Focus::Controls if st.controller().manual_controls_visible() => {
            " m/1-3: mode   r: refresh   ↑↓: metric   tab: edit value   q: quit"
        }
        Focus::Controls => " m/1-3: mode   ↑↓: metric   tab: edit value   q: quit",
    };
    let bar = Paragraph::new(text).style(Style::default().bg(Color::DarkGray).fg(Color::White));
    f.render_widget(bar, area);
}
