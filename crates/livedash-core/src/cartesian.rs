//! Auto-scaled layout shared by line and bar charts.
//!
//! Only the most recent `max_visible` values are drawn. The vertical range is
//! fitted to that window with 20% padding above and below, and near-flat
//! windows are stretched to a fixed span so noise is not blown up to full
//! height.
//!
//! Coordinates are graph-local: `x` grows right from 0 to `graph_width`,
//! `y` grows up from 0 to `graph_height`.

/// Values kept in the visible window unless configured otherwise.
pub const DEFAULT_MAX_VISIBLE: usize = 10;

/// A window whose spread is below this is treated as flat.
pub const FLAT_THRESHOLD: f64 = 0.5;

/// Span used in place of the true spread for flat windows.
pub const FLAT_SPAN: f64 = 5.0;

/// Headroom and footroom as a fraction of the spread.
pub const PADDING_RATIO: f64 = 0.2;

/// Line charts always split the y axis into this many intervals.
pub const LINE_Y_SEPARATORS: usize = 5;

/// Thickness of the segments joining line markers.
pub const LINE_THICKNESS: f64 = 2.0;

/// Bar width as a fraction of the horizontal point spacing.
pub const BAR_WIDTH_RATIO: f64 = 0.7;

// ---------------------------------------------------------------------------
// ChartKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Line,
    Bar,
}

impl ChartKind {
    /// Number of y-axis intervals for a window of `visible` points.
    ///
    /// Bars use one interval per point while lines use a fixed count.
    pub fn y_separators(self, visible: usize) -> usize {
        match self {
            Self::Line => LINE_Y_SEPARATORS,
            Self::Bar => visible,
        }
    }
}

// ---------------------------------------------------------------------------
// Layout output
// ---------------------------------------------------------------------------

/// A visible value placed in graph coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotPoint {
    pub x: f64,
    pub y: f64,
    pub value: f64,
    /// 1-based position in the full, unwindowed sequence.
    pub ordinal: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickLabel {
    /// Coordinate along the axis the tick belongs to.
    pub position: f64,
    pub value: f64,
    pub text: String,
}

/// Straight connector between two consecutive line markers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: (f64, f64),
    pub to: (f64, f64),
    pub length: f64,
    pub midpoint: (f64, f64),
    /// Direction of `to - from`, counter-clockwise from the +x axis.
    pub angle_deg: f64,
    pub thickness: f64,
}

impl Segment {
    pub fn between(from: (f64, f64), to: (f64, f64)) -> Self {
        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        Self {
            from,
            to,
            length: dx.hypot(dy),
            midpoint: ((from.0 + to.0) / 2.0, (from.1 + to.1) / 2.0),
            angle_deg: dy.atan2(dx).to_degrees(),
            thickness: LINE_THICKNESS,
        }
    }
}

/// A bar anchored on the x axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarRect {
    /// Centre of the bar.
    pub x: f64,
    pub bottom: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CartesianLayout {
    pub graph_width: f64,
    pub graph_height: f64,
    pub max_visible: usize,
    /// Horizontal spacing between consecutive points.
    pub x_size: f64,
    /// Displayed range after flat-window stretching and padding.
    pub y_min: f64,
    pub y_max: f64,
    pub points: Vec<PlotPoint>,
}

impl CartesianLayout {
    pub fn compute(
        values: &[f64],
        graph_width: f64,
        graph_height: f64,
        max_visible: usize,
    ) -> Self {
        let max_visible = max_visible.max(1);
        let x_size = graph_width / (max_visible as f64 + 1.0);

        let skipped = values.len().saturating_sub(max_visible);
        let window = &values[skipped..];

        if window.is_empty() {
            return Self {
                graph_width,
                graph_height,
                max_visible,
                x_size,
                y_min: 0.0,
                y_max: 0.0,
                points: Vec::new(),
            };
        }

        let (y_min, y_max) = display_range(window);

        let points = window
            .iter()
            .enumerate()
            .map(|(i, &value)| PlotPoint {
                x: x_size * (i as f64 + 1.0),
                y: fraction(value, y_min, y_max) * graph_height,
                value,
                ordinal: skipped + i + 1,
            })
            .collect();

        Self {
            graph_width,
            graph_height,
            max_visible,
            x_size,
            y_min,
            y_max,
            points,
        }
    }

    /// `separators + 1` evenly spaced labels from `y_min` to `y_max`.
    pub fn y_ticks(&self, separators: usize) -> Vec<TickLabel> {
        if self.points.is_empty() {
            return Vec::new();
        }
        let separators = separators.max(1);
        // Half-step so ranges spanning most of f64 do not overflow.
        let half_step = (self.y_max / 2.0 - self.y_min / 2.0) / separators as f64;
        (0..=separators)
            .map(|i| {
                let offset = half_step * i as f64;
                let value = self.y_min + offset + offset;
                TickLabel {
                    position: self.graph_height * i as f64 / separators as f64,
                    value,
                    text: format_tick(value),
                }
            })
            .collect()
    }

    /// One label per visible point, carrying its original 1-based index.
    pub fn x_ticks(&self) -> Vec<TickLabel> {
        self.points
            .iter()
            .map(|p| TickLabel {
                position: p.x,
                value: p.ordinal as f64,
                text: p.ordinal.to_string(),
            })
            .collect()
    }

    pub fn segments(&self) -> Vec<Segment> {
        self.points
            .windows(2)
            .map(|pair| Segment::between((pair[0].x, pair[0].y), (pair[1].x, pair[1].y)))
            .collect()
    }

    pub fn bars(&self) -> Vec<BarRect> {
        let width = BAR_WIDTH_RATIO * self.x_size;
        self.points
            .iter()
            .map(|p| BarRect {
                x: p.x,
                bottom: 0.0,
                width,
                height: p.y,
            })
            .collect()
    }
}

/// Padded display range for a non-empty window, clamped to finite `f64`.
fn display_range(window: &[f64]) -> (f64, f64) {
    let mut lo = window.iter().copied().fold(f64::INFINITY, f64::min);
    let mut hi = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let mut diff = hi - lo;
    if diff < FLAT_THRESHOLD {
        // A constant window has no spread at all; stretching it too keeps
        // every point at mid-height instead of dividing by zero.
        diff = FLAT_SPAN;
        let mid = lo / 2.0 + hi / 2.0;
        lo = mid - diff / 2.0;
        hi = mid + diff / 2.0;
    }

    let y_min = (lo - diff * PADDING_RATIO).max(f64::MIN);
    let y_max = (hi + diff * PADDING_RATIO).min(f64::MAX);
    (y_min, y_max)
}

/// Position of `value` within `[lo, hi]` as 0..=1. Works on halves so the
/// span of a range near the f64 limits stays finite.
fn fraction(value: f64, lo: f64, hi: f64) -> f64 {
    let half_span = hi / 2.0 - lo / 2.0;
    if half_span > 0.0 {
        (value / 2.0 - lo / 2.0) / half_span
    } else {
        // Padding was absorbed by rounding at the top of the f64 range.
        0.5
    }
}

fn format_tick(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude >= 100.0 {
        format!("{value:.0}")
    } else if magnitude >= 1.0 {
        format!("{value:.1}")
    } else {
        format!("{value:.2}")
    }
}
