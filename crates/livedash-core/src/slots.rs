//! The four display slots and the elements materialized into them.
//!
//! Each slot owns an arena of dynamically created elements (wedges, markers,
//! segments, bars, tick labels). Rendering a metric drops the arena and
//! appends fresh elements; nothing is diffed or reused across refreshes.

use std::rc::Rc;

use crate::cartesian::{BarRect, CartesianLayout, ChartKind, PlotPoint, Segment, TickLabel};
use crate::error::{DashError, Result};
use crate::interpret::interpret;
use crate::model::{AxisLabels, ChartResponse, MetricRecord, SLOT_COUNT, SlotId, VisualKind};
use crate::pie::{self, Wedge};

pub type Rgb = [u8; 3];

/// Message shown when a failed response carries no error text.
const GENERIC_FAILURE: &str = "request failed";

// ---------------------------------------------------------------------------
// Slot contents
// ---------------------------------------------------------------------------

/// A dynamically created chart element.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Wedge { wedge: Wedge, color: Rgb },
    Marker(PlotPoint),
    Segment(Segment),
    Bar(BarRect),
    XTick(TickLabel),
    YTick(TickLabel),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartShape {
    Pie,
    Line,
    Bar,
}

/// Chart-wide information that is not a per-element drawable.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartMeta {
    pub shape: ChartShape,
    pub labels: Option<AxisLabels>,
    pub y_min: f64,
    pub y_max: f64,
    pub graph_width: f64,
    pub graph_height: f64,
}

/// A fetched and decoded image.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub pixels: Rc<image::RgbaImage>,
}

impl DecodedImage {
    pub fn decode(url: &str, bytes: &[u8]) -> Result<Self> {
        let pixels = image::load_from_memory(bytes)
            .map_err(|e| DashError::ImageDecode(e.to_string()))?
            .to_rgba8();
        Ok(Self {
            url: url.to_string(),
            width: pixels.width(),
            height: pixels.height(),
            pixels: Rc::new(pixels),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum SlotContent {
    #[default]
    Empty,
    Text(String),
    Image(DecodedImage),
    Chart(ChartMeta),
}

#[derive(Debug, Clone)]
pub struct Slot {
    id: SlotId,
    visible: bool,
    region_visible: bool,
    metric: Option<String>,
    content: SlotContent,
    elements: Vec<Element>,
}

impl Slot {
    fn new(id: SlotId) -> Self {
        Self {
            id,
            visible: false,
            region_visible: false,
            metric: None,
            content: SlotContent::Empty,
            elements: Vec::new(),
        }
    }

    pub fn id(&self) -> SlotId {
        self.id
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_region_visible(&self) -> bool {
        self.region_visible
    }

    pub fn metric(&self) -> Option<&str> {
        self.metric.as_deref()
    }

    pub fn content(&self) -> &SlotContent {
        &self.content
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    fn hide(&mut self) {
        self.visible = false;
        self.region_visible = false;
    }

    fn reveal(&mut self) {
        self.visible = true;
        self.region_visible = true;
    }

    /// Drop every dynamic element and the previous content.
    fn clear(&mut self) {
        self.elements.clear();
        self.content = SlotContent::Empty;
        self.metric = None;
    }
}

// ---------------------------------------------------------------------------
// Image cache
// ---------------------------------------------------------------------------

/// Single-entry cache of the last requested image URL.
///
/// The entry is shared by all four slots, so two slots showing different
/// images never hit the cache.
#[derive(Debug, Default)]
pub struct ImageCache {
    entry: Option<(String, Option<DecodedImage>)>,
}

impl ImageCache {
    pub fn url(&self) -> Option<&str> {
        self.entry.as_ref().map(|(url, _)| url.as_str())
    }

    /// Decoded image for `url`, if it is the cached URL and has arrived.
    pub fn lookup(&self, url: &str) -> Option<&DecodedImage> {
        match &self.entry {
            Some((cached, Some(image))) if cached == url => Some(image),
            _ => None,
        }
    }

    fn request(&mut self, url: &str) {
        if self.url() != Some(url) {
            self.entry = Some((url.to_string(), None));
        }
    }

    fn store(&mut self, image: DecodedImage) {
        if self.url() == Some(image.url.as_str()) {
            self.entry = Some((image.url.clone(), Some(image)));
        }
    }

    fn forget(&mut self, url: &str) {
        if self.url() == Some(url) {
            self.entry = None;
        }
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// An image fetch the caller must issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub slot: SlotId,
    pub url: String,
    pub metric: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    Shown,
    FetchImage(ImageRequest),
}

/// A metric whose slot stayed hidden this refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DegradedMetric {
    pub name: String,
    pub slot: SlotId,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct RenderReport {
    pub images: Vec<ImageRequest>,
    pub degraded: Vec<DegradedMetric>,
}

pub struct ChartSlotRenderer {
    slots: [Slot; SLOT_COUNT],
    image_cache: ImageCache,
    graph_width: f64,
    graph_height: f64,
    max_visible: usize,
}

impl ChartSlotRenderer {
    pub fn new(graph_width: f64, graph_height: f64, max_visible: usize) -> Self {
        Self {
            slots: SlotId::ALL.map(Slot::new),
            image_cache: ImageCache::default(),
            graph_width,
            graph_height,
            max_visible,
        }
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn slot(&self, id: SlotId) -> &Slot {
        &self.slots[id.index()]
    }

    pub fn image_cache(&self) -> &ImageCache {
        &self.image_cache
    }

    pub fn hide_all(&mut self) {
        for slot in &mut self.slots {
            slot.hide();
        }
    }

    /// Replace everything on screen with `response`.
    pub fn render_response(&mut self, response: &ChartResponse) -> RenderReport {
        self.hide_all();
        let mut report = RenderReport::default();

        if !response.success {
            let msg = response.error_msg.as_deref().unwrap_or(GENERIC_FAILURE);
            self.render_failure(msg);
            return report;
        }

        for record in &response.data {
            match self.render_record(record) {
                Ok(RenderOutcome::Shown) => {}
                Ok(RenderOutcome::FetchImage(request)) => report.images.push(request),
                Err(e) => {
                    log::warn!("metric '{}' not shown in {}: {e}", record.name, record.slot);
                    report.degraded.push(DegradedMetric {
                        name: record.name.clone(),
                        slot: record.slot,
                        reason: e.to_string(),
                    });
                }
            }
        }
        report
    }

    /// Show `message` in the first slot and nothing else.
    pub fn render_failure(&mut self, message: &str) {
        log::warn!("refresh failed: {message}");
        self.hide_all();
        let first = &mut self.slots[0];
        first.clear();
        first.content = SlotContent::Text(message.to_string());
        first.reveal();
    }

    /// Rebuild one slot from `record`. The slot is left hidden on error.
    pub fn render_record(&mut self, record: &MetricRecord) -> Result<RenderOutcome> {
        let (graph_width, graph_height, max_visible) =
            (self.graph_width, self.graph_height, self.max_visible);
        let slot = &mut self.slots[record.slot.index()];
        slot.clear();

        let (content, elements) = match &record.visual {
            VisualKind::LiteralText => {
                let text = record.text.clone().ok_or(DashError::MissingText)?;
                (SlotContent::Text(text), Vec::new())
            }
            VisualKind::Unsupported(tag) => {
                return Err(DashError::UnsupportedVisual(tag.clone()));
            }
            VisualKind::Text => {
                let typed = interpret(&record.values, record.data_type)?;
                let text = typed.first_display().ok_or(DashError::EmptyValues)?;
                (SlotContent::Text(text), Vec::new())
            }
            VisualKind::Image => {
                let typed = interpret(&record.values, record.data_type)?;
                if typed.is_empty() {
                    return Err(DashError::EmptyValues);
                }
                let url = typed.first_str().ok_or(DashError::NonText)?;
                let cached = self.image_cache.lookup(url).cloned();
                match cached {
                    Some(image) => (SlotContent::Image(image), Vec::new()),
                    None => {
                        log::debug!("fetching image {url} for {}", record.slot);
                        self.image_cache.request(url);
                        return Ok(RenderOutcome::FetchImage(ImageRequest {
                            slot: record.slot,
                            url: url.to_string(),
                            metric: record.name.clone(),
                        }));
                    }
                }
            }
            VisualKind::Pie => {
                let weights = interpret(&record.values, record.data_type)?.as_reals()?;
                let wedges = pie::layout(&weights);
                let colors = pie::random_colors(wedges.len());
                let elements = wedges
                    .into_iter()
                    .zip(colors)
                    .map(|(wedge, color)| Element::Wedge { wedge, color })
                    .collect();
                let meta = ChartMeta {
                    shape: ChartShape::Pie,
                    labels: None,
                    y_min: 0.0,
                    y_max: 0.0,
                    graph_width,
                    graph_height,
                };
                (SlotContent::Chart(meta), elements)
            }
            VisualKind::Line | VisualKind::Bar => {
                let kind = if record.visual == VisualKind::Line {
                    ChartKind::Line
                } else {
                    ChartKind::Bar
                };
                let values = interpret(&record.values, record.data_type)?.as_reals()?;
                let layout =
                    CartesianLayout::compute(&values, graph_width, graph_height, max_visible);
                let elements = cartesian_elements(&layout, kind);
                let meta = ChartMeta {
                    shape: match kind {
                        ChartKind::Line => ChartShape::Line,
                        ChartKind::Bar => ChartShape::Bar,
                    },
                    labels: match kind {
                        ChartKind::Line => record.labels.clone(),
                        ChartKind::Bar => None,
                    },
                    y_min: layout.y_min,
                    y_max: layout.y_max,
                    graph_width,
                    graph_height,
                };
                (SlotContent::Chart(meta), elements)
            }
        };

        let slot = &mut self.slots[record.slot.index()];
        slot.metric = Some(record.name.clone());
        slot.content = content;
        slot.elements = elements;
        slot.reveal();
        Ok(RenderOutcome::Shown)
    }

    /// Finish an image fetch: decode, cache, and reveal the requesting slot.
    ///
    /// The slot is overwritten even if a newer refresh has drawn something
    /// else there since the fetch started.
    pub fn image_loaded(&mut self, request: &ImageRequest, bytes: &[u8]) -> Result<()> {
        let image = match DecodedImage::decode(&request.url, bytes) {
            Ok(image) => image,
            Err(e) => {
                self.image_failed(request, &e);
                return Err(e);
            }
        };
        self.image_cache.store(image.clone());

        let target = &mut self.slots[request.slot.index()];
        target.clear();
        target.metric = Some(request.metric.clone());
        target.content = SlotContent::Image(image);
        target.reveal();
        Ok(())
    }

    /// An image fetch failed; the slot stays hidden.
    pub fn image_failed(&mut self, request: &ImageRequest, err: &dyn std::fmt::Display) {
        log::warn!("image {} for {} failed: {err}", request.url, request.slot);
        self.image_cache.forget(&request.url);
    }
}

fn cartesian_elements(layout: &CartesianLayout, kind: ChartKind) -> Vec<Element> {
    let mut elements = Vec::new();
    match kind {
        ChartKind::Line => {
            elements.extend(layout.points.iter().copied().map(Element::Marker));
            elements.extend(layout.segments().into_iter().map(Element::Segment));
        }
        ChartKind::Bar => {
            elements.extend(layout.bars().into_iter().map(Element::Bar));
        }
    }
    elements.extend(layout.x_ticks().into_iter().map(Element::XTick));
    let separators = kind.y_separators(layout.points.len());
    elements.extend(layout.y_ticks(separators).into_iter().map(Element::YTick));
    elements
}
