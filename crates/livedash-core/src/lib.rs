//! # livedash-core
//!
//! Interpretation and layout engine for a live telemetry dashboard.
//!
//! A data source publishes self-describing metrics: each one names a visual
//! kind, a target slot, a declared value type and a loosely typed value list.
//! This crate turns those records into drawable slot contents.
//!
//! ## Quick Start
//!
//! ```no_run
//! use livedash_core::{ChartResponse, ChartSlotRenderer, SlotContent};
//!
//! let body = r#"{"success": true, "data": [
//!     {"name": "load", "visual": "pie", "screenLocation": 1,
//!      "dataType": "float", "modifiable": false, "values": [10, 30, 60]}
//! ]}"#;
//!
//! let response = ChartResponse::parse(body).unwrap();
//! let mut renderer = ChartSlotRenderer::new(300.0, 200.0, 10);
//! renderer.render_response(&response);
//! assert!(matches!(renderer.slots()[0].content(), SlotContent::Chart(_)));
//! ```
//!
//! ## Architecture
//!
//! Transport → [`ChartResponse`] → [`interpret`] → layout ([`pie`],
//! [`cartesian`]) → [`ChartSlotRenderer`]
//!
//! [`Dashboard`] ties the pieces to a [`PollingController`] on a
//! single-threaded executor and builds mutation requests for the metrics the
//! server marks as modifiable.

pub mod cartesian;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod interpret;
pub mod model;
pub mod mutation;
pub mod pie;
pub mod polling;
pub mod slots;
pub mod transport;

pub use cartesian::{BarRect, CartesianLayout, ChartKind, PlotPoint, Segment, TickLabel};
pub use config::{DashConfig, Dialect};
pub use dashboard::{DashState, Dashboard};
pub use error::{DashError, Result, TransportError};
pub use interpret::{TypedSequence, interpret};
pub use model::{
    AxisLabels, ChartResponse, DataType, MetricRecord, MutationRequest, MutationResponse,
    RejectedMetric, SLOT_COUNT, SlotId, VisualKind,
};
pub use mutation::{DropdownOption, InputHint};
pub use pie::Wedge;
pub use polling::{PollAction, PollMode, PollingController};
pub use slots::{
    ChartMeta, ChartShape, ChartSlotRenderer, DecodedImage, DegradedMetric, Element,
    ImageRequest, RenderOutcome, RenderReport, Rgb, Slot, SlotContent,
};
pub use transport::{HttpTransport, Transport};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
