//! Demo telemetry source for livedash.
//!
//! Serves a fixed set of synthetic metrics over the same protocol a real
//! sensor hub speaks: `POST /temperature/` returns the current metrics and
//! `POST /modifyData/` changes one stored value. The fourth slot rotates
//! between an image, a text value and a literal note on every poll so every
//! visual kind gets exercised.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use livedash_core::model::{AxisLabels, MutationRequest, MutationResponse, WireMetric, WireResponse};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde_json::{Value, json};
use tokio::sync::Mutex;

/// Samples kept for the line series.
const HISTORY: usize = 30;

/// Metrics shown in slot 4, one per poll, in rotation.
const ROTATING: [&str; 3] = ["camera", "setpoint", "note"];

/// Synthetic metric state. Each snapshot advances the random walk.
pub struct MetricStore {
    metrics: Vec<WireMetric>,
    polls: u64,
    rng: StdRng,
}

impl MetricStore {
    /// `image_url` is where clients can fetch the camera still.
    pub fn new(image_url: &str) -> Self {
        Self::with_rng(image_url, StdRng::from_os_rng())
    }

    pub fn with_seed(image_url: &str, seed: u64) -> Self {
        Self::with_rng(image_url, StdRng::seed_from_u64(seed))
    }

    fn with_rng(image_url: &str, rng: StdRng) -> Self {
        let metric = |name: &str,
                      visual: &str,
                      slot: i64,
                      data_type: &str,
                      modifiable: bool,
                      values: Vec<Value>| WireMetric {
            name: name.to_string(),
            visual: visual.to_string(),
            screen_location: slot,
            data_type: data_type.to_string(),
            modifiable,
            values,
            labels: None,
            text: None,
        };

        let mut room = metric("roomTemp", "line", 1, "float", false, vec![json!(21.0)]);
        room.labels = Some(AxisLabels {
            horizontal: "sample".into(),
            vertical: "°C".into(),
        });
        let mut note = metric("note", "data-text", 4, "string", false, Vec::new());
        note.text = Some("demo source: values are synthetic".into());

        Self {
            metrics: vec![
                room,
                metric(
                    "powerSplit",
                    "pie",
                    2,
                    "float",
                    true,
                    vec![json!(40.0), json!(35.0), json!(25.0)],
                ),
                metric(
                    "fanSpeed",
                    "bar",
                    3,
                    "integer",
                    true,
                    vec![json!(1200), json!(900), json!(1500), json!(700)],
                ),
                metric("camera", "image", 4, "string", false, vec![json!(image_url)]),
                metric("setpoint", "text", 4, "float", true, vec![json!(21.5)]),
                note,
            ],
            polls: 0,
            rng,
        }
    }

    pub fn polls(&self) -> u64 {
        self.polls
    }

    fn number(&self, name: &str, index: usize) -> Option<f64> {
        self.metrics
            .iter()
            .find(|m| m.name == name)?
            .values
            .get(index)?
            .as_f64()
    }

    fn latest(&self, name: &str) -> Option<f64> {
        self.metrics
            .iter()
            .find(|m| m.name == name)?
            .values
            .last()?
            .as_f64()
    }

    fn values_mut(&mut self, name: &str) -> Option<&mut Vec<Value>> {
        self.metrics
            .iter_mut()
            .find(|m| m.name == name)
            .map(|m| &mut m.values)
    }

    /// Advance the synthetic series and return the poll response.
    pub fn snapshot(&mut self) -> WireResponse {
        self.step();
        let rotating = ROTATING[(self.polls as usize - 1) % ROTATING.len()];
        let data = self
            .metrics
            .iter()
            .filter(|m| m.screen_location != 4 || m.name == rotating)
            .cloned()
            .collect();
        WireResponse {
            success: true,
            error_msg: None,
            data,
        }
    }

    fn step(&mut self) {
        self.polls += 1;

        // Room temperature drifts toward the setpoint with some noise.
        let target = self.number("setpoint", 0).unwrap_or(21.5);
        let last = self.latest("roomTemp").unwrap_or(target);
        let noise: f64 = self.rng.random_range(-0.4..0.4);
        let next = ((last + (target - last) * 0.2 + noise) * 100.0).round() / 100.0;
        if let Some(history) = self.values_mut("roomTemp") {
            history.push(json!(next));
            if history.len() > HISTORY {
                history.remove(0);
            }
        }

        let jitter: Vec<f64> = (0..3).map(|_| self.rng.random_range(-1.0..1.0)).collect();
        if let Some(split) = self.values_mut("powerSplit") {
            for (v, d) in split.iter_mut().zip(jitter) {
                let current = v.as_f64().unwrap_or(0.0);
                *v = json!(((current + d).max(1.0) * 10.0).round() / 10.0);
            }
        }
    }

    /// Apply `request` to the named metric.
    pub fn apply(&mut self, request: &MutationRequest) -> Result<f64, String> {
        let metric = self
            .metrics
            .iter_mut()
            .find(|m| m.name == request.name)
            .ok_or_else(|| format!("unknown metric '{}'", request.name))?;
        if !metric.modifiable {
            return Err(format!("'{}' is read only", request.name));
        }
        let index = usize::try_from(request.index)
            .ok()
            .filter(|&i| i < metric.values.len())
            .ok_or_else(|| format!("index {} out of range", request.index))?;
        let current = metric.values[index]
            .as_f64()
            .ok_or_else(|| format!("'{}' is not numeric", request.name))?;

        let next = match request.operation.as_str() {
            "add" => current + request.value,
            "modify" => request.value,
            other => return Err(format!("unknown operation '{other}'")),
        };
        metric.values[index] = if metric.data_type == "integer" {
            json!(next.trunc() as i64)
        } else {
            json!(next)
        };
        Ok(next)
    }
}

/// Small moving gradient standing in for a camera frame.
pub fn render_snapshot(frame: u64) -> Result<Vec<u8>, image::ImageError> {
    let shift = (frame % 32) as u32 * 8;
    let img = image::RgbImage::from_fn(32, 16, |x, y| {
        image::Rgb([
            ((x * 8 + shift) % 256) as u8,
            (y * 16) as u8,
            (255 - (x * 8 + shift) % 256) as u8,
        ])
    });
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)?;
    Ok(buf.into_inner())
}

// ---- handlers ----

/// Shared server state.
struct AppState {
    store: Mutex<MetricStore>,
}

async fn handle_poll(State(state): State<Arc<AppState>>) -> Json<WireResponse> {
    let mut store = state.store.lock().await;
    Json(store.snapshot())
}

async fn handle_modify(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MutationRequest>,
) -> Json<MutationResponse> {
    let mut store = state.store.lock().await;
    match store.apply(&request) {
        Ok(value) => {
            log::info!("{} {} -> {} = {value}", request.operation, request.value, request.name);
            Json(MutationResponse {
                success: true,
                error_msg: None,
            })
        }
        Err(msg) => {
            log::warn!("rejected mutation of '{}': {msg}", request.name);
            Json(MutationResponse {
                success: false,
                error_msg: Some(msg),
            })
        }
    }
}

async fn handle_snapshot(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let frame = state.store.lock().await.polls();
    match render_snapshot(frame) {
        Ok(png) => (StatusCode::OK, [(header::CONTENT_TYPE, "image/png")], png).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

async fn handle_index() -> Json<Value> {
    Json(json!({
        "name": "livedash demo source",
        "version": livedash_core::VERSION,
        "endpoints": {
            "/temperature/": { "method": "POST", "description": "Current metrics" },
            "/modifyData/": {
                "method": "POST",
                "description": "Change a modifiable metric",
                "body": "{\"name\", \"operation\": \"add\" | \"modify\", \"value\", \"index\"}",
            },
            "/snapshot.png": "Camera still",
        }
    }))
}

/// Build the axum router.
pub fn build_router(store: MetricStore) -> Router {
    let state = Arc::new(AppState {
        store: Mutex::new(store),
    });

    Router::new()
        .route("/", get(handle_index))
        .route("/temperature/", post(handle_poll))
        .route("/modifyData/", post(handle_modify))
        .route("/snapshot.png", get(handle_snapshot))
        .with_state(state)
}

/// Run the demo source until the process is stopped.
pub async fn run_server(host: &str, port: u16) -> std::io::Result<()> {
    let addr = format!("{host}:{port}");
    let store = MetricStore::new(&format!("http://{addr}/snapshot.png"));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, build_router(store)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MetricStore {
        MetricStore::with_seed("http://demo/snapshot.png", 7)
    }

    fn request(name: &str, operation: &str, value: f64) -> MutationRequest {
        MutationRequest {
            name: name.into(),
            operation: operation.into(),
            value,
            index: 0,
        }
    }

    #[test]
    fn snapshot_fills_each_slot_once() {
        let mut s = store();
        for _ in 0..6 {
            let resp = s.snapshot();
            assert!(resp.success);
            let mut slots: Vec<i64> = resp.data.iter().map(|m| m.screen_location).collect();
            slots.sort_unstable();
            assert_eq!(slots, vec![1, 2, 3, 4]);
        }
    }

    #[test]
    fn slot_four_rotates_through_kinds() {
        let mut s = store();
        let visuals: Vec<String> = (0..3)
            .map(|_| {
                let resp = s.snapshot();
                resp.data
                    .into_iter()
                    .find(|m| m.screen_location == 4)
                    .map(|m| m.visual)
                    .unwrap()
            })
            .collect();
        assert_eq!(visuals, vec!["image", "text", "data-text"]);
    }

    #[test]
    fn history_is_capped() {
        let mut s = store();
        for _ in 0..(HISTORY + 10) {
            s.snapshot();
        }
        let resp = s.snapshot();
        let room = resp.data.iter().find(|m| m.name == "roomTemp").unwrap();
        assert_eq!(room.values.len(), HISTORY);
    }

    #[test]
    fn add_and_modify_dialects() {
        let mut s = store();
        assert_eq!(s.apply(&request("setpoint", "add", 1.0)), Ok(22.5));
        assert_eq!(s.apply(&request("setpoint", "modify", 19.0)), Ok(19.0));
        assert_eq!(s.number("setpoint", 0), Some(19.0));
    }

    #[test]
    fn integer_metrics_stay_integer() {
        let mut s = store();
        s.apply(&request("fanSpeed", "add", 10.9)).unwrap();
        let fan = s.metrics.iter().find(|m| m.name == "fanSpeed").unwrap();
        assert_eq!(fan.values[0], json!(1210));
    }

    #[test]
    fn bad_mutations_are_rejected() {
        let mut s = store();
        assert!(s.apply(&request("nope", "add", 1.0)).unwrap_err().contains("unknown metric"));
        assert!(s.apply(&request("roomTemp", "add", 1.0)).unwrap_err().contains("read only"));
        assert!(s.apply(&request("setpoint", "multiply", 2.0)).is_err());
        let mut out_of_range = request("setpoint", "add", 1.0);
        out_of_range.index = 3;
        assert!(s.apply(&out_of_range).is_err());
    }

    #[test]
    fn snapshot_image_decodes() {
        let png = render_snapshot(3).unwrap();
        let img = image::load_from_memory(&png).unwrap();
        assert_eq!((img.width(), img.height()), (32, 16));
    }

    #[tokio::test]
    async fn handlers_speak_the_wire_format() {
        let state = Arc::new(AppState {
            store: Mutex::new(store()),
        });
        let Json(poll) = handle_poll(State(state.clone())).await;
        let body = serde_json::to_string(&poll).unwrap();
        let parsed = livedash_core::ChartResponse::parse(&body).unwrap();
        assert_eq!(parsed.data.len(), 4);
        assert!(parsed.rejected.is_empty());

        let modify = request("powerSplit", "modify", 5.0);
        let Json(reply) = handle_modify(State(state.clone()), Json(modify)).await;
        assert!(reply.success);
        let Json(reply) = handle_modify(State(state), Json(request("camera", "add", 1.0))).await;
        assert!(!reply.success);
        assert!(reply.error_msg.is_some());
    }
}
