//! Integration tests for livedash-core.
//!
//! These drive the full pipeline through a scripted in-memory transport:
//! poll → parse → interpret → layout → slots, plus the polling loop and
//! mutation round trip on a paused tokio clock.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use livedash_core::{
    ChartResponse, ChartSlotRenderer, DashConfig, Dashboard, Element, InputHint, MutationRequest,
    PollAction, PollMode, SlotContent, Transport, TransportError, mutation,
};
use tokio::task::LocalSet;

// ---- scripted transport ----

struct Scripted {
    polls: RefCell<VecDeque<(Duration, Result<String, TransportError>)>>,
    fallback: String,
    poll_calls: Cell<usize>,
    mutations: RefCell<Vec<MutationRequest>>,
    mutation_reply: String,
    images: HashMap<String, Vec<u8>>,
}

impl Scripted {
    fn new(fallback: &str) -> Self {
        Self {
            polls: RefCell::new(VecDeque::new()),
            fallback: fallback.to_string(),
            poll_calls: Cell::new(0),
            mutations: RefCell::new(Vec::new()),
            mutation_reply: r#"{"success": true}"#.to_string(),
            images: HashMap::new(),
        }
    }

    fn then(self, delay: Duration, reply: Result<&str, TransportError>) -> Self {
        self.polls
            .borrow_mut()
            .push_back((delay, reply.map(str::to_string)));
        self
    }

    fn image(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.images.insert(url.to_string(), bytes);
        self
    }

    fn mutation_reply(mut self, reply: &str) -> Self {
        self.mutation_reply = reply.to_string();
        self
    }
}

impl Transport for Scripted {
    async fn fetch_metrics(&self) -> Result<String, TransportError> {
        self.poll_calls.set(self.poll_calls.get() + 1);
        let next = self.polls.borrow_mut().pop_front();
        match next {
            Some((delay, reply)) => {
                tokio::time::sleep(delay).await;
                reply
            }
            None => Ok(self.fallback.clone()),
        }
    }

    async fn submit_mutation(&self, request: &MutationRequest) -> Result<String, TransportError> {
        self.mutations.borrow_mut().push(request.clone());
        Ok(self.mutation_reply.clone())
    }

    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        self.images
            .get(url)
            .cloned()
            .ok_or(TransportError::Status(404))
    }
}

fn text_body(text: &str) -> String {
    format!(
        r#"{{"success": true, "data": [{{"name": "note", "visual": "text", "screenLocation": 1,
            "dataType": "string", "modifiable": false, "values": ["{text}"]}}]}}"#
    )
}

fn slot_text(dash: &Dashboard<Scripted>, index: usize) -> Option<String> {
    match dash.state().renderer().slots()[index].content() {
        SlotContent::Text(t) => Some(t.clone()),
        _ => None,
    }
}

fn png_bytes() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(4, 2, image::Rgba([0, 120, 255, 255]));
    let mut buf = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

const MIXED: &str = r#"{"success": true, "data": [
    {"name": "tempA", "visual": "pie", "screenLocation": 1, "dataType": "float", "modifiable": false, "values": [10, 30, 60]},
    {"name": "history", "visual": "line", "screenLocation": 2, "dataType": "integer", "modifiable": true,
     "values": [1,2,3,4,5,6,7,8,9,10,11], "labels": {"horizontal": "t", "vertical": "C"}},
    {"name": "snapshot", "visual": "image", "screenLocation": 3, "dataType": "string", "modifiable": false,
     "values": ["http://cam/still.png"]},
    {"name": "fanSpeed", "visual": "bar", "screenLocation": 4, "dataType": "float", "modifiable": true, "values": [3, 1, 2]}
]}"#;

// ---- rendering pipeline ----

#[test]
fn pie_example_renders_three_wedges() {
    let body = r#"{"success":true,"data":[{"name":"tempA","visual":"pie","screenLocation":1,
        "dataType":"float","modifiable":false,"values":[10,30,60]}]}"#;
    let response = ChartResponse::parse(body).unwrap();
    let mut renderer = ChartSlotRenderer::new(300.0, 200.0, 10);
    let report = renderer.render_response(&response);
    assert!(report.degraded.is_empty());

    let wedges: Vec<_> = renderer.slots()[0]
        .elements()
        .iter()
        .filter_map(|e| match e {
            Element::Wedge { wedge, .. } => Some(*wedge),
            _ => None,
        })
        .collect();
    assert_eq!(wedges.len(), 3);
    for (w, (fraction, angle)) in wedges.iter().zip([(0.1, 0.0), (0.3, -36.0), (0.6, -144.0)]) {
        assert!((w.fraction - fraction).abs() < 1e-9);
        assert!((w.start_angle_deg - angle).abs() < 1e-9);
    }
    assert!(renderer.slots()[1..].iter().all(|s| !s.is_visible()));
}

#[test]
fn line_example_windows_and_pads() {
    let response = ChartResponse::parse(MIXED).unwrap();
    let mut renderer = ChartSlotRenderer::new(300.0, 200.0, 10);
    renderer.render_response(&response);

    match renderer.slots()[1].content() {
        SlotContent::Chart(meta) => {
            assert!((meta.y_min - 0.2).abs() < 1e-9, "y_min {}", meta.y_min);
            assert!((meta.y_max - 12.8).abs() < 1e-9, "y_max {}", meta.y_max);
            assert_eq!(meta.labels.as_ref().unwrap().vertical, "C");
        }
        other => panic!("expected chart, got {other:?}"),
    }
    let markers: Vec<f64> = renderer.slots()[1]
        .elements()
        .iter()
        .filter_map(|e| match e {
            Element::Marker(p) => Some(p.value),
            _ => None,
        })
        .collect();
    assert_eq!(markers, (2..=11).map(f64::from).collect::<Vec<_>>());
}

#[test]
fn dropdown_maps_back_to_modifiable_records() {
    let response = ChartResponse::parse(MIXED).unwrap();
    let options = mutation::modifiable_options(&response);
    let expected = response.data.iter().filter(|r| r.modifiable).count();
    assert_eq!(options.len(), expected);
    for (k, option) in options.iter().enumerate() {
        assert_eq!(mutation::resolve(&response, k).unwrap().name, option.name);
    }
    assert_eq!(options[1].label, "Fan Speed");
}

// ---- dashboard ----

#[tokio::test(start_paused = true)]
async fn transport_failure_shows_only_first_slot() {
    let transport = Scripted::new(MIXED).then(
        Duration::ZERO,
        Err(TransportError::Unavailable("connection refused".into())),
    );
    let dash = Dashboard::new(transport, DashConfig::default());
    LocalSet::new()
        .run_until(async {
            dash.refresh().await;
        })
        .await;

    let text = slot_text(&dash, 0).unwrap();
    assert!(text.contains("connection refused"), "got {text}");
    let st = dash.state();
    let slots = st.renderer().slots();
    assert!(slots[0].is_visible());
    assert!(slots[1..].iter().all(|s| !s.is_visible() && s.elements().is_empty()));
}

#[tokio::test(start_paused = true)]
async fn server_reported_failure_uses_error_message() {
    let transport = Scripted::new(r#"{"success": false, "errorMsg": "sensor offline"}"#);
    let dash = Dashboard::new(transport, DashConfig::default());
    LocalSet::new()
        .run_until(async {
            dash.refresh().await;
        })
        .await;
    assert_eq!(slot_text(&dash, 0).as_deref(), Some("sensor offline"));
}

#[tokio::test(start_paused = true)]
async fn image_arrives_after_refresh() {
    let transport = Scripted::new(MIXED).image("http://cam/still.png", png_bytes());
    let dash = Dashboard::new(transport, DashConfig::default());
    LocalSet::new()
        .run_until(async {
            let report = dash.refresh().await;
            assert_eq!(report.images.len(), 1);
            assert!(!dash.state().renderer().slots()[2].is_visible());
            tokio::time::sleep(Duration::from_millis(1)).await;
        })
        .await;

    let st = dash.state();
    let slot = &st.renderer().slots()[2];
    assert!(slot.is_visible());
    match slot.content() {
        SlotContent::Image(img) => assert_eq!((img.width, img.height), (4, 2)),
        other => panic!("expected image, got {other:?}"),
    }
    assert_eq!(st.renderer().image_cache().url(), Some("http://cam/still.png"));
}

#[tokio::test(start_paused = true)]
async fn missing_image_leaves_slot_hidden() {
    let dash = Dashboard::new(Scripted::new(MIXED), DashConfig::default());
    LocalSet::new()
        .run_until(async {
            dash.refresh().await;
            tokio::time::sleep(Duration::from_millis(1)).await;
        })
        .await;
    let st = dash.state();
    assert!(!st.renderer().slots()[2].is_visible());
    assert!(st.renderer().slots()[3].is_visible());
}

#[tokio::test(start_paused = true)]
async fn overlapping_fetches_last_write_wins() {
    let old = text_body("old");
    let new = text_body("new");
    let transport = Scripted::new(MIXED)
        .then(Duration::from_secs(3), Ok(old.as_str()))
        .then(Duration::from_secs(1), Ok(new.as_str()));
    let dash = Dashboard::new(transport, DashConfig::default());

    LocalSet::new()
        .run_until(async {
            assert_eq!(dash.refresh_requested(), PollAction::FetchOnce);
            tokio::time::sleep(Duration::from_millis(10)).await;
            dash.refresh_requested();
            tokio::time::sleep(Duration::from_secs(2)).await;
            assert_eq!(slot_text(&dash, 0).as_deref(), Some("new"));
            tokio::time::sleep(Duration::from_secs(2)).await;
        })
        .await;

    // The slower, older fetch finished last and overwrote the newer render.
    assert_eq!(slot_text(&dash, 0).as_deref(), Some("old"));
    assert_eq!(dash.state().fetches_completed(), 2);
}

#[tokio::test(start_paused = true)]
async fn passive_auto_polls_on_interval_until_mode_change() {
    let dash = Dashboard::new(Scripted::new(MIXED), DashConfig::default());
    LocalSet::new()
        .run_until(async {
            dash.mode_changed(PollMode::PassiveAuto);
            assert!(!dash.state().controller().manual_controls_visible());
            tokio::time::sleep(Duration::from_secs(11)).await;
            assert_eq!(dash.transport().poll_calls.get(), 3);

            dash.mode_changed(PollMode::Manual);
            tokio::time::sleep(Duration::from_secs(30)).await;
        })
        .await;
    assert_eq!(dash.transport().poll_calls.get(), 3);
    assert!(dash.state().controller().manual_controls_visible());
}

#[tokio::test(start_paused = true)]
async fn modify_dialect_polls_faster() {
    let config = DashConfig::default().with_dialect(livedash_core::Dialect::Modify);
    let dash = Dashboard::new(Scripted::new(MIXED), config);
    LocalSet::new()
        .run_until(async {
            dash.mode_changed(PollMode::PassiveAuto);
            tokio::time::sleep(Duration::from_secs(10)).await;
        })
        .await;
    // t = 0, 3, 6, 9
    assert_eq!(dash.transport().poll_calls.get(), 4);
}

#[tokio::test(start_paused = true)]
async fn active_auto_toggle_parity() {
    for presses in 1..=6usize {
        let dash = Dashboard::new(Scripted::new(MIXED), DashConfig::default());
        LocalSet::new()
            .run_until(async {
                dash.mode_changed(PollMode::ActiveAuto);
                for _ in 0..presses {
                    dash.refresh_requested();
                    tokio::time::sleep(Duration::from_secs(2)).await;
                }
                let running = presses % 2 == 1;
                assert_eq!(dash.state().controller().is_looping(), running);

                let before = dash.transport().poll_calls.get();
                tokio::time::sleep(Duration::from_secs(20)).await;
                let after = dash.transport().poll_calls.get();
                if running {
                    assert!(after > before, "loop should keep polling");
                } else {
                    assert!(after - before <= 1, "{presses} presses: {before} -> {after}");
                }
            })
            .await;
    }
}

#[tokio::test(start_paused = true)]
async fn quick_restart_runs_a_single_loop() {
    let dash = Dashboard::new(Scripted::new(MIXED), DashConfig::default());
    LocalSet::new()
        .run_until(async {
            dash.mode_changed(PollMode::ActiveAuto);
            dash.refresh_requested();
            dash.refresh_requested();
            dash.refresh_requested();
            tokio::time::sleep(Duration::from_secs(11)).await;
        })
        .await;
    // One loop: fetches at t = 0, 5, 10.
    assert_eq!(dash.transport().poll_calls.get(), 3);
}

#[tokio::test(start_paused = true)]
async fn mutation_uses_selected_record_and_configured_operation() {
    let config = DashConfig::default().with_operation("modify");
    let dash = Dashboard::new(Scripted::new(MIXED), config);
    LocalSet::new()
        .run_until(async {
            dash.refresh().await;
            assert_eq!(dash.selection_changed(1).unwrap(), InputHint::Decimal);
            assert!(dash.input_changed("42.5"));
            dash.submit_mutation().await.unwrap();
        })
        .await;

    let sent = dash.transport().mutations.borrow();
    assert_eq!(
        sent.as_slice(),
        &[MutationRequest {
            name: "fanSpeed".into(),
            operation: "modify".into(),
            value: 42.5,
            index: 0,
        }]
    );
    assert_eq!(dash.state().input(), "");
    assert!(dash.state().status().unwrap().contains("fanSpeed"));
}

#[tokio::test(start_paused = true)]
async fn rejected_mutation_keeps_dashboard_intact() {
    let transport =
        Scripted::new(MIXED).mutation_reply(r#"{"success": false, "errorMsg": "read only"}"#);
    let dash = Dashboard::new(transport, DashConfig::default());
    LocalSet::new()
        .run_until(async {
            dash.refresh().await;
            dash.input_changed("1");
            let err = dash.submit_mutation().await.unwrap_err();
            assert!(err.to_string().contains("read only"));
        })
        .await;

    let st = dash.state();
    assert!(st.status().unwrap().contains("read only"));
    assert!(st.renderer().slots()[0].is_visible());
    assert_eq!(st.fetches_completed(), 1);
}

#[tokio::test(start_paused = true)]
async fn invalid_input_never_reaches_transport() {
    let dash = Dashboard::new(Scripted::new(MIXED), DashConfig::default());
    LocalSet::new()
        .run_until(async {
            dash.refresh().await;
            dash.input_changed("warm");
            assert!(dash.submit_mutation().await.is_err());
        })
        .await;
    assert!(dash.transport().mutations.borrow().is_empty());
}
