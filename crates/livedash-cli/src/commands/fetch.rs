use livedash_core::{
    ChartResponse, ChartShape, ChartSlotRenderer, DashConfig, Element, Slot, SlotContent, Transport,
};
use serde_json::{Value, json};

use crate::SourceArgs;

pub fn run(source: &SourceArgs, as_json: bool) {
    super::init_logging();
    let (config, transport) = super::connect(source);
    let rt = super::runtime();

    let (renderer, problems) = rt.block_on(async {
        let response = match transport.fetch_metrics().await {
            Ok(body) => ChartResponse::parse(&body)
                .unwrap_or_else(|e| ChartResponse::failure(e.to_string())),
            Err(e) => ChartResponse::transport_failure(&e),
        };
        render(&config, &transport, &response).await
    });
    for problem in &problems {
        eprintln!("  {problem}");
    }

    if as_json {
        let slots: Vec<Value> = renderer.slots().iter().map(slot_json).collect();
        match serde_json::to_string_pretty(&json!({ "slots": slots })) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    println!("{}", config.poll_url());
    for slot in renderer.slots() {
        println!("  {}", describe(slot));
    }
}

/// Render `response`, then load images one by one. Returns the renderer and
/// one line per metric that could not be shown.
async fn render<T: Transport>(
    config: &DashConfig,
    transport: &T,
    response: &ChartResponse,
) -> (ChartSlotRenderer, Vec<String>) {
    let mut renderer =
        ChartSlotRenderer::new(config.graph_width, config.graph_height, config.max_visible);
    let report = renderer.render_response(response);
    let mut problems = Vec::new();
    for degraded in &report.degraded {
        problems.push(format!(
            "{} '{}' hidden: {}",
            degraded.slot, degraded.name, degraded.reason
        ));
    }
    for rejected in &response.rejected {
        problems.push(format!("'{}' dropped: {}", rejected.name, rejected.reason));
    }
    for request in &report.images {
        let loaded = match transport.fetch_image(&request.url).await {
            Ok(bytes) => renderer.image_loaded(request, &bytes),
            Err(e) => {
                renderer.image_failed(request, &e);
                Err(e.into())
            }
        };
        if let Err(e) = loaded {
            problems.push(format!(
                "{} '{}' image {} hidden: {e}",
                request.slot, request.metric, request.url
            ));
        }
    }
    (renderer, problems)
}

fn describe(slot: &Slot) -> String {
    let id = slot.id();
    if !slot.is_visible() {
        return format!("{id}: hidden");
    }
    let name = slot.metric().unwrap_or("-");
    match slot.content() {
        SlotContent::Empty => format!("{id}: {name} (empty)"),
        SlotContent::Text(text) => format!("{id}: {name} = {text}"),
        SlotContent::Image(img) => {
            format!("{id}: {name} image {}x{} {}", img.width, img.height, img.url)
        }
        SlotContent::Chart(meta) => match meta.shape {
            ChartShape::Pie => {
                let parts: Vec<String> = slot
                    .elements()
                    .iter()
                    .filter_map(|e| match e {
                        Element::Wedge { wedge, .. } => {
                            Some(format!("{:.1}%", wedge.fraction * 100.0))
                        }
                        _ => None,
                    })
                    .collect();
                format!("{id}: {name} pie [{}]", parts.join(" "))
            }
            ChartShape::Line | ChartShape::Bar => {
                let values: Vec<String> = slot
                    .elements()
                    .iter()
                    .filter_map(|e| match e {
                        Element::Marker(p) => Some(format!("{}", p.value)),
                        Element::Bar(b) => Some(format!("{:.1}", b.height)),
                        _ => None,
                    })
                    .collect();
                let kind = if meta.shape == ChartShape::Line { "line" } else { "bar" };
                format!(
                    "{id}: {name} {kind} y=[{:.2}, {:.2}] [{}]",
                    meta.y_min,
                    meta.y_max,
                    values.join(" ")
                )
            }
        },
    }
}

fn slot_json(slot: &Slot) -> Value {
    let content = match slot.content() {
        SlotContent::Empty => json!(null),
        SlotContent::Text(text) => json!({ "text": text }),
        SlotContent::Image(img) => json!({
            "image": img.url,
            "width": img.width,
            "height": img.height,
        }),
        SlotContent::Chart(meta) => json!({
            "shape": format!("{:?}", meta.shape).to_lowercase(),
            "y_min": meta.y_min,
            "y_max": meta.y_max,
            "graph_width": meta.graph_width,
            "graph_height": meta.graph_height,
        }),
    };
    let elements: Vec<Value> = slot.elements().iter().map(element_json).collect();
    json!({
        "slot": slot.id().screen_location(),
        "visible": slot.is_visible(),
        "metric": slot.metric(),
        "content": content,
        "elements": elements,
    })
}

fn element_json(element: &Element) -> Value {
    match element {
        Element::Wedge { wedge, color } => json!({
            "wedge": {
                "fraction": wedge.fraction,
                "start_deg": wedge.start_angle_deg,
                "color": color,
            }
        }),
        Element::Marker(p) => json!({ "marker": { "x": p.x, "y": p.y, "value": p.value } }),
        Element::Segment(s) => json!({
            "segment": {
                "from": [s.from.0, s.from.1],
                "length": s.length,
                "angle_deg": s.angle_deg,
            }
        }),
        Element::Bar(b) => json!({ "bar": { "x": b.x, "width": b.width, "height": b.height } }),
        Element::XTick(t) => json!({ "x_tick": { "at": t.position, "text": t.text } }),
        Element::YTick(t) => json!({ "y_tick": { "at": t.position, "text": t.text } }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use livedash_core::{MutationRequest, TransportError};

    /// Serves no metrics; images come back as `image` or a 404.
    struct Offline {
        image: Option<&'static [u8]>,
    }

    impl Transport for Offline {
        async fn fetch_metrics(&self) -> Result<String, TransportError> {
            Err(TransportError::Unavailable("offline".into()))
        }

        async fn submit_mutation(
            &self,
            _request: &MutationRequest,
        ) -> Result<String, TransportError> {
            Err(TransportError::Unavailable("offline".into()))
        }

        async fn fetch_image(&self, _url: &str) -> Result<Vec<u8>, TransportError> {
            self.image.map(<[u8]>::to_vec).ok_or(TransportError::Status(404))
        }
    }

    const BODY: &str = r#"{"success": true, "data": [
        {"name": "load", "visual": "pie", "screenLocation": 1, "dataType": "float",
         "values": [1, 3]},
        {"name": "status", "visual": "text", "screenLocation": 2, "dataType": "string",
         "values": ["ok"]},
        {"name": "cam", "visual": "image", "screenLocation": 3, "dataType": "string",
         "values": ["http://x/y.png"]}
    ]}"#;

    #[tokio::test]
    async fn describes_each_visible_slot() {
        let response = ChartResponse::parse(BODY).unwrap();
        let (renderer, problems) =
            render(&DashConfig::default(), &Offline { image: None }, &response).await;
        let lines: Vec<String> = renderer.slots().iter().map(describe).collect();

        assert_eq!(lines[0], "slot 1: load pie [25.0% 75.0%]");
        assert_eq!(lines[1], "slot 2: status = ok");
        assert_eq!(lines[2], "slot 3: hidden");
        assert_eq!(lines[3], "slot 4: hidden");
        assert_eq!(problems.len(), 1);
        assert!(problems[0].starts_with("slot 3 'cam' image http://x/y.png hidden"));
        assert!(problems[0].contains("404"), "{}", problems[0]);
    }

    #[tokio::test]
    async fn undecodable_image_is_reported() {
        let response = ChartResponse::parse(BODY).unwrap();
        let transport = Offline { image: Some(b"not a picture") };
        let (renderer, problems) = render(&DashConfig::default(), &transport, &response).await;

        assert_eq!(describe(&renderer.slots()[2]), "slot 3: hidden");
        assert_eq!(problems.len(), 1);
        assert!(problems[0].starts_with("slot 3 'cam' image"), "{}", problems[0]);
    }

    #[tokio::test]
    async fn dropped_and_degraded_metrics_are_reported() {
        let body = r#"{"success": true, "data": [
            {"name": "far", "visual": "text", "screenLocation": 7, "values": ["x"]},
            {"name": "temps", "visual": "line", "screenLocation": 2, "dataType": "float",
             "values": ["warm"]}
        ]}"#;
        let response = ChartResponse::parse(body).unwrap();
        let (_, problems) =
            render(&DashConfig::default(), &Offline { image: None }, &response).await;

        assert_eq!(problems.len(), 2);
        assert!(problems[0].starts_with("slot 2 'temps' hidden"), "{}", problems[0]);
        assert!(problems[1].starts_with("'far' dropped"), "{}", problems[1]);
    }

    #[test]
    fn json_layout_has_four_slots() {
        let response = ChartResponse::failure("down");
        let mut renderer = ChartSlotRenderer::new(300.0, 200.0, 10);
        renderer.render_response(&response);
        let slots: Vec<Value> = renderer.slots().iter().map(slot_json).collect();
        assert_eq!(slots.len(), 4);
        assert_eq!(slots[0]["content"]["text"], "down");
        assert_eq!(slots[1]["visible"], false);
    }
}
