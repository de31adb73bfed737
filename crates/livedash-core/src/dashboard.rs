//! Dashboard wiring: polling controller, slot renderer and mutation builder
//! sharing one state cell on a single-threaded executor.
//!
//! Every network operation runs as its own `spawn_local` task, so fetches
//! overlap freely and the last one to finish wins. Callers must drive the
//! dashboard from inside a [`tokio::task::LocalSet`].

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use tokio::task::JoinHandle;

use crate::config::DashConfig;
use crate::error::{DashError, Result};
use crate::model::{ChartResponse, MutationResponse};
use crate::mutation::{self, DropdownOption, InputHint};
use crate::polling::{PollAction, PollMode, PollingController};
use crate::slots::{ChartSlotRenderer, DegradedMetric, ImageRequest, RenderReport};
use crate::transport::Transport;

/// Everything the UI reads between events.
pub struct DashState {
    controller: PollingController,
    renderer: ChartSlotRenderer,
    response: ChartResponse,
    options: Vec<DropdownOption>,
    selected: Option<usize>,
    input: String,
    hint: InputHint,
    status: Option<String>,
    degraded: Vec<DegradedMetric>,
    fetches_completed: u64,
}

impl DashState {
    fn new(config: &DashConfig) -> Self {
        Self {
            controller: PollingController::new(),
            renderer: ChartSlotRenderer::new(
                config.graph_width,
                config.graph_height,
                config.max_visible,
            ),
            response: ChartResponse::default(),
            options: Vec::new(),
            selected: None,
            input: String::new(),
            hint: InputHint::Standard,
            status: None,
            degraded: Vec::new(),
            fetches_completed: 0,
        }
    }

    pub fn controller(&self) -> &PollingController {
        &self.controller
    }

    pub fn renderer(&self) -> &ChartSlotRenderer {
        &self.renderer
    }

    pub fn response(&self) -> &ChartResponse {
        &self.response
    }

    pub fn options(&self) -> &[DropdownOption] {
        &self.options
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn input_hint(&self) -> InputHint {
        self.hint
    }

    pub fn can_submit(&self) -> bool {
        self.selected.is_some() && mutation::can_submit(&self.input)
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Metrics left hidden by the most recent render.
    pub fn degraded(&self) -> &[DegradedMetric] {
        &self.degraded
    }

    pub fn fetches_completed(&self) -> u64 {
        self.fetches_completed
    }
}

pub struct Dashboard<T> {
    transport: Rc<T>,
    config: Rc<DashConfig>,
    state: Rc<RefCell<DashState>>,
}

impl<T> Clone for Dashboard<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Rc::clone(&self.transport),
            config: Rc::clone(&self.config),
            state: Rc::clone(&self.state),
        }
    }
}

impl<T: Transport + 'static> Dashboard<T> {
    pub fn new(transport: T, config: DashConfig) -> Self {
        let state = DashState::new(&config);
        Self {
            transport: Rc::new(transport),
            config: Rc::new(config),
            state: Rc::new(RefCell::new(state)),
        }
    }

    pub fn config(&self) -> &DashConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Borrow the current state. Never hold the guard across an `.await`.
    pub fn state(&self) -> Ref<'_, DashState> {
        self.state.borrow()
    }

    // ---- public operations ----

    pub fn mode_changed(&self, mode: PollMode) -> Vec<PollAction> {
        let actions = self.state.borrow_mut().controller.mode_changed(mode);
        for action in &actions {
            self.execute(*action);
        }
        actions
    }

    pub fn refresh_requested(&self) -> PollAction {
        let action = self.state.borrow_mut().controller.refresh_requested();
        self.execute(action);
        action
    }

    /// Point the mutation form at the `selected`-th modifiable metric.
    pub fn selection_changed(&self, selected: usize) -> Result<InputHint> {
        let mut guard = self.state.borrow_mut();
        let st = &mut *guard;
        let hint = mutation::input_hint(mutation::resolve(&st.response, selected)?.data_type);
        st.selected = Some(selected);
        st.hint = hint;
        st.input.clear();
        Ok(hint)
    }

    /// Replace the entry text. Returns whether submit is now possible.
    pub fn input_changed(&self, text: &str) -> bool {
        let mut st = self.state.borrow_mut();
        st.input = text.to_string();
        st.can_submit()
    }

    /// Append one typed character if the current hint allows it.
    pub fn push_input(&self, c: char) -> bool {
        let mut st = self.state.borrow_mut();
        if !st.hint.accepts(c) {
            return false;
        }
        st.input.push(c);
        true
    }

    pub fn pop_input(&self) {
        self.state.borrow_mut().input.pop();
    }

    /// Send the entered value for the selected metric.
    ///
    /// Failures are logged and shown as status text; rendered metrics are
    /// left untouched either way.
    pub async fn submit_mutation(&self) -> Result<MutationResponse> {
        let outcome = self.try_submit().await;
        if let Err(e) = &outcome {
            log::warn!("mutation failed: {e}");
            self.state.borrow_mut().status = Some(format!("mutation failed: {e}"));
        }
        outcome
    }

    async fn try_submit(&self) -> Result<MutationResponse> {
        let request = {
            let st = self.state.borrow();
            let selected = st.selected.ok_or(DashError::NoSelection(0))?;
            mutation::build_request(&st.response, selected, &st.input, &self.config.operation)?
        };

        let body = self.transport.submit_mutation(&request).await?;
        let response = MutationResponse::parse(&body)?;
        if !response.success {
            let msg = response
                .error_msg
                .clone()
                .unwrap_or_else(|| "server rejected the change".to_string());
            return Err(DashError::Mutation(msg));
        }

        log::info!("{} {} {}", request.operation, request.value, request.name);
        let mut st = self.state.borrow_mut();
        st.status = Some(format!(
            "{} {} -> {}",
            request.operation, request.value, request.name
        ));
        st.input.clear();
        Ok(response)
    }

    // ---- fetching ----

    /// Poll once and render the result. Image fetches are spawned.
    pub async fn refresh(&self) -> RenderReport {
        let response = match self.transport.fetch_metrics().await {
            Ok(body) => ChartResponse::parse(&body).unwrap_or_else(|e| {
                log::warn!("unreadable poll response: {e}");
                ChartResponse::failure(e.to_string())
            }),
            Err(e) => {
                log::warn!("poll failed: {e}");
                ChartResponse::transport_failure(&e)
            }
        };

        let report = self.apply(response);
        for request in &report.images {
            tokio::task::spawn_local(self.clone().load_image(request.clone()));
        }
        report
    }

    pub fn spawn_refresh(&self) -> JoinHandle<()> {
        let this = self.clone();
        tokio::task::spawn_local(async move {
            this.refresh().await;
        })
    }

    fn execute(&self, action: PollAction) {
        match action {
            PollAction::FetchOnce => {
                self.spawn_refresh();
            }
            PollAction::StartLoop { generation } => {
                tokio::task::spawn_local(self.clone().poll_loop(generation));
            }
            PollAction::StopLoop
            | PollAction::ShowManualControls
            | PollAction::HideManualControls => {}
        }
    }

    fn looping(&self, generation: u64) -> bool {
        self.state.borrow().controller.should_continue(generation)
    }

    async fn poll_loop(self, generation: u64) {
        let interval = self.config.poll_interval();
        while self.looping(generation) {
            self.spawn_refresh();
            tokio::time::sleep(interval).await;
        }
        log::debug!("poll loop {generation} exited");
    }

    async fn load_image(self, request: ImageRequest) {
        let fetched = self.transport.fetch_image(&request.url).await;
        let mut st = self.state.borrow_mut();
        match fetched {
            Ok(bytes) => {
                if let Err(e) = st.renderer.image_loaded(&request, &bytes) {
                    log::debug!("{} stays hidden: {e}", request.slot);
                }
            }
            Err(e) => st.renderer.image_failed(&request, &e),
        }
    }

    fn apply(&self, response: ChartResponse) -> RenderReport {
        let mut guard = self.state.borrow_mut();
        let st = &mut *guard;

        let report = st.renderer.render_response(&response);
        st.options = mutation::modifiable_options(&response);
        st.selected = match st.selected {
            _ if st.options.is_empty() => None,
            Some(k) if k < st.options.len() => Some(k),
            _ => Some(0),
        };
        st.hint = st
            .selected
            .and_then(|k| mutation::resolve(&response, k).ok())
            .map(|r| mutation::input_hint(r.data_type))
            .unwrap_or(InputHint::Standard);
        st.degraded = report.degraded.clone();
        st.response = response;
        st.fetches_completed += 1;
        report
    }
}
