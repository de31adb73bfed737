//! Polling mode state machine.
//!
//! The controller only decides; it never sleeps or fetches. Callers execute
//! the returned [`PollAction`]s and ask [`PollingController::should_continue`]
//! before every loop iteration.

/// Position of the mode selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollMode {
    /// One fetch per refresh action.
    #[default]
    Manual,
    /// Refresh action starts or stops the repeating loop.
    ActiveAuto,
    /// Loop runs by itself; manual controls are hidden.
    PassiveAuto,
}

impl PollMode {
    pub const ALL: [PollMode; 3] = [Self::Manual, Self::ActiveAuto, Self::PassiveAuto];

    /// Mode for a selector position (0, 1, 2).
    pub fn from_position(position: usize) -> Option<Self> {
        Self::ALL.get(position).copied()
    }

    pub fn position(self) -> usize {
        match self {
            Self::Manual => 0,
            Self::ActiveAuto => 1,
            Self::PassiveAuto => 2,
        }
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.position() + 1) % Self::ALL.len()]
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::ActiveAuto => "active auto",
            Self::PassiveAuto => "passive auto",
        }
    }
}

impl std::fmt::Display for PollMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollAction {
    ShowManualControls,
    HideManualControls,
    FetchOnce,
    /// Spawn a repeating fetch task tagged with `generation`.
    StartLoop { generation: u64 },
    /// The running loop will exit at its next check.
    StopLoop,
}

#[derive(Debug, Default)]
pub struct PollingController {
    mode: PollMode,
    looping: bool,
    generation: u64,
    manual_controls: bool,
}

impl PollingController {
    pub fn new() -> Self {
        Self {
            manual_controls: true,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> PollMode {
        self.mode
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn manual_controls_visible(&self) -> bool {
        self.manual_controls
    }

    /// Selector moved. Always stops the loop; passive auto restarts it.
    pub fn mode_changed(&mut self, mode: PollMode) -> Vec<PollAction> {
        let mut actions = Vec::new();
        if self.looping {
            actions.push(PollAction::StopLoop);
        }
        self.looping = false;
        self.mode = mode;
        log::info!("poll mode -> {mode}");

        if mode == PollMode::PassiveAuto {
            self.manual_controls = false;
            actions.push(PollAction::HideManualControls);
            actions.push(self.toggle_loop());
        } else {
            self.manual_controls = true;
            actions.push(PollAction::ShowManualControls);
        }
        actions
    }

    /// Refresh trigger pressed.
    pub fn refresh_requested(&mut self) -> PollAction {
        match self.mode {
            PollMode::ActiveAuto => self.toggle_loop(),
            PollMode::Manual | PollMode::PassiveAuto => PollAction::FetchOnce,
        }
    }

    pub fn toggle_loop(&mut self) -> PollAction {
        if self.looping {
            self.looping = false;
            log::info!("poll loop stopping");
            PollAction::StopLoop
        } else {
            self.looping = true;
            self.generation = self.generation.wrapping_add(1);
            log::info!("poll loop starting (generation {})", self.generation);
            PollAction::StartLoop {
                generation: self.generation,
            }
        }
    }

    /// Whether the loop started as `generation` should run another iteration.
    pub fn should_continue(&self, generation: u64) -> bool {
        self.looping && self.generation == generation
    }
}
