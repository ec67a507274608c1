//! Continuation gate: "press Enter to proceed"
//!
//! The gate is armed when the hosted script prints a prompt line. While armed,
//! a single Enter keypress is consumed and runs the bound resume action (which
//! feeds a blank line to the child's stdin). The gate never times out.

use tracing::{debug, info};

/// Action run when an armed gate is released.
pub type ResumeAction = Box<dyn FnMut() + Send>;

/// Keys the host front ends report to the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Enter,
    Other,
}

/// Whether a keypress was taken by the gate or left for default handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDisposition {
    Consumed,
    PassThrough,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ContinuationState {
    #[default]
    Idle,
    AwaitingInput { prompt_text: String },
}

pub struct ContinuationGate {
    state: ContinuationState,
    resume: Option<ResumeAction>,
    process_running: bool,
}

impl Default for ContinuationGate {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ContinuationGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContinuationGate")
            .field("state", &self.state)
            .field("resume_bound", &self.resume.is_some())
            .field("process_running", &self.process_running)
            .finish()
    }
}

impl ContinuationGate {
    pub fn new() -> Self {
        Self {
            state: ContinuationState::Idle,
            resume: None,
            process_running: true,
        }
    }

    pub fn state(&self) -> &ContinuationState {
        &self.state
    }

    pub fn is_awaiting(&self) -> bool {
        matches!(self.state, ContinuationState::AwaitingInput { .. })
    }

    /// Replace the action run on release.
    pub fn bind_resume(&mut self, action: ResumeAction) {
        self.resume = Some(action);
    }

    /// Arm the gate. Returns false (and stays idle) once the process has exited.
    pub fn arm(&mut self, prompt_text: impl Into<String>) -> bool {
        if !self.process_running {
            debug!("Ignoring continuation prompt after process exit");
            return false;
        }
        let prompt_text = prompt_text.into();
        info!(prompt = %prompt_text, "Awaiting continuation keypress");
        self.state = ContinuationState::AwaitingInput { prompt_text };
        true
    }

    /// Offer a keypress to the gate.
    ///
    /// Enter while armed disarms the gate and runs the resume action once.
    pub fn handle_key(&mut self, key: KeyInput) -> KeyDisposition {
        if key != KeyInput::Enter || !self.is_awaiting() {
            return KeyDisposition::PassThrough;
        }

        self.state = ContinuationState::Idle;
        if let Some(resume) = self.resume.as_mut() {
            resume();
        }
        KeyDisposition::Consumed
    }

    /// The bound process exited: drop any pending prompt without resuming.
    pub fn process_exited(&mut self) {
        self.process_running = false;
        if self.is_awaiting() {
            debug!("Process exited while awaiting continuation; discarding prompt");
        }
        self.state = ContinuationState::Idle;
    }
}
