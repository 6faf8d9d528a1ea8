use crate::{Error, Result, inference::MaskResult};
use tracing::{debug, info, warn};

// Staged run states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagedState {
    Init,
    MaskRequested,
    MaskReceived,
    BlendRequested,
    Done,
    Failed,
}

// Staged run events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagedEvent {
    RequestMask,
    MaskArrived,
    RequestBlend,
    BlendArrived,
    ErrorOccurred,
}

/// State of one mask-then-blend pipeline run.
///
/// The mask lives inside the run value, so a blend can only ever consume
/// the mask produced by the same run. There are no backward transitions:
/// a failed blend never leads back to a new mask request.
#[derive(Debug)]
pub struct StagedRun {
    state: StagedState,
    mask: Option<MaskResult>,
    last_error: Option<String>,
}

impl StagedRun {
    pub fn new() -> Self {
        Self {
            state: StagedState::Init,
            mask: None,
            last_error: None,
        }
    }

    pub fn current_state(&self) -> StagedState {
        self.state
    }

    pub fn transition(&mut self, event: StagedEvent) -> Result<()> {
        let old_state = self.state;

        let new_state = match (old_state, event) {
            (StagedState::Init, StagedEvent::RequestMask) => StagedState::MaskRequested,
            (StagedState::MaskRequested, StagedEvent::MaskArrived) => StagedState::MaskReceived,
            (StagedState::MaskReceived, StagedEvent::RequestBlend) => StagedState::BlendRequested,
            (StagedState::BlendRequested, StagedEvent::BlendArrived) => StagedState::Done,
            (state, StagedEvent::ErrorOccurred) if !Self::is_terminal_state(state) => {
                StagedState::Failed
            }
            _ => {
                warn!(
                    "Invalid staged transition from {:?} with event {:?}",
                    old_state, event
                );
                return Err(Error::internal(format!(
                    "Invalid staged transition from {:?} with event {:?}",
                    old_state, event
                )));
            }
        };

        debug!(
            "Staged run transition: {:?} -> {:?} (event: {:?})",
            old_state, new_state, event
        );
        self.state = new_state;
        Ok(())
    }

    /// Stores the mask returned by this run's mask call.
    pub fn record_mask(&mut self, mask: MaskResult) -> Result<()> {
        self.transition(StagedEvent::MaskArrived)?;
        info!("Mask received ({} bytes)", mask.bytes.len());
        self.mask = Some(mask);
        Ok(())
    }

    /// Moves to `BlendRequested` and hands out the mask for the blend call.
    pub fn begin_blend(&mut self) -> Result<MaskResult> {
        self.transition(StagedEvent::RequestBlend)?;
        self.mask
            .take()
            .ok_or_else(|| Error::internal("Staged run has no mask to blend"))
    }

    /// Marks the run failed. Ignored once the run is terminal.
    pub fn fail(&mut self, error: &Error) {
        if self.is_terminal() {
            return;
        }
        warn!("Staged run failed in state {:?}: {}", self.state, error);
        self.last_error = Some(error.to_string());
        self.mask = None;
        self.state = StagedState::Failed;
    }

    pub fn is_terminal(&self) -> bool {
        Self::is_terminal_state(self.state)
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn is_terminal_state(state: StagedState) -> bool {
        matches!(state, StagedState::Done | StagedState::Failed)
    }
}

impl Default for StagedRun {
    fn default() -> Self {
        Self::new()
    }
}
