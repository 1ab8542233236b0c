/// One-shot continuity transition latch
///
/// The grid postpones its enter transition until the thumbnail at the
/// armed position has finished rendering. Render completions arrive for
/// every position, possibly more than once, so the latch fires at most
/// once per `arm`.

/// Latch state. `Fired` only follows `Armed`; `arm` always resets to `Armed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Latch {
    #[default]
    Disarmed,
    Armed { position: usize },
    Fired { position: usize },
}

/// Emitted once when the armed position is ready
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContinuitySignal {
    pub position: usize,
}

#[derive(Debug, Clone, Default)]
pub struct TransitionCoordinator {
    latch: Latch,
}

impl TransitionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latch(&self) -> Latch {
        self.latch
    }

    /// Target the next render completion for `position`
    pub fn arm(&mut self, position: usize) {
        self.latch = Latch::Armed { position };
    }

    /// Forget the target; late completions are ignored afterwards
    pub fn disarm(&mut self) {
        self.latch = Latch::Disarmed;
    }

    /// Armed and still waiting for its completion
    pub fn is_pending(&self) -> bool {
        matches!(self.latch, Latch::Armed { .. })
    }

    pub fn armed_position(&self) -> Option<usize> {
        match self.latch {
            Latch::Armed { position } | Latch::Fired { position } => Some(position),
            Latch::Disarmed => None,
        }
    }

    /// A render finished (successfully or not) for `position`.
    ///
    /// Returns the signal only for the first completion of the armed
    /// position since the last `arm`.
    pub fn notify_render_complete(&mut self, position: usize) -> Option<ContinuitySignal> {
        match self.latch {
            Latch::Armed { position: armed } if armed == position => {
                self.latch = Latch::Fired { position };
                Some(ContinuitySignal { position })
            }
            _ => None,
        }
    }
}
