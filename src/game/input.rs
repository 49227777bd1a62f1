//! Input Actions and Recording
//!
//! The host maps devices to [`GameAction`]s and calls `start`/`stop`.
//! The simulation polls an [`InputFrame`] once per substep.
//!
//! Attack is one-shot: starting it arms a pending flag that the first
//! substep consumes, and stopping it has no effect.

use serde::{Deserialize, Serialize};

use crate::core::hash::{StateHash, StateHasher};

// =============================================================================
// ACTIONS
// =============================================================================

/// Abstract player actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameAction {
    MoveLeft,
    MoveRight,
    Jump,
    Attack,
}

impl GameAction {
    /// Flag bit in [`InputFrame::flags`].
    #[inline]
    pub const fn flag(self) -> u8 {
        match self {
            GameAction::MoveLeft => InputFrame::FLAG_LEFT,
            GameAction::MoveRight => InputFrame::FLAG_RIGHT,
            GameAction::Jump => InputFrame::FLAG_JUMP,
            GameAction::Attack => InputFrame::FLAG_ATTACK,
        }
    }
}

// =============================================================================
// INPUT FRAME
// =============================================================================

/// Input state for one substep, packed into a byte.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct InputFrame {
    /// Action flags (packed bits):
    /// - Bit 0: MoveLeft held
    /// - Bit 1: MoveRight held
    /// - Bit 2: Jump held
    /// - Bit 3: Attack pressed (one-shot)
    /// - Bit 4-7: Reserved
    pub flags: u8,
}

impl InputFrame {
    /// Size in bytes
    pub const SIZE: usize = 1;

    pub const FLAG_LEFT: u8 = 0x01;
    pub const FLAG_RIGHT: u8 = 0x02;
    pub const FLAG_JUMP: u8 = 0x04;
    pub const FLAG_ATTACK: u8 = 0x08;

    /// Create an idle frame.
    pub const fn new() -> Self {
        Self { flags: 0 }
    }

    /// Create a frame from raw flags.
    pub const fn from_flags(flags: u8) -> Self {
        Self { flags }
    }

    /// Check whether an action is set.
    #[inline]
    pub fn has(&self, action: GameAction) -> bool {
        self.flags & action.flag() != 0
    }

    /// Set or clear an action.
    #[inline]
    pub fn set(&mut self, action: GameAction, on: bool) {
        if on {
            self.flags |= action.flag();
        } else {
            self.flags &= !action.flag();
        }
    }

    /// Builder form of [`set`](Self::set).
    #[inline]
    pub fn with(mut self, action: GameAction) -> Self {
        self.set(action, true);
        self
    }

    /// Horizontal intent: -1, 0 or +1. Opposite directions cancel.
    #[inline]
    pub fn horizontal(&self) -> i32 {
        let left = self.has(GameAction::MoveLeft) as i32;
        let right = self.has(GameAction::MoveRight) as i32;
        right - left
    }

    /// Any horizontal action held.
    #[inline]
    pub fn is_moving(&self) -> bool {
        self.has(GameAction::MoveLeft) || self.has(GameAction::MoveRight)
    }

    #[inline]
    pub fn jump_held(&self) -> bool {
        self.has(GameAction::Jump)
    }

    #[inline]
    pub fn attack_pressed(&self) -> bool {
        self.has(GameAction::Attack)
    }

    /// Check if this is an idle frame.
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.flags == 0
    }
}

// =============================================================================
// ACTION SET
// =============================================================================

/// Held-action set mutated by the host between ticks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSet {
    held: InputFrame,
    attack_pending: bool,
}

impl ActionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the set a recorded frame was taken from.
    pub fn from_frame(frame: InputFrame) -> Self {
        let mut held = frame;
        held.set(GameAction::Attack, false);
        Self {
            held,
            attack_pending: frame.attack_pressed(),
        }
    }

    /// Begin an action. Attack arms a single press.
    pub fn start(&mut self, action: GameAction) {
        match action {
            GameAction::Attack => self.attack_pending = true,
            other => self.held.set(other, true),
        }
    }

    /// End an action. Ignored for Attack.
    pub fn stop(&mut self, action: GameAction) {
        if action != GameAction::Attack {
            self.held.set(action, false);
        }
    }

    /// Release everything, including a pending attack.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Current frame without consuming the attack.
    pub fn peek(&self) -> InputFrame {
        let mut frame = self.held;
        frame.set(GameAction::Attack, self.attack_pending);
        frame
    }

    /// Frame for the next substep. Consumes a pending attack.
    pub fn poll(&mut self) -> InputFrame {
        let frame = self.peek();
        self.attack_pending = false;
        frame
    }

    /// Is `action` currently active?
    pub fn is_active(&self, action: GameAction) -> bool {
        self.peek().has(action)
    }
}

// =============================================================================
// INPUT LOG
// =============================================================================

/// Input state that began at a given external tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct InputDelta {
    /// External tick when this input state began
    pub tick: u32,
    /// The new input state
    pub frame: InputFrame,
}

impl InputDelta {
    pub fn new(tick: u32, frame: InputFrame) -> Self {
        Self { tick, frame }
    }
}

/// Recording of a session's external ticks, for deterministic replay.
///
/// Every tick's wall-clock delta is stored; input frames are stored only
/// when they change.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InputLog {
    /// Level the recording was made on
    pub level_id: String,

    /// Wall-clock delta supplied to each external tick
    tick_deltas: Vec<f64>,

    /// Delta-compressed input data.
    deltas: Vec<InputDelta>,

    /// Last recorded input (for delta comparison)
    #[serde(skip)]
    last_frame: Option<InputFrame>,
}

impl InputLog {
    /// Create an empty log for a level.
    pub fn new(level_id: impl Into<String>) -> Self {
        Self {
            level_id: level_id.into(),
            tick_deltas: Vec::with_capacity(1024),
            deltas: Vec::with_capacity(128),
            last_frame: None,
        }
    }

    /// Record one external tick. Returns its index.
    ///
    /// `frame` is the input visible at the start of the tick, including a
    /// pending attack press.
    pub fn record(&mut self, dt: f64, frame: InputFrame) -> u32 {
        let tick = self.tick_deltas.len() as u32;
        self.tick_deltas.push(dt);

        if self.last_frame != Some(frame) {
            self.deltas.push(InputDelta::new(tick, frame));
            self.last_frame = Some(frame);
        }
        tick
    }

    /// Number of recorded external ticks.
    pub fn len(&self) -> usize {
        self.tick_deltas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tick_deltas.is_empty()
    }

    /// Number of delta entries.
    pub fn delta_count(&self) -> usize {
        self.deltas.len()
    }

    /// Get input at a specific tick (binary search).
    pub fn input_at(&self, tick: u32) -> InputFrame {
        let idx = self.deltas.partition_point(|d| d.tick <= tick);
        if idx == 0 {
            InputFrame::new()
        } else {
            self.deltas[idx - 1].frame
        }
    }

    /// Wall-clock delta of a recorded tick.
    pub fn dt_at(&self, tick: u32) -> Option<f64> {
        self.tick_deltas.get(tick as usize).copied()
    }

    /// Iterate `(dt, frame)` per recorded tick.
    pub fn replay_iter(&self) -> ReplayIterator<'_> {
        ReplayIterator {
            log: self,
            current_tick: 0,
            delta_idx: 0,
            current_frame: InputFrame::new(),
        }
    }

    /// Hash of the recording (level, deltas and frames).
    pub fn compute_hash(&self) -> StateHash {
        let mut hasher = StateHasher::for_input_log();
        hasher.update_str(&self.level_id);
        hasher.update_u64(self.tick_deltas.len() as u64);
        for dt in &self.tick_deltas {
            hasher.update_f64(*dt);
        }
        for delta in &self.deltas {
            hasher.update_u32(delta.tick);
            hasher.update_u8(delta.frame.flags);
        }
        hasher.finalize()
    }

    /// Serialize to binary.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Deserialize from binary.
    pub fn from_bytes(data: &[u8]) -> Result<Self, bincode::Error> {
        let mut log: Self = bincode::deserialize(data)?;
        log.last_frame = log.deltas.last().map(|d| d.frame);
        Ok(log)
    }
}

/// Iterator for replaying a log tick-by-tick.
pub struct ReplayIterator<'a> {
    log: &'a InputLog,
    current_tick: u32,
    delta_idx: usize,
    current_frame: InputFrame,
}

impl<'a> Iterator for ReplayIterator<'a> {
    type Item = (f64, InputFrame);

    fn next(&mut self) -> Option<Self::Item> {
        let dt = self.log.dt_at(self.current_tick)?;

        while self.delta_idx < self.log.deltas.len() {
            let delta = &self.log.deltas[self.delta_idx];
            if delta.tick <= self.current_tick {
                self.current_frame = delta.frame;
                self.delta_idx += 1;
            } else {
                break;
            }
        }

        self.current_tick += 1;
        Some((dt, self.current_frame))
    }
}

// =============================================================================
// TESTS
// =============================================================================
