use crate::engine::Simulation;
use crate::palette::Rgb;
use crate::rules::RuleSet;
use anyhow::Result;
use std::time::Duration;

pub(crate) const TURBO_THRESHOLD: u32 = 200;
pub(crate) const MAX_TURBO_STEPS: u32 = 100;
pub(crate) const MIN_SPEED: u32 = 1;
pub(crate) const MAX_SPEED: u32 = 1200;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Mode {
    /// One step per delay-paced tick.
    Normal,
    /// Several steps per display frame.
    Turbo,
}

impl Mode {
    pub(crate) fn for_speed(speed: u32) -> Self {
        if speed > TURBO_THRESHOLD {
            Mode::Turbo
        } else {
            Mode::Normal
        }
    }
}

pub(crate) fn steps_per_tick(speed: u32) -> u32 {
    match Mode::for_speed(speed) {
        Mode::Normal => 1,
        Mode::Turbo => ((speed - TURBO_THRESHOLD) / 10 + 1).min(MAX_TURBO_STEPS),
    }
}

/// Normal-mode gap between ticks: `floor(1000 / speed)` ms.
pub(crate) fn tick_delay(speed: u32) -> Duration {
    Duration::from_millis(u64::from(1000 / speed.max(MIN_SPEED)))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct CallbackId(pub(crate) u64);

/// The two scheduling primitives. Each must be cancelled with its own
/// counterpart; a timeout id handed to `cancel_frame` (or the reverse) is a
/// no-op on the host.
pub(crate) trait CallbackHost {
    fn set_timeout(&mut self, delay: Duration) -> CallbackId;
    fn clear_timeout(&mut self, id: CallbackId);
    fn request_frame(&mut self) -> CallbackId;
    fn cancel_frame(&mut self, id: CallbackId);
}

/// The single outstanding callback, tagged with the primitive that made it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PendingCallback {
    Timeout(CallbackId),
    Frame(CallbackId),
}

impl PendingCallback {
    pub(crate) fn id(self) -> CallbackId {
        match self {
            PendingCallback::Timeout(id) | PendingCallback::Frame(id) => id,
        }
    }

    fn cancel(self, host: &mut impl CallbackHost) {
        match self {
            PendingCallback::Timeout(id) => host.clear_timeout(id),
            PendingCallback::Frame(id) => host.cancel_frame(id),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RunState {
    Idle,
    Running(Mode),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct TickReport {
    pub(crate) mode: Mode,
    pub(crate) steps: u32,
}

pub(crate) struct Scheduler {
    speed: u32,
    state: RunState,
    pending: Option<PendingCallback>,
}

impl Scheduler {
    pub(crate) fn new(speed: u32) -> Self {
        Self {
            speed: speed.clamp(MIN_SPEED, MAX_SPEED),
            state: RunState::Idle,
            pending: None,
        }
    }

    pub(crate) fn speed(&self) -> u32 {
        self.speed
    }

    /// Takes effect on the next tick; never starts or stops the run.
    pub(crate) fn set_speed(&mut self, speed: u32) {
        let speed = speed.clamp(MIN_SPEED, MAX_SPEED);
        if Mode::for_speed(speed) != Mode::for_speed(self.speed) {
            log::debug!("speed {} -> {} crosses turbo threshold", self.speed, speed);
        }
        self.speed = speed;
    }

    pub(crate) fn turbo_indicator(&self) -> bool {
        Mode::for_speed(self.speed) == Mode::Turbo
    }

    pub(crate) fn state(&self) -> RunState {
        self.state
    }

    pub(crate) fn is_running(&self) -> bool {
        matches!(self.state, RunState::Running(_))
    }

    #[cfg(test)]
    pub(crate) fn pending(&self) -> Option<PendingCallback> {
        self.pending
    }

    /// Idle -> Running, ticking once right away. No-op while running.
    pub(crate) fn start<H, F>(
        &mut self,
        sim: &mut Simulation,
        host: &mut H,
        render: F,
    ) -> Result<Option<TickReport>>
    where
        H: CallbackHost,
        F: FnMut(&Simulation) -> Result<()>,
    {
        if self.is_running() {
            return Ok(None);
        }
        log::info!("start at speed {}", self.speed);
        self.tick(sim, host, render).map(Some)
    }

    pub(crate) fn pause(&mut self, host: &mut impl CallbackHost) {
        if let Some(p) = self.pending.take() {
            p.cancel(host);
        }
        if self.is_running() {
            log::info!("pause");
        }
        self.state = RunState::Idle;
    }

    /// Cancels any pending tick and puts the simulation back to its initial
    /// conditions.
    pub(crate) fn reset(&mut self, sim: &mut Simulation, host: &mut impl CallbackHost) {
        self.reinit(sim, host, Simulation::reset);
    }

    /// Same transition as `reset`, with new rules and ant color swapped in.
    pub(crate) fn apply(
        &mut self,
        sim: &mut Simulation,
        host: &mut impl CallbackHost,
        rules: RuleSet,
        ant_color: Rgb,
    ) {
        log::info!("apply rules: {} ant {}", rules.describe(), ant_color);
        self.reinit(sim, host, |sim| sim.reconfigure(rules, ant_color));
    }

    fn reinit<F>(&mut self, sim: &mut Simulation, host: &mut impl CallbackHost, init: F)
    where
        F: FnOnce(&mut Simulation),
    {
        self.pause(host);
        init(sim);
        log::info!("reset {}x{} grid", sim.grid.cols, sim.grid.rows);
    }

    /// Runs a tick if `id` is the outstanding callback. Stale ids are
    /// ignored.
    pub(crate) fn fire<H, F>(
        &mut self,
        id: CallbackId,
        sim: &mut Simulation,
        host: &mut H,
        render: F,
    ) -> Result<Option<TickReport>>
    where
        H: CallbackHost,
        F: FnMut(&Simulation) -> Result<()>,
    {
        match self.pending {
            Some(p) if p.id() == id => {
                self.pending = None;
                self.tick(sim, host, render).map(Some)
            }
            _ => {
                log::trace!("ignoring stale callback {:?}", id);
                Ok(None)
            }
        }
    }

    fn tick<H, F>(&mut self, sim: &mut Simulation, host: &mut H, mut render: F) -> Result<TickReport>
    where
        H: CallbackHost,
        F: FnMut(&Simulation) -> Result<()>,
    {
        let speed = self.speed;
        let mode = Mode::for_speed(speed);
        if self.state != RunState::Running(mode) {
            log::debug!("scheduler mode {:?} at speed {}", mode, speed);
        }
        self.state = RunState::Running(mode);

        let steps = sim.advance(steps_per_tick(speed));
        render(sim)?;

        self.pending = Some(match mode {
            Mode::Normal => PendingCallback::Timeout(host.set_timeout(tick_delay(speed))),
            Mode::Turbo => PendingCallback::Frame(host.request_frame()),
        });
        Ok(TickReport { mode, steps })
    }
}
