//! # Sampler Module
//!
//! Per-frame sampling loop: read the device, apply the mapping, emit the frame.
//!
//! ## States
//!
//! | State | Meaning |
//! |-------|---------|
//! | `Idle` | No device bound, ticks do nothing |
//! | `Running` | One device bound, every tick samples it |
//!
//! `Idle → Running` happens on [`Sampler::bind`]. The sampler only leaves
//! `Running` on its own when the optional liveness check is enabled
//! (`liveness_miss_limit > 0`) and that many consecutive reads come back empty.
//!
//! ## Cadence
//!
//! Ticks come from a tokio interval at `frame_rate_hz` with
//! [`MissedTickBehavior::Skip`]: a late tick is not followed by a burst of
//! catch-up ticks, so the loop neither drifts nor duplicates frames.
//!
//! The loop runs until its [`StopSignal`] fires. No error ends it.

mod stop;

pub use stop::{stop_channel, StopHandle, StopSignal};

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::SamplerConfig;
use crate::controller::SnapshotSource;
use crate::mapping::{MappingView, SemanticFrame};
use crate::transport::Transport;

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Binding state of the sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerState {
    Idle,
    Running,
}

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No device bound.
    Idle,
    /// Frame handed to the transport.
    Emitted,
    /// Device not readable this tick; nothing emitted.
    Skipped,
    /// Frame built but the transport refused it.
    Dropped,
    /// Liveness limit reached; the sampler is now `Idle`.
    DeviceLost,
}

/// Why [`Sampler::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerExit {
    /// The stop signal fired.
    Stopped,
    /// No device is bound (never bound, or dropped by the liveness check).
    Idle,
}

/// Running counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SamplerStats {
    /// Ticks taken while `Running`.
    pub ticks: u64,
    /// Frames handed to the transport.
    pub emitted: u64,
    /// Ticks skipped because the device was not readable.
    pub skipped: u64,
    /// Frames the transport refused.
    pub dropped: u64,
}

/// Continuous sampler bound to at most one device.
pub struct Sampler<T> {
    mapping: MappingView,
    transport: T,
    event_name: String,
    frame_period: Duration,
    liveness_miss_limit: u32,
    log_interval_frames: u64,
    source: Option<Box<dyn SnapshotSource>>,
    consecutive_misses: u32,
    stats: SamplerStats,
}

impl<T: Transport> Sampler<T> {
    /// Creates an `Idle` sampler.
    pub fn new(
        mapping: MappingView,
        transport: T,
        config: &SamplerConfig,
        event_name: impl Into<String>,
    ) -> Self {
        let rate = config.frame_rate_hz.max(1);
        Self {
            mapping,
            transport,
            event_name: event_name.into(),
            frame_period: Duration::from_nanos(NANOS_PER_SEC / u64::from(rate)),
            liveness_miss_limit: config.liveness_miss_limit,
            log_interval_frames: config.log_interval_frames.max(1),
            source: None,
            consecutive_misses: 0,
            stats: SamplerStats::default(),
        }
    }

    #[must_use]
    pub fn state(&self) -> SamplerState {
        if self.source.is_some() {
            SamplerState::Running
        } else {
            SamplerState::Idle
        }
    }

    #[must_use]
    pub fn stats(&self) -> SamplerStats {
        self.stats
    }

    /// Interval between ticks.
    #[must_use]
    pub fn frame_period(&self) -> Duration {
        self.frame_period
    }

    /// Binds a newly connected device: `Idle → Running`.
    ///
    /// Binding while already running replaces the previous device.
    pub fn bind(&mut self, source: Box<dyn SnapshotSource>) {
        info!("Sampler bound to {}", source.describe());
        self.source = Some(source);
        self.consecutive_misses = 0;
    }

    /// Releases the device: `Running → Idle`.
    pub fn unbind(&mut self) -> Option<Box<dyn SnapshotSource>> {
        self.consecutive_misses = 0;
        self.source.take()
    }

    /// Runs one sampling step.
    ///
    /// The mapping table is taken once per tick, so every input in the frame is
    /// resolved against the same table.
    pub fn tick(&mut self) -> TickOutcome {
        let Some(source) = self.source.as_mut() else {
            return TickOutcome::Idle;
        };
        self.stats.ticks += 1;

        let Some(snapshot) = source.read() else {
            self.stats.skipped += 1;
            self.consecutive_misses = self.consecutive_misses.saturating_add(1);

            if self.liveness_miss_limit > 0 && self.consecutive_misses >= self.liveness_miss_limit {
                warn!(
                    "Device unreadable for {} consecutive ticks, returning to idle",
                    self.consecutive_misses
                );
                self.unbind();
                return TickOutcome::DeviceLost;
            }

            debug!("Device not readable, skipping tick");
            return TickOutcome::Skipped;
        };
        self.consecutive_misses = 0;

        let table = self.mapping.current();
        let frame = SemanticFrame::build(&table, &snapshot);

        match self.transport.emit(&self.event_name, &frame) {
            Ok(()) => {
                self.stats.emitted += 1;
                TickOutcome::Emitted
            }
            Err(e) => {
                self.stats.dropped += 1;
                debug!("Frame dropped: {}", e);
                TickOutcome::Dropped
            }
        }
    }

    /// Ticks at the configured rate until `stop` fires or no device is bound.
    ///
    /// Returns the sampler so the caller can rebind it after a device loss.
    pub async fn run(mut self, mut stop: StopSignal) -> (Self, SamplerExit) {
        if self.state() == SamplerState::Idle {
            return (self, SamplerExit::Idle);
        }

        let mut ticker = interval(self.frame_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            "Sampling at {:.0}Hz, emitting '{}' events",
            1.0 / self.frame_period.as_secs_f64(),
            self.event_name
        );

        loop {
            tokio::select! {
                biased;

                _ = stop.stopped() => {
                    info!("Sampler stopped");
                    return (self, SamplerExit::Stopped);
                }

                _ = ticker.tick() => {
                    match self.tick() {
                        TickOutcome::DeviceLost | TickOutcome::Idle => {
                            return (self, SamplerExit::Idle);
                        }
                        _ => {}
                    }

                    if self.stats.ticks % self.log_interval_frames == 0 {
                        let stats = self.stats;
                        info!(
                            "Sampled {} ticks ({} emitted, {} skipped, {} dropped)",
                            stats.ticks, stats.emitted, stats.skipped, stats.dropped
                        );
                    }
                }
            }
        }
    }
}

impl<T: Transport + 'static> Sampler<T> {
    /// Spawns [`Sampler::run`] on the tokio runtime.
    pub fn spawn(self, stop: StopSignal) -> JoinHandle<(Self, SamplerExit)> {
        tokio::spawn(self.run(stop))
    }
}
