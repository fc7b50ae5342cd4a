//! The checkpointed acquisition pipeline.
//!
//! A deterministic, non-preemptive cycle: acquire a sample, admit it at
//! level 0, drive any resulting lap one bank visit at a time, encode the
//! packet, transmit, repeat. Each stage is a pure step over the durable
//! [`NodeState`]; the driver loop commits the whole state after every step,
//! so a power loss anywhere re-executes exactly one interrupted stage from
//! its committed pre-state and lands in the same place an uninterrupted run
//! would. Lap N+1 cannot begin before lap N's completion is committed,
//! because the stage machine only returns to acquisition after the lap's
//! final visit (and the commit that records it).

use serde::{Deserialize, Serialize};

use crate::cascade::{CascadeEvent, CascadeState, LapStatus};
use crate::checkpoint::{CheckpointStore, StoreError};
use crate::config::{LONG_TERM_BANK, SHORT_TERM_BANK};
use crate::packet::Packet;
use crate::sample::Sample;
use crate::sensors::SampleSource;
use crate::transport::Radio;

/// Stage identifiers of the pipeline state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Stage {
    /// Read all sensors into `latest`.
    #[default]
    Acquire,
    /// Feed `latest` into the level-0 window.
    Admit,
    /// One bank visit of the active lap.
    LapStep,
    /// Quantize and pack the selected bank means.
    Encode,
    /// Hand the packet to the radio, best-effort.
    Transmit,
}

/// The single durable record: everything a resumed device needs to carry on
/// exactly where the last committed stage left off.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeState {
    /// Next stage to execute.
    pub stage: Stage,
    pub cascade: CascadeState,
    /// Most recent raw sample; also the encoder's overflow-flag source.
    pub latest: Sample,
    /// Packet staged for (re)transmission.
    pub packet: Packet,
    /// Raw samples acquired over the device lifetime.
    pub ticks: u64,
}

/// Ties the sample source, cascade, encoder, and radio into the cyclic
/// schedule, committing state through `C` at every step boundary.
pub struct Pipeline<S, R, C> {
    source: S,
    radio: R,
    store: C,
    state: NodeState,
}

impl<S, R, C> Pipeline<S, R, C>
where
    S: SampleSource,
    R: Radio,
    C: CheckpointStore,
{
    /// Boot: resume from the last committed snapshot, or start fresh on a
    /// factory-new store.
    pub fn new(source: S, radio: R, mut store: C) -> Result<Self, StoreError> {
        let state = match store.load()? {
            Some(state) => {
                log::info!(
                    "resuming at stage {:?}, tick {}, lap target {}",
                    state.stage,
                    state.ticks,
                    state.cascade.lap_target()
                );
                state
            }
            None => {
                log::info!("cold boot, zero-initialized state");
                NodeState::default()
            }
        };
        Ok(Self {
            source,
            radio,
            store,
            state,
        })
    }

    /// Execute the current stage, commit the resulting state, and return
    /// the stage that will run next.
    pub fn step(&mut self) -> Result<Stage, StoreError> {
        let next = match self.state.stage {
            Stage::Acquire => {
                self.state.latest = self.source.read_sample();
                self.state.ticks += 1;
                Stage::Admit
            }
            Stage::Admit => match self.state.cascade.admit_raw(self.state.latest) {
                CascadeEvent::Quiet => Stage::Acquire,
                CascadeEvent::Seeded => Stage::Acquire,
                CascadeEvent::LapStarted => Stage::LapStep,
            },
            Stage::LapStep => match self.state.cascade.lap_step() {
                LapStatus::InProgress => Stage::LapStep,
                LapStatus::Complete => Stage::Encode,
            },
            Stage::Encode => {
                self.state.packet = Packet::encode(
                    &self.state.cascade.bank_mean(SHORT_TERM_BANK),
                    &self.state.cascade.bank_mean(LONG_TERM_BANK),
                    &self.state.latest,
                );
                Stage::Transmit
            }
            Stage::Transmit => {
                self.transmit();
                Stage::Acquire
            }
        };

        self.state.stage = next;
        self.store.commit(&self.state)?;
        Ok(next)
    }

    /// Run stages until the machine is back at [`Stage::Acquire`]: one full
    /// tick when starting there, the tail of an interrupted tick when
    /// resuming mid-cycle.
    pub fn tick(&mut self) -> Result<(), StoreError> {
        while self.step()? != Stage::Acquire {}
        Ok(())
    }

    /// One packet per lap, no retries: transport failures are logged and
    /// the packet is dropped.
    fn transmit(&mut self) {
        let frame = self.state.packet.as_bytes();
        let sent = self
            .radio
            .open_tx()
            .and_then(|()| self.radio.send(frame));
        match sent {
            Ok(()) => log::debug!("transmitted {} byte packet", frame.len()),
            Err(e) => log::error!("transmit failed, dropping packet: {e:?}"),
        }
        self.radio.close();
    }

    pub const fn state(&self) -> &NodeState {
        &self.state
    }

    /// Release the collaborators, e.g. to rebuild after simulated power
    /// loss.
    pub fn into_parts(self) -> (S, R, C) {
        (self.source, self.radio, self.store)
    }
}
