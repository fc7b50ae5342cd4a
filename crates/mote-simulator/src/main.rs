//! Host simulator for the mote-rs sensor node.
//!
//! Runs the full acquisition pipeline against a synthetic physical world
//! (sinusoidal magnetic field, drifting die temperature, noisy IMU) and an
//! in-memory checkpoint store that can cut power every N commits. Power
//! loss drops all volatile state and reboots the node from the last
//! committed snapshot; the world itself, of course, keeps existing.
//!
//! When crashes are injected, the final node state is compared against an
//! uninterrupted reference run over the same world seed, demonstrating that
//! arbitrary resumption leaves no trace.
//!
//! ```text
//! RUST_LOG=info cargo run -p mote-simulator -- --ticks 64 --crash-every 5
//! ```

use clap::Parser;
use log::{error, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use mote_core::checkpoint::{CheckpointStore, RamStore, StoreError};
use mote_core::config::MAG_OVERFLOW;
use mote_core::pipeline::{NodeState, Pipeline, Stage};
use mote_core::sensors::{Sensor, SensorError, SensorHub, SensorReadings};
use mote_core::transport::Radio;

#[derive(Parser, Debug, Clone)]
#[command(name = "mote-simulator", about = "Simulates the mote-rs node on the host")]
struct Args {
    /// Raw samples to acquire before exiting.
    #[arg(long, default_value_t = 64)]
    ticks: u64,

    /// Cut power every N checkpoint commits (omit for a clean run).
    #[arg(long)]
    crash_every: Option<u64>,

    /// Seed for the synthetic world.
    #[arg(long, default_value_t = 7)]
    seed: u64,

    /// Tick from which the magnetometer X axis reports its overflow code.
    #[arg(long)]
    mag_overflow_at: Option<u64>,

    /// Leave the IMU unpopulated; its channels transmit as zero.
    #[arg(long)]
    no_imu: bool,
}

// ---------------------------------------------------------------------------
// Synthetic world
// ---------------------------------------------------------------------------

/// Plain array readings for the synthetic drivers.
struct Axes<const N: usize>([i16; N]);

impl<const N: usize> SensorReadings<N> for Axes<N> {
    fn to_array(self) -> [i16; N] {
        self.0
    }
}

/// Die temperature: slow daily-ish drift around 21 degrees plus jitter.
struct SimTemp {
    rng: StdRng,
    t: u64,
}

impl SimTemp {
    fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed ^ 0x7e39),
            t: 0,
        }
    }
}

impl Sensor<1> for SimTemp {
    type Readings = Axes<1>;

    fn init(&mut self) -> bool {
        true
    }

    fn read(&mut self) -> Result<Axes<1>, SensorError> {
        self.t += 1;
        let drift = (self.t as f32 / 90.0).sin() * 3.0;
        let c = 21 + drift as i16 + self.rng.gen_range(-1..=1);
        Ok(Axes([c]))
    }
}

/// Magnetometer: sinusoidal field well inside the 12-bit range, with an
/// optional point where the X axis starts reporting the chip's overflow
/// code (a magnet parked next to the node).
struct SimMag {
    rng: StdRng,
    t: u64,
    overflow_at: Option<u64>,
}

impl SimMag {
    fn new(seed: u64, overflow_at: Option<u64>) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed ^ 0x11ae),
            t: 0,
            overflow_at,
        }
    }
}

impl Sensor<3> for SimMag {
    type Readings = Axes<3>;

    fn init(&mut self) -> bool {
        true
    }

    fn read(&mut self) -> Result<Axes<3>, SensorError> {
        self.t += 1;
        let phase = self.t as f32 / 40.0;
        let mut x = (900.0 * phase.sin()) as i16 + self.rng.gen_range(-20..=20);
        let y = (700.0 * (phase * 0.7).cos()) as i16 + self.rng.gen_range(-20..=20);
        let z = (300.0 * (phase * 1.3).sin()) as i16 + self.rng.gen_range(-20..=20);
        if let Some(at) = self.overflow_at
            && self.t > at
        {
            x = MAG_OVERFLOW;
        }
        Ok(Axes([x, y, z]))
    }
}

/// IMU: gravity-ish Z acceleration and small noise elsewhere.
struct SimImu {
    rng: StdRng,
    present: bool,
}

impl SimImu {
    fn new(seed: u64, present: bool) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed ^ 0xc4d2),
            present,
        }
    }
}

impl Sensor<6> for SimImu {
    type Readings = Axes<6>;

    fn init(&mut self) -> bool {
        self.present
    }

    fn read(&mut self) -> Result<Axes<6>, SensorError> {
        let mut axis = |center: i16, spread: i16| center + self.rng.gen_range(-spread..=spread);
        Ok(Axes([
            axis(0, 300),
            axis(0, 300),
            axis(4000, 300),
            axis(0, 100),
            axis(0, 100),
            axis(0, 100),
        ]))
    }
}

type SimHub = SensorHub<SimTemp, SimMag, SimImu>;

fn build_world(args: &Args) -> SimHub {
    SensorHub::new(
        SimTemp::new(args.seed),
        SimMag::new(args.seed, args.mag_overflow_at),
        SimImu::new(args.seed, !args.no_imu),
    )
}

// ---------------------------------------------------------------------------
// Transport and checkpoint fakes
// ---------------------------------------------------------------------------

/// Radio that prints each frame as hex.
#[derive(Default)]
struct LogRadio {
    frames: u64,
}

impl Radio for LogRadio {
    type Error = std::convert::Infallible;

    fn open_tx(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn send(&mut self, frame: &[u8]) -> Result<(), Self::Error> {
        self.frames += 1;
        let hex: String = frame.iter().map(|b| format!("{b:02x}")).collect();
        info!("radio frame #{}: {hex}", self.frames);
        Ok(())
    }

    fn close(&mut self) {}
}

/// RamStore wrapper that fails a commit (power loss) every `period`
/// eligible commits.
///
/// Commits recording that the next stage is `Admit` are left alone: the
/// stage re-executed after that loss would be `Acquire`, which re-reads the
/// physical world and would make comparison against a reference run
/// meaningless. Every other stage is a pure function of the committed
/// state, so losing its commit exercises exactly the re-execution guarantee
/// the node relies on.
struct FlakyStore {
    inner: RamStore,
    period: Option<u64>,
    since_failure: u64,
    failures: u64,
}

impl FlakyStore {
    fn new(period: Option<u64>) -> Self {
        Self {
            inner: RamStore::new(),
            period,
            since_failure: 0,
            failures: 0,
        }
    }
}

impl CheckpointStore for FlakyStore {
    fn load(&mut self) -> Result<Option<NodeState>, StoreError> {
        self.inner.load()
    }

    fn commit(&mut self, state: &NodeState) -> Result<(), StoreError> {
        if let Some(period) = self.period
            && state.stage != Stage::Admit
        {
            self.since_failure += 1;
            if self.since_failure >= period {
                self.since_failure = 0;
                self.failures += 1;
                return Err(StoreError::Interrupted);
            }
        }
        self.inner.commit(state)
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// Run the node until `ticks` raw samples have been acquired, rebooting
/// from the last committed snapshot on every injected power loss.
fn run(mut hub: SimHub, store: FlakyStore, ticks: u64) -> (NodeState, LogRadio, u64) {
    hub.init();
    let mut pipeline =
        Pipeline::new(hub, LogRadio::default(), store).expect("fresh store cannot fail to load");

    loop {
        if pipeline.state().ticks >= ticks && pipeline.state().stage == Stage::Acquire {
            let state = pipeline.state().clone();
            let (_, radio, store) = pipeline.into_parts();
            return (state, radio, store.failures);
        }
        match pipeline.tick() {
            Ok(()) => {}
            Err(StoreError::Interrupted) => {
                info!("power lost; rebooting from last committed snapshot");
                let (mut hub, radio, store) = pipeline.into_parts();
                // A real reboot re-runs sensor bring-up.
                hub.init();
                pipeline = Pipeline::new(hub, radio, store)
                    .expect("store with a committed snapshot cannot fail to load");
            }
            Err(e) => panic!("unexpected store failure: {e}"),
        }
    }
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    info!(
        "simulating {} ticks (seed {}, crash every {:?} commits)",
        args.ticks, args.seed, args.crash_every
    );

    let (state, radio, failures) = run(build_world(&args), FlakyStore::new(args.crash_every), args.ticks);

    info!(
        "done: {} ticks, {} frames, {} injected power failures",
        state.ticks, radio.frames, failures
    );
    for bank in 0..mote_core::config::BANK_COUNT {
        info!("bank {bank} mean: {:?}", state.cascade.bank_mean(bank).channels);
    }

    if args.crash_every.is_some() {
        // Same world, no interruptions.
        let (reference, _, _) = run(build_world(&args), FlakyStore::new(None), args.ticks);
        if state == reference {
            info!("crash run state matches uninterrupted reference run");
        } else {
            error!("STATE DIVERGED from uninterrupted reference run");
            error!("  crashed:   {state:?}");
            error!("  reference: {reference:?}");
            std::process::exit(1);
        }
    }
}
