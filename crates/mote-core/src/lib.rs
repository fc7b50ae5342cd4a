//! Hardware-independent core library for mote-rs
//!
//! This crate contains all platform-agnostic logic for the battery-free
//! sensor node: the sample model, the cascade averaging engine and its ring
//! windows, the packet quantizer/encoder, the checkpointed acquisition
//! pipeline, and the sensor/transport trait seams the drivers plug into.
//!
//! It is `#![no_std]` so it compiles on both embedded targets and desktop
//! hosts (for the simulator and tests). Nothing in here allocates; durable
//! state is a single fixed-size record snapshotted through
//! [`checkpoint::CheckpointStore`] after every pipeline stage.

#![no_std]

pub mod cascade;
pub mod checkpoint;
pub mod config;
pub mod packet;
pub mod pipeline;
pub mod quantize;
pub mod sample;
pub mod sensors;
pub mod transport;
pub mod window;

pub use cascade::{CascadeEvent, CascadeState, LapStatus};
pub use packet::Packet;
pub use pipeline::{NodeState, Pipeline, Stage};
pub use sample::Sample;
pub use window::RingWindow;
