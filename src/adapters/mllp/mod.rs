//! MLLP transport
//!
//! - [`codec`] - frame scanning and the `tokio_util` codec
//! - [`ack`] - `ACK` message construction
//! - [`sink`] - where inbound frames go once acknowledged
//! - [`server`] - the listener
//! - [`client`] - the sender

pub mod ack;
pub mod client;
pub mod codec;
pub mod server;
pub mod sink;

pub use ack::{build_ack, AckCode};
pub use client::{MllpClient, MllpConnection};
pub use codec::{scan_frame, FrameScan, MllpCodec};
pub use server::MllpServer;
pub use sink::{select_sink, AckOnlySink, InboundSink, SpoolSink};
