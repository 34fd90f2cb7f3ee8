//! Voice relay bridge
//!
//! Couples a telephony media stream with a realtime agent connection for the
//! lifetime of one call:
//! - caller audio flows to the agent as `input_audio_buffer.append`
//! - agent speech flows back as telephony `media` frames, each followed by a mark
//! - caller speech over the agent triggers barge-in

pub mod agent_reader;
pub mod barge_in;
pub mod connector;
pub mod initializer;
pub mod link;
pub mod memory;
pub mod reader;
pub mod supervisor;
pub mod telephony_reader;

pub use agent_reader::AgentReader;
pub use barge_in::BargeInController;
pub use connector::{AgentConnection, AgentConnector, RealtimeConnector};
pub use initializer::SessionInitializer;
pub use link::Link;
pub use reader::ReaderExit;
pub use supervisor::{CallSummary, RelayConfig, RelaySupervisor, Side};
pub use telephony_reader::TelephonyReader;
