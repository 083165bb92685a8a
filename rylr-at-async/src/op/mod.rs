//! Commands, replies and frames of the RYLR AT protocol.

pub mod command;
pub mod param;
pub mod rcv;
pub mod reply;

pub use command::{Command, CommandLine, Query};
pub use param::{Bandwidth, CodingRate, Mode, RadioParameters, SpreadingFactor};
pub use rcv::{MessageState, ReceivedMessage};
pub use reply::Reply;
