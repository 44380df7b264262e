//! Hand-written protobuf types for the call log.
//!
//! Uses prost derive macros for encode/decode without prost-build.
//!
//! ```proto
//! message CallEnvelope {
//!   uint64 sequence = 1;
//!   uint64 block_time = 2;
//!   string caller = 3;
//!   string contract = 4;
//!   string function = 5;
//!   repeated Arg args = 6;
//!   uint32 schema_version = 7;
//! }
//! message Arg { oneof kind { uint64 uint = 1; sint64 int = 2; string text = 3; bool flag = 4; Nothing nothing = 5; } }
//! message Nothing {}
//! ```

use prost::Message;

// ── Call Envelope ──────────────────────────────────────────────

#[derive(Clone, PartialEq, Message)]
pub struct ProtoCallEnvelope {
    #[prost(uint64, tag = "1")]
    pub sequence: u64,
    #[prost(uint64, tag = "2")]
    pub block_time: u64,
    #[prost(string, tag = "3")]
    pub caller: String,
    #[prost(string, tag = "4")]
    pub contract: String,
    #[prost(string, tag = "5")]
    pub function: String,
    #[prost(message, repeated, tag = "6")]
    pub args: Vec<ProtoArg>,
    #[prost(uint32, tag = "7")]
    pub schema_version: u32,
}

// ── Arguments ──────────────────────────────────────────────────

#[derive(Clone, PartialEq, Message)]
pub struct ProtoArg {
    #[prost(oneof = "ArgKind", tags = "1, 2, 3, 4, 5")]
    pub kind: Option<ArgKind>,
}

#[derive(Clone, PartialEq, prost::Oneof)]
pub enum ArgKind {
    #[prost(uint64, tag = "1")]
    Uint(u64),
    #[prost(sint64, tag = "2")]
    Int(i64),
    #[prost(string, tag = "3")]
    Text(String),
    #[prost(bool, tag = "4")]
    Flag(bool),
    #[prost(message, tag = "5")]
    Nothing(Nothing),
}

/// Explicit null argument.
#[derive(Clone, PartialEq, Message)]
pub struct Nothing {}
