//! Append-only call log of included calls, one protobuf frame per call.
//!
//! Frame layout: `[u32 LE length][ProtoCallEnvelope bytes]`, fsynced after
//! every append.
//!
//! The log holds only calls the kernel accepted, so the envelope rules are
//! enforced again at this boundary, on append and on load:
//!   - schema version 1
//!   - sequence starts at 1 and is contiguous
//!   - block time never decreases
//!
//! A truncated tail, an oversized frame or a frame breaking those rules
//! is reported as `InvalidData`.

use std::fs::{self, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use prost::Message;

use xeno_kernel::call::SCHEMA_VERSION;

use crate::proto_types::ProtoCallEnvelope;

/// Largest frame accepted on load.
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Position of the log head: the last included call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Head {
    sequence: u64,
    block_time: u64,
}

impl Head {
    /// Check that `call` may follow this head.
    fn admit(&self, call: &ProtoCallEnvelope) -> Result<Head, String> {
        if call.schema_version != SCHEMA_VERSION {
            return Err(format!(
                "call {} has schema version {}, expected {}",
                call.sequence, call.schema_version, SCHEMA_VERSION
            ));
        }
        if call.sequence != self.sequence + 1 {
            return Err(format!(
                "call {} does not follow call {}",
                call.sequence, self.sequence
            ));
        }
        if call.block_time < self.block_time {
            return Err(format!(
                "call {} block time {} precedes {}",
                call.sequence, call.block_time, self.block_time
            ));
        }
        Ok(Head {
            sequence: call.sequence,
            block_time: call.block_time,
        })
    }
}

#[derive(Debug)]
pub struct CallLog {
    path: PathBuf,
    head: Head,
}

impl CallLog {
    /// Open or create the log at `path`, validating every stored call.
    pub fn open(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let head = match read_calls(path)?.last() {
            Some(call) => Head {
                sequence: call.sequence,
                block_time: call.block_time,
            },
            None => Head::default(),
        };
        Ok(Self {
            path: path.to_path_buf(),
            head,
        })
    }

    /// Append one included call. Refused calls leave the file untouched.
    pub fn append(&mut self, call: &ProtoCallEnvelope) -> io::Result<()> {
        let next = self
            .head
            .admit(call)
            .map_err(|msg| io::Error::new(io::ErrorKind::InvalidInput, msg))?;

        let body = call.encode_to_vec();
        let len = u32::try_from(body.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "call frame exceeds u32 length"))?;
        let mut frame = Vec::with_capacity(4 + body.len());
        frame.extend_from_slice(&len.to_le_bytes());
        frame.extend_from_slice(&body);

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(&frame)?;
        file.sync_all()?;

        self.head = next;
        Ok(())
    }

    pub fn load_all(&self) -> io::Result<Vec<ProtoCallEnvelope>> {
        read_calls(&self.path)
    }

    /// Calls with sequence strictly greater than `after`.
    pub fn load_after(&self, after: u64) -> io::Result<Vec<ProtoCallEnvelope>> {
        let mut calls = self.load_all()?;
        calls.retain(|c| c.sequence > after);
        Ok(calls)
    }

    pub fn last_sequence(&self) -> u64 {
        self.head.sequence
    }

    pub fn last_block_time(&self) -> u64 {
        self.head.block_time
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn invalid(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}

/// Decode and validate every frame. A missing file is an empty log.
fn read_calls(path: &Path) -> io::Result<Vec<ProtoCallEnvelope>> {
    let bytes = match fs::File::open(path) {
        Ok(mut file) => {
            let mut bytes = Vec::new();
            file.read_to_end(&mut bytes)?;
            bytes
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut calls = Vec::new();
    let mut head = Head::default();
    let mut rest = bytes.as_slice();
    while !rest.is_empty() {
        let Some((len_bytes, tail)) = rest.split_first_chunk::<4>() else {
            return Err(invalid(format!("truncated frame header after call {}", head.sequence)));
        };
        let len = u32::from_le_bytes(*len_bytes) as usize;
        if len == 0 || len > MAX_FRAME_LEN {
            return Err(invalid(format!("frame length {} after call {}", len, head.sequence)));
        }
        if tail.len() < len {
            return Err(invalid(format!(
                "truncated frame after call {}: {} of {} bytes",
                head.sequence,
                tail.len(),
                len
            )));
        }
        let (body, tail) = tail.split_at(len);

        let call = ProtoCallEnvelope::decode(body)
            .map_err(|e| invalid(format!("undecodable frame after call {}: {}", head.sequence, e)))?;
        head = head.admit(&call).map_err(invalid)?;
        calls.push(call);
        rest = tail;
    }
    Ok(calls)
}
