//! Persistence envelope for compiled process definitions.
//!
//! A compiled [`Process`] is stored wrapped in a header that identifies the
//! format family (magic number), the body encoding, the compile time, and a
//! globally unique id. Extension headers are carried as explicitly tagged
//! values.
//!
//! # Binary layout
//!
//! ```text
//! +----------------+-----------------+---------------------+
//! | magic (11 B)   | format (u16 BE) | body (JSON)         |
//! +----------------+-----------------+---------------------+
//! ```

use std::collections::BTreeMap;
use std::io::{Read, Write};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ModelError, Result};
use crate::process::Process;

/// Length of the magic number prefix.
pub const MAGIC_LEN: usize = 11;

/// Magic number of the OFH format family, revision 2014-05-29.
pub const MAGIC_NUMBER_OFH_20140529: [u8; MAGIC_LEN] = [
    0x55, b'5', b'S', 0x00, b'O', b'F', b'H', 0x20, 0x14, 0x05, 0x29,
];

/// Magic number written by this build.
pub const CURRENT_MAGIC_NUMBER: [u8; MAGIC_LEN] = MAGIC_NUMBER_OFH_20140529;

/// Every magic number this build can read.
pub const KNOWN_MAGIC_NUMBERS: &[[u8; MAGIC_LEN]] = &[MAGIC_NUMBER_OFH_20140529];

/// Body encoding of an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum SerializationFormat {
    /// UTF-8 JSON body.
    Json,
}

impl SerializationFormat {
    /// Format used when none is requested.
    pub const DEFAULT: Self = Self::Json;

    /// Wire tag of the format.
    #[must_use]
    pub fn tag(self) -> u16 {
        match self {
            Self::Json => 0x30,
        }
    }
}

impl TryFrom<u16> for SerializationFormat {
    type Error = ModelError;

    fn try_from(tag: u16) -> Result<Self> {
        match tag {
            0x30 => Ok(Self::Json),
            other => Err(ModelError::UnsupportedFormat(other)),
        }
    }
}

impl From<SerializationFormat> for u16 {
    fn from(format: SerializationFormat) -> Self {
        format.tag()
    }
}

/// Value of an extension header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum HeaderValue {
    String(String),
    Integer(i64),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
    Bytes(Vec<u8>),
}

impl From<&str> for HeaderValue {
    fn from(value: &str) -> Self {
        HeaderValue::String(value.to_string())
    }
}

impl From<String> for HeaderValue {
    fn from(value: String) -> Self {
        HeaderValue::String(value)
    }
}

impl From<i64> for HeaderValue {
    fn from(value: i64) -> Self {
        HeaderValue::Integer(value)
    }
}

impl From<bool> for HeaderValue {
    fn from(value: bool) -> Self {
        HeaderValue::Boolean(value)
    }
}

/// A compiled process plus its identifying header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessEnvelope {
    pub magic: [u8; MAGIC_LEN],
    pub format: SerializationFormat,
    pub compile_time: DateTime<Utc>,
    pub guid: Uuid,
    #[serde(default)]
    pub other_headers: BTreeMap<String, HeaderValue>,
    pub process: Process,
}

impl ProcessEnvelope {
    /// Wrap a freshly compiled process with the current magic number and
    /// the default format.
    #[must_use]
    pub fn new(process: Process, compile_time: DateTime<Utc>) -> Self {
        Self {
            magic: CURRENT_MAGIC_NUMBER,
            format: SerializationFormat::DEFAULT,
            compile_time,
            guid: Uuid::new_v4(),
            other_headers: BTreeMap::new(),
            process,
        }
    }

    /// Add an extension header.
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<HeaderValue>) -> Self {
        self.other_headers.insert(key.into(), value.into());
        self
    }

    /// Verify the header describes something this build can handle.
    ///
    /// The magic number must be a known format family, the format must be
    /// supported and the GUID must not be nil.
    ///
    /// # Errors
    /// Returns the first violated rule.
    pub fn check_valid(&self) -> Result<()> {
        if !KNOWN_MAGIC_NUMBERS.contains(&self.magic) {
            return Err(ModelError::UnknownMagic(self.magic.to_vec()));
        }
        // Every constructible format is currently supported; the tag round
        // trip keeps this honest when a variant is added.
        SerializationFormat::try_from(self.format.tag())?;
        if self.guid.is_nil() {
            return Err(ModelError::NilGuid);
        }
        Ok(())
    }

    /// Write the framed envelope.
    ///
    /// # Errors
    /// Fails if the envelope is invalid or the writer fails.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        self.check_valid()?;
        writer.write_all(&self.magic)?;
        writer.write_all(&self.format.tag().to_be_bytes())?;
        match self.format {
            SerializationFormat::Json => serde_json::to_writer(&mut writer, self)?,
        }
        writer.flush()?;
        tracing::debug!(guid = %self.guid, process = %self.process.qname(), "Wrote process envelope");
        Ok(())
    }

    /// Serialize the framed envelope into a byte vector.
    ///
    /// # Errors
    /// Fails if the envelope is invalid.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_to(&mut buf)?;
        Ok(buf)
    }

    /// Read a framed envelope.
    ///
    /// # Errors
    /// Fails on an unknown magic number, an unsupported format, a body that
    /// does not decode, or a body whose header disagrees with the frame.
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let mut magic = [0u8; MAGIC_LEN];
        reader.read_exact(&mut magic)?;
        if !KNOWN_MAGIC_NUMBERS.contains(&magic) {
            return Err(ModelError::UnknownMagic(magic.to_vec()));
        }

        let mut tag = [0u8; 2];
        reader.read_exact(&mut tag)?;
        let format = SerializationFormat::try_from(u16::from_be_bytes(tag))?;

        let envelope: ProcessEnvelope = match format {
            SerializationFormat::Json => serde_json::from_reader(reader)?,
        };

        if envelope.magic != magic {
            return Err(ModelError::FrameMismatch(
                "magic number in body differs from frame".to_string(),
            ));
        }
        if envelope.format != format {
            return Err(ModelError::FrameMismatch(
                "format in body differs from frame".to_string(),
            ));
        }
        envelope.check_valid()?;
        Ok(envelope)
    }

    /// Deserialize a framed envelope from bytes.
    ///
    /// # Errors
    /// See [`ProcessEnvelope::read_from`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::read_from(bytes)
    }
}
