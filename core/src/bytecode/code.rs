use core::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::{Constant, Instruction};

/// First 16 bytes of the SHA-256 digest of a unit's source text.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Checksum(pub [u8; 16]);

impl Checksum {
    pub fn of_source(source: &str) -> Self {
        let digest = Sha256::digest(source.as_bytes());
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest[..16]);
        Checksum(bytes)
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Debug for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Checksum({})", self.to_hex())
    }
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to encode bytecode: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    #[error("failed to decode bytecode: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
}

/// A compiled unit: constant pool plus flat instruction stream.
///
/// The checksum travels with the unit but is not part of the encoded
/// payload, and two units compare equal when their constants and
/// instructions do.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct Bytecode {
    #[serde(skip)]
    pub checksum: Checksum,
    pub constants: Vec<Constant>,
    pub instructions: Vec<Instruction>,
}

impl PartialEq for Bytecode {
    fn eq(&self, other: &Self) -> bool {
        self.constants == other.constants && self.instructions == other.instructions
    }
}

impl Eq for Bytecode {}

impl Bytecode {
    /// Encode constants and instructions as a self-describing MessagePack map.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        Ok(rmp_serde::to_vec_named(self)?)
    }

    /// Decode a payload produced by [`Bytecode::encode`].
    ///
    /// The returned unit carries a default checksum; callers that know the
    /// source attach it themselves.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        Ok(rmp_serde::from_slice(bytes)?)
    }

    pub fn with_checksum(mut self, checksum: Checksum) -> Self {
        self.checksum = checksum;
        self
    }
}

impl fmt::Debug for Bytecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Bytecode {{")?;
        writeln!(f, "  checksum: {}", self.checksum.to_hex())?;

        if !self.constants.is_empty() {
            writeln!(f, "  constants: [")?;
            for (i, constant) in self.constants.iter().enumerate() {
                writeln!(f, "    [{}] = {:?}", i, constant)?;
            }
            writeln!(f, "  ]")?;
        } else {
            writeln!(f, "  constants: []")?;
        }

        // Function bodies are indented one level per nesting depth.
        writeln!(f, "  instructions:")?;
        let mut depth = 0usize;
        for (addr, instr) in self.instructions.iter().enumerate() {
            if let Instruction::PopFunction = instr {
                depth = depth.saturating_sub(1);
            }
            writeln!(f, "    {:4}  {:indent$}{:?}", addr, "", instr, indent = depth * 2)?;
            if let Instruction::PushFunction(_) = instr {
                depth += 1;
            }
        }

        write!(f, "}}")
    }
}
