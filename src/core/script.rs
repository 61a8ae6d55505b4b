use std::{fmt, io};

use bitcoin::{Script, ScriptBuf};

use crate::{core::try_copy, KernelError};

/// A single script pubkey containing spending conditions for a transaction output.
///
/// Script pubkeys can be created from raw script bytes or retrieved from existing
/// transaction outputs. Any byte string is accepted; whether the script is
/// executable is decided by the interpreter during verification. Equality is
/// byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScriptPubkey {
    script: ScriptBuf,
}

impl ScriptPubkey {
    pub fn new(script_bytes: &[u8]) -> Result<Self, KernelError> {
        Ok(ScriptPubkey {
            script: ScriptBuf::from_bytes(try_copy(script_bytes)?),
        })
    }

    /// The raw script bytes, borrowed for the lifetime of `self`.
    pub fn as_bytes(&self) -> &[u8] {
        self.script.as_bytes()
    }

    pub fn as_script(&self) -> &Script {
        self.script.as_script()
    }

    pub fn len(&self) -> usize {
        self.script.len()
    }

    pub fn is_empty(&self) -> bool {
        self.script.is_empty()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.script.to_bytes()
    }

    /// Writes the raw script bytes to `writer`.
    pub fn write_to<W: io::Write>(&self, writer: &mut W) -> Result<(), KernelError> {
        writer
            .write_all(self.as_bytes())
            .map_err(|_| KernelError::SerializationFailed)
    }
}

impl From<ScriptBuf> for ScriptPubkey {
    fn from(script: ScriptBuf) -> Self {
        ScriptPubkey { script }
    }
}

impl TryFrom<&[u8]> for ScriptPubkey {
    type Error = KernelError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        ScriptPubkey::new(bytes)
    }
}

impl From<ScriptPubkey> for Vec<u8> {
    fn from(script: ScriptPubkey) -> Self {
        script.script.into_bytes()
    }
}

impl From<&ScriptPubkey> for Vec<u8> {
    fn from(script: &ScriptPubkey) -> Self {
        script.to_bytes()
    }
}

impl AsRef<[u8]> for ScriptPubkey {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl fmt::Display for ScriptPubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_utils::test_entity_requirements;

    const P2WPKH: &str = "0014d4b4f5b5d8a5e2f9c1b3a7c6e8d0f2a4b6c8e0f2";

    test_entity_requirements!(test_script_pubkey_requirements, ScriptPubkey);

    #[test]
    fn test_new_keeps_bytes() {
        let bytes = hex::decode(P2WPKH).unwrap();
        let script = ScriptPubkey::new(&bytes).unwrap();
        assert_eq!(script.as_bytes(), bytes.as_slice());
        assert_eq!(script.len(), 22);
        assert!(script.as_script().is_p2wpkh());
        assert_eq!(script.to_string(), P2WPKH);
    }

    #[test]
    fn test_empty_and_garbage_scripts_are_accepted() {
        let empty = ScriptPubkey::new(&[]).unwrap();
        assert!(empty.is_empty());

        let garbage = ScriptPubkey::try_from([0xff, 0x4c, 0x00, 0x99].as_slice()).unwrap();
        assert_eq!(garbage.len(), 4);
    }

    #[test]
    fn test_equality_is_structural() {
        let a = ScriptPubkey::new(&[0x51]).unwrap();
        let b = ScriptPubkey::new(&[0x51]).unwrap();
        let c = ScriptPubkey::new(&[0x52]).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.clone(), a);
    }

    #[test]
    fn test_write_to() {
        let script = ScriptPubkey::new(&[0x6a, 0x01, 0x02]).unwrap();
        let mut sink = Vec::new();
        script.write_to(&mut sink).unwrap();
        assert_eq!(sink, Vec::<u8>::from(&script));
    }
}
