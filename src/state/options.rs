use std::path::{Path, PathBuf};

use crate::{
    ffi::{
        btck_ChainType, BTCK_CHAIN_TYPE_MAINNET, BTCK_CHAIN_TYPE_REGTEST, BTCK_CHAIN_TYPE_SIGNET,
        BTCK_CHAIN_TYPE_TESTNET, BTCK_CHAIN_TYPE_TESTNET_4,
    },
    KernelError,
};

/// Bitcoin network chain types.
///
/// Selects the network magic that separates records in the block files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i32)]
pub enum ChainType {
    /// Bitcoin mainnet - the production network
    #[default]
    Mainnet = BTCK_CHAIN_TYPE_MAINNET,
    /// Bitcoin testnet - the original test network
    Testnet = BTCK_CHAIN_TYPE_TESTNET,
    /// Bitcoin testnet4 - the newer test network
    Testnet4 = BTCK_CHAIN_TYPE_TESTNET_4,
    /// Bitcoin signet - signed test network
    Signet = BTCK_CHAIN_TYPE_SIGNET,
    /// Regression test network for local development
    Regtest = BTCK_CHAIN_TYPE_REGTEST,
}

impl ChainType {
    /// The four message start bytes of this network.
    pub fn magic(self) -> [u8; 4] {
        match self {
            ChainType::Mainnet => [0xf9, 0xbe, 0xb4, 0xd9],
            ChainType::Testnet => [0x0b, 0x11, 0x09, 0x07],
            ChainType::Testnet4 => [0x1c, 0x16, 0x3f, 0x28],
            ChainType::Signet => [0x0a, 0x03, 0xcf, 0x40],
            ChainType::Regtest => [0xfa, 0xbf, 0xb5, 0xda],
        }
    }
}

impl From<ChainType> for btck_ChainType {
    fn from(chain_type: ChainType) -> Self {
        chain_type as btck_ChainType
    }
}

impl TryFrom<btck_ChainType> for ChainType {
    type Error = KernelError;

    fn try_from(value: btck_ChainType) -> Result<Self, Self::Error> {
        match value {
            BTCK_CHAIN_TYPE_MAINNET => Ok(ChainType::Mainnet),
            BTCK_CHAIN_TYPE_TESTNET => Ok(ChainType::Testnet),
            BTCK_CHAIN_TYPE_TESTNET_4 => Ok(ChainType::Testnet4),
            BTCK_CHAIN_TYPE_SIGNET => Ok(ChainType::Signet),
            BTCK_CHAIN_TYPE_REGTEST => Ok(ChainType::Regtest),
            _ => Err(KernelError::InvalidArgument(format!(
                "unknown chain type {}",
                value
            ))),
        }
    }
}

/// Where and how to open a [`crate::Chain`].
#[derive(Debug, Clone)]
pub struct ChainOptions {
    data_dir: PathBuf,
    blocks_dir: PathBuf,
    chain_type: ChainType,
}

impl ChainOptions {
    pub fn builder(data_dir: impl Into<PathBuf>) -> ChainOptionsBuilder {
        ChainOptionsBuilder {
            data_dir: data_dir.into(),
            blocks_dir: None,
            chain_type: ChainType::default(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn blocks_dir(&self) -> &Path {
        &self.blocks_dir
    }

    pub fn chain_type(&self) -> ChainType {
        self.chain_type
    }
}

/// Builder for [`ChainOptions`].
///
/// The builder by default configures for mainnet and reads block files from
/// `<data_dir>/blocks`.
#[derive(Debug, Clone)]
pub struct ChainOptionsBuilder {
    data_dir: PathBuf,
    blocks_dir: Option<PathBuf>,
    chain_type: ChainType,
}

impl ChainOptionsBuilder {
    /// Sets the chain type
    pub fn chain_type(mut self, chain_type: ChainType) -> ChainOptionsBuilder {
        self.chain_type = chain_type;
        self
    }

    /// Overrides the block file directory
    pub fn blocks_dir(mut self, blocks_dir: impl Into<PathBuf>) -> ChainOptionsBuilder {
        self.blocks_dir = Some(blocks_dir.into());
        self
    }

    /// Consumes the builder and creates the [`ChainOptions`].
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::InvalidArgument`] if either directory does not exist.
    pub fn build(self) -> Result<ChainOptions, KernelError> {
        if !self.data_dir.is_dir() {
            return Err(KernelError::InvalidArgument(format!(
                "data directory {} does not exist",
                self.data_dir.display()
            )));
        }
        let blocks_dir = self
            .blocks_dir
            .unwrap_or_else(|| self.data_dir.join("blocks"));
        if !blocks_dir.is_dir() {
            return Err(KernelError::InvalidArgument(format!(
                "blocks directory {} does not exist",
                blocks_dir.display()
            )));
        }
        Ok(ChainOptions {
            data_dir: self.data_dir,
            blocks_dir,
            chain_type: self.chain_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_chain_type_conversions() {
        for value in 0..5 {
            let chain_type = ChainType::try_from(value).unwrap();
            assert_eq!(btck_ChainType::from(chain_type), value);
        }
        assert!(ChainType::try_from(5).is_err());
        assert_eq!(ChainType::default(), ChainType::Mainnet);
        assert_eq!(ChainType::Regtest.magic(), [0xfa, 0xbf, 0xb5, 0xda]);
    }

    #[test]
    fn test_builder_defaults() {
        let dir = TempDir::new("btck_options").unwrap();
        std::fs::create_dir(dir.path().join("blocks")).unwrap();

        let options = ChainOptions::builder(dir.path()).build().unwrap();
        assert_eq!(options.blocks_dir(), dir.path().join("blocks"));
        assert_eq!(options.chain_type(), ChainType::Mainnet);

        let options = ChainOptions::builder(dir.path())
            .blocks_dir(dir.path())
            .chain_type(ChainType::Signet)
            .build()
            .unwrap();
        assert_eq!(options.blocks_dir(), dir.path());
        assert_eq!(options.chain_type(), ChainType::Signet);
    }

    #[test]
    fn test_builder_rejects_missing_directories() {
        let dir = TempDir::new("btck_options").unwrap();
        assert!(matches!(
            ChainOptions::builder(dir.path()).build(),
            Err(KernelError::InvalidArgument(_))
        ));
        assert!(ChainOptions::builder(dir.path().join("missing"))
            .blocks_dir(dir.path())
            .build()
            .is_err());
    }
}
