use crate::errors::GitError;

/// High nibble of the packed 16-bit index mode word. Only three values are
/// valid on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModeType {
    #[default]
    Regular = 0b1000,
    Symlink = 0b1010,
    Gitlink = 0b1110,
}

impl ModeType {
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    pub fn try_from_u16(value: u16) -> anyhow::Result<Self> {
        match value {
            0b1000 => Ok(ModeType::Regular),
            0b1010 => Ok(ModeType::Symlink),
            0b1110 => Ok(ModeType::Gitlink),
            other => {
                Err(GitError::CorruptIndex(format!("invalid mode type {:#06b}", other)).into())
            }
        }
    }
}
