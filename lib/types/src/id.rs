use std::fmt;
use std::str::FromStr;

/// A block reference as accepted by the fetcher: either a block number or a
/// block hash. Hashes are recognized by their fixed 64-character length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockId {
    Number(u64),
    Hash(String),
}

impl From<u64> for BlockId {
    fn from(number: u64) -> Self {
        Self::Number(number)
    }
}

impl FromStr for BlockId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() == 64 {
            Ok(Self::Hash(s.to_owned()))
        } else {
            Ok(Self::Number(s.parse()?))
        }
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Hash(h) => f.write_str(h),
        }
    }
}
