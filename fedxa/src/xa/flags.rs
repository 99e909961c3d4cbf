use std::fmt::{Display, Formatter};
use std::ops::BitOr;

/// Flags accepted by `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StartFlags {
    /// TMNOFLAGS: begin work on a new transaction branch
    NoFlags,
    /// TMJOIN: join an existing branch of the same resource manager
    Join,
    /// TMRESUME: resume a suspended branch
    Resume,
}

/// Flags accepted by `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndFlags {
    /// TMSUCCESS: work completed successfully
    Success,
    /// TMFAIL: work failed, the branch is rollback-only
    Fail,
    /// TMSUSPEND: work is suspended and may be resumed
    Suspend,
}

/// Vote returned by a successful `prepare`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vote {
    /// XA_OK: ready to commit
    Ok,
    /// XA_RDONLY: nothing to commit, the branch is already complete
    ReadOnly,
}

/// Scan flags accepted by `recover`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RecoverFlags(u8);

impl RecoverFlags {
    pub const NO_FLAGS: RecoverFlags = RecoverFlags(0);
    pub const START_SCAN: RecoverFlags = RecoverFlags(1);
    pub const END_SCAN: RecoverFlags = RecoverFlags(2);

    pub fn contains(&self, other: RecoverFlags) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }
}

impl BitOr for RecoverFlags {
    type Output = RecoverFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        RecoverFlags(self.0 | rhs.0)
    }
}

impl Display for StartFlags {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StartFlags::NoFlags => write!(f, "TMNOFLAGS"),
            StartFlags::Join => write!(f, "TMJOIN"),
            StartFlags::Resume => write!(f, "TMRESUME"),
        }
    }
}

impl Display for EndFlags {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EndFlags::Success => write!(f, "TMSUCCESS"),
            EndFlags::Fail => write!(f, "TMFAIL"),
            EndFlags::Suspend => write!(f, "TMSUSPEND"),
        }
    }
}
