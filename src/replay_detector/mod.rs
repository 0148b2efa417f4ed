
mod fixed_big_int;

use fixed_big_int::FixedBigInt;

use crate::error::Error;

/// Outcome of a replay check.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ReplayCheck {
    Ok,
    /// The index is too far behind the newest accepted one.
    TooOld,
    /// The index was already accepted.
    Replay,
}

impl ReplayCheck {
    pub(crate) fn into_result(self) -> Result<(), Error> {
        match self {
            ReplayCheck::Ok => Ok(()),
            ReplayCheck::TooOld => Err(Error::ReplayOld),
            ReplayCheck::Replay => Err(Error::ReplayFail),
        }
    }
}

/// ReplayDetector is a sliding window anchored at the newest accepted index.
/// Bit `n` of the mask stands for index `latest - n`.
#[derive(Debug, Clone)]
pub(crate) struct ReplayDetector {
    latest: u64,
    window_size: usize,
    mask: FixedBigInt,
}

impl ReplayDetector {
    pub(crate) fn new(window_size: usize) -> Self {
        ReplayDetector {
            latest: 0,
            window_size,
            mask: FixedBigInt::new(window_size),
        }
    }

    pub(crate) fn latest(&self) -> u64 {
        self.latest
    }

    /// Check does not mutate the window.
    pub(crate) fn check(&self, index: u64) -> ReplayCheck {
        if index > self.latest {
            return ReplayCheck::Ok;
        }

        let behind = self.latest - index;
        if behind >= self.window_size as u64 {
            ReplayCheck::TooOld
        } else if self.mask.bit(behind as usize) != 0 {
            ReplayCheck::Replay
        } else {
            ReplayCheck::Ok
        }
    }

    /// Marks `index` as received, advancing the window when it is newer than
    /// anything seen so far. Callers check the index first.
    pub(crate) fn accept(&mut self, index: u64) {
        if index > self.latest {
            let advance = index - self.latest;
            self.mask.lsh(advance.min(self.window_size as u64) as usize);
            self.latest = index;
            self.mask.set_bit(0);
        } else {
            self.mask.set_bit((self.latest - index) as usize);
        }
    }
}
