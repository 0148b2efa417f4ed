use std::sync::atomic::{AtomicU64, Ordering};

/// Packets a master key may protect (2^48 - 1).
pub(crate) const KEY_LIMIT_MAX: u64 = 0xFFFF_FFFF_FFFF;
/// Remaining usage below which the soft limit is reported.
pub(crate) const KEY_LIMIT_SOFT: u64 = 0x10000;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum KeyLimitEvent {
    Normal,
    SoftLimit,
    HardLimit,
}

/// Usage counter of one master key, RFC 3711 section 9.2. Streams spawned
/// from a template share the counter of the template's keys.
#[derive(Debug)]
pub(crate) struct KeyLimit {
    num_left: AtomicU64,
}

impl Default for KeyLimit {
    fn default() -> Self {
        KeyLimit::new(KEY_LIMIT_MAX)
    }
}

impl KeyLimit {
    pub(crate) fn new(num_left: u64) -> Self {
        KeyLimit {
            num_left: AtomicU64::new(num_left),
        }
    }

    pub(crate) fn num_left(&self) -> u64 {
        self.num_left.load(Ordering::Relaxed)
    }

    /// Reports whether the key may still be used, without consuming it.
    pub(crate) fn check(&self) -> KeyLimitEvent {
        if self.num_left() == 0 {
            KeyLimitEvent::HardLimit
        } else {
            KeyLimitEvent::Normal
        }
    }

    /// Consumes one use. The soft limit is reported once, on the use that
    /// crosses it.
    pub(crate) fn update(&self) -> KeyLimitEvent {
        let previous = match self
            .num_left
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| {
                Some(n.saturating_sub(1))
            }) {
            Ok(n) | Err(n) => n,
        };

        if previous == KEY_LIMIT_SOFT {
            KeyLimitEvent::SoftLimit
        } else {
            KeyLimitEvent::Normal
        }
    }
}
