//! Contains the [`Priority`] value type

// Copyright (c) 2025 Ferrous Systems
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::kernel::{self, NativePriority, presets};

/// Which direction the native priority encoding grows in.
///
/// Some kernels treat larger numbers as higher priority, some treat zero as
/// the most urgent level. Each kernel adapter states its direction and
/// [`Priority`] compares in the conceptual direction regardless.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PriorityOrder {
    /// Larger raw values are higher priority.
    Ascending,
    /// Smaller raw values are higher priority.
    Descending,
}

/// A thread priority level in the native kernel encoding.
///
/// Comparisons always mean what they say: `a > b` is true exactly when `a`
/// is closer to [`Priority::REALTIME`], whichever way the kernel numbers its
/// levels. Arithmetic moves in ranks (one rank = one native step toward
/// realtime for positive offsets) and clamps at the [`Priority::IDLE`] and
/// [`Priority::REALTIME`] presets rather than wrapping.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Priority(i32);

/// A priority encoding: a direction plus the raw values of its two extreme
/// presets. Kept separate from [`Priority`] so ordering and clamping can be
/// tested against both directions on any one adapter.
#[derive(Clone, Copy)]
struct Scheme {
    order: PriorityOrder,
    idle: i32,
    realtime: i32,
}

/// The scheme of the kernel adapter linked into this build.
const SCHEME: Scheme = Scheme {
    order: kernel::PRIORITY_ORDER,
    idle: presets::IDLE,
    realtime: presets::REALTIME,
};

impl Scheme {
    /// Map a raw value into the rank domain, where greater always means
    /// more urgent.
    const fn rank(self, raw: i32) -> i32 {
        match self.order {
            PriorityOrder::Ascending => raw,
            PriorityOrder::Descending => -raw,
        }
    }

    /// Map a rank back into the raw encoding.
    const fn raw(self, rank: i32) -> i32 {
        // The mapping is its own inverse.
        self.rank(rank)
    }

    fn clamp(self, rank: i32) -> i32 {
        rank.clamp(self.rank(self.idle), self.rank(self.realtime))
    }

    fn offset(self, raw: i32, by: i32) -> i32 {
        self.raw(self.clamp(self.rank(raw).saturating_add(by)))
    }

    fn compare(self, a: i32, b: i32) -> core::cmp::Ordering {
        self.rank(a).cmp(&self.rank(b))
    }
}

impl Priority {
    /// Reserved for the kernel idle thread.
    pub const IDLE: Priority = Priority(presets::IDLE);
    /// Background work.
    pub const LOW: Priority = Priority(presets::LOW);
    /// Below normal.
    pub const BELOW_NORMAL: Priority = Priority(presets::BELOW_NORMAL);
    /// The default level.
    pub const NORMAL: Priority = Priority(presets::NORMAL);
    /// Above normal.
    pub const ABOVE_NORMAL: Priority = Priority(presets::ABOVE_NORMAL);
    /// High priority.
    pub const HIGH: Priority = Priority(presets::HIGH);
    /// The most urgent level this layer hands out.
    pub const REALTIME: Priority = Priority(presets::REALTIME);

    /// Create a priority from a raw native value.
    pub const fn from_raw(value: i32) -> Priority {
        Priority(value)
    }

    /// Get the raw native representation.
    pub const fn to_native(self) -> NativePriority {
        self.0 as NativePriority
    }

    /// One step closer to [`Priority::REALTIME`], clamped there.
    #[must_use]
    pub fn step_up(self) -> Priority {
        self + 1
    }

    /// One step closer to [`Priority::IDLE`], clamped there.
    #[must_use]
    pub fn step_down(self) -> Priority {
        self - 1
    }
}

impl Default for Priority {
    fn default() -> Priority {
        Priority::NORMAL
    }
}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Priority) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Priority) -> core::cmp::Ordering {
        SCHEME.compare(self.0, other.0)
    }
}

impl core::ops::Add<i32> for Priority {
    type Output = Priority;

    /// Move `rhs` ranks toward realtime, clamped at the preset bounds.
    fn add(self, rhs: i32) -> Priority {
        Priority(SCHEME.offset(self.0, rhs))
    }
}

impl core::ops::Sub<i32> for Priority {
    type Output = Priority;

    /// Move `rhs` ranks toward idle, clamped at the preset bounds.
    fn sub(self, rhs: i32) -> Priority {
        Priority(SCHEME.offset(self.0, rhs.saturating_neg()))
    }
}

impl From<i32> for Priority {
    fn from(value: i32) -> Priority {
        Priority(value)
    }
}

impl From<Priority> for NativePriority {
    fn from(value: Priority) -> NativePriority {
        value.to_native()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// FreeRTOS-flavour numbering: bigger is more urgent.
    const ASCENDING: Scheme = Scheme {
        order: PriorityOrder::Ascending,
        idle: 1,
        realtime: 48,
    };

    /// ThreadX-flavour numbering: zero is the most urgent level.
    const DESCENDING: Scheme = Scheme {
        order: PriorityOrder::Descending,
        idle: 31,
        realtime: 0,
    };

    #[test]
    fn conceptual_ordering_holds_in_both_directions() {
        use core::cmp::Ordering::*;
        // (more urgent, less urgent) raw pairs per scheme
        assert_eq!(ASCENDING.compare(48, 1), Greater);
        assert_eq!(ASCENDING.compare(8, 40), Less);
        assert_eq!(ASCENDING.compare(24, 24), Equal);
        assert_eq!(DESCENDING.compare(0, 31), Greater);
        assert_eq!(DESCENDING.compare(20, 4), Less);
        assert_eq!(DESCENDING.compare(16, 16), Equal);
    }

    #[test]
    fn offsets_move_toward_realtime_and_clamp() {
        assert_eq!(ASCENDING.offset(24, 1), 25);
        assert_eq!(ASCENDING.offset(24, -1), 23);
        assert_eq!(ASCENDING.offset(48, 1), 48);
        assert_eq!(ASCENDING.offset(1, -1), 1);
        assert_eq!(ASCENDING.offset(24, 1000), 48);

        assert_eq!(DESCENDING.offset(16, 1), 15);
        assert_eq!(DESCENDING.offset(16, -1), 17);
        assert_eq!(DESCENDING.offset(0, 1), 0);
        assert_eq!(DESCENDING.offset(31, -1), 31);
        assert_eq!(DESCENDING.offset(16, -1000), 31);
    }

    #[test]
    fn presets_are_totally_ordered() {
        let levels = [
            Priority::IDLE,
            Priority::LOW,
            Priority::BELOW_NORMAL,
            Priority::NORMAL,
            Priority::ABOVE_NORMAL,
            Priority::HIGH,
            Priority::REALTIME,
        ];
        for pair in levels.windows(2) {
            assert!(pair[1] > pair[0], "{:?} should outrank {:?}", pair[1], pair[0]);
        }
    }

    #[test]
    fn steps_clamp_at_the_ends() {
        assert_eq!(Priority::REALTIME.step_up(), Priority::REALTIME);
        assert_eq!(Priority::IDLE.step_down(), Priority::IDLE);
        assert!(Priority::NORMAL.step_up() > Priority::NORMAL);
        assert!(Priority::NORMAL.step_down() < Priority::NORMAL);
        assert_eq!(Priority::NORMAL + 10_000, Priority::REALTIME);
        assert_eq!(Priority::NORMAL - 10_000, Priority::IDLE);
    }

    #[test]
    fn default_is_normal() {
        assert_eq!(Priority::default(), Priority::NORMAL);
    }
}

// End of File
