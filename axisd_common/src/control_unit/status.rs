//! Status bitflags published to clients and the shared region.

use bitflags::bitflags;

bitflags! {
    /// Per-axis status word.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StatusFlags: u32 {
        /// Move finished within the in-position window, or sub-command done.
        const IN_POSITION = 0x01;
        /// Mirrors the axis toggle bit; flips once per executed command.
        const TOGGLE      = 0x80;
    }
}

impl StatusFlags {
    /// Status word with the toggle bit set from `toggle`.
    #[inline]
    pub fn with_toggle(self, toggle: bool) -> Self {
        if toggle { self | Self::TOGGLE } else { self }
    }
}

bitflags! {
    /// Which sections of a status reply carry data.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StatusSections: u32 {
        const POSITIONS    = 0x01;
        const STATUS_FLAGS = 0x02;
        const NET_CURRENT  = 0x04;
        /// Not a section: set while the system is READY.
        const READY        = 0x08;
        const PENDING      = 0x10;
    }
}

impl StatusSections {
    /// Every data section (excludes `READY`).
    pub const DATA: Self = Self::from_bits_truncate(
        Self::POSITIONS.bits()
            | Self::STATUS_FLAGS.bits()
            | Self::NET_CURRENT.bits()
            | Self::PENDING.bits(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_sets_bit_seven() {
        let s = StatusFlags::IN_POSITION.with_toggle(true);
        assert_eq!(s.bits(), 0x81);
        assert_eq!(StatusFlags::empty().with_toggle(false).bits(), 0);
    }

    #[test]
    fn data_mask_excludes_ready() {
        assert!(!StatusSections::DATA.contains(StatusSections::READY));
        assert_eq!(StatusSections::DATA.bits(), 0x17);
    }
}
