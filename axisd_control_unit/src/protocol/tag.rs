//! Frame tags.

use axisd_common::consts::AXIS_COUNT;

/// Tag byte selecting what a frame's payload targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Tag {
    /// Command registers, fixed-point. Also echoed as pending commands.
    CommandFloats = 1,
    /// Control registers, fixed-point.
    ControlFloats = 2,
    AxisName0 = 3,
    AxisName1 = 4,
    AxisName2 = 5,
    AxisName3 = 6,
    AxisName4 = 7,
    AxisName5 = 8,
    AxisName6 = 9,
    AxisName7 = 10,
    AxisName8 = 11,
    AxisName9 = 12,
    /// Axis type codes, `i32`.
    AxisType = 13,
    /// Force limits, fixed-point.
    ForceLimit = 14,
    /// Outbound: net currents, fixed-point.
    NetCurrent = 15,
    /// Outbound: status words, `u32`.
    StatusFlags = 16,
    /// Outbound: measured positions, fixed-point.
    VcPosition = 17,
    SystemInit = 18,
    SystemStop = 19,
    /// One byte: 1 = INIT, 3 = STOP.
    SystemRequest = 20,
    /// Outbound: section mask `u32` + system state byte.
    SystemCase = 21,
    /// No-op. Requests a status reply inbound; "nothing changed" outbound.
    Ping = 255,
}

const AXIS_NAME_TAGS: [Tag; AXIS_COUNT] = [
    Tag::AxisName0,
    Tag::AxisName1,
    Tag::AxisName2,
    Tag::AxisName3,
    Tag::AxisName4,
    Tag::AxisName5,
    Tag::AxisName6,
    Tag::AxisName7,
    Tag::AxisName8,
    Tag::AxisName9,
];

impl Tag {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::CommandFloats),
            2 => Some(Self::ControlFloats),
            3..=12 => Some(AXIS_NAME_TAGS[(value - 3) as usize]),
            13 => Some(Self::AxisType),
            14 => Some(Self::ForceLimit),
            15 => Some(Self::NetCurrent),
            16 => Some(Self::StatusFlags),
            17 => Some(Self::VcPosition),
            18 => Some(Self::SystemInit),
            19 => Some(Self::SystemStop),
            20 => Some(Self::SystemRequest),
            21 => Some(Self::SystemCase),
            255 => Some(Self::Ping),
            _ => None,
        }
    }

    /// Name tag for axis slot `axis`.
    #[inline]
    pub const fn axis_name(axis: usize) -> Option<Self> {
        if axis < AXIS_COUNT {
            Some(AXIS_NAME_TAGS[axis])
        } else {
            None
        }
    }

    /// Axis slot addressed by a name tag.
    #[inline]
    pub const fn axis_name_index(&self) -> Option<usize> {
        let v = *self as u8;
        if v >= Self::AxisName0 as u8 && v <= Self::AxisName9 as u8 {
            Some((v - Self::AxisName0 as u8) as usize)
        } else {
            None
        }
    }

    /// Tags only the server emits.
    #[inline]
    pub const fn is_outbound_only(&self) -> bool {
        matches!(
            self,
            Self::NetCurrent | Self::StatusFlags | Self::VcPosition | Self::SystemCase
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_known_byte_roundtrips() {
        for byte in 0u8..=255 {
            if let Some(tag) = Tag::from_u8(byte) {
                assert_eq!(tag as u8, byte);
            }
        }
        assert_eq!(Tag::from_u8(0), None);
        assert_eq!(Tag::from_u8(22), None);
    }

    #[test]
    fn axis_name_tags_map_to_slots() {
        for axis in 0..AXIS_COUNT {
            let tag = Tag::axis_name(axis).unwrap();
            assert_eq!(tag.axis_name_index(), Some(axis));
        }
        assert_eq!(Tag::axis_name(AXIS_COUNT), None);
        assert_eq!(Tag::AxisType.axis_name_index(), None);
    }

    #[test]
    fn outbound_only_tags() {
        assert!(Tag::SystemCase.is_outbound_only());
        assert!(!Tag::CommandFloats.is_outbound_only());
        assert!(!Tag::Ping.is_outbound_only());
    }
}
