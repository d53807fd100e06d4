//! Command register decoding.
//!
//! A command register value carries an optional sub-command selector in its
//! high digits: `value = selector * 10000 + payload`. The selector is taken
//! by truncation toward zero, so a negative relative move such as `-2.5`
//! keeps selector 0 and stays a plain point-to-point command.

use axisd_common::consts::SELECTOR_STRIDE;
use axisd_common::control_unit::state::SubCommand;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommandWord {
    /// Register value as written by the client.
    pub raw: f32,
    pub selector: i32,
    /// `raw` with the selector digits removed.
    pub payload: f32,
}

impl CommandWord {
    pub fn decode(raw: f32) -> Self {
        let selector = (raw / SELECTOR_STRIDE).trunc() as i32;
        Self {
            raw,
            selector,
            payload: raw - selector as f32 * SELECTOR_STRIDE,
        }
    }

    #[inline]
    pub fn sub_command(&self) -> SubCommand {
        SubCommand::from_selector(self.selector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_loop_selector() {
        let word = CommandWord::decode(35_000.0);
        assert_eq!(word.selector, 3);
        assert_eq!(word.payload, 5_000.0);
        assert_eq!(word.sub_command(), SubCommand::OpenLoop);
    }

    #[test]
    fn plain_values_have_selector_zero() {
        let word = CommandWord::decode(1_234.5);
        assert_eq!(word.selector, 0);
        assert_eq!(word.payload, 1_234.5);
        assert_eq!(word.sub_command(), SubCommand::PointToPoint);
    }

    #[test]
    fn negative_values_truncate_toward_zero() {
        let word = CommandWord::decode(-2.5);
        assert_eq!(word.selector, 0);
        assert_eq!(word.payload, -2.5);

        let word = CommandWord::decode(-25_000.0);
        assert_eq!(word.selector, -2);
        assert_eq!(word.sub_command(), SubCommand::PointToPoint);
    }

    #[test]
    fn change_work_position_payload() {
        let word = CommandWord::decode(20_125.0);
        assert_eq!(word.sub_command(), SubCommand::ChangeWorkPosition);
        assert_eq!(word.payload, 125.0);
        assert_eq!(CommandWord::decode(45_000.0).sub_command(), SubCommand::AxisLock);
    }
}
