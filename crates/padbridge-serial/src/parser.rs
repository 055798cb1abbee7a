//! Parser for the microcontroller's line format.
//!
//! Each line is a comma-separated list of `key = value` assignments, e.g.
//! `X = 512, Y = 480, button_A_state = 1, button_B_state = 0,
//! button_Joy_state = 0`. Tokens that fail to split or parse are skipped;
//! the line as a whole fails only when a required key never appears.

use padbridge_device::DeviceInputSnapshot;

pub(crate) const KEY_X: &str = "X";
pub(crate) const KEY_Y: &str = "Y";
pub(crate) const KEY_BUTTON_A: &str = "button_A_state";
pub(crate) const KEY_BUTTON_B: &str = "button_B_state";
pub(crate) const KEY_BUTTON_JOY: &str = "button_Joy_state";

pub(crate) fn parse_input_line(line: &str) -> Option<DeviceInputSnapshot> {
    let mut x = None;
    let mut y = None;
    let mut button_a = None;
    let mut button_b = None;
    let mut button_joy = None;

    for token in line.split(',') {
        let Some((key, value)) = token.split_once('=') else {
            continue;
        };
        let Ok(value) = value.trim().parse::<i32>() else {
            continue;
        };
        match key.trim() {
            KEY_X => x = Some(value),
            KEY_Y => y = Some(value),
            KEY_BUTTON_A => button_a = Some(value),
            KEY_BUTTON_B => button_b = Some(value),
            KEY_BUTTON_JOY => button_joy = Some(value),
            _ => {}
        }
    }

    Some(DeviceInputSnapshot {
        x: x?,
        y: y?,
        button_a: button_a? != 0,
        button_b: button_b? != 0,
        button_joy: button_joy? != 0,
    })
}
