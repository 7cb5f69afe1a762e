//! Peripheral drivers and task-spawning helpers.

pub mod led_patterns;
pub mod status_led;
pub mod task_pin;
