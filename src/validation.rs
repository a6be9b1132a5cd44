//! Adapter id and duration checks
//!
//! Interface names reach the `ip` command as arguments, and durations come
//! straight from the operator's keyboard.

use crate::error::{ToggleError, ToggleResult};

/// Maximum length for interface names (Linux kernel limit is 15)
const MAX_INTERFACE_NAME_LEN: usize = 15;

/// Shortest timed disable the operator may configure, in seconds
pub const MIN_DISABLE_DURATION_SECS: u64 = 5;

/// Check an adapter id before it is passed to `ip` or joined onto a sysfs path.
///
/// Accepts ASCII alphanumerics plus `-`, `_` and `.` (VLAN devices such as
/// `eth0.100`), up to the kernel's 15 byte limit, and never a leading dash.
pub fn validate_interface_name(name: &str) -> ToggleResult<()> {
    let reject = |reason: String| {
        Err(ToggleError::Validation(format!(
            "Adapter id '{}' rejected: {}",
            name.escape_debug(),
            reason
        )))
    };

    match name.len() {
        0 => return reject("empty".into()),
        n if n > MAX_INTERFACE_NAME_LEN => {
            return reject(format!("{} bytes, limit is {}", n, MAX_INTERFACE_NAME_LEN))
        }
        _ => {}
    }

    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return reject(format!("character {:?} not allowed", bad));
    }

    // `ip` would read it as an option
    if name.starts_with('-') {
        return reject("leading '-'".into());
    }

    Ok(())
}

/// Validate a timed-disable duration in seconds; there is no upper bound
pub fn validate_disable_duration(seconds: u64) -> ToggleResult<u64> {
    if seconds < MIN_DISABLE_DURATION_SECS {
        return Err(ToggleError::Validation(format!(
            "Duration must be at least {} seconds (got {})",
            MIN_DISABLE_DURATION_SECS, seconds
        )));
    }
    Ok(seconds)
}

/// Parse and validate a duration typed by the operator
pub fn parse_disable_duration(input: &str) -> ToggleResult<u64> {
    let trimmed = input.trim();
    let seconds = trimmed.parse::<u64>().map_err(|_| {
        ToggleError::Validation(format!("'{}' is not a whole number of seconds", trimmed))
    })?;
    validate_disable_duration(seconds)
}
