// "HH:MM" parsing into striker quarters

use crate::error::{CarillonError, Result};

/// Parse `HH:MM` into `(hour, quarter)`; minutes are floored to the quarter
pub fn parse_quarter(text: &str) -> Result<(u32, u32)> {
    let invalid = || CarillonError::Config(format!("invalid time '{}', expected HH:MM", text));

    let (hour, minute) = text.trim().split_once(':').ok_or_else(invalid)?;
    let hour: u32 = hour.trim().parse().map_err(|_| invalid())?;
    let minute: u32 = minute.trim().parse().map_err(|_| invalid())?;

    if hour > 23 || minute > 59 {
        return Err(invalid());
    }
    Ok((hour, minute / 15))
}

/// Parse a comma separated list of `HH:MM` times
pub fn parse_quarter_list(text: &str) -> Result<Vec<(u32, u32)>> {
    text.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(parse_quarter)
        .collect()
}
