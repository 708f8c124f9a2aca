//! Steady-state update line parsing
//!
//! Updates have the form `<channel>:<value>`. Whitespace around either field
//! is tolerated and trimmed; empty fields are dropped before counting, so
//! `:5`, `1:2:3` and `abc` all classify as malformed while ` 3 : 127 `
//! parses cleanly.

use crate::error::ParseError;

/// Field delimiter within an update line
pub const DELIMITER: char = ':';

/// One parsed `<channel>:<value>` pair
///
/// Fields are plain integers at this layer; whether the channel is actually
/// registered is checked by the link engine, which has the channel set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelUpdate {
    /// Channel identifier as sent by the peer
    pub channel: i64,
    /// New value for the channel (conceptually 0-255, not clamped here)
    pub value: i64,
}

/// Parse one update line into a [`ChannelUpdate`]
///
/// The line must split on [`DELIMITER`] into exactly two trimmed non-empty
/// fields, both parseable as integers. Anything else is a
/// [`ParseError::MalformedUpdate`] carrying the raw line.
pub fn parse_update(line: &str) -> Result<ChannelUpdate, ParseError> {
    let malformed = || ParseError::MalformedUpdate {
        line: line.to_string(),
    };

    let fields: Vec<&str> = line
        .split(DELIMITER)
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .collect();

    if fields.len() != 2 {
        return Err(malformed());
    }

    let channel = fields[0].parse::<i64>().map_err(|_| malformed())?;
    let value = fields[1].parse::<i64>().map_err(|_| malformed())?;

    Ok(ChannelUpdate { channel, value })
}

#[cfg(test)]
mod tests {
    use super::{parse_update, ChannelUpdate};
    use crate::error::ParseError;
    use proptest::prelude::*;

    #[test]
    fn test_parse_plain_update() {
        assert_eq!(
            parse_update("3:127"),
            Ok(ChannelUpdate {
                channel: 3,
                value: 127
            })
        );
    }

    #[test]
    fn test_parse_tolerates_whitespace() {
        assert_eq!(
            parse_update("  12 :\t 0 "),
            Ok(ChannelUpdate {
                channel: 12,
                value: 0
            })
        );
    }

    #[test]
    fn test_non_integer_field_is_malformed() {
        assert_eq!(
            parse_update("abc"),
            Err(ParseError::MalformedUpdate {
                line: "abc".to_string()
            })
        );
        assert!(parse_update("1:high").is_err());
    }

    #[test]
    fn test_wrong_field_count_is_malformed() {
        assert!(parse_update("1:2:3").is_err());
        assert!(parse_update("42").is_err());
        assert!(parse_update(":5").is_err());
        assert!(parse_update("").is_err());
    }

    #[test]
    fn test_negative_fields_still_parse() {
        // A negative channel is well-formed here; the link layer rejects it
        // as unregistered.
        assert_eq!(
            parse_update("-3:5"),
            Ok(ChannelUpdate {
                channel: -3,
                value: 5
            })
        );
    }

    #[test]
    fn test_error_carries_raw_line() {
        let err = parse_update("1:2:3").unwrap_err();
        assert_eq!(err.line(), "1:2:3");
    }

    proptest! {
        /// The parser never panics and round-trips any integer pair
        #[test]
        fn parse_is_total(line in "\\PC*") {
            let _ = parse_update(&line);
        }

        #[test]
        fn parse_round_trips_integer_pairs(channel in -1000i64..1000, value in -1000i64..1000) {
            let line = format!("{}:{}", channel, value);
            prop_assert_eq!(parse_update(&line), Ok(ChannelUpdate { channel, value }));
        }
    }
}
