//! Signal classification of the free-text status column.

use serde::{Deserialize, Serialize};

/// Status prefix that requests opening a position.
pub const ENTRY_PREFIX: &str = "ENTRY_";
/// Status prefix that requests closing a position.
pub const EXIT_PREFIX: &str = "EXIT_";

/// What a bar's status asks the replayer to do.
///
/// The upstream model writes tags like `ENTRY_LONG`, `EXIT_STOP` or `HOLD`.
/// Only the prefix matters here; the full tag is not interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    Entry,
    Exit,
    Hold,
}

impl Signal {
    pub fn from_status(status: Option<&str>) -> Self {
        match status.map(str::trim) {
            Some(s) if s.starts_with(ENTRY_PREFIX) => Self::Entry,
            Some(s) if s.starts_with(EXIT_PREFIX) => Self::Exit,
            _ => Self::Hold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_are_classified() {
        assert_eq!(Signal::from_status(Some("ENTRY_LONG")), Signal::Entry);
        assert_eq!(Signal::from_status(Some("EXIT_TARGET")), Signal::Exit);
        assert_eq!(Signal::from_status(Some(" ENTRY_BREAKOUT ")), Signal::Entry);
    }

    #[test]
    fn everything_else_is_hold() {
        assert_eq!(Signal::from_status(None), Signal::Hold);
        assert_eq!(Signal::from_status(Some("")), Signal::Hold);
        assert_eq!(Signal::from_status(Some("HOLD")), Signal::Hold);
        // Case-sensitive, like the upstream tags.
        assert_eq!(Signal::from_status(Some("entry_long")), Signal::Hold);
        assert_eq!(Signal::from_status(Some("ENTRY")), Signal::Hold);
    }
}
