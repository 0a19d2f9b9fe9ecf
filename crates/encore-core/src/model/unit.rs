use core::fmt;
use serde::{Deserialize, Serialize};

/// Team affiliation tag. `Session` is the floater tag: cards that carry
/// only `Session` count toward whichever group they are deployed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Unit {
    Aurora = 0,
    Bliss = 1,
    Chroma = 2,
    Drive = 3,
    Euphony = 4,
    Session = 5,
}

impl Unit {
    pub const ALL: [Unit; 6] = [
        Unit::Aurora,
        Unit::Bliss,
        Unit::Chroma,
        Unit::Drive,
        Unit::Euphony,
        Unit::Session,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn is_session(self) -> bool {
        matches!(self, Unit::Session)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Unit::Aurora => "aurora",
            Unit::Bliss => "bliss",
            Unit::Chroma => "chroma",
            Unit::Drive => "drive",
            Unit::Euphony => "euphony",
            Unit::Session => "session",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::Unit;

    #[test]
    fn session_is_the_only_floater() {
        assert!(Unit::Session.is_session());
        for unit in Unit::ALL.iter().take(5) {
            assert!(!unit.is_session());
        }
    }
}
