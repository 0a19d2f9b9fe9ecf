use core::fmt;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Attribute {
    Cool = 0,
    Cute = 1,
    Happy = 2,
    Mysterious = 3,
    Pure = 4,
}

impl Attribute {
    pub const ALL: [Attribute; 5] = [
        Attribute::Cool,
        Attribute::Cute,
        Attribute::Happy,
        Attribute::Mysterious,
        Attribute::Pure,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Attribute::Cool),
            1 => Some(Attribute::Cute),
            2 => Some(Attribute::Happy),
            3 => Some(Attribute::Mysterious),
            4 => Some(Attribute::Pure),
            _ => None,
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Attribute::Cool => "cool",
            Attribute::Cute => "cute",
            Attribute::Happy => "happy",
            Attribute::Mysterious => "mysterious",
            Attribute::Pure => "pure",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::Attribute;

    #[test]
    fn from_index_maps_valid_values() {
        assert_eq!(Attribute::from_index(0), Some(Attribute::Cool));
        assert_eq!(Attribute::from_index(4), Some(Attribute::Pure));
        assert_eq!(Attribute::from_index(5), None);
    }

    #[test]
    fn display_uses_lowercase_names() {
        assert_eq!(Attribute::Mysterious.to_string(), "mysterious");
    }
}
