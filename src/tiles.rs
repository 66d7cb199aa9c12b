use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileSymbol {
    #[default]
    Empty,
    OutsideCorner,
    OutsideWall,
    InsideCorner,
    InsideWall,
    PelletSpot,
    PowerPelletSpot,
    TJunction,
    GhostGate,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TileClass {
    Outside,
    Inside,
}

// (outside-class, inside-class, blocks pac-man, blocks ghosts), indexed by code.
const CLASS_TABLE: [(bool, bool, bool, bool); 9] = [
    (false, false, false, false), // Empty
    (true, false, true, true),    // OutsideCorner
    (true, false, true, true),    // OutsideWall
    (false, true, true, true),    // InsideCorner
    (false, true, true, true),    // InsideWall
    (false, false, false, false), // PelletSpot
    (false, false, false, false), // PowerPelletSpot
    (true, true, true, true),     // TJunction
    (false, true, true, false),   // GhostGate
];

impl TileSymbol {
    pub const ALL: [TileSymbol; 9] = [
        TileSymbol::Empty,
        TileSymbol::OutsideCorner,
        TileSymbol::OutsideWall,
        TileSymbol::InsideCorner,
        TileSymbol::InsideWall,
        TileSymbol::PelletSpot,
        TileSymbol::PowerPelletSpot,
        TileSymbol::TJunction,
        TileSymbol::GhostGate,
    ];

    pub fn code(self) -> u8 {
        match self {
            TileSymbol::Empty => 0,
            TileSymbol::OutsideCorner => 1,
            TileSymbol::OutsideWall => 2,
            TileSymbol::InsideCorner => 3,
            TileSymbol::InsideWall => 4,
            TileSymbol::PelletSpot => 5,
            TileSymbol::PowerPelletSpot => 6,
            TileSymbol::TJunction => 7,
            TileSymbol::GhostGate => 8,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    pub fn letter(self) -> char {
        match self {
            TileSymbol::Empty => 'e',
            TileSymbol::OutsideCorner => 'x',
            TileSymbol::OutsideWall => 'o',
            TileSymbol::InsideCorner => 'c',
            TileSymbol::InsideWall => 'i',
            TileSymbol::PelletSpot => 's',
            TileSymbol::PowerPelletSpot => 'p',
            TileSymbol::TJunction => 't',
            TileSymbol::GhostGate => 'g',
        }
    }

    pub fn from_letter(letter: char) -> Option<Self> {
        Self::ALL.into_iter().find(|symbol| symbol.letter() == letter)
    }

    pub fn parse_token(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.is_empty() {
            return Some(TileSymbol::Empty);
        }
        if let Ok(code) = token.parse::<u8>() {
            return Self::from_code(code);
        }
        let mut chars = token.chars();
        match (chars.next(), chars.next()) {
            (Some(letter), None) => Self::from_letter(letter),
            _ => None,
        }
    }

    fn row(self) -> (bool, bool, bool, bool) {
        CLASS_TABLE[self.code() as usize]
    }

    pub fn is_outside_class(self) -> bool {
        self.row().0
    }

    pub fn is_inside_class(self) -> bool {
        self.row().1
    }

    pub fn is_in_class(self, class: TileClass) -> bool {
        match class {
            TileClass::Outside => self.is_outside_class(),
            TileClass::Inside => self.is_inside_class(),
        }
    }

    pub fn connect_class(self) -> Option<TileClass> {
        match self {
            TileSymbol::OutsideCorner | TileSymbol::OutsideWall | TileSymbol::TJunction => {
                Some(TileClass::Outside)
            }
            TileSymbol::InsideCorner | TileSymbol::InsideWall | TileSymbol::GhostGate => {
                Some(TileClass::Inside)
            }
            _ => None,
        }
    }

    pub fn blocks_pacman(self) -> bool {
        self.row().2
    }

    pub fn blocks_ghosts(self) -> bool {
        self.row().3
    }

    pub fn collectible(self) -> Option<crate::types::Collectible> {
        match self {
            TileSymbol::PelletSpot => Some(crate::types::Collectible::Pellet),
            TileSymbol::PowerPelletSpot => Some(crate::types::Collectible::PowerPellet),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    #[serde(rename = "0")]
    Deg0,
    #[serde(rename = "90")]
    Deg90,
    #[serde(rename = "180")]
    Deg180,
    #[serde(rename = "270")]
    Deg270,
}

impl Rotation {
    pub fn degrees(self) -> u16 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_and_letters_round_trip() {
        for symbol in TileSymbol::ALL {
            assert_eq!(TileSymbol::from_code(symbol.code()), Some(symbol));
            assert_eq!(TileSymbol::from_letter(symbol.letter()), Some(symbol));
        }
        assert_eq!(TileSymbol::from_code(9), None);
        assert_eq!(TileSymbol::from_letter('z'), None);
    }

    #[test]
    fn parse_token_accepts_both_styles() {
        assert_eq!(TileSymbol::parse_token("8"), Some(TileSymbol::GhostGate));
        assert_eq!(TileSymbol::parse_token(" g "), Some(TileSymbol::GhostGate));
        assert_eq!(TileSymbol::parse_token(""), Some(TileSymbol::Empty));
        assert_eq!(TileSymbol::parse_token("gg"), None);
        assert_eq!(TileSymbol::parse_token("12"), None);
    }

    #[test]
    fn t_junction_belongs_to_both_classes() {
        assert!(TileSymbol::TJunction.is_outside_class());
        assert!(TileSymbol::TJunction.is_inside_class());
        assert!(TileSymbol::GhostGate.is_inside_class());
        assert!(!TileSymbol::GhostGate.is_outside_class());
        assert!(!TileSymbol::PelletSpot.is_inside_class());
    }

    #[test]
    fn gate_blocks_pacman_only() {
        assert!(TileSymbol::GhostGate.blocks_pacman());
        assert!(!TileSymbol::GhostGate.blocks_ghosts());
        assert!(TileSymbol::InsideWall.blocks_ghosts());
        assert!(!TileSymbol::PowerPelletSpot.blocks_pacman());
    }
}
