use serde::Serialize;

use crate::error::MapError;
use crate::tiles::{Rotation, TileClass, TileSymbol};
use crate::types::GridCell;

pub const DEFAULT_QUADRANT: [[u8; 14]; 15] = [
    [1, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 7],
    [2, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 4],
    [2, 5, 3, 4, 4, 3, 5, 3, 4, 4, 4, 3, 5, 4],
    [2, 6, 4, 0, 0, 4, 5, 4, 0, 0, 0, 4, 5, 4],
    [2, 5, 3, 4, 4, 3, 5, 3, 4, 4, 4, 3, 5, 3],
    [2, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5],
    [2, 5, 3, 4, 4, 3, 5, 3, 3, 5, 3, 4, 4, 4],
    [2, 5, 3, 4, 4, 3, 5, 4, 4, 5, 3, 4, 4, 3],
    [2, 5, 5, 5, 5, 5, 5, 4, 4, 5, 5, 5, 5, 4],
    [1, 2, 2, 2, 2, 1, 5, 4, 3, 4, 4, 3, 0, 4],
    [0, 0, 0, 0, 0, 2, 5, 4, 3, 4, 4, 3, 0, 3],
    [0, 0, 0, 0, 0, 2, 5, 4, 4, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 2, 5, 4, 4, 0, 3, 4, 4, 8],
    [2, 2, 2, 2, 2, 1, 5, 3, 3, 0, 4, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 5, 0, 0, 0, 4, 0, 0, 0],
];

pub fn default_quadrant() -> Vec<Vec<TileSymbol>> {
    DEFAULT_QUADRANT
        .iter()
        .map(|row| {
            row.iter()
                .map(|code| TileSymbol::from_code(*code).unwrap_or_default())
                .collect()
        })
        .collect()
}

pub fn default_maze() -> MazeMap {
    // The stock quadrant is a valid constant, so mirroring cannot fail.
    MazeMap::build_from_quadrant(&default_quadrant()).unwrap_or_else(|_| MazeMap::empty())
}

#[derive(Clone, Debug, Serialize)]
pub struct TileRotation {
    pub x: i32,
    pub y: i32,
    pub symbol: TileSymbol,
    pub rotation: Rotation,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MazeMap {
    width: usize,
    height: usize,
    tiles: Vec<TileSymbol>,
}

impl MazeMap {
    fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            tiles: Vec::new(),
        }
    }

    pub fn from_rows(rows: &[Vec<TileSymbol>]) -> Result<Self, MapError> {
        let Some(first) = rows.first() else {
            return Err(MapError::NoTileRows);
        };
        let width = first.len();
        if width == 0 {
            return Err(MapError::NoTileRows);
        }
        let mut tiles = Vec::with_capacity(width * rows.len());
        for (row_idx, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(MapError::NotRectangular {
                    row: row_idx,
                    expected: width,
                    found: row.len(),
                });
            }
            tiles.extend_from_slice(row);
        }
        Ok(Self {
            width,
            height: rows.len(),
            tiles,
        })
    }

    // Mirrors a top-left quadrant into a full symmetric maze of
    // `(2*qw) x (2*qh - 1)`. The quadrant's last row becomes the single
    // shared middle row.
    pub fn build_from_quadrant(quadrant: &[Vec<TileSymbol>]) -> Result<Self, MapError> {
        let quarter = Self::from_rows(quadrant).map_err(|error| match error {
            MapError::NoTileRows => MapError::QuadrantTooSmall {
                width: quadrant.first().map(|row| row.len()).unwrap_or(0),
                height: quadrant.len(),
            },
            other => other,
        })?;
        if quarter.height < 2 {
            return Err(MapError::QuadrantTooSmall {
                width: quarter.width,
                height: quarter.height,
            });
        }

        let qw = quarter.width;
        let qh = quarter.height;
        let width = qw * 2;
        let height = qh * 2 - 1;
        let mut tiles = vec![TileSymbol::Empty; width * height];

        for y in 0..qh {
            for x in 0..qw {
                let symbol = quarter.tiles[y * qw + x];
                tiles[y * width + x] = symbol;
                tiles[y * width + (width - 1 - x)] = symbol;
            }
        }
        for y in 0..qh - 1 {
            let mirrored = height - 1 - y;
            for x in 0..width {
                tiles[mirrored * width + x] = tiles[y * width + x];
            }
        }

        Ok(Self {
            width,
            height,
            tiles,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    pub fn tile(&self, x: i32, y: i32) -> TileSymbol {
        if !self.in_bounds(x, y) {
            return TileSymbol::Empty;
        }
        self.tiles[y as usize * self.width + x as usize]
    }

    pub fn cells(&self) -> impl Iterator<Item = (GridCell, TileSymbol)> + '_ {
        self.tiles.iter().enumerate().map(move |(idx, symbol)| {
            let x = (idx % self.width) as i32;
            let y = (idx / self.width) as i32;
            (GridCell::new(x, y), *symbol)
        })
    }

    pub fn find_first(&self, symbol: TileSymbol) -> Option<GridCell> {
        self.cells()
            .find(|(_, tile)| *tile == symbol)
            .map(|(cell, _)| cell)
    }

    pub fn rotation_for(&self, x: i32, y: i32, symbol: TileSymbol) -> Rotation {
        let Some(class) = symbol.connect_class() else {
            return Rotation::Deg0;
        };
        let joins = |nx: i32, ny: i32| self.tile(nx, ny).is_in_class(class);
        let up = joins(x, y - 1);
        let down = joins(x, y + 1);
        let left = joins(x - 1, y);
        let right = joins(x + 1, y);

        match symbol {
            TileSymbol::OutsideWall | TileSymbol::InsideWall | TileSymbol::GhostGate => {
                if left && right {
                    Rotation::Deg0
                } else {
                    Rotation::Deg90
                }
            }
            TileSymbol::OutsideCorner | TileSymbol::InsideCorner => {
                if right && down {
                    Rotation::Deg0
                } else if right && up {
                    Rotation::Deg270
                } else if left && down {
                    Rotation::Deg90
                } else if left && up {
                    Rotation::Deg180
                } else {
                    Rotation::Deg0
                }
            }
            TileSymbol::TJunction => match (up, down, left, right) {
                (true, false, true, true) => Rotation::Deg0,
                (true, true, false, true) => Rotation::Deg90,
                (false, true, true, true) => Rotation::Deg180,
                (true, true, true, false) => Rotation::Deg270,
                _ => Rotation::Deg0,
            },
            _ => Rotation::Deg0,
        }
    }

    pub fn rotations(&self) -> Vec<TileRotation> {
        self.cells()
            .filter(|(_, symbol)| symbol.connect_class().is_some())
            .map(|(cell, symbol)| TileRotation {
                x: cell.x,
                y: cell.y,
                symbol,
                rotation: self.rotation_for(cell.x, cell.y, symbol),
            })
            .collect()
    }

    pub fn to_letter_rows(&self) -> Vec<String> {
        self.tiles
            .chunks(self.width.max(1))
            .map(|row| row.iter().map(|symbol| symbol.letter()).collect())
            .collect()
    }
}

pub fn load_map<S: AsRef<str>>(tokens: &[Vec<S>]) -> Result<MazeMap, MapError> {
    let mut rows = Vec::with_capacity(tokens.len());
    for (row_idx, row) in tokens.iter().enumerate() {
        let mut parsed = Vec::with_capacity(row.len());
        for (col_idx, token) in row.iter().enumerate() {
            let token = token.as_ref();
            let symbol = TileSymbol::parse_token(token).ok_or_else(|| MapError::UnknownToken {
                row: row_idx,
                col: col_idx,
                token: token.to_string(),
            })?;
            parsed.push(symbol);
        }
        rows.push(parsed);
    }
    MazeMap::from_rows(&rows)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BlockKind {
    Numeric,
    Letter,
}

fn classify_row(tokens: &[&str]) -> Option<BlockKind> {
    let numeric = tokens.iter().all(|token| {
        let token = token.trim();
        token.is_empty()
            || (token.chars().all(|c| c.is_ascii_digit())
                && token.parse::<u8>().map(|code| code <= 8).unwrap_or(false))
    });
    if numeric {
        return Some(BlockKind::Numeric);
    }
    let letter = tokens.iter().all(|token| {
        let token = token.trim();
        let mut chars = token.chars();
        match (chars.next(), chars.next()) {
            (None, _) => true,
            (Some(c), None) => TileSymbol::from_letter(c).is_some(),
            _ => false,
        }
    });
    letter.then_some(BlockKind::Letter)
}

fn split_row(line: &str) -> Vec<&str> {
    let mut tokens: Vec<&str> = line.split(',').collect();
    while tokens.len() > 1 && tokens.last().map(|t| t.trim().is_empty()).unwrap_or(false) {
        tokens.pop();
    }
    tokens
}

fn block_to_rows(block: &[Vec<&str>]) -> Result<Vec<Vec<TileSymbol>>, MapError> {
    let width = block.first().map(|row| row.len()).unwrap_or(0);
    let mut rows = Vec::with_capacity(block.len());
    for (row_idx, row) in block.iter().enumerate() {
        if row.len() > width {
            return Err(MapError::NotRectangular {
                row: row_idx,
                expected: width,
                found: row.len(),
            });
        }
        let mut parsed = Vec::with_capacity(width);
        for col in 0..width {
            let token = row.get(col).copied().unwrap_or("");
            parsed.push(TileSymbol::parse_token(token).unwrap_or_default());
        }
        rows.push(parsed);
    }
    Ok(rows)
}

// Parses level text holding a numeric block and/or a letter block,
// separated by blank lines and followed by free-form legend lines.
// Short rows pad with `Empty`. The letter block wins when both exist.
pub fn parse_map_text(raw: &str) -> Result<MazeMap, MapError> {
    let mut numeric: Vec<Vec<&str>> = Vec::new();
    let mut letters: Vec<Vec<&str>> = Vec::new();
    let mut current: Option<BlockKind> = None;

    for line in raw.lines() {
        let blank = line.trim().is_empty();
        let tokens = split_row(line);
        let kind = if blank { None } else { classify_row(&tokens) };

        match (current, kind) {
            (Some(active), Some(found)) if active == found => match active {
                BlockKind::Numeric => numeric.push(tokens),
                BlockKind::Letter => letters.push(tokens),
            },
            (Some(BlockKind::Letter), _) => break,
            (Some(BlockKind::Numeric), _) => {
                current = None;
                if kind == Some(BlockKind::Letter) {
                    current = Some(BlockKind::Letter);
                    letters.push(tokens);
                }
            }
            (None, Some(BlockKind::Numeric)) if numeric.is_empty() => {
                current = Some(BlockKind::Numeric);
                numeric.push(tokens);
            }
            (None, Some(BlockKind::Letter)) => {
                current = Some(BlockKind::Letter);
                letters.push(tokens);
            }
            _ => {}
        }
    }

    if !letters.is_empty() {
        return MazeMap::from_rows(&block_to_rows(&letters)?);
    }
    if !numeric.is_empty() {
        return MazeMap::from_rows(&block_to_rows(&numeric)?);
    }
    Err(MapError::NoTileRows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn letters(rows: &[&str]) -> Vec<Vec<TileSymbol>> {
        rows.iter()
            .map(|row| {
                row.chars()
                    .map(|c| TileSymbol::from_letter(c).expect("known letter"))
                    .collect()
            })
            .collect()
    }

    #[test]
    fn two_by_two_quadrant_mirrors_to_four_by_three() {
        let quadrant = vec![
            vec![TileSymbol::OutsideCorner, TileSymbol::OutsideWall],
            vec![TileSymbol::OutsideWall, TileSymbol::PelletSpot],
        ];
        let map = MazeMap::build_from_quadrant(&quadrant).expect("valid quadrant");
        assert_eq!(map.width(), 4);
        assert_eq!(map.height(), 3);
        assert_eq!(map.tile(3, 0), TileSymbol::OutsideCorner);
        assert_eq!(map.tile(2, 0), TileSymbol::OutsideWall);
        assert_eq!(map.tile(1, 1), TileSymbol::PelletSpot);
        assert_eq!(map.tile(2, 1), TileSymbol::PelletSpot);
        assert_eq!(map.tile(0, 2), TileSymbol::OutsideCorner);
        assert_eq!(map.tile(3, 2), TileSymbol::OutsideCorner);
    }

    #[test]
    fn mirrored_map_is_symmetric() {
        let map = default_maze();
        assert_eq!(map.width(), 28);
        assert_eq!(map.height(), 29);
        let (w, h) = (map.width() as i32, map.height() as i32);
        for y in 0..h {
            for x in 0..w {
                assert_eq!(map.tile(x, y), map.tile(w - 1 - x, y));
                assert_eq!(map.tile(x, y), map.tile(x, h - 1 - y));
            }
        }
    }

    #[test]
    fn quadrant_validation_rejects_bad_shapes() {
        let single_row = letters(&["xo"]);
        assert!(matches!(
            MazeMap::build_from_quadrant(&single_row),
            Err(MapError::QuadrantTooSmall { height: 1, .. })
        ));
        assert!(matches!(
            MazeMap::build_from_quadrant(&[]),
            Err(MapError::QuadrantTooSmall { .. })
        ));
        let ragged = vec![
            vec![TileSymbol::Empty, TileSymbol::Empty],
            vec![TileSymbol::Empty],
        ];
        assert!(matches!(
            MazeMap::build_from_quadrant(&ragged),
            Err(MapError::NotRectangular { row: 1, .. })
        ));
    }

    #[test]
    fn out_of_bounds_tile_is_empty() {
        let map = MazeMap::from_rows(&letters(&["xx", "xx"])).expect("valid");
        assert_eq!(map.tile(-1, 0), TileSymbol::Empty);
        assert_eq!(map.tile(0, 2), TileSymbol::Empty);
    }

    #[test]
    fn find_first_scans_rows_first() {
        let map = MazeMap::from_rows(&letters(&["eeeg", "egee"])).expect("valid");
        assert_eq!(map.find_first(TileSymbol::GhostGate), Some(GridCell::new(3, 0)));
        assert_eq!(map.find_first(TileSymbol::PowerPelletSpot), None);
    }

    #[test]
    fn straight_walls_rotate_by_horizontal_neighbours() {
        let map = MazeMap::from_rows(&letters(&["ooo", "oee", "oee"])).expect("valid");
        assert_eq!(map.rotation_for(1, 0, TileSymbol::OutsideWall), Rotation::Deg0);
        assert_eq!(map.rotation_for(0, 1, TileSymbol::OutsideWall), Rotation::Deg90);
    }

    #[test]
    fn gate_between_inside_walls_is_horizontal() {
        let map = MazeMap::from_rows(&letters(&["igi", "eee"])).expect("valid");
        assert_eq!(map.rotation_for(1, 0, TileSymbol::GhostGate), Rotation::Deg0);
    }

    #[test]
    fn corners_follow_connected_pair() {
        let top_left = MazeMap::from_rows(&letters(&["xo", "oe"])).expect("valid");
        assert_eq!(top_left.rotation_for(0, 0, TileSymbol::OutsideCorner), Rotation::Deg0);

        let top_right = MazeMap::from_rows(&letters(&["ox", "eo"])).expect("valid");
        assert_eq!(top_right.rotation_for(1, 0, TileSymbol::OutsideCorner), Rotation::Deg90);

        let bottom_left = MazeMap::from_rows(&letters(&["oe", "xo"])).expect("valid");
        assert_eq!(bottom_left.rotation_for(0, 1, TileSymbol::OutsideCorner), Rotation::Deg270);

        let bottom_right = MazeMap::from_rows(&letters(&["eo", "ox"])).expect("valid");
        assert_eq!(bottom_right.rotation_for(1, 1, TileSymbol::OutsideCorner), Rotation::Deg180);

        let inside = MazeMap::from_rows(&letters(&["ci", "ie"])).expect("valid");
        assert_eq!(inside.rotation_for(0, 0, TileSymbol::InsideCorner), Rotation::Deg0);
    }

    #[test]
    fn isolated_corner_falls_back_to_zero() {
        let map = MazeMap::from_rows(&letters(&["eee", "exe", "eee"])).expect("valid");
        assert_eq!(map.rotation_for(1, 1, TileSymbol::OutsideCorner), Rotation::Deg0);
    }

    #[test]
    fn t_junction_rotates_to_open_side() {
        let open_down = MazeMap::from_rows(&letters(&["eoe", "oto", "eee"])).expect("valid");
        assert_eq!(open_down.rotation_for(1, 1, TileSymbol::TJunction), Rotation::Deg0);

        let open_left = MazeMap::from_rows(&letters(&["eoe", "eto", "eoe"])).expect("valid");
        assert_eq!(open_left.rotation_for(1, 1, TileSymbol::TJunction), Rotation::Deg90);

        let open_up = MazeMap::from_rows(&letters(&["eee", "oto", "eoe"])).expect("valid");
        assert_eq!(open_up.rotation_for(1, 1, TileSymbol::TJunction), Rotation::Deg180);

        let open_right = MazeMap::from_rows(&letters(&["eoe", "ote", "eoe"])).expect("valid");
        assert_eq!(open_right.rotation_for(1, 1, TileSymbol::TJunction), Rotation::Deg270);

        let cross = MazeMap::from_rows(&letters(&["eoe", "oto", "eoe"])).expect("valid");
        assert_eq!(cross.rotation_for(1, 1, TileSymbol::TJunction), Rotation::Deg0);
    }

    #[test]
    fn non_wall_symbols_never_rotate() {
        let map = MazeMap::from_rows(&letters(&["oso", "eee"])).expect("valid");
        assert_eq!(map.rotation_for(1, 0, TileSymbol::PelletSpot), Rotation::Deg0);
        assert!(map
            .rotations()
            .iter()
            .all(|entry| entry.symbol != TileSymbol::PelletSpot));
    }

    #[test]
    fn load_map_reports_unknown_tokens() {
        let ok = load_map(&[vec!["1", "o"], vec!["s", "8"]]).expect("valid tokens");
        assert_eq!(ok.tile(0, 0), TileSymbol::OutsideCorner);
        assert_eq!(ok.tile(1, 1), TileSymbol::GhostGate);

        let err = load_map(&[vec!["1", "q"]]).expect_err("bad token");
        assert!(matches!(err, MapError::UnknownToken { row: 0, col: 1, .. }));
    }

    #[test]
    fn parse_map_text_prefers_letter_block() {
        let raw = "1,2,2\n2,5,5\n\nx,o,o\no,p,s\n\nLegend: x = outside corner\n";
        let map = parse_map_text(raw).expect("parses");
        assert_eq!(map.width(), 3);
        assert_eq!(map.height(), 2);
        assert_eq!(map.tile(1, 1), TileSymbol::PowerPelletSpot);
    }

    #[test]
    fn parse_map_text_falls_back_to_numeric_block() {
        let raw = "1,2,7\r\n2,5\r\n\r\nnotes follow here\r\n";
        let map = parse_map_text(raw).expect("parses");
        assert_eq!(map.width(), 3);
        assert_eq!(map.tile(2, 0), TileSymbol::TJunction);
        assert_eq!(map.tile(2, 1), TileSymbol::Empty);
    }

    #[test]
    fn parse_map_text_accepts_letters_only() {
        let map = parse_map_text("x,o\no,s,\n").expect("parses");
        assert_eq!(map.width(), 2);
        assert_eq!(map.tile(1, 1), TileSymbol::PelletSpot);
    }

    #[test]
    fn parse_map_text_without_tiles_fails() {
        assert!(matches!(
            parse_map_text("hello world\n\nlegend only"),
            Err(MapError::NoTileRows)
        ));
        assert!(matches!(parse_map_text(""), Err(MapError::NoTileRows)));
    }

    #[test]
    fn letter_rows_render_map() {
        let map = MazeMap::from_rows(&letters(&["xg", "sp"])).expect("valid");
        assert_eq!(map.to_letter_rows(), vec!["xg".to_string(), "sp".to_string()]);
    }
}
