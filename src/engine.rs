use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A direction to move/merge tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
}

impl Move {
    /// Deterministic probing order shared by every strategy that scans all directions.
    pub const ALL: [Move; 4] = [Move::Up, Move::Down, Move::Left, Move::Right];

    pub fn as_str(self) -> &'static str {
        match self {
            Move::Up => "up",
            Move::Down => "down",
            Move::Left => "left",
            Move::Right => "right",
        }
    }

    /// Keyboard label of the direction (WASD).
    pub fn label(self) -> char {
        match self {
            Move::Up => 'w',
            Move::Down => 's',
            Move::Left => 'a',
            Move::Right => 'd',
        }
    }

    /// Parse a single WASD key, case-insensitive.
    pub fn from_label(label: char) -> Result<Move, EngineError> {
        match label.to_ascii_lowercase() {
            'w' => Ok(Move::Up),
            's' => Ok(Move::Down),
            'a' => Ok(Move::Left),
            'd' => Ok(Move::Right),
            _ => Err(EngineError::InvalidDirection(label.to_string())),
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Move {
    type Err = EngineError;

    /// Accepts a direction name (`"up"`) or its key label (`"w"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" | "w" => Ok(Move::Up),
            "down" | "s" => Ok(Move::Down),
            "left" | "a" => Ok(Move::Left),
            "right" | "d" => Ok(Move::Right),
            _ => Err(EngineError::InvalidDirection(s.to_string())),
        }
    }
}

pub type Tile = u32;
pub type Score = u64;
/// One row or column, read in the direction tiles slide towards.
pub type Line = [Tile; 4];

/// Reaching this tile (or anything above it) wins the game.
pub const WIN_TILE: Tile = 2048;
/// Probability that a spawned tile is a 2.
pub const SPAWN_TWO_PROBABILITY: f64 = 0.9;
/// Probability that a spawned tile is a 4.
pub const SPAWN_FOUR_PROBABILITY: f64 = 0.1;

const CORNERS: [(usize, usize); 4] = [(0, 0), (0, 3), (3, 0), (3, 3)];

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("invalid direction {0:?}: expected up/down/left/right or w/s/a/d")]
    InvalidDirection(String),
    #[error("invalid tile value {value}: tiles are 0 or a power of two >= 2")]
    InvalidTile { value: Tile },
    #[error("move sequence is empty")]
    EmptyMoveSequence,
}

/// 4x4 2048 board, row-major, row 0 at the top.
///
/// Every non-zero cell holds a power of two >= 2. The board is `Copy`, so
/// hypothetical moves always work on an independent value.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Board([[Tile; 4]; 4]);

/// Result of sliding a board in one direction, before any tile is spawned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slide {
    pub board: Board,
    /// Sum of every tile created by a merge during the slide.
    pub gain: Score,
    pub changed: bool,
}

impl Board {
    /// A constant empty board (all zeros).
    pub const EMPTY: Board = Board([[0; 4]; 4]);

    /// Build a board from rows, rejecting values that are not 0 or a power of two >= 2.
    ///
    /// ```
    /// use ai_2048_heuristics::engine::Board;
    /// let b = Board::from_rows([[2, 0, 0, 0], [0; 4], [0; 4], [0, 0, 0, 4]]).unwrap();
    /// assert_eq!(b.highest_tile(), 4);
    /// assert!(Board::from_rows([[3, 0, 0, 0], [0; 4], [0; 4], [0; 4]]).is_err());
    /// ```
    pub fn from_rows(rows: [[Tile; 4]; 4]) -> Result<Self, EngineError> {
        for &value in rows.iter().flatten() {
            if value != 0 && (value < 2 || !value.is_power_of_two()) {
                return Err(EngineError::InvalidTile { value });
            }
        }
        Ok(Board(rows))
    }

    #[inline]
    pub fn rows(&self) -> [[Tile; 4]; 4] {
        self.0
    }

    #[inline]
    pub fn row(&self, row: usize) -> Line {
        self.0[row]
    }

    #[inline]
    pub fn column(&self, col: usize) -> Line {
        [self.0[0][col], self.0[1][col], self.0[2][col], self.0[3][col]]
    }

    #[inline]
    pub fn tile(&self, row: usize, col: usize) -> Tile {
        self.0[row][col]
    }

    /// Copy of the board with one cell replaced.
    #[inline]
    pub fn with_tile(self, row: usize, col: usize, value: Tile) -> Self {
        debug_assert!(value == 0 || (value >= 2 && value.is_power_of_two()));
        let mut next = self;
        next.0[row][col] = value;
        next
    }

    /// All 16 cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Tile> + '_ {
        self.0.iter().flatten().copied()
    }

    /// Count the number of empty cells on the board.
    #[inline]
    pub fn count_empty(&self) -> usize {
        self.cells().filter(|&v| v == 0).count()
    }

    /// Coordinates `(row, col)` of every empty cell, row-major.
    pub fn empty_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.0.iter().enumerate().flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .filter(|&(_, &value)| value == 0)
                .map(move |(c, _)| (r, c))
        })
    }

    /// Return the highest tile value (e.g., 2048) present on the board, 0 when empty.
    #[inline]
    pub fn highest_tile(&self) -> Tile {
        self.cells().max().unwrap_or(0)
    }

    /// Sum of all tile values.
    pub fn tile_sum(&self) -> u64 {
        self.cells().map(u64::from).sum()
    }

    /// True if the highest tile sits in one of the four corners.
    pub fn max_in_corner(&self) -> bool {
        let max = self.highest_tile();
        max != 0 && CORNERS.iter().any(|&(r, c)| self.0[r][c] == max)
    }

    /// Mirror along the main diagonal: cell `(r, c)` moves to `(c, r)`.
    pub fn transpose(self) -> Self {
        let mut out = [[0; 4]; 4];
        for (r, row) in self.0.iter().enumerate() {
            for (c, &value) in row.iter().enumerate() {
                out[c][r] = value;
            }
        }
        Board(out)
    }

    /// Reverse every row: cell `(r, c)` moves to `(r, 3 - c)`.
    pub fn reverse_rows(self) -> Self {
        let mut out = [[0; 4]; 4];
        for (r, row) in self.0.iter().enumerate() {
            for (c, &value) in row.iter().enumerate() {
                out[r][3 - c] = value;
            }
        }
        Board(out)
    }

    // Remap so that `dir` becomes a slide to the left.
    fn orient(self, dir: Move) -> Self {
        match dir {
            Move::Left => self,
            Move::Right => self.reverse_rows(),
            Move::Up => self.transpose(),
            Move::Down => self.transpose().reverse_rows(),
        }
    }

    fn unorient(self, dir: Move) -> Self {
        match dir {
            Move::Left => self,
            Move::Right => self.reverse_rows(),
            Move::Up => self.transpose(),
            Move::Down => self.reverse_rows().transpose(),
        }
    }

    /// Slide/merge tiles in `dir`. No randomness, nothing is spawned.
    ///
    /// ```
    /// use ai_2048_heuristics::engine::{Board, Move};
    /// let b = Board::from_rows([[2, 2, 2, 2], [0; 4], [0; 4], [0; 4]]).unwrap();
    /// let slide = b.slide(Move::Left);
    /// assert_eq!(slide.board.row(0), [4, 4, 0, 0]);
    /// assert_eq!(slide.gain, 8);
    /// assert!(slide.changed);
    /// ```
    pub fn slide(self, dir: Move) -> Slide {
        let mut oriented = self.orient(dir);
        let mut gain = 0;
        for line in oriented.0.iter_mut() {
            let (merged, line_gain) = merge_line(*line);
            *line = merged;
            gain += line_gain;
        }
        let board = oriented.unorient(dir);
        Slide { board, gain, changed: board != self }
    }

    /// Board after sliding in `dir`, without the merge gain.
    #[inline]
    pub fn shift(self, dir: Move) -> Self {
        self.slide(dir).board
    }

    /// Insert a random 2 (90%) or 4 (10%) tile into a random empty slot, using the provided RNG.
    ///
    /// A full board is returned unchanged.
    ///
    /// ```
    /// use ai_2048_heuristics::engine::Board;
    /// use rand::{SeedableRng, rngs::StdRng};
    /// let mut rng = StdRng::seed_from_u64(123);
    /// let b = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
    /// assert_eq!(b.count_empty(), 14);
    /// ```
    pub fn with_random_tile<R: Rng + ?Sized>(self, rng: &mut R) -> Self {
        let empty = self.count_empty();
        if empty == 0 {
            return self;
        }
        match self.empty_cells().nth(rng.gen_range(0..empty)) {
            Some((row, col)) => self.with_tile(row, col, generate_random_tile(rng)),
            None => self,
        }
    }

    /// True when no move in any direction can change the board.
    ///
    /// Any empty cell answers `false` before adjacency is scanned.
    pub fn is_terminal(&self) -> bool {
        if self.cells().any(|v| v == 0) {
            return false;
        }
        for r in 0..4 {
            for c in 0..4 {
                let value = self.0[r][c];
                if c < 3 && value == self.0[r][c + 1] {
                    return false;
                }
                if r < 3 && value == self.0[r + 1][c] {
                    return false;
                }
            }
        }
        true
    }

    /// True once any tile reaches [`WIN_TILE`].
    #[inline]
    pub fn has_won(&self) -> bool {
        self.cells().any(|v| v >= WIN_TILE)
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board({:?})", self.0)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (r, row) in self.0.iter().enumerate() {
            if r > 0 {
                writeln!(f, "-------------------------------")?;
            }
            let cells: Vec<String> = row.iter().map(format_val).collect();
            writeln!(f, "{}", cells.join("|"))?;
        }
        Ok(())
    }
}

impl TryFrom<[[Tile; 4]; 4]> for Board {
    type Error = EngineError;

    fn try_from(rows: [[Tile; 4]; 4]) -> Result<Self, Self::Error> {
        Board::from_rows(rows)
    }
}

/// Compact, merge and pad a single line towards index 0.
///
/// Each tile merges at most once per call, so `[2, 2, 2, 2]` becomes
/// `[4, 4, 0, 0]`. Returns the new line and the sum of the merged values.
///
/// ```
/// use ai_2048_heuristics::engine::merge_line;
/// assert_eq!(merge_line([2, 0, 2, 4]), ([4, 4, 0, 0], 4));
/// assert_eq!(merge_line([2, 2, 2, 2]), ([4, 4, 0, 0], 8));
/// ```
pub fn merge_line(line: Line) -> (Line, Score) {
    let mut out = [0; 4];
    let mut len = 0;
    let mut gain = 0;
    let mut pending: Option<Tile> = None;
    for value in line.into_iter().filter(|&v| v != 0) {
        match pending {
            Some(prev) if prev == value => {
                let merged = prev * 2;
                out[len] = merged;
                len += 1;
                gain += Score::from(merged);
                pending = None;
            }
            Some(prev) => {
                out[len] = prev;
                len += 1;
                pending = Some(value);
            }
            None => pending = Some(value),
        }
    }
    if let Some(prev) = pending {
        out[len] = prev;
    }
    (out, gain)
}

fn generate_random_tile<R: Rng + ?Sized>(rng: &mut R) -> Tile {
    if rng.gen_range(0..10) < 9 {
        2
    } else {
        4
    }
}

fn format_val(val: &Tile) -> String {
    match val {
        0 => String::from("       "),
        &x => format!("{:^7}", x),
    }
}

/// One game in progress: the board plus the cumulative score.
///
/// `Clone` yields a fully independent copy; lookahead code uses
/// [`Session::probe`] instead, which never touches the RNG.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Session {
    board: Board,
    score: Score,
}

impl Session {
    /// Start a game: empty board plus two spawned tiles.
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let board = Board::EMPTY.with_random_tile(rng).with_random_tile(rng);
        Session { board, score: 0 }
    }

    /// Resume from an explicit board and score.
    pub fn from_parts(board: Board, score: Score) -> Self {
        Session { board, score }
    }

    #[inline]
    pub fn board(&self) -> Board {
        self.board
    }

    #[inline]
    pub fn score(&self) -> Score {
        self.score
    }

    /// Snapshot of the board together with the score.
    #[inline]
    pub fn state(&self) -> (Board, Score) {
        (self.board, self.score)
    }

    #[inline]
    pub fn highest_tile(&self) -> Tile {
        self.board.highest_tile()
    }

    /// Spawn one random tile; no-op on a full board.
    pub fn spawn_tile<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.board = self.board.with_random_tile(rng);
    }

    /// The session that would result from sliding in `dir`, before any spawn.
    ///
    /// Returns `None` when the slide leaves the board unchanged.
    pub fn probe(&self, dir: Move) -> Option<Session> {
        let slide = self.board.slide(dir);
        if !slide.changed {
            return None;
        }
        Some(Session { board: slide.board, score: self.score + slide.gain })
    }

    /// Perform a move, then spawn a tile if the move changed the board.
    ///
    /// Returns whether the board changed. An ineffective move neither spawns
    /// nor scores.
    ///
    /// ```
    /// use ai_2048_heuristics::engine::{Move, Session};
    /// use rand::{SeedableRng, rngs::StdRng};
    /// let mut rng = StdRng::seed_from_u64(1);
    /// let mut session = Session::new(&mut rng);
    /// let moved = Move::ALL.iter().any(|&dir| session.apply_move(dir, &mut rng));
    /// assert!(moved);
    /// ```
    pub fn apply_move<R: Rng + ?Sized>(&mut self, dir: Move, rng: &mut R) -> bool {
        match self.probe(dir) {
            Some(next) => {
                *self = next;
                self.spawn_tile(rng);
                true
            }
            None => false,
        }
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.board.is_terminal()
    }

    #[inline]
    pub fn has_won(&self) -> bool {
        self.board.has_won()
    }
}

/// Start a new session using the thread-local RNG.
///
/// For reproducible behavior, prefer `Session::new(&mut impl Rng)`.
pub fn new_session() -> Session {
    Session::new(&mut rand::thread_rng())
}

/// Perform a move on `session` using the thread-local RNG for the spawn.
pub fn apply_move(session: &mut Session, direction: Move) -> bool {
    session.apply_move(direction, &mut rand::thread_rng())
}

pub fn is_terminal(session: &Session) -> bool {
    session.is_terminal()
}

pub fn has_won(session: &Session) -> bool {
    session.has_won()
}

pub fn get_state(session: &Session) -> (Board, Score) {
    session.state()
}

/// Fixed, non-empty move cycle replayed by index modulo its length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveSequence(Vec<Move>);

#[allow(clippy::len_without_is_empty)]
impl MoveSequence {
    pub fn new(moves: Vec<Move>) -> Result<Self, EngineError> {
        if moves.is_empty() {
            return Err(EngineError::EmptyMoveSequence);
        }
        Ok(MoveSequence(moves))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Move at position `idx` of the repeating cycle.
    #[inline]
    pub fn get(&self, idx: usize) -> Move {
        self.0[idx % self.0.len()]
    }

    pub fn moves(&self) -> &[Move] {
        &self.0
    }
}

impl FromStr for MoveSequence {
    type Err = EngineError;

    /// Parses either a run of WASD keys (`"sdsa"`) or direction names
    /// separated by commas or whitespace (`"down, right"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
            .collect();
        let moves = match tokens.as_slice() {
            [keys] if keys.chars().all(|c| "wasdWASD".contains(c)) => {
                keys.chars().map(Move::from_label).collect::<Result<Vec<_>, _>>()?
            }
            _ => tokens.iter().map(|t| t.parse::<Move>()).collect::<Result<Vec<_>, _>>()?,
        };
        MoveSequence::new(moves)
    }
}

impl fmt::Display for MoveSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|m| write!(f, "{}", m.label()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn board(rows: [[Tile; 4]; 4]) -> Board {
        Board::from_rows(rows).unwrap()
    }

    #[test]
    fn it_merge_line() {
        assert_eq!(merge_line([0, 0, 0, 0]), ([0, 0, 0, 0], 0));
        assert_eq!(merge_line([2, 4, 2, 4]), ([2, 4, 2, 4], 0));
        assert_eq!(merge_line([2, 2, 4, 4]), ([4, 8, 0, 0], 12));
        assert_eq!(merge_line([2, 0, 0, 2]), ([4, 0, 0, 0], 4));
        assert_eq!(merge_line([2, 2, 2, 2]), ([4, 4, 0, 0], 8));
        assert_eq!(merge_line([2, 0, 2, 4]), ([4, 4, 0, 0], 4));
        assert_eq!(merge_line([4, 2, 2, 0]), ([4, 4, 0, 0], 4));
        assert_eq!(merge_line([0, 2, 2, 2]), ([4, 2, 0, 0], 4));
    }

    #[test]
    fn test_move_left() {
        let game = board([[2, 4, 8, 16], [2, 8, 8, 4], [4, 0, 0, 4], [2, 0, 0, 4]]);
        let game = game.shift(Move::Left);
        assert_eq!(game, board([[2, 4, 8, 16], [2, 16, 4, 0], [8, 0, 0, 0], [2, 4, 0, 0]]));
    }

    #[test]
    fn test_move_right() {
        let game = board([[2, 4, 8, 16], [2, 8, 8, 4], [4, 0, 0, 4], [2, 0, 0, 4]]);
        let game = game.shift(Move::Right);
        assert_eq!(game, board([[2, 4, 8, 16], [0, 2, 16, 4], [0, 0, 0, 8], [0, 0, 2, 4]]));
    }

    #[test]
    fn test_move_up() {
        let game = board([[2, 2, 4, 2], [4, 8, 0, 0], [8, 8, 0, 0], [16, 4, 4, 4]]);
        let game = game.shift(Move::Up);
        assert_eq!(game, board([[2, 2, 8, 2], [4, 16, 0, 4], [8, 4, 0, 0], [16, 0, 0, 0]]));
    }

    #[test]
    fn test_move_down() {
        let game = board([[2, 2, 4, 2], [4, 8, 0, 0], [8, 8, 0, 0], [16, 4, 4, 4]]);
        let game = game.shift(Move::Down);
        assert_eq!(game, board([[2, 0, 0, 0], [4, 2, 0, 0], [8, 16, 0, 2], [16, 4, 8, 4]]));
    }

    #[test]
    fn it_slide_reports_gain_and_change() {
        let game = board([[2, 2, 0, 0], [0; 4], [0; 4], [4, 4, 8, 8]]);
        let slide = game.slide(Move::Right);
        assert!(slide.changed);
        assert_eq!(slide.gain, 4 + 8 + 16);
        let packed = board([[2, 4, 8, 16], [0; 4], [0; 4], [0; 4]]);
        let slide = packed.slide(Move::Up);
        assert!(!slide.changed);
        assert_eq!(slide.gain, 0);
        assert_eq!(slide.board, packed);
    }

    #[test]
    fn it_transpose_and_reverse_are_involutions() {
        let game = board([[2, 4, 8, 16], [32, 64, 128, 256], [0, 2, 0, 4], [8, 0, 16, 0]]);
        assert_eq!(game.transpose().transpose(), game);
        assert_eq!(game.reverse_rows().reverse_rows(), game);
        assert_eq!(game.transpose().tile(3, 1), 256);
        assert_eq!(game.reverse_rows().row(0), [16, 8, 4, 2]);
    }

    #[test]
    fn it_count_empty() {
        let game = board([[2, 2, 2, 2], [0; 4], [2, 2, 2, 2], [0; 4]]);
        assert_eq!(game.count_empty(), 8);
        assert_eq!(game.empty_cells().count(), 8);
        assert_eq!(game.empty_cells().next(), Some((1, 0)));
        assert_eq!(Board::EMPTY.count_empty(), 16);
    }

    #[test]
    fn empty_cells_are_row_major() {
        let game = board([[2, 0, 4, 0], [8, 16, 32, 64], [0, 2, 2, 2], [4, 4, 4, 0]]);
        let cells: Vec<_> = game.empty_cells().collect();
        assert_eq!(cells, vec![(0, 1), (0, 3), (2, 0), (3, 3)]);
        assert_eq!(cells.len(), game.count_empty());
        assert!(cells.iter().all(|&(r, c)| game.tile(r, c) == 0));
        assert_eq!(Board::EMPTY.empty_cells().nth(15), Some((3, 3)));
    }

    #[test]
    fn it_random_tile_lands_in_an_empty_cell() {
        let game = board([[2, 0, 4, 0], [8, 16, 32, 64], [0, 2, 2, 2], [4, 4, 4, 0]]);
        let free: Vec<_> = game.empty_cells().collect();
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..200 {
            let next = game.with_random_tile(&mut rng);
            let filled: Vec<_> = free.iter().filter(|&&(r, c)| next.tile(r, c) != 0).collect();
            assert_eq!(filled.len(), 1);
            for (r, c) in (0..4).flat_map(|r| (0..4).map(move |c| (r, c))) {
                if game.tile(r, c) != 0 {
                    assert_eq!(next.tile(r, c), game.tile(r, c));
                }
            }
        }
    }

    #[test]
    fn it_rejects_invalid_tiles() {
        assert_eq!(
            Board::from_rows([[1, 0, 0, 0], [0; 4], [0; 4], [0; 4]]),
            Err(EngineError::InvalidTile { value: 1 })
        );
        assert_eq!(
            Board::from_rows([[0; 4], [0; 4], [0, 6, 0, 0], [0; 4]]),
            Err(EngineError::InvalidTile { value: 6 })
        );
    }

    #[test]
    fn checkerboard_is_terminal() {
        let game = board([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]]);
        assert!(game.is_terminal());
        for dir in Move::ALL {
            assert!(!game.slide(dir).changed);
        }
    }

    #[test]
    fn full_board_with_pair_is_not_terminal() {
        let game = board([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 4]]);
        assert!(!game.is_terminal());
        let vertical = board([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 8], [4, 2, 4, 8]]);
        assert!(!vertical.is_terminal());
        // The empty board answers false on the first cell.
        assert!(!Board::EMPTY.is_terminal());
    }

    #[test]
    fn has_won_uses_threshold() {
        assert!(!board([[1024, 0, 0, 0], [0; 4], [0; 4], [0; 4]]).has_won());
        assert!(board([[2048, 0, 0, 0], [0; 4], [0; 4], [0; 4]]).has_won());
        assert!(board([[0; 4], [0; 4], [0; 4], [0, 0, 0, 4096]]).has_won());
    }

    #[test]
    fn it_random_tile_fills_board() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut game = Board::EMPTY;
        for _ in 0..16 {
            game = game.with_random_tile(&mut rng);
        }
        assert_eq!(game.count_empty(), 0);
        assert_eq!(game.with_random_tile(&mut rng), game);
        assert!(game.cells().all(|v| v == 2 || v == 4));
    }

    #[test]
    fn spawn_distribution_is_ninety_ten() {
        let mut rng = StdRng::seed_from_u64(2048);
        let draws = 10_000;
        let fours = (0..draws)
            .map(|_| Board::EMPTY.with_random_tile(&mut rng).highest_tile())
            .inspect(|&v| assert!(v == 2 || v == 4))
            .filter(|&v| v == 4)
            .count();
        let ratio = fours as f64 / draws as f64;
        assert!((ratio - 0.1).abs() < 0.02, "fraction of fours was {ratio}");
    }

    #[test]
    fn new_session_has_two_tiles() {
        let mut rng = StdRng::seed_from_u64(3);
        let session = Session::new(&mut rng);
        assert_eq!(session.board().count_empty(), 14);
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn free_functions_drive_a_game() {
        let mut s = new_session();
        assert_eq!(get_state(&s), (s.board(), s.score()));
        assert_eq!(get_state(&s).0.count_empty(), 14);
        assert_eq!(get_state(&s).1, 0);
        assert!(!is_terminal(&s));
        assert!(!has_won(&s));

        // Two tiles on an empty board always leave some direction that moves them.
        let dir = Move::ALL
            .into_iter()
            .find(|&d| s.probe(d).is_some())
            .unwrap();
        let slid = s.probe(dir).unwrap();
        assert!(apply_move(&mut s, dir));
        let (after, score) = get_state(&s);
        assert_eq!(score, slid.score());
        assert_eq!(after.count_empty(), slid.board().count_empty() - 1);
        let spawned = after.tile_sum() - slid.board().tile_sum();
        assert!(spawned == 2 || spawned == 4);

        // A dead move leaves board and score alone.
        let stuck = board([[2, 4, 8, 16], [0; 4], [0; 4], [0; 4]]);
        let mut s = Session::from_parts(stuck, 7);
        assert!(!apply_move(&mut s, Move::Up));
        assert_eq!(get_state(&s), (stuck, 7));

        let locked = Session::from_parts(
            board([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]]),
            0,
        );
        assert!(is_terminal(&locked));
        assert!(!has_won(&locked));
        let won = Session::from_parts(board([[2048, 0, 0, 0], [0; 4], [0; 4], [0; 4]]), 0);
        assert!(has_won(&won));
        assert!(!is_terminal(&won));
    }

    #[test]
    fn apply_move_spawns_only_on_change() {
        let mut rng = StdRng::seed_from_u64(11);
        let start = board([[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]]);
        let mut session = Session::from_parts(start, 10);

        // Up does nothing: everything already sits in row 0 with no vertical pair.
        assert!(!session.apply_move(Move::Up, &mut rng));
        assert_eq!(session.state(), (start, 10));

        assert!(session.apply_move(Move::Left, &mut rng));
        assert_eq!(session.score(), 14);
        assert_eq!(session.board().tile(0, 0), 4);
        // The merged 4 plus exactly one spawned tile.
        assert_eq!(session.board().count_empty(), 14);
    }

    #[test]
    fn probe_does_not_spawn_or_alias() {
        let start = board([[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]]);
        let session = Session::from_parts(start, 0);
        let probed = session.probe(Move::Right).unwrap();
        assert_eq!(probed.board(), board([[0, 0, 0, 4], [0; 4], [0; 4], [0; 4]]));
        assert_eq!(probed.score(), 4);
        assert_eq!(session.board(), start);
        assert!(session.probe(Move::Up).is_none());

        let mut copy = session.clone();
        copy.spawn_tile(&mut StdRng::seed_from_u64(0));
        assert_eq!(session.board(), start);
        assert_ne!(copy.board(), start);
    }

    #[test]
    fn it_parse_moves() {
        assert_eq!("up".parse::<Move>(), Ok(Move::Up));
        assert_eq!(" Down ".parse::<Move>(), Ok(Move::Down));
        assert_eq!("a".parse::<Move>(), Ok(Move::Left));
        assert_eq!(Move::from_label('D'), Ok(Move::Right));
        assert_eq!(
            "north".parse::<Move>(),
            Err(EngineError::InvalidDirection("north".to_string()))
        );
        assert!(Move::from_label('x').is_err());
        for dir in Move::ALL {
            assert_eq!(dir.as_str().parse::<Move>(), Ok(dir));
            assert_eq!(Move::from_label(dir.label()), Ok(dir));
        }
    }

    #[test]
    fn it_parse_sequences() {
        let keys: MoveSequence = "sdsa".parse().unwrap();
        assert_eq!(keys.moves(), &[Move::Down, Move::Right, Move::Down, Move::Left]);
        assert_eq!(keys.get(5), Move::Right);
        assert_eq!(keys.to_string(), "sdsa");

        let names: MoveSequence = "up, left right".parse().unwrap();
        assert_eq!(names.moves(), &[Move::Up, Move::Left, Move::Right]);

        let single: MoveSequence = "down".parse().unwrap();
        assert_eq!(single.len(), 1);

        assert_eq!("".parse::<MoveSequence>(), Err(EngineError::EmptyMoveSequence));
        assert_eq!(" , ".parse::<MoveSequence>(), Err(EngineError::EmptyMoveSequence));
        assert_eq!(MoveSequence::new(Vec::new()), Err(EngineError::EmptyMoveSequence));
        assert!("wasx".parse::<MoveSequence>().is_err());
    }

    #[test]
    fn it_display_board() {
        let game = board([[2, 0, 0, 0], [0; 4], [0; 4], [0, 0, 0, 2048]]);
        let text = game.to_string();
        assert_eq!(text.lines().count(), 7);
        assert!(text.starts_with("   2   |"));
        assert!(text.contains(" 2048  "));
    }
}
