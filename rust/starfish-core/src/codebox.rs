//! The codebox: a fixed-size, mutable grid of instruction cells.
//!
//! Dimensions are set once at load time. Reads outside the grid return
//! [`Cell::Empty`]; writes outside it fail, so self-modifying programs can
//! only rewrite cells that already exist.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("script is empty")]
    Empty,
    #[error("cannot read '{}': {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodeboxError {
    #[error("cell ({row}, {col}) is outside the {width}x{height} codebox")]
    OutOfRange {
        row: i64,
        col: i64,
        width: usize,
        height: usize,
    },
}

/// A single grid cell. Padding and cells cleared with code 0 are `Empty`;
/// a space from the source text is kept as `Char(' ')`. Both `g` and string
/// mode read an empty cell as 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Char(char),
}

impl Cell {
    /// The character the IP executes; empty cells behave like a space.
    pub fn instruction(&self) -> char {
        match self {
            Cell::Empty => ' ',
            Cell::Char(c) => *c,
        }
    }

    /// The code `g` reports for this cell.
    pub fn code(&self) -> i64 {
        match self {
            Cell::Empty => 0,
            Cell::Char(c) => *c as i64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Codebox {
    rows: Vec<Vec<Cell>>,
    width: usize,
    height: usize,
}

impl Codebox {
    /// Build a grid from script text. Rows are split on line breaks and
    /// padded with empty cells to the longest row.
    pub fn parse(source: &str) -> Result<Self, LoadError> {
        let lines: Vec<&str> = source.lines().collect();
        let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        if width == 0 {
            return Err(LoadError::Empty);
        }
        let height = lines.len();
        let rows = lines
            .iter()
            .map(|line| {
                let mut row: Vec<Cell> = line.chars().map(Cell::Char).collect();
                row.resize(width, Cell::Empty);
                row
            })
            .collect();
        Ok(Self {
            rows,
            width,
            height,
        })
    }

    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let source = std::fs::read_to_string(path).map_err(|source| LoadError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&source)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn index(&self, row: i64, col: i64) -> Option<(usize, usize)> {
        let r = usize::try_from(row).ok().filter(|r| *r < self.height)?;
        let c = usize::try_from(col).ok().filter(|c| *c < self.width)?;
        Some((r, c))
    }

    pub fn contains(&self, row: i64, col: i64) -> bool {
        self.index(row, col).is_some()
    }

    pub fn get(&self, row: i64, col: i64) -> Cell {
        match self.index(row, col) {
            Some((r, c)) => self.rows[r][c],
            None => Cell::Empty,
        }
    }

    pub fn set(&mut self, row: i64, col: i64, cell: Cell) -> Result<(), CodeboxError> {
        let (r, c) = self.index(row, col).ok_or(CodeboxError::OutOfRange {
            row,
            col,
            width: self.width,
            height: self.height,
        })?;
        self.rows[r][c] = cell;
        Ok(())
    }

    /// The current grid as text, one line per row.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for row in &self.rows {
            out.extend(row.iter().map(Cell::instruction));
            out.push('\n');
        }
        out
    }

    /// Like [`Codebox::render`], with every cell padded to three columns and
    /// the cell under the pointer wrapped in `*`.
    pub fn render_with_cursor(&self, cursor_row: i64, cursor_col: i64) -> String {
        let mut out = String::new();
        for (r, row) in self.rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                let here = r as i64 == cursor_row && c as i64 == cursor_col;
                let mark = if here { '*' } else { ' ' };
                out.push(mark);
                out.push(cell.instruction());
                out.push(mark);
            }
            out.push('\n');
        }
        out
    }
}
