//! Snake layout of stages on a wrapped, multi-row track.
//!
//! Stages are placed row-major with alternating traversal direction: even
//! rows run left to right, odd rows right to left. A short final row keeps
//! its stages in its first columns whichever way it runs. Coordinates are
//! normalized to a 0–100 unit square so any renderer can scale them.

/// Row/column cell of one stage on the track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridPosition {
    pub row: usize,
    pub col: usize,
    /// Total number of rows on the track.
    pub row_count: usize,
}

/// A point in the normalized 0–100 track space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathPoint {
    pub x: f64,
    pub y: f64,
}

/// Number of rows needed for `stage_count` stages.
pub fn row_count(stage_count: usize, row_width: usize) -> usize {
    stage_count.div_ceil(row_width.max(1))
}

/// Row and column of the stage at `index`.
///
/// An index at or beyond `stage_count` (a run that finished past the last
/// stage) clamps to the last stage so the marker parks at the end of the
/// track. Callers must not ask for a position on an empty track; a zero
/// `stage_count` is treated as a single stage.
pub fn compute_position(index: usize, stage_count: usize, row_width: usize) -> GridPosition {
    let width = row_width.max(1);
    let count = stage_count.max(1);
    let index = index.min(count - 1);

    let row = index / width;
    let offset = index % width;
    let in_row = width.min(count - row * width);
    let col = if row % 2 == 0 {
        offset
    } else {
        (in_row - 1) - offset
    };

    GridPosition {
        row,
        col,
        row_count: row_count(count, width),
    }
}

/// Normalized centre of a grid cell.
pub fn cell_center(position: GridPosition, row_width: usize) -> PathPoint {
    let width = row_width.max(1) as f64;
    let rows = position.row_count.max(1) as f64;
    PathPoint {
        x: (position.col as f64 + 0.5) / width * 100.0,
        y: (position.row as f64 + 0.5) / rows * 100.0,
    }
}

/// The continuous track through every stage, in stage order.
///
/// Between the last stage of row `r` and the first stage of row `r + 1`
/// one transition point is inserted at the last stage's x and the y midway
/// between the two rows, so the track turns a corner instead of cutting
/// diagonally. Zero stages yield an empty path.
pub fn compute_path(stage_count: usize, row_width: usize) -> Vec<PathPoint> {
    let width = row_width.max(1);
    let rows = row_count(stage_count, width);
    let mut points = Vec::with_capacity(stage_count + rows.saturating_sub(1));

    for index in 0..stage_count {
        let position = compute_position(index, stage_count, width);
        let point = cell_center(position, width);
        points.push(point);

        let ends_row = (index + 1) % width == 0;
        if ends_row && position.row + 1 < rows {
            points.push(PathPoint {
                x: point.x,
                y: (position.row + 1) as f64 / rows as f64 * 100.0,
            });
        }
    }

    points
}

/// Precomputed layout for one stage configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackLayout {
    row_width: usize,
    positions: Vec<GridPosition>,
    path: Vec<PathPoint>,
}

impl TrackLayout {
    pub fn new(stage_count: usize, row_width: usize) -> Self {
        let row_width = row_width.max(1);
        Self {
            row_width,
            positions: (0..stage_count)
                .map(|i| compute_position(i, stage_count, row_width))
                .collect(),
            path: compute_path(stage_count, row_width),
        }
    }

    pub fn row_width(&self) -> usize {
        self.row_width
    }

    pub fn row_count(&self) -> usize {
        row_count(self.positions.len(), self.row_width)
    }

    pub fn positions(&self) -> &[GridPosition] {
        &self.positions
    }

    pub fn path(&self) -> &[PathPoint] {
        &self.path
    }

    /// Cell of the stage at `index`, clamped to the last stage. `None` on an
    /// empty track.
    pub fn position_of(&self, index: usize) -> Option<GridPosition> {
        let last = self.positions.len().checked_sub(1)?;
        self.positions.get(index.min(last)).copied()
    }

    /// Normalized point of the stage at `index`, clamped like
    /// [`TrackLayout::position_of`].
    pub fn point_of(&self, index: usize) -> Option<PathPoint> {
        self.position_of(index)
            .map(|position| cell_center(position, self.row_width))
    }
}
