//! Spatial placement strategies for ripples

use glam::Vec2;
use rand::seq::SliceRandom;
use rand::Rng;
use std::f32::consts::TAU;

/// Grid side length
pub const GRID_SIZE: usize = 8;
/// Number of grid cells
pub const GRID_CELLS: usize = GRID_SIZE * GRID_SIZE;
/// Turns of the spiral layout
const SPIRAL_TURNS: f32 = 3.0;

/// Labels in control order
pub const LAYOUT_LABELS: &[&str] = &["Random", "Row", "Grid", "Spiral"];

/// How ripple positions are chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutMode {
    /// Uniform over the viewport
    #[default]
    Random,
    /// Left to right by band
    Row,
    /// Shuffled 8x8 grid cells
    Grid,
    /// Outward spiral by band
    Spiral,
}

impl LayoutMode {
    /// Mode for a control value. Unknown values return `None`.
    pub fn from_value(value: f32) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        match value.round() as i64 {
            0 => Some(Self::Random),
            1 => Some(Self::Row),
            2 => Some(Self::Grid),
            3 => Some(Self::Spiral),
            _ => None,
        }
    }

    /// Control value of this mode
    pub fn value(self) -> f32 {
        match self {
            Self::Random => 0.0,
            Self::Row => 1.0,
            Self::Grid => 2.0,
            Self::Spiral => 3.0,
        }
    }

    /// Exponent applied to the band position when computing spawn intervals
    pub fn interval_bias(self) -> f32 {
        match self {
            Self::Random | Self::Grid => 1.0,
            Self::Row => 0.7,
            Self::Spiral => 1.4,
        }
    }
}

/// Placement state for the active layout mode
#[derive(Debug, Clone)]
pub struct Layout {
    mode: LayoutMode,
    grid_order: Vec<usize>,
    visits: Vec<usize>,
}

impl Layout {
    /// Create a layout in `mode`
    pub fn new<R: Rng>(mode: LayoutMode, rng: &mut R) -> Self {
        let mut layout = Self {
            mode,
            grid_order: (0..GRID_CELLS).collect(),
            visits: Vec::new(),
        };
        layout.activate(mode, rng);
        layout
    }

    /// Active mode
    pub fn mode(&self) -> LayoutMode {
        self.mode
    }

    /// Switch modes. Entering grid mode reshuffles the cell order.
    pub fn activate<R: Rng>(&mut self, mode: LayoutMode, rng: &mut R) {
        self.mode = mode;
        if mode == LayoutMode::Grid {
            self.grid_order.shuffle(rng);
        }
        self.visits.clear();
    }

    /// Grid cell (row-major index) the band lands on next, advancing its visit counter
    pub fn next_grid_cell(&mut self, band: usize) -> usize {
        if self.visits.len() <= band {
            self.visits.resize(band + 1, 0);
        }
        let cell = self.grid_order[(band + self.visits[band]) % GRID_CELLS];
        self.visits[band] += 1;
        cell
    }

    /// Position for a ripple of `band` out of `band_count`.
    ///
    /// `half_extent` is the half width/height of the visible area.
    pub fn position<R: Rng>(
        &mut self,
        band: usize,
        band_count: usize,
        half_extent: Vec2,
        rng: &mut R,
    ) -> Vec2 {
        let t = band_position(band, band_count);
        match self.mode {
            LayoutMode::Random => Vec2::new(
                (rng.random::<f32>() * 2.0 - 1.0) * half_extent.x,
                (rng.random::<f32>() * 2.0 - 1.0) * half_extent.y,
            ),
            LayoutMode::Row => Vec2::new((t * 2.0 - 1.0) * half_extent.x, 0.0),
            LayoutMode::Grid => {
                let cell = self.next_grid_cell(band);
                let (col, row) = (cell % GRID_SIZE, cell / GRID_SIZE);
                let cell_w = 2.0 * half_extent.x / GRID_SIZE as f32;
                let cell_h = 2.0 * half_extent.y / GRID_SIZE as f32;
                Vec2::new(
                    -half_extent.x + (col as f32 + 0.5) * cell_w,
                    -half_extent.y + (row as f32 + 0.5) * cell_h,
                )
            }
            LayoutMode::Spiral => {
                let angle = t * SPIRAL_TURNS * TAU;
                let radius = t * half_extent.x.min(half_extent.y) * 0.9;
                Vec2::new(angle.cos(), angle.sin()) * radius
            }
        }
    }
}

/// `band / (count - 1)`, 0 for a single band
pub fn band_position(band: usize, band_count: usize) -> f32 {
    if band_count > 1 {
        (band as f32 / (band_count - 1) as f32).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_mode_values() {
        for (i, label) in LAYOUT_LABELS.iter().enumerate() {
            let mode = LayoutMode::from_value(i as f32).unwrap();
            assert_eq!(mode.value(), i as f32);
            assert!(format!("{:?}", mode).eq_ignore_ascii_case(label));
        }
        assert_eq!(LayoutMode::from_value(7.0), None);
        assert_eq!(LayoutMode::from_value(f32::NAN), None);
    }

    #[test]
    fn test_grid_visits_every_cell() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut layout = Layout::new(LayoutMode::Grid, &mut rng);
        let cells: HashSet<usize> = (0..GRID_CELLS).map(|_| layout.next_grid_cell(5)).collect();
        assert_eq!(cells.len(), GRID_CELLS);
        // Then the cycle repeats
        let first = layout.grid_order[5];
        assert_eq!(layout.next_grid_cell(5), first);
    }

    #[test]
    fn test_positions_in_bounds() {
        let mut rng = StdRng::seed_from_u64(2);
        let half = Vec2::new(4.0, 2.0);
        for mode in [LayoutMode::Random, LayoutMode::Row, LayoutMode::Grid, LayoutMode::Spiral] {
            let mut layout = Layout::new(mode, &mut rng);
            for band in 0..64 {
                let p = layout.position(band, 64, half, &mut rng);
                assert!(
                    p.x.abs() <= half.x + 1e-4 && p.y.abs() <= half.y + 1e-4,
                    "{:?} {:?}",
                    mode,
                    p
                );
            }
        }
    }

    #[test]
    fn test_row_runs_left_to_right() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut layout = Layout::new(LayoutMode::Row, &mut rng);
        let half = Vec2::new(5.0, 3.0);
        let xs: Vec<f32> = (0..8).map(|b| layout.position(b, 8, half, &mut rng).x).collect();
        assert!(xs.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(xs[0], -5.0);
        assert_eq!(xs[7], 5.0);
    }

    #[test]
    fn test_spiral_radius_grows() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut layout = Layout::new(LayoutMode::Spiral, &mut rng);
        let half = Vec2::new(5.0, 5.0);
        let r: Vec<f32> = (0..16)
            .map(|b| layout.position(b, 16, half, &mut rng).length())
            .collect();
        assert!(r.windows(2).all(|w| w[0] < w[1]));
    }
}
