//! Tolerance-based scanline flood fill.

use crate::buffer::PixelBuffer;
use crate::color::{DEFAULT_TOLERANCE, Rgba, colors_match};

/// Result of a fill request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillOutcome {
    /// Number of pixels repainted.
    Filled(usize),
    /// Seed out of bounds, or the seed already matches the fill color.
    NoOp,
}

impl FillOutcome {
    pub fn is_noop(&self) -> bool {
        matches!(self, FillOutcome::NoOp)
    }
}

/// Flood fill engine.
///
/// Traverses vertical runs from an explicit seed stack, so stack depth is
/// bounded by the number of pending runs rather than the region size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloodFill {
    tolerance: u32,
}

impl Default for FloodFill {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE)
    }
}

impl FloodFill {
    pub fn new(tolerance: u32) -> Self {
        Self { tolerance }
    }

    pub fn tolerance(&self) -> u32 {
        self.tolerance
    }

    /// Whether `fill` at this seed would change anything.
    pub fn would_fill(&self, buffer: &PixelBuffer, seed_x: i32, seed_y: i32, color: Rgba) -> bool {
        match buffer.get(seed_x, seed_y) {
            Ok(target) => !colors_match(target, color.to_opaque(), self.tolerance),
            Err(_) => false,
        }
    }

    /// Repaint the region 4-connected to the seed whose pixels match the
    /// seed color within tolerance. Filled pixels are written fully opaque.
    pub fn fill(&self, buffer: &mut PixelBuffer, seed_x: i32, seed_y: i32, color: Rgba) -> FillOutcome {
        let Ok(target) = buffer.get(seed_x, seed_y) else {
            return FillOutcome::NoOp;
        };
        let fill = color.to_opaque();
        if colors_match(target, fill, self.tolerance) {
            return FillOutcome::NoOp;
        }

        let width = buffer.width();
        let height = buffer.height();
        let row = width as usize * 4;
        let matches = |buffer: &PixelBuffer, index: usize| {
            colors_match(buffer.pixel_at(index), target, self.tolerance)
        };

        let mut filled = 0usize;
        let mut stack: Vec<(u32, u32)> = vec![(seed_x as u32, seed_y as u32)];

        while let Some((x, y)) = stack.pop() {
            // Walk up to the top of this run.
            let mut cy = y;
            let mut index = buffer.index(x, cy);
            if !matches(buffer, index) {
                continue;
            }
            while cy > 0 && matches(buffer, index - row) {
                cy -= 1;
                index -= row;
            }

            let mut reach_left = false;
            let mut reach_right = false;

            // Fill downward, queueing one seed per contiguous neighbour run.
            while cy < height && matches(buffer, index) {
                buffer.put_at(index, fill);
                filled += 1;

                if x > 0 {
                    if matches(buffer, index - 4) {
                        if !reach_left {
                            stack.push((x - 1, cy));
                            reach_left = true;
                        }
                    } else {
                        reach_left = false;
                    }
                }

                if x + 1 < width {
                    if matches(buffer, index + 4) {
                        if !reach_right {
                            stack.push((x + 1, cy));
                            reach_right = true;
                        }
                    } else {
                        reach_right = false;
                    }
                }

                cy += 1;
                index += row;
            }
        }

        log::debug!(
            "Filled {} pixels from ({}, {}) with {}",
            filled,
            seed_x,
            seed_y,
            fill
        );
        FillOutcome::Filled(filled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashSet, VecDeque};

    const RED: Rgba = Rgba::opaque(255, 0, 0);

    /// 4x4 white square with a 1-pixel black border.
    fn bordered_square() -> PixelBuffer {
        let mut buf = PixelBuffer::filled(4, 4, Rgba::BLACK).unwrap();
        for y in 1..3 {
            for x in 1..3 {
                buf.set(x, y, Rgba::WHITE).unwrap();
            }
        }
        buf
    }

    /// Reference region: BFS over 4-neighbours matching the seed color.
    fn reachable(buf: &PixelBuffer, seed: (i32, i32), tolerance: u32) -> HashSet<(i32, i32)> {
        let target = buf.get(seed.0, seed.1).unwrap();
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([seed]);
        while let Some((x, y)) = queue.pop_front() {
            if !buf.contains(x, y) || seen.contains(&(x, y)) {
                continue;
            }
            if !colors_match(buf.get(x, y).unwrap(), target, tolerance) {
                continue;
            }
            seen.insert((x, y));
            queue.extend([(x + 1, y), (x - 1, y), (x, y + 1), (x, y - 1)]);
        }
        seen
    }

    #[test]
    fn test_fill_bordered_interior() {
        let mut buf = bordered_square();
        let outcome = FloodFill::default().fill(&mut buf, 1, 1, RED);
        assert_eq!(outcome, FillOutcome::Filled(4));

        for y in 0..4 {
            for x in 0..4 {
                let interior = (1..3).contains(&x) && (1..3).contains(&y);
                let expected = if interior { RED } else { Rgba::BLACK };
                assert_eq!(buf.get(x, y).unwrap(), expected, "pixel ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_fill_same_color_is_noop() {
        let mut buf = PixelBuffer::filled(3, 3, RED).unwrap();
        let before = buf.clone();
        assert_eq!(FloodFill::default().fill(&mut buf, 1, 1, RED), FillOutcome::NoOp);
        assert_eq!(buf, before);
    }

    #[test]
    fn test_fill_is_idempotent() {
        let mut buf = bordered_square();
        let engine = FloodFill::default();
        engine.fill(&mut buf, 1, 1, RED);
        let after_first = buf.clone();
        assert!(engine.fill(&mut buf, 2, 2, RED).is_noop());
        assert_eq!(buf, after_first);
    }

    #[test]
    fn test_fill_out_of_bounds_is_noop() {
        let mut buf = bordered_square();
        let before = buf.clone();
        let engine = FloodFill::default();
        assert!(engine.fill(&mut buf, -1, 0, RED).is_noop());
        assert!(engine.fill(&mut buf, 0, 4, RED).is_noop());
        assert!(!engine.would_fill(&buf, 4, 4, RED));
        assert_eq!(buf, before);
    }

    #[test]
    fn test_fill_single_pixel_region() {
        let mut buf = PixelBuffer::filled(3, 3, Rgba::BLACK).unwrap();
        buf.set(1, 1, Rgba::WHITE).unwrap();
        assert_eq!(FloodFill::default().fill(&mut buf, 1, 1, RED), FillOutcome::Filled(1));
        assert_eq!(buf.get(1, 1).unwrap(), RED);
    }

    #[test]
    fn test_fill_forces_opaque_alpha() {
        let mut buf = PixelBuffer::filled(5, 5, Rgba::new(255, 255, 255, 230)).unwrap();
        FloodFill::default().fill(&mut buf, 2, 2, Rgba::new(0, 0, 255, 10));
        assert!(buf.as_bytes().chunks_exact(4).all(|px| px[3] == 255));
        assert_eq!(buf.get(0, 0).unwrap(), Rgba::opaque(0, 0, 255));
    }

    #[test]
    fn test_fill_swallows_antialiased_fringe() {
        // White paper, a light-grey anti-aliased edge, then a black line.
        let mut buf = PixelBuffer::filled(6, 1, Rgba::WHITE).unwrap();
        buf.set(3, 0, Rgba::opaque(230, 230, 230)).unwrap();
        buf.set(4, 0, Rgba::BLACK).unwrap();
        FloodFill::default().fill(&mut buf, 0, 0, RED);

        assert_eq!(buf.get(3, 0).unwrap(), RED);
        assert_eq!(buf.get(4, 0).unwrap(), Rgba::BLACK);
        assert_eq!(buf.get(5, 0).unwrap(), Rgba::WHITE);
    }

    #[test]
    fn test_fill_stays_inside_connected_region() {
        // Irregular maze: black walls split white paper into pockets.
        let rows = [
            "..#.....",
            "..#.##..",
            "###.#...",
            "....#.##",
            ".####.#.",
            "......#.",
        ];
        let mut buf = PixelBuffer::filled(8, 6, Rgba::WHITE).unwrap();
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                if c == '#' {
                    buf.set(x as i32, y as i32, Rgba::BLACK).unwrap();
                }
            }
        }

        for seed in [(0, 0), (3, 0), (0, 3), (7, 5), (5, 3)] {
            let mut work = buf.clone();
            let region = reachable(&work, seed, DEFAULT_TOLERANCE);
            let outcome = FloodFill::default().fill(&mut work, seed.0, seed.1, RED);
            assert_eq!(outcome, FillOutcome::Filled(region.len()), "seed {:?}", seed);

            for y in 0..6 {
                for x in 0..8 {
                    let expected = if region.contains(&(x, y)) {
                        RED
                    } else {
                        buf.get(x, y).unwrap()
                    };
                    assert_eq!(work.get(x, y).unwrap(), expected, "seed {:?} pixel ({}, {})", seed, x, y);
                }
            }
        }
    }

    #[test]
    fn test_fill_large_region_terminates() {
        let mut buf = PixelBuffer::filled(300, 200, Rgba::WHITE).unwrap();
        let outcome = FloodFill::default().fill(&mut buf, 150, 100, RED);
        assert_eq!(outcome, FillOutcome::Filled(300 * 200));
    }
}
