//! Scaled batch iteration: sparse evaluation plus trilinear interpolation.

use glam::{DVec3, IVec3};

use super::{FieldCaches, FieldGraph, FieldId};

/// One fine-grid cell produced by [`FieldGraph::for_each_scaled`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DensitySample {
    /// Absolute block coordinate.
    pub pos: IVec3,
    /// Offset of the cell within its coarse interval, each axis in `[0, 1)`.
    pub frac: DVec3,
    /// Interpolated field value.
    pub value: f64,
    /// Per-block derivative of the interpolant along each axis.
    pub gradient: DVec3,
}

impl FieldGraph {
    /// Evaluates `id` on the sparse grid `start..=end` (grid units, each
    /// sample taken at block `grid * stride`) and calls `callback` for every
    /// block of the covered volume with the trilinearly interpolated value.
    ///
    /// The covered blocks are `start * stride .. end * stride` on each axis.
    /// Blocks are visited x fastest, then z, then y. Axes where `end <= start`
    /// or `stride <= 0` produce no cells.
    pub fn for_each_scaled(
        &self,
        id: FieldId,
        start: IVec3,
        end: IVec3,
        stride: IVec3,
        caches: &mut FieldCaches,
        mut callback: impl FnMut(&DensitySample),
    ) {
        if stride.cmple(IVec3::ZERO).any() || end.cmple(start).any() {
            return;
        }
        let cells = end - start;
        let points = cells + IVec3::ONE;
        let (px, py, pz) = (points.x as usize, points.y as usize, points.z as usize);
        let index = |gx: usize, gy: usize, gz: usize| gx + gz * px + gy * px * pz;

        let mut grid = vec![0.0; px * py * pz];
        for gy in 0..py {
            for gz in 0..pz {
                for gx in 0..px {
                    let sample = (start + IVec3::new(gx as i32, gy as i32, gz as i32)) * stride;
                    grid[index(gx, gy, gz)] = self.eval(id, sample, caches);
                }
            }
        }

        let inv = DVec3::ONE / stride.as_dvec3();
        for cy in 0..cells.y as usize {
            for cz in 0..cells.z as usize {
                for cx in 0..cells.x as usize {
                    let v000 = grid[index(cx, cy, cz)];
                    let v100 = grid[index(cx + 1, cy, cz)];
                    let v010 = grid[index(cx, cy + 1, cz)];
                    let v110 = grid[index(cx + 1, cy + 1, cz)];
                    let v001 = grid[index(cx, cy, cz + 1)];
                    let v101 = grid[index(cx + 1, cy, cz + 1)];
                    let v011 = grid[index(cx, cy + 1, cz + 1)];
                    let v111 = grid[index(cx + 1, cy + 1, cz + 1)];
                    let origin = (start + IVec3::new(cx as i32, cy as i32, cz as i32)) * stride;

                    for dy in 0..stride.y {
                        let ty = dy as f64 * inv.y;
                        for dz in 0..stride.z {
                            let tz = dz as f64 * inv.z;
                            for dx in 0..stride.x {
                                let tx = dx as f64 * inv.x;

                                // Blend along x, then z, then y.
                                let x00 = lerp(tx, v000, v100);
                                let x01 = lerp(tx, v001, v101);
                                let x10 = lerp(tx, v010, v110);
                                let x11 = lerp(tx, v011, v111);
                                let z0 = lerp(tz, x00, x01);
                                let z1 = lerp(tz, x10, x11);
                                let value = lerp(ty, z0, z1);

                                let ddx = lerp(
                                    ty,
                                    lerp(tz, v100 - v000, v101 - v001),
                                    lerp(tz, v110 - v010, v111 - v011),
                                ) * inv.x;
                                let ddz = lerp(ty, x01 - x00, x11 - x10) * inv.z;
                                let ddy = (z1 - z0) * inv.y;

                                callback(&DensitySample {
                                    pos: origin + IVec3::new(dx, dy, dz),
                                    frac: DVec3::new(tx, ty, tz),
                                    value,
                                    gradient: DVec3::new(ddx, ddy, ddz),
                                });
                            }
                        }
                    }
                }
            }
        }
    }
}

#[inline]
fn lerp(t: f64, a: f64, b: f64) -> f64 {
    a + t * (b - a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Axis;

    fn cube_iteration(graph: &FieldGraph, id: FieldId) -> Vec<DensitySample> {
        let mut caches = graph.new_caches();
        let mut out = Vec::new();
        graph.for_each_scaled(
            id,
            IVec3::new(4, 2, -4),
            IVec3::new(8, 4, 0),
            IVec3::new(4, 8, 4),
            &mut caches,
            |s| out.push(*s),
        );
        out
    }

    #[test]
    fn test_covers_one_cube_exactly_once() {
        let mut g = FieldGraph::new();
        let c = g.constant(1.0);
        let samples = cube_iteration(&g, c);
        assert_eq!(samples.len(), 4096);
        let mut seen = std::collections::HashSet::new();
        for s in &samples {
            assert!(s.pos.x >= 16 && s.pos.x < 32, "x {} outside cube", s.pos.x);
            assert!(s.pos.y >= 16 && s.pos.y < 32, "y {} outside cube", s.pos.y);
            assert!(s.pos.z >= -16 && s.pos.z < 0, "z {} outside cube", s.pos.z);
            assert!(seen.insert(s.pos), "{} visited twice", s.pos);
        }
    }

    #[test]
    fn test_sample_points_are_exact() {
        let mut g = FieldGraph::new();
        let noise = g.source(crate::NoiseSource::new(5, DVec3::splat(0.02), 4));
        for s in cube_iteration(&g, noise) {
            if s.frac == DVec3::ZERO {
                assert_eq!(s.value, g.eval_uncached(noise, s.pos), "grid point {}", s.pos);
            }
        }
    }

    #[test]
    fn test_linear_field_is_reproduced_with_gradient() {
        let mut g = FieldGraph::new();
        let x = g.coordinate(Axis::X);
        let y = g.coordinate(Axis::Y);
        let z = g.coordinate(Axis::Z);
        let x2 = g.mul(x, 2.0);
        let xy = g.sub(x2, y);
        let f = g.add(xy, z);
        for s in cube_iteration(&g, f) {
            let expected = 2.0 * s.pos.x as f64 - s.pos.y as f64 + s.pos.z as f64;
            assert!((s.value - expected).abs() < 1e-9, "at {}: {} vs {}", s.pos, s.value, expected);
            assert!((s.gradient - DVec3::new(2.0, -1.0, 1.0)).length() < 1e-9);
        }
    }

    #[test]
    fn test_interpolation_error_is_bounded_on_smooth_field() {
        let mut g = FieldGraph::new();
        let smooth = g.source(|p: IVec3| {
            let p = p.as_dvec3();
            20.0 * (p.x / 40.0).sin() + 10.0 * (p.y / 60.0).cos() + 5.0 * (p.z / 35.0).sin()
        });
        // Second derivatives are bounded by 20/40², 10/60², 5/35², so the trilinear
        // error over a 4×8×4 interval stays below max|f''| * h² / 8 per axis.
        let tolerance = 20.0 / 1600.0 * 2.0 + 10.0 / 3600.0 * 8.0 + 5.0 / 1225.0 * 2.0;
        for s in cube_iteration(&g, smooth) {
            let exact = g.eval_uncached(smooth, s.pos);
            assert!(
                (s.value - exact).abs() <= tolerance + 1e-9,
                "error {} at {} exceeds {tolerance}",
                (s.value - exact).abs(),
                s.pos
            );
        }
    }

    #[test]
    fn test_empty_range_produces_nothing() {
        let mut g = FieldGraph::new();
        let c = g.constant(0.0);
        let mut caches = g.new_caches();
        let mut count = 0;
        g.for_each_scaled(c, IVec3::ZERO, IVec3::new(4, 0, 4), IVec3::splat(4), &mut caches, |_| {
            count += 1
        });
        assert_eq!(count, 0);
    }
}
