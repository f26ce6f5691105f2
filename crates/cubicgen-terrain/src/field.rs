//! Scalar-field algebra as an arena of nodes.
//!
//! A [`FieldGraph`] owns immutable nodes addressed by [`FieldId`]. Combinators
//! append a node referencing its operands by id, so a sub-field used in two
//! places (e.g. height feeding both the volatility condition and the final sum)
//! is evaluated through the same node. Only `Cached` nodes carry state, and
//! that state lives outside the graph in a per-worker [`FieldCaches`].

mod cache;
mod scaled;

use std::sync::Arc;

use glam::IVec3;

pub use cache::{
    CACHE_SIZE_2D, CACHE_SIZE_3D, CacheKind, CacheSpec, CacheStats, FieldCaches, HashFn,
    SpatialCache, hash_2d, hash_3d,
};
pub use scaled::DensitySample;

/// A pure function from block coordinates to a real value.
///
/// Implementations must be deterministic and free of side effects; they may
/// be wrapped in caches and evaluated from several threads at once.
pub trait ScalarField: Send + Sync {
    fn eval(&self, pos: IVec3) -> f64;
}

impl<F> ScalarField for F
where
    F: Fn(IVec3) -> f64 + Send + Sync,
{
    fn eval(&self, pos: IVec3) -> f64 {
        self(pos)
    }
}

/// Index of a node in a [`FieldGraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FieldId(u32);

impl FieldId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Right-hand operand of a combinator: another node or a constant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Operand {
    Field(FieldId),
    Const(f64),
}

impl From<FieldId> for Operand {
    fn from(id: FieldId) -> Self {
        Operand::Field(id)
    }
}

impl From<f64> for Operand {
    fn from(v: f64) -> Self {
        Operand::Const(v)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    /// Division; a zero divisor yields zero.
    Div,
}

impl BinaryOp {
    fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div if b == 0.0 => 0.0,
            BinaryOp::Div => a / b,
        }
    }
}

/// Sign predicate for conditional combinators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sign {
    /// Strictly below zero.
    Negative,
    /// Strictly above zero.
    Positive,
}

impl Sign {
    fn matches(self, v: f64) -> bool {
        match self {
            Sign::Negative => v < 0.0,
            Sign::Positive => v > 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

enum FieldNode {
    Constant(f64),
    Coordinate(Axis),
    Source(Arc<dyn ScalarField>),
    Binary {
        op: BinaryOp,
        lhs: FieldId,
        rhs: Operand,
    },
    /// `op` is applied only where `lhs` has sign `when`; elsewhere `lhs` passes through.
    BinaryIf {
        op: BinaryOp,
        when: Sign,
        lhs: FieldId,
        rhs: Operand,
    },
    Lerp {
        t: FieldId,
        a: Operand,
        b: Operand,
    },
    Clamp {
        input: FieldId,
        lo: f64,
        hi: f64,
    },
    Signum(FieldId),
    /// `then` where `lhs > rhs`, else `otherwise`.
    SelectGreater {
        lhs: Operand,
        rhs: Operand,
        then: Operand,
        otherwise: Operand,
    },
    Cached {
        input: FieldId,
        slot: usize,
    },
}

/// Arena of immutable field nodes plus the declarations of their caches.
#[derive(Default)]
pub struct FieldGraph {
    nodes: Vec<FieldNode>,
    caches: Vec<CacheSpec>,
}

impl FieldGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, node: FieldNode) -> FieldId {
        let id = FieldId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // ---- leaves ----

    pub fn constant(&mut self, v: f64) -> FieldId {
        self.push(FieldNode::Constant(v))
    }

    pub fn coordinate(&mut self, axis: Axis) -> FieldId {
        self.push(FieldNode::Coordinate(axis))
    }

    /// Any pure field, e.g. a [`NoiseSource`](crate::NoiseSource) or a closure.
    pub fn source(&mut self, field: impl ScalarField + 'static) -> FieldId {
        self.push(FieldNode::Source(Arc::new(field)))
    }

    pub fn shared_source(&mut self, field: Arc<dyn ScalarField>) -> FieldId {
        self.push(FieldNode::Source(field))
    }

    // ---- arithmetic ----

    pub fn add(&mut self, lhs: FieldId, rhs: impl Into<Operand>) -> FieldId {
        self.binary(BinaryOp::Add, lhs, rhs)
    }

    pub fn sub(&mut self, lhs: FieldId, rhs: impl Into<Operand>) -> FieldId {
        self.binary(BinaryOp::Sub, lhs, rhs)
    }

    pub fn mul(&mut self, lhs: FieldId, rhs: impl Into<Operand>) -> FieldId {
        self.binary(BinaryOp::Mul, lhs, rhs)
    }

    pub fn div(&mut self, lhs: FieldId, rhs: impl Into<Operand>) -> FieldId {
        self.binary(BinaryOp::Div, lhs, rhs)
    }

    pub fn binary(&mut self, op: BinaryOp, lhs: FieldId, rhs: impl Into<Operand>) -> FieldId {
        self.push(FieldNode::Binary {
            op,
            lhs,
            rhs: rhs.into(),
        })
    }

    // ---- conditionals ----

    pub fn add_if(&mut self, when: Sign, lhs: FieldId, rhs: impl Into<Operand>) -> FieldId {
        self.binary_if(BinaryOp::Add, when, lhs, rhs)
    }

    pub fn mul_if(&mut self, when: Sign, lhs: FieldId, rhs: impl Into<Operand>) -> FieldId {
        self.binary_if(BinaryOp::Mul, when, lhs, rhs)
    }

    pub fn div_if(&mut self, when: Sign, lhs: FieldId, rhs: impl Into<Operand>) -> FieldId {
        self.binary_if(BinaryOp::Div, when, lhs, rhs)
    }

    pub fn binary_if(
        &mut self,
        op: BinaryOp,
        when: Sign,
        lhs: FieldId,
        rhs: impl Into<Operand>,
    ) -> FieldId {
        self.push(FieldNode::BinaryIf {
            op,
            when,
            lhs,
            rhs: rhs.into(),
        })
    }

    /// `then` where `lhs > rhs`, else `otherwise`.
    pub fn select_greater(
        &mut self,
        lhs: impl Into<Operand>,
        rhs: impl Into<Operand>,
        then: impl Into<Operand>,
        otherwise: impl Into<Operand>,
    ) -> FieldId {
        self.push(FieldNode::SelectGreater {
            lhs: lhs.into(),
            rhs: rhs.into(),
            then: then.into(),
            otherwise: otherwise.into(),
        })
    }

    // ---- shaping ----

    /// `a + t * (b - a)`; `t` is not clamped.
    pub fn lerp(&mut self, t: FieldId, a: impl Into<Operand>, b: impl Into<Operand>) -> FieldId {
        self.push(FieldNode::Lerp {
            t,
            a: a.into(),
            b: b.into(),
        })
    }

    pub fn clamp(&mut self, input: FieldId, lo: f64, hi: f64) -> FieldId {
        self.push(FieldNode::Clamp {
            input,
            lo: lo.min(hi),
            hi: hi.max(lo),
        })
    }

    /// -1, 0 or 1.
    pub fn signum(&mut self, input: FieldId) -> FieldId {
        self.push(FieldNode::Signum(input))
    }

    // ---- caching ----

    /// Wraps `input` in a cache with the given capacity and hash.
    pub fn cached(&mut self, input: FieldId, kind: CacheKind, capacity: usize, hash: HashFn) -> FieldId {
        let slot = self.caches.len();
        self.caches.push(CacheSpec {
            kind,
            capacity,
            hash,
        });
        self.push(FieldNode::Cached { input, slot })
    }

    /// Height-invariant cache covering one cube column.
    pub fn cached_2d(&mut self, input: FieldId) -> FieldId {
        self.cached(input, CacheKind::Flat2d, CACHE_SIZE_2D, hash_2d)
    }

    /// Cache covering one cube.
    pub fn cached_3d(&mut self, input: FieldId) -> FieldId {
        self.cached(input, CacheKind::Volume3d, CACHE_SIZE_3D, hash_3d)
    }

    /// Fresh, empty caches for one worker evaluating this graph.
    pub fn new_caches(&self) -> FieldCaches {
        FieldCaches::from_specs(&self.caches)
    }

    pub fn cache_specs(&self) -> &[CacheSpec] {
        &self.caches
    }

    // ---- evaluation ----

    /// Evaluates `id` at `pos`, reading and filling `caches`.
    ///
    /// `caches` must come from [`FieldGraph::new_caches`] on this graph; a
    /// cache slot missing from it is evaluated uncached.
    pub fn eval(&self, id: FieldId, pos: IVec3, caches: &mut FieldCaches) -> f64 {
        self.eval_node(id, pos, &mut Some(caches))
    }

    /// Evaluates `id` at `pos` bypassing every cache.
    pub fn eval_uncached(&self, id: FieldId, pos: IVec3) -> f64 {
        self.eval_node(id, pos, &mut None)
    }

    fn operand(&self, op: Operand, pos: IVec3, caches: &mut Option<&mut FieldCaches>) -> f64 {
        match op {
            Operand::Field(id) => self.eval_node(id, pos, caches),
            Operand::Const(v) => v,
        }
    }

    fn eval_node(&self, id: FieldId, pos: IVec3, caches: &mut Option<&mut FieldCaches>) -> f64 {
        match &self.nodes[id.index()] {
            FieldNode::Constant(v) => *v,
            FieldNode::Coordinate(Axis::X) => pos.x as f64,
            FieldNode::Coordinate(Axis::Y) => pos.y as f64,
            FieldNode::Coordinate(Axis::Z) => pos.z as f64,
            FieldNode::Source(field) => field.eval(pos),
            FieldNode::Binary { op, lhs, rhs } => {
                let a = self.eval_node(*lhs, pos, caches);
                let b = self.operand(*rhs, pos, caches);
                op.apply(a, b)
            }
            FieldNode::BinaryIf { op, when, lhs, rhs } => {
                let a = self.eval_node(*lhs, pos, caches);
                if when.matches(a) {
                    let b = self.operand(*rhs, pos, caches);
                    op.apply(a, b)
                } else {
                    a
                }
            }
            FieldNode::Lerp { t, a, b } => {
                let t = self.eval_node(*t, pos, caches);
                let a = self.operand(*a, pos, caches);
                let b = self.operand(*b, pos, caches);
                a + t * (b - a)
            }
            FieldNode::Clamp { input, lo, hi } => self.eval_node(*input, pos, caches).clamp(*lo, *hi),
            FieldNode::Signum(input) => {
                let v = self.eval_node(*input, pos, caches);
                if v > 0.0 {
                    1.0
                } else if v < 0.0 {
                    -1.0
                } else {
                    0.0
                }
            }
            FieldNode::SelectGreater {
                lhs,
                rhs,
                then,
                otherwise,
            } => {
                let l = self.operand(*lhs, pos, caches);
                let r = self.operand(*rhs, pos, caches);
                if l > r {
                    self.operand(*then, pos, caches)
                } else {
                    self.operand(*otherwise, pos, caches)
                }
            }
            FieldNode::Cached { input, slot } => {
                let hit = caches
                    .as_deref_mut()
                    .and_then(|c| c.get_mut(*slot))
                    .and_then(|cache| cache.lookup(pos));
                if let Some(v) = hit {
                    return v;
                }
                let v = self.eval_node(*input, pos, caches);
                if let Some(cache) = caches.as_deref_mut().and_then(|c| c.get_mut(*slot)) {
                    cache.store(pos, v);
                }
                v
            }
        }
    }
}

impl std::fmt::Debug for FieldGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldGraph")
            .field("nodes", &self.nodes.len())
            .field("caches", &self.caches.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NoiseSource;
    use glam::DVec3;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn x_field(graph: &mut FieldGraph) -> FieldId {
        graph.coordinate(Axis::X)
    }

    #[test]
    fn test_arithmetic_combinators() {
        let mut g = FieldGraph::new();
        let x = x_field(&mut g);
        let y = g.coordinate(Axis::Y);
        let sum = g.add(x, y);
        let scaled = g.mul(sum, 2.0);
        let shifted = g.sub(scaled, 1.0);
        let halved = g.div(shifted, 4.0);
        assert_eq!(g.eval_uncached(halved, IVec3::new(3, 4, 0)), 13.0 / 4.0);
    }

    #[test]
    fn test_division_by_zero_is_zero() {
        let mut g = FieldGraph::new();
        let one = g.constant(1.0);
        let d = g.div(one, 0.0);
        assert_eq!(g.eval_uncached(d, IVec3::ZERO), 0.0);
    }

    #[test]
    fn test_conditional_applies_only_on_matching_sign() {
        let mut g = FieldGraph::new();
        let x = x_field(&mut g);
        let f = g.mul_if(Sign::Negative, x, -0.3);
        let f = g.div_if(Sign::Positive, f, 8.0);
        assert_eq!(g.eval_uncached(f, IVec3::new(-10, 0, 0)), 3.0 / 8.0);
        assert_eq!(g.eval_uncached(f, IVec3::new(16, 0, 0)), 2.0);
        assert_eq!(g.eval_uncached(f, IVec3::ZERO), 0.0, "zero matches neither sign");
    }

    #[test]
    fn test_lerp_clamp_signum() {
        let mut g = FieldGraph::new();
        let t = g.constant(0.25);
        let lerped = g.lerp(t, 10.0, 20.0);
        assert_eq!(g.eval_uncached(lerped, IVec3::ZERO), 12.5);

        let x = x_field(&mut g);
        let clamped = g.clamp(x, -2.0, 1.0);
        assert_eq!(g.eval_uncached(clamped, IVec3::new(-5, 0, 0)), -2.0);
        assert_eq!(g.eval_uncached(clamped, IVec3::new(5, 0, 0)), 1.0);

        let s = g.signum(x);
        assert_eq!(g.eval_uncached(s, IVec3::new(-7, 0, 0)), -1.0);
        assert_eq!(g.eval_uncached(s, IVec3::ZERO), 0.0);
    }

    #[test]
    fn test_select_greater() {
        let mut g = FieldGraph::new();
        let height = g.constant(64.0);
        let y = g.coordinate(Axis::Y);
        let factor = g.select_greater(height, y, 0.25, 1.0);
        assert_eq!(g.eval_uncached(factor, IVec3::new(0, 10, 0)), 0.25);
        assert_eq!(g.eval_uncached(factor, IVec3::new(0, 64, 0)), 1.0);
    }

    #[test]
    fn test_shared_node_feeds_two_consumers() {
        let mut g = FieldGraph::new();
        let x = x_field(&mut g);
        let a = g.mul(x, 2.0);
        let b = g.add(x, a);
        assert_eq!(g.eval_uncached(b, IVec3::new(5, 0, 0)), 15.0);
    }

    #[test]
    fn test_cache_is_transparent() {
        let mut g = FieldGraph::new();
        let noise = g.source(NoiseSource::new(11, DVec3::splat(0.05), 3));
        let shaped = g.mul(noise, 7.0);
        let cached = g.cached_3d(shaped);
        let mut caches = g.new_caches();
        for y in 0..16 {
            for z in 0..16 {
                for x in 0..16 {
                    let p = IVec3::new(x - 32, y + 48, z);
                    assert_eq!(g.eval(cached, p, &mut caches), g.eval_uncached(shaped, p));
                }
            }
        }
        // Second pass over the footprint is served from the cache.
        let p = IVec3::new(-30, 50, 3);
        assert_eq!(g.eval(cached, p, &mut caches), g.eval_uncached(shaped, p));
        assert!(caches.stats().hits >= 1);
    }

    #[test]
    fn test_cached_2d_evaluates_column_once() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let mut g = FieldGraph::new();
        let counted = g.source(|p: IVec3| {
            CALLS.fetch_add(1, Ordering::Relaxed);
            (p.x * 3 + p.z) as f64
        });
        let cached = g.cached_2d(counted);
        let mut caches = g.new_caches();
        for y in -20..20 {
            assert_eq!(g.eval(cached, IVec3::new(2, y, 5), &mut caches), 11.0);
        }
        assert_eq!(CALLS.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_caches_are_per_worker() {
        let mut g = FieldGraph::new();
        let x = x_field(&mut g);
        let cached = g.cached_3d(x);
        let mut first = g.new_caches();
        let second = g.new_caches();
        g.eval(cached, IVec3::new(1, 2, 3), &mut first);
        assert_eq!(first.stats().misses, 1);
        assert_eq!(second.stats(), CacheStats::default());
    }

    #[test]
    fn test_noise_times_ten_matches_raw_noise() {
        // seed 42, frequency 0.01, 1 octave, [-1, 1], * 10 + 0
        let mut g = FieldGraph::new();
        let noise = NoiseSource::builder()
            .seed(42)
            .frequency(0.01, 0.01, 0.01)
            .octaves(1)
            .normalize_to(-1.0, 1.0)
            .build();
        let raw = NoiseSource::new(42, DVec3::splat(0.01), 1);
        let n = g.source(noise);
        let scaled = g.mul(n, 10.0);
        let field = g.add(scaled, 0.0);
        for p in [IVec3::ZERO, IVec3::new(37, -12, 5)] {
            assert_eq!(g.eval_uncached(field, p), raw.eval(p) * 10.0);
        }
    }
}
