//! Structure collaborators: caves, ravines and strongholds.
//!
//! The generator treats every collaborator as opaque beyond
//! [`StructureGenerator`]. All built-ins are pure functions of the world seed,
//! so recreating structures after a reload needs no stored state.

mod cave;
mod ravine;
mod stronghold;

use std::fmt;
use std::sync::Arc;

use cubicgen_math::CubePos;
use cubicgen_voxel::CubePrimer;
use glam::IVec3;
use rand_chacha::ChaCha8Rng;

use crate::populate::HostWorld;

pub use cave::{CaveConfig, NoiseCaves};
pub use ravine::{RavineConfig, Ravines};
pub use stronghold::{STRONGHOLD, StrongholdConfig, Strongholds};

/// The three toggled structure slots of a generator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StructureKind {
    Caves,
    Ravines,
    Strongholds,
}

impl StructureKind {
    /// Generation order.
    pub const ALL: [StructureKind; 3] = [Self::Caves, Self::Ravines, Self::Strongholds];
}

impl fmt::Display for StructureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Caves => "caves",
            Self::Ravines => "ravines",
            Self::Strongholds => "strongholds",
        })
    }
}

/// A structure generator consuming the world seed.
pub trait StructureGenerator: Send + Sync {
    /// Name used by structure queries (e.g. "Stronghold").
    fn name(&self) -> &str;

    /// Carves or places the structure into `primer`. With no primer only
    /// bookkeeping runs.
    fn generate(&self, world_seed: u64, primer: Option<&mut CubePrimer>, cube: CubePos);

    fn nearest_structure_position(&self, _world_seed: u64, _pos: IVec3, _allow_unexplored: bool) -> Option<IVec3> {
        None
    }

    /// Rebuilds whatever the generator tracks for `cube` after a reload.
    fn recreate_structures(&self, world_seed: u64, cube: CubePos) {
        self.generate(world_seed, None, cube);
    }

    /// Population-time placement for structures that decorate.
    fn populate(&self, _world: &mut dyn HostWorld, _rng: &mut ChaCha8Rng, _cube: CubePos) {}
}

/// The collaborators a generator is built with. A host may replace or remove
/// any slot; a removed slot forces its toggle off.
#[derive(Clone)]
pub struct StructureRegistry {
    caves: Option<Arc<dyn StructureGenerator>>,
    ravines: Option<Arc<dyn StructureGenerator>>,
    strongholds: Option<Arc<dyn StructureGenerator>>,
}

impl StructureRegistry {
    pub fn empty() -> Self {
        Self {
            caves: None,
            ravines: None,
            strongholds: None,
        }
    }

    pub fn with_defaults() -> Self {
        Self {
            caves: Some(Arc::new(NoiseCaves::default())),
            ravines: Some(Arc::new(Ravines::default())),
            strongholds: Some(Arc::new(Strongholds::default())),
        }
    }

    pub fn set(&mut self, kind: StructureKind, generator: Arc<dyn StructureGenerator>) {
        *self.slot_mut(kind) = Some(generator);
    }

    pub fn remove(&mut self, kind: StructureKind) -> Option<Arc<dyn StructureGenerator>> {
        self.slot_mut(kind).take()
    }

    pub fn get(&self, kind: StructureKind) -> Option<&Arc<dyn StructureGenerator>> {
        match kind {
            StructureKind::Caves => self.caves.as_ref(),
            StructureKind::Ravines => self.ravines.as_ref(),
            StructureKind::Strongholds => self.strongholds.as_ref(),
        }
    }

    fn slot_mut(&mut self, kind: StructureKind) -> &mut Option<Arc<dyn StructureGenerator>> {
        match kind {
            StructureKind::Caves => &mut self.caves,
            StructureKind::Ravines => &mut self.ravines,
            StructureKind::Strongholds => &mut self.strongholds,
        }
    }
}

impl Default for StructureRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for StructureRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_map();
        for kind in StructureKind::ALL {
            list.entry(&kind, &self.get(kind).map(|g| g.name().to_string()));
        }
        list.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_every_slot() {
        let reg = StructureRegistry::with_defaults();
        for kind in StructureKind::ALL {
            assert!(reg.get(kind).is_some(), "{kind} missing");
        }
        assert_eq!(reg.get(StructureKind::Strongholds).map(|g| g.name()), Some(STRONGHOLD));
    }

    #[test]
    fn test_remove_and_replace() {
        let mut reg = StructureRegistry::with_defaults();
        assert!(reg.remove(StructureKind::Ravines).is_some());
        assert!(reg.get(StructureKind::Ravines).is_none());
        assert!(reg.remove(StructureKind::Ravines).is_none());
        reg.set(StructureKind::Ravines, Arc::new(NoiseCaves::default()));
        assert_eq!(reg.get(StructureKind::Ravines).map(|g| g.name()), Some("Caves"));
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(StructureKind::Strongholds.to_string(), "strongholds");
    }
}
