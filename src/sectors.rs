//! Sector encoding of detector addresses.
//!
//! A sector is a dense integer id for a `(side, layer, module, sensor)`
//! tuple. Ids are laid out side-major:
//!
//! ```text
//! id = ((side * L + layer) * M + module) * S + sensor
//! ```
//!
//! with `side` 0 for backward and 1 for forward, so every valid address maps
//! to exactly one id in `[0, 2·L·M·S)`. Layer 0 is reserved for the
//! interaction point.

use crate::error::ConfigError;
use crate::types::{DetectorAddress, SectorId, Side};
use serde::{Deserialize, Serialize};

/// Detector geometry bounds supplied once per run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryParams {
    /// Number of layers including the interaction-point layer 0.
    pub layers: u32,
    /// Modules (petals) per layer.
    pub modules: u32,
    /// Sensors per module.
    pub sensors: u32,
}

impl Default for GeometryParams {
    fn default() -> Self {
        Self {
            layers: 8,
            modules: 16,
            sensors: 2,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectorSystem {
    layers: u32,
    modules: u32,
    sensors: u32,
}

impl SectorSystem {
    pub fn new(geometry: GeometryParams) -> Result<Self, ConfigError> {
        let GeometryParams {
            layers,
            modules,
            sensors,
        } = geometry;
        let too_large = (2u64 * layers as u64 * modules as u64 * sensors as u64) > u32::MAX as u64;
        if layers == 0 || modules == 0 || sensors == 0 || too_large {
            return Err(ConfigError::InvalidGeometry {
                layers,
                modules,
                sensors,
            });
        }
        Ok(Self {
            layers,
            modules,
            sensors,
        })
    }

    pub fn layers(&self) -> u32 {
        self.layers
    }

    pub fn modules(&self) -> u32 {
        self.modules
    }

    pub fn sensors(&self) -> u32 {
        self.sensors
    }

    /// Number of distinct sector ids.
    pub fn sector_count(&self) -> u32 {
        2 * self.layers * self.modules * self.sensors
    }

    pub fn is_valid(&self, address: &DetectorAddress) -> bool {
        address.layer < self.layers && address.module < self.modules && address.sensor < self.sensors
    }

    /// Explains why `address` is out of range, if it is.
    pub fn validate(&self, address: &DetectorAddress) -> Result<(), String> {
        if address.layer >= self.layers {
            return Err(format!("layer {} >= {}", address.layer, self.layers));
        }
        if address.module >= self.modules {
            return Err(format!("module {} >= {}", address.module, self.modules));
        }
        if address.sensor >= self.sensors {
            return Err(format!("sensor {} >= {}", address.sensor, self.sensors));
        }
        Ok(())
    }

    /// Encodes an address. Out-of-range addresses are a wiring bug; callers
    /// validate records first (see [`crate::event::Event`]).
    pub fn sector_of(&self, address: &DetectorAddress) -> SectorId {
        debug_assert!(self.is_valid(address), "address out of range: {address:?}");
        let id = ((address.side.index() * self.layers + address.layer) * self.modules
            + address.module)
            * self.sensors
            + address.sensor;
        SectorId(id)
    }

    /// Inverse of [`Self::sector_of`]; `None` for ids outside the range.
    pub fn address_of(&self, sector: SectorId) -> Option<DetectorAddress> {
        if sector.0 >= self.sector_count() {
            return None;
        }
        let mut rest = sector.0;
        let sensor = rest % self.sensors;
        rest /= self.sensors;
        let module = rest % self.modules;
        rest /= self.modules;
        let layer = rest % self.layers;
        rest /= self.layers;
        let side = Side::from_index(rest)?;
        Some(DetectorAddress {
            side,
            layer,
            module,
            sensor,
        })
    }

    pub fn sector(&self, side: Side, layer: u32, module: u32, sensor: u32) -> SectorId {
        self.sector_of(&DetectorAddress::new(side, layer, module, sensor))
    }

    /// True when the two sectors sit on neighbouring modules of the same
    /// layer and side, where overlapping sensors can record one particle
    /// crossing twice. Symmetric and irreflexive.
    pub fn is_overlapping(&self, a: SectorId, b: SectorId) -> bool {
        let (Some(addr_a), Some(addr_b)) = (self.address_of(a), self.address_of(b)) else {
            return false;
        };
        if addr_a.side != addr_b.side || addr_a.layer != addr_b.layer || addr_a.layer == 0 {
            return false;
        }
        if addr_a.module == addr_b.module {
            return false;
        }
        let diff = (addr_a.module + self.modules - addr_b.module) % self.modules;
        diff == 1 || diff == self.modules - 1
    }

    /// Sectors that overlap `sector` (see [`Self::is_overlapping`]).
    pub fn overlapping_sectors(&self, sector: SectorId) -> Vec<SectorId> {
        let Some(addr) = self.address_of(sector) else {
            return Vec::new();
        };
        if addr.layer == 0 || self.modules < 2 {
            return Vec::new();
        }
        let mut modules = vec![(addr.module + 1) % self.modules];
        let prev = (addr.module + self.modules - 1) % self.modules;
        if !modules.contains(&prev) {
            modules.push(prev);
        }
        let mut out = Vec::with_capacity(modules.len() * self.sensors as usize);
        for module in modules {
            for sensor in 0..self.sensors {
                out.push(self.sector(addr.side, addr.layer, module, sensor));
            }
        }
        out
    }

    /// All sectors on one layer of one side.
    pub fn layer_sectors(&self, side: Side, layer: u32) -> Vec<SectorId> {
        let mut out = Vec::with_capacity((self.modules * self.sensors) as usize);
        for module in 0..self.modules {
            for sensor in 0..self.sensors {
                out.push(self.sector(side, layer, module, sensor));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn system() -> SectorSystem {
        SectorSystem::new(GeometryParams {
            layers: 4,
            modules: 6,
            sensors: 2,
        })
        .expect("valid geometry")
    }

    #[test]
    fn sector_mapping_is_a_bijection() {
        let sys = system();
        let mut seen = std::collections::HashSet::new();
        for side in Side::ALL {
            for layer in 0..sys.layers() {
                for module in 0..sys.modules() {
                    for sensor in 0..sys.sensors() {
                        let addr = DetectorAddress::new(side, layer, module, sensor);
                        let id = sys.sector_of(&addr);
                        assert!(id.0 < sys.sector_count());
                        assert!(seen.insert(id), "duplicate id {id:?}");
                        assert_eq!(sys.address_of(id), Some(addr));
                    }
                }
            }
        }
        assert_eq!(seen.len() as u32, sys.sector_count());
        assert_eq!(sys.address_of(SectorId(sys.sector_count())), None);
    }

    #[test]
    fn rejects_empty_geometry() {
        let err = SectorSystem::new(GeometryParams {
            layers: 3,
            modules: 0,
            sensors: 1,
        });
        assert!(matches!(err, Err(ConfigError::InvalidGeometry { .. })));
    }

    #[test]
    fn overlap_is_symmetric_and_limited_to_neighbouring_modules() {
        let sys = system();
        let a = sys.sector(Side::Forward, 2, 0, 0);
        let wrap = sys.sector(Side::Forward, 2, 5, 1);
        let next = sys.sector(Side::Forward, 2, 1, 0);
        let far = sys.sector(Side::Forward, 2, 3, 0);
        let other_layer = sys.sector(Side::Forward, 3, 1, 0);
        let other_side = sys.sector(Side::Backward, 2, 1, 0);

        assert!(sys.is_overlapping(a, next) && sys.is_overlapping(next, a));
        assert!(sys.is_overlapping(a, wrap) && sys.is_overlapping(wrap, a));
        assert!(!sys.is_overlapping(a, a));
        assert!(!sys.is_overlapping(a, far));
        assert!(!sys.is_overlapping(a, other_layer));
        assert!(!sys.is_overlapping(a, other_side));

        let listed = sys.overlapping_sectors(a);
        assert_eq!(listed.len(), 4);
        assert!(listed.iter().all(|&s| sys.is_overlapping(a, s)));
    }

    #[test]
    fn interaction_point_layer_never_overlaps() {
        let sys = system();
        let ip = sys.sector(Side::Forward, 0, 0, 0);
        let neighbour = sys.sector(Side::Forward, 0, 1, 0);
        assert!(!sys.is_overlapping(ip, neighbour));
        assert!(sys.overlapping_sectors(ip).is_empty());
    }
}
