//! Sector adjacency used to bound segment building.
//!
//! A [`HitConnector`] answers which sectors may hold the outer hit of a
//! 1-hit segment whose inner hit lies in a given sector (and the inverse
//! question). Sector pairs that can never satisfy any criterion (other side,
//! same or decreasing layer, far-away module) are never enumerated.

use crate::error::ConfigError;
use crate::sectors::SectorSystem;
use crate::types::{DetectorAddress, SectorId};
use serde::{Deserialize, Serialize};
use std::fmt;

pub trait HitConnector: fmt::Debug + Send + Sync {
    /// Sectors reachable outward from `sector`.
    fn outward(&self, sector: SectorId) -> Vec<SectorId>;

    /// Sectors from which `sector` is reachable outward.
    fn inward(&self, sector: SectorId) -> Vec<SectorId>;
}

/// Reach of the [`LayerConnector`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConnectorParams {
    /// Number of layers a segment may skip outward, at least 1.
    pub layer_step_max: u32,
    /// Outermost layer reachable directly from the interaction point.
    pub origin_layer_max: u32,
    /// Cyclic module distance allowed between connected hits; `None` allows
    /// every module.
    pub module_range: Option<u32>,
}

impl Default for ConnectorParams {
    fn default() -> Self {
        Self {
            layer_step_max: 1,
            origin_layer_max: 2,
            module_range: None,
        }
    }
}

/// Connects sectors on the same side from one layer to the next
/// `layer_step_max` layers. The interaction-point layer 0 connects to every
/// module of layers `1..=origin_layer_max`.
#[derive(Clone, Debug)]
pub struct LayerConnector {
    sectors: SectorSystem,
    params: ConnectorParams,
}

impl LayerConnector {
    pub fn new(sectors: &SectorSystem, params: ConnectorParams) -> Result<Self, ConfigError> {
        if params.layer_step_max == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "layerStepMax",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(Self {
            sectors: sectors.clone(),
            params,
        })
    }

    pub fn params(&self) -> &ConnectorParams {
        &self.params
    }

    fn modules_near(&self, module: u32) -> Vec<u32> {
        let modules = self.sectors.modules();
        match self.params.module_range {
            Some(range) if range.saturating_mul(2).saturating_add(1) < modules => (0..=2 * range)
                .map(|offset| (module + modules - range + offset) % modules)
                .collect(),
            _ => (0..modules).collect(),
        }
    }

    fn push_layer(&self, out: &mut Vec<SectorId>, addr: &DetectorAddress, layer: u32, modules: &[u32]) {
        for &module in modules {
            for sensor in 0..self.sectors.sensors() {
                out.push(self.sectors.sector(addr.side, layer, module, sensor));
            }
        }
    }
}

impl HitConnector for LayerConnector {
    fn outward(&self, sector: SectorId) -> Vec<SectorId> {
        let Some(addr) = self.sectors.address_of(sector) else {
            return Vec::new();
        };
        let last_layer = self.sectors.layers() - 1;
        let mut out = Vec::new();
        if addr.layer == 0 {
            let all: Vec<u32> = (0..self.sectors.modules()).collect();
            for layer in 1..=self.params.origin_layer_max.min(last_layer) {
                self.push_layer(&mut out, &addr, layer, &all);
            }
        } else {
            let near = self.modules_near(addr.module);
            let outermost = addr.layer.saturating_add(self.params.layer_step_max).min(last_layer);
            for layer in addr.layer + 1..=outermost {
                self.push_layer(&mut out, &addr, layer, &near);
            }
        }
        out
    }

    fn inward(&self, sector: SectorId) -> Vec<SectorId> {
        let Some(addr) = self.sectors.address_of(sector) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        if addr.layer == 0 {
            return out;
        }
        if addr.layer <= self.params.origin_layer_max {
            let all: Vec<u32> = (0..self.sectors.modules()).collect();
            self.push_layer(&mut out, &addr, 0, &all);
        }
        let near = self.modules_near(addr.module);
        let innermost = addr.layer.saturating_sub(self.params.layer_step_max).max(1);
        for layer in innermost..addr.layer {
            self.push_layer(&mut out, &addr, layer, &near);
        }
        out
    }
}
