//! Core value types shared by every stage: hits, detector addresses and raw
//! track candidates.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Detector half a hit was recorded in, relative to the interaction point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum Side {
    Backward,
    Forward,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Backward, Side::Forward];

    /// Signed representation: `-1` backward, `+1` forward.
    pub fn sign(self) -> i8 {
        match self {
            Side::Backward => -1,
            Side::Forward => 1,
        }
    }

    /// Dense index used by the sector encoding (backward first).
    pub fn index(self) -> u32 {
        match self {
            Side::Backward => 0,
            Side::Forward => 1,
        }
    }

    pub fn from_index(index: u32) -> Option<Self> {
        match index {
            0 => Some(Side::Backward),
            1 => Some(Side::Forward),
            _ => None,
        }
    }
}

impl TryFrom<i8> for Side {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Side::Backward),
            1 => Ok(Side::Forward),
            other => Err(format!("side must be -1 or +1, got {other}")),
        }
    }
}

impl From<Side> for i8 {
    fn from(side: Side) -> Self {
        side.sign()
    }
}

/// Position of a sensor inside the detector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DetectorAddress {
    pub side: Side,
    pub layer: u32,
    pub module: u32,
    pub sensor: u32,
}

impl DetectorAddress {
    pub fn new(side: Side, layer: u32, module: u32, sensor: u32) -> Self {
        Self {
            side,
            layer,
            module,
            sensor,
        }
    }
}

/// Identifier of a hit inside one event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HitId(pub u32);

/// Integer encoding of a [`DetectorAddress`], see [`crate::sectors::SectorSystem`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectorId(pub u32);

/// A sectorized hit. Identity is carried by `id`; two hits may share a position.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Hit {
    pub id: HitId,
    pub position: Vector3<f64>,
    pub address: DetectorAddress,
    pub sector: SectorId,
    /// Synthetic hits (e.g. the interaction point) carry no real measurement.
    pub is_virtual: bool,
}

impl Hit {
    #[inline]
    pub fn x(&self) -> f64 {
        self.position[0]
    }

    #[inline]
    pub fn y(&self) -> f64 {
        self.position[1]
    }

    #[inline]
    pub fn z(&self) -> f64 {
        self.position[2]
    }

    #[inline]
    pub fn layer(&self) -> u32 {
        self.address.layer
    }

    /// Squared transverse distance from the beam axis.
    #[inline]
    pub fn rho_squared(&self) -> f64 {
        self.x() * self.x() + self.y() * self.y()
    }

    pub fn distance_to(&self, other: &Hit) -> f64 {
        (self.position - other.position).norm()
    }
}

/// Raw hit record handed over by the framework layer, before sectorization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HitRecord {
    pub position: [f64; 3],
    pub side: i8,
    pub layer: u32,
    pub module: u32,
    pub sensor: u32,
    #[serde(default)]
    pub is_virtual: bool,
}

impl HitRecord {
    pub fn new(position: [f64; 3], side: i8, layer: u32, module: u32, sensor: u32) -> Self {
        Self {
            position,
            side,
            layer,
            module,
            sensor,
            is_virtual: false,
        }
    }

    pub fn into_virtual(mut self) -> Self {
        self.is_virtual = true;
        self
    }
}

/// Unscored, ordered (inner to outer) hit sequence extracted from the
/// relaxed segment graph.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RawTrack {
    pub hits: Vec<Hit>,
}

impl RawTrack {
    pub fn new(hits: Vec<Hit>) -> Self {
        Self { hits }
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn hit_ids(&self) -> impl Iterator<Item = HitId> + '_ {
        self.hits.iter().map(|h| h.id)
    }

    /// Ids of the measured hits, i.e. everything except virtual hits.
    pub fn real_hit_ids(&self) -> Vec<HitId> {
        self.hits
            .iter()
            .filter(|h| !h.is_virtual)
            .map(|h| h.id)
            .collect()
    }

    pub fn contains(&self, id: HitId) -> bool {
        self.hits.iter().any(|h| h.id == id)
    }
}
