//! Per-event hit storage.
//!
//! An [`Event`] owns every hit of one event in an arena indexed by
//! [`HitId`] and keeps a sector → hits map for the neighbourhood queries of
//! the segment builder and the overlap resolver. It is created at the start of
//! an event and dropped at its end.

use crate::error::TrackingError;
use crate::sectors::SectorSystem;
use crate::types::{DetectorAddress, Hit, HitId, HitRecord, SectorId, Side};
use nalgebra::Vector3;
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default)]
pub struct Event {
    hits: Vec<Hit>,
    by_sector: BTreeMap<SectorId, Vec<HitId>>,
}

impl Event {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sectorizes a batch of raw records. Fails on the first record with an
    /// out-of-range address.
    pub fn from_records(records: &[HitRecord], sectors: &SectorSystem) -> Result<Self, TrackingError> {
        let mut event = Self::new();
        for (index, record) in records.iter().enumerate() {
            event.push_record(record, sectors).map_err(|reason| {
                TrackingError::InvalidAddress { index, reason }
            })?;
        }
        Ok(event)
    }

    fn push_record(&mut self, record: &HitRecord, sectors: &SectorSystem) -> Result<HitId, String> {
        let side = Side::try_from(record.side)?;
        let address = DetectorAddress::new(side, record.layer, record.module, record.sensor);
        sectors.validate(&address)?;
        if record.position.iter().any(|v| !v.is_finite()) {
            return Err(format!("non-finite position {:?}", record.position));
        }
        let position = Vector3::new(record.position[0], record.position[1], record.position[2]);
        Ok(self.insert(position, address, record.is_virtual, sectors))
    }

    /// Adds a hit whose address is already known to be valid.
    pub fn insert(
        &mut self,
        position: Vector3<f64>,
        address: DetectorAddress,
        is_virtual: bool,
        sectors: &SectorSystem,
    ) -> HitId {
        let id = HitId(self.hits.len() as u32);
        let sector = sectors.sector_of(&address);
        self.hits.push(Hit {
            id,
            position,
            address,
            sector,
            is_virtual,
        });
        self.by_sector.entry(sector).or_default().push(id);
        id
    }

    /// Adds one virtual interaction-point hit per side at the origin.
    pub fn add_virtual_origin(&mut self, sectors: &SectorSystem) -> [HitId; 2] {
        Side::ALL.map(|side| {
            self.insert(
                Vector3::zeros(),
                DetectorAddress::new(side, 0, 0, 0),
                true,
                sectors,
            )
        })
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn real_hit_count(&self) -> usize {
        self.hits.iter().filter(|h| !h.is_virtual).count()
    }

    /// Panics on an id from another event.
    pub fn hit(&self, id: HitId) -> &Hit {
        &self.hits[id.0 as usize]
    }

    pub fn get(&self, id: HitId) -> Option<&Hit> {
        self.hits.get(id.0 as usize)
    }

    pub fn hits(&self) -> &[Hit] {
        &self.hits
    }

    pub fn hits_in(&self, sector: SectorId) -> &[HitId] {
        self.by_sector.get(&sector).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Occupied sectors in ascending id order.
    pub fn sectors(&self) -> impl Iterator<Item = (SectorId, &[HitId])> {
        self.by_sector.iter().map(|(s, ids)| (*s, ids.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sectors::GeometryParams;

    fn system() -> SectorSystem {
        SectorSystem::new(GeometryParams {
            layers: 3,
            modules: 4,
            sensors: 1,
        })
        .expect("valid geometry")
    }

    #[test]
    fn records_are_grouped_by_sector() {
        let sys = system();
        let records = vec![
            HitRecord::new([1.0, 0.0, 10.0], 1, 1, 0, 0),
            HitRecord::new([1.5, 0.0, 10.0], 1, 1, 0, 0),
            HitRecord::new([2.0, 0.0, 20.0], 1, 2, 0, 0),
        ];
        let event = Event::from_records(&records, &sys).expect("valid records");
        assert_eq!(event.len(), 3);
        let sector = sys.sector(Side::Forward, 1, 0, 0);
        assert_eq!(event.hits_in(sector), &[HitId(0), HitId(1)]);
        assert!(event.hits_in(sys.sector(Side::Backward, 1, 0, 0)).is_empty());
    }

    #[test]
    fn invalid_address_reports_record_index() {
        let sys = system();
        let records = vec![
            HitRecord::new([1.0, 0.0, 10.0], 1, 1, 0, 0),
            HitRecord::new([1.0, 0.0, 10.0], 1, 7, 0, 0),
        ];
        match Event::from_records(&records, &sys) {
            Err(TrackingError::InvalidAddress { index, .. }) => assert_eq!(index, 1),
            other => panic!("expected invalid address, got {other:?}"),
        }
    }

    #[test]
    fn virtual_origin_adds_one_hit_per_side() {
        let sys = system();
        let mut event = Event::new();
        let ids = event.add_virtual_origin(&sys);
        assert_eq!(event.len(), 2);
        assert!(ids.iter().all(|&id| event.hit(id).is_virtual));
        assert_eq!(event.real_hit_count(), 0);
        assert_ne!(event.hit(ids[0]).sector, event.hit(ids[1]).sector);
    }
}
