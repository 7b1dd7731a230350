//! Arena-backed segment graph.
//!
//! Segments live in a `Vec` slot arena addressed by [`SegmentId`]; parent and
//! child relations are id lists on both ends, so the graph never forms
//! ownership cycles. Removing a segment leaves an empty slot and unlinks it
//! from all neighbours; ids of live segments stay stable for the lifetime of
//! the graph.
//!
//! Edges always point outward: the child's inner hit lies on a strictly
//! larger layer than the parent's inner hit, so the graph is acyclic.

mod segment;

pub use segment::{Segment, SegmentId, MAX_SEGMENT_HITS};

use crate::types::Hit;

#[derive(Clone, Debug, Default)]
pub struct SegmentGraph {
    slots: Vec<Option<Segment>>,
    live: usize,
}

impl SegmentGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            live: 0,
        }
    }

    pub fn add(&mut self, hits: Vec<Hit>) -> SegmentId {
        let id = SegmentId(self.slots.len() as u32);
        self.slots.push(Some(Segment::new(hits)));
        self.live += 1;
        id
    }

    /// Number of live segments.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn get(&self, id: SegmentId) -> Option<&Segment> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    /// Panics if `id` was removed; callers only hold ids of live segments.
    pub fn segment(&self, id: SegmentId) -> &Segment {
        self.get(id)
            .unwrap_or_else(|| panic!("segment {id:?} is not live"))
    }

    pub(crate) fn segment_mut(&mut self, id: SegmentId) -> &mut Segment {
        self.slots
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .unwrap_or_else(|| panic!("segment {id:?} is not live"))
    }

    pub fn contains(&self, id: SegmentId) -> bool {
        self.get(id).is_some()
    }

    /// Ids of live segments in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = SegmentId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_some())
            .map(|(i, _)| SegmentId(i as u32))
    }

    pub fn iter(&self) -> impl Iterator<Item = (SegmentId, &Segment)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|seg| (SegmentId(i as u32), seg)))
    }

    /// Upper bound (exclusive) of ids handed out so far.
    pub(crate) fn id_bound(&self) -> usize {
        self.slots.len()
    }

    /// Adds a parent → child edge. Duplicate edges are ignored.
    pub fn connect(&mut self, parent: SegmentId, child: SegmentId) {
        debug_assert_ne!(parent, child, "self loop on {parent:?}");
        if self.segment(parent).children.contains(&child) {
            return;
        }
        self.segment_mut(parent).children.push(child);
        self.segment_mut(child).parents.push(parent);
    }

    /// Removes a parent → child edge; returns whether it existed.
    pub fn disconnect(&mut self, parent: SegmentId, child: SegmentId) -> bool {
        let p = self.segment_mut(parent);
        let Some(pos) = p.children.iter().position(|&c| c == child) else {
            return false;
        };
        p.children.swap_remove(pos);
        let c = self.segment_mut(child);
        if let Some(pos) = c.parents.iter().position(|&x| x == parent) {
            c.parents.swap_remove(pos);
        }
        true
    }

    /// Deletes a segment and every edge touching it.
    pub fn remove(&mut self, id: SegmentId) -> Option<Segment> {
        let seg = self.slots.get_mut(id.index())?.take()?;
        self.live -= 1;
        for &parent in &seg.parents {
            if let Some(Some(p)) = self.slots.get_mut(parent.index()) {
                p.children.retain(|&c| c != id);
            }
        }
        for &child in &seg.children {
            if let Some(Some(c)) = self.slots.get_mut(child.index()) {
                c.parents.retain(|&p| p != id);
            }
        }
        Some(seg)
    }

    pub fn edge_count(&self) -> usize {
        self.iter().map(|(_, s)| s.children.len()).sum()
    }

    /// Live ids ordered by inner-hit layer, then id. Every edge goes from an
    /// earlier to a later entry of this order.
    pub fn topological_order(&self) -> Vec<SegmentId> {
        let mut ids: Vec<(u32, SegmentId)> = self
            .iter()
            .map(|(id, s)| (s.inner().layer(), id))
            .collect();
        ids.sort_unstable();
        ids.into_iter().map(|(_, id)| id).collect()
    }

    pub fn reset_states(&mut self) {
        for seg in self.slots.iter_mut().flatten() {
            seg.state = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DetectorAddress, HitId, SectorId, Side};
    use nalgebra::Vector3;

    fn hit(id: u32, layer: u32) -> Hit {
        Hit {
            id: HitId(id),
            position: Vector3::new(0.0, 0.0, layer as f64 * 10.0),
            address: DetectorAddress::new(Side::Forward, layer, 0, 0),
            sector: SectorId(layer),
            is_virtual: false,
        }
    }

    #[test]
    fn connect_and_remove_keep_both_ends_in_sync() {
        let mut graph = SegmentGraph::new();
        let a = graph.add(vec![hit(0, 0)]);
        let b = graph.add(vec![hit(1, 1)]);
        let c = graph.add(vec![hit(2, 2)]);
        graph.connect(a, b);
        graph.connect(a, b);
        graph.connect(b, c);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.segment(b).parents(), &[a]);

        graph.remove(b);
        assert_eq!(graph.len(), 2);
        assert!(!graph.contains(b));
        assert!(graph.segment(a).children().is_empty());
        assert!(graph.segment(c).parents().is_empty());
        assert_eq!(graph.ids().collect::<Vec<_>>(), vec![a, c]);
    }

    #[test]
    fn disconnect_reports_missing_edges() {
        let mut graph = SegmentGraph::new();
        let a = graph.add(vec![hit(0, 0)]);
        let b = graph.add(vec![hit(1, 1)]);
        assert!(!graph.disconnect(a, b));
        graph.connect(a, b);
        assert!(graph.disconnect(a, b));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn topological_order_follows_layers() {
        let mut graph = SegmentGraph::new();
        let outer = graph.add(vec![hit(0, 3)]);
        let inner = graph.add(vec![hit(1, 1)]);
        graph.connect(inner, outer);
        assert_eq!(graph.topological_order(), vec![inner, outer]);
    }
}
