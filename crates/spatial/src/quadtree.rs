use glam::Vec2;
use skein_common::{NodeId, Rect};
use std::collections::{BTreeMap, BTreeSet};

/// Max elements held in a cell before it splits.
const BUCKET: usize = 8;
/// Split depth limit; past this, cells hold arbitrarily many elements.
const MAX_DEPTH: u8 = 8;

/// Errors from spatial index mutations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SpatialError {
    #[error("element {0} is already indexed")]
    DuplicateId(NodeId),
    #[error("element {0} is not indexed")]
    NotFound(NodeId),
}

/// Quad-tree index over `(NodeId, Rect)` elements.
///
/// Elements are stored in the deepest cell that fully contains them; a rect
/// straddling a split line stays at the level of the split. Elements outside
/// the tree's coverage area land in a linear overflow list, so far-flung
/// nodes degrade performance, never correctness.
pub struct RectIndex {
    root: QuadCell,
    rects: BTreeMap<NodeId, Rect>,
    outliers: BTreeSet<NodeId>,
}

struct QuadCell {
    bounds: Rect,
    depth: u8,
    items: Vec<NodeId>,
    children: Option<Box<[QuadCell; 4]>>,
}

impl RectIndex {
    /// Index covering a generous default region around the origin.
    pub fn new() -> Self {
        Self::with_coverage(Rect::new(-1_000_000.0, -1_000_000.0, 2_000_000.0, 2_000_000.0))
    }

    pub fn with_coverage(coverage: Rect) -> Self {
        Self {
            root: QuadCell::new(coverage, 0),
            rects: BTreeMap::new(),
            outliers: BTreeSet::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.rects.contains_key(&id)
    }

    pub fn get(&self, id: NodeId) -> Option<Rect> {
        self.rects.get(&id).copied()
    }

    /// Add an element. Rejects ids that are already present.
    pub fn insert(&mut self, id: NodeId, rect: Rect) -> Result<(), SpatialError> {
        if self.rects.contains_key(&id) {
            return Err(SpatialError::DuplicateId(id));
        }
        // Map entry first: a split triggered by the placement resolves every
        // item, including this one, through the map.
        self.rects.insert(id, rect);
        self.place(id, rect);
        Ok(())
    }

    /// Reposition/resize an element; reflected in all subsequent queries.
    pub fn update(&mut self, id: NodeId, rect: Rect) -> Result<(), SpatialError> {
        let old = *self.rects.get(&id).ok_or(SpatialError::NotFound(id))?;
        self.unplace(id, old);
        self.rects.insert(id, rect);
        self.place(id, rect);
        Ok(())
    }

    /// Drop an element. Returns false if it was not indexed.
    pub fn remove(&mut self, id: NodeId) -> bool {
        match self.rects.remove(&id) {
            Some(old) => {
                self.unplace(id, old);
                true
            }
            None => false,
        }
    }

    /// The element whose rect contains the point, preferring the smallest id
    /// when rects overlap (they should not by design, but overlap must not
    /// produce nondeterminism).
    pub fn query_point(&self, point: Vec2) -> Option<NodeId> {
        let mut best: Option<NodeId> = None;
        let mut consider = |id: NodeId| {
            if self.rects[&id].contains(point) && best.is_none_or(|b| id < b) {
                best = Some(id);
            }
        };
        self.root.visit_point(point, &mut consider);
        for &id in &self.outliers {
            consider(id);
        }
        best
    }

    /// All elements whose rects intersect the region, sorted ascending.
    pub fn query_region(&self, region: Rect) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut consider = |id: NodeId| {
            if self.rects[&id].intersects(&region) {
                out.push(id);
            }
        };
        self.root.visit_region(&region, &mut consider);
        for &id in &self.outliers {
            consider(id);
        }
        out.sort_unstable();
        out.dedup();
        out
    }

    fn place(&mut self, id: NodeId, rect: Rect) {
        if self.root.bounds.contains_rect(&rect) {
            self.root.insert(id, rect, &self.rects);
        } else {
            self.outliers.insert(id);
        }
    }

    fn unplace(&mut self, id: NodeId, old: Rect) {
        if !self.outliers.remove(&id) {
            self.root.remove(id, old);
        }
    }
}

impl Default for RectIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl QuadCell {
    fn new(bounds: Rect, depth: u8) -> Self {
        Self {
            bounds,
            depth,
            items: Vec::new(),
            children: None,
        }
    }

    fn quadrants(&self) -> [Rect; 4] {
        let half = self.bounds.size * 0.5;
        let p = self.bounds.position;
        [
            Rect::from_parts(p, half),
            Rect::from_parts(p + Vec2::new(half.x, 0.0), half),
            Rect::from_parts(p + Vec2::new(0.0, half.y), half),
            Rect::from_parts(p + half, half),
        ]
    }

    fn insert(&mut self, id: NodeId, rect: Rect, rects: &BTreeMap<NodeId, Rect>) {
        if let Some(children) = self.children.as_mut() {
            for child in children.iter_mut() {
                if child.bounds.contains_rect(&rect) {
                    child.insert(id, rect, rects);
                    return;
                }
            }
            self.items.push(id);
            return;
        }

        self.items.push(id);
        if self.items.len() > BUCKET && self.depth < MAX_DEPTH {
            self.split(rects);
        }
    }

    fn split(&mut self, rects: &BTreeMap<NodeId, Rect>) {
        let depth = self.depth + 1;
        let [q0, q1, q2, q3] = self.quadrants();
        let mut children = Box::new([
            QuadCell::new(q0, depth),
            QuadCell::new(q1, depth),
            QuadCell::new(q2, depth),
            QuadCell::new(q3, depth),
        ]);

        let items = std::mem::take(&mut self.items);
        for id in items {
            let rect = rects[&id];
            let mut placed = false;
            for child in children.iter_mut() {
                if child.bounds.contains_rect(&rect) {
                    child.insert(id, rect, rects);
                    placed = true;
                    break;
                }
            }
            if !placed {
                self.items.push(id);
            }
        }
        self.children = Some(children);
    }

    fn remove(&mut self, id: NodeId, rect: Rect) {
        if let Some(children) = self.children.as_mut() {
            for child in children.iter_mut() {
                if child.bounds.contains_rect(&rect) {
                    child.remove(id, rect);
                    return;
                }
            }
        }
        self.items.retain(|&it| it != id);
    }

    fn visit_point(&self, point: Vec2, consider: &mut impl FnMut(NodeId)) {
        for &id in &self.items {
            consider(id);
        }
        if let Some(children) = self.children.as_ref() {
            for child in children.iter() {
                if child.bounds.contains(point) {
                    child.visit_point(point, consider);
                }
            }
        }
    }

    fn visit_region(&self, region: &Rect, consider: &mut impl FnMut(NodeId)) {
        for &id in &self.items {
            consider(id);
        }
        if let Some(children) = self.children.as_ref() {
            for child in children.iter() {
                if child.bounds.intersects(region) {
                    child.visit_region(region, consider);
                }
            }
        }
    }
}
