use skein_common::NodeId;
use std::collections::BTreeMap;

/// Slate grey, the color a node renders in until the author picks one.
pub const NODE_DEFAULT_COLOR: [u8; 4] = [112, 128, 144, 255];

/// Editor color annotations, kept outside the nodes themselves.
///
/// Persisted inside the session state record as a vector aligned with the
/// node list; unknown nodes simply show the default color.
#[derive(Debug, Clone, Default)]
pub struct ColorTable {
    colors: BTreeMap<NodeId, [u8; 4]>,
}

impl ColorTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, id: NodeId, color: [u8; 4]) {
        self.colors.insert(id, color);
    }

    /// A node's annotation, falling back to the default.
    pub fn get(&self, id: NodeId) -> [u8; 4] {
        self.colors.get(&id).copied().unwrap_or(NODE_DEFAULT_COLOR)
    }

    pub fn clear(&mut self, id: NodeId) {
        self.colors.remove(&id);
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Flatten to a vector aligned with `order` (the serialized node list).
    pub fn to_record(&self, order: &[NodeId]) -> Vec<[u8; 4]> {
        order.iter().map(|id| self.get(*id)).collect()
    }

    /// Rebuild from a record vector aligned with `order`. Extra entries are
    /// ignored; missing entries stay default.
    pub fn apply_record(&mut self, order: &[NodeId], colors: &[[u8; 4]]) {
        for (id, color) in order.iter().zip(colors) {
            self.colors.insert(*id, *color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_nodes_get_the_default() {
        let table = ColorTable::new();
        assert_eq!(table.get(NodeId(3)), NODE_DEFAULT_COLOR);
    }

    #[test]
    fn record_roundtrip_respects_order() {
        let mut table = ColorTable::new();
        table.set(NodeId(0), [255, 0, 0, 255]);
        table.set(NodeId(2), [0, 0, 255, 255]);

        let order = [NodeId(0), NodeId(1), NodeId(2)];
        let record = table.to_record(&order);
        assert_eq!(
            record,
            vec![[255, 0, 0, 255], NODE_DEFAULT_COLOR, [0, 0, 255, 255]]
        );

        let mut restored = ColorTable::new();
        restored.apply_record(&order, &record);
        assert_eq!(restored.get(NodeId(2)), [0, 0, 255, 255]);
    }

    #[test]
    fn short_record_leaves_the_rest_default() {
        let mut table = ColorTable::new();
        table.apply_record(&[NodeId(0), NodeId(1)], &[[1, 2, 3, 4]]);
        assert_eq!(table.get(NodeId(0)), [1, 2, 3, 4]);
        assert_eq!(table.get(NodeId(1)), NODE_DEFAULT_COLOR);
    }
}
