#![forbid(unsafe_code)]

//! Keeps interactive cell content out of the tab order.
//!
//! Keyboard users move between grid cells, not between the links and
//! buttons inside them. Whenever rendered cell content changes, the
//! [`TabGuard`] finds the enclosing cell content root of each mutation and
//! demotes every focusable descendant (except the cell's own managed tab
//! stop) to `tabindex = -1`, marking it as grid-interactable so it can be
//! re-enabled when the cell enters interaction mode.
//!
//! The guard is driven purely by mutation batches. It does not care when
//! or why the window re-rendered.

use std::collections::HashSet;

use bitflags::bitflags;

/// Arena index of an element.
pub type NodeId = usize;

/// One observed mutation: only its target matters to the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationRecord {
    pub target: NodeId,
}

impl MutationRecord {
    #[must_use]
    pub const fn new(target: NodeId) -> Self {
        Self { target }
    }
}

/// Tree operations the guard needs from the host's element model.
pub trait FocusTree {
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Whether `node` is the content root of a grid cell.
    fn is_cell_content_root(&self, node: NodeId) -> bool;

    /// Focusable descendants of `root`, in document order.
    fn focusable_descendants(&self, root: NodeId) -> Vec<NodeId>;

    /// Whether `node` is the cell's own managed tab stop.
    fn is_tab_managed(&self, node: NodeId) -> bool;

    /// Whether `node` has already been demoted by the grid.
    fn is_grid_interactable(&self, node: NodeId) -> bool;

    /// Remove `node` from the tab order and mark it grid-interactable.
    fn demote(&mut self, node: NodeId);
}

/// Counts from one mutation batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GuardReport {
    pub records: usize,
    pub roots: usize,
    pub demoted: usize,
}

/// Mutation subscription that disables tab stops inside cell content.
///
/// Owns its per-batch dedup set; the set is cleared at the start of every
/// batch so a root touched by many records is processed once per batch.
#[derive(Debug, Default)]
pub struct TabGuard {
    seen: HashSet<NodeId>,
    batches: u64,
}

impl TabGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Batches processed so far.
    #[must_use]
    pub fn batches(&self) -> u64 {
        self.batches
    }

    /// Process one batch of mutation records.
    pub fn on_mutations<T: FocusTree + ?Sized>(
        &mut self,
        tree: &mut T,
        records: &[MutationRecord],
    ) -> GuardReport {
        self.seen.clear();
        self.batches += 1;
        let mut report = GuardReport {
            records: records.len(),
            ..GuardReport::default()
        };

        for record in records {
            let Some(root) = find_cell_root(tree, record.target) else {
                continue;
            };
            if !self.seen.insert(root) {
                continue;
            }
            report.roots += 1;
            for node in tree.focusable_descendants(root) {
                if tree.is_tab_managed(node) || tree.is_grid_interactable(node) {
                    continue;
                }
                tree.demote(node);
                report.demoted += 1;
            }
        }

        vgrid_core::trace!(
            records = report.records,
            roots = report.roots,
            demoted = report.demoted,
            "tab guard batch"
        );
        report
    }
}

fn find_cell_root<T: FocusTree + ?Sized>(tree: &T, start: NodeId) -> Option<NodeId> {
    let mut node = Some(start);
    while let Some(current) = node {
        if tree.is_cell_content_root(current) {
            return Some(current);
        }
        node = tree.parent(current);
    }
    None
}

// ============================================================================
// ElementTree
// ============================================================================

bitflags! {
    /// Grid-relevant element markers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ElementFlags: u8 {
        /// Root of a cell's rendered content.
        const CELL_CONTENT_ROOT = 1 << 0;
        /// The cell's own tab stop, managed by focus handling.
        const TAB_MANAGED = 1 << 1;
        /// Demoted by the tab guard.
        const GRID_INTERACTABLE = 1 << 2;
        /// `disabled` attribute present.
        const DISABLED = 1 << 3;
        /// `href` attribute present.
        const HAS_HREF = 1 << 4;
    }
}

/// One element in an [`ElementTree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub tab_index: Option<i32>,
    pub flags: ElementFlags,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Element {
    /// Whether keyboard focus can land here.
    #[must_use]
    pub fn is_focusable(&self) -> bool {
        if self.flags.contains(ElementFlags::DISABLED) {
            return false;
        }
        if let Some(tab_index) = self.tab_index {
            return tab_index >= 0;
        }
        match self.tag.as_str() {
            "a" | "area" => self.flags.contains(ElementFlags::HAS_HREF),
            "button" | "input" | "select" | "textarea" | "iframe" => true,
            _ => false,
        }
    }
}

/// Arena-backed element model implementing [`FocusTree`].
#[derive(Debug, Clone, Default)]
pub struct ElementTree {
    nodes: Vec<Element>,
}

impl ElementTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an element under `parent`.
    ///
    /// # Panics
    /// Panics if `parent` is not a node of this tree.
    pub fn append(&mut self, parent: Option<NodeId>, tag: &str, flags: ElementFlags) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Element {
            tag: tag.to_string(),
            tab_index: None,
            flags,
            parent,
            children: Vec::new(),
        });
        if let Some(p) = parent {
            self.nodes[p].children.push(id);
        }
        id
    }

    /// Set an explicit `tabindex`.
    pub fn set_tab_index(&mut self, node: NodeId, tab_index: Option<i32>) {
        if let Some(el) = self.nodes.get_mut(node) {
            el.tab_index = tab_index;
        }
    }

    #[must_use]
    pub fn get(&self, node: NodeId) -> Option<&Element> {
        self.nodes.get(node)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl FocusTree for ElementTree {
    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node).and_then(|el| el.parent)
    }

    fn is_cell_content_root(&self, node: NodeId) -> bool {
        self.nodes
            .get(node)
            .is_some_and(|el| el.flags.contains(ElementFlags::CELL_CONTENT_ROOT))
    }

    fn focusable_descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let Some(el) = self.nodes.get(root) else {
            return out;
        };
        // Depth-first, document order.
        let mut stack: Vec<NodeId> = el.children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            if node.is_focusable() {
                out.push(id);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    fn is_tab_managed(&self, node: NodeId) -> bool {
        self.nodes
            .get(node)
            .is_some_and(|el| el.flags.contains(ElementFlags::TAB_MANAGED))
    }

    fn is_grid_interactable(&self, node: NodeId) -> bool {
        self.nodes
            .get(node)
            .is_some_and(|el| el.flags.contains(ElementFlags::GRID_INTERACTABLE))
    }

    fn demote(&mut self, node: NodeId) {
        if let Some(el) = self.nodes.get_mut(node) {
            el.tab_index = Some(-1);
            el.flags.insert(ElementFlags::GRID_INTERACTABLE);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// body > cell root > [div > (button, a[href]), input(managed)]
    fn one_cell() -> (ElementTree, NodeId, Vec<NodeId>) {
        let mut t = ElementTree::new();
        let body = t.append(None, "div", ElementFlags::empty());
        let root = t.append(Some(body), "div", ElementFlags::CELL_CONTENT_ROOT);
        let wrap = t.append(Some(root), "div", ElementFlags::empty());
        let button = t.append(Some(wrap), "button", ElementFlags::empty());
        let link = t.append(Some(wrap), "a", ElementFlags::HAS_HREF);
        let managed = t.append(Some(root), "input", ElementFlags::TAB_MANAGED);
        (t, root, vec![button, link, managed])
    }

    #[test]
    fn demotes_focusables_except_managed() {
        let (mut t, _, nodes) = one_cell();
        let mut guard = TabGuard::new();
        let report = guard.on_mutations(&mut t, &[MutationRecord::new(nodes[0])]);
        assert_eq!(report.roots, 1);
        assert_eq!(report.demoted, 2);
        assert_eq!(t.get(nodes[0]).unwrap().tab_index, Some(-1));
        assert_eq!(t.get(nodes[1]).unwrap().tab_index, Some(-1));
        assert_eq!(t.get(nodes[2]).unwrap().tab_index, None);
        assert!(t.get(nodes[1]).unwrap().flags.contains(ElementFlags::GRID_INTERACTABLE));
    }

    #[test]
    fn already_demoted_is_skipped() {
        let (mut t, root, _) = one_cell();
        let mut guard = TabGuard::new();
        guard.on_mutations(&mut t, &[MutationRecord::new(root)]);
        let report = guard.on_mutations(&mut t, &[MutationRecord::new(root)]);
        assert_eq!(report.roots, 1);
        assert_eq!(report.demoted, 0);
        assert_eq!(guard.batches(), 2);
    }

    #[test]
    fn mutations_outside_cells_are_ignored() {
        let mut t = ElementTree::new();
        let body = t.append(None, "div", ElementFlags::empty());
        let button = t.append(Some(body), "button", ElementFlags::empty());
        let report = TabGuard::new().on_mutations(&mut t, &[MutationRecord::new(button)]);
        assert_eq!(report, GuardReport { records: 1, roots: 0, demoted: 0 });
        assert_eq!(t.get(button).unwrap().tab_index, None);
    }

    #[test]
    fn focusability_rules() {
        let mut t = ElementTree::new();
        let root = t.append(None, "div", ElementFlags::CELL_CONTENT_ROOT);
        let bare_link = t.append(Some(root), "a", ElementFlags::empty());
        let disabled = t.append(Some(root), "button", ElementFlags::DISABLED);
        let span = t.append(Some(root), "span", ElementFlags::empty());
        t.set_tab_index(span, Some(0));
        let negative = t.append(Some(root), "button", ElementFlags::empty());
        t.set_tab_index(negative, Some(-1));
        assert_eq!(t.focusable_descendants(root), vec![span]);
        assert!(!t.get(bare_link).unwrap().is_focusable());
        assert!(!t.get(disabled).unwrap().is_focusable());
    }

    #[test]
    fn dedup_resets_between_batches() {
        let (mut t, root, nodes) = one_cell();
        let mut guard = TabGuard::new();
        let first = guard.on_mutations(&mut t, &[MutationRecord::new(nodes[0]), MutationRecord::new(root)]);
        assert_eq!(first.roots, 1);
        // New content appears in the same cell.
        let fresh = t.append(Some(root), "button", ElementFlags::empty());
        let second = guard.on_mutations(&mut t, &[MutationRecord::new(fresh)]);
        assert_eq!(second.roots, 1);
        assert_eq!(second.demoted, 1);
    }
}
