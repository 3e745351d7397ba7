//! Stacked-plot cell state and layout-directive derivation.
//!
//! Each cell in a stacked plot carries its own order, size, spacing, indent
//! and visibility, and derives a directive string in the external layout
//! engine's grammar. The grammar must match exactly:
//!
//! - vertical, fixed:  `cell <indent> <index>, spanx <i32::MAX>, growx, height <size>!, gaptop <spacing>`
//! - vertical, grow:   `cell <indent> <index>, spanx <i32::MAX>, growx, pushy, growy, gaptop <spacing>`
//! - horizontal, fixed: `cell <index> <indent>, spany <i32::MAX>, growy, width <size>!, gapright <spacing>`
//! - horizontal, grow:  `cell <index> <indent>, spany <i32::MAX>, growy, pushx, growx, gapright <spacing>`
//!
//! `i32::MAX` is the engine's "unbounded span" sentinel.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::ops::{Deref, DerefMut};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Vertical,
    Horizontal,
}

/// One cell of a stacked plot. Identity is the opaque id alone: two cells
/// with equal ids are the same cell no matter what else differs.
#[derive(Debug, Clone)]
pub struct PlotCell<K> {
    id: K,
    order: i32,
    size: i32,
    spacing: i32,
    indent_level: i32,
    visible: bool,
    grow: bool,
    directive: String,
}

impl<K> PlotCell<K> {
    /// A negative `size` marks the cell as grow-to-fill from the start.
    pub fn new(id: K, order: i32, size: i32, spacing: i32) -> Self {
        Self {
            id,
            order,
            size,
            spacing,
            indent_level: 0,
            visible: true,
            grow: size < 0,
            directive: String::new(),
        }
    }

    pub fn id(&self) -> &K {
        &self.id
    }

    pub fn order(&self) -> i32 {
        self.order
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    pub fn spacing(&self) -> i32 {
        self.spacing
    }

    pub fn indent_level(&self) -> i32 {
        self.indent_level
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Growth only matters for visible cells: a hidden cell never grows,
    /// whatever its stored flag says.
    pub fn is_grow(&self) -> bool {
        self.grow && self.visible
    }

    /// The cached directive from the last relayout.
    pub fn directive(&self) -> &str {
        &self.directive
    }

    pub(crate) fn set_order(&mut self, order: i32) {
        self.order = order;
    }

    /// Setting a negative size re-derives the grow flag, matching `new`.
    pub(crate) fn set_size(&mut self, size: i32) {
        self.size = size;
        self.grow = size < 0;
    }

    pub(crate) fn set_spacing(&mut self, spacing: i32) {
        self.spacing = spacing;
    }

    pub(crate) fn set_grow(&mut self, grow: bool) {
        self.grow = grow;
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub(crate) fn set_indent_level(&mut self, level: i32) {
        self.indent_level = level.max(0);
    }

    /// Derives the layout directive for this cell at `index` of
    /// `cell_count` slots. Hidden cells keep their slot but collapse to
    /// zero size and spacing. Spacing is suppressed for the terminal cell
    /// in the fill direction (first when vertical, last when horizontal):
    /// the container's own border supplies the gap at that edge.
    pub fn derive_directive(
        &self,
        orientation: Orientation,
        index: usize,
        cell_count: usize,
    ) -> String {
        let mut spacing = self.spacing;
        let mut size = self.size;

        if !self.visible {
            spacing = 0;
            size = 0;
        }

        match orientation {
            Orientation::Horizontal if index + 1 == cell_count => spacing = 0,
            Orientation::Vertical if index == 0 => spacing = 0,
            _ => {}
        }

        match orientation {
            Orientation::Vertical => {
                if self.is_grow() {
                    format!(
                        "cell {} {}, spanx {}, growx, pushy, growy, gaptop {}",
                        self.indent_level,
                        index,
                        i32::MAX,
                        spacing
                    )
                } else {
                    format!(
                        "cell {} {}, spanx {}, growx, height {}!, gaptop {}",
                        self.indent_level,
                        index,
                        i32::MAX,
                        size,
                        spacing
                    )
                }
            }
            Orientation::Horizontal => {
                if self.is_grow() {
                    format!(
                        "cell {} {}, spany {}, growy, pushx, growx, gapright {}",
                        index,
                        self.indent_level,
                        i32::MAX,
                        spacing
                    )
                } else {
                    format!(
                        "cell {} {}, spany {}, growy, width {}!, gapright {}",
                        index,
                        self.indent_level,
                        i32::MAX,
                        size,
                        spacing
                    )
                }
            }
        }
    }
}

impl<K: PartialEq> PartialEq for PlotCell<K> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<K: Eq> Eq for PlotCell<K> {}

impl<K: Hash> Hash for PlotCell<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Display-order comparator: total order on `order` alone. Equal orders
/// compare equal, so ties land in an arbitrary (stable-sort) position;
/// assigning unique orders is the caller's job.
pub fn order_cmp<K>(a: &PlotCell<K>, b: &PlotCell<K>) -> Ordering {
    a.order.cmp(&b.order)
}

/// The stacked-plot container side of the layout policy. Mutations that
/// affect geometry (`set_order`, `set_size`) relayout immediately; wrap a
/// burst of changes in [`StackedLayout::batch`] to defer the relayout to
/// the end of the scope.
#[derive(Debug)]
pub struct StackedLayout<K> {
    orientation: Orientation,
    cells: Vec<PlotCell<K>>,
    deferred: bool,
}

impl<K: Eq + Hash + Clone> StackedLayout<K> {
    pub fn new(orientation: Orientation) -> Self {
        Self {
            orientation,
            cells: Vec::new(),
            deferred: false,
        }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Adds a cell, replacing any existing cell with the same id.
    pub fn add_cell(&mut self, cell: PlotCell<K>) {
        if let Some(existing) = self.cells.iter_mut().find(|c| c.id == cell.id) {
            *existing = cell;
        } else {
            self.cells.push(cell);
        }
        self.maybe_relayout();
    }

    /// Detaches and returns the cell; the caller owns tearing down whatever
    /// rendering surface was attached to it.
    pub fn remove_cell(&mut self, id: &K) -> Option<PlotCell<K>> {
        let index = self.cells.iter().position(|c| &c.id == id)?;
        let cell = self.cells.remove(index);
        self.maybe_relayout();
        Some(cell)
    }

    pub fn cell(&self, id: &K) -> Option<&PlotCell<K>> {
        self.cells.iter().find(|c| &c.id == id)
    }

    /// Cells in display order (valid after the last relayout).
    pub fn cells(&self) -> &[PlotCell<K>] {
        &self.cells
    }

    pub fn sorted_ids(&self) -> Vec<K> {
        self.cells.iter().map(|c| c.id.clone()).collect()
    }

    pub fn set_order(&mut self, id: &K, order: i32) {
        if let Some(cell) = self.cell_mut(id) {
            cell.set_order(order);
        }
        self.maybe_relayout();
    }

    pub fn set_size(&mut self, id: &K, size: i32) {
        if let Some(cell) = self.cell_mut(id) {
            cell.set_size(size);
        }
        self.maybe_relayout();
    }

    // Spacing, growth, visibility and indent changes take effect at the
    // next relayout, as in the reference behavior.

    pub fn set_spacing(&mut self, id: &K, spacing: i32) {
        if let Some(cell) = self.cell_mut(id) {
            cell.set_spacing(spacing);
        }
    }

    pub fn set_grow(&mut self, id: &K, grow: bool) {
        if let Some(cell) = self.cell_mut(id) {
            cell.set_grow(grow);
        }
    }

    pub fn set_visible(&mut self, id: &K, visible: bool) {
        if let Some(cell) = self.cell_mut(id) {
            cell.set_visible(visible);
        }
    }

    pub fn set_indent_level(&mut self, id: &K, level: i32) {
        if let Some(cell) = self.cell_mut(id) {
            cell.set_indent_level(level);
        }
    }

    /// Sorts cells by order (stable: ties keep insertion order) and
    /// re-derives every directive.
    pub fn relayout(&mut self) {
        self.cells.sort_by(order_cmp);

        let orientation = self.orientation;
        let count = self.cells.len();

        for index in 0..count {
            let directive = self.cells[index].derive_directive(orientation, index, count);
            self.cells[index].directive = directive;
        }
    }

    /// Starts a batch scope: relayout is suppressed until the returned
    /// guard drops, then runs exactly once.
    pub fn batch(&mut self) -> LayoutBatch<'_, K> {
        self.deferred = true;
        LayoutBatch { layout: self }
    }

    fn cell_mut(&mut self, id: &K) -> Option<&mut PlotCell<K>> {
        self.cells.iter_mut().find(|c| &c.id == id)
    }

    fn maybe_relayout(&mut self) {
        if !self.deferred {
            self.relayout();
        }
    }
}

/// Scope guard for deferred relayout. Derefs to the layout so batched code
/// uses the same mutation API.
pub struct LayoutBatch<'a, K: Eq + Hash + Clone> {
    layout: &'a mut StackedLayout<K>,
}

impl<K: Eq + Hash + Clone> Deref for LayoutBatch<'_, K> {
    type Target = StackedLayout<K>;

    fn deref(&self) -> &Self::Target {
        self.layout
    }
}

impl<K: Eq + Hash + Clone> DerefMut for LayoutBatch<'_, K> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.layout
    }
}

impl<K: Eq + Hash + Clone> Drop for LayoutBatch<'_, K> {
    fn drop(&mut self) {
        self.layout.deferred = false;
        self.layout.relayout();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_vertical_cell_has_spacing_suppressed() {
        let cell = PlotCell::new("a", 0, 40, 5);

        let first = cell.derive_directive(Orientation::Vertical, 0, 3);
        assert_eq!(
            first,
            format!("cell 0 0, spanx {}, growx, height 40!, gaptop 0", i32::MAX)
        );

        let last = cell.derive_directive(Orientation::Vertical, 2, 3);
        assert_eq!(
            last,
            format!("cell 0 2, spanx {}, growx, height 40!, gaptop 5", i32::MAX)
        );
    }

    #[test]
    fn last_horizontal_cell_has_spacing_suppressed() {
        let cell = PlotCell::new("a", 0, 40, 5);

        let last = cell.derive_directive(Orientation::Horizontal, 2, 3);
        assert_eq!(
            last,
            format!("cell 2 0, spany {}, growy, width 40!, gapright 0", i32::MAX)
        );

        let middle = cell.derive_directive(Orientation::Horizontal, 1, 3);
        assert_eq!(
            middle,
            format!("cell 1 0, spany {}, growy, width 40!, gapright 5", i32::MAX)
        );
    }

    #[test]
    fn hidden_cell_collapses_to_zero() {
        let mut cell = PlotCell::new("a", 0, 120, 9);
        cell.set_visible(false);

        let directive = cell.derive_directive(Orientation::Vertical, 1, 3);
        assert_eq!(
            directive,
            format!("cell 0 1, spanx {}, growx, height 0!, gaptop 0", i32::MAX)
        );
    }

    #[test]
    fn grow_directive_drops_fixed_size() {
        let cell = PlotCell::new("a", 0, -1, 5);
        assert!(cell.is_grow());

        let vertical = cell.derive_directive(Orientation::Vertical, 1, 3);
        assert_eq!(
            vertical,
            format!("cell 0 1, spanx {}, growx, pushy, growy, gaptop 5", i32::MAX)
        );

        let horizontal = cell.derive_directive(Orientation::Horizontal, 1, 3);
        assert_eq!(
            horizontal,
            format!("cell 1 0, spany {}, growy, pushx, growx, gapright 5", i32::MAX)
        );
    }

    #[test]
    fn hidden_cell_never_grows() {
        let mut cell = PlotCell::new("a", 0, -1, 5);
        assert!(cell.is_grow());

        cell.set_visible(false);
        assert!(!cell.is_grow());

        cell.set_visible(true);
        assert!(cell.is_grow());
    }

    #[test]
    fn set_size_rederives_grow_flag() {
        let mut layout = StackedLayout::new(Orientation::Vertical);
        layout.add_cell(PlotCell::new("a", 0, 40, 5));

        layout.set_size(&"a", -1);
        assert!(layout.cell(&"a").map(PlotCell::is_grow).unwrap_or(false));

        layout.set_size(&"a", 80);
        assert!(!layout.cell(&"a").map(PlotCell::is_grow).unwrap_or(true));
    }

    #[test]
    fn cells_are_equal_by_id_alone() {
        let a = PlotCell::new("same", 0, 40, 5);
        let b = PlotCell::new("same", 99, -1, 0);
        let c = PlotCell::new("other", 0, 40, 5);

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn relayout_sorts_by_order_and_caches_directives() {
        let mut layout = StackedLayout::new(Orientation::Vertical);
        layout.add_cell(PlotCell::new("bottom", 2, 40, 5));
        layout.add_cell(PlotCell::new("top", 0, 40, 5));
        layout.add_cell(PlotCell::new("middle", 1, -1, 5));

        assert_eq!(layout.sorted_ids(), vec!["top", "middle", "bottom"]);

        // Index 0 (top) gets gaptop suppressed; the grow cell at index 1
        // keeps its spacing.
        assert!(layout.cell(&"top").map(|c| c.directive().ends_with("gaptop 0")).unwrap_or(false));
        assert!(layout.cell(&"middle").map(|c| c.directive().contains("pushy, growy")).unwrap_or(false));
    }

    #[test]
    fn reorder_triggers_relayout() {
        let mut layout = StackedLayout::new(Orientation::Vertical);
        layout.add_cell(PlotCell::new("a", 0, 40, 5));
        layout.add_cell(PlotCell::new("b", 1, 40, 5));

        layout.set_order(&"a", 10);
        assert_eq!(layout.sorted_ids(), vec!["b", "a"]);
    }

    #[test]
    fn batch_defers_relayout_until_scope_exit() {
        let mut layout = StackedLayout::new(Orientation::Vertical);
        layout.add_cell(PlotCell::new("a", 0, 40, 5));
        layout.add_cell(PlotCell::new("b", 1, 40, 5));

        {
            let mut batch = layout.batch();
            batch.set_order(&"a", 10);

            // Still in insertion order inside the batch.
            assert_eq!(batch.sorted_ids(), vec!["a", "b"]);
        }

        assert_eq!(layout.sorted_ids(), vec!["b", "a"]);
    }

    #[test]
    fn remove_cell_detaches_and_relayouts() {
        let mut layout = StackedLayout::new(Orientation::Vertical);
        layout.add_cell(PlotCell::new("a", 0, 40, 5));
        layout.add_cell(PlotCell::new("b", 1, 40, 5));

        let removed = layout.remove_cell(&"a");
        assert_eq!(removed.map(|c| *c.id()), Some("a"));
        assert_eq!(layout.cell_count(), 1);

        // The survivor is now index 0 and loses its gap.
        assert!(layout.cell(&"b").map(|c| c.directive().ends_with("gaptop 0")).unwrap_or(false));
    }
}
