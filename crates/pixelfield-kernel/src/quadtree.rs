//! Quadtree spatial partitioning for hit-testing moving cells.
//!
//! Cells move every frame, so the tree is never updated in place. It is
//! cleared and refilled wholesale on a fixed frame cadence. `clear()` keeps
//! the child allocations so a rebuild reuses the node structure.
//!
//! Insertion fills a node up to its capacity before subdividing, and a node
//! at max depth accepts everything. Children are tried in NE, NW, SE, SW order
//! on insert; queries visit them in NW, NE, SW, SE order.

/// Simple rectangle for bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// X coordinate of the left edge.
    pub x: f32,
    /// Y coordinate of the top edge.
    pub y: f32,
    /// Width of the rectangle.
    pub width: f32,
    /// Height of the rectangle.
    pub height: f32,
}

impl Rect {
    /// Creates a new rectangle.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a rectangle from center point and size.
    #[must_use]
    pub fn from_center(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self {
            x: cx - width / 2.0,
            y: cy - height / 2.0,
            width,
            height,
        }
    }

    /// Returns the right edge x coordinate.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Returns the bottom edge y coordinate.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Returns the center point of the rectangle.
    #[must_use]
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Checks if the rectangle contains a point, edges included.
    #[must_use]
    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }

    /// Checks if this rectangle intersects with another.
    #[must_use]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Checks if this rectangle fully contains another.
    #[must_use]
    pub fn contains(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.right() <= self.right()
            && other.y >= self.y
            && other.bottom() <= self.bottom()
    }
}

/// Statistics about a quadtree.
#[derive(Debug, Clone, Default)]
pub struct QuadTreeStats {
    /// Number of active nodes (root plus children of subdivided nodes).
    pub node_count: usize,
    /// Total number of items stored.
    pub item_count: usize,
    /// Deepest active level.
    pub max_depth: usize,
    /// Number of active nodes without active children.
    pub leaf_count: usize,
}

// Child slot order, which is also the insert order.
const NE: usize = 0;
const NW: usize = 1;
const SE: usize = 2;
const SW: usize = 3;

/// Query visit order.
const QUERY_ORDER: [usize; 4] = [NW, NE, SW, SE];

/// Quadtree node for spatial partitioning.
pub struct QuadTree<T> {
    /// Bounding rectangle of this node.
    bounds: Rect,
    /// Items held before subdividing.
    capacity: usize,
    /// Maximum tree depth.
    max_depth: usize,
    /// Current depth (0 = root).
    depth: usize,
    /// Items stored in this node.
    items: Vec<(Rect, T)>,
    /// Child nodes (NE, NW, SE, SW). Kept allocated across `clear()`.
    children: Option<Box<[QuadTree<T>; 4]>>,
    /// Whether the children take part in the current build.
    subdivided: bool,
}

impl<T> QuadTree<T> {
    /// Creates a new quadtree with the given bounds.
    ///
    /// A capacity of zero is treated as one.
    #[must_use]
    pub fn new(bounds: Rect, capacity: usize, max_depth: usize) -> Self {
        Self::new_node(bounds, capacity.max(1), max_depth, 0)
    }

    fn new_node(bounds: Rect, capacity: usize, max_depth: usize, depth: usize) -> Self {
        Self {
            bounds,
            capacity,
            max_depth,
            depth,
            items: Vec::new(),
            children: None,
            subdivided: false,
        }
    }

    /// Returns the bounds of this node.
    #[must_use]
    pub const fn bounds(&self) -> &Rect {
        &self.bounds
    }

    /// Inserts an item with its bounding rect.
    ///
    /// Returns `false` if the rect does not intersect this node.
    pub fn insert(&mut self, bounds: Rect, item: T) -> bool {
        if !self.bounds.intersects(&bounds) {
            return false;
        }

        if self.items.len() < self.capacity || self.depth >= self.max_depth {
            self.items.push((bounds, item));
            return true;
        }

        if !self.subdivided {
            self.subdivide();
        }

        let Some(children) = self.children.as_deref_mut() else {
            return false;
        };

        // First child whose bounds intersect takes the item.
        match children.iter().position(|c| c.bounds.intersects(&bounds)) {
            Some(slot) => children[slot].insert(bounds, item),
            None => false,
        }
    }

    /// Activates the four children, allocating them on first use.
    fn subdivide(&mut self) {
        if self.children.is_none() {
            let half_w = self.bounds.width / 2.0;
            let half_h = self.bounds.height / 2.0;
            let x = self.bounds.x;
            let y = self.bounds.y;
            let next = self.depth + 1;
            let child = |bx: f32, by: f32| {
                Self::new_node(
                    Rect::new(bx, by, half_w, half_h),
                    self.capacity,
                    self.max_depth,
                    next,
                )
            };

            self.children = Some(Box::new([
                child(x + half_w, y),
                child(x, y),
                child(x + half_w, y + half_h),
                child(x, y + half_h),
            ]));
        }
        self.subdivided = true;
    }

    /// Queries all items whose boxes overlap `range`.
    #[must_use]
    pub fn query(&self, range: Rect) -> Vec<&T> {
        let mut result = Vec::new();
        self.query_into(&range, &mut result);
        result
    }

    /// Appends all items whose boxes overlap `range` to `out`.
    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn query_into<'a>(&'a self, range: &Rect, out: &mut Vec<&'a T>) {
        if !self.bounds.intersects(range) {
            return;
        }

        for (bounds, item) in &self.items {
            if bounds.intersects(range) {
                out.push(item);
            }
        }

        if let Some(children) = self.active_children() {
            for slot in QUERY_ORDER {
                children[slot].query_into(range, out);
            }
        }
    }

    /// Queries items with their bounds.
    #[must_use]
    pub fn query_with_bounds(&self, range: Rect) -> Vec<(&Rect, &T)> {
        let mut result = Vec::new();
        self.query_with_bounds_internal(&range, &mut result);
        result
    }

    #[allow(clippy::trivially_copy_pass_by_ref)]
    fn query_with_bounds_internal<'a>(&'a self, range: &Rect, result: &mut Vec<(&'a Rect, &'a T)>) {
        if !self.bounds.intersects(range) {
            return;
        }

        for (bounds, item) in &self.items {
            if bounds.intersects(range) {
                result.push((bounds, item));
            }
        }

        if let Some(children) = self.active_children() {
            for slot in QUERY_ORDER {
                children[slot].query_with_bounds_internal(range, result);
            }
        }
    }

    fn active_children(&self) -> Option<&[QuadTree<T>; 4]> {
        if self.subdivided {
            self.children.as_deref()
        } else {
            None
        }
    }

    /// Empties every node and resets subdivision, keeping child allocations.
    pub fn clear(&mut self) {
        self.items.clear();
        self.subdivided = false;
        if let Some(children) = self.children.as_deref_mut() {
            for child in children.iter_mut() {
                child.clear();
            }
        }
    }

    /// Returns statistics about the active part of the tree.
    #[must_use]
    pub fn stats(&self) -> QuadTreeStats {
        let mut stats = QuadTreeStats::default();
        self.collect_stats(&mut stats);
        stats
    }

    fn collect_stats(&self, stats: &mut QuadTreeStats) {
        stats.node_count += 1;
        stats.item_count += self.items.len();
        stats.max_depth = stats.max_depth.max(self.depth);

        if let Some(children) = self.active_children() {
            for child in children {
                child.collect_stats(stats);
            }
        } else {
            stats.leaf_count += 1;
        }
    }

    /// Returns the number of items in this node (not including children).
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if this node has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns true if this node is subdivided in the current build.
    #[must_use]
    pub fn is_subdivided(&self) -> bool {
        self.subdivided
    }

    /// Returns true if child nodes are allocated, active or not.
    #[must_use]
    pub fn has_allocated_children(&self) -> bool {
        self.children.is_some()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for QuadTree<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuadTree")
            .field("bounds", &self.bounds)
            .field("depth", &self.depth)
            .field("items", &self.items.len())
            .field("subdivided", &self.subdivided)
            .finish_non_exhaustive()
    }
}
