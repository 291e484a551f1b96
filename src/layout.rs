use ratatui::layout::{Constraint, Layout, Rect};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// One live split panel: an ordered run of children sharing an axis, each
/// owning a normalized fraction of the panel's extent.
///
/// A page panel splits its groups horizontally and a group panel splits its
/// terminals vertically; children are referenced by id, never owned.
///
/// Relative sizes are only meaningful once the panel has been given concrete
/// dimensions, so [`SplitPanel::set_relative_sizes`] on a panel that has never
/// completed a layout pass parks the ratios as pending; the next
/// [`SplitPanel::layout`] call applies them. This is what lets a restore
/// rebuild structure first and let sizes catch up on the following frame.
#[derive(Clone, Debug)]
pub struct SplitPanel<C> {
    orientation: Orientation,
    children: Vec<C>,
    relative_sizes: Vec<f64>,
    pending_sizes: Option<Vec<f64>>,
    area: Option<Rect>,
}

impl<C: Copy + Eq> SplitPanel<C> {
    pub fn new(orientation: Orientation) -> Self {
        Self {
            orientation,
            children: Vec::new(),
            relative_sizes: Vec::new(),
            pending_sizes: None,
            area: None,
        }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn children(&self) -> &[C] {
        &self.children
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn contains(&self, child: C) -> bool {
        self.children.contains(&child)
    }

    /// True once the host has reported concrete dimensions at least once.
    pub fn has_laid_out(&self) -> bool {
        self.area.is_some()
    }

    /// Append a child, giving it an equal share and scaling the existing
    /// children down proportionally.
    pub fn push_child(&mut self, child: C) {
        let n = self.children.len() as f64;
        self.children.push(child);
        if n == 0.0 {
            self.relative_sizes = vec![1.0];
            return;
        }
        let scale = n / (n + 1.0);
        for size in &mut self.relative_sizes {
            *size *= scale;
        }
        self.relative_sizes.push(1.0 / (n + 1.0));
    }

    /// Detach a child, redistributing its share over the survivors.
    /// Returns false if the child was not attached.
    pub fn remove_child(&mut self, child: C) -> bool {
        let Some(idx) = self.children.iter().position(|c| *c == child) else {
            return false;
        };
        self.children.remove(idx);
        self.relative_sizes.remove(idx);
        normalize(&mut self.relative_sizes);
        true
    }

    /// Current normalized shares, one per child, in child order.
    pub fn relative_sizes(&self) -> &[f64] {
        &self.relative_sizes
    }

    /// Apply new shares now if the panel has concrete dimensions, otherwise
    /// park them until the next layout pass. Extra values are ignored and
    /// missing values keep the child's current share.
    pub fn set_relative_sizes(&mut self, sizes: Vec<f64>) {
        if self.area.is_some() {
            self.apply_sizes(&sizes);
        } else {
            self.pending_sizes = Some(sizes);
        }
    }

    /// Resolve the panel against a concrete area, applying any pending shares
    /// first. Returns one rect per child, in child order.
    pub fn layout(&mut self, area: Rect) -> Vec<(C, Rect)> {
        self.area = Some(area);
        if let Some(pending) = self.pending_sizes.take() {
            self.apply_sizes(&pending);
        }
        if self.children.is_empty() {
            return Vec::new();
        }
        let constraints: Vec<Constraint> = self
            .relative_sizes
            .iter()
            .map(|s| Constraint::Percentage((s * 100.0).round() as u16))
            .collect();
        let chunks = match self.orientation {
            Orientation::Horizontal => Layout::horizontal(constraints).split(area),
            Orientation::Vertical => Layout::vertical(constraints).split(area),
        };
        self.children
            .iter()
            .copied()
            .zip(chunks.iter().copied())
            .collect()
    }

    fn apply_sizes(&mut self, sizes: &[f64]) {
        for (idx, share) in self.relative_sizes.iter_mut().enumerate() {
            if let Some(value) = sizes.get(idx) {
                *share = value.max(0.0);
            }
        }
        normalize(&mut self.relative_sizes);
    }
}

/// Rescale so the shares sum to 1, falling back to equal shares when the sum
/// is unusable.
fn normalize(sizes: &mut [f64]) {
    if sizes.is_empty() {
        return;
    }
    let total: f64 = sizes.iter().copied().filter(|s| s.is_finite()).sum();
    if total > 0.0 {
        for size in sizes.iter_mut() {
            *size /= total;
        }
    } else {
        let equal = 1.0 / sizes.len() as f64;
        for size in sizes.iter_mut() {
            *size = equal;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn test_push_child_keeps_shares_normalized() {
        let mut panel: SplitPanel<u32> = SplitPanel::new(Orientation::Horizontal);
        panel.push_child(1);
        assert_eq!(panel.relative_sizes(), &[1.0]);

        panel.push_child(2);
        assert_close(panel.relative_sizes()[0], 0.5);
        assert_close(panel.relative_sizes()[1], 0.5);

        panel.push_child(3);
        let sum: f64 = panel.relative_sizes().iter().sum();
        assert_close(sum, 1.0);
        assert_close(panel.relative_sizes()[2], 1.0 / 3.0);
    }

    #[test]
    fn test_remove_child_redistributes() {
        let mut panel: SplitPanel<u32> = SplitPanel::new(Orientation::Vertical);
        panel.push_child(1);
        panel.push_child(2);
        panel.push_child(3);

        assert!(panel.remove_child(2));
        assert_eq!(panel.children(), &[1, 3]);
        let sum: f64 = panel.relative_sizes().iter().sum();
        assert_close(sum, 1.0);

        assert!(!panel.remove_child(42));
    }

    #[test]
    fn test_layout_splits_area_by_shares() {
        let mut panel: SplitPanel<u32> = SplitPanel::new(Orientation::Horizontal);
        panel.push_child(1);
        panel.push_child(2);

        let rects = panel.layout(Rect::new(0, 0, 100, 40));
        assert_eq!(rects.len(), 2);
        assert_eq!(rects[0].0, 1);
        assert_eq!(rects[1].0, 2);
        assert!(rects[0].1.width >= 45 && rects[0].1.width <= 55);
        assert_eq!(rects[0].1.height, 40);
        assert_eq!(rects[1].1.height, 40);
    }

    #[test]
    fn test_vertical_layout_splits_height() {
        let mut panel: SplitPanel<u32> = SplitPanel::new(Orientation::Vertical);
        panel.push_child(1);
        panel.push_child(2);

        let rects = panel.layout(Rect::new(0, 0, 80, 60));
        assert_eq!(rects[0].1.width, 80);
        assert!(rects[0].1.height >= 25 && rects[0].1.height <= 35);
    }

    #[test]
    fn test_set_sizes_before_layout_is_deferred() {
        let mut panel: SplitPanel<u32> = SplitPanel::new(Orientation::Horizontal);
        panel.push_child(1);
        panel.push_child(2);

        panel.set_relative_sizes(vec![0.75, 0.25]);
        // Not applied yet: the panel has no concrete dimensions.
        assert_close(panel.relative_sizes()[0], 0.5);
        assert!(!panel.has_laid_out());

        let rects = panel.layout(Rect::new(0, 0, 100, 10));
        assert!(panel.has_laid_out());
        assert_close(panel.relative_sizes()[0], 0.75);
        assert_eq!(rects[0].1.width, 75);
    }

    #[test]
    fn test_set_sizes_after_layout_applies_immediately() {
        let mut panel: SplitPanel<u32> = SplitPanel::new(Orientation::Horizontal);
        panel.push_child(1);
        panel.push_child(2);
        panel.layout(Rect::new(0, 0, 100, 10));

        panel.set_relative_sizes(vec![0.2, 0.8]);
        assert_close(panel.relative_sizes()[0], 0.2);
        assert_close(panel.relative_sizes()[1], 0.8);
    }

    #[test]
    fn test_set_sizes_normalizes_unscaled_input() {
        let mut panel: SplitPanel<u32> = SplitPanel::new(Orientation::Horizontal);
        panel.push_child(1);
        panel.push_child(2);
        panel.layout(Rect::new(0, 0, 100, 10));

        // 0.6/0.2 is how callers hand in "terminal vs tree" defaults.
        panel.set_relative_sizes(vec![0.6, 0.2]);
        assert_close(panel.relative_sizes()[0], 0.75);
        assert_close(panel.relative_sizes()[1], 0.25);
    }

    #[test]
    fn test_set_sizes_short_vector_keeps_remaining_shares() {
        let mut panel: SplitPanel<u32> = SplitPanel::new(Orientation::Horizontal);
        panel.push_child(1);
        panel.push_child(2);
        panel.push_child(3);
        panel.layout(Rect::new(0, 0, 90, 10));

        panel.set_relative_sizes(vec![0.5]);
        let sum: f64 = panel.relative_sizes().iter().sum();
        assert_close(sum, 1.0);
    }

    #[test]
    fn test_degenerate_sizes_fall_back_to_equal() {
        let mut panel: SplitPanel<u32> = SplitPanel::new(Orientation::Horizontal);
        panel.push_child(1);
        panel.push_child(2);
        panel.layout(Rect::new(0, 0, 100, 10));

        panel.set_relative_sizes(vec![0.0, 0.0]);
        assert_close(panel.relative_sizes()[0], 0.5);
        assert_close(panel.relative_sizes()[1], 0.5);
    }

    #[test]
    fn test_layout_empty_panel_returns_nothing() {
        let mut panel: SplitPanel<u32> = SplitPanel::new(Orientation::Horizontal);
        assert!(panel.layout(Rect::new(0, 0, 10, 10)).is_empty());
        assert!(panel.is_empty());
    }
}
