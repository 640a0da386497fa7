// window.rs - Which instances are currently on screen

/// A contiguous, wrap-around run of instance indices anchored at `first`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityWindow {
    total: usize,
    width: usize,  // already clipped to `total`
    first: usize,
    indices: Vec<usize>,
}

impl VisibilityWindow {
    /// Starts at `[0, width)`, clipped when fewer than `width` instances exist.
    pub fn new(total_instances: usize, window_width: usize) -> Self {
        let mut window = Self {
            total: total_instances,
            width: window_width.min(total_instances),
            first: 0,
            indices: Vec::new(),
        };
        window.recompute();
        window
    }

    /// Moves the anchor by `step` modulo the instance count. `±1` pans one
    /// instance, `±width()` pages by a full screen.
    pub fn cycle(&mut self, step: i64) {
        if self.total == 0 {
            return;
        }
        let total = self.total as i64;
        let offset = step.rem_euclid(total);
        self.first = ((self.first as i64 + offset) % total) as usize;
        self.recompute();
    }

    fn recompute(&mut self) {
        self.indices = (0..self.width).map(|i| (self.first + i) % self.total).collect();
    }

    pub fn current(&self) -> &[usize] {
        &self.indices
    }

    pub fn first(&self) -> usize {
        self.first
    }

    pub fn width(&self) -> usize {
        self.width
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_instances_two_wide() {
        let mut window = VisibilityWindow::new(4, 2);
        assert_eq!(window.current(), &[0, 1]);
        window.cycle(1);
        assert_eq!(window.current(), &[1, 2]);
        window.cycle(2);
        assert_eq!(window.current(), &[3, 0]);
    }

    #[test]
    fn clips_to_instance_count() {
        let mut window = VisibilityWindow::new(3, 8);
        assert_eq!(window.current(), &[0, 1, 2]);
        window.cycle(-1);
        assert_eq!(window.current(), &[2, 0, 1]);
    }

    #[test]
    fn cycling_backwards_from_zero_wraps_to_last() {
        let mut window = VisibilityWindow::new(10, 3);
        window.cycle(-1);
        assert_eq!(window.first(), 9);
        assert_eq!(window.current(), &[9, 0, 1]);
        window.cycle(-3);
        assert_eq!(window.current(), &[6, 7, 8]);
    }

    #[test]
    fn empty_registry_gives_empty_window() {
        let mut window = VisibilityWindow::new(0, 8);
        window.cycle(5);
        assert!(window.current().is_empty());
    }
}
