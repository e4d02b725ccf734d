//! Bounding Box Drawing Tool
//!
//! Turns a press / drag / release gesture into a normalized bounding box.
//! Rendering the rubber band is up to the UI; this only tracks state.

use crate::core::annotations::BoundingBox;
use crate::core::Point2D;

/// Drag-to-draw state machine for bounding boxes
#[derive(Clone, Debug, Default)]
pub struct BoundingBoxTool {
    start_point: Option<Point2D>,
    current: Option<[f64; 4]>,
    history: Vec<BoundingBox>,
}

impl BoundingBoxTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_drawing(&self) -> bool {
        self.start_point.is_some()
    }

    /// Begins a new box at `point`, discarding any box in progress
    pub fn start(&mut self, point: Point2D) {
        self.start_point = Some(point);
        self.current = None;
    }

    /// Updates the box in progress; the result always has a top-left origin
    /// and non-negative size regardless of drag direction.
    pub fn update(&mut self, point: Point2D) {
        if let Some(start) = self.start_point {
            self.current = Some([
                start.x.min(point.x),
                start.y.min(point.y),
                (point.x - start.x).abs(),
                (point.y - start.y).abs(),
            ]);
        }
    }

    /// Returns the box in progress as `[x, y, width, height]`
    pub fn current(&self) -> Option<[f64; 4]> {
        self.current
    }

    /// Completes the gesture. Returns the box only if it has a positive area;
    /// accepted boxes are appended to the history.
    pub fn finish(&mut self, point: Point2D) -> Option<BoundingBox> {
        if !self.is_drawing() {
            return None;
        }

        self.update(point);
        let bbox = self
            .current
            .take()
            .and_then(|values| BoundingBox::try_from(values).ok());
        self.start_point = None;

        if let Some(bbox) = bbox {
            self.history.push(bbox);
        }
        bbox
    }

    /// Abandons the box in progress
    pub fn cancel(&mut self) {
        self.start_point = None;
        self.current = None;
    }

    /// Boxes completed so far, oldest first
    pub fn history(&self) -> &[BoundingBox] {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_box() {
        let mut tool = BoundingBoxTool::new();
        assert!(!tool.is_drawing());

        tool.start(Point2D::new(10.0, 20.0));
        assert!(tool.is_drawing());
        tool.update(Point2D::new(50.0, 60.0));
        assert_eq!(tool.current(), Some([10.0, 20.0, 40.0, 40.0]));

        let bbox = tool.finish(Point2D::new(110.0, 70.0)).unwrap();
        assert_eq!(bbox.to_array(), [10.0, 20.0, 100.0, 50.0]);
        assert!(!tool.is_drawing());
        assert_eq!(tool.history().len(), 1);
    }

    #[test]
    fn test_drag_up_and_left_normalizes() {
        let mut tool = BoundingBoxTool::new();
        tool.start(Point2D::new(100.0, 100.0));
        let bbox = tool.finish(Point2D::new(40.0, 70.0)).unwrap();
        assert_eq!(bbox.to_array(), [40.0, 70.0, 60.0, 30.0]);
    }

    #[test]
    fn test_zero_area_is_discarded() {
        let mut tool = BoundingBoxTool::new();
        tool.start(Point2D::new(10.0, 10.0));
        assert!(tool.finish(Point2D::new(10.0, 50.0)).is_none());
        assert!(tool.history().is_empty());
        assert!(!tool.is_drawing());
    }

    #[test]
    fn test_finish_without_start() {
        let mut tool = BoundingBoxTool::new();
        assert!(tool.finish(Point2D::new(5.0, 5.0)).is_none());
    }

    #[test]
    fn test_cancel() {
        let mut tool = BoundingBoxTool::new();
        tool.start(Point2D::new(0.0, 0.0));
        tool.update(Point2D::new(5.0, 5.0));
        tool.cancel();
        assert!(!tool.is_drawing());
        assert!(tool.current().is_none());
        assert!(tool.finish(Point2D::new(9.0, 9.0)).is_none());
    }
}
