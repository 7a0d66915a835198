#![forbid(unsafe_code)]

//! Pixel geometry shared by the grid body.

/// A width/height pair in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Size {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Size {
    /// Zero-sized box.
    pub const ZERO: Self = Self::new(0, 0);

    /// Create a new size.
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Check if either dimension is zero.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// An absolutely positioned box inside the scrollable grid body.
///
/// Origin is the top-left corner of the scroll content, not the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Rect {
    /// Left edge (inclusive).
    pub x: u32,
    /// Top edge (inclusive).
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge (exclusive).
    #[inline]
    pub const fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub const fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    /// Check if the rectangle has zero area.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// The same box moved down by `dy` pixels.
    #[inline]
    #[must_use]
    pub const fn shifted_down(self, dy: u32) -> Self {
        Self {
            y: self.y.saturating_add(dy),
            ..self
        }
    }

    /// Size of the box.
    #[inline]
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_edges() {
        let r = Rect::new(10, 20, 30, 40);
        assert_eq!(r.right(), 40);
        assert_eq!(r.bottom(), 60);
        assert_eq!(r.size(), Size::new(30, 40));
    }

    #[test]
    fn shifted_down_keeps_extent() {
        let r = Rect::new(5, 0, 100, 34).shifted_down(40);
        assert_eq!(r, Rect::new(5, 40, 100, 34));
    }

    #[test]
    fn saturating_edges() {
        let r = Rect::new(u32::MAX - 1, u32::MAX, 10, 10);
        assert_eq!(r.right(), u32::MAX);
        assert_eq!(r.bottom(), u32::MAX);
        assert_eq!(r.shifted_down(5).y, u32::MAX);
    }

    #[test]
    fn empty_sizes() {
        assert!(Size::ZERO.is_empty());
        assert!(Size::new(10, 0).is_empty());
        assert!(!Size::new(1, 1).is_empty());
        assert!(Rect::new(0, 0, 0, 5).is_empty());
    }
}
