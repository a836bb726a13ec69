//! Shape geometry in EMUs and its resolution from layout placeholders.
//!
//! Geometry values are plain `Copy` structs. A transform taken from a
//! placeholder is always a copy, so shapes built from it stay independent of
//! the placeholder they were positioned by.

use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::pptx::shapes::PlaceholderShape;
use std::fmt::Write as _;

/// EMUs per inch.
pub const EMU_PER_INCH: i64 = 914_400;

/// Position of a shape's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

/// Width and height of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    pub cx: i64,
    pub cy: i64,
}

/// Offset plus extents, the content of an `a:xfrm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Transform2D {
    pub offset: Point,
    pub extents: Size,
}

impl Transform2D {
    pub const fn new(x: i64, y: i64, cx: i64, cy: i64) -> Self {
        Self {
            offset: Point { x, y },
            extents: Size { cx, cy },
        }
    }

    /// Write `<a:xfrm>` with `a:off` and `a:ext`.
    pub fn write_xml(&self, out: &mut String) {
        let _ = write!(
            out,
            r#"<a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm>"#,
            self.offset.x, self.offset.y, self.extents.cx, self.extents.cy
        );
    }
}

/// Geometry for a shape positioned by `placeholder`.
///
/// Only the placeholder's own `a:xfrm` is considered; geometry that would be
/// inherited from the slide master is not looked up.
pub fn resolve_geometry(placeholder: &PlaceholderShape) -> Result<Transform2D> {
    placeholder
        .transform()
        .ok_or_else(|| OoxmlError::MissingGeometry {
            placeholder: placeholder.describe(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolved_geometry_is_a_copy() {
        let mut placeholder = PlaceholderShape::new(3, "Picture Placeholder 2", "pic", Some(1));
        placeholder.set_transform(Some(Transform2D::new(100, 200, 300, 400)));

        let resolved = resolve_geometry(&placeholder).unwrap();
        placeholder.set_transform(Some(Transform2D::new(1, 1, 1, 1)));

        assert_eq!(resolved, Transform2D::new(100, 200, 300, 400));
        assert_eq!(resolved.offset, Point { x: 100, y: 200 });
        assert_eq!(resolved.extents, Size { cx: 300, cy: 400 });
    }

    #[test]
    fn test_missing_geometry() {
        let placeholder = PlaceholderShape::new(3, "Picture Placeholder 2", "pic", Some(1));
        match resolve_geometry(&placeholder) {
            Err(OoxmlError::MissingGeometry { placeholder }) => {
                assert!(placeholder.contains("Picture Placeholder 2"));
            },
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_write_xml() {
        let mut out = String::new();
        Transform2D::new(0, 10, EMU_PER_INCH, 2 * EMU_PER_INCH).write_xml(&mut out);
        assert_eq!(
            out,
            r#"<a:xfrm><a:off x="0" y="10"/><a:ext cx="914400" cy="1828800"/></a:xfrm>"#
        );
    }
}
