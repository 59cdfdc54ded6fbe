use serde::{Deserialize, Serialize};

use crate::{
    core::{max_from_partial, min_from_partial, PtF, ShapeI, TPtF},
    result::SlResult,
    slerr,
};

/// Axis-aligned box in scene coordinates.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Default)]
pub struct BbF {
    pub x: TPtF,
    pub y: TPtF,
    pub w: TPtF,
    pub h: TPtF,
}

impl BbF {
    /// `[x, y, w, h]`
    pub fn from_arr(a: &[TPtF; 4]) -> Self {
        BbF {
            x: a[0],
            y: a[1],
            w: a[2],
            h: a[3],
        }
    }

    /// Box spanned by two opposite corners, in any diagonal orientation.
    pub fn from_points(p1: PtF, p2: PtF) -> Self {
        let x_min = p1.x.min(p2.x);
        let y_min = p1.y.min(p2.y);
        let x_max = p1.x.max(p2.x);
        let y_max = p1.y.max(p2.y);
        Self {
            x: x_min,
            y: y_min,
            w: x_max - x_min,
            h: y_max - y_min,
        }
    }

    pub fn from_points_iter(points: impl Iterator<Item = PtF> + Clone) -> SlResult<Self> {
        let x_iter = points.clone().map(|p| p.x);
        let y_iter = points.map(|p| p.y);
        let min_x = x_iter
            .clone()
            .min_by(min_from_partial)
            .ok_or_else(|| slerr!("empty iterator"))?;
        let min_y = y_iter
            .clone()
            .min_by(min_from_partial)
            .ok_or_else(|| slerr!("empty iterator"))?;
        let max_x = x_iter
            .max_by(max_from_partial)
            .ok_or_else(|| slerr!("empty iterator"))?;
        let max_y = y_iter
            .max_by(max_from_partial)
            .ok_or_else(|| slerr!("empty iterator"))?;
        Ok(BbF::from_points(
            PtF { x: min_x, y: min_y },
            PtF { x: max_x, y: max_y },
        ))
    }
    pub fn from_vec(points: &[PtF]) -> SlResult<Self> {
        Self::from_points_iter(points.iter().copied())
    }

    pub fn x_max(&self) -> TPtF {
        self.x + self.w
    }
    pub fn y_max(&self) -> TPtF {
        self.y + self.h
    }

    /// Iteration order of corners, clockwise in image coordinates (y grows
    /// downwards)
    /// 0 > 1
    ///     v
    /// 3 < 2
    pub fn corner(&self, idx: usize) -> PtF {
        let (x, y, w, h) = (self.x, self.y, self.w, self.h);
        match idx {
            0 => PtF { x, y },
            1 => PtF { x: x + w, y },
            2 => PtF { x: x + w, y: y + h },
            3 => PtF { x, y: y + h },
            _ => panic!("boxes only have 4 corners, {idx} is out of bounds"),
        }
    }
    pub fn opposite_corner(&self, idx: usize) -> PtF {
        self.corner((idx + 2) % 4)
    }
    pub fn points(&self) -> [PtF; 4] {
        [
            self.corner(0),
            self.corner(1),
            self.corner(2),
            self.corner(3),
        ]
    }
    #[allow(clippy::needless_lifetimes)]
    pub fn points_iter<'a>(&'a self) -> impl Iterator<Item = PtF> + 'a + Clone {
        (0..4).map(|idx| self.corner(idx))
    }

    pub fn min(&self) -> PtF {
        PtF {
            x: self.x,
            y: self.y,
        }
    }
    pub fn max(&self) -> PtF {
        PtF {
            x: self.x_max(),
            y: self.y_max(),
        }
    }
    pub fn center(&self) -> PtF {
        PtF {
            x: self.x + self.w * 0.5,
            y: self.y + self.h * 0.5,
        }
    }

    pub fn covers_x(&self, x: TPtF) -> bool {
        self.x <= x && x <= self.x_max()
    }
    pub fn covers_y(&self, y: TPtF) -> bool {
        self.y <= y && y <= self.y_max()
    }
    pub fn contains<P>(&self, p: P) -> bool
    where
        P: Into<PtF>,
    {
        let p = p.into();
        self.covers_x(p.x) && self.covers_y(p.y)
    }

    pub fn is_contained_in_image(&self, shape: ShapeI) -> bool {
        self.x >= 0.0
            && self.y >= 0.0
            && self.x_max() <= TPtF::from(shape.w)
            && self.y_max() <= TPtF::from(shape.h)
    }

    /// Shifted box if it stays inside the image, `None` otherwise.
    pub fn translate(self, x_shift: TPtF, y_shift: TPtF, shape: ShapeI) -> Option<Self> {
        let bb = Self {
            x: self.x + x_shift,
            y: self.y + y_shift,
            w: self.w,
            h: self.h,
        };
        if bb.is_contained_in_image(shape) {
            Some(bb)
        } else {
            None
        }
    }
}

#[test]
fn test_corners_clockwise() {
    let bb = BbF::from_arr(&[10.0, 20.0, 5.0, 3.0]);
    assert_eq!(bb.corner(0), PtF { x: 10.0, y: 20.0 });
    assert_eq!(bb.corner(1), PtF { x: 15.0, y: 20.0 });
    assert_eq!(bb.corner(2), PtF { x: 15.0, y: 23.0 });
    assert_eq!(bb.corner(3), PtF { x: 10.0, y: 23.0 });
    assert_eq!(bb.opposite_corner(0), bb.corner(2));
    assert_eq!(bb.opposite_corner(3), bb.corner(1));
    for (c, i) in bb.points_iter().zip(0..4) {
        assert_eq!(c, bb.corner(i));
    }
}

#[test]
fn test_from_points() {
    let bb = BbF::from_points(PtF { x: 8.0, y: 2.0 }, PtF { x: 3.0, y: 9.0 });
    assert_eq!(bb, BbF::from_arr(&[3.0, 2.0, 5.0, 7.0]));
    let bb2 = BbF::from_vec(&bb.points()).unwrap();
    assert_eq!(bb, bb2);
    assert!(BbF::from_vec(&[]).is_err());
}

#[test]
fn test_contains() {
    let bb = BbF::from_arr(&[0.0, 0.0, 10.0, 10.0]);
    assert!(bb.contains(bb.center()));
    assert!(bb.contains(PtF { x: 0.0, y: 0.0 }));
    assert!(bb.contains(PtF { x: 10.0, y: 10.0 }));
    assert!(!bb.contains(PtF { x: 10.1, y: 5.0 }));
    assert!(!bb.contains(PtF { x: 5.0, y: -0.1 }));
}

#[test]
fn test_translate() {
    let shape = ShapeI::new(100, 100);
    let bb = BbF::from_arr(&[10.0, 10.0, 10.0, 10.0]);
    assert_eq!(
        bb.translate(1.0, 2.0, shape),
        Some(BbF::from_arr(&[11.0, 12.0, 10.0, 10.0]))
    );
    assert_eq!(bb.translate(81.0, 0.0, shape), None);
    assert_eq!(bb.translate(0.0, -10.5, shape), None);
    assert_eq!(
        bb.translate(80.0, 80.0, shape),
        Some(BbF::from_arr(&[90.0, 90.0, 10.0, 10.0]))
    );
}
