use crate::{bb::BbF, core::PtF, TPtF};

fn intersect_y_axis_parallel(lineseg: (PtF, PtF), x_value: TPtF) -> Option<PtF> {
    let (p1, p2) = lineseg;
    if p1.x.min(p2.x) < x_value && p1.x.max(p2.x) >= x_value {
        let t = (x_value - p1.x) / (p2.x - p1.x);
        let y = p1.y + t * (p2.y - p1.y);
        Some(PtF { x: x_value, y })
    } else {
        None
    }
}

fn lineseg_iter(points: &[PtF]) -> impl Iterator<Item = (PtF, PtF)> + '_ {
    points.iter().enumerate().map(|(i, p1)| {
        let p2 = if i < points.len() - 1 {
            points[i + 1]
        } else {
            points[0]
        };
        (*p1, p2)
    })
}

/// Containment in the closed polyline spanned by `points`, the segment from
/// the last back to the first point is implied. We count the cuts of a ray
/// from the point parallel to the y-axis.
///   odd number => inside
///   even number => outside
pub fn closed_path_contains(points: &[PtF], point: PtF) -> bool {
    if points.len() < 3 {
        return false;
    }
    let n_cuts = lineseg_iter(points)
        .filter(|(p1, p2)| {
            if let Some(p) = intersect_y_axis_parallel((*p1, *p2), point.x) {
                p.y >= point.y
            } else {
                false
            }
        })
        .count();
    n_cuts % 2 == 1
}

/// Containment in the ellipse inscribed into `bb`, i.e.
/// `(x-cx)²/a² + (y-cy)²/b² <= 1` with a, b the half-axes.
pub fn ellipse_contains(bb: &BbF, point: PtF) -> bool {
    let a = bb.w * 0.5;
    let b = bb.h * 0.5;
    if a <= 0.0 || b <= 0.0 {
        return false;
    }
    let c = bb.center();
    let dx = (point.x - c.x) / a;
    let dy = (point.y - c.y) / b;
    dx * dx + dy * dy <= 1.0
}

#[cfg(test)]
use crate::point;

#[test]
fn test_closed_path_contains() {
    let square = [
        point!(0.0, 0.0),
        point!(10.0, 0.0),
        point!(10.0, 10.0),
        point!(0.0, 10.0),
    ];
    assert!(closed_path_contains(&square, point!(5.0, 5.0)));
    assert!(!closed_path_contains(&square, point!(15.0, 5.0)));
    assert!(!closed_path_contains(&square, point!(-1.0, 5.0)));
    // L-shaped, concave
    let ell = [
        point!(0.0, 0.0),
        point!(10.0, 0.0),
        point!(10.0, 4.0),
        point!(4.0, 4.0),
        point!(4.0, 10.0),
        point!(0.0, 10.0),
    ];
    assert!(closed_path_contains(&ell, point!(2.0, 8.0)));
    assert!(closed_path_contains(&ell, point!(8.0, 2.0)));
    assert!(!closed_path_contains(&ell, point!(8.0, 8.0)));
    // too short to enclose anything
    assert!(!closed_path_contains(
        &[point!(0.0, 0.0), point!(10.0, 10.0)],
        point!(5.0, 5.0)
    ));
}

#[test]
fn test_ellipse_contains() {
    let bb = BbF::from_arr(&[0.0, 0.0, 20.0, 10.0]);
    assert!(ellipse_contains(&bb, point!(10.0, 5.0)));
    assert!(ellipse_contains(&bb, point!(19.9, 5.0)));
    assert!(ellipse_contains(&bb, point!(10.0, 0.1)));
    // inside the box but outside the inscribed ellipse
    assert!(!ellipse_contains(&bb, point!(1.0, 1.0)));
    assert!(!ellipse_contains(&bb, point!(20.1, 5.0)));
    let degenerate = BbF::from_arr(&[0.0, 0.0, 0.0, 10.0]);
    assert!(!ellipse_contains(&degenerate, point!(0.0, 5.0)));
}
