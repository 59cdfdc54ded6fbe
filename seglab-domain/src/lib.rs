mod bb;
mod core;
mod path;
pub mod result;
pub use crate::core::{max_from_partial, min_from_partial, Point, PtF, ShapeI, TPtF};
pub use bb::BbF;
pub use path::{closed_path_contains, ellipse_contains};
pub use result::{to_sl, SlError, SlResult};

#[test]
fn test_serde_roundtrip() {
    let bb = BbF::from_arr(&[1.0, 2.0, 3.0, 4.0]);
    let s = serde_json::to_string(&bb).unwrap();
    let bb2: BbF = serde_json::from_str(&s).unwrap();
    assert_eq!(bb, bb2);
    let p = PtF { x: 1.5, y: -2.5 };
    let s = serde_json::to_string(&p).unwrap();
    let p2: PtF = serde_json::from_str(&s).unwrap();
    assert_eq!(p, p2);
}
