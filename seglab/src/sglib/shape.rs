use std::{
    collections::HashMap,
    fmt::{self, Display, Formatter},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use seglab_domain::{
    closed_path_contains, ellipse_contains, slerr, BbF, PtF, ShapeI, SlError, SlResult,
};

use crate::vertices::VertexState;

/// Alpha of the fill derived from the line color, 0.5 in byte scale.
pub const FILL_ALPHA: u8 = 128;

/// The recognized kinds of annotated regions. The serialized names double as
/// the `shape_type` strings of the persisted records.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Polygon,
    Rectangle,
    Circle,
    Trace,
    Lines,
}

impl ShapeKind {
    /// Rectangle and circle are defined by their 4-corner normal form, the
    /// remaining kinds by a free polyline.
    pub fn is_corner_defined(&self) -> bool {
        matches!(self, ShapeKind::Rectangle | ShapeKind::Circle)
    }
    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeKind::Polygon => "polygon",
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Circle => "circle",
            ShapeKind::Trace => "trace",
            ShapeKind::Lines => "lines",
        }
    }
}

impl Display for ShapeKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShapeKind {
    type Err = SlError;
    fn from_str(s: &str) -> SlResult<Self> {
        match s {
            "polygon" => Ok(ShapeKind::Polygon),
            "rectangle" => Ok(ShapeKind::Rectangle),
            "circle" => Ok(ShapeKind::Circle),
            "trace" => Ok(ShapeKind::Trace),
            "lines" => Ok(ShapeKind::Lines),
            _ => Err(slerr!("invalid shape type {:?}", s)),
        }
    }
}

/// Persisted form of one shape as stored in the label table's shape list.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ShapeRecord {
    pub label: String,
    pub shape_type: ShapeKind,
    pub points: Vec<[f64; 2]>,
    #[serde(default)]
    pub flags: HashMap<String, bool>,
    #[serde(default)]
    pub group_id: Option<i64>,
}

/// Corners of the box spanned by the diagonal `p1`-`p2`, clockwise starting
/// at `p1`. Corners 0 and 2 are always the supplied diagonal.
fn corners_from_diagonal(p1: PtF, p2: PtF) -> [PtF; 4] {
    let dx = p2.x - p1.x;
    let dy = p2.y - p1.y;
    if dx * dy >= 0.0 {
        // main diagonal, clockwise continues horizontally from p1
        [p1, PtF { x: p2.x, y: p1.y }, p2, PtF { x: p1.x, y: p2.y }]
    } else {
        [p1, PtF { x: p1.x, y: p2.y }, p2, PtF { x: p2.x, y: p1.y }]
    }
}

/// One annotated region with class label and geometry. The point sequence is
/// owned here exclusively, [`VertexState`](VertexState) only borrows it.
#[derive(Clone, Debug, PartialEq)]
pub struct Shape {
    label: Option<String>,
    kind: ShapeKind,
    points: Vec<PtF>,
    line_color: [u8; 3],
    flags: HashMap<String, bool>,
    group_id: Option<i64>,
    is_highlighted: bool,
    is_selected: bool,
    vertices: VertexState,
    bb: BbF,
    // diagonal corner held fixed during a resize drag
    anchor: Option<PtF>,
}

impl Shape {
    pub fn new(kind: ShapeKind, points: Vec<PtF>, line_color: [u8; 3]) -> SlResult<Self> {
        let points = if kind.is_corner_defined() {
            match points.len() {
                2 => corners_from_diagonal(points[0], points[1]).to_vec(),
                4 => points,
                n => {
                    return Err(slerr!(
                        "{} needs 2 diagonal or 4 corner points, got {}",
                        kind,
                        n
                    ))
                }
            }
        } else {
            points
        };
        let bb = Self::compute_bb(kind, &points)?;
        Ok(Self {
            label: None,
            kind,
            points,
            line_color,
            flags: HashMap::new(),
            group_id: None,
            is_highlighted: false,
            is_selected: false,
            vertices: VertexState::default(),
            bb,
            anchor: None,
        })
    }

    pub fn from_record(record: &ShapeRecord, line_color: [u8; 3]) -> SlResult<Self> {
        let points = record.points.iter().map(|p| PtF::from(*p)).collect();
        let mut shape = Self::new(record.shape_type, points, line_color)?;
        shape.label = Some(record.label.clone());
        shape.flags = record.flags.clone();
        shape.group_id = record.group_id;
        Ok(shape)
    }

    pub fn to_record(&self) -> SlResult<ShapeRecord> {
        let label = self
            .label
            .clone()
            .ok_or_else(|| slerr!("cannot persist a shape without class label"))?;
        Ok(ShapeRecord {
            label,
            shape_type: self.kind,
            points: self.points.iter().map(|p| <[f64; 2]>::from(*p)).collect(),
            flags: self.flags.clone(),
            group_id: self.group_id,
        })
    }

    fn compute_bb(kind: ShapeKind, points: &[PtF]) -> SlResult<BbF> {
        if kind.is_corner_defined() {
            // the diagonal supplied at construction lives at corners 0 and 2
            Ok(BbF::from_points(points[0], points[2]))
        } else {
            BbF::from_vec(points)
        }
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
    pub fn set_label(&mut self, label: String) {
        self.label = Some(label);
    }
    pub fn points(&self) -> &[PtF] {
        &self.points
    }
    pub fn line_color(&self) -> [u8; 3] {
        self.line_color
    }
    pub fn fill_color(&self) -> [u8; 4] {
        let [r, g, b] = self.line_color;
        [r, g, b, FILL_ALPHA]
    }
    pub fn flags(&self) -> &HashMap<String, bool> {
        &self.flags
    }
    pub fn set_flag(&mut self, name: String, value: bool) {
        self.flags.insert(name, value);
    }
    pub fn group_id(&self) -> Option<i64> {
        self.group_id
    }
    pub fn set_group_id(&mut self, group_id: Option<i64>) {
        self.group_id = group_id;
    }

    pub fn is_highlighted(&self) -> bool {
        self.is_highlighted
    }
    pub fn set_highlighted(&mut self, is_highlighted: bool) {
        self.is_highlighted = is_highlighted;
    }
    pub fn is_selected(&self) -> bool {
        self.is_selected
    }
    pub fn set_selected(&mut self, is_selected: bool) {
        self.is_selected = is_selected;
    }

    pub fn vertices(&self) -> &VertexState {
        &self.vertices
    }
    pub fn vertices_mut(&mut self) -> &mut VertexState {
        &mut self.vertices
    }
    pub fn nearest_vertex(&self, pos: PtF) -> Option<usize> {
        self.vertices.nearest_vertex(&self.points, pos)
    }
    pub fn is_on_vertex(&self, pos: PtF) -> Option<usize> {
        self.vertices.is_on_vertex(&self.points, pos)
    }

    pub fn bounding_box(&self) -> BbF {
        self.bb
    }

    pub fn contains(&self, pos: PtF) -> bool {
        match self.kind {
            ShapeKind::Rectangle | ShapeKind::Polygon | ShapeKind::Trace => {
                closed_path_contains(&self.points, pos)
            }
            ShapeKind::Circle => ellipse_contains(&self.bb, pos),
            // open polylines have no interior
            ShapeKind::Lines => false,
        }
    }

    /// Translate the shape opposite to `displacement`, the pointer movement
    /// since the last sample measured from current to previous position. A
    /// translation that would push the bounding box outside the image is
    /// dropped silently.
    pub fn translate(&mut self, displacement: PtF, image: ShapeI) {
        if let Some(bb) = self.bb.translate(-displacement.x, -displacement.y, image) {
            for p in &mut self.points {
                *p = *p - displacement;
            }
            self.bb = bb;
        }
    }

    /// Replace the vertex at `idx` with `pos`. For corner-defined kinds the
    /// diagonal corner opposite to `idx` is cached as anchor on the first
    /// call of a drag and all 4 corners are re-derived from anchor and `pos`;
    /// since the corner ordering may flip while the drag crosses the anchor,
    /// the vertex nearest to `pos` is re-marked afterwards.
    ///
    /// `idx` must be valid for the current point list.
    pub fn update_vertex(&mut self, idx: usize, pos: PtF) {
        debug_assert!(idx < self.points.len());
        if self.kind.is_corner_defined() {
            let anchor = *self.anchor.get_or_insert(self.points[(idx + 2) % 4]);
            self.points = corners_from_diagonal(anchor, pos).to_vec();
            self.bb = BbF::from_points(anchor, pos);
            let nearest = self.vertices.nearest_vertex(&self.points, pos);
            self.vertices.select(nearest);
            self.vertices.highlight(nearest);
        } else {
            self.points[idx] = pos;
            if let Ok(bb) = BbF::from_vec(&self.points) {
                self.bb = bb;
            }
        }
    }

    /// Forget the cached resize anchor, to be called on drag release so the
    /// next drag derives its anchor fresh.
    pub fn reset_anchor(&mut self) {
        self.anchor = None;
    }
}

#[cfg(test)]
fn pt(x: f64, y: f64) -> PtF {
    PtF { x, y }
}

#[cfg(test)]
fn orientation_is_clockwise(points: &[PtF]) -> bool {
    // cross product of the first two edges, positive in y-down coordinates
    let e1 = points[1] - points[0];
    let e2 = points[2] - points[1];
    e1.x * e2.y - e1.y * e2.x > 0.0
}

#[test]
fn test_shape_type_parsing() {
    assert_eq!("polygon".parse::<ShapeKind>().unwrap(), ShapeKind::Polygon);
    assert_eq!("trace".parse::<ShapeKind>().unwrap(), ShapeKind::Trace);
    assert!("ellipse".parse::<ShapeKind>().is_err());
    assert_eq!(ShapeKind::Circle.to_string(), "circle");
    let kind: ShapeKind = serde_json::from_str("\"lines\"").unwrap();
    assert_eq!(kind, ShapeKind::Lines);
}

#[test]
fn test_corner_synthesis_clockwise() {
    // all four diagonal orientations, clockwise starting at the first corner
    let diagonals = [
        (pt(0.0, 0.0), pt(10.0, 10.0)),
        (pt(10.0, 10.0), pt(0.0, 0.0)),
        (pt(10.0, 0.0), pt(0.0, 10.0)),
        (pt(0.0, 10.0), pt(10.0, 0.0)),
    ];
    for (p1, p2) in diagonals {
        let shape = Shape::new(ShapeKind::Rectangle, vec![p1, p2], [255, 0, 0]).unwrap();
        assert_eq!(shape.points().len(), 4);
        assert_eq!(shape.points()[0], p1);
        assert_eq!(shape.points()[2], p2);
        assert!(orientation_is_clockwise(shape.points()));
        assert_eq!(
            shape.bounding_box(),
            BbF::from_arr(&[0.0, 0.0, 10.0, 10.0])
        );
    }
    let tl_br = Shape::new(ShapeKind::Circle, vec![pt(0.0, 0.0), pt(10.0, 10.0)], [0; 3]).unwrap();
    assert_eq!(
        tl_br.points(),
        [pt(0.0, 0.0), pt(10.0, 0.0), pt(10.0, 10.0), pt(0.0, 10.0)]
    );
    assert!(Shape::new(ShapeKind::Rectangle, vec![pt(0.0, 0.0)], [0; 3]).is_err());
}

#[test]
fn test_contains() {
    let rect = Shape::new(ShapeKind::Rectangle, vec![pt(0.0, 0.0), pt(10.0, 10.0)], [0; 3]).unwrap();
    assert!(rect.contains(rect.bounding_box().center()));
    assert!(!rect.contains(pt(10.1, 5.0)));
    assert!(!rect.contains(pt(5.0, -0.1)));

    let circle = Shape::new(ShapeKind::Circle, vec![pt(0.0, 0.0), pt(20.0, 10.0)], [0; 3]).unwrap();
    assert!(circle.contains(pt(10.0, 5.0)));
    // corner of the bounding box, outside the inscribed ellipse
    assert!(!circle.contains(pt(0.5, 0.5)));

    let lines = Shape::new(
        ShapeKind::Lines,
        vec![pt(0.0, 0.0), pt(10.0, 0.0), pt(10.0, 10.0)],
        [0; 3],
    )
    .unwrap();
    assert!(!lines.contains(pt(5.0, 2.0)));
}

#[test]
fn test_translate_roundtrip_and_clamp() {
    let image = ShapeI::new(100, 100);
    let mut poly = Shape::new(
        ShapeKind::Polygon,
        vec![pt(10.0, 10.0), pt(20.0, 10.0), pt(15.0, 20.0)],
        [0; 3],
    )
    .unwrap();
    let orig = poly.points().to_vec();
    let d = pt(3.0, -4.0);
    poly.translate(d, image);
    assert_eq!(poly.points()[0], pt(7.0, 14.0));
    poly.translate(-d, image);
    assert_eq!(poly.points(), orig.as_slice());
    assert_eq!(poly.bounding_box(), BbF::from_vec(&orig).unwrap());

    // translation that would leave the image is a no-op
    poly.translate(pt(50.0, 0.0), image);
    assert_eq!(poly.points(), orig.as_slice());
}

#[test]
fn test_vertex_drag_with_anchor() {
    let mut rect = Shape::new(ShapeKind::Rectangle, vec![pt(0.0, 0.0), pt(10.0, 10.0)], [0; 3]).unwrap();
    // corner nearest to (10, 10) is index 2, its anchor is (0, 0)
    let dragged = rect.nearest_vertex(pt(10.0, 10.0)).unwrap();
    assert_eq!(dragged, 2);
    rect.update_vertex(dragged, pt(15.0, 15.0));
    rect.update_vertex(dragged, pt(20.0, 20.0));
    assert_eq!(rect.bounding_box(), BbF::from_arr(&[0.0, 0.0, 20.0, 20.0]));
    assert_eq!(rect.points().len(), 4);
    assert_eq!(rect.vertices().selected(), Some(2));
    rect.reset_anchor();

    // resize crossing the anchor flips the corner ordering, the marked
    // vertex follows the pointer
    rect.update_vertex(2, pt(-5.0, -5.0));
    assert_eq!(rect.bounding_box(), BbF::from_arr(&[-5.0, -5.0, 5.0, 5.0]));
    let marked = rect.vertices().selected().unwrap();
    assert_eq!(rect.points()[marked], pt(-5.0, -5.0));
}

#[test]
fn test_vertex_drag_polygon() {
    let mut poly = Shape::new(
        ShapeKind::Polygon,
        vec![pt(0.0, 0.0), pt(10.0, 0.0), pt(10.0, 10.0), pt(0.0, 10.0)],
        [0; 3],
    )
    .unwrap();
    poly.update_vertex(1, pt(12.0, -2.0));
    assert_eq!(poly.points()[1], pt(12.0, -2.0));
    assert_eq!(poly.bounding_box(), BbF::from_arr(&[0.0, -2.0, 12.0, 12.0]));
}

#[test]
fn test_record_roundtrip() {
    let mut shape = Shape::new(
        ShapeKind::Polygon,
        vec![pt(0.0, 0.0), pt(10.0, 0.0), pt(5.0, 5.0)],
        [12, 34, 56],
    )
    .unwrap();
    assert!(shape.to_record().is_err()); // no label yet
    shape.set_label("tumour".to_string());
    shape.set_flag("occluded".to_string(), true);
    shape.set_group_id(Some(3));
    let record = shape.to_record().unwrap();
    assert_eq!(record.shape_type, ShapeKind::Polygon);
    assert_eq!(record.points.len(), 3);
    let rebuilt = Shape::from_record(&record, [12, 34, 56]).unwrap();
    assert_eq!(rebuilt.label(), Some("tumour"));
    assert_eq!(rebuilt.points(), shape.points());
    assert_eq!(rebuilt.flags(), shape.flags());
    assert_eq!(rebuilt.group_id(), Some(3));
    assert_eq!(rebuilt.fill_color(), [12, 34, 56, FILL_ALPHA]);
}
