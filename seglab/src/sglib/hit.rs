use seglab_domain::PtF;

use crate::shape::Shape;

/// A vertex handle addressed by owning shape and vertex index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexRef {
    pub shape_idx: usize,
    pub vertex_idx: usize,
}

/// Result of resolving a pointer position against the shape list. Body and
/// vertex hits are independent, the pointer may rest on one shape's body and
/// a different shape's vertex handle at the same time. Downstream highlight
/// rendering needs both.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Hit {
    pub hovered: Option<usize>,
    pub vertex: Option<VertexRef>,
}

/// Two-phase hit resolution. The body hit is the last containing shape in
/// display order since later shapes are drawn on top, the vertex hit is the
/// first shape in list order that reports one.
pub fn resolve(pos: PtF, shapes: &[Shape]) -> Hit {
    let mut hovered = None;
    for (idx, shape) in shapes.iter().enumerate() {
        if shape.contains(pos) {
            hovered = Some(idx);
        }
    }
    let vertex = shapes.iter().enumerate().find_map(|(shape_idx, shape)| {
        shape.is_on_vertex(pos).map(|vertex_idx| VertexRef {
            shape_idx,
            vertex_idx,
        })
    });
    Hit { hovered, vertex }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::ShapeKind;
    use seglab_domain::PtF;

    fn pt(x: f64, y: f64) -> PtF {
        PtF { x, y }
    }

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Shape {
        Shape::new(ShapeKind::Rectangle, vec![pt(x0, y0), pt(x1, y1)], [0; 3]).unwrap()
    }

    #[test]
    fn body_hit_last_wins() {
        let shapes = vec![rect(0.0, 0.0, 20.0, 20.0), rect(10.0, 10.0, 30.0, 30.0)];
        let hit = resolve(pt(15.0, 15.0), &shapes);
        assert_eq!(hit.hovered, Some(1));
        let hit = resolve(pt(5.0, 5.0), &shapes);
        assert_eq!(hit.hovered, Some(0));
        let hit = resolve(pt(50.0, 50.0), &shapes);
        assert_eq!(hit, Hit::default());
    }

    #[test]
    fn vertex_hit_first_wins() {
        // both rectangles have a corner at (20, 20)
        let shapes = vec![rect(0.0, 0.0, 20.0, 20.0), rect(20.0, 20.0, 40.0, 40.0)];
        let hit = resolve(pt(20.5, 20.5), &shapes);
        let vertex = hit.vertex.unwrap();
        assert_eq!(vertex.shape_idx, 0);
        assert_eq!(shapes[0].points()[vertex.vertex_idx], pt(20.0, 20.0));
    }

    #[test]
    fn body_and_vertex_may_disagree() {
        // pointer inside the big rectangle's body but on the small one's corner
        let shapes = vec![rect(30.0, 30.0, 33.0, 33.0), rect(0.0, 0.0, 100.0, 100.0)];
        let hit = resolve(pt(31.0, 31.0), &shapes);
        assert_eq!(hit.hovered, Some(1));
        assert_eq!(hit.vertex.map(|v| v.shape_idx), Some(0));
    }
}
