use seglab_domain::PtF;

/// Default side length of the square vertex handle in scene coordinates.
pub const VERTEX_SIZE: f64 = 8.0;
/// Emphasized handles grow by this factor while highlighted or selected.
const EMPHASIS_FACTOR: f64 = 2.0;

/// Highlight/selection state of a shape's control points. The point sequence
/// itself is owned by the shape, all queries here operate on a borrowed
/// slice the shape passes in.
#[derive(Clone, Debug, PartialEq)]
pub struct VertexState {
    highlighted: Option<usize>,
    selected: Option<usize>,
    vertex_size: f64,
}

impl Default for VertexState {
    fn default() -> Self {
        Self::new(VERTEX_SIZE)
    }
}

impl VertexState {
    pub fn new(vertex_size: f64) -> Self {
        Self {
            highlighted: None,
            selected: None,
            vertex_size,
        }
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }
    pub fn vertex_size(&self) -> f64 {
        self.vertex_size
    }
    pub fn set_vertex_size(&mut self, vertex_size: f64) {
        self.vertex_size = vertex_size;
    }

    pub fn highlight(&mut self, idx: Option<usize>) {
        self.highlighted = idx;
    }
    pub fn select(&mut self, idx: Option<usize>) {
        self.selected = idx;
    }
    pub fn clear(&mut self) {
        self.highlighted = None;
        self.selected = None;
    }

    /// Index of the vertex closest to `pos`. Ties resolve to the first
    /// occurrence in index order.
    pub fn nearest_vertex(&self, points: &[PtF], pos: PtF) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (idx, p) in points.iter().enumerate() {
            let d = p.dist_square(&pos);
            if best.map_or(true, |(_, best_d)| d < best_d) {
                best = Some((idx, d));
            }
        }
        best.map(|(idx, _)| idx)
    }

    /// Does `pos` fall onto a vertex handle? The handle is a square centered
    /// on the nearest vertex, enlarged while that vertex is emphasized.
    pub fn is_on_vertex(&self, points: &[PtF], pos: PtF) -> Option<usize> {
        let idx = self.nearest_vertex(points, pos)?;
        let side = if self.highlighted == Some(idx) || self.selected == Some(idx) {
            self.vertex_size * EMPHASIS_FACTOR
        } else {
            self.vertex_size
        };
        let half = side * 0.5;
        let v = points[idx];
        if (pos.x - v.x).abs() <= half && (pos.y - v.y).abs() <= half {
            Some(idx)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: f64, y: f64) -> PtF {
        PtF { x, y }
    }

    #[test]
    fn nearest_matches_bruteforce() {
        let points = vec![
            pt(0.0, 0.0),
            pt(10.0, 0.0),
            pt(10.0, 10.0),
            pt(0.0, 10.0),
            pt(5.0, 5.0),
        ];
        let vs = VertexState::default();
        for query in [pt(1.0, 1.0), pt(9.0, 2.0), pt(4.0, 6.0), pt(-3.0, 12.0)] {
            let brute = points
                .iter()
                .enumerate()
                .fold(None::<(usize, f64)>, |acc, (i, p)| {
                    let d = p.dist_square(&query);
                    match acc {
                        Some((_, bd)) if bd <= d => acc,
                        _ => Some((i, d)),
                    }
                })
                .map(|(i, _)| i);
            assert_eq!(vs.nearest_vertex(&points, query), brute);
        }
        assert_eq!(vs.nearest_vertex(&[], pt(0.0, 0.0)), None);
    }

    #[test]
    fn nearest_tie_breaks_to_first() {
        let points = vec![pt(0.0, 0.0), pt(10.0, 0.0)];
        let vs = VertexState::default();
        assert_eq!(vs.nearest_vertex(&points, pt(5.0, 0.0)), Some(0));
    }

    #[test]
    fn on_vertex_square() {
        let points = vec![pt(0.0, 0.0), pt(100.0, 0.0)];
        let mut vs = VertexState::new(8.0);
        assert_eq!(vs.is_on_vertex(&points, pt(3.9, 3.9)), Some(0));
        assert_eq!(vs.is_on_vertex(&points, pt(4.1, 0.0)), None);
        // emphasis doubles the handle
        vs.highlight(Some(0));
        assert_eq!(vs.is_on_vertex(&points, pt(7.9, 0.0)), Some(0));
        vs.clear();
        assert_eq!(vs.is_on_vertex(&points, pt(7.9, 0.0)), None);
        vs.select(Some(1));
        assert_eq!(vs.is_on_vertex(&points, pt(94.0, 5.0)), Some(1));
    }
}
