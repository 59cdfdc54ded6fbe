use tracing::warn;

use seglab_domain::{slerr, PtF, ShapeI, SlResult};

use crate::{
    db::AnnotationDb,
    shape::{Shape, ShapeKind},
    tools::ToolSignal,
};

/// Fallback color for shapes whose class is missing from the palette, e.g.
/// after the class list changed on disk.
const UNKNOWN_CLASS_COLOR: [u8; 3] = [255, 255, 255];

/// Editing context of one image. Owns the live shape list exclusively, is
/// built when the user navigates to an image and dropped wholesale when
/// navigating away. The palette of `(class name, color)` pairs comes from
/// the surrounding application, the engine does not generate colors.
pub struct Session {
    image_path: String,
    image_shape: ShapeI,
    shapes: Vec<Shape>,
    palette: Vec<(String, [u8; 3])>,
    notes: String,
}

impl Session {
    /// Reconstruct the session of an image from its stored records, colored
    /// by class.
    pub fn load(
        db: &AnnotationDb,
        image_path: &str,
        image_shape: ShapeI,
        palette: Vec<(String, [u8; 3])>,
    ) -> SlResult<Self> {
        let records = db.get_labels(image_path)?;
        let notes = db.get_notes(image_path)?;
        let mut shapes = Vec::with_capacity(records.len());
        for record in &records {
            let color = match palette.iter().find(|(name, _)| *name == record.label) {
                Some((_, color)) => *color,
                None => {
                    warn!(
                        "class {:?} of {image_path:?} is not in the palette",
                        record.label
                    );
                    UNKNOWN_CLASS_COLOR
                }
            };
            shapes.push(Shape::from_record(record, color)?);
        }
        Ok(Self {
            image_path: image_path.to_string(),
            image_shape,
            shapes,
            palette,
            notes,
        })
    }

    /// Fresh session for an image without stored annotations.
    pub fn new(
        image_path: &str,
        image_shape: ShapeI,
        palette: Vec<(String, [u8; 3])>,
    ) -> Self {
        Self {
            image_path: image_path.to_string(),
            image_shape,
            shapes: vec![],
            palette,
            notes: String::new(),
        }
    }

    pub fn image_path(&self) -> &str {
        &self.image_path
    }
    pub fn image_shape(&self) -> ShapeI {
        self.image_shape
    }
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }
    pub fn notes(&self) -> &str {
        &self.notes
    }
    pub fn set_notes(&mut self, notes: String) {
        self.notes = notes;
    }

    pub fn color_of(&self, label: &str) -> Option<[u8; 3]> {
        self.palette
            .iter()
            .find(|(name, _)| name == label)
            .map(|(_, color)| *color)
    }

    /// Turn a finished drawing into a labeled shape. The label is what the
    /// user picked in the class dialog after drawing-done.
    pub fn add_shape(&mut self, kind: ShapeKind, points: Vec<PtF>, label: &str) -> SlResult<()> {
        let color = self
            .color_of(label)
            .ok_or_else(|| slerr!("unknown class {:?}", label))?;
        let mut shape = Shape::new(kind, points, color)?;
        shape.set_label(label.to_string());
        self.shapes.push(shape);
        Ok(())
    }

    pub fn remove_shape(&mut self, idx: usize) -> Option<Shape> {
        if idx < self.shapes.len() {
            Some(self.shapes.remove(idx))
        } else {
            None
        }
    }

    /// Apply a mutation signal from the state machine. Drawing and context
    /// menu signals address the surrounding application (dialog, menu) and
    /// pass through unhandled.
    pub fn apply(&mut self, signal: &ToolSignal) {
        match signal {
            ToolSignal::ShapeSelected(hit) => {
                for (idx, shape) in self.shapes.iter_mut().enumerate() {
                    shape.set_selected(hit.hovered == Some(idx));
                    let vertex = hit
                        .vertex
                        .filter(|v| v.shape_idx == idx)
                        .map(|v| v.vertex_idx);
                    shape.vertices_mut().select(vertex);
                }
            }
            ToolSignal::ShapeHovered(hit) => {
                for (idx, shape) in self.shapes.iter_mut().enumerate() {
                    shape.set_highlighted(hit.hovered == Some(idx));
                    let vertex = hit
                        .vertex
                        .filter(|v| v.shape_idx == idx)
                        .map(|v| v.vertex_idx);
                    shape.vertices_mut().highlight(vertex);
                }
            }
            ToolSignal::MoveShape {
                shape_idx,
                displacement,
            } => {
                let image_shape = self.image_shape;
                if let Some(shape) = self.shapes.get_mut(*shape_idx) {
                    shape.translate(*displacement, image_shape);
                }
            }
            ToolSignal::MoveVertex { vertex, pos } => {
                if let Some(shape) = self.shapes.get_mut(vertex.shape_idx) {
                    shape.update_vertex(vertex.vertex_idx, *pos);
                }
            }
            ToolSignal::AnchorReset { shape_idx } => {
                if let Some(shape) = self.shapes.get_mut(*shape_idx) {
                    shape.reset_anchor();
                }
            }
            ToolSignal::ContextMenu { .. }
            | ToolSignal::DrawingInProgress { .. }
            | ToolSignal::DrawingDone { .. } => {}
        }
    }

    /// Persist shape list and notes. A failure leaves the in-memory state
    /// untouched so the user can retry.
    pub fn save(&self, db: &mut AnnotationDb) -> SlResult<()> {
        let records = self
            .shapes
            .iter()
            .map(Shape::to_record)
            .collect::<SlResult<Vec<_>>>()?;
        db.set_labels(&self.image_path, &records)?;
        db.set_notes(&self.image_path, &self.notes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        events::{Btn, Event},
        tools::{Mode, Workbench},
    };

    fn pt(x: f64, y: f64) -> PtF {
        PtF { x, y }
    }

    fn palette() -> Vec<(String, [u8; 3])> {
        vec![
            ("tumour".to_string(), [200, 30, 30]),
            ("scar".to_string(), [30, 200, 30]),
        ]
    }

    #[test]
    fn draw_label_persist_reload() {
        let mut db = AnnotationDb::open_in_memory().unwrap();
        let mut session = Session::new("images/a.png", ShapeI::new(100, 100), palette());
        let mut workbench = Workbench::default();
        workbench.set_mode(Mode::Create(ShapeKind::Rectangle));

        let mut done = None;
        for ev in [
            Event::Pressed(pt(10.0, 10.0), Btn::Left),
            Event::Moved(pt(20.0, 25.0)),
            Event::Released(pt(30.0, 40.0), Btn::Left),
        ] {
            for signal in workbench.on_event(ev, session.shapes()) {
                if let ToolSignal::DrawingDone { kind, points } = signal {
                    done = Some((kind, points));
                }
            }
        }
        let (kind, points) = done.unwrap();
        session.add_shape(kind, points, "tumour").unwrap();
        assert!(session.add_shape(kind, vec![pt(0.0, 0.0), pt(1.0, 1.0)], "bubbles").is_err());
        session.set_notes("first pass".to_string());
        session.save(&mut db).unwrap();

        let reloaded = Session::load(&db, "images/a.png", ShapeI::new(100, 100), palette()).unwrap();
        assert_eq!(reloaded.shapes().len(), 1);
        let shape = &reloaded.shapes()[0];
        assert_eq!(shape.label(), Some("tumour"));
        assert_eq!(shape.kind(), ShapeKind::Rectangle);
        assert_eq!(shape.line_color(), [200, 30, 30]);
        assert_eq!(shape.points().len(), 4);
        assert_eq!(reloaded.notes(), "first pass");
        assert_eq!(db.images_with_classes(&["tumour"]).unwrap(), vec!["images/a.png"]);
    }

    #[test]
    fn selection_and_drag_via_signals() {
        let mut session = Session::new("images/a.png", ShapeI::new(100, 100), palette());
        session
            .add_shape(
                ShapeKind::Rectangle,
                vec![pt(10.0, 10.0), pt(30.0, 30.0)],
                "scar",
            )
            .unwrap();
        let mut workbench = Workbench::default();

        // hover, then grab the body and drag
        for signal in workbench.on_event(Event::Moved(pt(20.0, 20.0)), session.shapes()) {
            session.apply(&signal);
        }
        assert!(session.shapes()[0].is_highlighted());
        for ev in [
            Event::Pressed(pt(20.0, 20.0), Btn::Left),
            Event::Moved(pt(25.0, 20.0)),
            Event::Released(pt(25.0, 20.0), Btn::Left),
        ] {
            for signal in workbench.on_event(ev, session.shapes()) {
                session.apply(&signal);
            }
        }
        assert!(session.shapes()[0].is_selected());
        // the shape followed the pointer by +5 in x
        assert_eq!(session.shapes()[0].points()[0], pt(15.0, 10.0));

        // drag the br corner, anchor stays at the tl corner
        for ev in [
            Event::Pressed(pt(36.0, 31.0), Btn::Left),
            Event::Moved(pt(50.0, 50.0)),
            Event::Released(pt(50.0, 50.0), Btn::Left),
        ] {
            for signal in workbench.on_event(ev, session.shapes()) {
                session.apply(&signal);
            }
        }
        let bb = session.shapes()[0].bounding_box();
        assert_eq!((bb.x, bb.y, bb.x_max(), bb.y_max()), (15.0, 10.0, 50.0, 50.0));
    }

    #[test]
    fn unknown_class_loads_with_fallback_color() {
        let mut db = AnnotationDb::open_in_memory().unwrap();
        let mut session = Session::new("images/a.png", ShapeI::new(100, 100), palette());
        session
            .add_shape(ShapeKind::Circle, vec![pt(0.0, 0.0), pt(10.0, 10.0)], "tumour")
            .unwrap();
        session.save(&mut db).unwrap();
        let reloaded = Session::load(&db, "images/a.png", ShapeI::new(100, 100), vec![]).unwrap();
        assert_eq!(reloaded.shapes()[0].line_color(), UNKNOWN_CLASS_COLOR);
    }
}
