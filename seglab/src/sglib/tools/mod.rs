use tracing::warn;

use seglab_domain::PtF;

use crate::{
    events::Event,
    hit::{Hit, VertexRef},
    shape::{Shape, ShapeKind},
};

mod edit;
mod sketch;

use edit::EditState;
use sketch::Sketch;

/// Default side of the square around a polygon's first point that closes the
/// path when clicked, in scene coordinates.
pub const CLOSING_TOL: f64 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// modify existing shapes, the default
    Edit,
    /// draw a new shape of the given kind
    Create(ShapeKind),
}

/// What the state machine tells the owning session. The machine never
/// mutates shapes itself, the session applies these.
#[derive(Clone, Debug, PartialEq)]
pub enum ToolSignal {
    /// left press resolved against the shape list
    ShapeSelected(Hit),
    /// pointer moved without a button held
    ShapeHovered(Hit),
    /// drag a shape body, `displacement` measured from current to previous
    /// pointer position as [`Shape::translate`](crate::Shape::translate)
    /// expects it
    MoveShape {
        shape_idx: usize,
        displacement: PtF,
    },
    /// drag a vertex handle to `pos`
    MoveVertex { vertex: VertexRef, pos: PtF },
    /// drag released, the shape's resize anchor is stale
    AnchorReset { shape_idx: usize },
    /// right press while a shape is selected
    ContextMenu { pos: PtF, shape_idx: usize },
    /// preview of the shape being drawn, including the rubber-band point
    DrawingInProgress { kind: ShapeKind, points: Vec<PtF> },
    /// drawing finished, the session turns this into a labeled shape
    DrawingDone { kind: ShapeKind, points: Vec<PtF> },
}

/// The interaction state machine. Consumes abstract pointer events plus the
/// current shape list and produces [`ToolSignal`](ToolSignal)s, strictly in
/// arrival order, no batching.
#[derive(Debug)]
pub struct Workbench {
    mode: Mode,
    edit: EditState,
    sketch: Sketch,
    closing_tol: f64,
}

impl Default for Workbench {
    fn default() -> Self {
        Self::new(CLOSING_TOL)
    }
}

impl Workbench {
    pub fn new(closing_tol: f64) -> Self {
        Self {
            mode: Mode::Edit,
            edit: EditState::default(),
            sketch: Sketch::default(),
            closing_tol,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Switch between editing and drawing. A partially drawn sketch is
    /// discarded, the user never confirmed its points as a shape.
    pub fn set_mode(&mut self, mode: Mode) {
        if !self.sketch.is_empty() {
            warn!("discarding unfinished sketch on switch to {mode:?}");
            self.sketch.reset();
        }
        self.edit.clear();
        self.mode = mode;
    }

    pub fn on_event(&mut self, event: Event, shapes: &[Shape]) -> Vec<ToolSignal> {
        match self.mode {
            Mode::Edit => self.edit.on_event(event, shapes),
            Mode::Create(kind) => self.sketch.on_event(kind, event, self.closing_tol),
        }
    }
}
