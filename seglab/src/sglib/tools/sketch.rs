use std::mem;

use seglab_domain::PtF;

use crate::{
    events::{Btn, Event},
    shape::ShapeKind,
};

use super::ToolSignal;

/// Accumulator for the shape being drawn in create mode. Only one of the
/// point list and the corner is in use at a time, depending on the kind.
#[derive(Debug, Default)]
pub(super) struct Sketch {
    points: Vec<PtF>,
    corner: Option<PtF>,
    held: bool,
}

fn on_beginning(first: PtF, pos: PtF, tol: f64) -> bool {
    let half = tol * 0.5;
    (pos.x - first.x).abs() <= half && (pos.y - first.y).abs() <= half
}

impl Sketch {
    pub(super) fn is_empty(&self) -> bool {
        self.points.is_empty() && self.corner.is_none()
    }

    pub(super) fn reset(&mut self) {
        self.points.clear();
        self.corner = None;
        self.held = false;
    }

    pub(super) fn on_event(
        &mut self,
        kind: ShapeKind,
        event: Event,
        closing_tol: f64,
    ) -> Vec<ToolSignal> {
        match kind {
            ShapeKind::Polygon => self.on_event_polygon(event, closing_tol),
            ShapeKind::Trace | ShapeKind::Lines => self.on_event_freehand(kind, event),
            ShapeKind::Rectangle | ShapeKind::Circle => self.on_event_corner(kind, event),
        }
    }

    /// Click by click. A click inside the on-beginning square of the first
    /// point closes the path, the closing click itself is not a vertex.
    fn on_event_polygon(&mut self, event: Event, closing_tol: f64) -> Vec<ToolSignal> {
        match event {
            Event::Pressed(pos, Btn::Left) => {
                if self.points.len() >= 2 && on_beginning(self.points[0], pos, closing_tol) {
                    let points = mem::take(&mut self.points);
                    vec![ToolSignal::DrawingDone {
                        kind: ShapeKind::Polygon,
                        points,
                    }]
                } else {
                    self.points.push(pos);
                    vec![]
                }
            }
            Event::Moved(pos) => {
                // rubber band towards the pointer, accumulator untouched
                let mut points = self.points.clone();
                points.push(pos);
                vec![ToolSignal::DrawingInProgress {
                    kind: ShapeKind::Polygon,
                    points,
                }]
            }
            _ => vec![],
        }
    }

    /// Freehand accumulation while the button is held.
    fn on_event_freehand(&mut self, kind: ShapeKind, event: Event) -> Vec<ToolSignal> {
        match event {
            Event::Pressed(pos, Btn::Left) => {
                self.held = true;
                self.points = vec![pos];
                vec![]
            }
            Event::Moved(pos) if self.held => {
                self.points.push(pos);
                vec![ToolSignal::DrawingInProgress {
                    kind,
                    points: self.points.clone(),
                }]
            }
            Event::Released(_, Btn::Left) if self.held => {
                self.held = false;
                let points = mem::take(&mut self.points);
                vec![ToolSignal::DrawingDone { kind, points }]
            }
            _ => vec![],
        }
    }

    /// Two opposite corners via press and release.
    fn on_event_corner(&mut self, kind: ShapeKind, event: Event) -> Vec<ToolSignal> {
        match event {
            Event::Pressed(pos, Btn::Left) => {
                self.corner = Some(pos);
                vec![]
            }
            Event::Moved(pos) => match self.corner {
                Some(corner) => vec![ToolSignal::DrawingInProgress {
                    kind,
                    points: vec![corner, pos],
                }],
                None => vec![],
            },
            Event::Released(pos, Btn::Left) => match self.corner.take() {
                Some(corner) => vec![ToolSignal::DrawingDone {
                    kind,
                    points: vec![corner, pos],
                }],
                None => vec![],
            },
            _ => vec![],
        }
    }
}
