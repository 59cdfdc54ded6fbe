use seglab_domain::PtF;

use crate::{
    events::{Btn, Event},
    hit::{resolve, Hit},
    shape::Shape,
};

use super::ToolSignal;

/// Edit-mode press/drag bookkeeping. The hit resolved at press time stays
/// authoritative for the whole drag, the pointer may leave the shape while
/// dragging fast.
#[derive(Debug, Default)]
pub(super) struct EditState {
    last_point: Option<PtF>,
    pressed: Option<Hit>,
}

impl EditState {
    pub(super) fn clear(&mut self) {
        self.last_point = None;
        self.pressed = None;
    }

    pub(super) fn on_event(&mut self, event: Event, shapes: &[Shape]) -> Vec<ToolSignal> {
        match event {
            Event::Pressed(pos, Btn::Left) => {
                let hit = resolve(pos, shapes);
                self.last_point = Some(pos);
                self.pressed = Some(hit);
                vec![ToolSignal::ShapeSelected(hit)]
            }
            Event::Pressed(pos, Btn::Right) => shapes
                .iter()
                .position(Shape::is_selected)
                .map(|shape_idx| vec![ToolSignal::ContextMenu { pos, shape_idx }])
                .unwrap_or_default(),
            Event::Moved(pos) => match &self.pressed {
                Some(hit) => {
                    if let Some(shape_idx) = hit.hovered {
                        let last = self.last_point.unwrap_or(pos);
                        self.last_point = Some(pos);
                        vec![ToolSignal::MoveShape {
                            shape_idx,
                            displacement: last - pos,
                        }]
                    } else if let Some(vertex) = hit.vertex {
                        vec![ToolSignal::MoveVertex { vertex, pos }]
                    } else {
                        vec![]
                    }
                }
                None => {
                    let hit = resolve(pos, shapes);
                    vec![ToolSignal::ShapeHovered(hit)]
                }
            },
            Event::Released(_, Btn::Left) => {
                let signals = self
                    .pressed
                    .as_ref()
                    .and_then(|hit| hit.vertex)
                    .map(|vertex| {
                        vec![ToolSignal::AnchorReset {
                            shape_idx: vertex.shape_idx,
                        }]
                    })
                    .unwrap_or_default();
                self.clear();
                signals
            }
            Event::Released(_, Btn::Right) => vec![],
        }
    }
}
