use seglab_domain::PtF;

/// Pointer button of interest. Middle clicks and wheel belong to the
/// viewer's zoom/pan layer, they never reach the annotation engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Btn {
    Left,
    Right,
}

/// Abstract pointer event in scene coordinates. The window layer maps its
/// toolkit events to this alphabet, the engine never sees the toolkit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Event {
    Pressed(PtF, Btn),
    Moved(PtF),
    Released(PtF, Btn),
}

impl Event {
    pub fn pos(&self) -> PtF {
        match self {
            Event::Pressed(p, _) | Event::Moved(p) | Event::Released(p, _) => *p,
        }
    }
}
