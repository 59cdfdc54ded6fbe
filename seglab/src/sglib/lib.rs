pub mod cfg;
pub mod db;
mod events;
pub mod file_util;
mod hit;
mod session;
mod shape;
pub mod tools;
pub mod tracing_setup;
mod vertices;

pub use db::AnnotationDb;
pub use events::{Btn, Event};
pub use hit::{resolve, Hit, VertexRef};
pub use seglab_domain::result::{to_sl, trace_ok_err, trace_ok_warn};
pub use seglab_domain::{slerr, BbF, Point, PtF, ShapeI, SlError, SlResult};
pub use session::Session;
pub use shape::{Shape, ShapeKind, ShapeRecord, FILL_ALPHA};
pub use tools::{Mode, ToolSignal, Workbench, CLOSING_TOL};
pub use vertices::{VertexState, VERTEX_SIZE};
