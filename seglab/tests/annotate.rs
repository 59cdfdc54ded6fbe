use sglib::{
    tracing_setup::init_tracing_for_tests, AnnotationDb, Btn, Event, Mode, PtF, Session, ShapeI,
    ShapeKind, ToolSignal, Workbench,
};

fn pt(x: f64, y: f64) -> PtF {
    PtF { x, y }
}

fn click(pos: PtF) -> [Event; 2] {
    [Event::Pressed(pos, Btn::Left), Event::Released(pos, Btn::Left)]
}

fn palette() -> Vec<(String, [u8; 3])> {
    vec![
        ("tumour".to_string(), [220, 20, 60]),
        ("bubbles".to_string(), [30, 144, 255]),
    ]
}

/// Draw a polygon click by click, close it on the first point, label it and
/// persist, then reload and verify what the renderer would see.
#[test]
fn test_draw_polygon_and_reload() {
    init_tracing_for_tests();
    let mut db = AnnotationDb::open_in_memory().unwrap();
    let mut session = Session::new("images/a.png", ShapeI::new(640, 480), palette());
    let mut workbench = Workbench::default();
    workbench.set_mode(Mode::Create(ShapeKind::Polygon));

    let mut done = None;
    for pos in [
        pt(100.0, 100.0),
        pt(200.0, 100.0),
        pt(200.0, 200.0),
        pt(100.0, 200.0),
        // close by clicking within the on-beginning square of the first point
        pt(102.0, 98.0),
    ] {
        for ev in click(pos) {
            for signal in workbench.on_event(ev, session.shapes()) {
                if let ToolSignal::DrawingDone { kind, points } = signal {
                    done = Some((kind, points));
                }
            }
        }
    }
    let (kind, points) = done.expect("the polygon should have closed");
    assert_eq!(kind, ShapeKind::Polygon);
    assert_eq!(points.len(), 4);
    session.add_shape(kind, points, "tumour").unwrap();
    session.save(&mut db).unwrap();

    workbench.set_mode(Mode::Edit);
    let session = Session::load(&db, "images/a.png", ShapeI::new(640, 480), palette()).unwrap();
    assert_eq!(session.shapes().len(), 1);
    let shape = &session.shapes()[0];
    assert_eq!(shape.kind(), ShapeKind::Polygon);
    assert_eq!(shape.label(), Some("tumour"));
    assert_eq!(shape.line_color(), [220, 20, 60]);
    assert_eq!(shape.fill_color()[3], sglib::FILL_ALPHA);
    assert!(shape.contains(pt(150.0, 150.0)));
    assert!(!shape.contains(pt(250.0, 150.0)));
    assert_eq!(
        db.images_with_classes(&["tumour", "bubbles"]).unwrap(),
        vec!["images/a.png"]
    );
}

/// Rectangle drag-resize scenario: corners (0,0)-(10,10), the corner nearest
/// to (10,10) dragged to (20,20) with the anchor fixed at (0,0).
#[test]
fn test_rectangle_drag_resize() {
    init_tracing_for_tests();
    let mut session = Session::new("images/b.png", ShapeI::new(100, 100), palette());
    session
        .add_shape(
            ShapeKind::Rectangle,
            vec![pt(0.0, 0.0), pt(10.0, 10.0)],
            "bubbles",
        )
        .unwrap();
    let mut workbench = Workbench::default();
    // grab the corner handle right outside the body so the press resolves
    // to the vertex, a press on the body would move the whole shape
    for ev in [
        Event::Pressed(pt(11.0, 11.0), Btn::Left),
        Event::Moved(pt(14.0, 14.0)),
        Event::Moved(pt(20.0, 20.0)),
        Event::Released(pt(20.0, 20.0), Btn::Left),
    ] {
        for signal in workbench.on_event(ev, session.shapes()) {
            session.apply(&signal);
        }
    }
    let shape = &session.shapes()[0];
    assert_eq!(shape.points().len(), 4);
    let bb = shape.bounding_box();
    assert_eq!((bb.x, bb.y, bb.x_max(), bb.y_max()), (0.0, 0.0, 20.0, 20.0));
}

/// Freehand trace into persistence, end to end.
#[test]
fn test_trace_draw_and_persist() {
    init_tracing_for_tests();
    let mut db = AnnotationDb::open_in_memory().unwrap();
    let mut session = Session::new("images/c.png", ShapeI::new(100, 100), palette());
    let mut workbench = Workbench::default();
    workbench.set_mode(Mode::Create(ShapeKind::Trace));

    let mut done = None;
    let mut previews = 0;
    let mut events = vec![Event::Pressed(pt(10.0, 10.0), Btn::Left)];
    events.extend((1..=5).map(|i| Event::Moved(pt(10.0 + i as f64 * 2.0, 10.0 + i as f64))));
    events.push(Event::Released(pt(20.0, 15.0), Btn::Left));
    for ev in events {
        for signal in workbench.on_event(ev, session.shapes()) {
            match signal {
                ToolSignal::DrawingInProgress { .. } => previews += 1,
                ToolSignal::DrawingDone { kind, points } => done = Some((kind, points)),
                _ => {}
            }
        }
    }
    assert_eq!(previews, 5);
    let (kind, points) = done.unwrap();
    assert_eq!(kind, ShapeKind::Trace);
    assert_eq!(points.len(), 6);
    session.add_shape(kind, points, "bubbles").unwrap();
    session.save(&mut db).unwrap();
    let records = db.get_labels("images/c.png").unwrap();
    assert_eq!(records[0].shape_type, ShapeKind::Trace);
    assert_eq!(records[0].points.len(), 6);
}
