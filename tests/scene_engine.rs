use roomview::core::events::{SceneChange, SceneChangedEvent};
use roomview::core::image_cache::ImageCache;
use roomview::downcast_event;
use roomview::entities::compositor::{self, preview_size, PREVIEW_MAX};
use roomview::entities::keys::{A_FRAME_NO, A_POS_Y};
use roomview::entities::manifest::{find_room, load_rooms};
use roomview::entities::surface::DrawOp;
use roomview::entities::{
    AttrValue, Canvas, Image, LayerKind, MemoryLoader, RecordingSurface, Room, SceneBuilder, SceneError, Surface,
};
use roomview::Session;
use serde_json::{json, Value};

const RED: [u8; 4] = [255, 0, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];

fn loader() -> MemoryLoader {
    MemoryLoader::new()
        .with_image("img0", Image::solid(64, 16, RED))
        .with_image("bg.png", Image::solid(100, 80, BLUE))
        .with_image("fg.png", Image::solid(100, 80, [0, 255, 0, 255]))
}

fn room(value: Value) -> Room {
    Room::from_json(value).unwrap()
}

fn sheet() -> Value {
    json!({
        "frames": [[0, 0, 16, 16, 0, 0, 0], [16, 0, 16, 16, 0, 2, 4], [32, 0, 8, 8, 0]],
        "animations": {"a": {"frames": [0]}, "walk": {"frames": [0, 1, 2]}},
        "images": ["img0"]
    })
}

#[test]
fn end_to_end_single_placement() {
    let r = room(json!({
        "width": 100, "height": 80,
        "layout": {"playground": [{"id": "a", "x": 10, "y": 5, "regX": 0, "regY": 0}]},
        "spriteSheet": {"frames": [[0, 0, 16, 16, 0, 0, 0]], "animations": {"a": {"frames": [0]}}, "images": ["img0"]},
        "media": {}
    }));
    let l = loader();
    let mut cache = ImageCache::new(1);
    let scene = SceneBuilder::new(&l, &mut cache).build(&r).unwrap();

    assert_eq!(scene.len(), 2);
    assert_eq!(scene.layers()[0].kind(), LayerKind::Surface);
    let layer = &scene.layers()[1];
    assert_eq!(layer.get(A_FRAME_NO), Some(&AttrValue::Int(0)));
    assert_eq!((layer.frame_w(), layer.frame_h()), (16.0, 16.0));
    assert_eq!(layer.pos(), (10.0, 5.0));
}

#[test]
fn layer_count_and_y_order() {
    let r = room(json!({
        "width": 100, "height": 80,
        "spriteSheet": sheet(),
        "layout": {"playground": [
            {"id": "a", "x": 1, "y": 50},
            {"id": "a", "x": 2, "y": 10},
            {"id": "a", "x": 3, "y": 30}
        ]},
        "media": {"background": "bg.png", "foreground": "fg.png"}
    }));
    let l = loader();
    let mut cache = ImageCache::new(1);
    let scene = SceneBuilder::new(&l, &mut cache).build(&r).unwrap();
    // size + background + 3 placements + foreground
    assert_eq!(scene.len(), 6);

    let mut surface = RecordingSurface::new();
    compositor::render(&scene, &mut surface, &mut cache, &l);
    let ys: Vec<f32> = surface.draws().iter().map(|d| d.y).collect();
    assert_eq!(ys, vec![0.0, 10.0, 30.0, 50.0, 0.0]);
    assert_eq!(surface.ops[0], DrawOp::Resize { width: 100, height: 80 });
}

#[test]
fn unknown_animation_is_skipped() {
    let r = room(json!({
        "width": 20, "height": 20,
        "spriteSheet": sheet(),
        "layout": {"playground": [
            {"id": "a", "x": 0, "y": 1},
            {"id": "ghost", "x": 0, "y": 2},
            {"id": "walk", "x": 0, "y": 3}
        ]}
    }));
    let l = loader();
    let mut cache = ImageCache::new(1);
    let scene = SceneBuilder::new(&l, &mut cache).build(&r).unwrap();
    let names: Vec<&str> = scene.layers().iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, vec!["canvas", "a", "walk"]);
}

#[test]
fn hiding_a_layer_removes_its_pixels() {
    let mut session = Session::new(loader(), Canvas::default(), Canvas::default());
    session
        .switch_room(&room(json!({
            "width": 100, "height": 80,
            "spriteSheet": sheet(),
            "layout": {"playground": [{"id": "a", "x": 10, "y": 5}]},
            "media": {"background": "bg.png"}
        })))
        .unwrap();
    assert_eq!(session.surface().pixel(12, 7), Some(RED));
    assert_eq!(session.surface().pixel(50, 50), Some(BLUE));
    let before = session.scene().unwrap().layers()[1].clone();

    assert!(!session.toggle_visible(2).unwrap());
    assert_eq!(session.surface().pixel(12, 7), Some(BLUE));
    assert_eq!(session.surface().pixel(50, 50), Some(BLUE));
    assert_eq!(session.scene().unwrap().layers()[1], before);
}

#[test]
fn preview_box_clamps_both_ways() {
    assert_eq!(preview_size(800.0, 400.0, PREVIEW_MAX), (400.0, 200.0));
    assert_eq!(preview_size(100.0, 800.0, PREVIEW_MAX), (50.0, 400.0));
}

#[test]
fn shared_images_decode_once() {
    let l = loader();
    let mut session = Session::new(&l, RecordingSurface::new(), RecordingSurface::new());
    session
        .switch_room(&room(json!({
            "width": 50, "height": 50,
            "spriteSheet": sheet(),
            "layout": {"playground": [{"id": "a", "x": 0, "y": 0}, {"id": "walk", "x": 5, "y": 5}]}
        })))
        .unwrap();
    session.step().unwrap();
    session.recomposite();
    assert_eq!(l.image_loads(), 1);
    assert!(session.cache_stats().hits >= 4);
}

#[test]
fn failed_switch_keeps_previous_scene() {
    let mut session = Session::new(loader(), RecordingSurface::new(), RecordingSurface::new());
    session
        .switch_room(&room(json!({"width": 100, "height": 80, "media": {"background": "bg.png"}})))
        .unwrap();
    let layers: Vec<_> = session.scene().unwrap().layers().iter().map(|l| l.uuid).collect();

    let err = session
        .switch_room(&room(json!({
            "width": 10, "height": 10,
            "spriteSheet": {"frames": [], "animations": {}, "images": ["missing.png"]},
            "layout": {"playground": [{"id": "a", "x": 0, "y": 0}]}
        })))
        .unwrap_err();
    assert!(matches!(err, SceneError::AssetResolution(_)));
    let after: Vec<_> = session.scene().unwrap().layers().iter().map(|l| l.uuid).collect();
    assert_eq!(after, layers);
    assert_eq!(session.surface().size(), (100, 80));

    // Late load from the abandoned build is dropped; current generation is accepted
    assert!(!session.accept_loaded(2, "late.png", Image::solid(1, 1, RED)));
    assert!(session.accept_loaded(session.generation(), "late.png", Image::solid(1, 1, RED)));
}

#[test]
fn stepping_advances_only_activated_layers() {
    let mut session = Session::new(loader(), RecordingSurface::new(), RecordingSurface::new());
    session
        .switch_room(&room(json!({
            "width": 100, "height": 80,
            "spriteSheet": sheet(),
            "layout": {"playground": [{"id": "walk", "x": 20, "y": 20}, {"id": "walk", "x": 40, "y": 40}]}
        })))
        .unwrap();
    session.edit_field(1, A_FRAME_NO, AttrValue::Int(1)).unwrap();
    session.bus().poll();

    assert_eq!(session.step().unwrap(), 1);
    let scene = session.scene().unwrap();
    let walker = &scene.layers()[1];
    assert_eq!(walker.frame_no(), 2);
    assert_eq!(walker.crop().x, 32.0);
    assert_eq!(walker.frame_w(), 8.0);
    assert_eq!(scene.layers()[2].frame_no(), 0);

    let events = session.bus().poll();
    let change = events.iter().find_map(downcast_event::<SceneChangedEvent>).map(|e| e.change.clone());
    assert_eq!(change, Some(SceneChange::FramesAdvanced { advanced: 1 }));

    // Three more steps wrap 2 -> 5, 5 mod 3 = 2
    for _ in 0..3 {
        session.step().unwrap();
    }
    let walker = &session.scene().unwrap().layers()[1];
    assert_eq!(walker.frame_no(), 5);
    assert_eq!(walker.crop().x, 32.0);
}

#[test]
fn registration_moves_destination_not_crop() {
    let mut session = Session::new(loader(), RecordingSurface::new(), RecordingSurface::new());
    session
        .switch_room(&room(json!({
            "width": 100, "height": 80,
            "spriteSheet": sheet(),
            "layout": {"playground": [{"id": "walk", "x": 20, "y": 30, "regX": 1, "regY": 1}]}
        })))
        .unwrap();
    // frame 1 carries registration (2, 4)
    session.edit_field(1, A_FRAME_NO, AttrValue::Int(1)).unwrap();
    let last = session.surface().ops.last().cloned();
    assert_eq!(
        last,
        Some(DrawOp::Region {
            src: roomview::entities::Rect::new(16.0, 0.0, 16.0, 16.0),
            dst: roomview::entities::Rect::new(20.0 - 1.0 - 2.0, 30.0 - 1.0 - 4.0, 16.0, 16.0),
            opacity: 1.0
        })
    );
}

#[test]
fn reorder_and_edit_through_session() {
    let mut session = Session::new(loader(), RecordingSurface::new(), RecordingSurface::new());
    session
        .switch_room(&room(json!({
            "width": 100, "height": 80,
            "spriteSheet": sheet(),
            "layout": {"playground": [{"id": "a", "x": 0, "y": 0}, {"id": "walk", "x": 0, "y": 10}]},
            "media": {"background": "bg.png", "navMesh": "bg.png", "treasure": "fg.png"}
        })))
        .unwrap();
    // canvas, background, a, walk, navMesh, treasure; movable: background, a, walk
    session.reorder_rows(&[2, 0, 1]).unwrap();
    let names: Vec<String> = session.scene().unwrap().layers().iter().map(|l| l.name.clone()).collect();
    assert_eq!(names, vec!["canvas", "walk", "background", "a", "navMesh", "treasure"]);

    session.edit_field_text(3, A_POS_Y, "12.5").unwrap();
    assert_eq!(session.scene().unwrap().layers()[3].pos().1, 12.5);
    assert!(matches!(session.edit_field_text(3, "frameX", "1"), Err(SceneError::DerivedField(_))));
    assert!(session.reorder_rows(&[0, 1]).is_err());
}

#[test]
fn rooms_from_manifest() {
    let l = loader()
        .with_json("manifest.json", json!({"rooms": {"src": "rooms.json"}}))
        .with_json(
            "rooms.json",
            json!([
                {"id": "cellar", "width": 30, "height": 20, "media": {"background": "bg.png"}},
                {"roomId": "attic", "name": "The Attic", "width": 10, "height": 10}
            ]),
        );
    let rooms = load_rooms(&l, "manifest.json").unwrap();
    let entry = find_room(&rooms, "cellar").unwrap();
    assert_eq!(entry.name, "cellar");

    let mut session = Session::new(&l, RecordingSurface::new(), RecordingSurface::new());
    session.switch_room(&entry.room).unwrap();
    assert_eq!(session.surface().size(), (30, 20));
    assert_eq!(find_room(&rooms, "attic").map(|r| r.name.as_str()), Some("The Attic"));
}
