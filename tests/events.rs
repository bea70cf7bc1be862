/// Placing a backend sprite payload into tilesheets.
use glam::{UVec2, Vec2};
use image::RgbaImage;
use tilesheets::events::GridPosition;
use tilesheets::tilesheet::OccupancyKey;
use tilesheets::{
    PlaceSpritesEvent, SpriteDraw, SpriteRange, Tilesheet, TilesheetDescriptor, TilesheetError,
    Tilesheets, place_sprites,
};

const TILE: u32 = 8;

fn sheets() -> Tilesheets {
    let terrain = Tilesheet::new(
        TilesheetDescriptor::new("terrain.png").with_range(SpriteRange::new(0, 9).unwrap()),
        RgbaImage::new(10 * TILE, TILE),
        UVec2::splat(TILE),
        16,
    );
    let fallback = Tilesheet::new(
        TilesheetDescriptor::new("fallback.png"),
        RgbaImage::new(16 * TILE, 16 * TILE),
        UVec2::splat(TILE),
        16,
    );
    Tilesheets::new(UVec2::splat(TILE), vec![terrain], fallback).unwrap()
}

const PAYLOAD: &str = r#"{
    "static_sprites": [
        { "position": "0,0", "index": 1, "layer": 0, "z": 0 },
        { "position": "1,0", "index": 2, "layer": 1, "z": 0, "rotate_deg": 90 },
        { "position": "1,0", "index": 3, "layer": 0, "z": 1 }
    ],
    "animated_sprites": [
        { "position": "2,2", "indices": [4, 5], "layer": 2, "z": 0 }
    ],
    "fallback_sprites": [
        { "position": "3,1", "index": 64, "z": 0 },
        { "position": "3,2", "index": 64, "z": -1 }
    ]
}"#;

#[test]
fn places_only_the_visible_level() {
    let mut sheets = sheets();
    let event = PlaceSpritesEvent::from_json(PAYLOAD).unwrap();

    let report = place_sprites(Some(&mut sheets), &event).unwrap();
    assert!(report.is_clean());
    assert_eq!(report.drawn, 3);
    assert_eq!(sheets.sheet("terrain.png").unwrap().mapped_count(), 2);
    assert_eq!(sheets.fallback().mapped_count(), 1);
    assert_eq!(sheets.animated_sprites().len(), 1);
}

#[test]
fn grid_positions_become_world_pixels() {
    let mut sheets = sheets();
    let event = PlaceSpritesEvent::from_json(PAYLOAD).unwrap();
    place_sprites(Some(&mut sheets), &event).unwrap();

    let terrain = sheets.sheet("terrain.png").unwrap();
    let key = OccupancyKey { x: TILE as i32, y: 0, layer: 1 };
    let slot = terrain.slot_of(key).unwrap();
    let instance = terrain.instance(slot).unwrap();
    assert_eq!(instance.position[0], TILE as f32);
    assert!((instance.rotation - std::f32::consts::FRAC_PI_2).abs() < 1e-6);

    let fallback_key = OccupancyKey { x: 3 * TILE as i32, y: -(TILE as i32), layer: 0 };
    assert!(sheets.fallback().slot_of(fallback_key).is_some());
}

#[test]
fn switching_level_then_replacing_shows_that_level() {
    let mut sheets = sheets();
    let event = PlaceSpritesEvent::from_json(PAYLOAD).unwrap();
    place_sprites(Some(&mut sheets), &event).unwrap();

    assert!(sheets.switch_z_level(1));
    let report = place_sprites(Some(&mut sheets), &event).unwrap();
    assert_eq!(report.drawn, 1);
    assert_eq!(sheets.mapped_count(), 1);
    assert!(sheets.animated_sprites().is_empty());
}

#[test]
fn grid_rows_grow_downward_in_world_space() {
    let mut sheets = sheets();
    let world = GridPosition(UVec2::new(2, 3)).to_world(sheets.tile_size());
    assert_eq!(world, Vec2::new(2.0 * TILE as f32, -3.0 * TILE as f32));

    let sprite = SpriteDraw { position: world, index: 1, layer: 0, rotation_deg: 0.0 };
    assert!(sheets.draw_static_sprites_batched(&[sprite]).is_clean());

    // A y-down position lands above the map and is skipped.
    let flipped = SpriteDraw { position: Vec2::new(world.x, -world.y), ..sprite };
    let report = sheets.draw_static_sprites_batched(&[flipped]);
    assert!(matches!(report.skipped[0], TilesheetError::DepthOutOfBounds { row: -3, .. }));
}
