/// Loading a tileset directory from disk: `tile_config.json` plus PNG sheets.
use std::fs;
use std::path::Path;

use glam::{UVec2, Vec2};
use image::RgbaImage;
use tilesheets::config::TILE_CONFIG_FILE;
use tilesheets::tilesheets::Route;
use tilesheets::{TilesheetError, TilesheetsConfig, available_tilesets, load_tilesheets};

const CONFIG: &str = r#"{
    "tile_info": [{ "pixelscale": 1, "width": 16, "height": 16, "iso": false }],
    "tiles-new": [
        { "file": "terrain.png", "//": "range 1 to 63", "tiles": [] },
        {
            "file": "tall.png",
            "//": "range 64 to 95",
            "sprite_width": 16, "sprite_height": 32,
            "sprite_offset_x": 0, "sprite_offset_y": -16,
            "tiles": []
        },
        {
            "file": "fallback.png",
            "tiles": [],
            "ascii": [{ "offset": 0, "bold": false, "color": "WHITE" }]
        }
    ]
}"#;

fn write_png(path: &Path, width: u32, height: u32) {
    RgbaImage::new(width, height).save(path).unwrap();
}

fn write_tileset(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(TILE_CONFIG_FILE), CONFIG).unwrap();
    write_png(&dir.join("terrain.png"), 16 * 8, 16 * 8);
    write_png(&dir.join("tall.png"), 16 * 8, 32 * 4);
    write_png(&dir.join("fallback.png"), 16 * 16, 16 * 16);
}

#[test]
fn loads_every_sheet_of_a_tileset() {
    let tmp = tempfile::tempdir().unwrap();
    write_tileset(tmp.path());

    let mut config = TilesheetsConfig::new(tmp.path());
    config.max_instances = 32;
    let sheets = load_tilesheets(&config).unwrap();

    assert_eq!(sheets.tile_size(), Vec2::new(16.0, 16.0));
    assert_eq!(sheets.sheets().len(), 2);
    assert_eq!(sheets.fallback().name(), "fallback.png");

    let terrain = sheets.sheet("terrain.png").unwrap();
    assert_eq!(terrain.material().tile_count(), 64);
    assert_eq!(terrain.max_instances(), 32);

    let tall = sheets.sheet("tall.png").unwrap();
    assert_eq!(tall.material().tile_size(), UVec2::new(16, 32));
    assert_eq!(tall.material().tile_count(), 32);
}

#[test]
fn first_range_is_widened_to_zero() {
    let tmp = tempfile::tempdir().unwrap();
    write_tileset(tmp.path());
    let sheets = load_tilesheets(&TilesheetsConfig::new(tmp.path())).unwrap();

    assert_eq!(sheets.route(0), Route::Sheet(0));
    assert_eq!(sheets.route(70), Route::Sheet(1));
    assert_eq!(sheets.route(96), Route::Fallback);
}

#[test]
fn missing_image_is_reported_with_its_path() {
    let tmp = tempfile::tempdir().unwrap();
    write_tileset(tmp.path());
    fs::remove_file(tmp.path().join("tall.png")).unwrap();

    match load_tilesheets(&TilesheetsConfig::new(tmp.path())) {
        Err(TilesheetError::Image { path, .. }) => assert!(path.ends_with("tall.png")),
        Err(e) => panic!("unexpected error: {e}"),
        Ok(_) => panic!("loaded a tileset with a missing sheet"),
    }
}

#[test]
fn missing_config_is_an_io_error() {
    let tmp = tempfile::tempdir().unwrap();
    let result = load_tilesheets(&TilesheetsConfig::new(tmp.path()));
    assert!(matches!(result, Err(TilesheetError::Io { .. })));
}

#[test]
fn malformed_config_is_a_json_error() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join(TILE_CONFIG_FILE), "{ not json").unwrap();
    let result = load_tilesheets(&TilesheetsConfig::new(tmp.path()));
    assert!(matches!(result, Err(TilesheetError::Json(_))));
}

#[test]
fn lists_tilesets_below_the_gfx_root() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    write_tileset(&root.join("retro"));
    write_tileset(&root.join("packs").join("hd"));
    fs::create_dir_all(root.join("empty")).unwrap();

    let found = available_tilesets(root);
    assert_eq!(found, vec![root.join("packs").join("hd"), root.join("retro")]);
}
