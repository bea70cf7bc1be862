use std::path::PathBuf;

use tilesheets::TilesheetError;
use tilesheets::tilesheet::DEFAULT_MAX_INSTANCES;
use tilesheets::window::ViewerConfig;

#[test]
fn default_is_1280x720_with_default_pool() {
    let cfg = ViewerConfig::new("gfx/retro");
    assert_eq!(cfg.width, 1280);
    assert_eq!(cfg.height, 720);
    assert_eq!(cfg.max_instances, DEFAULT_MAX_INSTANCES);
    assert_eq!(cfg.sprites_path, None);
}

#[test]
fn positional_args_are_tileset_then_sprites() {
    let cfg = ViewerConfig::from_args(["gfx/retro", "map.json"]).unwrap();
    assert_eq!(cfg.tileset_dir, PathBuf::from("gfx/retro"));
    assert_eq!(cfg.sprites_path, Some(PathBuf::from("map.json")));
}

#[test]
fn flags_override_defaults() {
    let cfg = ViewerConfig::from_args(["--size", "800x600", "gfx", "--max-instances", "4096"]).unwrap();
    assert_eq!((cfg.width, cfg.height), (800, 600));
    assert_eq!(cfg.max_instances, 4096);
    assert_eq!(cfg.tileset_dir, PathBuf::from("gfx"));
}

#[test]
fn tilesheets_config_follows_viewer_config() {
    let cfg = ViewerConfig::from_args(["gfx", "--max-instances", "10"]).unwrap();
    let sheets = cfg.tilesheets_config();
    assert_eq!(sheets.tileset_dir, PathBuf::from("gfx"));
    assert_eq!(sheets.max_instances, 10);
}

#[test]
fn missing_tileset_is_rejected() {
    let result = ViewerConfig::from_args(Vec::<String>::new());
    assert!(matches!(result, Err(TilesheetError::InvalidArgument(_))));
}

#[test]
fn bad_values_are_rejected() {
    for args in [
        vec!["gfx", "--size", "800"],
        vec!["gfx", "--size", "0x600"],
        vec!["gfx", "--size"],
        vec!["gfx", "--max-instances", "0"],
        vec!["gfx", "--max-instances", "lots"],
        vec!["gfx", "--fullscreen"],
    ] {
        assert!(
            matches!(ViewerConfig::from_args(args.clone()), Err(TilesheetError::InvalidArgument(_))),
            "{args:?} was accepted"
        );
    }
}
