use std::path::PathBuf;

use crate::config::TilesheetsConfig;
use crate::error::TilesheetError;
use crate::tilesheet::DEFAULT_MAX_INSTANCES;

// ── ViewerConfig ──────────────────────────────────────────────────────────────

/// Startup configuration of the viewer binary.
///
/// Built from the command line:
/// ```text
/// tilesheet-viewer <tileset_dir> [sprites.json] [--size WxH] [--max-instances N]
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ViewerConfig {
    pub title: String,
    /// Window width in physical pixels.
    pub width: u32,
    /// Window height in physical pixels.
    pub height: u32,
    /// Directory holding `tile_config.json` and its spritesheets.
    pub tileset_dir: PathBuf,
    /// Optional `PlaceSpritesEvent` JSON drawn at startup.
    pub sprites_path: Option<PathBuf>,
    /// Instance pool size of every tilesheet.
    pub max_instances: u32,
}

impl ViewerConfig {
    /// 1280 × 720 window, default pool size, no sprites file.
    pub fn new(tileset_dir: impl Into<PathBuf>) -> Self {
        Self {
            title: "Tilesheet Viewer".to_string(),
            width: 1280,
            height: 720,
            tileset_dir: tileset_dir.into(),
            sprites_path: None,
            max_instances: DEFAULT_MAX_INSTANCES,
        }
    }

    /// Parse arguments (without the program name).
    pub fn from_args<I, S>(args: I) -> Result<Self, TilesheetError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut positional = Vec::new();
        let mut size = None;
        let mut max_instances = None;

        let mut args = args.into_iter().map(Into::into);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--size" => {
                    let value = args.next().ok_or_else(|| missing_value("--size"))?;
                    size = Some(parse_size(&value)?);
                }
                "--max-instances" => {
                    let value = args.next().ok_or_else(|| missing_value("--max-instances"))?;
                    let n: u32 = value.parse().map_err(|_| {
                        TilesheetError::InvalidArgument(format!("bad instance count '{value}'"))
                    })?;
                    if n == 0 {
                        return Err(TilesheetError::InvalidArgument(
                            "--max-instances must be positive".to_string(),
                        ));
                    }
                    max_instances = Some(n);
                }
                flag if flag.starts_with("--") => {
                    return Err(TilesheetError::InvalidArgument(format!("unknown flag '{flag}'")));
                }
                _ => positional.push(arg),
            }
        }

        let mut positional = positional.into_iter();
        let tileset_dir = positional.next().ok_or_else(|| {
            TilesheetError::InvalidArgument("usage: tilesheet-viewer <tileset_dir> [sprites.json]".to_string())
        })?;

        let mut config = Self::new(tileset_dir);
        config.sprites_path = positional.next().map(PathBuf::from);
        if let Some((w, h)) = size {
            config.width = w;
            config.height = h;
        }
        if let Some(n) = max_instances {
            config.max_instances = n;
        }
        Ok(config)
    }

    pub fn tilesheets_config(&self) -> TilesheetsConfig {
        TilesheetsConfig {
            tileset_dir: self.tileset_dir.clone(),
            max_instances: self.max_instances,
        }
    }
}

fn missing_value(flag: &str) -> TilesheetError {
    TilesheetError::InvalidArgument(format!("{flag} needs a value"))
}

fn parse_size(value: &str) -> Result<(u32, u32), TilesheetError> {
    let invalid = || TilesheetError::InvalidArgument(format!("bad window size '{value}'"));
    let (w, h) = value.split_once('x').ok_or_else(invalid)?;
    let w: u32 = w.parse().map_err(|_| invalid())?;
    let h: u32 = h.parse().map_err(|_| invalid())?;
    if w == 0 || h == 0 {
        return Err(invalid());
    }
    Ok((w, h))
}
