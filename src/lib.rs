pub mod atlas_material;
pub mod camera;
pub mod config;
pub mod depth;
pub mod error;
pub mod events;
pub mod input;
pub mod range;
pub mod renderer;
pub mod tilesheet;
pub mod tilesheets;
pub mod window;

pub use atlas_material::AtlasMaterial;
pub use config::{TilesheetsConfig, available_tilesets, load_tilesheets};
pub use depth::compute_depth;
pub use error::{DrawReport, TilesheetError};
pub use events::{PlaceSpritesEvent, place_sprites};
pub use range::{SpriteRange, parse_range};
pub use tilesheet::{Tilesheet, TilesheetDescriptor};
pub use tilesheets::{AnimatedDraw, FallbackDraw, SpriteDraw, Tilesheets};
