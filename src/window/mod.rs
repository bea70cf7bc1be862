pub mod config;

pub use config::ViewerConfig;

use winit::dpi::PhysicalSize;
use winit::window::{Window, WindowAttributes};

/// Window attributes for `config`: titled, resizable, at the requested
/// physical size.
pub fn window_attributes(config: &ViewerConfig) -> WindowAttributes {
    Window::default_attributes()
        .with_title(&config.title)
        .with_inner_size(PhysicalSize::new(config.width, config.height))
        .with_resizable(true)
}
