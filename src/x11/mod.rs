pub mod backend;
pub mod events;
pub mod renderer;
pub mod selection;
pub mod surface;

pub use surface::X11Surface;
