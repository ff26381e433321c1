pub mod carousel;
pub mod field;
pub mod pane;
pub mod particles;
pub mod row;
pub mod scrollbar;
pub mod slider;
pub mod text;

pub use carousel::{CarouselConfig, PaneCarousel};
pub use field::PaneField;
pub use pane::Pane;
pub use particles::Particles;
pub use row::Row;
pub use scrollbar::Scrollbar;
pub use slider::{PaneSlider, SliderConfig};
pub use text::Text3D;
