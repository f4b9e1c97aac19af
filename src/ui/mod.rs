pub mod blossoms;
pub mod icons;
pub mod render;
pub mod wayland;
