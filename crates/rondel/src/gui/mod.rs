pub mod app;
pub mod editor;
pub mod theme;
pub mod view;
pub mod window;
