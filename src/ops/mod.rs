pub mod ai;
pub mod clipboard;
pub mod print;
pub mod shapes;
pub mod text;
pub mod transform;
