// ============================================================================
// PAINTBOX — raster paint engine
// ============================================================================
//
// Library surface: canvas buffer and geometry, tool state machine, bounded
// undo/redo, selections, clipboard, transforms, shape/text rasterization and
// the AI generation worker. Everything is headless; a GUI shell drives it
// through pointer events and the command channel.

pub mod canvas;
pub mod cli;
pub mod components;
pub mod config;
pub mod io;
pub mod ops;

pub use canvas::{PixelRect, Surface};
pub use components::history::HistoryManager;
pub use components::selection::{FreeformSelection, RectSelection};
pub use components::tools::{
    CloseDecision, Editor, EditorState, PointerButton, Tool, ToolCommand,
};
