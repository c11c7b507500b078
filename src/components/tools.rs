// ============================================================================
// TOOL STATE MACHINE — pointer events, drafts, zoom, editor facade
// ============================================================================
//
// The `Editor` owns the surface, the explicit `EditorState` (active tool,
// colors, widths — no GUI-bound globals) and the history manager. UI
// collaborators never mutate state directly: they enqueue `ToolCommand`
// values which the editor drains synchronously, and they feed pointer events
// already expressed in *display* coordinates; the editor divides by the
// current zoom before any tool logic runs.

use std::collections::VecDeque;

use ab_glyph::FontArc;
use image::{Rgba, RgbaImage};

use crate::canvas::{PixelRect, Surface, TRANSPARENT, WHITE};
use crate::components::history::HistoryManager;
use crate::components::selection::{FreeformSelection, RectSelection};
use crate::ops::clipboard::{
    build_paste, payload_from_freeform, payload_from_rect, ClipboardPayload, PastedSelection,
};
use crate::ops::shapes::{
    draw_curve, draw_ellipse, draw_line, draw_polygon, draw_rectangle, draw_rounded_rectangle,
    stamp_disc, ShapeFillMode, CURVE_PREVIEW_SAMPLES_PER_SEGMENT, CURVE_SAMPLES_PER_SEGMENT,
};
use crate::ops::text::{draw_text, TextStyle};
use crate::ops::transform::{flip_image, rotate_image, scale_image, skew_image, FlipAxis};

// ---------------------------------------------------------------------------
//  Constants
// ---------------------------------------------------------------------------

/// Discrete display zoom factors, walked index-wise by the magnifier.
pub const ZOOM_STEPS: [f32; 7] = [0.2, 0.25, 0.333, 0.5, 1.0, 2.0, 3.0];
/// Index of 1.0 in [`ZOOM_STEPS`].
pub const DEFAULT_ZOOM_INDEX: usize = 4;

/// Second click within this window counts as a double click.
pub const DOUBLE_CLICK_MS: u64 = 300;

/// Airbrush timer period while the button is held.
pub const AIRBRUSH_TICK_MS: u64 = 50;
/// Dots scattered per airbrush tick.
pub const AIRBRUSH_DOTS_PER_TICK: u32 = 15;
/// Spray radius as a multiple of the pen width.
pub const AIRBRUSH_RADIUS_FACTOR: f32 = 8.0;

/// Brush stroke width as a multiple of the pencil width.
pub const BRUSH_WIDTH_FACTOR: f32 = 3.0;

/// Half-size of the square canvas-resize hotspots, in image pixels.
pub const RESIZE_HANDLE_HALF: i32 = 6;

/// Default corner radius for the rounded-rectangle tool.
const ROUNDED_RECT_RADIUS: f32 = 8.0;

// ---------------------------------------------------------------------------
//  Core enums
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Tool {
    #[default]
    Pencil,
    Brush,
    Eraser,
    Fill,
    Eyedropper,
    Airbrush,
    Text,
    Line,
    Curve,
    Rectangle,
    Polygon,
    Ellipse,
    RoundedRectangle,
    RectSelect,
    FreeformSelect,
    Magnifier,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
}

/// Canvas-resize drag hotspots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResizeHandle {
    Right,
    Bottom,
    Corner,
}

/// Outcome of the unsaved-changes confirmation a shell runs on close.
/// `CancelClose` must abort the close entirely.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloseDecision {
    SaveThenClose,
    DiscardAndClose,
    CancelClose,
}

/// Commands collaborators enqueue; drained synchronously by
/// [`Editor::process_commands`].
#[derive(Clone, Debug)]
pub enum ToolCommand {
    SetTool(Tool),
    SetForeground(Rgba<u8>),
    SetBackground(Rgba<u8>),
    SetPenWidth(f32),
    SetFillMode(ShapeFillMode),
    SetTextStyle(TextStyle),
    ZoomIn,
    ZoomOut,
}

/// Outbound notifications for collaborators (e.g. the color panel follows
/// eyedropper picks).
#[derive(Clone, Debug, PartialEq)]
pub enum EditorNotice {
    ColorPicked(Rgba<u8>),
}

// ---------------------------------------------------------------------------
//  Editor state
// ---------------------------------------------------------------------------

/// All tool-relevant state, explicit and in one place.
#[derive(Clone, Debug)]
pub struct EditorState {
    pub tool: Tool,
    pub foreground: Rgba<u8>,
    pub background: Rgba<u8>,
    pub pen_width: f32,
    pub fill_mode: ShapeFillMode,
    pub text_style: TextStyle,
    pub zoom_index: usize,
}

impl Default for EditorState {
    fn default() -> Self {
        Self {
            tool: Tool::Pencil,
            foreground: crate::canvas::BLACK,
            background: WHITE,
            pen_width: 1.0,
            fill_mode: ShapeFillMode::Outline,
            text_style: TextStyle::default(),
            zoom_index: DEFAULT_ZOOM_INDEX,
        }
    }
}

impl EditorState {
    pub fn zoom(&self) -> f32 {
        ZOOM_STEPS[self.zoom_index.min(ZOOM_STEPS.len() - 1)]
    }
}

// ---------------------------------------------------------------------------
//  Drafts
// ---------------------------------------------------------------------------

/// Vertices of an in-progress polygon; discarded on commit or cancel.
struct PolygonDraft {
    points: Vec<(i32, i32)>,
    button: PointerButton,
    /// Surface as it was before the draft started; previews restore this.
    base: Surface,
}

/// Control points of an in-progress curve.
struct CurveDraft {
    points: Vec<(f32, f32)>,
    button: PointerButton,
    base: Surface,
}

/// Uncommitted text entry anchored at the click point.
struct TextDraft {
    anchor: (i32, i32),
    text: String,
    button: PointerButton,
}

/// What the pointer is currently dragging.
enum DragOp {
    None,
    Stroke {
        last: (f32, f32),
        button: PointerButton,
    },
    Airbrush {
        center: (f32, f32),
        button: PointerButton,
        last_tick_ms: u64,
    },
    Shape {
        start: (i32, i32),
        base: Surface,
        button: PointerButton,
    },
    RectSelectResize,
    SelectionMove,
    FreeformDraw,
    CanvasResize {
        handle: ResizeHandle,
        original: Surface,
    },
}

// ---------------------------------------------------------------------------
//  Editor
// ---------------------------------------------------------------------------

pub struct Editor {
    pub surface: Surface,
    pub state: EditorState,
    pub history: HistoryManager,
    pub rect_selection: Option<RectSelection>,
    pub freeform_selection: Option<FreeformSelection>,
    polygon_draft: Option<PolygonDraft>,
    curve_draft: Option<CurveDraft>,
    text_draft: Option<TextDraft>,
    drag: DragOp,
    commands: VecDeque<ToolCommand>,
    notices: Vec<EditorNotice>,
    font: Option<FontArc>,
    last_click: Option<(u64, PointerButton)>,
    airbrush_counter: u32,
}

impl Editor {
    pub fn new(width: u32, height: u32) -> Self {
        Self::from_surface(Surface::new(width, height, WHITE))
    }

    pub fn from_surface(surface: Surface) -> Self {
        let mut history = HistoryManager::default();
        history.mark_saved(&surface);
        Self {
            surface,
            state: EditorState::default(),
            history,
            rect_selection: None,
            freeform_selection: None,
            polygon_draft: None,
            curve_draft: None,
            text_draft: None,
            drag: DragOp::None,
            commands: VecDeque::new(),
            notices: Vec::new(),
            font: None,
            last_click: None,
            airbrush_counter: 0,
        }
    }

    /// Install a new document (file load, AI result). Clears history and
    /// selections; the loaded state counts as saved.
    pub fn install_image(&mut self, image: RgbaImage) {
        self.cancel_all_drafts();
        self.rect_selection = None;
        self.freeform_selection = None;
        self.surface = Surface::from_image(image);
        self.history.clear();
        self.history.mark_saved(&self.surface);
    }

    /// Font used by the text tool; without one, text commits are dropped.
    pub fn set_font(&mut self, font: FontArc) {
        self.font = Some(font);
    }

    pub fn is_modified(&self) -> bool {
        self.history.is_modified(&self.surface)
    }

    pub fn mark_saved(&mut self) {
        self.history.mark_saved(&self.surface);
    }

    // -- command channel ----------------------------------------------------

    pub fn enqueue(&mut self, cmd: ToolCommand) {
        self.commands.push_back(cmd);
    }

    /// Drain queued commands. Called once per frame/tick by the shell.
    pub fn process_commands(&mut self) {
        while let Some(cmd) = self.commands.pop_front() {
            match cmd {
                ToolCommand::SetTool(tool) => self.set_tool(tool),
                ToolCommand::SetForeground(c) => self.state.foreground = c,
                ToolCommand::SetBackground(c) => self.state.background = c,
                ToolCommand::SetPenWidth(w) => self.state.pen_width = w.max(1.0),
                ToolCommand::SetFillMode(m) => self.state.fill_mode = m,
                ToolCommand::SetTextStyle(s) => self.state.text_style = s,
                ToolCommand::ZoomIn => self.zoom_step(1),
                ToolCommand::ZoomOut => self.zoom_step(-1),
            }
        }
    }

    /// Take accumulated outbound notifications.
    pub fn take_notices(&mut self) -> Vec<EditorNotice> {
        std::mem::take(&mut self.notices)
    }

    /// Switching tools commits any pending selection, polygon, curve or text
    /// entry first; this is the only automatic transition.
    pub fn set_tool(&mut self, tool: Tool) {
        if tool == self.state.tool {
            return;
        }
        self.commit_polygon_draft();
        self.commit_curve_draft();
        self.commit_text_draft();
        self.commit_all_selections();
        self.drag = DragOp::None;
        self.state.tool = tool;
        log::debug!("tool -> {:?}", tool);
    }

    fn zoom_step(&mut self, delta: i32) {
        let idx = self.state.zoom_index as i32 + delta;
        self.state.zoom_index = idx.clamp(0, ZOOM_STEPS.len() as i32 - 1) as usize;
    }

    /// Display space → image space.
    fn to_image(&self, x: f32, y: f32) -> (f32, f32) {
        let z = self.state.zoom();
        (x / z, y / z)
    }

    fn button_color(&self, button: PointerButton) -> Rgba<u8> {
        match button {
            PointerButton::Primary => self.state.foreground,
            PointerButton::Secondary => self.state.background,
        }
    }

    // -- selection plumbing -------------------------------------------------

    /// Commit both selection kinds (tool switch, outside click, paste).
    pub fn commit_all_selections(&mut self) {
        if let Some(sel) = self.rect_selection.take() {
            if sel.is_live() {
                self.history.save_state(&self.surface);
            }
            sel.commit(&mut self.surface);
        }
        if let Some(sel) = self.freeform_selection.take() {
            if sel.is_live() {
                self.history.save_state(&self.surface);
            }
            sel.commit(&mut self.surface);
        }
    }

    /// Drop any active selection without blitting its content back.
    pub fn discard_selections(&mut self) {
        if let Some(sel) = self.rect_selection.take() {
            sel.discard();
        }
        if let Some(sel) = self.freeform_selection.take() {
            sel.discard();
        }
    }

    fn live_selection_hit(&self, x: i32, y: i32) -> bool {
        self.freeform_selection
            .as_ref()
            .is_some_and(|s| s.is_live() && s.contains(x, y))
            || self
                .rect_selection
                .as_ref()
                .is_some_and(|s| s.is_live() && s.contains(x, y))
    }

    // -- pointer events -----------------------------------------------------

    /// Pointer press. `now_ms` is a monotonic timestamp used for double-click
    /// detection and the airbrush timer.
    pub fn pointer_down(&mut self, dx: f32, dy: f32, button: PointerButton, now_ms: u64) {
        let (fx, fy) = self.to_image(dx, dy);
        let (x, y) = (fx.floor() as i32, fy.floor() as i32);

        let double_click = matches!(
            self.last_click,
            Some((t, b)) if b == button && now_ms.saturating_sub(t) <= DOUBLE_CLICK_MS
        );
        self.last_click = Some((now_ms, button));

        // Resize-handle hit-testing outranks all tool handling.
        if let Some(handle) = self.hit_resize_handle(x, y) {
            self.drag = DragOp::CanvasResize {
                handle,
                original: self.surface.clone(),
            };
            return;
        }

        // Dragging an existing live selection outranks starting a new
        // operation, for every tool. The selection kind not being touched is
        // committed so at most one stays live while manipulating.
        if self.live_selection_hit(x, y) {
            if self
                .freeform_selection
                .as_ref()
                .is_some_and(|s| s.is_live() && s.contains(x, y))
            {
                if let Some(sel) = self.rect_selection.take() {
                    if sel.is_live() {
                        self.history.save_state(&self.surface);
                    }
                    sel.commit(&mut self.surface);
                }
                if let Some(sel) = self.freeform_selection.as_mut() {
                    sel.begin_move(x, y);
                }
            } else {
                if let Some(sel) = self.freeform_selection.take() {
                    if sel.is_live() {
                        self.history.save_state(&self.surface);
                    }
                    sel.commit(&mut self.surface);
                }
                if let Some(sel) = self.rect_selection.as_mut() {
                    sel.begin_move(x, y);
                }
            }
            self.drag = DragOp::SelectionMove;
            return;
        }

        // Clicking outside a pending selection commits it before anything
        // else happens at this position.
        self.commit_all_selections();

        match self.state.tool {
            Tool::Pencil | Tool::Brush => {
                self.history.save_state(&self.surface);
                let width = self.stroke_width();
                let color = self.button_color(button);
                stamp_disc(&mut self.surface, fx, fy, width, color);
                self.drag = DragOp::Stroke { last: (fx, fy), button };
            }
            Tool::Eraser => {
                self.history.save_state(&self.surface);
                self.erase_segment((fx, fy), (fx, fy), button);
                self.drag = DragOp::Stroke { last: (fx, fy), button };
            }
            Tool::Airbrush => {
                self.history.save_state(&self.surface);
                self.drag = DragOp::Airbrush {
                    center: (fx, fy),
                    button,
                    // Spray immediately on the first tick.
                    last_tick_ms: now_ms.saturating_sub(AIRBRUSH_TICK_MS),
                };
                self.tick(now_ms);
            }
            Tool::Fill => {
                self.history.save_state(&self.surface);
                let color = self.button_color(button);
                let filled = self.surface.flood_fill(x, y, color);
                log::debug!("flood fill at ({x},{y}): {filled} pixels");
            }
            Tool::Eyedropper => {
                if let Some(color) = self.surface.pick_color(x, y) {
                    match button {
                        PointerButton::Primary => self.state.foreground = color,
                        PointerButton::Secondary => self.state.background = color,
                    }
                    self.notices.push(EditorNotice::ColorPicked(color));
                }
            }
            Tool::Magnifier => {
                self.zoom_step(match button {
                    PointerButton::Primary => 1,
                    PointerButton::Secondary => -1,
                });
            }
            Tool::Line | Tool::Rectangle | Tool::Ellipse | Tool::RoundedRectangle => {
                self.history.save_state(&self.surface);
                self.drag = DragOp::Shape {
                    start: (x, y),
                    base: self.surface.clone(),
                    button,
                };
            }
            Tool::Polygon => self.polygon_click(x, y, button, double_click),
            Tool::Curve => self.curve_click(fx, fy, button, double_click),
            Tool::Text => self.text_click(x, y, button),
            Tool::RectSelect => {
                self.rect_selection = Some(RectSelection::begin(x, y));
                self.drag = DragOp::RectSelectResize;
            }
            Tool::FreeformSelect => {
                self.freeform_selection = Some(FreeformSelection::begin(x, y));
                self.drag = DragOp::FreeformDraw;
            }
        }
    }

    pub fn pointer_move(&mut self, dx: f32, dy: f32) {
        let (fx, fy) = self.to_image(dx, dy);
        let (x, y) = (fx.floor() as i32, fy.floor() as i32);

        match &mut self.drag {
            DragOp::None => {
                // Hovering: live rubber-band previews for multi-click drafts.
                if self.polygon_draft.is_some() {
                    self.render_polygon_preview(Some((x, y)));
                } else if self.curve_draft.is_some() {
                    self.render_curve_preview(Some((fx, fy)));
                }
            }
            DragOp::Stroke { last, button } => {
                let (from, button) = (*last, *button);
                *last = (fx, fy);
                match self.state.tool {
                    Tool::Eraser => self.erase_segment(from, (fx, fy), button),
                    _ => {
                        let width = self.stroke_width();
                        let color = self.button_color(button);
                        draw_line(&mut self.surface, from, (fx, fy), width, color);
                    }
                }
            }
            DragOp::Airbrush { center, .. } => {
                *center = (fx, fy);
            }
            DragOp::Shape { start, base, button } => {
                let (start, button) = (*start, *button);
                let base = base.clone();
                // Restore the pre-stroke copy, then draw the live preview.
                self.surface = base;
                self.draw_shape(start, (x, y), button);
            }
            DragOp::RectSelectResize => {
                if let Some(sel) = self.rect_selection.as_mut() {
                    sel.drag_resize(x, y);
                }
            }
            DragOp::SelectionMove => {
                if let Some(sel) = self.freeform_selection.as_mut() {
                    if sel.dragging {
                        sel.drag_move(x, y);
                        return;
                    }
                }
                if let Some(sel) = self.rect_selection.as_mut() {
                    sel.drag_move(x, y);
                }
            }
            DragOp::FreeformDraw => {
                if let Some(sel) = self.freeform_selection.as_mut() {
                    sel.add_point(x, y);
                }
            }
            DragOp::CanvasResize { handle, original } => {
                let handle = *handle;
                let original = original.clone();
                self.preview_canvas_resize(handle, &original, x, y);
            }
        }
    }

    pub fn pointer_up(&mut self, dx: f32, dy: f32) {
        let (fx, fy) = self.to_image(dx, dy);
        let (x, y) = (fx.floor() as i32, fy.floor() as i32);

        match std::mem::replace(&mut self.drag, DragOp::None) {
            DragOp::None | DragOp::Stroke { .. } | DragOp::Airbrush { .. } => {}
            DragOp::Shape { start, base, button } => {
                // Final commit: the last preview already drew onto a restored
                // base, but the release point wins.
                self.surface = base;
                self.draw_shape(start, (x, y), button);
            }
            DragOp::RectSelectResize => {
                let mut degenerate = false;
                if let Some(sel) = self.rect_selection.as_mut() {
                    sel.drag_resize(x, y);
                    degenerate = sel.rect.is_empty();
                }
                if degenerate {
                    // A click without a drag selects nothing.
                    self.rect_selection = None;
                } else if self.rect_selection.is_some() {
                    self.history.save_state(&self.surface);
                    let background = self.state.background;
                    if let Some(sel) = self.rect_selection.as_mut() {
                        sel.capture(&mut self.surface, background);
                    }
                }
            }
            DragOp::SelectionMove => {
                if let Some(sel) = self.freeform_selection.as_mut() {
                    sel.end_drag();
                }
                if let Some(sel) = self.rect_selection.as_mut() {
                    sel.end_drag();
                }
            }
            DragOp::FreeformDraw => {
                let background = self.state.background;
                match self.freeform_selection.as_mut() {
                    Some(sel) if sel.is_closed_polygon() => {
                        self.history.save_state(&self.surface);
                        sel.capture(&mut self.surface, background);
                    }
                    _ => self.freeform_selection = None,
                }
            }
            DragOp::CanvasResize { handle, original } => {
                let (w, h) = Self::resize_target(handle, &original, x, y);
                self.surface = original;
                self.history.save_state(&self.surface);
                let background = self.state.background;
                self.surface.resize(w, h, background);
            }
        }
    }

    /// Periodic driver for time-based tools; currently the airbrush spray.
    pub fn tick(&mut self, now_ms: u64) {
        let (cx, cy, button) = match &mut self.drag {
            DragOp::Airbrush { center, button, last_tick_ms } => {
                if now_ms.saturating_sub(*last_tick_ms) < AIRBRUSH_TICK_MS {
                    return;
                }
                *last_tick_ms = now_ms;
                (center.0, center.1, *button)
            }
            _ => return,
        };
        let color = self.button_color(button);
        let radius = self.state.pen_width * AIRBRUSH_RADIUS_FACTOR;
        for _ in 0..AIRBRUSH_DOTS_PER_TICK {
            self.airbrush_counter = self.airbrush_counter.wrapping_add(1);
            let h1 = scatter_hash(cx, cy, self.airbrush_counter);
            let h2 = scatter_hash(cy, cx, self.airbrush_counter.wrapping_add(99_991));
            // Uniform point in the disc via polar sampling.
            let angle = (h1 % 10_000) as f32 / 10_000.0 * std::f32::consts::TAU;
            let dist = ((h2 % 10_000) as f32 / 10_000.0).sqrt() * radius;
            let px = cx + angle.cos() * dist;
            let py = cy + angle.sin() * dist;
            self.surface.put_pixel(px.floor() as i32, py.floor() as i32, color);
        }
    }

    // -- keyboard -----------------------------------------------------------

    /// ESC: cancel pending drafts and deselect. A live selection's content
    /// is blitted back at its current position, same as the tool-switch path.
    pub fn key_escape(&mut self) {
        self.cancel_polygon_draft();
        self.cancel_curve_draft();
        self.text_draft = None;
        self.commit_all_selections();
    }

    /// Enter: commit pending multi-click drafts and text entry.
    pub fn key_enter(&mut self) {
        self.commit_polygon_draft();
        self.commit_curve_draft();
        self.commit_text_draft();
    }

    // -- freehand helpers ---------------------------------------------------

    fn stroke_width(&self) -> f32 {
        match self.state.tool {
            Tool::Brush => self.state.pen_width * BRUSH_WIDTH_FACTOR,
            _ => self.state.pen_width,
        }
    }

    /// Eraser segment between two points.
    ///
    /// Primary button: content-aware erase — every non-background pixel under
    /// the disc becomes background, sampled at a sub-pixel step proportional
    /// to the pen width so fast drags leave no gaps. Secondary button:
    /// selective color erase — only pixels exactly matching the foreground
    /// color are replaced, scanned in the same circular neighborhood.
    fn erase_segment(&mut self, from: (f32, f32), to: (f32, f32), button: PointerButton) {
        let background = self.state.background;
        let foreground = self.state.foreground;
        let radius = self.state.pen_width.max(1.0);
        let step = (radius * 0.25).clamp(0.25, 1.0);
        let dx = to.0 - from.0;
        let dy = to.1 - from.1;
        let dist = (dx * dx + dy * dy).sqrt();
        let steps = (dist / step).ceil().max(1.0) as usize;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let cx = from.0 + dx * t;
            let cy = from.1 + dy * t;
            let r2 = radius * radius;
            let x0 = (cx - radius).floor() as i32;
            let x1 = (cx + radius).ceil() as i32;
            let y0 = (cy - radius).floor() as i32;
            let y1 = (cy + radius).ceil() as i32;
            for py in y0..=y1 {
                for px in x0..=x1 {
                    let ddx = px as f32 + 0.5 - cx;
                    let ddy = py as f32 + 0.5 - cy;
                    if ddx * ddx + ddy * ddy > r2 {
                        continue;
                    }
                    let Some(current) = self.surface.pick_color(px, py) else {
                        continue;
                    };
                    let replace = match button {
                        PointerButton::Primary => current != background,
                        PointerButton::Secondary => current == foreground,
                    };
                    if replace {
                        self.surface.put_pixel(px, py, background);
                    }
                }
            }
        }
    }

    // -- shape tools ----------------------------------------------------------

    fn draw_shape(&mut self, start: (i32, i32), end: (i32, i32), button: PointerButton) {
        let outline = self.button_color(button);
        let fill = match self.state.fill_mode {
            // Fill-only shapes fill with the button color; outline+fill
            // always fills with the background color.
            ShapeFillMode::Filled => outline,
            _ => self.state.background,
        };
        let width = self.state.pen_width;
        match self.state.tool {
            Tool::Line => draw_line(
                &mut self.surface,
                (start.0 as f32, start.1 as f32),
                (end.0 as f32, end.1 as f32),
                width,
                outline,
            ),
            Tool::Rectangle => {
                let rect = PixelRect::from_corners(start.0, start.1, end.0, end.1);
                draw_rectangle(&mut self.surface, rect, self.state.fill_mode, outline, fill, width);
            }
            Tool::Ellipse => {
                let rect = PixelRect::from_corners(start.0, start.1, end.0, end.1);
                draw_ellipse(&mut self.surface, rect, self.state.fill_mode, outline, fill, width);
            }
            Tool::RoundedRectangle => {
                let rect = PixelRect::from_corners(start.0, start.1, end.0, end.1);
                draw_rounded_rectangle(
                    &mut self.surface,
                    rect,
                    ROUNDED_RECT_RADIUS,
                    self.state.fill_mode,
                    outline,
                    fill,
                    width,
                );
            }
            _ => {}
        }
    }

    // -- polygon draft --------------------------------------------------------

    fn polygon_click(&mut self, x: i32, y: i32, button: PointerButton, double_click: bool) {
        match self.polygon_draft.as_mut() {
            None => {
                self.polygon_draft = Some(PolygonDraft {
                    points: vec![(x, y)],
                    button,
                    base: self.surface.clone(),
                });
            }
            Some(draft) if draft.button != button => {
                // Switching buttons cancels and restarts with the new color.
                self.surface = draft.base.clone();
                self.polygon_draft = Some(PolygonDraft {
                    points: vec![(x, y)],
                    button,
                    base: self.surface.clone(),
                });
            }
            Some(draft) => {
                if double_click && draft.points.len() >= 3 {
                    self.commit_polygon_draft();
                    return;
                }
                draft.points.push((x, y));
            }
        }
        self.render_polygon_preview(None);
    }

    /// Committed edges solid, rubber-band to the cursor, closing edge back to
    /// the first vertex.
    fn render_polygon_preview(&mut self, cursor: Option<(i32, i32)>) {
        let Some(draft) = self.polygon_draft.as_ref() else {
            return;
        };
        let color = self.button_color(draft.button);
        let width = self.state.pen_width;
        let points = draft.points.clone();
        self.surface = draft.base.clone();
        for pair in points.windows(2) {
            draw_line(
                &mut self.surface,
                (pair[0].0 as f32, pair[0].1 as f32),
                (pair[1].0 as f32, pair[1].1 as f32),
                width,
                color,
            );
        }
        if let (Some(cur), Some(&first), Some(&last)) =
            (cursor, points.first(), points.last())
        {
            let cur = (cur.0 as f32, cur.1 as f32);
            draw_line(&mut self.surface, (last.0 as f32, last.1 as f32), cur, width, color);
            draw_line(&mut self.surface, cur, (first.0 as f32, first.1 as f32), width, color);
        }
    }

    fn commit_polygon_draft(&mut self) {
        let Some(draft) = self.polygon_draft.take() else {
            return;
        };
        self.surface = draft.base;
        if draft.points.len() < 3 {
            return; // nothing committable, preview already rolled back
        }
        self.history.save_state(&self.surface);
        let outline = self.button_color(draft.button);
        let fill = match self.state.fill_mode {
            ShapeFillMode::Filled => outline,
            _ => self.state.background,
        };
        draw_polygon(
            &mut self.surface,
            &draft.points,
            self.state.fill_mode,
            outline,
            fill,
            self.state.pen_width,
        );
    }

    fn cancel_polygon_draft(&mut self) {
        if let Some(draft) = self.polygon_draft.take() {
            self.surface = draft.base;
        }
    }

    // -- curve draft ----------------------------------------------------------

    fn curve_click(&mut self, fx: f32, fy: f32, button: PointerButton, double_click: bool) {
        match self.curve_draft.as_mut() {
            None => {
                self.curve_draft = Some(CurveDraft {
                    points: vec![(fx, fy)],
                    button,
                    base: self.surface.clone(),
                });
            }
            Some(draft) if draft.button != button => {
                self.surface = draft.base.clone();
                self.curve_draft = Some(CurveDraft {
                    points: vec![(fx, fy)],
                    button,
                    base: self.surface.clone(),
                });
            }
            Some(draft) => {
                if double_click && draft.points.len() >= 2 {
                    self.commit_curve_draft();
                    return;
                }
                draft.points.push((fx, fy));
            }
        }
        self.render_curve_preview(None);
    }

    fn render_curve_preview(&mut self, cursor: Option<(f32, f32)>) {
        let Some(draft) = self.curve_draft.as_ref() else {
            return;
        };
        let color = self.button_color(draft.button);
        let width = self.state.pen_width;
        let mut points = draft.points.clone();
        if let Some(cur) = cursor {
            points.push(cur);
        }
        self.surface = draft.base.clone();
        draw_curve(
            &mut self.surface,
            &points,
            width,
            color,
            CURVE_PREVIEW_SAMPLES_PER_SEGMENT,
        );
    }

    fn commit_curve_draft(&mut self) {
        let Some(draft) = self.curve_draft.take() else {
            return;
        };
        self.surface = draft.base;
        if draft.points.len() < 2 {
            return;
        }
        self.history.save_state(&self.surface);
        let color = self.button_color(draft.button);
        draw_curve(
            &mut self.surface,
            &draft.points,
            self.state.pen_width,
            color,
            CURVE_SAMPLES_PER_SEGMENT,
        );
    }

    fn cancel_curve_draft(&mut self) {
        if let Some(draft) = self.curve_draft.take() {
            self.surface = draft.base;
        }
    }

    // -- text draft -----------------------------------------------------------

    fn text_click(&mut self, x: i32, y: i32, button: PointerButton) {
        if self.text_draft.is_some() {
            // Focus loss outside the overlay commits the pending entry.
            self.commit_text_draft();
        }
        self.text_draft = Some(TextDraft {
            anchor: (x, y),
            text: String::new(),
            button,
        });
    }

    /// Replace the pending text entry (the shell owns the edit widget).
    pub fn set_draft_text(&mut self, text: &str) {
        if let Some(draft) = self.text_draft.as_mut() {
            draft.text = text.to_string();
        }
    }

    pub fn has_text_draft(&self) -> bool {
        self.text_draft.is_some()
    }

    fn commit_text_draft(&mut self) {
        let Some(draft) = self.text_draft.take() else {
            return;
        };
        if draft.text.is_empty() {
            return;
        }
        let Some(font) = self.font.clone() else {
            log::warn!("text commit dropped: no font configured");
            return;
        };
        self.history.save_state(&self.surface);
        let color = self.button_color(draft.button);
        let style = self.state.text_style.clone();
        draw_text(&mut self.surface, &font, &draft.text, draft.anchor, &style, color);
    }

    fn cancel_all_drafts(&mut self) {
        self.cancel_polygon_draft();
        self.cancel_curve_draft();
        self.text_draft = None;
        self.drag = DragOp::None;
    }

    // -- canvas resize handles ------------------------------------------------

    /// Hotspots: right-edge-center, bottom-edge-center, corner.
    fn hit_resize_handle(&self, x: i32, y: i32) -> Option<ResizeHandle> {
        let w = self.surface.width() as i32;
        let h = self.surface.height() as i32;
        let near = |a: i32, b: i32| (a - b).abs() <= RESIZE_HANDLE_HALF;
        if near(x, w) && near(y, h) {
            Some(ResizeHandle::Corner)
        } else if near(x, w) && near(y, h / 2) {
            Some(ResizeHandle::Right)
        } else if near(x, w / 2) && near(y, h) {
            Some(ResizeHandle::Bottom)
        } else {
            None
        }
    }

    fn resize_target(handle: ResizeHandle, original: &Surface, x: i32, y: i32) -> (u32, u32) {
        let w = original.width();
        let h = original.height();
        match handle {
            ResizeHandle::Right => (x.max(1) as u32, h),
            ResizeHandle::Bottom => (w, y.max(1) as u32),
            ResizeHandle::Corner => (x.max(1) as u32, y.max(1) as u32),
        }
    }

    /// Live, non-destructive resize preview from the captured original.
    fn preview_canvas_resize(&mut self, handle: ResizeHandle, original: &Surface, x: i32, y: i32) {
        let (w, h) = Self::resize_target(handle, original, x, y);
        let mut preview = original.clone();
        preview.resize(w, h, self.state.background);
        self.surface = preview;
    }

    // -- whole-image / selection-content operations ---------------------------

    /// Rotate the active selection's content if one exists, else the whole
    /// surface. Whole-image rotation fills newly exposed area with the
    /// background color; detached content exposes transparency.
    pub fn rotate(&mut self, angle_deg: f32) {
        if let Some(sel) = self.freeform_selection.as_mut().filter(|s| s.is_live()) {
            if let Some(content) = sel.content.as_mut() {
                let rotated = rotate_image(content, angle_deg, TRANSPARENT);
                sel.bounds.w = rotated.width();
                sel.bounds.h = rotated.height();
                // The polygon path no longer matches rotated content; fall
                // back to bbox hit-testing.
                sel.points.clear();
                *content = rotated;
            }
            return;
        }
        if let Some(sel) = self.rect_selection.as_mut().filter(|s| s.is_live()) {
            if let Some(content) = sel.content.as_mut() {
                let rotated = rotate_image(content, angle_deg, TRANSPARENT);
                sel.rect.w = rotated.width();
                sel.rect.h = rotated.height();
                *content = rotated;
            }
            return;
        }
        self.history.save_state(&self.surface);
        let rotated = rotate_image(self.surface.image(), angle_deg, self.state.background);
        self.surface.replace(rotated);
    }

    /// Mirror the active selection's content if one exists, else the surface.
    pub fn flip(&mut self, axis: FlipAxis) {
        if let Some(sel) = self.freeform_selection.as_mut().filter(|s| s.is_live()) {
            if let Some(content) = sel.content.as_mut() {
                *content = flip_image(content, axis);
            }
            return;
        }
        if let Some(sel) = self.rect_selection.as_mut().filter(|s| s.is_live()) {
            if let Some(content) = sel.content.as_mut() {
                *content = flip_image(content, axis);
            }
            return;
        }
        self.history.save_state(&self.surface);
        let flipped = flip_image(self.surface.image(), axis);
        self.surface.replace(flipped);
    }

    /// Shear. Selection content exposes transparency; the whole surface
    /// exposes white. Note the asymmetry with `rotate`, which exposes the
    /// background color instead.
    pub fn skew(&mut self, h_deg: f32, v_deg: f32) {
        if let Some(sel) = self.freeform_selection.as_mut().filter(|s| s.is_live()) {
            if let Some(content) = sel.content.as_mut() {
                let skewed = skew_image(content, h_deg, v_deg, TRANSPARENT);
                sel.bounds.w = skewed.width();
                sel.bounds.h = skewed.height();
                sel.points.clear();
                *content = skewed;
            }
            return;
        }
        if let Some(sel) = self.rect_selection.as_mut().filter(|s| s.is_live()) {
            if let Some(content) = sel.content.as_mut() {
                let skewed = skew_image(content, h_deg, v_deg, TRANSPARENT);
                sel.rect.w = skewed.width();
                sel.rect.h = skewed.height();
                *content = skewed;
            }
            return;
        }
        self.history.save_state(&self.surface);
        let skewed = skew_image(self.surface.image(), h_deg, v_deg, WHITE);
        self.surface.replace(skewed);
    }

    /// Stretch the whole surface to exactly the new dimensions.
    pub fn scale(&mut self, new_w: u32, new_h: u32) {
        self.commit_all_selections();
        self.history.save_state(&self.surface);
        let scaled = scale_image(self.surface.image(), new_w, new_h);
        self.surface.replace(scaled);
    }

    /// Change canvas dimensions without scaling content.
    pub fn resize(&mut self, new_w: u32, new_h: u32) {
        self.commit_all_selections();
        self.history.save_state(&self.surface);
        let background = self.state.background;
        self.surface.resize(new_w, new_h, background);
    }

    /// Invert the active selection's content if one exists, else the surface.
    pub fn invert(&mut self) {
        if let Some(sel) = self.freeform_selection.as_mut().filter(|s| s.is_live()) {
            if let Some(content) = sel.content.as_mut() {
                crate::canvas::invert_image(content);
            }
            return;
        }
        if let Some(sel) = self.rect_selection.as_mut().filter(|s| s.is_live()) {
            if let Some(content) = sel.content.as_mut() {
                crate::canvas::invert_image(content);
            }
            return;
        }
        self.history.save_state(&self.surface);
        self.surface.invert_colors();
    }

    pub fn undo(&mut self) -> bool {
        self.cancel_all_drafts();
        self.history.undo(&mut self.surface)
    }

    pub fn redo(&mut self) -> bool {
        self.history.redo(&mut self.surface)
    }

    // -- clipboard ------------------------------------------------------------

    /// Serialize the active selection (free-form takes priority) without
    /// touching the OS clipboard. None when nothing is captured.
    pub fn copy_payload(&self) -> Option<ClipboardPayload> {
        if let Some(sel) = self.freeform_selection.as_ref().filter(|s| s.is_live()) {
            return payload_from_freeform(sel);
        }
        if let Some(sel) = self.rect_selection.as_ref().filter(|s| s.is_live()) {
            return payload_from_rect(sel);
        }
        None
    }

    /// Copy the active selection to the clipboard.
    pub fn copy(&self) {
        if let Some(payload) = self.copy_payload() {
            crate::ops::clipboard::set_clipboard(payload);
        }
    }

    /// Cut: copy, then drop the selection (its region stays erased).
    pub fn cut(&mut self) {
        if let Some(payload) = self.copy_payload() {
            crate::ops::clipboard::set_clipboard(payload);
            self.discard_selections();
        }
    }

    /// Reconstruct a live selection from a payload, centered on the canvas.
    /// Any currently active selection is committed first.
    pub fn paste_payload(&mut self, payload: &ClipboardPayload) {
        self.commit_all_selections();
        match build_paste(payload, self.surface.width(), self.surface.height()) {
            PastedSelection::Rect(sel) => self.rect_selection = Some(sel),
            PastedSelection::Freeform(sel) => self.freeform_selection = Some(sel),
        }
    }

    /// Paste from the clipboard (no-op when it holds no image).
    pub fn paste(&mut self) {
        if let Some(payload) = crate::ops::clipboard::get_clipboard() {
            self.paste_payload(&payload);
        }
    }
}

/// Deterministic position hash driving airbrush scatter; avoids dragging in
/// an RNG dependency for a visual effect.
fn scatter_hash(x: f32, y: f32, counter: u32) -> u32 {
    let ix = (x * 100.0) as i32 as u32;
    let iy = (y * 100.0) as i32 as u32;
    let mut h = ix
        .wrapping_mul(374_761_393)
        .wrapping_add(iy.wrapping_mul(668_265_263))
        .wrapping_add(counter.wrapping_mul(1_013_904_223));
    h ^= h >> 13;
    h = h.wrapping_mul(1_274_126_177);
    h ^= h >> 16;
    h
}
