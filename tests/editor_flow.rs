use image::Rgba;
use paintbox::components::tools::EditorNotice;
use paintbox::ops::shapes::ShapeFillMode;
use paintbox::{Editor, PointerButton, Tool, ToolCommand};

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

// Helper: a fresh white editor with a known size.
fn editor(w: u32, h: u32) -> Editor {
    Editor::new(w, h)
}

// Helper: one complete freehand stroke at zoom 1.0.
fn stroke(ed: &mut Editor, from: (f32, f32), to: (f32, f32)) {
    ed.pointer_down(from.0, from.1, PointerButton::Primary, 0);
    ed.pointer_move(to.0, to.1);
    ed.pointer_up(to.0, to.1);
}

#[test]
fn draw_line_then_undo_then_redo() {
    let mut ed = editor(100, 100);
    stroke(&mut ed, (10.0, 10.0), (90.0, 10.0));
    assert_eq!(ed.surface.pick_color(50, 10), Some(BLACK));

    assert!(ed.undo());
    assert_eq!(ed.surface.pick_color(50, 10), Some(WHITE));

    assert!(ed.redo());
    assert_eq!(ed.surface.pick_color(50, 10), Some(BLACK));
}

#[test]
fn history_keeps_only_the_most_recent_snapshots() {
    let mut ed = editor(40, 40);
    for i in 0..8 {
        let y = 5.0 + i as f32 * 4.0;
        stroke(&mut ed, (5.0, y), (35.0, y));
    }
    let mut undos = 0;
    while ed.undo() {
        undos += 1;
    }
    // Capacity is 5; the first three strokes were evicted.
    assert_eq!(undos, 5);
    assert_eq!(ed.surface.pick_color(20, 5), Some(BLACK));
    assert_eq!(ed.surface.pick_color(20, 25), Some(WHITE));
}

#[test]
fn flood_fill_covers_canvas_and_repeat_is_a_noop() {
    let mut ed = editor(50, 50);
    ed.enqueue(ToolCommand::SetTool(Tool::Fill));
    ed.enqueue(ToolCommand::SetForeground(RED));
    ed.process_commands();

    ed.pointer_down(25.0, 25.0, PointerButton::Primary, 0);
    ed.pointer_up(25.0, 25.0);
    let red_count = ed
        .surface
        .image()
        .pixels()
        .filter(|&&px| px == RED)
        .count();
    assert_eq!(red_count, 2500);

    // Filling red with red changes nothing, but the snapshot is still taken.
    let before = ed.surface.clone();
    ed.pointer_down(25.0, 25.0, PointerButton::Primary, 100);
    ed.pointer_up(25.0, 25.0);
    assert!(ed.surface == before);
    assert_eq!(ed.history.undo_depth(), 2);
}

#[test]
fn rect_selection_move_and_commit_relocates_pixels() {
    let mut ed = editor(80, 80);
    ed.surface.fill_rect(paintbox::PixelRect::new(10, 10, 10, 10), BLACK);

    ed.enqueue(ToolCommand::SetTool(Tool::RectSelect));
    ed.process_commands();
    ed.pointer_down(10.0, 10.0, PointerButton::Primary, 0);
    ed.pointer_move(20.0, 20.0);
    ed.pointer_up(20.0, 20.0);
    // Captured: the region is background-filled while detached.
    assert_eq!(ed.surface.pick_color(15, 15), Some(WHITE));

    // Drag the live selection 30px right and down.
    ed.pointer_down(15.0, 15.0, PointerButton::Primary, 1000);
    ed.pointer_move(45.0, 45.0);
    ed.pointer_up(45.0, 45.0);

    // Switching tools commits at the new position.
    ed.enqueue(ToolCommand::SetTool(Tool::Pencil));
    ed.process_commands();
    assert_eq!(ed.surface.pick_color(45, 45), Some(BLACK));
    assert_eq!(ed.surface.pick_color(15, 15), Some(WHITE));
}

#[test]
fn committing_untouched_selection_restores_the_canvas() {
    let mut ed = editor(60, 60);
    stroke(&mut ed, (5.0, 30.0), (55.0, 30.0));
    let before = ed.surface.clone();

    ed.enqueue(ToolCommand::SetTool(Tool::RectSelect));
    ed.process_commands();
    ed.pointer_down(0.0, 20.0, PointerButton::Primary, 0);
    ed.pointer_move(59.0, 40.0);
    ed.pointer_up(59.0, 40.0);

    // Clicking outside the selection commits it back in place.
    ed.pointer_down(5.0, 5.0, PointerButton::Primary, 1000);
    ed.pointer_up(5.0, 5.0);
    assert!(ed.surface == before);
}

#[test]
fn freeform_capture_spares_pixels_outside_the_path() {
    let mut ed = editor(60, 60);
    ed.surface.fill_rect(paintbox::PixelRect::new(0, 0, 60, 60), BLACK);

    ed.enqueue(ToolCommand::SetTool(Tool::FreeformSelect));
    ed.enqueue(ToolCommand::SetBackground(WHITE));
    ed.process_commands();
    // Trace a right triangle: (10,10) -> (40,10) -> (10,40).
    ed.pointer_down(10.0, 10.0, PointerButton::Primary, 0);
    ed.pointer_move(40.0, 10.0);
    ed.pointer_move(10.0, 40.0);
    ed.pointer_up(10.0, 40.0);

    // Inside the triangle: erased to background.
    assert_eq!(ed.surface.pick_color(13, 13), Some(WHITE));
    // Inside the bounding box but outside the path: untouched.
    assert_eq!(ed.surface.pick_color(38, 38), Some(BLACK));
}

#[test]
fn escape_deselects_and_anchors_the_content_in_place() {
    let mut ed = editor(40, 40);
    ed.surface.fill_rect(paintbox::PixelRect::new(10, 10, 8, 8), BLACK);
    let before = ed.surface.clone();

    ed.enqueue(ToolCommand::SetTool(Tool::RectSelect));
    ed.process_commands();
    ed.pointer_down(10.0, 10.0, PointerButton::Primary, 0);
    ed.pointer_move(18.0, 18.0);
    ed.pointer_up(18.0, 18.0);
    assert!(ed.rect_selection.as_ref().is_some_and(|s| s.is_live()));

    ed.key_escape();
    assert!(ed.rect_selection.is_none());
    assert!(ed.surface == before);
}

#[test]
fn whole_image_rotate_exposes_background_but_skew_exposes_white() {
    let mut ed = editor(20, 20);
    ed.surface.fill_rect(paintbox::PixelRect::new(0, 0, 20, 20), BLACK);
    ed.enqueue(ToolCommand::SetBackground(RED));
    ed.process_commands();
    ed.rotate(45.0);
    // The grown bounding box corner lies outside the rotated square.
    assert_eq!(ed.surface.pick_color(0, 0), Some(RED));

    let mut ed = editor(20, 20);
    ed.surface.fill_rect(paintbox::PixelRect::new(0, 0, 20, 20), BLACK);
    ed.enqueue(ToolCommand::SetBackground(RED));
    ed.process_commands();
    ed.skew(45.0, 0.0);
    // The top-right corner is uncovered by the rightward shear of lower rows,
    // and gets white regardless of the configured background color.
    let w = ed.surface.width() as i32;
    assert_eq!(ed.surface.pick_color(w - 1, 0), Some(WHITE));
}

#[test]
fn text_draft_discard_and_degenerate_commits_leave_no_trace() {
    let mut ed = editor(30, 30);
    let before = ed.surface.clone();
    ed.enqueue(ToolCommand::SetTool(Tool::Text));
    ed.process_commands();

    // Escape discards an uncommitted entry.
    ed.pointer_down(5.0, 5.0, PointerButton::Primary, 0);
    ed.pointer_up(5.0, 5.0);
    assert!(ed.has_text_draft());
    ed.set_draft_text("hello");
    ed.key_escape();
    assert!(!ed.has_text_draft());
    assert!(ed.surface == before);
    assert_eq!(ed.history.undo_depth(), 0);

    // Committing an empty entry is skipped, no snapshot taken.
    ed.pointer_down(5.0, 5.0, PointerButton::Primary, 1000);
    ed.pointer_up(5.0, 5.0);
    ed.key_enter();
    assert!(!ed.has_text_draft());
    assert_eq!(ed.history.undo_depth(), 0);

    // With text but no font configured, the commit is dropped.
    ed.pointer_down(5.0, 5.0, PointerButton::Primary, 2000);
    ed.pointer_up(5.0, 5.0);
    ed.set_draft_text("hello");
    ed.key_enter();
    assert!(!ed.has_text_draft());
    assert!(ed.surface == before);
    assert_eq!(ed.history.undo_depth(), 0);
}

#[test]
fn invert_applies_to_selection_content_then_commit() {
    let mut ed = editor(30, 30);
    ed.surface.fill_rect(paintbox::PixelRect::new(0, 0, 30, 30), Rgba([10, 20, 30, 255]));
    let mut expected = ed.surface.clone();
    expected.invert_colors();

    ed.enqueue(ToolCommand::SetTool(Tool::RectSelect));
    ed.process_commands();
    ed.pointer_down(0.0, 0.0, PointerButton::Primary, 0);
    ed.pointer_move(30.0, 30.0);
    ed.pointer_up(30.0, 30.0);

    ed.invert();
    ed.enqueue(ToolCommand::SetTool(Tool::Pencil));
    ed.process_commands();
    assert!(ed.surface == expected);
}

#[test]
fn shape_fill_modes_use_the_right_colors() {
    let mut ed = editor(40, 40);
    ed.enqueue(ToolCommand::SetTool(Tool::Rectangle));
    ed.enqueue(ToolCommand::SetFillMode(ShapeFillMode::Both));
    ed.enqueue(ToolCommand::SetBackground(RED));
    ed.process_commands();

    ed.pointer_down(5.0, 5.0, PointerButton::Primary, 0);
    ed.pointer_move(30.0, 30.0);
    ed.pointer_up(30.0, 30.0);
    // Outline in the button (foreground) color, interior in background.
    assert_eq!(ed.surface.pick_color(5, 15), Some(BLACK));
    assert_eq!(ed.surface.pick_color(17, 17), Some(RED));
}

#[test]
fn eyedropper_pick_feeds_the_notice_channel() {
    let mut ed = editor(20, 20);
    ed.surface.put_pixel(4, 4, RED);
    ed.enqueue(ToolCommand::SetTool(Tool::Eyedropper));
    ed.process_commands();
    ed.pointer_down(4.0, 4.0, PointerButton::Primary, 0);
    ed.pointer_up(4.0, 4.0);
    assert_eq!(ed.state.foreground, RED);
    assert_eq!(ed.take_notices(), vec![EditorNotice::ColorPicked(RED)]);
    assert!(ed.take_notices().is_empty());
}

#[test]
fn zoom_commands_clamp_at_the_table_ends() {
    let mut ed = editor(10, 10);
    for _ in 0..20 {
        ed.enqueue(ToolCommand::ZoomIn);
    }
    ed.process_commands();
    assert_eq!(ed.state.zoom(), 3.0);
    for _ in 0..20 {
        ed.enqueue(ToolCommand::ZoomOut);
    }
    ed.process_commands();
    assert_eq!(ed.state.zoom(), 0.2);
}

#[test]
fn modified_tracking_follows_edits_and_saves() {
    let mut ed = editor(20, 20);
    assert!(!ed.is_modified());
    stroke(&mut ed, (2.0, 2.0), (18.0, 18.0));
    assert!(ed.is_modified());
    ed.mark_saved();
    assert!(!ed.is_modified());
}
