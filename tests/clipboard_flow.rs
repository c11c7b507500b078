use image::Rgba;
use paintbox::{Editor, PointerButton, Tool, ToolCommand};

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

// These tests exchange payloads directly between editors; the OS clipboard
// bridge is deliberately not exercised (headless CI has no display server).

fn select_rect(ed: &mut Editor, x0: f32, y0: f32, x1: f32, y1: f32) {
    ed.enqueue(ToolCommand::SetTool(Tool::RectSelect));
    ed.process_commands();
    ed.pointer_down(x0, y0, PointerButton::Primary, 0);
    ed.pointer_move(x1, y1);
    ed.pointer_up(x1, y1);
}

#[test]
fn copy_paste_between_editors_reproduces_the_region() {
    let mut src = Editor::new(50, 50);
    src.surface.fill_rect(paintbox::PixelRect::new(5, 5, 10, 10), BLACK);
    select_rect(&mut src, 5.0, 5.0, 15.0, 15.0);
    let payload = src.copy_payload().expect("captured selection must copy");

    let mut dst = Editor::new(60, 60);
    dst.paste_payload(&payload);
    // Pasted selection is live and centered: 10x10 image on 60x60 lands at (25,25).
    let sel = dst.rect_selection.as_ref().expect("paste creates a rect selection");
    assert!(sel.is_live());
    assert_eq!((sel.rect.x, sel.rect.y), (25, 25));

    dst.enqueue(ToolCommand::SetTool(Tool::Pencil));
    dst.process_commands();
    assert_eq!(dst.surface.pick_color(30, 30), Some(BLACK));
    assert_eq!(dst.surface.pick_color(10, 10), Some(WHITE));
}

#[test]
fn freeform_copy_pastes_back_as_freeform() {
    let mut src = Editor::new(60, 60);
    src.surface.fill_rect(paintbox::PixelRect::new(0, 0, 60, 60), BLACK);
    src.enqueue(ToolCommand::SetTool(Tool::FreeformSelect));
    src.process_commands();
    src.pointer_down(10.0, 10.0, PointerButton::Primary, 0);
    src.pointer_move(40.0, 10.0);
    src.pointer_move(40.0, 40.0);
    src.pointer_move(10.0, 40.0);
    src.pointer_up(10.0, 40.0);
    let payload = src.copy_payload().expect("freeform selection must copy");

    let mut dst = Editor::new(60, 60);
    dst.paste_payload(&payload);
    assert!(dst.freeform_selection.as_ref().is_some_and(|s| s.is_live()));
    assert!(dst.rect_selection.is_none());
}

#[test]
fn cut_leaves_the_erased_region_behind() {
    let mut ed = Editor::new(40, 40);
    ed.surface.fill_rect(paintbox::PixelRect::new(8, 8, 8, 8), BLACK);
    select_rect(&mut ed, 8.0, 8.0, 16.0, 16.0);

    let payload = ed.copy_payload().expect("selection captured");
    ed.discard_selections();
    // The cut region stays background-filled; nothing comes back on tool switch.
    ed.enqueue(ToolCommand::SetTool(Tool::Pencil));
    ed.process_commands();
    assert_eq!(ed.surface.pick_color(12, 12), Some(WHITE));
    // The payload still carries the cut pixels.
    assert_eq!(*payload.image.get_pixel(2, 2), BLACK);
}

#[test]
fn paste_commits_any_active_selection_first() {
    let mut ed = Editor::new(50, 50);
    ed.surface.fill_rect(paintbox::PixelRect::new(0, 0, 6, 6), BLACK);
    select_rect(&mut ed, 0.0, 0.0, 6.0, 6.0);
    let payload = ed.copy_payload().unwrap();

    // Pasting while the original selection is still live must commit it back
    // in place, not drop it.
    ed.paste_payload(&payload);
    assert_eq!(ed.surface.pick_color(2, 2), Some(BLACK));
    assert!(ed.rect_selection.as_ref().is_some_and(|s| s.is_live()));
}
