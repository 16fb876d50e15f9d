use crate::app::{AppMode, AppState, DragGrab};
use anyhow::Result;

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // Application control
    Quit,

    // History
    Undo,
    Redo,
    ResetLayout,
    Regenerate,

    // View control
    Pan { dx: i16, dy: i16 },
    CenterView,
    Resize { width: u16, height: u16 },

    // Pointer
    PointerMove { col: u16, row: u16 },
    PointerDown { col: u16, row: u16 },
    PointerDrag { col: u16, row: u16 },
    PointerUp,

    // Help
    ShowHelp,
    CloseHelp,
}

pub fn execute_action(action: Action, app: &mut AppState) -> Result<()> {
    // Pointer motion keeps the last message visible
    if !matches!(
        action,
        Action::PointerMove { .. } | Action::PointerDrag { .. } | Action::Resize { .. }
    ) {
        app.clear_message();
    }

    match action {
        Action::Quit => app.running = false,

        Action::Undo => undo(app),
        Action::Redo => redo(app),
        Action::ResetLayout => reset_layout(app),
        Action::Regenerate => regenerate(app),

        Action::Pan { dx, dy } => pan(app, dx, dy),
        Action::CenterView => center_view(app),
        Action::Resize { width, height } => {
            app.terminal_width = width;
            app.terminal_height = height;
        }

        Action::PointerMove { col, row } => pointer_move(app, col, row),
        Action::PointerDown { col, row } => pointer_down(app, col, row),
        Action::PointerDrag { col, row } => pointer_drag(app, col, row),
        Action::PointerUp => pointer_up(app),

        Action::ShowHelp => app.mode = AppMode::Help,
        Action::CloseHelp => app.mode = AppMode::Normal,
    }

    Ok(())
}

pub fn undo(app: &mut AppState) {
    app.grab = None;
    if app.canvas.undo() {
        app.set_message("Undone");
    } else {
        app.set_message("Nothing to undo");
    }
}

pub fn redo(app: &mut AppState) {
    if app.canvas.redo() {
        app.set_message("Redone");
    } else {
        app.set_message("Nothing to redo");
    }
}

pub fn reset_layout(app: &mut AppState) {
    app.grab = None;
    app.canvas.reset_layout();
    app.set_message("Layout reset");
}

pub fn regenerate(app: &mut AppState) {
    if app.start_regeneration() {
        app.set_message("Regenerating...");
    } else {
        app.set_message("Nothing to regenerate from");
    }
}

pub fn pan(app: &mut AppState, dx: i16, dy: i16) {
    let step = f64::from(app.config.pan_step);
    app.viewport_left += f64::from(dx) * step;
    // Rows are roughly twice as tall as columns are wide
    app.viewport_top += f64::from(dy) * (step / 2.0).max(1.0);
}

pub fn center_view(app: &mut AppState) {
    app.viewport_left = 0.0;
    app.viewport_top = 0.0;
}

pub fn pointer_move(app: &mut AppState, col: u16, row: u16) {
    let target = app.node_at(col, row);
    if target == app.hovered {
        return;
    }

    if let Some(previous) = app.hovered.take() {
        app.canvas.pointer_leave(&previous);
    }
    if let Some(ref node_id) = target {
        app.canvas.pointer_enter(node_id);
    }
    app.hovered = target;
}

pub fn pointer_down(app: &mut AppState, col: u16, row: u16) {
    let Some(node_id) = app.node_at(col, row) else {
        return;
    };
    let Some(node) = app.canvas.node(&node_id) else {
        return;
    };

    let (world_x, world_y) = app.to_world(col, row);
    let grab = DragGrab {
        offset_x: node.x - world_x,
        offset_y: node.y - world_y,
        node_id,
    };

    if app.canvas.pointer_down(&grab.node_id) {
        app.grab = Some(grab);
    }
}

pub fn pointer_drag(app: &mut AppState, col: u16, row: u16) {
    let Some(grab) = app.grab.clone() else {
        return;
    };

    let (world_x, world_y) = app.to_world(col, row);
    app.canvas
        .drag_move(&grab.node_id, world_x + grab.offset_x, world_y + grab.offset_y);
}

pub fn pointer_up(app: &mut AppState) {
    app.grab = None;
    app.canvas.pointer_up();
}
