use crate::actions::Action;
use crate::app::{AppMode, AppState};
use anyhow::Result;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use std::time::Duration;

pub fn handle_events(app: &mut AppState) -> Result<Option<Action>> {
    if event::poll(Duration::from_millis(10))? {
        return Ok(translate_event(app, event::read()?));
    }
    Ok(None)
}

pub fn translate_event(app: &AppState, event: Event) -> Option<Action> {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => handle_key_event(app, key),
        Event::Mouse(mouse) if app.mode == AppMode::Normal => handle_mouse_event(mouse),
        Event::Resize(width, height) => Some(Action::Resize { width, height }),
        _ => None,
    }
}

fn handle_key_event(app: &AppState, key: KeyEvent) -> Option<Action> {
    match &app.mode {
        AppMode::Normal => handle_normal_mode(key),
        AppMode::Help => handle_help_mode(key),
    }
}

fn handle_normal_mode(key: KeyEvent) -> Option<Action> {
    use KeyCode::*;

    match (key.code, key.modifiers) {
        // Quit
        (Char('q'), KeyModifiers::NONE) => Some(Action::Quit),
        (Char('c'), KeyModifiers::CONTROL) => Some(Action::Quit),

        // Undo/Redo
        (Char('u'), KeyModifiers::NONE) => Some(Action::Undo),
        (Char('z'), KeyModifiers::CONTROL) => Some(Action::Undo),
        (Char('r'), KeyModifiers::CONTROL) => Some(Action::Redo),
        (Char('y'), KeyModifiers::CONTROL) => Some(Action::Redo),

        // Layout
        (Char('r'), KeyModifiers::NONE) => Some(Action::ResetLayout),
        (Char('g'), KeyModifiers::NONE) => Some(Action::Regenerate),

        // Panning
        (Char('h'), KeyModifiers::NONE) | (Left, _) => Some(Action::Pan { dx: -1, dy: 0 }),
        (Char('j'), KeyModifiers::NONE) | (Down, _) => Some(Action::Pan { dx: 0, dy: 1 }),
        (Char('k'), KeyModifiers::NONE) | (Up, _) => Some(Action::Pan { dx: 0, dy: -1 }),
        (Char('l'), KeyModifiers::NONE) | (Right, _) => Some(Action::Pan { dx: 1, dy: 0 }),
        (Char('c'), KeyModifiers::NONE) => Some(Action::CenterView),

        // Help
        (Char('?'), _) => Some(Action::ShowHelp),

        _ => None,
    }
}

fn handle_help_mode(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => Some(Action::CloseHelp),
        _ => None,
    }
}

fn handle_mouse_event(mouse: MouseEvent) -> Option<Action> {
    let (col, row) = (mouse.column, mouse.row);

    match mouse.kind {
        MouseEventKind::Moved => Some(Action::PointerMove { col, row }),
        MouseEventKind::Down(MouseButton::Left) => Some(Action::PointerDown { col, row }),
        MouseEventKind::Drag(MouseButton::Left) => Some(Action::PointerDrag { col, row }),
        MouseEventKind::Up(MouseButton::Left) => Some(Action::PointerUp),
        _ => None,
    }
}
