use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::{Position, Rect};
use crate::app::App;
use crate::tui::AppEvent;

const WHEEL_LINES: u16 = 3;

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        // Pane size is picked up on the next render
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Char('c') if ctrl => app.should_quit = true,
        KeyCode::Esc => app.should_quit = true,

        KeyCode::Enter => app.submit(),

        // Transcript scrolling
        KeyCode::PageUp => app.scroll_up(app.half_page()),
        KeyCode::PageDown => app.scroll_down(app.half_page()),
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::End if ctrl => app.follow_latest(),

        // Line editing
        KeyCode::Backspace => app.controller.input_mut().backspace(),
        KeyCode::Delete => app.controller.input_mut().delete(),
        KeyCode::Left => app.controller.input_mut().move_left(),
        KeyCode::Right => app.controller.input_mut().move_right(),
        KeyCode::Home => app.controller.input_mut().move_home(),
        KeyCode::End => app.controller.input_mut().move_end(),
        KeyCode::Char('u') if ctrl => app.controller.input_mut().clear(),
        KeyCode::Char(c) if !ctrl => app.controller.input_mut().insert(c),
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let pos = Position::new(mouse.column, mouse.row);
    let over = |area: Option<Rect>| area.is_some_and(|a| a.contains(pos));

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) if over(app.send_area) => app.submit(),
        MouseEventKind::ScrollUp if over(app.chat_area) => app.scroll_up(WHEEL_LINES),
        MouseEventKind::ScrollDown if over(app.chat_area) => app.scroll_down(WHEEL_LINES),
        _ => {}
    }
}
