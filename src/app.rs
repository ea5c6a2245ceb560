use ratatui::layout::Rect;

use crate::controller::{Completion, Controller, SubmissionState};
use crate::transcript::Transcript;
use crate::ui;

/// Fallback sizes used before the first frame has been drawn
const DEFAULT_WRAP_WIDTH: u16 = 50;
const DEFAULT_VISIBLE_HEIGHT: u16 = 20;

pub struct App {
    pub should_quit: bool,
    pub controller: Controller,
    pub endpoint: String,

    // Transcript view
    pub scroll: u16,
    pub follow: bool, // keep the latest entry in view
    pub chat_height: u16, // inner height of the transcript pane
    pub chat_width: u16,  // inner width, for wrap calculations

    pub animation_frame: u8, // 0-2 for the pending-reply dots

    // Areas for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,
    pub send_area: Option<Rect>,
}

impl App {
    pub fn new(controller: Controller, endpoint: impl Into<String>) -> Self {
        Self {
            should_quit: false,
            controller,
            endpoint: endpoint.into(),
            scroll: 0,
            follow: true,
            chat_height: 0,
            chat_width: 0,
            animation_frame: 0,
            chat_area: None,
            send_area: None,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        self.controller.transcript()
    }

    /// Send the current input. Both the Enter key and the send button land here.
    pub fn submit(&mut self) {
        if self.controller.submit().is_some() {
            self.follow = true;
            self.scroll_to_bottom();
        }
    }

    pub fn complete(&mut self, completion: Completion) -> Option<SubmissionState> {
        let state = self.controller.complete(completion);
        if self.follow {
            self.scroll_to_bottom();
        }
        state
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.controller.in_flight() > 0 {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_sub(lines);
        self.follow = self.scroll >= self.max_scroll();
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max = self.max_scroll();
        self.scroll = self.scroll.saturating_add(lines).min(max);
        self.follow = self.scroll >= max;
    }

    pub fn half_page(&self) -> u16 {
        (self.visible_height() / 2).max(1)
    }

    /// Jump back to the latest entry and stay there.
    pub fn follow_latest(&mut self) {
        self.follow = true;
        self.scroll_to_bottom();
    }

    /// Called after a resize or redraw changed the pane size.
    pub fn on_layout(&mut self, width: u16, height: u16) {
        self.chat_width = width;
        self.chat_height = height;
        if self.follow {
            self.scroll_to_bottom();
        } else {
            self.scroll = self.scroll.min(self.max_scroll());
        }
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll = self.max_scroll();
    }

    fn max_scroll(&self) -> u16 {
        self.content_height().saturating_sub(self.visible_height())
    }

    fn visible_height(&self) -> u16 {
        if self.chat_height > 0 {
            self.chat_height
        } else {
            DEFAULT_VISIBLE_HEIGHT
        }
    }

    /// Rendered height of the transcript at the current pane width.
    pub fn content_height(&self) -> u16 {
        let width = if self.chat_width > 0 {
            self.chat_width
        } else {
            DEFAULT_WRAP_WIDTH
        };
        let lines = ui::transcript_paragraph(self.transcript(), self.animation_frame)
            .line_count(width);
        u16::try_from(lines).unwrap_or(u16::MAX)
    }
}
