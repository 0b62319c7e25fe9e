//! Transcript scroll position.

/// How the transcript viewport is positioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollMode {
    /// Pinned to the newest line.
    FollowLatest,
    /// Held by the user at `offset` lines from the top.
    Anchored { offset: usize },
}

/// Scroll mode plus the line and viewport counts measured on the last frame.
#[derive(Debug, Clone)]
pub struct ScrollState {
    pub mode: ScrollMode,
    pub line_count: usize,
    pub viewport_height: usize,
}

impl Default for ScrollState {
    fn default() -> Self {
        Self {
            mode: ScrollMode::FollowLatest,
            line_count: 0,
            viewport_height: 0,
        }
    }
}

impl ScrollState {
    pub fn is_following(&self) -> bool {
        self.mode == ScrollMode::FollowLatest
    }

    fn max_offset(&self) -> usize {
        self.line_count.saturating_sub(self.viewport_height)
    }

    /// First visible line index.
    pub fn offset(&self) -> usize {
        match self.mode {
            ScrollMode::FollowLatest => self.max_offset(),
            ScrollMode::Anchored { offset } => offset.min(self.max_offset()),
        }
    }

    /// Records the measured sizes of the current frame.
    pub fn measure(&mut self, line_count: usize, viewport_height: usize) {
        self.line_count = line_count;
        self.viewport_height = viewport_height;
    }

    pub fn scroll_up(&mut self, lines: usize) {
        let offset = self.offset().saturating_sub(lines);
        self.mode = ScrollMode::Anchored { offset };
    }

    /// Scrolls down, resuming follow mode once the bottom is reached.
    pub fn scroll_down(&mut self, lines: usize) {
        if self.is_following() {
            return;
        }
        let offset = self.offset().saturating_add(lines);
        self.mode = if offset >= self.max_offset() {
            ScrollMode::FollowLatest
        } else {
            ScrollMode::Anchored { offset }
        };
    }

    pub fn page_up(&mut self) {
        self.scroll_up(self.viewport_height.saturating_sub(1).max(1));
    }

    pub fn page_down(&mut self) {
        self.scroll_down(self.viewport_height.saturating_sub(1).max(1));
    }

    pub fn scroll_to_top(&mut self) {
        self.mode = ScrollMode::Anchored { offset: 0 };
    }

    pub fn scroll_to_bottom(&mut self) {
        self.mode = ScrollMode::FollowLatest;
    }
}
