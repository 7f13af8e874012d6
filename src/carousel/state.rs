//! Slide position state machine.
//!
//! ```text
//!            tick (autoplay only)
//!        ┌──────────────────────────┐
//!        ▼                          │
//!   (i, playing) ──next/prev/jump──▶ (i', paused)
//! ```
//!
//! The index always stays in `[0, slide_count)`. With no slides every
//! transition is a no-op, so no arithmetic ever divides by zero.

/// Position and autoplay flag of a carousel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarouselState {
    current_index: usize,
    auto_playing: bool,
    slide_count: usize,
}

impl CarouselState {
    /// Initial state: first slide, autoplay on.
    pub fn new(slide_count: usize) -> Self {
        Self {
            current_index: 0,
            auto_playing: true,
            slide_count,
        }
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn is_auto_playing(&self) -> bool {
        self.auto_playing
    }

    pub fn slide_count(&self) -> usize {
        self.slide_count
    }

    pub fn has_slides(&self) -> bool {
        self.slide_count > 0
    }

    /// Whether an autoplay timer should be running for this state.
    pub fn wants_autoplay(&self) -> bool {
        self.auto_playing && self.has_slides()
    }

    /// Horizontal track offset in percent of the viewport width.
    pub fn offset_percent(&self) -> usize {
        self.current_index * 100
    }

    /// Autoplay step. Returns whether the index moved.
    pub fn tick(&mut self) -> bool {
        if !self.wants_autoplay() {
            return false;
        }
        self.current_index = (self.current_index + 1) % self.slide_count;
        true
    }

    /// Manual step forward; stops autoplay.
    pub fn next(&mut self) {
        if !self.has_slides() {
            return;
        }
        self.current_index = (self.current_index + 1) % self.slide_count;
        self.auto_playing = false;
    }

    /// Manual step back; stops autoplay.
    pub fn previous(&mut self) {
        if !self.has_slides() {
            return;
        }
        self.current_index = (self.current_index + self.slide_count - 1) % self.slide_count;
        self.auto_playing = false;
    }

    /// Jump to a slide; stops autoplay. Out-of-range indices are ignored and
    /// return `false`.
    pub fn jump_to(&mut self, index: usize) -> bool {
        if index >= self.slide_count {
            return false;
        }
        self.current_index = index;
        self.auto_playing = false;
        true
    }

    /// Adopt a new slide count, pulling the index back into range.
    pub fn set_slide_count(&mut self, slide_count: usize) {
        self.slide_count = slide_count;
        if self.current_index >= slide_count {
            self.current_index = slide_count.saturating_sub(1);
        }
    }
}

impl Default for CarouselState {
    fn default() -> Self {
        Self::new(0)
    }
}
