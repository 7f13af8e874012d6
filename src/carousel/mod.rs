//! Hero carousel: slide state, autoplay timer, markup.
//!
//! - **State**: [`CarouselState`] is a pure state machine (no clock, no I/O).
//! - **Timer**: [`AutoplayTimer`] is a scoped tokio task, cancelled on drop.
//! - **Render**: [`render_carousel`] turns banners + state into maud markup.
//!
//! [`Carousel`] ties them together. It keeps exactly one timer armed while
//! autoplay is on and there is at least one slide, re-arms a fresh one
//! whenever either of those inputs changes, and releases it when the carousel
//! is dropped.

mod render;
mod state;
mod timer;

pub use render::{
    BannerImage, CarouselBlock, HeroBanner, Link, render_carousel, render_hero_banner,
};
pub use state::CarouselState;
pub use timer::AutoplayTimer;

use crate::config::CarouselConfig;
use maud::Markup;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Autoplay period used when none is configured.
pub const AUTOPLAY_INTERVAL: Duration = Duration::from_millis(5000);

/// A titled carousel of hero banners with autoplay.
///
/// Must be created inside a tokio runtime: autoplay runs as a spawned task.
#[derive(Debug)]
pub struct Carousel {
    title: String,
    banners: Vec<HeroBanner>,
    state: Arc<Mutex<CarouselState>>,
    interval: Duration,
    timer: Option<AutoplayTimer>,
    /// `(auto_playing, slide_count)` the current timer was armed for.
    armed_for: Option<(bool, usize)>,
}

fn lock(state: &Mutex<CarouselState>) -> MutexGuard<'_, CarouselState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Carousel {
    pub fn new(title: impl Into<String>, banners: Vec<HeroBanner>, interval: Duration) -> Self {
        let state = CarouselState::new(banners.len());
        let mut carousel = Self {
            title: title.into(),
            banners,
            state: Arc::new(Mutex::new(state)),
            interval,
            timer: None,
            armed_for: None,
        };
        carousel.sync_timer();
        carousel
    }

    pub fn from_config(
        title: impl Into<String>,
        banners: Vec<HeroBanner>,
        config: &CarouselConfig,
    ) -> Self {
        Self::new(
            title,
            banners,
            Duration::from_millis(config.autoplay_interval_ms),
        )
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn banners(&self) -> &[HeroBanner] {
        &self.banners
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> CarouselState {
        *lock(&self.state)
    }

    pub fn is_timer_armed(&self) -> bool {
        self.timer.is_some()
    }

    pub fn next(&mut self) {
        lock(&self.state).next();
        self.sync_timer();
    }

    pub fn previous(&mut self) {
        lock(&self.state).previous();
        self.sync_timer();
    }

    /// Jump to slide `index`. Returns `false` if it is out of range.
    pub fn jump_to(&mut self, index: usize) -> bool {
        let moved = lock(&self.state).jump_to(index);
        self.sync_timer();
        moved
    }

    /// Replace the banners, keeping the index in range.
    pub fn set_banners(&mut self, banners: Vec<HeroBanner>) {
        lock(&self.state).set_slide_count(banners.len());
        self.banners = banners;
        self.sync_timer();
    }

    pub fn render(&self) -> Markup {
        render_carousel(&self.title, &self.banners, &self.state())
    }

    /// Re-arm or release the timer if its governing inputs changed.
    fn sync_timer(&mut self) {
        let state = self.state();
        let inputs = (state.is_auto_playing(), state.slide_count());
        if self.armed_for == Some(inputs) {
            return;
        }
        self.armed_for = Some(inputs);
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
        if state.wants_autoplay() {
            let shared = Arc::clone(&self.state);
            self.timer = Some(AutoplayTimer::start(self.interval, move || {
                lock(&shared).tick();
            }));
        }
    }
}
