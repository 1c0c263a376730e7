//! Busy indicators: spinner, progress bar and text animation.
//!
//! Rendering belongs to the host. These types only hold the state a host
//! needs to draw them, and the context keeps them mutually exclusive.

use std::time::Instant;

/// Braille spinner frames.
const BRAILLE_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Dot animation frames for text animation.
const DOT_FRAMES: &[&str] = &["", ".", "..", "..."];

/// Animation speed in milliseconds per frame.
const FRAME_DURATION_MS: u128 = 100;

/// Width of the rendered progress bar in cells.
const PROGRESS_BAR_WIDTH: usize = 20;

/// A "something is running" signal.
pub trait BusyIndicator {
    /// Makes the indicator visible.
    fn show(&mut self);
    /// Hides the indicator.
    fn hide(&mut self);
    /// Whether the indicator is visible.
    fn is_running(&self) -> bool;
}

/// Which indicator is involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorKind {
    Spinner,
    ProgressBar,
    TextAnimation,
}

/// Animated braille spinner with a label.
#[derive(Debug, Clone)]
pub struct Spinner {
    label: String,
    started: Option<Instant>,
}

impl Spinner {
    /// Creates a hidden spinner with the given label.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            started: None,
        }
    }

    /// Returns the label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the current frame of the animation.
    pub fn frame(&self) -> &'static str {
        let elapsed_ms = self.started.map_or(0, |start| start.elapsed().as_millis());
        let frame_index = (elapsed_ms / FRAME_DURATION_MS) as usize;
        BRAILLE_FRAMES[frame_index % BRAILLE_FRAMES.len()]
    }

    /// Returns the display string for the spinner.
    pub fn display(&self) -> String {
        format!("{} {}", self.frame(), self.label)
    }
}

impl Default for Spinner {
    fn default() -> Self {
        Self::new("Working")
    }
}

impl BusyIndicator for Spinner {
    fn show(&mut self) {
        self.started = Some(Instant::now());
    }

    fn hide(&mut self) {
        self.started = None;
    }

    fn is_running(&self) -> bool {
        self.started.is_some()
    }
}

/// Determinate progress bar.
#[derive(Debug, Clone, Default)]
pub struct ProgressBar {
    running: bool,
    percent: u8,
}

impl ProgressBar {
    /// Creates a hidden progress bar at 0%.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the progress, clamped to 100.
    pub fn set_progress(&mut self, percent: u8) {
        self.percent = percent.min(100);
    }

    /// Returns the progress in percent.
    pub fn progress(&self) -> u8 {
        self.percent
    }

    /// Returns the display string, e.g. `[#####---------------] 25%`.
    pub fn display(&self) -> String {
        let filled = PROGRESS_BAR_WIDTH * self.percent as usize / 100;
        format!(
            "[{}{}] {}%",
            "#".repeat(filled),
            "-".repeat(PROGRESS_BAR_WIDTH - filled),
            self.percent
        )
    }
}

impl BusyIndicator for ProgressBar {
    fn show(&mut self) {
        self.running = true;
        self.percent = 0;
    }

    fn hide(&mut self) {
        self.running = false;
    }

    fn is_running(&self) -> bool {
        self.running
    }
}

/// Text followed by animated dots ("Loading...").
#[derive(Debug, Clone)]
pub struct TextAnimator {
    text: String,
    started: Option<Instant>,
}

impl TextAnimator {
    /// Creates a hidden animator with the given text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            started: None,
        }
    }

    /// Returns the display string for the current frame.
    pub fn display(&self) -> String {
        let elapsed_ms = self.started.map_or(0, |start| start.elapsed().as_millis());
        let frame_index = (elapsed_ms / FRAME_DURATION_MS) as usize;
        format!("{}{}", self.text, DOT_FRAMES[frame_index % DOT_FRAMES.len()])
    }
}

impl Default for TextAnimator {
    fn default() -> Self {
        Self::new("Loading")
    }
}

impl BusyIndicator for TextAnimator {
    fn show(&mut self) {
        self.started = Some(Instant::now());
    }

    fn hide(&mut self) {
        self.started = None;
    }

    fn is_running(&self) -> bool {
        self.started.is_some()
    }
}

/// The three indicators of one context. At most one runs at a time.
#[derive(Debug, Clone, Default)]
pub struct BusyIndicators {
    spinner: Spinner,
    progress_bar: ProgressBar,
    text_animator: TextAnimator,
}

impl BusyIndicators {
    pub fn spinner(&self) -> &Spinner {
        &self.spinner
    }

    pub fn progress_bar(&self) -> &ProgressBar {
        &self.progress_bar
    }

    pub fn text_animator(&self) -> &TextAnimator {
        &self.text_animator
    }

    /// Moves the progress bar. Does not show it.
    pub fn set_progress(&mut self, percent: u8) {
        self.progress_bar.set_progress(percent);
    }

    /// Shows one indicator, hiding the others.
    pub fn show(&mut self, kind: IndicatorKind) {
        self.hide_all();
        self.indicator_mut(kind).show();
    }

    /// Hides one indicator.
    pub fn hide(&mut self, kind: IndicatorKind) {
        self.indicator_mut(kind).hide();
    }

    /// Hides every indicator.
    pub fn hide_all(&mut self) {
        self.spinner.hide();
        self.progress_bar.hide();
        self.text_animator.hide();
    }

    /// Whether any indicator is running.
    pub fn is_progress_running(&self) -> bool {
        self.active().is_some()
    }

    /// The running indicator, if any.
    pub fn active(&self) -> Option<IndicatorKind> {
        if self.spinner.is_running() {
            Some(IndicatorKind::Spinner)
        } else if self.progress_bar.is_running() {
            Some(IndicatorKind::ProgressBar)
        } else if self.text_animator.is_running() {
            Some(IndicatorKind::TextAnimation)
        } else {
            None
        }
    }

    fn indicator_mut(&mut self, kind: IndicatorKind) -> &mut dyn BusyIndicator {
        match kind {
            IndicatorKind::Spinner => &mut self.spinner,
            IndicatorKind::ProgressBar => &mut self.progress_bar,
            IndicatorKind::TextAnimation => &mut self.text_animator,
        }
    }
}
