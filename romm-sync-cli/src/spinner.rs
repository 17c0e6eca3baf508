//! Spinners for per-platform progress.
//!
//! One line per platform, each ticking until its work finishes and the line
//! is replaced with a result message.

use std::collections::HashMap;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("  {spinner:.cyan} {msg}")
        .expect("static pattern")
        .tick_chars("/-\\|")
}

/// A single spinner; hidden when `quiet`.
pub(crate) fn spinner(msg: impl Into<String>, quiet: bool) -> ProgressBar {
    let pb = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    pb.set_style(spinner_style());
    pb.set_message(msg.into());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Spinners keyed by platform id.
pub(crate) struct PlatformSpinners {
    mp: MultiProgress,
    bars: HashMap<u64, ProgressBar>,
}

impl PlatformSpinners {
    /// Start one spinner per `(id, message)`.
    pub(crate) fn new<'a>(platforms: impl IntoIterator<Item = (u64, &'a str)>, quiet: bool) -> Self {
        let mp = if quiet {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        } else {
            MultiProgress::new()
        };
        let bars = platforms
            .into_iter()
            .map(|(id, msg)| {
                let pb = mp.add(ProgressBar::new_spinner());
                pb.set_style(spinner_style());
                pb.set_message(msg.to_string());
                pb.enable_steady_tick(Duration::from_millis(100));
                (id, pb)
            })
            .collect();
        Self { mp, bars }
    }

    /// Remove a platform's spinner and log `msg` above the remaining ones.
    pub(crate) fn finish(&self, id: u64, msg: String) {
        if let Some(pb) = self.bars.get(&id) {
            pb.finish_and_clear();
        }
        self.mp.suspend(|| log::info!("{}", msg));
    }

    /// Clear every line still ticking.
    pub(crate) fn clear_all(&self) {
        for pb in self.bars.values() {
            if !pb.is_finished() {
                pb.finish_and_clear();
            }
        }
    }
}
