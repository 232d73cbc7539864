//! Terminal progress bars driven by library progress events.

use std::sync::{Arc, Mutex};

use indicatif::{ProgressBar, ProgressStyle};
use sphere2cube::{Progress, ProgressEvent, Stage};

const BAR_TEMPLATE: &str = "{msg:28} [{bar:40.cyan/blue}] {pos}/{len} ({eta})";

/// Shows one bar per stage, replacing it when the stage changes.
#[derive(Default)]
struct StageBars {
    current: Option<(Stage, ProgressBar)>,
}

impl StageBars {
    fn handle(&mut self, event: ProgressEvent) {
        let bar = match &self.current {
            Some((stage, bar)) if *stage == event.stage => bar.clone(),
            _ => {
                if let Some((_, previous)) = self.current.take() {
                    previous.finish();
                }
                let bar = ProgressBar::new(event.total).with_style(bar_style());
                bar.set_message(event.stage.to_string());
                self.current = Some((event.stage, bar.clone()));
                bar
            }
        };

        bar.set_length(event.total);
        bar.set_position(event.completed);
        if event.completed >= event.total {
            bar.finish();
        }
    }

    fn finish(&mut self) {
        if let Some((_, bar)) = self.current.take() {
            bar.finish();
        }
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template(BAR_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}

/// Progress sink for the converter plus a handle to close the last bar.
#[derive(Default)]
pub struct ProgressDisplay {
    bars: Arc<Mutex<StageBars>>,
}

impl ProgressDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Library progress handle feeding this display.
    pub fn progress(&self) -> Progress {
        let bars = Arc::clone(&self.bars);
        Progress::from_fn(move |event| {
            if let Ok(mut bars) = bars.lock() {
                bars.handle(event);
            }
        })
    }

    /// Finish whatever bar is still open.
    pub fn finish(&self) {
        if let Ok(mut bars) = self.bars.lock() {
            bars.finish();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sphere2cube::projection::Face;

    #[test]
    fn test_stage_change_replaces_bar() {
        let mut bars = StageBars::default();
        bars.handle(ProgressEvent {
            stage: Stage::Decode,
            total: 10,
            completed: 3,
        });
        bars.handle(ProgressEvent {
            stage: Stage::Face(Face::Front),
            total: 4,
            completed: 1,
        });

        let (stage, bar) = bars.current.as_ref().unwrap();
        assert_eq!(*stage, Stage::Face(Face::Front));
        assert_eq!(bar.position(), 1);
        assert_eq!(bar.length(), Some(4));
    }

    #[test]
    fn test_display_handle_accepts_events() {
        let display = ProgressDisplay::new();
        let progress = display.progress();
        progress.begin(Stage::Decode, 2);
        progress.finish(Stage::Decode, 2);
        display.finish();
        assert!(display.bars.lock().unwrap().current.is_none());
    }
}
