use tokio::sync::watch;

use crate::models::extraction::{AnalysisResult, ExtractionResult};
use crate::models::job::ExtractionMode;
use crate::models::progress::ProgressSnapshot;

/// What the user is looking at. Exactly one panel at a time, so the two
/// result panels can never be visible together.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum View {
    #[default]
    Idle,
    /// Synchronous extraction in flight, awaiting the single response.
    Loading,
    /// Asynchronous job in flight, showing the latest snapshot delivered.
    Progress(ProgressSnapshot),
    TextResult(ExtractionResult),
    ImageResult(AnalysisResult),
    Error(String),
}

impl View {
    pub fn name(&self) -> &'static str {
        match self {
            View::Idle => "idle",
            View::Loading => "loading",
            View::Progress(_) => "progress",
            View::TextResult(_) => "text-result",
            View::ImageResult(_) => "image-result",
            View::Error(_) => "error",
        }
    }
}

/// Inputs that drive the view.
#[derive(Debug, Clone)]
pub enum ViewEvent {
    /// New submission or mode switch: clear result panels and the error slot.
    Reset,
    SubmissionStarted(ExtractionMode),
    Snapshot(ProgressSnapshot),
    TextReady(ExtractionResult),
    ImageReady(AnalysisResult),
    Failed(String),
}

/// Pure transition function. Total: events that make no sense in the current
/// state leave it unchanged, so a stale completion or snapshot can never
/// resurrect a panel.
pub fn transition(view: View, event: ViewEvent) -> View {
    match (view, event) {
        (_, ViewEvent::Reset) => View::Idle,
        // A new error replaces whatever was shown, including a previous error.
        (_, ViewEvent::Failed(message)) => View::Error(message),
        (
            View::Idle | View::TextResult(_) | View::ImageResult(_) | View::Error(_),
            ViewEvent::SubmissionStarted(mode),
        ) => match mode {
            ExtractionMode::Text => View::Loading,
            ExtractionMode::Image => View::Progress(ProgressSnapshot::initial()),
        },
        (View::Progress(_), ViewEvent::Snapshot(snapshot)) => View::Progress(snapshot),
        (View::Loading | View::Progress(_), ViewEvent::TextReady(result)) => {
            View::TextResult(result)
        }
        (View::Loading | View::Progress(_), ViewEvent::ImageReady(result)) => {
            View::ImageResult(result)
        }
        (view, _) => view,
    }
}

/// Serializes view transitions and broadcasts the latest state. Observers
/// subscribe to a watch channel, which gives them last-write-wins snapshot
/// semantics: whoever reads sees only the most recent view.
#[derive(Debug)]
pub struct ViewStateMachine {
    tx: watch::Sender<View>,
}

impl ViewStateMachine {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(View::Idle);
        Self { tx }
    }

    pub fn current(&self) -> View {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<View> {
        self.tx.subscribe()
    }

    /// Apply one event atomically and return the resulting view.
    pub fn apply(&self, event: ViewEvent) -> View {
        let mut next = View::Idle;
        self.tx.send_modify(|view| {
            let previous = view.name();
            *view = transition(std::mem::take(view), event);
            tracing::debug!(from = previous, to = view.name(), "view transition");
            next = view.clone();
        });
        next
    }
}

impl Default for ViewStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(percentage: u8) -> ProgressSnapshot {
        ProgressSnapshot {
            percentage,
            message: format!("at {}", percentage),
            current: u32::from(percentage) / 20,
            total: 5,
            eta_seconds: None,
        }
    }

    fn text_result() -> ExtractionResult {
        ExtractionResult {
            text: "Hello".to_string(),
            filename: "a.pdf".to_string(),
            method: crate::models::extraction::ExtractionMethod::Layout,
            ocr_used: false,
        }
    }

    fn image_result() -> AnalysisResult {
        AnalysisResult {
            filename: "a.pdf".to_string(),
            total_images: 5,
            processed: 4,
            skipped: 1,
            items: vec![],
            export_file: None,
        }
    }

    #[test]
    fn test_submission_enters_loading_or_progress() {
        assert_eq!(
            transition(View::Idle, ViewEvent::SubmissionStarted(ExtractionMode::Text)),
            View::Loading
        );
        assert!(matches!(
            transition(View::Idle, ViewEvent::SubmissionStarted(ExtractionMode::Image)),
            View::Progress(_)
        ));
    }

    #[test]
    fn test_displayed_percentage_is_last_delivered_not_highest() {
        // Snapshots reordered by the network: 10, 55, then a late 40.
        let machine = ViewStateMachine::new();
        machine.apply(ViewEvent::SubmissionStarted(ExtractionMode::Image));
        machine.apply(ViewEvent::Snapshot(snapshot(10)));
        machine.apply(ViewEvent::Snapshot(snapshot(55)));
        let view = machine.apply(ViewEvent::Snapshot(snapshot(40)));

        match view {
            View::Progress(current) => assert_eq!(current.percentage, 40),
            other => panic!("expected progress, got {}", other.name()),
        }
    }

    #[test]
    fn test_progress_never_returns_to_loading() {
        let view = transition(
            View::Progress(snapshot(50)),
            ViewEvent::SubmissionStarted(ExtractionMode::Text),
        );
        assert!(matches!(view, View::Progress(_)));
    }

    #[test]
    fn test_progress_exits_only_to_results_or_error() {
        assert!(matches!(
            transition(View::Progress(snapshot(80)), ViewEvent::ImageReady(image_result())),
            View::ImageResult(_)
        ));
        assert!(matches!(
            transition(View::Progress(snapshot(80)), ViewEvent::Failed("boom".into())),
            View::Error(_)
        ));
    }

    #[test]
    fn test_late_snapshot_never_resurrects_the_bar() {
        let terminal = transition(View::Progress(snapshot(90)), ViewEvent::ImageReady(image_result()));
        let after = transition(terminal.clone(), ViewEvent::Snapshot(snapshot(95)));
        assert_eq!(after, terminal);

        let idle = transition(View::Idle, ViewEvent::Snapshot(snapshot(95)));
        assert_eq!(idle, View::Idle);
    }

    #[test]
    fn test_error_reachable_from_every_state() {
        let states = [
            View::Idle,
            View::Loading,
            View::Progress(snapshot(10)),
            View::TextResult(text_result()),
            View::ImageResult(image_result()),
            View::Error("old".to_string()),
        ];

        for state in states {
            let view = transition(state, ViewEvent::Failed("new".to_string()));
            assert_eq!(view, View::Error("new".to_string()));
        }
    }

    #[test]
    fn test_reset_clears_any_panel() {
        assert_eq!(transition(View::TextResult(text_result()), ViewEvent::Reset), View::Idle);
        assert_eq!(transition(View::Error("x".into()), ViewEvent::Reset), View::Idle);
        assert_eq!(transition(View::Progress(snapshot(30)), ViewEvent::Reset), View::Idle);
    }

    #[test]
    fn test_stale_completion_ignored_in_terminal_state() {
        let view = transition(View::TextResult(text_result()), ViewEvent::ImageReady(image_result()));
        assert!(matches!(view, View::TextResult(_)));
    }

    #[test]
    fn test_watch_subscribers_see_latest_view() {
        let machine = ViewStateMachine::new();
        let rx = machine.subscribe();

        machine.apply(ViewEvent::SubmissionStarted(ExtractionMode::Text));
        machine.apply(ViewEvent::TextReady(text_result()));

        assert!(matches!(*rx.borrow(), View::TextResult(_)));
    }
}
