//! Plain-text rendering of a results view.

use std::fmt::Write;

use crate::api::Poll;
use crate::realtime::{ChannelState, ResultsView};

/// Notice shown once live updates have stopped for good.
pub const STALE_NOTICE: &str = "results may be out of date: live updates stopped";

/// Render `view`, using `poll` (when known) for titles and option order.
pub fn render_results(view: &ResultsView, poll: Option<&Poll>) -> String {
    let mut out = String::new();

    let poll_id = view.poll_id.as_deref().unwrap_or("-");
    let title = poll.map(|p| p.title.as_str()).unwrap_or(poll_id);
    let _ = writeln!(out, "{} [{}]", title, status_label(&view.state));

    if let Some(created_at) = poll.and_then(|p| p.created_at) {
        let _ = writeln!(out, "  created {}", created_at.format("%Y-%m-%d %H:%M UTC"));
    }

    let rows: Vec<(String, u64)> = match poll {
        Some(poll) => poll
            .options
            .iter()
            .map(|o| (o.title.clone(), view.tally.get(&o.id).unwrap_or(0)))
            .collect(),
        None => view
            .tally
            .entries()
            .into_iter()
            .map(|entry| (entry.option_id, entry.vote_count))
            .collect(),
    };

    if rows.is_empty() {
        let _ = writeln!(out, "  (no votes yet)");
    } else {
        let width = rows
            .iter()
            .map(|(label, _)| label.chars().count())
            .chain([TOTAL_LABEL.len()])
            .max()
            .unwrap_or(0);
        for (label, votes) in &rows {
            write_row(&mut out, label, *votes, width);
        }
        write_row(&mut out, TOTAL_LABEL, view.tally.total(), width);
    }

    if view.is_stale() {
        let _ = writeln!(out, "  ! {}", STALE_NOTICE);
    }

    out
}

const TOTAL_LABEL: &str = "Total";

fn write_row(out: &mut String, label: &str, votes: u64, width: usize) {
    let noun = if votes == 1 { "vote" } else { "votes" };
    let _ = writeln!(out, "  {:<width$}  {} {}", label, votes, noun, width = width);
}

fn status_label(state: &ChannelState) -> String {
    match state {
        ChannelState::Open => "live".to_string(),
        ChannelState::Idle => "snapshot".to_string(),
        ChannelState::Abandoned => "stale".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::PollOption;
    use crate::realtime::{Tally, VoteDelta};

    fn poll() -> Poll {
        Poll {
            id: "p1".to_string(),
            title: "Lunch?".to_string(),
            created_at: None,
            options: vec![
                PollOption { id: "o2".to_string(), title: "Pizza".to_string(), score: 0 },
                PollOption { id: "o1".to_string(), title: "Salad".to_string(), score: 0 },
            ],
        }
    }

    #[test]
    fn test_renders_in_poll_order() {
        let mut view = ResultsView::from_poll(&poll());
        view.tally.apply(&VoteDelta { poll_option_id: "o1".to_string(), votes: 1 });
        view.tally.apply(&VoteDelta { poll_option_id: "o2".to_string(), votes: 4 });
        view.state = ChannelState::Open;

        let text = render_results(&view, Some(&poll()));
        assert_eq!(
            text,
            "Lunch? [live]\n  Pizza  4 votes\n  Salad  1 vote\n  Total  5 votes\n"
        );
    }

    #[test]
    fn test_stale_notice() {
        let mut view = ResultsView::from_poll(&poll());
        view.state = ChannelState::Abandoned;

        let text = render_results(&view, Some(&poll()));
        assert!(text.starts_with("Lunch? [stale]"));
        assert!(text.contains(STALE_NOTICE));
    }

    #[test]
    fn test_unseeded_view_uses_option_ids() {
        let mut tally = Tally::open();
        tally.apply(&VoteDelta { poll_option_id: "b".to_string(), votes: 2 });
        let view = ResultsView {
            poll_id: Some("p9".to_string()),
            tally,
            state: ChannelState::Connecting,
        };

        let text = render_results(&view, None);
        assert_eq!(text, "p9 [connecting]\n  b      2 votes\n  Total  2 votes\n");
    }

    #[test]
    fn test_empty_view() {
        let text = render_results(&ResultsView::default(), None);
        assert_eq!(text, "- [snapshot]\n  (no votes yet)\n");
    }
}
