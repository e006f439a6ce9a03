//! Step-indexed briefing sequencer.
//!
//! The opening guidance dialog is a line index plus an elapsed reveal timer,
//! advanced by confirmation commands. A confirmation on a line still being
//! revealed completes the reveal; a confirmation on a fully revealed line
//! moves to the next one. Text content and its rendering live outside the
//! simulation.

use std::time::Duration;

use ark_descent_core::Event;

/// Upper bound on how long one line spends revealing.
const LINE_REVEAL: Duration = Duration::from_secs(2);

#[derive(Clone, Debug)]
pub(crate) struct Briefing {
    total_lines: usize,
    line: usize,
    elapsed_in_line: Duration,
    complete: bool,
}

impl Briefing {
    pub(crate) fn new(total_lines: usize) -> Self {
        Self {
            total_lines,
            line: 0,
            elapsed_in_line: Duration::ZERO,
            complete: total_lines == 0,
        }
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.complete
    }

    /// Advances the reveal timer of the current line.
    pub(crate) fn tick(&mut self, dt: Duration) {
        if self.complete {
            return;
        }
        self.elapsed_in_line = self.elapsed_in_line.saturating_add(dt).min(LINE_REVEAL);
    }

    /// Applies one confirmation; returns `true` when this one finished the
    /// briefing.
    pub(crate) fn confirm(&mut self, out: &mut Vec<Event>) -> bool {
        if self.complete {
            return false;
        }

        if self.elapsed_in_line < LINE_REVEAL {
            self.elapsed_in_line = LINE_REVEAL;
            return false;
        }

        self.line += 1;
        self.elapsed_in_line = Duration::ZERO;
        if self.line >= self.total_lines {
            self.complete = true;
            out.push(Event::BriefingCompleted);
            return true;
        }
        out.push(Event::BriefingAdvanced { line: self.line });
        false
    }
}
