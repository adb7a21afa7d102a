//! Streaming selector matcher.
//!
//! A single-pass state machine driven by [`HtmlEvent`]s pushed from an
//! event source. It never looks ahead or rewinds: a match opens a new
//! [`Candidate`], any other element start returns the machine to idle, and
//! text events are appended to the current candidate, if any.

use crate::types::Candidate;

/// HTML event consumed by the matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlEvent<'a> {
    /// Some element opened. Precedes `MatchStart` for a matching element.
    ElementStart,
    /// An element matching the composed selector opened.
    MatchStart { href: Option<String> },
    /// A chunk of text inside a matched element. One text node may arrive
    /// in many chunks.
    Text(&'a str),
    /// The `ordinal`-th matched element (counting from zero) closed.
    MatchEnd { ordinal: usize },
}

/// Receiver of HTML events.
pub trait EventSink {
    fn handle_event(&mut self, event: HtmlEvent<'_>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum State {
    #[default]
    Idle,
    /// Text goes to `candidates[index]`.
    Accumulating { index: usize },
}

/// Turns an event stream into candidates in document order.
#[derive(Debug, Default)]
pub struct SelectorMatcher {
    candidates: Vec<Candidate>,
    state: State,
}

impl SelectorMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the matcher, returning every candidate in document order.
    pub fn finish(self) -> Vec<Candidate> {
        self.candidates
    }
}

impl EventSink for SelectorMatcher {
    fn handle_event(&mut self, event: HtmlEvent<'_>) {
        match event {
            HtmlEvent::ElementStart => self.state = State::Idle,
            HtmlEvent::MatchStart { href } => {
                self.candidates.push(Candidate::new(href));
                self.state = State::Accumulating {
                    index: self.candidates.len() - 1,
                };
            }
            HtmlEvent::Text(text) => {
                if let State::Accumulating { index } = self.state {
                    if let Some(candidate) = self.candidates.get_mut(index) {
                        candidate.text.push_str(text);
                    }
                }
            }
            HtmlEvent::MatchEnd { ordinal } => {
                if self.state == (State::Accumulating { index: ordinal }) {
                    self.state = State::Idle;
                }
            }
        }
    }
}
