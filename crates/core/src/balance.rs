//! Delimiter balance counting over a text fragment.
//!
//! Delimiters are literal substrings and may span several characters (`/*`,
//! `*/`, `<%`, ...). The same routine balances block bodies and the
//! parenthesized argument lists that precede them.

/// Outcome of balancing one fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Balance {
    /// A change brought the depth back to zero. `end` is the byte offset just
    /// past the delimiter that closed it.
    Closed { end: usize },
    /// The fragment ended without closing; `depth` is the updated counter.
    Open { depth: usize },
}

impl Balance {
    pub fn is_closed(&self) -> bool {
        matches!(self, Balance::Closed { .. })
    }
}

/// Balance `text` starting from `depth`.
///
/// `open` increments the counter; `close` decrements it only while it is at
/// least one. The scan stops at the first change that lands on zero. Matching
/// is byte-wise, which is safe for UTF-8 delimiters: a complete encoded
/// delimiter can only begin on a character boundary.
pub fn scan_balance(text: &str, depth: usize, open: &str, close: &str) -> Balance {
    let bytes = text.as_bytes();
    let (open, close) = (open.as_bytes(), close.as_bytes());
    let width = open.len().max(close.len());

    if bytes.len() < width {
        return Balance::Open { depth };
    }

    let mut depth = depth;
    let mut i = 0;
    // A delimiter is only tested where the wider of the two still fits.
    while i + width <= bytes.len() {
        let rest = &bytes[i..];
        if rest.starts_with(open) {
            depth += 1;
            i += open.len();
        } else if depth >= 1 && rest.starts_with(close) {
            depth -= 1;
            i += close.len();
            if depth == 0 {
                return Balance::Closed { end: i };
            }
        } else {
            i += 1;
        }
    }

    Balance::Open { depth }
}
