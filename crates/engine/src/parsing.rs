//! Free-text expense message parsing.
//!
//! Turns a raw WhatsApp message body into a draft expense, or nothing. The
//! grammar is a single case-insensitive pattern:
//!
//! ```text
//! spent <digits> [rs|₹] on <phrase>
//! ```
//!
//! Matching is whitespace-flexible between tokens and the trailing phrase is
//! kept verbatim apart from surrounding-whitespace trimming.

use std::sync::LazyLock;

use regex::Regex;

#[allow(clippy::expect_used)]
static EXPENSE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)spent\s+(\d+)\s*(?:rs|₹)?\s*on\s+(.+)").expect("pattern is well-formed")
});

/// An in-memory, not-yet-persisted candidate expense derived from text.
#[derive(Clone, Debug, PartialEq)]
pub struct ExpenseDraft {
    pub amount: f64,
    pub category: String,
    pub description: String,
}

/// Parses a message body into an [`ExpenseDraft`].
///
/// Returns `None` when the text does not match the grammar; callers branch on
/// the option, never on an error. Pure and referentially transparent.
///
/// Known limitation: the amount capture is an integer digit run, so a message
/// with a decimal amount ("spent 10.50 on ...") does not match at all — the
/// dot blocks the `on` keyword. Extending the grammar means adding pattern
/// alternatives here, not touching callers.
pub fn parse_expense_message(text: &str) -> Option<ExpenseDraft> {
    let captures = EXPENSE_PATTERN.captures(text)?;

    // The digit run always parses: the capture is `\d+` with no sign, dot or
    // separator, and overflow saturates within f64 range.
    let amount: f64 = captures.get(1)?.as_str().parse().ok()?;
    let phrase = captures.get(2)?.as_str().trim();

    Some(ExpenseDraft {
        amount,
        category: phrase.to_string(),
        description: phrase.to_string(),
    })
}
