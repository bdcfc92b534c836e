//! Coreference bracket notation: spans, markers, and span reconstruction.
//!
//! The CoNLL-2012 coreference column encodes mention spans with numbered
//! brackets over the token sequence of one sentence:
//!
//! ```text
//! (N    entity N's mention starts at this token
//! N)    entity N's mention ends at this token (inclusive)
//! (N)   a single-token mention of entity N
//! -     no markers at this token
//! ```
//!
//! Multiple markers on one token are joined with `|`, e.g. `(1|(2` opens two
//! spans at once and `1)|(3)` closes entity 1 while emitting a complete
//! single-token mention of entity 3. Spans may nest or cross arbitrarily, and
//! the same entity id may open several times before any close (re-entrant
//! same-entity nesting), so pending opens are tracked per id, most recent
//! first.
//!
//! Reconstruction is strict: a close marker with no pending open, or a
//! sentence ending with pending opens, is an [`UnbalancedBracket`] error
//! rather than a silently dropped span.
//!
//! [`UnbalancedBracket`]: crate::Error::UnbalancedBracket

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::mention::Mention;
use crate::record::AnnotationRecord;

// =============================================================================
// Span
// =============================================================================

/// A contiguous token range within one sentence, inclusive on both ends.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Span {
    /// Index of the first token (inclusive).
    pub start: usize,
    /// Index of the last token (inclusive).
    pub end: usize,
}

impl Span {
    /// Create a span over `[start, end]` token indices.
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Number of tokens covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    /// A span is never empty; provided for clippy symmetry with [`Span::len`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// True if this span ends strictly before `other` starts.
    ///
    /// This is the pairing filter for intra-sentence candidates: an
    /// antecedent must fully precede its anaphor.
    #[must_use]
    pub fn precedes(&self, other: &Span) -> bool {
        self.end < other.start
    }

    /// True if the two spans share at least one token.
    #[must_use]
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

// =============================================================================
// Markers
// =============================================================================

/// One bracket marker from a coreference field, in field order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Marker {
    pub entity: u64,
    /// `(N` or `(N)`
    pub opens: bool,
    /// `N)` or `(N)`
    pub closes: bool,
}

/// Parse one coreference field into its markers, preserving field order.
///
/// `-` (and `_`, which some tool chains emit for empty columns) yields no
/// markers. `line` is only used for error context.
pub(crate) fn parse_markers(field: &str, line: usize) -> Result<Vec<Marker>> {
    if field == "-" || field == "_" {
        return Ok(Vec::new());
    }
    let mut markers = Vec::new();
    for tok in field.split('|') {
        let opens = tok.starts_with('(');
        let closes = tok.ends_with(')');
        if !opens && !closes {
            return Err(Error::malformed(
                line,
                format!("coreference marker `{tok}` has no bracket"),
            ));
        }
        let digits = tok.trim_start_matches('(').trim_end_matches(')');
        let entity: u64 = digits.parse().map_err(|_| {
            Error::malformed(line, format!("coreference marker `{tok}` has no entity id"))
        })?;
        markers.push(Marker {
            entity,
            opens,
            closes,
        });
    }
    Ok(markers)
}

// =============================================================================
// Reconstruction
// =============================================================================

/// Recover the mention spans encoded by one sentence's coreference column.
///
/// Scans tokens left to right, pushing each `(N` onto a per-entity stack of
/// pending opens and popping the most recent pending open on each `N)`.
/// Markers within one field are processed in field order, so `1)|(1` closes
/// the pending entity-1 span before opening a new one, and `(1)` opens and
/// closes on the same token.
///
/// Mentions are produced in close order (ascending end token). Unbalanced
/// notation fails fast with [`Error::UnbalancedBracket`].
pub(crate) fn reconstruct_mentions(
    sentence: usize,
    records: &[AnnotationRecord],
) -> Result<Vec<Mention>> {
    let mut pending: HashMap<u64, Vec<usize>> = HashMap::new();
    let mut mentions = Vec::new();

    for (token, record) in records.iter().enumerate() {
        for marker in parse_markers(&record.coref, record.line)? {
            if marker.opens {
                pending.entry(marker.entity).or_default().push(token);
            }
            if marker.closes {
                let start = pending
                    .get_mut(&marker.entity)
                    .and_then(Vec::pop)
                    .ok_or_else(|| Error::unbalanced_close(record.line, marker.entity))?;
                mentions.push(Mention::gold(sentence, Span::new(start, token), marker.entity));
            }
        }
    }

    let open: usize = pending.values().map(Vec::len).sum();
    if open > 0 {
        let line = records.last().map_or(0, |r| r.line);
        return Err(Error::unclosed_spans(line, open));
    }
    Ok(mentions)
}
