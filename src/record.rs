//! One CoNLL-2012 token annotation line.
//!
//! Each non-structural line of a CoNLL-2012 file is a whitespace-delimited
//! record with eleven fixed leading columns, a variable-width block of
//! predicate-argument columns (one per predicate in the sentence), and a
//! trailing coreference column:
//!
//! ```text
//! bc/cctv/00/cctv_0000  0  0  Xinhua  NNP  (TOP(S(NP*  -  -  -  speaker1  (ORG)  *  (1
//! col:        0         1  2    3      4       5       6  7  8     9       10   11+  last
//! ```
//!
//! The record keeps the raw input line so output is byte-identical to input
//! everywhere except the coreference column, which is the only field ever
//! rewritten. The rewrite is commit-once: predicted cluster ids are staged on
//! the record ([`AnnotationRecord::mark_open`] / [`mark_close`]) and then
//! committed exactly once; a second commit fails loudly instead of corrupting
//! the line.
//!
//! [`mark_close`]: AnnotationRecord::mark_close

use std::collections::BTreeSet;

use crate::error::{Error, Result};

/// Minimum column count of a token line: 11 fixed leading fields plus the
/// trailing coreference field. The predicate-argument block may be empty.
pub const MIN_FIELDS: usize = 12;

/// A parsed CoNLL-2012 token annotation line.
#[derive(Debug, Clone)]
pub struct AnnotationRecord {
    /// The raw input line (no trailing newline). Updated only when predicted
    /// results are committed, and then only in the final column.
    raw: String,
    /// 1-based line number in the source file, 0 for synthetic records.
    pub line: usize,

    pub document_id: String,
    pub part_number: String,
    pub word_number: String,
    pub word: String,
    pub pos: String,
    pub parse_bit: String,
    pub predicate_lemma: String,
    pub predicate_frameset_id: String,
    pub word_sense: String,
    pub speaker: String,
    pub named_entities: String,
    /// Variable-width predicate-argument block, one column per predicate.
    pub predicate_args: Vec<String>,
    /// The raw coreference field, e.g. `(1|(2`, `3)`, `(4)`, or `-`.
    pub coref: String,

    /// Predicted cluster ids whose mention starts at this token.
    opens: BTreeSet<u64>,
    /// Predicted cluster ids whose mention ends at this token.
    closes: BTreeSet<u64>,
    committed: bool,
}

impl AnnotationRecord {
    /// Parse a token line without file context (line number 0).
    pub fn parse(line: &str) -> Result<Self> {
        Self::parse_at(line, 0)
    }

    /// Parse a token line, recording its 1-based line number for error
    /// reporting.
    pub fn parse_at(text: &str, line: usize) -> Result<Self> {
        let fields: Vec<&str> = text.split_whitespace().collect();
        if fields.len() < MIN_FIELDS {
            return Err(Error::malformed(
                line,
                format!(
                    "expected at least {MIN_FIELDS} fields, got {}",
                    fields.len()
                ),
            ));
        }
        Ok(Self {
            raw: text.trim_end_matches(['\r', '\n']).to_string(),
            line,
            document_id: fields[0].to_string(),
            part_number: fields[1].to_string(),
            word_number: fields[2].to_string(),
            word: fields[3].to_string(),
            pos: fields[4].to_string(),
            parse_bit: fields[5].to_string(),
            predicate_lemma: fields[6].to_string(),
            predicate_frameset_id: fields[7].to_string(),
            word_sense: fields[8].to_string(),
            speaker: fields[9].to_string(),
            named_entities: fields[10].to_string(),
            predicate_args: fields[11..fields.len() - 1]
                .iter()
                .map(|f| f.to_string())
                .collect(),
            coref: fields[fields.len() - 1].to_string(),
            opens: BTreeSet::new(),
            closes: BTreeSet::new(),
            committed: false,
        })
    }

    /// Stage a predicted cluster whose mention starts at this token.
    pub fn mark_open(&mut self, cluster: u64) {
        self.opens.insert(cluster);
    }

    /// Stage a predicted cluster whose mention ends at this token.
    pub fn mark_close(&mut self, cluster: u64) {
        self.closes.insert(cluster);
    }

    /// True once predicted results have been committed into the line.
    #[must_use]
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Render the staged cluster marks as a coreference field.
    ///
    /// Clusters that open but do not close here render `(C`, clusters that
    /// both open and close (single-token mentions) render `(C)`, clusters
    /// that only close render `C)`. Groups are joined with `|` in that order,
    /// ids ascending within each group; no marks renders `-`.
    #[must_use]
    pub fn render_predicted(&self) -> String {
        let start_only = self
            .opens
            .iter()
            .filter(|c| !self.closes.contains(c))
            .map(|c| format!("({c}"));
        let complete = self
            .opens
            .iter()
            .filter(|c| self.closes.contains(c))
            .map(|c| format!("({c})"));
        let end_only = self
            .closes
            .iter()
            .filter(|c| !self.opens.contains(c))
            .map(|c| format!("{c})"));

        let parts: Vec<String> = start_only.chain(complete).chain(end_only).collect();
        if parts.is_empty() {
            "-".to_string()
        } else {
            parts.join("|")
        }
    }

    /// Commit the staged predictions, replacing the coreference column.
    ///
    /// Only the final whitespace-delimited column of the raw line changes;
    /// every other byte of the original line is preserved. Fails with
    /// [`Error::ResultsAlreadyWritten`] on a second call.
    pub fn commit_results(&mut self) -> Result<()> {
        if self.committed {
            return Err(Error::ResultsAlreadyWritten);
        }
        let rendered = self.render_predicted();
        let head = self.raw.trim_end();
        let cut = head
            .char_indices()
            .rev()
            .find(|(_, c)| c.is_whitespace())
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        self.raw = format!("{}{rendered}", &head[..cut]);
        self.coref = rendered;
        self.committed = true;
        Ok(())
    }

    /// The line as it should appear in output (no trailing newline).
    #[must_use]
    pub fn to_line(&self) -> &str {
        &self.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE: &str = "bc/cctv/00/cctv_0000 0 4 police NNS (NP*) police - 2 Speaker#1 * (ARG0*) (ARG1*) (5";

    #[test]
    fn test_parse_named_fields() {
        let rec = AnnotationRecord::parse(LINE).unwrap();
        assert_eq!(rec.document_id, "bc/cctv/00/cctv_0000");
        assert_eq!(rec.part_number, "0");
        assert_eq!(rec.word_number, "4");
        assert_eq!(rec.word, "police");
        assert_eq!(rec.pos, "NNS");
        assert_eq!(rec.parse_bit, "(NP*)");
        assert_eq!(rec.predicate_lemma, "police");
        assert_eq!(rec.predicate_frameset_id, "-");
        assert_eq!(rec.word_sense, "2");
        assert_eq!(rec.speaker, "Speaker#1");
        assert_eq!(rec.named_entities, "*");
        assert_eq!(rec.predicate_args, vec!["(ARG0*)", "(ARG1*)"]);
        assert_eq!(rec.coref, "(5");
    }

    #[test]
    fn test_parse_without_predicate_args() {
        let rec =
            AnnotationRecord::parse("doc 0 0 Hello UH * - - - spk * -").unwrap();
        assert!(rec.predicate_args.is_empty());
        assert_eq!(rec.coref, "-");
    }

    #[test]
    fn test_parse_too_few_fields() {
        let err = AnnotationRecord::parse_at("doc 0 0 word", 17).unwrap_err();
        assert!(matches!(err, Error::MalformedRecord { line: 17, .. }));
    }

    #[test]
    fn test_render_predicted_ordering() {
        let mut rec = AnnotationRecord::parse(LINE).unwrap();
        rec.mark_close(2);
        rec.mark_open(9);
        rec.mark_open(4);
        rec.mark_close(4);
        // start-only, then complete, then end-only; ids ascending per group
        assert_eq!(rec.render_predicted(), "(9|(4)|2)");
    }

    #[test]
    fn test_render_predicted_empty() {
        let rec = AnnotationRecord::parse(LINE).unwrap();
        assert_eq!(rec.render_predicted(), "-");
    }

    #[test]
    fn test_commit_replaces_only_last_column() {
        let mut rec = AnnotationRecord::parse(LINE).unwrap();
        rec.mark_open(0);
        rec.commit_results().unwrap();
        assert_eq!(
            rec.to_line(),
            "bc/cctv/00/cctv_0000 0 4 police NNS (NP*) police - 2 Speaker#1 * (ARG0*) (ARG1*) (0"
        );
        assert_eq!(rec.coref, "(0");
    }

    #[test]
    fn test_commit_preserves_odd_whitespace() {
        let mut rec = AnnotationRecord::parse("doc 0 0 Hello UH *  -  - -  spk\t* (3)").unwrap();
        rec.commit_results().unwrap();
        assert_eq!(rec.to_line(), "doc 0 0 Hello UH *  -  - -  spk\t* -");
    }

    #[test]
    fn test_double_commit_fails() {
        let mut rec = AnnotationRecord::parse(LINE).unwrap();
        rec.commit_results().unwrap();
        let err = rec.commit_results().unwrap_err();
        assert!(matches!(err, Error::ResultsAlreadyWritten));
    }
}
