//! Sentences and documents: pair enumeration, cluster assembly, writeback.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::mention::{Mention, MentionPair};
use crate::record::AnnotationRecord;
use crate::span;

// =============================================================================
// Sentence
// =============================================================================

/// One sentence: its annotation records plus the mentions they encode.
#[derive(Debug, Clone)]
pub struct Sentence {
    /// 0-based index within the owning document.
    pub index: usize,
    pub records: Vec<AnnotationRecord>,
    mentions: Vec<Mention>,
    collected: bool,
}

impl Sentence {
    #[must_use]
    pub fn new(index: usize, records: Vec<AnnotationRecord>) -> Self {
        Self {
            index,
            records,
            mentions: Vec::new(),
            collected: false,
        }
    }

    /// Reconstruct this sentence's mentions from its coreference column.
    ///
    /// Idempotent: only the first call scans the notation, so repeated pair
    /// enumeration never duplicates mentions.
    pub fn collect_mentions(&mut self) -> Result<()> {
        if !self.collected {
            self.mentions = span::reconstruct_mentions(self.index, &self.records)?;
            self.collected = true;
        }
        Ok(())
    }

    /// Mentions in close order (ascending end token). Empty until
    /// [`Sentence::collect_mentions`] has run.
    #[must_use]
    pub fn mentions(&self) -> &[Mention] {
        &self.mentions
    }
}

// =============================================================================
// Document
// =============================================================================

/// One `#begin document` ... `#end document` block.
///
/// Keeps the literal begin-marker line so output reproduces the input
/// byte-for-byte outside the coreference column.
#[derive(Debug, Clone)]
pub struct Document {
    /// The verbatim `#begin document ...` line.
    pub begin_line: String,
    pub sentences: Vec<Sentence>,
    pairs: Vec<MentionPair>,
    committed: bool,
}

impl Document {
    #[must_use]
    pub fn new(begin_line: impl Into<String>, sentences: Vec<Sentence>) -> Self {
        Self {
            begin_line: begin_line.into(),
            sentences,
            pairs: Vec::new(),
            committed: false,
        }
    }

    /// Reconstruct mentions for every sentence that has not been scanned yet.
    pub fn collect_mentions(&mut self) -> Result<()> {
        for sentence in &mut self.sentences {
            sentence.collect_mentions()?;
        }
        Ok(())
    }

    /// All mentions of the document, sentence by sentence.
    pub fn mentions(&self) -> impl Iterator<Item = &Mention> {
        self.sentences.iter().flat_map(|s| s.mentions().iter())
    }

    /// Enumerate candidate (antecedent, anaphor) pairs and cache the list.
    ///
    /// Two regimes, concatenated in this exact order, since downstream
    /// prediction arrays align with it by index:
    ///
    /// 1. **Intra-sentence**: per sentence, each mention as anaphor from the
    ///    latest-closing backwards, paired with every earlier mention walked
    ///    nearest-first, kept only when the antecedent's span ends strictly
    ///    before the anaphor's starts. Nested or overlapping mentions are
    ///    never paired.
    /// 2. **Cross-sentence**: sentences walked last to second; each of a
    ///    sentence's mentions as anaphor is paired with every mention of
    ///    every earlier sentence (nearest sentence first, mentions in their
    ///    natural order). No span filter applies across sentences.
    ///
    /// The reverse traversal puts candidates closest to the anaphor first,
    /// which lets callers truncate the candidate list cheaply. No mention is
    /// ever paired with itself and no pair repeats.
    pub fn collect_pairs(&mut self) -> Result<&[MentionPair]> {
        self.collect_mentions()?;
        let mut pairs = Vec::new();

        for sentence in &self.sentences {
            let mentions = sentence.mentions();
            for i in (1..mentions.len()).rev() {
                let anaphor = mentions[i];
                for j in (0..i).rev() {
                    let antecedent = mentions[j];
                    if antecedent.span.precedes(&anaphor.span) {
                        pairs.push(MentionPair::new(antecedent, anaphor));
                    }
                }
            }
        }

        for i in (1..self.sentences.len()).rev() {
            for &anaphor in self.sentences[i].mentions() {
                for j in (0..i).rev() {
                    for &antecedent in self.sentences[j].mentions() {
                        pairs.push(MentionPair::new(antecedent, anaphor));
                    }
                }
            }
        }

        log::debug!(
            "enumerated {} candidate pairs over {} sentences",
            pairs.len(),
            self.sentences.len()
        );
        self.pairs = pairs;
        Ok(&self.pairs)
    }

    /// The pair list from the most recent [`Document::collect_pairs`] call.
    #[must_use]
    pub fn pairs(&self) -> &[MentionPair] {
        &self.pairs
    }

    /// Consolidate per-pair predictions into clusters.
    ///
    /// `predictions` must align index-for-index with the cached pair list.
    /// Mentions never predicted coreferent with anything are absent from the
    /// returned map (singletons, excluded from output marking).
    pub fn cluster(&self, predictions: &[bool]) -> Result<HashMap<Mention, u64>> {
        if predictions.len() != self.pairs.len() {
            return Err(Error::PredictionLengthMismatch {
                expected: self.pairs.len(),
                got: predictions.len(),
            });
        }
        Ok(assemble_clusters(&self.pairs, predictions))
    }

    /// Mark every clustered mention on its start and end records and commit
    /// the regenerated coreference column on every record of the document.
    ///
    /// Fails with [`Error::ResultsAlreadyWritten`] on a second call.
    pub fn write_results(&mut self, clusters: &HashMap<Mention, u64>) -> Result<()> {
        if self.committed {
            return Err(Error::ResultsAlreadyWritten);
        }
        for (mention, &cluster) in clusters {
            let records = &mut self.sentences[mention.sentence].records;
            records[mention.span.start].mark_open(cluster);
            records[mention.span.end].mark_close(cluster);
        }
        for sentence in &mut self.sentences {
            for record in &mut sentence.records {
                record.commit_results()?;
            }
        }
        self.committed = true;
        Ok(())
    }

    /// Re-emit the gold mentions as singleton clusters, one fresh id each.
    ///
    /// Useful for validating the notation round trip: the rewritten
    /// coreference column has the same open/close/complete structure per
    /// token as the input, with renumbered ids.
    pub fn write_gold_singletons(&mut self) -> Result<()> {
        self.collect_mentions()?;
        let clusters: HashMap<Mention, u64> = self
            .mentions()
            .copied()
            .zip(0u64..)
            .collect();
        self.write_results(&clusters)
    }
}

/// Incremental union of positively predicted pairs into cluster ids.
///
/// Predictions are walked in order. For each `true`: if the anaphor is
/// already clustered its id is copied to the antecedent; otherwise if the
/// antecedent is clustered its id is copied to the anaphor; otherwise a
/// fresh id (scoped to this call, starting at 0) is assigned to both.
///
/// This is deliberately not a canonicalizing union-find: when a later union
/// bridges two existing clusters, only the mention being re-assigned moves,
/// and mentions clustered earlier keep their stale id. The behavior is part
/// of the compatibility contract (see DESIGN.md) and is pinned by tests.
pub(crate) fn assemble_clusters(
    pairs: &[MentionPair],
    predictions: &[bool],
) -> HashMap<Mention, u64> {
    let mut clusters: HashMap<Mention, u64> = HashMap::new();
    let mut next_id: u64 = 0;

    for (pair, &coreferent) in pairs.iter().zip(predictions) {
        if !coreferent {
            continue;
        }
        if let Some(&id) = clusters.get(&pair.anaphor) {
            clusters.insert(pair.antecedent, id);
        } else if let Some(&id) = clusters.get(&pair.antecedent) {
            clusters.insert(pair.anaphor, id);
        } else {
            clusters.insert(pair.antecedent, next_id);
            clusters.insert(pair.anaphor, next_id);
            next_id += 1;
        }
    }
    clusters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Span;

    fn record(coref: &str) -> AnnotationRecord {
        let line = format!("doc 0 0 w X * - - - spk * {coref}");
        AnnotationRecord::parse(&line).unwrap()
    }

    fn sentence(index: usize, corefs: &[&str]) -> Sentence {
        Sentence::new(index, corefs.iter().map(|c| record(c)).collect())
    }

    fn document(sentences: Vec<Sentence>) -> Document {
        Document::new("#begin document (test); part 000", sentences)
    }

    #[test]
    fn test_intra_sentence_pair_count_and_order() {
        // Three disjoint mentions in one sentence: 3*(3-1)/2 = 3 pairs, the
        // rightmost anaphor first, its nearest antecedent first.
        let mut doc = document(vec![sentence(
            0,
            &["(1)", "-", "(2)", "-", "(1)"],
        )]);
        let pairs = doc.collect_pairs().unwrap().to_vec();
        assert_eq!(pairs.len(), 3);

        let as_spans: Vec<(usize, usize)> = pairs
            .iter()
            .map(|p| (p.antecedent.span.start, p.anaphor.span.start))
            .collect();
        assert_eq!(as_spans, vec![(2, 4), (0, 4), (0, 2)]);
        assert_eq!(
            pairs.iter().map(|p| p.label).collect::<Vec<_>>(),
            vec![false, true, false]
        );
    }

    #[test]
    fn test_intra_sentence_overlap_filtered() {
        // [0,2] contains [1,1]; neither precedes the other, so the only pairs
        // involve the disjoint mention at [4,4].
        let mut doc = document(vec![sentence(0, &["(1", "(2)", "1)", "-", "(3)"])]);
        let pairs = doc.collect_pairs().unwrap();
        let spans: Vec<(usize, usize)> = pairs
            .iter()
            .map(|p| (p.antecedent.span.start, p.anaphor.span.start))
            .collect();
        // anaphor [4,4] paired with both earlier mentions (later-closing
        // [0,2] first); the nested [0,2]/[1,1] pair is dropped
        assert_eq!(spans, vec![(0, 4), (1, 4)]);
    }

    #[test]
    fn test_cross_sentence_pair_count() {
        // Mention counts [2, 1, 3] -> cross pairs = 2*1 + 2*3 + 1*3 = 11.
        let mut doc = document(vec![
            sentence(0, &["(1)", "(2)"]),
            sentence(1, &["(1)"]),
            sentence(2, &["(3)", "(1)", "(2)"]),
        ]);
        let pairs = doc.collect_pairs().unwrap();
        let cross = pairs
            .iter()
            .filter(|p| p.antecedent.sentence != p.anaphor.sentence)
            .count();
        assert_eq!(cross, 11);
        // intra: sentence 0 contributes 1 pair, sentence 2 contributes 3
        assert_eq!(pairs.len(), 11 + 1 + 3);
    }

    #[test]
    fn test_cross_sentence_order_reverse_sentences() {
        let mut doc = document(vec![
            sentence(0, &["(1)"]),
            sentence(1, &["(2)"]),
            sentence(2, &["(1)"]),
        ]);
        let pairs = doc.collect_pairs().unwrap();
        let order: Vec<(usize, usize)> = pairs
            .iter()
            .map(|p| (p.anaphor.sentence, p.antecedent.sentence))
            .collect();
        // anaphors from the last sentence first; antecedent sentences walked
        // nearest first
        assert_eq!(order, vec![(2, 1), (2, 0), (1, 0)]);
    }

    #[test]
    fn test_collect_pairs_idempotent() {
        let mut doc = document(vec![sentence(0, &["(1)", "(1)"])]);
        let first = doc.collect_pairs().unwrap().len();
        let second = doc.collect_pairs().unwrap().len();
        assert_eq!(first, 1);
        assert_eq!(second, 1);
    }

    #[test]
    fn test_cluster_transitive_merge() {
        let a = Mention::gold(0, Span::new(0, 0), 1);
        let b = Mention::gold(0, Span::new(2, 2), 1);
        let c = Mention::gold(0, Span::new(4, 4), 1);
        let d = Mention::gold(1, Span::new(0, 0), 2);
        let e = Mention::gold(1, Span::new(2, 2), 3);

        let pairs = vec![
            MentionPair::new(a, b),
            MentionPair::new(b, c),
            MentionPair::new(d, e),
        ];
        let clusters = assemble_clusters(&pairs, &[true, true, false]);

        assert_eq!(clusters[&a], clusters[&b]);
        assert_eq!(clusters[&b], clusters[&c]);
        assert!(!clusters.contains_key(&d));
        assert!(!clusters.contains_key(&e));
    }

    #[test]
    fn test_cluster_is_not_canonicalizing() {
        // Two established clusters bridged by a later pair: only the bridged
        // antecedent moves; its old cluster-mate keeps the stale id.
        let a = Mention::gold(0, Span::new(0, 0), 1);
        let b = Mention::gold(0, Span::new(2, 2), 1);
        let c = Mention::gold(0, Span::new(4, 4), 1);
        let d = Mention::gold(0, Span::new(6, 6), 1);

        let pairs = vec![
            MentionPair::new(a, b),
            MentionPair::new(c, d),
            MentionPair::new(b, c),
        ];
        let clusters = assemble_clusters(&pairs, &[true, true, true]);

        assert_eq!(clusters[&a], 0);
        assert_eq!(clusters[&b], 1); // pulled onto c's cluster
        assert_eq!(clusters[&c], 1);
        assert_eq!(clusters[&d], 1);
    }

    #[test]
    fn test_cluster_prediction_length_mismatch() {
        let mut doc = document(vec![sentence(0, &["(1)", "(1)"])]);
        doc.collect_pairs().unwrap();
        let err = doc.cluster(&[]).unwrap_err();
        assert!(matches!(
            err,
            Error::PredictionLengthMismatch {
                expected: 1,
                got: 0
            }
        ));
    }

    #[test]
    fn test_end_to_end_writeback() {
        // Column `(1 - 1) (2) -` over 5 tokens: mentions [0,2] and [3,3].
        // Cluster 7 assigned to the first mention only.
        let mut doc = document(vec![sentence(0, &["(1", "-", "1)", "(2)", "-"])]);
        doc.collect_mentions().unwrap();

        let first = Mention::gold(0, Span::new(0, 2), 1);
        let clusters = HashMap::from([(first, 7u64)]);
        doc.write_results(&clusters).unwrap();

        let corefs: Vec<&str> = doc.sentences[0]
            .records
            .iter()
            .map(|r| r.coref.as_str())
            .collect();
        assert_eq!(corefs, vec!["(7", "-", "7)", "-", "-"]);
    }

    #[test]
    fn test_double_write_results_fails() {
        let mut doc = document(vec![sentence(0, &["(1)"])]);
        doc.write_results(&HashMap::new()).unwrap();
        let err = doc.write_results(&HashMap::new()).unwrap_err();
        assert!(matches!(err, Error::ResultsAlreadyWritten));
    }

    #[test]
    fn test_gold_singleton_round_trip_structure() {
        let input = ["(1|(2", "2)", "1)|(3)", "-"];
        let mut doc = document(vec![sentence(0, &input)]);
        doc.write_gold_singletons().unwrap();

        // ids are renumbered, but the open/close/complete shape per token
        // must survive the round trip
        let shape: Vec<(usize, usize, usize)> = doc.sentences[0]
            .records
            .iter()
            .map(|r| {
                let field = r.coref.as_str();
                let toks: Vec<&str> = if field == "-" {
                    vec![]
                } else {
                    field.split('|').collect()
                };
                (
                    toks.iter()
                        .filter(|t| t.starts_with('(') && !t.ends_with(')'))
                        .count(),
                    toks.iter()
                        .filter(|t| t.starts_with('(') && t.ends_with(')'))
                        .count(),
                    toks.iter()
                        .filter(|t| !t.starts_with('(') && t.ends_with(')'))
                        .count(),
                )
            })
            .collect();
        assert_eq!(
            shape,
            vec![(2, 0, 0), (0, 0, 1), (0, 1, 1), (0, 0, 0)]
        );
    }
}
