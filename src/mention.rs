//! Mentions, candidate mention pairs, and the classifier boundary.
//!
//! # Terminology
//!
//! - **Mention**: a contiguous token span referring to some entity.
//! - **Entity id**: the gold-standard id linking all mentions of one entity
//!   within a document, as encoded in the source bracket notation.
//! - **Antecedent / anaphor**: the earlier- and later-occurring mention of a
//!   candidate pair.
//! - **Cluster**: a predicted set of coreferent mentions, identified by a
//!   prediction-time id unrelated to gold entity ids.
//!
//! The classifier that scores pairs is an external collaborator behind the
//! [`PairClassifier`] trait; this crate only defines the feature-vector hook
//! and an [`OracleClassifier`] that echoes gold labels for pipeline tests.

use serde::{Deserialize, Serialize};

use crate::span::Span;

// =============================================================================
// Mention
// =============================================================================

/// A reconstructed mention span.
///
/// Identity across a document is `(sentence, span)`. Raw bracket entity ids
/// are scoped to one sentence's notation and may repeat across sentences and
/// documents, so they never identify a mention on their own.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Mention {
    /// 0-based sentence index within the document.
    pub sentence: usize,
    /// Inclusive token range within the sentence.
    pub span: Span,
    /// Gold entity id from the source annotation; `None` for mentions built
    /// purely from classifier output.
    pub entity: Option<u64>,
}

impl Mention {
    /// A gold mention carrying its corpus entity id.
    #[must_use]
    pub fn gold(sentence: usize, span: Span, entity: u64) -> Self {
        Self {
            sentence,
            span,
            entity: Some(entity),
        }
    }

    /// A predicted mention with no gold label.
    #[must_use]
    pub fn predicted(sentence: usize, span: Span) -> Self {
        Self {
            sentence,
            span,
            entity: None,
        }
    }

    /// Unary features for the external classifier.
    ///
    /// Feature design is out of scope here; the collaborator that consumes
    /// [`crate::Corpus::training_instances`] supplies its own extraction and
    /// this hook stays empty.
    #[must_use]
    pub fn features(&self) -> FeatureVector {
        FeatureVector::default()
    }
}

// =============================================================================
// MentionPair
// =============================================================================

/// An ordered (antecedent, anaphor) candidate pair within one document.
///
/// The gold label is `true` iff both mentions carry the same gold entity id.
/// Note that same-entity is a weaker signal than "correct antecedent edge":
/// an entity with three or more mentions yields several positive pairs per
/// anaphor, which is not the standard nearest-antecedent training target.
/// Preserved as-is; see DESIGN.md.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentionPair {
    pub antecedent: Mention,
    pub anaphor: Mention,
    /// Derived gold label: both mentions share a gold entity id.
    pub label: bool,
}

impl MentionPair {
    /// Build a pair, deriving the gold label from the mentions' entity ids.
    #[must_use]
    pub fn new(antecedent: Mention, anaphor: Mention) -> Self {
        let label = match (antecedent.entity, anaphor.entity) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        };
        Self {
            antecedent,
            anaphor,
            label,
        }
    }

    /// Binary features for the external classifier; empty, like
    /// [`Mention::features`].
    #[must_use]
    pub fn features(&self) -> FeatureVector {
        let mut features = self.antecedent.features();
        features.0.extend(self.anaphor.features().0);
        features
    }
}

// =============================================================================
// Classifier boundary
// =============================================================================

/// Per-pair feature vector handed to the external classifier.
///
/// This crate never populates it; it exists so the pair-ordering contract
/// and the training-instance plumbing can be exercised end to end.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(pub Vec<f32>);

/// The external collaborator that scores candidate pairs.
///
/// Implementations must return exactly one boolean per pair, aligned to the
/// input order, which is the enumeration order of
/// [`crate::Document::collect_pairs`].
pub trait PairClassifier {
    fn predict(&self, pairs: &[MentionPair]) -> Vec<bool>;
}

/// A classifier that echoes each pair's gold label.
///
/// Good enough to drive the full write-back pipeline in tests and the CLI
/// without any model dependency.
#[derive(Debug, Clone, Copy, Default)]
pub struct OracleClassifier;

impl PairClassifier for OracleClassifier {
    fn predict(&self, pairs: &[MentionPair]) -> Vec<bool> {
        pairs.iter().map(|p| p.label).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_label_same_entity() {
        let a = Mention::gold(0, Span::new(0, 1), 4);
        let b = Mention::gold(0, Span::new(3, 3), 4);
        let c = Mention::gold(1, Span::new(0, 0), 9);

        assert!(MentionPair::new(a, b).label);
        assert!(!MentionPair::new(a, c).label);
    }

    #[test]
    fn test_pair_label_requires_gold_ids() {
        let a = Mention::predicted(0, Span::new(0, 1));
        let b = Mention::predicted(0, Span::new(3, 3));
        assert!(!MentionPair::new(a, b).label);
    }

    #[test]
    fn test_oracle_echoes_labels() {
        let a = Mention::gold(0, Span::new(0, 0), 1);
        let b = Mention::gold(0, Span::new(2, 2), 1);
        let c = Mention::gold(0, Span::new(4, 4), 2);
        let pairs = vec![MentionPair::new(a, b), MentionPair::new(b, c)];

        assert_eq!(OracleClassifier.predict(&pairs), vec![true, false]);
    }
}
