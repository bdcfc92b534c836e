//! # conll-coref
//!
//! CoNLL-2012 coreference plumbing for Rust.
//!
//! - **Parsing**: column-annotated files into documents, sentences, records
//! - **Span reconstruction**: mention spans from `(N ... N)` bracket notation
//! - **Pair enumeration**: ordered antecedent/anaphor candidates per document
//! - **Cluster writeback**: predicted clusters re-emitted in bracket notation
//!
//! The classifier that scores candidate pairs is deliberately not here: it is
//! an external collaborator behind the [`PairClassifier`] trait that consumes
//! [`MentionPair::features`] and returns one boolean per pair. This crate
//! guarantees the parts around it: a correct parse, exact span recovery, a
//! stable pair order, and a byte-faithful rewrite of the coreference column.
//!
//! ## Quick start
//!
//! ```rust
//! use conll_coref::{Document, Mention, Span};
//!
//! let text = "\
//! #begin document (bc/demo/00/demo_000); part 000
//! bc/demo/00/demo_000 0 0 John NNP * - - - spk * (1)
//! bc/demo/00/demo_000 0 1 saw  VBD * - - - spk * -
//! bc/demo/00/demo_000 0 2 her  PRP * - - - spk * (2)
//!
//! #end document
//! ";
//!
//! let mut file = conll_coref::parse_str(text).unwrap();
//! let doc: &mut Document = &mut file[0];
//! let pairs = doc.collect_pairs().unwrap();
//!
//! assert_eq!(pairs.len(), 1);
//! assert_eq!(pairs[0].antecedent, Mention::gold(0, Span::new(0, 0), 1));
//! assert_eq!(pairs[0].anaphor, Mention::gold(0, Span::new(2, 2), 2));
//! ```
//!
//! ## Terminology
//!
//! - **Mention**: a contiguous token span referring to an entity
//! - **Entity id**: gold id linking mentions of one entity within a document
//! - **Antecedent / anaphor**: earlier and later mention of a candidate pair
//! - **Cluster**: predicted coreferent set, with a prediction-time id
//!   unrelated to gold entity ids
//!
//! ## Format
//!
//! Input files follow the CoNLL-2012 shared-task layout: `#begin document`
//! and `#end document` lines frame each document, blank lines separate
//! sentences, and every token line carries eleven fixed columns, a
//! variable-width predicate-argument block, and a trailing coreference
//! column. See [`record::AnnotationRecord`] for the column map and
//! [`span`] for the bracket notation.

pub mod corpus;
pub mod document;
pub mod error;
pub mod mention;
pub mod record;
pub mod span;

pub use corpus::{ConllFile, Corpus, LoadFailure, DEFAULT_SUFFIX};
pub use document::{Document, Sentence};
pub use error::{Error, Result};
pub use mention::{FeatureVector, Mention, MentionPair, OracleClassifier, PairClassifier};
pub use record::AnnotationRecord;
pub use span::Span;

/// Parse CoNLL-2012 text into documents, without any file context.
///
/// Convenience wrapper over what [`ConllFile::read`] does for a path.
pub fn parse_str(text: &str) -> Result<Vec<Document>> {
    corpus::parse_documents(text)
}
