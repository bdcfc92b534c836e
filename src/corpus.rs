//! CoNLL-2012 file I/O and the train/dev/test corpus.
//!
//! A file is a sequence of `#begin document ... #end document` blocks; blank
//! lines separate sentences inside a block, every other line is a token
//! annotation record. Output is written next to the input (`<name>_out` by
//! default) through a temp file in the destination directory plus a rename,
//! so a failure mid-write never leaves a truncated output file behind.
//!
//! Corpus loading is failure-isolating: one malformed or unreadable file is
//! logged, reported in the returned failure list, and never aborts its
//! siblings.

use std::fs;
use std::io::Write as _;
use std::mem;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use walkdir::WalkDir;

use crate::document::{Document, Sentence};
use crate::error::{Error, Result};
use crate::mention::{FeatureVector, MentionPair, PairClassifier};
use crate::record::AnnotationRecord;

/// Filename suffix the corpus walker matches, e.g. `cctv_0000.auto_conll`.
pub const DEFAULT_SUFFIX: &str = "auto_conll";

// =============================================================================
// ConllFile
// =============================================================================

/// One CoNLL-2012 annotation file: its path and parsed documents.
#[derive(Debug, Clone)]
pub struct ConllFile {
    pub path: PathBuf,
    pub documents: Vec<Document>,
}

impl ConllFile {
    /// Read and parse a file. Parse errors carry the path and line number.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text =
            fs::read_to_string(path).map_err(|e| Error::in_file(path, Error::Io(e)))?;
        let documents =
            parse_documents(&text).map_err(|e| Error::in_file(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            documents,
        })
    }

    /// The conventional output path: the input path with `_out` appended.
    #[must_use]
    pub fn out_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push("_out");
        self.path.with_file_name(name)
    }

    /// Serialize the documents back to text.
    ///
    /// Byte-identical to the input except for committed coreference columns:
    /// begin marker verbatim, one line per record, a blank line after every
    /// sentence, `#end document` after every block.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for doc in &self.documents {
            out.push_str(&doc.begin_line);
            out.push('\n');
            for sentence in &doc.sentences {
                for record in &sentence.records {
                    out.push_str(record.to_line());
                    out.push('\n');
                }
                out.push('\n');
            }
            out.push_str("#end document\n");
        }
        out
    }

    /// Write to the conventional `_out` sibling path, atomically.
    pub fn write(&self) -> Result<PathBuf> {
        let out = self.out_path();
        self.write_to(&out)?;
        Ok(out)
    }

    /// Write to `out` via a temp file in the same directory plus rename.
    pub fn write_to(&self, out: &Path) -> Result<()> {
        let dir = match out.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)
            .map_err(|e| Error::in_file(out, Error::Io(e)))?;
        tmp.write_all(self.render().as_bytes())
            .map_err(|e| Error::in_file(out, Error::Io(e)))?;
        tmp.persist(out)
            .map_err(|e| Error::in_file(out, Error::Io(e.error)))?;
        Ok(())
    }
}

/// Parse file text into documents.
///
/// Strict about structure: token lines outside a document, `#end document`
/// without a begin, a nested `#begin document`, and EOF inside a document are
/// all malformed. Mention spans are reconstructed eagerly so unbalanced
/// bracket notation surfaces at load time with a line number.
pub(crate) fn parse_documents(text: &str) -> Result<Vec<Document>> {
    struct Builder {
        begin: String,
        sentences: Vec<Sentence>,
        pending: Vec<AnnotationRecord>,
    }
    impl Builder {
        fn flush_sentence(&mut self) {
            if !self.pending.is_empty() {
                let index = self.sentences.len();
                self.sentences
                    .push(Sentence::new(index, mem::take(&mut self.pending)));
            }
        }
    }

    let mut documents = Vec::new();
    let mut current: Option<Builder> = None;
    let mut lineno = 0;

    for line in text.lines() {
        lineno += 1;
        let line = line.trim_end_matches('\r');
        if line.starts_with("#begin document") {
            if current.is_some() {
                return Err(Error::malformed(lineno, "nested #begin document"));
            }
            current = Some(Builder {
                begin: line.to_string(),
                sentences: Vec::new(),
                pending: Vec::new(),
            });
        } else if line == "#end document" {
            let mut builder = current
                .take()
                .ok_or_else(|| Error::malformed(lineno, "#end document without #begin"))?;
            builder.flush_sentence();
            let mut document = Document::new(builder.begin, builder.sentences);
            document.collect_mentions()?;
            documents.push(document);
        } else if line.trim().is_empty() {
            if let Some(builder) = current.as_mut() {
                builder.flush_sentence();
            }
        } else {
            let builder = current
                .as_mut()
                .ok_or_else(|| Error::malformed(lineno, "token line outside a document"))?;
            builder.pending.push(AnnotationRecord::parse_at(line, lineno)?);
        }
    }

    if current.is_some() {
        return Err(Error::malformed(lineno, "file ends inside a document"));
    }
    Ok(documents)
}

// =============================================================================
// Corpus
// =============================================================================

/// A file that failed to load or write, with the error that felled it.
#[derive(Debug)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub error: Error,
}

/// Train/dev/test collections of CoNLL files under three root directories.
///
/// Files are discovered recursively by filename suffix and loaded in sorted
/// path order, so runs are reproducible regardless of directory iteration
/// order.
#[derive(Debug, Default)]
pub struct Corpus {
    train_root: PathBuf,
    dev_root: PathBuf,
    test_root: PathBuf,
    suffix: String,
    pub train: Vec<ConllFile>,
    pub dev: Vec<ConllFile>,
    pub test: Vec<ConllFile>,
}

impl Corpus {
    #[must_use]
    pub fn new(
        train_root: impl Into<PathBuf>,
        dev_root: impl Into<PathBuf>,
        test_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            train_root: train_root.into(),
            dev_root: dev_root.into(),
            test_root: test_root.into(),
            suffix: DEFAULT_SUFFIX.to_string(),
            train: Vec::new(),
            dev: Vec::new(),
            test: Vec::new(),
        }
    }

    /// Override the filename suffix used for discovery.
    #[must_use]
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Recursively discover annotation files under `root`, sorted.
    pub fn discover(root: &Path, suffix: &str) -> Result<Vec<PathBuf>> {
        if !root.is_dir() {
            return Err(Error::PathNotFound(root.to_path_buf()));
        }
        let mut paths = Vec::new();
        for entry in WalkDir::new(root) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("skipping unreadable directory entry: {e}");
                    continue;
                }
            };
            if entry.file_type().is_file()
                && entry.file_name().to_string_lossy().ends_with(suffix)
            {
                paths.push(entry.into_path());
            }
        }
        paths.sort();
        Ok(paths)
    }

    fn load_role(root: &Path, suffix: &str) -> Result<(Vec<ConllFile>, Vec<LoadFailure>)> {
        let paths = Self::discover(root, suffix)?;
        let mut files = Vec::new();
        let mut failures = Vec::new();
        for path in paths {
            match ConllFile::read(&path) {
                Ok(file) => files.push(file),
                Err(error) => {
                    log::warn!("failed to load {}: {error}", path.display());
                    failures.push(LoadFailure { path, error });
                }
            }
        }
        log::info!(
            "loaded {} file(s) from {} ({} failed)",
            files.len(),
            root.display(),
            failures.len()
        );
        Ok((files, failures))
    }

    /// Load the training files. Returns per-file failures; fails only if the
    /// root directory itself is missing.
    pub fn load_train(&mut self) -> Result<Vec<LoadFailure>> {
        let (files, failures) = Self::load_role(&self.train_root, &self.suffix)?;
        self.train = files;
        Ok(failures)
    }

    /// Load the development files.
    pub fn load_dev(&mut self) -> Result<Vec<LoadFailure>> {
        let (files, failures) = Self::load_role(&self.dev_root, &self.suffix)?;
        self.dev = files;
        Ok(failures)
    }

    /// Load the test files.
    pub fn load_test(&mut self) -> Result<Vec<LoadFailure>> {
        let (files, failures) = Self::load_role(&self.test_root, &self.suffix)?;
        self.test = files;
        Ok(failures)
    }

    /// Per-pair feature vectors and gold labels over every training pair, in
    /// enumeration order across files and documents.
    pub fn training_instances(&mut self) -> Result<(Vec<FeatureVector>, Vec<bool>)> {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for file in &mut self.train {
            for document in &mut file.documents {
                let pairs = document.collect_pairs()?;
                features.extend(pairs.iter().map(MentionPair::features));
                labels.extend(pairs.iter().map(|p| p.label));
            }
        }
        Ok((features, labels))
    }

    /// Run the classifier over every test document, consolidate its pair
    /// predictions into clusters, and write each file's `_out` sibling.
    ///
    /// Per-file failures are logged and returned; siblings keep going.
    pub fn write_results<C: PairClassifier>(
        &mut self,
        classifier: &C,
    ) -> Result<(Vec<PathBuf>, Vec<LoadFailure>)> {
        let mut written = Vec::new();
        let mut failures = Vec::new();
        for file in &mut self.test {
            match Self::write_file_results(file, classifier) {
                Ok(out) => written.push(out),
                Err(error) => {
                    log::warn!("failed to write {}: {error}", file.path.display());
                    failures.push(LoadFailure {
                        path: file.path.clone(),
                        error,
                    });
                }
            }
        }
        Ok((written, failures))
    }

    fn write_file_results<C: PairClassifier>(
        file: &mut ConllFile,
        classifier: &C,
    ) -> Result<PathBuf> {
        for document in &mut file.documents {
            let predictions = classifier.predict(document.collect_pairs()?);
            let clusters = document.cluster(&predictions)?;
            document.write_results(&clusters)?;
        }
        file.write()
    }
}
