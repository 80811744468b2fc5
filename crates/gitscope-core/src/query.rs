use crate::domain::{GraphRow, SearchOrdering, SearchResultEntry};
use crate::error::Error;
use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::{Regex, RegexBuilder};
use std::path::PathBuf;

/// A structured search predicate over commit history.
///
/// Parsed from free-form text (`fix author:alice file:src/*.rs`); bare
/// words accumulate into a single message phrase. The ordering is part of
/// the query because it is part of the batch-order contract of a running
/// search.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SearchQuery {
    pub terms: Vec<QueryTerm>,
    pub case_sensitive: bool,
    pub use_regex: bool,
    pub whole_word: bool,
    /// All terms must match (otherwise any one suffices).
    pub match_all: bool,
    /// Results double as a visibility filter over the graph window.
    /// Presentation-only: not part of the comparison key.
    pub filter_mode: bool,
    pub ordering: SearchOrdering,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum QueryTerm {
    Message(String),
    Author(String),
    Commit(String),
    File(String),
    Change(String),
}

impl QueryTerm {
    fn operator(&self) -> &'static str {
        match self {
            Self::Message(_) => "message",
            Self::Author(_) => "author",
            Self::Commit(_) => "commit",
            Self::File(_) => "file",
            Self::Change(_) => "change",
        }
    }

    fn value(&self) -> &str {
        match self {
            Self::Message(v)
            | Self::Author(v)
            | Self::Commit(v)
            | Self::File(v)
            | Self::Change(v) => v,
        }
    }
}

impl SearchQuery {
    pub fn parse(text: &str) -> Self {
        let mut terms = Vec::new();
        let mut message_words: Vec<&str> = Vec::new();

        for token in text.split_whitespace() {
            let (operator, value) = match token.split_once(':') {
                Some((op, value)) => (op, value),
                None => {
                    message_words.push(token);
                    continue;
                }
            };

            if value.is_empty() {
                continue;
            }

            match operator {
                "message" | "msg" => terms.push(QueryTerm::Message(value.to_string())),
                "author" | "@" => terms.push(QueryTerm::Author(value.to_string())),
                "commit" | "#" => terms.push(QueryTerm::Commit(value.to_string())),
                "file" | "?" => terms.push(QueryTerm::File(value.to_string())),
                "change" | "~" => terms.push(QueryTerm::Change(value.to_string())),
                // Unknown operator: treat the whole token as message text.
                _ => message_words.push(token),
            }
        }

        if !message_words.is_empty() {
            terms.push(QueryTerm::Message(message_words.join(" ")));
        }

        Self {
            terms,
            ..Self::default()
        }
    }

    pub fn message(text: &str) -> Self {
        Self {
            terms: vec![QueryTerm::Message(text.to_string())],
            ..Self::default()
        }
    }

    /// Canonical identity of the predicate, stable under formatting
    /// differences (term order, whitespace, operator aliases, letter case
    /// when the query is case-insensitive). Two queries with equal keys
    /// describe the same search and share one session.
    pub fn comparison_key(&self) -> String {
        let mut parts: Vec<String> = self
            .terms
            .iter()
            .map(|term| {
                let value = term.value().trim();
                let value = if self.case_sensitive {
                    value.to_string()
                } else {
                    value.to_lowercase()
                };
                format!("{}:{value}", term.operator())
            })
            .collect();
        parts.sort();
        parts.dedup();

        let mut key = parts.join("\u{1f}");
        key.push('|');
        for (set, flag) in [
            (self.case_sensitive, 'c'),
            (self.use_regex, 'r'),
            (self.whole_word, 'w'),
            (self.match_all, 'a'),
        ] {
            if set {
                key.push(flag);
            }
        }
        key.push('|');
        key.push_str(self.ordering.as_str());
        key
    }

    /// Round-trip back to operator text, e.g. for the search history.
    pub fn to_query_string(&self) -> String {
        self.terms
            .iter()
            .map(|term| match term {
                QueryTerm::Message(v) if !v.contains(':') => v.clone(),
                term => format!("{}:{}", term.operator(), term.value()),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Rejects malformed predicates up front, before any search session
    /// exists. A query that validates but matches nothing is a successful
    /// search with zero results, never an error.
    pub fn validate(&self) -> Result<(), Error> {
        if self.terms.is_empty() {
            return Err(Error::invalid_query("query has no terms"));
        }

        for term in &self.terms {
            match term {
                QueryTerm::Message(v) | QueryTerm::Author(v) | QueryTerm::Change(v) => {
                    if self.use_regex {
                        build_regex(v, self.case_sensitive, self.whole_word).map_err(|e| {
                            Error::invalid_query(format!("bad pattern `{v}`: {e}"))
                        })?;
                    }
                }
                QueryTerm::Commit(v) => {
                    if !v.chars().all(|c| c.is_ascii_alphanumeric()) {
                        return Err(Error::invalid_query(format!("bad commit id `{v}`")));
                    }
                }
                QueryTerm::File(v) => {
                    Glob::new(v)
                        .map_err(|e| Error::invalid_query(format!("bad file glob `{v}`: {e}")))?;
                }
            }
        }

        Ok(())
    }
}

fn build_regex(pattern: &str, case_sensitive: bool, whole_word: bool) -> Result<Regex, regex::Error> {
    let pattern = if whole_word {
        format!(r"\b(?:{pattern})\b")
    } else {
        pattern.to_string()
    };
    RegexBuilder::new(&pattern)
        .case_insensitive(!case_sensitive)
        .build()
}

#[derive(Debug)]
enum TextPred {
    Pattern(Regex),
    Literal {
        needle: String,
        case_sensitive: bool,
        whole_word: bool,
    },
}

impl TextPred {
    fn compile(value: &str, query: &SearchQuery) -> Result<Self, Error> {
        if query.use_regex {
            let regex = build_regex(value, query.case_sensitive, query.whole_word)
                .map_err(|e| Error::invalid_query(format!("bad pattern `{value}`: {e}")))?;
            Ok(Self::Pattern(regex))
        } else {
            Ok(Self::Literal {
                needle: if query.case_sensitive {
                    value.to_string()
                } else {
                    value.to_lowercase()
                },
                case_sensitive: query.case_sensitive,
                whole_word: query.whole_word,
            })
        }
    }

    fn matches(&self, haystack: &str) -> bool {
        match self {
            Self::Pattern(regex) => regex.is_match(haystack),
            Self::Literal {
                needle,
                case_sensitive,
                whole_word,
            } => {
                let lowered;
                let haystack = if *case_sensitive {
                    haystack
                } else {
                    lowered = haystack.to_lowercase();
                    &lowered
                };

                if !*whole_word {
                    return haystack.contains(needle.as_str());
                }

                haystack.match_indices(needle.as_str()).any(|(start, m)| {
                    let before = haystack[..start].chars().next_back();
                    let after = haystack[start + m.len()..].chars().next();
                    !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
                })
            }
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[derive(Debug)]
enum RowPred {
    Message(TextPred),
    Author(TextPred),
    CommitPrefix(String),
    Change(TextPred),
}

/// A compiled query, evaluated row-by-row by in-process providers. Real
/// backends are free to push the predicate down instead; the matcher
/// defines the reference semantics either way.
#[derive(Debug)]
pub struct QueryMatcher {
    preds: Vec<RowPred>,
    file_globs: Option<GlobSet>,
    match_all: bool,
}

impl QueryMatcher {
    pub fn compile(query: &SearchQuery) -> Result<Self, Error> {
        query.validate()?;

        let mut preds = Vec::new();
        let mut globs = GlobSetBuilder::new();
        let mut file_term_count = 0usize;

        for term in &query.terms {
            match term {
                QueryTerm::Message(v) => preds.push(RowPred::Message(TextPred::compile(v, query)?)),
                QueryTerm::Author(v) => preds.push(RowPred::Author(TextPred::compile(v, query)?)),
                QueryTerm::Change(v) => preds.push(RowPred::Change(TextPred::compile(v, query)?)),
                QueryTerm::Commit(v) => preds.push(RowPred::CommitPrefix(v.to_lowercase())),
                QueryTerm::File(v) => {
                    globs.add(
                        Glob::new(v)
                            .map_err(|e| Error::invalid_query(format!("bad file glob `{v}`: {e}")))?,
                    );
                    file_term_count += 1;
                }
            }
        }

        let file_globs = if file_term_count > 0 {
            Some(globs.build().map_err(|e| {
                Error::invalid_query(format!("bad file filter: {e}"))
            })?)
        } else {
            None
        };

        Ok(Self {
            preds,
            file_globs,
            match_all: query.match_all,
        })
    }

    /// Evaluates the predicate against a row plus its changed files and
    /// (optionally) its change text. Returns the matched-file detail on a
    /// hit, `None` on a miss.
    pub fn matches_row(
        &self,
        row: &GraphRow,
        files: &[PathBuf],
        change_text: Option<&str>,
    ) -> Option<SearchResultEntry> {
        let mut matched_files: Vec<PathBuf> = Vec::new();
        let mut verdicts: Vec<bool> = Vec::new();

        for pred in &self.preds {
            verdicts.push(match pred {
                RowPred::Message(p) => p.matches(&row.summary),
                RowPred::Author(p) => p.matches(&row.author),
                RowPred::CommitPrefix(prefix) => {
                    row.id.as_ref().to_lowercase().starts_with(prefix.as_str())
                }
                RowPred::Change(p) => change_text.is_some_and(|text| p.matches(text)),
            });
        }

        if let Some(globs) = &self.file_globs {
            matched_files = files
                .iter()
                .filter(|path| globs.is_match(path))
                .cloned()
                .collect();
            verdicts.push(!matched_files.is_empty());
        }

        let hit = if self.match_all {
            !verdicts.is_empty() && verdicts.iter().all(|v| *v)
        } else {
            verdicts.iter().any(|v| *v)
        };

        hit.then_some(SearchResultEntry { matched_files })
    }
}
