//! The compiled parser plan and the streaming walk.
//!
//! `Parser` holds a compiled query tree and an index builder sized to the
//! deepest queried level; it is immutable and reusable across documents.
//! `Parser::start` builds the structural index for one record and returns a
//! `ParseState` whose `advance` steps from one queried field to the next,
//! in document order, without looking at anything that was not asked for.

use smallvec::SmallVec;

use crate::errors::Result;
use crate::index_builder::backend::{Backend, FallbackBackend};
use crate::index_builder::{IndexBuilder, Positions, StructuralIndex};
use crate::query::{QueryNode, QueryTree};
use crate::value::{self, Literal, Value};

/// A reusable parsing plan for a fixed set of query paths.
#[derive(Debug)]
pub struct Parser<B: Backend = FallbackBackend> {
    index_builder: IndexBuilder<B>,
    query_tree: QueryTree,
}

impl Parser<FallbackBackend> {
    /// Compile `paths` into a parsing plan.
    ///
    /// Field ids are assigned by position in `paths`.
    pub fn new<I>(paths: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        Self::with_backend(FallbackBackend::default(), paths)
    }
}

impl<B: Backend> Parser<B> {
    /// Compile `paths` into a parsing plan using a specific bitmap backend.
    pub fn with_backend<I>(backend: B, paths: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut query_tree = QueryTree::default();
        for path in paths {
            query_tree.add_path(path.as_ref())?;
        }
        let index_builder = IndexBuilder::new(backend, query_tree.max_level());
        Ok(Self {
            index_builder,
            query_tree,
        })
    }

    /// Build the structural index for `record` and position a parse state
    /// before its first queried field.
    ///
    /// A record that is not a JSON object yields a state that reports end of
    /// record immediately.
    pub fn start<'p, 's>(&'p self, record: &'s str) -> Result<ParseState<'p, 's>> {
        let record = record.trim();
        let index = self.index_builder.build(record.as_bytes())?;

        let mut frames = SmallVec::new();
        if record.starts_with('{') {
            frames.push(Frame {
                begin: 0,
                end: record.len(),
                level: 0,
                node: self.query_tree.as_node(),
                colons: None,
                cursor: 0,
            });
        }

        Ok(ParseState {
            record,
            index,
            frames,
        })
    }
}

/// One projected field.
#[derive(Debug, Clone)]
#[cfg_attr(test, derive(PartialEq))]
pub struct KeyValue<'s> {
    /// 0-based index of the matched path in the compile-time path list.
    pub field_id: usize,
    /// The decoded value.
    pub value: Value<'s>,
    /// The literal text exactly as it appeared in the record.
    pub raw: &'s str,
}

#[derive(Debug)]
struct Frame<'p> {
    begin: usize,
    end: usize,
    level: usize,
    node: &'p QueryNode,
    colons: Option<Positions>,
    cursor: usize,
}

/// Streaming parse state of a single document.
#[derive(Debug)]
pub struct ParseState<'p, 's> {
    record: &'s str,
    index: StructuralIndex,
    frames: SmallVec<[Frame<'p>; 4]>,
}

impl<'p, 's> ParseState<'p, 's> {
    /// Advance to the next queried field, in document order.
    ///
    /// `Ok(None)` signals the end of the record. After an error the state is
    /// exhausted; the `Parser` that produced it remains usable.
    pub fn advance(&mut self) -> Result<Option<KeyValue<'s>>> {
        match self.advance_inner() {
            Err(e) => {
                debug!("aborting document: {}", e);
                self.frames.clear();
                Err(e)
            }
            ok => ok,
        }
    }

    fn advance_inner(&mut self) -> Result<Option<KeyValue<'s>>> {
        loop {
            // lazily enumerate the colons of the frame on top of the stack
            let fill = match self.frames.last() {
                None => return Ok(None),
                Some(f) => f.colons.is_none(),
            };
            if fill {
                let (begin, end, level) = {
                    let f = self.frames.last().expect("frame stack is non-empty");
                    (f.begin, f.end, f.level)
                };
                match self.index.colon_positions(begin, end, level) {
                    Some(cp) => {
                        let f = self.frames.last_mut().expect("frame stack is non-empty");
                        f.colons = Some(cp);
                        f.cursor = 0;
                    }
                    None => {
                        self.frames.pop();
                        continue;
                    }
                }
            } else {
                let f = self.frames.last_mut().expect("frame stack is non-empty");
                f.cursor += 1;
            }

            let exhausted = {
                let f = self.frames.last().expect("frame stack is non-empty");
                f.cursor >= f.colons.as_ref().expect("colons are filled").len()
            };
            if exhausted {
                self.frames.pop();
                continue;
            }

            let (p, node, inner_end) = {
                let f = self.frames.last().expect("frame stack is non-empty");
                let cp = f.colons.as_ref().expect("colons are filled");
                let p = cp[f.cursor];
                let node: &'p QueryNode = f.node;
                let inner_end = if f.cursor + 1 < cp.len() {
                    cp[f.cursor + 1]
                } else {
                    f.end - 1
                };
                (p, node, inner_end)
            };

            let name = self.index.field_name(self.record, p)?;
            let child = match node.find_child(name.as_ref()) {
                Some(child) => child,
                None => continue,
            };

            if let Some(id) = child.path_id() {
                match value::parse(self.record, p)? {
                    Literal::Atomic(value, raw) => {
                        return Ok(Some(KeyValue {
                            field_id: id,
                            value,
                            raw,
                        }));
                    }
                    // a leaf was queried but the document nests further here
                    Literal::Object | Literal::Array => continue,
                }
            }

            self.frames.push(Frame {
                begin: p + 1,
                end: inner_end,
                level: child.level(),
                node: child,
                colons: None,
                cursor: 0,
            });
        }
    }
}

impl<'p, 's> Iterator for ParseState<'p, 's> {
    type Item = Result<KeyValue<'s>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance().transpose()
    }
}
