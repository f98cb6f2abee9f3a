//! Definition of the query plan and its compiler.
//!
//! A query is a list of dotted field paths. Compilation merges the paths
//! into a tree of object tables; the walk matches recovered field names
//! against the tables and emits the leaf's field id on a hit.

use std::cmp;
use std::collections::hash_map::Entry;
use std::mem;

use fnv::FnvHashMap;

use crate::errors::{ErrorKind, Result};

/// One node of the compiled query plan.
#[derive(Debug, Default)]
#[cfg_attr(test, derive(PartialEq))]
pub struct QueryNode {
    /// identifier of the associated query path, set on leaves
    query_id: Option<usize>,
    /// level in the associated tree
    level: usize,
    /// child nodes, keyed by unescaped field name
    children: FnvHashMap<String, QueryNode>,
}

impl QueryNode {
    #[allow(missing_docs)]
    pub fn level(&self) -> usize {
        self.level
    }

    #[allow(missing_docs)]
    pub fn path_id(&self) -> Option<usize> {
        self.query_id
    }

    #[allow(missing_docs)]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    #[allow(missing_docs)]
    pub fn find_child(&self, field: &str) -> Option<&QueryNode> {
        self.children.get(field)
    }
}

/// A compiled set of query paths.
#[derive(Debug, Default)]
#[cfg_attr(test, derive(PartialEq))]
pub struct QueryTree {
    /// root node
    root: QueryNode,
    /// query paths, in field-id order
    paths: Vec<String>,
    /// maximal level in this tree
    max_level: usize,
}

impl QueryTree {
    /// Parse a dotted query path and append it to the plan.
    ///
    /// Segments are separated by `.`; `\.` is a literal dot, `\\` a literal
    /// backslash, any other `\X` is `X`. The new leaf's field id is the
    /// number of previously added paths.
    pub fn add_path(&mut self, path: &str) -> Result<()> {
        let segments = split_segments(path)?;
        let (last, init) = segments.split_last().expect("segments are never empty");

        let mut cur = &mut self.root;
        for field in init {
            let level = cur.level + 1;
            let cur1 = cur;
            cur = cur1
                .children
                .entry(field.clone())
                .or_insert_with(|| QueryNode {
                    level,
                    ..Default::default()
                });
            if cur.query_id.is_some() {
                // an already-registered leaf cannot become an object
                return Err(ErrorKind::DuplicateField(path.to_owned()).into());
            }
        }

        let level = cur.level + 1;
        match cur.children.entry(last.clone()) {
            Entry::Occupied(..) => {
                return Err(ErrorKind::DuplicateField(path.to_owned()).into());
            }
            Entry::Vacant(e) => {
                e.insert(QueryNode {
                    query_id: Some(self.paths.len()),
                    level,
                    ..Default::default()
                });
            }
        }

        self.max_level = cmp::max(self.max_level, level);
        self.paths.push(path.to_owned());

        Ok(())
    }

    #[allow(missing_docs)]
    pub fn max_level(&self) -> usize {
        self.max_level
    }

    #[allow(missing_docs)]
    pub fn num_paths(&self) -> usize {
        self.paths.len()
    }

    #[allow(missing_docs)]
    pub fn as_node(&self) -> &QueryNode {
        &self.root
    }
}

/// Split `path` at unescaped dots and unescape each segment.
fn split_segments(path: &str) -> Result<Vec<String>> {
    let malformed = || ErrorKind::MalformedQuery(path.to_owned());

    if path.is_empty() {
        return Err(malformed().into());
    }

    let mut segments = Vec::new();
    let mut seg = String::new();
    let mut chars = path.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(c) => seg.push(c),
                None => return Err(malformed().into()),
            },
            '.' => {
                if seg.is_empty() {
                    return Err(malformed().into());
                }
                segments.push(mem::replace(&mut seg, String::new()));
            }
            c => seg.push(c),
        }
    }
    if seg.is_empty() {
        // trailing dot
        return Err(malformed().into());
    }
    segments.push(seg);

    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    macro_rules! hashmap {
        (@single $($x:tt)*) => (());
        (@count $($rest:expr),*) => (<[()]>::len(&[$(hashmap!(@single $rest)),*]));

        ($($k:expr => $v:expr,)+) => { hashmap!($($k => $v),+) };
        ($($k:expr => $v:expr),*) => {{
            let mut _map = ::std::collections::HashMap::with_capacity_and_hasher(hashmap!(@count $($k),*), Default::default());
            $( _map.insert($k, $v); )*
            _map
        }}
    }

    #[test]
    fn invalid_paths() {
        let cases: &[&str] = &["", ".", "a.", ".a", "a..b", "a\\"];
        for c in cases {
            let mut tree = QueryTree::default();
            let err = tree.add_path(c).unwrap_err();
            match err.kind() {
                ErrorKind::MalformedQuery(p) => assert_eq!(p, c),
                k => panic!("unexpected error for {:?}: {:?}", c, k),
            }
        }
    }

    #[test]
    fn duplicate_paths() {
        let cases: &[&[&str]] = &[
            &["a", "a"],
            &["a", "a.b"],
            &["a.b", "a"],
            &["a\\.b", "a\\.b"],
        ];
        for c in cases {
            let mut tree = QueryTree::default();
            let (last, init) = c.split_last().unwrap();
            for p in init {
                tree.add_path(p).unwrap();
            }
            let err = tree.add_path(last).unwrap_err();
            match err.kind() {
                ErrorKind::DuplicateField(p) => assert_eq!(&p.as_str(), last),
                k => panic!("unexpected error for {:?}: {:?}", c, k),
            }
        }
    }

    #[test]
    fn add_path() {
        struct TestCase {
            input: &'static [&'static str],
            expected: QueryTree,
        }
        let cases = vec![
            TestCase {
                input: &["foo"],
                expected: QueryTree {
                    max_level: 1,
                    paths: vec!["foo".to_owned()],
                    root: QueryNode {
                        query_id: None,
                        level: 0,
                        children: hashmap! {
                            "foo".to_owned() => QueryNode {
                                query_id: Some(0),
                                level: 1,
                                children: Default::default(),
                            },
                        },
                    },
                },
            },
            TestCase {
                input: &["foo.bar"],
                expected: QueryTree {
                    max_level: 2,
                    paths: vec!["foo.bar".to_owned()],
                    root: QueryNode {
                        query_id: None,
                        level: 0,
                        children: hashmap! {
                            "foo".to_owned() => QueryNode {
                                query_id: None,
                                level: 1,
                                children: hashmap! {
                                    "bar".to_owned() => QueryNode {
                                        query_id: Some(0),
                                        level: 2,
                                        children: Default::default(),
                                    },
                                },
                            },
                        },
                    },
                },
            },
            TestCase {
                input: &["f1.e1.c3", "f2.e1"],
                expected: QueryTree {
                    max_level: 3,
                    paths: vec!["f1.e1.c3".to_owned(), "f2.e1".to_owned()],
                    root: QueryNode {
                        query_id: None,
                        level: 0,
                        children: hashmap! {
                            "f1".to_owned() => QueryNode {
                                query_id: None,
                                level: 1,
                                children: hashmap! {
                                    "e1".to_owned() => QueryNode {
                                        query_id: None,
                                        level: 2,
                                        children: hashmap! {
                                            "c3".to_owned() => QueryNode {
                                                query_id: Some(0),
                                                level: 3,
                                                children: Default::default(),
                                            },
                                        },
                                    },
                                },
                            },
                            "f2".to_owned() => QueryNode {
                                query_id: None,
                                level: 1,
                                children: hashmap! {
                                    "e1".to_owned() => QueryNode {
                                        query_id: Some(1),
                                        level: 2,
                                        children: Default::default(),
                                    },
                                },
                            },
                        },
                    },
                },
            },
            TestCase {
                // `\.` is a literal dot, `\\` a literal backslash
                input: &["a\\.b.c", "x\\\\y"],
                expected: QueryTree {
                    max_level: 2,
                    paths: vec!["a\\.b.c".to_owned(), "x\\\\y".to_owned()],
                    root: QueryNode {
                        query_id: None,
                        level: 0,
                        children: hashmap! {
                            "a.b".to_owned() => QueryNode {
                                query_id: None,
                                level: 1,
                                children: hashmap! {
                                    "c".to_owned() => QueryNode {
                                        query_id: Some(0),
                                        level: 2,
                                        children: Default::default(),
                                    },
                                },
                            },
                            "x\\y".to_owned() => QueryNode {
                                query_id: Some(1),
                                level: 1,
                                children: Default::default(),
                            },
                        },
                    },
                },
            },
        ];

        for t in cases {
            let mut tree = QueryTree::default();
            for path in t.input {
                tree.add_path(path).unwrap();
            }
            assert_eq!(tree, t.expected);
        }
    }
}
