//! Branching undo/redo history.
//!
//! A [`History`] is a tree of diagram snapshots. Every entry holds its own
//! deep copy of a diagram, the label of the command that produced it, a
//! link to the entry it was produced from, and the list of entries
//! produced from it ("futures").
//!
//! Undoing and then recording a new change does not discard the old redo
//! path: the new entry becomes an additional future. The last future in
//! the list is always the one a plain redo resumes, so resuming an older
//! future moves it to the end.
//!
//! ```text
//! Start ── Add A ── Add B          futures of "Add A": [Add B, Move B]
//!              └─── Move B         redo(0) resumes "Add B" and moves it last
//! ```
//!
//! The chain from the current entry back to the root is bounded by a
//! [`HistoryLimit`]. When a new record exceeds it the oldest part of the
//! tree is cut off and its entries are reclaimed.

use log::{debug, trace};
use thiserror::Error;

use trellis_core::diagram::Diagram;

/// Source of the maximum number of entries kept on the undo chain.
///
/// The limit is read on every [`History::record`], so a host can change
/// it at any time. A limit of 0 means unlimited.
pub trait HistoryLimit {
    fn history_limit(&self) -> usize;
}

impl<F> HistoryLimit for F
where
    F: Fn() -> usize,
{
    fn history_limit(&self) -> usize {
        self()
    }
}

/// A limit that never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedLimit(pub usize);

impl HistoryLimit for FixedLimit {
    fn history_limit(&self) -> usize {
        self.0
    }
}

/// Errors from history navigation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("nothing to undo")]
    NothingToUndo,

    #[error("nothing to redo")]
    NothingToRedo,

    #[error("redo {which} requested, but only {available} futures exist")]
    NoSuchFuture { which: usize, available: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EntryIndex(usize);

#[derive(Debug)]
struct Entry {
    diagram: Diagram,
    label: String,
    parent: Option<EntryIndex>,
    /// In order of creation or resumption; the last is the primary future.
    futures: Vec<EntryIndex>,
}

/// Undo/redo history over diagram snapshots.
///
/// # Examples
///
/// ```
/// use trellis::history::{FixedLimit, History};
/// use trellis_core::{diagram::Diagram, entity::Entity};
///
/// let mut diagram = Diagram::new();
/// let mut history = History::new(&diagram, "Start", FixedLimit(100));
///
/// diagram.add_entity(Entity::default());
/// history.record(&diagram, "Add entity");
///
/// let previous = history.undo().unwrap();
/// assert_eq!(previous, Diagram::new());
/// assert_eq!(history.redo_most_recent().unwrap(), diagram);
/// ```
#[derive(Debug)]
pub struct History<L = FixedLimit> {
    entries: Vec<Entry>,
    current: EntryIndex,
    limit: L,
}

impl<L: HistoryLimit> History<L> {
    /// Starts a history whose only entry is a copy of `initial`.
    pub fn new(initial: &Diagram, label: impl Into<String>, limit: L) -> Self {
        let root = Entry {
            diagram: initial.deep_copy(),
            label: label.into(),
            parent: None,
            futures: Vec::new(),
        };
        Self {
            entries: vec![root],
            current: EntryIndex(0),
            limit,
        }
    }

    fn entry(&self, index: EntryIndex) -> &Entry {
        &self.entries[index.0]
    }

    fn entry_mut(&mut self, index: EntryIndex) -> &mut Entry {
        &mut self.entries[index.0]
    }

    /// Records a change made by a command (not by undo or redo).
    ///
    /// A copy of `diagram` becomes a new future of the current entry and
    /// the new current entry. The history limit is then applied.
    pub fn record(&mut self, diagram: &Diagram, label: impl Into<String>) {
        let label = label.into();
        let index = EntryIndex(self.entries.len());
        self.entries.push(Entry {
            diagram: diagram.deep_copy(),
            label,
            parent: Some(self.current),
            futures: Vec::new(),
        });
        let parent = self.current;
        self.entry_mut(parent).futures.push(index);
        self.current = index;

        trace!(label = self.entry(index).label.as_str(); "Recorded history entry");
        self.apply_limit();
    }

    /// Cuts the parent link above the oldest entry the limit allows and
    /// reclaims everything that is no longer reachable.
    fn apply_limit(&mut self) {
        let limit = self.limit.history_limit();
        if limit == 0 {
            return;
        }

        // The current entry counts against the limit.
        let mut ancestor = self.current;
        for _ in 1..limit {
            match self.entry(ancestor).parent {
                Some(parent) => ancestor = parent,
                None => return,
            }
        }

        if self.entry_mut(ancestor).parent.take().is_some() {
            self.compact(ancestor);
        }
    }

    /// Keeps only the entries reachable from `root`, preserving their
    /// relative order.
    fn compact(&mut self, root: EntryIndex) {
        let mut reachable = vec![false; self.entries.len()];
        let mut pending = vec![root];
        while let Some(index) = pending.pop() {
            reachable[index.0] = true;
            pending.extend(self.entry(index).futures.iter().copied());
        }

        let mut remap = vec![None; self.entries.len()];
        let mut next = 0;
        for (old, keep) in reachable.iter().enumerate() {
            if *keep {
                remap[old] = Some(EntryIndex(next));
                next += 1;
            }
        }
        let moved = |index: EntryIndex| {
            remap[index.0].expect("reachable entries link only to reachable entries")
        };

        let before = self.entries.len();
        let entries = std::mem::take(&mut self.entries);
        self.entries = entries
            .into_iter()
            .zip(reachable)
            .filter_map(|(entry, keep)| keep.then_some(entry))
            .map(|mut entry| {
                entry.parent = entry.parent.map(moved);
                entry.futures = entry.futures.into_iter().map(moved).collect();
                entry
            })
            .collect();
        self.current = moved(self.current);

        debug!(
            discarded = before - self.entries.len(),
            kept = self.entries.len();
            "Trimmed undo history"
        );
    }

    /// The diagram of the current entry.
    ///
    /// This is the history's own copy, meant for comparison against the
    /// diagram being edited.
    pub fn current_diagram(&self) -> &Diagram {
        &self.entry(self.current).diagram
    }

    /// Label of the command that produced the current entry.
    pub fn current_label(&self) -> &str {
        &self.entry(self.current).label
    }

    pub fn can_undo(&self) -> bool {
        self.entry(self.current).parent.is_some()
    }

    pub fn can_redo(&self) -> bool {
        self.num_redos() > 0
    }

    /// Number of futures of the current entry.
    pub fn num_redos(&self) -> usize {
        self.entry(self.current).futures.len()
    }

    /// Labels of the current entry's futures; index `i` describes
    /// `redo(i)`.
    pub fn describe_redos(&self) -> Vec<&str> {
        self.entry(self.current)
            .futures
            .iter()
            .map(|index| self.entry(*index).label.as_str())
            .collect()
    }

    /// Number of entries held, across every branch.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Number of entries on the chain from the current entry to the root,
    /// including both.
    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut index = self.current;
        while let Some(parent) = self.entry(index).parent {
            depth += 1;
            index = parent;
        }
        depth
    }

    /// Moves to the parent entry and returns a copy of its diagram.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::NothingToUndo`] at the root.
    pub fn undo(&mut self) -> Result<Diagram, HistoryError> {
        let parent = self
            .entry(self.current)
            .parent
            .ok_or(HistoryError::NothingToUndo)?;
        trace!(label = self.current_label(); "Undo");
        self.current = parent;
        Ok(self.entry(parent).diagram.deep_copy())
    }

    /// Moves to future `which` and returns a copy of its diagram.
    ///
    /// The resumed future becomes the last (primary) one.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::NoSuchFuture`] if `which` is out of range.
    pub fn redo(&mut self, which: usize) -> Result<Diagram, HistoryError> {
        let current = self.current;
        let futures = &mut self.entry_mut(current).futures;
        if which >= futures.len() {
            return Err(HistoryError::NoSuchFuture {
                which,
                available: futures.len(),
            });
        }
        let resumed = futures.remove(which);
        futures.push(resumed);

        self.current = resumed;
        trace!(which = which, label = self.current_label(); "Redo");
        Ok(self.entry(resumed).diagram.deep_copy())
    }

    /// Resumes the primary future.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::NothingToRedo`] if there are no futures.
    pub fn redo_most_recent(&mut self) -> Result<Diagram, HistoryError> {
        match self.num_redos() {
            0 => Err(HistoryError::NothingToRedo),
            n => self.redo(n - 1),
        }
    }

    /// Renders the whole tree for diagnostics.
    ///
    /// One line per entry: `*` marks the current entry, `-` the others.
    /// Alternate futures are listed first, indented under a header; the
    /// primary future follows at its parent's indentation.
    ///
    /// # Panics
    ///
    /// Panics if the parent chain contains a cycle.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_from(&mut out, 0, self.root());
        out
    }

    /// Walks parent links to the root, with a second cursor at half speed
    /// to catch cycles.
    fn root(&self) -> EntryIndex {
        let mut root = self.current;
        let mut slower = self.current;
        while let Some(parent) = self.entry(root).parent {
            root = parent;
            slower = self
                .entry(slower)
                .parent
                .expect("the slow cursor trails the fast one");
            if let Some(parent) = self.entry(root).parent {
                root = parent;
                if root == slower {
                    panic!("history parent chain has a cycle");
                }
            }
        }
        root
    }

    fn dump_from(&self, out: &mut String, indent: usize, start: EntryIndex) {
        let mut index = start;
        loop {
            let entry = self.entry(index);
            out.push_str(&"  ".repeat(indent));
            out.push_str(if index == self.current { "* " } else { "- " });
            out.push_str(&entry.label);

            let size = entry.diagram.window_size();
            if let Some(parent) = entry.parent {
                if self.entry(parent).diagram.window_size() != size {
                    out.push_str(&format!(
                        " and resize to ({},{})",
                        size.width(),
                        size.height()
                    ));
                }
            }
            out.push_str(&format!(
                ": (e={}, i={}, r={})\n",
                entry.diagram.entity_count(),
                entry.diagram.inheritance_count(),
                entry.diagram.relation_count()
            ));

            let Some((&primary, alternates)) = entry.futures.split_last() else {
                return;
            };
            for (i, alternate) in alternates.iter().enumerate() {
                out.push_str(&"  ".repeat(indent + 1));
                out.push_str(&format!("> alternate future {}:\n", i + 1));
                self.dump_from(out, indent + 2, *alternate);
            }
            index = primary;
        }
    }
}
