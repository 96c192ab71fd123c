//! Per-placeholder side table
//!
//! Selection state lives here, keyed by node identity, instead of on the
//! host's nodes. Entries go away when the host reports a node detached.

use std::collections::HashMap;
use std::hash::Hash;

use crate::timers::TimerId;

/// Selection state of one image placeholder
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaceholderState {
    /// Selection ran; further unforced passes skip the node
    pub evaluated: bool,
    /// srcset taken off the node so native selection cannot interfere
    pub cached_srcset: Option<String>,
    /// Node had an author `width`/`height` when first swapped
    pub explicit_dimensions: Option<bool>,
    /// Outstanding intrinsic-size poll
    pub(crate) intrinsic_task: Option<TimerId>,
}

impl PlaceholderState {
    /// An intrinsic-size poll is waiting on this node
    pub fn is_polling(&self) -> bool {
        self.intrinsic_task.is_some()
    }
}

/// Side table of placeholder state
#[derive(Debug)]
pub struct PlaceholderTable<N> {
    entries: HashMap<N, PlaceholderState>,
}

impl<N> Default for PlaceholderTable<N> {
    fn default() -> Self {
        Self { entries: HashMap::new() }
    }
}

impl<N: Copy + Eq + Hash> PlaceholderTable<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, node: N) -> Option<&PlaceholderState> {
        self.entries.get(&node)
    }

    pub fn get_mut(&mut self, node: N) -> Option<&mut PlaceholderState> {
        self.entries.get_mut(&node)
    }

    /// State for `node`, created on first access
    pub fn entry(&mut self, node: N) -> &mut PlaceholderState {
        self.entries.entry(node).or_default()
    }

    pub fn remove(&mut self, node: N) -> Option<PlaceholderState> {
        self.entries.remove(&node)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
