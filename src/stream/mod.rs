
use std::collections::HashMap;

use crate::context::Context;
use crate::error::{Error, Result};

/// StreamList holds the concrete streams of a session keyed by SSRC.
#[derive(Default)]
pub struct StreamList {
    streams: HashMap<u32, Context>,
}

impl StreamList {
    pub fn new() -> Self {
        StreamList::default()
    }

    pub fn insert(&mut self, context: Context) -> Result<()> {
        let ssrc = context.ssrc();
        if self.streams.contains_key(&ssrc) {
            return Err(Error::StreamWithSsrcExists(ssrc));
        }
        self.streams.insert(ssrc, context);
        Ok(())
    }

    pub fn get(&self, ssrc: u32) -> Option<&Context> {
        self.streams.get(&ssrc)
    }

    pub fn get_mut(&mut self, ssrc: u32) -> Option<&mut Context> {
        self.streams.get_mut(&ssrc)
    }

    pub fn remove(&mut self, ssrc: u32) -> Option<Context> {
        self.streams.remove(&ssrc)
    }

    pub(crate) fn replace(&mut self, context: Context) {
        self.streams.insert(context.ssrc(), context);
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    pub fn contains(&self, ssrc: u32) -> bool {
        self.streams.contains_key(&ssrc)
    }

    /// SSRCs in ascending order.
    pub fn ssrcs(&self) -> Vec<u32> {
        let mut ssrcs: Vec<u32> = self.streams.keys().copied().collect();
        ssrcs.sort_unstable();
        ssrcs
    }

    pub fn iter(&self) -> impl Iterator<Item = &Context> {
        self.streams.values()
    }

    /// Calls `f` with each SSRC present when the walk starts, in ascending
    /// order, until it returns false. `f` gets the list itself and may remove
    /// or insert streams; SSRCs removed before their turn are skipped.
    pub fn for_each<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut StreamList, u32) -> bool,
    {
        for ssrc in self.ssrcs() {
            if !self.contains(ssrc) {
                continue;
            }
            if !f(self, ssrc) {
                break;
            }
        }
    }

    /// Keeps only the streams for which `f` returns true.
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&Context) -> bool,
    {
        self.streams.retain(|_, context| f(context));
    }
}
