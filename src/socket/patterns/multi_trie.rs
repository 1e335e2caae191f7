// src/socket/patterns/multi_trie.rs

//! Prefix trie mapping subscriptions to sets of subscriber pipes (XPUB side).
//!
//! Same sparse-table layout as [`SubscriptionTrie`](super::trie::SubscriptionTrie),
//! but each node carries the set of pipes subscribed to that exact prefix
//! instead of a reference count, and a whole pipe can be removed in one
//! pass when a subscriber disconnects.

use crate::pipe::PipeRef;
use std::collections::HashSet;

#[derive(Default)]
pub struct MultiTrie {
  /// Pipes subscribed to exactly this prefix.
  pipes: Option<HashSet<PipeRef>>,
  min_char: u8,
  live_nodes: u32,
  next: Vec<Option<Box<MultiTrie>>>,
}

impl MultiTrie {
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds a subscription for `pipe`. Returns true if this prefix gained its
  /// first subscriber (i.e. it should be forwarded upstream).
  pub fn add(&mut self, prefix: &[u8], pipe: &PipeRef) -> bool {
    if prefix.is_empty() {
      let first = self.pipes.is_none();
      self.pipes.get_or_insert_with(HashSet::new).insert(pipe.clone());
      return first;
    }

    let current = prefix[0];
    let count = self.next.len();
    if count == 0 || current < self.min_char || current as usize >= self.min_char as usize + count {
      // Extend the child table to cover the new character.
      if count == 0 {
        self.min_char = current;
        self.next.push(None);
      } else if count == 1 {
        let old_char = self.min_char;
        let old_node = self.next.pop().and_then(|n| n);
        let new_count = usize::from(if self.min_char < current {
          current - self.min_char
        } else {
          self.min_char - current
        }) + 1;
        self.next.resize_with(new_count, || None);
        self.min_char = self.min_char.min(current);
        self.next[(old_char - self.min_char) as usize] = old_node;
      } else if self.min_char < current {
        self.next.resize_with((current - self.min_char) as usize + 1, || None);
      } else {
        let grow = (self.min_char - current) as usize;
        let mut table = Vec::with_capacity(count + grow);
        table.resize_with(grow, || None);
        table.append(&mut self.next);
        self.next = table;
        self.min_char = current;
      }
    }

    let slot = if self.next.len() == 1 {
      0
    } else {
      (current - self.min_char) as usize
    };
    let child = match &mut self.next[slot] {
      Some(child) => child,
      empty => {
        self.live_nodes += 1;
        empty.insert(Box::default())
      }
    };
    child.add(&prefix[1..], pipe)
  }

  /// Removes one subscription. Returns true when the prefix lost its last
  /// subscriber (i.e. the unsubscription should be forwarded upstream).
  pub fn remove(&mut self, prefix: &[u8], pipe: &PipeRef) -> bool {
    if prefix.is_empty() {
      if let Some(pipes) = self.pipes.as_mut() {
        pipes.remove(pipe);
        if pipes.is_empty() {
          self.pipes = None;
        }
      }
      return self.pipes.is_none();
    }

    let current = prefix[0];
    let count = self.next.len();
    if count == 0 || current < self.min_char || current as usize >= self.min_char as usize + count {
      return false;
    }

    let slot = if count == 1 {
      0
    } else {
      (current - self.min_char) as usize
    };
    let (removed, redundant) = match &mut self.next[slot] {
      Some(child) => {
        let removed = child.remove(&prefix[1..], pipe);
        (removed, child.is_redundant())
      }
      None => return false,
    };

    if redundant {
      if count == 1 {
        self.next.clear();
        self.live_nodes -= 1;
        debug_assert_eq!(self.live_nodes, 0);
      } else {
        self.next[slot] = None;
        self.live_nodes -= 1;

        if self.live_nodes == 1 {
          // Collapse back to the single-child representation.
          let mut single = None;
          for (i, entry) in self.next.iter_mut().enumerate() {
            if entry.is_some() {
              single = entry.take();
              self.min_char += i as u8;
              break;
            }
          }
          self.next.clear();
          self.next.push(single);
        } else if current == self.min_char {
          // Compact the table from the left.
          let mut skip = 1;
          while skip < self.next.len() && self.next[skip].is_none() {
            skip += 1;
          }
          self.min_char += skip as u8;
          self.next.drain(..skip);
        } else if current as usize == self.min_char as usize + count - 1 {
          // Compact the table from the right.
          let mut len = self.next.len();
          while len > 0 && self.next[len - 1].is_none() {
            len -= 1;
          }
          self.next.truncate(len);
        }
      }
    }

    removed
  }

  /// Removes every subscription held by `pipe`. `func` is invoked with each
  /// prefix whose subscriber set became empty, so the caller can send the
  /// corresponding unsubscriptions upstream.
  pub fn remove_pipe(&mut self, pipe: &PipeRef, mut func: impl FnMut(&[u8])) {
    let mut buffer = Vec::new();
    self.remove_pipe_helper(pipe, &mut buffer, &mut func);
  }

  fn remove_pipe_helper(&mut self, pipe: &PipeRef, buffer: &mut Vec<u8>, func: &mut impl FnMut(&[u8])) {
    // Remove the subscription from this node.
    if let Some(pipes) = self.pipes.as_mut() {
      if pipes.remove(pipe) && pipes.is_empty() {
        func(buffer);
        self.pipes = None;
      }
    }

    if self.next.is_empty() {
      return;
    }

    if self.next.len() == 1 {
      buffer.push(self.min_char);
      let mut prune = false;
      if let Some(child) = self.next[0].as_mut() {
        child.remove_pipe_helper(pipe, buffer, func);
        prune = child.is_redundant();
      }
      buffer.pop();
      if prune {
        self.next.clear();
        self.live_nodes -= 1;
        debug_assert_eq!(self.live_nodes, 0);
      }
      return;
    }

    let count = self.next.len();
    // Bounds of the surviving children, for table compaction below.
    let mut new_min = self.min_char as usize + count - 1;
    let mut new_max = self.min_char as usize;
    for i in 0..count {
      buffer.push(self.min_char + i as u8);
      let mut prune = false;
      if let Some(child) = self.next[i].as_mut() {
        child.remove_pipe_helper(pipe, buffer, func);
        prune = child.is_redundant();
        if !prune {
          let character = self.min_char as usize + i;
          if character < new_min {
            new_min = character;
          }
          if character > new_max {
            new_max = character;
          }
        }
      }
      buffer.pop();
      if prune {
        self.next[i] = None;
        self.live_nodes -= 1;
      }
    }

    if self.live_nodes == 0 {
      self.next.clear();
    } else if self.live_nodes == 1 {
      debug_assert_eq!(new_min, new_max);
      let slot = new_min - self.min_char as usize;
      let single = self.next[slot].take();
      self.next.clear();
      self.next.push(single);
      self.min_char = new_min as u8;
    } else if new_min > self.min_char as usize || new_max < self.min_char as usize + count - 1 {
      // Trim dead slots from both ends of the table.
      let lo = new_min - self.min_char as usize;
      let hi = new_max - self.min_char as usize;
      self.next.truncate(hi + 1);
      self.next.drain(..lo);
      self.min_char = new_min as u8;
    }
  }

  /// Invokes `func` once per pipe subscribed to any prefix of `data`.
  /// A pipe subscribed to several matching prefixes is signalled once per
  /// prefix; callers de-duplicate via the distributor's matching set.
  pub fn match_pipes(&self, data: &[u8], mut func: impl FnMut(&PipeRef)) {
    let mut current = self;
    let mut data = data;
    loop {
      // Signal the pipes attached to this node.
      if let Some(pipes) = current.pipes.as_ref() {
        for pipe in pipes {
          func(pipe);
        }
      }

      if data.is_empty() {
        return;
      }

      let count = current.next.len();
      if count == 0 {
        return;
      }

      let c = data[0];
      if count == 1 {
        if c != current.min_char {
          return;
        }
        match current.next[0].as_deref() {
          Some(child) => current = child,
          None => return,
        }
        data = &data[1..];
        continue;
      }

      if c < current.min_char || c as usize >= current.min_char as usize + count {
        return;
      }
      match current.next[(c - current.min_char) as usize].as_deref() {
        Some(child) => current = child,
        None => return,
      }
      data = &data[1..];
    }
  }

  fn is_redundant(&self) -> bool {
    self.pipes.is_none() && self.live_nodes == 0
  }
}
