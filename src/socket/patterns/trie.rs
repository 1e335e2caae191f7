// src/socket/patterns/trie.rs

//! Prefix trie holding this socket's own subscriptions (XSUB side).
//!
//! Each node stores a reference count (the same prefix can be subscribed
//! several times) and a sparse child table covering the byte range
//! `[min_char, min_char + next.len())`. The table grows and shrinks from
//! either end as children appear and disappear, and collapses back to the
//! compact single-child form when only one child remains.

/// Reference-counted subscription store for a single owner.
#[derive(Default)]
pub struct SubscriptionTrie {
  refcount: u32,
  min_char: u8,
  live_nodes: u32,
  /// Child table; `next.len()` is the covered range width.
  next: Vec<Option<Box<SubscriptionTrie>>>,
}

impl SubscriptionTrie {
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds a prefix. Returns true if this is a new entry rather than a
  /// duplicate.
  pub fn add(&mut self, prefix: &[u8]) -> bool {
    // We are at the node corresponding to the prefix. We are done.
    if prefix.is_empty() {
      self.refcount += 1;
      return self.refcount == 1;
    }

    let current = prefix[0];
    let count = self.next.len();
    if count == 0 || current < self.min_char || current as usize >= self.min_char as usize + count {
      // The character is outside the currently covered range; extend the
      // child table.
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
        // The new character is above the covered range.
        self.next.resize_with((current - self.min_char) as usize + 1, || None);
      } else {
        // The new character is below the covered range.
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
    child.add(&prefix[1..])
  }

  /// Removes a prefix. Returns true if the entry was actually removed
  /// rather than merely de-duplicated.
  pub fn remove(&mut self, prefix: &[u8]) -> bool {
    if prefix.is_empty() {
      if self.refcount == 0 {
        return false;
      }
      self.refcount -= 1;
      return self.refcount == 0;
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
    let (was_removed, redundant) = match &mut self.next[slot] {
      Some(child) => {
        let was_removed = child.remove(&prefix[1..]);
        (was_removed, child.is_redundant())
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
          // Only one live child remains; switch back to the compact
          // single-child representation.
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

    was_removed
  }

  /// Checks whether the given key matches any stored prefix.
  pub fn check(&self, data: &[u8]) -> bool {
    // On the critical path; iterative on purpose.
    let mut current = self;
    let mut data = data;
    loop {
      // We've found a corresponding subscription.
      if current.refcount > 0 {
        return true;
      }

      // Key exhausted without a match.
      if data.is_empty() {
        return false;
      }

      let c = data[0];
      let count = current.next.len();
      if count == 0 || c < current.min_char || c as usize >= current.min_char as usize + count {
        return false;
      }

      let slot = if count == 1 {
        0
      } else {
        (c - current.min_char) as usize
      };
      match current.next[slot].as_deref() {
        Some(child) => current = child,
        None => return false,
      }
      data = &data[1..];
    }
  }

  /// Invokes `func` once per stored prefix (subscription replay).
  pub fn apply(&self, mut func: impl FnMut(&[u8])) {
    let mut buffer = Vec::new();
    self.apply_helper(&mut buffer, &mut func);
  }

  fn apply_helper(&self, buffer: &mut Vec<u8>, func: &mut impl FnMut(&[u8])) {
    if self.refcount > 0 {
      func(buffer);
    }

    if self.next.is_empty() {
      return;
    }

    if self.next.len() == 1 {
      buffer.push(self.min_char);
      if let Some(child) = self.next[0].as_deref() {
        child.apply_helper(buffer, func);
      }
      buffer.pop();
      return;
    }

    for (i, entry) in self.next.iter().enumerate() {
      if let Some(child) = entry.as_deref() {
        buffer.push(self.min_char + i as u8);
        child.apply_helper(buffer, func);
        buffer.pop();
      }
    }
  }

  fn is_redundant(&self) -> bool {
    self.refcount == 0 && self.live_nodes == 0
  }
}
