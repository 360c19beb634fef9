//! In-memory link queue

use super::link::{Link, ValidationError};

/// Ordered, append-only collection of links
///
/// Insertion order is display and dump order. Positions handed out to
/// callers are 1-based. Links leave the queue only through [`clear`] or
/// [`drain_delivered`], both driven by a successful dump.
///
/// [`clear`]: LinkQueue::clear
/// [`drain_delivered`]: LinkQueue::drain_delivered
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkQueue {
    links: Vec<Link>,
}

impl LinkQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `raw` and append it
    ///
    /// Returns the 1-based position of the new link. On error the queue is
    /// untouched.
    pub fn submit(&mut self, raw: &str) -> Result<usize, ValidationError> {
        let link = Link::parse(raw)?;
        Ok(self.push(link))
    }

    /// Append an already validated link, returning its 1-based position
    pub fn push(&mut self, link: Link) -> usize {
        self.links.push(link);
        self.links.len()
    }

    /// Iterate `(position, link)` pairs in queue order
    pub fn list(&self) -> impl ExactSizeIterator<Item = (usize, &Link)> + '_ {
        self.links.iter().enumerate().map(|(i, link)| (i + 1, link))
    }

    /// Number of queued links
    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Copy of the current contents
    pub fn snapshot(&self) -> Vec<Link> {
        self.links.clone()
    }

    /// Drop every queued link
    pub fn clear(&mut self) {
        self.links.clear();
    }

    /// Remove the first `count` links (a delivered snapshot) and return them
    ///
    /// Links appended after the snapshot was taken stay queued and move up
    /// to the front.
    pub fn drain_delivered(&mut self, count: usize) -> Vec<Link> {
        let count = count.min(self.links.len());
        self.links.drain(..count).collect()
    }
}
