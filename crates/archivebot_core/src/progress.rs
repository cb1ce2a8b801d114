/// Per-block presence of a feed as seen by the local store.
pub trait BlockPresence {
    /// Declared length in blocks; 0 while unknown.
    fn length(&self) -> u64;
    fn has(&self, index: u64) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub need: u64,
    pub have: u64,
}

impl Progress {
    /// Share of blocks present. An empty archive counts as complete.
    pub fn percent(&self) -> f64 {
        if self.need == 0 {
            return 100.0;
        }
        self.have as f64 / self.need as f64 * 100.0
    }

    /// Progress over a meta feed and its content feed, if the latter is known yet.
    pub fn of_feeds(meta: &dyn BlockPresence, content: Option<&dyn BlockPresence>) -> Self {
        match content {
            Some(content) => compute_progress(
                meta.length(),
                content.length(),
                |i| meta.has(i),
                |i| content.has(i),
            ),
            None => compute_progress(meta.length(), 0, |i| meta.has(i), |_| false),
        }
    }
}

/// Number of indices in `[0, length)` whose block is missing.
pub fn blocks_remaining(length: u64, has: impl Fn(u64) -> bool) -> u64 {
    if length == 0 {
        return 0;
    }
    (0..length).filter(|&index| !has(index)).count() as u64
}

pub fn compute_progress(
    meta_length: u64,
    content_length: u64,
    meta_has: impl Fn(u64) -> bool,
    content_has: impl Fn(u64) -> bool,
) -> Progress {
    let need = meta_length + content_length;
    let missing =
        blocks_remaining(meta_length, meta_has) + blocks_remaining(content_length, content_has);
    Progress {
        need,
        have: need - missing,
    }
}
