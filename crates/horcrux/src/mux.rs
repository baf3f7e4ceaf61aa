//! round-robin distribution of a byte stream across shards
//!
//! when every shard is required to bind, storing the full payload in each
//! one is wasteful. the demultiplexer deals the stream out in fixed quotas,
//! shard 1 first, wrapping around; the multiplexer reads it back in the same
//! order. readers must be in ascending shard index order, which
//! [`Multiplexer::from_indexed`] enforces.

use std::io::{self, Read, Write};

use crate::{Error, Result};

/// bytes written to one shard before moving to the next
pub const BYTE_QUOTA: usize = 100;

/// position of a round-robin pass: which shard, and how far into its quota
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundRobin {
    shards: usize,
    quota: usize,
    current: usize,
    consumed: usize,
}

impl RoundRobin {
    pub(crate) fn new(shards: usize, quota: usize) -> Self {
        assert!(shards > 0, "round robin needs at least one shard");
        assert!(quota > 0, "round robin quota must be non-zero");
        Self {
            shards,
            quota,
            current: 0,
            consumed: 0,
        }
    }

    /// 0-based position of the shard currently being served
    pub fn current(&self) -> usize {
        self.current
    }

    /// bytes left in the current shard's quota
    pub fn room(&self) -> usize {
        self.quota - self.consumed
    }

    /// record `n` bytes moved; rolls over to the next shard at the quota
    pub fn advance(&mut self, n: usize) {
        debug_assert!(n <= self.room());
        self.consumed += n;
        if self.consumed == self.quota {
            self.current = (self.current + 1) % self.shards;
            self.consumed = 0;
        }
    }
}

/// deals written bytes across `writers` in quota-sized runs
pub struct Demultiplexer<W> {
    writers: Vec<W>,
    state: RoundRobin,
}

impl<W: Write> Demultiplexer<W> {
    /// `writers` must not be empty
    pub(crate) fn new(writers: Vec<W>) -> Self {
        Self::with_quota(writers, BYTE_QUOTA)
    }

    pub(crate) fn with_quota(writers: Vec<W>, quota: usize) -> Self {
        let state = RoundRobin::new(writers.len(), quota);
        Self { writers, state }
    }

    pub fn into_inner(self) -> Vec<W> {
        self.writers
    }
}

impl<W: Write> Write for Demultiplexer<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut rest = buf;
        while !rest.is_empty() {
            let take = rest.len().min(self.state.room());
            self.writers[self.state.current()].write_all(&rest[..take])?;
            self.state.advance(take);
            rest = &rest[take..];
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        for writer in self.writers.iter_mut() {
            writer.flush()?;
        }
        Ok(())
    }
}

/// reassembles a demultiplexed stream; readers must be in shard order
pub struct Multiplexer<R> {
    readers: Vec<R>,
    state: RoundRobin,
}

impl<R: Read> Multiplexer<R> {
    /// `readers` are taken as already sorted by shard index and must not be empty
    pub(crate) fn new(readers: Vec<R>) -> Self {
        Self::with_quota(readers, BYTE_QUOTA)
    }

    pub(crate) fn with_quota(readers: Vec<R>, quota: usize) -> Self {
        let state = RoundRobin::new(readers.len(), quota);
        Self { readers, state }
    }

    /// sort `(index, reader)` pairs by index and require exactly 1..=total
    pub fn from_indexed(mut shards: Vec<(u8, R)>, total: u8) -> Result<Self> {
        if total == 0 {
            return Err(Error::NoShards);
        }
        shards.sort_by_key(|(index, _)| *index);

        if let Some(pair) = shards.windows(2).find(|pair| pair[0].0 == pair[1].0) {
            return Err(Error::DuplicateShard(pair[0].0));
        }
        if let Some(missing) = (1..=total)
            .find(|i| shards.binary_search_by_key(i, |(index, _)| *index).is_err())
        {
            return Err(Error::MissingShard(missing));
        }
        if let Some((extra, _)) = shards.iter().find(|(index, _)| *index == 0 || *index > total) {
            return Err(Error::UnexpectedShard(*extra));
        }

        Ok(Self::new(shards.into_iter().map(|(_, r)| r).collect()))
    }
}

impl<R: Read> Read for Multiplexer<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let want = buf.len().min(self.state.room());
        let n = self.readers[self.state.current()].read(&mut buf[..want])?;
        // an exhausted shard mid-rotation is the end of the stream
        self.state.advance(n);
        Ok(n)
    }
}

/// copies every write into all `writers`
pub struct Broadcast<W> {
    writers: Vec<W>,
}

impl<W: Write> Broadcast<W> {
    pub fn new(writers: Vec<W>) -> Self {
        Self { writers }
    }

    pub fn into_inner(self) -> Vec<W> {
        self.writers
    }
}

impl<W: Write> Write for Broadcast<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for writer in self.writers.iter_mut() {
            writer.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        for writer in self.writers.iter_mut() {
            writer.flush()?;
        }
        Ok(())
    }
}
