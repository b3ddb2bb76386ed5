//! Incrementally fetched collection records for charting.

use std::collections::{BTreeMap, VecDeque};

use shared::domain::Sample;

#[derive(Debug, Clone, PartialEq)]
pub struct CollectionSeries {
    name: String,
    samples: VecDeque<Sample>,
    next_offset: usize,
    retention: Option<usize>,
}

impl CollectionSeries {
    pub fn new(name: impl Into<String>, retention: Option<usize>) -> Self {
        Self {
            name: name.into(),
            samples: VecDeque::new(),
            next_offset: 0,
            retention,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Record offset of the next chunk to request.
    pub fn next_offset(&self) -> usize {
        self.next_offset
    }

    pub fn samples(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Widest record seen, i.e. the number of metric columns to plot.
    pub fn metric_count(&self) -> usize {
        self.samples.iter().map(|s| s.values.len()).max().unwrap_or(0)
    }

    /// Appends a chunk fetched at `offset`; returns the number of records appended.
    ///
    /// Chunks below [`Self::next_offset`] are stale and ignored. A chunk past it (records were
    /// missed) is accepted and the offset jumps forward.
    pub fn append_chunk(&mut self, offset: usize, chunk: Vec<Sample>) -> usize {
        if offset < self.next_offset {
            tracing::debug!(
                collection = %self.name,
                offset,
                expected = self.next_offset,
                "ignoring stale collection chunk"
            );
            return 0;
        }
        if offset > self.next_offset {
            tracing::debug!(
                collection = %self.name,
                offset,
                expected = self.next_offset,
                "collection chunk skips records"
            );
        }
        let received = chunk.len();
        self.next_offset = offset + received;
        self.samples.extend(chunk);
        if let Some(limit) = self.retention {
            while self.samples.len() > limit {
                self.samples.pop_front();
            }
        }
        received
    }
}

/// Series for every collection the backend currently lists.
#[derive(Debug, Clone, Default)]
pub struct CollectionSet {
    series: BTreeMap<String, CollectionSeries>,
    retention: Option<usize>,
}

impl CollectionSet {
    pub fn new(retention: Option<usize>) -> Self {
        Self {
            series: BTreeMap::new(),
            retention,
        }
    }

    /// Keeps series for names still listed, creates new ones, drops the rest.
    pub fn sync_names(&mut self, names: &[String]) {
        self.series.retain(|name, _| names.contains(name));
        for name in names {
            if !self.series.contains_key(name) {
                self.series.insert(
                    name.clone(),
                    CollectionSeries::new(name.clone(), self.retention),
                );
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&CollectionSeries> {
        self.series.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut CollectionSeries> {
        self.series.get_mut(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CollectionSeries> {
        self.series.values()
    }

    /// `(name, offset)` of the next chunk for each series.
    pub fn pending_requests(&self) -> Vec<(String, usize)> {
        self.series
            .values()
            .map(|series| (series.name.clone(), series.next_offset))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}
