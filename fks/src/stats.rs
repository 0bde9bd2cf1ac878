//! Collecting statistics of building and querying perfect hash tables.

use std::fmt::{Display, Formatter};
use std::io::Write;

/// Trait for collecting (and summarizing or reporting) events during construction of a table.
pub trait BuildStatsCollector {
    /// Called once for each first-level bucket (including the empty ones) in the order of their indices.
    #[inline(always)] fn bucket(&mut self, _index: usize, _size: usize) {}

    /// Called each time a second-level function is drawn for a bucket that holds more than one key.
    #[inline(always)] fn draw(&mut self, _index: usize, _size: usize) {}

    /// Called when the bucket of given `size` is found to contain only `distinct` distinct keys and is packed.
    #[inline(always)] fn packed(&mut self, _index: usize, _size: usize, _distinct: usize) {}

    /// Called after successful construction of the table with given number of `rows` and total number of `slots`.
    #[inline(always)] fn end(&mut self, _rows: usize, _slots: usize) {}
}

impl BuildStatsCollector for () {}

/// Build statistics collector that writes each event as a line to the given writer.
///
/// Panics if writing fails.
pub struct BuildStatsPrinter<W: Write = std::io::Stdout> {
    writer: W,
}

impl BuildStatsPrinter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self { writer: std::io::stdout() }
    }
}

impl<W: Write> BuildStatsPrinter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W { self.writer }
}

impl<W: Write> BuildStatsCollector for BuildStatsPrinter<W> {
    fn bucket(&mut self, index: usize, size: usize) {
        if size > 1 { writeln!(self.writer, "bucket {} {}", index, size).unwrap(); }
    }

    fn draw(&mut self, index: usize, _size: usize) {
        writeln!(self.writer, "draw {}", index).unwrap();
    }

    fn packed(&mut self, index: usize, size: usize, distinct: usize) {
        writeln!(self.writer, "packed {} {} {}", index, size, distinct).unwrap();
    }

    fn end(&mut self, rows: usize, slots: usize) {
        writeln!(self.writer, "end {} {}", rows, slots).unwrap();
    }
}

/// Build statistics collector that summarizes the construction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Number of empty buckets.
    pub empty: usize,
    /// Number of buckets with exactly one key.
    pub singletons: usize,
    /// Number of buckets with more than one key.
    pub multi: usize,
    /// Number of buckets packed because of duplicates.
    pub packed: usize,
    /// Total number of second-level functions drawn.
    pub draws: usize,
    /// The largest number of functions drawn for a single bucket.
    pub max_draws: usize,
    /// Size of the largest bucket.
    pub max_bucket_size: usize,
    /// Total number of slots in all rows.
    pub slots: usize,
    current_draws: usize,
}

impl BuildStats {
    /// Returns the average number of functions drawn per bucket holding more than one key.
    pub fn avg_draws(&self) -> f64 {
        if self.multi == 0 { 0.0 } else { self.draws as f64 / self.multi as f64 }
    }
}

impl Display for BuildStats {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "buckets empty/single/multi: {}/{}/{}", self.empty, self.singletons, self.multi)?;
        write!(f, "\tlargest bucket: {}", self.max_bucket_size)?;
        write!(f, "\tdraws avg/max: {:.2}/{}", self.avg_draws(), self.max_draws)?;
        if self.packed != 0 { write!(f, "\tpacked: {}", self.packed)?; }
        write!(f, "\tslots: {}", self.slots)
    }
}

impl BuildStatsCollector for BuildStats {
    fn bucket(&mut self, _index: usize, size: usize) {
        match size {
            0 => self.empty += 1,
            1 => self.singletons += 1,
            _ => self.multi += 1
        }
        self.max_bucket_size = self.max_bucket_size.max(size);
        self.current_draws = 0;
    }

    fn draw(&mut self, _index: usize, _size: usize) {
        self.draws += 1;
        self.current_draws += 1;
        self.max_draws = self.max_draws.max(self.current_draws);
    }

    fn packed(&mut self, _index: usize, _size: usize, _distinct: usize) {
        self.packed += 1;
    }

    fn end(&mut self, _rows: usize, slots: usize) {
        self.slots = slots;
    }
}

/// Trait for collecting (and summarizing or reporting) events during lookups.
pub trait AccessStatsCollector {
    /// Lookup algorithm calls this method to report that the key has been found after comparing it with `probes` stored keys.
    #[inline(always)] fn found(&mut self, _probes: usize) {}

    /// Lookup algorithm calls this method to report that the key is absent after comparing it with `probes` stored keys.
    #[inline(always)] fn not_found(&mut self, _probes: usize) {}
}

impl AccessStatsCollector for () {}

impl AccessStatsCollector for u64 {
    #[inline(always)] fn found(&mut self, probes: usize) { *self += probes as u64; }
    #[inline(always)] fn not_found(&mut self, probes: usize) { *self += probes as u64; }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_stats() {
        let mut s = BuildStats::default();
        s.bucket(0, 0);
        s.bucket(1, 3);
        s.draw(1, 3);
        s.draw(1, 3);
        s.bucket(2, 1);
        s.bucket(3, 2);
        s.draw(3, 2);
        s.packed(3, 2, 1);
        s.end(4, 1 + 9 + 4);
        assert_eq!((s.empty, s.singletons, s.multi, s.packed), (1, 1, 2, 1));
        assert_eq!((s.draws, s.max_draws, s.max_bucket_size, s.slots), (3, 2, 3, 14));
        assert_eq!(s.avg_draws(), 1.5);
        assert_eq!(s.to_string(), "buckets empty/single/multi: 1/1/2\tlargest bucket: 3\tdraws avg/max: 1.50/2\tpacked: 1\tslots: 14");
    }

    #[test]
    fn test_printer() {
        let mut p = BuildStatsPrinter::new(Vec::new());
        p.bucket(0, 1);
        p.bucket(1, 2);
        p.draw(1, 2);
        p.end(2, 5);
        assert_eq!(String::from_utf8(p.into_inner()).unwrap(), "bucket 1 2\ndraw 1\nend 2 5\n");
    }

    struct Closed;
    impl Write for Closed {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }
        fn flush(&mut self) -> std::io::Result<()> { Ok(()) }
    }

    #[test]
    #[should_panic]
    fn test_printer_write_error() {
        BuildStatsPrinter::new(Closed).draw(0, 2);
    }
}
