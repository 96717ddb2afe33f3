use crate::libs::error::ContactError;
use std::fmt;
use std::io::Write;
use std::sync::Mutex;

/// One cell of the contact map.
///
/// Ordering is by `i`, then `j`, which is also the order `BatchSink` writes in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Triple {
    pub i: usize,
    pub j: usize,
    pub distance: u32,
}

impl Triple {
    pub fn new(i: usize, j: usize, distance: u32) -> Self {
        Self { i, j, distance }
    }

    /// The same cell on the other side of the diagonal
    pub fn mirrored(&self) -> Self {
        Self::new(self.j, self.i, self.distance)
    }
}

/// ```
/// use gcmap::libs::contact::Triple;
/// assert_eq!(Triple::new(3, 12, 4).to_string(), "3,12,4");
/// ```
impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.i, self.j, self.distance)
    }
}

/// Destination of computed triples, shared by all workers of a run.
pub trait ResultSink: Sync {
    fn emit(&self, triple: Triple) -> Result<(), ContactError>;

    /// Emits a worker's whole row in one go
    fn emit_all(&self, triples: Vec<Triple>) -> Result<(), ContactError> {
        for triple in triples {
            self.emit(triple)?;
        }
        Ok(())
    }

    /// Flushes everything and returns the number of rows written
    fn finish(self: Box<Self>) -> Result<u64, ContactError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkStrategy {
    /// Accumulate in memory, write once at the end
    Batch,
    /// Hand triples to a writer thread as they are computed
    Stream,
}

impl std::str::FromStr for SinkStrategy {
    type Err = ContactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "batch" => Ok(SinkStrategy::Batch),
            "stream" => Ok(SinkStrategy::Stream),
            _ => Err(ContactError::InvalidConfig(format!("unknown sink '{}'", s))),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SinkOpts {
    pub strategy: SinkStrategy,
    /// Also write (j, i, d) for every off-diagonal triple
    pub mirror: bool,
    /// Append to the destination instead of truncating it
    pub append: bool,
    /// Worker threads feeding the sink, 0 for one per logical core
    pub threads: usize,
}

impl Default for SinkOpts {
    fn default() -> Self {
        Self {
            strategy: SinkStrategy::Stream,
            mirror: false,
            append: false,
            threads: 0,
        }
    }
}

/// Opens `outfile` (or `stdout`) and wraps it in the configured sink.
///
/// The destination is truncated here, before any pair is computed, unless
/// `opts.append` is set.
pub fn open_sink(outfile: &str, opts: &SinkOpts) -> Result<Box<dyn ResultSink>, ContactError> {
    let out = crate::writer(outfile, opts.append).map_err(|e| write_error(outfile, e))?;

    let sink: Box<dyn ResultSink> = match opts.strategy {
        SinkStrategy::Batch => Box::new(BatchSink::new(out, outfile, opts.mirror)),
        SinkStrategy::Stream => {
            let threads = match opts.threads {
                0 => rayon::current_num_threads(),
                n => n,
            };
            Box::new(StreamSink::new(out, outfile, opts.mirror, threads * 2)?)
        }
    };
    Ok(sink)
}

fn write_error(label: &str, e: std::io::Error) -> ContactError {
    ContactError::OutputWrite(format!("{}: {}", label, e))
}

fn with_mirror(mut triples: Vec<Triple>, mirror: bool) -> Vec<Triple> {
    if mirror {
        let mirrored: Vec<Triple> = triples
            .iter()
            .filter(|t| t.i != t.j)
            .map(Triple::mirrored)
            .collect();
        triples.extend(mirrored);
    }
    triples
}

fn write_triples<W: Write>(out: &mut W, triples: &[Triple], label: &str) -> Result<(), ContactError> {
    for t in triples {
        writeln!(out, "{}", t).map_err(|e| write_error(label, e))?;
    }
    Ok(())
}

//----------------------------
// BatchSink
//----------------------------
/// Sparse in-memory contact map, sorted and written out by `finish`.
pub struct BatchSink<W> {
    triples: Mutex<Vec<Triple>>,
    out: Mutex<W>,
    label: String,
    mirror: bool,
}

impl<W: Write + Send> BatchSink<W> {
    pub fn new(out: W, label: &str, mirror: bool) -> Self {
        Self {
            triples: Mutex::new(Vec::new()),
            out: Mutex::new(out),
            label: label.to_string(),
            mirror,
        }
    }

    /// Writes the sorted triples and hands back the destination
    pub fn flush_into(self) -> Result<(W, u64), ContactError> {
        let mut triples = self.triples.into_inner().unwrap_or_else(|e| e.into_inner());
        let mut out = self.out.into_inner().unwrap_or_else(|e| e.into_inner());

        triples.sort_unstable();
        write_triples(&mut out, &triples, &self.label)?;
        out.flush().map_err(|e| write_error(&self.label, e))?;

        Ok((out, triples.len() as u64))
    }
}

impl<W: Write + Send> ResultSink for BatchSink<W> {
    fn emit(&self, triple: Triple) -> Result<(), ContactError> {
        self.emit_all(vec![triple])
    }

    fn emit_all(&self, triples: Vec<Triple>) -> Result<(), ContactError> {
        let triples = with_mirror(triples, self.mirror);
        let mut store = self.triples.lock().unwrap_or_else(|e| e.into_inner());
        store.extend(triples);
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<u64, ContactError> {
        let (_, rows) = (*self).flush_into()?;
        Ok(rows)
    }
}

//----------------------------
// StreamSink
//----------------------------
/// Single-consumer channel in front of a dedicated writer thread.
///
/// Workers only ever touch the channel; the writer thread owns the
/// destination. If a write fails the thread stops, later sends fail, and
/// `finish` returns the original I/O error.
///
/// The channel holds at most `capacity` batches; workers block on `emit_all`
/// while it is full.
pub struct StreamSink {
    tx: crossbeam::channel::Sender<Vec<Triple>>,
    handle: std::thread::JoinHandle<Result<u64, ContactError>>,
    label: String,
    mirror: bool,
}

impl StreamSink {
    pub fn new<W: Write + Send + 'static>(
        out: W,
        label: &str,
        mirror: bool,
        capacity: usize,
    ) -> Result<Self, ContactError> {
        let (tx, rx) = crossbeam::channel::bounded::<Vec<Triple>>(capacity.max(1));

        let thread_label = label.to_string();
        let handle = std::thread::Builder::new()
            .name("gcmap-writer".to_string())
            .spawn(move || -> Result<u64, ContactError> {
                let mut out = out;
                let mut rows = 0u64;
                for batch in rx.iter() {
                    write_triples(&mut out, &batch, &thread_label)?;
                    rows += batch.len() as u64;
                }
                out.flush().map_err(|e| write_error(&thread_label, e))?;
                Ok(rows)
            })
            .map_err(|e| write_error(label, e))?;

        Ok(Self {
            tx,
            handle,
            label: label.to_string(),
            mirror,
        })
    }
}

impl ResultSink for StreamSink {
    fn emit(&self, triple: Triple) -> Result<(), ContactError> {
        self.emit_all(vec![triple])
    }

    fn emit_all(&self, triples: Vec<Triple>) -> Result<(), ContactError> {
        if triples.is_empty() {
            return Ok(());
        }
        self.tx
            .send(with_mirror(triples, self.mirror))
            .map_err(|_| ContactError::OutputWrite(format!("{}: writer stopped", self.label)))
    }

    fn finish(self: Box<Self>) -> Result<u64, ContactError> {
        let StreamSink {
            tx, handle, label, ..
        } = *self;
        // Closing the channel ends the writer's loop
        drop(tx);
        handle
            .join()
            .map_err(|_| ContactError::OutputWrite(format!("{}: writer panicked", label)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Shared buffer the writer thread can own a handle to
    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn sorted_lines(&self) -> Vec<String> {
            let bytes = self.0.lock().unwrap().clone();
            let mut lines: Vec<String> = String::from_utf8(bytes)
                .unwrap()
                .lines()
                .map(|s| s.to_string())
                .collect();
            lines.sort();
            lines
        }
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "no space left"))
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_batch_sink_sorted() {
        let sink = BatchSink::new(Vec::new(), "mem", false);
        sink.emit(Triple::new(2, 5, 3)).unwrap();
        sink.emit_all(vec![Triple::new(0, 0, 0), Triple::new(0, 7, 1)])
            .unwrap();

        let (out, rows) = sink.flush_into().unwrap();
        assert_eq!(rows, 3);
        assert_eq!(String::from_utf8(out).unwrap(), "0,0,0\n0,7,1\n2,5,3\n");
    }

    #[test]
    fn test_batch_sink_mirror() {
        let sink = BatchSink::new(Vec::new(), "mem", true);
        sink.emit_all(vec![Triple::new(0, 0, 0), Triple::new(1, 4, 2)])
            .unwrap();

        let (out, rows) = sink.flush_into().unwrap();
        assert_eq!(rows, 3);
        assert_eq!(String::from_utf8(out).unwrap(), "0,0,0\n1,4,2\n4,1,2\n");
    }

    #[test]
    fn test_stream_sink_concurrent() {
        let buf = SharedBuf::default();
        let sink: Box<dyn ResultSink> = Box::new(StreamSink::new(buf.clone(), "mem", false, 8).unwrap());

        std::thread::scope(|s| {
            for t in 0..4 {
                let sink = &sink;
                s.spawn(move || {
                    for k in 0..250 {
                        sink.emit(Triple::new(t, k, (t + k) as u32)).unwrap();
                    }
                });
            }
        });

        assert_eq!(sink.finish().unwrap(), 1000);

        let lines = buf.sorted_lines();
        assert_eq!(lines.len(), 1000);
        // No torn lines
        for line in &lines {
            let fields: Vec<usize> = line.split(',').map(|f| f.parse().unwrap()).collect();
            assert_eq!(fields.len(), 3);
            assert_eq!(fields[0] + fields[1], fields[2]);
        }
    }

    #[test]
    fn test_stream_sink_write_error() {
        let sink: Box<dyn ResultSink> = Box::new(StreamSink::new(FailingWriter, "broken", false, 2).unwrap());
        // The first batch may be accepted before the writer fails
        let _ = sink.emit(Triple::new(0, 0, 0));

        let err = sink.finish().unwrap_err();
        assert!(matches!(err, ContactError::OutputWrite(_)));
        assert!(err.to_string().contains("no space left"));
    }

    #[test]
    fn test_sink_strategy_from_str() {
        assert_eq!("batch".parse::<SinkStrategy>().unwrap(), SinkStrategy::Batch);
        assert_eq!("stream".parse::<SinkStrategy>().unwrap(), SinkStrategy::Stream);
        assert!("dense".parse::<SinkStrategy>().is_err());
    }

    #[test]
    fn test_stream_sink_small_queue() {
        let buf = SharedBuf::default();
        let sink: Box<dyn ResultSink> = Box::new(StreamSink::new(buf.clone(), "mem", true, 1).unwrap());

        // Senders wait for the writer instead of piling batches up
        for k in 0..100 {
            sink.emit_all(vec![Triple::new(0, k, 1), Triple::new(k, k, 0)])
                .unwrap();
        }
        // Mirrors of the 99 off-diagonal triples
        assert_eq!(sink.finish().unwrap(), 200 + 99);
        assert_eq!(buf.sorted_lines().len(), 299);
    }

    #[test]
    fn test_open_sink_threads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let opts = SinkOpts {
            threads: 3,
            ..Default::default()
        };

        let sink = open_sink(path.to_str().unwrap(), &opts).unwrap();
        sink.emit_all(vec![Triple::new(0, 0, 0), Triple::new(0, 5, 2)])
            .unwrap();
        assert_eq!(sink.finish().unwrap(), 2);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "0,0,0\n0,5,2\n");
    }

    #[test]
    fn test_open_sink_unwritable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("out.csv");

        let res = open_sink(path.to_str().unwrap(), &SinkOpts::default());
        assert!(matches!(res, Err(ContactError::OutputWrite(_))));
    }
}
