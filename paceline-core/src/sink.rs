//! Where finished records go.

use std::io::{self, Write};

use crate::record::MeasurementRecord;

/// Receives each completed record exactly once.
///
/// Emission failures are the caller's to handle; the engines log and keep
/// the record rather than failing a finished run over a sink error.
pub trait RecordSink {
    /// Deliver one completed record.
    fn emit(&mut self, record: &MeasurementRecord) -> io::Result<()>;
}

impl<S: RecordSink + ?Sized> RecordSink for &mut S {
    fn emit(&mut self, record: &MeasurementRecord) -> io::Result<()> {
        (**self).emit(record)
    }
}

/// Sink that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl RecordSink for NullSink {
    fn emit(&mut self, _record: &MeasurementRecord) -> io::Result<()> {
        Ok(())
    }
}

/// Sink that collects records in memory, mostly for tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    /// Records received, in emission order.
    pub records: Vec<MeasurementRecord>,
}

impl MemorySink {
    /// An empty sink.
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordSink for MemorySink {
    fn emit(&mut self, record: &MeasurementRecord) -> io::Result<()> {
        self.records.push(record.clone());
        Ok(())
    }
}

/// Sink writing one JSON object per line, flushed per record so partial
/// output survives a crash.
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    /// Sink wrapping the given writer.
    pub fn new(writer: W) -> Self {
        JsonLinesSink { writer }
    }

    /// Recover the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordSink for JsonLinesSink<W> {
    fn emit(&mut self, record: &MeasurementRecord) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfiguration;
    use crate::definition::TestDefinition;
    use crate::sample::SampleCollector;

    fn sample_record() -> MeasurementRecord {
        let mut collector = SampleCollector::new();
        collector.record(100, false, false).unwrap();
        collector.record(110, false, false).unwrap();
        MeasurementRecord::assemble(
            TestDefinition::new("com.example", "Suite", "case"),
            RunConfiguration::default(),
            collector.into_samples(),
            true,
            0,
        )
    }

    #[test]
    fn test_memory_sink_collects_in_order() {
        let mut sink = MemorySink::new();
        let record = sample_record();
        sink.emit(&record).unwrap();
        sink.emit(&record).unwrap();
        assert_eq!(sink.records.len(), 2);
        assert_eq!(sink.records[0], record);
    }

    #[test]
    fn test_json_lines_round_trip() {
        let mut sink = JsonLinesSink::new(Vec::new());
        let record = sample_record();
        sink.emit(&record).unwrap();

        let bytes = sink.into_inner();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.ends_with('\n'));

        let parsed: MeasurementRecord = serde_json::from_str(text.trim_end()).unwrap();
        assert_eq!(parsed, record);
    }
}
