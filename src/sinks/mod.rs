use anyhow::Result;

pub mod jsonl;

pub use self::jsonl::JsonlSink;

pub trait DataSink: Send {
    fn add_record(&mut self, line: &str) -> Result<()>;
    fn finish(&mut self) -> Result<()>;
}

/// Collects records in memory.
#[cfg(test)]
#[derive(Default)]
pub struct MemorySink {
    pub records: Vec<String>,
}

#[cfg(test)]
impl DataSink for MemorySink {
    fn add_record(&mut self, line: &str) -> Result<()> {
        self.records.push(line.to_string());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}
