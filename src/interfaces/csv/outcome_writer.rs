use crate::error::Result;
use serde::Serialize;
use std::io::Write;

/// One output row per executed command.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct OutcomeRecord {
    pub session: String,
    pub command: String,
    pub uuid: String,
    pub state: String,
    pub failed_reason: String,
    pub error: String,
}

/// Writes command outcomes as CSV.
pub struct OutcomeWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> OutcomeWriter<W> {
    /// Creates a new `OutcomeWriter`; the header is written with the first record.
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    /// Serializes one outcome row.
    pub fn write_outcome(&mut self, record: &OutcomeRecord) -> Result<()> {
        self.writer.serialize(record)?;
        Ok(())
    }

    /// Flushes buffered rows to the underlying writer.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_header_and_rows() {
        let mut buffer = Vec::new();
        {
            let mut writer = OutcomeWriter::new(&mut buffer);
            writer
                .write_outcome(&OutcomeRecord {
                    session: "s1".to_string(),
                    command: "start".to_string(),
                    uuid: "abc".to_string(),
                    state: "AwaitPaymentConfirmation".to_string(),
                    ..Default::default()
                })
                .unwrap();
            writer.flush().unwrap();
        }

        let output = String::from_utf8(buffer).unwrap();
        assert_eq!(
            output,
            "session,command,uuid,state,failed_reason,error\ns1,start,abc,AwaitPaymentConfirmation,,\n"
        );
    }
}
