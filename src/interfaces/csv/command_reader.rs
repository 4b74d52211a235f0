use crate::error::{PlaceOrderError, Result};
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    Start,
    Refresh,
    Cancel,
    Context,
    Clear,
    /// Reports a payment status on the simulated gateway.
    Gateway,
}

/// One row of a command script: `session, command, arg`.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct ScriptCommand {
    pub session: String,
    pub command: CommandKind,
    #[serde(default)]
    pub arg: Option<String>,
}

/// Reads place-order commands from a CSV source.
///
/// Whitespace is trimmed and the trailing `arg` column may be left out.
pub struct CommandReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CommandReader<R> {
    /// Creates a new `CommandReader` over any `Read` source.
    ///
    /// # Arguments
    ///
    /// * `source` - The CSV input, header row included.
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily deserializes the commands, one `Result` per row.
    pub fn commands(self) -> impl Iterator<Item = Result<ScriptCommand>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(PlaceOrderError::from))
    }
}
