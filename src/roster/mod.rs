use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("could not open roster: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed roster: {0}")]
    Csv(#[from] csv::Error),
    #[error("roster has no {0:?} column")]
    MissingColumn(&'static str),
}

const REQUIRED_COLUMNS: [&str; 2] = ["Name", "Drive_Link"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Drive_Link")]
    pub drive_link: String,
}

/// Participants in file order. Names are expected to be unique; when they are
/// not, the first row wins.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    entries: Vec<RosterEntry>,
}

impl Roster {
    pub fn new(entries: Vec<RosterEntry>) -> Self {
        Self { entries }
    }

    /// Load the roster CSV. A missing or malformed file yields an empty roster,
    /// which the portal reports as "no data".
    pub fn load(path: &Path) -> Self {
        match std::fs::File::open(path)
            .map_err(RosterError::from)
            .and_then(Self::from_reader)
        {
            Ok(roster) => {
                info!("Loaded {} roster entries from {}", roster.len(), path.display());
                roster
            }
            Err(e) => {
                warn!("Roster {} unavailable: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse roster rows. Rows that cannot be read (short, ragged, bad
    /// encoding) are logged and skipped; the rest are kept.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, RosterError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        if let Some(missing) = REQUIRED_COLUMNS
            .iter()
            .find(|col| !headers.iter().any(|h| h == **col))
        {
            return Err(RosterError::MissingColumn(*missing));
        }

        let mut entries = Vec::new();
        for record in rdr.deserialize::<RosterEntry>() {
            match record {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    let line = e.position().map(|p| p.line()).unwrap_or_default();
                    warn!("Skipping roster line {}: {}", line, e);
                }
            }
        }
        Ok(Self { entries })
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn lookup(&self, name: &str) -> Option<&RosterEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
