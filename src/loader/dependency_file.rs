use std::collections::BTreeSet;
use std::fs;
use std::str::FromStr;

use crate::domain::scenario::composition::check_declaration;
use crate::error::{Error, Result};

/// Fields shared by every traffic line:
/// `id kind source destination duration wait_launched wait_finished delay source_ip destination_ip`.
const COMMON_FIELDS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrafficKind {
    Voip,
    WebBrowsing,
    Dash,
    DataTransfer,
}

impl TrafficKind {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "voip" => Some(TrafficKind::Voip),
            "web" | "web_browsing" => Some(TrafficKind::WebBrowsing),
            "dash" => Some(TrafficKind::Dash),
            "iperf3" | "data_transfer" => Some(TrafficKind::DataTransfer),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrafficKind::Voip => "voip",
            TrafficKind::WebBrowsing => "web_browsing",
            TrafficKind::Dash => "dash",
            TrafficKind::DataTransfer => "data_transfer",
        }
    }

    /// Number of whitespace separated fields of a line of this kind.
    pub fn field_count(&self) -> usize {
        COMMON_FIELDS
            + match self {
                TrafficKind::Voip => 2,
                TrafficKind::WebBrowsing => 2,
                TrafficKind::Dash => 2,
                TrafficKind::DataTransfer => 4,
            }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrafficParameters {
    Voip { port: u16, codec: String },
    WebBrowsing { nb_runs: u32, nb_parallel_runs: u32 },
    Dash { protocol: String, tornado_port: u16 },
    DataTransfer { port: u16, size: String, tos: u32, mtu: u32 },
}

/// One accepted line of a traffic dependency file.
#[derive(Debug, Clone, PartialEq)]
pub struct TrafficRecord {
    pub id: u32,
    pub source: String,
    pub destination: String,
    /// Seconds.
    pub duration: u64,
    pub wait_launched: Vec<u32>,
    pub wait_finished: Vec<u32>,
    /// Seconds.
    pub delay: u64,
    pub source_ip: String,
    pub destination_ip: String,
    pub parameters: TrafficParameters,
}

impl TrafficRecord {
    pub fn kind(&self) -> TrafficKind {
        match self.parameters {
            TrafficParameters::Voip { .. } => TrafficKind::Voip,
            TrafficParameters::WebBrowsing { .. } => TrafficKind::WebBrowsing,
            TrafficParameters::Dash { .. } => TrafficKind::Dash,
            TrafficParameters::DataTransfer { .. } => TrafficKind::DataTransfer,
        }
    }

    pub fn has_dependencies(&self) -> bool {
        !self.wait_launched.is_empty() || !self.wait_finished.is_empty()
    }
}

#[derive(Debug)]
pub struct RejectedRecord {
    pub line: usize,
    pub content: String,
    pub error: Error,
}

/// Outcome of a best-effort parse: what was kept and why the rest was not.
#[derive(Debug, Default)]
pub struct DependencyFile {
    pub records: Vec<TrafficRecord>,
    pub rejected: Vec<RejectedRecord>,
}

pub fn parse_dependency_file(file_path: &str) -> Result<DependencyFile> {
    let content = fs::read_to_string(file_path)?;
    log::info!("Loading traffic dependency file '{}'.", file_path);
    Ok(parse_dependency_str(&content))
}

/// Parses a dependency file line by line.
///
/// Lines are checked in file order and a line may only depend on lines kept
/// before it. Broken lines are logged and skipped; they never abort the parse.
pub fn parse_dependency_str(content: &str) -> DependencyFile {
    let mut parsed = DependencyFile::default();
    let mut accepted: BTreeSet<u32> = BTreeSet::new();

    for (index, raw) in content.lines().enumerate() {
        let line = index + 1;
        let text = raw.split('#').next().unwrap_or_default().trim();
        if text.is_empty() {
            continue;
        }

        let checked = parse_record(line, text).and_then(|record| {
            check_declaration(&|id| accepted.contains(&id), record.id, &record.wait_launched, &record.wait_finished)?;
            Ok(record)
        });

        match checked {
            Ok(record) => {
                accepted.insert(record.id);
                parsed.records.push(record);
            }
            Err(error) => {
                log::warn!("Ignoring line {} \"{}\": {}", line, text, error);
                parsed.rejected.push(RejectedRecord { line, content: text.to_string(), error });
            }
        }
    }

    log::info!("Dependency file parsed: {} traffics kept, {} lines ignored.", parsed.records.len(), parsed.rejected.len());
    parsed
}

fn parse_record(line: usize, text: &str) -> Result<TrafficRecord> {
    let fields: Vec<&str> = text.split_whitespace().collect();
    if fields.len() < 2 {
        return Err(malformed(line, "a traffic needs at least an id and a kind".to_string()));
    }

    let kind = TrafficKind::parse(fields[1]).ok_or_else(|| malformed(line, format!("unknown traffic kind '{}'", fields[1])))?;
    if fields.len() != kind.field_count() {
        return Err(malformed(line, format!("{} elements needed for {} traffic, got {}", kind.field_count(), kind.as_str(), fields.len())));
    }

    let extra = &fields[COMMON_FIELDS..];
    let parameters = match kind {
        TrafficKind::Voip => TrafficParameters::Voip { port: number(line, "port", extra[0])?, codec: extra[1].to_string() },
        TrafficKind::WebBrowsing => {
            TrafficParameters::WebBrowsing { nb_runs: number(line, "nb_runs", extra[0])?, nb_parallel_runs: number(line, "nb_parallel_runs", extra[1])? }
        }
        TrafficKind::Dash => TrafficParameters::Dash { protocol: extra[0].to_string(), tornado_port: number(line, "tornado_port", extra[1])? },
        TrafficKind::DataTransfer => TrafficParameters::DataTransfer {
            port: number(line, "port", extra[0])?,
            size: extra[1].to_string(),
            tos: number(line, "tos", extra[2])?,
            mtu: number(line, "mtu", extra[3])?,
        },
    };

    Ok(TrafficRecord {
        id: number(line, "id", fields[0])?,
        source: fields[2].to_string(),
        destination: fields[3].to_string(),
        duration: number(line, "duration", fields[4])?,
        wait_launched: waited_ids(line, fields[5])?,
        wait_finished: waited_ids(line, fields[6])?,
        delay: number(line, "delay", fields[7])?,
        source_ip: fields[8].to_string(),
        destination_ip: fields[9].to_string(),
        parameters,
    })
}

fn number<T: FromStr>(line: usize, field: &str, text: &str) -> Result<T> {
    text.parse::<T>().map_err(|_| malformed(line, format!("cannot parse {} '{}'", field, text)))
}

/// `None` or `-`-joined ids.
fn waited_ids(line: usize, text: &str) -> Result<Vec<u32>> {
    if text == "None" {
        return Ok(Vec::new());
    }
    text.split('-').map(|id| number(line, "waited id", id)).collect()
}

fn malformed(line: usize, reason: String) -> Error {
    Error::MalformedRecord { line, reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waited_ids() {
        assert_eq!(waited_ids(1, "None").unwrap(), Vec::<u32>::new());
        assert_eq!(waited_ids(1, "1-3-4").unwrap(), vec![1, 3, 4]);
        assert!(matches!(waited_ids(7, "1-x"), Err(Error::MalformedRecord { line: 7, .. })));
    }

    #[test]
    fn test_field_counts() {
        assert_eq!(TrafficKind::Voip.field_count(), 12);
        assert_eq!(TrafficKind::DataTransfer.field_count(), 14);
        assert_eq!(TrafficKind::parse("iperf3"), Some(TrafficKind::DataTransfer));
        assert_eq!(TrafficKind::parse("ftp"), None);
    }

    #[test]
    fn test_inline_comment_is_stripped() {
        let parsed = parse_dependency_str("1 voip client server 30 None None 0 10.0.0.1 10.0.0.2 8010 G.711.1 # first call\n");
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].parameters, TrafficParameters::Voip { port: 8010, codec: "G.711.1".to_string() });
    }
}
