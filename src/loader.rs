//! Loads process definitions from the plain-text process file format:
//! `PID ARRIVAL BURSTS PRIORITY PAGE_COUNT`, one process per line.
//!
//! Per-line shape errors are skipped and logged; a numeric parse failure on
//! an otherwise well-shaped line aborts the whole load, per the error
//! handling design.

use std::path::Path;
use tracing::warn;

use crate::error::LoadError;
use crate::process::{Burst, Process};

/// Parses the process-definition file at `path` into a vector of
/// processes. This is the sole place `Process` values are constructed from
/// untrusted text.
pub fn load_process_file(path: &Path) -> Result<Vec<Process>, LoadError> {
    let contents = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let mut processes = Vec::new();
    for (idx, raw_line) in contents.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 5 {
            warn!(line = line_no, text = line, "skipping malformed line");
            continue;
        }

        match parse_line(&fields, line_no) {
            Ok(process) => processes.push(process),
            Err(LoadError::EmptyBurstList { line }) => {
                warn!(line, "skipping line with empty burst list");
            }
            Err(other) => return Err(other),
        }
    }

    if processes.is_empty() {
        return Err(LoadError::Empty {
            path: path.display().to_string(),
        });
    }

    Ok(processes)
}

fn parse_line(fields: &[&str], line_no: usize) -> Result<Process, LoadError> {
    let pid = fields[0].to_string();

    let arrival_time: u64 = fields[1]
        .parse()
        .map_err(|_| LoadError::NumericField {
            line: line_no,
            reason: format!("arrival time '{}' is not a non-negative integer", fields[1]),
        })?;

    let bursts = parse_bursts(fields[2], line_no)?;
    if bursts.is_empty() {
        return Err(LoadError::EmptyBurstList { line: line_no });
    }

    let priority: i64 = fields[3]
        .parse()
        .map_err(|_| LoadError::NumericField {
            line: line_no,
            reason: format!("priority '{}' is not an integer", fields[3]),
        })?;

    let page_count: usize = fields[4]
        .parse()
        .map_err(|_| LoadError::NumericField {
            line: line_no,
            reason: format!("page count '{}' is not a non-negative integer", fields[4]),
        })?;

    Ok(Process::new(pid, arrival_time, bursts, priority, page_count))
}

fn parse_bursts(field: &str, line_no: usize) -> Result<Vec<Burst>, LoadError> {
    field
        .split(',')
        .map(str::trim)
        .filter(|tok| !tok.is_empty())
        .map(|tok| parse_burst_token(tok, line_no))
        .collect()
}

fn parse_burst_token(tok: &str, line_no: usize) -> Result<Burst, LoadError> {
    let (kind, rest) = tok.split_once('(').ok_or_else(|| LoadError::NumericField {
        line: line_no,
        reason: format!("burst token '{}' is not of the form KIND(n)", tok),
    })?;
    let rest = rest.strip_suffix(')').ok_or_else(|| LoadError::NumericField {
        line: line_no,
        reason: format!("burst token '{}' is missing a closing parenthesis", tok),
    })?;
    let duration: u64 = rest.parse().map_err(|_| LoadError::NumericField {
        line: line_no,
        reason: format!("burst duration '{}' is not a positive integer", rest),
    })?;
    if duration == 0 {
        return Err(LoadError::NumericField {
            line: line_no,
            reason: "burst duration must be >= 1".to_string(),
        });
    }

    match kind.to_ascii_uppercase().as_str() {
        "CPU" => Ok(Burst::Cpu(duration)),
        "IO" | "E/S" => Ok(Burst::Io(duration)),
        other => Err(LoadError::NumericField {
            line: line_no,
            reason: format!("unknown burst kind '{}'", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tmp(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "{}", contents).unwrap();
        f
    }

    #[test]
    fn loads_well_shaped_processes() {
        let f = write_tmp("P1 0 CPU(3) 1 2\nP2 1 CPU(1),IO(2),CPU(1) 2 0\n");
        let procs = load_process_file(f.path()).unwrap();
        assert_eq!(procs.len(), 2);
        assert_eq!(procs[0].pid, "P1");
        assert_eq!(procs[1].bursts.len(), 3);
    }

    #[test]
    fn skips_malformed_lines_and_comments() {
        let f = write_tmp("# comment\ngarbage line\nP1 0 CPU(1) 1 0\n");
        let procs = load_process_file(f.path()).unwrap();
        assert_eq!(procs.len(), 1);
    }

    #[test]
    fn numeric_parse_failure_aborts_load() {
        let f = write_tmp("P1 zero CPU(1) 1 0\n");
        let err = load_process_file(f.path()).unwrap_err();
        assert!(matches!(err, LoadError::NumericField { .. }));
    }

    #[test]
    fn empty_file_is_an_error() {
        let f = write_tmp("# only a comment\n");
        let err = load_process_file(f.path()).unwrap_err();
        assert!(matches!(err, LoadError::Empty { .. }));
    }

    #[test]
    fn accepts_es_as_io_alias() {
        let f = write_tmp("P1 0 CPU(1),E/S(2) 1 0\n");
        let procs = load_process_file(f.path()).unwrap();
        assert_eq!(procs[0].bursts[1], Burst::Io(2));
    }
}
