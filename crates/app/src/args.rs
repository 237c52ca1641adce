use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use exam_core::model::ExamId;

#[derive(Debug, PartialEq, Eq)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    MissingExamFile,
    UnknownArg(String),
    InvalidExamId { raw: String },
    InvalidTickMs { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingExamFile => {
                write!(f, "an exam file is required (--exam or EXAM_FILE)")
            }
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidExamId { raw } => write!(f, "invalid exam id: {raw}"),
            ArgsError::InvalidTickMs { raw } => {
                write!(f, "invalid tick interval (positive milliseconds): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  exam --exam <file.json> [--exam-id <id>] [--tick-ms <ms>] [--out <file.jsonl>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --exam-id 1");
    eprintln!("  --tick-ms 1000");
    eprintln!("  --out     (submissions kept in memory)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  EXAM_FILE, EXAM_ID, EXAM_TICK_MS, EXAM_OUT, EXAM_LOG (tracing filter, default warn)");
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub exam_file: PathBuf,
    pub exam_id: ExamId,
    pub tick: Duration,
    pub out: Option<PathBuf>,
}

fn parse_exam_id(raw: String) -> Result<ExamId, ArgsError> {
    raw.parse().map_err(|_| ArgsError::InvalidExamId { raw })
}

fn parse_tick(raw: String) -> Result<Duration, ArgsError> {
    match raw.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
        _ => Err(ArgsError::InvalidTickMs { raw }),
    }
}

impl Args {
    /// Parse flags, falling back to `env` for anything not given.
    ///
    /// Returns `Ok(None)` when help was requested.
    ///
    /// # Errors
    ///
    /// Returns `ArgsError` for unknown flags, missing values or values that
    /// do not parse.
    pub fn parse(
        args: &mut impl Iterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Option<Self>, ArgsError> {
        let mut exam_file = env("EXAM_FILE").map(PathBuf::from);
        let mut exam_id = env("EXAM_ID")
            .map(parse_exam_id)
            .transpose()?
            .unwrap_or_else(|| ExamId::new(1));
        let mut tick = env("EXAM_TICK_MS")
            .map(parse_tick)
            .transpose()?
            .unwrap_or(Duration::from_secs(1));
        let mut out = env("EXAM_OUT").map(PathBuf::from);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--exam" => exam_file = Some(PathBuf::from(require_value(args, "--exam")?)),
                "--exam-id" => exam_id = parse_exam_id(require_value(args, "--exam-id")?)?,
                "--tick-ms" => tick = parse_tick(require_value(args, "--tick-ms")?)?,
                "--out" => out = Some(PathBuf::from(require_value(args, "--out")?)),
                "--help" | "-h" => return Ok(None),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let exam_file = exam_file.ok_or(ArgsError::MissingExamFile)?;
        Ok(Some(Self {
            exam_file,
            exam_id,
            tick,
            out,
        }))
    }
}
