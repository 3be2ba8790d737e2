use std::fmt;

/// Test-reporting collaborator.
///
/// `fail` records a defect and lets the test keep running. `fatal` ends the
/// current test; the engine stops issuing work right after calling it even
/// when an implementation chooses not to panic.
pub trait Reporter {
    fn fail(&mut self, message: &str);

    fn fatal(&mut self, message: &str);
}

/// Reporter for ordinary `#[test]` functions.
///
/// Fatals panic on the spot. Non-fatal failures are collected and raised
/// together by [`TestReporter::finish`] or when the reporter is dropped.
#[derive(Debug, Default)]
pub struct TestReporter {
    failures: Vec<String>,
    finished: bool,
}

impl TestReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    pub fn finish(mut self) {
        self.finished = true;
        self.raise_failures();
    }

    fn raise_failures(&self) {
        if !self.failures.is_empty() {
            panic!("{} failure(s):\n{}", self.failures.len(), self.failures.join("\n"));
        }
    }
}

impl Reporter for TestReporter {
    fn fail(&mut self, message: &str) {
        tracing::error!("{message}");
        self.failures.push(message.to_string());
    }

    fn fatal(&mut self, message: &str) {
        tracing::error!("{message}");
        panic!("{message}");
    }
}

impl Drop for TestReporter {
    fn drop(&mut self) {
        if !self.finished && !std::thread::panicking() {
            self.raise_failures();
        }
    }
}

/// Reporter that only collects outcomes.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecordingReporter {
    pub failures: Vec<String>,
    pub fatal: Option<String>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn passed(&self) -> bool {
        self.failures.is_empty() && self.fatal.is_none()
    }
}

impl Reporter for RecordingReporter {
    fn fail(&mut self, message: &str) {
        self.failures.push(message.to_string());
    }

    fn fatal(&mut self, message: &str) {
        if self.fatal.is_none() {
            self.fatal = Some(message.to_string());
        }
    }
}

/// Conditions that stop a test.
#[derive(Debug)]
pub enum ExpectError {
    Connect(anyhow::Error),
    TrackingTable { function: String, source: anyhow::Error },
    CreateFunction { function: String, source: anyhow::Error },
    Query(anyhow::Error),
    Scan(anyhow::Error),
    CallCount { expected: usize, actual: usize },
    MissingExpectedCall { call_index: usize },
    MissingExpectedValue { call_index: usize, argument: String },
    MissingColumn { argument: String },
    NotText { argument: String, kind: &'static str },
    KindMismatch { argument: String, expected: &'static str, actual: &'static str },
}

impl fmt::Display for ExpectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect(err) => write!(f, "pgexpect: database connection failed: {err:#}"),
            Self::TrackingTable { function, source } => write!(
                f,
                "pgexpect: error while creating the call tracking table {function}_calls: {source:#}"
            ),
            Self::CreateFunction { function, source } => write!(
                f,
                "pgexpect: error while creating the fake SQL function {function}: {source:#}"
            ),
            Self::Query(err) => write!(f, "pgexpect: error getting calls: {err:#}"),
            Self::Scan(err) => {
                write!(f, "pgexpect: problem with scanning of results to call tracking: {err:#}")
            }
            Self::CallCount { expected, actual } => {
                write!(f, "pgexpect: we expected {expected} call(s) but got {actual}")
            }
            Self::MissingExpectedCall { call_index } => {
                write!(f, "pgexpect: no expected call declared for recorded call {call_index}")
            }
            Self::MissingExpectedValue { call_index, argument } => write!(
                f,
                "pgexpect: expected call {call_index} has no value for argument {argument}"
            ),
            Self::MissingColumn { argument } => {
                write!(f, "pgexpect: recorded call has no column for argument {argument}")
            }
            Self::NotText { argument, kind } => write!(
                f,
                "pgexpect: unknown type \"{kind}\" for column {argument} to turn into a string"
            ),
            Self::KindMismatch { argument, expected, actual } => write!(
                f,
                "pgexpect: unknown type for column {argument}: expected {expected} value but the recorded value is {actual}"
            ),
        }
    }
}

impl std::error::Error for ExpectError {}

pub type Result<T> = std::result::Result<T, ExpectError>;
