#![forbid(unsafe_code)]

//! Replace Postgres functions with fakes in tests, record the calls they
//! receive, and compare the recorded arguments with expected values.

pub mod api;
pub mod config;
pub mod ddl;
pub mod domain;
pub mod fetcher;
pub mod observability;
pub mod recorder;
pub mod report;
pub mod session;
pub mod validator;

pub use api::{mock_function, stub_function};
pub use config::Settings;
pub use domain::{
    ActualValue, Argument, ExpectedCall, ExpectedValue, FunctionDescriptor, RecordedCall,
};
pub use observability::init_test_logging;
pub use report::{ExpectError, RecordingReporter, Reporter, TestReporter};
pub use session::Session;
