use crate::ddl::install_function;
use crate::domain::{ExpectedCall, FunctionDescriptor};
use crate::fetcher::fetch_calls;
use crate::recorder::install_tracking_table;
use crate::report::{Reporter, Result};
use crate::session::Session;
use crate::validator::validate_calls;

/// Replaces `function` with a recording fake, runs `test_body`, then checks
/// that exactly one call was made and that its arguments match
/// `expected_calls`.
///
/// Outcomes are reported through `reporter` only: value mismatches as
/// failures, everything else as a fatal that ends the sequence. Database
/// objects created before a fatal are left in place.
pub fn mock_function<R, S, F>(
    function: &FunctionDescriptor,
    expected_calls: &[ExpectedCall],
    reporter: &mut R,
    session: &mut S,
    test_body: F,
) where
    R: Reporter + ?Sized,
    S: Session + ?Sized,
    F: FnOnce(&mut R, &mut S),
{
    tracing::info!(function = %function.name, "mocking function");
    let recording = match prepare_recording(function, session) {
        Ok(recording) => recording,
        Err(err) => return reporter.fatal(&err.to_string()),
    };
    if let Err(err) = install_function(session, &recording) {
        return reporter.fatal(&err.to_string());
    }

    test_body(&mut *reporter, &mut *session);

    let outcome = fetch_calls(session, &function.name, &function.args).and_then(|calls| {
        validate_calls(&calls, expected_calls, &function.args, &mut *reporter)
    });
    match outcome {
        Ok(mismatches) => {
            tracing::info!(function = %function.name, mismatches, "validated recorded calls");
        }
        Err(err) => reporter.fatal(&err.to_string()),
    }
}

/// Replaces `function` with a fake and runs `test_body`. Nothing is recorded.
pub fn stub_function<R, S, F>(
    function: &FunctionDescriptor,
    reporter: &mut R,
    session: &mut S,
    test_body: F,
) where
    R: Reporter + ?Sized,
    S: Session + ?Sized,
    F: FnOnce(&mut S),
{
    tracing::info!(function = %function.name, "stubbing function");
    if let Err(err) = install_function(session, function) {
        return reporter.fatal(&err.to_string());
    }

    test_body(session);
}

/// The recording INSERT goes in front of the caller's body so a call is
/// stored before any of the fake's own logic, including a raised error.
fn prepare_recording<S>(
    function: &FunctionDescriptor,
    session: &mut S,
) -> Result<FunctionDescriptor>
where
    S: Session + ?Sized,
{
    let insert = install_tracking_table(session, &function.name, &function.args)?;
    Ok(function.with_body_prefix(&insert))
}
