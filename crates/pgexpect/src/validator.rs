use crate::domain::{ActualValue, Argument, ExpectedCall, ExpectedValue, RecordedCall};
use crate::report::{ExpectError, Reporter, Result};

/// Compares recorded calls with the expected ones, argument by argument.
///
/// Each mismatch goes to `reporter.fail` and validation carries on. Anything
/// that leaves no comparison rule to apply is returned as an error and ends
/// validation. Returns the number of mismatches reported.
pub fn validate_calls<R>(
    calls: &[RecordedCall],
    expected_calls: &[ExpectedCall],
    args: &[Argument],
    reporter: &mut R,
) -> Result<usize>
where
    R: Reporter + ?Sized,
{
    let mut mismatches = 0;
    for (call_index, call) in calls.iter().enumerate() {
        let expected_call = expected_calls
            .get(call_index)
            .ok_or(ExpectError::MissingExpectedCall { call_index })?;

        for (arg_index, arg) in args.iter().enumerate() {
            let expected = expected_call.values.get(arg_index).ok_or_else(|| {
                ExpectError::MissingExpectedValue { call_index, argument: arg.name.clone() }
            })?;
            let actual = call
                .get(&arg.name)
                .ok_or_else(|| ExpectError::MissingColumn { argument: arg.name.clone() })?;

            if let Some(message) = compare(&arg.name, expected, actual)? {
                reporter.fail(&message);
                mismatches += 1;
            }
        }
    }

    Ok(mismatches)
}

fn compare(
    argument: &str,
    expected: &ExpectedValue,
    actual: &ActualValue,
) -> Result<Option<String>> {
    let matches = match (expected, actual) {
        (ExpectedValue::Timestamp(want), ActualValue::Timestamp(got)) => want == got,
        (ExpectedValue::Bool(want), ActualValue::Bool(got)) => want == got,
        (ExpectedValue::Text(want), _) => {
            let got = text_of(argument, actual)?;
            if *want != got {
                return Ok(Some(mismatch_message(argument, expected, &got)));
            }
            true
        }
        (ExpectedValue::Uint64(want), ActualValue::Int64(got)) => *want == *got as u64,
        (ExpectedValue::Uint64(want), ActualValue::Int32(got)) => *want == i64::from(*got) as u64,
        (ExpectedValue::Int64(want), ActualValue::Int64(got)) => want == got,
        (ExpectedValue::Int64(want), ActualValue::Int32(got)) => *want == i64::from(*got),
        (ExpectedValue::Int32(want), ActualValue::Int32(got)) => want == got,
        (ExpectedValue::Int(want), ActualValue::Int64(got)) => *want == *got as isize,
        (ExpectedValue::Int(want), ActualValue::Int32(got)) => *want == i64::from(*got) as isize,
        (ExpectedValue::Bytes(want), ActualValue::Bytes(got)) => want == got,
        _ => {
            return Err(ExpectError::KindMismatch {
                argument: argument.to_string(),
                expected: expected_kind(expected),
                actual: actual.kind(),
            });
        }
    };

    Ok((!matches).then(|| mismatch_message(argument, expected, actual)))
}

/// Columns without a binary decoder (enums, composites, uuid and the like)
/// arrive as the bytes of their text form, so bytes are accepted wherever
/// text is expected.
fn text_of(argument: &str, actual: &ActualValue) -> Result<String> {
    match actual {
        ActualValue::Text(value) => Ok(value.clone()),
        ActualValue::Bytes(value) => Ok(String::from_utf8_lossy(value).into_owned()),
        other => Err(ExpectError::NotText { argument: argument.to_string(), kind: other.kind() }),
    }
}

fn expected_kind(expected: &ExpectedValue) -> &'static str {
    match expected {
        ExpectedValue::Timestamp(_) => "timestamp",
        ExpectedValue::Bool(_) => "boolean",
        ExpectedValue::Text(_) => "text",
        ExpectedValue::Uint64(_) => "uint64",
        ExpectedValue::Int64(_) => "int64",
        ExpectedValue::Int32(_) => "int32",
        ExpectedValue::Int(_) => "int",
        ExpectedValue::Bytes(_) => "bytes",
    }
}

fn mismatch_message(
    argument: &str,
    expected: &ExpectedValue,
    got: &dyn std::fmt::Display,
) -> String {
    format!("pgexpect: wrong value for {argument}. Expected {expected} but got {got}")
}
