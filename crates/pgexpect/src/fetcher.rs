use crate::ddl::select_calls_sql;
use crate::domain::{Argument, RecordedCall};
use crate::report::{ExpectError, Result};
use crate::session::Session;

/// Only single-call assertions are supported.
pub const EXPECTED_CALL_COUNT: usize = 1;

pub fn fetch_calls<S>(
    session: &mut S,
    function_name: &str,
    args: &[Argument],
) -> Result<Vec<RecordedCall>>
where
    S: Session + ?Sized,
{
    let sql = select_calls_sql(function_name);
    tracing::debug!(function = function_name, %sql, "fetching recorded calls");
    let calls = session.fetch_calls(&sql, args)?;

    if calls.len() != EXPECTED_CALL_COUNT {
        return Err(ExpectError::CallCount { expected: EXPECTED_CALL_COUNT, actual: calls.len() });
    }

    Ok(calls)
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::*;
    use crate::domain::ActualValue;

    struct CannedSession {
        rows: Option<Vec<RecordedCall>>,
        queries: Vec<String>,
    }

    impl Session for CannedSession {
        fn run_sql(&mut self, _sql: &str) -> anyhow::Result<()> {
            Ok(())
        }

        fn fetch_calls(&mut self, sql: &str, _args: &[Argument]) -> Result<Vec<RecordedCall>> {
            self.queries.push(sql.to_string());
            self.rows.take().ok_or_else(|| ExpectError::Query(anyhow!("relation does not exist")))
        }
    }

    fn row(uid: i64) -> RecordedCall {
        RecordedCall::new().with("uid", ActualValue::Int64(uid))
    }

    #[test]
    fn single_recorded_call_is_returned() {
        let mut session = CannedSession { rows: Some(vec![row(42)]), queries: Vec::new() };

        let calls = fetch_calls(&mut session, "add_user", &[]).expect("one call recorded");

        assert_eq!(calls, vec![row(42)]);
        assert_eq!(session.queries, vec!["SELECT * FROM add_user_calls".to_string()]);
    }

    #[test]
    fn zero_calls_is_a_count_mismatch() {
        let mut session = CannedSession { rows: Some(Vec::new()), queries: Vec::new() };

        let err = fetch_calls(&mut session, "add_user", &[]).expect_err("zero calls");
        assert!(matches!(err, ExpectError::CallCount { expected: 1, actual: 0 }));
    }

    #[test]
    fn two_calls_is_a_count_mismatch() {
        let mut session = CannedSession { rows: Some(vec![row(1), row(2)]), queries: Vec::new() };

        let err = fetch_calls(&mut session, "add_user", &[]).expect_err("two calls");
        assert!(matches!(err, ExpectError::CallCount { expected: 1, actual: 2 }));
    }

    #[test]
    fn query_errors_are_passed_through() {
        let mut session = CannedSession { rows: None, queries: Vec::new() };

        let err = fetch_calls(&mut session, "add_user", &[]).expect_err("query fails");
        assert!(matches!(err, ExpectError::Query(_)));
    }
}
