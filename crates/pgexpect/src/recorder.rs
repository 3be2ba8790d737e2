use crate::ddl::{create_tracking_table_sql, record_call_sql};
use crate::domain::Argument;
use crate::report::{ExpectError, Result};
use crate::session::Session;

/// Recreates `<function_name>_calls` and returns the INSERT that records one
/// call. Dropping first keeps rows from earlier runs out of the table.
pub fn install_tracking_table<S>(
    session: &mut S,
    function_name: &str,
    args: &[Argument],
) -> Result<String>
where
    S: Session + ?Sized,
{
    let sql = create_tracking_table_sql(function_name, args);
    tracing::debug!(function = function_name, %sql, "creating call tracking table");
    session.run_sql(&sql).map_err(|source| ExpectError::TrackingTable {
        function: function_name.to_string(),
        source,
    })?;

    Ok(record_call_sql(function_name, args))
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::*;
    use crate::domain::RecordedCall;

    #[derive(Default)]
    struct ScriptedSession {
        executed: Vec<String>,
        fail: bool,
    }

    impl Session for ScriptedSession {
        fn run_sql(&mut self, sql: &str) -> anyhow::Result<()> {
            self.executed.push(sql.to_string());
            if self.fail { Err(anyhow!("permission denied for schema public")) } else { Ok(()) }
        }

        fn fetch_calls(&mut self, _sql: &str, _args: &[Argument]) -> Result<Vec<RecordedCall>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn returns_insert_after_creating_table() {
        let mut session = ScriptedSession::default();
        let args = vec![Argument::new("uid", "bigint")];

        let insert = install_tracking_table(&mut session, "add_user", &args)
            .expect("tracking table should be created");

        assert_eq!(insert, "INSERT INTO add_user_calls (uid) VALUES(uid);");
        assert_eq!(session.executed.len(), 1);
        assert!(session.executed[0].contains("CREATE TABLE add_user_calls (uid bigint);"));
    }

    #[test]
    fn creation_failure_names_the_table() {
        let mut session = ScriptedSession { fail: true, ..Default::default() };

        let err = install_tracking_table(&mut session, "add_user", &[])
            .expect_err("creation should fail");

        assert!(matches!(err, ExpectError::TrackingTable { .. }));
        assert!(err.to_string().contains("add_user_calls"));
        assert!(err.to_string().contains("permission denied"));
    }
}
