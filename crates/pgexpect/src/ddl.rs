use common::sql::{join_list, name_type_pair, quote_literal};

use crate::domain::{Argument, FunctionDescriptor};
use crate::report::{ExpectError, Result};
use crate::session::Session;

pub const RAISED_ERROR_MESSAGE: &str = "error from pgexpect";

pub fn tracking_table_name(function_name: &str) -> String {
    format!("{function_name}_calls")
}

fn typed_list(args: &[Argument]) -> String {
    join_list(args.iter().map(|arg| name_type_pair(&arg.name, &arg.sql_type)))
}

pub fn create_tracking_table_sql(function_name: &str, args: &[Argument]) -> String {
    let table = tracking_table_name(function_name);
    format!(
        "
        DROP TABLE IF EXISTS {table};
        CREATE TABLE {table} ({});
        ",
        typed_list(args)
    )
}

/// The INSERT placed at the top of the fake body. Argument names double as
/// values: inside the function they resolve to its own parameters.
pub fn record_call_sql(function_name: &str, args: &[Argument]) -> String {
    let table = tracking_table_name(function_name);
    if args.is_empty() {
        return format!("INSERT INTO {table} DEFAULT VALUES;");
    }

    let names = join_list(args.iter().map(|arg| arg.name.as_str()));
    format!("INSERT INTO {table} ({names}) VALUES({names});")
}

pub fn raise_error_sql(error_code: &str) -> String {
    format!(
        "RAISE {} USING ERRCODE = {};",
        quote_literal(RAISED_ERROR_MESSAGE),
        quote_literal(error_code)
    )
}

pub fn create_function_sql(function: &FunctionDescriptor) -> String {
    let mut body = function.body.clone();
    if let Some(code) = function.raise_error_code.as_deref().filter(|code| !code.is_empty()) {
        body.push_str(&raise_error_sql(code));
    }

    format!(
        "
        CREATE OR REPLACE FUNCTION {}({}) RETURNS {}
            AS $$
            BEGIN
                {}
            END
        $$ LANGUAGE plpgsql;
        ",
        function.name,
        typed_list(&function.args),
        function.return_type,
        body
    )
}

pub fn select_calls_sql(function_name: &str) -> String {
    format!("SELECT * FROM {}", tracking_table_name(function_name))
}

pub fn install_function<S>(session: &mut S, function: &FunctionDescriptor) -> Result<()>
where
    S: Session + ?Sized,
{
    let sql = create_function_sql(function);
    tracing::debug!(function = %function.name, %sql, "installing fake function");
    session
        .run_sql(&sql)
        .map_err(|source| ExpectError::CreateFunction { function: function.name.clone(), source })
}
