use anyhow::Context;
use chrono::{DateTime, NaiveDateTime, Utc};
use postgres::types::Type;
use postgres::row::SimpleQueryRow;
use postgres::{Client, Row, SimpleQueryMessage, Transaction};

use crate::domain::{ActualValue, Argument, RecordedCall};
use crate::report::{ExpectError, Result};

/// The database connection the engine borrows from the test.
pub trait Session {
    fn run_sql(&mut self, sql: &str) -> anyhow::Result<()>;

    /// Runs `sql` and decodes every row into a [`RecordedCall`] holding one
    /// column per entry in `args`.
    fn fetch_calls(&mut self, sql: &str, args: &[Argument]) -> Result<Vec<RecordedCall>>;
}

impl Session for Client {
    fn run_sql(&mut self, sql: &str) -> anyhow::Result<()> {
        self.batch_execute(sql)?;
        Ok(())
    }

    fn fetch_calls(&mut self, sql: &str, args: &[Argument]) -> Result<Vec<RecordedCall>> {
        let rows = self.query(sql, &[]).map_err(|err| ExpectError::Query(err.into()))?;
        let text_rows = if needs_text_form(&rows) {
            text_rows(self.simple_query(sql).map_err(|err| ExpectError::Query(err.into()))?)
        } else {
            Vec::new()
        };
        decode_rows(&rows, &text_rows, args)
    }
}

impl Session for Transaction<'_> {
    fn run_sql(&mut self, sql: &str) -> anyhow::Result<()> {
        self.batch_execute(sql)?;
        Ok(())
    }

    fn fetch_calls(&mut self, sql: &str, args: &[Argument]) -> Result<Vec<RecordedCall>> {
        let rows = self.query(sql, &[]).map_err(|err| ExpectError::Query(err.into()))?;
        let text_rows = if needs_text_form(&rows) {
            text_rows(self.simple_query(sql).map_err(|err| ExpectError::Query(err.into()))?)
        } else {
            Vec::new()
        };
        decode_rows(&rows, &text_rows, args)
    }
}

/// Types decoded from the binary result format. Everything else (enums,
/// composites, domains, uuid, numeric, json) is read in text form, the way
/// Postgres renders it for `::text`.
pub(crate) fn has_binary_decoder(ty: &Type) -> bool {
    [
        Type::BOOL,
        Type::INT8,
        Type::INT4,
        Type::INT2,
        Type::TEXT,
        Type::VARCHAR,
        Type::BPCHAR,
        Type::NAME,
        Type::BYTEA,
        Type::TIMESTAMPTZ,
        Type::TIMESTAMP,
    ]
    .contains(ty)
}

fn needs_text_form(rows: &[Row]) -> bool {
    rows.first()
        .is_some_and(|row| row.columns().iter().any(|column| !has_binary_decoder(column.type_())))
}

fn text_rows(messages: Vec<SimpleQueryMessage>) -> Vec<SimpleQueryRow> {
    messages
        .into_iter()
        .filter_map(|message| match message {
            SimpleQueryMessage::Row(row) => Some(row),
            _ => None,
        })
        .collect()
}

fn decode_rows(
    rows: &[Row],
    text_rows: &[SimpleQueryRow],
    args: &[Argument],
) -> Result<Vec<RecordedCall>> {
    rows.iter()
        .enumerate()
        .map(|(row_idx, row)| decode_row(row, text_rows.get(row_idx), args))
        .collect()
}

fn decode_row(
    row: &Row,
    text_row: Option<&SimpleQueryRow>,
    args: &[Argument],
) -> Result<RecordedCall> {
    let mut call = RecordedCall::new();
    for arg in args {
        let Some(idx) =
            row.columns().iter().position(|column| column.name().eq_ignore_ascii_case(&arg.name))
        else {
            continue;
        };
        let value = decode_column(row, text_row, idx).map_err(ExpectError::Scan)?;
        call.push(row.columns()[idx].name(), value);
    }
    Ok(call)
}

fn decode_column(
    row: &Row,
    text_row: Option<&SimpleQueryRow>,
    idx: usize,
) -> anyhow::Result<ActualValue> {
    let ty = row.columns()[idx].type_();
    let value = if *ty == Type::BOOL {
        row.try_get::<_, Option<bool>>(idx)?.map(ActualValue::Bool)
    } else if *ty == Type::INT8 {
        row.try_get::<_, Option<i64>>(idx)?.map(ActualValue::Int64)
    } else if *ty == Type::INT4 {
        row.try_get::<_, Option<i32>>(idx)?.map(ActualValue::Int32)
    } else if *ty == Type::INT2 {
        row.try_get::<_, Option<i16>>(idx)?.map(|value| ActualValue::Int32(i32::from(value)))
    } else if [Type::TEXT, Type::VARCHAR, Type::BPCHAR, Type::NAME].contains(ty) {
        row.try_get::<_, Option<String>>(idx)?.map(ActualValue::Text)
    } else if *ty == Type::BYTEA {
        row.try_get::<_, Option<Vec<u8>>>(idx)?.map(ActualValue::Bytes)
    } else if *ty == Type::TIMESTAMPTZ {
        row.try_get::<_, Option<DateTime<Utc>>>(idx)?.map(ActualValue::Timestamp)
    } else if *ty == Type::TIMESTAMP {
        row.try_get::<_, Option<NaiveDateTime>>(idx)?
            .map(|value| ActualValue::Timestamp(value.and_utc()))
    } else {
        let text_row = text_row.with_context(|| {
            format!("no text form fetched for column `{}`", row.columns()[idx].name())
        })?;
        text_row.try_get(idx)?.map(|text| ActualValue::Bytes(text.as_bytes().to_vec()))
    };

    Ok(value.unwrap_or(ActualValue::Null))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_scalars_use_binary_decoding() {
        for ty in [Type::BOOL, Type::INT2, Type::INT4, Type::INT8, Type::TEXT, Type::BYTEA] {
            assert!(has_binary_decoder(&ty), "{ty} should decode from binary");
        }
        assert!(has_binary_decoder(&Type::TIMESTAMP));
        assert!(has_binary_decoder(&Type::TIMESTAMPTZ));
    }

    #[test]
    fn other_types_are_read_as_text() {
        for ty in [Type::UUID, Type::NUMERIC, Type::JSONB, Type::FLOAT8, Type::RECORD] {
            assert!(!has_binary_decoder(&ty), "{ty} should be read in text form");
        }
    }

    #[test]
    fn empty_result_needs_no_text_pass() {
        assert!(!needs_text_form(&[]));
    }
}
