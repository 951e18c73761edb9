/*
 *
 *  *
 *  *      Copyright (c) 2018-2025, SnackCloud All rights reserved.
 *  *
 *  *   Redistribution and use in source and binary forms, with or without
 *  *   modification, are permitted provided that the following conditions are met:
 *  *
 *  *   Redistributions of source code must retain the above copyright notice,
 *  *   this list of conditions and the following disclaimer.
 *  *   Redistributions in binary form must reproduce the above copyright
 *  *   notice, this list of conditions and the following disclaimer in the
 *  *   documentation and/or other materials provided with the distribution.
 *  *   Neither the name of the www.snackcloud.cn developer nor the names of its
 *  *   contributors may be used to endorse or promote products derived from
 *  *   this software without specific prior written permission.
 *  *   Author: SnackCloud
 *  *
 *  
 */
//!
//! SQLite modules.
//!

mod connection;

pub use connection::*;

use std::str::FromStr;
use std::time::{Duration, Instant};
use bigdecimal::{BigDecimal, FromPrimitive};
use rusqlite::functions::{Context, FunctionFlags};
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use crate::errors::{Result, RosterError};
use crate::salary::apply_percent;

/// Name of the in-engine routine performing the bulk percentage adjustment.
pub const ADJUST_SALARY_FN: &str = "adjust_salary";

/// Register the scalar functions every pooled connection carries.
pub fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        ADJUST_SALARY_FN,
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let salary = decimal_arg(ctx, 0)?;
            let percent = decimal_arg(ctx, 1)?;
            Ok(apply_percent(&salary, &percent).to_string())
        },
    )
}

fn decimal_arg(ctx: &Context<'_>, idx: usize) -> rusqlite::Result<BigDecimal> {
    decimal_from_value(ctx.get_raw(idx)).map_err(|e| rusqlite::Error::UserFunctionError(e.into()))
}

/// Read a decimal out of whatever storage class SQLite handed back.
pub fn decimal_from_value(value: ValueRef<'_>) -> std::result::Result<BigDecimal, String> {
    match value {
        ValueRef::Text(bytes) => {
            let text = std::str::from_utf8(bytes).map_err(|e| e.to_string())?;
            BigDecimal::from_str(text.trim()).map_err(|e| format!("`{text}` is not a decimal: {e}"))
        }
        ValueRef::Integer(i) => Ok(BigDecimal::from(i)),
        ValueRef::Real(f) => BigDecimal::from_f64(f).ok_or_else(|| format!("{f} is not a finite decimal")),
        other => Err(format!("expected a decimal, found {}", other.data_type())),
    }
}

/// Run the validation query with `timeout` as the busy timeout, then restore `busy_timeout`.
///
/// Fails if the query errors or takes longer than `timeout`.
pub fn validate_connection(conn: &Connection, query: &str, timeout: Duration, busy_timeout: Duration) -> Result<()> {
    let started = Instant::now();
    let outcome = conn.busy_timeout(timeout).and_then(|_| {
        let mut stmt = conn.prepare_cached(query)?;
        let mut rows = stmt.query([])?;
        rows.next()?;
        Ok(())
    });
    let restored = conn.busy_timeout(busy_timeout);
    outcome.map_err(|e| RosterError::ValidationFailed(format!("`{query}`: {e}")))?;
    restored.map_err(|e| RosterError::ValidationFailed(e.to_string()))?;
    let elapsed = started.elapsed();
    if elapsed > timeout {
        return Err(RosterError::ValidationFailed(format!(
            "`{query}` took {} ms, limit is {} ms", elapsed.as_millis(), timeout.as_millis()
        )));
    }
    Ok(())
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn adjust_salary_runs_inside_the_engine() {
        let conn = Connection::open_in_memory().unwrap();
        register_functions(&conn).unwrap();
        let raised: String = conn
            .query_row("SELECT adjust_salary('75000.00', '10')", [], |row| row.get(0))
            .unwrap();
        assert_eq!(raised, "82500.00");
        let cut: String = conn
            .query_row("SELECT adjust_salary('75000.00', -5)", [], |row| row.get(0))
            .unwrap();
        assert_eq!(cut, "71250.00");
    }

    #[test]
    fn adjust_salary_rejects_garbage() {
        let conn = Connection::open_in_memory().unwrap();
        register_functions(&conn).unwrap();
        let err = conn
            .query_row("SELECT adjust_salary('lots', '10')", [], |row| row.get::<_, String>(0))
            .unwrap_err();
        assert!(matches!(RosterError::from(err), RosterError::DataError(_)));
    }

    #[test]
    fn validation_reports_bad_queries() {
        let conn = Connection::open_in_memory().unwrap();
        let timeout = Duration::from_secs(1);
        assert!(validate_connection(&conn, "SELECT 1", timeout, timeout).is_ok());
        let err = validate_connection(&conn, "SELECT FROM nowhere", timeout, timeout).unwrap_err();
        assert!(matches!(err, RosterError::ValidationFailed(_)));
    }
}
