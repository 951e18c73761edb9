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
//! Table bootstrap for the employee store.
//!
use tracing::info;
use crate::errors::Result;
use crate::pool::Lease;

pub const EMPLOYEES_TABLE: &str = "employees";

/// `schema.employees`, the name every statement addresses the table by.
pub fn qualified_table(schema: &str) -> String {
    format!("{}.{}", schema, EMPLOYEES_TABLE)
}

/// Salaries are kept as decimal text so no precision is lost in the store.
pub fn create_statements(schema: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {schema}.{table} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            phone TEXT,
            job_code TEXT NOT NULL,
            salary TEXT NOT NULL CHECK (CAST(salary AS REAL) >= 0)
        );
        CREATE INDEX IF NOT EXISTS {schema}.idx_{table}_first_name ON {table} (first_name, last_name);",
        schema = schema,
        table = EMPLOYEES_TABLE,
    )
}

/// Create the table and its index when missing. Safe to run repeatedly.
pub fn install(lease: &Lease, schema: &str) -> Result<()> {
    lease.connection().execute_batch(&create_statements(schema))?;
    info!("Schema `{}` ready", qualified_table(schema));
    Ok(())
}
