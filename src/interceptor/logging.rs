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
use std::time::{Duration, Instant};
use tracing::{debug, error, info, trace, warn};
use crate::errors::Result;
use crate::interceptor::LogLevel;

/// Statement logger for leases. Focus on SQL execution logs.
#[derive(Debug, Clone)]
pub struct StatementLogger {
    pub log_level: LogLevel,
    pub slow_threshold: Duration,
}

impl StatementLogger {
    pub fn new() -> Self {
        Self {
            log_level: LogLevel::Debug,
            slow_threshold: Duration::from_millis(1000),
        }
    }

    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    pub fn with_slow_threshold(mut self, threshold: Duration) -> Self {
        self.slow_threshold = threshold;
        self
    }

    /// Log a statement about to run. Returns the start instant for [`StatementLogger::after`].
    pub fn before(&self, lease_id: &str, sql: &str) -> Instant {
        if self.log_level.should_log(LogLevel::Debug) {
            debug!(lease = lease_id, "==>  Preparing: {}", compact(sql));
        }
        Instant::now()
    }

    /// Log the outcome of a statement. `rows` is the number of rows read or affected.
    pub fn after<T>(&self, lease_id: &str, sql: &str, started: Instant, result: &Result<T>, rows: impl FnOnce(&T) -> usize) {
        let cost = started.elapsed();
        let value = match result {
            Ok(value) => value,
            Err(err) => {
                if self.log_level.should_log(LogLevel::Error) {
                    error!(lease = lease_id, "<==      ERROR: {}", err);
                    error!(lease = lease_id, "<== Failed SQL: {}", compact(sql));
                }
                return;
            }
        };
        let rows = rows(value);
        if cost > self.slow_threshold && self.log_level.should_log(LogLevel::Warn) {
            warn!(lease = lease_id, "<== Slow Statement! Cost: {} ms, Rows: {}, SQL: {}", cost.as_millis(), rows, compact(sql));
        }
        if self.log_level.should_log(LogLevel::Trace) {
            trace!(lease = lease_id, "<==      Total: {}, Cost: {} us", rows, cost.as_micros());
        } else if self.log_level.should_log(LogLevel::Debug) {
            debug!(lease = lease_id, "<==      Total: {}, Cost: {} ms", rows, cost.as_millis());
        } else if self.log_level.should_log(LogLevel::Info) && cost > self.slow_threshold {
            info!(lease = lease_id, "<==      Total: {}, Cost: {} ms", rows, cost.as_millis());
        }
    }
}

impl Default for StatementLogger {
    fn default() -> Self {
        Self::new()
    }
}

/// Collapse whitespace so multi-line SQL stays on one log line.
fn compact(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}


#[cfg(test)]
mod test {
    use super::compact;

    #[test]
    fn multi_line_sql_is_compacted() {
        assert_eq!(compact("SELECT id\n   FROM employees\n  WHERE id = ?1"), "SELECT id FROM employees WHERE id = ?1");
    }
}
