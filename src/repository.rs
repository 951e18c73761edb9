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
//! Employee CRUD over the coordinator, degrading reads to the fallback dataset.
//!
use bigdecimal::BigDecimal;
use rusqlite::params;
use tracing::{debug, info, warn};
use crate::coordinator::ResourceCoordinator;
use crate::errors::{Result, RosterError};
use crate::fallback;
use crate::model::{Employee, EMPLOYEE_COLUMNS};
use crate::pool::Lease;
use crate::salary::check_percent;
use crate::schema;

/// Employee record operations as the web layer sees them.
///
/// "Not found" is always an empty result, never an error.
pub trait EmployeeRepository: Send + Sync {
    /// Every record, ordered by id.
    fn list(&self) -> Result<Vec<Employee>>;

    /// Zero or one record.
    fn get(&self, id: i64) -> Result<Vec<Employee>>;

    /// First-name prefix match, ordered by first then last name. Case is folded
    /// for ASCII letters only, so `é` does not match `É`. A blank prefix matches
    /// everyone.
    fn find_by_first_name_prefix(&self, prefix: &str) -> Result<Vec<Employee>>;

    fn count(&self) -> Result<u64>;

    /// Insert and return the stored record with its generated id. Any id on
    /// `employee` is ignored.
    fn create(&self, employee: &Employee) -> Result<Option<Employee>>;

    /// Replace the record at `id`. `None` when no such record exists.
    fn update(&self, id: i64, employee: &Employee) -> Result<Option<Employee>>;

    /// Whether a record was removed.
    fn delete(&self, id: i64) -> Result<bool>;

    /// Adjust one salary by `percent`. `None` when no such record exists.
    fn adjust_salary(&self, id: i64, percent: &BigDecimal) -> Result<Option<Employee>>;

    /// Adjust every salary by `percent` in one atomic statement and return the
    /// whole roster afterwards.
    fn adjust_salary_for_all(&self, percent: &BigDecimal) -> Result<Vec<Employee>>;

    fn is_healthy(&self) -> bool;
}

struct Statements {
    list: String,
    get: String,
    find_by_prefix: String,
    count: String,
    insert: String,
    update: String,
    delete: String,
    adjust_one: String,
    adjust_all: String,
}

impl Statements {
    fn new(schema: &str) -> Self {
        let table = schema::qualified_table(schema);
        Statements {
            list: format!("SELECT {EMPLOYEE_COLUMNS} FROM {table} ORDER BY id"),
            get: format!("SELECT {EMPLOYEE_COLUMNS} FROM {table} WHERE id = ?1"),
            find_by_prefix: format!(
                "SELECT {EMPLOYEE_COLUMNS} FROM {table} WHERE first_name LIKE ?1 ESCAPE '\\' ORDER BY first_name, last_name, id"
            ),
            count: format!("SELECT COUNT(*) FROM {table}"),
            insert: format!(
                "INSERT INTO {table} (first_name, last_name, email, phone, job_code, salary) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
            ),
            update: format!(
                "UPDATE {table} SET first_name = ?1, last_name = ?2, email = ?3, phone = ?4, job_code = ?5, salary = ?6 WHERE id = ?7"
            ),
            delete: format!("DELETE FROM {table} WHERE id = ?1"),
            adjust_one: format!("UPDATE {table} SET salary = adjust_salary(salary, ?1) WHERE id = ?2"),
            adjust_all: format!("UPDATE {table} SET salary = adjust_salary(salary, ?1)"),
        }
    }
}

/// `LIKE` pattern for a literal prefix.
fn like_prefix(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.trim().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// The store-backed repository.
///
/// Reads retry transient failures. When the store stays unreachable they serve
/// the fallback dataset rather than fail; any other read failure is returned.
/// Writes run in a transaction, are never retried, and always report their
/// failure.
pub struct ResilientRepository {
    coordinator: ResourceCoordinator,
    sql: Statements,
}

impl ResilientRepository {
    pub fn new(coordinator: ResourceCoordinator) -> Self {
        let sql = Statements::new(coordinator.pool().config().schema());
        ResilientRepository { coordinator, sql }
    }

    pub fn coordinator(&self) -> &ResourceCoordinator {
        &self.coordinator
    }

    /// Create the employee table if it is missing.
    pub fn install_schema(&self) -> Result<()> {
        let schema = self.coordinator.pool().config().schema().to_string();
        self.coordinator.with_connection(|lease| schema::install(lease, &schema))
    }

    fn degrade<T>(&self, operation: &str, cause: RosterError, fallback: impl FnOnce() -> T) -> T {
        warn!("{} - {} failed ({}); serving fallback data", self.coordinator.pool().name(), operation, cause);
        fallback()
    }

    fn select_by_id(&self, lease: &Lease, id: i64) -> Result<Option<Employee>> {
        lease.query_opt(&self.sql.get, params![id], Employee::from_row)
    }

    fn select_all(&self, lease: &Lease) -> Result<Vec<Employee>> {
        lease.query(&self.sql.list, [], Employee::from_row)
    }
}

impl EmployeeRepository for ResilientRepository {
    fn list(&self) -> Result<Vec<Employee>> {
        match self.coordinator.with_default_retry(|lease| self.select_all(lease)) {
            Ok(employees) => Ok(employees),
            Err(e) if e.is_unavailable() => Ok(self.degrade("list", e, fallback::employees)),
            Err(e) => Err(e),
        }
    }

    fn get(&self, id: i64) -> Result<Vec<Employee>> {
        match self.coordinator.with_default_retry(|lease| self.select_by_id(lease, id)) {
            Ok(found) => Ok(found.into_iter().collect()),
            Err(e) if e.is_unavailable() => Ok(self.degrade("get", e, || fallback::find_by_id(id))),
            Err(e) => Err(e),
        }
    }

    fn find_by_first_name_prefix(&self, prefix: &str) -> Result<Vec<Employee>> {
        let pattern = like_prefix(prefix);
        let found = self.coordinator.with_default_retry(|lease| {
            lease.query(&self.sql.find_by_prefix, params![pattern], Employee::from_row)
        });
        match found {
            Ok(employees) => Ok(employees),
            Err(e) if e.is_unavailable() => {
                Ok(self.degrade("find_by_first_name_prefix", e, || fallback::find_by_first_name_prefix(prefix)))
            }
            Err(e) => Err(e),
        }
    }

    fn count(&self) -> Result<u64> {
        let counted = self.coordinator.with_default_retry(|lease| {
            lease.query_opt(&self.sql.count, [], |row| row.get::<_, i64>(0))
        });
        match counted {
            Ok(n) => Ok(n.unwrap_or_default().max(0) as u64),
            Err(e) if e.is_unavailable() => Ok(self.degrade("count", e, || fallback::len() as u64)),
            Err(e) => Err(e),
        }
    }

    fn create(&self, employee: &Employee) -> Result<Option<Employee>> {
        employee.validate()?;
        let created = self.coordinator.with_transaction(|lease| {
            let inserted = lease.execute(
                &self.sql.insert,
                params![
                    employee.first_name,
                    employee.last_name,
                    employee.email,
                    employee.phone,
                    employee.job_code,
                    employee.salary.to_string(),
                ],
            )?;
            if inserted == 0 {
                return Ok(None);
            }
            let id = lease.last_insert_id();
            self.select_by_id(lease, id)
        })?;
        if let Some(ref e) = created {
            info!("Created employee {:?} <{}>", e.id, e.email);
        }
        Ok(created)
    }

    fn update(&self, id: i64, employee: &Employee) -> Result<Option<Employee>> {
        employee.validate()?;
        self.coordinator.with_transaction(|lease| {
            let changed = lease.execute(
                &self.sql.update,
                params![
                    employee.first_name,
                    employee.last_name,
                    employee.email,
                    employee.phone,
                    employee.job_code,
                    employee.salary.to_string(),
                    id,
                ],
            )?;
            if changed == 0 {
                debug!("No employee {} to update", id);
                return Ok(None);
            }
            self.select_by_id(lease, id)
        })
    }

    fn delete(&self, id: i64) -> Result<bool> {
        let removed = self.coordinator.with_transaction(|lease| lease.execute(&self.sql.delete, params![id]))?;
        if removed > 0 {
            info!("Deleted employee {}", id);
        }
        Ok(removed > 0)
    }

    fn adjust_salary(&self, id: i64, percent: &BigDecimal) -> Result<Option<Employee>> {
        check_percent(percent)?;
        let percent = percent.to_string();
        self.coordinator.with_transaction(|lease| {
            if lease.execute(&self.sql.adjust_one, params![percent, id])? == 0 {
                return Ok(None);
            }
            self.select_by_id(lease, id)
        })
    }

    fn adjust_salary_for_all(&self, percent: &BigDecimal) -> Result<Vec<Employee>> {
        check_percent(percent)?;
        let text = percent.to_string();
        let adjusted = self.coordinator.with_transaction(|lease| {
            let changed = lease.execute(&self.sql.adjust_all, params![text])?;
            info!("Adjusted {} salaries by {}%", changed, text);
            self.select_all(lease)
        });
        match adjusted {
            Ok(employees) => Ok(employees),
            Err(e) if e.is_unavailable() => {
                Ok(self.degrade("adjust_salary_for_all", e, || fallback::with_salary_adjustment(percent)))
            }
            Err(e) => Err(e),
        }
    }

    fn is_healthy(&self) -> bool {
        self.coordinator.health()
    }
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn like_prefix_escapes_wildcards() {
        assert_eq!(like_prefix("jo"), "jo%");
        assert_eq!(like_prefix("  jo "), "jo%");
        assert_eq!(like_prefix(""), "%");
        assert_eq!(like_prefix("50%_off\\"), "50\\%\\_off\\\\%");
    }

    #[test]
    fn statements_address_the_configured_schema() {
        let sql = Statements::new("main");
        assert!(sql.list.contains("FROM main.employees ORDER BY id"));
        assert!(sql.adjust_all.contains("adjust_salary(salary, ?1)"));
        assert!(!sql.adjust_all.contains("WHERE"));
    }
}
