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
//! The fixed dataset served when the backing store cannot be reached.
//!
//! It is not a cache: it never reflects writes, and derived views such as a
//! salary adjustment are computed fresh on every call.
//!
use std::str::FromStr;
use bigdecimal::BigDecimal;
use once_cell::sync::Lazy;
use crate::model::Employee;
use crate::salary::apply_percent;

static FALLBACK_EMPLOYEES: Lazy<Vec<Employee>> = Lazy::new(|| {
    vec![
        employee(1, "John", "Smith", "john.smith@example.com", Some("555-0101"), "IT_PROG", "75000.00"),
        employee(2, "Jane", "Doe", "jane.doe@example.com", Some("555-0102"), "SA_MAN", "82000.00"),
        employee(3, "Robert", "Johnson", "robert.johnson@example.com", Some("555-0103"), "FI_ACCOUNT", "68000.00"),
        employee(4, "Emily", "Davis", "emily.davis@example.com", None, "HR_REP", "59000.00"),
        employee(5, "Michael", "Brown", "michael.brown@example.com", Some("555-0105"), "ST_CLERK", "45000.00"),
    ]
});

fn employee(id: i64, first: &str, last: &str, email: &str, phone: Option<&str>, job: &str, salary: &str) -> Employee {
    Employee {
        id: Some(id),
        first_name: first.to_string(),
        last_name: last.to_string(),
        email: email.to_string(),
        phone: phone.map(ToString::to_string),
        job_code: job.to_string(),
        salary: BigDecimal::from_str(salary).unwrap_or_default(),
    }
}

/// Every fallback record, ordered by id.
pub fn employees() -> Vec<Employee> {
    FALLBACK_EMPLOYEES.clone()
}

pub fn len() -> usize {
    FALLBACK_EMPLOYEES.len()
}

pub fn find_by_id(id: i64) -> Vec<Employee> {
    FALLBACK_EMPLOYEES.iter().filter(|e| e.id == Some(id)).cloned().collect()
}

/// First-name prefix match with ASCII case folding, the rule SQLite's `LIKE` applies.
pub fn matches_prefix(name: &str, prefix: &str) -> bool {
    let prefix = prefix.trim();
    name.len() >= prefix.len()
        && name.is_char_boundary(prefix.len())
        && name[..prefix.len()].eq_ignore_ascii_case(prefix)
}

/// First-name prefix match, ordered by first then last name.
pub fn find_by_first_name_prefix(prefix: &str) -> Vec<Employee> {
    let mut matches: Vec<Employee> = FALLBACK_EMPLOYEES
        .iter()
        .filter(|e| matches_prefix(&e.first_name, prefix))
        .cloned()
        .collect();
    matches.sort_by(|a, b| (&a.first_name, &a.last_name, a.id).cmp(&(&b.first_name, &b.last_name, b.id)));
    matches
}

/// The dataset with `percent` applied to every salary. Nothing is stored.
pub fn with_salary_adjustment(percent: &BigDecimal) -> Vec<Employee> {
    FALLBACK_EMPLOYEES
        .iter()
        .map(|e| Employee { salary: apply_percent(&e.salary, percent), ..e.clone() })
        .collect()
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn five_records_in_id_order() {
        let all = employees();
        assert_eq!(all.len(), 5);
        let ids: Vec<i64> = all.iter().filter_map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn prefix_is_case_insensitive_and_blank_matches_all() {
        let j = find_by_first_name_prefix("j");
        let names: Vec<&str> = j.iter().map(|e| e.first_name.as_str()).collect();
        assert_eq!(names, vec!["Jane", "John"]);
        assert_eq!(find_by_first_name_prefix("JOH").len(), 1);
        assert_eq!(find_by_first_name_prefix("").len(), 5);
        assert_eq!(find_by_first_name_prefix("   ").len(), 5);
        assert!(find_by_first_name_prefix("zed").is_empty());
    }

    #[test]
    fn case_folding_is_ascii_only() {
        assert!(matches_prefix("John", "jO"));
        assert!(matches_prefix("Émile", "Ém"));
        assert!(!matches_prefix("Émile", "ém"));
        assert!(!matches_prefix("Jo", "John"));
        assert!(!matches_prefix("Émile", "E"));
    }

    #[test]
    fn adjustments_never_touch_the_dataset() {
        let raised = with_salary_adjustment(&BigDecimal::from(10));
        assert_eq!(raised[0].salary.to_string(), "82500.00");
        assert_eq!(employees()[0].salary.to_string(), "75000.00");
    }

    #[test]
    fn lookup_by_missing_id_is_empty() {
        assert_eq!(find_by_id(3).len(), 1);
        assert!(find_by_id(42).is_empty());
    }
}
