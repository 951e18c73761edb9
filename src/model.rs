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
//! Employee records.
//!
use bigdecimal::BigDecimal;
use rusqlite::types::Type;
use rusqlite::Row;
use serde::{Deserialize, Serialize};
use crate::driver::sqlite::decimal_from_value;
use crate::errors::{Result, RosterError};

/// Column order every employee query selects in.
pub const EMPLOYEE_COLUMNS: &str = "id, first_name, last_name, email, phone, job_code, salary";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    /// Assigned by the store on create; `None` until then.
    pub id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub job_code: String,
    pub salary: BigDecimal,
}

impl Employee {
    pub fn new<S: Into<String>>(first_name: S, last_name: S, email: S, job_code: S, salary: BigDecimal) -> Self {
        Employee {
            id: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            phone: None,
            job_code: job_code.into(),
            salary,
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_phone<S: Into<String>>(mut self, phone: S) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Check the fields a write needs before it goes anywhere near the store.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("firstName", &self.first_name),
            ("lastName", &self.last_name),
            ("email", &self.email),
            ("jobCode", &self.job_code),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(RosterError::invalid_record(format!("{name} must not be blank")));
            }
        }
        if !self.email.contains('@') {
            return Err(RosterError::invalid_record(format!("`{}` is not an email address", self.email)));
        }
        if self.salary < BigDecimal::from(0) {
            return Err(RosterError::invalid_record(format!("salary {} must not be negative", self.salary)));
        }
        Ok(())
    }

    /// Map a row selected with [`EMPLOYEE_COLUMNS`].
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let salary = decimal_from_value(row.get_ref(6)?)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, e.into()))?;
        Ok(Employee {
            id: Some(row.get(0)?),
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            email: row.get(3)?,
            phone: row.get(4)?,
            job_code: row.get(5)?,
            salary,
        })
    }
}


#[cfg(test)]
mod test {
    use std::str::FromStr;
    use super::*;

    fn sample() -> Employee {
        Employee::new("Ada", "Lovelace", "ada@example.com", "IT_PROG", BigDecimal::from_str("91000.50").unwrap())
    }

    #[test]
    fn valid_record_passes() {
        assert!(sample().validate().is_ok());
        assert!(sample().with_phone("555-0199").validate().is_ok());
    }

    #[test]
    fn blank_names_bad_email_and_negative_salary_are_rejected() {
        let mut blank = sample();
        blank.first_name = "   ".to_string();
        assert!(matches!(blank.validate(), Err(RosterError::InvalidRecord(_))));

        let mut email = sample();
        email.email = "ada.example.com".to_string();
        assert!(email.validate().is_err());

        let mut salary = sample();
        salary.salary = BigDecimal::from(-1);
        assert!(salary.validate().is_err());
    }

    #[test]
    fn serializes_with_camel_case_and_exact_salary() {
        let json = serde_json::to_value(sample().with_id(7)).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["firstName"], "Ada");
        assert_eq!(json["jobCode"], "IT_PROG");
        assert_eq!(json["salary"], "91000.50");
    }
}
