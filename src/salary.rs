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
//! Salary arithmetic. Everything stays in `BigDecimal`; no float ever touches a salary.
//!
use std::str::FromStr;
use bigdecimal::BigDecimal;
use crate::errors::{Result, RosterError};

/// Minimum scale of an adjusted salary.
pub const SALARY_SCALE: i64 = 2;

/// `salary × (100 + percent) / 100`.
///
/// The division by 100 is a scale shift, so the result is exact. Trailing zeros
/// beyond two decimal places are dropped.
pub fn apply_percent(salary: &BigDecimal, percent: &BigDecimal) -> BigDecimal {
    let factor = BigDecimal::from(100) + percent;
    let (digits, scale) = (salary * factor).into_bigint_and_exponent();
    let adjusted = BigDecimal::new(digits, scale + 2).normalized();
    let (_, scale) = adjusted.as_bigint_and_exponent();
    if scale < SALARY_SCALE {
        adjusted.with_scale(SALARY_SCALE)
    } else {
        adjusted
    }
}

/// Percentages below -100 would produce a negative salary.
pub fn check_percent(percent: &BigDecimal) -> Result<()> {
    if *percent < BigDecimal::from(-100) {
        return Err(RosterError::invalid_argument(format!(
            "salary adjustment of {percent}% would make salaries negative"
        )));
    }
    Ok(())
}

pub fn parse_decimal(value: &str) -> Result<BigDecimal> {
    BigDecimal::from_str(value.trim())
        .map_err(|e| RosterError::DataError(format!("`{value}` is not a decimal: {e}")))
}


#[cfg(test)]
mod test {
    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn ten_percent_raise() {
        assert_eq!(apply_percent(&dec("75000.00"), &dec("10")).to_string(), "82500.00");
    }

    #[test]
    fn five_percent_cut() {
        assert_eq!(apply_percent(&dec("75000.00"), &dec("-5")).to_string(), "71250.00");
    }

    #[test]
    fn zero_percent_keeps_value() {
        assert_eq!(apply_percent(&dec("75000.00"), &dec("0")), dec("75000.00"));
        assert_eq!(apply_percent(&dec("75000.00"), &dec("0")).to_string(), "75000.00");
    }

    #[test]
    fn more_than_doubling_and_fractional_percent() {
        assert_eq!(apply_percent(&dec("1000"), &dec("150")).to_string(), "2500.00");
        assert_eq!(apply_percent(&dec("100.00"), &dec("2.5")).to_string(), "102.50");
        assert_eq!(apply_percent(&dec("0.01"), &dec("33.3")).to_string(), "0.01333");
    }

    #[test]
    fn percent_floor() {
        assert!(check_percent(&dec("-100")).is_ok());
        assert!(check_percent(&dec("250")).is_ok());
        assert!(check_percent(&dec("-100.01")).is_err());
    }
}
