//! CPF (Brazilian individual taxpayer number) validation.

use std::fmt;

use regex::Regex;

use crate::AppError;

static FORMATTED_RE: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(r"^\d{3}\.\d{3}\.\d{3}-\d{2}$").unwrap_or_else(|_| unreachable!())
});

static RAW_RE: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"^\d{11}$").unwrap_or_else(|_| unreachable!()));

/// A validated CPF, stored as 11 digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cpf(String);

impl Cpf {
    /// Parse a CPF written as `ddd.ddd.ddd-dd` or as 11 raw digits.
    pub fn parse(input: &str) -> Result<Self, AppError> {
        let input = input.trim();
        if !FORMATTED_RE.is_match(input) && !RAW_RE.is_match(input) {
            return Err(AppError::Validation("CPF must have 11 digits".to_string()));
        }

        let digits: Vec<u32> = input.chars().filter_map(|c| c.to_digit(10)).collect();

        // 000.000.000-00, 111.111.111-11, ... pass the checksum but are not issued
        if digits.iter().all(|d| *d == digits[0]) {
            return Err(AppError::Validation("CPF is invalid".to_string()));
        }

        if check_digit(&digits[..9]) != digits[9] || check_digit(&digits[..10]) != digits[10] {
            return Err(AppError::Validation("CPF is invalid".to_string()));
        }

        Ok(Self(digits.iter().map(u32::to_string).collect()))
    }

    /// The 11 normalized digits.
    #[must_use]
    pub fn digits(&self) -> &str {
        &self.0
    }

    /// The CPF formatted as `ddd.ddd.ddd-dd`.
    #[must_use]
    pub fn formatted(&self) -> String {
        format!(
            "{}.{}.{}-{}",
            &self.0[0..3],
            &self.0[3..6],
            &self.0[6..9],
            &self.0[9..11]
        )
    }
}

impl fmt::Display for Cpf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formatted())
    }
}

fn check_digit(digits: &[u32]) -> u32 {
    let weight_start = digits.len() as u32 + 1;
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, d)| d * (weight_start - i as u32))
        .sum();
    let rest = (sum * 10) % 11;
    if rest == 10 { 0 } else { rest }
}
