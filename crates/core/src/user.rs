use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::account::AccountId;
use crate::error::FinError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = FinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(FinError::unknown("role", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub account_id: Option<AccountId>,
    pub sectors: Vec<String>,
    pub is_active: bool,
}

impl User {
    pub fn scope(&self) -> Scope {
        Scope {
            account_id: self.account_id,
            sectors: self.sectors.clone(),
        }
    }
}

/// Account/sector visibility attached to a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    pub account_id: Option<AccountId>,
    pub sectors: Vec<String>,
}

impl Scope {
    pub fn is_unrestricted(&self) -> bool {
        self.account_id.is_none() && self.sectors.is_empty()
    }
}

/// Splits the stored comma-separated sector list.
pub fn parse_sectors(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn join_sectors(sectors: &[String]) -> String {
    sectors.join(",")
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Hex SHA-256 of the password.
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

pub fn verify_password(candidate: &str, stored_hash: &str) -> bool {
    let computed = hash_password(candidate);
    // Constant-time over the hex digest.
    computed.len() == stored_hash.len()
        && computed
            .bytes()
            .zip(stored_hash.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignUp {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

/// A sign-up that passed field checks. E-mail uniqueness is checked on insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub account_id: Option<AccountId>,
    pub sectors: Vec<String>,
}

impl SignUp {
    pub fn validate(self) -> Result<NewUser, FinError> {
        let name = self.name.trim().to_string();
        let email = normalize_email(&self.email);
        if name.is_empty() {
            return Err(FinError::MissingField("name"));
        }
        if email.is_empty() {
            return Err(FinError::MissingField("email"));
        }
        if !email.contains('@') {
            return Err(FinError::InvalidInput(format!("invalid e-mail: {email}")));
        }
        if self.password.is_empty() {
            return Err(FinError::MissingField("password"));
        }
        if self.password_confirmation.is_empty() {
            return Err(FinError::MissingField("password_confirmation"));
        }
        if self.password != self.password_confirmation {
            return Err(FinError::PasswordMismatch);
        }

        Ok(NewUser {
            name,
            email,
            password_hash: hash_password(&self.password),
            role: Role::User,
            account_id: None,
            sectors: Vec::new(),
        })
    }
}
