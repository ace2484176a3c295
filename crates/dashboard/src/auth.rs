// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Login stub
//!
//! Not an identity system: no hashing, no expiry.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Admin => f.write_str("admin"),
        }
    }
}

pub trait Authenticator {
    /// Role granted to `username`, or `None` when the pair is rejected.
    fn authenticate(&self, username: &str, password: &str) -> Option<Role>;
}

/// Accepts exactly `user`/`user123` and `admin`/`admin123`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticAuthenticator;

const ACCOUNTS: &[(&str, &str, Role)] = &[
    ("user", "user123", Role::User),
    ("admin", "admin123", Role::Admin),
];

impl Authenticator for StaticAuthenticator {
    fn authenticate(&self, username: &str, password: &str) -> Option<Role> {
        ACCOUNTS
            .iter()
            .find(|(u, p, _)| *u == username && *p == password)
            .map(|(_, _, role)| *role)
    }
}
