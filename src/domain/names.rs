//! Validated collection names
//!
//! Newtype wrappers for container and table names. Each type checks the
//! naming rules of the storage service at construction so an invalid name
//! never reaches a backend.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MIN_NAME_LEN: usize = 3;
const MAX_NAME_LEN: usize = 63;

/// Blob container name newtype wrapper
///
/// 3-63 characters of lowercase ASCII letters, digits and hyphens. Must start
/// and end with a letter or digit and must not contain consecutive hyphens.
///
/// # Examples
///
/// ```
/// use stowage::domain::names::ContainerName;
/// use std::str::FromStr;
///
/// let name = ContainerName::from_str("user-uploads").unwrap();
/// assert_eq!(name.as_str(), "user-uploads");
/// assert!(ContainerName::new("User_Uploads").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContainerName(String);

impl ContainerName {
    /// Creates a new ContainerName from a string
    ///
    /// # Returns
    ///
    /// Returns `Ok(ContainerName)` if the name is valid, `Err` otherwise
    pub fn new(name: impl Into<String>) -> Result<Self, String> {
        let name = name.into();
        check_length("Container", &name)?;

        if !name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(format!(
                "Container name '{name}' may only contain lowercase letters, digits and hyphens"
            ));
        }

        if name.starts_with('-') || name.ends_with('-') {
            return Err(format!(
                "Container name '{name}' must start and end with a letter or digit"
            ));
        }

        if name.contains("--") {
            return Err(format!(
                "Container name '{name}' must not contain consecutive hyphens"
            ));
        }

        Ok(Self(name))
    }

    /// Returns the container name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Table name newtype wrapper
///
/// 3-63 ASCII alphanumeric characters, starting with a letter.
///
/// # Examples
///
/// ```
/// use stowage::domain::names::TableName;
///
/// let name = TableName::new("Invites2024").unwrap();
/// assert_eq!(name.as_str(), "Invites2024");
/// assert!(TableName::new("2024Invites").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TableName(String);

impl TableName {
    /// Creates a new TableName from a string
    pub fn new(name: impl Into<String>) -> Result<Self, String> {
        let name = name.into();
        check_length("Table", &name)?;

        if !name.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(format!(
                "Table name '{name}' may only contain letters and digits"
            ));
        }

        if !name.starts_with(|c: char| c.is_ascii_alphabetic()) {
            return Err(format!("Table name '{name}' must start with a letter"));
        }

        Ok(Self(name))
    }

    /// Returns the table name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

fn check_length(kind: &str, name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err(format!("{kind} name cannot be empty"));
    }
    if !(MIN_NAME_LEN..=MAX_NAME_LEN).contains(&name.len()) {
        return Err(format!(
            "{kind} name '{name}' must be between {MIN_NAME_LEN} and {MAX_NAME_LEN} characters, got {}",
            name.len()
        ));
    }
    Ok(())
}

macro_rules! impl_name_traits {
    ($ty:ident) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $ty {
            type Error = String;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::new(s)
            }
        }

        impl From<$ty> for String {
            fn from(name: $ty) -> Self {
                name.0
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

impl_name_traits!(ContainerName);
impl_name_traits!(TableName);
