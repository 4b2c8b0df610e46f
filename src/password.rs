//! Password generation for WordPress admin and database accounts

use crate::ToolError;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
pub const NUMBERS: &str = "0123456789";
pub const SYMBOLS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";

pub const MIN_LENGTH: usize = 8;
pub const MAX_LENGTH: usize = 64;
pub const DEFAULT_LENGTH: usize = 16;

/// Which character classes to draw from and how many characters to emit.
///
/// # Examples
///
/// ```rust
/// use wp_toolkit::{generate_password, PasswordOptions};
///
/// let options = PasswordOptions {
///     length: 24,
///     symbols: false,
///     ..Default::default()
/// };
/// let password = generate_password(&options).unwrap();
/// assert_eq!(password.chars().count(), 24);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PasswordOptions {
    pub length: usize,
    pub uppercase: bool,
    pub lowercase: bool,
    pub numbers: bool,
    pub symbols: bool,
}

impl Default for PasswordOptions {
    fn default() -> Self {
        Self {
            length: DEFAULT_LENGTH,
            uppercase: true,
            lowercase: true,
            numbers: true,
            symbols: true,
        }
    }
}

impl PasswordOptions {
    pub fn charset(&self) -> String {
        let mut charset = String::new();
        if self.uppercase {
            charset.push_str(UPPERCASE);
        }
        if self.lowercase {
            charset.push_str(LOWERCASE);
        }
        if self.numbers {
            charset.push_str(NUMBERS);
        }
        if self.symbols {
            charset.push_str(SYMBOLS);
        }
        charset
    }

    pub fn validate(&self) -> Result<(), ToolError> {
        if !(self.uppercase || self.lowercase || self.numbers || self.symbols) {
            return Err(ToolError::InvalidInput(
                "Please select at least one character type".to_string(),
            ));
        }
        if !(MIN_LENGTH..=MAX_LENGTH).contains(&self.length) {
            return Err(ToolError::InvalidInput(format!(
                "password length must be between {MIN_LENGTH} and {MAX_LENGTH}, got {}",
                self.length
            )));
        }
        Ok(())
    }
}

pub fn generate_password(options: &PasswordOptions) -> Result<String, ToolError> {
    generate_password_with(options, &mut rand::thread_rng())
}

/// Draws each character uniformly from the enabled charset.
pub fn generate_password_with<R: Rng>(
    options: &PasswordOptions,
    rng: &mut R,
) -> Result<String, ToolError> {
    options.validate()?;

    let charset: Vec<char> = options.charset().chars().collect();
    let password: String = (0..options.length)
        .map(|_| charset[rng.gen_range(0..charset.len())])
        .collect();
    Ok(password)
}
