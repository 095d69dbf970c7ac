//! Shell-word splitting for configured argument strings
//!
//! Runner arguments are configured as a single string and split into a
//! discrete argument list before spawning: whitespace separates words,
//! single quotes are literal, double quotes honor backslash escapes, and a
//! bare backslash escapes the next character. Quoted substrings stay one
//! argument.

use crate::common::{Error, Result};

/// Split a shell-like argument string into discrete arguments
pub fn split_args(input: &str) -> Result<Vec<String>> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = input.chars();

    while let Some(ch) = chars.next() {
        match ch {
            c if c.is_whitespace() => {
                if in_word {
                    args.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            '\\' => {
                in_word = true;
                match chars.next() {
                    Some(escaped) => current.push(escaped),
                    None => {
                        return Err(Error::Config(format!(
                            "trailing backslash in argument string '{input}'"
                        )))
                    }
                }
            }
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => current.push(c),
                        None => {
                            return Err(Error::Config(format!(
                                "unbalanced quote in argument string '{input}'"
                            )))
                        }
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(escaped) => current.push(escaped),
                            None => {
                                return Err(Error::Config(format!(
                                    "unbalanced quote in argument string '{input}'"
                                )))
                            }
                        },
                        Some(c) => current.push(c),
                        None => {
                            return Err(Error::Config(format!(
                                "unbalanced quote in argument string '{input}'"
                            )))
                        }
                    }
                }
            }
            c => {
                in_word = true;
                current.push(c);
            }
        }
    }

    if in_word {
        args.push(current);
    }

    Ok(args)
}
