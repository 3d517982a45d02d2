//! Parsing the `--stack` argument.
//!
//! Tokens are separated by whitespace. Numbers push one value each; quoted
//! strings (`'...'` or `"..."`) push the code of every character they
//! contain, in order, so `"10 'olleh'"` leaves `h` on top.

use crate::config::RunSection;
use crate::error::CliError;
use starfish_core::{Stack, Value};

pub fn parse_initial_stack(text: &str) -> Result<Stack, CliError> {
    let mut values = Vec::new();
    let mut number = String::new();
    let mut quote: Option<char> = None;

    for c in text.chars() {
        if let Some(open) = quote {
            if c == open {
                quote = None;
            } else {
                values.push(Value::from_char(c));
            }
            continue;
        }
        match c {
            '\'' | '"' => {
                flush_number(&mut number, &mut values)?;
                quote = Some(c);
            }
            c if c.is_whitespace() => flush_number(&mut number, &mut values)?,
            '0'..='9' | '.' | '-' => number.push(c),
            _ => {
                return Err(CliError::InvalidStack(format!(
                    "unexpected character {:?}",
                    c
                )))
            }
        }
    }

    if let Some(open) = quote {
        return Err(CliError::InvalidStack(format!(
            "unterminated string, expected closing {}",
            open
        )));
    }
    flush_number(&mut number, &mut values)?;
    Ok(Stack::from_values(values))
}

/// The `--stack` flag replaces any `stack` from the config file.
pub fn resolve_initial_stack(flag: Option<&str>, run: &RunSection) -> Result<Stack, CliError> {
    match flag {
        Some(text) => parse_initial_stack(text),
        None => Ok(Stack::from_values(run.stack.clone().unwrap_or_default())),
    }
}

fn flush_number(number: &mut String, values: &mut Vec<Value>) -> Result<(), CliError> {
    if number.is_empty() {
        return Ok(());
    }
    let value = if let Ok(n) = number.parse::<i64>() {
        Value::Int(n)
    } else {
        match number.parse::<f64>() {
            Ok(f) if f.is_finite() => Value::Float(f),
            _ => return Err(CliError::InvalidStack(format!("invalid number '{}'", number))),
        }
    };
    values.push(value);
    number.clear();
    Ok(())
}
