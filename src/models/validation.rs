// src/models/validation.rs
//
// Regras de formato que o `validator` não tem prontas.

use rust_decimal::Decimal;
use validator::ValidationError;

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// CNPJ no formato NN.NNN.NNN/NNNN-NN, pontuação opcional.
pub fn validate_cnpj(value: &str) -> Result<(), ValidationError> {
    // (quantidade de dígitos, separador opcional que vem depois)
    const GROUPS: [(usize, Option<char>); 5] =
        [(2, Some('.')), (3, Some('.')), (3, Some('/')), (4, Some('-')), (2, None)];

    let mut chars = value.chars().peekable();
    for (digits, separator) in GROUPS {
        for _ in 0..digits {
            match chars.next() {
                Some(c) if c.is_ascii_digit() => {}
                _ => return Err(invalid("cnpj", "CNPJ inválido")),
            }
        }
        if let Some(sep) = separator {
            if chars.peek() == Some(&sep) {
                chars.next();
            }
        }
    }

    if chars.next().is_some() {
        return Err(invalid("cnpj", "CNPJ inválido"));
    }
    Ok(())
}

/// Cor no formato #RRGGBB.
pub fn validate_hex_color(value: &str) -> Result<(), ValidationError> {
    let valid = value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit());

    if valid { Ok(()) } else { Err(invalid("color", "Cor inválida")) }
}

pub fn validate_positive(value: &Decimal) -> Result<(), ValidationError> {
    if *value > Decimal::ZERO {
        Ok(())
    } else {
        Err(invalid("positive", "Valor deve ser positivo"))
    }
}

/// Strings vazias vindas de formulários viram `None`.
pub(crate) fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
