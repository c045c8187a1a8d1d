use crate::bot::constants::misc::MAX_VALUE;

use super::BotError;

// Parse an amount. Reads a string, returns i64 in minor units.
pub fn parse_amount(text: &str, decimal_places: i32) -> Result<i64, BotError> {
    let factor = 10.0_f64.powi(decimal_places);
    let amount = match text.parse::<i64>() {
        Ok(val) => (val as f64 * factor).round() as i64,
        Err(_) => match text.parse::<f64>() {
            Ok(val) => (val * factor).round() as i64,
            Err(_) => {
                return Err(BotError::UserError(
                    "Uh-oh! ❌ Please give me a valid number!".to_string(),
                ))
            }
        },
    };

    if amount > MAX_VALUE {
        Err(BotError::UserError(
            "Uh-oh! 🥺 This number is too large for me to handle!".to_string(),
        ))
    } else if amount <= 0 {
        Err(BotError::UserError(
            "Uh-oh! ❌ Please give me a positive number!".to_string(),
        ))
    } else {
        Ok(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_whole_and_decimal_amounts() {
        assert_eq!(parse_amount("1500", 2).unwrap(), 150_000);
        assert_eq!(parse_amount("99.50", 2).unwrap(), 9_950);
        assert_eq!(parse_amount("0.01", 2).unwrap(), 1);
    }

    #[test]
    fn rejects_non_numeric_input() {
        assert!(parse_amount("lunch", 2).is_err());
        assert!(parse_amount("", 2).is_err());
        assert!(parse_amount("12,50", 2).is_err());
    }

    #[test]
    fn rejects_non_positive_amounts() {
        assert!(parse_amount("0", 2).is_err());
        assert!(parse_amount("-25", 2).is_err());
        assert!(parse_amount("0.001", 2).is_err(), "rounds to zero minor units");
    }

    #[test]
    fn rejects_amounts_above_the_cap() {
        assert!(parse_amount("999999999999999", 2).is_err());
    }
}
