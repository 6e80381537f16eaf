//! Lenient number parsing.
//!
//! Log tokens often carry trailing text (`452ms`, `3/10`, `12)`), so the
//! parsers read the longest numeric prefix and ignore the rest. Anything
//! without a numeric prefix is absent.

pub(super) fn strip_paren(token: &str) -> &str {
    token.strip_prefix('(').unwrap_or(token)
}

pub(super) fn parse_int(token: Option<&str>) -> Option<i64> {
    let text = token?.trim_start();
    let sign_len = sign_len(text);
    let digits_len = count_digits(text.get(sign_len..)?);
    if digits_len == 0 {
        return None;
    }
    text.get(..sign_len.checked_add(digits_len)?)?.parse().ok()
}

pub(super) fn parse_float(token: Option<&str>) -> Option<f64> {
    let text = token?.trim_start();
    let prefix = text.get(..float_prefix_len(text)?)?;
    prefix.parse::<f64>().ok().filter(|value| value.is_finite())
}

fn sign_len(text: &str) -> usize {
    usize::from(text.starts_with(['+', '-']))
}

fn count_digits(text: &str) -> usize {
    text.bytes().take_while(u8::is_ascii_digit).count()
}

/// Length of the `[+-]digits[.digits][e[+-]digits]` prefix, if any digit is present.
fn float_prefix_len(text: &str) -> Option<usize> {
    let mut end = sign_len(text);
    let int_digits = count_digits(text.get(end..)?);
    end = end.checked_add(int_digits)?;

    let mut frac_digits = 0;
    if text.get(end..)?.starts_with('.') {
        frac_digits = count_digits(text.get(end.checked_add(1)?..)?);
        if int_digits > 0 || frac_digits > 0 {
            end = end.checked_add(1)?.checked_add(frac_digits)?;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return None;
    }

    let rest = text.get(end..)?;
    if rest.starts_with(['e', 'E']) {
        let exp = rest.get(1..)?;
        let exp_sign = sign_len(exp);
        let exp_digits = count_digits(exp.get(exp_sign..)?);
        if exp_digits > 0 {
            end = end.checked_add(1)?.checked_add(exp_sign)?.checked_add(exp_digits)?;
        }
    }
    Some(end)
}
