//! Text formatting shared by cards, markers and the detail view

/// Label shown when a listing carries no price
pub const PRICE_ON_REQUEST: &str = "Consultar";

/// Pick the singular form only for a count of exactly one
pub fn pluralize<'a>(count: i64, singular: &'a str, plural: &'a str) -> &'a str {
    if count == 1 {
        singular
    } else {
        plural
    }
}

/// Format a price as `USD 185.000` / `Gs. 3.500.000`
pub fn format_price(amount: Option<f64>, currency: &str) -> String {
    let Some(amount) = amount.filter(|a| a.is_finite()) else {
        return PRICE_ON_REQUEST.to_string();
    };

    let grouped = group_thousands(amount.round() as i64);
    match currency_symbol(currency) {
        Some(symbol) => format!("{} {}", symbol, grouped),
        None => grouped,
    }
}

/// Format a surface in square meters, dropping a zero fraction
pub fn format_area(area_m2: f64) -> String {
    if area_m2.fract() == 0.0 {
        format!("{} m²", area_m2 as i64)
    } else {
        format!("{:.1} m²", area_m2)
    }
}

fn currency_symbol(currency: &str) -> Option<String> {
    let trimmed = currency.trim();
    match trimmed.to_uppercase().trim_end_matches('.') {
        "" => None,
        "GS" | "PYG" | "₲" => Some("Gs.".to_string()),
        "US$" | "U$S" | "USD" => Some("USD".to_string()),
        _ => Some(trimmed.to_string()),
    }
}

fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    if value < 0 {
        out.insert(0, '-');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize(1, "Dormitorio", "Dormitorios"), "Dormitorio");
        assert_eq!(pluralize(0, "Dormitorio", "Dormitorios"), "Dormitorios");
        assert_eq!(pluralize(2, "Dormitorio", "Dormitorios"), "Dormitorios");
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(Some(185000.0), "USD"), "USD 185.000");
        assert_eq!(format_price(Some(3_500_000.0), "Gs"), "Gs. 3.500.000");
        assert_eq!(format_price(Some(3_500_000.0), "PYG"), "Gs. 3.500.000");
        assert_eq!(format_price(Some(950.0), "USD"), "USD 950");
        assert_eq!(format_price(Some(1000.4), ""), "1.000");
        assert_eq!(format_price(None, "USD"), PRICE_ON_REQUEST);
    }

    #[test]
    fn test_format_area() {
        assert_eq!(format_area(220.0), "220 m²");
        assert_eq!(format_area(85.5), "85.5 m²");
    }
}
