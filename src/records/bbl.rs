//! Borough-block-lot parcel keys

/// Map a borough digit, name or PLUTO code to its digit
pub fn borough_code(raw: &str) -> Option<char> {
    let code = match raw.trim().to_uppercase().as_str() {
        "1" | "MN" | "MANHATTAN" => '1',
        "2" | "BX" | "BRONX" => '2',
        "3" | "BK" | "BROOKLYN" => '3',
        "4" | "QN" | "QUEENS" => '4',
        "5" | "SI" | "STATEN ISLAND" => '5',
        _ => return None,
    };
    Some(code)
}

/// Canonical 10-digit BBL from a source value
///
/// Socrata serves BBLs as decimals (`"1000010010.00000000"`); only an
/// all-zero fraction is accepted.
pub fn normalize_bbl(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let integral = match raw.split_once('.') {
        Some((int, frac)) if frac.chars().all(|c| c == '0') => int,
        Some(_) => return None,
        None => raw,
    };
    let digits: String = integral.chars().filter(char::is_ascii_digit).collect();
    let valid = digits.len() == 10 && matches!(digits.as_bytes()[0], b'1'..=b'5');
    valid.then_some(digits)
}

/// Build a BBL from borough + block (5 digits) + lot (4 digits)
pub fn derive_bbl(borough: &str, block: &str, lot: &str) -> Option<String> {
    let boro = borough_code(borough)?;
    let block: u32 = block.trim().parse().ok()?;
    let lot: u32 = lot.trim().parse().ok()?;
    if block == 0 || block > 99_999 || lot == 0 || lot > 9_999 {
        return None;
    }
    Some(format!("{boro}{block:05}{lot:04}"))
}
