//! Human-readable size budgets

const KIB: u64 = 1 << 10;
const MIB: u64 = 1 << 20;
const GIB: u64 = 1 << 30;

/// Parse a budget string of the form `<integer><unit>`.
///
/// Units are `B`, `K`, `M` and `G` (case-insensitive, binary multiples).
/// Whitespace around the number and the unit is ignored. Anything that
/// does not fit the format, including an overflowing product, yields `0`.
pub fn parse_size(input: &str) -> u64 {
    let input = input.trim();
    let Some(split) = input.find(|c: char| !c.is_ascii_digit()) else {
        return 0;
    };

    let (number, unit) = (input[..split].trim(), input[split..].trim());

    let multiplier = match unit.to_ascii_uppercase().as_str() {
        "B" => 1,
        "K" => KIB,
        "M" => MIB,
        "G" => GIB,
        _ => return 0,
    };

    number
        .parse::<u64>()
        .ok()
        .and_then(|value| value.checked_mul(multiplier))
        .unwrap_or(0)
}
