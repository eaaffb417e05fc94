//! Target-processor catalog.
//!
//! The optional header carries a numeric processor code assigned by the
//! MPLAB toolchain. The catalog below covers the PIC18 family devices the
//! C18 compiler targets; codes outside the table render as an "unknown
//! processor" marker instead of failing the decode.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use tracing::warn;

static PROCESSORS: Lazy<HashMap<u32, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (0x8242, "PIC18C242"),
        (0x8252, "PIC18C252"),
        (0x8442, "PIC18C442"),
        (0x8452, "PIC18C452"),
        (0x8658, "PIC18C658"),
        (0x8858, "PIC18C858"),
        (0x9242, "PIC18F242"),
        (0x9248, "PIC18F248"),
        (0x9252, "PIC18F252"),
        (0x9258, "PIC18F258"),
        (0x9442, "PIC18F442"),
        (0x9448, "PIC18F448"),
        (0x9452, "PIC18F452"),
        (0x9458, "PIC18F458"),
        (0x1220, "PIC18F1220"),
        (0x1320, "PIC18F1320"),
        (0x2220, "PIC18F2220"),
        (0x2320, "PIC18F2320"),
        (0x2420, "PIC18F2420"),
        (0x2520, "PIC18F2520"),
        (0x2620, "PIC18F2620"),
        (0x4420, "PIC18F4420"),
        (0x4520, "PIC18F4520"),
        (0x4620, "PIC18F4620"),
        (0x6620, "PIC18F6620"),
        (0x6720, "PIC18F6720"),
        (0x8620, "PIC18F8620"),
        (0x8720, "PIC18F8720"),
    ])
});

/// Look up the catalog name for a processor code.
pub fn processor_name(code: u32) -> Option<&'static str>
{
    PROCESSORS.get(&code).copied()
}

/// Display form of a processor code, with the unknown-code fallback.
pub fn processor_display(code: u32) -> String
{
    match processor_name(code) {
        Some(name) => name.to_string(),
        None => {
            warn!(code, "processor code not in catalog");
            format!("unknown processor (0x{code:x})")
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_known_code()
    {
        assert_eq!(processor_name(0x9452), Some("PIC18F452"));
        assert_eq!(processor_display(0x9452), "PIC18F452");
    }

    #[test]
    fn test_unknown_code_renders_instead_of_failing()
    {
        assert_eq!(processor_name(0xdead), None);
        assert_eq!(processor_display(0xdead), "unknown processor (0xdead)");
    }
}
