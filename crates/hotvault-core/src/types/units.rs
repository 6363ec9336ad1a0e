//! Chain time and capacity units.

/// Length of one epoch in seconds.
pub const EPOCH_DURATION_SECONDS: u64 = 30;

/// Epochs in one day at 30-second epochs.
pub const EPOCHS_PER_DAY: u64 = 2880;

/// Days in a billing month.
pub const DAYS_PER_MONTH: u64 = 30;

/// Epochs in a billing month.
pub const EPOCHS_PER_MONTH: u64 = EPOCHS_PER_DAY * DAYS_PER_MONTH;

/// Bytes in one KiB.
pub const KIB: u64 = 1 << 10;

/// Bytes in one MiB.
pub const MIB: u64 = 1 << 20;

/// Bytes in one GiB.
pub const GIB: u64 = 1 << 30;

/// Bytes in one TiB. Prices are quoted per TiB.
pub const TIB: u64 = 1 << 40;

/// Decimals of the payment token (USDFC).
pub const TOKEN_DECIMALS: u32 = 18;

/// Render a byte count with a binary unit suffix.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [(u64, &str); 4] = [(TIB, "TiB"), (GIB, "GiB"), (MIB, "MiB"), (KIB, "KiB")];
    for (size, suffix) in UNITS {
        if bytes >= size {
            return format!("{:.2} {}", bytes as f64 / size as f64, suffix);
        }
    }
    format!("{bytes} B")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epochs_per_month() {
        assert_eq!(EPOCHS_PER_MONTH, 86_400);
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(10 * GIB), "10.00 GiB");
        assert_eq!(format_bytes(3 * MIB / 2), "1.50 MiB");
    }
}
