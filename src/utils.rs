use crate::entities::StatusServerResponse;
use byte_unit::{Byte, UnitType};

impl StatusServerResponse {
    /// Download speed with a decimal unit, e.g. `98.77 KB/s`
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    #[must_use]
    pub fn calculate_speed(&self) -> String {
        let speed = Byte::from(self.speed.max(0.0).round() as u64);
        format!(
            "{:#.2}/s",
            speed.get_appropriate_unit(UnitType::Decimal)
        )
    }

    /// Download speed in Mbit/s, rounded to two decimals
    #[must_use]
    pub fn speed_mbit(&self) -> f64 {
        (self.speed * 8.0 / 10_000.0).round() / 100.0
    }

    /// `paused` and `downloading` are never both set by a well-behaved server
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        !(self.paused && self.downloading)
    }
}

/// Free space with a binary unit, e.g. `1.15 GiB`
#[must_use]
pub fn format_free_space(bytes: u64) -> String {
    format!(
        "{:#.2}",
        Byte::from(bytes).get_appropriate_unit(UnitType::Binary)
    )
}
