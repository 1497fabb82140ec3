pub mod constants;
pub mod env;
pub mod logger;

use std::time::Duration;

use reqwest::Client;
use rust_decimal::{Decimal, RoundingStrategy};

use self::constants::USER_AGENT;

pub fn round_to_decimals(input: Decimal, decimals: u32) -> Decimal {
    input.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero)
}

pub fn build_http_client(timeout_secs: u64) -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(timeout_secs))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rounds_midpoints_away_from_zero() {
        assert_eq!(round_to_decimals(dec!(0.12345), 4), dec!(0.1235));
        assert_eq!(round_to_decimals(dec!(10.005), 2), dec!(10.01));
        assert_eq!(round_to_decimals(dec!(9.9), 2), dec!(9.90));
    }
}
