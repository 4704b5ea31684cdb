use rust_decimal::Decimal;

use crate::models::history::PriceHistoryPoint;
use crate::models::indicators::TechnicalIndicators;

/// Fewest bars for which indicators are reported.
pub const MIN_POINTS: usize = 20;

pub const RSI_PERIOD: usize = 14;

/// Decimal places kept in reported indicator values.
const DISPLAY_DP: u32 = 2;

/// Simple moving averages and RSI over a short daily window.
pub struct IndicatorService;

impl IndicatorService {
    pub fn new() -> Self {
        Self
    }

    /// Latest SMA(10), SMA(14), SMA(20) and RSI(14) for bars ordered oldest
    /// first. Returns None with fewer than 20 bars.
    pub fn calculate(&self, history: &[PriceHistoryPoint]) -> Option<TechnicalIndicators> {
        if history.len() < MIN_POINTS {
            return None;
        }
        let closes: Vec<Decimal> = history.iter().map(|p| p.close).collect();
        let current_price = *closes.last()?;

        Some(TechnicalIndicators {
            sma_10: sma(&closes, 10)?.round_dp(DISPLAY_DP),
            sma_14: sma(&closes, 14)?.round_dp(DISPLAY_DP),
            sma_20: sma(&closes, 20)?.round_dp(DISPLAY_DP),
            rsi_14: rsi(&closes, RSI_PERIOD)?.round_dp(DISPLAY_DP),
            current_price: current_price.round_dp(DISPLAY_DP),
        })
    }
}

impl Default for IndicatorService {
    fn default() -> Self {
        Self::new()
    }
}

/// Mean of the trailing `window` values. None if there are fewer.
pub fn sma(values: &[Decimal], window: usize) -> Option<Decimal> {
    if window == 0 || values.len() < window {
        return None;
    }
    let sum: Decimal = values[values.len() - window..].iter().sum();
    Some(sum / Decimal::from(window))
}

/// Relative strength index over the trailing `period` close-to-close changes.
///
/// Average gain and average loss are plain means over the window (each
/// change counts toward one side, zero toward neither). Then
/// `RSI = 100 − 100 / (1 + gain / loss)`, with two edge cases:
/// no losses but some gains → 100; no movement at all → 0.
///
/// Needs `period + 1` values; None otherwise.
pub fn rsi(values: &[Decimal], period: usize) -> Option<Decimal> {
    if period == 0 || values.len() < period + 1 {
        return None;
    }

    let window = &values[values.len() - (period + 1)..];
    let (gains, losses) = window
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold((Decimal::ZERO, Decimal::ZERO), |(g, l), delta| {
            if delta > Decimal::ZERO {
                (g + delta, l)
            } else {
                (g, l - delta)
            }
        });

    let n = Decimal::from(period);
    let avg_gain = gains / n;
    let avg_loss = losses / n;

    if avg_loss.is_zero() {
        return Some(if avg_gain.is_zero() {
            Decimal::ZERO
        } else {
            Decimal::ONE_HUNDRED
        });
    }

    let rs = avg_gain / avg_loss;
    Some(Decimal::ONE_HUNDRED - Decimal::ONE_HUNDRED / (Decimal::ONE + rs))
}
