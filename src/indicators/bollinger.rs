pub const BOLLINGER_PERIOD: usize = 20;
pub const BOLLINGER_STD_DEV: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerBands {
    pub upper: f64,
    /// SMA of the window
    pub middle: f64,
    pub lower: f64,
}

impl BollingerBands {
    /// Where `price` sits between the bands, 0 at `lower` and 1 at `upper`
    ///
    /// `None` when the bands have collapsed onto each other.
    pub fn position(&self, price: f64) -> Option<f64> {
        let width = self.upper - self.lower;
        if width > 0.0 {
            Some((price - self.lower) / width)
        } else {
            None
        }
    }
}

/// Bollinger Bands over the most recent `period` prices
///
/// Middle band is the SMA, the outer bands sit `num_std` sample standard
/// deviations away from it.
pub fn calculate_bollinger_bands(
    prices: &[f64],
    period: usize,
    num_std: f64,
) -> Option<BollingerBands> {
    if period < 2 || prices.len() < period {
        return None;
    }

    let window = &prices[prices.len() - period..];
    let middle = window.iter().sum::<f64>() / period as f64;
    let variance =
        window.iter().map(|p| (p - middle).powi(2)).sum::<f64>() / (period - 1) as f64;
    let band = variance.sqrt() * num_std;

    Some(BollingerBands {
        upper: middle + band,
        middle,
        lower: middle - band,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bands() {
        // mean 3, sample std sqrt(2.5)
        let bands = calculate_bollinger_bands(&[1.0, 2.0, 3.0, 4.0, 5.0], 5, 2.0).unwrap();
        let band = 2.5f64.sqrt() * 2.0;

        assert_eq!(bands.middle, 3.0);
        assert!((bands.upper - (3.0 + band)).abs() < 1e-12);
        assert!((bands.lower - (3.0 - band)).abs() < 1e-12);
        assert!((bands.position(3.0).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_uses_latest_window() {
        let bands = calculate_bollinger_bands(&[1000.0, 10.0, 10.0, 10.0], 3, 2.0).unwrap();
        assert_eq!(bands.middle, 10.0);
        assert_eq!(bands.upper, 10.0);
        assert!(bands.position(10.0).is_none());
    }

    #[test]
    fn test_insufficient_data() {
        assert!(
            calculate_bollinger_bands(&[1.0; 19], BOLLINGER_PERIOD, BOLLINGER_STD_DEV).is_none()
        );
        assert!(calculate_bollinger_bands(&[1.0; 5], 1, BOLLINGER_STD_DEV).is_none());
    }
}
