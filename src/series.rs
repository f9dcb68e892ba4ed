//! Folds a stream of percentage samples into fixed-interval OHLC bars and the
//! indicators drawn under them.

use std::time::Duration;

pub const MA_SHORT: usize = 5;
pub const MA_LONG: usize = 10;
pub const EMA_FAST: usize = 12;
pub const EMA_SLOW: usize = 26;

/// One OHLC bar. Values are percentages; `timestamp` is when the bar opened, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KLine {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub timestamp: f64,
}

impl KLine {
    fn opened_at(value: f64, timestamp: f64) -> Self {
        Self {
            open: value,
            high: value,
            low: value,
            close: value,
            timestamp,
        }
    }

    pub fn is_rising(&self) -> bool {
        self.close > self.open
    }
}

/// Indicator values appended once per closed bar; the last entry of each sequence
/// belongs to the most recent closed bar.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorSeries {
    pub ma5: Vec<f64>,
    pub ma10: Vec<f64>,
    pub macd: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct SeriesAggregator {
    interval: f64,
    klines: Vec<KLine>,
    indicators: IndicatorSeries,
    current: Option<KLine>,
    ema_fast: f64,
    ema_slow: f64,
}

impl SeriesAggregator {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.as_secs_f64(),
            klines: Vec::new(),
            indicators: IndicatorSeries::default(),
            current: None,
            ema_fast: 0.0,
            ema_slow: 0.0,
        }
    }

    pub fn klines(&self) -> &[KLine] {
        &self.klines
    }

    pub fn indicators(&self) -> &IndicatorSeries {
        &self.indicators
    }

    /// The bar still accumulating samples, if any.
    pub fn open_bar(&self) -> Option<&KLine> {
        self.current.as_ref()
    }

    pub fn ingest(&mut self, value: f64, now_secs: f64) {
        let Some(mut bar) = self.current.take() else {
            self.current = Some(KLine::opened_at(value, now_secs));
            return;
        };

        bar.high = bar.high.max(value);
        bar.low = bar.low.min(value);

        if now_secs - bar.timestamp >= self.interval {
            // The rolling sample extends the closing wick but the body keeps the last
            // in-interval close; the sample then opens the next bar.
            self.klines.push(bar);
            self.update_indicators();
            self.current = Some(KLine::opened_at(value, now_secs));
        } else {
            bar.close = value;
            self.current = Some(bar);
        }
    }

    fn update_indicators(&mut self) {
        let count = self.klines.len();

        if let Some(ma) = trailing_mean(&self.klines, MA_SHORT) {
            self.indicators.ma5.push(ma);
        }
        if let Some(ma) = trailing_mean(&self.klines, MA_LONG) {
            self.indicators.ma10.push(ma);
        }

        if count > EMA_SLOW {
            let close = self.klines[count - 1].close;
            self.ema_fast = ema_step(self.ema_fast, close, EMA_FAST);
            self.ema_slow = ema_step(self.ema_slow, close, EMA_SLOW);
            self.indicators.macd.push(self.ema_fast - self.ema_slow);
        }
    }
}

fn trailing_mean(klines: &[KLine], period: usize) -> Option<f64> {
    if klines.len() < period {
        return None;
    }
    let sum: f64 = klines[klines.len() - period..].iter().map(|k| k.close).sum();
    Some(sum / period as f64)
}

pub fn ema_step(ema: f64, value: f64, period: usize) -> f64 {
    ema + (value - ema) * 2.0 / (period as f64 + 1.0)
}
