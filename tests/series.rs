use mirage::series::{ema_step, SeriesAggregator, EMA_FAST, EMA_SLOW};
use std::time::Duration;

fn aggregator() -> SeriesAggregator {
    SeriesAggregator::new(Duration::from_secs(1))
}

#[test]
fn rollover_sample_opens_the_next_bar() {
    let mut agg = aggregator();
    for (value, t) in [(10.0, 0.0), (20.0, 0.2), (30.0, 0.4), (40.0, 0.6), (50.0, 1.1)] {
        agg.ingest(value, t);
    }

    let bars = agg.klines();
    assert_eq!(bars.len(), 1);
    let bar = bars[0];
    assert_eq!((bar.open, bar.high, bar.low, bar.close), (10.0, 50.0, 10.0, 40.0));
    assert_eq!(bar.timestamp, 0.0);
    assert!(agg.indicators().ma5.is_empty());
    assert!(agg.indicators().ma10.is_empty());
    assert_eq!(agg.open_bar().map(|b| b.open), Some(50.0));
}

#[test]
fn every_closed_bar_brackets_open_and_close() {
    let mut agg = aggregator();
    let samples = [55.0, 12.0, 80.0, 33.0, 90.0, 1.0, 47.0, 66.0, 5.0, 99.0, 20.0, 70.0];
    for (i, value) in samples.iter().enumerate() {
        agg.ingest(*value, i as f64 * 0.4);
    }

    assert!(!agg.klines().is_empty());
    for bar in agg.klines() {
        assert!(bar.low <= bar.open.min(bar.close));
        assert!(bar.high >= bar.open.max(bar.close));
    }
    let stamps: Vec<f64> = agg.klines().iter().map(|b| b.timestamp).collect();
    assert!(stamps.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn indicator_lengths_track_bar_count() {
    let mut agg = aggregator();
    for i in 0..40 {
        agg.ingest(50.0 + (i % 7) as f64, i as f64);
        let bars = agg.klines().len();
        let ind = agg.indicators();
        assert_eq!(ind.ma5.len(), bars.saturating_sub(4));
        assert_eq!(ind.ma10.len(), bars.saturating_sub(9));
        assert_eq!(ind.macd.len(), bars.saturating_sub(EMA_SLOW));
    }
}

#[test]
fn macd_starts_from_zero_emas() {
    let mut agg = aggregator();
    for i in 0..=27 {
        agg.ingest(100.0, i as f64);
    }

    assert_eq!(agg.klines().len(), 27);
    let expected = ema_step(0.0, 100.0, EMA_FAST) - ema_step(0.0, 100.0, EMA_SLOW);
    assert_eq!(agg.indicators().macd.len(), 1);
    assert!((agg.indicators().macd[0] - expected).abs() < 1e-9);
}
