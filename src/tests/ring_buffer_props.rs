//! Property tests for the fixed-point history buffer.

use boatdata_lib::ring_buffer::{BufferMeta, RingBuffer};
use boatdata_lib::ValueFormat;
use proptest::prelude::*;

/// `None` entries become gaps in the buffer.
fn fill(capacity: usize, samples: &[Option<u16>]) -> RingBuffer<u16> {
    let mut buf = RingBuffer::new(capacity);
    for sample in samples {
        match sample {
            Some(v) => buf.add(*v),
            None => buf.add_missing(),
        }
    }
    buf
}

fn sample() -> impl Strategy<Value = Option<u16>> {
    prop::option::weighted(0.85, 0u16..u16::MAX)
}

proptest! {
    /// The buffer holds exactly the newest `capacity` entries, oldest first.
    #[test]
    fn keeps_newest_entries_in_order(
        capacity in 1usize..48,
        samples in prop::collection::vec(sample(), 0..160),
    ) {
        let buf = fill(capacity, &samples);
        let kept = samples.len().min(capacity);
        let expected = &samples[samples.len() - kept..];

        prop_assert_eq!(buf.len(), kept);
        prop_assert_eq!(buf.values(), expected.to_vec());
        prop_assert_eq!(buf.total_added(), samples.len() as u64);
        prop_assert_eq!(buf.is_full(), samples.len() >= capacity);
    }

    /// Windowed statistics only see real samples of the window.
    #[test]
    fn statistics_skip_sentinel(
        capacity in 1usize..48,
        samples in prop::collection::vec(sample(), 1..160),
        amount in 1usize..64,
    ) {
        let buf = fill(capacity, &samples);
        let window: Vec<u16> = buf.values_of_last(amount).into_iter().flatten().collect();

        prop_assert_eq!(buf.min_of_last(amount), window.iter().copied().min());
        prop_assert_eq!(buf.max_of_last(amount), window.iter().copied().max());
        prop_assert!(window.iter().all(|&v| v != u16::MAX));

        match (buf.mid_of_last(amount), buf.median_of_last(amount)) {
            (Some(mid), Some(median)) => {
                let lo = f64::from(*window.iter().min().unwrap());
                let hi = f64::from(*window.iter().max().unwrap());
                prop_assert!((mid - (lo + hi) / 2.0).abs() < 1e-9);
                prop_assert!(median >= lo && median <= hi);
            }
            (None, None) => prop_assert!(window.is_empty()),
            other => prop_assert!(false, "mid and median disagree: {:?}", other),
        }
    }

    /// SI samples come back within half a fixed-point step; out of domain is refused.
    #[test]
    fn add_si_respects_domain(values in prop::collection::vec(-10.0f64..80.0, 1..50)) {
        let meta = BufferMeta {
            name: "TWS".to_string(),
            format: ValueFormat::Knots,
            update_ms: 1000,
            multiplier: 1000.0,
            min: 0.0,
            max: 65.0,
        };
        let mut buf = RingBuffer::<u16>::with_meta(64, meta);
        let mut accepted = Vec::new();
        for v in values {
            let inside = (0.0..=65.0).contains(&v);
            prop_assert_eq!(buf.add_si(v), inside);
            if inside {
                accepted.push(v);
            }
        }

        prop_assert_eq!(buf.len(), accepted.len());
        for (i, v) in accepted.iter().enumerate() {
            let back = buf.get_si(i).unwrap();
            prop_assert!((back - v).abs() <= 0.0005 + 1e-12);
        }
    }
}

#[test]
fn alternating_samples_mid_and_median() {
    let meta = BufferMeta {
        name: "STW".to_string(),
        format: ValueFormat::Knots,
        update_ms: 1000,
        multiplier: 10.0,
        min: 0.0,
        max: 65.0,
    };
    let mut buf = RingBuffer::<u16>::with_meta(100, meta);
    for i in 0..100 {
        assert!(buf.add_si(if i % 2 == 0 { 5.0 } else { 6.0 }));
    }

    let mid = buf.mid_of_last(50).unwrap();
    let median = buf.median_of_last(50).unwrap();
    assert!((buf.to_si(mid) - 5.5).abs() < 1e-9);
    assert!((buf.to_si(median) - 5.5).abs() < 1e-9);
    assert_eq!(buf.min_of_last(50), Some(50));
    assert_eq!(buf.max_of_last(50), Some(60));
}
