//! Coverage of batch-means confidence intervals on i.i.d. data.

use queuesim_rng::{RandomStreams, StreamId};
use queuesim_validation::{select_batch_count, BatchMeansSample};

const OBSERVATIONS: usize = 6400;
const BATCHES: usize = 64;
const REPETITIONS: u8 = 100;
const MEAN: f64 = 5.0;

fn exponential_sample(streams: &mut RandomStreams, stream: StreamId) -> Vec<f64> {
    let mut s = streams.stream(stream);
    (0..OBSERVATIONS).map(|_| s.exponential(MEAN)).collect()
}

#[test]
fn test_interval_covers_exponential_mean() {
    // One planted seed, one stream per repetition.
    let mut streams = RandomStreams::new(20_240_501);
    let mut covered = 0;
    for rep in 0..REPETITIONS {
        let data = exponential_sample(&mut streams, StreamId(rep));
        let sample = BatchMeansSample::new(&data, BATCHES, 0.95);
        assert_eq!(sample.effective_batches(), BATCHES);
        if sample.brackets(MEAN) {
            covered += 1;
        }
    }
    assert!(covered >= 90, "only {covered}/{REPETITIONS} intervals covered {MEAN}");
}

#[test]
fn test_iid_batch_means_are_nearly_uncorrelated() {
    let mut streams = RandomStreams::new(7);
    let data = exponential_sample(&mut streams, StreamId(0));
    let sample = BatchMeansSample::new(&data, BATCHES, 0.95);
    assert!(sample.autocorr_lag1.abs() < 0.4);
    assert!((sample.mean - MEAN).abs() < 0.5);

    let k = select_batch_count([data.as_slice()], &[32, 64, 128]).unwrap();
    assert!([32, 64, 128].contains(&k));
}
