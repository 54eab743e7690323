use std::thread;

use nexus_ring::spsc::{self, ConsumeError};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Both threads replay the same generator, so the consumer knows exactly what
/// every record should contain.
struct Records {
    rng: SmallRng,
    max_len: usize,
}

impl Records {
    fn new(seed: u64, max_len: usize) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            max_len,
        }
    }

    fn next_into(&mut self, buf: &mut Vec<u8>) {
        let len = self.rng.gen_range(1..=self.max_len);
        buf.resize(len, 0);
        self.rng.fill(&mut buf[..]);
    }
}

fn run_fifo(capacity: usize, count: usize, seed: u64) {
    let (tx, rx) = spsc::channel(capacity).unwrap();
    let max_len = tx.max_record_len();

    let producer = thread::spawn(move || {
        let mut records = Records::new(seed, max_len);
        let mut buf = Vec::new();
        for _ in 0..count {
            records.next_into(&mut buf);
            tx.produce(&buf).unwrap();
        }
    });

    let mut records = Records::new(seed, max_len);
    let mut expected = Vec::new();
    let mut out = vec![0u8; max_len];

    for i in 0..count {
        records.next_into(&mut expected);
        let n = rx.consume(&mut out).unwrap();
        assert_eq!(n, expected.len(), "record {i} length");
        assert_eq!(&out[..n], expected.as_slice(), "record {i} payload");
    }

    producer.join().unwrap();
    assert_eq!(rx.consume(&mut out), Err(ConsumeError::Disconnected));
}

#[test]
fn fifo_random_lengths_small_ring() {
    run_fifo(256, 200_000, 1);
}

#[test]
fn fifo_random_lengths_single_line_ring() {
    run_fifo(64, 100_000, 2);
}

#[test]
fn fifo_random_lengths_large_ring() {
    run_fifo(64 * 1024, 200_000, 3);
}

#[test]
fn zero_copy_consumer_matches() {
    const COUNT: usize = 100_000;
    const SEED: u64 = 4;

    let (tx, mut rx) = spsc::channel(4096).unwrap();
    let max_len = 300;

    let producer = thread::spawn(move || {
        let mut records = Records::new(SEED, max_len);
        let mut buf = Vec::new();
        for _ in 0..COUNT {
            records.next_into(&mut buf);
            tx.produce(&buf).unwrap();
        }
    });

    let mut records = Records::new(SEED, max_len);
    let mut expected = Vec::new();
    let mut seen = 0;

    while seen < COUNT {
        records.next_into(&mut expected);
        loop {
            if let Some(matched) = rx.consume_with(|payload| payload == expected.as_slice()) {
                assert!(matched, "record {seen} mismatch");
                break;
            }
            std::hint::spin_loop();
        }
        seen += 1;
    }

    producer.join().unwrap();
    assert!(rx.is_empty());
}

#[test]
fn try_paths_spin_externally() {
    const COUNT: u64 = 100_000;

    let (tx, rx) = spsc::channel(512).unwrap();

    let producer = thread::spawn(move || {
        for i in 0..COUNT {
            let bytes = i.to_le_bytes();
            let len = 1 + (i as usize % bytes.len());
            while tx.try_produce(&bytes[..len]).is_err() {
                std::hint::spin_loop();
            }
        }
    });

    let mut out = [0u8; 8];
    for i in 0..COUNT {
        let n = loop {
            match rx.try_consume(&mut out).unwrap() {
                0 => std::hint::spin_loop(),
                n => break n,
            }
        };
        let bytes = i.to_le_bytes();
        assert_eq!(&out[..n], &bytes[..1 + (i as usize % 8)]);
    }

    producer.join().unwrap();
}

#[test]
fn typed_values_in_order() {
    const COUNT: u64 = 200_000;

    let (tx, rx) = spsc::channel(1024).unwrap();

    let producer = thread::spawn(move || {
        for i in 0..COUNT {
            tx.produce_value(&i).unwrap();
            tx.produce_value(&[i as u32, !(i as u32)]).unwrap();
        }
    });

    for i in 0..COUNT {
        assert_eq!(rx.consume_value::<u64>().unwrap(), i);
        assert_eq!(rx.consume_value::<[u32; 2]>().unwrap(), [i as u32, !(i as u32)]);
    }

    producer.join().unwrap();
    assert_eq!(rx.consume_value::<u64>(), Err(ConsumeError::Disconnected));
}
