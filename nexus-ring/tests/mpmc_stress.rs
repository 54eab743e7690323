use std::sync::Arc;
use std::thread;

use nexus_ring::{Produce, mpmc::SlotQueue};

// =============================================================================
// Helpers
// =============================================================================

fn tag(producer: u64, seq: u64) -> u64 {
    (producer << 32) | seq
}

fn untag(value: u64) -> (u64, u64) {
    (value >> 32, value & 0xFFFF_FFFF)
}

/// Spreads one logical value over a full cache line so a torn read shows up as
/// mismatched lanes.
#[derive(Clone, Copy, Debug)]
struct Wide {
    lanes: [u64; 7],
    check: u64,
}

impl Wide {
    fn new(value: u64) -> Self {
        let lanes = [value; 7];
        Self {
            lanes,
            check: lanes.iter().fold(0u64, |acc, l| acc.rotate_left(5) ^ l),
        }
    }

    fn verify(&self) -> u64 {
        let first = self.lanes[0];
        assert!(self.lanes.iter().all(|&l| l == first), "torn lanes: {self:?}");
        let check = self.lanes.iter().fold(0u64, |acc, l| acc.rotate_left(5) ^ l);
        assert_eq!(check, self.check, "bad checksum: {self:?}");
        first
    }
}

// =============================================================================
// Loss and duplication
// =============================================================================

fn run_no_loss(producers: u64, consumers: u64, per_producer: u64, capacity: usize) {
    let queue = Arc::new(SlotQueue::<u64>::new(capacity).unwrap());
    let total = producers * per_producer;
    assert_eq!(total % consumers, 0);
    let per_consumer = total / consumers;

    let producer_handles: Vec<_> = (0..producers)
        .map(|p| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for seq in 0..per_producer {
                    queue.produce(tag(p, seq)).unwrap();
                }
            })
        })
        .collect();

    let consumer_handles: Vec<_> = (0..consumers)
        .map(|_| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                (0..per_consumer)
                    .map(|_| queue.consume().unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    for h in producer_handles {
        h.join().unwrap();
    }

    let mut seen: Vec<u64> = consumer_handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();

    assert_eq!(seen.len() as u64, total);
    seen.sort_unstable();

    let mut expected: Vec<u64> = (0..producers)
        .flat_map(|p| (0..per_producer).map(move |seq| tag(p, seq)))
        .collect();
    expected.sort_unstable();

    assert_eq!(seen, expected, "values lost or duplicated");
    assert!(queue.is_empty());
    assert!(!queue.is_wedged());
}

#[test]
fn one_to_one() {
    run_no_loss(1, 1, 100_000, 64);
}

#[test]
fn four_to_four() {
    run_no_loss(4, 4, 25_000, 64);
}

#[test]
fn many_producers_one_consumer() {
    run_no_loss(8, 1, 10_000, 64);
}

#[test]
fn one_producer_many_consumers() {
    run_no_loss(1, 8, 80_000, 64);
}

#[test]
fn oversubscribed_small_ring() {
    let threads = thread::available_parallelism().map_or(4, |n| n.get() as u64) * 2;
    run_no_loss(threads, threads, 5_000, 64);
}

// =============================================================================
// Ordering
// =============================================================================

#[test]
fn per_producer_order_with_single_consumer() {
    const PRODUCERS: u64 = 4;
    const PER_PRODUCER: u64 = 50_000;

    let queue = Arc::new(SlotQueue::<u64>::new(64).unwrap());

    let handles: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for seq in 0..PER_PRODUCER {
                    queue.produce(tag(p, seq)).unwrap();
                }
            })
        })
        .collect();

    // Tickets are handed out in program order per producer, and a single
    // consumer drains tickets in order.
    let mut next = [0u64; PRODUCERS as usize];
    for _ in 0..PRODUCERS * PER_PRODUCER {
        let (p, seq) = untag(queue.consume().unwrap());
        assert_eq!(seq, next[p as usize], "producer {p} out of order");
        next[p as usize] += 1;
    }

    for h in handles {
        h.join().unwrap();
    }
    assert!(next.iter().all(|&n| n == PER_PRODUCER));
}

#[test]
fn wide_elements_are_never_torn() {
    const PRODUCERS: u64 = 3;
    const CONSUMERS: u64 = 3;
    const PER_PRODUCER: u64 = 30_000;

    let queue = Arc::new(SlotQueue::<Wide>::new(64).unwrap());

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for seq in 0..PER_PRODUCER {
                    queue.produce(Wide::new(tag(p, seq))).unwrap();
                }
            })
        })
        .collect();

    let consumers: Vec<_> = (0..CONSUMERS)
        .map(|_| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                let mut sum = 0u64;
                for _ in 0..PRODUCERS * PER_PRODUCER / CONSUMERS {
                    sum = sum.wrapping_add(queue.consume().unwrap().verify());
                }
                sum
            })
        })
        .collect();

    for h in producers {
        h.join().unwrap();
    }
    let sum = consumers
        .into_iter()
        .fold(0u64, |acc, h| acc.wrapping_add(h.join().unwrap()));

    let expected = (0..PRODUCERS)
        .flat_map(|p| (0..PER_PRODUCER).map(move |seq| tag(p, seq)))
        .fold(0u64, u64::wrapping_add);
    assert_eq!(sum, expected);
}

// =============================================================================
// Argument shapes under contention
// =============================================================================

#[test]
fn mixed_insertion_paths() {
    const PER_PATH: u64 = 10_000;

    let queue = Arc::new(SlotQueue::<String>::new(64).unwrap());

    let movers = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            for i in 0..PER_PATH {
                queue.produce(format!("m{i}")).unwrap();
            }
        })
    };
    let cloners = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            for i in 0..PER_PATH {
                let value = format!("c{i}");
                queue.produce_cloned(&value).unwrap();
            }
        })
    };
    let emplacers = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            for i in 0..PER_PATH {
                queue.emplace_from(format!("e{i}").as_str()).unwrap();
            }
        })
    };

    let mut counts = [0u64; 3];
    for _ in 0..3 * PER_PATH {
        let s = queue.consume().unwrap();
        match s.as_bytes()[0] {
            b'm' => counts[0] += 1,
            b'c' => counts[1] += 1,
            b'e' => counts[2] += 1,
            other => panic!("unexpected prefix {other}"),
        }
    }

    movers.join().unwrap();
    cloners.join().unwrap();
    emplacers.join().unwrap();

    assert_eq!(counts, [PER_PATH; 3]);
}

#[test]
fn drops_unconsumed_values_with_ring() {
    let marker = Arc::new(());
    {
        let queue = SlotQueue::<Arc<()>>::new(64).unwrap();
        for _ in 0..40 {
            queue.produce(Arc::clone(&marker)).unwrap();
        }
        for _ in 0..10 {
            drop(queue.consume().unwrap());
        }
        assert_eq!(Arc::strong_count(&marker), 31);
    }
    assert_eq!(Arc::strong_count(&marker), 1);
}
