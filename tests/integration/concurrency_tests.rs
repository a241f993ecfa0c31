//! Cross-thread behavior of the queue and the sharded map

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use wordindex::{BoundedQueue, Envelope, ShardedMap};

#[test]
fn test_sentinel_releases_every_consumer() {
    let queue: BoundedQueue<Envelope<u32>> = BoundedQueue::new(8);
    let consumed = AtomicUsize::new(0);

    thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                while queue.next_item().is_some() {
                    consumed.fetch_add(1, Ordering::Relaxed);
                }
            });
        }

        for i in 0..100 {
            queue.push_back(Envelope::Item(i));
        }
        queue.push_back(Envelope::Sentinel);
    });

    assert_eq!(consumed.load(Ordering::Relaxed), 100);
    // The sentinel was observed by every consumer but never removed
    assert_eq!(queue.len(), 1);
    assert!(queue.front().is_sentinel());
}

#[test]
fn test_consumers_blocked_before_sentinel_all_wake() {
    let queue: BoundedQueue<Envelope<u32>> = BoundedQueue::new(2);

    thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(|| queue.next_item()))
            .collect();

        // Give the consumers time to block on the empty queue
        thread::sleep(Duration::from_millis(50));
        queue.push_back(Envelope::Sentinel);

        for handle in handles {
            assert_eq!(handle.join().unwrap(), None);
        }
    });

    assert_eq!(queue.len(), 1);
}

#[test]
fn test_multi_producer_keeps_per_producer_order() {
    const PRODUCERS: usize = 4;
    const PER_PRODUCER: usize = 500;

    let queue: BoundedQueue<(usize, usize)> = BoundedQueue::new(16);
    let mut received = Vec::with_capacity(PRODUCERS * PER_PRODUCER);

    thread::scope(|s| {
        for producer in 0..PRODUCERS {
            let queue = &queue;
            s.spawn(move || {
                for seq in 0..PER_PRODUCER {
                    queue.push_back((producer, seq));
                }
            });
        }

        for _ in 0..PRODUCERS * PER_PRODUCER {
            received.push(queue.pop());
        }
    });

    assert!(queue.is_empty());
    assert_eq!(received.len(), PRODUCERS * PER_PRODUCER);
    for producer in 0..PRODUCERS {
        let seqs: Vec<usize> = received
            .iter()
            .filter(|(p, _)| *p == producer)
            .map(|(_, seq)| *seq)
            .collect();
        assert_eq!(seqs, (0..PER_PRODUCER).collect::<Vec<_>>());
    }
}

#[test]
fn test_queue_never_exceeds_capacity() {
    let queue: BoundedQueue<usize> = BoundedQueue::new(3);
    let max_seen = AtomicUsize::new(0);

    thread::scope(|s| {
        for p in 0..3 {
            let queue = &queue;
            s.spawn(move || {
                for i in 0..200 {
                    queue.push_back(p * 1000 + i);
                }
            });
        }

        for _ in 0..600 {
            max_seen.fetch_max(queue.len(), Ordering::Relaxed);
            queue.pop();
        }
    });

    assert!(max_seen.load(Ordering::Relaxed) <= 3);
}

#[test]
fn test_concurrent_increments_are_not_lost() {
    let map: ShardedMap<String, u64> = ShardedMap::with_shards(4);
    let words = ["the", "cat", "sat", "dog", "bird"];

    thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| {
                for _ in 0..250 {
                    for word in words {
                        map.upsert_or_increment(word.to_string(), 1);
                    }
                }
            });
        }
    });

    for word in words {
        assert_eq!(map.get(word).unwrap(), 2000);
    }
    assert_eq!(map.len(), words.len());
}

#[test]
fn test_snapshot_is_a_consistent_cut() {
    const KEYS: usize = 2000;
    let map: ShardedMap<usize, u64> = ShardedMap::with_shards(16);

    thread::scope(|s| {
        // Keys are inserted strictly in order by a single writer, so any
        // consistent snapshot holds exactly a prefix 0..n of them.
        s.spawn(|| {
            for key in 0..KEYS {
                map.upsert_or_increment(key, 1);
            }
        });

        for _ in 0..50 {
            let snap = map.snapshot();
            let n = snap.len();
            assert!((0..n).all(|key| snap.contains_key(&key)));
        }
    });

    assert_eq!(map.snapshot().len(), KEYS);
}
