use crate::common::get_current_time_or_zero;
use log::{info, warn};
use parking_lot::Mutex;
use rand::rngs::OsRng;
use rand::Rng;

const NODE_ID_BITS: u64 = 10;
const SEQUENCE_BITS: u64 = 12;
const MAX_NODE_ID: u64 = (1 << NODE_ID_BITS) - 1;
const SEQUENCE_MASK: u64 = (1 << SEQUENCE_BITS) - 1;
const TIMESTAMP_LEFT_SHIFT: u64 = SEQUENCE_BITS + NODE_ID_BITS;
// 2010-11-04T01:42:54.657Z
const EPOCH: u64 = 1_288_834_974_657;

struct SnowflakeState {
    last_timestamp: u64,
    sequence: u64,
}

/// Generates time-ordered 63-bit ids.
///
/// Ids are laid out as `timestamp | node id | sequence`, so ids of one generator strictly
/// increase and keys built from them sort in insertion order.
pub struct SnowflakeIdGenerator {
    node_id: u64,
    state: Mutex<SnowflakeState>,
}

impl SnowflakeIdGenerator {
    pub fn new() -> Self {
        let mut node_id = Self::random_node_id();
        if node_id > MAX_NODE_ID {
            warn!("Node id can't be greater than {}", MAX_NODE_ID);
            node_id = OsRng.gen_range(1..=MAX_NODE_ID);
        }
        info!("Initialized id generator with node id: {}", node_id);

        SnowflakeIdGenerator {
            node_id,
            state: Mutex::new(SnowflakeState {
                last_timestamp: 0,
                sequence: 0,
            }),
        }
    }

    pub fn get_id(&self) -> i64 {
        let mut state = self.state.lock();
        let mut timestamp = (get_current_time_or_zero() as u64).max(EPOCH);

        if timestamp <= state.last_timestamp {
            // same millisecond or the clock moved backwards, stay on the last timestamp
            timestamp = state.last_timestamp;
            state.sequence = (state.sequence + 1) & SEQUENCE_MASK;
            if state.sequence == 0 {
                timestamp += 1;
            }
        } else {
            state.sequence = 0;
        }
        state.last_timestamp = timestamp;

        let id = ((timestamp - EPOCH) << TIMESTAMP_LEFT_SHIFT)
            | (self.node_id << SEQUENCE_BITS)
            | state.sequence;
        (id & i64::MAX as u64) as i64
    }

    fn random_node_id() -> u64 {
        let uuid = uuid::Uuid::new_v4();
        let uid = uuid.as_bytes();
        let rnd_byte = OsRng.gen::<u64>() & 0x000000FF;

        ((0x000000FF & uid[uid.len() - 1] as u64) | (0x0000FF00 & (rnd_byte << 8))) >> 6
    }
}

impl Default for SnowflakeIdGenerator {
    fn default() -> Self {
        SnowflakeIdGenerator::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn generates_strictly_increasing_ids() {
        let generator = SnowflakeIdGenerator::new();
        let ids: Vec<i64> = (0..10_000).map(|_| generator.get_id()).collect();
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(ids.iter().all(|id| *id > 0));
    }

    #[test]
    fn embeds_node_id_and_timestamp() {
        let generator = SnowflakeIdGenerator::new();
        let before = get_current_time_or_zero() as u64;
        let id = generator.get_id() as u64;

        assert_eq!((id >> SEQUENCE_BITS) & MAX_NODE_ID, generator.node_id);
        assert!((id >> TIMESTAMP_LEFT_SHIFT) + EPOCH >= before);
    }

    #[test]
    fn survives_clock_moving_backwards() {
        let generator = SnowflakeIdGenerator::new();
        let ahead = get_current_time_or_zero() as u64 + 1_000;
        generator.state.lock().last_timestamp = ahead;

        let first = generator.get_id();
        let second = generator.get_id();
        assert!(second > first);
        assert_eq!(((first as u64) >> TIMESTAMP_LEFT_SHIFT) + EPOCH, ahead);
    }

    #[test]
    fn concurrent_generation_yields_unique_ids() {
        let generator = Arc::new(SnowflakeIdGenerator::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let generator = Arc::clone(&generator);
                thread::spawn(move || (0..1_000).map(|_| generator.get_id()).collect::<Vec<_>>())
            })
            .collect();

        let mut ids: Vec<i64> = handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }
}
