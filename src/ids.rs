//! Session identifiers and cosmetic nicknames.

use std::time::{Duration, SystemTime};

use rand::seq::SliceRandom;
use rand::Rng;

use crate::errors::SessionError;

/// Exclusive upper bound for the random id suffix.
const MAX_SUFFIX: u32 = 99_999;

/// Curated, easy-to-spell descriptors (adjectives and present participles).
pub const DESCRIPTORS: &[&str] = &[
    "agile", "brave", "bright", "calm", "clever", "crisp", "eager", "fierce",
    "gentle", "golden", "happy", "jolly", "keen", "lively", "lucky", "mellow",
    "nimble", "noble", "quick", "quiet", "rapid", "rugged", "sharp", "silent",
    "smooth", "snappy", "solid", "speedy", "steady", "sunny", "swift", "wise",
    "blazing", "buzzing", "dancing", "dashing", "drifting", "flying", "glowing",
    "howling", "jumping", "leaping", "racing", "roaming", "sailing", "soaring",
    "sprinting", "wandering",
];

/// One-word animal names, easy to spell.
pub const ANIMALS: &[&str] = &[
    "badger", "bear", "bison", "crane", "crow", "deer", "dolphin", "eagle",
    "falcon", "ferret", "finch", "fox", "gecko", "goose", "hare", "hawk",
    "heron", "hound", "ibex", "jaguar", "jay", "koala", "lemur", "lynx",
    "magpie", "marten", "moose", "otter", "owl", "panda", "panther", "pelican",
    "penguin", "puma", "rabbit", "raven", "robin", "salmon", "seal", "sparrow",
    "swan", "tiger", "trout", "turtle", "walrus", "weasel", "wolf", "wombat",
];

/// New session id of the form `{wall_clock_nanos}-{suffix:05}`.
///
/// Uniqueness is probabilistic; no collision check is performed.
pub fn new_session_id() -> String {
    session_id_with(&mut rand::thread_rng())
}

pub fn session_id_with<R: Rng>(rng: &mut R) -> String {
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
        .as_nanos();
    format!("{}-{:05}", nanos, rng.gen_range(0..MAX_SUFFIX))
}

/// Two-word nickname like "jumping rabbit" from the default pools.
pub fn new_nickname() -> String {
    nickname_from(DESCRIPTORS, ANIMALS, &mut rand::thread_rng())
        .unwrap_or_else(|_| "swift otter".to_string())
}

/// Uniform pick from each pool, joined by a single space.
pub fn nickname_from<R: Rng>(
    descriptors: &[&str],
    animals: &[&str],
    rng: &mut R,
) -> Result<String, SessionError> {
    let descriptor = descriptors.choose(rng).ok_or_else(|| {
        SessionError::InvalidArgument("nickname descriptor pool must be non-empty".to_string())
    })?;
    let animal = animals.choose(rng).ok_or_else(|| {
        SessionError::InvalidArgument("nickname animal pool must be non-empty".to_string())
    })?;
    Ok(format!("{descriptor} {animal}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_session_id_shape() {
        let id = new_session_id();
        let (nanos, suffix) = id.split_once('-').expect("dash separator");
        assert!(nanos.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(suffix.len(), 5);
        assert!(suffix.chars().all(|c| c.is_ascii_digit()));
        assert!(suffix.parse::<u32>().unwrap() < MAX_SUFFIX);
    }

    #[test]
    fn test_session_id_suffix_zero_padded() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..64 {
            let id = session_id_with(&mut rng);
            let suffix = id.rsplit_once('-').unwrap().1;
            assert_eq!(suffix.len(), 5);
        }
    }

    #[test]
    fn test_nickname_from_default_pools() {
        let mut rng = StdRng::seed_from_u64(42);
        let nick = nickname_from(DESCRIPTORS, ANIMALS, &mut rng).unwrap();
        let mut words = nick.split(' ');
        let d = words.next().unwrap();
        let a = words.next().unwrap();
        assert!(words.next().is_none());
        assert!(DESCRIPTORS.contains(&d));
        assert!(ANIMALS.contains(&a));
    }

    #[test]
    fn test_nickname_empty_pool_is_invalid() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = nickname_from(&[], ANIMALS, &mut rng).unwrap_err();
        assert!(matches!(err, SessionError::InvalidArgument(_)));
        let err = nickname_from(DESCRIPTORS, &[], &mut rng).unwrap_err();
        assert!(matches!(err, SessionError::InvalidArgument(_)));
    }

    #[test]
    fn test_nickname_deterministic_with_seeded_rng() {
        let a = nickname_from(DESCRIPTORS, ANIMALS, &mut StdRng::seed_from_u64(9)).unwrap();
        let b = nickname_from(DESCRIPTORS, ANIMALS, &mut StdRng::seed_from_u64(9)).unwrap();
        assert_eq!(a, b);
    }
}
