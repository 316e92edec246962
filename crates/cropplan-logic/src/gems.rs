//! Peridot gem qualities and their fortune values.
//!
//! Gem fortune scales with both gem quality and the rarity of the item the
//! gem is socketed into. Accessories only receive half of the socketed gem
//! fortune.

use serde::{Deserialize, Serialize};

use crate::rarity::Rarity;

/// Gem quality ladder, lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GemQuality {
    Rough,
    Flawed,
    Fine,
    Flawless,
    Perfect,
}

impl GemQuality {
    /// All qualities in ascending order.
    pub const ALL: [GemQuality; 5] = [
        GemQuality::Rough,
        GemQuality::Flawed,
        GemQuality::Fine,
        GemQuality::Flawless,
        GemQuality::Perfect,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GemQuality::Rough => "Rough",
            GemQuality::Flawed => "Flawed",
            GemQuality::Fine => "Fine",
            GemQuality::Flawless => "Flawless",
            GemQuality::Perfect => "Perfect",
        }
    }

    /// The next quality up, if any.
    pub fn next(self) -> Option<GemQuality> {
        let idx = GemQuality::ALL.iter().position(|q| *q == self)?;
        GemQuality::ALL.get(idx + 1).copied()
    }

    /// Consumable item id for a gem of this quality.
    pub fn item_id(self) -> String {
        format!("{}_PERIDOT_GEM", self.name().to_uppercase())
    }
}

/// Fraction of gem fortune applied when socketed into an accessory.
pub const ACCESSORY_GEM_FACTOR: f64 = 0.5;

/// Fortune granted by one socketed peridot gem of the given quality on an
/// item of the given rarity. Monotonic in both axes.
pub fn gem_fortune(rarity: Rarity, quality: GemQuality) -> f64 {
    let by_rarity: [f64; 6] = match quality {
        GemQuality::Rough => [0.5, 0.5, 1.0, 1.0, 1.5, 2.0],
        GemQuality::Flawed => [1.0, 1.0, 2.0, 3.0, 4.0, 5.0],
        GemQuality::Fine => [2.0, 2.0, 3.0, 4.0, 5.0, 6.0],
        GemQuality::Flawless => [3.0, 4.0, 5.0, 6.0, 8.0, 9.0],
        GemQuality::Perfect => [4.0, 5.0, 7.0, 8.0, 10.0, 12.0],
    };
    let idx = Rarity::ALL.iter().position(|r| *r == rarity).unwrap_or(0);
    by_rarity[idx]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_steps() {
        assert_eq!(GemQuality::Rough.next(), Some(GemQuality::Flawed));
        assert_eq!(GemQuality::Perfect.next(), None);
        assert_eq!(GemQuality::Fine.item_id(), "FINE_PERIDOT_GEM");
    }

    #[test]
    fn fortune_monotonic_in_quality() {
        for rarity in Rarity::ALL {
            for pair in GemQuality::ALL.windows(2) {
                assert!(
                    gem_fortune(rarity, pair[0]) <= gem_fortune(rarity, pair[1]),
                    "quality step must not lose fortune at {rarity:?}"
                );
            }
        }
    }

    #[test]
    fn fortune_monotonic_in_rarity() {
        for quality in GemQuality::ALL {
            for pair in Rarity::ALL.windows(2) {
                assert!(
                    gem_fortune(pair[0], quality) <= gem_fortune(pair[1], quality),
                    "rarity step must not lose fortune for {quality:?}"
                );
            }
        }
    }

    #[test]
    fn perfect_at_mythic_is_table_max() {
        let top = gem_fortune(Rarity::Mythic, GemQuality::Perfect);
        for rarity in Rarity::ALL {
            for quality in GemQuality::ALL {
                assert!(gem_fortune(rarity, quality) <= top);
            }
        }
    }
}
