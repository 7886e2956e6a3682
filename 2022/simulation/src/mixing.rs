use miette::*;

pub const DECRYPTION_KEY: i64 = 811_589_153;

/// Circular arrangement of the original positions `0..n`.
///
/// `order` holds the arrangement and `position` is its inverse, so finding an
/// element is a lookup and moving it only touches the slots it passes over.
/// A move costs time linear in that distance, which is below `n` since offsets
/// are reduced modulo `n - 1` first.
#[derive(Debug, Clone)]
struct Ring {
    order: Vec<usize>,
    position: Vec<usize>,
}

impl Ring {
    fn new(len: usize) -> Self {
        Self {
            order: (0..len).collect(),
            position: (0..len).collect(),
        }
    }

    /// Takes `item` out and puts it back `offset` places further along the
    /// remaining `n - 1` elements.
    fn shift(&mut self, item: usize, offset: i64) {
        let len = self.order.len();
        if len < 2 {
            return;
        }
        let from = self.position[item];
        let step = offset.rem_euclid(len as i64 - 1) as usize;
        let to = (from + step) % (len - 1);

        if from < to {
            self.order.copy_within(from + 1..=to, from);
            for slot in from..to {
                self.position[self.order[slot]] = slot;
            }
        } else if to < from {
            self.order.copy_within(to..from, to + 1);
            for slot in to + 1..=from {
                self.position[self.order[slot]] = slot;
            }
        }
        self.order[to] = item;
        self.position[item] = to;
    }
}

/// Moves every number, in its original order, by its own value, `rounds`
/// times over.
pub fn mix(numbers: &[i64], rounds: usize) -> Vec<i64> {
    let mut ring = Ring::new(numbers.len());
    for _ in 0..rounds {
        for (item, &value) in numbers.iter().enumerate() {
            ring.shift(item, value);
        }
    }
    ring.order.iter().map(|&item| numbers[item]).collect()
}

/// Sum of the values 1000, 2000 and 3000 places after the zero once the
/// numbers are scaled by `key` and mixed `rounds` times.
#[tracing::instrument(skip(numbers), fields(len = numbers.len()))]
pub fn grove_coordinates(numbers: &[i64], key: i64, rounds: usize) -> Result<i64> {
    let scaled = numbers
        .iter()
        .map(|&n| {
            n.checked_mul(key)
                .ok_or(miette!("Scaling {n} by key {key} overflows i64"))
        })
        .collect::<Result<Vec<i64>>>()?;
    let mixed = mix(&scaled, rounds);
    let zero = mixed
        .iter()
        .position(|&n| n == 0)
        .ok_or(miette!("Sequence has no zero to count from"))?;
    Ok([1000, 2000, 3000]
        .iter()
        .map(|offset| mixed[(zero + offset) % mixed.len()])
        .sum())
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use rstest::rstest;

    const EXAMPLE: [i64; 7] = [1, 2, -3, 3, -2, 0, 4];

    fn from_zero(mixed: &[i64]) -> Vec<i64> {
        let zero = mixed.iter().position(|&n| n == 0).unwrap();
        mixed[zero..].iter().chain(&mixed[..zero]).copied().collect()
    }

    /// Plain remove-and-insert on a vector of (original index, value).
    fn naive_mix(numbers: &[i64], rounds: usize) -> Vec<i64> {
        let mut ring: Vec<(usize, i64)> = numbers.iter().copied().enumerate().collect();
        let len = ring.len() as i64;
        for _ in 0..rounds {
            for item in 0..numbers.len() {
                let from = ring.iter().position(|&(i, _)| i == item).unwrap();
                let entry = ring.remove(from);
                let to = (from as i64 + entry.1).rem_euclid(len - 1) as usize;
                ring.insert(to, entry);
            }
        }
        ring.into_iter().map(|(_, value)| value).collect()
    }

    #[test]
    fn it_works() -> Result<()> {
        assert_eq!(3, grove_coordinates(&EXAMPLE, 1, 1)?);
        assert_eq!(1_623_178_306, grove_coordinates(&EXAMPLE, DECRYPTION_KEY, 10)?);
        Ok(())
    }

    #[test]
    fn one_round_order() {
        assert_eq!(vec![0, 3, -2, 1, 2, -3, 4], from_zero(&mix(&EXAMPLE, 1)));
    }

    #[rstest]
    fn agrees_with_remove_and_insert(#[values(1, 2, 3, 4, 5)] seed: u64, #[values(1, 3)] rounds: usize) {
        let mut rng = StdRng::seed_from_u64(seed);
        let len = rng.gen_range(2..40);
        let mut numbers: Vec<i64> = (0..len).map(|_| rng.gen_range(-60..60)).collect();
        numbers[0] = 0;
        assert_eq!(
            from_zero(&naive_mix(&numbers, rounds)),
            from_zero(&mix(&numbers, rounds))
        );
    }

    #[rstest]
    #[case(&[])]
    #[case(&[5])]
    #[case(&[1, 2, 3])]
    fn needs_a_zero(#[case] numbers: &[i64]) {
        assert!(grove_coordinates(numbers, 1, 1).is_err());
    }

    #[test]
    fn rejects_overflowing_keys() {
        assert!(grove_coordinates(&[0, 1 << 40, 3], DECRYPTION_KEY, 1).is_err());
        assert!(grove_coordinates(&[0, i64::MIN, 3], -1, 1).is_err());
    }

    #[rstest]
    #[case(&[0, i64::MAX, 3], &[0, 1, 3])]
    #[case(&[0, i64::MIN, 5, -4], &[0, 1, 5, -4])]
    #[case(&[i64::MIN + 1, 0, i64::MAX], &[-1, 0, 1])]
    fn extreme_offsets_wrap_like_small_ones(#[case] numbers: &[i64], #[case] reduced: &[i64]) {
        let rename = |mixed: Vec<i64>, from: &[i64], to: &[i64]| -> Vec<i64> {
            mixed
                .into_iter()
                .map(|n| to[from.iter().position(|&m| m == n).unwrap()])
                .collect()
        };
        assert_eq!(
            from_zero(&mix(reduced, 2)),
            from_zero(&rename(mix(numbers, 2), numbers, reduced))
        );
    }

    #[test]
    fn single_zero_stays_put() -> Result<()> {
        assert_eq!(0, grove_coordinates(&[0], DECRYPTION_KEY, 10)?);
        Ok(())
    }
}
