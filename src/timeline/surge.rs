// Surge detection over a bucket count series.
//
// A bucket surges when its count exceeds `multiplier` times the mean count of
// the `k` buckets strictly before it. Buckets without `k` predecessors have no
// trailing average and never surge.

/// Trailing average and surge flag for one bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurgeFlag {
    pub trailing_average: Option<f64>,
    pub is_surge: bool,
}

/// Flags for every position in `counts`, same length and order.
pub fn surge_flags(counts: &[usize], multiplier: f64, trailing: usize) -> Vec<SurgeFlag> {
    let mut flags = Vec::with_capacity(counts.len());
    // Running sum of the window counts[i - trailing .. i]
    let mut window_sum: usize = 0;

    for (i, &count) in counts.iter().enumerate() {
        let flag = if trailing > 0 && i >= trailing {
            let average = window_sum as f64 / trailing as f64;
            SurgeFlag {
                trailing_average: Some(average),
                is_surge: count as f64 > multiplier * average,
            }
        } else {
            SurgeFlag {
                trailing_average: None,
                is_surge: false,
            }
        };
        flags.push(flag);

        window_sum += count;
        if trailing > 0 && i >= trailing {
            window_sum -= counts[i - trailing];
        }
    }

    flags
}
