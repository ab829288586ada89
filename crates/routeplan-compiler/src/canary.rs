//! Canary weight balancing.
//!
//! Turns the declared (optional) traffic percentages of a group's members
//! into integer weights that sum to exactly [`TOTAL_WEIGHT`]. Members are
//! expected in route-weight order; every tie is resolved in favour of the
//! earlier member so the split is reproducible.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Sum of all member weights in a balanced group.
pub const TOTAL_WEIGHT: u32 = 100;

/// A misconfiguration the balancer worked around.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CanaryIssue {
    /// Declared weights reach or exceed 100: undeclared members get nothing
    /// and declared weights above 100 are scaled down.
    Overcommit { declared_total: u32 },
    /// Every member declared a weight but the total is short of 100.
    Undercommit { declared_total: u32 },
    /// Every member declared 0; traffic is split evenly instead.
    ZeroTotal,
}

impl fmt::Display for CanaryIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CanaryIssue::Overcommit { declared_total } => {
                write!(f, "canary weights overcommitted: declared total {declared_total}")
            }
            CanaryIssue::Undercommit { declared_total } => {
                write!(f, "canary weights undercommitted: declared total {declared_total}")
            }
            CanaryIssue::ZeroTotal => f.write_str("all canary weights are 0; split evenly"),
        }
    }
}

/// Outcome of balancing one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Balanced {
    /// One weight per member, same order as the input.
    pub weights: Vec<u32>,
    pub issue: Option<CanaryIssue>,
}

impl Balanced {
    pub fn total(&self) -> u32 {
        self.weights.iter().sum()
    }
}

/// Balance declared weights. Values above 100 are clamped.
pub fn balance(declared: &[Option<u32>]) -> Balanced {
    let declared: Vec<Option<u32>> = declared
        .iter()
        .map(|w| w.map(|w| w.min(TOTAL_WEIGHT)))
        .collect();

    if declared.is_empty() {
        return Balanced {
            weights: Vec::new(),
            issue: None,
        };
    }

    let declared_total: u32 = declared.iter().flatten().sum();
    let undeclared = declared.iter().filter(|w| w.is_none()).count();

    // Nothing declared: even split.
    if undeclared == declared.len() {
        return Balanced {
            weights: even_split(TOTAL_WEIGHT, declared.len()),
            issue: None,
        };
    }

    // Everything declared: honor as-is, or rescale.
    if undeclared == 0 {
        let values: Vec<u32> = declared.iter().flatten().copied().collect();
        return match declared_total {
            TOTAL_WEIGHT => Balanced {
                weights: values,
                issue: None,
            },
            0 => Balanced {
                weights: even_split(TOTAL_WEIGHT, values.len()),
                issue: Some(CanaryIssue::ZeroTotal),
            },
            total => Balanced {
                weights: rescale(&values, TOTAL_WEIGHT),
                issue: Some(if total > TOTAL_WEIGHT {
                    CanaryIssue::Overcommit {
                        declared_total: total,
                    }
                } else {
                    CanaryIssue::Undercommit {
                        declared_total: total,
                    }
                }),
            },
        };
    }

    // Mixed: undeclared members share whatever is left.
    if declared_total < TOTAL_WEIGHT {
        let mut fill = even_split(TOTAL_WEIGHT - declared_total, undeclared).into_iter();
        let weights = declared
            .iter()
            .map(|w| w.unwrap_or_else(|| fill.next().unwrap_or(0)))
            .collect();
        return Balanced {
            weights,
            issue: None,
        };
    }

    let values: Vec<u32> = declared.iter().flatten().copied().collect();
    let mut scaled = if declared_total > TOTAL_WEIGHT {
        rescale(&values, TOTAL_WEIGHT)
    } else {
        values
    }
    .into_iter();
    let weights = declared
        .iter()
        .map(|w| match w {
            Some(_) => scaled.next().unwrap_or(0),
            None => 0,
        })
        .collect();

    Balanced {
        weights,
        issue: Some(CanaryIssue::Overcommit { declared_total }),
    }
}

/// Split `total` into `n` near-equal parts; the first `total % n` parts
/// get one extra unit.
pub fn even_split(total: u32, n: usize) -> Vec<u32> {
    if n == 0 {
        return Vec::new();
    }
    let n32 = n as u32;
    let base = total / n32;
    let extra = (total % n32) as usize;
    (0..n)
        .map(|i| if i < extra { base + 1 } else { base })
        .collect()
}

/// Proportionally rescale `weights` to sum to `target`.
///
/// Largest-remainder rounding: every weight is floored, then the leftover
/// units go to the largest fractional remainders (earlier member on ties).
/// A weight that was nonzero never ends at 0; the unit it keeps is taken
/// from the largest weight.
pub fn rescale(weights: &[u32], target: u32) -> Vec<u32> {
    let sum: u64 = weights.iter().map(|&w| u64::from(w)).sum();
    if sum == 0 {
        return even_split(target, weights.len());
    }

    let target64 = u64::from(target);
    let mut out: Vec<u32> = Vec::with_capacity(weights.len());
    let mut remainders: Vec<(u64, usize)> = Vec::with_capacity(weights.len());
    for (i, &w) in weights.iter().enumerate() {
        let scaled = u64::from(w) * target64;
        out.push((scaled / sum) as u32);
        remainders.push((scaled % sum, i));
    }

    let assigned: u32 = out.iter().sum();
    let leftover = target.saturating_sub(assigned) as usize;
    remainders.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    for &(_, i) in remainders.iter().take(leftover) {
        out[i] += 1;
    }

    for i in 0..out.len() {
        if weights[i] == 0 || out[i] > 0 {
            continue;
        }
        let Some(donor) = largest(&out) else { break };
        if out[donor] <= 1 {
            break;
        }
        out[donor] -= 1;
        out[i] = 1;
    }

    out
}

/// Index of the largest value, earliest on ties.
fn largest(values: &[u32]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(&a.0)))
        .map(|(i, _)| i)
}
