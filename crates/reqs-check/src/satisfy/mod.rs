//! Specifier satisfiability
//!
//! Decides whether some version could meet every specifier collected for a
//! package, without a list of available versions: the specifiers are folded
//! into one interval and the interval is checked for emptiness.

use reqs_core::types::Op;
use reqs_core::{Specifier, SpecifierSet, Version};
use std::cmp::Ordering;

/// Version constraint satisfaction checker
#[derive(Debug, Clone, Default)]
pub struct ConstraintSolver {
    /// Active version constraints
    constraints: Vec<Specifier>,
}

#[derive(Debug, Clone)]
struct Bound {
    version: Version,
    inclusive: bool,
}

impl ConstraintSolver {
    /// Create new constraint solver
    pub fn new() -> Self {
        Self::default()
    }

    /// Add version constraint
    pub fn add_constraint(&mut self, constraint: Specifier) {
        self.constraints.push(constraint);
    }

    /// Add every specifier of a set
    pub fn add_set(&mut self, set: &SpecifierSet) {
        self.constraints.extend(set.iter().cloned());
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Check if some version satisfies every constraint
    pub fn is_satisfiable(&self) -> bool {
        if let Some(result) = self.check_arbitrary() {
            return result;
        }

        // exact pins must agree with each other and with everything else
        let mut pins = self.constraints.iter().filter_map(Specifier::exact_version).peekable();
        if pins.peek().is_some() {
            return pins.any(|pin| self.admits(pin));
        }

        let (lower, upper) = self.interval();
        if let (Some(lower), Some(upper)) = (&lower, &upper) {
            match lower.version.cmp(&upper.version) {
                Ordering::Greater => return false,
                Ordering::Equal => {
                    return lower.inclusive && upper.inclusive && self.admits(&lower.version)
                },
                Ordering::Less => {},
            }
        }

        !self.excluded_by_wildcard(lower.as_ref(), upper.as_ref())
            && !self.excluded_by_release_rules(lower.as_ref(), upper.as_ref())
    }

    /// `===` compares the literal text, so every one must agree
    fn check_arbitrary(&self) -> Option<bool> {
        let mut texts = self.constraints.iter().filter_map(|spec| match spec {
            Specifier::Arbitrary(text) => Some(text.as_str()),
            _ => None,
        });
        let first = texts.next()?;
        if !texts.all(|text| text.eq_ignore_ascii_case(first)) {
            return Some(false);
        }

        let only_arbitrary = self
            .constraints
            .iter()
            .all(|spec| matches!(spec, Specifier::Arbitrary(_)));
        Some(match first.parse::<Version>() {
            Ok(version) => self
                .constraints
                .iter()
                .filter(|spec| !matches!(spec, Specifier::Arbitrary(_)))
                .all(|spec| spec.contains(&version)),
            // a non-PEP 440 version cannot be ordered against anything else
            Err(_) => only_arbitrary,
        })
    }

    fn admits(&self, candidate: &Version) -> bool {
        self.constraints.iter().all(|spec| spec.contains(candidate))
    }

    /// Tightest lower and upper bounds implied by the constraints
    fn interval(&self) -> (Option<Bound>, Option<Bound>) {
        let mut lower = None;
        let mut upper = None;

        for spec in &self.constraints {
            match spec {
                Specifier::Compare { op, version } => match op {
                    Op::GreaterEq => raise(&mut lower, version.clone(), true),
                    Op::Greater => raise(&mut lower, past_own_post_releases(version), false),
                    Op::LessEq => cap(&mut upper, version.clone(), true),
                    Op::Less => cap(&mut upper, below_own_pre_releases(version), false),
                    Op::Equal | Op::NotEqual => {},
                },
                Specifier::Compatible(version) => {
                    raise(&mut lower, version.clone(), true);
                    cap(&mut upper, version.prefix_ceiling(version.release.len() - 1), false);
                },
                Specifier::Wildcard {
                    negated: false,
                    prefix,
                } => {
                    let len = prefix.release.len();
                    raise(&mut lower, prefix.prefix_floor(len), true);
                    cap(&mut upper, prefix.prefix_ceiling(len), false);
                },
                Specifier::Wildcard { negated: true, .. } | Specifier::Arbitrary(_) => {},
            }
        }

        (lower, upper)
    }

    /// A `!=X.*` that covers the whole remaining interval
    fn excluded_by_wildcard(&self, lower: Option<&Bound>, upper: Option<&Bound>) -> bool {
        let (Some(lower), Some(upper)) = (lower, upper) else {
            return false;
        };

        self.constraints.iter().any(|spec| match spec {
            Specifier::Wildcard {
                negated: true,
                prefix,
            } => {
                let len = prefix.release.len();
                let floor = prefix.prefix_floor(len);
                let ceiling = prefix.prefix_ceiling(len);
                floor <= lower.version
                    && (upper.version < ceiling || (upper.version == ceiling && !upper.inclusive))
            },
            _ => false,
        })
    }

    /// An interval lying inside the pre-releases a `<V` rejects, or inside
    /// the post-releases a `>V` rejects
    fn excluded_by_release_rules(&self, lower: Option<&Bound>, upper: Option<&Bound>) -> bool {
        let (Some(lower), Some(upper)) = (lower, upper) else {
            return false;
        };

        self.constraints.iter().any(|spec| match spec {
            Specifier::Compare { op: Op::Less, version } if !version.is_prerelease() => {
                let base = version.base();
                let floor = base.prefix_floor(base.release.len());
                floor <= lower.version
                    && (upper.version < base || (upper.version == base && !upper.inclusive))
            },
            Specifier::Compare {
                op: Op::Greater,
                version,
            } if !version.is_postrelease() => {
                let base = version.base();
                let last_post = with_last_post(&base);
                (lower.version > base || (lower.version == base && !lower.inclusive))
                    && upper.version <= last_post
            },
            _ => false,
        })
    }
}

/// Check whether a combined specifier set can be met by any version
pub fn is_satisfiable(set: &SpecifierSet) -> bool {
    let mut solver = ConstraintSolver::new();
    solver.add_set(set);
    solver.is_satisfiable()
}

/// `<V` admits no pre-release of a final V, so it ends at `V.dev0`
fn below_own_pre_releases(version: &Version) -> Version {
    if version.is_prerelease() || version.is_postrelease() {
        version.clone()
    } else {
        version.prefix_floor(version.release.len())
    }
}

/// `>V` admits no post-release of V, so it starts past `V.post*`
fn past_own_post_releases(version: &Version) -> Version {
    if version.is_postrelease() || version.dev.is_some() {
        version.clone()
    } else {
        with_last_post(version)
    }
}

fn with_last_post(version: &Version) -> Version {
    Version {
        post: Some(u64::MAX),
        dev: None,
        local: None,
        ..version.clone()
    }
}

fn raise(bound: &mut Option<Bound>, version: Version, inclusive: bool) {
    let tighter = match bound {
        None => true,
        Some(current) => match version.cmp(&current.version) {
            Ordering::Greater => true,
            Ordering::Equal => current.inclusive && !inclusive,
            Ordering::Less => false,
        },
    };
    if tighter {
        *bound = Some(Bound { version, inclusive });
    }
}

fn cap(bound: &mut Option<Bound>, version: Version, inclusive: bool) {
    let tighter = match bound {
        None => true,
        Some(current) => match version.cmp(&current.version) {
            Ordering::Less => true,
            Ordering::Equal => current.inclusive && !inclusive,
            Ordering::Greater => false,
        },
    };
    if tighter {
        *bound = Some(Bound { version, inclusive });
    }
}
