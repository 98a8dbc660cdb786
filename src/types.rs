//! Kind selectors for surrogate models and criteria.
//!
//! Kinds are plain data: they are read from a [`PosteriorConfig`](crate::PosteriorConfig)
//! and turned into trait objects by a [`ParticleFactory`](crate::ParticleFactory).
//! Each kind also has a short textual name so it can be selected from a
//! string:
//!
//! ```
//! use mcmc_posterior::{CriteriaKind, CriterionKind};
//!
//! let kind: CriteriaKind = "hedge(ei,lcb,poi)".parse().unwrap();
//! assert_eq!(kind.cycle_length(), 3);
//!
//! let single: CriteriaKind = "lcb(2.5)".parse().unwrap();
//! assert_eq!(
//!     single,
//!     CriteriaKind::Single(CriterionKind::LowerConfidenceBound { beta: 2.5 })
//! );
//! ```

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Covariance function used by the Gaussian process surrogate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum KernelKind {
    /// Matérn 5/2 kernel.
    #[default]
    Matern52,
    /// Squared exponential (RBF) kernel.
    SquaredExponential,
}

/// Surrogate model family instantiated for every particle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SurrogateKind {
    /// Gaussian process regression with the given kernel.
    GaussianProcess(KernelKind),
}

impl Default for SurrogateKind {
    fn default() -> Self {
        Self::GaussianProcess(KernelKind::default())
    }
}

impl fmt::Display for SurrogateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GaussianProcess(KernelKind::Matern52) => write!(f, "gp_matern52"),
            Self::GaussianProcess(KernelKind::SquaredExponential) => write!(f, "gp_se"),
        }
    }
}

impl FromStr for SurrogateKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "gp" | "gp_matern52" => Ok(Self::GaussianProcess(KernelKind::Matern52)),
            "gp_se" => Ok(Self::GaussianProcess(KernelKind::SquaredExponential)),
            other => Err(Error::Configuration(format!(
                "unsupported surrogate kind '{other}'"
            ))),
        }
    }
}

/// A single acquisition function. All criteria are minimized.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CriterionKind {
    /// Negative expected improvement over the best observation.
    ExpectedImprovement,
    /// `mean - beta * std`.
    LowerConfidenceBound {
        /// Exploration weight.
        beta: f64,
    },
    /// Negative probability of improving on the best observation by `epsilon`.
    ProbabilityOfImprovement {
        /// Required improvement margin.
        epsilon: f64,
    },
    /// Lower confidence bound whose exploration weight grows with the number
    /// of chosen query points.
    AnnealedLowerConfidenceBound,
    /// Predictive mean (pure exploitation).
    Mean,
}

/// Default exploration weight for [`CriterionKind::LowerConfidenceBound`].
pub const DEFAULT_LCB_BETA: f64 = 1.0;
/// Default margin for [`CriterionKind::ProbabilityOfImprovement`].
pub const DEFAULT_POI_EPSILON: f64 = 0.01;

impl CriterionKind {
    pub(crate) fn validate(&self) -> Result<()> {
        match *self {
            Self::LowerConfidenceBound { beta } if !(beta.is_finite() && beta >= 0.0) => Err(
                Error::Configuration(format!("lcb beta must be finite and >= 0, got {beta}")),
            ),
            Self::ProbabilityOfImprovement { epsilon } if !epsilon.is_finite() => Err(
                Error::Configuration(format!("poi epsilon must be finite, got {epsilon}")),
            ),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for CriterionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExpectedImprovement => write!(f, "ei"),
            Self::LowerConfidenceBound { .. } => write!(f, "lcb"),
            Self::ProbabilityOfImprovement { .. } => write!(f, "poi"),
            Self::AnnealedLowerConfidenceBound => write!(f, "alcb"),
            Self::Mean => write!(f, "mean"),
        }
    }
}

impl FromStr for CriterionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (name, arg) = split_call(s.trim())?;
        let kind = match (name, arg) {
            ("ei", None) => Self::ExpectedImprovement,
            ("lcb", None) => Self::LowerConfidenceBound {
                beta: DEFAULT_LCB_BETA,
            },
            ("lcb", Some(a)) => Self::LowerConfidenceBound {
                beta: parse_number(a)?,
            },
            ("poi", None) => Self::ProbabilityOfImprovement {
                epsilon: DEFAULT_POI_EPSILON,
            },
            ("poi", Some(a)) => Self::ProbabilityOfImprovement {
                epsilon: parse_number(a)?,
            },
            ("alcb", None) => Self::AnnealedLowerConfidenceBound,
            ("mean", None) => Self::Mean,
            _ => {
                return Err(Error::Configuration(format!(
                    "unsupported criterion '{s}'"
                )));
            }
        };
        kind.validate()?;
        Ok(kind)
    }
}

/// Criteria evaluator instantiated for every particle.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CriteriaKind {
    /// One fixed criterion. Rotation has cycle length 1.
    Single(CriterionKind),
    /// Hedge portfolio rotating through several criteria.
    Hedge(Vec<CriterionKind>),
}

impl CriteriaKind {
    /// Number of steps before the criteria rotation wraps around.
    #[must_use]
    pub fn cycle_length(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Hedge(portfolio) => portfolio.len(),
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        match self {
            Self::Single(kind) => kind.validate(),
            Self::Hedge(portfolio) => {
                if portfolio.is_empty() {
                    return Err(Error::Configuration(
                        "hedge portfolio must contain at least one criterion".into(),
                    ));
                }
                portfolio.iter().try_for_each(CriterionKind::validate)
            }
        }
    }
}

impl Default for CriteriaKind {
    fn default() -> Self {
        Self::Single(CriterionKind::ExpectedImprovement)
    }
}

impl FromStr for CriteriaKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(inner) = s.strip_prefix("hedge(").and_then(|r| r.strip_suffix(')')) {
            let portfolio = split_top_level(inner)
                .into_iter()
                .filter(|part| !part.trim().is_empty())
                .map(str::parse)
                .collect::<Result<Vec<CriterionKind>>>()?;
            let kind = Self::Hedge(portfolio);
            kind.validate()?;
            return Ok(kind);
        }
        s.parse().map(Self::Single)
    }
}

/// Split `name(arg)` into `("name", Some("arg"))`, or `name` into `("name", None)`.
fn split_call(s: &str) -> Result<(&str, Option<&str>)> {
    match s.find('(') {
        None => Ok((s, None)),
        Some(open) => {
            let rest = &s[open + 1..];
            let arg = rest.strip_suffix(')').ok_or_else(|| {
                Error::Configuration(format!("unbalanced parentheses in '{s}'"))
            })?;
            Ok((s[..open].trim(), Some(arg.trim())))
        }
    }
}

/// Split on commas that are not nested inside parentheses.
fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

fn parse_number(s: &str) -> Result<f64> {
    s.parse::<f64>()
        .map_err(|_| Error::Configuration(format!("invalid numeric argument '{s}'")))
}
