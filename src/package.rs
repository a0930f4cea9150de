//! Package catalog and the entitlement computed from it.
//!
//! Tiers are strictly ordered `start < advanced < premium`. Every comparison
//! goes through [`PackageCode::rank`]; the stored text code is only parsed at
//! the edges.

use std::{collections::HashSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::prelude::*;

#[derive(
  Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum PackageCode {
  Start,
  Advanced,
  Premium,
}

/// Tier order used for every "cheapest package" decision.
pub const TIERS: [PackageCode; 3] =
  [PackageCode::Start, PackageCode::Advanced, PackageCode::Premium];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PackageInfo {
  pub code: PackageCode,
  pub name: &'static str,
  pub price: &'static str,
}

impl PackageCode {
  pub fn rank(self) -> usize {
    match self {
      Self::Start => 0,
      Self::Advanced => 1,
      Self::Premium => 2,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Start => "start",
      Self::Advanced => "advanced",
      Self::Premium => "premium",
    }
  }

  pub fn info(self) -> PackageInfo {
    let (name, price) = match self {
      Self::Start => ("START", "R$ 100"),
      Self::Advanced => ("ADVANCED", "R$ 197"),
      Self::Premium => ("PRO PREMIUM", "R$ 297"),
    };
    PackageInfo { code: self, name, price }
  }

  /// Next tier up, `None` at the top.
  pub fn next(self) -> Option<Self> {
    TIERS.get(self.rank() + 1).copied()
  }
}

impl fmt::Display for PackageCode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for PackageCode {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    TIERS
      .into_iter()
      .find(|tier| tier.as_str() == s)
      .ok_or_else(|| Error::UnknownPackage(s.to_string()))
  }
}

/// Rank of a raw code as stored in the database.
pub fn rank(code: &str) -> Result<usize> {
  Ok(code.parse::<PackageCode>()?.rank())
}

/// Tier a talent should be offered next: `start` without a package,
/// nothing once they hold `premium`.
pub fn upgrade_from(current: Option<PackageCode>) -> Option<PackageCode> {
  match current {
    None => Some(PackageCode::Start),
    Some(code) => code.next(),
  }
}

pub fn catalog() -> Vec<PackageInfo> {
  TIERS.into_iter().map(PackageCode::info).collect()
}

/// Cheapest known tier among raw codes. Unknown codes are logged and
/// skipped, never promoted to a tier.
pub fn cheapest<'a>(
  codes: impl IntoIterator<Item = &'a str>,
) -> Option<PackageCode> {
  codes
    .into_iter()
    .filter_map(|code| match code.parse::<PackageCode>() {
      Ok(code) => Some(code),
      Err(err) => {
        warn!("Skipping course gate: {err}");
        None
      }
    })
    .min_by_key(|code| code.rank())
}

/// What a talent has to hold to open a course.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Requirement {
  Package(PackageCode),
  /// The course is not offered under any tier, so nobody can open it.
  Unavailable,
}

/// A talent's package and the exact set of courses it unlocks.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Entitlement {
  pub package: Option<PackageCode>,
  pub unlocked: HashSet<Uuid>,
}

impl Entitlement {
  /// Fail-closed value used when there is no package or it could not be
  /// determined.
  pub fn none() -> Self {
    Self::default()
  }

  pub fn new(package: PackageCode, unlocked: HashSet<Uuid>) -> Self {
    Self { package: Some(package), unlocked }
  }

  pub fn has_access(&self, course: Uuid) -> bool {
    self.package.is_some() && self.unlocked.contains(&course)
  }

  pub fn upgrade(&self) -> Option<PackageInfo> {
    upgrade_from(self.package).map(PackageCode::info)
  }
}
