//! Read-only aggregates for profile and admin views.

use serde::{Deserialize, Serialize};

/// Per-user activity summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
  pub initiatives_count: u64,
  /// Sum of the directions of every vote the user currently holds.
  pub total_votes:       i64,
  pub positive_votes:    u64,
  pub negative_votes:    u64,
  /// Sum of the running counts of the user's own initiatives.
  pub initiatives_votes: i64,
}

/// Platform-wide counters for the admin panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformStats {
  pub total_users:         u64,
  pub total_initiatives:   u64,
  pub total_votes:         u64,
  pub retired_initiatives: u64,
}
