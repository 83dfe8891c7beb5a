//! Admin dashboard aggregate.

use serde::{Deserialize, Serialize};

/// Counts shown on the admin dashboard.
///
/// Built fresh per request; never cached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub products: u64,
    pub projects: u64,
    pub team: u64,
    /// Inquiries still in status `new`.
    pub inquiries: u64,
}

impl DashboardStats {
    /// Builds stats from raw backend counts, treating missing counts as zero.
    pub fn from_counts(
        products: Option<u64>,
        projects: Option<u64>,
        team: Option<u64>,
        inquiries: Option<u64>,
    ) -> Self {
        Self {
            products: products.unwrap_or(0),
            projects: projects.unwrap_or(0),
            team: team.unwrap_or(0),
            inquiries: inquiries.unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DashboardStats;

    #[test]
    fn missing_counts_normalize_to_zero() {
        let stats = DashboardStats::from_counts(Some(5), None, Some(4), None);
        assert_eq!(
            stats,
            DashboardStats {
                products: 5,
                projects: 0,
                team: 4,
                inquiries: 0,
            }
        );
    }
}
