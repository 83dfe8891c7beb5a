//! Admin dashboard statistics repository.
//!
//! # Invariants
//! - The four counts are requested concurrently and aggregated all-or-nothing.
//! - A missing count is reported as zero.

use crate::client::{Query, QueryClient};
use crate::model::dashboard::DashboardStats;
use crate::model::inquiry::InquiryStatus;
use crate::repo::inquiry_repo::{INQUIRIES_COLLECTION, INQUIRY_STATUS_COLUMN};
use crate::repo::{RepoError, RepoResult};
use futures_util::try_join;
use log::{error, info};
use std::time::Instant;

pub const PRODUCTS_COLLECTION: &str = "products";
pub const PROJECTS_COLLECTION: &str = "projects";
pub const TEAM_COLLECTION: &str = "team_members";

pub struct DashboardRepository<C: QueryClient> {
    client: C,
}

impl<C: QueryClient> DashboardRepository<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Loads product, project, team and new-inquiry counts.
    ///
    /// All four count queries are polled together on the calling task. The
    /// first failure is returned as soon as it is observed and the remaining
    /// queries are dropped, which cancels them; their results are never read.
    pub async fn load_dashboard_stats(&self) -> RepoResult<DashboardStats> {
        let started_at = Instant::now();

        let products = Query::select(PRODUCTS_COLLECTION, "*");
        let projects = Query::select(PROJECTS_COLLECTION, "*");
        let team = Query::select(TEAM_COLLECTION, "*");
        let inquiries = Query::select(INQUIRIES_COLLECTION, "*")
            .eq(INQUIRY_STATUS_COLUMN, InquiryStatus::New.as_str());

        let counts = try_join!(
            self.client.fetch_count(&products),
            self.client.fetch_count(&projects),
            self.client.fetch_count(&team),
            self.client.fetch_count(&inquiries),
        );

        match counts {
            Ok((products, projects, team, inquiries)) => {
                let stats = DashboardStats::from_counts(products, projects, team, inquiries);
                info!(
                    "event=dashboard_stats module=repo status=ok duration_ms={} products={} projects={} team={} inquiries={}",
                    started_at.elapsed().as_millis(),
                    stats.products,
                    stats.projects,
                    stats.team,
                    stats.inquiries
                );
                Ok(stats)
            }
            Err(err) => {
                error!(
                    "event=dashboard_stats module=repo status=error duration_ms={} code={} error={}",
                    started_at.elapsed().as_millis(),
                    err.code().unwrap_or("none"),
                    err.message
                );
                Err(RepoError::Backend(err))
            }
        }
    }
}
