mod common;

use cfsite_core::{DashboardRepository, DashboardStats, RepoError};
use common::{permission_denied, CountReply, ScriptedClient};
use std::sync::Arc;
use std::time::Duration;

fn scripted_counts(products: u64, projects: u64, team: u64, inquiries: u64) -> Arc<ScriptedClient> {
    let client = Arc::new(ScriptedClient::new());
    client.set_count("products", CountReply::Ready(Ok(Some(products))));
    client.set_count("projects", CountReply::Ready(Ok(Some(projects))));
    client.set_count("team_members", CountReply::Ready(Ok(Some(team))));
    client.set_count("inquiries", CountReply::Ready(Ok(Some(inquiries))));
    client
}

#[tokio::test]
async fn aggregates_four_counts() {
    let client = scripted_counts(5, 3, 4, 2);
    let repo = DashboardRepository::new(Arc::clone(&client));

    let stats = repo.load_dashboard_stats().await.unwrap();
    assert_eq!(
        stats,
        DashboardStats {
            products: 5,
            projects: 3,
            team: 4,
            inquiries: 2,
        }
    );

    let queries = client.count_queries();
    assert_eq!(queries.len(), 4);
    let inquiries = queries
        .iter()
        .find(|query| query.collection == "inquiries")
        .expect("inquiries count should be issued");
    assert_eq!(inquiries.filter_value("status"), Some("new"));
    assert_eq!(inquiries.filters.len(), 1);
    assert!(queries
        .iter()
        .filter(|query| query.collection != "inquiries")
        .all(|query| query.filters.is_empty()));
}

#[tokio::test]
async fn missing_counts_are_reported_as_zero() {
    let client = Arc::new(ScriptedClient::new());
    client.set_count("products", CountReply::Ready(Ok(Some(7))));
    client.set_count("projects", CountReply::Ready(Ok(None)));
    let repo = DashboardRepository::new(Arc::clone(&client));

    let stats = repo.load_dashboard_stats().await.unwrap();
    assert_eq!(
        stats,
        DashboardStats {
            products: 7,
            projects: 0,
            team: 0,
            inquiries: 0,
        }
    );
}

#[tokio::test]
async fn products_failure_rejects_even_when_other_counts_never_finish() {
    let client = Arc::new(ScriptedClient::new());
    client.set_count("products", CountReply::Ready(Err(permission_denied())));
    client.set_count("projects", CountReply::Pending);
    client.set_count("team_members", CountReply::Pending);
    client.set_count("inquiries", CountReply::Pending);
    let repo = DashboardRepository::new(Arc::clone(&client));

    let result = tokio::time::timeout(Duration::from_secs(5), repo.load_dashboard_stats())
        .await
        .expect("first failure must not wait for pending counts");

    let err = result.unwrap_err();
    assert_eq!(err.code(), Some("42501"));
    assert!(matches!(err, RepoError::Backend(_)));
}

#[tokio::test]
async fn failure_in_any_count_rejects_whole_aggregate() {
    let client = scripted_counts(5, 3, 4, 2);
    client.set_count("inquiries", CountReply::Ready(Err(permission_denied())));
    let repo = DashboardRepository::new(Arc::clone(&client));

    let err = repo.load_dashboard_stats().await.unwrap_err();
    assert_eq!(err.code(), Some("42501"));
}

#[tokio::test]
async fn all_four_counts_are_issued_before_any_completes() {
    let client = Arc::new(ScriptedClient::new());
    client.set_count("products", CountReply::Pending);
    client.set_count("projects", CountReply::Pending);
    client.set_count("team_members", CountReply::Pending);
    client.set_count("inquiries", CountReply::Pending);
    let repo = DashboardRepository::new(Arc::clone(&client));

    let timed_out = tokio::time::timeout(Duration::from_millis(50), repo.load_dashboard_stats())
        .await
        .is_err();

    assert!(timed_out);
    assert_eq!(client.count_queries().len(), 4);
}
