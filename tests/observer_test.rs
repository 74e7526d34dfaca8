//! Child-group observers and their conditional refresh.

mod common;

use std::time::Duration;

use common::builders::*;
use common::{caching_resolver, default_resolver, uncached_resolver};
use execution_console::api::{ApiEndpoint, InMemoryExecutionApi};
use execution_console::models::{NodeExecution, NodeExecutionPhase, RequestConfig};
use execution_console::{ChildGroupsObserver, ConsoleError};

fn parent(phase: NodeExecutionPhase) -> NodeExecution {
    NodeExecutionBuilder::new("e1", "n1")
        .parent_node()
        .phase(phase)
        .build()
}

fn child(id: &str, phase: NodeExecutionPhase) -> NodeExecution {
    NodeExecutionBuilder::new("e1", id)
        .retry_group("0")
        .phase(phase)
        .build()
}

#[tokio::test]
async fn test_terminal_parent_with_terminal_children_reuses_cache() {
    let api = InMemoryExecutionApi::new();
    let parent = parent(NodeExecutionPhase::Succeeded);
    api.add_parent_node_children(
        parent.id.clone(),
        vec![
            child("n1-0-n0", NodeExecutionPhase::Succeeded),
            child("n1-0-n1", NodeExecutionPhase::Failed),
        ],
    );
    let resolver = uncached_resolver(&api);
    let cached = resolver
        .fetch_child_groups(&parent, &RequestConfig::new())
        .await
        .unwrap();
    api.reset_calls();

    let observer = ChildGroupsObserver::new(resolver, parent, RequestConfig::new()).unwrap();
    assert!(!observer.is_enabled());
    assert_eq!(observer.state().data.as_ref(), Some(&cached));

    let state = observer.refresh().await;

    assert!(state.is_success());
    assert_eq!(state.data, Some(cached));
    assert_eq!(api.total_calls(), 0);
}

#[tokio::test]
async fn test_terminal_parent_with_running_child_refetches() {
    let api = InMemoryExecutionApi::new();
    let parent = parent(NodeExecutionPhase::Succeeded);
    api.add_parent_node_children(
        parent.id.clone(),
        vec![
            child("n1-0-n0", NodeExecutionPhase::Succeeded),
            child("n1-0-n1", NodeExecutionPhase::Running),
        ],
    );
    let resolver = uncached_resolver(&api);
    resolver
        .fetch_child_groups(&parent, &RequestConfig::new())
        .await
        .unwrap();
    api.reset_calls();

    let observer = ChildGroupsObserver::new(resolver, parent, RequestConfig::new()).unwrap();
    assert!(observer.is_enabled());
    observer.refresh().await;

    assert_eq!(api.call_count(ApiEndpoint::ListNodeExecutions), 1);
}

#[tokio::test]
async fn test_running_parent_always_refetches() {
    let api = InMemoryExecutionApi::new();
    let parent = parent(NodeExecutionPhase::Running);
    api.add_parent_node_children(
        parent.id.clone(),
        vec![child("n1-0-n0", NodeExecutionPhase::Succeeded)],
    );
    let observer =
        ChildGroupsObserver::new(caching_resolver(&api), parent, RequestConfig::new()).unwrap();

    observer.refresh().await;
    observer.refresh().await;
    observer.refresh().await;

    assert_eq!(api.call_count(ApiEndpoint::ListNodeExecutions), 3);
}

#[tokio::test]
async fn test_uncached_query_is_fetched() {
    let api = InMemoryExecutionApi::new();
    let parent = parent(NodeExecutionPhase::Succeeded);
    api.add_parent_node_children(
        parent.id.clone(),
        vec![child("n1-0-n0", NodeExecutionPhase::Succeeded)],
    );
    let observer =
        ChildGroupsObserver::new(uncached_resolver(&api), parent, RequestConfig::new()).unwrap();
    assert!(observer.is_enabled());
    assert_eq!(observer.state().data, None);

    let state = observer.refresh().await;
    assert_eq!(state.data.map(|groups| groups.len()), Some(1));

    // Everything is terminal now
    assert!(!observer.is_enabled());
    observer.refresh().await;
    assert_eq!(api.call_count(ApiEndpoint::ListNodeExecutions), 1);
}

#[tokio::test]
async fn test_parent_turning_terminal_triggers_final_refetch() {
    let api = InMemoryExecutionApi::new();
    let running = parent(NodeExecutionPhase::Running);
    api.add_parent_node_children(
        running.id.clone(),
        vec![child("n1-0-n0", NodeExecutionPhase::Running)],
    );
    let mut observer =
        ChildGroupsObserver::new(uncached_resolver(&api), running, RequestConfig::new()).unwrap();
    observer.refresh().await;

    api.replace_parent_node_children(
        parent(NodeExecutionPhase::Succeeded).id,
        vec![child("n1-0-n0", NodeExecutionPhase::Succeeded)],
    );
    let state = observer
        .update_node_execution(parent(NodeExecutionPhase::Succeeded))
        .await
        .unwrap();

    let groups = state.data.unwrap();
    assert_eq!(groups[0].node_executions[0].phase(), NodeExecutionPhase::Succeeded);
    assert_eq!(api.call_count(ApiEndpoint::ListNodeExecutions), 2);

    // Final from here on
    observer.refresh().await;
    assert_eq!(api.call_count(ApiEndpoint::ListNodeExecutions), 2);
}

#[tokio::test]
async fn test_unchanged_snapshot_does_not_refetch() {
    let api = InMemoryExecutionApi::new();
    let running = parent(NodeExecutionPhase::Running);
    api.add_parent_node_children(
        running.id.clone(),
        vec![child("n1-0-n0", NodeExecutionPhase::Running)],
    );
    let mut observer =
        ChildGroupsObserver::new(uncached_resolver(&api), running.clone(), RequestConfig::new())
            .unwrap();
    let first = observer.refresh().await;

    let state = observer.update_node_execution(running).await.unwrap();

    assert_eq!(state, first);
    assert_eq!(api.call_count(ApiEndpoint::ListNodeExecutions), 1);
}

#[tokio::test]
async fn test_identity_change_switches_query() {
    let api = InMemoryExecutionApi::new();
    let first = parent(NodeExecutionPhase::Running);
    let second = NodeExecutionBuilder::new("e1", "n2")
        .parent_node()
        .phase(NodeExecutionPhase::Running)
        .build();
    api.add_parent_node_children(
        first.id.clone(),
        vec![child("n1-0-n0", NodeExecutionPhase::Running)],
    );
    api.add_parent_node_children(
        second.id.clone(),
        vec![
            child("n2-0-n0", NodeExecutionPhase::Running),
            child("n2-0-n1", NodeExecutionPhase::Running),
        ],
    );
    let mut observer =
        ChildGroupsObserver::new(uncached_resolver(&api), first, RequestConfig::new()).unwrap();
    observer.refresh().await;

    let state = observer.update_node_execution(second).await.unwrap();

    assert_eq!(observer.node_execution().id.node_id, "n2");
    assert_eq!(
        node_ids(&state.data.unwrap()[0].node_executions),
        vec!["n2-0-n0", "n2-0-n1"]
    );
}

#[tokio::test]
async fn test_subscribers_see_published_states() {
    let api = InMemoryExecutionApi::new();
    let parent = parent(NodeExecutionPhase::Running);
    api.add_parent_node_children(
        parent.id.clone(),
        vec![child("n1-0-n0", NodeExecutionPhase::Running)],
    );
    let observer =
        ChildGroupsObserver::new(uncached_resolver(&api), parent, RequestConfig::new()).unwrap();
    let mut receiver = observer.subscribe();

    observer.refresh().await;
    assert!(receiver.has_changed().unwrap());
    assert!(receiver.borrow_and_update().is_success());

    api.fail_endpoint(
        ApiEndpoint::ListNodeExecutions,
        ConsoleError::api_status(503, "unavailable"),
    );
    observer.refresh().await;

    let state = receiver.borrow_and_update().clone();
    assert!(state.is_error());
    assert!(!state.is_loading);
    assert_eq!(state.data.map(|groups| groups.len()), Some(1));
}

#[tokio::test]
async fn test_observers_of_same_query_share_fetch() {
    let api = InMemoryExecutionApi::new().with_latency(Duration::from_millis(20));
    let parent = parent(NodeExecutionPhase::Running);
    api.add_parent_node_children(
        parent.id.clone(),
        vec![child("n1-0-n0", NodeExecutionPhase::Running)],
    );
    let resolver = uncached_resolver(&api);
    let a = ChildGroupsObserver::new(resolver.clone(), parent.clone(), RequestConfig::new())
        .unwrap();
    let b = ChildGroupsObserver::new(resolver, parent, RequestConfig::new()).unwrap();

    let (state_a, state_b) = tokio::join!(a.refresh(), b.refresh());

    assert_eq!(state_a, state_b);
    assert_eq!(api.call_count(ApiEndpoint::ListNodeExecutions), 1);
}

// =============================================================================
// Production cache profile: list caches keep results for seconds
// =============================================================================

#[tokio::test]
async fn test_running_child_refetch_bypasses_list_cache() {
    let api = InMemoryExecutionApi::new();
    let parent = parent(NodeExecutionPhase::Succeeded);
    api.add_parent_node_children(
        parent.id.clone(),
        vec![child("n1-0-n0", NodeExecutionPhase::Running)],
    );
    let resolver = default_resolver(&api);
    resolver
        .fetch_child_groups(&parent, &RequestConfig::new())
        .await
        .unwrap();
    assert_eq!(api.call_count(ApiEndpoint::ListNodeExecutions), 1);

    api.replace_parent_node_children(
        parent.id.clone(),
        vec![child("n1-0-n0", NodeExecutionPhase::Succeeded)],
    );
    let observer = ChildGroupsObserver::new(resolver, parent, RequestConfig::new()).unwrap();
    let state = observer.refresh().await;

    assert_eq!(api.call_count(ApiEndpoint::ListNodeExecutions), 2);
    let groups = state.data.unwrap();
    assert_eq!(groups[0].node_executions[0].phase(), NodeExecutionPhase::Succeeded);
    assert!(!observer.is_enabled());
}

#[tokio::test]
async fn test_running_parent_reaches_api_on_every_refresh() {
    let api = InMemoryExecutionApi::new();
    let parent = parent(NodeExecutionPhase::Running);
    api.add_parent_node_children(
        parent.id.clone(),
        vec![child("n1-0-n0", NodeExecutionPhase::Succeeded)],
    );
    let observer =
        ChildGroupsObserver::new(default_resolver(&api), parent, RequestConfig::new()).unwrap();

    for expected_calls in 1..=3 {
        observer.refresh().await;
        assert_eq!(api.call_count(ApiEndpoint::ListNodeExecutions), expected_calls);
    }
}

#[tokio::test]
async fn test_running_task_retry_refetches_every_list() {
    let api = InMemoryExecutionApi::new();
    let node_execution = node("e1", "n3");
    api.add_task_executions(
        node_execution.id.clone(),
        vec![task_execution(&node_execution.id, 0, true)],
    );
    api.add_task_execution_children(
        task_execution_id(&node_execution.id, 0),
        vec![child("n3-0-n0", NodeExecutionPhase::Running)],
    );
    let observer =
        ChildGroupsObserver::new(default_resolver(&api), node_execution, RequestConfig::new())
            .unwrap();

    observer.refresh().await;
    observer.refresh().await;

    assert_eq!(api.call_count(ApiEndpoint::ListTaskExecutions), 2);
    assert_eq!(api.call_count(ApiEndpoint::ListTaskExecutionChildren), 2);
}

#[tokio::test]
async fn test_terminal_tree_is_final_under_production_profile() {
    let api = InMemoryExecutionApi::new();
    let parent = parent(NodeExecutionPhase::Succeeded);
    api.add_parent_node_children(
        parent.id.clone(),
        vec![child("n1-0-n0", NodeExecutionPhase::Succeeded)],
    );
    let observer =
        ChildGroupsObserver::new(default_resolver(&api), parent, RequestConfig::new()).unwrap();

    observer.refresh().await;
    observer.refresh().await;

    assert_eq!(api.call_count(ApiEndpoint::ListNodeExecutions), 1);
}
