#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Integration tests for the node registry
//!
//! These tests drive nodes through the registry the way orchestration code
//! does: register, group, resolve, deregister.

use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use provisioning::{
    ByonNode, CloudNode, CloudNodeDetails, CustomNode, HostResolver, LoginCredentials,
    NodeRegistry, NodeState, ProvisioningError, SecretString, StaticHostResolver,
};

fn static_resolver() -> Arc<StaticHostResolver> {
    Arc::new(
        StaticHostResolver::new()
            .with_host("host-123", ["10.0.0.5".parse().unwrap()])
            .with_host("db-1", ["10.0.1.10".parse().unwrap()]),
    )
}

fn registry() -> NodeRegistry {
    NodeRegistry::new(static_resolver(), Duration::from_secs(5))
}

fn aws_node(provider_id: &str, private_ip: &str) -> Box<dyn CustomNode> {
    Box::new(
        CloudNode::from_details(CloudNodeDetails {
            provider: "aws".to_owned(),
            region: "us-east-1".to_owned(),
            provider_id: provider_id.to_owned(),
            public_ip: Some(String::new()),
            private_ip: Some(private_ip.to_owned()),
            credentials: LoginCredentials::key_file("ec2-user", "/keys/aws.pem"),
            ..CloudNodeDetails::default()
        })
        .unwrap(),
    )
}

/// Resolver that counts lookups and never answers within the test timeout
struct StalledResolver {
    calls: AtomicUsize,
}

#[async_trait]
impl HostResolver for StalledResolver {
    async fn lookup_host(&self, _name: &str) -> Result<Vec<IpAddr>, ProvisioningError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(vec![])
    }

    async fn reverse_lookup(&self, _ip: IpAddr) -> Result<Option<String>, ProvisioningError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(None)
    }
}

/// Node with whatever ids the test wants, including invalid ones
#[derive(Debug)]
struct RawNode {
    provider_id: String,
    id: String,
}

#[async_trait]
impl CustomNode for RawNode {
    fn provider_id(&self) -> &str {
        &self.provider_id
    }
    fn id(&self) -> &str {
        &self.id
    }
    fn host_name(&self) -> Option<&str> {
        None
    }
    fn login_port(&self) -> u16 {
        22
    }
    fn set_login_port(&mut self, _login_port: u16) {}
    fn username(&self) -> Option<&str> {
        None
    }
    fn credential(&self) -> Option<&SecretString> {
        None
    }
    fn key_file(&self) -> Option<&Path> {
        None
    }
    fn public_ip(&self) -> Option<&str> {
        None
    }
    fn private_ip(&self) -> Option<&str> {
        None
    }
    async fn resolve(&mut self, _resolver: &dyn HostResolver) -> Result<(), ProvisioningError> {
        Ok(())
    }
    fn set_node_name(&mut self, _node_name: String) {}
    fn node_name(&self) -> &str {
        ""
    }
    fn set_group(&mut self, _group: Option<String>) {}
    fn group(&self) -> Option<&str> {
        None
    }
    fn state(&self) -> NodeState {
        NodeState::Unresolved
    }
}

#[tokio::test]
async fn test_cloud_node_scenario_resolve_then_group() {
    let registry = registry();
    registry.register(aws_node("i-123", "10.0.0.5")).unwrap();

    registry.resolve("aws:us-east-1:i-123").await.unwrap();
    registry
        .set_group("aws:us-east-1:i-123", Some("web-tier".to_owned()))
        .await
        .unwrap();

    let (private_ip, host_name, group, public_ip) = registry
        .with_node("aws:us-east-1:i-123", |node| {
            (
                node.private_ip().map(ToOwned::to_owned),
                node.host_name().map(ToOwned::to_owned),
                node.group().map(ToOwned::to_owned),
                node.public_ip().map(ToOwned::to_owned),
            )
        })
        .await
        .unwrap();

    assert_eq!(private_ip.as_deref(), Some("10.0.0.5"));
    assert_eq!(host_name.as_deref(), Some("host-123"));
    assert_eq!(group.as_deref(), Some("web-tier"));
    assert!(public_ip.is_none());
}

#[tokio::test]
async fn test_id_is_stable_across_mutations() {
    let registry = registry();
    registry.register(aws_node("i-123", "10.0.0.5")).unwrap();
    let id = "aws:us-east-1:i-123";

    registry.set_node_name(id, "renamed".to_owned()).await.unwrap();
    registry.set_group(id, Some("g".to_owned())).await.unwrap();
    registry.resolve(id).await.unwrap();

    let current_id = registry
        .with_node(id, |node| node.id().to_owned())
        .await
        .unwrap();
    assert_eq!(current_id, id);
    assert_eq!(registry.ids(), vec![id.to_owned()]);
}

#[tokio::test]
async fn test_resolve_is_idempotent() {
    let registry = registry();
    registry
        .register(Box::new(
            ByonNode::new("db-1", LoginCredentials::default()).unwrap(),
        ))
        .unwrap();

    registry.resolve("byon:db-1").await.unwrap();
    let first = registry.short_description("byon:db-1").await.unwrap();
    registry.resolve("byon:db-1").await.unwrap();
    let second = registry.short_description("byon:db-1").await.unwrap();

    assert_eq!(first, second);
    assert!(first.contains("private_ip=10.0.1.10"));
    assert!(first.contains("host=db-1"));
}

#[tokio::test]
async fn test_group_cleared_with_none() {
    let registry = registry();
    registry.register(aws_node("i-1", "10.0.0.5")).unwrap();
    let id = "aws:us-east-1:i-1";

    registry.set_group(id, Some("web-tier".to_owned())).await.unwrap();
    registry.set_group(id, None).await.unwrap();

    let group = registry
        .with_node(id, |node| node.group().map(ToOwned::to_owned))
        .await
        .unwrap();
    assert!(group.is_none());
    assert!(registry.group_members("web-tier").await.is_empty());
}

#[tokio::test]
async fn test_register_rejects_duplicates_and_missing_ids() {
    let registry = registry();
    registry.register(aws_node("i-1", "10.0.0.5")).unwrap();

    let duplicate = registry.register(aws_node("i-1", "10.0.0.6")).unwrap_err();
    assert_eq!(
        duplicate,
        ProvisioningError::DuplicateNode("aws:us-east-1:i-1".to_owned())
    );

    let missing_provider_id = registry
        .register(Box::new(RawNode {
            provider_id: String::new(),
            id: "x".to_owned(),
        }))
        .unwrap_err();
    assert!(matches!(missing_provider_id, ProvisioningError::InvalidNode(_)));

    let missing_id = registry
        .register(Box::new(RawNode {
            provider_id: "p".to_owned(),
            id: String::new(),
        }))
        .unwrap_err();
    assert!(matches!(missing_id, ProvisioningError::InvalidNode(_)));
    assert_eq!(registry.len(), 1);
}

#[tokio::test]
async fn test_failed_resolution_reports_host_error_and_keeps_node() {
    let registry = registry();
    registry
        .register(Box::new(
            ByonNode::new("decommissioned", LoginCredentials::default()).unwrap(),
        ))
        .unwrap();

    let err = registry.resolve("byon:decommissioned").await.unwrap_err();

    assert!(err.is_host_resolution());
    let (state, private_ip) = registry
        .with_node("byon:decommissioned", |node| {
            (node.state(), node.private_ip().map(ToOwned::to_owned))
        })
        .await
        .unwrap();
    assert_eq!(state, NodeState::Unresolved);
    assert_eq!(private_ip.as_deref(), Some("decommissioned"));
}

#[tokio::test]
async fn test_resolve_times_out_without_mutating_node() {
    let resolver = Arc::new(StalledResolver {
        calls: AtomicUsize::new(0),
    });
    let registry = NodeRegistry::new(resolver.clone(), Duration::from_millis(20));
    registry.register(aws_node("i-9", "10.0.0.9")).unwrap();

    let err = registry.resolve("aws:us-east-1:i-9").await.unwrap_err();

    match err {
        ProvisioningError::HostResolution { host, reason } => {
            assert_eq!(host, "10.0.0.9");
            assert!(reason.starts_with("timed out"), "{reason}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
    let host_name = registry
        .with_node("aws:us-east-1:i-9", |node| node.host_name().map(ToOwned::to_owned))
        .await
        .unwrap();
    assert!(host_name.is_none());
}

#[tokio::test]
async fn test_resolve_all_reports_each_unresolved_node() {
    let registry = registry();
    registry.register(aws_node("i-1", "10.0.0.5")).unwrap();
    registry
        .register(Box::new(
            ByonNode::new("missing-host", LoginCredentials::default()).unwrap(),
        ))
        .unwrap();

    let outcomes = registry.resolve_all().await;

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes[0].1.is_ok(), "aws node sorts first and resolves");
    assert_eq!(outcomes[1].0, "byon:missing-host");
    assert!(outcomes[1].1.as_ref().unwrap_err().is_host_resolution());

    // Already resolved nodes are skipped on the next run.
    let outcomes = registry.resolve_all().await;
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].0, "byon:missing-host");
}

#[tokio::test]
async fn test_deregister_group_removes_only_group_members() {
    let registry = registry();
    for (id, group) in [("i-1", "web"), ("i-2", "web"), ("i-3", "db")] {
        registry.register(aws_node(id, "10.0.0.5")).unwrap();
        registry
            .set_group(&format!("aws:us-east-1:{id}"), Some(group.to_owned()))
            .await
            .unwrap();
    }

    assert_eq!(
        registry.group_members("web").await,
        vec!["aws:us-east-1:i-1".to_owned(), "aws:us-east-1:i-2".to_owned()]
    );

    let removed = registry.deregister_group("web").await;

    assert_eq!(removed.len(), 2);
    assert!(removed.iter().all(|node| node.group() == Some("web")));
    assert_eq!(registry.ids(), vec!["aws:us-east-1:i-3".to_owned()]);
}

#[tokio::test]
async fn test_deregistered_node_is_gone() {
    let registry = registry();
    registry.register(aws_node("i-1", "10.0.0.5")).unwrap();

    let node = registry.deregister("aws:us-east-1:i-1").await.unwrap();
    assert_eq!(node.id(), "aws:us-east-1:i-1");
    assert!(registry.is_empty());

    let err = registry.resolve("aws:us-east-1:i-1").await.unwrap_err();
    assert_eq!(
        err,
        ProvisioningError::NodeNotFound("aws:us-east-1:i-1".to_owned())
    );
    assert!(registry.deregister("aws:us-east-1:i-1").await.is_err());
}

#[tokio::test]
async fn test_concurrent_group_updates_on_different_nodes() {
    let registry = Arc::new(registry());
    for i in 0..10 {
        registry
            .register(aws_node(&format!("i-{i}"), "10.0.0.5"))
            .unwrap();
    }

    let mut handles = vec![];
    for i in 0..10 {
        let registry = Arc::clone(&registry);
        handles.push(tokio::spawn(async move {
            let group = if i % 2 == 0 { "even" } else { "odd" };
            registry
                .set_group(&format!("aws:us-east-1:i-{i}"), Some(group.to_owned()))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(registry.group_members("even").await.len(), 5);
    assert_eq!(registry.group_members("odd").await.len(), 5);
}
