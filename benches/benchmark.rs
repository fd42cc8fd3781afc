//! Benchmarks for policy derivation and effective-role expansion.

use catalog_security::{
    AccessDecisionEngine, CatalogMode, CatalogObject, DataStore, Layer, MemoryBackend, Principal,
    Resource, Role, RoleCalculator, RoleMaps, RoleService, SecurityContext, StaticWorkspaces,
    StoreKind, UserGroupMaps, UserGroupService, Workspace, WorkspaceRule, WorkspaceRuleSet,
};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;

fn setup_engine() -> AccessDecisionEngine {
    let roles = RoleService::new("roles", MemoryBackend::<RoleMaps>::new()).unwrap();
    let users = UserGroupService::new("users", MemoryBackend::<UserGroupMaps>::new()).unwrap();

    let rules = WorkspaceRuleSet::new();
    for i in 0..100 {
        rules.set_rule(
            format!("ws{i}"),
            WorkspaceRule::deny_all()
                .read_roles(["ROLE_READER"])
                .write_roles(["ROLE_WRITER"]),
        );
    }

    let workspaces = StaticWorkspaces::new();
    for i in 0..100 {
        workspaces.add(Workspace::new(format!("ws{i}")));
    }

    let context = SecurityContext::new(
        roles,
        users,
        Arc::new(rules),
        Arc::new(workspaces),
        CatalogMode::Hide,
    );
    AccessDecisionEngine::new(Arc::new(context))
}

fn bench_policy_for(c: &mut Criterion) {
    let engine = setup_engine();
    let principal = Principal::named("alice").with_authority(Role::new("ROLE_READER"));
    let store = DataStore::new("shapes", "ws42", StoreKind::Vector);
    let layer = CatalogObject::Layer(Layer::new("states", Resource::new("states", store)));

    c.bench_function("policy_for_layer", |b| {
        b.iter(|| {
            engine
                .policy_for(black_box(&principal), black_box(&layer), false)
                .unwrap()
        })
    });
}

fn bench_filter(c: &mut Criterion) {
    let engine = setup_engine();
    let principal = Principal::named("alice").with_authority(Role::new("ROLE_READER"));

    let objects: Vec<CatalogObject> = (0..100)
        .map(|i| {
            let store = DataStore::new("shapes", format!("ws{i}"), StoreKind::Vector);
            CatalogObject::Layer(Layer::new(
                format!("layer{i}"),
                Resource::new(format!("res{i}"), store),
            ))
        })
        .collect();

    c.bench_function("filter_100_layers", |b| {
        b.iter(|| engine.filter(black_box(&principal), &objects, false).unwrap())
    });
}

fn bench_effective_roles(c: &mut Criterion) {
    let roles = RoleService::new("roles", MemoryBackend::<RoleMaps>::new()).unwrap();
    let users = UserGroupService::new("users", MemoryBackend::<UserGroupMaps>::new()).unwrap();

    let mut store = roles.create_store().unwrap();
    // A ten-deep chain with the user assigned the leaf role.
    for i in 0..10 {
        store.add_role(Role::new(format!("ROLE_{i}"))).unwrap();
    }
    for i in 1..10 {
        store
            .set_parent_role(&format!("ROLE_{i}"), Some(&format!("ROLE_{}", i - 1)))
            .unwrap();
    }
    store.associate_role_to_user("alice", "ROLE_9").unwrap();
    store.store().unwrap();

    c.bench_function("effective_roles_deep_chain", |b| {
        b.iter(|| {
            let calc = RoleCalculator::new(&roles, &users);
            calc.effective_roles_of(black_box("alice"))
        })
    });
}

criterion_group!(
    benches,
    bench_policy_for,
    bench_filter,
    bench_effective_roles
);
criterion_main!(benches);
