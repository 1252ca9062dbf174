use bastion::iam::{evaluate, PatternMatcher};
use bastion::{
    AuthorizationEngine, CallerContext, ExternalResource, Group, GroupRepo, MemoryStore, Policy,
    PolicyRepo, Statement, Urn, User, UserRepo,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;

/// Create a policy with allow and deny statements over several resource trees
fn create_complex_policy(name: &str) -> Policy {
    Policy::new(
        "org1",
        name,
        "/",
        vec![
            Statement::allow(["example:Get"], ["urn:ews:example:instance:public/*"]),
            Statement::allow(
                ["example:Get", "example:Put"],
                ["urn:ews:example:instance:users/*/documents/*"],
            ),
            Statement::deny(["example:Put"], ["urn:ews:example:instance:system/*"]),
        ],
    )
}

/// Engine backed by a store where `alice` belongs to `groups` groups, each with one policy
fn create_engine(groups: usize) -> AuthorizationEngine {
    let store = Arc::new(MemoryStore::new());
    let user = store.add_user(User::new("alice", "/")).unwrap();

    for i in 0..groups {
        let group = store
            .add_group(Group::new("org1", &format!("g{}", i), "/"))
            .unwrap();
        let policy = store
            .add_policy(create_complex_policy(&format!("p{}", i)))
            .unwrap();
        store.add_member(&user.id, &group.id).unwrap();
        store.attach_policy(&group.id, &policy.id).unwrap();
    }

    AuthorizationEngine::with_store(store)
}

/// Benchmark single-resource evaluation against an in-memory policy set
fn bench_policy_eval(c: &mut Criterion) {
    let eval_counts = vec![100, 1_000, 10_000];

    let mut group = c.benchmark_group("policy_eval");

    for count in eval_counts {
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let policies = vec![create_complex_policy("complex")];
            let urns: Vec<_> = (0..count)
                .map(|i| {
                    Urn::from_external(format!("urn:ews:example:instance:public/file_{}", i))
                })
                .collect();

            b.iter(|| {
                for urn in &urns {
                    black_box(evaluate(&policies, "example:Get", urn));
                }
            });
        });
    }

    group.finish();
}

/// Benchmark wildcard pattern matching performance
fn bench_wildcard_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("wildcard_matching");

    group.bench_function("simple_wildcard", |b| {
        b.iter(|| {
            for i in 0..100 {
                let candidate = format!("urn:iws:iam:org1:group/team{}/g", i);
                black_box(PatternMatcher::matches("urn:iws:iam:org1:group/*", &candidate));
            }
        });
    });

    group.bench_function("trailing_segments", |b| {
        b.iter(|| {
            for i in 0..100 {
                let candidate = format!("urn:ews:example:instance:a{}:b:c", i);
                black_box(PatternMatcher::matches("urn:ews:*", &candidate));
            }
        });
    });

    group.bench_function("mixed_wildcards", |b| {
        b.iter(|| {
            for i in 0..100 {
                let candidate = format!("urn:iws:iam:org{}:policy/projects/p/code/main", i);
                black_box(PatternMatcher::matches(
                    "urn:iws:iam:*:policy/projects/*/code/*",
                    &candidate,
                ));
            }
        });
    });

    group.finish();
}

/// Benchmark policy with many statements
fn bench_policy_complexity(c: &mut Criterion) {
    let statement_counts = vec![5, 25, 100];

    let mut group = c.benchmark_group("policy_complexity");

    for count in statement_counts {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let statements: Vec<_> = (0..count)
                .map(|i| {
                    Statement::allow(
                        ["example:Get"],
                        [format!("urn:ews:example:instance:tree{}/*", i)],
                    )
                })
                .collect();
            let policies = vec![Policy::new("org1", "wide", "/", statements)];
            let urn = Urn::from_external(format!(
                "urn:ews:example:instance:tree{}/leaf",
                count - 1
            ));

            b.iter(|| black_box(evaluate(&policies, "example:Get", &urn)));
        });
    }

    group.finish();
}

/// Benchmark filtering candidate lists through the engine, store lookups included
fn bench_filter_candidates(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_candidates");

    for groups in [1usize, 10] {
        let engine = create_engine(groups);
        let alice = CallerContext::user("alice");

        for count in [10usize, 1_000] {
            let candidates: Vec<_> = (0..count)
                .map(|i| {
                    ExternalResource::new(Urn::from_external(format!(
                        "urn:ews:example:instance:users/u{}/documents/d",
                        i
                    )))
                })
                .collect();

            group.throughput(Throughput::Elements(count as u64));
            group.bench_with_input(
                BenchmarkId::new(format!("groups_{}", groups), count),
                &candidates,
                |b, candidates| {
                    b.iter(|| {
                        let allowed = engine
                            .authorize(&alice, "example:Put", candidates.clone())
                            .unwrap();
                        black_box(allowed);
                    });
                },
            );
        }
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_policy_eval,
    bench_wildcard_matching,
    bench_policy_complexity,
    bench_filter_candidates
);
criterion_main!(benches);
