use std::sync::Arc;

use namelink::{
    BatchConfig, BatchResolver, Entity, MatchStatus, QueryRow, ReferenceIndex, Resolver,
    ResolverConfig,
};

fn roster() -> Arc<ReferenceIndex> {
    let mut rows: Vec<Entity> = (0..500)
        .map(|i| Entity::new(format!("p{i:04}"), format!("Surname{i}, Given{}", i % 37)))
        .collect();
    rows.push(Entity::new("dup-a", "Anne Lee"));
    rows.push(Entity::new("dup-b", "Lee Anne"));
    Arc::new(ReferenceIndex::build(rows))
}

fn queries() -> Vec<String> {
    (0..1_000)
        .map(|i| match i % 5 {
            0 => format!("Given{} Surname{}", (i / 5) % 37, (i / 5) % 37),
            1 => format!("SURNAME{}, given{}", i % 500, i % 500 % 37),
            2 => "lee anne anne".to_string(),
            3 => format!("unknown person {i}"),
            _ => String::new(),
        })
        .collect()
}

#[test]
fn batch_preserves_input_order_and_matches_sequential() {
    let index = roster();
    let queries = queries();

    let mut sequential = Resolver::with_defaults(Arc::clone(&index));
    let expected = sequential.resolve_all(&queries);

    for workers in [1, 2, 8] {
        let batch = BatchResolver::new(
            Arc::clone(&index),
            ResolverConfig::default(),
            BatchConfig::default().with_workers(workers),
        )
        .unwrap();
        let outcomes = batch.resolve_batch(&queries).unwrap();
        assert_eq!(outcomes, expected, "workers = {workers}");
    }

    assert_eq!(expected[2].status(), MatchStatus::Ambiguous);
    assert_eq!(expected[3].status(), MatchStatus::Unmatched);
    assert_eq!(expected[4].status(), MatchStatus::Unmatched);
}

#[test]
fn batch_audit_matches_sequential_audit() {
    let index = roster();
    let rows: Vec<QueryRow> = queries()
        .into_iter()
        .enumerate()
        .map(|(i, name)| QueryRow::new(name).with_original_id(format!("p{:04}", i % 500)))
        .collect();

    let fingerprint = index.fingerprint();
    let mut sequential = Resolver::with_defaults(Arc::clone(&index));
    let expected = sequential.audit(rows.clone(), Some(fingerprint.clone()));

    let config = BatchConfig::default().with_workers(4);
    let batch = BatchResolver::new(index, ResolverConfig::default(), config).unwrap();
    let audit = batch.audit_batch(rows, Some(fingerprint)).unwrap();

    assert_eq!(audit, expected);
    assert_eq!(audit.summary(), expected.summary());
}

#[test]
fn batch_rejects_invalid_configuration() {
    let index = roster();

    let no_workers = BatchConfig::default().with_workers(0);
    let err = BatchResolver::new(Arc::clone(&index), ResolverConfig::default(), no_workers)
        .err()
        .unwrap();
    assert!(err.is_validation());

    let no_queue = BatchConfig {
        workers: 2,
        queue_capacity: 0,
    };
    assert!(BatchResolver::new(Arc::clone(&index), ResolverConfig::default(), no_queue).is_err());

    let bad_threshold = ResolverConfig::default().with_similarity_threshold(f64::NAN);
    assert!(BatchResolver::new(index, bad_threshold, BatchConfig::default()).is_err());
}
