use rand::{rngs::StdRng, SeedableRng};
use sociogram::{
    centrality::Index,
    config::AnalysisConfig,
    error::Error,
    generate::{self, GeneratorOptions},
    graph::Graph,
    vertex::VertexId,
};

const EPSILON: f64 = 1e-9;

fn build(directed: bool, n: usize, ties: &[(VertexId, VertexId)]) -> Graph {
    let mut graph = Graph::new(directed);
    for _ in 0..n {
        graph.add_vertex();
    }
    for &(source, target) in ties {
        graph.add_edge(source, target, 1.0).unwrap();
    }
    graph
}

fn random(seed: u64, directed: bool) -> Graph {
    let mut rng = StdRng::seed_from_u64(seed);
    let options = GeneratorOptions::default().with_directed(directed);
    generate::erdos_renyi_gnp(30, 0.15, &options, &mut rng).unwrap()
}

#[test]
fn undirected_adjacency_is_symmetric() {
    for seed in 0..5 {
        let graph = random(seed, false);
        let adjacency = graph
            .snapshot(&AnalysisConfig::default())
            .adjacency_matrix()
            .into_matrix();

        assert_eq!(adjacency, adjacency.transpose());
    }
}

#[test]
fn pagerank_sums_to_one() {
    for seed in 0..5 {
        let graph = random(seed, true);
        let scores = Index::PageRank
            .compute(&graph.snapshot(&AnalysisConfig::default()), &mut ())
            .unwrap();

        assert!((scores.sum() - 1.0).abs() < 1e-6, "sum {}", scores.sum());
    }
}

#[test]
fn eigenvector_is_non_negative() {
    // A connected small world network.
    let mut rng = StdRng::seed_from_u64(7);
    let graph =
        generate::watts_strogatz(20, 4, 0.0, &GeneratorOptions::default(), &mut rng).unwrap();
    let snapshot = graph.snapshot(&AnalysisConfig::default());
    assert!(snapshot.is_connected());

    let scores = Index::Eigenvector.compute(&snapshot, &mut ()).unwrap();

    assert!(scores.iter().all(|(_, score)| score.raw >= 0.0));
}

#[test]
fn distances_and_reachability() {
    for (seed, directed) in [(1, false), (2, true)] {
        let graph = random(seed, directed);
        let snapshot = graph.snapshot(&AnalysisConfig::default());
        let distances = snapshot.distance_matrix().into_matrix();
        let reachability = snapshot.reachability_matrix().into_matrix();

        for i in 0..snapshot.len() {
            assert_eq!(distances[(i, i)], 0.0);

            for j in 0..snapshot.len() {
                if !directed {
                    assert_eq!(distances[(i, j)], distances[(j, i)]);
                }

                let reachable = reachability[(i, j)] == 1.0;
                assert_eq!(reachable, distances[(i, j)].is_finite());
            }
        }
    }
}

#[test]
fn laplacian_is_degree_minus_adjacency() {
    for seed in 0..3 {
        let graph = random(seed, false);
        let snapshot = graph.snapshot(&AnalysisConfig::default());

        assert_eq!(
            snapshot.laplacian_matrix().into_matrix(),
            snapshot.degree_matrix().into_matrix() - snapshot.adjacency_matrix().into_matrix()
        );
    }
}

#[test]
fn star() {
    let graph = build(false, 5, &[(1, 2), (1, 3), (1, 4), (1, 5)]);
    let snapshot = graph.snapshot(&AnalysisConfig::default());

    let betweenness = Index::Betweenness.compute(&snapshot, &mut ()).unwrap();
    let degree = Index::Degree.compute(&snapshot, &mut ()).unwrap();

    assert_eq!(betweenness.raw(1), Some(6.0));
    assert_eq!(degree.raw(1), Some(4.0));
    for leaf in 2..=5 {
        assert_eq!(betweenness.raw(leaf), Some(0.0));
        assert_eq!(degree.raw(leaf), Some(1.0));
    }
    assert_eq!(degree.centralization(), Some(1.0));
}

#[test]
fn isolates_leave_the_degree_denominator() {
    let graph = build(false, 4, &[(1, 2), (2, 3)]);

    let kept = Index::Degree
        .compute(&graph.snapshot(&AnalysisConfig::default()), &mut ())
        .unwrap();
    assert_eq!(kept.len(), 4);
    assert!((kept.standardized(2).unwrap() - 2.0 / 3.0).abs() < EPSILON);
    assert_eq!(kept.standardized(4), Some(0.0));

    let config = AnalysisConfig::new().with_drop_isolates(true);
    let dropped = Index::Degree
        .compute(&graph.snapshot(&config), &mut ())
        .unwrap();
    assert_eq!(dropped.len(), 3);
    assert_eq!(dropped.standardized(2), Some(1.0));
    assert_eq!(dropped.standardized(1), Some(0.5));
    assert_eq!(dropped.get(4), None);
}

#[test]
fn complete_graph() {
    let mut graph = build(false, 5, &[]);
    graph.make_clique(&[1, 2, 3, 4, 5]).unwrap();
    let snapshot = graph.snapshot(&AnalysisConfig::default());

    let closeness = Index::Closeness.compute(&snapshot, &mut ()).unwrap();
    let degree = Index::Degree.compute(&snapshot, &mut ()).unwrap();

    for id in 1..=5 {
        assert_eq!(closeness.raw(id), Some(0.25));
        assert_eq!(degree.raw(id), Some(4.0));
    }
}

#[test]
fn directed_triangle() {
    let graph = build(true, 3, &[(1, 2), (2, 3), (3, 1)]);
    let snapshot = graph.snapshot(&AnalysisConfig::default());

    let prestige = Index::DegreePrestige.compute(&snapshot, &mut ()).unwrap();
    let pagerank = Index::PageRank.compute(&snapshot, &mut ()).unwrap();

    for id in 1..=3 {
        assert_eq!(prestige.raw(id), Some(1.0));

        let rank = pagerank.raw(id).unwrap();
        assert!((rank - 1.0 / 3.0).abs() < 1e-6, "rank {rank}");
    }
}

#[test]
fn two_components() {
    let graph = build(false, 6, &[(1, 2), (2, 3), (4, 5), (5, 6)]);
    let snapshot = graph.snapshot(&AnalysisConfig::default());

    assert_eq!(
        Index::Closeness.compute(&snapshot, &mut ()),
        Err(Error::DisconnectedGraph {
            index: Index::Closeness.name()
        })
    );

    let influence = Index::InfluenceRangeCloseness
        .compute(&snapshot, &mut ())
        .unwrap();
    assert!(influence
        .iter()
        .all(|(_, score)| score.raw.is_finite() && score.raw > 0.0));
    assert!((influence.raw(2).unwrap() - influence.raw(5).unwrap()).abs() < EPSILON);
}

#[test]
fn erdos_renyi_edge_count() {
    let (n, p) = (100, 0.5);
    let expected = p * (n * (n - 1) / 2) as f64;
    // Five standard deviations of the binomial edge count.
    let tolerance = 5.0 * (expected * (1.0 - p)).sqrt();

    for seed in 0..5 {
        let mut rng = StdRng::seed_from_u64(seed);
        let graph =
            generate::erdos_renyi_gnp(n, p, &GeneratorOptions::default(), &mut rng).unwrap();

        let edges = graph.edge_count() as f64;
        assert!((edges - expected).abs() < tolerance, "{edges} edges");
    }
}

#[test]
fn odd_regular_degree_is_rejected() {
    let mut rng = StdRng::seed_from_u64(0);

    assert!(matches!(
        generate::regular(10, 3, &GeneratorOptions::default(), &mut rng),
        Err(Error::InvalidParameter(_))
    ));
}

#[test]
fn vertex_removal_with_several_relations() {
    let mut graph = build(false, 3, &[(1, 2)]);
    graph.add_relation("advice");

    assert_eq!(
        graph.remove_vertex(1),
        Err(Error::MultiRelationConstraint { relations: 2 })
    );
}

#[test]
fn clique_of_two() {
    let mut graph = build(false, 3, &[]);

    assert_eq!(
        graph.make_clique(&[1, 2]),
        Err(Error::InsufficientSelection {
            required: 3,
            got: 2
        })
    );
}

#[test]
fn config_from_json() {
    let config: AnalysisConfig =
        serde_json::from_str(r#"{ "consider_weights": true, "limits": { "expensive_size": 50 } }"#)
            .unwrap();

    assert!(config.consider_weights);
    assert_eq!(config.limits.expensive_size, 50);
    assert!(!config.limits.confirmed);
    assert_eq!(config.max_iterations, AnalysisConfig::default().max_iterations);
}
