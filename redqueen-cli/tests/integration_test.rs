//! Integration tests for the Red Queen coevolution engine
//!
//! Tests the full stack: genomes, battle simulation, the researcher,
//! fitness evaluation, the candidate pool and the orchestrator

use redqueen_core::{
    Archetype, BattleConfig, BattleRecord, BattleSimulator, BattleState, Candidate, CandidateRecord, Genome, Team,
    Trait, VictoryType, Winner,
};
use redqueen_evolve::{crossover_genomes, mutate_genome, MutationConfig, ResearchConfig, Researcher};
use redqueen_lab::{
    run_battle, run_bench_parallel, CandidatePool, ControlHandle, EvolutionEvent, FitnessEvaluator, FitnessWeights,
    LabConfig, Orchestrator, PoolConfig, RunnerConfig,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// ============================================================================
// TEST FIXTURES
// ============================================================================

/// Short battles so the full loop stays fast
fn quick_lab(seed: u64) -> LabConfig {
    LabConfig {
        seed,
        battle: BattleConfig { max_duration: 30.0, min_duration: 10.0, ..BattleConfig::default() },
        ..LabConfig::default()
    }
}

fn play(seed: u64, red: &[Genome], blue: &[Genome]) -> redqueen_core::BattleResult {
    let mut sim = BattleSimulator::new(BattleConfig::default(), seed);
    sim.start(red, blue);
    while sim.tick(0.05) != BattleState::Ended {}
    sim.take_result().expect("ended battle has a result")
}

fn assert_pool_pure(pool: &CandidatePool) {
    for c in pool.members() {
        assert_eq!(c.team(), c.lineage(), "cross-team candidate in pool");
    }
    for team in Team::ALL {
        assert!(pool.team_len(team) <= pool.config().per_team_cap);
    }
}

// ============================================================================
// GENETIC OPERATOR TESTS
// ============================================================================

#[test]
fn test_operators_keep_traits_in_range() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let wild = MutationConfig { rate: 1.0, scale: 2.0 };

    let mut a = Genome::uniform(1.0);
    let mut b = Genome::uniform(0.0);
    for _ in 0..500 {
        let child = crossover_genomes(&a, &b, 0.5, &mut rng);
        let child = mutate_genome(&child, &wild, &mut rng);
        for (_, v) in child.iter() {
            assert!((0.0..=1.0).contains(&v), "trait out of range: {}", v);
        }
        a = b;
        b = child;
    }
}

#[test]
fn test_researcher_many_generations() {
    let researcher = Researcher::new(ResearchConfig { proposals_per_team: 5, ..ResearchConfig::default() });
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut parents: Vec<Candidate> = Vec::new();

    for generation in 0..30 {
        let proposals = researcher.propose(Team::Blue, &parents, &[], generation, &mut rng);
        assert_eq!(proposals.len(), 5);
        parents = proposals
            .into_iter()
            .enumerate()
            .map(|(i, p)| Candidate::new(Team::Blue, p.genome, generation).with_fitness(i as f32 / 5.0))
            .collect();
        for c in &parents {
            assert!(c.genome().iter().all(|(_, v)| (0.0..=1.0).contains(&v)));
        }
    }
}

// ============================================================================
// BATTLE TESTS
// ============================================================================

#[test]
fn test_identical_seeds_replay_exactly() {
    let red = vec![Archetype::Skirmisher.preset(); 3];
    let blue = vec![Archetype::Tactician.preset(); 3];
    let a = play(1234, &red, &blue);
    let b = play(1234, &red, &blue);

    assert_eq!(a.winner, b.winner);
    assert_eq!(a.duration.to_bits(), b.duration.to_bits());
    assert_eq!(a.control_point_summary.timeline, b.control_point_summary.timeline);
    assert_eq!(a, b);
}

#[test]
fn test_every_battle_resolves() {
    let config = BattleConfig::default();
    for seed in 0..8 {
        let red = vec![Genome::team_biased(Team::Red, &mut ChaCha8Rng::seed_from_u64(seed)); 2];
        let blue = vec![Genome::team_biased(Team::Blue, &mut ChaCha8Rng::seed_from_u64(seed + 100)); 2];
        let result = play(seed, &red, &blue);

        match result.victory_type {
            VictoryType::Elimination => {
                let (r, b) = (result.survivors.red, result.survivors.blue);
                match result.winner {
                    Winner::Red => assert!(r > 0 && b == 0),
                    Winner::Blue => assert!(b > 0 && r == 0),
                    Winner::Draw => assert!(r == 0 && b == 0),
                    Winner::Timeout => panic!("elimination cannot time out"),
                }
                assert!(result.duration <= config.max_duration + 0.1);
            }
            VictoryType::Control => assert!(result.winner.team().is_some()),
            VictoryType::Timeout => {
                assert_eq!(result.winner, Winner::Timeout);
                assert!(result.duration >= config.min_duration);
            }
        }
        let hill = &result.control_point_summary;
        assert!((0.0..=100.0).contains(&hill.final_progress));
    }
}

#[tokio::test]
async fn test_runner_matches_manual_loop() {
    let red = vec![Archetype::Berserker.preset(); 3];
    let blue = vec![Archetype::Guardian.preset(); 3];
    let manual = play(77, &red, &blue);

    let mut sim = BattleSimulator::new(BattleConfig::default(), 77);
    let run = run_battle(&mut sim, &red, &blue, &RunnerConfig::default(), &ControlHandle::running())
        .await
        .unwrap();
    assert_eq!(run.result, manual);
}

#[test]
fn test_bench_counts_all_battles() {
    let config = BattleConfig { max_duration: 30.0, ..BattleConfig::default() };
    let red = vec![Archetype::Berserker.preset(); 2];
    let blue = vec![Archetype::Sniper.preset(); 2];
    let result = run_bench_parallel(&config, &red, &blue, 8, 9, 0.05);
    assert_eq!(result.battles_played, 8);
    assert_eq!(result.red_wins + result.blue_wins + result.draws + result.timeouts, 8);
}

// ============================================================================
// EVALUATION AND POOL TESTS
// ============================================================================

#[test]
fn test_scored_battle_feeds_pure_pool() {
    let red = vec![Archetype::Berserker.preset(), Archetype::Skirmisher.preset()];
    let blue = vec![Archetype::Guardian.preset(), Archetype::Sniper.preset()];
    let result = play(5, &red, &blue);
    let evaluator = FitnessEvaluator::new(FitnessWeights::default(), BattleConfig::default().max_duration);
    let mut pool = CandidatePool::new(PoolConfig::default());

    for (team, lineup) in [(Team::Red, &red), (Team::Blue, &blue)] {
        let team_pool = pool.genomes(team);
        let scored: Vec<Candidate> = lineup
            .iter()
            .enumerate()
            .map(|(i, g)| {
                let f = evaluator.evaluate(team, i, g, &result, &team_pool);
                assert!((0.0..=1.0).contains(&f.total));
                Candidate::new(team, *g, 0).with_outcome(f.total, result.winner.team() == Some(team))
            })
            .collect();
        pool.add_batch(scored);
    }

    assert_pool_pure(&pool);
    assert_eq!(pool.team_len(Team::Red), 2);
    assert_eq!(pool.team_len(Team::Blue), 2);

    // Same genomes again: merged, not inserted
    pool.add_batch(vec![Candidate::new(Team::Red, red[0], 1).with_outcome(0.99, true)]);
    assert_eq!(pool.team_len(Team::Red), 2);
    let best = pool.best(Team::Red).unwrap();
    assert_eq!(best.battles(), 2);
}

#[test]
fn test_record_roundtrip_rejects_foreign_lineage() {
    let json = r#"[
        {"genome": [0.8,0.8,0.5,0.2,0.5,0.5,0.5,0.8,0.5], "fitness": 0.6, "team": "red", "lineage": "red"},
        {"genome": {"accuracy": 0.9, "defense": 0.8}, "fitness": 0.7, "team": "blue", "lineage": "red"}
    ]"#;
    let records: Vec<CandidateRecord> = serde_json::from_str(json).unwrap();
    let mut pool = CandidatePool::new(PoolConfig::default());
    assert_eq!(pool.import(records), 1);
    assert_pool_pure(&pool);
    assert_eq!(pool.team_len(Team::Blue), 0);
}

// ============================================================================
// ORCHESTRATOR TESTS
// ============================================================================

#[tokio::test]
async fn test_full_loop_two_generations() {
    let mut orch = Orchestrator::new(quick_lab(2024));
    let mut events = orch.subscribe();

    orch.start();
    let done = orch.run(10).await.unwrap();
    assert_eq!(done, 10);
    assert_eq!(orch.generation(), 2);
    assert_eq!(orch.history().len(), 10);
    assert_pool_pure(orch.pool());

    let mut generation_events = 0;
    while let Ok(event) = events.try_recv() {
        if let EvolutionEvent::GenerationComplete { .. } = event {
            generation_events += 1;
        }
    }
    assert_eq!(generation_events, 2);
}

#[tokio::test]
async fn test_reset_then_rerun_is_identical() {
    let mut orch = Orchestrator::new(quick_lab(99));
    orch.start();
    orch.run(4).await.unwrap();
    let first: Vec<BattleRecord> = orch.history().to_vec();

    orch.reset();
    orch.start();
    orch.run(4).await.unwrap();
    assert_eq!(orch.history(), first.as_slice());
}

#[tokio::test]
async fn test_counter_evolution_reacts_to_opponent() {
    // An aggressive red history should push blue offspring toward defense
    let researcher = Researcher::new(ResearchConfig {
        proposals_per_team: 30,
        elite_fraction: 0.0,
        mutation: MutationConfig { rate: 0.0, scale: 0.0 },
        crossover_jitter: 0.0,
        emergent_probability: 0.0,
        ..ResearchConfig::default()
    });
    let mut aggressive = Genome::default();
    aggressive.set(Trait::Aggression, 0.95);
    let red = vec![aggressive; 3];
    let blue = vec![Genome::default(); 3];
    let result = play(8, &red, &blue);
    let history = vec![BattleRecord::from_result(&result, &red, &blue, 0, 0)];

    let parents: Vec<Candidate> = (0..4).map(|_| Candidate::new(Team::Blue, Genome::default(), 0)).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let proposals = researcher.propose(Team::Blue, &parents, &history, 0, &mut rng);
    assert!(proposals.iter().all(|p| p.genome.defense() > 0.5));
}
