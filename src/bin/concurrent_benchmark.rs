use concurrent_bloom::ConcurrentBloomFilter;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    println!("🦀 Concurrent Bloom Benchmark - Shared Filter Throughput");
    println!("{}", "=".repeat(55));

    // Configuration
    let capacity: u32 = 1_000_000;
    let false_positive_probability = 0.01;
    let query_count = 100_000usize;
    let thread_counts = [1usize, 2, 4, 8];

    println!("Testing thread counts: {:?}", thread_counts);
    println!();

    // Generate test data once so every run hashes the same keys
    let mut rng = StdRng::seed_from_u64(42);
    let keys: Vec<u64> = (0..capacity).map(|_| rng.gen()).collect();
    let query_keys: Vec<u64> = (0..query_count).map(|_| rng.gen()).collect();

    // Results storage
    let mut results = Vec::new();

    for &threads in &thread_counts {
        println!("🔬 Testing {} threads...", threads);

        let start = Instant::now();
        let filter = match ConcurrentBloomFilter::<u64>::with_probability(
            capacity,
            false_positive_probability,
        ) {
            Ok(filter) => filter,
            Err(e) => {
                eprintln!("failed to create filter: {}", e);
                std::process::exit(1);
            }
        };
        let creation_time = start.elapsed().as_secs_f64();

        // Insert benchmark: keys are split into one chunk per thread
        let chunk = (keys.len() + threads - 1) / threads;
        let start = Instant::now();
        std::thread::scope(|s| {
            for part in keys.chunks(chunk) {
                let filter = &filter;
                s.spawn(move || {
                    for key in part {
                        filter.add(key);
                    }
                });
            }
        });
        let insert_time = start.elapsed().as_secs_f64();

        // Query benchmark: every inserted key must be found
        let start = Instant::now();
        let hits: usize = std::thread::scope(|s| {
            let handles: Vec<_> = keys
                .chunks(chunk)
                .map(|part| {
                    let filter = &filter;
                    s.spawn(move || part.iter().filter(|key| filter.possibly_contains(key)).count())
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
                .sum()
        });
        let query_time = start.elapsed().as_secs_f64();

        // False positive test on keys that were (almost surely) never inserted
        let false_positives = query_keys
            .iter()
            .filter(|key| filter.possibly_contains(key))
            .count();

        let insert_rate = keys.len() as f64 / insert_time.max(f64::EPSILON);
        let query_rate = keys.len() as f64 / query_time.max(f64::EPSILON);
        let false_positive_rate = false_positives as f64 / query_keys.len() as f64;

        info!(
            threads,
            bit_count = filter.bit_count(),
            hash_count = filter.hash_count(),
            elements = filter.element_count(),
            error_probability = filter.error_probability(),
            "run complete"
        );

        results.push((
            threads,
            creation_time,
            insert_time,
            query_time,
            insert_rate,
            query_rate,
            hits,
            false_positives,
            false_positive_rate,
            filter.error_probability(),
        ));

        println!(
            "   ✅ Done - Insert rate: {:.0} ops/s, Query rate: {:.0} ops/s",
            insert_rate, query_rate
        );
    }

    // Print results in CSV format
    println!("\n📊 Results (CSV format):");
    println!("threads,creation_time,insert_time,query_time,insert_rate,query_rate,hits,false_positives,false_positive_rate,error_probability");

    for (
        threads,
        creation_time,
        insert_time,
        query_time,
        insert_rate,
        query_rate,
        hits,
        false_positives,
        fpr,
        error_probability,
    ) in &results
    {
        println!(
            "{},{:.6},{:.6},{:.6},{:.0},{:.0},{},{},{:.6},{:.6}",
            threads,
            creation_time,
            insert_time,
            query_time,
            insert_rate,
            query_rate,
            hits,
            false_positives,
            fpr,
            error_probability
        );
    }

    if let Some(&(threads, _, _, _, insert_rate, query_rate, hits, _, fpr, error_probability)) =
        results.last()
    {
        println!("\n🎯 Key Findings (at {} threads):", threads);
        println!("   Insert rate: {:.0} ops/s", insert_rate);
        println!("   Query rate: {:.0} ops/s", query_rate);
        println!("   Hits: {}/{}", hits, keys.len());
        println!("   Observed false positive rate: {:.4}", fpr);
        println!("   Predicted error probability: {:.4}", error_probability);
    }
}
