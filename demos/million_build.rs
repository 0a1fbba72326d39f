use hdc_mph::{BuildConfig, Builder, HashKind, MphError};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::collections::HashSet;
use std::time::Instant;

const N_KEYS: usize = 1_000_000;
const GEN_SEED: u64 = 42;

fn main() -> Result<(), MphError> {
    println!("--- hdc_mph test ---");
    println!("n = {N_KEYS}");

    // 1) Generate unique keys
    let t0 = Instant::now();
    let keys = gen_unique_keys(N_KEYS, GEN_SEED);
    let gen_s = t0.elapsed().as_secs_f64();
    println!(
        "gen:    {:>8.3} s   ({:.1} M keys/s)",
        gen_s,
        N_KEYS as f64 / gen_s / 1e6
    );

    // 2) Build
    let cfg = BuildConfig {
        hash: HashKind::Xxh3,
        // Generous but finite: a bad run reports instead of spinning.
        max_seed_attempts: 1 << 26,
        ..Default::default()
    };
    let t1 = Instant::now();
    let table = Builder::new().with_config(cfg).build(&keys)?;
    let build_s = t1.elapsed().as_secs_f64();
    println!(
        "build:  {:>8.3} s   ({:.1} M keys/s)   level0={} level1={} max_seed={}",
        build_s,
        N_KEYS as f64 / build_s / 1e6,
        table.level0_len(),
        table.level1_len(),
        table.max_seed()
    );

    // 3) Lookup all keys, plus as many misses
    let t2 = Instant::now();
    let mut acc: u64 = 0;
    let mut misses = 0usize;
    for chunk in keys.chunks(32_768) {
        for k in chunk {
            let (i, found) = table.lookup(k);
            acc ^= i as u64;
            if !found {
                misses += 1;
            }
        }
    }
    let lookup_s = t2.elapsed().as_secs_f64();
    println!(
        "lookup: {:>8.3} s   ({:.1} M lookups/s)   (acc={acc}, misses={misses})",
        lookup_s,
        N_KEYS as f64 / lookup_s / 1e6
    );

    let absent = gen_unique_keys(N_KEYS, GEN_SEED + 1);
    let false_hits = absent.iter().filter(|k| table.contains(k)).count();
    println!("absent: {false_hits} of {N_KEYS} random 16-byte probes reported present");

    #[cfg(feature = "serde")]
    {
        let bytes = table.to_bytes()?;
        println!("serialized: {:.1} MiB", bytes.len() as f64 / (1024.0 * 1024.0));
    }

    println!("----------------------------------------------");
    println!(
        "Total (gen + build + lookup): {:.3} s",
        gen_s + build_s + lookup_s
    );

    Ok(())
}

/// Generate N unique 16-byte keys (raw bytes), deterministically.
fn gen_unique_keys(n: usize, seed: u64) -> Vec<Vec<u8>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut set = HashSet::with_capacity(n * 2);
    let mut keys = Vec::with_capacity(n);
    while keys.len() < n {
        let mut buf = [0u8; 16];
        rng.fill_bytes(&mut buf);
        if set.insert(buf) {
            keys.push(buf.to_vec());
        }
    }
    keys
}
