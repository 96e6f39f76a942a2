//! Basic usage of the typed cache façade.

use kit_cache::{
    backend::{CacheBackend, InMemoryBackend},
    error::Result,
    CacheConfig, CacheService, Envelope, ModelCache, OpContext,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Example entity: Employment
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
struct Employment {
    id: String,
    loanapp_id: String,
    employer_name: String,
    salary: f64,
    history: Vec<String>,
}

fn employment(id: &str, history_len: usize) -> Employment {
    Employment {
        id: id.to_string(),
        loanapp_id: "loan_123".to_string(),
        employer_name: "Acme Corp".to_string(),
        salary: 75000.0,
        history: (0..history_len)
            .map(|i| format!("review {} for {}: meets expectations", i, id))
            .collect(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Debug)
        .try_init()
        .ok();

    println!("\n=== Kit Cache - Basic Example ===\n");

    // 1. Initialize cache backend
    println!("1. Initializing in-memory cache backend...");
    let backend = InMemoryBackend::new();
    let cache = ModelCache::with_config(
        backend.clone(),
        CacheConfig {
            retry_times: 2,
            ..Default::default()
        },
    );
    println!("   ✓ Cache ready (gzip above {} bytes)\n", cache.config().gzip_min_size);

    // 2. Small value - stored as plain JSON
    println!("2. Storing a small employment record (emp_001):");
    let small = employment("emp_001", 1);
    cache
        .set_model("employment:emp_001", &small, Duration::from_secs(300))
        .await?;
    show_envelope(&backend, "employment:emp_001").await?;

    // 3. Large value - stored gzipped
    println!("3. Storing a large employment record (emp_002):");
    let large = employment("emp_002", 200);
    cache
        .set_model("employment:emp_002", &large, Duration::from_secs(300))
        .await?;
    show_envelope(&backend, "employment:emp_002").await?;

    // 4. Read both back
    println!("4. Reading records back:");
    for key in ["employment:emp_001", "employment:emp_002", "employment:emp_003"] {
        match cache.get_model::<Employment>(key).await? {
            Some(emp) => println!(
                "   ✓ {} -> {} (${:.2}, {} reviews)",
                key,
                emp.employer_name,
                emp.salary,
                emp.history.len()
            ),
            None => println!("   ✗ {} not cached", key),
        }
    }
    println!();

    // 5. Per-call context and retry override
    println!("5. Operation with a 500ms deadline and no retries:");
    let ctx = OpContext::with_timeout(Duration::from_millis(500));
    cache
        .operation()
        .with_context(&ctx)
        .with_retry(0)
        .delete("employment:emp_001")
        .await?;
    println!("   ✓ emp_001 deleted\n");

    // 6. Shared service across tasks
    println!("6. Sharing the cache across tasks:");
    let service = CacheService::from_cache(cache);
    let tasks: Vec<_> = (0..4)
        .map(|i| {
            let service = service.clone();
            tokio::spawn(async move {
                let key = format!("employment:task_{}", i);
                service
                    .set_model(&key, &employment(&key, i * 50), Duration::from_secs(60))
                    .await
            })
        })
        .collect();

    for result in futures::future::join_all(tasks).await {
        match result {
            Ok(stored) => stored?,
            Err(e) => eprintln!("   ✗ task failed: {}", e),
        }
    }
    println!("   ✓ {} entries in the backend\n", backend.len());

    println!("=== Example Complete ===\n");
    Ok(())
}

async fn show_envelope(backend: &InMemoryBackend, key: &str) -> Result<()> {
    if let Some(bytes) = backend.get(key).await? {
        match Envelope::from_bytes(&bytes) {
            Ok(envelope) => println!(
                "   ✓ {} stored with flag {} ({} payload bytes)\n",
                key,
                envelope.flag,
                envelope.data.len()
            ),
            Err(e) => println!("   ✗ {} is not an envelope: {}\n", key, e),
        }
    }
    Ok(())
}
