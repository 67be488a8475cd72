//! One VaR run against an in-memory repository.
//!
//! Shows the default-confidence path, then the calibrated path once
//! confidence history exists.

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;
use var_engine::prelude::*;

fn main() -> Result<(), VarError> {
    println!("╔══════════════════════════════════════════╗");
    println!("║      var-engine: Single VaR Run          ║");
    println!("╚══════════════════════════════════════════╝\n");

    let closes = [
        512.0, 508.5, 515.2, 520.0, 517.3, 511.8, 509.0, 514.6, 522.1, 525.4, 519.9, 516.2, 521.7,
        527.3, 530.0, 526.8, 523.1, 528.9, 533.4, 529.6,
    ];
    let start = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();
    let prices = PriceSeries::from_closes(start, &closes)?;

    let nabil = InstrumentId::new("NABIL");
    let mut repo = InMemoryRepository::new().with_prices(nabil.clone(), prices);
    let engine = VarEngine::new(EngineConfig::default())?;
    let mut rng = StdRng::seed_from_u64(42);

    println!("━━━ Run 1: no history, default confidence ━━━\n");
    let first = engine.run(&nabil, 15, &mut repo, &mut rng)?;
    println!("{}", first);

    println!("━━━ Run 2: calibrated from recorded history ━━━\n");
    repo.save_confidence_record(&nabil, 0.97)?;
    repo.save_confidence_record(&nabil, 0.99)?;
    let second = engine.run(&nabil, 15, &mut repo, &mut rng)?;
    println!("{}", second);

    println!("━━━ Run 3: horizon beyond history (clamped) ━━━\n");
    let third = engine.run(&nabil, 90, &mut repo, &mut rng)?;
    println!("{}", third);

    println!("Stored results: {}", repo.results().len());
    Ok(())
}
