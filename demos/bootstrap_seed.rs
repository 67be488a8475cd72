//! Seeding calibration history for a fresh repository.

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;
use var_engine::prelude::*;

fn synthetic_closes(start: f64, drift: f64, swing: f64, days: usize) -> Vec<f64> {
    (0..days)
        .map(|i| {
            let t = i as f64;
            start * (drift * t).exp() * (1.0 + swing * (t * 0.9).sin())
        })
        .collect()
}

fn main() -> Result<(), VarError> {
    println!("╔══════════════════════════════════════════╗");
    println!("║    var-engine: Bootstrap Calibration     ║");
    println!("╚══════════════════════════════════════════╝\n");

    let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    let mut repo = InMemoryRepository::new()
        .with_prices("ADBL", PriceSeries::from_closes(start, &synthetic_closes(310.0, 0.0004, 0.02, 180))?)
        .with_prices("NABIL", PriceSeries::from_closes(start, &synthetic_closes(520.0, -0.0002, 0.015, 180))?)
        .with_prices("NICA", PriceSeries::from_closes(start, &synthetic_closes(880.0, 0.0001, 0.03, 40))?)
        .with_prices("UPPER", PriceSeries::from_closes(start, &[402.0])?);

    let engine = VarEngine::new(EngineConfig::default())?;
    let mut rng = StdRng::seed_from_u64(7);

    let report = bootstrap(&engine, &mut repo, &mut rng)?;
    for result in &report.seeded {
        println!(
            "  {:<8} {:>3} days at {:>6.2}%  VaR {:>8.2} ({:.2}%)",
            result.instrument_id,
            result.horizon_days,
            result.confidence_level * 100.0,
            result.var_amount,
            result.var_percentage
        );
    }
    for (id, reason) in &report.skipped {
        println!("  {:<8} skipped: {}", id, reason);
    }

    println!("\n━━━ Steady state ━━━\n");
    let nabil = InstrumentId::new("NABIL");
    let calibrated = engine
        .calibrator()
        .calibrate(&nabil, &repo.load_confidence_history(&nabil)?);
    println!("Calibrated confidence for NABIL: {:.4}", calibrated);
    let result = engine.run(&nabil, 30, &mut repo, &mut rng)?;
    println!("{}", result);
    Ok(())
}
