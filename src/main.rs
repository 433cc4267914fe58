use anyhow::Result;
use std::env;

use colony_loss::{
    extract_raw_table, merge_loss_tables, write_merged_csv, write_merged_json,
    PipelineConfig, MERGED_CSV_FILE, MERGED_JSON_FILE,
};

fn main() -> Result<()> {
    env_logger::init();

    // Optional positional arg: the data directory (defaults to the working
    // directory, like the original). `--json` additionally writes the
    // merged table as JSON.
    let args: Vec<String> = env::args().collect();
    let mut data_dir = ".".to_string();
    let mut emit_json = false;
    for arg in &args[1..] {
        if arg == "--json" {
            emit_json = true;
        } else {
            data_dir = arg.clone();
        }
    }

    let cfg = PipelineConfig::new(&data_dir);

    println!("🐝 Bee Colony Loss Wrangle - raw survey table → analysis-ready dataset");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // 1. Canonicalize the raw loss table
    println!("\n📥 Canonicalizing {}...", cfg.raw_loss_file);
    let canonical = extract_raw_table(&cfg)?;
    println!(
        "✓ {} rows written to {}",
        canonical.len(),
        cfg.intermediate_file
    );

    // 2. Clean, then left-join the reference tables
    println!("\n🧹 Cleaning and merging reference tables...");
    let merged = merge_loss_tables(&cfg)?;
    println!("✓ {} analysis-ready rows", merged.len());

    // 3. Persist the final dataset
    let csv_out = cfg.data_dir.join(MERGED_CSV_FILE);
    write_merged_csv(&merged, &csv_out)?;
    println!("\n💾 Wrote {}", csv_out.display());

    if emit_json {
        let json_out = cfg.data_dir.join(MERGED_JSON_FILE);
        write_merged_json(&merged, &json_out)?;
        println!("💾 Wrote {}", json_out.display());
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("🎉 Done");

    Ok(())
}
