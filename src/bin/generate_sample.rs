use std::sync::Arc;

use arrow::array::{Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

// ---------------------------------------------------------------------------
// Synthetic fleet dataset generator
//
// Writes `sample_fleet.parquet`: two years of monthly lubricant samples for
// a small fleet, with per-parameter severity flags derived from fixed
// thresholds and `Report Status` set to the worst flag on each row.
// ---------------------------------------------------------------------------

/// (parameter, typical mean, std dev, caution threshold, alert threshold)
const PARAMETERS: [(&str, f64, f64, f64, f64); 6] = [
    ("IRON", 35.0, 18.0, 50.0, 80.0),
    ("COPPER", 18.0, 10.0, 30.0, 50.0),
    ("LEAD", 8.0, 6.0, 15.0, 25.0),
    ("SILICON", 12.0, 7.0, 20.0, 35.0),
    ("VISCOSITY_40C", 145.0, 12.0, 160.0, 175.0),
    ("WATER_PPM", 180.0, 120.0, 350.0, 600.0),
];

const ACCOUNTS: [&str; 3] = ["NorthFleet", "HarborLog", "AndesMining"];
const LUBRICANTS: [&str; 3] = ["15W-40", "SAE 30", "ISO VG 46"];

/// Column order shared by the Parquet schema and the CSV header:
/// metadata columns first, then a value/flag pair per parameter.
fn column_names() -> Vec<String> {
    let mut names: Vec<String> = [
        "Account",
        "Equipment ID",
        "Lubricant Type",
        "Sample Date",
        "Report Status",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    for &(name, ..) in &PARAMETERS {
        names.push(format!("RESULT_{name}"));
        names.push(format!("RESULT_{name}_status"));
    }
    names
}

fn flag_for(value: f64, caution: f64, alert: f64) -> &'static str {
    if value >= alert {
        "Alert"
    } else if value >= caution {
        "Caution"
    } else {
        "Normal"
    }
}

fn worst(a: &'static str, b: &'static str) -> &'static str {
    fn rank(s: &str) -> u8 {
        match s {
            "Alert" => 2,
            "Caution" => 1,
            _ => 0,
        }
    }
    if rank(b) > rank(a) { b } else { a }
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn main() {
    let mut rng = SimpleRng::new(42);

    let mut accounts: Vec<String> = Vec::new();
    let mut equipment: Vec<String> = Vec::new();
    let mut lubricants: Vec<String> = Vec::new();
    let mut dates: Vec<String> = Vec::new();
    let mut statuses: Vec<String> = Vec::new();
    let mut results: Vec<Vec<f64>> = vec![Vec::new(); PARAMETERS.len()];
    let mut flags: Vec<Vec<String>> = vec![Vec::new(); PARAMETERS.len()];

    for (acct_idx, account) in ACCOUNTS.iter().enumerate() {
        for unit in 0..4 {
            let equipment_id = format!("EQ-{}{unit:02}", acct_idx + 1);
            let lubricant = LUBRICANTS[(acct_idx + unit) % LUBRICANTS.len()];
            // Older units drift toward higher wear-metal readings.
            let wear_bias = 1.0 + unit as f64 * 0.15;

            for year in [2023, 2024] {
                for month in 1..=12 {
                    let day = 1 + (rng.next_u64() % 28) as u32;

                    accounts.push(account.to_string());
                    equipment.push(equipment_id.clone());
                    lubricants.push(lubricant.to_string());
                    dates.push(format!("{year}-{month:02}-{day:02}"));

                    let mut row_status = "Normal";
                    for (p, &(_, mean, std_dev, caution, alert)) in
                        PARAMETERS.iter().enumerate()
                    {
                        let value = rng.gauss(mean * wear_bias, std_dev).max(0.0);
                        let flag = flag_for(value, caution, alert);
                        row_status = worst(row_status, flag);
                        results[p].push((value * 100.0).round() / 100.0);
                        flags[p].push(flag.to_string());
                    }
                    statuses.push(row_status.to_string());
                }
            }
        }
    }

    // Build the Arrow schema: metadata columns then RESULT_/flag pairs.
    let mut fields = vec![
        Field::new("Account", DataType::Utf8, false),
        Field::new("Equipment ID", DataType::Utf8, false),
        Field::new("Lubricant Type", DataType::Utf8, false),
        Field::new("Sample Date", DataType::Utf8, false),
        Field::new("Report Status", DataType::Utf8, false),
    ];
    for &(name, ..) in &PARAMETERS {
        fields.push(Field::new(format!("RESULT_{name}"), DataType::Float64, false));
        fields.push(Field::new(
            format!("RESULT_{name}_status"),
            DataType::Utf8,
            false,
        ));
    }
    let schema = Arc::new(Schema::new(fields));

    let mut columns: Vec<Arc<dyn arrow::array::Array>> = vec![
        Arc::new(StringArray::from(
            accounts.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
        )),
        Arc::new(StringArray::from(
            equipment.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
        )),
        Arc::new(StringArray::from(
            lubricants.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
        )),
        Arc::new(StringArray::from(
            dates.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
        )),
        Arc::new(StringArray::from(
            statuses.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
        )),
    ];
    for (p, _) in PARAMETERS.iter().enumerate() {
        columns.push(Arc::new(Float64Array::from(results[p].clone())));
        columns.push(Arc::new(StringArray::from(
            flags[p].iter().map(|s| s.as_str()).collect::<Vec<_>>(),
        )));
    }

    let batch =
        RecordBatch::try_new(schema.clone(), columns).expect("Failed to create RecordBatch");

    let parquet_path = "sample_fleet.parquet";
    let file = std::fs::File::create(parquet_path).expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");

    // CSV companion with the same rows.
    let csv_path = "sample_fleet.csv";
    let mut csv_writer = csv::Writer::from_path(csv_path).expect("Failed to create CSV file");
    csv_writer
        .write_record(&column_names())
        .expect("Failed to write CSV header");
    for i in 0..statuses.len() {
        let mut record: Vec<String> = vec![
            accounts[i].clone(),
            equipment[i].clone(),
            lubricants[i].clone(),
            dates[i].clone(),
            statuses[i].clone(),
        ];
        for p in 0..PARAMETERS.len() {
            record.push(format!("{:.2}", results[p][i]));
            record.push(flags[p][i].clone());
        }
        csv_writer
            .write_record(&record)
            .expect("Failed to write CSV row");
    }
    csv_writer.flush().expect("Failed to flush CSV");

    println!(
        "Wrote {} samples across {} parameters to {parquet_path} and {csv_path}",
        statuses.len(),
        PARAMETERS.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_names_cover_required_and_parameters() {
        let names = column_names();
        for required in [
            "Account",
            "Equipment ID",
            "Lubricant Type",
            "Sample Date",
            "Report Status",
        ] {
            assert!(names.contains(&required.to_string()), "missing {required}");
        }
        assert!(names.contains(&"RESULT_IRON".to_string()));
        assert!(names.contains(&"RESULT_IRON_status".to_string()));
        assert_eq!(names.len(), 5 + PARAMETERS.len() * 2);
    }

    #[test]
    fn test_flag_thresholds() {
        assert_eq!(flag_for(10.0, 50.0, 80.0), "Normal");
        assert_eq!(flag_for(50.0, 50.0, 80.0), "Caution");
        assert_eq!(flag_for(80.0, 50.0, 80.0), "Alert");
        assert_eq!(worst("Caution", "Alert"), "Alert");
        assert_eq!(worst("Alert", "Normal"), "Alert");
        assert_eq!(worst("Normal", "Normal"), "Normal");
    }
}
