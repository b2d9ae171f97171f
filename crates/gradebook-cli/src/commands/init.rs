//! The `gradebook init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    if Path::new("gradebook.toml").exists() {
        println!("gradebook.toml already exists, skipping.");
    } else {
        std::fs::write("gradebook.toml", SAMPLE_CONFIG)?;
        println!("Created gradebook.toml");
    }

    std::fs::create_dir_all("exams")?;
    let example_path = Path::new("exams/example.toml");
    if example_path.exists() {
        println!("exams/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_EXAM)?;
        println!("Created exams/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit exams/example.toml with your subjects and students");
    println!("  2. Run: gradebook template --exam exams/example.toml --output marks.csv");
    println!("  3. Fill in marks.csv, then run:");
    println!("     gradebook import --exam exams/example.toml --upload marks.csv --marks marks.json");
    println!("  4. Run: gradebook rank --exam exams/example.toml --marks marks.json");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# gradebook configuration

# Accepted upload rows shown before the marks are saved.
preview_rows = 5

results_dir = "./gradebook-results"

# Uncomment to replace the standard A to E scale. Bands must be whole
# numbers and cover 0 to 100 without gaps or overlaps.
#
# [[grading]]
# min_score = 0
# max_score = 49
# label = "Fail"
# remark = "Resit required"
#
# [[grading]]
# min_score = 50
# max_score = 100
# label = "Pass"
# remark = "Well done"
"#;

const EXAMPLE_EXAM: &str = r#"[exam]
id = "example-midterm"
name = "Example Midterm"
marks_locked = false

[[subjects]]
id = "math"
name = "Mathematics"

[[subjects]]
id = "eng"
name = "English"

[[subjects]]
id = "sci"
name = "Science"

[[students]]
id = "stu-1"
name = "Amina Odhiambo"
admission_number = "1001"
group_id = "2N"

[[students]]
id = "stu-2"
name = "Brian Mwangi"
admission_number = "1002"
group_id = "2N"

[[students]]
id = "stu-3"
name = "Chebet Kiprono"
admission_number = "1003"
group_id = "2S"
"#;
