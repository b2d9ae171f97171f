//! The `gradebook grade` command.

use std::path::PathBuf;

use anyhow::Result;

use gradebook_core::config::load_config_from;
use gradebook_core::model::Score;

pub fn execute(score: Option<f64>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let scale = config.grade_scale();

    let Some(value) = score else {
        println!("no entry");
        return Ok(());
    };

    let score = Score::new(value)?;
    match scale.grade_score(Some(score)) {
        Some(band) => println!("{score}: {} ({})", band.label, band.remark),
        None => anyhow::bail!("no grade band covers {score}"),
    }

    Ok(())
}
