mod quick;

use kote_survey::scorer::LabelScore;

pub fn scores(pairs: &[(&str, f64)]) -> Vec<LabelScore> {
    pairs
        .iter()
        .map(|(label, score)| LabelScore::new(*label, *score))
        .collect()
}
