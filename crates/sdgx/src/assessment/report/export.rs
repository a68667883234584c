use super::super::scoring::ScoreSheet;
use std::io::Write;

/// Write one CSV row per scored indicator.
pub fn write_scores_csv<W: Write>(scores: &ScoreSheet, writer: W) -> Result<(), csv::Error> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(["indicator", "label", "average", "sample_count", "band"])?;

    for score in &scores.indicator_scores {
        out.write_record([
            score.indicator.get().to_string(),
            score.indicator.label(),
            format!("{:.2}", score.average),
            score.sample_count.to_string(),
            score.band().label().to_string(),
        ])?;
    }

    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::domain::IndicatorId;
    use crate::assessment::scoring::IndicatorScore;

    #[test]
    fn writes_header_and_rows_in_indicator_order() {
        let scores = ScoreSheet {
            indicator_scores: vec![
                IndicatorScore {
                    indicator: IndicatorId::new(2).expect("valid"),
                    average: 1.5,
                    sample_count: 2,
                },
                IndicatorScore {
                    indicator: IndicatorId::new(11).expect("valid"),
                    average: 3.75,
                    sample_count: 4,
                },
            ],
            global_score: Some(2.63),
        };

        let mut buffer = Vec::new();
        write_scores_csv(&scores, &mut buffer).expect("csv written");
        let output = String::from_utf8(buffer).expect("utf8");

        assert_eq!(
            output,
            "indicator,label,average,sample_count,band\n2,ODD 2,1.50,2,Critical\n11,ODD 11,3.75,4,Good\n"
        );
    }
}
