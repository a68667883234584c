use crate::infra::{load_catalog_from, read_answers};
use chrono::Utc;
use clap::Args;
use sdgx::assessment::report::{write_scores_csv, NO_ACTION_MESSAGE};
use sdgx::assessment::{
    compute_scores, AnswerValue, AssessmentSession, GatePolicy, IdentityRecord, MemoryStore,
    QuestionCatalog, QuestionId, ScoreSheet, Stage,
};
use sdgx::error::AppError;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// JSON object mapping question ids to answers 0-4
    #[arg(long)]
    pub(crate) answers: PathBuf,
    /// Optional JSON catalog replacing the built-in questionnaire
    #[arg(long)]
    pub(crate) catalog: Option<PathBuf>,
    /// Emit the indicator table as CSV instead of text
    #[arg(long)]
    pub(crate) csv: bool,
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Municipality name used for the sample assessment
    #[arg(long, default_value = "Villeneuve-sur-Lot")]
    pub(crate) municipality: String,
    /// Address used to draft the results e-mail
    #[arg(long)]
    pub(crate) share_to: Option<String>,
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let ScoreArgs {
        answers,
        catalog,
        csv,
    } = args;

    let catalog = load_catalog_from(catalog.as_deref())?;
    let responses = read_answers(&answers, &catalog)?;
    let scores = compute_scores(&catalog, &responses);

    if csv {
        write_scores_csv(&scores, std::io::stdout().lock())?;
        return Ok(());
    }

    println!(
        "Scored {} answers ({} not applicable) against {} questions",
        responses.len(),
        responses.len() - responses.scored_count(),
        catalog.len()
    );
    render_scores(&scores);

    let actions = sdgx::assessment::report::recommendations(&catalog, &responses);
    if actions.is_empty() {
        println!("\n{}", NO_ACTION_MESSAGE);
    } else {
        println!("\nRecommended actions");
        for action in &actions {
            println!("- {} (answered {}): {}", action.question_id, action.answer.get(), action.text);
        }
    }

    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        municipality,
        share_to,
    } = args;

    println!("SDG-X assessment demo");
    let catalog = Arc::new(QuestionCatalog::standard());
    let store = Arc::new(MemoryStore::new());
    let mut session = AssessmentSession::restore(catalog, store, GatePolicy::default());

    if let Err(notice) = session.navigate(Stage::Questionnaire) {
        println!("- Before identity: {}", notice);
    }

    let slug = municipality.to_lowercase().replace(' ', "-");
    session.update_identity(IdentityRecord {
        municipality_name: municipality.clone(),
        official_email: format!("transition@{slug}.fr"),
        contact_name: Some("Sustainability office".to_string()),
        region: Some("Nouvelle-Aquitaine".to_string()),
        population: Some(22_000),
    });
    let stage = match session.navigate(Stage::Questionnaire) {
        Ok(stage) => stage,
        Err(notice) => {
            println!("  Identity rejected: {}", notice);
            return Ok(());
        }
    };
    println!("- Identity recorded for {} -> stage {}", municipality, stage.label());

    for (question, raw) in demo_answers() {
        let Some(value) = AnswerValue::new(raw) else {
            continue;
        };
        if let Err(err) = session.select_answer(QuestionId(question), value) {
            println!("  Answer to Q{} rejected: {}", question, err);
        }
    }
    println!(
        "- {} answers recorded, {} scored",
        session.responses().len(),
        session.responses().scored_count()
    );

    println!();
    render_scores(session.scores());

    let priorities = session.priorities();
    if priorities.is_empty() {
        println!("\nPriorities: {}", NO_ACTION_MESSAGE);
    } else {
        println!("\nPriorities (weakest first)");
        for entry in &priorities.indicators {
            println!(
                "- {}: {:.2} ({})",
                entry.indicator_label, entry.average, entry.band_label
            );
        }
        for action in &priorities.recommendations {
            println!("  * {}: {}", action.question_id, action.text);
        }
    }

    if let Some(target) = session.idea_targets().first().copied() {
        match session.submit_idea(target, "Open a repair café in the old market hall", Utc::now()) {
            Ok(idea) => println!(
                "\nCitizen idea for {}: {}",
                idea.target_indicator, idea.text
            ),
            Err(err) => println!("\nCitizen idea rejected: {}", err),
        }
    }

    println!("\nSummary text\n{}", session.summary_text());

    if let Some(recipient) = share_to {
        let draft = session.share_draft(&recipient);
        println!("Draft to {} | {}", draft.recipient, draft.subject);
        println!("{}", draft.body);
    }

    Ok(())
}

fn render_scores(scores: &ScoreSheet) {
    println!("Global index: {}", scores.global_score_label());
    if scores.is_empty() {
        println!("No indicator has been scored yet.");
        return;
    }
    for score in &scores.indicator_scores {
        println!(
            "- {}: {:.2} [{}] from {} answers",
            score.indicator.label(),
            score.average,
            score.band().label(),
            score.sample_count
        );
    }
}

/// A mid-sized town that is strong on water and weak on climate and mobility.
fn demo_answers() -> [(u32, u8); 12] {
    [
        (1, 1),
        (2, 2),
        (3, 2),
        (4, 4),
        (5, 3),
        (8, 2),
        (9, 3),
        (11, 1),
        (14, 0),
        (19, 4),
        (21, 2),
        (22, 3),
    ]
}
