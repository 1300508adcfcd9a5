//! Tier Export — packs a tier's professors and drafts into a Word document.
//!
//! The document byte layout is delegated entirely to `docx-rs`; this module
//! owns the precondition check, the section ordering, and the filename.

use anyhow::anyhow;
use docx_rs::{Docx, Paragraph, Run};

use crate::errors::AppError;
use crate::models::{Professor, Tier};

/// Deterministic download filename for a tier export.
pub fn export_filename(tier: Tier) -> String {
    format!("LabMatch_Tier{}_Export.docx", tier.as_u8())
}

/// Exports a tier as a Word document.
///
/// Refused unless the tier is non-empty and every professor in it carries a
/// completed draft; the document then contains exactly the tier's
/// professors in list order.
pub fn export_tier(professors: &[Professor], tier: Tier) -> Result<Vec<u8>, AppError> {
    let members = collect_tier(professors, tier)?;
    build_tier_document(&members, tier)
}

/// Collects the tier's professors in list order, enforcing the export
/// precondition.
pub fn collect_tier(professors: &[Professor], tier: Tier) -> Result<Vec<&Professor>, AppError> {
    let members: Vec<&Professor> = professors
        .iter()
        .filter(|p| p.tier == Some(tier))
        .collect();

    if members.is_empty() {
        return Err(AppError::Precondition(format!(
            "No professors in tier {}",
            tier.as_u8()
        )));
    }
    if members.iter().any(|p| p.generated_draft.is_none()) {
        return Err(AppError::Precondition(
            "Please generate drafts for every professor in this tier first".to_string(),
        ));
    }
    Ok(members)
}

fn build_tier_document(members: &[&Professor], tier: Tier) -> Result<Vec<u8>, AppError> {
    let mut docx = Docx::new().add_paragraph(
        Paragraph::new().add_run(
            Run::new()
                .add_text(format!("LabMatch Export - Tier {}", tier.as_u8()))
                .bold()
                .size(36),
        ),
    );

    for professor in members {
        docx = append_professor_section(docx, professor);
    }

    let mut buffer = Vec::new();
    docx.build()
        .pack(&mut std::io::Cursor::new(&mut buffer))
        .map_err(|e| AppError::Internal(anyhow!("Failed to pack Word document: {e}")))?;
    Ok(buffer)
}

fn append_professor_section(mut docx: Docx, professor: &Professor) -> Docx {
    docx = docx
        .add_paragraph(
            Paragraph::new().add_run(Run::new().add_text(professor.name.as_str()).bold().size(28)),
        )
        .add_paragraph(Paragraph::new().add_run(
            Run::new()
                .add_text(format!(
                    "Match Score: {}%",
                    professor.match_score.unwrap_or(0.0)
                ))
                .bold(),
        ))
        .add_paragraph(
            Paragraph::new().add_run(
                Run::new()
                    .add_text(professor.research_interests.join(", "))
                    .italic(),
            ),
        )
        .add_paragraph(Paragraph::new().add_run(Run::new().add_text(format!(
            "Why Match?: {}",
            professor.match_reason.as_deref().unwrap_or("")
        ))))
        .add_paragraph(Paragraph::new())
        .add_paragraph(
            Paragraph::new().add_run(Run::new().add_text("DRAFT EMAIL").bold().underline("single")),
        );

    if let Some(draft) = &professor.generated_draft {
        docx = docx
            .add_paragraph(
                Paragraph::new()
                    .add_run(Run::new().add_text(format!("Subject: {}", draft.subject)).bold()),
            )
            .add_paragraph(Paragraph::new());
        for line in draft.body.lines() {
            docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(line)));
        }
    }

    docx.add_paragraph(Paragraph::new())
}
