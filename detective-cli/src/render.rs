//! Terminal rendering of analysis results

use detective_core::{AnalysisResult, Lens, Verdict};

fn verdict_icon(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Verified => "✅",
        Verdict::LikelyTrue => "🟢",
        Verdict::Misleading => "🟠",
        Verdict::LikelyFalse => "🔴",
        Verdict::False => "❌",
        Verdict::Unverifiable => "❔",
    }
}

/// Ten-cell bar for a 0-100 score
pub fn score_bar(score: u8) -> String {
    let filled = (usize::from(score.min(100)) + 5) / 10;
    format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
}

pub fn render_analysis(result: &AnalysisResult) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "{} Verdict: {}\n",
        verdict_icon(result.verdict),
        result.verdict.label()
    ));
    out.push_str(&format!(
        "📊 Credibility: {} {}/100\n",
        score_bar(result.credibility_score),
        result.credibility_score
    ));

    if !result.summary.is_empty() {
        out.push_str(&format!("\n{}\n", result.summary));
    }

    if !result.lenses.is_empty() {
        out.push_str("\n🔍 Tri-Lens findings:\n");
        for lens in Lens::ALL {
            if let Some(assessment) = result.lens(lens) {
                out.push_str(&format!(
                    "  {:<14} {} {:>3}  {}\n",
                    lens.title(),
                    score_bar(assessment.score),
                    assessment.score,
                    assessment.findings
                ));
            }
        }
    }

    if !result.red_flags.is_empty() {
        out.push_str("\n🚩 Red flags:\n");
        for flag in &result.red_flags {
            out.push_str(&format!("  • {}\n", flag));
        }
    }

    if !result.verification_steps.is_empty() {
        out.push_str("\n🧭 How to verify:\n");
        for (i, step) in result.verification_steps.iter().enumerate() {
            out.push_str(&format!("  {}. {}\n", i + 1, step));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use detective_core::LensAssessment;

    #[test]
    fn test_score_bar_bounds() {
        assert_eq!(score_bar(0), "░░░░░░░░░░");
        assert_eq!(score_bar(100), "██████████");
        assert_eq!(score_bar(44).chars().filter(|c| *c == '█').count(), 4);
        assert_eq!(score_bar(45).chars().filter(|c| *c == '█').count(), 5);
    }

    #[test]
    fn test_render_lists_lenses_in_protocol_order() {
        let result = AnalysisResult {
            verdict: Verdict::Misleading,
            credibility_score: 40,
            summary: "Half of it is true.".to_string(),
            lenses: vec![
                LensAssessment {
                    lens: Lens::Logic,
                    score: 30,
                    findings: "Cherry-picked".to_string(),
                },
                LensAssessment {
                    lens: Lens::Source,
                    score: 70,
                    findings: "Named outlet".to_string(),
                },
            ],
            red_flags: vec!["Emotive headline".to_string()],
            verification_steps: vec!["Find the original study".to_string()],
        };

        let text = render_analysis(&result);
        assert!(text.contains("Misleading"));
        assert!(text.contains("Emotive headline"));
        assert!(text.contains("1. Find the original study"));
        let source = text.find("Source lens").unwrap();
        let logic = text.find("Logic lens").unwrap();
        assert!(source < logic);
        assert!(!text.contains("Evidence lens"));
    }
}
